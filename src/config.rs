//! # 애플리케이션 설정(Configuration) 모듈
//!
//! 환경변수에서 서버 설정값을 읽어오는 모듈입니다.
//! `.env` 파일이나 시스템 환경변수에서 값을 가져옵니다.
//!
//! 설정 항목:
//! - `HOST`: 서버 바인딩 주소 (기본값 `0.0.0.0`)
//! - `PORT`: 서버 포트 번호 (기본값 `3000`)
//! - `LOCAL_DATA_DIR`: 로컬 저장소와 현재 사용자 포인터를 둘 디렉토리 (기본값 `data/local`)
//! - `REMOTE_DATABASE_URL` + `REMOTE_DATABASE_KEY`: 둘 다 있으면 관계형 저장소를 사용
//!
//! 원격 설정이 하나라도 빠지면 로컬 저장소로 동작하고 경고 로그를 남깁니다.

use std::{env, path::PathBuf};

/// 어떤 저장소를 쓸지에 대한 설정. 시작할 때 한 번 정해집니다.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageConfig {
    /// JSON 파일 기반 로컬 저장소
    Local { data_dir: PathBuf },
    /// SQLite(SQLCipher) 관계형 저장소. `key`는 `PRAGMA key`로 전달됩니다.
    Remote { url: String, key: String },
}

/// 애플리케이션 전체 설정을 담는 구조체
#[derive(Debug, Clone)]
pub struct Config {
    /// 서버가 바인딩할 호스트 주소
    pub host: String,
    /// 서버 포트 번호
    pub port: u16,
    /// 로컬 데이터 디렉토리. 관계형 모드에서도 현재 사용자 포인터는 여기에 저장됩니다.
    pub local_data_dir: PathBuf,
    pub storage: StorageConfig,
}

impl Config {
    /// 프로세스 환경변수에서 설정을 읽습니다.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 환경변수 조회 함수를 주입받아 설정을 만듭니다. 테스트에서 사용합니다.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        // 빈 문자열은 설정되지 않은 것으로 취급합니다.
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let local_data_dir = PathBuf::from(
            var("LOCAL_DATA_DIR").unwrap_or_else(|| "data/local".to_string()),
        );

        let storage = match (var("REMOTE_DATABASE_URL"), var("REMOTE_DATABASE_KEY")) {
            (Some(url), Some(key)) => StorageConfig::Remote { url, key },
            _ => {
                tracing::warn!(
                    "REMOTE_DATABASE_URL/REMOTE_DATABASE_KEY not set, falling back to local storage"
                );
                StorageConfig::Local {
                    data_dir: local_data_dir.clone(),
                }
            }
        };

        Self {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: var("PORT").and_then(|p| p.parse().ok()).unwrap_or(3000),
            local_data_dir,
            storage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_to_local_storage() {
        let config = config(&[]);
        assert_eq!(config.port, 3000);
        assert_eq!(
            config.storage,
            StorageConfig::Local {
                data_dir: PathBuf::from("data/local")
            }
        );
    }

    #[test]
    fn remote_needs_both_url_and_key() {
        let only_url = config(&[("REMOTE_DATABASE_URL", "sqlite:db.sqlite")]);
        assert!(matches!(only_url.storage, StorageConfig::Local { .. }));

        let blank_key = config(&[
            ("REMOTE_DATABASE_URL", "sqlite:db.sqlite"),
            ("REMOTE_DATABASE_KEY", "  "),
        ]);
        assert!(matches!(blank_key.storage, StorageConfig::Local { .. }));

        let both = config(&[
            ("REMOTE_DATABASE_URL", "sqlite:db.sqlite"),
            ("REMOTE_DATABASE_KEY", "secret"),
            ("LOCAL_DATA_DIR", "/tmp/libro"),
            ("PORT", "8080"),
        ]);
        assert_eq!(
            both.storage,
            StorageConfig::Remote {
                url: "sqlite:db.sqlite".into(),
                key: "secret".into()
            }
        );
        assert_eq!(both.local_data_dir, PathBuf::from("/tmp/libro"));
        assert_eq!(both.port, 8080);
    }
}
