//! # 현재 사용자 포인터
//!
//! 로그인한 사용자는 중앙 저장소가 아닌 이 기기의 `libro_temas_current_user` 키에만 저장됩니다.
//! 관계형 모드에서도 마찬가지입니다.
//!
//! 파일에는 사용자 ID만 남습니다. 이름, 역할, 비밀번호 해시는 요청마다 저장소에서 다시 읽습니다.
//! 예전 형식(사용자 전체)으로 쓰인 파일도 `id` 필드만 읽어 그대로 동작합니다.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{error::AppError, models::User};

use super::KeyValueStore;

pub const CURRENT_USER_KEY: &str = "libro_temas_current_user";

#[derive(Debug, Serialize, Deserialize)]
struct CurrentUserPointer {
    id: String,
}

#[derive(Debug, Clone)]
pub struct DeviceSession {
    kv: KeyValueStore,
}

impl DeviceSession {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            kv: KeyValueStore::new(data_dir),
        }
    }

    /// 로그인한 사용자의 ID
    pub async fn current_user_id(&self) -> Result<Option<String>, AppError> {
        let pointer: Option<CurrentUserPointer> = self.kv.get(CURRENT_USER_KEY).await?;
        Ok(pointer.map(|p| p.id))
    }

    /// `None`이면 포인터를 지웁니다 (로그아웃).
    pub async fn set_current_user(&self, user: Option<&User>) -> Result<(), AppError> {
        match user {
            Some(user) => {
                let pointer = CurrentUserPointer {
                    id: user.id.clone(),
                };
                self.kv.set(CURRENT_USER_KEY, &pointer).await
            }
            None => self.kv.remove(CURRENT_USER_KEY).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;

    fn ana() -> User {
        User {
            id: "u1".into(),
            dni: "111".into(),
            name: "Ana".into(),
            password: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into(),
            role: UserRole::Profesor,
            created_at: "2026-01-01T00:00:00.000Z".into(),
        }
    }

    #[tokio::test]
    async fn set_read_and_clear_pointer() {
        let dir = tempfile::tempdir().unwrap();
        let session = DeviceSession::new(dir.path());
        assert!(session.current_user_id().await.unwrap().is_none());

        session.set_current_user(Some(&ana())).await.unwrap();
        assert_eq!(session.current_user_id().await.unwrap().as_deref(), Some("u1"));

        session.set_current_user(None).await.unwrap();
        assert!(session.current_user_id().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn pointer_file_holds_only_the_id() {
        let dir = tempfile::tempdir().unwrap();
        let session = DeviceSession::new(dir.path());
        session.set_current_user(Some(&ana())).await.unwrap();

        let text =
            std::fs::read_to_string(dir.path().join(format!("{}.json", CURRENT_USER_KEY))).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value, serde_json::json!({ "id": "u1" }));
        assert!(!text.contains("argon2"));
    }

    #[tokio::test]
    async fn full_user_pointer_from_older_files_still_reads() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(format!("{}.json", CURRENT_USER_KEY)),
            serde_json::to_string(&ana()).unwrap(),
        )
        .unwrap();

        let session = DeviceSession::new(dir.path());
        assert_eq!(session.current_user_id().await.unwrap().as_deref(), Some("u1"));
    }
}
