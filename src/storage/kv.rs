use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Serialize};
use tokio::fs;

use crate::error::AppError;

/// 기기 로컬에 저장되는 이름 붙은 JSON 덩어리. 키마다 `<key>.json` 파일 하나입니다.
///
/// 쓰기는 임시 파일에 먼저 쓴 뒤 이름을 바꿉니다. 읽는 쪽은 반쯤 쓰인 파일을 보지 않습니다.
#[derive(Debug, Clone)]
pub struct KeyValueStore {
    dir: PathBuf,
}

impl KeyValueStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AppError> {
        match fs::read_to_string(self.path(key)).await {
            Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 없는 키는 빈 목록으로 읽힙니다.
    pub async fn list<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, AppError> {
        Ok(self.get(key).await?.unwrap_or_default())
    }

    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), AppError> {
        fs::create_dir_all(&self.dir).await?;
        let text = serde_json::to_string(value)?;
        let tmp = self.dir.join(format!(".{}.json.tmp", key));
        fs::write(&tmp, text).await?;
        fs::rename(&tmp, self.path(key)).await?;
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> Result<(), AppError> {
        match fs::remove_file(self.path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
