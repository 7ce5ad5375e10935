use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Director,
    Profesor,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Director => "director",
            UserRole::Profesor => "profesor",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "director" => Ok(UserRole::Director),
            "profesor" => Ok(UserRole::Profesor),
            other => Err(AppError::Internal(format!("unknown role: {}", other))),
        }
    }
}

/// 저장된 사용자. `password`는 Argon2 PHC 문자열이며, 해시 도입 전에 쓰인 행에는 평문이 남아 있을 수 있습니다.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub dni: String,
    pub name: String,
    pub password: String,
    pub role: UserRole,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub dni: String,
    pub name: String,
    pub role: UserRole,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            dni: user.dni,
            name: user.name,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub dni: String,
    pub name: String,
    pub password: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub dni: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
    pub role: Option<UserRole>,
}

impl User {
    /// 패치를 합친 사본을 만듭니다. 비밀번호는 그대로 옮기므로 해시는 호출하는 쪽에서 합니다.
    pub fn merged(&self, patch: &UserPatch) -> User {
        User {
            id: self.id.clone(),
            dni: patch.dni.clone().unwrap_or_else(|| self.dni.clone()),
            name: patch.name.clone().unwrap_or_else(|| self.name.clone()),
            password: patch
                .password
                .clone()
                .unwrap_or_else(|| self.password.clone()),
            role: patch.role.unwrap_or(self.role),
            created_at: self.created_at.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub dni: String,
    pub password: String,
}
