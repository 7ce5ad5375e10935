//! # 계정 서비스
//!
//! 비밀번호 해싱(Argon2id), 로그인/로그아웃, 관리자용 사용자 생성/수정을 담당합니다.
//!
//! ## 로그인 흐름
//! ```text
//! DNI로 사용자 조회 ─ 없음 → UserNotFound
//!        │
//!   비밀번호 검증 ─ 불일치 → IncorrectPassword
//!        │
//!   현재 사용자 포인터 저장 → UserResponse
//! ```
//! 해싱 이전에 저장된 평문 비밀번호도 로그인할 수 있습니다.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::{
    error::AppError,
    models::{LoginRequest, NewUser, User, UserPatch, UserResponse},
    services::guards,
    storage::{DeviceSession, Storage},
};

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// 저장된 값이 Argon2 PHC 문자열이면 해시로 검증하고, 아니면 평문으로 비교합니다.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, AppError> {
    if !stored.starts_with("$argon2") {
        return Ok(password == stored);
    }
    let parsed_hash = PasswordHash::new(stored)
        .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub async fn login(
    storage: &dyn Storage,
    session: &DeviceSession,
    req: &LoginRequest,
) -> Result<UserResponse, AppError> {
    let dni = req.dni.trim();
    if dni.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(
            "Por favor complete todos los campos".to_string(),
        ));
    }

    let user = storage
        .get_user_by_dni(dni)
        .await?
        .ok_or(AppError::UserNotFound)?;

    if !verify_password(&req.password, &user.password)? {
        tracing::info!(dni, "login rejected: incorrect password");
        return Err(AppError::IncorrectPassword);
    }

    session.set_current_user(Some(&user)).await?;
    tracing::info!(user_id = %user.id, role = %user.role, "user logged in");
    Ok(user.into())
}

pub async fn logout(session: &DeviceSession) -> Result<(), AppError> {
    session.set_current_user(None).await
}

/// 관리자 화면의 "사용자 추가"
pub async fn create_user(storage: &dyn Storage, input: &NewUser) -> Result<User, AppError> {
    let mut user = guards::validate_user(input)?;
    let existing = storage.get_users().await?;
    guards::ensure_unique_dni(&existing, &user.dni, None)?;

    user.password = hash_password(&user.password)?;
    let created = storage.add_user(user).await?;
    tracing::info!(user_id = %created.id, role = %created.role, "user created");
    Ok(created)
}

/// 관리자 화면의 "사용자 수정". 비어 있지 않은 필드만 반영합니다.
pub async fn update_user(
    storage: &dyn Storage,
    id: &str,
    patch: &UserPatch,
) -> Result<User, AppError> {
    let current = storage
        .get_user(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Usuario".to_string()))?;

    let candidate = NewUser {
        dni: patch.dni.clone().unwrap_or_else(|| current.dni.clone()),
        name: patch.name.clone().unwrap_or_else(|| current.name.clone()),
        // 기존 비밀번호는 이미 해싱되어 있으므로 길이 검사에는 새 값만 씁니다.
        password: patch
            .password
            .clone()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| "*".repeat(guards::MIN_PASSWORD_LEN)),
        role: patch.role.unwrap_or(current.role),
    };
    let validated = guards::validate_user(&candidate)?;

    let existing = storage.get_users().await?;
    guards::ensure_unique_dni(&existing, &validated.dni, Some(id))?;

    let password = match patch.password.as_deref().filter(|p| !p.is_empty()) {
        Some(p) => Some(hash_password(p)?),
        None => None,
    };
    let normalized = UserPatch {
        dni: Some(validated.dni),
        name: Some(validated.name),
        password,
        role: Some(validated.role),
    };
    storage.update_user(id, normalized).await
}
