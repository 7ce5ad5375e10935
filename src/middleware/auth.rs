use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    error::AppError,
    models::{User, UserRole},
    routes::AppState,
};

/// 이 기기의 현재 사용자 포인터에서 꺼낸 로그인 사용자
///
/// 포인터에는 ID만 있으므로 저장소에서 다시 읽습니다. 역할 변경이나 삭제가 바로 반영됩니다.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_id = state
            .device
            .current_user_id()
            .await?
            .ok_or_else(|| AppError::Unauthorized("No hay sesión iniciada".to_string()))?;

        let user = state
            .storage
            .get_user(&user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("La sesión ya no es válida".to_string()))?;

        Ok(CurrentUser(user))
    }
}

fn require_role(user: User, role: UserRole) -> Result<User, AppError> {
    if user.role != role {
        tracing::debug!(user_id = %user.id, role = %user.role, required = %role, "role check failed");
        return Err(AppError::Forbidden(format!(
            "Se requiere el rol {}",
            role
        )));
    }
    Ok(user)
}

/// 역할별 추출기. 역할이 맞지 않으면 403을 반환합니다.
macro_rules! role_extractor {
    ($name:ident, $role:expr) => {
        #[derive(Debug, Clone)]
        pub struct $name(pub User);

        impl FromRequestParts<AppState> for $name {
            type Rejection = AppError;

            async fn from_request_parts(
                parts: &mut Parts,
                state: &AppState,
            ) -> Result<Self, Self::Rejection> {
                let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
                require_role(user, $role).map($name)
            }
        }
    };
}

role_extractor!(AdminUser, UserRole::Admin);
role_extractor!(DirectorUser, UserRole::Director);
role_extractor!(TeacherUser, UserRole::Profesor);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_mismatch_is_forbidden() {
        let user = User {
            id: "u1".into(),
            dni: "1".into(),
            name: "Ana".into(),
            password: String::new(),
            role: UserRole::Profesor,
            created_at: String::new(),
        };
        assert!(require_role(user.clone(), UserRole::Profesor).is_ok());
        assert!(matches!(
            require_role(user, UserRole::Admin),
            Err(AppError::Forbidden(_))
        ));
    }
}
