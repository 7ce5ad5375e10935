//! # 에러 처리 모듈
//!
//! 애플리케이션에서 발생할 수 있는 모든 에러 타입을 정의합니다.
//!
//! 이 모듈의 핵심:
//! - `AppError` 열거형(enum): 검증 실패, 저장소 거부, 미설정 상태 등 모든 에러를 하나로 통합
//! - `IntoResponse` 구현: 에러를 `{ "error": { "code", "message" } }` HTTP 응답으로 자동 변환
//!
//! ## 에러 분류
//! - 검증 에러(`Validation`, `Conflict`): 저장소 호출 전에 걸러지며 사용자 메시지를 그대로 전달
//! - 저장소 거부(`Database`, `Io`, `Serialization`): 로그에만 상세 내용을 남기고 일반 메시지 반환
//! - 미설정(`NotConfigured`): 관계형 모드가 선택됐지만 연결을 열 수 없는 경우

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// 존재하지 않는 사용자/과목/과정/전공을 참조하는 쓰기에 대한 메시지
pub const MISSING_REFERENCE: &str = "Referencia inexistente";

/// 애플리케이션에서 발생할 수 있는 모든 에러 종류
///
/// 각 variant는 적절한 HTTP 상태 코드와 메시지로 변환됩니다.
/// 어떤 에러도 재시도되지 않으며, 에러를 일으킨 요청 하나에만 영향을 줍니다.
#[derive(Debug, Error)]
pub enum AppError {
    /// 입력값 검증 실패 (HTTP 400)
    #[error("{0}")]
    Validation(String),

    /// 자연키(DNI, 이름, 과목-과정 조합 등) 중복 (HTTP 409)
    #[error("{0}")]
    Conflict(String),

    /// 요청한 레코드를 찾을 수 없음 (HTTP 404)
    /// String에는 어떤 레코드인지 담습니다 (예: "Usuario").
    #[error("{0} no encontrado")]
    NotFound(String),

    /// 로그인: 해당 DNI의 사용자가 없음 (HTTP 401)
    #[error("Usuario no encontrado")]
    UserNotFound,

    /// 로그인: 비밀번호 불일치 (HTTP 401)
    #[error("Contraseña incorrecta")]
    IncorrectPassword,

    /// 로그인하지 않은 상태 (HTTP 401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 역할(role) 또는 소유권 검사 실패 (HTTP 403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// 관계형 저장소가 선택됐지만 사용할 수 없음 (HTTP 503)
    #[error("Almacenamiento remoto no configurado")]
    NotConfigured,

    /// 할당 동기화가 중간에 실패함: 이미 적용된 단계는 되돌리지 않습니다 (HTTP 500)
    #[error("Sincronización incompleta ({removed} eliminadas, {created} creadas): {message}")]
    PartialSync {
        removed: usize,
        created: usize,
        message: String,
    },

    /// 내보내기(xlsx) 생성 실패 (HTTP 500)
    #[error("Export error: {0}")]
    Export(String),

    /// 서버 내부 오류 (HTTP 500)
    #[error("Internal error: {0}")]
    Internal(String),

    /// 데이터베이스 오류 (HTTP 500)
    /// #[from]: sqlx::Error → AppError::Database 자동 변환 (`?` 연산자 사용 가능)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// 마이그레이션 실패 (HTTP 500)
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// 로컬 저장소 파일 입출력 오류 (HTTP 500)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 로컬 저장소 JSON 블롭 직렬화/역직렬화 오류 (HTTP 500)
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    /// 관계형 저장소의 UNIQUE 제약 위반을 사용자용 `Conflict`로 바꿉니다.
    /// 외래 키 위반은 `Validation(MISSING_REFERENCE)`가 됩니다.
    ///
    /// 클라이언트 측 중복 검사는 빠른 안내일 뿐이고, 최종 판단은 저장소의 제약입니다.
    /// 다른 DB 에러는 그대로 `Database`로 감쌉니다.
    pub fn from_write(err: sqlx::Error, conflict_message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return AppError::Conflict(conflict_message.to_string());
            }
            if db_err.is_foreign_key_violation() {
                return AppError::Validation(MISSING_REFERENCE.to_string());
            }
        }
        AppError::Database(err)
    }

    /// 응답 본문에 들어가는 에러 코드 문자열
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::Conflict(_) => "conflict",
            AppError::NotFound(_) => "not_found",
            AppError::UserNotFound => "user_not_found",
            AppError::IncorrectPassword => "incorrect_password",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::NotConfigured => "not_configured",
            AppError::PartialSync { .. } => "partial_sync",
            AppError::Export(_) => "export_error",
            AppError::Internal(_) => "internal_error",
            AppError::Database(_) => "database_error",
            AppError::Migration(_) => "migration_error",
            AppError::Io(_) => "io_error",
            AppError::Serialization(_) => "serialization_error",
        }
    }
}

impl IntoResponse for AppError {
    /// AppError를 HTTP 응답으로 변환합니다.
    ///
    /// 내부 에러(Database, IO, Internal 등)는 실제 에러 내용을 로그에만 기록하고,
    /// 클라이언트에는 일반적인 메시지만 반환합니다.
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, message) = match self {
            AppError::Validation(ref msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Conflict(ref msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::UserNotFound | AppError::IncorrectPassword => {
                (StatusCode::UNAUTHORIZED, self.to_string())
            }
            AppError::Unauthorized(ref msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::Forbidden(ref msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::NotConfigured => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
            AppError::PartialSync { .. } => {
                // 부분 적용 상태는 사용자가 알아야 하므로 메시지를 그대로 전달합니다.
                tracing::error!("{}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            AppError::Export(ref msg) | AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            AppError::Migration(ref e) => {
                tracing::error!("Migration error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            AppError::Io(ref e) => {
                tracing::error!("IO error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An IO error occurred".to_string(),
                )
            }
            AppError::Serialization(ref e) => {
                tracing::error!("Serialization error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A storage format error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_errors_have_distinct_messages() {
        assert_eq!(AppError::UserNotFound.to_string(), "Usuario no encontrado");
        assert_eq!(AppError::IncorrectPassword.to_string(), "Contraseña incorrecta");
        assert_ne!(AppError::UserNotFound.code(), AppError::IncorrectPassword.code());
    }

    #[test]
    fn not_found_names_the_record() {
        let err = AppError::NotFound("Curso".to_string());
        assert_eq!(err.to_string(), "Curso no encontrado");
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn partial_sync_reports_applied_steps() {
        let err = AppError::PartialSync {
            removed: 1,
            created: 0,
            message: "boom".to_string(),
        };
        assert!(err.to_string().contains("1 eliminadas, 0 creadas"));
    }
}
