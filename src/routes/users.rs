//! # 사용자 관리 핸들러 (관리자 전용)
//!
//! | 메서드 | 경로 | 설명 |
//! |---|---|---|
//! | GET | `/api/v1/users` | 전체 사용자 (비밀번호 제외) |
//! | POST | `/api/v1/users` | 사용자 추가 |
//! | PATCH | `/api/v1/users/{id}` | 사용자 수정 (비어 있는 필드는 유지) |
//! | DELETE | `/api/v1/users/{id}` | 사용자 삭제 (할당과 기록부도 삭제) |
//! | POST | `/api/v1/users/bulk-delete` | 여러 사용자 삭제 (최선 노력) |
//!
//! 관리자는 자기 자신을 삭제할 수 없습니다.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::{
    error::AppError,
    middleware::auth::AdminUser,
    models::{BatchDeleteReport, BulkDeleteRequest, NewUser, UserPatch, UserResponse},
    services::auth as auth_service,
};

use super::AppState;

fn self_delete_error() -> AppError {
    AppError::Validation("No puede eliminar su propio usuario".to_string())
}

pub async fn list_users(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let users: Vec<UserResponse> = state
        .storage
        .get_users()
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();
    Ok(Json(json!({ "users": users })))
}

pub async fn create_user(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(req): Json<NewUser>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user = auth_service::create_user(state.storage.as_ref(), &req).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn update_user(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UserPatch>,
) -> Result<Json<UserResponse>, AppError> {
    let user = auth_service::update_user(state.storage.as_ref(), &id, &req).await?;
    Ok(Json(user.into()))
}

pub async fn delete_user(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if admin.id == id {
        return Err(self_delete_error());
    }
    state.storage.delete_user(&id).await?;
    tracing::info!(user_id = %id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn bulk_delete_users(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<BulkDeleteRequest>,
) -> Result<Json<BatchDeleteReport>, AppError> {
    let (own, others): (Vec<String>, Vec<String>) =
        req.ids.into_iter().partition(|id| *id == admin.id);

    let mut report = state.storage.delete_multiple_users(&others).await?;
    for id in own {
        report.record(&id, Err(self_delete_error()));
    }
    Ok(Json(report))
}
