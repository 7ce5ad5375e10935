//! # 인증 핸들러
//!
//! | 메서드 | 경로 | 설명 |
//! |---|---|---|
//! | POST | `/api/v1/auth/login` | DNI + 비밀번호로 로그인, 현재 사용자 포인터 기록 |
//! | POST | `/api/v1/auth/logout` | 현재 사용자 포인터 삭제 |
//! | GET | `/api/v1/auth/me` | 현재 로그인 사용자 |
//!
//! 토큰은 없습니다. 로그인 상태는 이 기기에 하나뿐인 "현재 사용자" 포인터입니다.

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::AppError,
    middleware::auth::CurrentUser,
    models::{LoginRequest, UserResponse},
    services::auth as auth_service,
};

use super::AppState;

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = auth_service::login(state.storage.as_ref(), &state.device, &req).await?;
    Ok(Json(user))
}

pub async fn logout(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    auth_service::logout(&state.device).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(user.into())
}
