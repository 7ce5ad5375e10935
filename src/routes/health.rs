//! # 헬스체크(Health Check) 핸들러
//!
//! ## 엔드포인트
//! - `GET /api/v1/health` → `{ "status": "ok", "storage": "local" | "relational" }`
//!
//! `storage` 값으로 설정이 실제로 어느 저장소를 골랐는지 확인할 수 있습니다.

use axum::{extract::State, Json};
use serde_json::{json, Value};

use super::AppState;

/// `GET /health`: 서버 상태와 저장소 종류를 반환합니다. 실패하지 않습니다.
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "storage": state.storage.mode().as_str(),
    }))
}
