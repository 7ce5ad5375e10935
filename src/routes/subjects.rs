//! # 과목 / 전공 핸들러
//!
//! | 메서드 | 경로 | 권한 | 설명 |
//! |---|---|---|---|
//! | GET | `/api/v1/subjects` | 관리자 | 과목 목록 |
//! | POST | `/api/v1/subjects` | 관리자 | 과목 추가 (이름 대소문자 무시 유일) |
//! | PATCH | `/api/v1/subjects/{id}` | 관리자 | 과목 이름 변경 |
//! | DELETE | `/api/v1/subjects/{id}` | 관리자 | 과목 삭제 (연결, 할당, 기록부도 삭제) |
//! | POST | `/api/v1/subjects/bulk-delete` | 관리자 | 여러 과목 삭제 |
//! | GET | `/api/v1/especialidades` | 로그인 사용자 | 전공 목록 |
//! | POST | `/api/v1/especialidades` | 관리자 | 전공 추가 |
//! | DELETE | `/api/v1/especialidades/{id}` | 관리자 | 전공 삭제 (사용 중이면 409) |
//!
//! 중복 검사는 여기서 한 번(빠른 안내), 저장소에서 한 번 더(최종 판단) 수행됩니다.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::{
    error::AppError,
    middleware::auth::{AdminUser, CurrentUser},
    models::{
        BatchDeleteReport, BulkDeleteRequest, Especialidad, NewEspecialidad, NewSubject, Subject,
        SubjectPatch,
    },
    services::guards,
};

use super::AppState;

pub async fn list_subjects(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let subjects = state.storage.get_subjects().await?;
    Ok(Json(json!({ "subjects": subjects })))
}

pub async fn create_subject(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(req): Json<NewSubject>,
) -> Result<(StatusCode, Json<Subject>), AppError> {
    let name = guards::validate_name(&req.name)?;
    let existing = state.storage.get_subjects().await?;
    guards::ensure_unique_subject_name(&existing, &name, None)?;

    let subject = state.storage.add_subject(NewSubject { name }).await?;
    tracing::info!(subject_id = %subject.id, "subject created");
    Ok((StatusCode::CREATED, Json(subject)))
}

pub async fn update_subject(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SubjectPatch>,
) -> Result<Json<Subject>, AppError> {
    let name = match req.name.as_deref() {
        Some(name) => {
            let name = guards::validate_name(name)?;
            let existing = state.storage.get_subjects().await?;
            guards::ensure_unique_subject_name(&existing, &name, Some(&id))?;
            Some(name)
        }
        None => None,
    };

    let subject = state
        .storage
        .update_subject(&id, SubjectPatch { name })
        .await?;
    Ok(Json(subject))
}

pub async fn delete_subject(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.storage.delete_subject(&id).await?;
    tracing::info!(subject_id = %id, "subject deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn bulk_delete_subjects(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(req): Json<BulkDeleteRequest>,
) -> Result<Json<BatchDeleteReport>, AppError> {
    let report = state.storage.delete_multiple_subjects(&req.ids).await?;
    Ok(Json(report))
}

/// 전공 목록은 과정 이름 표시에 필요하므로 모든 로그인 사용자가 볼 수 있습니다.
pub async fn list_especialidades(
    _user: CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let especialidades = state.storage.get_especialidades().await?;
    Ok(Json(json!({ "especialidades": especialidades })))
}

pub async fn create_especialidad(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(req): Json<NewEspecialidad>,
) -> Result<(StatusCode, Json<Especialidad>), AppError> {
    let name = guards::validate_name(&req.name)?;
    let existing = state.storage.get_especialidades().await?;
    guards::ensure_unique_especialidad_name(&existing, &name)?;

    let especialidad = state
        .storage
        .add_especialidad(NewEspecialidad { name })
        .await?;
    Ok((StatusCode::CREATED, Json(especialidad)))
}

pub async fn delete_especialidad(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.storage.delete_especialidad(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
