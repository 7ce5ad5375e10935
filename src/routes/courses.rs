//! # 과정(Course) 핸들러 (관리자 전용)
//!
//! | 메서드 | 경로 | 설명 |
//! |---|---|---|
//! | GET | `/api/v1/courses` | 과정 목록 |
//! | POST | `/api/v1/courses` | 과정 추가 |
//! | PATCH | `/api/v1/courses/{id}` | 과정 수정 |
//! | DELETE | `/api/v1/courses/{id}` | 과정 삭제 (연결, 할당, 기록부도 삭제) |
//! | POST | `/api/v1/courses/bulk-delete` | 여러 과정 삭제 |
//! | PUT | `/api/v1/courses/{id}/subjects` | 과정의 과목 집합 동기화 |
//!
//! 과정 이름은 클라이언트가 보내지 않습니다. 저장소가 (학년, 반, 근무조, 전공)으로 만듭니다.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::{
    error::AppError,
    middleware::auth::AdminUser,
    models::{
        BatchDeleteReport, BulkDeleteRequest, Course, CoursePatch, CourseSubjectsRequest,
        NewCourse, SubjectCourse,
    },
    services::{
        guards,
        sync::{self, SyncReport},
    },
};

use super::AppState;

pub async fn list_courses(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let courses = state.storage.get_courses().await?;
    Ok(Json(json!({ "courses": courses })))
}

pub async fn create_course(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(req): Json<NewCourse>,
) -> Result<(StatusCode, Json<Course>), AppError> {
    let normalized = guards::normalize_course(&req)?;
    let existing = state.storage.get_courses().await?;
    guards::ensure_unique_course(
        existing.iter().map(|c| (c.id.as_str(), c.key())),
        &normalized.key(),
        None,
    )?;

    let course = state.storage.add_course(normalized).await?;
    tracing::info!(course_id = %course.id, name = %course.name, "course created");
    Ok((StatusCode::CREATED, Json(course)))
}

pub async fn update_course(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<CoursePatch>,
) -> Result<Json<Course>, AppError> {
    let existing = state.storage.get_courses().await?;
    let current = existing
        .iter()
        .find(|c| c.id == id)
        .ok_or_else(|| AppError::NotFound("Curso".to_string()))?;

    let merged = guards::normalize_course(&req.merge_into(current))?;
    guards::ensure_unique_course(
        existing.iter().map(|c| (c.id.as_str(), c.key())),
        &merged.key(),
        Some(&id),
    )?;

    let course = state.storage.update_course(&id, req).await?;
    Ok(Json(course))
}

pub async fn delete_course(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.storage.delete_course(&id).await?;
    tracing::info!(course_id = %id, "course deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn bulk_delete_courses(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(req): Json<BulkDeleteRequest>,
) -> Result<Json<BatchDeleteReport>, AppError> {
    let report = state.storage.delete_multiple_courses(&req.ids).await?;
    Ok(Json(report))
}

/// 편집 대화상자의 "저장": 선택된 과목 집합에 맞춰 연결을 삭제/추가합니다.
///
/// 중간에 실패하면 `PARTIAL_SYNC`(이미 적용된 변경 포함)를 반환합니다.
pub async fn sync_course_subjects(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<CourseSubjectsRequest>,
) -> Result<Json<SyncReport<SubjectCourse>>, AppError> {
    let report = sync::sync_course_subjects(state.storage.as_ref(), &id, &req.subject_ids).await?;
    Ok(Json(report))
}
