//! # 과목-과정 연결과 교사 할당 핸들러 (관리자 전용)
//!
//! | 메서드 | 경로 | 설명 |
//! |---|---|---|
//! | GET | `/api/v1/subject-courses` | 과목-과정 연결 목록 |
//! | POST | `/api/v1/subject-courses` | 연결 추가 |
//! | DELETE | `/api/v1/subject-courses/{id}` | 연결 삭제 |
//! | GET | `/api/v1/teacher-subjects` | 교사 할당 목록 |
//! | POST | `/api/v1/teacher-subjects` | 할당 추가 (대상은 교사여야 함) |
//! | DELETE | `/api/v1/teacher-subjects/{id}` | 할당 삭제 |
//! | POST | `/api/v1/teacher-subjects/bulk-delete` | 선택한 교사들의 할당 전체 삭제 |
//! | PUT | `/api/v1/teachers/{id}/assignments` | 교사의 할당 집합 동기화 |

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
        BatchDeleteReport, NewSubjectCourse, NewTeacherSubject, SubjectCourse,
        TeacherAssignmentsRequest, TeacherBulkDeleteRequest, TeacherSubject,
    },
    services::{
        guards,
        sync::{self, SyncReport},
    },
};

use super::AppState;

pub async fn list_subject_courses(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let links = state.storage.get_subject_courses().await?;
    Ok(Json(json!({ "subjectCourses": links })))
}

pub async fn create_subject_course(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(req): Json<NewSubjectCourse>,
) -> Result<(StatusCode, Json<SubjectCourse>), AppError> {
    let existing = state.storage.get_subject_courses().await?;
    guards::ensure_unique_subject_course(&existing, &req.subject_id, &req.course_id)?;

    let link = state.storage.add_subject_course(req).await?;
    Ok((StatusCode::CREATED, Json(link)))
}

pub async fn delete_subject_course(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.storage.delete_subject_course(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_teacher_subjects(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let assignments = state.storage.get_teacher_subjects().await?;
    Ok(Json(json!({ "teacherSubjects": assignments })))
}

pub async fn create_teacher_subject(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(req): Json<NewTeacherSubject>,
) -> Result<(StatusCode, Json<TeacherSubject>), AppError> {
    sync::ensure_teacher(state.storage.as_ref(), &req.teacher_id).await?;
    let existing = state.storage.get_teacher_subjects().await?;
    guards::ensure_unique_teacher_subject(
        &existing,
        &req.teacher_id,
        &req.subject_id,
        &req.course_id,
    )?;

    let assignment = state.storage.add_teacher_subject(req).await?;
    tracing::info!(
        assignment_id = %assignment.id,
        teacher_id = %assignment.teacher_id,
        "teacher assignment created"
    );
    Ok((StatusCode::CREATED, Json(assignment)))
}

pub async fn delete_teacher_subject(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.storage.delete_teacher_subject(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// 교사 목록에서 여러 교사를 골라 할당을 모두 지웁니다. 교사 계정은 남습니다.
pub async fn bulk_delete_teacher_assignments(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(req): Json<TeacherBulkDeleteRequest>,
) -> Result<Json<BatchDeleteReport>, AppError> {
    let report = sync::remove_teacher_assignments(state.storage.as_ref(), &req.teacher_ids).await?;
    Ok(Json(report))
}

pub async fn sync_teacher_assignments(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(teacher_id): Path<String>,
    Json(req): Json<TeacherAssignmentsRequest>,
) -> Result<Json<SyncReport<TeacherSubject>>, AppError> {
    let report =
        sync::sync_teacher_assignments(state.storage.as_ref(), &teacher_id, &req.assignments)
            .await?;
    Ok(Json(report))
}
