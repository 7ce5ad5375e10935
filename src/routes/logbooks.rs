//! # 수업 기록부 핸들러
//!
//! 교사 화면과 교장 화면의 동작을 JSON API로 노출합니다.
//!
//! | 메서드 | 경로 | 권한 | 설명 |
//! |---|---|---|---|
//! | GET | `/api/v1/teacher/logbooks` | 교사 | 할당마다 기록부 하나 (없으면 생성) |
//! | POST | `/api/v1/logbooks/{id}/sessions` | 담당 교사 | 수업 추가 |
//! | PATCH | `/api/v1/logbooks/{id}/sessions/{sid}/teacher-verification` | 담당 교사 | 교사 검증 켜기/끄기 |
//! | GET | `/api/v1/director/teachers` | 교장 | 교사별 기록부 요약 |
//! | GET | `/api/v1/director/logbooks?teacherId=` | 교장 | 기록부 목록 (교사 필터 선택) |
//! | POST | `/api/v1/logbooks/{id}/sessions/{sid}/director-verification` | 교장 | 교장 서명 |
//! | GET | `/api/v1/logbooks/{id}/export` | 담당 교사, 교장, 관리자 | xlsx 다운로드 |
//!
//! "오늘" 날짜는 서버의 로컬 시간대 기준입니다.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::AppError,
    middleware::auth::{CurrentUser, DirectorUser, TeacherUser},
    models::{
        ClassSession, DirectorVerificationRequest, NewSession, TeacherVerificationRequest,
    },
    services::{export, verification},
};

use super::AppState;

fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub async fn teacher_logbooks(
    TeacherUser(teacher): TeacherUser,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let logbooks = verification::teacher_dashboard(state.storage.as_ref(), &teacher).await?;
    Ok(Json(json!({ "logbooks": logbooks })))
}

pub async fn add_session(
    TeacherUser(teacher): TeacherUser,
    State(state): State<AppState>,
    Path(logbook_id): Path<String>,
    Json(req): Json<NewSession>,
) -> Result<(StatusCode, Json<ClassSession>), AppError> {
    let session =
        verification::record_session(state.storage.as_ref(), &teacher, &logbook_id, req, today())
            .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn teacher_verification(
    TeacherUser(teacher): TeacherUser,
    State(state): State<AppState>,
    Path((logbook_id, session_id)): Path<(String, String)>,
    Json(req): Json<TeacherVerificationRequest>,
) -> Result<Json<ClassSession>, AppError> {
    let session = verification::set_teacher_verification(
        state.storage.as_ref(),
        &teacher,
        &logbook_id,
        &session_id,
        req.verified,
    )
    .await?;
    Ok(Json(session))
}

pub async fn director_teachers(
    _director: DirectorUser,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let teachers = verification::director_teachers(state.storage.as_ref()).await?;
    Ok(Json(json!({ "teachers": teachers })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectorLogbooksQuery {
    pub teacher_id: Option<String>,
}

pub async fn director_logbooks(
    _director: DirectorUser,
    State(state): State<AppState>,
    Query(query): Query<DirectorLogbooksQuery>,
) -> Result<Json<Value>, AppError> {
    let teacher_id = query.teacher_id.as_deref().filter(|id| !id.is_empty());
    let logbooks = verification::director_logbooks(state.storage.as_ref(), teacher_id).await?;
    Ok(Json(json!({ "logbooks": logbooks })))
}

pub async fn director_verification(
    DirectorUser(director): DirectorUser,
    State(state): State<AppState>,
    Path((logbook_id, session_id)): Path<(String, String)>,
    Json(req): Json<DirectorVerificationRequest>,
) -> Result<Json<ClassSession>, AppError> {
    let session = verification::verify_session(
        state.storage.as_ref(),
        &director,
        &logbook_id,
        &session_id,
        req.signature.as_deref(),
    )
    .await?;
    Ok(Json(session))
}

/// 파일 이름은 `export_file_name`이 ASCII로 정리하므로 헤더에 그대로 넣을 수 있습니다.
pub async fn export_logbook(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(logbook_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let file =
        export::export_logbook(state.storage.as_ref(), &user, &logbook_id, today()).await?;

    Ok((
        [
            (header::CONTENT_TYPE, export::XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file.file_name),
            ),
        ],
        file.bytes,
    ))
}
