//! # 라우트 핸들러 모듈
//!
//! HTTP 요청을 처리하는 핸들러 함수들을 모아둔 모듈입니다.
//! 모든 엔드포인트는 `/api/v1` 아래에 있습니다.
//!
//! 각 하위 모듈:
//! - `health`: 서버 상태와 사용 중인 저장소 종류
//! - `auth`: 로그인, 로그아웃, 현재 사용자
//! - `users`: 사용자 관리 (관리자)
//! - `subjects`: 과목과 전공 관리
//! - `courses`: 과정 관리와 과정-과목 동기화
//! - `assignments`: 과목-과정 연결, 교사 할당
//! - `logbooks`: 교사/교장 대시보드, 수업 기록, 검증, 내보내기

pub mod assignments;
pub mod auth;
pub mod courses;
pub mod health;
pub mod logbooks;
pub mod subjects;
pub mod users;

use std::sync::Arc;

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::storage::{DeviceSession, Storage};

/// 애플리케이션 공유 상태
///
/// Axum의 `State` 추출기로 모든 핸들러에 주입됩니다.
/// `Arc`와 `DeviceSession` 모두 복제 비용이 작아서 요청마다 clone해도 됩니다.
#[derive(Clone)]
pub struct AppState {
    /// 시작할 때 한 번 선택된 저장소 (로컬 또는 관계형)
    pub storage: Arc<dyn Storage>,
    /// 이 기기의 현재 로그인 사용자 포인터
    pub device: DeviceSession,
}

/// `/api/v1` 아래의 라우트 테이블
pub fn api_routes() -> Router<AppState> {
    let auth_routes = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me));

    let admin_routes = Router::new()
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/{id}",
            patch(users::update_user).delete(users::delete_user),
        )
        .route("/users/bulk-delete", post(users::bulk_delete_users))
        .route(
            "/subjects",
            get(subjects::list_subjects).post(subjects::create_subject),
        )
        .route(
            "/subjects/{id}",
            patch(subjects::update_subject).delete(subjects::delete_subject),
        )
        .route("/subjects/bulk-delete", post(subjects::bulk_delete_subjects))
        .route(
            "/especialidades",
            get(subjects::list_especialidades).post(subjects::create_especialidad),
        )
        .route("/especialidades/{id}", delete(subjects::delete_especialidad))
        .route(
            "/courses",
            get(courses::list_courses).post(courses::create_course),
        )
        .route(
            "/courses/{id}",
            patch(courses::update_course).delete(courses::delete_course),
        )
        .route("/courses/bulk-delete", post(courses::bulk_delete_courses))
        .route("/courses/{id}/subjects", put(courses::sync_course_subjects))
        .route(
            "/subject-courses",
            get(assignments::list_subject_courses).post(assignments::create_subject_course),
        )
        .route(
            "/subject-courses/{id}",
            delete(assignments::delete_subject_course),
        )
        .route(
            "/teacher-subjects",
            get(assignments::list_teacher_subjects).post(assignments::create_teacher_subject),
        )
        .route(
            "/teacher-subjects/{id}",
            delete(assignments::delete_teacher_subject),
        )
        .route(
            "/teacher-subjects/bulk-delete",
            post(assignments::bulk_delete_teacher_assignments),
        )
        .route(
            "/teachers/{id}/assignments",
            put(assignments::sync_teacher_assignments),
        );

    let logbook_routes = Router::new()
        .route("/teacher/logbooks", get(logbooks::teacher_logbooks))
        .route("/logbooks/{id}/sessions", post(logbooks::add_session))
        .route(
            "/logbooks/{id}/sessions/{session_id}/teacher-verification",
            patch(logbooks::teacher_verification),
        )
        .route(
            "/logbooks/{id}/sessions/{session_id}/director-verification",
            post(logbooks::director_verification),
        )
        .route("/logbooks/{id}/export", get(logbooks::export_logbook))
        .route("/director/teachers", get(logbooks::director_teachers))
        .route("/director/logbooks", get(logbooks::director_logbooks));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(auth_routes)
        .merge(admin_routes)
        .merge(logbook_routes)
}

/// 전체 애플리케이션 라우터: `/api/v1` 중첩, CORS, 요청 로깅
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api/v1", api_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
