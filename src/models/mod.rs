//! # 데이터 모델 모듈
//!
//! 수업 기록부 서비스에서 사용하는 데이터 구조체(struct)들을 정의합니다.
//! - `user`: 사용자(User)와 역할(UserRole), 로그인 요청
//! - `subject`: 과목(Subject)과 전공(Especialidad)
//! - `course`: 과정(Course), 근무조(Turno), 과정 이름 규칙
//! - `assignment`: 과목-과정 연결(SubjectCourse), 교사 할당(TeacherSubject)
//! - `logbook`: 수업 기록부(Logbook)와 수업(ClassSession), 검증 상태
//!
//! 모든 엔티티는 camelCase JSON으로 직렬화됩니다.
//! 로컬 저장소의 텍스트 블롭과 API 응답이 같은 형식을 씁니다.

pub mod assignment;
pub mod course;
pub mod logbook;
pub mod subject;
pub mod user;

pub use assignment::*;
pub use course::*;
pub use logbook::*;
pub use subject::*;
pub use user::*;

use serde::{Deserialize, Serialize};

/// 현재 UTC 시각을 ISO 8601(밀리초) 문자열로 반환합니다.
///
/// 예: "2026-02-16T12:00:00.000Z"
/// 모든 생성/수정 시각이 같은 형식이므로 문자열 비교가 곧 시간 비교입니다.
pub fn now_iso() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

/// 새 레코드 ID (UUIDv7, 생성 순서대로 정렬 가능)
pub fn new_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

/// 일괄 삭제 요청: `POST /api/v1/{collection}/bulk-delete`
#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    pub ids: Vec<String>,
}

/// 일괄 삭제 결과
///
/// 일괄 삭제는 트랜잭션이 아닙니다. ID를 순서대로 처리하고,
/// 실패한 ID는 `failed`에 기록한 뒤 나머지를 계속 처리합니다.
#[derive(Debug, Default, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BatchDeleteReport {
    pub deleted: Vec<String>,
    pub failed: Vec<BatchDeleteFailure>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BatchDeleteFailure {
    pub id: String,
    pub message: String,
}

impl BatchDeleteReport {
    pub fn record(&mut self, id: &str, result: Result<(), crate::error::AppError>) {
        match result {
            Ok(()) => self.deleted.push(id.to_string()),
            Err(e) => {
                tracing::warn!(id, error = %e, "batch delete entry failed");
                self.failed.push(BatchDeleteFailure {
                    id: id.to_string(),
                    message: e.to_string(),
                });
            }
        }
    }
}
