//! # 과목(Subject)과 전공(Especialidad) 모델
//!
//! 두 엔티티 모두 이름 하나만 가지며, 이름은 대소문자를 구분하지 않고 유일해야 합니다.
//! 전공은 3학년 이상의 과정(Course)에만 연결됩니다.

use serde::{Deserialize, Serialize};

/// 과목 엔티티: `subjects` 테이블 / `libro_temas_subjects` 키
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

/// 과목 생성 요청: `POST /api/v1/subjects`
#[derive(Debug, Clone, Deserialize)]
pub struct NewSubject {
    pub name: String,
}

/// 과목 수정 요청: `PATCH /api/v1/subjects/{id}`
/// 필드가 None이면 기존 값을 유지합니다.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubjectPatch {
    pub name: Option<String>,
}

/// 전공 엔티티: `especialidades` 테이블 / `libro_temas_especialidades` 키
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Especialidad {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

/// 전공 생성 요청: `POST /api/v1/especialidades`
#[derive(Debug, Clone, Deserialize)]
pub struct NewEspecialidad {
    pub name: String,
}
