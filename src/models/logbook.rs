//! # 수업 기록부(Logbook) 모델
//!
//! 기록부는 (교사, 과목, 과정) 조합마다 하나씩 존재하며 수업(ClassSession) 목록을 소유합니다.
//!
//! ## 수업 검증 상태
//! ```text
//! 교사 검증:  미검증 ⇄ 교사검증        (체크박스, 언제든 되돌릴 수 있음)
//! 교장 검증:  미검증 → 교장검증        (단방향, 이름/서명/시각 기록, 되돌리는 경로 없음)
//! ```
//! 두 상태는 서로 독립적입니다. 순서를 강제하지 않습니다.

use std::{fmt, str::FromStr};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

use super::{new_id, now_iso};

/// 수업의 성격 (8가지)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassCharacter {
    #[serde(rename = "Presentación")]
    Presentacion,
    #[serde(rename = "Teórica")]
    Teorica,
    #[serde(rename = "Práctica")]
    Practica,
    #[serde(rename = "Examen")]
    Examen,
    #[serde(rename = "Sin clase")]
    SinClase,
    #[serde(rename = "Olimpiada Informática")]
    OlimpiadaInformatica,
    #[serde(rename = "Trabajo Final")]
    TrabajoFinal,
    #[serde(rename = "Recuperatorio")]
    Recuperatorio,
}

impl ClassCharacter {
    pub const ALL: [ClassCharacter; 8] = [
        ClassCharacter::Presentacion,
        ClassCharacter::Teorica,
        ClassCharacter::Practica,
        ClassCharacter::Examen,
        ClassCharacter::SinClase,
        ClassCharacter::OlimpiadaInformatica,
        ClassCharacter::TrabajoFinal,
        ClassCharacter::Recuperatorio,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClassCharacter::Presentacion => "Presentación",
            ClassCharacter::Teorica => "Teórica",
            ClassCharacter::Practica => "Práctica",
            ClassCharacter::Examen => "Examen",
            ClassCharacter::SinClase => "Sin clase",
            ClassCharacter::OlimpiadaInformatica => "Olimpiada Informática",
            ClassCharacter::TrabajoFinal => "Trabajo Final",
            ClassCharacter::Recuperatorio => "Recuperatorio",
        }
    }
}

impl fmt::Display for ClassCharacter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClassCharacter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClassCharacter::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| AppError::Internal(format!("unknown class character: {}", s)))
    }
}

/// 교장 검증 정보
///
/// `signature`는 교장이 직접 입력하지 않으면 교장 이름이 들어갑니다.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DirectorVerification {
    pub verified: bool,
    pub director_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<String>,
}

/// 수업 하나: 기록부에 소속되며 기록부 밖에서는 존재하지 않습니다.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClassSession {
    pub id: String,
    /// 날짜(일, 1~31)
    pub day: u32,
    /// 월(1~12)
    pub month: u32,
    pub class_number: u32,
    pub class_character: ClassCharacter,
    /// 그날 수업 내용
    pub content: String,
    /// 과제
    pub task: String,
    pub teacher_verification: bool,
    #[serde(default)]
    pub observations: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub director_verification: Option<DirectorVerification>,
    pub created_at: String,
}

impl ClassSession {
    /// 교사 검증 체크박스: 자유롭게 켜고 끌 수 있습니다.
    pub fn set_teacher_verification(&mut self, verified: bool) {
        self.teacher_verification = verified;
    }

    pub fn is_director_verified(&self) -> bool {
        self.director_verification
            .as_ref()
            .is_some_and(|v| v.verified)
    }

    /// 교장 검증을 기록합니다.
    ///
    /// 이미 검증된 수업이면 아무것도 바꾸지 않고 `false`를 반환합니다.
    /// 첫 서명이 유지되며, 교장 검증을 해제하는 경로는 없습니다.
    pub fn verify_by_director(
        &mut self,
        director_name: &str,
        signature: Option<&str>,
        verified_at: &str,
    ) -> bool {
        if self.is_director_verified() {
            return false;
        }
        let signature = signature
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(director_name);
        self.director_verification = Some(DirectorVerification {
            verified: true,
            director_name: director_name.to_string(),
            signature: Some(signature.to_string()),
            verified_at: Some(verified_at.to_string()),
        });
        true
    }
}

/// 수업 기록부 엔티티
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Logbook {
    pub id: String,
    pub teacher_id: String,
    pub subject_id: String,
    pub course_id: String,
    #[serde(default)]
    pub sessions: Vec<ClassSession>,
    pub created_at: String,
    pub updated_at: String,
}

/// 새 수업 입력: `POST /api/v1/logbooks/{id}/sessions`
///
/// 날짜/월이 없으면 오늘 날짜, 수업 번호가 없으면 (기존 수업 수 + 1)을 씁니다.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSession {
    pub day: Option<u32>,
    pub month: Option<u32>,
    pub class_number: Option<u32>,
    pub class_character: Option<ClassCharacter>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub task: String,
    #[serde(default)]
    pub teacher_verification: bool,
    #[serde(default)]
    pub observations: String,
}

/// `PATCH /api/v1/logbooks/{id}/sessions/{sid}/teacher-verification`
#[derive(Debug, Deserialize)]
pub struct TeacherVerificationRequest {
    pub verified: bool,
}

/// `POST /api/v1/logbooks/{id}/sessions/{sid}/director-verification`
#[derive(Debug, Default, Deserialize)]
pub struct DirectorVerificationRequest {
    #[serde(default)]
    pub signature: Option<String>,
}

impl Logbook {
    /// 빈 기록부를 만듭니다 (아직 저장되지 않음).
    pub fn new(teacher_id: &str, subject_id: &str, course_id: &str) -> Self {
        let now = now_iso();
        Self {
            id: new_id(),
            teacher_id: teacher_id.to_string(),
            subject_id: subject_id.to_string(),
            course_id: course_id.to_string(),
            sessions: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn matches_assignment(&self, teacher_id: &str, subject_id: &str, course_id: &str) -> bool {
        self.teacher_id == teacher_id && self.subject_id == subject_id && self.course_id == course_id
    }

    pub fn session_mut(&mut self, session_id: &str) -> Option<&mut ClassSession> {
        self.sessions.iter_mut().find(|s| s.id == session_id)
    }

    pub fn teacher_verified_count(&self) -> usize {
        self.sessions.iter().filter(|s| s.teacher_verification).count()
    }

    pub fn director_verified_count(&self) -> usize {
        self.sessions.iter().filter(|s| s.is_director_verified()).count()
    }

    /// 새 수업을 기록부 끝에 추가하고 추가된 수업을 반환합니다.
    ///
    /// 내용/과제/성격은 필수입니다. `today`는 날짜 기본값에 쓰입니다.
    pub fn append_session(
        &mut self,
        input: NewSession,
        today: NaiveDate,
    ) -> Result<ClassSession, AppError> {
        let content = input.content.trim();
        let task = input.task.trim();
        let Some(class_character) = input.class_character else {
            return Err(AppError::Validation(
                "Por favor complete todos los campos obligatorios".to_string(),
            ));
        };
        if content.is_empty() || task.is_empty() {
            return Err(AppError::Validation(
                "Por favor complete todos los campos obligatorios".to_string(),
            ));
        }

        let day = input.day.unwrap_or_else(|| today.day());
        let month = input.month.unwrap_or_else(|| today.month());
        if !(1..=31).contains(&day) {
            return Err(AppError::Validation("Día inválido (1-31)".to_string()));
        }
        if !(1..=12).contains(&month) {
            return Err(AppError::Validation("Mes inválido (1-12)".to_string()));
        }

        let next_number = u32::try_from(self.sessions.len() + 1).unwrap_or(u32::MAX);
        let class_number = input.class_number.unwrap_or(next_number);
        if class_number == 0 {
            return Err(AppError::Validation("Número de clase inválido".to_string()));
        }

        let now = now_iso();
        let session = ClassSession {
            id: new_id(),
            day,
            month,
            class_number,
            class_character,
            content: content.to_string(),
            task: task.to_string(),
            teacher_verification: input.teacher_verification,
            observations: input.observations.trim().to_string(),
            director_verification: None,
            created_at: now.clone(),
        };
        self.sessions.push(session.clone());
        self.updated_at = now;
        Ok(session)
    }

    /// 저장된 교장 검증을 들어온 수업 목록에 다시 씌웁니다.
    ///
    /// 통째로 저장할 때 오래된 사본이 교장 검증을 지우거나 바꾸지 못하게 합니다.
    pub fn keep_director_sign_offs(&mut self, stored: &[ClassSession]) {
        for session in &mut self.sessions {
            if let Some(previous) = stored
                .iter()
                .find(|s| s.id == session.id && s.is_director_verified())
            {
                session.director_verification = previous.director_verification.clone();
            }
        }
    }
}

/// 저장된 수업 한 건에 대한 변경
///
/// 저장소가 읽기와 쓰기 사이에 잠금(또는 트랜잭션)을 유지한 채 적용합니다.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionChange {
    TeacherVerification(bool),
    DirectorSignOff {
        director_name: String,
        signature: Option<String>,
        verified_at: String,
    },
}

impl SessionChange {
    /// 변경을 적용하고, 실제로 값이 바뀌었으면 `true`를 반환합니다.
    pub fn apply(&self, session: &mut ClassSession) -> bool {
        match self {
            SessionChange::TeacherVerification(verified) => {
                let changed = session.teacher_verification != *verified;
                session.set_teacher_verification(*verified);
                changed
            }
            SessionChange::DirectorSignOff {
                director_name,
                signature,
                verified_at,
            } => session.verify_by_director(director_name, signature.as_deref(), verified_at),
        }
    }
}
