//! # 과정(Course) 모델
//!
//! 과정은 (학년, 반, 근무조, 전공) 조합으로 식별됩니다.
//!
//! ## 규칙
//! - 학년(year)은 1~6
//! - 3학년 이상은 전공(especialidadId)이 필수, 3학년 미만은 항상 null
//! - 과정 이름(name)은 직접 입력하지 않고 위 값들로부터 만들어집니다
//!   (관계형 저장소에서는 SQL 트리거, 로컬 저장소에서는 `course_display_name`)

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// 전공이 필요한 최소 학년
pub const ESPECIALIDAD_FROM_YEAR: u32 = 3;

/// 근무조: 오전(Mañana) / 오후(Tarde)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Turno {
    #[serde(rename = "Mañana")]
    Manana,
    #[serde(rename = "Tarde")]
    Tarde,
}

impl Turno {
    pub fn as_str(&self) -> &'static str {
        match self {
            Turno::Manana => "Mañana",
            Turno::Tarde => "Tarde",
        }
    }
}

impl fmt::Display for Turno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Turno {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Mañana" => Ok(Turno::Manana),
            "Tarde" => Ok(Turno::Tarde),
            other => Err(AppError::Internal(format!("unknown turno: {}", other))),
        }
    }
}

/// 과정 엔티티: `courses` 테이블 / `libro_temas_courses` 키
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    /// 표시용 이름 (예: "3° 2ª - Tarde - Informática")
    pub name: String,
    pub year: u32,
    pub division: u32,
    pub turno: Turno,
    pub especialidad_id: Option<String>,
    pub created_at: String,
}

/// 과정의 자연키: 중복 검사에 사용합니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CourseKey {
    pub year: u32,
    pub division: u32,
    pub turno: Turno,
    pub especialidad_id: Option<String>,
}

impl Course {
    pub fn key(&self) -> CourseKey {
        CourseKey {
            year: self.year,
            division: self.division,
            turno: self.turno,
            especialidad_id: self.especialidad_id.clone(),
        }
    }
}

/// 과정 생성 요청: `POST /api/v1/courses`
///
/// `especialidad_id`는 빈 문자열도 "없음"으로 취급합니다 (폼의 미선택 값).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCourse {
    pub year: u32,
    pub division: u32,
    pub turno: Turno,
    #[serde(default)]
    pub especialidad_id: Option<String>,
}

impl NewCourse {
    pub fn key(&self) -> CourseKey {
        CourseKey {
            year: self.year,
            division: self.division,
            turno: self.turno,
            especialidad_id: self.especialidad_id.clone(),
        }
    }
}

/// 과정 수정 요청: `PATCH /api/v1/courses/{id}`
///
/// 병합 후 학년이 3 미만이면 전공은 항상 null이 됩니다.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoursePatch {
    pub year: Option<u32>,
    pub division: Option<u32>,
    pub turno: Option<Turno>,
    pub especialidad_id: Option<String>,
}

impl CoursePatch {
    /// 기존 과정에 변경 사항을 합쳐 정규화 전의 입력값을 만듭니다.
    pub fn merge_into(&self, current: &Course) -> NewCourse {
        NewCourse {
            year: self.year.unwrap_or(current.year),
            division: self.division.unwrap_or(current.division),
            turno: self.turno.unwrap_or(current.turno),
            especialidad_id: self
                .especialidad_id
                .clone()
                .or_else(|| current.especialidad_id.clone()),
        }
    }
}

/// 과정 표시 이름을 만듭니다.
///
/// `migrations/`의 트리거와 같은 문자열을 만들어야 합니다.
pub fn course_display_name(
    year: u32,
    division: u32,
    turno: Turno,
    especialidad_name: Option<&str>,
) -> String {
    let mut name = format!("{}° {}ª - {}", year, division, turno);
    if let Some(especialidad) = especialidad_name {
        name.push_str(" - ");
        name.push_str(especialidad);
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_without_especialidad() {
        assert_eq!(course_display_name(1, 2, Turno::Manana, None), "1° 2ª - Mañana");
    }

    #[test]
    fn display_name_with_especialidad() {
        assert_eq!(
            course_display_name(4, 1, Turno::Tarde, Some("Informática")),
            "4° 1ª - Tarde - Informática"
        );
    }

    #[test]
    fn turno_uses_spanish_wire_names() {
        assert_eq!(serde_json::to_string(&Turno::Manana).unwrap(), "\"Mañana\"");
        assert_eq!("Tarde".parse::<Turno>().unwrap(), Turno::Tarde);
    }

    #[test]
    fn patch_keeps_untouched_fields() {
        let course = Course {
            id: "c1".into(),
            name: "3° 1ª - Mañana - Química".into(),
            year: 3,
            division: 1,
            turno: Turno::Manana,
            especialidad_id: Some("e1".into()),
            created_at: "2026-01-01T00:00:00.000Z".into(),
        };
        let merged = CoursePatch {
            division: Some(2),
            ..Default::default()
        }
        .merge_into(&course);
        assert_eq!(merged.year, 3);
        assert_eq!(merged.division, 2);
        assert_eq!(merged.especialidad_id.as_deref(), Some("e1"));
    }
}
