//! # 입력 검증 및 중복 검사
//!
//! 생성/수정 전에 자연키(DNI, 과목 이름, 과정 조합, 할당 조합)를 검사하는 순수 함수들입니다.
//!
//! 두 곳에서 사용됩니다:
//! - 라우트: 방금 읽어온 목록으로 빠르게 검사해 사용자에게 바로 알려줍니다
//! - 로컬 저장소: 쓰기 잠금 안에서 같은 검사를 다시 수행합니다 (최종 판단)
//!
//! 관계형 저장소에서는 UNIQUE 제약이 최종 판단을 맡습니다.

use crate::{
    error::AppError,
    models::{
        CourseKey, Especialidad, NewCourse, NewUser, Subject, SubjectCourse, TeacherSubject, User,
        ESPECIALIDAD_FROM_YEAR,
    },
};

/// 비밀번호 최소 길이
pub const MIN_PASSWORD_LEN: usize = 4;

/// 사용자 입력을 검증하고 앞뒤 공백을 제거한 값을 돌려줍니다.
pub fn validate_user(input: &NewUser) -> Result<NewUser, AppError> {
    let dni = input.dni.trim();
    let name = input.name.trim();
    if dni.is_empty() || name.is_empty() || input.password.is_empty() {
        return Err(AppError::Validation(
            "Por favor complete todos los campos".to_string(),
        ));
    }
    if !dni.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation(
            "DNI inválido: solo se permiten números".to_string(),
        ));
    }
    if input.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Contraseña muy corta: mínimo {} caracteres",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(NewUser {
        dni: dni.to_string(),
        name: name.to_string(),
        password: input.password.clone(),
        role: input.role,
    })
}

/// DNI 중복 검사. `exclude_id`는 수정 중인 사용자 자신입니다.
pub fn ensure_unique_dni(users: &[User], dni: &str, exclude_id: Option<&str>) -> Result<(), AppError> {
    let taken = users
        .iter()
        .any(|u| u.dni == dni && Some(u.id.as_str()) != exclude_id);
    if taken {
        return Err(AppError::Conflict(format!(
            "Ya existe un usuario con el DNI {}",
            dni
        )));
    }
    Ok(())
}

/// 과목/전공 이름 검증 (공백 제거 후 비어 있으면 안 됨)
pub fn validate_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("El nombre es obligatorio".to_string()));
    }
    Ok(name.to_string())
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// 과목 이름 중복 검사 (대소문자 무시)
pub fn ensure_unique_subject_name(
    subjects: &[Subject],
    name: &str,
    exclude_id: Option<&str>,
) -> Result<(), AppError> {
    let taken = subjects
        .iter()
        .any(|s| same_name(&s.name, name) && Some(s.id.as_str()) != exclude_id);
    if taken {
        return Err(AppError::Conflict(format!(
            "Ya existe una materia con el nombre \"{}\"",
            name.trim()
        )));
    }
    Ok(())
}

/// 전공 이름 중복 검사 (대소문자 무시)
pub fn ensure_unique_especialidad_name(
    especialidades: &[Especialidad],
    name: &str,
) -> Result<(), AppError> {
    if especialidades.iter().any(|e| same_name(&e.name, name)) {
        return Err(AppError::Conflict(format!(
            "Ya existe una especialidad con el nombre \"{}\"",
            name.trim()
        )));
    }
    Ok(())
}

/// 과정 입력을 검증하고 정규화합니다.
///
/// - 학년 1~6, 반 1 이상
/// - 3학년 이상은 전공 필수
/// - 3학년 미만은 입력과 관계없이 전공을 null로 만듭니다
pub fn normalize_course(input: &NewCourse) -> Result<NewCourse, AppError> {
    if !(1..=6).contains(&input.year) {
        return Err(AppError::Validation("El año debe estar entre 1 y 6".to_string()));
    }
    if input.division == 0 {
        return Err(AppError::Validation("La división debe ser mayor a 0".to_string()));
    }

    let especialidad_id = input
        .especialidad_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string);

    let especialidad_id = if input.year >= ESPECIALIDAD_FROM_YEAR {
        match especialidad_id {
            Some(id) => Some(id),
            None => {
                return Err(AppError::Validation(
                    "Por favor seleccione una especialidad para cursos de 3ro en adelante."
                        .to_string(),
                ))
            }
        }
    } else {
        None
    };

    Ok(NewCourse {
        year: input.year,
        division: input.division,
        turno: input.turno,
        especialidad_id,
    })
}

/// (학년, 반, 근무조, 전공) 조합 중복 검사
pub fn ensure_unique_course<'a>(
    existing: impl IntoIterator<Item = (&'a str, CourseKey)>,
    key: &CourseKey,
    exclude_id: Option<&str>,
) -> Result<(), AppError> {
    let taken = existing
        .into_iter()
        .any(|(id, k)| &k == key && Some(id) != exclude_id);
    if taken {
        return Err(AppError::Conflict(
            "Ya existe un curso con esta combinación de año, división, turno y especialidad."
                .to_string(),
        ));
    }
    Ok(())
}

pub fn ensure_unique_subject_course(
    links: &[SubjectCourse],
    subject_id: &str,
    course_id: &str,
) -> Result<(), AppError> {
    if links
        .iter()
        .any(|l| l.subject_id == subject_id && l.course_id == course_id)
    {
        return Err(AppError::Conflict(
            "La materia ya está asignada a este curso.".to_string(),
        ));
    }
    Ok(())
}

pub fn ensure_unique_teacher_subject(
    assignments: &[TeacherSubject],
    teacher_id: &str,
    subject_id: &str,
    course_id: &str,
) -> Result<(), AppError> {
    let taken = assignments.iter().any(|a| {
        a.teacher_id == teacher_id && a.subject_id == subject_id && a.course_id == course_id
    });
    if taken {
        return Err(AppError::Conflict(
            "Este profesor ya está asignado a esta materia y curso.".to_string(),
        ));
    }
    Ok(())
}
