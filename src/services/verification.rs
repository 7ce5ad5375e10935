//! # 수업 기록과 검증
//!
//! 교사는 자신의 기록부에 수업을 추가하고 교사 검증을 켜고 끕니다.
//! 교장은 수업에 서명(교장 검증)하며, 한 번 서명된 수업은 첫 서명이 유지됩니다.
//!
//! 대시보드 조회(교사/교장 화면)도 여기에 있습니다. 필요한 컬렉션은
//! `tokio::try_join!`으로 동시에 읽습니다.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    error::AppError,
    models::{
        now_iso, ClassSession, Course, Logbook, NewSession, SessionChange, Subject,
        TeacherSubject, User, UserResponse, UserRole,
    },
    storage::Storage,
};

const UNKNOWN: &str = "Desconocido";

pub async fn load_logbook(storage: &dyn Storage, logbook_id: &str) -> Result<Logbook, AppError> {
    storage
        .get_logbook(logbook_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Libro de temas".to_string()))
}

/// 기록부의 주인인 교사만 통과합니다.
pub fn ensure_owner(logbook: &Logbook, user: &User) -> Result<(), AppError> {
    if user.role != UserRole::Profesor || logbook.teacher_id != user.id {
        return Err(AppError::Forbidden(
            "Solo el profesor asignado puede modificar este libro".to_string(),
        ));
    }
    Ok(())
}

/// 주인 교사, 교장, 관리자가 기록부를 볼 수 있습니다.
pub fn ensure_can_view(logbook: &Logbook, user: &User) -> Result<(), AppError> {
    match user.role {
        UserRole::Admin | UserRole::Director => Ok(()),
        UserRole::Profesor if logbook.teacher_id == user.id => Ok(()),
        UserRole::Profesor => Err(AppError::Forbidden(
            "No tiene acceso a este libro de temas".to_string(),
        )),
    }
}

/// 수업을 추가합니다.
///
/// 기록부의 주인은 바뀌지 않으므로 권한 검사는 먼저 읽은 사본으로 하고,
/// 추가 자체는 저장소의 원자적 연산에 맡깁니다.
pub async fn record_session(
    storage: &dyn Storage,
    teacher: &User,
    logbook_id: &str,
    input: NewSession,
    today: NaiveDate,
) -> Result<ClassSession, AppError> {
    let logbook = load_logbook(storage, logbook_id).await?;
    ensure_owner(&logbook, teacher)?;

    let session = storage.append_session(logbook_id, input, today).await?;
    tracing::info!(logbook_id, session_id = %session.id, "class session recorded");
    Ok(session)
}

pub async fn set_teacher_verification(
    storage: &dyn Storage,
    teacher: &User,
    logbook_id: &str,
    session_id: &str,
    verified: bool,
) -> Result<ClassSession, AppError> {
    let logbook = load_logbook(storage, logbook_id).await?;
    ensure_owner(&logbook, teacher)?;

    let (session, _) = storage
        .update_session(
            logbook_id,
            session_id,
            SessionChange::TeacherVerification(verified),
        )
        .await?;
    Ok(session)
}

/// 교장 검증. 이미 서명된 수업이면 저장하지 않고 기존 서명을 그대로 돌려줍니다.
pub async fn verify_session(
    storage: &dyn Storage,
    director: &User,
    logbook_id: &str,
    session_id: &str,
    signature: Option<&str>,
) -> Result<ClassSession, AppError> {
    if director.role != UserRole::Director {
        return Err(AppError::Forbidden(
            "Solo el director puede verificar clases".to_string(),
        ));
    }

    let change = SessionChange::DirectorSignOff {
        director_name: director.name.clone(),
        signature: signature.map(str::to_string),
        verified_at: now_iso(),
    };
    let (session, changed) = storage
        .update_session(logbook_id, session_id, change)
        .await?;

    if changed {
        tracing::info!(logbook_id, session_id, director_id = %director.id, "session verified by director");
    } else {
        tracing::info!(logbook_id, session_id, "session already verified, keeping first sign-off");
    }
    Ok(session)
}

/// 교사 화면의 기록부 한 칸
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherLogbookView {
    pub assignment_id: String,
    pub subject_name: String,
    pub course_name: String,
    pub logbook: Logbook,
}

fn name_maps<'a>(
    subjects: &'a [Subject],
    courses: &'a [Course],
) -> (HashMap<&'a str, &'a str>, HashMap<&'a str, &'a str>) {
    (
        subjects.iter().map(|s| (s.id.as_str(), s.name.as_str())).collect(),
        courses.iter().map(|c| (c.id.as_str(), c.name.as_str())).collect(),
    )
}

/// 교사의 할당마다 기록부를 하나씩 돌려줍니다. 없는 기록부는 이때 만들어집니다.
pub async fn teacher_dashboard(
    storage: &dyn Storage,
    teacher: &User,
) -> Result<Vec<TeacherLogbookView>, AppError> {
    let (assignments, subjects, courses) = tokio::try_join!(
        storage.get_teacher_subjects(),
        storage.get_subjects(),
        storage.get_courses(),
    )?;
    let (subject_names, course_names) = name_maps(&subjects, &courses);

    let mine: Vec<TeacherSubject> = assignments
        .into_iter()
        .filter(|a| a.teacher_id == teacher.id)
        .collect();

    let mut views = Vec::with_capacity(mine.len());
    for assignment in mine {
        let logbook = storage
            .get_or_create_logbook(&teacher.id, &assignment.subject_id, &assignment.course_id)
            .await?;
        views.push(TeacherLogbookView {
            subject_name: subject_names
                .get(assignment.subject_id.as_str())
                .copied()
                .unwrap_or(UNKNOWN)
                .to_string(),
            course_name: course_names
                .get(assignment.course_id.as_str())
                .copied()
                .unwrap_or(UNKNOWN)
                .to_string(),
            assignment_id: assignment.id,
            logbook,
        });
    }
    Ok(views)
}

/// 교장 화면의 교사 목록 한 줄
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TeacherSummary {
    pub teacher: UserResponse,
    pub assignment_count: usize,
    pub logbook_count: usize,
    pub session_count: usize,
    pub pending_director_count: usize,
}

pub async fn director_teachers(storage: &dyn Storage) -> Result<Vec<TeacherSummary>, AppError> {
    let (teachers, assignments, logbooks) = tokio::try_join!(
        storage.get_users_by_role(UserRole::Profesor),
        storage.get_teacher_subjects(),
        storage.get_logbooks(),
    )?;

    Ok(teachers
        .into_iter()
        .map(|teacher| {
            let own: Vec<&Logbook> = logbooks
                .iter()
                .filter(|l| l.teacher_id == teacher.id)
                .collect();
            let session_count = own.iter().map(|l| l.sessions.len()).sum::<usize>();
            let verified = own.iter().map(|l| l.director_verified_count()).sum::<usize>();
            TeacherSummary {
                assignment_count: assignments
                    .iter()
                    .filter(|a| a.teacher_id == teacher.id)
                    .count(),
                logbook_count: own.len(),
                session_count,
                pending_director_count: session_count - verified,
                teacher: teacher.into(),
            }
        })
        .collect())
}

/// 교장 화면의 기록부 한 줄
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectorLogbookView {
    pub teacher_name: String,
    pub subject_name: String,
    pub course_name: String,
    pub teacher_verified_count: usize,
    pub director_verified_count: usize,
    pub logbook: Logbook,
}

pub async fn director_logbooks(
    storage: &dyn Storage,
    teacher_id: Option<&str>,
) -> Result<Vec<DirectorLogbookView>, AppError> {
    let (logbooks, users, subjects, courses) = tokio::try_join!(
        storage.get_logbooks(),
        storage.get_users(),
        storage.get_subjects(),
        storage.get_courses(),
    )?;
    let (subject_names, course_names) = name_maps(&subjects, &courses);
    let teacher_names: HashMap<&str, &str> = users
        .iter()
        .map(|u| (u.id.as_str(), u.name.as_str()))
        .collect();

    Ok(logbooks
        .into_iter()
        .filter(|l| teacher_id.map_or(true, |id| l.teacher_id == id))
        .map(|logbook| DirectorLogbookView {
            teacher_name: teacher_names
                .get(logbook.teacher_id.as_str())
                .copied()
                .unwrap_or(UNKNOWN)
                .to_string(),
            subject_name: subject_names
                .get(logbook.subject_id.as_str())
                .copied()
                .unwrap_or(UNKNOWN)
                .to_string(),
            course_name: course_names
                .get(logbook.course_id.as_str())
                .copied()
                .unwrap_or(UNKNOWN)
                .to_string(),
            teacher_verified_count: logbook.teacher_verified_count(),
            director_verified_count: logbook.director_verified_count(),
            logbook,
        })
        .collect())
}
