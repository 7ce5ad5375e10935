//! # 수업 기록부 쿼리
//!
//! 기록부 한 건은 `logbooks` 한 행과 `class_sessions` 여러 행으로 저장됩니다.
//! 수업 순서는 `position` 컬럼이 유지하고, 교장 검증 정보는 JSON 텍스트로 저장합니다.
//!
//! ## 저장 흐름 (`save_logbook`)
//! ```text
//! ID 또는 (교사, 과목, 과정)으로 기존 행 찾기
//!   ├─ 있음 → updated_at 갱신(MAX), 교장 검증 보존, 수업 전부 삭제 후 다시 삽입
//!   └─ 없음 → 새 행 삽입, 수업 삽입
//! ```
//! 한 트랜잭션 안에서 실행되므로 수업 목록이 반쯤 바뀐 상태는 보이지 않습니다.
//!
//! 수업 한 건의 추가/변경(`append_session`, `update_session`)은 해당 `class_sessions`
//! 행만 건드립니다. 모든 쓰기 트랜잭션은 `logbooks` 행에 대한 UPDATE로 시작해서
//! 처음부터 쓰기 잠금을 잡습니다. 읽기 잠금에서 쓰기 잠금으로 올리다가
//! `SQLITE_BUSY`로 실패하는 경우가 없고, 같은 기록부에 대한 쓰기는 차례로 실행됩니다.

use std::collections::HashMap;

use crate::error::AppError;
use chrono::NaiveDate;

use crate::models::{
    now_iso, ClassSession, DirectorVerification, Logbook, NewSession, SessionChange,
};
use sqlx::{Executor, Sqlite, SqlitePool, Transaction};

#[derive(Debug, sqlx::FromRow)]
pub struct LogbookRow {
    pub id: String,
    pub teacher_id: String,
    pub subject_id: String,
    pub course_id: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, sqlx::FromRow)]
pub struct SessionRow {
    pub id: String,
    pub logbook_id: String,
    pub day: u32,
    pub month: u32,
    pub class_number: u32,
    pub class_character: String,
    pub content: String,
    pub task: String,
    pub teacher_verification: bool,
    pub observations: String,
    pub director_verification: Option<String>,
    pub created_at: String,
}

impl TryFrom<SessionRow> for ClassSession {
    type Error = AppError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        let director_verification = row
            .director_verification
            .as_deref()
            .map(serde_json::from_str::<DirectorVerification>)
            .transpose()?;

        Ok(ClassSession {
            id: row.id,
            day: row.day,
            month: row.month,
            class_number: row.class_number,
            class_character: row.class_character.parse()?,
            content: row.content,
            task: row.task,
            teacher_verification: row.teacher_verification,
            observations: row.observations,
            director_verification,
            created_at: row.created_at,
        })
    }
}

fn assemble(row: LogbookRow, sessions: Vec<ClassSession>) -> Logbook {
    Logbook {
        id: row.id,
        teacher_id: row.teacher_id,
        subject_id: row.subject_id,
        course_id: row.course_id,
        sessions,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

const SESSION_COLUMNS: &str = r#"
    SELECT id, logbook_id, day, month, class_number, class_character, content, task,
           teacher_verification, observations, director_verification, created_at
    FROM class_sessions
"#;

async fn sessions_of<'e, E>(executor: E, logbook_id: &str) -> Result<Vec<ClassSession>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("{} WHERE logbook_id = ? ORDER BY position", SESSION_COLUMNS);
    let rows = sqlx::query_as::<_, SessionRow>(&sql)
        .bind(logbook_id)
        .fetch_all(executor)
        .await?;

    rows.into_iter().map(ClassSession::try_from).collect()
}

pub async fn list_logbooks(pool: &SqlitePool) -> Result<Vec<Logbook>, AppError> {
    let rows = sqlx::query_as::<_, LogbookRow>(
        r#"
        SELECT id, teacher_id, subject_id, course_id, created_at, updated_at
        FROM logbooks
        ORDER BY created_at, id
        "#,
    )
    .fetch_all(pool)
    .await?;

    let sql = format!("{} ORDER BY logbook_id, position", SESSION_COLUMNS);
    let session_rows = sqlx::query_as::<_, SessionRow>(&sql)
        .fetch_all(pool)
        .await?;

    let mut by_logbook: HashMap<String, Vec<ClassSession>> = HashMap::new();
    for row in session_rows {
        let logbook_id = row.logbook_id.clone();
        by_logbook
            .entry(logbook_id)
            .or_default()
            .push(ClassSession::try_from(row)?);
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let sessions = by_logbook.remove(&row.id).unwrap_or_default();
            assemble(row, sessions)
        })
        .collect())
}

pub async fn get_logbook(pool: &SqlitePool, id: &str) -> Result<Option<Logbook>, AppError> {
    let row = sqlx::query_as::<_, LogbookRow>(
        r#"
        SELECT id, teacher_id, subject_id, course_id, created_at, updated_at
        FROM logbooks
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let sessions = sessions_of(pool, &row.id).await?;
            Ok(Some(assemble(row, sessions)))
        }
        None => Ok(None),
    }
}

pub async fn find_by_assignment(
    pool: &SqlitePool,
    teacher_id: &str,
    subject_id: &str,
    course_id: &str,
) -> Result<Option<Logbook>, AppError> {
    let id = sqlx::query_as::<_, (String,)>(
        r#"
        SELECT id FROM logbooks
        WHERE teacher_id = ? AND subject_id = ? AND course_id = ?
        "#,
    )
    .bind(teacher_id)
    .bind(subject_id)
    .bind(course_id)
    .fetch_optional(pool)
    .await?;

    match id {
        Some((id,)) => get_logbook(pool, &id).await,
        None => Ok(None),
    }
}

async fn insert_session(
    tx: &mut Transaction<'_, Sqlite>,
    logbook_id: &str,
    position: usize,
    session: &ClassSession,
) -> Result<(), AppError> {
    let director_verification = session
        .director_verification
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    sqlx::query(
        r#"
        INSERT INTO class_sessions (
            id, logbook_id, position, day, month, class_number, class_character,
            content, task, teacher_verification, observations, director_verification,
            created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&session.id)
    .bind(logbook_id)
    .bind(position as i64)
    .bind(session.day)
    .bind(session.month)
    .bind(session.class_number)
    .bind(session.class_character.as_str())
    .bind(&session.content)
    .bind(&session.task)
    .bind(session.teacher_verification)
    .bind(&session.observations)
    .bind(director_verification)
    .bind(&session.created_at)
    .execute(&mut **tx)
    .await
    .map_err(|e| AppError::from_write(e, "Clase duplicada"))?;
    Ok(())
}

async fn insert_sessions(
    tx: &mut Transaction<'_, Sqlite>,
    logbook_id: &str,
    sessions: &[ClassSession],
) -> Result<(), AppError> {
    for (position, session) in sessions.iter().enumerate() {
        insert_session(tx, logbook_id, position, session).await?;
    }
    Ok(())
}

/// 기록부를 삽입하거나 수업 목록을 통째로 바꿉니다. 저장된 ID를 반환합니다.
pub async fn save_logbook(pool: &SqlitePool, logbook: &Logbook) -> Result<String, AppError> {
    let mut tx = pool.begin().await?;
    let now = now_iso();

    sqlx::query(
        r#"
        UPDATE logbooks SET updated_at = MAX(updated_at, ?)
        WHERE id = ? OR (teacher_id = ? AND subject_id = ? AND course_id = ?)
        "#,
    )
    .bind(&now)
    .bind(&logbook.id)
    .bind(&logbook.teacher_id)
    .bind(&logbook.subject_id)
    .bind(&logbook.course_id)
    .execute(&mut *tx)
    .await?;

    let existing = sqlx::query_as::<_, (String,)>(
        r#"
        SELECT id FROM logbooks
        WHERE id = ? OR (teacher_id = ? AND subject_id = ? AND course_id = ?)
        ORDER BY id = ? DESC
        LIMIT 1
        "#,
    )
    .bind(&logbook.id)
    .bind(&logbook.teacher_id)
    .bind(&logbook.subject_id)
    .bind(&logbook.course_id)
    .bind(&logbook.id)
    .fetch_optional(&mut *tx)
    .await?;

    let mut incoming = logbook.clone();
    let id = match existing {
        Some((id,)) => {
            let stored = sessions_of(&mut *tx, &id).await?;
            incoming.keep_director_sign_offs(&stored);

            sqlx::query("DELETE FROM class_sessions WHERE logbook_id = ?")
                .bind(&id)
                .execute(&mut *tx)
                .await?;
            id
        }
        None => {
            let id = if logbook.id.is_empty() {
                crate::models::new_id()
            } else {
                logbook.id.clone()
            };
            let created_at = if logbook.created_at.is_empty() {
                now.clone()
            } else {
                logbook.created_at.clone()
            };
            sqlx::query(
                r#"
                INSERT INTO logbooks (id, teacher_id, subject_id, course_id, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&id)
            .bind(&logbook.teacher_id)
            .bind(&logbook.subject_id)
            .bind(&logbook.course_id)
            .bind(&created_at)
            .bind(&now)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::from_write(e, "El libro de temas ya existe"))?;
            id
        }
    };

    insert_sessions(&mut tx, &id, &incoming.sessions).await?;
    tx.commit().await?;

    Ok(id)
}

/// 쓰기 잠금을 먼저 잡고 트랜잭션 안에서 기록부를 읽습니다.
///
/// `touch`가 `true`면 `updated_at`을 지금 시각으로 올립니다(줄어들지는 않음).
async fn lock_logbook(
    tx: &mut Transaction<'_, Sqlite>,
    logbook_id: &str,
    touch: bool,
) -> Result<Logbook, AppError> {
    let now = now_iso();
    let touched = sqlx::query(
        r#"
        UPDATE logbooks
        SET updated_at = CASE WHEN ? THEN MAX(updated_at, ?) ELSE updated_at END
        WHERE id = ?
        "#,
    )
    .bind(touch)
    .bind(&now)
    .bind(logbook_id)
    .execute(&mut **tx)
    .await?;
    if touched.rows_affected() == 0 {
        return Err(AppError::NotFound("Libro de temas".to_string()));
    }

    let row = sqlx::query_as::<_, LogbookRow>(
        r#"
        SELECT id, teacher_id, subject_id, course_id, created_at, updated_at
        FROM logbooks
        WHERE id = ?
        "#,
    )
    .bind(logbook_id)
    .fetch_one(&mut **tx)
    .await?;
    let sessions = sessions_of(&mut **tx, logbook_id).await?;
    Ok(assemble(row, sessions))
}

/// 수업 한 건을 기록부 끝에 추가합니다. 새 `class_sessions` 행 하나만 삽입합니다.
pub async fn append_session(
    pool: &SqlitePool,
    logbook_id: &str,
    input: NewSession,
    today: NaiveDate,
) -> Result<ClassSession, AppError> {
    let mut tx = pool.begin().await?;
    let mut logbook = lock_logbook(&mut tx, logbook_id, true).await?;

    let position = logbook.sessions.len();
    let session = logbook.append_session(input, today)?;
    insert_session(&mut tx, logbook_id, position, &session).await?;
    tx.commit().await?;

    Ok(session)
}

/// 수업 한 건에 변경을 적용합니다. 바뀐 값이 없으면 쓰지 않고 롤백합니다.
pub async fn update_session(
    pool: &SqlitePool,
    logbook_id: &str,
    session_id: &str,
    change: &SessionChange,
) -> Result<(ClassSession, bool), AppError> {
    let mut tx = pool.begin().await?;
    let mut logbook = lock_logbook(&mut tx, logbook_id, false).await?;

    let session = logbook
        .session_mut(session_id)
        .ok_or_else(|| AppError::NotFound("Clase".to_string()))?;
    if !change.apply(session) {
        return Ok((session.clone(), false));
    }
    let session = session.clone();

    let director_verification = session
        .director_verification
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;
    sqlx::query(
        r#"
        UPDATE class_sessions
        SET teacher_verification = ?, director_verification = ?
        WHERE id = ? AND logbook_id = ?
        "#,
    )
    .bind(session.teacher_verification)
    .bind(director_verification)
    .bind(session_id)
    .bind(logbook_id)
    .execute(&mut *tx)
    .await?;
    sqlx::query("UPDATE logbooks SET updated_at = MAX(updated_at, ?) WHERE id = ?")
        .bind(now_iso())
        .bind(logbook_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    Ok((session, true))
}
