//! # 과목/전공 쿼리
//!
//! 이름 중복은 `name_key` 컬럼(공백 제거 + 소문자)의 UNIQUE 제약으로 막습니다.
//! SQLite의 `lower()`는 ASCII만 바꾸므로 키는 애플리케이션에서 계산합니다.

use crate::error::AppError;
use crate::models::{Especialidad, Subject};
use sqlx::SqlitePool;

pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

#[derive(Debug, sqlx::FromRow)]
pub struct NamedRow {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

impl From<NamedRow> for Subject {
    fn from(row: NamedRow) -> Self {
        Subject {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

impl From<NamedRow> for Especialidad {
    fn from(row: NamedRow) -> Self {
        Especialidad {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

pub async fn list_subjects(pool: &SqlitePool) -> Result<Vec<Subject>, AppError> {
    let rows = sqlx::query_as::<_, NamedRow>(
        "SELECT id, name, created_at FROM subjects ORDER BY created_at, id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Subject::from).collect())
}

pub async fn get_subject(pool: &SqlitePool, id: &str) -> Result<Option<Subject>, AppError> {
    let row = sqlx::query_as::<_, NamedRow>(
        "SELECT id, name, created_at FROM subjects WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Subject::from))
}

pub async fn create_subject(pool: &SqlitePool, id: &str, name: &str) -> Result<Subject, AppError> {
    sqlx::query("INSERT INTO subjects (id, name, name_key) VALUES (?, ?, ?)")
        .bind(id)
        .bind(name)
        .bind(name_key(name))
        .execute(pool)
        .await
        .map_err(|e| {
            AppError::from_write(e, &format!("Ya existe una materia con el nombre \"{}\"", name))
        })?;

    get_subject(pool, id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created subject".to_string()))
}

pub async fn rename_subject(pool: &SqlitePool, id: &str, name: &str) -> Result<u64, AppError> {
    let result = sqlx::query("UPDATE subjects SET name = ?, name_key = ? WHERE id = ?")
        .bind(name)
        .bind(name_key(name))
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| {
            AppError::from_write(e, &format!("Ya existe una materia con el nombre \"{}\"", name))
        })?;

    Ok(result.rows_affected())
}

pub async fn delete_subject(pool: &SqlitePool, id: &str) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM subjects WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

pub async fn list_especialidades(pool: &SqlitePool) -> Result<Vec<Especialidad>, AppError> {
    let rows = sqlx::query_as::<_, NamedRow>(
        "SELECT id, name, created_at FROM especialidades ORDER BY created_at, id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Especialidad::from).collect())
}

pub async fn get_especialidad(
    pool: &SqlitePool,
    id: &str,
) -> Result<Option<Especialidad>, AppError> {
    let row = sqlx::query_as::<_, NamedRow>(
        "SELECT id, name, created_at FROM especialidades WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Especialidad::from))
}

pub async fn create_especialidad(
    pool: &SqlitePool,
    id: &str,
    name: &str,
) -> Result<Especialidad, AppError> {
    sqlx::query("INSERT INTO especialidades (id, name, name_key) VALUES (?, ?, ?)")
        .bind(id)
        .bind(name)
        .bind(name_key(name))
        .execute(pool)
        .await
        .map_err(|e| {
            AppError::from_write(
                e,
                &format!("Ya existe una especialidad con el nombre \"{}\"", name),
            )
        })?;

    get_especialidad(pool, id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created especialidad".to_string()))
}

pub async fn count_courses_with_especialidad(pool: &SqlitePool, id: &str) -> Result<i64, AppError> {
    let (count,) = sqlx::query_as::<_, (i64,)>(
        "SELECT COUNT(*) FROM courses WHERE especialidad_id = ?",
    )
    .bind(id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

pub async fn delete_especialidad(pool: &SqlitePool, id: &str) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM especialidades WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
