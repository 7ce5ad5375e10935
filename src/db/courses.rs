//! # 과정(Course) 쿼리
//!
//! `name` 컬럼은 직접 쓰지 않습니다. INSERT/UPDATE 후 트리거가
//! `"{학년}° {반}ª - {근무조}[ - {전공}]"` 형식으로 채웁니다.
//! 같은 (학년, 반, 근무조, 전공) 조합은 `idx_courses_natural_key` 인덱스가 거부합니다.

use crate::error::AppError;
use crate::models::{Course, NewCourse};
use sqlx::SqlitePool;

const DUPLICATE_COURSE: &str =
    "Ya existe un curso con esta combinación de año, división, turno y especialidad.";

#[derive(Debug, sqlx::FromRow)]
pub struct CourseRow {
    pub id: String,
    pub name: String,
    pub year: u32,
    pub division: u32,
    pub turno: String,
    pub especialidad_id: Option<String>,
    pub created_at: String,
}

impl TryFrom<CourseRow> for Course {
    type Error = AppError;

    fn try_from(row: CourseRow) -> Result<Self, Self::Error> {
        Ok(Course {
            id: row.id,
            name: row.name,
            year: row.year,
            division: row.division,
            turno: row.turno.parse()?,
            especialidad_id: row.especialidad_id,
            created_at: row.created_at,
        })
    }
}

pub async fn list_courses(pool: &SqlitePool) -> Result<Vec<Course>, AppError> {
    let rows = sqlx::query_as::<_, CourseRow>(
        r#"
        SELECT id, name, year, division, turno, especialidad_id, created_at
        FROM courses
        ORDER BY created_at, id
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(Course::try_from).collect()
}

pub async fn get_course(pool: &SqlitePool, id: &str) -> Result<Option<Course>, AppError> {
    let row = sqlx::query_as::<_, CourseRow>(
        r#"
        SELECT id, name, year, division, turno, especialidad_id, created_at
        FROM courses
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(Course::try_from).transpose()
}

/// 정규화가 끝난 입력만 받습니다 (`guards::normalize_course`).
pub async fn create_course(pool: &SqlitePool, id: &str, course: &NewCourse) -> Result<Course, AppError> {
    sqlx::query(
        r#"
        INSERT INTO courses (id, year, division, turno, especialidad_id)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(course.year)
    .bind(course.division)
    .bind(course.turno.as_str())
    .bind(course.especialidad_id.as_deref())
    .execute(pool)
    .await
    .map_err(|e| AppError::from_write(e, DUPLICATE_COURSE))?;

    get_course(pool, id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created course".to_string()))
}

pub async fn update_course(pool: &SqlitePool, id: &str, course: &NewCourse) -> Result<u64, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE courses
        SET year = ?, division = ?, turno = ?, especialidad_id = ?
        WHERE id = ?
        "#,
    )
    .bind(course.year)
    .bind(course.division)
    .bind(course.turno.as_str())
    .bind(course.especialidad_id.as_deref())
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| AppError::from_write(e, DUPLICATE_COURSE))?;

    Ok(result.rows_affected())
}

/// 과목-과정 연결, 교사 할당, 기록부는 `ON DELETE CASCADE`로 함께 지워집니다.
pub async fn delete_course(pool: &SqlitePool, id: &str) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM courses WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
