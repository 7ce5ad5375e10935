use crate::error::AppError;
use crate::models::{NewSubjectCourse, NewTeacherSubject, SubjectCourse, TeacherSubject};
use sqlx::SqlitePool;

pub async fn list_subject_courses(pool: &SqlitePool) -> Result<Vec<SubjectCourse>, AppError> {
    let links = sqlx::query_as::<_, (String, String, String, String)>(
        r#"
        SELECT id, subject_id, course_id, created_at
        FROM subject_courses
        ORDER BY created_at, id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(links
        .into_iter()
        .map(|(id, subject_id, course_id, created_at)| SubjectCourse {
            id,
            subject_id,
            course_id,
            created_at,
        })
        .collect())
}

pub async fn create_subject_course(
    pool: &SqlitePool,
    id: &str,
    link: &NewSubjectCourse,
) -> Result<SubjectCourse, AppError> {
    sqlx::query("INSERT INTO subject_courses (id, subject_id, course_id) VALUES (?, ?, ?)")
        .bind(id)
        .bind(&link.subject_id)
        .bind(&link.course_id)
        .execute(pool)
        .await
        .map_err(|e| AppError::from_write(e, "La materia ya está asignada a este curso."))?;

    let (created_at,) = sqlx::query_as::<_, (String,)>(
        "SELECT created_at FROM subject_courses WHERE id = ?",
    )
    .bind(id)
    .fetch_one(pool)
    .await?;

    Ok(SubjectCourse {
        id: id.to_string(),
        subject_id: link.subject_id.clone(),
        course_id: link.course_id.clone(),
        created_at,
    })
}

pub async fn delete_subject_course(pool: &SqlitePool, id: &str) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM subject_courses WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

pub async fn list_teacher_subjects(pool: &SqlitePool) -> Result<Vec<TeacherSubject>, AppError> {
    let rows = sqlx::query_as::<_, (String, String, String, String, String)>(
        r#"
        SELECT id, teacher_id, subject_id, course_id, created_at
        FROM teacher_subjects
        ORDER BY created_at, id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, teacher_id, subject_id, course_id, created_at)| TeacherSubject {
            id,
            teacher_id,
            subject_id,
            course_id,
            created_at,
        })
        .collect())
}

pub async fn create_teacher_subject(
    pool: &SqlitePool,
    id: &str,
    assignment: &NewTeacherSubject,
) -> Result<TeacherSubject, AppError> {
    sqlx::query(
        r#"
        INSERT INTO teacher_subjects (id, teacher_id, subject_id, course_id)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(&assignment.teacher_id)
    .bind(&assignment.subject_id)
    .bind(&assignment.course_id)
    .execute(pool)
    .await
    .map_err(|e| {
        AppError::from_write(e, "Este profesor ya está asignado a esta materia y curso.")
    })?;

    let (created_at,) = sqlx::query_as::<_, (String,)>(
        "SELECT created_at FROM teacher_subjects WHERE id = ?",
    )
    .bind(id)
    .fetch_one(pool)
    .await?;

    Ok(TeacherSubject {
        id: id.to_string(),
        teacher_id: assignment.teacher_id.clone(),
        subject_id: assignment.subject_id.clone(),
        course_id: assignment.course_id.clone(),
        created_at,
    })
}

pub async fn delete_teacher_subject(pool: &SqlitePool, id: &str) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM teacher_subjects WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
