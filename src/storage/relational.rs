//! # 관계형 저장소 (SQLite + sqlx)
//!
//! 연결 문자열과 키가 모두 설정된 경우에 선택됩니다.
//! 키는 SQLCipher의 `PRAGMA key`로 전달되며, 일반 SQLite 빌드는 이 pragma를 무시합니다.
//!
//! 연결에 실패하면 `unavailable()` 상태로 만들어집니다.
//! 이 상태에서 읽기는 빈 결과, 쓰기는 `AppError::NotConfigured`를 반환합니다.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::{
    db,
    error::{AppError, MISSING_REFERENCE},
    models::*,
    services::guards,
};

use super::{Storage, StorageMode};

pub struct RelationalStorage {
    pool: Option<SqlitePool>,
}

impl RelationalStorage {
    pub async fn connect(url: &str, key: &str) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(url)?
            .pragma("key", format!("'{}'", key.replace('\'', "''")))
            .create_if_missing(true);
        Self::connect_with(options).await
    }

    /// 연결 풀을 만들고 마이그레이션을 실행합니다.
    pub async fn connect_with(options: SqliteConnectOptions) -> Result<Self, AppError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool: Some(pool) })
    }

    pub fn unavailable() -> Self {
        Self { pool: None }
    }

    pub fn is_available(&self) -> bool {
        self.pool.is_some()
    }

    fn pool(&self) -> Result<&SqlitePool, AppError> {
        self.pool.as_ref().ok_or(AppError::NotConfigured)
    }

    fn read_pool(&self) -> Option<&SqlitePool> {
        if self.pool.is_none() {
            tracing::warn!("relational storage not configured, returning empty result");
        }
        self.pool.as_ref()
    }
}

fn found(rows: u64, what: &str) -> Result<(), AppError> {
    if rows == 0 {
        return Err(AppError::NotFound(what.to_string()));
    }
    Ok(())
}

#[async_trait]
impl Storage for RelationalStorage {
    fn mode(&self) -> StorageMode {
        StorageMode::Relational
    }

    async fn get_users(&self) -> Result<Vec<User>, AppError> {
        let Some(pool) = self.read_pool() else {
            return Ok(Vec::new());
        };
        db::users::list_users(pool).await
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let Some(pool) = self.read_pool() else {
            return Ok(None);
        };
        db::users::find_by_id(pool, id).await
    }

    async fn get_user_by_dni(&self, dni: &str) -> Result<Option<User>, AppError> {
        let Some(pool) = self.read_pool() else {
            return Ok(None);
        };
        db::users::find_by_dni(pool, dni).await
    }

    async fn add_user(&self, user: NewUser) -> Result<User, AppError> {
        let pool = self.pool()?;
        db::users::create_user(pool, &new_id(), &user).await
    }

    async fn update_user(&self, id: &str, patch: UserPatch) -> Result<User, AppError> {
        let pool = self.pool()?;
        let current = db::users::find_by_id(pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Usuario".to_string()))?;
        let updated = current.merged(&patch);
        found(db::users::update_user(pool, &updated).await?, "Usuario")?;
        Ok(updated)
    }

    async fn delete_user(&self, id: &str) -> Result<(), AppError> {
        let pool = self.pool()?;
        found(db::users::delete_user(pool, id).await?, "Usuario")
    }

    async fn get_subjects(&self) -> Result<Vec<Subject>, AppError> {
        let Some(pool) = self.read_pool() else {
            return Ok(Vec::new());
        };
        db::subjects::list_subjects(pool).await
    }

    async fn add_subject(&self, subject: NewSubject) -> Result<Subject, AppError> {
        let pool = self.pool()?;
        let name = guards::validate_name(&subject.name)?;
        db::subjects::create_subject(pool, &new_id(), &name).await
    }

    async fn update_subject(&self, id: &str, patch: SubjectPatch) -> Result<Subject, AppError> {
        let pool = self.pool()?;
        if let Some(name) = patch.name {
            let name = guards::validate_name(&name)?;
            found(db::subjects::rename_subject(pool, id, &name).await?, "Materia")?;
        }
        db::subjects::get_subject(pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Materia".to_string()))
    }

    async fn delete_subject(&self, id: &str) -> Result<(), AppError> {
        let pool = self.pool()?;
        found(db::subjects::delete_subject(pool, id).await?, "Materia")
    }

    async fn get_especialidades(&self) -> Result<Vec<Especialidad>, AppError> {
        let Some(pool) = self.read_pool() else {
            return Ok(Vec::new());
        };
        db::subjects::list_especialidades(pool).await
    }

    async fn add_especialidad(&self, especialidad: NewEspecialidad) -> Result<Especialidad, AppError> {
        let pool = self.pool()?;
        let name = guards::validate_name(&especialidad.name)?;
        db::subjects::create_especialidad(pool, &new_id(), &name).await
    }

    async fn delete_especialidad(&self, id: &str) -> Result<(), AppError> {
        let pool = self.pool()?;
        if db::subjects::count_courses_with_especialidad(pool, id).await? > 0 {
            return Err(AppError::Conflict(
                "La especialidad está asignada a uno o más cursos".to_string(),
            ));
        }
        found(db::subjects::delete_especialidad(pool, id).await?, "Especialidad")
    }

    async fn get_courses(&self) -> Result<Vec<Course>, AppError> {
        let Some(pool) = self.read_pool() else {
            return Ok(Vec::new());
        };
        db::courses::list_courses(pool).await
    }

    async fn add_course(&self, course: NewCourse) -> Result<Course, AppError> {
        let pool = self.pool()?;
        let course = guards::normalize_course(&course)?;
        if let Some(especialidad_id) = course.especialidad_id.as_deref() {
            if db::subjects::get_especialidad(pool, especialidad_id).await?.is_none() {
                return Err(AppError::Validation(MISSING_REFERENCE.to_string()));
            }
        }
        db::courses::create_course(pool, &new_id(), &course).await
    }

    async fn update_course(&self, id: &str, patch: CoursePatch) -> Result<Course, AppError> {
        let pool = self.pool()?;
        let current = db::courses::get_course(pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Curso".to_string()))?;
        let merged = guards::normalize_course(&patch.merge_into(&current))?;
        found(db::courses::update_course(pool, id, &merged).await?, "Curso")?;
        db::courses::get_course(pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Curso".to_string()))
    }

    async fn delete_course(&self, id: &str) -> Result<(), AppError> {
        let pool = self.pool()?;
        found(db::courses::delete_course(pool, id).await?, "Curso")
    }

    async fn get_subject_courses(&self) -> Result<Vec<SubjectCourse>, AppError> {
        let Some(pool) = self.read_pool() else {
            return Ok(Vec::new());
        };
        db::assignments::list_subject_courses(pool).await
    }

    async fn add_subject_course(&self, link: NewSubjectCourse) -> Result<SubjectCourse, AppError> {
        let pool = self.pool()?;
        db::assignments::create_subject_course(pool, &new_id(), &link).await
    }

    async fn delete_subject_course(&self, id: &str) -> Result<(), AppError> {
        let pool = self.pool()?;
        found(
            db::assignments::delete_subject_course(pool, id).await?,
            "Asignación de materia",
        )
    }

    async fn get_teacher_subjects(&self) -> Result<Vec<TeacherSubject>, AppError> {
        let Some(pool) = self.read_pool() else {
            return Ok(Vec::new());
        };
        db::assignments::list_teacher_subjects(pool).await
    }

    async fn add_teacher_subject(
        &self,
        assignment: NewTeacherSubject,
    ) -> Result<TeacherSubject, AppError> {
        let pool = self.pool()?;
        db::assignments::create_teacher_subject(pool, &new_id(), &assignment).await
    }

    async fn delete_teacher_subject(&self, id: &str) -> Result<(), AppError> {
        let pool = self.pool()?;
        found(
            db::assignments::delete_teacher_subject(pool, id).await?,
            "Asignación de profesor",
        )
    }

    async fn get_logbooks(&self) -> Result<Vec<Logbook>, AppError> {
        let Some(pool) = self.read_pool() else {
            return Ok(Vec::new());
        };
        db::logbooks::list_logbooks(pool).await
    }

    async fn get_logbook(&self, id: &str) -> Result<Option<Logbook>, AppError> {
        let Some(pool) = self.read_pool() else {
            return Ok(None);
        };
        db::logbooks::get_logbook(pool, id).await
    }

    async fn get_logbook_by_assignment(
        &self,
        teacher_id: &str,
        subject_id: &str,
        course_id: &str,
    ) -> Result<Option<Logbook>, AppError> {
        let Some(pool) = self.read_pool() else {
            return Ok(None);
        };
        db::logbooks::find_by_assignment(pool, teacher_id, subject_id, course_id).await
    }

    async fn add_or_update_logbook(&self, logbook: Logbook) -> Result<Logbook, AppError> {
        let pool = self.pool()?;
        let id = db::logbooks::save_logbook(pool, &logbook).await?;
        db::logbooks::get_logbook(pool, &id)
            .await?
            .ok_or(AppError::Internal("Failed to retrieve saved logbook".to_string()))
    }

    async fn append_session(
        &self,
        logbook_id: &str,
        input: NewSession,
        today: NaiveDate,
    ) -> Result<ClassSession, AppError> {
        let pool = self.pool()?;
        db::logbooks::append_session(pool, logbook_id, input, today).await
    }

    async fn update_session(
        &self,
        logbook_id: &str,
        session_id: &str,
        change: SessionChange,
    ) -> Result<(ClassSession, bool), AppError> {
        let pool = self.pool()?;
        db::logbooks::update_session(pool, logbook_id, session_id, &change).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unavailable_backend_reads_empty_and_refuses_writes() {
        let storage = RelationalStorage::unavailable();
        assert!(!storage.is_available());
        assert!(storage.get_users().await.unwrap().is_empty());
        assert!(storage.get_logbook("x").await.unwrap().is_none());
        assert!(matches!(
            storage
                .add_subject(NewSubject {
                    name: "Historia".into()
                })
                .await,
            Err(AppError::NotConfigured)
        ));
        assert!(matches!(
            storage.initialize_data().await,
            Err(AppError::NotConfigured)
        ));
    }
}
