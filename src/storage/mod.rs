//! # 저장소 파사드(Storage Facade)
//!
//! 애플리케이션의 나머지 부분은 이 모듈의 `Storage` 트레이트만 사용합니다.
//! 실제 저장 위치는 시작할 때 한 번, 주입된 `StorageConfig`로 결정됩니다.
//!
//! ```text
//!                    ┌──────────────────────┐
//!   routes/services →│  Arc<dyn Storage>    │
//!                    └─────────┬────────────┘
//!              ┌───────────────┴───────────────┐
//!      LocalStorage (JSON 파일)        RelationalStorage (SQLite, sqlx)
//! ```
//!
//! 현재 로그인한 사용자 포인터(`DeviceSession`)는 저장소 종류와 관계없이
//! 항상 이 기기의 로컬 파일에 저장됩니다.
//!
//! ## 공통 계약
//! - `add_*`: 저장소가 ID와 생성 시각을 부여한 레코드를 반환
//! - `update_*`: 병합된 레코드를 반환, 없는 ID는 두 저장소 모두 `NotFound`
//! - `delete_multiple_*`: 트랜잭션이 아닌 "최선 노력" 일괄 삭제: 실패한 ID를 기록하고 계속 진행
//! - 자연키 중복은 저장소가 최종적으로 거부합니다 (`Conflict`)

pub mod kv;
pub mod local;
pub mod relational;
pub mod session;

pub use kv::KeyValueStore;
pub use local::LocalStorage;
pub use relational::RelationalStorage;
pub use session::DeviceSession;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{
    config::StorageConfig,
    error::AppError,
    models::*,
    services::auth,
};

/// 부트스트랩 관리자 계정의 고정 식별자(DNI)
pub const BOOTSTRAP_ADMIN_DNI: &str = "admin";
const BOOTSTRAP_ADMIN_NAME: &str = "Administrador";
const BOOTSTRAP_ADMIN_PASSWORD: &str = "admin123";

/// 실제로 선택된 저장소 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    Local,
    Relational,
}

impl StorageMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageMode::Local => "local",
            StorageMode::Relational => "relational",
        }
    }
}

/// 모든 저장소가 구현하는 비동기 인터페이스
///
/// `#[async_trait]`: 트레이트 객체(`dyn Storage`)에서 async fn을 쓸 수 있게 해주는 매크로
#[async_trait]
pub trait Storage: Send + Sync {
    fn mode(&self) -> StorageMode;

    // ── 사용자 ──
    async fn get_users(&self) -> Result<Vec<User>, AppError>;
    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError>;
    async fn get_user_by_dni(&self, dni: &str) -> Result<Option<User>, AppError>;
    /// `password`는 호출하는 쪽에서 이미 해싱된 값이어야 합니다.
    async fn add_user(&self, user: NewUser) -> Result<User, AppError>;
    async fn update_user(&self, id: &str, patch: UserPatch) -> Result<User, AppError>;
    /// 사용자의 교사 할당과 기록부도 함께 삭제됩니다.
    async fn delete_user(&self, id: &str) -> Result<(), AppError>;

    async fn get_users_by_role(&self, role: UserRole) -> Result<Vec<User>, AppError> {
        let users = self.get_users().await?;
        Ok(users.into_iter().filter(|u| u.role == role).collect())
    }

    async fn delete_multiple_users(&self, ids: &[String]) -> Result<BatchDeleteReport, AppError> {
        let mut report = BatchDeleteReport::default();
        for id in ids {
            report.record(id, self.delete_user(id).await);
        }
        Ok(report)
    }

    // ── 과목 ──
    async fn get_subjects(&self) -> Result<Vec<Subject>, AppError>;
    async fn add_subject(&self, subject: NewSubject) -> Result<Subject, AppError>;
    async fn update_subject(&self, id: &str, patch: SubjectPatch) -> Result<Subject, AppError>;
    /// 과목-과정 연결, 교사 할당, 기록부가 함께 삭제됩니다.
    async fn delete_subject(&self, id: &str) -> Result<(), AppError>;

    async fn delete_multiple_subjects(
        &self,
        ids: &[String],
    ) -> Result<BatchDeleteReport, AppError> {
        let mut report = BatchDeleteReport::default();
        for id in ids {
            report.record(id, self.delete_subject(id).await);
        }
        Ok(report)
    }

    // ── 전공 ──
    async fn get_especialidades(&self) -> Result<Vec<Especialidad>, AppError>;
    async fn add_especialidad(&self, especialidad: NewEspecialidad)
        -> Result<Especialidad, AppError>;
    /// 과정이 참조 중인 전공은 삭제할 수 없습니다 (`Conflict`).
    async fn delete_especialidad(&self, id: &str) -> Result<(), AppError>;

    // ── 과정 ──
    async fn get_courses(&self) -> Result<Vec<Course>, AppError>;
    async fn add_course(&self, course: NewCourse) -> Result<Course, AppError>;
    async fn update_course(&self, id: &str, patch: CoursePatch) -> Result<Course, AppError>;
    /// 과목-과정 연결, 교사 할당, 기록부가 함께 삭제됩니다.
    async fn delete_course(&self, id: &str) -> Result<(), AppError>;

    async fn delete_multiple_courses(&self, ids: &[String]) -> Result<BatchDeleteReport, AppError> {
        let mut report = BatchDeleteReport::default();
        for id in ids {
            report.record(id, self.delete_course(id).await);
        }
        Ok(report)
    }

    // ── 과목-과정 연결 ──
    async fn get_subject_courses(&self) -> Result<Vec<SubjectCourse>, AppError>;
    async fn add_subject_course(&self, link: NewSubjectCourse) -> Result<SubjectCourse, AppError>;
    async fn delete_subject_course(&self, id: &str) -> Result<(), AppError>;

    // ── 교사 할당 ──
    async fn get_teacher_subjects(&self) -> Result<Vec<TeacherSubject>, AppError>;
    async fn add_teacher_subject(
        &self,
        assignment: NewTeacherSubject,
    ) -> Result<TeacherSubject, AppError>;
    async fn delete_teacher_subject(&self, id: &str) -> Result<(), AppError>;

    async fn delete_multiple_teacher_subjects(
        &self,
        ids: &[String],
    ) -> Result<BatchDeleteReport, AppError> {
        let mut report = BatchDeleteReport::default();
        for id in ids {
            report.record(id, self.delete_teacher_subject(id).await);
        }
        Ok(report)
    }

    // ── 수업 기록부 ──
    async fn get_logbooks(&self) -> Result<Vec<Logbook>, AppError>;
    async fn get_logbook(&self, id: &str) -> Result<Option<Logbook>, AppError>;
    async fn get_logbook_by_assignment(
        &self,
        teacher_id: &str,
        subject_id: &str,
        course_id: &str,
    ) -> Result<Option<Logbook>, AppError>;

    /// 기록부를 저장합니다.
    ///
    /// ID로 먼저 찾고, 없으면 (교사, 과목, 과정) 조합으로 찾습니다.
    /// 찾으면 수업 목록을 통째로 바꾸고 `updated_at`을 갱신(감소하지 않음)하며,
    /// 못 찾으면 새로 삽입합니다.
    /// 이미 교장 검증된 수업의 검증 정보는 들어온 값과 관계없이 유지됩니다.
    async fn add_or_update_logbook(&self, logbook: Logbook) -> Result<Logbook, AppError>;

    /// 기록부 끝에 수업 하나를 추가합니다.
    ///
    /// 기록부 읽기와 쓰기가 한 잠금(관계형: 한 트랜잭션) 안에서 일어나므로
    /// 동시에 추가된 수업이 사라지거나 같은 수업 번호를 받지 않습니다.
    async fn append_session(
        &self,
        logbook_id: &str,
        input: NewSession,
        today: NaiveDate,
    ) -> Result<ClassSession, AppError>;

    /// 수업 하나에 변경을 적용합니다. 값이 바뀌었을 때만 저장하며 그 여부를 함께 반환합니다.
    async fn update_session(
        &self,
        logbook_id: &str,
        session_id: &str,
        change: SessionChange,
    ) -> Result<(ClassSession, bool), AppError>;

    /// 할당에 해당하는 기록부를 반환하고, 없으면 **빈 기록부를 만들어 저장**합니다.
    ///
    /// 교사 대시보드가 처음 열릴 때 호출되는 명시적인 "없으면 생성" 연산입니다.
    async fn get_or_create_logbook(
        &self,
        teacher_id: &str,
        subject_id: &str,
        course_id: &str,
    ) -> Result<Logbook, AppError> {
        if let Some(existing) = self
            .get_logbook_by_assignment(teacher_id, subject_id, course_id)
            .await?
        {
            return Ok(existing);
        }
        tracing::info!(teacher_id, subject_id, course_id, "creating logbook on first access");
        self.add_or_update_logbook(Logbook::new(teacher_id, subject_id, course_id))
            .await
    }

    /// 부트스트랩 관리자 계정이 없을 때만 만듭니다. 여러 번 호출해도 안전합니다.
    ///
    /// 새로 만들었으면 `true`를 반환합니다.
    async fn initialize_data(&self) -> Result<bool, AppError> {
        if self.get_user_by_dni(BOOTSTRAP_ADMIN_DNI).await?.is_some() {
            return Ok(false);
        }
        let password = auth::hash_password(BOOTSTRAP_ADMIN_PASSWORD)?;
        self.add_user(NewUser {
            dni: BOOTSTRAP_ADMIN_DNI.to_string(),
            name: BOOTSTRAP_ADMIN_NAME.to_string(),
            password,
            role: UserRole::Admin,
        })
        .await?;
        tracing::info!("bootstrap admin account created");
        Ok(true)
    }
}

/// 설정에 따라 저장소를 하나 만듭니다.
///
/// 관계형 저장소 연결에 실패해도 프로세스를 중단하지 않습니다.
/// 대신 읽기는 빈 목록, 쓰기는 `NotConfigured`를 반환하는 상태로 동작합니다.
pub async fn connect(config: &StorageConfig) -> Arc<dyn Storage> {
    match config {
        StorageConfig::Local { data_dir } => {
            tracing::info!("Using local storage at {}", data_dir.display());
            Arc::new(LocalStorage::new(data_dir))
        }
        StorageConfig::Remote { url, key } => match RelationalStorage::connect(url, key).await {
            Ok(storage) => {
                tracing::info!("Using relational storage");
                Arc::new(storage)
            }
            Err(e) => {
                tracing::error!("Relational storage unavailable: {}", e);
                Arc::new(RelationalStorage::unavailable())
            }
        },
    }
}
