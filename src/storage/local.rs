//! # 로컬 저장소
//!
//! 컬렉션마다 JSON 배열 하나를 `KeyValueStore`에 저장합니다.
//!
//! | 키 | 내용 |
//! |----|------|
//! | `libro_temas_users` | 사용자 |
//! | `libro_temas_subjects` | 과목 |
//! | `libro_temas_especialidades` | 전공 |
//! | `libro_temas_courses` | 과정 |
//! | `libro_temas_subject_courses` | 과목-과정 연결 |
//! | `libro_temas_teacher_subjects` | 교사 할당 |
//! | `libro_temas_logbooks` | 수업 기록부 (수업 목록 포함) |
//!
//! 모든 쓰기는 하나의 비동기 뮤텍스 안에서 "읽기 → 검사 → 수정 → 저장" 순서로 실행됩니다.
//! 같은 프로세스 안에서는 중복 검사와 연쇄 삭제가 다른 쓰기와 섞이지 않습니다.

use std::path::Path;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;

use crate::{
    error::{AppError, MISSING_REFERENCE},
    models::*,
    services::guards,
};

use super::{KeyValueStore, Storage, StorageMode};

pub const USERS_KEY: &str = "libro_temas_users";
pub const SUBJECTS_KEY: &str = "libro_temas_subjects";
pub const ESPECIALIDADES_KEY: &str = "libro_temas_especialidades";
pub const COURSES_KEY: &str = "libro_temas_courses";
pub const SUBJECT_COURSES_KEY: &str = "libro_temas_subject_courses";
pub const TEACHER_SUBJECTS_KEY: &str = "libro_temas_teacher_subjects";
pub const LOGBOOKS_KEY: &str = "libro_temas_logbooks";

pub struct LocalStorage {
    kv: KeyValueStore,
    write_lock: Mutex<()>,
}

impl LocalStorage {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            kv: KeyValueStore::new(data_dir),
            write_lock: Mutex::new(()),
        }
    }

    async fn especialidad_name(&self, id: Option<&str>) -> Result<Option<String>, AppError> {
        let Some(id) = id else {
            return Ok(None);
        };
        let especialidades: Vec<Especialidad> = self.kv.list(ESPECIALIDADES_KEY).await?;
        especialidades
            .into_iter()
            .find(|e| e.id == id)
            .map(|e| Some(e.name))
            .ok_or_else(|| AppError::Validation(MISSING_REFERENCE.to_string()))
    }

    async fn ensure_subject_and_course(
        &self,
        subject_id: &str,
        course_id: &str,
    ) -> Result<(), AppError> {
        let subjects: Vec<Subject> = self.kv.list(SUBJECTS_KEY).await?;
        let courses: Vec<Course> = self.kv.list(COURSES_KEY).await?;
        if !subjects.iter().any(|s| s.id == subject_id) || !courses.iter().any(|c| c.id == course_id)
        {
            return Err(AppError::Validation(MISSING_REFERENCE.to_string()));
        }
        Ok(())
    }

    async fn ensure_teacher(&self, teacher_id: &str) -> Result<(), AppError> {
        let users: Vec<User> = self.kv.list(USERS_KEY).await?;
        if !users.iter().any(|u| u.id == teacher_id) {
            return Err(AppError::Validation(MISSING_REFERENCE.to_string()));
        }
        Ok(())
    }

    /// 과목/과정 삭제 시 딸린 기록부, 할당, 연결을 지웁니다.
    ///
    /// 의존하는 컬렉션부터 지우고 부모는 호출한 쪽이 마지막에 지웁니다.
    /// 중간에 쓰기가 실패해도 부모 없이 남는 자식은 생기지 않습니다.
    async fn cascade_links(
        &self,
        keep_link: impl Fn(&str, &str) -> bool,
    ) -> Result<(), AppError> {
        let mut logbooks: Vec<Logbook> = self.kv.list(LOGBOOKS_KEY).await?;
        logbooks.retain(|l| keep_link(&l.subject_id, &l.course_id));
        self.kv.set(LOGBOOKS_KEY, &logbooks).await?;

        let mut assignments: Vec<TeacherSubject> = self.kv.list(TEACHER_SUBJECTS_KEY).await?;
        assignments.retain(|a| keep_link(&a.subject_id, &a.course_id));
        self.kv.set(TEACHER_SUBJECTS_KEY, &assignments).await?;

        let mut links: Vec<SubjectCourse> = self.kv.list(SUBJECT_COURSES_KEY).await?;
        links.retain(|l| keep_link(&l.subject_id, &l.course_id));
        self.kv.set(SUBJECT_COURSES_KEY, &links).await
    }
}

/// `updated_at`이 줄어들지 않도록 두 시각 중 나중 값을 고릅니다.
fn later(now: String, previous: &str) -> String {
    if now.as_str() < previous {
        previous.to_string()
    } else {
        now
    }
}

#[async_trait]
impl Storage for LocalStorage {
    fn mode(&self) -> StorageMode {
        StorageMode::Local
    }

    async fn get_users(&self) -> Result<Vec<User>, AppError> {
        self.kv.list(USERS_KEY).await
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let users = self.get_users().await?;
        Ok(users.into_iter().find(|u| u.id == id))
    }

    async fn get_user_by_dni(&self, dni: &str) -> Result<Option<User>, AppError> {
        let users = self.get_users().await?;
        Ok(users.into_iter().find(|u| u.dni == dni))
    }

    async fn add_user(&self, input: NewUser) -> Result<User, AppError> {
        let _guard = self.write_lock.lock().await;
        let mut users = self.get_users().await?;
        guards::ensure_unique_dni(&users, &input.dni, None)?;

        let user = User {
            id: new_id(),
            dni: input.dni,
            name: input.name,
            password: input.password,
            role: input.role,
            created_at: now_iso(),
        };
        users.push(user.clone());
        self.kv.set(USERS_KEY, &users).await?;
        Ok(user)
    }

    async fn update_user(&self, id: &str, patch: UserPatch) -> Result<User, AppError> {
        let _guard = self.write_lock.lock().await;
        let mut users = self.get_users().await?;
        let index = users
            .iter()
            .position(|u| u.id == id)
            .ok_or_else(|| AppError::NotFound("Usuario".to_string()))?;

        let updated = users[index].merged(&patch);
        guards::ensure_unique_dni(&users, &updated.dni, Some(id))?;
        users[index] = updated.clone();
        self.kv.set(USERS_KEY, &users).await?;
        Ok(updated)
    }

    async fn delete_user(&self, id: &str) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        let mut users = self.get_users().await?;
        let before = users.len();
        users.retain(|u| u.id != id);
        if users.len() == before {
            return Err(AppError::NotFound("Usuario".to_string()));
        }

        let mut logbooks: Vec<Logbook> = self.kv.list(LOGBOOKS_KEY).await?;
        logbooks.retain(|l| l.teacher_id != id);
        self.kv.set(LOGBOOKS_KEY, &logbooks).await?;

        let mut assignments: Vec<TeacherSubject> = self.kv.list(TEACHER_SUBJECTS_KEY).await?;
        assignments.retain(|a| a.teacher_id != id);
        self.kv.set(TEACHER_SUBJECTS_KEY, &assignments).await?;

        self.kv.set(USERS_KEY, &users).await
    }

    async fn get_subjects(&self) -> Result<Vec<Subject>, AppError> {
        self.kv.list(SUBJECTS_KEY).await
    }

    async fn add_subject(&self, input: NewSubject) -> Result<Subject, AppError> {
        let name = guards::validate_name(&input.name)?;
        let _guard = self.write_lock.lock().await;
        let mut subjects = self.get_subjects().await?;
        guards::ensure_unique_subject_name(&subjects, &name, None)?;

        let subject = Subject {
            id: new_id(),
            name,
            created_at: now_iso(),
        };
        subjects.push(subject.clone());
        self.kv.set(SUBJECTS_KEY, &subjects).await?;
        Ok(subject)
    }

    async fn update_subject(&self, id: &str, patch: SubjectPatch) -> Result<Subject, AppError> {
        let _guard = self.write_lock.lock().await;
        let mut subjects = self.get_subjects().await?;
        let index = subjects
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| AppError::NotFound("Materia".to_string()))?;

        if let Some(name) = patch.name {
            let name = guards::validate_name(&name)?;
            guards::ensure_unique_subject_name(&subjects, &name, Some(id))?;
            subjects[index].name = name;
        }
        let updated = subjects[index].clone();
        self.kv.set(SUBJECTS_KEY, &subjects).await?;
        Ok(updated)
    }

    async fn delete_subject(&self, id: &str) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        let mut subjects = self.get_subjects().await?;
        let before = subjects.len();
        subjects.retain(|s| s.id != id);
        if subjects.len() == before {
            return Err(AppError::NotFound("Materia".to_string()));
        }
        self.cascade_links(|subject_id, _| subject_id != id).await?;
        self.kv.set(SUBJECTS_KEY, &subjects).await
    }

    async fn get_especialidades(&self) -> Result<Vec<Especialidad>, AppError> {
        self.kv.list(ESPECIALIDADES_KEY).await
    }

    async fn add_especialidad(&self, input: NewEspecialidad) -> Result<Especialidad, AppError> {
        let name = guards::validate_name(&input.name)?;
        let _guard = self.write_lock.lock().await;
        let mut especialidades = self.get_especialidades().await?;
        guards::ensure_unique_especialidad_name(&especialidades, &name)?;

        let especialidad = Especialidad {
            id: new_id(),
            name,
            created_at: now_iso(),
        };
        especialidades.push(especialidad.clone());
        self.kv.set(ESPECIALIDADES_KEY, &especialidades).await?;
        Ok(especialidad)
    }

    async fn delete_especialidad(&self, id: &str) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        let courses = self.get_courses().await?;
        if courses
            .iter()
            .any(|c| c.especialidad_id.as_deref() == Some(id))
        {
            return Err(AppError::Conflict(
                "La especialidad está asignada a uno o más cursos".to_string(),
            ));
        }

        let mut especialidades = self.get_especialidades().await?;
        let before = especialidades.len();
        especialidades.retain(|e| e.id != id);
        if especialidades.len() == before {
            return Err(AppError::NotFound("Especialidad".to_string()));
        }
        self.kv.set(ESPECIALIDADES_KEY, &especialidades).await
    }

    async fn get_courses(&self) -> Result<Vec<Course>, AppError> {
        self.kv.list(COURSES_KEY).await
    }

    async fn add_course(&self, input: NewCourse) -> Result<Course, AppError> {
        let input = guards::normalize_course(&input)?;
        let _guard = self.write_lock.lock().await;
        let mut courses = self.get_courses().await?;
        guards::ensure_unique_course(
            courses.iter().map(|c| (c.id.as_str(), c.key())),
            &input.key(),
            None,
        )?;
        let especialidad = self.especialidad_name(input.especialidad_id.as_deref()).await?;

        let course = Course {
            id: new_id(),
            name: course_display_name(
                input.year,
                input.division,
                input.turno,
                especialidad.as_deref(),
            ),
            year: input.year,
            division: input.division,
            turno: input.turno,
            especialidad_id: input.especialidad_id,
            created_at: now_iso(),
        };
        courses.push(course.clone());
        self.kv.set(COURSES_KEY, &courses).await?;
        Ok(course)
    }

    async fn update_course(&self, id: &str, patch: CoursePatch) -> Result<Course, AppError> {
        let _guard = self.write_lock.lock().await;
        let mut courses = self.get_courses().await?;
        let index = courses
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| AppError::NotFound("Curso".to_string()))?;

        let merged = guards::normalize_course(&patch.merge_into(&courses[index]))?;
        guards::ensure_unique_course(
            courses.iter().map(|c| (c.id.as_str(), c.key())),
            &merged.key(),
            Some(id),
        )?;
        let especialidad = self.especialidad_name(merged.especialidad_id.as_deref()).await?;

        let course = &mut courses[index];
        course.name = course_display_name(
            merged.year,
            merged.division,
            merged.turno,
            especialidad.as_deref(),
        );
        course.year = merged.year;
        course.division = merged.division;
        course.turno = merged.turno;
        course.especialidad_id = merged.especialidad_id;
        let updated = course.clone();
        self.kv.set(COURSES_KEY, &courses).await?;
        Ok(updated)
    }

    async fn delete_course(&self, id: &str) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        let mut courses = self.get_courses().await?;
        let before = courses.len();
        courses.retain(|c| c.id != id);
        if courses.len() == before {
            return Err(AppError::NotFound("Curso".to_string()));
        }
        self.cascade_links(|_, course_id| course_id != id).await?;
        self.kv.set(COURSES_KEY, &courses).await
    }

    async fn get_subject_courses(&self) -> Result<Vec<SubjectCourse>, AppError> {
        self.kv.list(SUBJECT_COURSES_KEY).await
    }

    async fn add_subject_course(&self, input: NewSubjectCourse) -> Result<SubjectCourse, AppError> {
        let _guard = self.write_lock.lock().await;
        self.ensure_subject_and_course(&input.subject_id, &input.course_id)
            .await?;
        let mut links = self.get_subject_courses().await?;
        guards::ensure_unique_subject_course(&links, &input.subject_id, &input.course_id)?;

        let link = SubjectCourse {
            id: new_id(),
            subject_id: input.subject_id,
            course_id: input.course_id,
            created_at: now_iso(),
        };
        links.push(link.clone());
        self.kv.set(SUBJECT_COURSES_KEY, &links).await?;
        Ok(link)
    }

    async fn delete_subject_course(&self, id: &str) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        let mut links = self.get_subject_courses().await?;
        let before = links.len();
        links.retain(|l| l.id != id);
        if links.len() == before {
            return Err(AppError::NotFound("Asignación de materia".to_string()));
        }
        self.kv.set(SUBJECT_COURSES_KEY, &links).await
    }

    async fn get_teacher_subjects(&self) -> Result<Vec<TeacherSubject>, AppError> {
        self.kv.list(TEACHER_SUBJECTS_KEY).await
    }

    async fn add_teacher_subject(
        &self,
        input: NewTeacherSubject,
    ) -> Result<TeacherSubject, AppError> {
        let _guard = self.write_lock.lock().await;
        self.ensure_teacher(&input.teacher_id).await?;
        self.ensure_subject_and_course(&input.subject_id, &input.course_id)
            .await?;
        let mut assignments = self.get_teacher_subjects().await?;
        guards::ensure_unique_teacher_subject(
            &assignments,
            &input.teacher_id,
            &input.subject_id,
            &input.course_id,
        )?;

        let assignment = TeacherSubject {
            id: new_id(),
            teacher_id: input.teacher_id,
            subject_id: input.subject_id,
            course_id: input.course_id,
            created_at: now_iso(),
        };
        assignments.push(assignment.clone());
        self.kv.set(TEACHER_SUBJECTS_KEY, &assignments).await?;
        Ok(assignment)
    }

    async fn delete_teacher_subject(&self, id: &str) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        let mut assignments = self.get_teacher_subjects().await?;
        let before = assignments.len();
        assignments.retain(|a| a.id != id);
        if assignments.len() == before {
            return Err(AppError::NotFound("Asignación de profesor".to_string()));
        }
        self.kv.set(TEACHER_SUBJECTS_KEY, &assignments).await
    }

    async fn get_logbooks(&self) -> Result<Vec<Logbook>, AppError> {
        self.kv.list(LOGBOOKS_KEY).await
    }

    async fn get_logbook(&self, id: &str) -> Result<Option<Logbook>, AppError> {
        let logbooks = self.get_logbooks().await?;
        Ok(logbooks.into_iter().find(|l| l.id == id))
    }

    async fn get_logbook_by_assignment(
        &self,
        teacher_id: &str,
        subject_id: &str,
        course_id: &str,
    ) -> Result<Option<Logbook>, AppError> {
        let logbooks = self.get_logbooks().await?;
        Ok(logbooks
            .into_iter()
            .find(|l| l.matches_assignment(teacher_id, subject_id, course_id)))
    }

    async fn add_or_update_logbook(&self, logbook: Logbook) -> Result<Logbook, AppError> {
        let _guard = self.write_lock.lock().await;
        let mut logbooks = self.get_logbooks().await?;

        let existing = logbooks
            .iter()
            .position(|l| l.id == logbook.id)
            .or_else(|| {
                logbooks.iter().position(|l| {
                    l.matches_assignment(&logbook.teacher_id, &logbook.subject_id, &logbook.course_id)
                })
            });

        let saved = match existing {
            Some(index) => {
                let stored = &mut logbooks[index];
                let mut incoming = logbook;
                incoming.keep_director_sign_offs(&stored.sessions);
                stored.sessions = incoming.sessions;
                stored.updated_at = later(now_iso(), &stored.updated_at);
                stored.clone()
            }
            None => {
                self.ensure_teacher(&logbook.teacher_id).await?;
                self.ensure_subject_and_course(&logbook.subject_id, &logbook.course_id)
                    .await?;
                let now = now_iso();
                let created = Logbook {
                    id: if logbook.id.is_empty() { new_id() } else { logbook.id },
                    created_at: if logbook.created_at.is_empty() {
                        now.clone()
                    } else {
                        logbook.created_at
                    },
                    updated_at: now,
                    ..logbook
                };
                logbooks.push(created.clone());
                created
            }
        };

        self.kv.set(LOGBOOKS_KEY, &logbooks).await?;
        Ok(saved)
    }

    async fn append_session(
        &self,
        logbook_id: &str,
        input: NewSession,
        today: NaiveDate,
    ) -> Result<ClassSession, AppError> {
        let _guard = self.write_lock.lock().await;
        let mut logbooks = self.get_logbooks().await?;
        let logbook = logbooks
            .iter_mut()
            .find(|l| l.id == logbook_id)
            .ok_or_else(|| AppError::NotFound("Libro de temas".to_string()))?;

        let previous = logbook.updated_at.clone();
        let session = logbook.append_session(input, today)?;
        logbook.updated_at = later(now_iso(), &previous);
        self.kv.set(LOGBOOKS_KEY, &logbooks).await?;
        Ok(session)
    }

    async fn update_session(
        &self,
        logbook_id: &str,
        session_id: &str,
        change: SessionChange,
    ) -> Result<(ClassSession, bool), AppError> {
        let _guard = self.write_lock.lock().await;
        let mut logbooks = self.get_logbooks().await?;
        let logbook = logbooks
            .iter_mut()
            .find(|l| l.id == logbook_id)
            .ok_or_else(|| AppError::NotFound("Libro de temas".to_string()))?;
        let session = logbook
            .session_mut(session_id)
            .ok_or_else(|| AppError::NotFound("Clase".to_string()))?;

        let changed = change.apply(session);
        let session = session.clone();
        if changed {
            logbook.updated_at = later(now_iso(), &logbook.updated_at);
            self.kv.set(LOGBOOKS_KEY, &logbooks).await?;
        }
        Ok((session, changed))
    }
}
