//! 두 저장소가 같은 계약을 지키는지 확인하는 공용 시나리오
//!
//! `local_storage.rs`와 `relational_storage.rs`가 같은 함수를 각자의 저장소로 호출합니다.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use libro_temas::{
    error::AppError,
    models::*,
    services::{auth, sync, verification},
    storage::{DeviceSession, Storage, BOOTSTRAP_ADMIN_DNI},
};

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
}

pub async fn user(storage: &dyn Storage, dni: &str, name: &str, role: UserRole) -> User {
    auth::create_user(
        storage,
        &NewUser {
            dni: dni.into(),
            name: name.into(),
            password: "clave123".into(),
            role,
        },
    )
    .await
    .unwrap()
}

pub async fn subject(storage: &dyn Storage, name: &str) -> Subject {
    storage
        .add_subject(NewSubject { name: name.into() })
        .await
        .unwrap()
}

pub async fn course(storage: &dyn Storage, year: u32, division: u32) -> Course {
    storage
        .add_course(NewCourse {
            year,
            division,
            turno: Turno::Manana,
            especialidad_id: None,
        })
        .await
        .unwrap()
}

fn lesson(content: &str) -> NewSession {
    NewSession {
        class_character: Some(ClassCharacter::Teorica),
        content: content.into(),
        task: "Ejercicios".into(),
        ..Default::default()
    }
}

pub async fn dni_is_unique(storage: &dyn Storage) {
    user(storage, "30111222", "Ana", UserRole::Profesor).await;

    let again = auth::create_user(
        storage,
        &NewUser {
            dni: "30111222".into(),
            name: "Otra".into(),
            password: "clave123".into(),
            role: UserRole::Director,
        },
    )
    .await;
    assert!(matches!(again, Err(AppError::Conflict(_))));

    // 라우트의 빠른 검사를 건너뛰어도 저장소가 거부합니다.
    let direct = storage
        .add_user(NewUser {
            dni: "30111222".into(),
            name: "Otra".into(),
            password: "x".into(),
            role: UserRole::Director,
        })
        .await;
    assert!(matches!(direct, Err(AppError::Conflict(_))));
    assert_eq!(storage.get_users().await.unwrap().len(), 1);
}

pub async fn subject_names_are_case_insensitive(storage: &dyn Storage) {
    subject(storage, "Matemática").await;
    let dup = storage
        .add_subject(NewSubject {
            name: "  matemática ".into(),
        })
        .await;
    assert!(matches!(dup, Err(AppError::Conflict(_))));
}

pub async fn course_rules(storage: &dyn Storage) {
    let informatica = storage
        .add_especialidad(NewEspecialidad {
            name: "Informática".into(),
        })
        .await
        .unwrap();

    // 3학년 미만: 전공은 무시됩니다.
    let first = storage
        .add_course(NewCourse {
            year: 2,
            division: 1,
            turno: Turno::Tarde,
            especialidad_id: Some(informatica.id.clone()),
        })
        .await
        .unwrap();
    assert_eq!(first.especialidad_id, None);
    assert_eq!(first.name, "2° 1ª - Tarde");

    let dup = storage
        .add_course(NewCourse {
            year: 2,
            division: 1,
            turno: Turno::Tarde,
            especialidad_id: None,
        })
        .await;
    assert!(matches!(dup, Err(AppError::Conflict(_))));

    let missing = storage
        .add_course(NewCourse {
            year: 4,
            division: 1,
            turno: Turno::Tarde,
            especialidad_id: None,
        })
        .await;
    assert!(matches!(missing, Err(AppError::Validation(_))));

    let senior = storage
        .add_course(NewCourse {
            year: 4,
            division: 1,
            turno: Turno::Tarde,
            especialidad_id: Some(informatica.id.clone()),
        })
        .await
        .unwrap();
    assert_eq!(senior.name, "4° 1ª - Tarde - Informática");

    // 학년을 내리면 전공이 지워집니다.
    let demoted = storage
        .update_course(
            &senior.id,
            CoursePatch {
                year: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(demoted.especialidad_id, None);
    assert_eq!(demoted.name, "1° 1ª - Tarde");

    let in_use = storage
        .add_course(NewCourse {
            year: 5,
            division: 2,
            turno: Turno::Manana,
            especialidad_id: Some(informatica.id.clone()),
        })
        .await
        .unwrap();
    assert!(matches!(
        storage.delete_especialidad(&informatica.id).await,
        Err(AppError::Conflict(_))
    ));
    storage.delete_course(&in_use.id).await.unwrap();
    storage.delete_especialidad(&informatica.id).await.unwrap();
}

pub async fn initialize_data_is_idempotent(storage: &dyn Storage) {
    assert!(storage.initialize_data().await.unwrap());
    assert!(!storage.initialize_data().await.unwrap());

    let admins: Vec<User> = storage
        .get_users()
        .await
        .unwrap()
        .into_iter()
        .filter(|u| u.dni == BOOTSTRAP_ADMIN_DNI)
        .collect();
    assert_eq!(admins.len(), 1);
    assert_eq!(admins[0].role, UserRole::Admin);
    assert!(auth::verify_password("admin123", &admins[0].password).unwrap());
}

pub async fn login_scenario(storage: &dyn Storage, device: &DeviceSession) {
    let teacher = user(storage, "28999000", "Carlos", UserRole::Profesor).await;

    let unknown = auth::login(
        storage,
        device,
        &LoginRequest {
            dni: "11111111".into(),
            password: "clave123".into(),
        },
    )
    .await;
    assert!(matches!(unknown, Err(AppError::UserNotFound)));

    let wrong = auth::login(
        storage,
        device,
        &LoginRequest {
            dni: "28999000".into(),
            password: "otra".into(),
        },
    )
    .await;
    assert!(matches!(wrong, Err(AppError::IncorrectPassword)));
    assert!(device.current_user_id().await.unwrap().is_none());

    let ok = auth::login(
        storage,
        device,
        &LoginRequest {
            dni: " 28999000 ".into(),
            password: "clave123".into(),
        },
    )
    .await
    .unwrap();
    assert_eq!(ok.id, teacher.id);
    assert_eq!(device.current_user_id().await.unwrap(), Some(teacher.id.clone()));

    auth::logout(device).await.unwrap();
    assert!(device.current_user_id().await.unwrap().is_none());
}

pub async fn logbook_upsert_keeps_one_per_assignment(storage: &dyn Storage) {
    let teacher = user(storage, "20000001", "Ana", UserRole::Profesor).await;
    let math = subject(storage, "Matemática").await;
    let first = course(storage, 1, 1).await;

    let saved = storage
        .add_or_update_logbook(Logbook::new(&teacher.id, &math.id, &first.id))
        .await
        .unwrap();
    let again = storage
        .add_or_update_logbook(Logbook::new(&teacher.id, &math.id, &first.id))
        .await
        .unwrap();

    assert_eq!(saved.id, again.id);
    assert!(again.updated_at >= saved.updated_at);
    assert_eq!(storage.get_logbooks().await.unwrap().len(), 1);

    let created = storage
        .get_or_create_logbook(&teacher.id, &math.id, &first.id)
        .await
        .unwrap();
    assert_eq!(created.id, saved.id);
}

pub async fn course_subject_sync(storage: &dyn Storage) {
    let target = course(storage, 1, 1).await;
    let a = subject(storage, "A").await;
    let b = subject(storage, "B").await;
    let c = subject(storage, "C").await;
    let d = subject(storage, "D").await;

    let first = sync::sync_course_subjects(
        storage,
        &target.id,
        &[a.id.clone(), b.id.clone(), c.id.clone()],
    )
    .await
    .unwrap();
    assert_eq!(first.created.len(), 3);

    let second = sync::sync_course_subjects(
        storage,
        &target.id,
        &[b.id.clone(), c.id.clone(), d.id.clone()],
    )
    .await
    .unwrap();
    assert_eq!(second.removed_ids.len(), 1);
    assert_eq!(second.created.len(), 1);
    assert_eq!(second.created[0].subject_id, d.id);

    let mut linked: Vec<String> = storage
        .get_subject_courses()
        .await
        .unwrap()
        .into_iter()
        .filter(|l| l.course_id == target.id)
        .map(|l| l.subject_id)
        .collect();
    linked.sort();
    let mut expected = vec![b.id, c.id, d.id];
    expected.sort();
    assert_eq!(linked, expected);
}

pub async fn teacher_assignment_sync(storage: &dyn Storage) {
    let teacher = user(storage, "20000002", "Bruno", UserRole::Profesor).await;
    let director = user(storage, "20000003", "Dora", UserRole::Director).await;
    let math = subject(storage, "Matemática").await;
    let first = course(storage, 1, 1).await;
    let second = course(storage, 1, 2).await;

    let key = |course: &Course| AssignmentKey {
        subject_id: math.id.clone(),
        course_id: course.id.clone(),
    };

    let empty = sync::sync_teacher_assignments(storage, &teacher.id, &[]).await;
    assert!(matches!(empty, Err(AppError::Validation(_))));

    let not_teacher = sync::sync_teacher_assignments(storage, &director.id, &[key(&first)]).await;
    assert!(matches!(not_teacher, Err(AppError::Validation(_))));

    sync::sync_teacher_assignments(storage, &teacher.id, &[key(&first)])
        .await
        .unwrap();
    let report = sync::sync_teacher_assignments(storage, &teacher.id, &[key(&second)])
        .await
        .unwrap();
    assert_eq!(report.removed_ids.len(), 1);
    assert_eq!(report.created.len(), 1);

    let assignments = storage.get_teacher_subjects().await.unwrap();
    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0].course_id, second.id);

    let removed = sync::remove_teacher_assignments(storage, &[teacher.id.clone()])
        .await
        .unwrap();
    assert_eq!(removed.deleted.len(), 1);
    assert!(storage.get_teacher_subjects().await.unwrap().is_empty());
    assert!(storage.get_user(&teacher.id).await.unwrap().is_some());
}

pub async fn sessions_and_verification(storage: &dyn Storage) {
    let teacher = user(storage, "20000004", "Eva", UserRole::Profesor).await;
    let other = user(storage, "20000005", "Fede", UserRole::Profesor).await;
    let director = user(storage, "20000006", "Gabriela", UserRole::Director).await;
    let math = subject(storage, "Matemática").await;
    let first = course(storage, 1, 1).await;
    storage
        .add_teacher_subject(NewTeacherSubject {
            teacher_id: teacher.id.clone(),
            subject_id: math.id.clone(),
            course_id: first.id.clone(),
        })
        .await
        .unwrap();

    let dashboard = verification::teacher_dashboard(storage, &teacher).await.unwrap();
    assert_eq!(dashboard.len(), 1);
    assert_eq!(dashboard[0].subject_name, "Matemática");
    let logbook_id = dashboard[0].logbook.id.clone();

    let foreign =
        verification::record_session(storage, &other, &logbook_id, lesson("x"), today()).await;
    assert!(matches!(foreign, Err(AppError::Forbidden(_))));

    let session =
        verification::record_session(storage, &teacher, &logbook_id, lesson("Fracciones"), today())
            .await
            .unwrap();
    assert_eq!(session.class_number, 1);
    assert_eq!((session.day, session.month), (10, 3));

    let toggled =
        verification::set_teacher_verification(storage, &teacher, &logbook_id, &session.id, true)
            .await
            .unwrap();
    assert!(toggled.teacher_verification);

    let signed = verification::verify_session(
        storage,
        &director,
        &logbook_id,
        &session.id,
        Some("G. Pérez"),
    )
    .await
    .unwrap();
    let again = verification::verify_session(
        storage,
        &director,
        &logbook_id,
        &session.id,
        Some("otra firma"),
    )
    .await
    .unwrap();
    assert_eq!(signed.director_verification, again.director_verification);

    let stored = storage.get_logbook(&logbook_id).await.unwrap().unwrap();
    let verification = stored.sessions[0].director_verification.as_ref().unwrap();
    assert_eq!(verification.signature.as_deref(), Some("G. Pérez"));
    assert_eq!(verification.director_name, "Gabriela");

    let summaries = verification::director_teachers(storage).await.unwrap();
    let eva = summaries.iter().find(|s| s.teacher.id == teacher.id).unwrap();
    assert_eq!(eva.session_count, 1);
    assert_eq!(eva.pending_director_count, 0);

    let filtered = verification::director_logbooks(storage, Some(other.id.as_str()))
        .await
        .unwrap();
    assert!(filtered.is_empty());
    let all = verification::director_logbooks(storage, None).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].teacher_name, "Eva");
    assert_eq!(all[0].director_verified_count, 1);
}

pub async fn deletes_cascade(storage: &dyn Storage) {
    let teacher = user(storage, "20000007", "Hugo", UserRole::Profesor).await;
    let math = subject(storage, "Matemática").await;
    let history = subject(storage, "Historia").await;
    let first = course(storage, 1, 1).await;

    for s in [&math, &history] {
        storage
            .add_subject_course(NewSubjectCourse {
                subject_id: s.id.clone(),
                course_id: first.id.clone(),
            })
            .await
            .unwrap();
        storage
            .add_teacher_subject(NewTeacherSubject {
                teacher_id: teacher.id.clone(),
                subject_id: s.id.clone(),
                course_id: first.id.clone(),
            })
            .await
            .unwrap();
        storage
            .get_or_create_logbook(&teacher.id, &s.id, &first.id)
            .await
            .unwrap();
    }

    storage.delete_subject(&math.id).await.unwrap();
    assert_eq!(storage.get_subject_courses().await.unwrap().len(), 1);
    assert_eq!(storage.get_teacher_subjects().await.unwrap().len(), 1);
    assert_eq!(storage.get_logbooks().await.unwrap().len(), 1);

    storage.delete_user(&teacher.id).await.unwrap();
    assert!(storage.get_teacher_subjects().await.unwrap().is_empty());
    assert!(storage.get_logbooks().await.unwrap().is_empty());
    assert_eq!(storage.get_subject_courses().await.unwrap().len(), 1);

    assert!(matches!(
        storage.delete_subject(&math.id).await,
        Err(AppError::NotFound(_))
    ));
}

pub async fn bulk_delete_is_best_effort(storage: &dyn Storage) {
    let a = subject(storage, "A").await;
    let b = subject(storage, "B").await;

    let report = storage
        .delete_multiple_subjects(&[a.id.clone(), "missing".to_string(), b.id.clone()])
        .await
        .unwrap();
    assert_eq!(report.deleted, vec![a.id, b.id]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].id, "missing");
    assert!(storage.get_subjects().await.unwrap().is_empty());
}

pub async fn missing_references_are_rejected(storage: &dyn Storage) {
    let math = subject(storage, "Matemática").await;
    let link = storage
        .add_subject_course(NewSubjectCourse {
            subject_id: math.id.clone(),
            course_id: "no-such-course".into(),
        })
        .await;
    assert!(matches!(link, Err(AppError::Validation(_))));
}

/// 교사 한 명과 그 교사의 기록부 하나를 준비합니다.
async fn assigned_logbook(storage: &dyn Storage, dni: &str) -> (User, Logbook) {
    let teacher = user(storage, dni, "Inés", UserRole::Profesor).await;
    let math = subject(storage, "Matemática").await;
    let first = course(storage, 2, 1).await;
    let logbook = storage
        .get_or_create_logbook(&teacher.id, &math.id, &first.id)
        .await
        .unwrap();
    (teacher, logbook)
}

pub async fn concurrent_sessions_are_all_kept(storage: Arc<dyn Storage>) {
    let (teacher, logbook) = assigned_logbook(storage.as_ref(), "20000010").await;
    let director = user(storage.as_ref(), "20000011", "Julia", UserRole::Director).await;

    let mut handles = Vec::new();
    for i in 0..20 {
        let storage = storage.clone();
        let teacher = teacher.clone();
        let logbook_id = logbook.id.clone();
        handles.push(tokio::spawn(async move {
            verification::record_session(
                storage.as_ref(),
                &teacher,
                &logbook_id,
                lesson(&format!("Tema {}", i)),
                today(),
            )
            .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored = storage.get_logbook(&logbook.id).await.unwrap().unwrap();
    assert_eq!(stored.sessions.len(), 20);
    let numbers: Vec<u32> = stored.sessions.iter().map(|s| s.class_number).collect();
    assert_eq!(numbers, (1..=20).collect::<Vec<u32>>());

    // 서명, 체크박스, 추가가 동시에 일어나도 서로 덮어쓰지 않습니다.
    let mut handles = Vec::new();
    for (i, session) in stored.sessions.iter().enumerate() {
        let storage = storage.clone();
        let teacher = teacher.clone();
        let director = director.clone();
        let logbook_id = logbook.id.clone();
        let session_id = session.id.clone();
        handles.push(tokio::spawn(async move {
            if i % 2 == 0 {
                verification::verify_session(storage.as_ref(), &director, &logbook_id, &session_id, None)
                    .await
            } else {
                verification::set_teacher_verification(
                    storage.as_ref(),
                    &teacher,
                    &logbook_id,
                    &session_id,
                    true,
                )
                .await
            }
        }));
    }
    for i in 0..5 {
        let storage = storage.clone();
        let teacher = teacher.clone();
        let logbook_id = logbook.id.clone();
        handles.push(tokio::spawn(async move {
            verification::record_session(
                storage.as_ref(),
                &teacher,
                &logbook_id,
                lesson(&format!("Repaso {}", i)),
                today(),
            )
            .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored = storage.get_logbook(&logbook.id).await.unwrap().unwrap();
    assert_eq!(stored.sessions.len(), 25);
    assert_eq!(stored.director_verified_count(), 10);
    assert_eq!(stored.teacher_verified_count(), 10);
    for (i, session) in stored.sessions.iter().take(20).enumerate() {
        assert_eq!(session.is_director_verified(), i % 2 == 0, "session {}", i);
        assert_eq!(session.teacher_verification, i % 2 == 1, "session {}", i);
    }
}

pub async fn session_ops_reject_unknown_ids(storage: &dyn Storage) {
    let (_, logbook) = assigned_logbook(storage, "20000012").await;

    let missing_logbook = storage.append_session("no-such-logbook", lesson("x"), today()).await;
    assert!(matches!(missing_logbook, Err(AppError::NotFound(_))));

    let missing_session = storage
        .update_session(
            &logbook.id,
            "no-such-session",
            SessionChange::TeacherVerification(true),
        )
        .await;
    assert!(matches!(missing_session, Err(AppError::NotFound(_))));

    let invalid = storage
        .append_session(
            &logbook.id,
            NewSession {
                content: " ".into(),
                ..lesson("x")
            },
            today(),
        )
        .await;
    assert!(matches!(invalid, Err(AppError::Validation(_))));
    assert!(storage
        .get_logbook(&logbook.id)
        .await
        .unwrap()
        .unwrap()
        .sessions
        .is_empty());
}

pub async fn logbook_round_trip_keeps_sessions(storage: &dyn Storage) {
    let (_, mut logbook) = assigned_logbook(storage, "20000013").await;
    for content in ["Conjuntos", "Funciones", "Límites"] {
        logbook.append_session(lesson(content), today()).unwrap();
    }
    logbook.sessions[0].set_teacher_verification(true);
    assert!(logbook.sessions[1].verify_by_director(
        "Julia",
        Some("J. Ruiz"),
        "2026-03-11T09:00:00.000Z"
    ));

    let saved = storage.add_or_update_logbook(logbook.clone()).await.unwrap();
    assert_eq!(saved.sessions, logbook.sessions);

    let resaved = storage.add_or_update_logbook(saved.clone()).await.unwrap();
    let stored = storage.get_logbook(&logbook.id).await.unwrap().unwrap();
    assert_eq!(resaved.sessions, logbook.sessions);
    assert_eq!(stored.sessions, logbook.sessions);
    assert_eq!(
        stored.sessions.iter().map(|s| s.content.as_str()).collect::<Vec<_>>(),
        vec!["Conjuntos", "Funciones", "Límites"]
    );
    assert_eq!(
        stored.sessions[1].director_verification,
        logbook.sessions[1].director_verification
    );

    // 교장 검증 전에 읽어 둔 사본을 저장해도 서명은 남습니다.
    let mut stale = stored.clone();
    stale.sessions[1].director_verification = None;
    stale.sessions[1].set_teacher_verification(true);
    storage.add_or_update_logbook(stale).await.unwrap();

    let stored = storage.get_logbook(&logbook.id).await.unwrap().unwrap();
    assert!(stored.sessions[1].teacher_verification);
    assert_eq!(
        stored.sessions[1].director_verification,
        logbook.sessions[1].director_verification
    );
}

pub async fn partial_sync_reports_applied_steps(storage: &dyn Storage) {
    let target = course(storage, 3, 1).await;
    let a = subject(storage, "A").await;
    let b = subject(storage, "B").await;
    sync::sync_course_subjects(storage, &target.id, &[b.id.clone()])
        .await
        .unwrap();

    // B 삭제와 A 생성은 적용되고, 없는 과목에서 멈춥니다.
    let result = sync::sync_course_subjects(
        storage,
        &target.id,
        &[a.id.clone(), "no-such-subject".to_string()],
    )
    .await;
    match result {
        Err(AppError::PartialSync {
            removed,
            created,
            message,
        }) => {
            assert_eq!((removed, created), (1, 1));
            assert!(message.contains(libro_temas::error::MISSING_REFERENCE), "{}", message);
        }
        other => panic!("expected a partial sync, got {:?}", other),
    }

    let linked: Vec<String> = storage
        .get_subject_courses()
        .await
        .unwrap()
        .into_iter()
        .filter(|l| l.course_id == target.id)
        .map(|l| l.subject_id)
        .collect();
    assert_eq!(linked, vec![a.id]);
}
