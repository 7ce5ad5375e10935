mod common;

use std::sync::Arc;

use libro_temas::storage::{DeviceSession, LocalStorage, Storage};
use tempfile::TempDir;

fn storage() -> (TempDir, LocalStorage) {
    let dir = tempfile::tempdir().unwrap();
    let storage = LocalStorage::new(dir.path());
    (dir, storage)
}

#[tokio::test]
async fn dni_is_unique() {
    let (_dir, storage) = storage();
    common::dni_is_unique(&storage).await;
}

#[tokio::test]
async fn subject_names_are_case_insensitive() {
    let (_dir, storage) = storage();
    common::subject_names_are_case_insensitive(&storage).await;
}

#[tokio::test]
async fn course_rules() {
    let (_dir, storage) = storage();
    common::course_rules(&storage).await;
}

#[tokio::test]
async fn initialize_data_is_idempotent() {
    let (_dir, storage) = storage();
    common::initialize_data_is_idempotent(&storage).await;
}

#[tokio::test]
async fn login_scenario() {
    let (dir, storage) = storage();
    let device = DeviceSession::new(dir.path());
    common::login_scenario(&storage, &device).await;
}

#[tokio::test]
async fn logbook_upsert_keeps_one_per_assignment() {
    let (_dir, storage) = storage();
    common::logbook_upsert_keeps_one_per_assignment(&storage).await;
}

#[tokio::test]
async fn course_subject_sync() {
    let (_dir, storage) = storage();
    common::course_subject_sync(&storage).await;
}

#[tokio::test]
async fn teacher_assignment_sync() {
    let (_dir, storage) = storage();
    common::teacher_assignment_sync(&storage).await;
}

#[tokio::test]
async fn sessions_and_verification() {
    let (_dir, storage) = storage();
    common::sessions_and_verification(&storage).await;
}

#[tokio::test]
async fn deletes_cascade() {
    let (_dir, storage) = storage();
    common::deletes_cascade(&storage).await;
}

#[tokio::test]
async fn bulk_delete_is_best_effort() {
    let (_dir, storage) = storage();
    common::bulk_delete_is_best_effort(&storage).await;
}

#[tokio::test]
async fn missing_references_are_rejected() {
    let (_dir, storage) = storage();
    common::missing_references_are_rejected(&storage).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sessions_are_all_kept() {
    let (_dir, storage) = storage();
    common::concurrent_sessions_are_all_kept(Arc::new(storage)).await;
}

#[tokio::test]
async fn session_ops_reject_unknown_ids() {
    let (_dir, storage) = storage();
    common::session_ops_reject_unknown_ids(&storage).await;
}

#[tokio::test]
async fn logbook_round_trip_keeps_sessions() {
    let (_dir, storage) = storage();
    common::logbook_round_trip_keeps_sessions(&storage).await;
}

#[tokio::test]
async fn partial_sync_reports_applied_steps() {
    let (_dir, storage) = storage();
    common::partial_sync_reports_applied_steps(&storage).await;
}

#[tokio::test]
async fn data_survives_reopening() {
    let (dir, storage) = storage();
    common::subject(&storage, "Geografía").await;
    drop(storage);

    let reopened = LocalStorage::new(dir.path());
    let subjects = reopened.get_subjects().await.unwrap();
    assert_eq!(subjects.len(), 1);
    assert_eq!(subjects[0].name, "Geografía");
}

#[tokio::test]
async fn concurrent_writes_are_not_lost() {
    let (_dir, storage) = storage();
    let storage = Arc::new(storage);

    let mut handles = Vec::new();
    for i in 0..10 {
        let storage = storage.clone();
        handles.push(tokio::spawn(async move {
            storage
                .add_subject(libro_temas::models::NewSubject {
                    name: format!("Materia {}", i),
                })
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    assert_eq!(storage.get_subjects().await.unwrap().len(), 10);
}
