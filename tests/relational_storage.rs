mod common;

use std::sync::Arc;

use libro_temas::{
    error::AppError,
    models::NewSubject,
    storage::{DeviceSession, RelationalStorage, Storage},
};
use sqlx::sqlite::SqliteConnectOptions;
use tempfile::TempDir;

async fn storage() -> (TempDir, RelationalStorage) {
    let dir = tempfile::tempdir().unwrap();
    let options = SqliteConnectOptions::new()
        .filename(dir.path().join("libro.db"))
        .create_if_missing(true);
    let storage = RelationalStorage::connect_with(options).await.unwrap();
    (dir, storage)
}

#[tokio::test]
async fn dni_is_unique() {
    let (_dir, storage) = storage().await;
    common::dni_is_unique(&storage).await;
}

#[tokio::test]
async fn subject_names_are_case_insensitive() {
    let (_dir, storage) = storage().await;
    common::subject_names_are_case_insensitive(&storage).await;
}

#[tokio::test]
async fn course_rules() {
    let (_dir, storage) = storage().await;
    common::course_rules(&storage).await;
}

#[tokio::test]
async fn initialize_data_is_idempotent() {
    let (_dir, storage) = storage().await;
    common::initialize_data_is_idempotent(&storage).await;
}

#[tokio::test]
async fn login_scenario() {
    let (dir, storage) = storage().await;
    let device = DeviceSession::new(dir.path().join("device"));
    common::login_scenario(&storage, &device).await;
}

#[tokio::test]
async fn logbook_upsert_keeps_one_per_assignment() {
    let (_dir, storage) = storage().await;
    common::logbook_upsert_keeps_one_per_assignment(&storage).await;
}

#[tokio::test]
async fn course_subject_sync() {
    let (_dir, storage) = storage().await;
    common::course_subject_sync(&storage).await;
}

#[tokio::test]
async fn teacher_assignment_sync() {
    let (_dir, storage) = storage().await;
    common::teacher_assignment_sync(&storage).await;
}

#[tokio::test]
async fn sessions_and_verification() {
    let (_dir, storage) = storage().await;
    common::sessions_and_verification(&storage).await;
}

#[tokio::test]
async fn deletes_cascade() {
    let (_dir, storage) = storage().await;
    common::deletes_cascade(&storage).await;
}

#[tokio::test]
async fn bulk_delete_is_best_effort() {
    let (_dir, storage) = storage().await;
    common::bulk_delete_is_best_effort(&storage).await;
}

#[tokio::test]
async fn missing_references_are_rejected() {
    let (_dir, storage) = storage().await;
    common::missing_references_are_rejected(&storage).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sessions_are_all_kept() {
    let (_dir, storage) = storage().await;
    common::concurrent_sessions_are_all_kept(Arc::new(storage)).await;
}

#[tokio::test]
async fn session_ops_reject_unknown_ids() {
    let (_dir, storage) = storage().await;
    common::session_ops_reject_unknown_ids(&storage).await;
}

#[tokio::test]
async fn logbook_round_trip_keeps_sessions() {
    let (_dir, storage) = storage().await;
    common::logbook_round_trip_keeps_sessions(&storage).await;
}

#[tokio::test]
async fn partial_sync_reports_applied_steps() {
    let (_dir, storage) = storage().await;
    common::partial_sync_reports_applied_steps(&storage).await;
}

#[tokio::test]
async fn unavailable_storage_reads_empty_and_refuses_writes() {
    let storage = RelationalStorage::unavailable();
    assert!(!storage.is_available());
    assert!(storage.get_users().await.unwrap().is_empty());
    assert!(storage.get_logbooks().await.unwrap().is_empty());

    let write = storage
        .add_subject(NewSubject {
            name: "Física".into(),
        })
        .await;
    assert!(matches!(write, Err(AppError::NotConfigured)));
}
