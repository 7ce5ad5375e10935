use crate::error::AppError;
use crate::models::{NewUser, User};
use sqlx::SqlitePool;

#[derive(Debug, sqlx::FromRow)]
pub struct UserRow {
    pub id: String,
    pub dni: String,
    pub name: String,
    pub password: String,
    pub role: String,
    pub created_at: String,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            dni: row.dni,
            name: row.name,
            password: row.password,
            role: row.role.parse()?,
            created_at: row.created_at,
        })
    }
}

const DNI_TAKEN: &str = "Ya existe un usuario con este DNI";

pub async fn list_users(pool: &SqlitePool) -> Result<Vec<User>, AppError> {
    let rows = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT id, dni, name, password, role, created_at
        FROM users
        ORDER BY created_at, id
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(User::try_from).collect()
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<User>, AppError> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT id, dni, name, password, role, created_at
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(User::try_from).transpose()
}

pub async fn find_by_dni(pool: &SqlitePool, dni: &str) -> Result<Option<User>, AppError> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT id, dni, name, password, role, created_at
        FROM users
        WHERE dni = ?
        "#,
    )
    .bind(dni)
    .fetch_optional(pool)
    .await?;

    row.map(User::try_from).transpose()
}

pub async fn create_user(pool: &SqlitePool, id: &str, user: &NewUser) -> Result<User, AppError> {
    sqlx::query(
        r#"
        INSERT INTO users (id, dni, name, password, role)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(&user.dni)
    .bind(&user.name)
    .bind(&user.password)
    .bind(user.role.as_str())
    .execute(pool)
    .await
    .map_err(|e| AppError::from_write(e, DNI_TAKEN))?;

    find_by_id(pool, id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created user".to_string()))
}

/// 병합이 끝난 사용자 전체를 저장합니다.
pub async fn update_user(pool: &SqlitePool, user: &User) -> Result<u64, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET dni = ?, name = ?, password = ?, role = ?
        WHERE id = ?
        "#,
    )
    .bind(&user.dni)
    .bind(&user.name)
    .bind(&user.password)
    .bind(user.role.as_str())
    .bind(&user.id)
    .execute(pool)
    .await
    .map_err(|e| AppError::from_write(e, DNI_TAKEN))?;

    Ok(result.rows_affected())
}

/// 교사 할당과 기록부는 `ON DELETE CASCADE`로 함께 지워집니다.
pub async fn delete_user(pool: &SqlitePool, id: &str) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
