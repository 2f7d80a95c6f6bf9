//! User Repository

use sqlx::{FromRow, SqlitePool};

use super::{RepoError, RepoResult};
use crate::db::models::{User, UserRole};

const SELECT_COLUMNS: &str = "id, email, name, hash_pass, role, is_active, created_at, updated_at";

#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    email: String,
    name: String,
    hash_pass: String,
    role: String,
    is_active: bool,
    created_at: i64,
    updated_at: i64,
}

impl UserRow {
    fn hydrate(self) -> RepoResult<User> {
        let role: UserRole = self
            .role
            .parse()
            .map_err(|_| RepoError::Database(format!("Corrupt role column: {}", self.role)))?;

        Ok(User {
            id: self.id,
            email: self.email,
            name: self.name,
            hash_pass: self.hash_pass,
            role,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

pub async fn insert(pool: &SqlitePool, user: &User) -> RepoResult<()> {
    let result = sqlx::query(
        "INSERT INTO users (id, email, name, hash_pass, role, is_active, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&user.id)
    .bind(&user.email)
    .bind(&user.name)
    .bind(&user.hash_pass)
    .bind(user.role.as_str())
    .bind(user.is_active)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(()),
        // UNIQUE constraint on email is the concurrency backstop behind the
        // pre-insert existence check
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(RepoError::Duplicate(
            format!("Email already registered: {}", user.email),
        )),
        Err(e) => Err(e.into()),
    }
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> RepoResult<Option<User>> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM users WHERE email = ? LIMIT 1"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;

    row.map(UserRow::hydrate).transpose()
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> RepoResult<Option<User>> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM users WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(UserRow::hydrate).transpose()
}
