// ============================
// crates/backend-lib/src/storage.rs
// ============================
//! Credential store abstraction with a SQLite implementation.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use curagenie_common::{Role, UserInfo};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

use crate::error::AppError;

/// A stored user record
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// Public view without the password hash
    pub fn to_info(&self) -> UserInfo {
        UserInfo {
            id: self.id,
            email: self.email.clone(),
            username: self.username.clone(),
            role: self.role,
            is_active: self.is_active,
            is_verified: self.is_verified,
            created_at: self.created_at,
        }
    }
}

/// Fields required to create a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

/// A tracked refresh token
#[derive(Debug, Clone)]
pub struct RefreshTokenRecord {
    pub jti: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    username: String,
    password_hash: String,
    role: String,
    is_active: bool,
    is_verified: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        UserRecord {
            id: row.id,
            email: row.email,
            username: row.username,
            password_hash: row.password_hash,
            role: Role::parse(&row.role).unwrap_or(Role::Patient),
            is_active: row.is_active,
            is_verified: row.is_verified,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RefreshTokenRow {
    jti: String,
    user_id: i64,
    expires_at: DateTime<Utc>,
    revoked: bool,
}

impl From<RefreshTokenRow> for RefreshTokenRecord {
    fn from(row: RefreshTokenRow) -> Self {
        RefreshTokenRecord {
            jti: row.jti,
            user_id: row.user_id,
            expires_at: row.expires_at,
            revoked: row.revoked,
        }
    }
}

/// Trait for credential store backends
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user, failing on duplicate email or username
    async fn insert_user(&self, new_user: NewUser) -> Result<UserRecord, AppError>;

    /// Look up a user by email
    async fn user_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError>;

    /// Look up a user by id
    async fn user_by_id(&self, id: i64) -> Result<Option<UserRecord>, AppError>;

    /// List all users, newest first
    async fn list_users(&self) -> Result<Vec<UserRecord>, AppError>;

    /// Set the active flag, returning the updated record
    async fn set_user_active(&self, id: i64, active: bool) -> Result<UserRecord, AppError>;

    /// Replace the stored password hash
    async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), AppError>;

    /// Mark a user's email as verified
    async fn mark_verified(&self, id: i64) -> Result<(), AppError>;

    /// Track an issued refresh token for revocation
    async fn insert_refresh_token(
        &self,
        jti: &str,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError>;

    /// Look up a tracked refresh token by its id
    async fn refresh_token(&self, jti: &str) -> Result<Option<RefreshTokenRecord>, AppError>;

    /// Revoke a single refresh token
    async fn revoke_refresh_token(&self, jti: &str) -> Result<(), AppError>;

    /// Revoke every refresh token belonging to a user, returning the count
    async fn revoke_refresh_tokens_for_user(&self, user_id: i64) -> Result<u64, AppError>;

    /// Store a single-use password reset token
    async fn insert_password_reset(
        &self,
        token: &str,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError>;

    /// Consume a reset token, returning the owning user id when it was
    /// valid, unused, and unexpired. A consumed token never validates again.
    async fn consume_password_reset(&self, token: &str) -> Result<Option<i64>, AppError>;

    /// Remove expired refresh tokens and spent reset tokens
    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<(), AppError>;
}

/// SQLite implementation of the credential store
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS users (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        email         TEXT NOT NULL UNIQUE,
        username      TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        role          TEXT NOT NULL DEFAULT 'patient',
        is_active     INTEGER NOT NULL DEFAULT 1,
        is_verified   INTEGER NOT NULL DEFAULT 0,
        created_at    TEXT NOT NULL,
        updated_at    TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS refresh_tokens (
        jti        TEXT PRIMARY KEY,
        user_id    INTEGER NOT NULL REFERENCES users(id),
        expires_at TEXT NOT NULL,
        revoked    INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    )"#,
    r#"CREATE INDEX IF NOT EXISTS idx_refresh_tokens_user ON refresh_tokens(user_id)"#,
    r#"CREATE TABLE IF NOT EXISTS password_resets (
        token      TEXT PRIMARY KEY,
        user_id    INTEGER NOT NULL REFERENCES users(id),
        expires_at TEXT NOT NULL,
        used       INTEGER NOT NULL DEFAULT 0
    )"#,
];

impl SqliteStorage {
    /// Open a connection pool against `database_url`, creating the database
    /// file when it does not exist yet
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the tables if they are missing. Idempotent.
    pub async fn init_schema(&self) -> Result<(), AppError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

/// Map a unique-constraint violation onto the duplicate-user error
fn map_insert_error(err: sqlx::Error, new_user: &NewUser) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let field = if db_err.message().contains("username") {
                &new_user.username
            } else {
                &new_user.email
            };
            return AppError::DuplicateUser(field.clone());
        }
    }
    AppError::Database(err)
}

#[async_trait]
impl UserStore for SqliteStorage {
    async fn insert_user(&self, new_user: NewUser) -> Result<UserRecord, AppError> {
        let now = Utc::now();
        let row: UserRow = sqlx::query_as(
            r#"INSERT INTO users (email, username, password_hash, role, is_active, is_verified, created_at, updated_at)
               VALUES (?, ?, ?, ?, 1, 0, ?, ?)
               RETURNING id, email, username, password_hash, role, is_active, is_verified, created_at, updated_at"#,
        )
        .bind(&new_user.email)
        .bind(&new_user.username)
        .bind(&new_user.password_hash)
        .bind(new_user.role.as_str())
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, &new_user))?;

        Ok(row.into())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"SELECT id, email, username, password_hash, role, is_active, is_verified, created_at, updated_at
               FROM users WHERE email = ?"#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn user_by_id(&self, id: i64) -> Result<Option<UserRecord>, AppError> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"SELECT id, email, username, password_hash, role, is_active, is_verified, created_at, updated_at
               FROM users WHERE id = ?"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, AppError> {
        let rows: Vec<UserRow> = sqlx::query_as(
            r#"SELECT id, email, username, password_hash, role, is_active, is_verified, created_at, updated_at
               FROM users ORDER BY created_at DESC, id DESC"#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn set_user_active(&self, id: i64, active: bool) -> Result<UserRecord, AppError> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"UPDATE users SET is_active = ?, updated_at = ?
               WHERE id = ?
               RETURNING id, email, username, password_hash, role, is_active, is_verified, created_at, updated_at"#,
        )
        .bind(active)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Into::into)
            .ok_or_else(|| AppError::NotFound(format!("user {id}")))
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), AppError> {
        let result = sqlx::query(r#"UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?"#)
            .bind(password_hash)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("user {id}")));
        }
        Ok(())
    }

    async fn mark_verified(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query(r#"UPDATE users SET is_verified = 1, updated_at = ? WHERE id = ?"#)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("user {id}")));
        }
        Ok(())
    }

    async fn insert_refresh_token(
        &self,
        jti: &str,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"INSERT INTO refresh_tokens (jti, user_id, expires_at, revoked, created_at)
               VALUES (?, ?, ?, 0, ?)"#,
        )
        .bind(jti)
        .bind(user_id)
        .bind(expires_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn refresh_token(&self, jti: &str) -> Result<Option<RefreshTokenRecord>, AppError> {
        let row: Option<RefreshTokenRow> = sqlx::query_as(
            r#"SELECT jti, user_id, expires_at, revoked FROM refresh_tokens WHERE jti = ?"#,
        )
        .bind(jti)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn revoke_refresh_token(&self, jti: &str) -> Result<(), AppError> {
        sqlx::query(r#"UPDATE refresh_tokens SET revoked = 1 WHERE jti = ?"#)
            .bind(jti)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn revoke_refresh_tokens_for_user(&self, user_id: i64) -> Result<u64, AppError> {
        let result =
            sqlx::query(r#"UPDATE refresh_tokens SET revoked = 1 WHERE user_id = ? AND revoked = 0"#)
                .bind(user_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }

    async fn insert_password_reset(
        &self,
        token: &str,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"INSERT INTO password_resets (token, user_id, expires_at, used) VALUES (?, ?, ?, 0)"#,
        )
        .bind(token)
        .bind(user_id)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn consume_password_reset(&self, token: &str) -> Result<Option<i64>, AppError> {
        let row: Option<(i64,)> = sqlx::query_as(
            r#"UPDATE password_resets SET used = 1
               WHERE token = ? AND used = 0 AND expires_at > ?
               RETURNING user_id"#,
        )
        .bind(token)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(user_id,)| user_id))
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query(r#"DELETE FROM refresh_tokens WHERE expires_at <= ?"#)
            .bind(now)
            .execute(&self.pool)
            .await?;

        sqlx::query(r#"DELETE FROM password_resets WHERE expires_at <= ? OR used = 1"#)
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
