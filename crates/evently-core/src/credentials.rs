//! Credential storage
//!
//! The authentication pipeline only needs four operations on stored accounts,
//! captured by [`CredentialStore`]. [`PgCredentialStore`] implements them on
//! the `users` table with SQLx.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{Credential, EventlyError, NewCredential, Result, Role};

/// Trait for credential operations
///
/// Implementations must tolerate concurrent calls without external locking.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find the single account with this exact email
    async fn find_by_email(&self, email: &str) -> Result<Option<Credential>>;

    /// Find an account by subject ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Credential>>;

    /// Create an account; fails with [`EventlyError::Conflict`] on a duplicate email
    async fn insert(&self, credential: NewCredential) -> Result<Credential>;

    /// Replace the password hash and bump `updated_at`
    async fn update_password_hash(&self, id: Uuid, new_hash: &str) -> Result<()>;
}

/// PostgreSQL credential store
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    /// Create a new store connection
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| {
                EventlyError::DatabaseError(format!("PostgreSQL connection failed: {e}"))
            })?;

        tracing::info!(max_connections, "Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Apply the bundled schema migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| EventlyError::DatabaseError(format!("Migration failed: {e}")))?;

        tracing::info!("Database migrations applied");
        Ok(())
    }
}

/// User row from database
#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    first_name: String,
    last_name: String,
    password_hash: String,
    role: String,
    is_active: Option<bool>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<UserRow> for Credential {
    type Error = EventlyError;

    fn try_from(row: UserRow) -> Result<Self> {
        let role: Role = row.role.parse().map_err(|_| {
            EventlyError::DatabaseError(format!("Invalid role in users row: {}", row.role))
        })?;
        let created_at = row.created_at.unwrap_or_else(Utc::now);

        Ok(Credential {
            id: row.id,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            password_hash: row.password_hash,
            role,
            // A NULL flag is treated as inactive
            is_active: row.is_active.unwrap_or(false),
            created_at,
            updated_at: row.updated_at.unwrap_or(created_at),
        })
    }
}

const USER_COLUMNS: &str =
    "id, email, first_name, last_name, password_hash, role, is_active, created_at, updated_at";

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Credential>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
                .bind(email)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| EventlyError::DatabaseError(format!("Failed to fetch user: {e}")))?;

        row.map(Credential::try_from).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Credential>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 LIMIT 1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| EventlyError::DatabaseError(format!("Failed to fetch user: {e}")))?;

        row.map(Credential::try_from).transpose()
    }

    async fn insert(&self, credential: NewCredential) -> Result<Credential> {
        let role = credential.role.unwrap_or_default();

        let row: UserRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO users (email, first_name, last_name, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&credential.email)
        .bind(&credential.first_name)
        .bind(&credential.last_name)
        .bind(&credential.password_hash)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db) if db.is_unique_violation() => {
                tracing::debug!(email = %credential.email, "Duplicate email on insert");
                EventlyError::Conflict(format!("email already in use: {}", credential.email))
            }
            _ => EventlyError::DatabaseError(format!("Failed to create user: {e}")),
        })?;

        Credential::try_from(row)
    }

    async fn update_password_hash(&self, id: Uuid, new_hash: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(new_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| EventlyError::DatabaseError(format!("Failed to update password: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(EventlyError::NotFound(format!("user {id}")));
        }

        Ok(())
    }
}
