//! User and session models.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::{FromRow, SqlitePool};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Users must have an email address")]
    EmptyEmail,

    #[error("Failed to hash password: {0}")]
    PasswordHash(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub created_at: String,
}

/// Public view of a user, as returned by the user endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub email: String,
    pub name: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            email: user.email,
            name: user.name,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Lowercase the domain part of an email address, keeping the local part as given
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, UserError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| UserError::PasswordHash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

impl User {
    /// Create and persist a regular user
    pub async fn create(
        db: &SqlitePool,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<User, UserError> {
        Self::insert(db, email, password, name, false).await
    }

    /// Create and persist a user with staff and superuser rights
    pub async fn create_superuser(
        db: &SqlitePool,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<User, UserError> {
        Self::insert(db, email, password, name, true).await
    }

    async fn insert(
        db: &SqlitePool,
        email: &str,
        password: &str,
        name: &str,
        superuser: bool,
    ) -> Result<User, UserError> {
        if email.trim().is_empty() {
            return Err(UserError::EmptyEmail);
        }

        let email = normalize_email(email);
        let password_hash = hash_password(password)?;
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            INSERT INTO users (email, name, password_hash, is_active, is_staff, is_superuser, created_at)
            VALUES (?, ?, ?, 1, ?, ?, ?)
            "#,
        )
        .bind(&email)
        .bind(name)
        .bind(&password_hash)
        .bind(superuser)
        .bind(superuser)
        .bind(&now)
        .execute(db)
        .await?;

        let user = Self::get_by_id(db, result.last_insert_rowid())
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        Ok(user)
    }

    pub async fn get_by_id(db: &SqlitePool, id: i64) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Look up a user by email; the address is normalized first
    pub async fn get_by_email(db: &SqlitePool, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM users WHERE email = ?")
            .bind(normalize_email(email))
            .fetch_optional(db)
            .await
    }

    pub fn check_password(&self, password: &str) -> bool {
        verify_password(password, &self.password_hash)
    }

    /// Apply a partial profile update, re-hashing the password when given
    pub async fn update(
        db: &SqlitePool,
        id: i64,
        name: Option<&str>,
        password: Option<&str>,
    ) -> Result<User, UserError> {
        let password_hash = password.map(hash_password).transpose()?;

        sqlx::query(
            r#"
            UPDATE users SET
                name = COALESCE(?, name),
                password_hash = COALESCE(?, password_hash)
            WHERE id = ?
            "#,
        )
        .bind(name)
        .bind(password_hash)
        .bind(id)
        .execute(db)
        .await?;

        let user = Self::get_by_id(db, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        Ok(user)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub id: String,
    pub user_id: i64,
    pub token_hash: String,
    pub expires_at: String,
    pub created_at: String,
}

/// Generate a random token
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    hex::encode(bytes)
}

/// Hash a token for storage
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

impl Session {
    /// Issue a new token for a user. Only the hash is stored; the plain token
    /// is returned to the caller once.
    pub async fn issue(
        db: &SqlitePool,
        user_id: i64,
        ttl_days: i64,
    ) -> Result<String, sqlx::Error> {
        let token = generate_token();
        let now = chrono::Utc::now();
        let expires_at = (now + chrono::Duration::days(ttl_days)).to_rfc3339();

        sqlx::query(
            "INSERT INTO sessions (id, user_id, token_hash, expires_at, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(hash_token(&token))
        .bind(&expires_at)
        .bind(now.to_rfc3339())
        .execute(db)
        .await?;

        Ok(token)
    }

    /// Resolve a plain token to its active user, if the session is still valid
    pub async fn find_user(db: &SqlitePool, token: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT u.* FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token_hash = ? AND s.expires_at > ? AND u.is_active = 1
            "#,
        )
        .bind(hash_token(token))
        .bind(chrono::Utc::now().to_rfc3339())
        .fetch_optional(db)
        .await
    }

    /// Remove expired sessions, returning how many were deleted
    pub async fn purge_expired(db: &SqlitePool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(chrono::Utc::now().to_rfc3339())
            .execute(db)
            .await?;
        Ok(result.rows_affected())
    }
}
