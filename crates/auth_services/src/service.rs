use async_trait::async_trait;
use bcrypt::{DEFAULT_COST, hash, verify};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::types::{AuthError, RegisterRequest, Role, User};

/// Source of truth for the current state of user accounts.
///
/// Authentication consults it on every request so that role changes and
/// account removals take effect before the token expires.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Current role of the user, or `None` once the account is gone.
    async fn current_role(&self, user_id: &Uuid) -> Result<Option<Role>, AuthError>;
}

/// A service for handling user account operations: registration,
/// lookup and credential verification.
pub struct AuthService {
    pool: PgPool,
}

impl AuthService {
    /// Creates a new instance of `AuthService` with the provided database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a new user with the `user` role.
    pub async fn create_user(&self, request: &RegisterRequest) -> Result<User, AuthError> {
        let email = request.email.trim().to_lowercase();

        let existing_user = sqlx::query("SELECT id FROM users WHERE email = $1")
            .bind(&email)
            .fetch_optional(&self.pool)
            .await?;

        if existing_user.is_some() {
            return Err(AuthError::EmailExists);
        }

        let password_hash = hash(&request.password, DEFAULT_COST)?;

        let row = sqlx::query(
            r#"
            INSERT INTO users (id, name, tel, email, role, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, tel, email, role, password_hash, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.name.trim())
        .bind(request.tel.trim())
        .bind(&email)
        .bind(Role::User.as_str())
        .bind(&password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            // Lost a race with a concurrent registration for the same email
            sqlx::Error::Database(db) if db.is_unique_violation() => AuthError::EmailExists,
            _ => AuthError::Database(e),
        })?;

        user_from_row(&row)
    }

    /// Retrieves a user by their email address, returning `None` if not found.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, tel, email, role, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// Retrieves a user by their ID, returning `None` if not found.
    pub async fn get_user_by_id(&self, user_id: &Uuid) -> Result<Option<User>, AuthError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, tel, email, role, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// Verifies the user's password against the stored hash.
    pub async fn verify_password(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let user = self
            .get_user_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user)
    }
}

#[async_trait]
impl UserDirectory for AuthService {
    async fn current_role(&self, user_id: &Uuid) -> Result<Option<Role>, AuthError> {
        let role: Option<String> = sqlx::query_scalar("SELECT role FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        role.map(|role| role.parse()).transpose()
    }
}

fn user_from_row(row: &PgRow) -> Result<User, AuthError> {
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        tel: row.try_get("tel")?,
        email: row.try_get("email")?,
        role: row.try_get::<String, _>("role")?.parse()?,
        password_hash: row.try_get("password_hash")?,
        created_at: row.try_get("created_at")?,
    })
}
