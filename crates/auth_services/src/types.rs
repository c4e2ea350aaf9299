use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Role granted to a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular account, bound by the booking quota and ownership rules
    User,
    /// Administrator, may act on any booking and manage campgrounds
    Admin,
}

impl Role {
    /// Returns the role name as stored in the database and carried in tokens.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    /// Whether this role bypasses ownership checks and the booking quota.
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(AuthError::UnknownRole(other.to_string())),
        }
    }
}

/// Request structure for user registration
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Name of the user
    #[validate(length(min = 1, max = 255, message = "Please add a name"))]
    pub name: String,

    /// Telephone number of the user
    #[validate(length(min = 1, max = 32, message = "Please add a telephone number"))]
    pub tel: String,

    /// Email address of the user
    #[validate(email(message = "Please add a valid email"))]
    pub email: String,

    /// Password for the user account
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Request structure for user login
///
/// Both fields default to empty so a missing field is reported as
/// missing credentials rather than a malformed body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Email address of the user
    #[serde(default)]
    pub email: String,

    /// Password for the user account
    #[serde(default)]
    pub password: String,
}

/// User model representing the database schema
#[derive(Debug, Clone)]
pub struct User {
    /// Unique identifier for the user
    pub id: Uuid,
    /// Name of the user
    pub name: String,
    /// Telephone number of the user
    pub tel: String,
    /// Email address of the user (lower-cased)
    pub email: String,
    /// Role of the user
    pub role: Role,
    /// Hashed password of the user
    pub password_hash: String,
    /// Timestamp when the user was created
    pub created_at: DateTime<Utc>,
}

/// Information about the user, used in responses
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    /// Unique identifier for the user
    pub id: Uuid,
    /// Name of the user
    pub name: String,
    /// Telephone number of the user
    pub tel: String,
    /// Email address of the user
    pub email: String,
    /// Role of the user
    pub role: Role,
    /// Timestamp when the user was created
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            tel: user.tel,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Response structure for a successful register or login
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    /// Always `true`
    pub success: bool,
    /// Signed access token
    pub token: String,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject of the token, the user ID
    pub sub: String,
    /// Email address of the user
    pub email: String,
    /// Role of the user ("user" or "admin")
    pub role: String,
    /// Expiration timestamp of the token
    pub exp: usize,
    /// Issued at timestamp of the token
    pub iat: usize,
}

/// Custom error type for authentication-related errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The email address already exists in the system
    #[error("Email already exists")]
    EmailExists,

    /// Email or password missing from a login request
    #[error("Missing email or password")]
    MissingCredentials,

    /// The provided credentials are invalid
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No valid token accompanied a protected request
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The caller's role is outside the set allowed for a route
    #[error("Role {0} is not allowed")]
    Forbidden(Role),

    /// A role string that is neither "user" nor "admin"
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// A database error occurred
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An error occurred while hashing the password
    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    /// An error occurred while signing or verifying a token
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// An error occurred while validating input data
    #[error("Validation error: {0}")]
    Validation(String),
}

impl actix_web::ResponseError for AuthError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;

        match self {
            AuthError::EmailExists | AuthError::MissingCredentials | AuthError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            AuthError::InvalidCredentials
            | AuthError::NotAuthenticated
            | AuthError::UnknownRole(_)
            | AuthError::Jwt(_) => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
            AuthError::Database(_) | AuthError::PasswordHash(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        let message = match self {
            AuthError::EmailExists => "An account with this email already exists".to_string(),
            AuthError::MissingCredentials => "Please provide an email and password".to_string(),
            AuthError::InvalidCredentials => "Invalid credentials".to_string(),
            AuthError::NotAuthenticated | AuthError::UnknownRole(_) | AuthError::Jwt(_) => {
                "Not authorized to access this route".to_string()
            }
            AuthError::Forbidden(role) => {
                format!("User role {} is not authorized to access this route", role)
            }
            AuthError::Validation(msg) => msg.clone(),
            AuthError::Database(e) => {
                log::error!("Auth database error: {}", e);
                "An internal error occurred".to_string()
            }
            AuthError::PasswordHash(e) => {
                log::error!("Password hashing error: {}", e);
                "An internal error occurred".to_string()
            }
        };

        actix_web::HttpResponse::build(self.status_code()).json(serde_json::json!({
            "success": false,
            "message": message
        }))
    }
}
