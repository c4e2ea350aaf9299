use actix_web::cookie::{Cookie, time::Duration as CookieDuration};
use actix_web::{HttpResponse, web};
use sqlx::PgPool;
use validator::Validate;

use auth_services::jwt::JwtService;
use auth_services::middleware::{AuthenticatedUser, TOKEN_COOKIE};
use auth_services::service::AuthService;
use auth_services::types::*;

use crate::response::ApiResponse;

/// Cookie behaviour for issued tokens.
#[derive(Debug, Clone, Copy)]
pub struct AuthSettings {
    /// Mark the token cookie `Secure` (production)
    pub secure_cookies: bool,
}

fn token_response(
    jwt_service: &JwtService,
    settings: &AuthSettings,
    user: &User,
) -> Result<HttpResponse, AuthError> {
    let token = jwt_service.generate_token(user)?;

    let cookie = Cookie::build(TOKEN_COOKIE, token.clone())
        .path("/")
        .http_only(true)
        .secure(settings.secure_cookies)
        .max_age(CookieDuration::seconds(jwt_service.token_ttl().num_seconds()))
        .finish();

    Ok(HttpResponse::Ok().cookie(cookie).json(TokenResponse {
        success: true,
        token,
    }))
}

/// Handles user registration by validating the request, creating a new user
/// and returning a signed token (also set as a cookie).
pub async fn register(
    pool: web::Data<PgPool>,
    jwt_service: web::Data<JwtService>,
    settings: web::Data<AuthSettings>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AuthError> {
    request
        .validate()
        .map_err(|e| AuthError::Validation(format!("Validation error: {}", e)))?;

    let auth_service = AuthService::new(pool.get_ref().clone());
    let user = auth_service.create_user(&request).await?;

    log::info!("Registered user {} ({})", user.id, user.email);

    token_response(&jwt_service, &settings, &user)
}

/// Handles user login by verifying credentials and returning a signed token.
pub async fn login(
    pool: web::Data<PgPool>,
    jwt_service: web::Data<JwtService>,
    settings: web::Data<AuthSettings>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AuthError> {
    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(AuthError::MissingCredentials);
    }

    let auth_service = AuthService::new(pool.get_ref().clone());
    let user = auth_service
        .verify_password(&request.email, &request.password)
        .await?;

    token_response(&jwt_service, &settings, &user)
}

/// Returns the currently authenticated user.
pub async fn get_me(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AuthError> {
    let auth_service = AuthService::new(pool.get_ref().clone());

    let user = auth_service
        .get_user_by_id(&user.id)
        .await?
        .ok_or(AuthError::NotAuthenticated)?;

    Ok(HttpResponse::Ok().json(ApiResponse::data(UserInfo::from(user))))
}

/// Clears the token cookie.
pub async fn logout() -> HttpResponse {
    let cookie = Cookie::build(TOKEN_COOKIE, "none")
        .path("/")
        .http_only(true)
        .max_age(CookieDuration::seconds(10))
        .finish();

    HttpResponse::Ok()
        .cookie(cookie)
        .json(ApiResponse::data(serde_json::Map::new()))
}
