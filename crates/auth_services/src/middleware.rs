use actix_web::{
    Error, HttpMessage, HttpRequest, ResponseError, Result,
    body::EitherBody,
    web,
    dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::{
    future::{Ready, ready},
    rc::Rc,
    sync::Arc,
};
use uuid::Uuid;

use crate::jwt::JwtService;
use crate::service::UserDirectory;
use crate::types::{AuthError, Role};

/// Name of the cookie carrying the access token for browser clients.
pub const TOKEN_COOKIE: &str = "token";

/// Middleware for handling authentication by verifying JWT tokens
/// and attaching the caller identity to the request.
pub struct AuthMiddleware {
    jwt_service: JwtService,
    users: Arc<dyn UserDirectory>,
}

impl AuthMiddleware {
    /// Creates the middleware around an injected token verifier and the
    /// directory used to resolve the caller's current role.
    pub fn new(jwt_service: JwtService, users: Arc<dyn UserDirectory>) -> Self {
        Self { jwt_service, users }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            jwt_service: self.jwt_service.clone(),
            users: self.users.clone(),
        }))
    }
}

/// Service that implements the authentication middleware logic
pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    jwt_service: JwtService,
    users: Arc<dyn UserDirectory>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let jwt_service = self.jwt_service.clone();
        let users = self.users.clone();

        Box::pin(async move {
            let token = extract_token(req.request());
            let identity = authenticate(&jwt_service, users.as_ref(), token, req.path()).await;

            let identity = match identity {
                Ok(identity) => identity,
                Err(e) => {
                    return Ok(req.into_response(e.error_response()).map_into_right_body());
                }
            };

            req.extensions_mut().insert(identity);

            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

/// Verifies the token and resolves the caller against the directory.
///
/// Any token problem, or an account that no longer exists, is reported as
/// [`AuthError::NotAuthenticated`]. Directory failures pass through.
async fn authenticate(
    jwt_service: &JwtService,
    users: &dyn UserDirectory,
    token: Option<String>,
    path: &str,
) -> Result<AuthenticatedUser, AuthError> {
    let token = token.ok_or(AuthError::NotAuthenticated)?;
    let identity = jwt_service.authenticate(&token).map_err(|e| {
        log::debug!("Rejected request to {}: {}", path, e);
        AuthError::NotAuthenticated
    })?;

    match users.current_role(&identity.id).await? {
        Some(role) => Ok(AuthenticatedUser { role, ..identity }),
        None => {
            log::debug!("Rejected request to {}: user {} no longer exists", path, identity.id);
            Err(AuthError::NotAuthenticated)
        }
    }
}

/// Reads the bearer token from the `Authorization` header, falling back to the token cookie.
fn extract_token(req: &HttpRequest) -> Option<String> {
    let bearer = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty() && *token != "none");

    match bearer {
        Some(token) => Some(token.to_string()),
        None => req
            .cookie(TOKEN_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|token| !token.is_empty() && token.as_str() != "none"),
    }
}

/// The authenticated caller: user id plus role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Id of the authenticated user
    pub id: Uuid,
    /// Current role of the user
    pub role: Role,
}

impl AuthenticatedUser {
    /// Fails with [`AuthError::Forbidden`] unless the caller's role is in `allowed`.
    pub fn authorize(&self, allowed: &[Role]) -> Result<(), AuthError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(AuthError::Forbidden(self.role))
        }
    }

    /// Whether the caller is an administrator.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl actix_web::FromRequest for AuthenticatedUser {
    type Error = AuthError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        if let Some(identity) = req.extensions().get::<AuthenticatedUser>().copied() {
            return Box::pin(ready(Ok(identity)));
        }

        // Routes mixing public and protected methods sit outside AuthMiddleware
        // and authenticate here against the shared verifier and directory
        let jwt_service = req.app_data::<web::Data<JwtService>>().cloned();
        let users = req.app_data::<web::Data<dyn UserDirectory>>().cloned();
        let token = extract_token(req);
        let path = req.path().to_string();

        Box::pin(async move {
            match (jwt_service, users) {
                (Some(jwt_service), Some(users)) => {
                    authenticate(&jwt_service, users.get_ref(), token, &path).await
                }
                _ => {
                    log::error!("Token verifier or user directory is not configured");
                    Err(AuthError::NotAuthenticated)
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::User;
    use actix_web::FromRequest;
    use actix_web::cookie::Cookie;
    use actix_web::test::TestRequest;
    use async_trait::async_trait;
    use std::collections::HashMap;

    #[test]
    fn test_authorize_checks_role_membership() {
        let user = AuthenticatedUser {
            id: Uuid::new_v4(),
            role: Role::User,
        };

        assert!(user.authorize(&[Role::User, Role::Admin]).is_ok());
        assert!(matches!(
            user.authorize(&[Role::Admin]),
            Err(AuthError::Forbidden(Role::User))
        ));
    }

    struct Directory(HashMap<Uuid, Role>);

    #[async_trait]
    impl UserDirectory for Directory {
        async fn current_role(&self, user_id: &Uuid) -> Result<Option<Role>, AuthError> {
            Ok(self.0.get(user_id).copied())
        }
    }

    fn user(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Admin".to_string(),
            tel: "0800000000".to_string(),
            email: "admin@example.com".to_string(),
            role,
            password_hash: String::new(),
            created_at: chrono::Utc::now(),
        }
    }

    fn request(jwt: &JwtService, users: Directory, token: Option<&str>) -> HttpRequest {
        let users: Arc<dyn UserDirectory> = Arc::new(users);
        let mut req = TestRequest::default()
            .app_data(web::Data::new(jwt.clone()))
            .app_data(web::Data::from(users));
        if let Some(token) = token {
            req = req.insert_header(("Authorization", format!("Bearer {}", token)));
        }
        req.to_http_request()
    }

    #[actix_web::test]
    async fn test_extractor_authenticates_outside_middleware() {
        let jwt = JwtService::new("extractor-secret", 1);
        let admin = user(Role::Admin);
        let token = jwt.generate_token(&admin).unwrap();

        let req = request(
            &jwt,
            Directory(HashMap::from([(admin.id, Role::Admin)])),
            Some(&token),
        );
        let identity = AuthenticatedUser::extract(&req).await.unwrap();
        assert_eq!(identity.id, admin.id);
        assert_eq!(identity.role, Role::Admin);

        let anonymous = request(&jwt, Directory(HashMap::new()), None);
        assert!(matches!(
            AuthenticatedUser::extract(&anonymous).await,
            Err(AuthError::NotAuthenticated)
        ));
    }

    #[actix_web::test]
    async fn test_role_comes_from_directory_not_token() {
        let jwt = JwtService::new("extractor-secret", 1);
        let demoted = user(Role::Admin);
        let token = jwt.generate_token(&demoted).unwrap();

        let req = request(
            &jwt,
            Directory(HashMap::from([(demoted.id, Role::User)])),
            Some(&token),
        );
        let identity = AuthenticatedUser::extract(&req).await.unwrap();
        assert_eq!(identity.role, Role::User);
        assert!(matches!(
            identity.authorize(&[Role::Admin]),
            Err(AuthError::Forbidden(Role::User))
        ));
    }

    #[actix_web::test]
    async fn test_removed_account_is_not_authenticated() {
        let jwt = JwtService::new("extractor-secret", 1);
        let removed = user(Role::User);
        let token = jwt.generate_token(&removed).unwrap();

        let req = request(&jwt, Directory(HashMap::new()), Some(&token));
        assert!(matches!(
            AuthenticatedUser::extract(&req).await,
            Err(AuthError::NotAuthenticated)
        ));
    }

    #[actix_web::test]
    async fn test_extractor_without_directory_rejects() {
        let jwt = JwtService::new("extractor-secret", 1);
        let token = jwt.generate_token(&user(Role::Admin)).unwrap();

        let req = TestRequest::default()
            .app_data(web::Data::new(jwt))
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_http_request();
        assert!(matches!(
            AuthenticatedUser::extract(&req).await,
            Err(AuthError::NotAuthenticated)
        ));
    }

    #[test]
    fn test_token_prefers_authorization_header() {
        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer header-token"))
            .cookie(Cookie::new(TOKEN_COOKIE, "cookie-token"))
            .to_http_request();

        assert_eq!(extract_token(&req).as_deref(), Some("header-token"));
    }

    #[test]
    fn test_token_falls_back_to_cookie() {
        let req = TestRequest::default()
            .cookie(Cookie::new(TOKEN_COOKIE, "cookie-token"))
            .to_http_request();
        assert_eq!(extract_token(&req).as_deref(), Some("cookie-token"));

        let logged_out = TestRequest::default()
            .cookie(Cookie::new(TOKEN_COOKIE, "none"))
            .to_http_request();
        assert_eq!(extract_token(&logged_out), None);
    }
}
