use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use crate::middleware::AuthenticatedUser;
use crate::types::{AuthError, Claims, User};

/// Issues and verifies HS256 access tokens.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl: Duration,
}

impl JwtService {
    /// Creates a service signing with `secret`, issuing tokens valid for `expire_days`.
    pub fn new(secret: &str, expire_days: i64) -> Self {
        Self::with_ttl(secret, Duration::days(expire_days))
    }

    /// Creates a service with an explicit token lifetime.
    pub fn with_ttl(secret: &str, token_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_ref()),
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
            token_ttl,
        }
    }

    /// Lifetime of the tokens this service issues.
    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    /// Signs an access token carrying the user's id, email and role.
    pub fn generate_token(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now();

        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role.as_str().to_string(),
            exp: (now + self.token_ttl).timestamp().max(0) as usize,
            iat: now.timestamp() as usize,
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Verifies signature and expiry, returning the decoded claims.
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let token_data = decode::<Claims>(
            token,
            &self.decoding_key,
            &Validation::new(Algorithm::HS256),
        )?;

        Ok(token_data.claims)
    }

    /// Resolves a token into the caller identity used by handlers.
    pub fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let claims = self.verify_token(token)?;
        let id = Uuid::parse_str(&claims.sub).map_err(|_| {
            AuthError::Jwt(jsonwebtoken::errors::Error::from(
                jsonwebtoken::errors::ErrorKind::InvalidSubject,
            ))
        })?;
        let role = claims.role.parse()?;

        Ok(AuthenticatedUser { id, role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    fn user(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Camper".to_string(),
            tel: "0812345678".to_string(),
            email: "camper@example.com".to_string(),
            role,
            password_hash: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_token_carries_identity() {
        let jwt = JwtService::new("test-secret", 30);
        let admin = user(Role::Admin);

        let token = jwt.generate_token(&admin).unwrap();
        let identity = jwt.authenticate(&token).unwrap();

        assert_eq!(identity.id, admin.id);
        assert_eq!(identity.role, Role::Admin);
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let issuer = JwtService::new("secret-a", 30);
        let verifier = JwtService::new("secret-b", 30);

        let token = issuer.generate_token(&user(Role::User)).unwrap();
        assert!(matches!(
            verifier.authenticate(&token),
            Err(AuthError::Jwt(_))
        ));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let jwt = JwtService::with_ttl("test-secret", Duration::hours(-2));
        let token = jwt.generate_token(&user(Role::User)).unwrap();

        assert!(jwt.authenticate(&token).is_err());
    }

    #[test]
    fn test_unknown_role_claim_is_rejected() {
        let jwt = JwtService::new("test-secret", 1);
        let now = Utc::now();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            email: "x@example.com".to_string(),
            role: "superuser".to_string(),
            exp: (now + Duration::hours(1)).timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(matches!(
            jwt.authenticate(&token),
            Err(AuthError::UnknownRole(_))
        ));
    }
}
