/*!
 * # Authentication
 *
 * Bearer JWT authentication for the MediStock API. Tokens are HS256-signed and
 * carry the identity-provider subject, which scopes every record a caller can
 * read or modify.
 *
 * `AuthService` validates and issues tokens; `auth_middleware` guards the
 * protected routes and places an [`AuthUser`] in the request extensions.
 */

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::AppConfig;
use crate::errors::ServiceError;

/// Claim structure for JWT tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,           // Subject (user ID)
    pub email: Option<String>, // User's email
    pub name: Option<String>,  // Display name
    pub iat: i64,              // Issued at time
    pub exp: i64,              // Expiration time
    pub iss: String,           // Issuer
    pub aud: String,           // Audience
}

/// Authenticated caller extracted from the JWT token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            name: claims.name,
        }
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub access_token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(
        jwt_secret: String,
        jwt_issuer: String,
        jwt_audience: String,
        access_token_expiration: Duration,
    ) -> Self {
        Self {
            jwt_secret,
            jwt_issuer,
            jwt_audience,
            access_token_expiration,
        }
    }
}

impl From<&AppConfig> for AuthConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self::new(
            cfg.jwt_secret.clone(),
            cfg.auth_issuer.clone(),
            cfg.auth_audience.clone(),
            Duration::from_secs(cfg.jwt_expiration),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Missing authentication")]
    MissingAuth,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),
}

/// Issues and validates access tokens.
#[derive(Debug, Clone)]
pub struct AuthService {
    config: AuthConfig,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Signs an access token for the given subject.
    pub fn generate_token(
        &self,
        user_id: &str,
        email: Option<&str>,
        name: Option<&str>,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let ttl = ChronoDuration::from_std(self.config.access_token_expiration)
            .map_err(|_| AuthError::TokenCreation("Invalid token duration".to_string()))?;

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.map(str::to_string),
            name: name.map(str::to_string),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };
        self.encode_claims(&claims)
    }

    pub(crate) fn encode_claims(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))
    }

    /// Validate a JWT token and extract the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.config.jwt_issuer.as_str()]);
        validation.set_audience(&[self.config.jwt_audience.as_str()]);

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?
        .claims;

        if claims.sub.trim().is_empty() {
            return Err(AuthError::InvalidToken);
        }
        Ok(claims)
    }
}

/// Resolves the caller from the `Authorization: Bearer` header.
pub fn authenticate(auth: &AuthService, headers: &HeaderMap) -> Result<AuthUser, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingAuth)?;

    let token = value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MissingAuth)?;

    let claims = auth.validate_token(token)?;
    Ok(AuthUser::from(claims))
}

/// Rejects unauthenticated requests with 401 and exposes [`AuthUser`] to handlers.
pub async fn auth_middleware(
    State(auth): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let user = authenticate(&auth, request.headers()).map_err(|e| {
        debug!(error = %e, path = %request.uri().path(), "authentication rejected");
        ServiceError::from(e)
    })?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use axum::http::HeaderValue;

    const SECRET: &str = "k8Jq2vX9mZ4rT7wY1pL6sD3fG0hN5bC8xV2qW9eR4tY7uI1oP6aS3dF0gH5jK8lZ";

    fn service() -> AuthService {
        AuthService::new(AuthConfig::new(
            SECRET.to_string(),
            "medistock".to_string(),
            "medistock-clients".to_string(),
            Duration::from_secs(3600),
        ))
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }

    #[test]
    fn issued_token_authenticates_its_subject() {
        let auth = service();
        let token = auth
            .generate_token("user-1", Some("marie@example.com"), Some("Marie"))
            .unwrap();

        let user = authenticate(&auth, &bearer(&token)).unwrap();
        assert_eq!(user.user_id, "user-1");
        assert_eq!(user.email.as_deref(), Some("marie@example.com"));
    }

    #[test]
    fn missing_header_is_rejected() {
        assert_matches!(
            authenticate(&service(), &HeaderMap::new()),
            Err(AuthError::MissingAuth)
        );
    }

    #[test]
    fn token_signed_with_other_secret_is_invalid() {
        let other = AuthService::new(AuthConfig::new(
            "z".repeat(64),
            "medistock".into(),
            "medistock-clients".into(),
            Duration::from_secs(3600),
        ));
        let token = other.generate_token("user-1", None, None).unwrap();
        assert_matches!(
            authenticate(&service(), &bearer(&token)),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let auth = service();
        let now = Utc::now().timestamp();
        let token = auth
            .encode_claims(&Claims {
                sub: "user-1".into(),
                email: None,
                name: None,
                iat: now - 7200,
                exp: now - 3600,
                iss: "medistock".into(),
                aud: "medistock-clients".into(),
            })
            .unwrap();
        assert_matches!(auth.validate_token(&token), Err(AuthError::TokenExpired));
    }

    #[test]
    fn wrong_audience_is_invalid() {
        let auth = service();
        let now = Utc::now().timestamp();
        let token = auth
            .encode_claims(&Claims {
                sub: "user-1".into(),
                email: None,
                name: None,
                iat: now,
                exp: now + 600,
                iss: "medistock".into(),
                aud: "someone-else".into(),
            })
            .unwrap();
        assert_matches!(auth.validate_token(&token), Err(AuthError::InvalidToken));
    }
}
