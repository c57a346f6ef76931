use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json, RequestPartsExt,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use jsonwebtoken::{errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt::Display;

use crate::AppState;

// Claims issued by the upstream login service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub email: String,
    pub exp: usize,
}

/// The caller behind a verified bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub email: String,
}

impl Display for AuthUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "User: {}", self.email)
    }
}

/// Checks HS256 signatures and expiry against the shared secret.
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                _ => {
                    tracing::debug!("Token rejected: {}", e);
                    AuthError::InvalidToken
                }
            })?;

        if data.claims.email.is_empty() {
            return Err(AuthError::InvalidToken);
        }
        Ok(data.claims)
    }
}

// Extractor for the authenticated user on protected routes
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Extract the token from the authorization header
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AuthError::MissingToken)?;

        let claims = state.verifier.verify(bearer.token())?;

        Ok(AuthUser {
            email: claims.email,
        })
    }
}

// Auth error types
#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    ExpiredToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AuthError::MissingToken => (StatusCode::UNAUTHORIZED, "Missing authorization token"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid authorization token"),
            AuthError::ExpiredToken => (StatusCode::UNAUTHORIZED, "Token has expired"),
        };
        let body = Json(json!({
            "error": error_message,
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
pub(crate) fn issue_token(secret: &str, email: &str, ttl_secs: i64) -> String {
    let exp = chrono::Utc::now().timestamp() + ttl_secs;
    let claims = Claims {
        email: email.to_string(),
        exp: exp.max(0) as usize,
    };
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_accepts_valid_token() {
        let verifier = TokenVerifier::new("secret");
        let token = issue_token("secret", "a@example.com", 3600);
        let claims = verifier.verify(&token).unwrap();
        assert_eq!(claims.email, "a@example.com");
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let verifier = TokenVerifier::new("secret");
        let token = issue_token("other", "a@example.com", 3600);
        assert_eq!(verifier.verify(&token).unwrap_err(), AuthError::InvalidToken);
    }

    #[test]
    fn test_verify_reports_expiry() {
        let verifier = TokenVerifier::new("secret");
        let token = issue_token("secret", "a@example.com", -3600);
        assert_eq!(verifier.verify(&token).unwrap_err(), AuthError::ExpiredToken);
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let verifier = TokenVerifier::new("secret");
        assert_eq!(verifier.verify("not-a-jwt").unwrap_err(), AuthError::InvalidToken);
    }
}
