//! Bearer-token verification and caller extraction.
//!
//! Tokens are HS256 JWTs minted by an external identity service. This module
//! only verifies them; it never issues credentials.

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderValue, Request, header::AUTHORIZATION};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, errors::ErrorKind};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::config::AuthSettings;
use crate::domain::caller::CallerContext;
use crate::domain::roles::RoleSet;

use super::HttpState;
use super::error::ApiError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    Missing,
    #[error("token expired")]
    Expired,
    #[error("invalid token: {0}")]
    Invalid(String),
    #[error("token carries no email claim")]
    MissingEmail,
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let message = match err {
            AuthError::Missing => "Bearer token required",
            AuthError::Expired => "Token expired",
            AuthError::Invalid(_) => "Token is invalid",
            AuthError::MissingEmail => "Token does not identify a user",
        };
        ApiError::unauthorized(message).with_detail(err.to_string())
    }
}

/// A claim that identity providers emit either as one string or as a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct TokenClaims {
    #[serde(default)]
    email: Option<String>,
    #[serde(default, rename = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/emailaddress")]
    email_uri: Option<String>,
    #[serde(default)]
    roles: Option<OneOrMany>,
    #[serde(default)]
    role: Option<OneOrMany>,
    #[serde(default, rename = "http://schemas.microsoft.com/ws/2008/06/identity/claims/role")]
    role_uri: Option<OneOrMany>,
}

impl TokenClaims {
    fn into_caller(self) -> Result<CallerContext, AuthError> {
        let email = [self.email, self.email_uri]
            .into_iter()
            .flatten()
            .find(|value| !value.trim().is_empty())
            .ok_or(AuthError::MissingEmail)?;

        let roles = RoleSet::from_names(
            [self.roles, self.role, self.role_uri]
                .into_iter()
                .flatten()
                .flat_map(OneOrMany::into_vec),
        );

        CallerContext::new(email, roles).map_err(|_| AuthError::MissingEmail)
    }
}

/// Verifies bearer tokens against the configured secret, issuer and audience.
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str, settings: &AuthSettings) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = settings.leeway.as_secs();
        validation.set_required_spec_claims(&["exp"]);
        if let Some(issuer) = settings.issuer.as_deref() {
            validation.set_issuer(&[issuer]);
        }
        match settings.audience.as_deref() {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<CallerContext, AuthError> {
        let data = decode::<TokenClaims>(token, &self.key, &self.validation).map_err(|err| {
            match err.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Invalid(err.to_string()),
            }
        })?;
        data.claims.into_caller()
    }
}

/// Authenticates the request and requires a role allowed on the task routes.
///
/// Inserts the [`CallerContext`] into request extensions for handlers and into
/// response extensions for the logging middleware.
pub async fn require_caller(
    State(state): State<HttpState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let caller = match authenticate(&state, request.headers().get(AUTHORIZATION)) {
        Ok(caller) => caller,
        Err(err) => return ApiError::from(err).into_response(),
    };

    if !caller.roles().can_access_todos() {
        debug!(
            target = "infra::http::auth",
            email = caller.email(),
            roles = %caller.roles().label(),
            "caller lacks a permitted role"
        );
        let mut response = ApiError::forbidden().into_response();
        response.extensions_mut().insert(caller);
        return response;
    }

    request.extensions_mut().insert(caller.clone());
    let mut response = next.run(request).await;
    response.extensions_mut().insert(caller);
    response
}

fn authenticate(
    state: &HttpState,
    header: Option<&HeaderValue>,
) -> Result<CallerContext, AuthError> {
    let token = extract_token(header).ok_or(AuthError::Missing)?;
    state.tokens.verify(token)
}

fn extract_token(header: Option<&HeaderValue>) -> Option<&str> {
    let raw = header?.to_str().ok()?;
    let bearer = raw
        .strip_prefix("Bearer ")
        .or_else(|| raw.strip_prefix("bearer "))?;
    let bearer = bearer.trim();
    (!bearer.is_empty()).then_some(bearer)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::json;

    use super::*;
    use crate::domain::roles::Role;

    const SECRET: &str = "unit-test-secret";

    fn settings() -> AuthSettings {
        AuthSettings {
            jwt_secret: Some(SECRET.to_string()),
            issuer: Some("todo-issuer".to_string()),
            audience: Some("todo-clients".to_string()),
            leeway: Duration::from_secs(0),
        }
    }

    fn now() -> i64 {
        time::OffsetDateTime::now_utc().unix_timestamp()
    }

    fn mint(claims: serde_json::Value) -> String {
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .expect("token encodes")
    }

    #[test]
    fn accepts_short_claim_names() {
        let verifier = TokenVerifier::new(SECRET, &settings());
        let token = mint(json!({
            "email": "user@example.com",
            "roles": ["Reader", "Writer"],
            "iss": "todo-issuer",
            "aud": "todo-clients",
            "exp": now() + 300,
        }));

        let caller = verifier.verify(&token).expect("valid token");
        assert_eq!(caller.email(), "user@example.com");
        assert!(caller.roles().contains(Role::Reader));
        assert!(caller.roles().contains(Role::Writer));
        assert!(!caller.is_admin());
    }

    #[test]
    fn accepts_long_form_claim_names() {
        let verifier = TokenVerifier::new(SECRET, &settings());
        let mut claims = json!({
            "iss": "todo-issuer",
            "aud": "todo-clients",
            "exp": now() + 300,
        });
        claims["http://schemas.xmlsoap.org/ws/2005/05/identity/claims/emailaddress"] =
            json!("admin@example.com");
        claims["http://schemas.microsoft.com/ws/2008/06/identity/claims/role"] = json!(["Admin"]);
        let token = mint(claims);

        let caller = verifier.verify(&token).expect("valid token");
        assert_eq!(caller.email(), "admin@example.com");
        assert!(caller.is_admin());
    }

    #[test]
    fn rejects_expired_tokens() {
        let verifier = TokenVerifier::new(SECRET, &settings());
        let token = mint(json!({
            "email": "user@example.com",
            "iss": "todo-issuer",
            "aud": "todo-clients",
            "exp": now() - 600,
        }));
        assert!(matches!(verifier.verify(&token), Err(AuthError::Expired)));
    }

    #[test]
    fn rejects_wrong_issuer_and_bad_signature() {
        let verifier = TokenVerifier::new(SECRET, &settings());
        let wrong_issuer = mint(json!({
            "email": "user@example.com",
            "iss": "someone-else",
            "aud": "todo-clients",
            "exp": now() + 300,
        }));
        assert!(matches!(
            verifier.verify(&wrong_issuer),
            Err(AuthError::Invalid(_))
        ));

        let forged = encode(
            &Header::default(),
            &json!({"email": "user@example.com", "exp": now() + 300}),
            &EncodingKey::from_secret(b"another-secret"),
        )
        .expect("token encodes");
        assert!(matches!(
            verifier.verify(&forged),
            Err(AuthError::Invalid(_))
        ));
    }

    #[test]
    fn empty_email_is_rejected() {
        let verifier = TokenVerifier::new(SECRET, &settings());
        let token = mint(json!({
            "email": "  ",
            "roles": "Reader",
            "iss": "todo-issuer",
            "aud": "todo-clients",
            "exp": now() + 300,
        }));
        assert!(matches!(
            verifier.verify(&token),
            Err(AuthError::MissingEmail)
        ));
    }

    #[test]
    fn extracts_bearer_token() {
        let header = HeaderValue::from_static("Bearer abc.def.ghi");
        assert_eq!(extract_token(Some(&header)), Some("abc.def.ghi"));
        let basic = HeaderValue::from_static("Basic Zm9vOmJhcg==");
        assert_eq!(extract_token(Some(&basic)), None);
        assert_eq!(extract_token(None), None);
    }
}
