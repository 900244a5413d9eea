//! Request guards: the authenticated-caller extractor and the ownership check.

use std::sync::Arc;

use atlas_http::AppError;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};

use crate::{error::AuthError, token::TokenIssuer};

/// Legacy header some clients send the token in.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Caller identity proven by a valid bearer token.
///
/// Taking this extractor in a handler makes the route require
/// authentication; requests without a valid token get a 401.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub user_id: String,
}

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
    Arc<TokenIssuer>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let issuer = Arc::<TokenIssuer>::from_ref(state);

        let token = credential(&parts.headers).ok_or(AuthError::MissingCredential)?;
        let claims = issuer.verify(token).inspect_err(|e| {
            tracing::debug!(error = %e, "bearer token rejected");
        })?;

        Ok(Self {
            user_id: claims.sub,
        })
    }
}

/// Read the token from `Authorization: Bearer ...`, falling back to `x-api-key`
/// when there is no bearer token.
pub fn credential(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Allow the mutation only when the caller owns the resource.
pub fn ensure_owner(caller_id: &str, owner_id: &str) -> Result<(), AuthError> {
    if caller_id == owner_id {
        Ok(())
    } else {
        tracing::info!(caller = caller_id, owner = owner_id, "ownership check failed");
        Err(AuthError::NotOwner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Request};

    #[derive(Clone)]
    struct State {
        tokens: Arc<TokenIssuer>,
    }

    impl FromRef<State> for Arc<TokenIssuer> {
        fn from_ref(state: &State) -> Self {
            state.tokens.clone()
        }
    }

    fn state() -> State {
        State {
            tokens: Arc::new(TokenIssuer::new("test-secret", 3600)),
        }
    }

    async fn extract(headers: &[(&str, String)], state: &State) -> Result<Authenticated, AppError> {
        let mut builder = Request::builder().uri("/books");
        for (name, value) in headers {
            builder = builder.header(*name, value.as_str());
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        Authenticated::from_request_parts(&mut parts, state).await
    }

    #[test]
    fn credential_prefers_authorization_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(API_KEY_HEADER, HeaderValue::from_static("def"));
        assert_eq!(credential(&headers), Some("abc"));
    }

    #[test]
    fn credential_falls_back_to_api_key() {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, HeaderValue::from_static("def"));
        assert_eq!(credential(&headers), Some("def"));
        assert_eq!(credential(&HeaderMap::new()), None);
    }

    #[test]
    fn non_bearer_authorization_falls_back_to_api_key() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(credential(&headers), None);

        headers.insert(API_KEY_HEADER, HeaderValue::from_static("def"));
        assert_eq!(credential(&headers), Some("def"));
    }

    #[tokio::test]
    async fn api_key_authenticates_alongside_basic_authorization() {
        let state = state();
        let token = state.tokens.issue("user-2").unwrap();

        let caller = extract(
            &[
                ("authorization", "Basic abc".to_string()),
                ("x-api-key", token),
            ],
            &state,
        )
        .await
        .unwrap();
        assert_eq!(caller.user_id, "user-2");
    }

    #[tokio::test]
    async fn valid_bearer_token_authenticates() {
        let state = state();
        let token = state.tokens.issue("user-1").unwrap();

        let caller = extract(&[("authorization", format!("Bearer {token}"))], &state)
            .await
            .unwrap();
        assert_eq!(caller.user_id, "user-1");
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let err = extract(&[], &state()).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn garbage_token_is_unauthorized() {
        let err = extract(&[("x-api-key", "garbage".to_string())], &state())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized { .. }));
    }

    #[test]
    fn ownership() {
        assert!(ensure_owner("u1", "u1").is_ok());
        assert!(matches!(ensure_owner("u1", "u2"), Err(AuthError::NotOwner)));
    }
}
