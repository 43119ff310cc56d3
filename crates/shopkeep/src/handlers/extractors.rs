//! Request extractors answering rejections as [`ApiError`].

use axum::{
    extract::{FromRequest, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use uuid::Uuid;

use shopkeep_core::auth::{bearer_token, AuthError};

use crate::{error::ApiError, state::AppState};

/// JSON body whose rejections become `400 { "error": ... }`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Path parameters whose rejections become `400 { "error": ... }`.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Query string whose rejections become `400 { "error": ... }`.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// The caller identified by a valid `Authorization: Bearer` token.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: Uuid,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthError::MissingToken)?;

        let token = bearer_token(header).ok_or(AuthError::MissingToken)?;
        let claims = state.token_keys.verify(token)?;

        Ok(AuthUser {
            user_id: claims.sub,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};
    use chrono::Utc;

    async fn extract(state: &AppState, header: Option<&str>) -> Result<AuthUser, ApiError> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        AuthUser::from_request_parts(&mut parts, state).await
    }

    #[tokio::test]
    async fn test_valid_token_yields_user() {
        let state = AppState::for_tests();
        let user_id = Uuid::new_v4();
        let issued = state.token_keys.issue(user_id, Utc::now()).unwrap();

        let user = extract(&state, Some(&format!("Bearer {}", issued.token)))
            .await
            .unwrap();

        assert_eq!(user.user_id, user_id);
    }

    #[tokio::test]
    async fn test_missing_or_malformed_header_is_unauthenticated() {
        let state = AppState::for_tests();
        for header in [None, Some("Basic abc"), Some("Bearer "), Some("Bearer not-a-jwt")] {
            let err = extract(&state, header).await.unwrap_err();
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED, "{header:?}");
        }
    }

    #[tokio::test]
    async fn test_expired_token_is_unauthenticated() {
        let state = AppState::for_tests();
        let issued_at = Utc::now() - chrono::Duration::days(30);
        let issued = state.token_keys.issue(Uuid::new_v4(), issued_at).unwrap();

        let err = extract(&state, Some(&format!("Bearer {}", issued.token)))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Unauthenticated(_)));
    }
}
