//! Request extractors for the authenticated identity.
//!
//! Authentication itself lives in the upstream gateway; by the time a
//! request reaches this service the verified user id rides in the
//! `x-user-id` header. These extractors only read it back out.

use std::ops::Deref;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use fictioneer_types::UserId;

use crate::error::ApiError;

const USER_ID_HEADER: &str = "x-user-id";

fn user_id_from_parts(parts: &Parts) -> Option<UserId> {
    parts
        .headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| UserId::parse(s).ok())
}

/// Extractor that requires an authenticated user.
///
/// Returns 401 Unauthorized when the header is absent or malformed.
///
/// # Example
///
/// ```ignore
/// async fn handler(CurrentUser(user_id): CurrentUser) -> impl IntoResponse {
///     format!("User ID: {user_id}")
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub UserId);

impl Deref for CurrentUser {
    type Target = UserId;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        user_id_from_parts(parts)
            .map(Self)
            .ok_or(ApiError::Unauthorized)
    }
}

/// Extractor for an optional authenticated user.
///
/// Returns `None` rather than failing; the payment success redirect uses
/// this because the session user is preferred but not required.
#[derive(Debug, Clone, Copy)]
pub struct MaybeUser(pub Option<UserId>);

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(user_id_from_parts(parts)))
    }
}
