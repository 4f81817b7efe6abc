//! Backend session extractors.
//!
//! The backend's session cookie is kept in the shopper's storefront session.
//! These extractors hand it to handlers that call authenticated endpoints.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use tower_sessions::Session;

use crate::api::BackendCredential;

/// Session key holding the backend `Cookie` header value.
pub const BACKEND_CREDENTIAL_KEY: &str = "gaojie_backend_auth";

/// Extractor that requires a signed-in shopper.
///
/// # Example
///
/// ```rust,ignore
/// async fn profile(RequireCredential(credential): RequireCredential) -> impl IntoResponse {
///     // call authenticated endpoints with `credential`
/// }
/// ```
pub struct RequireCredential(pub BackendCredential);

/// Returned when a signed-in shopper is required.
pub struct AuthRejection;

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "status": "error",
                "message": "Please sign in to continue",
            })),
        )
            .into_response()
    }
}

async fn stored_credential(parts: &Parts) -> Option<BackendCredential> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<String>(BACKEND_CREDENTIAL_KEY)
        .await
        .ok()
        .flatten()
        .map(BackendCredential::new)
}

impl<S> FromRequestParts<S> for RequireCredential
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        stored_credential(parts).await.map(Self).ok_or(AuthRejection)
    }
}

/// Extractor that optionally gets the backend credential.
pub struct OptionalCredential(pub Option<BackendCredential>);

impl<S> FromRequestParts<S> for OptionalCredential
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(stored_credential(parts).await))
    }
}

/// Remember the backend credential after sign-in.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_backend_credential(
    session: &Session,
    credential: &BackendCredential,
) -> Result<(), tower_sessions::session::Error> {
    session
        .insert(BACKEND_CREDENTIAL_KEY, credential.cookie())
        .await
}

/// Forget the backend credential (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_backend_credential(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session.remove::<String>(BACKEND_CREDENTIAL_KEY).await?;
    Ok(())
}
