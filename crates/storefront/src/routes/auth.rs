//! Authentication route handlers.
//!
//! Accounts live on the backend. Sign-in stores the backend's session cookie
//! in the storefront session; sign-out forgets it. The cart is untouched by
//! either.

use axum::{Json, extract::State};
use gaojie_core::{Email, PhoneNumber};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::{
    Acknowledgement, ApiError, AuthSession, LoginRequest, PasswordChange, ProfileUpdate,
    RegisterRequest, User,
};
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{
    OptionalCredential, RequireCredential, clear_backend_credential, set_backend_credential,
};
use crate::state::AppState;

/// Minimum password length accepted at registration.
const MIN_PASSWORD_LEN: usize = 8;

/// Sign-in status response.
#[derive(Debug, Serialize)]
pub struct AuthCheckResponse {
    pub status: &'static str,
    pub authenticated: bool,
    pub user: Option<User>,
}

/// Response carrying the current user.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub user: User,
}

/// Plain acknowledgement response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub status: &'static str,
    pub message: String,
}

fn normalized_email(raw: &str) -> Result<String> {
    Email::parse(raw.trim())
        .map(Email::into_inner)
        .map_err(|_| AppError::BadRequest("Please enter a valid email address".to_string()))
}

async fn start_session(session: &Session, auth: AuthSession) -> Result<Json<UserResponse>> {
    // New session ID on privilege change
    session.cycle_id().await?;
    match &auth.credential {
        Some(credential) => set_backend_credential(session, credential).await?,
        None => clear_backend_credential(session).await?,
    }
    set_sentry_user(&auth.user.id, Some(&auth.user.email));

    Ok(Json(UserResponse {
        status: "success",
        message: auth.message,
        user: auth.user,
    }))
}

/// Whether the shopper is signed in.
#[instrument(skip(state, session, credential))]
pub async fn check(
    State(state): State<AppState>,
    session: Session,
    OptionalCredential(credential): OptionalCredential,
) -> Result<Json<AuthCheckResponse>> {
    let Some(credential) = credential else {
        return Ok(Json(AuthCheckResponse {
            status: "success",
            authenticated: false,
            user: None,
        }));
    };

    let status = match state.api().auth_check(Some(&credential)).await {
        Ok(status) => status,
        Err(ApiError::Unauthorized(_)) => Default::default(),
        Err(e) => return Err(e.into()),
    };

    if !status.authenticated {
        tracing::debug!("Stored backend session expired");
        clear_backend_credential(&session).await?;
    }

    Ok(Json(AuthCheckResponse {
        status: "success",
        authenticated: status.authenticated,
        user: status.user,
    }))
}

/// Sign in.
#[instrument(skip(state, session, body))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(mut body): Json<LoginRequest>,
) -> Result<Json<UserResponse>> {
    body.email = normalized_email(&body.email)?;
    if body.password.is_empty() {
        return Err(AppError::BadRequest("Password is required".to_string()));
    }

    let auth = state.api().login(&body).await?;
    start_session(&session, auth).await
}

/// Create an account.
#[instrument(skip(state, session, body))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(mut body): Json<RegisterRequest>,
) -> Result<Json<UserResponse>> {
    body.email = normalized_email(&body.email)?;
    body.first_name = body.first_name.trim().to_string();
    body.last_name = body.last_name.trim().to_string();
    if body.first_name.is_empty() || body.last_name.is_empty() {
        return Err(AppError::BadRequest(
            "First and last name are required".to_string(),
        ));
    }
    if body.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if !body.phone.trim().is_empty() {
        body.phone = PhoneNumber::normalize(&body.phone)
            .map_err(|_| AppError::BadRequest("Please enter a valid phone number".to_string()))?
            .as_str()
            .to_string();
    }

    let auth = state.api().register(&body).await?;
    start_session(&session, auth).await
}

/// Sign out.
#[instrument(skip(state, session, credential))]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    OptionalCredential(credential): OptionalCredential,
) -> Result<Json<MessageResponse>> {
    if let Some(credential) = credential
        && let Err(e) = state.api().logout(&credential).await
    {
        tracing::warn!(error = %e, "Backend logout failed");
    }

    clear_backend_credential(&session).await?;
    clear_sentry_user();

    Ok(Json(MessageResponse {
        status: "success",
        message: "Logged out successfully".to_string(),
    }))
}

/// The signed-in shopper's profile.
#[instrument(skip(state, credential))]
pub async fn profile(
    State(state): State<AppState>,
    RequireCredential(credential): RequireCredential,
) -> Result<Json<UserResponse>> {
    let user = state.api().me(&credential).await?;
    Ok(Json(UserResponse {
        status: "success",
        message: None,
        user,
    }))
}

/// Update the profile.
#[instrument(skip(state, credential, update))]
pub async fn update_profile(
    State(state): State<AppState>,
    RequireCredential(credential): RequireCredential,
    Json(mut update): Json<ProfileUpdate>,
) -> Result<Json<UserResponse>> {
    if let Some(phone) = update.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        update.phone = Some(
            PhoneNumber::normalize(phone)
                .map_err(|_| AppError::BadRequest("Please enter a valid phone number".to_string()))?
                .as_str()
                .to_string(),
        );
    }

    let user = state.api().update_profile(&update, &credential).await?;
    Ok(Json(UserResponse {
        status: "success",
        message: Some("Profile updated successfully".to_string()),
        user,
    }))
}

/// Change the password.
#[instrument(skip(state, credential, change))]
pub async fn change_password(
    State(state): State<AppState>,
    RequireCredential(credential): RequireCredential,
    Json(change): Json<PasswordChange>,
) -> Result<Json<MessageResponse>> {
    if change.new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let Acknowledgement { message } = state.api().change_password(&change, &credential).await?;
    Ok(Json(MessageResponse {
        status: "success",
        message: message.unwrap_or_else(|| "Password changed successfully".to_string()),
    }))
}
