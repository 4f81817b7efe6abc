//! Account endpoints.
//!
//! Login and registration hand back the backend's session cookie as a
//! [`BackendCredential`]; the storefront keeps it in the shopper's session
//! and replays it on every authenticated call.

use tracing::instrument;

use super::types::{
    Acknowledgement, AuthStatus, LoginRequest, PasswordChange, ProfileUpdate, RegisterRequest,
    User, UserEnvelope,
};
use super::{ApiClient, ApiError, BackendCredential, decode};

/// A signed-in user and the backend cookie that proves it.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub credential: Option<BackendCredential>,
    pub message: Option<String>,
}

impl ApiClient {
    /// Whether the credential belongs to a signed-in user.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, credential))]
    pub async fn auth_check(
        &self,
        credential: Option<&BackendCredential>,
    ) -> Result<AuthStatus, ApiError> {
        let url = self.endpoint(&["auth", "check"])?;
        self.execute(self.inner.client.get(url), credential).await
    }

    /// Sign in.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] for bad credentials, or an error if
    /// the API request fails.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthSession, ApiError> {
        let url = self.endpoint(&["auth", "login"])?;
        self.start_session(self.inner.client.post(url).json(request))
            .await
    }

    /// Create an account and sign in.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] when the backend refuses the registration
    /// (for example a duplicate email), or an error if the API request fails.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthSession, ApiError> {
        let url = self.endpoint(&["auth", "register"])?;
        self.start_session(self.inner.client.post(url).json(request))
            .await
    }

    /// Sign out on the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, credential))]
    pub async fn logout(&self, credential: &BackendCredential) -> Result<(), ApiError> {
        let url = self.endpoint(&["auth", "logout"])?;
        self.dispatch(self.inner.client.post(url), Some(credential))
            .await?;
        Ok(())
    }

    /// The signed-in user.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] when the credential has expired, or
    /// an error if the API request fails.
    #[instrument(skip(self, credential))]
    pub async fn me(&self, credential: &BackendCredential) -> Result<User, ApiError> {
        let url = self.endpoint(&["auth", "me"])?;
        let envelope: UserEnvelope = self
            .execute(self.inner.client.get(url), Some(credential))
            .await?;
        Ok(envelope.user)
    }

    /// Update profile fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, update, credential))]
    pub async fn update_profile(
        &self,
        update: &ProfileUpdate,
        credential: &BackendCredential,
    ) -> Result<User, ApiError> {
        let url = self.endpoint(&["auth", "profile"])?;
        let envelope: UserEnvelope = self
            .execute(self.inner.client.put(url).json(update), Some(credential))
            .await?;
        Ok(envelope.user)
    }

    /// Change the password.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] when the current password is wrong, or an
    /// error if the API request fails.
    #[instrument(skip(self, change, credential))]
    pub async fn change_password(
        &self,
        change: &PasswordChange,
        credential: &BackendCredential,
    ) -> Result<Acknowledgement, ApiError> {
        let url = self.endpoint(&["auth", "change-password"])?;
        self.execute(self.inner.client.put(url).json(change), Some(credential))
            .await
    }

    async fn start_session(&self, request: reqwest::RequestBuilder) -> Result<AuthSession, ApiError> {
        let reply = self.dispatch(request, None).await?;
        let credential = BackendCredential::from_headers(&reply.headers);
        if credential.is_none() {
            tracing::warn!("Backend sign-in returned no session cookie");
        }

        let message = reply
            .body
            .get("message")
            .and_then(serde_json::Value::as_str)
            .map(ToString::to_string);
        let envelope: UserEnvelope = decode(reply.body)?;

        tracing::info!(user_id = %envelope.user.id, "Signed in");
        Ok(AuthSession {
            user: envelope.user,
            credential,
            message,
        })
    }
}
