use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, warn};

use crate::api::AuthApi;
use crate::credentials::CredentialStore;
use crate::error::RemoteResult;
use crate::models::{LoginCredentials, ProfileUpdate, User};

pub const LOGIN_FAILED_MESSAGE: &str = "Login failed, please check your username and password";

#[derive(Debug, Default)]
struct SessionState {
    user: Option<User>,
    loading: bool,
    error: Option<String>,
}

/// Who is signed in, backed by the credential store.
pub struct SessionStore {
    api: Arc<dyn AuthApi>,
    credentials: Arc<dyn CredentialStore>,
    state: Mutex<SessionState>,
}

impl SessionStore {
    pub fn new(api: Arc<dyn AuthApi>, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            api,
            credentials,
            state: Mutex::new(SessionState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn user(&self) -> Option<User> {
        self.state().user.clone()
    }

    pub fn username(&self) -> String {
        self.state()
            .user
            .as_ref()
            .map(|u| u.username.clone())
            .unwrap_or_default()
    }

    pub fn is_loading(&self) -> bool {
        self.state().loading
    }

    /// Last user-facing login error.
    pub fn error(&self) -> Option<String> {
        self.state().error.clone()
    }

    pub fn clear_error(&self) {
        self.state().error = None;
    }

    /// A user object alone is not enough: the token must still be present, so
    /// clearing the credential store signs the session out immediately.
    pub fn is_authenticated(&self) -> bool {
        self.state().user.is_some() && self.credentials.token().is_some()
    }

    /// Returns whether the login succeeded. Failures land in [`Self::error`].
    pub async fn login(&self, credentials: &LoginCredentials) -> bool {
        {
            let mut state = self.state();
            state.loading = true;
            state.error = None;
        }

        let result = self.api.login(credentials).await;

        let mut state = self.state();
        state.loading = false;
        match result {
            Ok(response) => {
                self.credentials.set_token(&response.token);
                self.credentials.set_refresh_token(&response.refresh_token);
                state.user = Some(response.user);
                true
            }
            Err(e) => {
                warn!(username = %credentials.username, error = %e, "login failed");
                let message = e
                    .message()
                    .filter(|m| !m.is_empty())
                    .unwrap_or(LOGIN_FAILED_MESSAGE);
                state.error = Some(message.to_string());
                false
            }
        }
    }

    /// Always ends signed out, whatever the service says.
    pub async fn logout(&self) {
        if let Err(e) = self.api.logout().await {
            debug!(error = %e, "remote logout failed");
        }
        self.state().user = None;
        self.credentials.clear();
    }

    pub async fn fetch_current_user(&self) {
        if self.credentials.token().is_none() {
            return;
        }

        self.state().loading = true;
        let result = self.api.current_user().await;

        let mut state = self.state();
        state.loading = false;
        match result {
            Ok(user) => state.user = Some(user),
            Err(e) => {
                warn!(error = %e, "failed to fetch current user, dropping session");
                state.user = None;
                self.credentials.clear();
            }
        }
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> RemoteResult<User> {
        match self.api.update_profile(update).await {
            Ok(user) => {
                self.state().user = Some(user.clone());
                Ok(user)
            }
            Err(e) => {
                error!(error = %e, "failed to update profile");
                Err(e)
            }
        }
    }

    /// Trade the stored refresh token for a fresh token pair.
    ///
    /// Returns `Ok(false)` when there is no refresh token to trade.
    pub async fn refresh_session(&self) -> RemoteResult<bool> {
        let Some(refresh_token) = self.credentials.refresh_token() else {
            return Ok(false);
        };

        match self.api.refresh_token(&refresh_token).await {
            Ok(response) => {
                self.credentials.set_token(&response.token);
                self.credentials.set_refresh_token(&response.refresh_token);
                self.state().user = Some(response.user);
                Ok(true)
            }
            Err(e) => {
                error!(error = %e, "failed to refresh session");
                Err(e)
            }
        }
    }
}
