use crate::adapters::{ApiClient, RequestDescriptor};
use crate::domain::auth::{LoginOutcome, LoginRequest, LoginResponse, LogoutRequest};
use crate::domain::session::{Role, Session, UserProfile};
use crate::error::{ApiError, Result};
use crate::ui::validate::{validate_email, validate_required};
use crate::ui::{Route, ToastManager};
use opentelemetry::{KeyValue, global, metrics::Counter};
use reqwest::Method;
use std::sync::Arc;

pub const LOGIN_PATH: &str = "/accounts/login/";
pub const LOGOUT_PATH: &str = "/accounts/logout/";
pub const PROFILE_PATH: &str = "/accounts/profile/";

pub const LOGIN_FAILED_MESSAGE: &str = "Login failed. Please check your credentials.";
pub const INVALID_EMAIL_MESSAGE: &str = "Please enter a valid email address.";
pub const PASSWORD_REQUIRED_MESSAGE: &str = "Password is required.";

#[derive(Clone, Debug)]
struct SessionMetrics {
    logins_total: Counter<u64>,
    logouts_total: Counter<u64>,
}

impl SessionMetrics {
    fn new() -> Self {
        let meter = global::meter("invento-client");
        Self {
            logins_total: meter
                .u64_counter("session_logins_total")
                .with_description("Total number of login attempts by outcome")
                .build(),
            logouts_total: meter
                .u64_counter("session_logouts_total")
                .with_description("Total number of logouts")
                .build(),
        }
    }
}

/// Login, logout and role checks over the shared credential store.
#[derive(Clone, Debug)]
pub struct SessionService {
    api: Arc<ApiClient>,
    toasts: Arc<ToastManager>,
    metrics: SessionMetrics,
}

impl SessionService {
    #[must_use]
    pub fn new(api: Arc<ApiClient>, toasts: Arc<ToastManager>) -> Self {
        Self { api, toasts, metrics: SessionMetrics::new() }
    }

    /// Exchanges credentials for a token pair and records the returned profile.
    ///
    /// Failures are returned as a displayable message; the session stays anonymous.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> LoginOutcome {
        if !validate_email(email.trim()) {
            return LoginOutcome::Failure { message: INVALID_EMAIL_MESSAGE.to_string() };
        }
        if !validate_required(password) {
            return LoginOutcome::Failure { message: PASSWORD_REQUIRED_MESSAGE.to_string() };
        }

        match self.try_login(email.trim(), password).await {
            Ok(user) => {
                self.metrics.logins_total.add(1, &[KeyValue::new("outcome", "success")]);
                tracing::info!(role = %user.effective_role(), "Logged in");
                LoginOutcome::Success { user }
            }
            Err(e) => {
                self.metrics.logins_total.add(1, &[KeyValue::new("outcome", "failure")]);
                tracing::warn!(error = %e, "Login failed");
                let message = e.to_string();
                LoginOutcome::Failure {
                    message: if message.is_empty() { LOGIN_FAILED_MESSAGE.to_string() } else { message },
                }
            }
        }
    }

    async fn try_login(&self, email: &str, password: &str) -> Result<UserProfile> {
        let body = serde_json::to_value(LoginRequest { email, password })?;
        let request = RequestDescriptor::new(Method::POST, LOGIN_PATH).with_body(body).unauthenticated();
        let response: LoginResponse = self.api.send_json(request).await?;

        self.api.credentials().establish(&response.access, &response.refresh, response.user.clone())?;
        Ok(response.user)
    }

    /// Ends the session locally regardless of whether the server acknowledged it.
    #[tracing::instrument(skip(self))]
    pub async fn logout(&self) {
        let credentials = self.api.credentials();
        let request = LogoutRequest { refresh: credentials.refresh_token() };

        // An expired session has already been cleared and redirected by the client.
        let already_expired = match self.api.post(LOGOUT_PATH, &request).await {
            Ok(_) => false,
            Err(e) => {
                tracing::warn!(error = %e, "Logout request failed");
                e.is_session_expired()
            }
        };

        if let Err(e) = credentials.clear() {
            tracing::error!(error = %e, "Failed to clear credentials");
        }
        self.metrics.logouts_total.add(1, &[]);
        if !already_expired {
            self.api.navigator().redirect(Route::Login);
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.api.credentials().is_authenticated()
    }

    #[must_use]
    pub fn session(&self) -> Session {
        self.api.credentials().session()
    }

    #[must_use]
    pub fn current_user(&self) -> Option<UserProfile> {
        self.session().user().cloned()
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.session().role()
    }

    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.role().as_str() == role
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role() == Role::Admin
    }

    #[must_use]
    pub fn is_viewer(&self) -> bool {
        self.role() == Role::Viewer
    }

    /// Reloads the profile from the server and caches it.
    ///
    /// # Errors
    /// Propagates request failures, including `SessionExpired`.
    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn fetch_profile(&self) -> Result<UserProfile> {
        let user: UserProfile = self.api.get_json(PROFILE_PATH).await?;
        self.api.credentials().update_user(user.clone())?;
        Ok(user)
    }

    /// Sends anonymous users to the login page. Returns whether the caller may proceed.
    pub fn require_auth(&self) -> bool {
        if self.is_authenticated() {
            return true;
        }
        self.api.navigator().redirect(Route::Login);
        false
    }

    /// Like [`SessionService::require_auth`], but also turns away non-admins.
    ///
    /// The server enforces the same rule; this only spares a doomed request.
    pub fn require_admin(&self) -> bool {
        if !self.require_auth() {
            return false;
        }
        if !self.is_admin() {
            self.toasts.error("Access Denied", "You need admin privileges to access this page.");
            self.api.navigator().redirect(Route::Dashboard);
            return false;
        }
        true
    }

    /// Admin gate for a single action, as an error instead of a navigation.
    ///
    /// # Errors
    /// `SessionExpired` when anonymous, `Forbidden` for non-admins.
    pub fn ensure_admin(&self) -> Result<()> {
        if !self.is_authenticated() {
            return Err(ApiError::SessionExpired);
        }
        if !self.is_admin() {
            return Err(ApiError::Forbidden("Admin access required".to_string()));
        }
        Ok(())
    }
}
