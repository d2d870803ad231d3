//! Auth session flows: login, signup, current-user fetch, and logout.
//!
//! Credentials are validated locally before any network call, and backend
//! HTTP statuses are mapped to the fixed user-facing taxonomy here. The
//! session token lives in the injected [`SessionStore`]; a 401 from the
//! backend clears it as a side effect.

use async_trait::async_trait;
use thiserror::Error;

use crate::{domain::user::User, infra::session::SessionStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Signup payload after local validation; `username` is derived from the
/// trimmed name parts and `phone` is normalized to `44` + 10 digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupRequest {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
}

/// Errors as the auth gateway reports them, before taxonomy mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthSourceError {
    Status { status: u16, message: Option<String> },
    Transport(String),
    InvalidResponse,
}

/// User-facing auth errors. Display texts are the contract with the
/// caller; tests assert on variants, the CLI prints the text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("email is required")]
    EmailRequired,
    #[error("password is required")]
    PasswordRequired,
    #[error("invalid email format")]
    InvalidEmailFormat,
    #[error("first name is required")]
    FirstNameRequired,
    #[error("last name is required")]
    LastNameRequired,
    #[error("phone number is required")]
    PhoneRequired,
    #[error("phone number must be in format: 447808648469")]
    InvalidPhoneFormat,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("your session has expired, please log in again")]
    SessionExpired,
    #[error("service not available, please try again later")]
    ServiceUnavailable,
    #[error("too many attempts, please try again later")]
    RateLimited,
    #[error("an unexpected error occurred, please try again later")]
    ServerError,
    #[error("no authentication token found")]
    NotAuthenticated,
    #[error("invalid response from server")]
    InvalidResponse,
    #[error("failed to persist session: {0}")]
    Storage(String),
    #[error("{0}")]
    Backend(String),
}

#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Exchanges credentials for a session token.
    async fn login(&self, credentials: &Credentials) -> Result<String, AuthSourceError>;
    /// Registers a new account and returns its session token.
    async fn signup(&self, request: &SignupRequest) -> Result<String, AuthSourceError>;
    /// Fetches the identity record for the stored token.
    async fn fetch_me(&self) -> Result<User, AuthSourceError>;
}

pub struct AuthService<G> {
    gateway: G,
    session: SessionStore,
}

impl<G: AuthGateway> AuthService<G> {
    pub fn new(gateway: G, session: SessionStore) -> Self {
        Self { gateway, session }
    }

    /// Validates locally (fails fast, no network), exchanges credentials
    /// for a token, persists it, and fetches the full user record.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let credentials = normalize_credentials(email, password)?;

        tracing::info!(email = %credentials.email, "logging in");
        let token = self
            .gateway
            .login(&credentials)
            .await
            .map_err(|error| self.map_source_error(error))?;

        self.store_token(&token)?;
        self.me().await
    }

    /// Same token/store/fetch sequence as login, with the extra signup
    /// field validation applied first.
    pub async fn signup(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
        phone: &str,
    ) -> Result<User, AuthError> {
        let request = build_signup_request(first_name, last_name, email, password, phone)?;

        tracing::info!(email = %request.email, "signing up");
        let token = self
            .gateway
            .signup(&request)
            .await
            .map_err(|error| self.map_source_error(error))?;

        self.store_token(&token)?;
        self.me().await
    }

    /// Fetches the current user; fails without a network call when no
    /// token is stored.
    pub async fn me(&self) -> Result<User, AuthError> {
        if !self.session.is_authenticated() {
            return Err(AuthError::NotAuthenticated);
        }

        self.gateway
            .fetch_me()
            .await
            .map_err(|error| self.map_source_error(error))
    }

    /// Clears the stored token. Purely local.
    pub fn logout(&self) -> Result<(), AuthError> {
        self.session
            .clear()
            .map_err(|error| AuthError::Storage(error.to_string()))
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    fn store_token(&self, token: &str) -> Result<(), AuthError> {
        self.session
            .set(token)
            .map_err(|error| AuthError::Storage(error.to_string()))
    }

    fn map_source_error(&self, error: AuthSourceError) -> AuthError {
        match error {
            AuthSourceError::Status { status: 403, .. } => AuthError::InvalidCredentials,
            AuthSourceError::Status { status: 401, .. } => {
                // expired token is useless, drop it so the next run starts clean
                if let Err(error) = self.session.clear() {
                    tracing::warn!(error = %error, "failed to clear expired session token");
                }
                AuthError::SessionExpired
            }
            AuthSourceError::Status { status: 404, .. } => AuthError::ServiceUnavailable,
            AuthSourceError::Status { status: 429, .. } => AuthError::RateLimited,
            AuthSourceError::Status { status: 500, .. } => AuthError::ServerError,
            AuthSourceError::Status {
                message: Some(message),
                ..
            } => AuthError::Backend(message),
            AuthSourceError::Status { message: None, .. } => {
                AuthError::Backend("authentication failed, please try again".to_owned())
            }
            AuthSourceError::Transport(message) => AuthError::Backend(message),
            AuthSourceError::InvalidResponse => AuthError::InvalidResponse,
        }
    }
}

/// Trims and lowercases the email, rejecting empty fields and emails
/// without an `@` before any request is made.
pub fn normalize_credentials(email: &str, password: &str) -> Result<Credentials, AuthError> {
    let email = email.trim().to_lowercase();

    if email.is_empty() {
        return Err(AuthError::EmailRequired);
    }

    if password.is_empty() {
        return Err(AuthError::PasswordRequired);
    }

    if !email.contains('@') {
        return Err(AuthError::InvalidEmailFormat);
    }

    Ok(Credentials {
        email,
        password: password.to_owned(),
    })
}

/// Normalizes a phone number to the backend's fixed international format:
/// leading zeros stripped, then country code `44` followed by exactly ten
/// digits.
pub fn normalize_phone(raw: &str) -> Result<String, AuthError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AuthError::PhoneRequired);
    }

    let normalized = trimmed.trim_start_matches('0');
    let valid = normalized.len() == 12
        && normalized.starts_with("44")
        && normalized.chars().all(|ch| ch.is_ascii_digit());

    if valid {
        Ok(normalized.to_owned())
    } else {
        Err(AuthError::InvalidPhoneFormat)
    }
}

fn build_signup_request(
    first_name: &str,
    last_name: &str,
    email: &str,
    password: &str,
    phone: &str,
) -> Result<SignupRequest, AuthError> {
    let credentials = normalize_credentials(email, password)?;

    let first_name = first_name.trim();
    if first_name.is_empty() {
        return Err(AuthError::FirstNameRequired);
    }

    let last_name = last_name.trim();
    if last_name.is_empty() {
        return Err(AuthError::LastNameRequired);
    }

    let phone = normalize_phone(phone)?;

    Ok(SignupRequest {
        username: format!("{first_name} {last_name}"),
        first_name: first_name.to_owned(),
        last_name: last_name.to_owned(),
        email: credentials.email,
        password: credentials.password,
        phone,
    })
}
