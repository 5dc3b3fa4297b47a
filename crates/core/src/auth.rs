//! Account validation, identity provider wire types and auth state
//!
//! Everything here is pure. Form validation runs before any provider
//! call; provider failures are parsed into [`AuthError`] and mapped to
//! user-facing text. [`AuthContext`] is the explicit replacement for an
//! ambient "current user": views subscribe to it, receive every state
//! change, and unsubscribe on teardown.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Token lifetime assumed when the provider omits or garbles `expiresIn`
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

// =============================================================================
// Errors
// =============================================================================

/// Form errors detected locally, never sent to a backend
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter both email and password.")]
    MissingCredentials,

    #[error("Please enter your email address")]
    MissingEmail,

    #[error("Please enter your {0}.")]
    MissingField(&'static str),

    #[error("Passwords do not match")]
    PasswordMismatch,
}

impl ValidationError {
    /// Short heading shown above the message
    pub fn title(&self) -> &'static str {
        match self {
            ValidationError::MissingCredentials | ValidationError::MissingField(_) => {
                "Missing Fields"
            }
            ValidationError::MissingEmail => "Reset Failed",
            ValidationError::PasswordMismatch => "Error",
        }
    }
}

/// Failures reported by, or while talking to, the identity provider
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("{message} ({code})")]
    Provider { code: String, message: String },

    #[error("Please verify your email before logging in.")]
    EmailNotVerified,

    #[error("You are not signed in.")]
    NotSignedIn,

    #[error("Identity provider request failed: {0}")]
    Transport(String),
}

impl AuthError {
    /// Provider error code, if the provider supplied one
    pub fn code(&self) -> Option<&str> {
        match self {
            AuthError::Provider { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Friendlier text for the provider codes users commonly hit
    pub fn user_message(&self) -> String {
        let AuthError::Provider { code, message } = self else {
            return self.to_string();
        };

        let friendly = match code.as_str() {
            "EMAIL_NOT_FOUND" | "auth/user-not-found" => "No account found with this email.",
            "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "auth/wrong-password"
            | "auth/invalid-credential" => "Incorrect email or password.",
            "EMAIL_EXISTS" | "auth/email-already-in-use" => {
                "An account with this email already exists."
            }
            "WEAK_PASSWORD" | "auth/weak-password" => "Password should be at least 6 characters.",
            "INVALID_EMAIL" | "auth/invalid-email" => "Please enter a valid email address.",
            "TOO_MANY_ATTEMPTS_TRY_LATER" | "auth/too-many-requests" => {
                "Too many attempts. Please try again later."
            }
            "USER_DISABLED" | "auth/user-disabled" => "This account has been disabled.",
            _ => return message.clone(),
        };

        friendly.to_string()
    }
}

#[derive(Debug, Deserialize)]
struct ProviderErrorEnvelope {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

/// Parse the provider's JSON error envelope
///
/// Messages look like `"WEAK_PASSWORD : Password should be at least 6
/// characters"`; the part before ` : ` is the code. Bodies that are not
/// an error envelope keep their raw text under an `HTTP_<status>` code.
pub fn parse_provider_error(status: u16, body: &str) -> AuthError {
    match serde_json::from_str::<ProviderErrorEnvelope>(body) {
        Ok(envelope) => {
            let raw = envelope.error.message.trim();
            let (code, message) = match raw.split_once(" : ") {
                Some((code, detail)) => (code.trim(), detail.trim()),
                None => (raw, raw),
            };

            AuthError::Provider {
                code: code.to_string(),
                message: message.to_string(),
            }
        }
        Err(_) => {
            let text = body.trim();
            AuthError::Provider {
                code: format!("HTTP_{status}"),
                message: if text.is_empty() {
                    format!("Request failed with status {status}")
                } else {
                    text.to_string()
                },
            }
        }
    }
}

// =============================================================================
// Form validation
// =============================================================================

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

pub fn validate_login(email: &str, password: &str) -> Result<(), ValidationError> {
    if is_blank(email) || password.is_empty() {
        return Err(ValidationError::MissingCredentials);
    }
    Ok(())
}

/// Sign-up form as entered by the user
#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub user_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

pub fn validate_signup(form: &SignupForm) -> Result<(), ValidationError> {
    if is_blank(&form.user_name) {
        return Err(ValidationError::MissingField("username"));
    }
    if is_blank(&form.email) {
        return Err(ValidationError::MissingField("email"));
    }
    if form.password.is_empty() {
        return Err(ValidationError::MissingField("password"));
    }
    if form.password != form.confirm_password {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

pub fn validate_reset_email(email: &str) -> Result<(), ValidationError> {
    if is_blank(email) {
        return Err(ValidationError::MissingEmail);
    }
    Ok(())
}

pub fn validate_new_password(
    password: &str,
    confirm_password: &str,
) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::MissingField("new password"));
    }
    if password != confirm_password {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

// =============================================================================
// Identity provider wire types
// =============================================================================

/// Body for the sign-up and sign-in-with-password endpoints
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PasswordCredentialsRequest {
    pub email: String,
    pub password: String,
    pub return_secure_token: bool,
}

impl PasswordCredentialsRequest {
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.trim().to_string(),
            password: password.to_string(),
            return_secure_token: true,
        }
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OobRequestType {
    PasswordReset,
    VerifyEmail,
}

/// Body for the out-of-band email endpoint
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct OobCodeRequest {
    pub request_type: OobRequestType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
}

impl OobCodeRequest {
    pub fn password_reset(email: &str) -> Self {
        Self {
            request_type: OobRequestType::PasswordReset,
            email: Some(email.trim().to_string()),
            id_token: None,
        }
    }

    pub fn verify_email(id_token: &str) -> Self {
        Self {
            request_type: OobRequestType::VerifyEmail,
            email: None,
            id_token: Some(id_token.to_string()),
        }
    }
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LookupRequest {
    pub id_token: String,
}

/// Body for the account update endpoint
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    pub id_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub return_secure_token: bool,
}

/// Tokens returned by sign-up and sign-in
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub id_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<String>,
    pub local_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountResponse {
    pub local_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LookupResponse {
    #[serde(default)]
    pub users: Vec<AccountInfo>,
}

/// Account details from the lookup endpoint
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub local_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    /// Milliseconds since the epoch, as a string
    #[serde(default)]
    pub created_at: Option<String>,
}

// =============================================================================
// Signed-in user and auth state
// =============================================================================

/// A signed-in account
#[derive(Clone, Serialize, PartialEq)]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub email_verified: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub id_token: String,
    #[serde(skip_serializing)]
    pub refresh_token: String,
}

impl fmt::Debug for AuthUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthUser")
            .field("uid", &self.uid)
            .field("email", &self.email)
            .field("display_name", &self.display_name)
            .field("email_verified", &self.email_verified)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

impl AuthUser {
    /// Name to greet the user with
    pub fn greeting_name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or("Guest")
    }
}

fn token_lifetime(expires_in: Option<&str>) -> Duration {
    let secs = expires_in
        .and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
    Duration::seconds(secs)
}

fn parse_created_at(created_at: Option<&str>) -> Option<DateTime<Utc>> {
    let millis = created_at?.trim().parse::<i64>().ok()?;
    DateTime::<Utc>::from_timestamp_millis(millis)
}

/// Combine sign-in tokens with looked-up account details
pub fn build_auth_user(
    tokens: &TokenResponse,
    account: &AccountInfo,
    now: DateTime<Utc>,
) -> AuthUser {
    AuthUser {
        uid: tokens.local_id.clone(),
        email: account.email.clone().or_else(|| tokens.email.clone()),
        display_name: account
            .display_name
            .clone()
            .or_else(|| tokens.display_name.clone()),
        photo_url: account.photo_url.clone(),
        email_verified: account.email_verified,
        created_at: parse_created_at(account.created_at.as_deref()),
        expires_at: now + token_lifetime(tokens.expires_in.as_deref()),
        id_token: tokens.id_token.clone(),
        refresh_token: tokens.refresh_token.clone(),
    }
}

/// Reject accounts whose email address has not been verified yet
pub fn ensure_verified(user: AuthUser) -> Result<AuthUser, AuthError> {
    if user.email_verified {
        Ok(user)
    } else {
        Err(AuthError::EmailNotVerified)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    SignedOut,
    SignedIn(AuthUser),
}

/// Handle returned by [`AuthContext::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

pub type AuthListener = Box<dyn FnMut(&AuthState)>;

/// Explicit auth state shared with dependent views
pub struct AuthContext {
    state: AuthState,
    loading: bool,
    listeners: Vec<(SubscriptionId, AuthListener)>,
    next_id: u64,
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("state", &self.state)
            .field("loading", &self.loading)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for AuthContext {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthContext {
    pub fn new() -> Self {
        Self {
            state: AuthState::SignedOut,
            loading: true,
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    /// `true` until the first state update arrives
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn current_user(&self) -> Option<&AuthUser> {
        match &self.state {
            AuthState::SignedIn(user) => Some(user),
            AuthState::SignedOut => None,
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Register a listener; it is called right away with the current state
    pub fn subscribe(&mut self, mut listener: AuthListener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;

        listener(&self.state);
        self.listeners.push((id, listener));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Drop every listener
    pub fn teardown(&mut self) {
        self.listeners.clear();
    }

    fn update(&mut self, state: AuthState) {
        self.state = state;
        self.loading = false;

        for (_, listener) in self.listeners.iter_mut() {
            listener(&self.state);
        }
    }

    /// Mark the initial state as resolved without changing it
    pub fn resolve(&mut self) {
        let state = self.state.clone();
        self.update(state);
    }

    pub fn set_user(&mut self, user: AuthUser) {
        self.update(AuthState::SignedIn(user));
    }

    /// Sign out locally, returning the user that was signed in
    pub fn sign_out(&mut self) -> Option<AuthUser> {
        let previous = match std::mem::replace(&mut self.state, AuthState::SignedOut) {
            AuthState::SignedIn(user) => Some(user),
            AuthState::SignedOut => None,
        };
        self.update(AuthState::SignedOut);
        previous
    }
}
