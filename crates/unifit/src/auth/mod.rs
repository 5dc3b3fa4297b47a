use crate::prelude::{println, *};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use unifit_core::auth::{
    build_auth_user, ensure_verified, parse_provider_error, AccountInfo, AuthError, AuthUser,
    LookupRequest, LookupResponse, OobCodeRequest, PasswordCredentialsRequest, TokenResponse,
    UpdateAccountRequest, UpdateAccountResponse,
};

pub mod login;
pub mod reset_password;
pub mod set_password;
pub mod signup;

#[derive(Debug, clap::Parser)]
#[command(name = "auth")]
#[command(about = "Account operations")]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,

    /// Identity Toolkit base URL (overrides UNIFIT_IDENTITY_URL env var)
    #[clap(long, global = true)]
    pub identity_url: Option<String>,

    /// Web API key of the identity project (overrides UNIFIT_FIREBASE_API_KEY env var)
    #[clap(long, global = true)]
    pub api_key: Option<String>,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Create an account and send the verification email
    #[clap(name = "signup")]
    Signup(signup::SignupOptions),

    /// Sign in with email and password
    #[clap(name = "login")]
    Login(login::LoginOptions),

    /// Send a password reset email
    #[clap(name = "reset-password")]
    ResetPassword(reset_password::ResetPasswordOptions),

    /// Change the password of an account
    #[clap(name = "set-password")]
    SetPassword(set_password::SetPasswordOptions),
}

/// Identity provider configuration from environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityConfig {
    pub base_url: String,
    pub api_key: String,
}

impl IdentityConfig {
    /// Default Identity Toolkit REST base URL
    pub const DEFAULT_BASE_URL: &'static str = "https://identitytoolkit.googleapis.com/v1";

    /// Load configuration from environment variables
    /// Requires UNIFIT_FIREBASE_API_KEY
    /// Uses UNIFIT_IDENTITY_URL with default fallback
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            base_url: std::env::var("UNIFIT_IDENTITY_URL")
                .unwrap_or_else(|_| Self::DEFAULT_BASE_URL.to_string()),
            api_key: std::env::var("UNIFIT_FIREBASE_API_KEY")
                .map_err(|_| eyre!("UNIFIT_FIREBASE_API_KEY environment variable not set"))?,
        })
    }

    /// Load from the environment, letting CLI values stand in for missing variables
    pub fn resolve(base_url: Option<String>, api_key: Option<String>) -> Result<Self> {
        match api_key {
            Some(key) => Ok(Self {
                base_url: std::env::var("UNIFIT_IDENTITY_URL")
                    .unwrap_or_else(|_| Self::DEFAULT_BASE_URL.to_string()),
                api_key: key,
            }
            .with_overrides(base_url, None)),
            None => Ok(Self::from_env()?.with_overrides(base_url, None)),
        }
    }

    /// Apply CLI overrides to the configuration
    pub fn with_overrides(mut self, base_url: Option<String>, api_key: Option<String>) -> Self {
        if let Some(url) = base_url {
            self.base_url = url;
        }
        if let Some(key) = api_key {
            self.api_key = key;
        }
        self
    }
}

/// URL of one `accounts:<method>` endpoint
pub fn identity_endpoint(base_url: &str, method: &str, api_key: &str) -> String {
    format!(
        "{}/accounts:{}?key={}",
        base_url.trim_end_matches('/'),
        method,
        urlencoding::encode(api_key)
    )
}

/// Client for the identity provider's REST API
#[derive(Debug, Clone)]
pub struct IdentityClient {
    http: reqwest::Client,
    config: IdentityConfig,
}

impl IdentityClient {
    pub fn new(config: IdentityConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("unifit/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

        Ok(Self { http, config })
    }

    async fn post<B, R>(&self, method: &str, body: &B) -> std::result::Result<R, AuthError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = identity_endpoint(&self.config.base_url, method, &self.config.api_key);
        log::debug!("POST accounts:{method}");

        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let err = parse_provider_error(status.as_u16(), &text);
            log::warn!("accounts:{method} failed with {status}: {err}");
            return Err(err);
        }

        response
            .json::<R>()
            .await
            .map_err(|e| {
                AuthError::Transport(f!("Invalid response from accounts:{}: {}", method, e))
            })
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> std::result::Result<TokenResponse, AuthError> {
        self.post("signUp", &PasswordCredentialsRequest::new(email, password))
            .await
    }

    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> std::result::Result<TokenResponse, AuthError> {
        self.post(
            "signInWithPassword",
            &PasswordCredentialsRequest::new(email, password),
        )
        .await
    }

    /// Account details behind an ID token
    pub async fn lookup(&self, id_token: &str) -> std::result::Result<AccountInfo, AuthError> {
        let response: LookupResponse = self
            .post(
                "lookup",
                &LookupRequest {
                    id_token: id_token.to_string(),
                },
            )
            .await?;

        response.users.into_iter().next().ok_or_else(|| AuthError::Provider {
            code: "USER_NOT_FOUND".to_string(),
            message: "No account found for this session.".to_string(),
        })
    }

    pub async fn send_password_reset(&self, email: &str) -> std::result::Result<(), AuthError> {
        let _: IgnoredAny = self
            .post("sendOobCode", &OobCodeRequest::password_reset(email))
            .await?;
        Ok(())
    }

    pub async fn send_email_verification(
        &self,
        id_token: &str,
    ) -> std::result::Result<(), AuthError> {
        let _: IgnoredAny = self
            .post("sendOobCode", &OobCodeRequest::verify_email(id_token))
            .await?;
        Ok(())
    }

    /// Store the display name on the account
    pub async fn update_profile(
        &self,
        id_token: &str,
        display_name: &str,
    ) -> std::result::Result<UpdateAccountResponse, AuthError> {
        self.post(
            "update",
            &UpdateAccountRequest {
                id_token: id_token.to_string(),
                display_name: Some(display_name.trim().to_string()),
                password: None,
                return_secure_token: false,
            },
        )
        .await
    }

    pub async fn update_password(
        &self,
        id_token: &str,
        new_password: &str,
    ) -> std::result::Result<UpdateAccountResponse, AuthError> {
        self.post(
            "update",
            &UpdateAccountRequest {
                id_token: id_token.to_string(),
                display_name: None,
                password: Some(new_password.to_string()),
                return_secure_token: true,
            },
        )
        .await
    }

    /// Sign in and load the account, rejecting unverified email addresses
    pub async fn sign_in_verified(
        &self,
        email: &str,
        password: &str,
    ) -> std::result::Result<AuthUser, AuthError> {
        let tokens = self.sign_in(email, password).await?;
        let account = self.lookup(&tokens.id_token).await?;
        let user = build_auth_user(&tokens, &account, chrono::Utc::now());

        ensure_verified(user)
    }
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let config = IdentityConfig::resolve(app.identity_url, app.api_key)?;

    if global.verbose {
        println!("Identity API Base: {}", config.base_url);
        println!();
    }

    let client = IdentityClient::new(config)?;

    match app.command {
        Commands::Signup(options) => signup::run(options, &client, global).await,
        Commands::Login(options) => login::run(options, &client, global).await,
        Commands::ResetPassword(options) => reset_password::run(options, &client, global).await,
        Commands::SetPassword(options) => set_password::run(options, &client, global).await,
    }
}
