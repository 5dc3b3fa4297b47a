use crate::prelude::{println, *};
use colored::Colorize;
use unifit_core::auth::{validate_login, AuthUser};

use super::IdentityClient;

#[derive(Debug, clap::Args, Clone)]
pub struct LoginOptions {
    #[arg(short, long, default_value = "")]
    pub email: String,

    #[arg(short, long, env = "UNIFIT_PASSWORD", hide_env_values = true, default_value = "")]
    pub password: String,

    /// Output the signed-in account as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(
    options: LoginOptions,
    client: &IdentityClient,
    global: crate::Global,
) -> Result<()> {
    validate_login(&options.email, &options.password).map_err(Error::from)?;

    let spinner = new_spinner("Signing in...")?;
    let result = client
        .sign_in_verified(&options.email, &options.password)
        .await;
    spinner.finish_and_clear();
    let user = result.map_err(Error::from).wrap_err("Login Error")?;

    log::info!("Signed in as {}", user.uid);

    if options.json {
        let json = serde_json::to_string_pretty(&user)
            .map_err(|e| eyre!("JSON serialization failed: {}", e))?;
        println!("{}", json);
    } else {
        print!("{}", format_login_text(&user, global.verbose));
    }

    Ok(())
}

/// Welcome notice plus account summary
pub(crate) fn format_login_text(user: &AuthUser, verbose: bool) -> String {
    let mut result = String::new();

    result.push_str(&format!(
        "\n{}: {}\n",
        "Login Successful".bright_green().bold(),
        format!("Welcome back, {}!", user.greeting_name()).bright_white()
    ));

    if let Some(email) = &user.email {
        result.push_str(&format!("  {}: {}\n", "Email".green(), email.bright_white()));
    }

    if verbose {
        result.push_str(&format!("  {}: {}\n", "UID".green(), user.uid.bright_black()));
        if let Some(created_at) = user.created_at {
            result.push_str(&format!(
                "  {}: {}\n",
                "Member since".green(),
                created_at.format("%Y-%m-%d").to_string().bright_white()
            ));
        }
        result.push_str(&format!(
            "  {}: {}\n",
            "Session expires".green(),
            user.expires_at
                .format("%Y-%m-%d %H:%M UTC")
                .to_string()
                .bright_white()
        ));
    }

    result.push('\n');
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn create_test_user(display_name: Option<&str>) -> AuthUser {
        AuthUser {
            uid: "uid-1".to_string(),
            email: Some("sam@example.com".to_string()),
            display_name: display_name.map(str::to_string),
            photo_url: None,
            email_verified: true,
            created_at: Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()),
            expires_at: Utc.with_ymd_and_hms(2024, 3, 1, 1, 0, 0).unwrap(),
            id_token: "secret-id-token".to_string(),
            refresh_token: "secret-refresh-token".to_string(),
        }
    }

    #[test]
    fn test_format_login_text_greets_by_name() {
        let formatted = format_login_text(&create_test_user(Some("Sam")), false);

        assert!(formatted.contains("Login Successful"));
        assert!(formatted.contains("Welcome back, Sam!"));
        assert!(formatted.contains("sam@example.com"));
        assert!(!formatted.contains("UID"));
    }

    #[test]
    fn test_format_login_text_guest_fallback() {
        let formatted = format_login_text(&create_test_user(None), false);

        assert!(formatted.contains("Welcome back, Guest!"));
    }

    #[test]
    fn test_format_login_text_verbose() {
        let formatted = format_login_text(&create_test_user(Some("Sam")), true);

        assert!(formatted.contains("uid-1"));
        assert!(formatted.contains("2024-03-01"));
        assert!(formatted.contains("Session expires"));
        assert!(!formatted.contains("secret-id-token"));
    }

    #[test]
    fn test_login_json_omits_tokens() {
        let json = serde_json::to_string_pretty(&create_test_user(Some("Sam"))).unwrap();

        assert!(json.contains("\"uid\": \"uid-1\""));
        assert!(!json.contains("secret-id-token"));
        assert!(!json.contains("secret-refresh-token"));
    }

    #[test]
    fn test_missing_credentials_message() {
        let err = Error::from(validate_login("", "pw").unwrap_err());

        assert_eq!(
            err.to_string(),
            "Missing Fields: Please enter both email and password."
        );
    }
}
