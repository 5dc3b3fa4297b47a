use crate::prelude::{println, *};
use colored::Colorize;
use unifit_core::auth::validate_reset_email;

use super::IdentityClient;

#[derive(Debug, clap::Args, Clone)]
pub struct ResetPasswordOptions {
    /// Address the reset link is sent to
    #[arg(short, long, default_value = "")]
    pub email: String,
}

pub async fn run(
    options: ResetPasswordOptions,
    client: &IdentityClient,
    global: crate::Global,
) -> Result<()> {
    validate_reset_email(&options.email).map_err(Error::from)?;

    let spinner = new_spinner("Sending reset email...")?;
    let result = client.send_password_reset(&options.email).await;
    spinner.finish_and_clear();
    result.map_err(Error::from).wrap_err("Reset Failed")?;

    if global.verbose {
        println!("Reset email requested for {}", options.email.trim());
    }

    print!("{}", format_reset_text());
    Ok(())
}

fn format_reset_text() -> String {
    format!(
        "\n{}: {}\n\n",
        "Password Reset Sent".bright_green().bold(),
        "Check your email for further instructions".bright_white()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_reset_text() {
        let formatted = format_reset_text();

        assert!(formatted.contains("Password Reset Sent"));
        assert!(formatted.contains("Check your email for further instructions"));
    }

    #[test]
    fn test_blank_email_message() {
        let err = Error::from(validate_reset_email("   ").unwrap_err());

        assert_eq!(err.to_string(), "Reset Failed: Please enter your email address");
    }
}
