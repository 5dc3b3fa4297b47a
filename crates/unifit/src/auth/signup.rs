use crate::prelude::{println, *};
use colored::Colorize;
use unifit_core::auth::{validate_signup, SignupForm};

use super::IdentityClient;

#[derive(Debug, clap::Args, Clone)]
pub struct SignupOptions {
    /// Name shown in greetings
    #[arg(short, long, default_value = "")]
    pub username: String,

    #[arg(short, long, default_value = "")]
    pub email: String,

    #[arg(short, long, env = "UNIFIT_PASSWORD", hide_env_values = true, default_value = "")]
    pub password: String,

    #[arg(long, default_value = "")]
    pub confirm_password: String,
}

impl From<SignupOptions> for SignupForm {
    fn from(options: SignupOptions) -> Self {
        SignupForm {
            user_name: options.username,
            email: options.email,
            password: options.password,
            confirm_password: options.confirm_password,
        }
    }
}

pub async fn run(
    options: SignupOptions,
    client: &IdentityClient,
    global: crate::Global,
) -> Result<()> {
    let form = SignupForm::from(options);
    validate_signup(&form).map_err(Error::from)?;

    let spinner = new_spinner("Creating account...")?;
    let result = create_account(client, &form, &spinner).await;
    spinner.finish_and_clear();
    let email = result.map_err(Error::from).wrap_err("Signup Error")?;

    if global.verbose {
        println!("Verification email sent to {}", email);
    }

    print!("{}", format_signup_text(&form.user_name));
    Ok(())
}

/// Register the account, store the username and send the verification email
async fn create_account(
    client: &IdentityClient,
    form: &SignupForm,
    spinner: &indicatif::ProgressBar,
) -> std::result::Result<String, unifit_core::auth::AuthError> {
    let tokens = client.sign_up(&form.email, &form.password).await?;
    log::info!("Created account {}", tokens.local_id);

    spinner.set_message("Saving profile...");
    client
        .update_profile(&tokens.id_token, &form.user_name)
        .await?;

    spinner.set_message("Sending verification email...");
    client.send_email_verification(&tokens.id_token).await?;

    Ok(tokens.email.unwrap_or_else(|| form.email.trim().to_string()))
}

fn format_signup_text(user_name: &str) -> String {
    format!(
        "\n{}: {}\n  {}: {}\n\n{}:\n  {}\n\n",
        "Signup Successful".bright_green().bold(),
        "Please verify your email before logging in.".bright_white(),
        "Username".green(),
        user_name.trim().bright_white(),
        "Then sign in with".bright_white().bold(),
        "unifit auth login --email <email> --password <password>".cyan()
    )
}
