use crate::prelude::{println, *};
use colored::Colorize;
use unifit_core::auth::{validate_login, validate_new_password, AuthError, UpdateAccountResponse};

use super::IdentityClient;

#[derive(Debug, clap::Args, Clone)]
pub struct SetPasswordOptions {
    #[arg(short, long, default_value = "")]
    pub email: String,

    /// Current password
    #[arg(short, long, env = "UNIFIT_PASSWORD", hide_env_values = true, default_value = "")]
    pub password: String,

    #[arg(long, default_value = "")]
    pub new_password: String,

    #[arg(long, default_value = "")]
    pub confirm_password: String,
}

pub async fn run(
    options: SetPasswordOptions,
    client: &IdentityClient,
    global: crate::Global,
) -> Result<()> {
    validate_login(&options.email, &options.password).map_err(Error::from)?;
    validate_new_password(&options.new_password, &options.confirm_password)
        .map_err(Error::from)?;

    let spinner = new_spinner("Updating password...")?;
    let result = change_password(client, &options, &spinner).await;
    spinner.finish_and_clear();
    let updated = result.map_err(Error::from).wrap_err("Password Update Failed")?;

    if global.verbose {
        println!("Updated account {}", updated.local_id);
    }

    print!("{}", format_set_password_text());
    Ok(())
}

/// Re-authenticate with the current password, then store the new one
async fn change_password(
    client: &IdentityClient,
    options: &SetPasswordOptions,
    spinner: &indicatif::ProgressBar,
) -> std::result::Result<UpdateAccountResponse, AuthError> {
    let tokens = client.sign_in(&options.email, &options.password).await?;

    spinner.set_message("Saving new password...");
    client
        .update_password(&tokens.id_token, &options.new_password)
        .await
}

fn format_set_password_text() -> String {
    format!(
        "\n{}: {}\n\n",
        "Password Updated".bright_green().bold(),
        "Use your new password the next time you sign in.".bright_white()
    )
}
