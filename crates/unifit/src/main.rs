#![allow(unused)]

use crate::prelude::*;
use clap::Parser;

mod auth;
mod error;
mod exercises;
mod plan;
mod prelude;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Browse the exercise catalog and manage your UniFit account"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Whether to display additional information.
    #[clap(long, env = "UNIFIT_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Exercise catalog operations (list, categories, browse)
    Exercises(crate::exercises::App),

    /// Account operations (signup, login, password reset)
    Auth(crate::auth::App),

    /// Workout plan overviews
    Plan(crate::plan::App),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();
    log::debug!("command: {:?}", app.command);

    match app.command {
        SubCommands::Exercises(sub_app) => crate::exercises::run(sub_app, app.global).await,
        SubCommands::Auth(sub_app) => crate::auth::run(sub_app, app.global).await,
        SubCommands::Plan(sub_app) => crate::plan::run(sub_app, app.global).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
