//! Interactive list session
//!
//! Reads one command per stdin line and drives an
//! [`ExerciseListController`]. Catalog fetches run on spawned tasks and
//! report back over a channel; quitting while a fetch is in flight aborts
//! the task and cancels its ticket, so a late result can never reach the
//! controller.

use crate::auth::{IdentityClient, IdentityConfig};
use crate::prelude::{eprintln, println, *};
use colored::Colorize;
use std::num::NonZeroUsize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use unifit_core::auth::{
    validate_login, AuthContext, AuthError, AuthListener, AuthState, SubscriptionId,
};
use unifit_core::catalog::{ExerciseId, ExerciseRecord};
use unifit_core::controller::{
    CatalogState, ExerciseListController, FetchTicket, FETCH_FAILED_MESSAGE,
};
use unifit_core::filter::ALL_CATEGORIES;
use unifit_core::pagination::DEFAULT_PAGE_SIZE;

use super::{create_catalog_client, fetch_catalog, list::format_exercise_rows, CatalogConfig};

const HELP_TEXT: &str = "\
Commands:
  next | n                  Next page
  prev | p                  Previous page
  category <name|All>       Filter by category
  search <text>             Filter by name or description (empty clears)
  clear                     Reset category, search and page
  toggle <id>               Expand or collapse one exercise
  refresh                   Reload the catalog
  login <email> <password>  Sign in
  logout                    Sign out
  whoami                    Show the signed-in account
  help                      Show this help
  quit                      Leave the session";

#[derive(Debug, clap::Args, serde::Serialize, serde::Deserialize, Clone)]
pub struct BrowseOptions {
    /// Number of exercises per page
    #[arg(long, env = "UNIFIT_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: NonZeroUsize,
}

/// One parsed session command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Next,
    Prev,
    Category(Option<String>),
    Search(String),
    Clear,
    Toggle(ExerciseId),
    Refresh,
    Login { email: String, password: String },
    Logout,
    WhoAmI,
    Help,
    Quit,
    Empty,
    Usage(&'static str),
    Unknown(String),
}

pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    match head.to_lowercase().as_str() {
        "" => Command::Empty,
        "next" | "n" => Command::Next,
        "prev" | "previous" | "p" => Command::Prev,
        "category" | "cat" => {
            if rest.is_empty() || rest.eq_ignore_ascii_case(ALL_CATEGORIES) {
                Command::Category(None)
            } else {
                Command::Category(Some(rest.to_string()))
            }
        }
        "search" | "s" => Command::Search(rest.to_string()),
        "clear" => Command::Clear,
        "toggle" | "t" => {
            if rest.is_empty() {
                Command::Usage("toggle <id>")
            } else {
                Command::Toggle(ExerciseId::parse(rest))
            }
        }
        "refresh" | "r" => Command::Refresh,
        "login" => {
            let (email, password) = match rest.split_once(char::is_whitespace) {
                Some((email, password)) => (email, password.trim()),
                None => (rest, ""),
            };
            Command::Login {
                email: email.to_string(),
                password: password.to_string(),
            }
        }
        "logout" => Command::Logout,
        "whoami" => Command::WhoAmI,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    }
}

type FetchOutcome = (FetchTicket, std::result::Result<Vec<ExerciseRecord>, String>);

struct Session {
    controller: ExerciseListController,
    auth: AuthContext,
    client: reqwest::Client,
    identity: Option<IdentityClient>,
    config: CatalogConfig,
    tx: mpsc::UnboundedSender<FetchOutcome>,
    in_flight: Option<(FetchTicket, JoinHandle<()>)>,
}

impl Session {
    /// Start a fetch unless one is already running
    fn start_fetch(&mut self) -> bool {
        let Some(ticket) = self.controller.begin_fetch() else {
            return false;
        };

        let client = self.client.clone();
        let config = self.config.clone();
        let tx = self.tx.clone();

        let handle = tokio::spawn(async move {
            let result = fetch_catalog(&client, &config).await.map_err(|err| {
                log::error!("{}", err);
                FETCH_FAILED_MESSAGE.to_string()
            });
            // The receiver is gone once the session has ended
            let _ = tx.send((ticket, result));
        });

        log::debug!("fetch {:?} started", ticket);
        self.in_flight = Some((ticket, handle));
        true
    }

    fn finish_fetch(
        &mut self,
        ticket: FetchTicket,
        result: std::result::Result<Vec<ExerciseRecord>, String>,
    ) -> bool {
        if matches!(&self.in_flight, Some((current, _)) if *current == ticket) {
            self.in_flight = None;
        }

        let applied = self.controller.complete_fetch(ticket, result);
        if !applied {
            log::debug!("discarded result of stale fetch {:?}", ticket);
        }
        applied
    }

    /// Abort the running fetch task and restore the previous state
    fn abort_fetch(&mut self) {
        if let Some((ticket, handle)) = self.in_flight.take() {
            handle.abort();
            self.controller.cancel_fetch();
            log::debug!("fetch {:?} aborted", ticket);
        }
    }

    async fn login(&mut self, email: &str, password: &str) -> std::result::Result<String, Error> {
        validate_login(email, password)?;

        let identity = self
            .identity
            .as_ref()
            .ok_or_else(|| Error::Generic("set UNIFIT_FIREBASE_API_KEY to sign in".to_string()))?;

        let user = identity.sign_in_verified(email, password).await?;
        let greeting = f!("Welcome back, {}!", user.greeting_name());
        self.auth.set_user(user);

        Ok(greeting)
    }

    /// Apply one command; returns `false` when the session should end
    async fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Quit => return false,
            Command::Empty => {}
            Command::Help => println!("{}", HELP_TEXT),
            Command::Next => match step_page(&mut self.controller, true) {
                Ok(()) => self.render(),
                Err(message) => notice(message),
            },
            Command::Prev => match step_page(&mut self.controller, false) {
                Ok(()) => self.render(),
                Err(message) => notice(message),
            },
            Command::Category(category) => {
                self.controller.set_category(category.as_deref());
                self.render();
            }
            Command::Search(query) => {
                self.controller.set_search(&query);
                self.render();
            }
            Command::Clear => {
                self.controller.clear_filters();
                self.render();
            }
            Command::Toggle(id) => match self.controller.toggle_expanded(&id) {
                Some(_) => self.render(),
                None => notice(&f!("No exercise with id {}.", id)),
            },
            Command::Refresh => {
                if self.start_fetch() {
                    self.render();
                } else {
                    notice("Exercises are already loading.");
                }
            }
            Command::Login { email, password } => match self.login(&email, &password).await {
                Ok(greeting) => println!(
                    "{}: {}",
                    "Login Successful".bright_green().bold(),
                    greeting
                ),
                Err(err) => report(&err),
            },
            Command::Logout => match self.auth.sign_out() {
                Some(_) => {}
                None => report(&Error::from(AuthError::NotSignedIn)),
            },
            Command::WhoAmI => match self.auth.current_user() {
                Some(user) => println!(
                    "{} ({})",
                    user.greeting_name().bright_white().bold(),
                    user.email.as_deref().unwrap_or("no email")
                ),
                None => report(&Error::from(AuthError::NotSignedIn)),
            },
            Command::Usage(usage) => notice(&f!("Usage: {}", usage)),
            Command::Unknown(line) => notice(&f!(
                "Unknown command '{}'. Type 'help' for commands.",
                line
            )),
        }

        true
    }

    fn render(&self) {
        print!("{}", format_session_view(&self.controller));
    }
}

/// Move one page forward or back, or explain why the page stayed put
fn step_page(
    controller: &mut ExerciseListController,
    forward: bool,
) -> std::result::Result<(), &'static str> {
    if controller.view().is_none() {
        return Err("Exercises are not loaded yet.");
    }

    if forward {
        controller
            .next_page()
            .then_some(())
            .ok_or("Already on the last page.")
    } else {
        controller
            .previous_page()
            .then_some(())
            .ok_or("Already on the first page.")
    }
}

/// Resolve the initial auth state, then attach the listener
///
/// The listener hears the resolved state once, straight from `subscribe`.
fn watch_auth(auth: &mut AuthContext, listener: AuthListener) -> SubscriptionId {
    auth.resolve();
    auth.subscribe(listener)
}

fn notice(message: &str) {
    println!("{}", message.yellow());
}

fn report(err: &Error) {
    eprintln!("{}", err.to_string().red());
}

fn format_auth_state(state: &AuthState) -> String {
    match state {
        AuthState::SignedIn(user) => format!(
            "{} {}",
            "[auth]".bright_black(),
            format!("Signed in as {}", user.greeting_name()).green()
        ),
        AuthState::SignedOut => {
            format!("{} {}", "[auth]".bright_black(), "Signed out".bright_white())
        }
    }
}

/// Category chips with the active one bracketed
fn format_category_chips(controller: &ExerciseListController) -> String {
    let selected = controller.filter().selected_category.as_deref();

    std::iter::once(ALL_CATEGORIES.to_string())
        .chain(controller.categories())
        .map(|name| {
            let active = match selected {
                None => name == ALL_CATEGORIES,
                Some(selected) => name == selected,
            };
            if active {
                format!("[{}]", name).bright_cyan().bold().to_string()
            } else {
                name
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
}

/// Render the controller's current state for the terminal
fn format_session_view(controller: &ExerciseListController) -> String {
    let mut result = String::new();

    match controller.state() {
        CatalogState::Idle => {
            result.push_str(&format!("\n{}\n", "Type 'refresh' to load exercises.".yellow()));
        }
        CatalogState::Loading => {
            result.push_str(&format!("\n{}\n", "Loading exercises...".bright_cyan()));
        }
        CatalogState::Failed(message) => {
            result.push_str(&format!(
                "\n{}\n{}\n",
                message.red().bold(),
                "Type 'refresh' to try again.".yellow()
            ));
        }
        CatalogState::Ready(_) => {
            let Some(view) = controller.view() else {
                return result;
            };

            result.push_str(&format!("\n{}\n", "=".repeat(80).bright_cyan()));
            result.push_str(&format!("{}\n", format_category_chips(controller)));
            if !controller.filter().search_query.is_empty() {
                result.push_str(&format!(
                    "{}: {}\n",
                    "Search".green(),
                    controller.filter().search_query.bright_white()
                ));
            }
            result.push_str(&format!("{}\n", "=".repeat(80).bright_cyan()));

            if view.items.is_empty() {
                result.push_str(&format!(
                    "\n{}\n",
                    "No exercises match the current filter.".yellow()
                ));
            } else {
                result.push_str(&format_exercise_rows(&view.items, &view.info));
            }

            let mut nav = Vec::new();
            if view.info.has_previous_page {
                nav.push("prev");
            }
            if view.info.has_next_page {
                nav.push("next");
            }

            result.push_str(&format!(
                "\n{} {} {} {} ({} of {} exercises){}\n",
                "Page".bright_white(),
                view.info.current_page.to_string().bright_cyan().bold(),
                "of".bright_white(),
                view.info.total_pages.max(1).to_string().bright_cyan().bold(),
                view.info.total_items,
                view.total_records,
                if nav.is_empty() {
                    String::new()
                } else {
                    format!("  [{}]", nav.join(" | "))
                }
            ));
        }
    }

    result
}

pub async fn run(
    options: BrowseOptions,
    config: CatalogConfig,
    global: crate::Global,
) -> Result<()> {
    let identity = match IdentityConfig::from_env() {
        Ok(identity_config) => Some(IdentityClient::new(identity_config)?),
        Err(err) => {
            log::info!("login disabled: {}", err);
            None
        }
    };

    let (tx, mut rx) = mpsc::unbounded_channel::<FetchOutcome>();

    let mut session = Session {
        controller: ExerciseListController::new(options.page_size),
        auth: AuthContext::new(),
        client: create_catalog_client()?,
        identity,
        config,
        tx,
        in_flight: None,
    };

    let subscription = watch_auth(
        &mut session.auth,
        Box::new(|state: &AuthState| println!("{}", format_auth_state(state))),
    );

    if global.verbose {
        println!("Page size: {}", options.page_size);
    }
    println!("{}", "Type 'help' for commands.".bright_black());

    session.start_fetch();
    session.render();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            Some((ticket, result)) = rx.recv() => {
                if session.finish_fetch(ticket, result) {
                    session.render();
                }
            }
            line = lines.next_line() => {
                let Some(line) = line.wrap_err("Failed to read from stdin")? else {
                    break;
                };
                if !session.handle(parse_command(&line)).await {
                    break;
                }
            }
        }
    }

    session.abort_fetch();
    session.auth.unsubscribe(subscription);
    session.auth.teardown();

    Ok(())
}
