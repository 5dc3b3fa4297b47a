use crate::prelude::{println, *};
use serde::de::DeserializeOwned;
use unifit_core::catalog::{
    build_image_map, decode_records, normalize_exercises, CatalogPage, ExerciseRecord,
    RawExercise, RawExerciseImage,
};

pub mod browse;
pub mod categories;
pub mod list;

const DEFAULT_CATALOG_URL: &str = "https://wger.de/api/v2";
const DEFAULT_MEDIA_URL: &str = "https://wger.de";

#[derive(Debug, clap::Parser)]
#[command(name = "exercises")]
#[command(about = "Exercise catalog operations")]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,

    /// Catalog API base URL (overrides UNIFIT_CATALOG_URL env var)
    #[clap(long, global = true)]
    pub catalog_url: Option<String>,

    /// Language id requested from the catalog (overrides UNIFIT_LANGUAGE env var)
    #[clap(long, global = true)]
    pub language: Option<u32>,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// List exercises, optionally filtered by category and search text
    #[clap(name = "list")]
    List(list::ListOptions),

    /// List the categories present in the catalog
    #[clap(name = "categories")]
    Categories(categories::CategoriesOptions),

    /// Interactive session: page, filter and expand exercises from stdin commands
    #[clap(name = "browse")]
    Browse(browse::BrowseOptions),
}

/// Catalog configuration from environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogConfig {
    pub base_url: String,
    pub media_base: String,
    pub language: u32,
    pub status: u32,
    pub limit: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CATALOG_URL.to_string(),
            media_base: DEFAULT_MEDIA_URL.to_string(),
            language: 2,
            status: 2,
            limit: 100,
        }
    }
}

fn env_number(name: &str, default: u32) -> Result<u32> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<u32>()
            .map_err(|_| eyre!("{} must be a positive integer, got '{}'", name, value)),
        Err(_) => Ok(default),
    }
}

impl CatalogConfig {
    /// Load configuration from environment variables
    /// Every variable is optional and falls back to the public wger catalog
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            base_url: std::env::var("UNIFIT_CATALOG_URL").unwrap_or(defaults.base_url),
            media_base: std::env::var("UNIFIT_MEDIA_URL").unwrap_or(defaults.media_base),
            language: env_number("UNIFIT_LANGUAGE", defaults.language)?,
            status: env_number("UNIFIT_STATUS", defaults.status)?,
            limit: env_number("UNIFIT_FETCH_LIMIT", defaults.limit)?,
        })
    }

    /// Apply CLI overrides to the configuration
    pub fn with_overrides(mut self, base_url: Option<String>, language: Option<u32>) -> Self {
        if let Some(url) = base_url {
            self.base_url = url;
        }
        if let Some(language) = language {
            self.language = language;
        }
        self
    }
}

fn build_url(base_url: &str, resource: &str, params: &[(&str, String)]) -> String {
    let query = params
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");

    format!("{}/{}/?{}", base_url.trim_end_matches('/'), resource, query)
}

/// URL of the exercise list resource
pub fn exercise_list_url(config: &CatalogConfig) -> String {
    build_url(
        &config.base_url,
        "exercise",
        &[
            ("status", config.status.to_string()),
            ("language", config.language.to_string()),
            ("limit", config.limit.to_string()),
        ],
    )
}

/// URL of the primary exercise image resource
pub fn exercise_image_url(config: &CatalogConfig) -> String {
    build_url(
        &config.base_url,
        "exerciseimage",
        &[
            ("is_main", "True".to_string()),
            ("limit", config.limit.to_string()),
        ],
    )
}

/// Create the HTTP client used for catalog requests
pub fn create_catalog_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("unifit/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| eyre!("Failed to build HTTP client: {}", e))
}

/// Fetch one limit-bounded batch of a catalog collection
///
/// A single GET without retry; any transport, status or envelope decoding
/// failure surfaces as [`Error::Network`]. Individual records that do not
/// decode are dropped.
pub async fn fetch_collection<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
) -> std::result::Result<Vec<T>, Error> {
    log::debug!("GET {url}");

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| Error::Network(f!("Failed to fetch {}: {}", url, e)))?;

    if !response.status().is_success() {
        return Err(Error::Network(f!(
            "Failed to fetch {}: HTTP {}",
            url,
            response.status()
        )));
    }

    let page: CatalogPage<serde_json::Value> = response
        .json()
        .await
        .map_err(|e| Error::Network(f!("Failed to parse {}: {}", url, e)))?;

    let (records, skipped) = decode_records::<T>(page.results);
    if skipped > 0 {
        log::debug!("Skipped {skipped} malformed records from {url}");
    }

    log::debug!(
        "{} results from {} (upstream count: {:?}, next: {:?}, previous: {:?})",
        records.len(),
        url,
        page.count,
        page.next,
        page.previous
    );

    Ok(records)
}

/// Fetch exercises and their primary images, then join and normalize them
pub async fn fetch_catalog(
    client: &reqwest::Client,
    config: &CatalogConfig,
) -> std::result::Result<Vec<ExerciseRecord>, Error> {
    let exercises_url = exercise_list_url(config);
    let images_url = exercise_image_url(config);

    let (exercises, images) = futures::try_join!(
        fetch_collection::<RawExercise>(client, &exercises_url),
        fetch_collection::<RawExerciseImage>(client, &images_url),
    )?;

    let image_map = build_image_map(&images, &config.media_base);
    let records = normalize_exercises(&exercises, &image_map);

    log::info!(
        "Loaded {} exercises ({} with images)",
        records.len(),
        records.iter().filter(|r| r.image_url.is_some()).count()
    );

    Ok(records)
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let config = CatalogConfig::from_env()?.with_overrides(app.catalog_url, app.language);

    if global.verbose {
        println!("Catalog API Base: {}", config.base_url);
        println!();
    }

    match app.command {
        Commands::List(options) => list::run(options, config, global).await,
        Commands::Categories(options) => categories::run(options, config, global).await,
        Commands::Browse(options) => browse::run(options, config, global).await,
    }
}
