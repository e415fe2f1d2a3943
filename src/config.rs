use anyhow::{Context, Result};
use clap::Parser;
use reqwest::Url;
use std::time::Duration;

/// Fusion JWT client - keeps a bearer token fresh and queries the API with it
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Base URL of the API (token and query endpoints live under it)
    #[arg(short = 'a', long, env = "API_URL", default_value = "http://localhost:6764")]
    pub api_url: String,

    /// Username sent as HTTP Basic credentials to the token endpoint
    #[arg(short, long, env = "API_USER", default_value = "admin")]
    pub user: String,

    /// Password sent as HTTP Basic credentials to the token endpoint
    #[arg(short, long, env = "API_PASSWORD", default_value = "password123")]
    pub password: String,

    /// Delay between queries in milliseconds
    #[arg(short, long, env = "INTERVAL_MILLIS", default_value = "1000")]
    pub interval_millis: u64,

    /// App used to build the default query path
    #[arg(long, env = "APP_ID", default_value = "datagen")]
    pub app_id: String,

    /// Search string used to build the default query path
    #[arg(long, env = "SEARCH", default_value = "blah+blah")]
    pub search: String,

    /// Query path appended to the API URL (overrides app id and search)
    #[arg(short, long, env = "QUERY_URL")]
    pub query_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    // Target API
    pub api_url: String,
    pub query_url: String,

    // Credentials for the token endpoint
    pub user: String,
    pub password: String,

    // Query loop
    pub interval: Duration,

    pub log_level: String,
}

impl Config {
    /// Load configuration from all sources with priority: CLI > ENV > .env > defaults
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        Ok(Self::from_args(CliArgs::parse()))
    }

    /// Build configuration from already-parsed arguments
    pub fn from_args(args: CliArgs) -> Self {
        let query_url = args
            .query_url
            .unwrap_or_else(|| default_query_url(&args.app_id, &args.search));

        Config {
            api_url: normalize_api_url(&args.api_url),
            query_url,
            user: args.user,
            password: args.password,
            interval: Duration::from_millis(args.interval_millis),
            log_level: args.log_level,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.api_url)
            .with_context(|| format!("API_URL is not a valid URL: {}", self.api_url))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            anyhow::bail!("API_URL must use http or https: {}", self.api_url);
        }

        if self.user.is_empty() {
            anyhow::bail!("API_USER cannot be empty");
        }

        if self.interval.is_zero() {
            anyhow::bail!("INTERVAL_MILLIS must be greater than zero");
        }

        if !self.query_url.starts_with('/') {
            anyhow::bail!("QUERY_URL must start with '/': {}", self.query_url);
        }

        Ok(())
    }

    /// Token endpoint URL
    pub fn token_url(&self) -> String {
        format!("{}/oauth2/token", self.api_url)
    }

    /// Full URL of the authenticated query
    pub fn full_query_url(&self) -> String {
        format!("{}{}", self.api_url, self.query_url)
    }
}

/// Query path used when none is configured explicitly
fn default_query_url(app_id: &str, search: &str) -> String {
    format!("/api/apps/{}/query/{}?q={}", app_id, app_id, search)
}

/// Strip trailing slashes so endpoint paths can be appended directly
fn normalize_api_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
