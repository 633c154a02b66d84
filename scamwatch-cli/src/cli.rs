use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use scamwatch::context::DEFAULT_DATA_PATH;
use scamwatch::github::{GITHUB_API_BASE, Url};
use scamwatch::urlscan::URLSCAN_API_URL;

/// Report newly listed scam URLs on pull requests
#[derive(Parser)]
#[command(name = "scamwatch", version)]
pub struct Cli {
    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Listen for GitHub webhook deliveries
    Serve(ServeArgs),
    /// Compare two local copies of the data file and print the report
    Diff(DiffArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Secret configured on the webhook
    #[arg(long, env = "SCAMWATCH_WEBHOOK_SECRET", hide_env_values = true)]
    pub webhook_secret: String,

    /// GitHub App id; takes precedence over --github-token
    #[arg(long, env = "GITHUB_APP_ID")]
    pub github_app_id: Option<String>,

    /// PEM private key of the GitHub App
    #[arg(long, env = "GITHUB_PRIVATE_KEY_PATH", default_value = "private-key.pem")]
    pub private_key: PathBuf,

    /// Personal or installation token, used when no app id is given
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// urlscan.io API key
    #[arg(long, env = "URLSCAN_API_KEY", hide_env_values = true)]
    pub urlscan_api_key: String,

    /// Path of the tracked data file inside the repository
    #[arg(long, default_value = DEFAULT_DATA_PATH)]
    pub data_path: String,

    #[arg(long, env = "SCAMWATCH_GITHUB_API_URL", default_value = GITHUB_API_BASE, hide = true)]
    pub github_api_url: Url,

    #[arg(long, env = "SCAMWATCH_URLSCAN_URL", default_value = URLSCAN_API_URL, hide = true)]
    pub urlscan_url: String,
}

#[derive(Args)]
pub struct DiffArgs {
    /// Data file as of the base branch
    pub base: PathBuf,

    /// Data file as of the head branch
    pub head: PathBuf,

    /// Submit new URLs to urlscan.io
    #[arg(long, requires = "urlscan_api_key")]
    pub scan: bool,

    /// urlscan.io API key
    #[arg(long, env = "URLSCAN_API_KEY", hide_env_values = true)]
    pub urlscan_api_key: Option<String>,

    #[arg(long, env = "SCAMWATCH_URLSCAN_URL", default_value = URLSCAN_API_URL, hide = true)]
    pub urlscan_url: String,
}
