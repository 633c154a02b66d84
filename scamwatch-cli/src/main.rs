mod cli;

use std::process;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, DiffArgs, ServeArgs};
use scamwatch::auth::{Authenticator, GitHubApp, StaticToken};
use scamwatch::enrich::EnrichStage;
use scamwatch::entry::parse_entries;
use scamwatch::github::GitHubClient;
use scamwatch::urlscan::UrlscanClient;
use scamwatch::{comment, diff, webhook, BotContext};

fn init_tracing(args: &Cli) {
    let filter = EnvFilter::builder()
        .with_default_directive(args.verbosity.tracing_level_filter().into())
        .from_env_lossy();
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if args.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() {
    let args = Cli::parse();
    init_tracing(&args);

    let result = match args.command {
        Command::Serve(serve_args) => serve(serve_args).await,
        Command::Diff(diff_args) => diff_files(diff_args).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn authenticator(args: &ServeArgs) -> Result<Arc<dyn Authenticator>> {
    if let Some(app_id) = &args.github_app_id {
        let pem = std::fs::read(&args.private_key).with_context(|| {
            format!("failed to read private key {}", args.private_key.display())
        })?;
        let app = GitHubApp::new(app_id, &pem, args.github_api_url.clone())
            .context("failed to load GitHub App credentials")?;
        info!(app_id = %app_id, "authenticating as GitHub App");
        return Ok(Arc::new(app));
    }

    if let Some(token) = &args.github_token {
        info!("authenticating with static token");
        let client = GitHubClient::with_base(args.github_api_url.clone(), Some(token.clone()));
        return Ok(Arc::new(StaticToken::new(client)));
    }

    bail!("either --github-app-id or --github-token is required");
}

async fn serve(args: ServeArgs) -> Result<()> {
    if args.webhook_secret.is_empty() {
        bail!("webhook secret must not be empty");
    }

    let auth = authenticator(&args)?;
    let scanner = UrlscanClient::with_endpoint(&args.urlscan_api_key, &args.urlscan_url);
    let ctx = BotContext::new(auth, Arc::new(scanner)).with_data_path(&args.data_path);
    let app = webhook::router(Arc::new(ctx), &args.webhook_secret);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", args.port))
        .await
        .with_context(|| format!("failed to bind port {}", args.port))?;
    info!(addr = %listener.local_addr()?, data_path = %args.data_path, "listening for webhooks");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

async fn diff_files(args: DiffArgs) -> Result<()> {
    let read = |path: &std::path::Path| -> Result<_> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("file not found: {}", path.display()))?;
        parse_entries(&bytes).with_context(|| format!("failed to parse {}", path.display()))
    };
    let base = read(&args.base)?;
    let head = read(&args.head)?;

    let mut new_entries = diff::resolve(&base, &head);
    info!(count = new_entries.len(), "new entries found");

    if args.scan {
        let api_key = args
            .urlscan_api_key
            .context("--scan requires --urlscan-api-key or URLSCAN_API_KEY")?;
        let scanner = UrlscanClient::with_endpoint(api_key, args.urlscan_url);
        new_entries = EnrichStage::new(Arc::new(scanner)).run(new_entries).await;
    }

    println!("{}", comment::format(&new_entries));
    Ok(())
}
