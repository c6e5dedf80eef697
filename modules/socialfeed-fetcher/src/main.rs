use std::io::Write;
use std::num::NonZeroUsize;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use graph_client::GraphClient;
use socialfeed_common::{parse_workers, Config};
use socialfeed_fetcher::{
    fetch_account, fetch_all, fetch_facebook_posts, fetch_instagram_posts, ConsoleSink,
    FeedSource, JsonSink, ParallelConsoleSink, PostSink,
};

#[derive(Parser)]
#[command(name = "socialfeed")]
#[command(about = "Fetch Facebook page posts and Instagram media from the Graph API")]
#[command(version)]
struct Cli {
    /// Worker threads used to print posts (positive integer)
    #[arg(short, long, global = true, value_parser = workers_arg)]
    workers: Option<NonZeroUsize>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Facebook page posts
    Posts {
        /// Page id (defaults to FACEBOOK_PAGE_ID)
        #[arg(long)]
        page_id: Option<String>,
    },

    /// Instagram media
    Media {
        /// Instagram business user id (defaults to INSTAGRAM_USER_ID)
        #[arg(long)]
        user_id: Option<String>,
    },

    /// Facebook posts and Instagram media, fetched concurrently
    All {
        #[arg(long)]
        page_id: Option<String>,

        #[arg(long)]
        user_id: Option<String>,
    },

    /// Raw account record (id, username)
    Account {
        #[arg(long)]
        user_id: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn workers_arg(raw: &str) -> std::result::Result<NonZeroUsize, String> {
    parse_workers(raw).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("socialfeed=info,socialfeed_fetcher=info,socialfeed_common=info")
        }))
        .with_writer(std::io::stderr)
        .init();

    // Argument errors (e.g. --workers 0) exit here, before any fetch.
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

async fn run(cli: Cli) -> Result<()> {
    let config =
        Config::from_env_with_workers(cli.workers).context("Failed to load configuration")?;
    config.log_keys();

    let http = reqwest::Client::builder()
        .build()
        .context("Failed to build HTTP client")?;
    let client = GraphClient::new(http, &config.api_base, &config.api_version);
    let sink = build_sink(cli.format, config.workers, std::io::stdout());

    execute(cli.command, &config, &client, sink.as_ref()).await?;

    info!("Finished fetching social media posts");
    Ok(())
}

/// Resolve ids, fetch, present. Ids are resolved before any request is made.
async fn execute(
    command: Commands,
    config: &Config,
    source: &dyn FeedSource,
    sink: &dyn PostSink,
) -> Result<()> {
    let token = config.access_token.as_str();

    match command {
        Commands::Posts { page_id } => {
            let page_id = require(page_id, &config.facebook_page_id, "FACEBOOK_PAGE_ID")?;
            let posts = fetch_facebook_posts(source, &page_id, token).await;
            sink.present("Facebook posts", &posts)?;
        }
        Commands::Media { user_id } => {
            let user_id = require(user_id, &config.instagram_user_id, "INSTAGRAM_USER_ID")?;
            let posts = fetch_instagram_posts(source, &user_id, token).await;
            sink.present("Instagram media", &posts)?;
        }
        Commands::All { page_id, user_id } => {
            let page_id = require(page_id, &config.facebook_page_id, "FACEBOOK_PAGE_ID")?;
            let user_id = require(user_id, &config.instagram_user_id, "INSTAGRAM_USER_ID")?;
            let feeds = fetch_all(source, &page_id, &user_id, token).await;
            sink.present("Facebook posts", &feeds.facebook)?;
            sink.present("Instagram media", &feeds.instagram)?;
        }
        Commands::Account { user_id } => {
            let user_id = require(user_id, &config.instagram_user_id, "INSTAGRAM_USER_ID")?;
            let body = fetch_account(source, &user_id, token).await;
            sink.present_account(body.as_deref())?;
        }
    }

    Ok(())
}

/// Command-line value first, then the configured default.
fn require(arg: Option<String>, configured: &Option<String>, env_key: &str) -> Result<String> {
    arg.or_else(|| configured.clone()).with_context(|| {
        format!("{env_key} is not set and no id was given on the command line")
    })
}

fn build_sink<W>(format: OutputFormat, workers: NonZeroUsize, out: W) -> Box<dyn PostSink>
where
    W: Write + Send + 'static,
{
    match format {
        OutputFormat::Json => Box::new(JsonSink::new(out)),
        OutputFormat::Text if workers.get() > 1 => Box::new(ParallelConsoleSink::new(workers, out)),
        OutputFormat::Text => Box::new(ConsoleSink::new(out)),
    }
}
