use anyhow::{Context, Result};
use clap::Parser;
use listing_scout::config::Settings;
use listing_scout::models::Source;
use listing_scout::pipeline::Pipeline;
use listing_scout::store::{InsertOrder, ResultStore};
use listing_scout::{report, sources};
use std::path::PathBuf;
use tokio::io::AsyncReadExt;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "listing-scout")]
#[command(about = "Extract rental listings from scraped chat and group text")]
struct Cli {
    /// File with scraped text (reads stdin when omitted)
    input: Option<PathBuf>,

    /// Platform the text was collected from
    #[arg(short, long, value_enum, default_value = "text")]
    source: Source,

    /// Page or chat the text came from
    #[arg(long)]
    page_url: Option<String>,

    /// Telegram channel username, used to build a message link
    #[arg(long)]
    telegram_username: Option<String>,

    /// Telegram chat id, used when the channel has no username
    #[arg(long, allow_hyphen_values = true)]
    telegram_chat_id: Option<i64>,

    /// Telegram message id the text belongs to
    #[arg(long)]
    telegram_message_id: Option<i64>,

    /// Treat the input as an HTML page selection
    #[arg(long)]
    html: bool,

    /// Directory for the JSON and CSV results
    #[arg(short, long, default_value = "results")]
    out_dir: PathBuf,

    /// Output file name without extension (defaults to "<source>_results")
    #[arg(long)]
    stem: Option<String>,

    /// Only show listings within this many km of the office
    #[arg(long)]
    max_distance: Option<f64>,

    /// Skip driving distance lookups
    #[arg(long)]
    no_distance: bool,

    /// Skip posts that do not look like rental listings
    #[arg(long)]
    rentals_only: bool,

    /// Skip listings only open to female or family tenants
    #[arg(long)]
    skip_restricted: bool,

    /// Keep the most recently processed listing first in the output
    #[arg(long)]
    newest_first: bool,
}

impl Cli {
    fn insert_order(&self) -> InsertOrder {
        if self.newest_first {
            InsertOrder::NewestFirst
        } else {
            InsertOrder::OldestFirst
        }
    }

    fn page_url(&self) -> Option<String> {
        match self.source {
            Source::Facebook => self
                .page_url
                .as_deref()
                .map(sources::normalize_facebook_url),
            Source::Telegram if self.page_url.is_none() => {
                self.telegram_message_id.and_then(|message_id| {
                    sources::telegram_link(
                        self.telegram_username.as_deref(),
                        self.telegram_chat_id,
                        message_id,
                    )
                })
            }
            _ => self.page_url.clone(),
        }
    }
}

async fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read input file {:?}", path)),
        None => {
            let mut text = String::new();
            tokio::io::stdin()
                .read_to_string(&mut text)
                .await
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut settings = Settings::from_env().context("Invalid configuration")?;
    if cli.no_distance {
        settings.compute_distance = false;
    }
    if cli.rentals_only {
        settings.rentals_only = true;
    }
    if cli.skip_restricted {
        settings.skip_restricted = true;
    }

    info!("🏠 Listing Scout");
    info!("Source: {}", cli.source.as_str());
    match &settings.openai_api_key {
        Some(_) => info!("Field extraction: {} with regex fallback", settings.openai_model),
        None => info!("Field extraction: regex heuristics (OPENAI_API_KEY not set)"),
    }
    if settings.maps_api_key.is_none() {
        warn!("GOOGLE_MAPS_API_KEY not set, geocoding disabled");
    } else if !settings.distance_enabled() {
        info!("Driving distance disabled");
    }

    let raw = read_input(cli.input.as_ref()).await?;
    let text = if cli.html {
        sources::html_to_text(&raw)
    } else {
        raw
    };

    let pipeline = Pipeline::new(&settings);
    let mut store = ResultStore::new(cli.insert_order());
    let page_url = cli.page_url();
    let stats = pipeline
        .run(&text, cli.source, page_url.as_deref(), &mut store)
        .await;

    let stem = cli
        .stem
        .clone()
        .unwrap_or_else(|| format!("{}_results", cli.source.as_str()));
    store.save(&cli.out_dir, &stem).await?;

    let shown = report::summarize(store.list(), cli.max_distance, true);
    println!("{}", report::render(&shown));

    info!(
        "✅ {} listings saved from {} posts ({} extraction failures)",
        store.len(), stats.posts, stats.extraction_failures
    );

    Ok(())
}
