//! `safewander` - CLI for the SafeWander travel-review client
//!
//! Browses places and reviews, submits new reviews, and keeps working from
//! the local cache or the built-in samples when the backend is unreachable.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::warn;

use safewander::api::{HttpBackend, HttpSafetyAdvisor, RetryPolicy};
use safewander::cli::{
    describe_draft_error, output, CacheCommand, Cli, Command, ConfigCommand, OutputFormat,
    SubmitCommand,
};
use safewander::fallback::sample_profile;
use safewander::map::to_geojson;
use safewander::model::{PlaceCategory, Provenance, SAFETY_TAGS};
use safewander::service::{SafeWander, SubmitOutcome};
use safewander::upload::{HttpImageStore, ImageFile, ImageStore};
use safewander::{init_logging, Cache, Config};

type Client = SafeWander<HttpBackend, HttpSafetyAdvisor>;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbosity());

    // Config commands must work even when the configuration is broken.
    if let Command::Config(cmd) = cli.command {
        return handle_config(cli.config, cmd);
    }

    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    match cli.command {
        Command::Categories => {
            handle_categories();
            Ok(())
        }
        Command::Profile(cmd) => print_value(cmd.format, &sample_profile(), output::profile_text),
        Command::Cache(cmd) => handle_cache(&config, &cmd),
        command => {
            let client = build_client(&config)?;
            run(&client, &config, command).await
        }
    }
}

fn build_client(config: &Config) -> Result<Client> {
    let retry = RetryPolicy::from(&config.retry);
    let backend = HttpBackend::new(&config.backend, retry.clone())?;
    let advisor = HttpSafetyAdvisor::new(&config.safety, retry)?;

    let cache = if config.cache.enabled {
        match Cache::open(config.cache_path()) {
            Ok(cache) => Some(cache),
            Err(e) => {
                warn!("Cache unavailable, continuing without it: {}", e);
                None
            }
        }
    } else {
        None
    };

    Ok(SafeWander::new(backend, advisor, cache, config.fallback.clone())
        .with_max_age(config.cache_max_age()))
}

async fn run(client: &Client, config: &Config, command: Command) -> Result<()> {
    match command {
        Command::Explore(cmd) => {
            let places = client.explore(&cmd.query, cmd.category).await;
            note(places.provenance, places.degraded);
            match cmd.format {
                OutputFormat::Table => print!("{}", output::places_table(&places.value)),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&places)?),
            }
        }
        Command::Place(cmd) => {
            let details = client.place_details(cmd.id).await?;
            note(details.provenance, details.degraded);
            match cmd.format {
                OutputFormat::Table => print!("{}", output::details_text(&details.value)),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&details)?),
            }
        }
        Command::Latest(cmd) => {
            let latest = client.latest_reviews(cmd.limit).await;
            note(latest.provenance, latest.degraded);
            match cmd.format {
                OutputFormat::Table => print!("{}", output::latest_list(&latest.value)),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&latest)?),
            }
        }
        Command::Map(cmd) => {
            let places = client.map_places(cmd.category).await;
            note(places.provenance, places.degraded);
            let geojson = serde_json::to_string_pretty(&to_geojson(&places.value))?;
            match cmd.output {
                Some(path) => {
                    std::fs::write(&path, geojson)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("Wrote {} places to {}", places.value.len(), path.display());
                }
                None => println!("{geojson}"),
            }
        }
        Command::Submit(cmd) => handle_submit(client, config, &cmd).await?,
        Command::Safety(cmd) => {
            let reviews = client
                .safety_suggestions(&cmd.place_name, &cmd.location)
                .await?;
            if cmd.json {
                println!("{}", serde_json::to_string_pretty(&reviews)?);
            } else if reviews.is_empty() {
                println!("No safety reports found.");
            } else {
                for review in reviews {
                    println!("- {review}");
                }
            }
        }
        Command::Sync => {
            let report = client.flush_outbox().await?;
            println!(
                "Sent {}, failed {}, still queued {}",
                report.sent, report.failed, report.remaining
            );
            if report.parked > 0 {
                println!(
                    "{} queued reviews were rejected too often and are no longer sent.",
                    report.parked
                );
            }
        }
        Command::Status(cmd) => {
            let status = client.status().await?;
            if cmd.json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print!(
                    "{}",
                    output::status_text(&status, client.backend().base_url())
                );
            }
        }
        other => anyhow::bail!("{other:?} does not use the backend"),
    }
    Ok(())
}

async fn handle_submit(client: &Client, config: &Config, cmd: &SubmitCommand) -> Result<()> {
    let draft = cmd
        .to_draft()
        .map_err(|e| anyhow::anyhow!(describe_draft_error(&e)))?;

    let images = cmd
        .images
        .iter()
        .map(|path| ImageFile::read(path).with_context(|| format!("reading {}", path.display())))
        .collect::<Result<Vec<_>>>()?;

    let store = if config.storage_configured() {
        Some(HttpImageStore::from_config(
            &config.storage,
            config.backend.timeout(),
        )?)
    } else {
        None
    };

    let outcome = client
        .submit(
            draft,
            images,
            store.as_ref().map(|s| s as &dyn ImageStore),
        )
        .await?;

    match outcome {
        SubmitOutcome::Submitted(receipt) => match receipt.id {
            Some(id) => println!("Review submitted (id {id})."),
            None => println!("Review submitted."),
        },
        SubmitOutcome::Queued { outbox_id: Some(id) } => {
            println!("Backend unreachable; review queued as #{id}. Run `safewander sync` later.");
        }
        SubmitOutcome::Queued { outbox_id: None } => {
            println!("Backend unreachable; this review is already queued.");
        }
    }
    Ok(())
}

fn handle_categories() {
    println!("Categories");
    for category in PlaceCategory::ALL {
        println!(
            "  {} {:<12} {}",
            category.icon(),
            category.id(),
            category.display_name()
        );
    }
    println!();
    println!("Safety tags");
    for tag in SAFETY_TAGS {
        println!("  {tag}");
    }
}

fn handle_cache(config: &Config, cmd: &CacheCommand) -> Result<()> {
    let cache = Cache::open(config.cache_path())?;
    match cmd {
        CacheCommand::Stats { json } => {
            let stats = cache.stats()?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("Cache: {}", cache.path().display());
                print!("{}", output::cache_stats_text(&stats));
            }
        }
        CacheCommand::Clear => {
            let removed = cache.clear_reviews()?;
            println!("Removed {removed} cached reviews.");
        }
    }
    Ok(())
}

fn handle_config(path: Option<PathBuf>, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_from(path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Backend]");
                println!("  URL:                {}", config.backend.url);
                println!("  Timeout (ms):       {}", config.backend.timeout_ms);
                println!("  Connect (ms):       {}", config.backend.connect_timeout_ms);
                println!();
                println!("[Safety]");
                println!("  API URL:            {}", config.safety.api_url);
                println!("  Timeout (ms):       {}", config.safety.timeout_ms);
                println!();
                println!("[Retry]");
                println!("  Max attempts:       {}", config.retry.max_attempts);
                println!("  Base backoff (ms):  {}", config.retry.base_backoff_ms);
                println!();
                println!("[Storage]");
                println!(
                    "  URL:                {}",
                    config.storage.url.as_deref().unwrap_or("(not set)")
                );
                println!("  Bucket:             {}", config.storage.bucket);
                println!();
                println!("[Cache]");
                println!("  Enabled:            {}", config.cache.enabled);
                println!("  Database path:      {}", config.cache_path().display());
                println!("  Max age (hours):    {}", config.cache.max_age_hours);
                println!();
                println!("[Fallback]");
                println!("  Include samples:    {}", config.fallback.include_samples);
                println!("  Use cache:          {}", config.fallback.use_cache);
            }
        }
        ConfigCommand::Path => {
            println!(
                "{}",
                path.unwrap_or_else(Config::default_config_path).display()
            );
        }
        ConfigCommand::Validate { file } => {
            let path = file.or(path).unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            Config::load_from(Some(path)).context("configuration is invalid")?;
            println!("Configuration is valid.");
        }
    }
    Ok(())
}

fn print_value<T: serde::Serialize>(
    format: OutputFormat,
    value: &T,
    render: impl Fn(&T) -> String,
) -> Result<()> {
    match format {
        OutputFormat::Table => print!("{}", render(value)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

fn note(provenance: Provenance, degraded: bool) {
    if let Some(message) = output::provenance_note(provenance, degraded) {
        eprintln!("{message}");
    }
}
