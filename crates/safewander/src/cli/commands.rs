//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::error::{Error, Result};
use crate::model::{CategoryFilter, ReviewDraft};

/// Explore command arguments.
#[derive(Debug, Args)]
pub struct ExploreCommand {
    /// Search the place name or location
    #[arg(default_value = "")]
    pub query: String,

    /// Only show one category (e.g. cafe, hotel, "Tourist Attraction")
    #[arg(short = 'k', long, default_value = "all", value_parser = parse_category)]
    pub category: CategoryFilter,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Place command arguments.
#[derive(Debug, Args)]
pub struct PlaceCommand {
    /// Review id of the place
    pub id: i64,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Latest command arguments.
#[derive(Debug, Args)]
pub struct LatestCommand {
    /// Maximum number of reviews
    #[arg(short, long, default_value = "3")]
    pub limit: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Map command arguments.
#[derive(Debug, Args)]
pub struct MapCommand {
    /// Only show one category
    #[arg(short = 'k', long, default_value = "all", value_parser = parse_category)]
    pub category: CategoryFilter,

    /// Write the GeoJSON here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Submit command arguments.
#[derive(Debug, Args)]
pub struct SubmitCommand {
    /// Read the review from a JSON file instead of flags
    #[arg(long, value_name = "FILE", conflicts_with_all = [
        "place_name", "category", "location", "rating", "safety", "review",
    ])]
    pub from: Option<PathBuf>,

    /// Name of the place
    #[arg(long)]
    pub place_name: Option<String>,

    /// Category, e.g. "Cafe/Restaurant"
    #[arg(long)]
    pub category: Option<String>,

    /// City, neighborhood or address
    #[arg(long)]
    pub location: Option<String>,

    /// Overall rating, 1 to 5
    #[arg(long)]
    pub rating: Option<u8>,

    /// Safety score, 1 to 10
    #[arg(long)]
    pub safety: Option<u8>,

    /// The review itself (at least 50 characters)
    #[arg(long)]
    pub review: Option<String>,

    /// Safety tag; repeat for several
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,

    /// When you visited (e.g. "Evening")
    #[arg(long)]
    pub visit_time: Option<String>,

    /// Recommend this place to other solo travelers
    #[arg(long)]
    pub recommend: bool,

    /// Photo to attach; repeat for several
    #[arg(short, long = "image", value_name = "PATH")]
    pub images: Vec<PathBuf>,
}

impl SubmitCommand {
    /// Build the draft from `--from` or from the individual flags.
    ///
    /// Missing flags become empty values; validation reports them later.
    ///
    /// # Errors
    ///
    /// Returns an error if the `--from` file cannot be read or parsed.
    pub fn to_draft(&self) -> Result<ReviewDraft> {
        if let Some(path) = &self.from {
            let text = std::fs::read_to_string(path)?;
            let mut draft: ReviewDraft = serde_json::from_str(&text)?;
            for tag in &self.tags {
                if !draft.tags.contains(tag) {
                    draft.toggle_tag(tag);
                }
            }
            draft.would_recommend |= self.recommend;
            return Ok(draft);
        }

        let mut draft = ReviewDraft {
            place_name: self.place_name.clone().unwrap_or_default(),
            category: self.category.clone().unwrap_or_default(),
            location: self.location.clone().unwrap_or_default(),
            rating: self.rating.unwrap_or(0),
            safety_score: self.safety.unwrap_or(0),
            review: self.review.clone().unwrap_or_default(),
            tags: Vec::new(),
            visit_time: self.visit_time.clone(),
            would_recommend: self.recommend,
        };
        for tag in &self.tags {
            if !draft.tags.contains(tag) {
                draft.toggle_tag(tag);
            }
        }
        Ok(draft)
    }
}

/// Safety command arguments.
#[derive(Debug, Args)]
pub struct SafetyCommand {
    /// Name of the place
    #[arg(default_value = "")]
    pub place_name: String,

    /// Where the place is
    #[arg(short, long, default_value = "")]
    pub location: String,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Profile command arguments.
#[derive(Debug, Args)]
pub struct ProfileCommand {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Cache commands.
#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// Show cached review and outbox counts
    Stats {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Drop the cached reviews (queued submissions are kept)
    Clear,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Formatted table
    #[default]
    Table,
    /// JSON output
    Json,
}

fn parse_category(value: &str) -> std::result::Result<CategoryFilter, String> {
    Ok(CategoryFilter::parse(value))
}

/// Turn a `--from` parse failure into a readable message.
#[must_use]
pub fn describe_draft_error(err: &Error) -> String {
    match err {
        Error::Json(e) => format!("review file is not a valid review: {e}"),
        other => other.to_string(),
    }
}
