//! Command-line interface for safewander.
//!
//! This module provides the CLI structure and the text rendering used by
//! the `safewander` binary.

mod commands;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::logging::Verbosity;

pub use commands::{
    describe_draft_error, CacheCommand, ConfigCommand, ExploreCommand, LatestCommand,
    MapCommand, OutputFormat, PlaceCommand, ProfileCommand, SafetyCommand, StatusCommand,
    SubmitCommand,
};

/// safewander - Safety-first travel reviews for solo travelers
///
/// Browse places with community safety scores, read and submit reviews, and
/// keep working from cached or sample data when the backend is down.
#[derive(Debug, Parser)]
#[command(name = "safewander")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Browse and search places
    Explore(ExploreCommand),

    /// Show one place with its reviews
    Place(PlaceCommand),

    /// Show the newest reviews
    Latest(LatestCommand),

    /// Export places as GeoJSON map markers
    Map(MapCommand),

    /// Submit a review
    Submit(Box<SubmitCommand>),

    /// Fetch AI-mined safety reports for a place
    Safety(SafetyCommand),

    /// Send reviews queued while the backend was unreachable
    Sync,

    /// Show the traveler profile
    Profile(ProfileCommand),

    /// List place categories and safety tags
    Categories,

    /// Show backend, cache and outbox status
    Status(StatusCommand),

    /// Inspect or clear the local cache
    #[command(subcommand)]
    Cache(CacheCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}
