//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Browse an anime catalog and resolve episodes to playable URLs.
///
/// Every upstream request is throttled by a shared sliding-window rate
/// limiter and retried with backoff on transient failures.
#[derive(Parser, Debug)]
#[command(name = "animirror")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Upstream API base URL
    #[arg(long, env = "ANIMIRROR_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Maximum upstream requests per window (1-100)
    #[arg(long, global = true, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub max_requests: Option<u8>,

    /// Rate limiter window in milliseconds (1-60000)
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..=60000))]
    pub window_ms: Option<u64>,

    /// Path to a config file (defaults to $XDG_CONFIG_HOME/animirror/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print raw JSON instead of human-readable output
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Catalog and playback subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Search anime by title
    Search {
        /// Search text
        query: String,
        /// Result page (1-based)
        #[arg(long)]
        page: Option<u32>,
    },
    /// List anime, optionally filtered
    List {
        /// Genre slug (see `genres`)
        #[arg(long)]
        genre: Option<String>,
        /// Listing type, e.g. ongoing or complete
        #[arg(long = "type")]
        kind: Option<String>,
        /// Result page (1-based)
        #[arg(long)]
        page: Option<u32>,
    },
    /// Show anime details and episode list
    Info {
        /// Anime slug
        slug: String,
    },
    /// Show download links and streaming mirrors for an episode
    Episode {
        /// Anime slug
        slug: String,
        /// Episode number or slug
        episode: String,
    },
    /// Resolve the best available mirror of an episode to a player URL
    Play {
        /// Anime slug
        slug: String,
        /// Episode number or slug
        episode: String,
        /// Use this mirror instead of automatic quality selection
        #[arg(long)]
        mirror: Option<String>,
    },
    /// Resolve a single mirror token to a player URL
    Resolve {
        /// Mirror token
        token: String,
    },
    /// Decode a mirror token offline
    Decode {
        /// Mirror token
        token: String,
    },
    /// List genres
    Genres,
    /// Show the weekly airing schedule
    Schedule,
}
