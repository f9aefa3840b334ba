//! CLI entry point for the animirror tool.

use anyhow::Result;
use animirror_core::api::AnimeQuery;
use animirror_core::{ApiClient, ResolveContext};
use clap::Parser;
use tracing::{debug, warn};

mod app_config;
mod cli;
mod commands;

use app_config::{FileConfig, load_config, resolve_api_config};
use cli::{Args, Command};

/// Conventional exit status for termination by SIGINT.
const INTERRUPTED_EXIT_CODE: i32 = 130;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();
    let loaded = load_config(args.config.as_deref())?;

    init_tracing(&args, &loaded.config);
    debug!(?args, "CLI arguments parsed");
    debug!(
        path = ?loaded.path,
        loaded_from_file = loaded.loaded_from_file,
        "configuration resolved"
    );

    // Decoding is offline; skip client construction entirely
    if let Command::Decode { token } = &args.command {
        return commands::run_decode_command(token, args.json);
    }

    let api_config = resolve_api_config(&args, &loaded.config);
    debug!(
        base_url = %api_config.base_url,
        max_per_window = api_config.max_per_window,
        window_ms = api_config.window.as_millis(),
        max_attempts = api_config.retry.max_attempts(),
        "API client configured"
    );
    let client = ApiClient::new(api_config)?;

    let ctx = ResolveContext::new();
    spawn_interrupt_handler(ctx.clone());

    run_command(&client, &args, &ctx).await
}

async fn run_command(client: &ApiClient, args: &Args, ctx: &ResolveContext) -> Result<()> {
    let json = args.json;
    match &args.command {
        Command::Search { query, page } => {
            commands::run_search_command(client, query, *page, json, ctx).await
        }
        Command::List { genre, kind, page } => {
            let filter = AnimeQuery {
                search: None,
                genre: genre.clone(),
                kind: kind.clone(),
                page: *page,
            };
            commands::run_list_command(client, &filter, json, ctx).await
        }
        Command::Info { slug } => commands::run_info_command(client, slug, json, ctx).await,
        Command::Episode { slug, episode } => {
            commands::run_episode_command(client, slug, episode, json, ctx).await
        }
        Command::Play {
            slug,
            episode,
            mirror,
        } => {
            commands::run_play_command(client, slug, episode, mirror.as_deref(), json, ctx).await
        }
        Command::Resolve { token } => commands::run_resolve_command(client, token, json, ctx).await,
        Command::Decode { token } => commands::run_decode_command(token, json),
        Command::Genres => commands::run_genres_command(client, json, ctx).await,
        Command::Schedule => commands::run_schedule_command(client, json, ctx).await,
    }
}

/// Priority: RUST_LOG env var > quiet flag > verbose flag > config verbosity > info.
fn init_tracing(args: &Args, file: &FileConfig) {
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => file.verbosity.map_or("info", |verbosity| verbosity.filter()),
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// First Ctrl-C cancels in-flight work; a second one exits immediately.
fn spawn_interrupt_handler(ctx: ResolveContext) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        warn!("interrupt received, cancelling in-flight requests");
        ctx.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("second interrupt received, exiting");
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
    });
}
