//! Playback handlers: play, resolve, decode.

use std::sync::Arc;

use anyhow::{Context, Result};
use animirror_core::mirror::decode_token;
use animirror_core::{
    ApiClient, MirrorResolver, PlaybackResolver, QualitySelector, ResolveContext, SelectedMirror,
};
use serde::Serialize;
use tracing::info;

use super::print_json;

#[derive(Serialize)]
struct PlayOutput<'a> {
    url: &'a str,
    mirror: &'a str,
    quality: &'a str,
}

pub async fn run_play_command(
    client: &ApiClient,
    slug: &str,
    episode: &str,
    mirror: Option<&str>,
    json: bool,
    ctx: &ResolveContext,
) -> Result<()> {
    let detail = client.episode(slug, episode, ctx).await?;
    info!(
        mirrors = detail.mirror.mirror_count(),
        tiers = detail.mirror.0.len(),
        "episode loaded"
    );

    let selector = QualitySelector::new(Arc::new(MirrorResolver::new(client.clone())));
    let selected = match mirror {
        Some(name) => selector.select_named(&detail.mirror, name, ctx).await?,
        None => selector.select(&detail.mirror, ctx).await?,
    };

    print_selected(&selected, json)
}

pub async fn run_resolve_command(
    client: &ApiClient,
    token: &str,
    json: bool,
    ctx: &ResolveContext,
) -> Result<()> {
    let resolver = MirrorResolver::new(client.clone());
    let playback = resolver.resolve(token, ctx).await?;
    if json {
        return print_json(&playback);
    }
    println!("{}", playback.url);
    Ok(())
}

/// Decodes a token without touching the network.
pub fn run_decode_command(token: &str, json: bool) -> Result<()> {
    let payload = decode_token(token).context("Failed to decode mirror token")?;
    if json {
        return print_json(&payload);
    }
    println!("id = {}", payload.id);
    println!("index = {}", payload.i);
    println!("quality = {}", payload.q);
    println!("priority = {}", payload.quality().priority());
    Ok(())
}

fn print_selected(selected: &SelectedMirror, json: bool) -> Result<()> {
    if json {
        return print_json(&PlayOutput {
            url: &selected.url,
            mirror: &selected.name,
            quality: selected.quality.as_str(),
        });
    }
    println!("{} ({}) {}", selected.name, selected.quality, selected.url);
    Ok(())
}
