//! Episode handler: download links and mirror tiers.

use anyhow::Result;
use animirror_core::api::EpisodeDetail;
use animirror_core::mirror::RankedMirror;
use animirror_core::{ApiClient, QualitySelector, ResolveContext};

use super::print_json;

pub async fn run_episode_command(
    client: &ApiClient,
    slug: &str,
    episode: &str,
    json: bool,
    ctx: &ResolveContext,
) -> Result<()> {
    let detail = client.episode(slug, episode, ctx).await?;
    if json {
        return print_json(&detail);
    }
    for line in render_episode(&detail) {
        println!("{line}");
    }
    Ok(())
}

fn render_episode(detail: &EpisodeDetail) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(title) = &detail.judul {
        lines.push(title.clone());
    }

    if !detail.download.is_empty() {
        lines.push("downloads:".to_string());
        for (format, links) in &detail.download {
            for link in links {
                lines.push(format!("  {format:<12} {:<16} {}", link.nama, link.link));
            }
        }
    }

    let ranked = QualitySelector::rank(&detail.mirror);
    if ranked.is_empty() {
        lines.push("mirrors: none".to_string());
    } else {
        lines.push("mirrors (playback order):".to_string());
        lines.extend(ranked.iter().map(render_mirror));
    }
    lines
}

fn render_mirror(mirror: &RankedMirror) -> String {
    format!("  {:<8} {:<16} tier={}", mirror.quality, mirror.name, mirror.tier)
}
