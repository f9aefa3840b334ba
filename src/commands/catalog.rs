//! Catalog browsing handlers: search, list, info, genres, schedule.

use anyhow::Result;
use animirror_core::api::{Anime, AnimeInfo, AnimeQuery};
use animirror_core::{ApiClient, ResolveContext};

use super::print_json;

pub async fn run_search_command(
    client: &ApiClient,
    query: &str,
    page: Option<u32>,
    json: bool,
    ctx: &ResolveContext,
) -> Result<()> {
    let mut filter = AnimeQuery::search(query);
    filter.page = page;
    let results = client.list_anime(&filter, ctx).await?;
    print_anime_list(&results, json)
}

pub async fn run_list_command(
    client: &ApiClient,
    filter: &AnimeQuery,
    json: bool,
    ctx: &ResolveContext,
) -> Result<()> {
    let results = client.list_anime(filter, ctx).await?;
    print_anime_list(&results, json)
}

pub async fn run_info_command(
    client: &ApiClient,
    slug: &str,
    json: bool,
    ctx: &ResolveContext,
) -> Result<()> {
    let info = client.anime_info(slug, ctx).await?;
    if json {
        return print_json(&info);
    }
    print_info(&info);
    Ok(())
}

pub async fn run_genres_command(client: &ApiClient, json: bool, ctx: &ResolveContext) -> Result<()> {
    let genres = client.genres(ctx).await?;
    if json {
        return print_json(&genres);
    }
    for genre in &genres {
        println!("{:<24} {}", genre.slug, genre.judul);
    }
    Ok(())
}

pub async fn run_schedule_command(
    client: &ApiClient,
    json: bool,
    ctx: &ResolveContext,
) -> Result<()> {
    let days = client.schedule(ctx).await?;
    if json {
        return print_json(&days);
    }
    for day in &days {
        println!("{}", day.hari);
        for anime in &day.anime {
            println!("  {:<40} {}", anime.slug, anime.judul);
        }
    }
    Ok(())
}

fn print_anime_list(results: &[Anime], json: bool) -> Result<()> {
    if json {
        return print_json(results);
    }
    if results.is_empty() {
        println!("No anime found.");
        return Ok(());
    }
    for anime in results {
        println!("{}", render_anime_row(anime));
    }
    Ok(())
}

fn render_anime_row(anime: &Anime) -> String {
    let mut row = format!("{:<40} {}", anime.slug, anime.judul);
    if let Some(eps) = anime.eps.first() {
        row.push_str(&format!(" [{eps}]"));
    }
    if let Some(rate) = anime.rate.iter().find(|rate| !rate.trim().is_empty()) {
        row.push_str(&format!(" ({rate})"));
    }
    row
}

fn print_info(info: &AnimeInfo) {
    println!("{}", info.judul);
    if !info.nama_japan.is_empty() {
        println!("  japanese: {}", info.nama_japan);
    }
    for (label, value) in [
        ("score", &info.skor),
        ("type", &info.tipe),
        ("status", &info.status),
        ("episodes", &info.total_episode),
        ("duration", &info.durasi),
        ("released", &info.rilis),
        ("studio", &info.studio),
        ("genres", &info.genre),
    ] {
        if !value.is_empty() {
            println!("  {label}: {value}");
        }
    }
    if let Some(batch) = &info.batch {
        println!("  batch: {}", batch.slug);
    }
    if let Some(complete) = &info.lengkap {
        println!("  complete: {}", complete.slug);
    }
    println!();
    for episode in &info.episodes {
        println!("  {:<48} {} {}", episode.slug, episode.judul, episode.tanggal);
    }
}
