//! CLI command handlers.

mod catalog;
mod episode;
mod playback;

use anyhow::Result;
use serde::Serialize;

pub use catalog::{
    run_genres_command, run_info_command, run_list_command, run_schedule_command,
    run_search_command,
};
pub use episode::run_episode_command;
pub use playback::{run_decode_command, run_play_command, run_resolve_command};

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
