//! Stats command handler.

use anyhow::Result;
use bookshelf_core::library::{Stats, compute_stats};

use crate::app_config::EffectiveSettings;

use super::{api_failure, library_client};

pub async fn run_stats_command(settings: &EffectiveSettings, local: bool) -> Result<()> {
    let client = library_client(settings)?;
    let stats = if local {
        let books = client
            .list_books()
            .await
            .map_err(|e| api_failure("Listing books", e))?;
        compute_stats(&books)
    } else {
        client
            .stats()
            .await
            .map_err(|e| api_failure("Loading statistics", e))?
    };
    print!("{}", render_stats(&stats));
    Ok(())
}

fn render_stats(stats: &Stats) -> String {
    format!(
        "Total:    {}\nOn shelf: {}\nLent:     {}\nRead:     {}\nUnread:   {}\n",
        stats.total, stats.on_shelf, stats.lent, stats.read, stats.unread
    )
}
