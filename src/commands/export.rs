//! Export command handler: write the collection as CSV.

use std::path::Path;

use anyhow::{Context, Result};
use bookshelf_core::write_csv_export;
use tracing::info;

use crate::app_config::EffectiveSettings;

use super::{api_failure, library_client};

pub async fn run_export_command(settings: &EffectiveSettings, output_dir: &Path) -> Result<()> {
    let client = library_client(settings)?;
    let books = client
        .list_books()
        .await
        .map_err(|e| api_failure("Listing books", e))?;

    let path = write_csv_export(&books, output_dir).context("CSV export failed")?;
    info!(count = books.len(), "Exported {} book(s)", books.len());
    println!("{}", path.display());
    Ok(())
}
