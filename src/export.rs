//! CSV export of a book collection.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use thiserror::Error;
use tracing::info;

use crate::library::Book;

/// Column headers of the exported file.
pub const CSV_HEADERS: [&str; 10] = [
    "ID",
    "Title",
    "Author",
    "Publisher",
    "Publication Year",
    "Status",
    "Read",
    "ISBN",
    "Cover URL",
    "Registered",
];

/// Errors raised while exporting.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV encoding failed
    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    /// The export file could not be written
    #[error("cannot write export file {}: {source}\n  Suggestion: Check that the output directory exists and is writable", .path.display())]
    Io {
        /// Target path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Renders books as CSV text with a header row.
///
/// # Errors
///
/// Returns [`ExportError::Csv`] if a record cannot be encoded.
pub fn books_to_csv(books: &[Book]) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(CSV_HEADERS)?;

    for book in books {
        writer.write_record([
            book.id.to_string(),
            book.title.clone(),
            book.author.clone(),
            book.publisher.clone().unwrap_or_default(),
            book.year.map(|y| y.to_string()).unwrap_or_default(),
            book.status.label().to_string(),
            if book.read { "Yes" } else { "No" }.to_string(),
            book.isbn.clone().unwrap_or_default(),
            book.cover_url.clone().unwrap_or_default(),
            format_registered(&book.registered_at),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Csv(csv::Error::from(e.into_error())))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Returns `library_YYYY-MM-DD.csv` for the given date.
#[must_use]
pub fn export_file_name(date: NaiveDate) -> String {
    format!("library_{}.csv", date.format("%Y-%m-%d"))
}

/// Writes the export into `dir`, named after today's local date.
///
/// # Errors
///
/// Returns [`ExportError`] if encoding or writing fails.
pub fn write_csv_export(books: &[Book], dir: &Path) -> Result<PathBuf, ExportError> {
    write_csv_export_on(books, dir, Local::now().date_naive())
}

/// Writes the export into `dir`, named after `date`.
///
/// # Errors
///
/// Returns [`ExportError`] if encoding or writing fails.
pub fn write_csv_export_on(
    books: &[Book],
    dir: &Path,
    date: NaiveDate,
) -> Result<PathBuf, ExportError> {
    let csv = books_to_csv(books)?;
    let path = dir.join(export_file_name(date));
    std::fs::write(&path, csv).map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;
    info!(path = %path.display(), count = books.len(), "Exported books");
    Ok(path)
}

/// Formats a backend timestamp as `YYYY-MM-DD`, or returns it unchanged.
fn format_registered(raw: &str) -> String {
    let raw = raw.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return timestamp.date_naive().format("%Y-%m-%d").to_string();
    }
    if let Ok(timestamp) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return timestamp.date().format("%Y-%m-%d").to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format("%Y-%m-%d").to_string();
    }
    raw.to_string()
}
