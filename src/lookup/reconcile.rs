//! Reconciliation of source-native records into [`BookMetadata`].
//!
//! One extraction function per record variant, dispatched on the
//! [`SourceRecord`] tag. Nothing here can fail: missing or malformed input
//! just leaves the corresponding field absent.

use std::sync::LazyLock;

use regex::Regex;

use super::open_library::OPEN_LIBRARY_COVERS_BASE_URL;
use super::{AuthorRef, BookMetadata, GoogleBooksVolume, OpenLibraryEdition, SourceRecord};
use crate::identifier::CanonicalIsbn;

/// Earliest publication year accepted.
const MIN_YEAR: i32 = 1000;

/// First run of four ASCII digits in a free-form date.
#[allow(clippy::expect_used)]
static YEAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9]{4}").expect("year regex is valid") // Static pattern, safe to panic
});

/// Extracts a plausible publication year from a free-form date string.
///
/// Takes the leftmost run of four ASCII digits and accepts it only within
/// `[1000, current_year]`.
///
/// ```
/// use bookshelf_core::lookup::extract_year;
///
/// assert_eq!(extract_year("1999-05", 2025), Some(1999));
/// assert_eq!(extract_year("March 2004", 2025), Some(2004));
/// assert_eq!(extract_year("abcd", 2025), None);
/// assert_eq!(extract_year("3021", 2025), None);
/// ```
#[must_use]
pub fn extract_year(date: &str, current_year: i32) -> Option<i32> {
    let year: i32 = YEAR_PATTERN.find(date)?.as_str().parse().ok()?;
    (MIN_YEAR..=current_year).contains(&year).then_some(year)
}

/// Returns the author references carried by a record, in source order.
///
/// Google Books lists names inline. Open Library entries prefer an inline
/// `name` and fall back to the `key`; entries with neither are skipped.
#[must_use]
pub fn author_refs(record: &SourceRecord) -> Vec<AuthorRef> {
    match record {
        SourceRecord::GoogleBooks(volume) => volume
            .volume_info
            .authors
            .iter()
            .flatten()
            .filter_map(|name| non_blank(Some(name)))
            .map(AuthorRef::Name)
            .collect(),
        SourceRecord::OpenLibrary { edition, .. } => edition
            .authors
            .iter()
            .flatten()
            .filter_map(|author| {
                non_blank(author.name.as_ref())
                    .map(AuthorRef::Name)
                    .or_else(|| non_blank(author.key.as_ref()).map(AuthorRef::Key))
            })
            .collect(),
    }
}

/// Converts a source record plus resolved author names into canonical metadata.
#[must_use]
pub fn reconcile(record: &SourceRecord, authors: &[String], current_year: i32) -> BookMetadata {
    let author = (!authors.is_empty()).then(|| authors.join(", "));
    match record {
        SourceRecord::GoogleBooks(volume) => BookMetadata {
            author,
            ..from_google_books(volume, current_year)
        },
        SourceRecord::OpenLibrary { edition, isbn } => BookMetadata {
            author,
            ..from_open_library(edition, isbn, current_year)
        },
    }
}

fn from_google_books(volume: &GoogleBooksVolume, current_year: i32) -> BookMetadata {
    let info = &volume.volume_info;
    BookMetadata {
        title: non_blank(info.title.as_ref()),
        author: None,
        publisher: non_blank(info.publisher.as_ref()),
        year: info
            .published_date
            .as_deref()
            .and_then(|date| extract_year(date, current_year)),
        cover_image_url: info
            .image_links
            .as_ref()
            .and_then(|links| links.preferred())
            .map(str::to_string),
    }
}

fn from_open_library(
    edition: &OpenLibraryEdition,
    isbn: &CanonicalIsbn,
    current_year: i32,
) -> BookMetadata {
    BookMetadata {
        title: non_blank(edition.title.as_ref()),
        author: None,
        publisher: edition
            .publishers
            .as_ref()
            .and_then(|publishers| publishers.first())
            .and_then(|publisher| non_blank(Some(publisher))),
        year: edition
            .publish_date
            .as_deref()
            .and_then(|date| extract_year(date, current_year)),
        cover_image_url: open_library_cover_url(edition, isbn),
    }
}

/// Cover URL from the first positive cover id, else the edition key, else the ISBN.
fn open_library_cover_url(edition: &OpenLibraryEdition, isbn: &CanonicalIsbn) -> Option<String> {
    if let Some(id) = edition.covers.iter().flatten().find(|id| **id > 0) {
        return Some(format!("{OPEN_LIBRARY_COVERS_BASE_URL}/b/id/{id}-M.jpg"));
    }

    let olid = edition.key.as_deref().map(|key| {
        let key = key.trim();
        key.strip_prefix("/books/")
            .or_else(|| key.strip_prefix("/works/"))
            .unwrap_or(key)
    });
    if let Some(olid) = olid.filter(|olid| !olid.is_empty()) {
        return Some(format!("{OPEN_LIBRARY_COVERS_BASE_URL}/b/olid/{olid}-M.jpg"));
    }

    (!isbn.is_empty())
        .then(|| format!("{OPEN_LIBRARY_COVERS_BASE_URL}/b/isbn/{}-M.jpg", isbn.to_uppercase()))
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
