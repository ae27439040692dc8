//! ISBN metadata resolution pipeline.
//!
//! Turns a user-typed identifier into canonical book metadata by querying
//! bibliographic sources in priority order and stopping at the first hit.
//!
//! # Architecture
//!
//! - [`MetadataSource`] - Async trait each bibliographic source implements
//! - [`AuthorDirectory`] - Async trait resolving opaque author keys to names
//! - [`MetadataResolver`] - Priority-ordered source list with the fallback loop
//! - [`SourceStep`] - Result of one source's lookup
//! - [`SourceRecord`] - Closed set of source-native record shapes
//! - [`reconcile`] - Single extraction function keyed on the record variant
//! - [`GoogleBooksSource`] - Primary source (requires an API key)
//! - [`OpenLibrarySource`] - Secondary source and author directory
//!
//! # Example
//!
//! ```no_run
//! use bookshelf_core::lookup::{build_default_metadata_resolver, LookupConfig, LookupOutcome};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let resolver = build_default_metadata_resolver(&LookupConfig::default());
//! match resolver.resolve("978-0-13-468599-1").await {
//!     LookupOutcome::Found(metadata) => println!("{:?}", metadata.title),
//!     LookupOutcome::NotFound => println!("no book found"),
//!     LookupOutcome::Error(err) => eprintln!("{err}"),
//! }
//! # Ok(())
//! # }
//! ```

mod authors;
mod error;
mod google_books;
mod lenient;
mod open_library;
mod orchestrator;
mod reconcile;

pub use authors::resolve_authors;
pub use error::LookupError;
pub use google_books::{
    DEFAULT_GOOGLE_BOOKS_BASE_URL, GoogleBooksResponse, GoogleBooksSource, GoogleBooksVolume,
    ImageLinks, IndustryIdentifier, VolumeInfo,
};
pub use open_library::{
    DEFAULT_OPEN_LIBRARY_BASE_URL, OPEN_LIBRARY_COVERS_BASE_URL, OpenLibraryAuthor,
    OpenLibraryAuthorRef, OpenLibraryEdition, OpenLibrarySource,
};
pub use orchestrator::{AttemptResult, LookupReport, MetadataResolver, SourceAttempt};
pub use reconcile::{author_refs, extract_year, reconcile};

use async_trait::async_trait;
use serde::Serialize;
use tracing::warn;

use crate::http_client::HttpTimeouts;
use crate::identifier::CanonicalIsbn;

/// Canonical book metadata produced by reconciliation.
///
/// Every field is optional; `None` means the source did not supply it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BookMetadata {
    /// Book title, verbatim from the source.
    pub title: Option<String>,
    /// Distinct author names joined with `", "`.
    pub author: Option<String>,
    /// First publisher listed by the source.
    pub publisher: Option<String>,
    /// Publication year within `[1000, current year]`.
    pub year: Option<i32>,
    /// Cover image URL.
    pub cover_image_url: Option<String>,
}

impl BookMetadata {
    /// Returns true if no field was populated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.publisher.is_none()
            && self.year.is_none()
            && self.cover_image_url.is_none()
    }
}

/// Reference to an author inside a source record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorRef {
    /// Display name supplied inline by the source.
    Name(String),
    /// Opaque key that needs a supplementary lookup (e.g. `/authors/OL1A`).
    Key(String),
}

/// Source-native record returned by a successful adapter lookup.
#[derive(Debug, Clone)]
pub enum SourceRecord {
    /// First volume from a Google Books search.
    GoogleBooks(GoogleBooksVolume),
    /// Open Library edition plus the identifier that located it.
    OpenLibrary {
        /// Edition payload.
        edition: OpenLibraryEdition,
        /// Identifier used for the lookup (needed for the ISBN cover template).
        isbn: CanonicalIsbn,
    },
}

impl SourceRecord {
    /// Returns the name of the source that produced this record.
    #[must_use]
    pub fn source_name(&self) -> &'static str {
        match self {
            Self::GoogleBooks(_) => google_books::SOURCE_NAME,
            Self::OpenLibrary { .. } => open_library::SOURCE_NAME,
        }
    }
}

/// Result of a single source's lookup attempt.
#[derive(Debug, Clone)]
pub enum SourceStep {
    /// The source has a record for the identifier.
    Found(SourceRecord),
    /// The source confirmed it has no such record.
    NotFound,
    /// The source was not queried (e.g. missing credential).
    Skipped(String),
    /// Transport, status or decoding failure.
    Failed(LookupError),
}

/// Final outcome of metadata resolution, consumed by the book form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// Metadata was found and reconciled.
    Found(BookMetadata),
    /// No source had a record (or the identifier was empty).
    NotFound,
    /// The last source attempted failed; carries its diagnostic.
    Error(LookupError),
}

impl LookupOutcome {
    /// Returns the metadata when found.
    #[must_use]
    pub fn metadata(&self) -> Option<&BookMetadata> {
        match self {
            Self::Found(metadata) => Some(metadata),
            Self::NotFound | Self::Error(_) => None,
        }
    }

    /// Returns true for [`LookupOutcome::Found`].
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// Resolves opaque author keys to display names.
#[async_trait]
pub trait AuthorDirectory: Send + Sync {
    /// Returns the author's display name, or `None` on any failure.
    async fn author_name(&self, key: &str) -> Option<String>;
}

/// Trait that all bibliographic sources implement.
///
/// # Object Safety
///
/// This trait uses `async_trait` to support dynamic dispatch via
/// `Box<dyn MetadataSource>`, which the resolver's source list requires.
#[async_trait]
pub trait MetadataSource: AuthorDirectory {
    /// Returns the source's display name (e.g. "Google Books").
    fn name(&self) -> &str;

    /// Looks up a canonical identifier. Never panics; failures are a [`SourceStep`].
    async fn lookup(&self, isbn: &CanonicalIsbn) -> SourceStep;
}

/// Settings for building the default source chain.
#[derive(Debug, Clone)]
pub struct LookupConfig {
    /// Google Books API key; `None` disables that source.
    pub google_books_api_key: Option<String>,
    /// Google Books API base URL.
    pub google_books_base_url: String,
    /// Open Library base URL (edition and author lookups).
    pub open_library_base_url: String,
    /// Per-request timeouts for every source client.
    pub timeouts: HttpTimeouts,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            google_books_api_key: None,
            google_books_base_url: DEFAULT_GOOGLE_BOOKS_BASE_URL.to_string(),
            open_library_base_url: DEFAULT_OPEN_LIBRARY_BASE_URL.to_string(),
            timeouts: HttpTimeouts::default(),
        }
    }
}

/// Builds the default resolver: Google Books first, then Open Library.
///
/// A source whose HTTP client cannot be built is left out with a warning.
#[must_use]
pub fn build_default_metadata_resolver(config: &LookupConfig) -> MetadataResolver {
    let mut resolver = MetadataResolver::new();

    match GoogleBooksSource::with_base_url(
        config.google_books_api_key.clone(),
        &config.google_books_base_url,
        &config.timeouts,
    ) {
        Ok(source) => resolver.register(Box::new(source)),
        Err(error) => warn!(
            error = %error,
            "Google Books source unavailable; continuing with remaining sources"
        ),
    }

    match OpenLibrarySource::with_base_url(&config.open_library_base_url, &config.timeouts) {
        Ok(source) => resolver.register(Box::new(source)),
        Err(error) => warn!(
            error = %error,
            "Open Library source unavailable; continuing with remaining sources"
        ),
    }

    resolver
}
