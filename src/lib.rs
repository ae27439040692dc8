//! Bookshelf Core Library
//!
//! Core functionality for the bookshelf tool: turning a typed ISBN into
//! book metadata and managing a personal collection on the library backend.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`identifier`] - ISBN normalization
//! - [`lookup`] - Metadata resolution across bibliographic sources with fallback
//! - [`library`] - Library backend client, session tokens and collection views
//! - [`export`] - CSV export of a collection
//! - [`http_client`] - Shared HTTP client construction policy

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod export;
pub mod http_client;
pub mod identifier;
pub mod library;
pub mod lookup;
#[cfg(test)]
pub mod test_support;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use export::{ExportError, books_to_csv, export_file_name, write_csv_export};
pub use http_client::{ClientBuildError, HttpTimeouts};
pub use identifier::{CanonicalIsbn, normalize_isbn};
pub use library::{
    ApiError, Book, BookDraft, BookFilter, BookPatch, BookStatus, FileTokenStore, LibraryClient,
    MediaType, MemoryTokenStore, Stats, StatusFilter, TokenStore, TokenStoreError, User,
};
pub use lookup::{
    BookMetadata, LookupConfig, LookupError, LookupOutcome, LookupReport, MetadataResolver,
    MetadataSource, build_default_metadata_resolver,
};
