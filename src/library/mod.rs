//! Personal library backend: accounts, books and collection views.
//!
//! # Architecture
//!
//! - [`LibraryClient`] - Async client for the `/usuarios` and `/libros` endpoints
//! - [`TokenStore`] - Injectable session token storage ([`FileTokenStore`], [`MemoryTokenStore`])
//! - [`decode_token_user`] - Reads user claims from the session token
//! - [`BookFilter`] / [`compute_stats`] - Client-side filtering and counters
//! - [`models`] - Wire types (Spanish field names mapped to English)

mod client;
mod error;
mod filter;
pub mod models;
mod token;

pub use client::{DEFAULT_API_BASE_URL, LibraryClient};
pub use error::{ApiError, TokenStoreError};
pub use filter::{BookFilter, StatusFilter, compute_stats};
pub use models::{
    Book, BookDraft, BookPatch, BookStatus, MediaType, ProfileUpdate, Stats, User,
};
pub use token::{
    FileTokenStore, MemoryTokenStore, TokenStore, decode_token_user, default_token_path,
};
