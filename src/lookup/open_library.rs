//! Open Library source - the fallback lookup and author directory.
//!
//! Editions are fetched from `{base}/isbn/{id}.json`. Editions usually list
//! authors by key only, so this source also resolves `/authors/...` keys
//! through `{base}{key}.json`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::http_client::{HttpTimeouts, build_http_client};
use crate::identifier::CanonicalIsbn;
use crate::user_agent::default_lookup_user_agent;

use super::lenient::{lenient, lenient_list};
use super::{AuthorDirectory, LookupError, MetadataSource, SourceRecord, SourceStep};

/// Default Open Library base URL.
pub const DEFAULT_OPEN_LIBRARY_BASE_URL: &str = "https://openlibrary.org";

/// Base URL of the Open Library cover image service.
pub const OPEN_LIBRARY_COVERS_BASE_URL: &str = "https://covers.openlibrary.org";

pub(crate) const SOURCE_NAME: &str = "Open Library";

// ==================== Open Library Response Types ====================

/// An edition record from `/isbn/{id}.json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenLibraryEdition {
    /// Edition key, e.g. `/books/OL7353617M`.
    #[serde(default, deserialize_with = "lenient")]
    pub key: Option<String>,
    /// Title.
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    /// Author references (inline name and/or key).
    #[serde(default, deserialize_with = "lenient_list")]
    pub authors: Option<Vec<OpenLibraryAuthorRef>>,
    /// Publisher names.
    #[serde(default, deserialize_with = "lenient_list")]
    pub publishers: Option<Vec<String>>,
    /// Free-form date such as `"March 2004"` or `"1999"`.
    #[serde(default, deserialize_with = "lenient")]
    pub publish_date: Option<String>,
    /// Cover ids; `-1` marks a missing cover.
    #[serde(default, deserialize_with = "lenient_list")]
    pub covers: Option<Vec<i64>>,
}

/// An entry of an edition's `authors` array.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenLibraryAuthorRef {
    /// Author key, e.g. `/authors/OL1A`.
    #[serde(default, deserialize_with = "lenient")]
    pub key: Option<String>,
    /// Display name, when supplied inline.
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
}

/// An author record from `{key}.json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenLibraryAuthor {
    /// Display name.
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
}

// ==================== OpenLibrarySource ====================

/// Looks up ISBNs and author keys through the Open Library JSON API.
pub struct OpenLibrarySource {
    client: Client,
    base_url: String,
}

impl OpenLibrarySource {
    /// Creates a source against the public Open Library API.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::ClientBuild`] if HTTP client construction fails.
    pub fn new(timeouts: &HttpTimeouts) -> Result<Self, LookupError> {
        Self::with_base_url(DEFAULT_OPEN_LIBRARY_BASE_URL, timeouts)
    }

    /// Creates a source with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::ClientBuild`] if HTTP client construction fails.
    pub fn with_base_url(
        base_url: impl Into<String>,
        timeouts: &HttpTimeouts,
    ) -> Result<Self, LookupError> {
        let client = build_http_client("open-library", default_lookup_user_agent(), timeouts)
            .map_err(|e| LookupError::client_build(SOURCE_NAME, e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

impl std::fmt::Debug for OpenLibrarySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenLibrarySource")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AuthorDirectory for OpenLibrarySource {
    #[tracing::instrument(skip(self), fields(source = "open-library"))]
    async fn author_name(&self, key: &str) -> Option<String> {
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        let separator = if key.starts_with('/') { "" } else { "/" };
        let url = format!("{}{separator}{key}.json", self.base_url);

        let response = match self.client.get(&url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                debug!(error = %e, "Author lookup request failed");
                return None;
            }
        };
        if !response.status().is_success() {
            debug!(status = response.status().as_u16(), "Author lookup returned error status");
            return None;
        }

        match response.json::<OpenLibraryAuthor>().await {
            Ok(author) => author
                .name
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty()),
            Err(e) => {
                debug!(error = %e, "Failed to parse author response JSON");
                None
            }
        }
    }
}

#[async_trait]
impl MetadataSource for OpenLibrarySource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    #[tracing::instrument(skip(self), fields(source = "open-library", isbn = %isbn))]
    async fn lookup(&self, isbn: &CanonicalIsbn) -> SourceStep {
        let url = format!(
            "{}/isbn/{}.json",
            self.base_url,
            urlencoding::encode(&isbn.to_uppercase())
        );

        debug!(api_url = %url, "Calling Open Library API");

        let response = match self.client.get(&url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(error = %e, "Open Library request failed");
                return SourceStep::Failed(LookupError::unavailable(SOURCE_NAME));
            }
        };

        let status = response.status();
        if status.as_u16() == 404 {
            debug!("Open Library has no record");
            return SourceStep::NotFound;
        }
        if !status.is_success() {
            debug!(status = status.as_u16(), "Open Library API error");
            return SourceStep::Failed(LookupError::unexpected_status(
                SOURCE_NAME,
                status.as_u16(),
            ));
        }

        match response.json::<OpenLibraryEdition>().await {
            Ok(edition) => {
                debug!(edition_key = ?edition.key, "Open Library returned an edition");
                SourceStep::Found(SourceRecord::OpenLibrary {
                    edition,
                    isbn: isbn.clone(),
                })
            }
            Err(e) => {
                warn!(error = %e, "Failed to parse Open Library response JSON");
                SourceStep::Failed(LookupError::invalid_response(SOURCE_NAME, e.to_string()))
            }
        }
    }
}
