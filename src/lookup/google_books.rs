//! Google Books source - the primary bibliographic lookup.
//!
//! Queries `{base}/volumes?q=isbn:{id}&key={key}` and hands the first volume
//! to reconciliation. Without an API key the source is skipped outright.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::http_client::{HttpTimeouts, build_http_client};
use crate::identifier::CanonicalIsbn;
use crate::user_agent::default_lookup_user_agent;

use super::lenient::{lenient, lenient_list, lenient_or_default, positional_list};
use super::{AuthorDirectory, LookupError, MetadataSource, SourceRecord, SourceStep};

/// Default Google Books API base URL.
pub const DEFAULT_GOOGLE_BOOKS_BASE_URL: &str = "https://www.googleapis.com/books/v1";

pub(crate) const SOURCE_NAME: &str = "Google Books";

// ==================== Google Books API Response Types ====================

/// Top-level `volumes` search response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleBooksResponse {
    /// Reported hit count (informational only).
    #[serde(default, deserialize_with = "lenient")]
    pub total_items: Option<u64>,
    /// Matching volumes in response order; a malformed entry decodes as an empty volume.
    #[serde(default, deserialize_with = "positional_list")]
    pub items: Option<Vec<GoogleBooksVolume>>,
}

/// One volume from a search response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleBooksVolume {
    /// Google's volume id.
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    /// Bibliographic details.
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub volume_info: VolumeInfo,
}

/// The `volumeInfo` object of a volume.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeInfo {
    /// Title.
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    /// Author display names.
    #[serde(default, deserialize_with = "lenient_list")]
    pub authors: Option<Vec<String>>,
    /// Publisher name.
    #[serde(default, deserialize_with = "lenient")]
    pub publisher: Option<String>,
    /// Free-form date such as `"2018"` or `"2018-01-06"`.
    #[serde(default, deserialize_with = "lenient")]
    pub published_date: Option<String>,
    /// ISBN-10/ISBN-13 identifiers.
    #[serde(default, deserialize_with = "lenient_list")]
    pub industry_identifiers: Option<Vec<IndustryIdentifier>>,
    /// Cover image links in several sizes.
    #[serde(default, deserialize_with = "lenient")]
    pub image_links: Option<ImageLinks>,
}

/// An `industryIdentifiers` entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IndustryIdentifier {
    /// Identifier scheme, e.g. `ISBN_13`.
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub kind: Option<String>,
    /// Identifier value.
    #[serde(default, deserialize_with = "lenient")]
    pub identifier: Option<String>,
}

/// Cover image URLs keyed by size.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageLinks {
    /// Smallest thumbnail.
    #[serde(default, deserialize_with = "lenient")]
    pub small_thumbnail: Option<String>,
    /// Thumbnail.
    #[serde(default, deserialize_with = "lenient")]
    pub thumbnail: Option<String>,
    /// Small.
    #[serde(default, deserialize_with = "lenient")]
    pub small: Option<String>,
    /// Medium.
    #[serde(default, deserialize_with = "lenient")]
    pub medium: Option<String>,
    /// Large.
    #[serde(default, deserialize_with = "lenient")]
    pub large: Option<String>,
    /// Extra large.
    #[serde(default, deserialize_with = "lenient")]
    pub extra_large: Option<String>,
}

impl ImageLinks {
    /// Returns the preferred cover URL.
    ///
    /// Preference: medium, thumbnail, small, large, extraLarge, smallThumbnail.
    /// Blank entries are skipped.
    #[must_use]
    pub fn preferred(&self) -> Option<&str> {
        [
            &self.medium,
            &self.thumbnail,
            &self.small,
            &self.large,
            &self.extra_large,
            &self.small_thumbnail,
        ]
        .into_iter()
        .filter_map(|link| link.as_deref())
        .map(str::trim)
        .find(|link| !link.is_empty())
    }
}

// ==================== GoogleBooksSource ====================

/// Looks up ISBNs through the Google Books `volumes` API.
pub struct GoogleBooksSource {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl GoogleBooksSource {
    /// Creates a source against the public Google Books API.
    ///
    /// A `None` or blank `api_key` makes every lookup return
    /// [`SourceStep::Skipped`] without touching the network.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::ClientBuild`] if HTTP client construction fails.
    pub fn new(api_key: Option<String>, timeouts: &HttpTimeouts) -> Result<Self, LookupError> {
        Self::with_base_url(api_key, DEFAULT_GOOGLE_BOOKS_BASE_URL, timeouts)
    }

    /// Creates a source with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::ClientBuild`] if HTTP client construction fails.
    pub fn with_base_url(
        api_key: Option<String>,
        base_url: impl Into<String>,
        timeouts: &HttpTimeouts,
    ) -> Result<Self, LookupError> {
        let client = build_http_client("google-books", default_lookup_user_agent(), timeouts)
            .map_err(|e| LookupError::client_build(SOURCE_NAME, e.to_string()))?;
        let api_key = api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Returns true when an API key is configured.
    #[must_use]
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

impl std::fmt::Debug for GoogleBooksSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleBooksSource")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AuthorDirectory for GoogleBooksSource {
    /// Google Books supplies author names inline; there are no keys to resolve.
    async fn author_name(&self, _key: &str) -> Option<String> {
        None
    }
}

#[async_trait]
impl MetadataSource for GoogleBooksSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    #[tracing::instrument(skip(self), fields(source = "google-books", isbn = %isbn))]
    async fn lookup(&self, isbn: &CanonicalIsbn) -> SourceStep {
        let Some(api_key) = self.api_key.as_deref() else {
            debug!("Google Books API key not configured; skipping source");
            return SourceStep::Skipped("Google Books API key not configured".to_string());
        };

        let query = format!("isbn:{}", isbn.to_uppercase());
        let url = format!(
            "{}/volumes?q={}&key={}",
            self.base_url,
            urlencoding::encode(&query),
            urlencoding::encode(api_key)
        );

        debug!(base_url = %self.base_url, query = %query, "Calling Google Books API");

        let response = match self.client.get(&url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                // reqwest errors embed the URL, which carries the key
                warn!(error = %e.without_url(), "Google Books request failed");
                return SourceStep::Failed(LookupError::unavailable(SOURCE_NAME));
            }
        };

        let status = response.status();
        if matches!(status.as_u16(), 400 | 404) {
            debug!(status = status.as_u16(), "Google Books has no record");
            return SourceStep::NotFound;
        }
        if !status.is_success() {
            debug!(status = status.as_u16(), "Google Books API error");
            return SourceStep::Failed(LookupError::unexpected_status(
                SOURCE_NAME,
                status.as_u16(),
            ));
        }

        let body = match response.json::<GoogleBooksResponse>().await {
            Ok(parsed) => parsed,
            Err(e) => {
                let e = e.without_url();
                warn!(error = %e, "Failed to parse Google Books response JSON");
                return SourceStep::Failed(LookupError::invalid_response(
                    SOURCE_NAME,
                    e.to_string(),
                ));
            }
        };

        match body.items.and_then(|items| items.into_iter().next()) {
            Some(volume) => {
                debug!(volume_id = ?volume.id, "Google Books returned a volume");
                SourceStep::Found(SourceRecord::GoogleBooks(volume))
            }
            None => {
                debug!("Google Books returned no items");
                SourceStep::NotFound
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::identifier::normalize_isbn;
    use crate::test_support::socket_guard::start_mock_server_or_skip;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, ResponseTemplate};

    fn source(base_url: &str, api_key: Option<&str>) -> GoogleBooksSource {
        GoogleBooksSource::with_base_url(
            api_key.map(str::to_string),
            base_url,
            &HttpTimeouts::new(2, 5),
        )
        .unwrap()
    }

    fn volume_json() -> serde_json::Value {
        serde_json::json!({
            "totalItems": 1,
            "items": [{
                "id": "abc123",
                "volumeInfo": {
                    "title": "Effective Java",
                    "authors": ["Joshua Bloch"],
                    "publisher": "Addison-Wesley",
                    "publishedDate": "2018-01-06",
                    "imageLinks": {
                        "smallThumbnail": "http://img/st.jpg",
                        "thumbnail": "http://img/t.jpg"
                    }
                }
            }]
        })
    }

    // ==================== Serde Deserialization Tests ====================

    #[test]
    fn test_response_deserialize_full() {
        let resp: GoogleBooksResponse = serde_json::from_value(volume_json()).unwrap();
        let items = resp.items.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].volume_info.title.as_deref(), Some("Effective Java"));
        assert_eq!(
            items[0].volume_info.authors.as_deref(),
            Some(&["Joshua Bloch".to_string()][..])
        );
    }

    #[test]
    fn test_response_deserialize_tolerates_wrong_types() {
        let json = serde_json::json!({
            "items": [{
                "volumeInfo": {
                    "title": 12,
                    "authors": "Someone",
                    "publishedDate": ["2001"],
                    "imageLinks": "none"
                }
            }]
        });
        let resp: GoogleBooksResponse = serde_json::from_value(json).unwrap();
        let info = &resp.items.unwrap()[0].volume_info;
        assert!(info.title.is_none());
        assert!(info.authors.is_none());
        assert!(info.published_date.is_none());
        assert!(info.image_links.is_none());
    }

    #[test]
    fn test_response_malformed_first_volume_is_not_replaced_by_second() {
        let json = serde_json::json!({
            "items": [
                {"id": "first", "volumeInfo": "broken"},
                {"id": "second", "volumeInfo": {"title": "Other Book"}}
            ]
        });
        let resp: GoogleBooksResponse = serde_json::from_value(json).unwrap();
        let first = resp.items.unwrap().into_iter().next().unwrap();
        assert_eq!(first.id.as_deref(), Some("first"));
        assert!(first.volume_info.title.is_none());
    }

    #[test]
    fn test_response_non_object_first_item_keeps_position() {
        let json = serde_json::json!({
            "items": [null, {"volumeInfo": {"title": "Other Book"}}]
        });
        let resp: GoogleBooksResponse = serde_json::from_value(json).unwrap();
        let items = resp.items.unwrap();
        assert_eq!(items.len(), 2);
        assert!(items[0].id.is_none());
        assert!(items[0].volume_info.title.is_none());
    }

    #[test]
    fn test_response_deserialize_missing_items() {
        let resp: GoogleBooksResponse =
            serde_json::from_value(serde_json::json!({"totalItems": 0})).unwrap();
        assert!(resp.items.is_none());
    }

    #[test]
    fn test_industry_identifier_type_rename() {
        let id: IndustryIdentifier = serde_json::from_value(
            serde_json::json!({"type": "ISBN_13", "identifier": "9780134685991"}),
        )
        .unwrap();
        assert_eq!(id.kind.as_deref(), Some("ISBN_13"));
    }

    // ==================== Cover Preference Tests ====================

    #[test]
    fn test_image_links_prefers_medium() {
        let links = ImageLinks {
            small_thumbnail: Some("st".into()),
            thumbnail: Some("t".into()),
            medium: Some("m".into()),
            large: Some("l".into()),
            ..ImageLinks::default()
        };
        assert_eq!(links.preferred(), Some("m"));
    }

    #[test]
    fn test_image_links_falls_back_in_order() {
        let links = ImageLinks {
            small_thumbnail: Some("st".into()),
            large: Some("l".into()),
            ..ImageLinks::default()
        };
        assert_eq!(links.preferred(), Some("l"));

        let links = ImageLinks {
            small_thumbnail: Some("st".into()),
            ..ImageLinks::default()
        };
        assert_eq!(links.preferred(), Some("st"));
    }

    #[test]
    fn test_image_links_skips_blank_entries() {
        let links = ImageLinks {
            medium: Some("  ".into()),
            thumbnail: Some("t".into()),
            ..ImageLinks::default()
        };
        assert_eq!(links.preferred(), Some("t"));
        assert_eq!(ImageLinks::default().preferred(), None);
    }

    // ==================== Construction Tests ====================

    #[test]
    fn test_blank_api_key_is_treated_as_missing() {
        let source = source("http://localhost", Some("   "));
        assert!(!source.has_api_key());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let source = source("http://localhost", Some("secret-key"));
        let debug = format!("{source:?}");
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("redacted"));
    }

    // ==================== Lookup Tests ====================

    #[tokio::test]
    async fn test_lookup_without_api_key_skips_without_request() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(volume_json()))
            .expect(0)
            .mount(&mock_server)
            .await;

        let step = source(&mock_server.uri(), None)
            .lookup(&normalize_isbn("9780134685991"))
            .await;
        assert!(matches!(step, SourceStep::Skipped(_)), "got {step:?}");
    }

    #[tokio::test]
    async fn test_lookup_found_sends_isbn_query_and_key() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/volumes"))
            .and(query_param("q", "isbn:9780134685991"))
            .and(query_param("key", "k"))
            .respond_with(ResponseTemplate::new(200).set_body_json(volume_json()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let step = source(&mock_server.uri(), Some("k"))
            .lookup(&normalize_isbn("978-0-13-468599-1"))
            .await;
        match step {
            SourceStep::Found(SourceRecord::GoogleBooks(volume)) => {
                assert_eq!(volume.id.as_deref(), Some("abc123"));
            }
            other => panic!("Expected Found, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_lookup_uses_first_volume_even_when_malformed() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/volumes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [
                    {"volumeInfo": "broken"},
                    {"volumeInfo": {"title": "Other Book"}}
                ]
            })))
            .mount(&mock_server)
            .await;

        let step = source(&mock_server.uri(), Some("k"))
            .lookup(&normalize_isbn("9780134685991"))
            .await;
        match step {
            SourceStep::Found(SourceRecord::GoogleBooks(volume)) => {
                assert!(volume.volume_info.title.is_none());
            }
            other => panic!("Expected Found, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_lookup_empty_items_is_not_found() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/volumes"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"totalItems": 0, "items": []})),
            )
            .mount(&mock_server)
            .await;

        let step = source(&mock_server.uri(), Some("k"))
            .lookup(&normalize_isbn("0000000000"))
            .await;
        assert!(matches!(step, SourceStep::NotFound), "got {step:?}");
    }

    #[tokio::test]
    async fn test_lookup_404_and_400_are_not_found() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(query_param("q", "isbn:1"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("q", "isbn:2"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&mock_server)
            .await;

        let source = source(&mock_server.uri(), Some("k"));
        assert!(matches!(
            source.lookup(&normalize_isbn("1")).await,
            SourceStep::NotFound
        ));
        assert!(matches!(
            source.lookup(&normalize_isbn("2")).await,
            SourceStep::NotFound
        ));
    }

    #[tokio::test]
    async fn test_lookup_server_error_is_failed() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let step = source(&mock_server.uri(), Some("k"))
            .lookup(&normalize_isbn("9780134685991"))
            .await;
        match step {
            SourceStep::Failed(LookupError::UnexpectedStatus { status, .. }) => {
                assert_eq!(status, 503);
            }
            other => panic!("Expected Failed, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_lookup_malformed_body_is_failed() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&mock_server)
            .await;

        let step = source(&mock_server.uri(), Some("k"))
            .lookup(&normalize_isbn("9780134685991"))
            .await;
        assert!(
            matches!(step, SourceStep::Failed(LookupError::InvalidResponse { .. })),
            "got {step:?}"
        );
    }

    #[tokio::test]
    async fn test_lookup_upper_cases_check_character() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(query_param("q", "isbn:080442957X"))
            .respond_with(ResponseTemplate::new(200).set_body_json(volume_json()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let step = source(&mock_server.uri(), Some("k"))
            .lookup(&normalize_isbn("0-8044-2957-x"))
            .await;
        assert!(matches!(step, SourceStep::Found(_)), "got {step:?}");
    }
}
