//! HTTP client for the library backend.

use std::sync::Arc;

use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use crate::http_client::{HttpTimeouts, build_http_client};
use crate::user_agent::default_api_user_agent;

use super::error::ApiError;
use super::models::{
    Book, BookDraft, BookPatch, BookStatus, Credentials, ProfileUpdate, Registration, Stats, User,
};
use super::token::{TokenStore, decode_token_user};

/// Default library backend base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://biblio-home-backend.vercel.app/api";

/// Client for the library backend's `/usuarios` and `/libros` endpoints.
///
/// The session token is read from the injected [`TokenStore`] on every
/// request and sent as `Authorization: Bearer <token>` when present.
pub struct LibraryClient {
    client: Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
}

impl LibraryClient {
    /// Creates a client for `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidBaseUrl`] for a non-http(s) URL and
    /// [`ApiError::ClientBuild`] if the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        tokens: Arc<dyn TokenStore>,
        timeouts: &HttpTimeouts,
    ) -> Result<Self, ApiError> {
        let base_url = validate_base_url(base_url)?;
        let client = build_http_client("library-api", default_api_user_agent(), timeouts)?;
        Ok(Self {
            client,
            base_url,
            tokens,
        })
    }

    /// Returns the normalized base URL (no trailing slash).
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ==================== Session ====================

    /// Logs in and stores the returned token.
    ///
    /// Returns the user from the response body, or from the token claims.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport, status, decoding or token storage failures.
    #[tracing::instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Option<User>, ApiError> {
        let body = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self
            .send(self.request(Method::POST, "/usuarios/login")?.json(&body))
            .await?;
        self.store_session(&response)
    }

    /// Registers an account and stores the returned token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport, status, decoding or token storage failures.
    #[tracing::instrument(skip(self, password), fields(email = %email))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, ApiError> {
        let body = Registration {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self
            .send(self.request(Method::POST, "/usuarios/register")?.json(&body))
            .await?;
        self.store_session(&response)
    }

    /// Forgets the stored token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Token`] if the token cannot be removed.
    pub fn logout(&self) -> Result<(), ApiError> {
        self.tokens.clear()?;
        info!("Logged out");
        Ok(())
    }

    /// Returns true when a token is stored.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Token`] if the token store cannot be read.
    pub fn is_authenticated(&self) -> Result<bool, ApiError> {
        Ok(self.tokens.load()?.is_some())
    }

    /// Returns the user encoded in the stored token, without a network call.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Token`] if the token store cannot be read.
    pub fn current_user(&self) -> Result<Option<User>, ApiError> {
        Ok(self
            .tokens
            .load()?
            .and_then(|token| decode_token_user(&token)))
    }

    // ==================== Profile ====================

    /// Fetches the profile of the logged-in user.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport, status or decoding failures.
    #[tracing::instrument(skip(self))]
    pub async fn profile(&self) -> Result<User, ApiError> {
        let value = self
            .send(self.request(Method::GET, "/usuarios/profile")?)
            .await?;
        unwrap_entity(value, &["usuario", "user"])
            .ok_or_else(|| ApiError::decode("profile response did not contain a user"))
    }

    /// Updates name and/or email of the logged-in user.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport or status failures.
    #[tracing::instrument(skip(self, update))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Option<User>, ApiError> {
        let value = self
            .send(self.request(Method::PUT, "/usuarios/profile")?.json(update))
            .await?;
        Ok(unwrap_entity(value, &["usuario", "user"]))
    }

    /// Deletes the account and forgets the token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport, status or token storage failures.
    #[tracing::instrument(skip(self))]
    pub async fn delete_account(&self) -> Result<(), ApiError> {
        self.send(self.request(Method::DELETE, "/usuarios/profile")?)
            .await?;
        self.tokens.clear()?;
        Ok(())
    }

    // ==================== Books ====================

    /// Lists every book of the logged-in user.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport, status or decoding failures.
    #[tracing::instrument(skip(self))]
    pub async fn list_books(&self) -> Result<Vec<Book>, ApiError> {
        self.fetch_book_list("/libros").await
    }

    /// Fetches one book.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport, status or decoding failures.
    #[tracing::instrument(skip(self))]
    pub async fn get_book(&self, id: i64) -> Result<Book, ApiError> {
        let value = self
            .send(self.request(Method::GET, &format!("/libros/{id}"))?)
            .await?;
        unwrap_entity(value, &["libro", "book"])
            .ok_or_else(|| ApiError::decode(format!("response for book {id} did not contain a book")))
    }

    /// Creates a book. Returns the stored book when the backend echoes it.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport or status failures.
    #[tracing::instrument(skip(self, draft), fields(title = %draft.title))]
    pub async fn create_book(&self, draft: &BookDraft) -> Result<Option<Book>, ApiError> {
        let value = self
            .send(self.request(Method::POST, "/libros")?.json(draft))
            .await?;
        Ok(unwrap_entity(value, &["libro", "book"]))
    }

    /// Applies a partial update. Returns the stored book when the backend echoes it.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport or status failures.
    #[tracing::instrument(skip(self, patch))]
    pub async fn update_book(&self, id: i64, patch: &BookPatch) -> Result<Option<Book>, ApiError> {
        let value = self
            .send(self.request(Method::PUT, &format!("/libros/{id}"))?.json(patch))
            .await?;
        Ok(unwrap_entity(value, &["libro", "book"]))
    }

    /// Deletes a book.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport or status failures.
    #[tracing::instrument(skip(self))]
    pub async fn delete_book(&self, id: i64) -> Result<(), ApiError> {
        self.send(self.request(Method::DELETE, &format!("/libros/{id}"))?)
            .await?;
        Ok(())
    }

    /// Server-side search over title and author.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport, status or decoding failures.
    #[tracing::instrument(skip(self))]
    pub async fn search_books(&self, query: &str) -> Result<Vec<Book>, ApiError> {
        self.fetch_book_list(&format!("/libros/search?q={}", urlencoding::encode(query)))
            .await
    }

    /// Lists books with the given shelf status.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport, status or decoding failures.
    #[tracing::instrument(skip(self))]
    pub async fn books_by_status(&self, status: BookStatus) -> Result<Vec<Book>, ApiError> {
        self.fetch_book_list(&format!("/libros/estado/{}", status.as_wire()))
            .await
    }

    /// Lists read or unread books.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport, status or decoding failures.
    #[tracing::instrument(skip(self))]
    pub async fn books_by_read(&self, read: bool) -> Result<Vec<Book>, ApiError> {
        self.fetch_book_list(&format!("/libros/leido/{read}")).await
    }

    /// Fetches server-side collection counters.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport, status or decoding failures.
    #[tracing::instrument(skip(self))]
    pub async fn stats(&self) -> Result<Stats, ApiError> {
        let mut value = self
            .send(self.request(Method::GET, "/libros/stats/estadisticas")?)
            .await?;
        let stats = take_field(&mut value, "estadisticas")
            .ok_or_else(|| ApiError::decode("response did not contain `estadisticas`"))?;
        decode(stats)
    }

    // ==================== Internals ====================

    async fn fetch_book_list(&self, endpoint: &str) -> Result<Vec<Book>, ApiError> {
        let mut value = self.send(self.request(Method::GET, endpoint)?).await?;
        let books = take_field(&mut value, "libros")
            .ok_or_else(|| ApiError::decode("response did not contain `libros`"))?;
        let books: Vec<Book> = decode(books)?;
        debug!(count = books.len(), "Fetched books");
        Ok(books)
    }

    fn request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder, ApiError> {
        let url = format!("{}{endpoint}", self.base_url);
        let mut builder = self
            .client
            .request(method, url)
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(token) = self.tokens.load()? {
            builder = builder.bearer_auth(token);
        }
        Ok(builder)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Value, ApiError> {
        let response = builder.send().await.map_err(|source| ApiError::Transport {
            base_url: self.base_url.clone(),
            source,
        })?;
        let status = response.status();
        let text = response.text().await.map_err(|source| ApiError::Transport {
            base_url: self.base_url.clone(),
            source,
        })?;

        if !status.is_success() {
            let message = extract_error_message(&text, status.as_u16());
            debug!(status = status.as_u16(), %message, "Library API error");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ApiError::decode(e.to_string()))
    }

    fn store_session(&self, response: &Value) -> Result<Option<User>, ApiError> {
        let token = response
            .get("token")
            .and_then(Value::as_str)
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| ApiError::decode("response did not include a session token"))?;
        self.tokens.save(token)?;

        let user = ["usuario", "user"]
            .iter()
            .find_map(|key| response.get(*key))
            .and_then(|user| serde_json::from_value::<User>(user.clone()).ok())
            .or_else(|| decode_token_user(token));
        info!(user_id = ?user.as_ref().map(|u| u.id), "Session started");
        Ok(user)
    }
}

impl std::fmt::Debug for LibraryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibraryClient")
            .field("base_url", &self.base_url)
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

/// Validates and normalizes a backend base URL.
fn validate_base_url(raw: &str) -> Result<String, ApiError> {
    let invalid = |reason: String| ApiError::InvalidBaseUrl {
        url: raw.to_string(),
        reason,
    };
    let trimmed = raw.trim();
    let parsed = Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", parsed.scheme())));
    }
    if parsed.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

/// Picks a human-readable message out of an error body.
///
/// Order: JSON `error`, JSON `message`, a JSON string body, the raw text,
/// then `HTTP error! status: N`.
fn extract_error_message(body: &str, status: u16) -> String {
    let fallback = || format!("HTTP error! status: {status}");
    match serde_json::from_str::<Value>(body) {
        Ok(value) => ["error", "message"]
            .iter()
            .find_map(|key| value.get(*key).and_then(message_text))
            .or_else(|| value.as_str().map(str::to_string))
            .unwrap_or_else(fallback),
        Err(_) => {
            let text = body.trim();
            if text.is_empty() {
                fallback()
            } else {
                text.to_string()
            }
        }
    }
}

fn message_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Null | Value::Bool(false) | Value::String(_) => None,
        other => Some(other.to_string()),
    }
}

fn take_field(value: &mut Value, key: &str) -> Option<Value> {
    value.as_object_mut().and_then(|object| object.remove(key))
}

/// Decodes an entity sent either bare or wrapped under one of `keys`.
fn unwrap_entity<T: DeserializeOwned>(mut value: Value, keys: &[&str]) -> Option<T> {
    for key in keys {
        if let Some(inner) = take_field(&mut value, key)
            && let Ok(entity) = serde_json::from_value(inner)
        {
            return Some(entity);
        }
    }
    serde_json::from_value(value).ok()
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::decode(e.to_string()))
}
