//! Wire types for the library backend.
//!
//! The backend speaks JSON with Spanish field names; every type here maps
//! them onto English Rust names with `#[serde(rename)]`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::lookup::BookMetadata;

/// An account on the library backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User id.
    pub id: i64,
    /// Display name.
    #[serde(rename = "nombre", default)]
    pub name: String,
    /// Login email.
    #[serde(default)]
    pub email: String,
    /// Account creation timestamp, as sent by the backend.
    #[serde(rename = "fecha_creacion", default)]
    pub created_at: Option<String>,
}

/// Where a physical copy currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BookStatus {
    /// On the owner's shelf.
    #[default]
    #[serde(rename = "en_estante")]
    OnShelf,
    /// Lent to someone.
    #[serde(rename = "prestado")]
    Lent,
    /// Anything else.
    #[serde(rename = "otro")]
    Other,
}

impl BookStatus {
    /// All statuses in display order.
    pub const ALL: [Self; 3] = [Self::OnShelf, Self::Lent, Self::Other];

    /// Returns the backend wire name (`en_estante`, `prestado`, `otro`).
    #[must_use]
    pub fn as_wire(self) -> &'static str {
        match self {
            Self::OnShelf => "en_estante",
            Self::Lent => "prestado",
            Self::Other => "otro",
        }
    }

    /// Returns the human-readable label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::OnShelf => "On shelf",
            Self::Lent => "Lent",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BookStatus {
    type Err = String;

    /// Accepts wire names and English names, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "en_estante" | "on_shelf" | "shelf" => Ok(Self::OnShelf),
            "prestado" | "lent" => Ok(Self::Lent),
            "otro" | "other" => Ok(Self::Other),
            other => Err(format!(
                "unknown status '{other}' (expected on-shelf, lent or other)"
            )),
        }
    }
}

/// Kind of item in the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MediaType {
    /// Printed book.
    #[default]
    #[serde(rename = "libro")]
    Book,
    /// Comic.
    #[serde(rename = "comic")]
    Comic,
    /// Manga.
    #[serde(rename = "manga")]
    Manga,
    /// E-book or other digital copy.
    #[serde(rename = "digital")]
    Digital,
    /// Magazine.
    #[serde(rename = "revista")]
    Magazine,
    /// Audiobook.
    #[serde(rename = "audiolibro")]
    Audiobook,
    /// Anything else.
    #[serde(rename = "otro")]
    Other,
}

impl MediaType {
    /// All media types in display order.
    pub const ALL: [Self; 7] = [
        Self::Book,
        Self::Comic,
        Self::Manga,
        Self::Digital,
        Self::Magazine,
        Self::Audiobook,
        Self::Other,
    ];

    /// Returns the human-readable label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Book => "Book",
            Self::Comic => "Comic",
            Self::Manga => "Manga",
            Self::Digital => "Digital",
            Self::Magazine => "Magazine",
            Self::Audiobook => "Audiobook",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "libro" | "book" => Ok(Self::Book),
            "comic" => Ok(Self::Comic),
            "manga" => Ok(Self::Manga),
            "digital" | "ebook" => Ok(Self::Digital),
            "revista" | "magazine" => Ok(Self::Magazine),
            "audiolibro" | "audiobook" => Ok(Self::Audiobook),
            "otro" | "other" => Ok(Self::Other),
            other => Err(format!(
                "unknown type '{other}' (expected book, comic, manga, digital, magazine, audiobook or other)"
            )),
        }
    }
}

/// A book in the user's collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Book id.
    pub id: i64,
    /// Owning user id.
    #[serde(rename = "usuario_id", default)]
    pub user_id: i64,
    /// Title.
    #[serde(rename = "titulo")]
    pub title: String,
    /// Author(s).
    #[serde(rename = "autor", default)]
    pub author: String,
    /// Publisher.
    #[serde(rename = "editorial", default)]
    pub publisher: Option<String>,
    /// Publication year.
    #[serde(rename = "anio_publicacion", default)]
    pub year: Option<i32>,
    /// Shelf status.
    #[serde(rename = "estado", default)]
    pub status: BookStatus,
    /// Whether the owner has read it.
    #[serde(rename = "leido", default, deserialize_with = "bool_or_int")]
    pub read: bool,
    /// ISBN as entered.
    #[serde(default)]
    pub isbn: Option<String>,
    /// Cover image URL.
    #[serde(rename = "portada_url", default)]
    pub cover_url: Option<String>,
    /// Media type; `None` means a plain book.
    #[serde(rename = "tipo", default)]
    pub media_type: Option<MediaType>,
    /// Registration timestamp, as sent by the backend.
    #[serde(rename = "fecha_registro", default)]
    pub registered_at: String,
}

impl Book {
    /// Returns the media type, treating an untyped book as [`MediaType::Book`].
    #[must_use]
    pub fn effective_media_type(&self) -> MediaType {
        self.media_type.unwrap_or_default()
    }
}

/// Editable fields of a book, as submitted on create.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDraft {
    /// Title.
    #[serde(rename = "titulo")]
    pub title: String,
    /// Author(s).
    #[serde(rename = "autor")]
    pub author: String,
    /// Publisher.
    #[serde(rename = "editorial", skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    /// Publication year.
    #[serde(rename = "anio_publicacion", skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    /// Shelf status.
    #[serde(rename = "estado")]
    pub status: BookStatus,
    /// Read flag.
    #[serde(rename = "leido")]
    pub read: bool,
    /// ISBN.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    /// Cover image URL.
    #[serde(rename = "portada_url", skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    /// Media type.
    #[serde(rename = "tipo", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,
}

impl BookDraft {
    /// Merges looked-up metadata into the draft.
    ///
    /// Only fields the metadata provides are overwritten; everything else
    /// (including anything the user already typed for missing fields) is kept.
    pub fn apply_metadata(&mut self, metadata: &BookMetadata) {
        if let Some(title) = &metadata.title {
            self.title.clone_from(title);
        }
        if let Some(author) = &metadata.author {
            self.author.clone_from(author);
        }
        if metadata.publisher.is_some() {
            self.publisher.clone_from(&metadata.publisher);
        }
        if metadata.year.is_some() {
            self.year = metadata.year;
        }
        if metadata.cover_image_url.is_some() {
            self.cover_url.clone_from(&metadata.cover_image_url);
        }
    }

    /// Returns the names of required fields that are blank.
    #[must_use]
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.author.trim().is_empty() {
            missing.push("author");
        }
        missing
    }
}

impl From<&Book> for BookDraft {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            publisher: book.publisher.clone(),
            year: book.year,
            status: book.status,
            read: book.read,
            isbn: book.isbn.clone(),
            cover_url: book.cover_url.clone(),
            media_type: book.media_type,
        }
    }
}

/// Partial update; only `Some` fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BookPatch {
    /// Title.
    #[serde(rename = "titulo", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Author(s).
    #[serde(rename = "autor", skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Publisher.
    #[serde(rename = "editorial", skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    /// Publication year.
    #[serde(rename = "anio_publicacion", skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    /// Shelf status.
    #[serde(rename = "estado", skip_serializing_if = "Option::is_none")]
    pub status: Option<BookStatus>,
    /// Read flag.
    #[serde(rename = "leido", skip_serializing_if = "Option::is_none")]
    pub read: Option<bool>,
    /// ISBN.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    /// Cover image URL.
    #[serde(rename = "portada_url", skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    /// Media type.
    #[serde(rename = "tipo", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,
}

impl BookPatch {
    /// Returns true if the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Collection counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Total books.
    #[serde(rename = "total_libros", default, deserialize_with = "count")]
    pub total: u64,
    /// Books currently lent.
    #[serde(rename = "libros_prestados", default, deserialize_with = "count")]
    pub lent: u64,
    /// Books on the shelf.
    #[serde(rename = "libros_en_estante", default, deserialize_with = "count")]
    pub on_shelf: u64,
    /// Books read.
    #[serde(rename = "libros_leidos", default, deserialize_with = "count")]
    pub read: u64,
    /// Books not yet read.
    #[serde(rename = "libros_no_leidos", default, deserialize_with = "count")]
    pub unread: u64,
}

/// Profile update body; only `Some` fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    /// New display name.
    #[serde(rename = "nombre", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Login request body.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    /// Email.
    pub email: String,
    /// Password.
    pub password: String,
}

/// Registration request body.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    /// Display name.
    #[serde(rename = "nombre")]
    pub name: String,
    /// Email.
    pub email: String,
    /// Password.
    pub password: String,
}

// Some backends send booleans as 0/1.
fn bool_or_int<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Bool(b) => Ok(b),
        Value::Number(n) => Ok(n.as_i64().is_some_and(|n| n != 0)),
        Value::String(s) => Ok(matches!(s.as_str(), "1" | "true")),
        _ => Ok(false),
    }
}

// Aggregate counts may arrive as numeric strings.
fn count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => Ok(n.as_u64().unwrap_or(0)),
        Value::String(s) => Ok(s.trim().parse().unwrap_or(0)),
        _ => Ok(0),
    }
}
