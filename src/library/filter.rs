//! Client-side collection views: filtering and counters.

use std::fmt;
use std::str::FromStr;

use super::models::{Book, BookStatus, MediaType, Stats};

/// Status tab of the collection view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    /// Every book.
    #[default]
    All,
    /// Only books on the shelf.
    OnShelf,
    /// Only lent books.
    Lent,
    /// Only books already read.
    Read,
}

impl StatusFilter {
    fn matches(self, book: &Book) -> bool {
        match self {
            Self::All => true,
            Self::OnShelf => book.status == BookStatus::OnShelf,
            Self::Lent => book.status == BookStatus::Lent,
            Self::Read => book.read,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::All => "all",
            Self::OnShelf => "on-shelf",
            Self::Lent => "lent",
            Self::Read => "read",
        })
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "all" | "todos" => Ok(Self::All),
            "on_shelf" | "shelf" | "en_estante" => Ok(Self::OnShelf),
            "lent" | "prestado" => Ok(Self::Lent),
            "read" | "leido" => Ok(Self::Read),
            other => Err(format!(
                "unknown status filter '{other}' (expected all, on-shelf, lent or read)"
            )),
        }
    }
}

/// Search term, status tab and media type applied to a book list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    /// Case-insensitive substring matched against title and author.
    pub search: Option<String>,
    /// Status tab.
    pub status: StatusFilter,
    /// Media type; untyped books count as [`MediaType::Book`].
    pub media_type: Option<MediaType>,
}

impl BookFilter {
    /// Returns true if `book` passes every criterion.
    #[must_use]
    pub fn matches(&self, book: &Book) -> bool {
        let search_ok = match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                let term = term.to_lowercase();
                book.title.to_lowercase().contains(&term)
                    || book.author.to_lowercase().contains(&term)
            }
            _ => true,
        };
        search_ok
            && self.status.matches(book)
            && self
                .media_type
                .is_none_or(|wanted| book.effective_media_type() == wanted)
    }

    /// Returns the books that pass the filter, in input order.
    #[must_use]
    pub fn apply<'a>(&self, books: &'a [Book]) -> Vec<&'a Book> {
        books.iter().filter(|book| self.matches(book)).collect()
    }
}

/// Computes collection counters locally.
#[must_use]
pub fn compute_stats(books: &[Book]) -> Stats {
    let count = |pred: fn(&Book) -> bool| books.iter().filter(|b| pred(b)).count() as u64;
    let total = books.len() as u64;
    let read = count(|b| b.read);
    Stats {
        total,
        lent: count(|b| b.status == BookStatus::Lent),
        on_shelf: count(|b| b.status == BookStatus::OnShelf),
        read,
        unread: total - read,
    }
}
