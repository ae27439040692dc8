//! Source fallback orchestration.
//!
//! The [`MetadataResolver`] normalizes the identifier once, then walks its
//! sources in registration order until one of them has a record.

use chrono::Datelike;
use tracing::{debug, info, warn};

use crate::identifier::normalize_isbn;

use super::authors::resolve_authors;
use super::reconcile::{author_refs, reconcile};
use super::{LookupError, LookupOutcome, MetadataSource, SourceStep};

/// What happened when one source was tried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptResult {
    /// The source returned a record.
    Found,
    /// The source had no record.
    NotFound,
    /// The source was not queried.
    Skipped(String),
    /// The source failed.
    Failed(LookupError),
}

/// One entry of a [`LookupReport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceAttempt {
    /// Source display name.
    pub source: String,
    /// Result of the attempt.
    pub result: AttemptResult,
}

/// Outcome plus the per-source trail that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupReport {
    /// Final outcome.
    pub outcome: LookupOutcome,
    /// Sources tried, in order.
    pub attempts: Vec<SourceAttempt>,
}

/// An ordered list of metadata sources with the fallback loop.
///
/// Sources are tried strictly in registration order. The first `Found` wins;
/// `NotFound`, `Skipped` and `Failed` all move on to the next source.
pub struct MetadataResolver {
    sources: Vec<Box<dyn MetadataSource>>,
    current_year: Option<i32>,
}

impl MetadataResolver {
    /// Creates an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            current_year: None,
        }
    }

    /// Pins the year used as the upper bound for publication years.
    ///
    /// Defaults to the current UTC year when unset.
    #[must_use]
    pub fn with_current_year(mut self, year: i32) -> Self {
        self.current_year = Some(year);
        self
    }

    /// Appends a source to the end of the fallback chain.
    #[tracing::instrument(skip(self, source), fields(source_name))]
    pub fn register(&mut self, source: Box<dyn MetadataSource>) {
        tracing::Span::current().record("source_name", source.name());
        debug!(name = source.name(), "Registering metadata source");
        self.sources.push(source);
    }

    /// Returns the number of registered sources.
    #[must_use]
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Returns true if no sources are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Returns source names in fallback order.
    #[must_use]
    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Resolves user-typed identifier text to book metadata.
    ///
    /// Never fails: errors surface as [`LookupOutcome::Error`].
    pub async fn resolve(&self, raw: &str) -> LookupOutcome {
        self.resolve_detailed(raw).await.outcome
    }

    /// Like [`resolve`](Self::resolve), but also reports every source attempt.
    #[tracing::instrument(skip(self), fields(isbn))]
    pub async fn resolve_detailed(&self, raw: &str) -> LookupReport {
        let isbn = normalize_isbn(raw);
        tracing::Span::current().record("isbn", isbn.as_str());

        let mut attempts = Vec::with_capacity(self.sources.len());
        if isbn.is_empty() {
            debug!("Identifier is empty after normalization; nothing to look up");
            return LookupReport {
                outcome: LookupOutcome::NotFound,
                attempts,
            };
        }

        let current_year = self
            .current_year
            .unwrap_or_else(|| chrono::Utc::now().year());

        for source in &self.sources {
            debug!(source = source.name(), "Trying metadata source");

            let result = match source.lookup(&isbn).await {
                SourceStep::Found(record) => {
                    let names = resolve_authors(&author_refs(&record), source.as_ref()).await;
                    let metadata = reconcile(&record, &names, current_year);
                    info!(
                        source = source.name(),
                        title = metadata.title.as_deref().unwrap_or(""),
                        "Metadata found"
                    );
                    attempts.push(SourceAttempt {
                        source: source.name().to_string(),
                        result: AttemptResult::Found,
                    });
                    return LookupReport {
                        outcome: LookupOutcome::Found(metadata),
                        attempts,
                    };
                }
                SourceStep::NotFound => {
                    debug!(source = source.name(), "No record, trying next source");
                    AttemptResult::NotFound
                }
                SourceStep::Skipped(reason) => {
                    debug!(source = source.name(), %reason, "Source skipped, trying next");
                    AttemptResult::Skipped(reason)
                }
                SourceStep::Failed(err) => {
                    warn!(source = source.name(), error = %err, "Source failed, trying next");
                    AttemptResult::Failed(err)
                }
            };
            attempts.push(SourceAttempt {
                source: source.name().to_string(),
                result,
            });
        }

        let outcome = match attempts.last() {
            Some(SourceAttempt {
                result: AttemptResult::Failed(err),
                ..
            }) => LookupOutcome::Error(err.clone()),
            _ => LookupOutcome::NotFound,
        };
        debug!(tried = attempts.len(), "All metadata sources exhausted");
        LookupReport { outcome, attempts }
    }
}

impl std::fmt::Debug for MetadataResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataResolver")
            .field("source_count", &self.sources.len())
            .field("sources", &self.source_names())
            .finish_non_exhaustive()
    }
}

impl Default for MetadataResolver {
    fn default() -> Self {
        Self::new()
    }
}
