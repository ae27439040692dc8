//! Lookup command handler: resolve an ISBN to metadata and print it.

use std::io::{self, IsTerminal};
use std::time::Duration;

use anyhow::{Result, bail};
use bookshelf_core::lookup::{AttemptResult, LookupReport};
use bookshelf_core::{BookMetadata, LookupOutcome, MetadataResolver, normalize_isbn};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, warn};

use crate::app_config::EffectiveSettings;

use super::metadata_resolver;

pub async fn run_lookup_command(
    settings: &EffectiveSettings,
    isbn: &str,
    json: bool,
    quiet: bool,
) -> Result<()> {
    if settings.google_books_api_key.is_none() {
        debug!("No Google Books API key configured; only Open Library will be queried");
    }

    let resolver = metadata_resolver(settings);
    let report = resolve_with_spinner(&resolver, isbn, !quiet && !json).await;
    log_attempts(&report);

    let canonical = normalize_isbn(isbn);
    if json {
        let rendered = serde_json::to_string_pretty(&LookupJson::new(canonical.as_str(), &report))?;
        println!("{rendered}");
    } else {
        match &report.outcome {
            LookupOutcome::Found(metadata) => print_metadata(metadata),
            LookupOutcome::NotFound if canonical.is_empty() => {
                println!("Nothing to look up: '{isbn}' has no ISBN digits");
            }
            LookupOutcome::NotFound => println!("No book found for ISBN {canonical}"),
            LookupOutcome::Error(_) => {}
        }
    }

    if let LookupOutcome::Error(error) = report.outcome {
        bail!("Lookup failed for ISBN {canonical}: {error}");
    }
    Ok(())
}

/// Resolves `isbn`, showing a spinner on an interactive stderr.
pub(super) async fn resolve_with_spinner(
    resolver: &MetadataResolver,
    isbn: &str,
    show_spinner: bool,
) -> LookupReport {
    let spinner = (show_spinner && io::stderr().is_terminal()).then(|| {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner.set_message(format!("Looking up {isbn}..."));
        spinner
    });

    let report = resolver.resolve_detailed(isbn).await;

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    report
}

fn log_attempts(report: &LookupReport) {
    for attempt in &report.attempts {
        match &attempt.result {
            AttemptResult::Found => debug!(source = %attempt.source, "Record found"),
            AttemptResult::NotFound => debug!(source = %attempt.source, "No record"),
            AttemptResult::Skipped(reason) => {
                debug!(source = %attempt.source, reason = %reason, "Source skipped");
            }
            AttemptResult::Failed(error) => {
                warn!(source = %attempt.source, error = %error, "Source failed");
            }
        }
    }
}

pub(super) fn print_metadata(metadata: &BookMetadata) {
    let field = |value: Option<&str>| value.unwrap_or("-").to_string();
    println!("Title:     {}", field(metadata.title.as_deref()));
    println!("Author:    {}", field(metadata.author.as_deref()));
    println!("Publisher: {}", field(metadata.publisher.as_deref()));
    println!(
        "Year:      {}",
        metadata
            .year
            .map_or_else(|| "-".to_string(), |y| y.to_string())
    );
    println!("Cover:     {}", field(metadata.cover_image_url.as_deref()));
}

#[derive(Debug, Serialize)]
struct LookupJson<'a> {
    isbn: &'a str,
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<&'a BookMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    attempts: Vec<AttemptJson<'a>>,
}

#[derive(Debug, Serialize)]
struct AttemptJson<'a> {
    source: &'a str,
    result: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl<'a> LookupJson<'a> {
    fn new(isbn: &'a str, report: &'a LookupReport) -> Self {
        let (outcome, metadata, error) = match &report.outcome {
            LookupOutcome::Found(metadata) => ("found", Some(metadata), None),
            LookupOutcome::NotFound => ("not_found", None, None),
            LookupOutcome::Error(error) => ("error", None, Some(error.to_string())),
        };
        let attempts = report
            .attempts
            .iter()
            .map(|attempt| {
                let (result, detail) = match &attempt.result {
                    AttemptResult::Found => ("found", None),
                    AttemptResult::NotFound => ("not_found", None),
                    AttemptResult::Skipped(reason) => ("skipped", Some(reason.clone())),
                    AttemptResult::Failed(error) => ("failed", Some(error.to_string())),
                };
                AttemptJson {
                    source: &attempt.source,
                    result,
                    detail,
                }
            })
            .collect();
        Self {
            isbn,
            outcome,
            metadata,
            error,
            attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookshelf_core::LookupError;
    use bookshelf_core::lookup::SourceAttempt;

    #[test]
    fn test_lookup_json_found_shape() {
        let report = LookupReport {
            outcome: LookupOutcome::Found(BookMetadata {
                title: Some("Clean Code".into()),
                year: Some(2008),
                ..BookMetadata::default()
            }),
            attempts: vec![
                SourceAttempt {
                    source: "Google Books".into(),
                    result: AttemptResult::Skipped("no API key".into()),
                },
                SourceAttempt {
                    source: "Open Library".into(),
                    result: AttemptResult::Found,
                },
            ],
        };
        let value = serde_json::to_value(LookupJson::new("9780132350884", &report)).unwrap();
        assert_eq!(value["outcome"], "found");
        assert_eq!(value["metadata"]["title"], "Clean Code");
        assert_eq!(value["attempts"][0]["result"], "skipped");
        assert_eq!(value["attempts"][0]["detail"], "no API key");
        assert_eq!(value["attempts"][1]["source"], "Open Library");
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_lookup_json_error_carries_message() {
        let report = LookupReport {
            outcome: LookupOutcome::Error(LookupError::unavailable("Open Library")),
            attempts: Vec::new(),
        };
        let value = serde_json::to_value(LookupJson::new("1", &report)).unwrap();
        assert_eq!(value["outcome"], "error");
        assert!(
            value["error"]
                .as_str()
                .unwrap()
                .contains("Open Library")
        );
        assert!(value.get("metadata").is_none());
    }
}
