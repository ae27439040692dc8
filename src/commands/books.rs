//! Book command handlers: list, show, add, edit and delete.

use anyhow::{Result, bail};
use bookshelf_core::library::{Book, BookDraft, BookFilter, BookPatch, MediaType, StatusFilter};
use bookshelf_core::{BookMetadata, LookupOutcome, normalize_isbn};
use tracing::{info, warn};

use crate::app_config::EffectiveSettings;
use crate::cli::{BookAddArgs, BookEditArgs};

use super::lookup::{print_metadata, resolve_with_spinner};
use super::{api_failure, library_client, metadata_resolver, non_blank};

pub async fn run_books_list_command(
    settings: &EffectiveSettings,
    search: Option<String>,
    status: StatusFilter,
    media_type: Option<MediaType>,
    json: bool,
) -> Result<()> {
    let client = library_client(settings)?;
    let books = client
        .list_books()
        .await
        .map_err(|e| api_failure("Listing books", e))?;

    let filter = BookFilter {
        search: non_blank(search),
        status,
        media_type,
    };
    let shown = filter.apply(&books);

    if json {
        println!("{}", serde_json::to_string_pretty(&shown)?);
        return Ok(());
    }

    if shown.is_empty() {
        if books.is_empty() {
            println!("Your library is empty. Add a book with `bookshelf books add`");
        } else {
            println!("No books match the current filters");
        }
        return Ok(());
    }

    for book in &shown {
        println!("{}", book_line(book));
    }
    info!(shown = shown.len(), total = books.len(), "Listed books");
    Ok(())
}

pub async fn run_books_show_command(settings: &EffectiveSettings, id: i64) -> Result<()> {
    let client = library_client(settings)?;
    let book = client
        .get_book(id)
        .await
        .map_err(|e| api_failure("Loading book", e))?;
    print_book(&book);
    Ok(())
}

pub async fn run_books_add_command(
    settings: &EffectiveSettings,
    args: BookAddArgs,
    quiet: bool,
) -> Result<()> {
    let metadata = match args.isbn.as_deref() {
        Some(isbn) if !args.no_lookup && !normalize_isbn(isbn).is_empty() => {
            let resolver = metadata_resolver(settings);
            let report = resolve_with_spinner(&resolver, isbn, !quiet).await;
            match report.outcome {
                LookupOutcome::Found(metadata) => {
                    if !quiet {
                        println!("Found metadata:");
                        print_metadata(&metadata);
                    }
                    Some(metadata)
                }
                LookupOutcome::NotFound => {
                    warn!(isbn, "No metadata found; using the fields you gave");
                    None
                }
                LookupOutcome::Error(error) => {
                    warn!(isbn, error = %error, "Metadata lookup failed; using the fields you gave");
                    None
                }
            }
        }
        _ => None,
    };

    let draft = build_draft(args, metadata.as_ref());
    let missing = draft.missing_required_fields();
    if !missing.is_empty() {
        bail!(
            "Missing required field(s): {}. Pass them explicitly or use --isbn to auto-fill",
            missing.join(", ")
        );
    }

    let client = library_client(settings)?;
    let created = client
        .create_book(&draft)
        .await
        .map_err(|e| api_failure("Adding book", e))?;

    match created {
        Some(book) => {
            info!(id = book.id, "Book added");
            print_book(&book);
        }
        None => info!(title = %draft.title, "Book added"),
    }
    Ok(())
}

pub async fn run_books_edit_command(settings: &EffectiveSettings, args: BookEditArgs) -> Result<()> {
    let id = args.id;
    let patch = build_patch(args);
    if patch.is_empty() {
        bail!("Nothing to change. Pass at least one field to update");
    }

    let client = library_client(settings)?;
    let updated = client
        .update_book(id, &patch)
        .await
        .map_err(|e| api_failure("Updating book", e))?;

    match updated {
        Some(book) => print_book(&book),
        None => info!(id, "Book updated"),
    }
    Ok(())
}

pub async fn run_books_delete_command(
    settings: &EffectiveSettings,
    id: i64,
    yes: bool,
) -> Result<()> {
    if !yes {
        bail!("Re-run with --yes to delete book {id}");
    }
    let client = library_client(settings)?;
    client
        .delete_book(id)
        .await
        .map_err(|e| api_failure("Deleting book", e))?;
    info!(id, "Book deleted");
    Ok(())
}

/// Builds a draft: looked-up metadata first, explicit flags on top.
fn build_draft(args: BookAddArgs, metadata: Option<&BookMetadata>) -> BookDraft {
    let mut draft = BookDraft {
        status: args.status,
        read: args.read,
        media_type: args.media_type,
        isbn: non_blank(args.isbn).map(|isbn| normalize_isbn(&isbn).as_str().to_string()),
        ..BookDraft::default()
    };
    if let Some(metadata) = metadata {
        draft.apply_metadata(metadata);
    }

    if let Some(title) = non_blank(args.title) {
        draft.title = title;
    }
    if let Some(author) = non_blank(args.author) {
        draft.author = author;
    }
    if let Some(publisher) = non_blank(args.publisher) {
        draft.publisher = Some(publisher);
    }
    if args.year.is_some() {
        draft.year = args.year;
    }
    if let Some(cover_url) = non_blank(args.cover_url) {
        draft.cover_url = Some(cover_url);
    }
    draft
}

fn build_patch(args: BookEditArgs) -> BookPatch {
    BookPatch {
        title: non_blank(args.title),
        author: non_blank(args.author),
        publisher: args.publisher,
        year: args.year,
        status: args.status,
        read: args.read,
        isbn: args.isbn.map(|isbn| normalize_isbn(&isbn).as_str().to_string()),
        cover_url: args.cover_url,
        media_type: args.media_type,
    }
}

fn book_line(book: &Book) -> String {
    let year = book.year.map(|y| format!(" ({y})")).unwrap_or_default();
    let read = if book.read { ", read" } else { "" };
    format!(
        "{:>5}  {} - {}{}  [{}{}]",
        book.id,
        book.title,
        book.author,
        year,
        book.status.label(),
        read
    )
}

fn print_book(book: &Book) {
    let field = |value: Option<&str>| value.unwrap_or("-").to_string();
    println!("ID:         {}", book.id);
    println!("Title:      {}", book.title);
    println!("Author:     {}", book.author);
    println!("Publisher:  {}", field(book.publisher.as_deref()));
    println!(
        "Year:       {}",
        book.year.map_or_else(|| "-".to_string(), |y| y.to_string())
    );
    println!("Type:       {}", book.effective_media_type().label());
    println!("Status:     {}", book.status.label());
    println!("Read:       {}", if book.read { "Yes" } else { "No" });
    println!("ISBN:       {}", field(book.isbn.as_deref()));
    println!("Cover:      {}", field(book.cover_url.as_deref()));
    println!("Registered: {}", book.registered_at);
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookshelf_core::library::BookStatus;

    fn metadata() -> BookMetadata {
        BookMetadata {
            title: Some("Ficciones".into()),
            author: Some("Jorge Luis Borges".into()),
            publisher: Some("Sur".into()),
            year: Some(1944),
            cover_image_url: None,
        }
    }

    #[test]
    fn test_build_draft_fills_from_metadata() {
        let args = BookAddArgs {
            isbn: Some("978-84-206-3382-6".into()),
            ..BookAddArgs::default()
        };
        let draft = build_draft(args, Some(&metadata()));
        assert_eq!(draft.title, "Ficciones");
        assert_eq!(draft.author, "Jorge Luis Borges");
        assert_eq!(draft.year, Some(1944));
        assert_eq!(draft.isbn.as_deref(), Some("9788420633826"));
        assert!(draft.cover_url.is_none());
        assert!(draft.missing_required_fields().is_empty());
    }

    #[test]
    fn test_build_draft_explicit_flags_win_over_metadata() {
        let args = BookAddArgs {
            title: Some("Ficciones (2nd ed.)".into()),
            cover_url: Some("https://example.com/c.jpg".into()),
            status: BookStatus::Lent,
            read: true,
            ..BookAddArgs::default()
        };
        let draft = build_draft(args, Some(&metadata()));
        assert_eq!(draft.title, "Ficciones (2nd ed.)");
        assert_eq!(draft.author, "Jorge Luis Borges");
        assert_eq!(draft.cover_url.as_deref(), Some("https://example.com/c.jpg"));
        assert_eq!(draft.status, BookStatus::Lent);
        assert!(draft.read);
    }

    #[test]
    fn test_build_draft_without_metadata_reports_missing_fields() {
        let draft = build_draft(BookAddArgs::default(), None);
        assert_eq!(draft.missing_required_fields(), vec!["title", "author"]);
        assert!(draft.isbn.is_none());
    }

    #[test]
    fn test_build_patch_only_given_fields() {
        let patch = build_patch(BookEditArgs {
            id: 3,
            read: Some(true),
            title: Some("  ".into()),
            ..BookEditArgs::default()
        });
        assert_eq!(patch.read, Some(true));
        assert!(patch.title.is_none());
        assert!(!patch.is_empty());
        assert!(build_patch(BookEditArgs::default()).is_empty());
    }

    #[test]
    fn test_book_line_format() {
        let book = Book {
            id: 12,
            user_id: 1,
            title: "Rayuela".into(),
            author: "Cortázar".into(),
            publisher: None,
            year: Some(1963),
            status: BookStatus::OnShelf,
            read: true,
            isbn: None,
            cover_url: None,
            media_type: None,
            registered_at: String::new(),
        };
        assert_eq!(
            book_line(&book),
            "   12  Rayuela - Cortázar (1963)  [On shelf, read]"
        );
    }
}
