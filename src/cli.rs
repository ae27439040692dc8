//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use bookshelf_core::library::{BookStatus, MediaType, StatusFilter};
use clap::{Args as ClapArgs, Parser, Subcommand};

/// Track a personal book collection and auto-fill metadata by ISBN.
///
/// Bookshelf talks to your library backend for accounts and books, and
/// looks up titles, authors and covers from Google Books and Open Library.
#[derive(Parser, Debug)]
#[command(name = "bookshelf")]
#[command(author, version, about)]
pub struct Args {
    /// Command to run
    #[command(subcommand)]
    pub command: Command,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Library backend base URL (overrides config file)
    #[arg(long, env = "BOOKSHELF_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Google Books API key (overrides config file)
    #[arg(
        long,
        env = "GOOGLE_BOOKS_API_KEY",
        hide_env_values = true,
        global = true
    )]
    pub google_books_api_key: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Look up book metadata by ISBN
    Lookup {
        /// ISBN as typed (dashes and spaces are ignored)
        isbn: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Sign in and store the session token
    Login {
        /// Account email
        #[arg(long)]
        email: String,

        /// Account password (read from stdin when omitted)
        #[arg(long, env = "BOOKSHELF_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Create an account and store the session token
    Register {
        /// Display name
        #[arg(long)]
        name: String,

        /// Account email
        #[arg(long)]
        email: String,

        /// Account password (read from stdin when omitted)
        #[arg(long, env = "BOOKSHELF_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Forget the stored session token
    Logout,

    /// Show the signed-in user from the stored token
    Whoami,

    /// Manage your account profile
    #[command(subcommand)]
    Profile(ProfileCommand),

    /// Manage books in your collection
    #[command(subcommand)]
    Books(BooksCommand),

    /// Show collection statistics
    Stats {
        /// Compute counters from the book list instead of asking the backend
        #[arg(long)]
        local: bool,
    },

    /// Export the collection as CSV
    Export {
        /// Directory to write `library_YYYY-MM-DD.csv` into
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
    /// Show the profile stored on the backend
    Show,

    /// Change name and/or email
    Update {
        /// New display name
        #[arg(long)]
        name: Option<String>,

        /// New email
        #[arg(long)]
        email: Option<String>,
    },

    /// Delete the account and every book in it
    Delete {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum BooksCommand {
    /// List books, optionally filtered
    List {
        /// Case-insensitive match on title or author
        #[arg(short, long)]
        search: Option<String>,

        /// Status filter: all, on-shelf, lent, read
        #[arg(long, default_value_t = StatusFilter::All)]
        status: StatusFilter,

        /// Media type filter (book, comic, manga, digital, magazine, audiobook, other)
        #[arg(long = "type")]
        media_type: Option<MediaType>,

        /// Print the list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one book
    Show {
        /// Book id
        id: i64,
    },

    /// Add a book
    Add(BookAddArgs),

    /// Edit a book; only the given fields change
    Edit(BookEditArgs),

    /// Delete a book
    Delete {
        /// Book id
        id: i64,

        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },
}

/// Fields for `books add`.
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct BookAddArgs {
    /// ISBN; metadata is looked up and fills fields you did not give
    #[arg(long)]
    pub isbn: Option<String>,

    /// Title
    #[arg(long)]
    pub title: Option<String>,

    /// Author(s)
    #[arg(long)]
    pub author: Option<String>,

    /// Publisher
    #[arg(long)]
    pub publisher: Option<String>,

    /// Publication year
    #[arg(long)]
    pub year: Option<i32>,

    /// Shelf status (on-shelf, lent, other)
    #[arg(long, default_value_t = BookStatus::OnShelf)]
    pub status: BookStatus,

    /// Mark as read
    #[arg(long)]
    pub read: bool,

    /// Media type
    #[arg(long = "type")]
    pub media_type: Option<MediaType>,

    /// Cover image URL
    #[arg(long)]
    pub cover_url: Option<String>,

    /// Skip the metadata lookup even when --isbn is given
    #[arg(long)]
    pub no_lookup: bool,
}

/// Fields for `books edit`.
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct BookEditArgs {
    /// Book id
    pub id: i64,

    /// Title
    #[arg(long)]
    pub title: Option<String>,

    /// Author(s)
    #[arg(long)]
    pub author: Option<String>,

    /// Publisher
    #[arg(long)]
    pub publisher: Option<String>,

    /// Publication year
    #[arg(long)]
    pub year: Option<i32>,

    /// Shelf status (on-shelf, lent, other)
    #[arg(long)]
    pub status: Option<BookStatus>,

    /// Read flag
    #[arg(long)]
    pub read: Option<bool>,

    /// ISBN
    #[arg(long)]
    pub isbn: Option<String>,

    /// Media type
    #[arg(long = "type")]
    pub media_type: Option<MediaType>,

    /// Cover image URL
    #[arg(long)]
    pub cover_url: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,
}
