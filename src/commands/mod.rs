//! CLI command handlers.

mod account;
mod books;
mod config;
mod export;
mod lookup;
mod stats;

use std::io::{self, BufRead, IsTerminal};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use bookshelf_core::library::{ApiError, FileTokenStore, LibraryClient, TokenStore};
use bookshelf_core::{LookupConfig, MetadataResolver, build_default_metadata_resolver};

use crate::app_config::EffectiveSettings;

pub use account::{
    run_login_command, run_logout_command, run_profile_delete_command, run_profile_show_command,
    run_profile_update_command, run_register_command, run_whoami_command,
};
pub use books::{
    run_books_add_command, run_books_delete_command, run_books_edit_command,
    run_books_list_command, run_books_show_command,
};
pub use config::run_config_show_command;
pub use export::run_export_command;
pub use lookup::run_lookup_command;
pub use stats::run_stats_command;

/// Builds the library client with the file token store from settings.
fn library_client(settings: &EffectiveSettings) -> Result<LibraryClient> {
    let store = match &settings.token_path {
        Some(path) => FileTokenStore::new(path.clone()),
        None => FileTokenStore::at_default_location()?,
    };
    let tokens: Arc<dyn TokenStore> = Arc::new(store);
    LibraryClient::new(&settings.api_base_url, tokens, &settings.api_timeouts)
        .context("Failed to create library client")
}

/// Builds the metadata resolver from settings.
fn metadata_resolver(settings: &EffectiveSettings) -> MetadataResolver {
    let config = LookupConfig {
        google_books_api_key: settings.google_books_api_key.clone(),
        timeouts: settings.lookup_timeouts,
        ..LookupConfig::default()
    };
    build_default_metadata_resolver(&config)
}

/// Converts a backend error, adding a sign-in hint for rejected sessions.
fn api_failure(action: &str, error: ApiError) -> anyhow::Error {
    if error.is_unauthorized() {
        anyhow!("{action} failed: {error}\n  Suggestion: Run `bookshelf login` to sign in again")
    } else {
        anyhow!("{action} failed: {error}")
    }
}

/// Returns the password from the flag, a hidden terminal prompt, or piped stdin.
fn resolve_password(password: Option<String>) -> Result<String> {
    if let Some(password) = password.filter(|p| !p.is_empty()) {
        return Ok(password);
    }

    if io::stdin().is_terminal() {
        return dialoguer::Password::new()
            .with_prompt("Password")
            .interact()
            .context("Failed to read password from the terminal");
    }
    read_password_line(io::stdin().lock())
}

/// Reads one password line from a non-interactive reader.
fn read_password_line(mut reader: impl BufRead) -> Result<String> {
    let mut line = String::new();
    reader
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        bail!("No password provided. Pass --password, set BOOKSHELF_PASSWORD, or pipe it on stdin");
    }
    Ok(password)
}

/// Returns `value` unless it is blank.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
