//! Config command handlers: show effective configuration.

use crate::app_config::{EffectiveSettings, LoadedConfig};

pub fn run_config_show_command(
    settings: &EffectiveSettings,
    loaded_config: &LoadedConfig,
    verbose: u8,
    quiet: bool,
) {
    let resolved_path = loaded_config.path.as_ref().map_or_else(
        || "<unresolved>".to_string(),
        |path| path.display().to_string(),
    );
    println!("config_path = {resolved_path}");
    println!(
        "config_file = {}",
        if loaded_config.loaded_from_file {
            "loaded"
        } else {
            "not found (using defaults)"
        }
    );
    println!(
        "api_base_url = {} ({})",
        settings.api_base_url,
        settings.api_base_url_source.as_str()
    );
    println!(
        "google_books_api_key = {} ({})",
        if settings.google_books_api_key.is_some() {
            "set"
        } else {
            "not set"
        },
        settings.google_books_api_key_source.as_str()
    );
    println!(
        "token_path = {}",
        settings.token_path.as_ref().map_or_else(
            || "<unresolved>".to_string(),
            |path| path.display().to_string()
        )
    );
    println!(
        "lookup_connect_timeout_secs = {}",
        settings.lookup_timeouts.connect_secs
    );
    println!(
        "lookup_read_timeout_secs = {}",
        settings.lookup_timeouts.read_secs
    );
    println!(
        "api_connect_timeout_secs = {}",
        settings.api_timeouts.connect_secs
    );
    println!("api_read_timeout_secs = {}", settings.api_timeouts.read_secs);
    println!(
        "verbosity = {}",
        crate::verbosity_label(verbose, quiet, settings.verbosity)
    );
}
