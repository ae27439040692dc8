//! CLI entry point for the bookshelf tool.

use anyhow::Result;
use clap::Parser;
use tracing::debug;

mod app_config;
mod cli;
mod commands;

use app_config::{
    CliOverrides, EffectiveSettings, VerbositySetting, load_default_file_config,
    resolve_effective_settings,
};
use cli::{Args, BooksCommand, Command, ConfigCommand, ProfileCommand};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    let loaded_config = load_default_file_config()?;

    // Priority: RUST_LOG env var > quiet flag > verbose flag > config verbosity > default (info)
    let default_level = default_log_level(
        args.quiet,
        args.verbose,
        loaded_config.config.as_ref().and_then(|c| c.verbosity),
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(command = ?args.command, "CLI arguments parsed");

    let overrides = CliOverrides {
        api_url: args.api_url.clone(),
        google_books_api_key: args.google_books_api_key.clone(),
    };
    let settings = resolve_effective_settings(&overrides, loaded_config.config.as_ref());
    debug!(
        api_base_url = %settings.api_base_url,
        google_books_key = settings.google_books_api_key.is_some(),
        "Effective settings resolved"
    );

    run(args, &settings, &loaded_config).await
}

async fn run(
    args: Args,
    settings: &EffectiveSettings,
    loaded_config: &app_config::LoadedConfig,
) -> Result<()> {
    match args.command {
        Command::Lookup { isbn, json } => {
            commands::run_lookup_command(settings, &isbn, json, args.quiet).await
        }
        Command::Login { email, password } => {
            commands::run_login_command(settings, &email, password).await
        }
        Command::Register {
            name,
            email,
            password,
        } => commands::run_register_command(settings, &name, &email, password).await,
        Command::Logout => commands::run_logout_command(settings),
        Command::Whoami => commands::run_whoami_command(settings),
        Command::Profile(ProfileCommand::Show) => commands::run_profile_show_command(settings).await,
        Command::Profile(ProfileCommand::Update { name, email }) => {
            commands::run_profile_update_command(settings, name, email).await
        }
        Command::Profile(ProfileCommand::Delete { yes }) => {
            commands::run_profile_delete_command(settings, yes).await
        }
        Command::Books(BooksCommand::List {
            search,
            status,
            media_type,
            json,
        }) => commands::run_books_list_command(settings, search, status, media_type, json).await,
        Command::Books(BooksCommand::Show { id }) => {
            commands::run_books_show_command(settings, id).await
        }
        Command::Books(BooksCommand::Add(add)) => {
            commands::run_books_add_command(settings, add, args.quiet).await
        }
        Command::Books(BooksCommand::Edit(edit)) => {
            commands::run_books_edit_command(settings, edit).await
        }
        Command::Books(BooksCommand::Delete { id, yes }) => {
            commands::run_books_delete_command(settings, id, yes).await
        }
        Command::Stats { local } => commands::run_stats_command(settings, local).await,
        Command::Export { output_dir } => commands::run_export_command(settings, &output_dir).await,
        Command::Config(ConfigCommand::Show) => {
            commands::run_config_show_command(settings, loaded_config, args.verbose, args.quiet);
            Ok(())
        }
    }
}

fn default_log_level(quiet: bool, verbose: u8, configured: Option<VerbositySetting>) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => {}
        1 => return "debug",
        _ => return "trace",
    }
    match configured {
        Some(VerbositySetting::Quiet) => "error",
        Some(VerbositySetting::Verbose) => "debug",
        Some(VerbositySetting::Debug) => "trace",
        Some(VerbositySetting::Default) | None => "info",
    }
}

/// Returns the verbosity label shown by `config show`.
pub(crate) fn verbosity_label(
    verbose: u8,
    quiet: bool,
    configured: Option<VerbositySetting>,
) -> &'static str {
    if quiet {
        VerbositySetting::Quiet.as_str()
    } else if verbose >= 2 {
        VerbositySetting::Debug.as_str()
    } else if verbose == 1 {
        VerbositySetting::Verbose.as_str()
    } else {
        configured.unwrap_or(VerbositySetting::Default).as_str()
    }
}
