//! Shared HTTP client construction policy.
//!
//! Every outbound client (bibliographic sources, author lookups, the library
//! backend) is built here so timeouts, user-agent, compression and proxy
//! handling stay consistent.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use reqwest::{Client, ClientBuilder, Proxy};
use thiserror::Error;
use tracing::warn;

/// Default connect timeout for outbound clients.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Default total request timeout for outbound clients.
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 30;

/// Connect/read timeouts applied to a client.
///
/// A hung source would otherwise block the fallback chain indefinitely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    /// TCP/TLS connect timeout in seconds.
    pub connect_secs: u64,
    /// Whole-request timeout in seconds.
    pub read_secs: u64,
}

impl HttpTimeouts {
    /// Creates timeouts from explicit second values.
    #[must_use]
    pub fn new(connect_secs: u64, read_secs: u64) -> Self {
        Self {
            connect_secs,
            read_secs,
        }
    }
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_READ_TIMEOUT_SECS)
    }
}

/// Failure to construct an HTTP client.
#[derive(Debug, Error)]
pub enum ClientBuildError {
    /// The builder panicked even with system proxy lookup disabled.
    #[error("HTTP client construction panicked while initializing '{client}' networking")]
    Panicked {
        /// Logical client name
        client: String,
    },

    /// reqwest rejected the configuration.
    #[error("HTTP client construction failed for '{client}': {source}")]
    Build {
        /// Logical client name
        client: String,
        /// Underlying builder error
        #[source]
        source: reqwest::Error,
    },
}

/// Builds an HTTP client using shared project policy.
///
/// `client_name` is used only for error messages and logging, not in the
/// User-Agent header.
///
/// # Errors
///
/// Returns [`ClientBuildError`] when client construction fails.
pub fn build_http_client(
    client_name: &str,
    user_agent: impl Into<String>,
    timeouts: &HttpTimeouts,
) -> Result<Client, ClientBuildError> {
    let user_agent = user_agent.into();

    match try_build_client(&user_agent, timeouts, false) {
        Ok(client) => Ok(client),
        Err(BuildClientFailure::Panic) => {
            // Some sandboxed macOS environments panic when querying system
            // proxy settings; retry with env-proxy support only.
            warn!(
                client = client_name,
                "HTTP client hit system proxy panic; using env-proxy fallback builder"
            );
            match try_build_client(&user_agent, timeouts, true) {
                Ok(client) => Ok(client),
                Err(BuildClientFailure::Panic) => Err(ClientBuildError::Panicked {
                    client: client_name.to_string(),
                }),
                Err(BuildClientFailure::Build(source)) => Err(ClientBuildError::Build {
                    client: client_name.to_string(),
                    source,
                }),
            }
        }
        Err(BuildClientFailure::Build(source)) => Err(ClientBuildError::Build {
            client: client_name.to_string(),
            source,
        }),
    }
}

enum BuildClientFailure {
    Panic,
    Build(reqwest::Error),
}

fn try_build_client(
    user_agent: &str,
    timeouts: &HttpTimeouts,
    disable_system_proxy_lookup: bool,
) -> Result<Client, BuildClientFailure> {
    let user_agent = user_agent.to_string();
    let timeouts = *timeouts;
    catch_unwind(AssertUnwindSafe(move || {
        let mut builder = base_builder(user_agent, &timeouts);
        if disable_system_proxy_lookup {
            builder = apply_env_proxy_fallback(builder.no_proxy());
        }
        builder.build().map_err(BuildClientFailure::Build)
    }))
    .map_err(|_| BuildClientFailure::Panic)?
}

fn base_builder(user_agent: String, timeouts: &HttpTimeouts) -> ClientBuilder {
    Client::builder()
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .timeout(Duration::from_secs(timeouts.read_secs))
        .user_agent(user_agent)
        .gzip(true)
}

fn apply_env_proxy_fallback(mut builder: ClientBuilder) -> ClientBuilder {
    if let Some(proxy) = env_proxy_for_scheme("https")
        && let Ok(resolved) = Proxy::https(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    if let Some(proxy) = env_proxy_for_scheme("http")
        && let Ok(resolved) = Proxy::http(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    builder
}

fn env_proxy_for_scheme(scheme: &str) -> Option<String> {
    match scheme {
        "https" => find_first_proxy_var(&["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"]),
        "http" => find_first_proxy_var(&["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"]),
        _ => None,
    }
}

fn find_first_proxy_var(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}
