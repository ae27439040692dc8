//! Shared User-Agent strings for lookup and library API HTTP clients.
//!
//! Single source for project URL and UA format so bibliographic lookups and
//! backend traffic stay consistent and easy to update (RFC 9308).

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/fierce/bookshelf";

/// Default User-Agent for bibliographic lookup requests (no per-source name in header).
#[must_use]
pub(crate) fn default_lookup_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("bookshelf/{version} (isbn-lookup; +{PROJECT_UA_URL})")
}

/// Default User-Agent for library backend requests.
#[must_use]
pub(crate) fn default_api_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("bookshelf/{version} (library-client; +{PROJECT_UA_URL})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_format_consistency() {
        let lookup_ua = default_lookup_user_agent();
        let api_ua = default_api_user_agent();
        assert!(lookup_ua.contains(PROJECT_UA_URL));
        assert!(api_ua.contains(PROJECT_UA_URL));
        assert_eq!(
            env!("CARGO_PKG_VERSION"),
            lookup_ua
                .strip_prefix("bookshelf/")
                .and_then(|s| s.split(' ').next())
                .expect("lookup UA has version"),
            "lookup UA must contain crate version"
        );
        assert_eq!(
            env!("CARGO_PKG_VERSION"),
            api_ua
                .strip_prefix("bookshelf/")
                .and_then(|s| s.split(' ').next())
                .expect("api UA has version"),
            "api UA must contain crate version"
        );
    }

    #[test]
    fn test_ua_format_keywords() {
        assert!(default_lookup_user_agent().contains("isbn-lookup"));
        assert!(default_api_user_agent().contains("library-client"));
    }
}
