//! Author reference resolution.

use futures_util::future::join_all;
use tracing::debug;

use super::{AuthorDirectory, AuthorRef};

/// Resolves author references to display names.
///
/// Inline names are used as-is (trimmed). Keys are looked up concurrently
/// through `directory`; a failed lookup drops that author. The result keeps
/// reference order with duplicates removed by first appearance.
pub async fn resolve_authors<D>(refs: &[AuthorRef], directory: &D) -> Vec<String>
where
    D: AuthorDirectory + ?Sized,
{
    let lookups = refs.iter().map(|author| async move {
        match author {
            AuthorRef::Name(name) => Some(name.trim().to_string()),
            AuthorRef::Key(key) => {
                let resolved = directory.author_name(key).await;
                if resolved.is_none() {
                    debug!(author_key = %key, "Dropping author that could not be resolved");
                }
                resolved.map(|name| name.trim().to_string())
            }
        }
    });

    let mut names: Vec<String> = Vec::with_capacity(refs.len());
    for name in join_all(lookups).await.into_iter().flatten() {
        if !name.is_empty() && !names.contains(&name) {
            names.push(name);
        }
    }
    names
}
