//! Recently viewed products, most recent first.

use tower_sessions::Session;

use crate::models::session_keys;

/// Maximum slugs remembered.
pub const MAX_RECENTLY_VIEWED: usize = 8;

/// Move `slug` to the front, dropping duplicates and the oldest overflow.
pub fn record(slugs: &mut Vec<String>, slug: &str) {
    slugs.retain(|s| s != slug);
    slugs.insert(0, slug.to_string());
    slugs.truncate(MAX_RECENTLY_VIEWED);
}

/// Slugs viewed in this session.
pub async fn load(session: &Session) -> Vec<String> {
    session
        .get(session_keys::RECENTLY_VIEWED)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Record a product view.
pub async fn track(session: &Session, slug: &str) {
    let mut slugs = load(session).await;
    record(&mut slugs, slug);
    if let Err(e) = session.insert(session_keys::RECENTLY_VIEWED, slugs).await {
        tracing::warn!(error = %e, "Failed to record recently viewed product");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_most_recent_first_without_duplicates() {
        let mut slugs = Vec::new();
        record(&mut slugs, "a");
        record(&mut slugs, "b");
        record(&mut slugs, "a");
        assert_eq!(slugs, vec!["a", "b"]);
    }

    #[test]
    fn test_keeps_at_most_eight() {
        let mut slugs = Vec::new();
        for i in 0..12 {
            record(&mut slugs, &format!("beer-{i}"));
        }
        assert_eq!(slugs.len(), MAX_RECENTLY_VIEWED);
        assert_eq!(slugs.first().map(String::as_str), Some("beer-11"));
        assert_eq!(slugs.last().map(String::as_str), Some("beer-4"));
    }
}
