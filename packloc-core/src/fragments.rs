//! Fragment fetch and merge.

use futures::future::join_all;
use tracing::debug;

use crate::record::TranslationRecord;
use crate::transport::FileTransport;

/// Fetch every URL and merge the parsed fragments into one record.
///
/// Fragments are fetched concurrently but merged in input order, so later
/// install locations win on key collisions. A fragment that fails to fetch
/// or parse is dropped; it never aborts the merge. Returns `None` when no
/// fragment parsed at all.
pub async fn load_and_merge(
    transport: &dyn FileTransport,
    urls: &[String],
) -> Option<TranslationRecord> {
    let fetched = join_all(urls.iter().map(|url| transport.fetch_json(url))).await;

    let mut merged: Option<TranslationRecord> = None;
    for (url, result) in urls.iter().zip(fetched) {
        let value = match result {
            Ok(value) => value,
            Err(e) => {
                debug!(url, error = %e, "fragment fetch failed");
                continue;
            }
        };
        let fragment: TranslationRecord = match serde_json::from_value(value) {
            Ok(fragment) => fragment,
            Err(e) => {
                debug!(url, error = %e, "fragment did not parse");
                continue;
            }
        };
        match merged.as_mut() {
            None => merged = Some(fragment),
            Some(record) => record.merge(fragment),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryTransport;
    use serde_json::json;

    #[tokio::test]
    async fn merges_fragments_in_input_order() {
        let transport = MemoryTransport::new()
            .with_file("one.json", json!({"label": "A", "entries": {"1": "x"}}))
            .with_file("two.json", json!({"label": "B", "entries": {"2": "y"}}));

        let record = load_and_merge(
            &transport,
            &["one.json".to_string(), "two.json".to_string()],
        )
        .await
        .unwrap();

        assert_eq!(record.label.as_deref(), Some("B"));
        let entries = record.entries.unwrap();
        assert_eq!(entries.get("1"), Some(&json!("x")));
        assert_eq!(entries.get("2"), Some(&json!("y")));
    }

    #[tokio::test]
    async fn bad_fragments_are_dropped_individually() {
        let transport = MemoryTransport::new()
            .with_file("good.json", json!({"label": "Hi"}))
            .with_file("bad.json", json!({"entries": 42}));

        let record = load_and_merge(
            &transport,
            &[
                "missing.json".to_string(),
                "bad.json".to_string(),
                "good.json".to_string(),
            ],
        )
        .await
        .unwrap();
        assert_eq!(record.label.as_deref(), Some("Hi"));
    }

    #[tokio::test]
    async fn yields_none_when_nothing_parses() {
        let transport = MemoryTransport::new();
        let merged = load_and_merge(&transport, &["missing.json".to_string()]).await;
        assert!(merged.is_none());
    }
}
