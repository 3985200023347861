use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::feed::Feed;
use crate::storage::Store;

pub const DEFAULT_KEY: &str = "tweetsData";

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("stored feed under {key:?} is not valid JSON: {source}")]
    Malformed {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Stored,
    Seeded,
    /// The stored value could not be decoded and was replaced by the seed.
    Reseeded,
}

pub fn decode(key: &str, raw: &str) -> Result<Feed, SnapshotError> {
    serde_json::from_str(raw).map_err(|source| SnapshotError::Malformed {
        key: key.to_string(),
        source,
    })
}

pub fn encode(feed: &Feed) -> Result<String> {
    serde_json::to_string(feed).context("snapshot: encode feed")
}

/// Reads the feed stored under `key`, falling back to the seed when nothing is
/// stored or the stored value does not decode.
pub fn load(store: &Store, key: &str) -> Result<(Feed, Origin)> {
    let Some(raw) = store.get_item(key)? else {
        info!(key, "no stored feed, starting from seed");
        return Ok((Feed::seed(), Origin::Seeded));
    };
    match decode(key, &raw) {
        Ok(feed) => {
            info!(key, posts = feed.len(), "restored feed");
            Ok((feed, Origin::Stored))
        }
        Err(err) => {
            warn!(error = %err, "discarding stored feed");
            Ok((Feed::seed(), Origin::Reseeded))
        }
    }
}

pub fn save(store: &Store, key: &str, feed: &Feed) -> Result<()> {
    let raw = encode(feed)?;
    store.set_item(key, &raw)?;
    info!(key, posts = feed.len(), "saved feed");
    Ok(())
}

pub fn clear(store: &Store, key: &str) -> Result<bool> {
    store.remove_item(key)
}
