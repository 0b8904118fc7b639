//! Redis-backed cache of extraction results, keyed by content hash.
//!
//! Only what the bytes alone determine is stored here. Every operation is
//! best-effort: a Redis outage degrades to a cache miss.

use std::time::Duration;

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

/// Key prefix for cached extraction results.
const KEY_PREFIX: &str = "mortgage:extraction:";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
const COMMAND_TIMEOUT: Duration = Duration::from_millis(500);

/// Cheap to clone; clones share one multiplexed connection.
#[derive(Clone)]
pub struct AnalysisCache {
    conn: Option<ConnectionManager>,
    ttl_secs: u64,
}

/// Hex-encoded SHA-256 of a document's bytes.
pub fn content_hash(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn cache_key(hash: &str) -> String {
    format!("{KEY_PREFIX}{hash}")
}

impl AnalysisCache {
    /// Opens the shared connection. If Redis cannot be reached at startup the
    /// cache stays disabled for the life of the process.
    pub async fn connect(client: redis::Client, ttl_secs: u64) -> Self {
        match tokio::time::timeout(CONNECT_TIMEOUT, ConnectionManager::new(client)).await {
            Ok(Ok(conn)) => {
                info!("Analysis cache connected (ttl {ttl_secs}s)");
                Self {
                    conn: Some(conn),
                    ttl_secs,
                }
            }
            Ok(Err(e)) => {
                warn!("Analysis cache disabled, Redis unavailable: {e}");
                Self::disabled(ttl_secs)
            }
            Err(_) => {
                warn!(
                    "Analysis cache disabled, Redis did not answer within {}s",
                    CONNECT_TIMEOUT.as_secs()
                );
                Self::disabled(ttl_secs)
            }
        }
    }

    /// A cache that never hits and never writes.
    pub fn disabled(ttl_secs: u64) -> Self {
        Self {
            conn: None,
            ttl_secs,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.conn.is_some()
    }

    pub async fn get<T: DeserializeOwned>(&self, hash: &str) -> Option<T> {
        let mut conn = self.conn.clone()?;
        let raw: Option<String> =
            match tokio::time::timeout(COMMAND_TIMEOUT, conn.get(cache_key(hash))).await {
                Ok(Ok(v)) => v,
                Ok(Err(e)) => {
                    warn!("Analysis cache read failed: {e}");
                    return None;
                }
                Err(_) => {
                    warn!("Analysis cache read timed out");
                    return None;
                }
            };
        decode(hash, &raw?)
    }

    pub async fn put<T: Serialize>(&self, hash: &str, value: &T) {
        let Some(mut conn) = self.conn.clone() else {
            return;
        };
        let raw = match serde_json::to_string(value) {
            Ok(r) => r,
            Err(e) => {
                warn!("Could not serialize extraction for cache: {e}");
                return;
            }
        };
        let write = conn.set_ex::<_, _, ()>(cache_key(hash), raw, self.ttl_secs);
        match tokio::time::timeout(COMMAND_TIMEOUT, write).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Analysis cache write failed: {e}"),
            Err(_) => warn!("Analysis cache write timed out"),
        }
    }
}

fn decode<T: DeserializeOwned>(hash: &str, raw: &str) -> Option<T> {
    match serde_json::from_str(raw) {
        Ok(v) => {
            debug!("Analysis cache hit for {hash}");
            Some(v)
        }
        Err(e) => {
            warn!("Discarding unreadable cache entry for {hash}: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_is_sha256_hex() {
        assert_eq!(
            content_hash(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_cache_key_is_namespaced() {
        assert_eq!(cache_key("ff00"), "mortgage:extraction:ff00");
    }

    #[test]
    fn test_decode_discards_unreadable_entry() {
        assert_eq!(decode::<Vec<u32>>("ff00", "[1,2]"), Some(vec![1, 2]));
        assert_eq!(decode::<Vec<u32>>("ff00", "{not json"), None);
    }

    #[tokio::test]
    async fn test_disabled_cache_misses_without_io() {
        let cache = AnalysisCache::disabled(60);
        assert!(!cache.is_enabled());
        cache.put("ff00", &vec![1u32]).await;
        assert_eq!(cache.get::<Vec<u32>>("ff00").await, None);
    }

    #[tokio::test]
    async fn test_unreachable_redis_disables_cache() {
        let client = redis::Client::open("redis://127.0.0.1:1/").unwrap();
        let cache = AnalysisCache::connect(client, 60).await;
        assert!(!cache.is_enabled());
    }
}
