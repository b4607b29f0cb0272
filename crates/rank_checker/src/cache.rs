use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::account::{normalize_address, AccountRecord};

/// Short-lived per-address record cache. Only saves latency; a miss always
/// falls through to a fresh resolve.
pub struct RecordCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, AccountRecord)>>,
}

impl RecordCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get(&self, address: &str) -> Option<AccountRecord> {
        let key = normalize_address(address);
        let mut entries = self.entries.lock().await;
        let fresh = entries
            .get(&key)
            .filter(|(stored_at, _)| stored_at.elapsed() < self.ttl)
            .map(|(_, record)| record.clone());
        if fresh.is_none() {
            entries.remove(&key);
        }
        fresh
    }

    /// Stores `record` and drops every expired entry, so addresses that are
    /// never looked up again do not accumulate.
    pub async fn insert(&self, record: AccountRecord) {
        let key = normalize_address(&record.address);
        let ttl = self.ttl;
        let mut entries = self.entries.lock().await;
        entries.retain(|_, (stored_at, _)| stored_at.elapsed() < ttl);
        entries.insert(key, (Instant::now(), record));
    }

    pub async fn entry_count(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = RecordCache::new(Duration::from_secs(30));
        cache.insert(AccountRecord::empty("0xAbC")).await;

        assert!(cache.get("0xabc").await.is_some());

        tokio::time::advance(Duration::from_secs(29)).await;
        assert!(cache.get("0xABC").await.is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get("0xabc").await.is_none());
        assert_eq!(cache.entry_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_insert_evicts_expired_entries_of_other_addresses() {
        let cache = RecordCache::new(Duration::from_secs(30));
        for i in 0..1000u32 {
            cache.insert(AccountRecord::empty(&format!("0x{i:040x}"))).await;
        }
        assert_eq!(cache.entry_count().await, 1000);

        tokio::time::advance(Duration::from_secs(3600)).await;
        cache.insert(AccountRecord::empty("0xfeed")).await;
        assert!(cache.get("0xbeef").await.is_none());

        assert_eq!(cache.entry_count().await, 1);
        assert!(cache.get("0xfeed").await.is_some());
    }

    #[tokio::test]
    async fn test_miss_for_unknown_address() {
        let cache = RecordCache::new(Duration::from_secs(30));
        assert!(cache.get("0xdef").await.is_none());
    }
}
