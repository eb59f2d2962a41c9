//! Store Entry Module
//!
//! A value held by the in-memory store, with an optional expiry deadline.

// == Store Entry ==
/// A single stored value and its deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEntry {
    /// The stored value
    pub value: String,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl StoreEntry {
    // == Constructor ==
    /// Creates an entry that expires `ttl_seconds` after `now_ms`, or never.
    pub fn new(value: String, ttl_seconds: Option<u64>, now_ms: u64) -> Self {
        let expires_at = ttl_seconds.map(|ttl| now_ms.saturating_add(ttl.saturating_mul(1000)));
        Self { value, expires_at }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now_ms`.
    ///
    /// An entry is expired once `now_ms` reaches its deadline.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        match self.expires_at {
            Some(expires) => now_ms >= expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns remaining TTL in whole seconds, or None if no expiration is set.
    pub fn ttl_remaining(&self, now_ms: u64) -> Option<u64> {
        self.expires_at
            .map(|expires| expires.saturating_sub(now_ms) / 1000)
    }
}
