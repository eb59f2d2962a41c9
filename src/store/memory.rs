//! Memory Store Module
//!
//! In-process `Store` with Redis string semantics. Used as the store double in
//! tests: time comes from a `Clock`, every call is counted, and failures can
//! be injected.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value as JsonValue};

use crate::error::{StoreError, StoreResult};
use crate::store::{glob_match, Clock, Store, StoreEntry, SystemClock};

// == Memory Store ==
/// HashMap-backed store with lazy expiry.
pub struct MemoryStore {
    /// Key-value storage
    entries: Mutex<HashMap<String, StoreEntry>>,
    /// Time source for expiry
    clock: Arc<dyn Clock>,
    /// Number of store calls received
    calls: AtomicU64,
    /// Number of upcoming calls that fail with a command error
    failures: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    // == Constructors ==
    /// Creates an empty store on wall-clock time.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty store reading time from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
            calls: AtomicU64::new(0),
            failures: AtomicUsize::new(0),
        }
    }

    // == Test Hooks ==
    /// Number of store calls received so far.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Makes the next `n` calls fail with a command error.
    pub fn fail_next(&self, n: usize) {
        self.failures.store(n, Ordering::SeqCst);
    }

    /// Whether `key` holds a live value.
    pub fn contains(&self, key: &str) -> bool {
        let now = self.clock.now_ms();
        self.entries
            .lock()
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now))
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        let now = self.clock.now_ms();
        self.entries
            .lock()
            .values()
            .filter(|entry| !entry.is_expired(now))
            .count()
    }

    /// Returns true if no live keys exist.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn record_call(&self) -> StoreResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let injected = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(StoreError::Command("ERR injected failure".to_string()));
        }
        Ok(())
    }

    // == Operations ==
    // Callers hold the map lock; expired entries are dropped on first touch.

    fn live<'a>(
        entries: &'a mut HashMap<String, StoreEntry>,
        key: &str,
        now: u64,
    ) -> Option<&'a mut StoreEntry> {
        if entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
            entries.remove(key);
        }
        entries.get_mut(key)
    }

    fn do_keys(&self, pattern: &str) -> Vec<String> {
        let now = self.clock.now_ms();
        let mut entries = self.entries.lock();
        entries.retain(|_, entry| !entry.is_expired(now));
        let mut keys: Vec<String> = entries
            .keys()
            .filter(|key| glob_match(pattern, key))
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    fn do_get(&self, key: &str) -> Option<String> {
        let now = self.clock.now_ms();
        let mut entries = self.entries.lock();
        Self::live(&mut entries, key, now).map(|entry| entry.value.clone())
    }

    fn do_set(&self, key: &str, value: &str, ttl: Option<u64>) {
        let now = self.clock.now_ms();
        self.entries
            .lock()
            .insert(key.to_string(), StoreEntry::new(value.to_string(), ttl, now));
    }

    fn do_del(&self, keys: &[String]) -> u64 {
        let now = self.clock.now_ms();
        let mut entries = self.entries.lock();
        keys.iter()
            .filter(|key| {
                entries
                    .remove(key.as_str())
                    .is_some_and(|entry| !entry.is_expired(now))
            })
            .count() as u64
    }

    fn do_exists(&self, keys: &[String]) -> u64 {
        let now = self.clock.now_ms();
        let mut entries = self.entries.lock();
        keys.iter()
            .filter(|key| Self::live(&mut entries, key, now).is_some())
            .count() as u64
    }

    fn do_incr_by(&self, key: &str, by: i64) -> StoreResult<i64> {
        let now = self.clock.now_ms();
        let mut entries = self.entries.lock();
        let current = match Self::live(&mut entries, key, now) {
            Some(entry) => entry.value.parse::<i64>().map_err(|_| {
                StoreError::Command("ERR value is not an integer or out of range".to_string())
            })?,
            None => 0,
        };
        let next = current.checked_add(by).ok_or_else(|| {
            StoreError::Command("ERR increment or decrement would overflow".to_string())
        })?;

        // INCRBY keeps an existing expiry
        match entries.get_mut(key) {
            Some(entry) => entry.value = next.to_string(),
            None => {
                entries.insert(key.to_string(), StoreEntry::new(next.to_string(), None, now));
            }
        }
        Ok(next)
    }

    fn do_ttl(&self, key: &str) -> i64 {
        let now = self.clock.now_ms();
        let mut entries = self.entries.lock();
        match Self::live(&mut entries, key, now) {
            None => -2,
            Some(entry) => entry
                .ttl_remaining(now)
                .map(|secs| secs as i64)
                .unwrap_or(-1),
        }
    }

    fn dispatch(&self, name: &str, args: &[String]) -> StoreResult<JsonValue> {
        let upper = name.to_ascii_uppercase();
        let arity = |ok: bool| {
            if ok {
                Ok(())
            } else {
                Err(StoreError::Command(format!(
                    "ERR wrong number of arguments for '{}' command",
                    name.to_ascii_lowercase()
                )))
            }
        };

        match upper.as_str() {
            "PING" => {
                arity(args.len() <= 1)?;
                Ok(json!(args.first().map(String::as_str).unwrap_or("PONG")))
            }
            "ECHO" => {
                arity(args.len() == 1)?;
                Ok(json!(args[0]))
            }
            "GET" => {
                arity(args.len() == 1)?;
                Ok(json!(self.do_get(&args[0])))
            }
            "SET" => {
                arity(args.len() == 2)?;
                self.do_set(&args[0], &args[1], None);
                Ok(json!("OK"))
            }
            "SETEX" => {
                arity(args.len() == 3)?;
                let seconds = args[1]
                    .parse::<u64>()
                    .ok()
                    .filter(|s| *s > 0)
                    .ok_or_else(|| {
                        StoreError::Command("ERR invalid expire time in 'setex' command".to_string())
                    })?;
                self.do_set(&args[0], &args[2], Some(seconds));
                Ok(json!("OK"))
            }
            "DEL" => {
                arity(!args.is_empty())?;
                Ok(json!(self.do_del(args)))
            }
            "EXISTS" => {
                arity(!args.is_empty())?;
                Ok(json!(self.do_exists(args)))
            }
            "KEYS" => {
                arity(args.len() == 1)?;
                Ok(json!(self.do_keys(&args[0])))
            }
            "INCR" => {
                arity(args.len() == 1)?;
                Ok(json!(self.do_incr_by(&args[0], 1)?))
            }
            "INCRBY" => {
                arity(args.len() == 2)?;
                let by = args[1].parse::<i64>().map_err(|_| {
                    StoreError::Command("ERR value is not an integer or out of range".to_string())
                })?;
                Ok(json!(self.do_incr_by(&args[0], by)?))
            }
            "TTL" => {
                arity(args.len() == 1)?;
                Ok(json!(self.do_ttl(&args[0])))
            }
            "DBSIZE" => {
                arity(args.is_empty())?;
                Ok(json!(self.len()))
            }
            "FLUSHALL" | "FLUSHDB" => {
                self.entries.lock().clear();
                Ok(json!("OK"))
            }
            _ => Err(StoreError::Command(format!("ERR unknown command '{}'", name))),
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn keys(&self, pattern: &str) -> StoreResult<Vec<String>> {
        self.record_call()?;
        Ok(self.do_keys(pattern))
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.record_call()?;
        Ok(self.do_get(key))
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.record_call()?;
        self.do_set(key, value, None);
        Ok(())
    }

    async fn set_ex(&self, key: &str, seconds: u64, value: &str) -> StoreResult<()> {
        self.record_call()?;
        if seconds == 0 {
            return Err(StoreError::Command(
                "ERR invalid expire time in 'setex' command".to_string(),
            ));
        }
        self.do_set(key, value, Some(seconds));
        Ok(())
    }

    async fn del(&self, keys: &[String]) -> StoreResult<u64> {
        self.record_call()?;
        Ok(self.do_del(keys))
    }

    async fn incr_by(&self, key: &str, by: i64) -> StoreResult<i64> {
        self.record_call()?;
        self.do_incr_by(key, by)
    }

    async fn command(&self, name: &str, args: &[String]) -> StoreResult<JsonValue> {
        self.record_call()?;
        self.dispatch(name, args)
    }

    async fn quit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}
