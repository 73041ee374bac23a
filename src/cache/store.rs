//! Cache Store Module
//!
//! The cache engine: one map from keys to tagged values behind one
//! reader/writer lock. Every operation takes the lock exactly once and holds
//! it for the whole operation, so multi-step updates appear atomic.

use std::collections::HashSet;
use std::mem;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use crate::cache::search::sentinel_linear_search;
use crate::cache::stats::{LookupCounters, MemoryStats, StatsSnapshot};
use crate::cache::{Dict, Entries, List, Value, ValueKind};
use crate::error::{CacheError, Result};
use crate::tasks::ExpiryTracker;

// == Cache ==
/// Concurrency-safe typed key-value cache with per-key TTL.
///
/// Cloning is cheap and yields another handle to the same store, so the
/// serving layer can hand it to every request. Independent caches built with
/// [`Cache::new`] share nothing.
#[derive(Debug, Clone, Default)]
pub struct Cache {
    inner: Arc<CacheInner>,
}

#[derive(Debug)]
struct CacheInner {
    /// Key-value storage; the only state guarded by the lock
    entries: Arc<RwLock<Entries>>,
    lookups: LookupCounters,
    expiries: ExpiryTracker,
    created_at: Instant,
}

impl Default for CacheInner {
    fn default() -> Self {
        Self {
            entries: Arc::new(RwLock::new(Entries::new())),
            lookups: LookupCounters::new(),
            expiries: ExpiryTracker::new(),
            created_at: Instant::now(),
        }
    }
}

impl Cache {
    // == Constructor ==
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    // Lock poisoning only follows a panic inside one of the short critical
    // sections below, none of which leave the map half-written.
    fn read(&self) -> RwLockReadGuard<'_, Entries> {
        self.inner.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Entries> {
        self.inner.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    // == Core ==

    /// Number of keys currently present.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Snapshot of all keys.
    pub fn keys(&self) -> HashSet<String> {
        self.read().keys().cloned().collect()
    }

    /// Current counters and process memory usage.
    pub fn stats(&self) -> StatsSnapshot {
        StatsSnapshot {
            keys: self.len(),
            hits: self.inner.lookups.hits(),
            misses: self.inner.lookups.misses(),
            expiries_armed: self.inner.expiries.armed(),
            expiries_fired: self.inner.expiries.fired(),
            uptime_secs: self.inner.created_at.elapsed().as_secs(),
            memory: MemoryStats::current(),
        }
    }

    // == Accessors ==

    /// Returns a copy of the value stored under `key`, whatever its shape.
    pub fn get(&self, key: &str) -> Result<Value> {
        let entries = self.read();
        let result = entries.get(key).cloned().ok_or_else(|| key_not_found(key));
        self.inner.lookups.observe(result)
    }

    /// Returns `list[index]` for the list stored under `key`.
    pub fn get_list_element(&self, key: &str, index: i64) -> Result<String> {
        let entries = self.read();
        let result = list_ref(&entries, key).and_then(|list| {
            usize::try_from(index)
                .ok()
                .and_then(|i| list.get(i))
                .cloned()
                .ok_or(CacheError::IndexOutOfBounds {
                    index,
                    len: list.len(),
                })
        });
        self.inner.lookups.observe(result)
    }

    /// Returns the entry `dict_key` of the dictionary stored under `key`.
    pub fn get_dict_element(&self, key: &str, dict_key: &str) -> Result<String> {
        let entries = self.read();
        let result = dict_ref(&entries, key).and_then(|dict| {
            dict.get(dict_key)
                .cloned()
                .ok_or_else(|| CacheError::DictKeyNotFound(dict_key.to_string()))
        });
        self.inner.lookups.observe(result)
    }

    /// Returns `Ok(true)` if `key` is present. Absence is reported as
    /// [`CacheError::KeyNotFound`], never as `Ok(false)`.
    pub fn has_key(&self, key: &str) -> Result<bool> {
        let entries = self.read();
        let result = if entries.contains_key(key) {
            Ok(true)
        } else {
            Err(key_not_found(key))
        };
        self.inner.lookups.observe(result)
    }

    // == Mutators: create ==

    /// Inserts or overwrites `key` with a string.
    pub fn set_string(&self, key: impl Into<String>, value: impl Into<String>) {
        self.set(key.into(), Value::String(value.into()));
    }

    /// Inserts or overwrites `key` with an integer.
    pub fn set_int(&self, key: impl Into<String>, value: i64) {
        self.set(key.into(), Value::Int(value));
    }

    /// Inserts or overwrites `key` with a list.
    pub fn set_list(&self, key: impl Into<String>, value: List) {
        self.set(key.into(), Value::List(value));
    }

    /// Inserts or overwrites `key` with a dictionary.
    pub fn set_dict(&self, key: impl Into<String>, value: Dict) {
        self.set(key.into(), Value::Dict(value));
    }

    /// Inserts or overwrites `key` with any value.
    pub fn set(&self, key: String, value: Value) {
        self.write().insert(key, value);
    }

    // == Mutators: update ==

    /// Replaces an existing string and returns the previous one.
    pub fn update_string(&self, key: &str, value: impl Into<String>) -> Result<String> {
        match self.replace(key, Value::String(value.into()))? {
            Value::String(old) => Ok(old),
            other => Err(wrong_type(key, ValueKind::String, other.kind())),
        }
    }

    /// Replaces an existing integer and returns the previous one.
    pub fn update_int(&self, key: &str, value: i64) -> Result<i64> {
        match self.replace(key, Value::Int(value))? {
            Value::Int(old) => Ok(old),
            other => Err(wrong_type(key, ValueKind::Int, other.kind())),
        }
    }

    /// Replaces an existing list and returns the previous one.
    pub fn update_list(&self, key: &str, value: List) -> Result<List> {
        match self.replace(key, Value::List(value))? {
            Value::List(old) => Ok(old),
            other => Err(wrong_type(key, ValueKind::List, other.kind())),
        }
    }

    /// Replaces an existing dictionary and returns the previous one.
    pub fn update_dict(&self, key: &str, value: Dict) -> Result<Dict> {
        match self.replace(key, Value::Dict(value))? {
            Value::Dict(old) => Ok(old),
            other => Err(wrong_type(key, ValueKind::Dict, other.kind())),
        }
    }

    /// Swaps in `value` if `key` exists and holds the same shape.
    /// A shape mismatch leaves the stored value untouched.
    fn replace(&self, key: &str, value: Value) -> Result<Value> {
        let mut entries = self.write();
        let slot = entries.get_mut(key).ok_or_else(|| key_not_found(key))?;
        if slot.kind() != value.kind() {
            return Err(wrong_type(key, value.kind(), slot.kind()));
        }
        Ok(mem::replace(slot, value))
    }

    /// Adds 1 to the integer under `key` and returns the new value.
    ///
    /// Read, add and store happen under one write lock, so concurrent
    /// increments never lose updates. Overflow wraps.
    pub fn increment(&self, key: &str) -> Result<i64> {
        let mut entries = self.write();
        match entries.get_mut(key) {
            Some(Value::Int(n)) => {
                *n = n.wrapping_add(1);
                Ok(*n)
            }
            Some(other) => Err(wrong_type(key, ValueKind::Int, other.kind())),
            None => Err(key_not_found(key)),
        }
    }

    /// Appends `element` to the end of the list under `key`.
    pub fn append_to_list(&self, key: &str, element: impl Into<String>) -> Result<()> {
        let mut entries = self.write();
        list_mut(&mut entries, key)?.push(element.into());
        Ok(())
    }

    // == Mutators: delete ==

    /// Deletes `key`. Deleting an absent key is not an error.
    pub fn remove(&self, key: &str) {
        self.write().remove(key);
    }

    /// Removes the first occurrence of `element` from the list under `key`.
    ///
    /// Returns the index it occupied, or `None` when the list does not
    /// contain it; the list is then left as it was.
    pub fn remove_from_list(&self, key: &str, element: &str) -> Result<Option<usize>> {
        let mut entries = self.write();
        let list = list_mut(&mut entries, key)?;
        let index = sentinel_linear_search(list, &element.to_string());
        if let Some(i) = index {
            list.remove(i);
        }
        Ok(index)
    }

    /// Deletes `dict_key` from the dictionary under `key`, if present.
    pub fn remove_from_dict(&self, key: &str, dict_key: &str) -> Result<()> {
        let mut entries = self.write();
        dict_mut(&mut entries, key)?.remove(dict_key);
        Ok(())
    }

    // == TTL ==

    /// Schedules removal of `key` after `ttl_ms` milliseconds.
    ///
    /// A TTL of 0 does nothing. The timer does not require the key to exist,
    /// does not replace earlier timers on the same key, and removes whatever
    /// is stored under `key` when it fires.
    ///
    /// Inside a Tokio runtime the timer is a task on that runtime; elsewhere
    /// it runs on a dedicated thread.
    pub fn set_ttl(&self, key: &str, ttl_ms: i64) -> Result<()> {
        if ttl_ms < 0 {
            return Err(CacheError::InvalidTtl(ttl_ms));
        }
        if ttl_ms == 0 {
            return Ok(());
        }

        self.inner.expiries.arm(
            Arc::downgrade(&self.inner.entries),
            key.to_string(),
            Duration::from_millis(ttl_ms as u64),
        );
        Ok(())
    }

    /// Number of armed TTL timers that have not fired.
    pub fn pending_expiries(&self) -> usize {
        self.inner.expiries.pending()
    }

    /// Aborts all pending TTL timers. Returns how many were aborted.
    pub fn shutdown_expiries(&self) -> usize {
        self.inner.expiries.abort_all()
    }
}

// == Typed Lookups ==

fn key_not_found(key: &str) -> CacheError {
    CacheError::KeyNotFound(key.to_string())
}

fn wrong_type(key: &str, expected: ValueKind, found: ValueKind) -> CacheError {
    CacheError::WrongType {
        key: key.to_string(),
        expected,
        found,
    }
}

fn list_ref<'a>(entries: &'a Entries, key: &str) -> Result<&'a List> {
    match entries.get(key) {
        Some(Value::List(list)) => Ok(list),
        Some(other) => Err(wrong_type(key, ValueKind::List, other.kind())),
        None => Err(key_not_found(key)),
    }
}

fn list_mut<'a>(entries: &'a mut Entries, key: &str) -> Result<&'a mut List> {
    match entries.get_mut(key) {
        Some(Value::List(list)) => Ok(list),
        Some(other) => Err(wrong_type(key, ValueKind::List, other.kind())),
        None => Err(key_not_found(key)),
    }
}

fn dict_ref<'a>(entries: &'a Entries, key: &str) -> Result<&'a Dict> {
    match entries.get(key) {
        Some(Value::Dict(dict)) => Ok(dict),
        Some(other) => Err(wrong_type(key, ValueKind::Dict, other.kind())),
        None => Err(key_not_found(key)),
    }
}

fn dict_mut<'a>(entries: &'a mut Entries, key: &str) -> Result<&'a mut Dict> {
    match entries.get_mut(key) {
        Some(Value::Dict(dict)) => Ok(dict),
        Some(other) => Err(wrong_type(key, ValueKind::Dict, other.kind())),
        None => Err(key_not_found(key)),
    }
}
