//! Cache Statistics Module
//!
//! Lookup counters kept by the cache plus process memory figures read from
//! the operating system at snapshot time.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

// == Lookup Counters ==
/// Hit/miss counters updated from the read path.
///
/// Atomics, so readers holding only the shared lock can record lookups.
#[derive(Debug, Default)]
pub struct LookupCounters {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl LookupCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a hit for `Ok`, a miss for `Err`, and passes the result through.
    pub fn observe<T, E>(&self, result: Result<T, E>) -> Result<T, E> {
        match result {
            Ok(_) => self.record_hit(),
            Err(_) => self.record_miss(),
        }
        result
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

// == Memory Stats ==
/// Process memory usage in bytes, `None` where the platform does not report it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStats {
    pub resident_bytes: Option<u64>,
    pub virtual_bytes: Option<u64>,
}

impl MemoryStats {
    /// Reads current process memory usage.
    pub fn current() -> Self {
        #[cfg(target_os = "linux")]
        {
            match std::fs::read_to_string("/proc/self/status") {
                Ok(status) => Self::parse_proc_status(&status),
                Err(_) => Self::default(),
            }
        }

        #[cfg(not(target_os = "linux"))]
        {
            Self::default()
        }
    }

    /// Parses the `VmRSS` and `VmSize` lines of a `/proc/<pid>/status` file.
    pub fn parse_proc_status(status: &str) -> Self {
        let mut stats = Self::default();
        for line in status.lines() {
            if let Some(rest) = line.strip_prefix("VmRSS:") {
                stats.resident_bytes = parse_kib(rest);
            } else if let Some(rest) = line.strip_prefix("VmSize:") {
                stats.virtual_bytes = parse_kib(rest);
            }
        }
        stats
    }
}

fn parse_kib(field: &str) -> Option<u64> {
    let mut parts = field.split_whitespace();
    let amount: u64 = parts.next()?.parse().ok()?;
    match parts.next() {
        Some("kB") | None => Some(amount * 1024),
        Some(_) => None,
    }
}

// == Stats Snapshot ==
/// Point-in-time view returned by `Cache::stats`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Keys present when the snapshot was taken
    pub keys: usize,
    /// Successful read-path lookups
    pub hits: u64,
    /// Failed read-path lookups
    pub misses: u64,
    /// TTL timers armed since start
    pub expiries_armed: u64,
    /// TTL timers that have fired
    pub expiries_fired: u64,
    /// Seconds since the cache was created
    pub uptime_secs: u64,
    pub memory: MemoryStats,
}

impl StatsSnapshot {
    /// Hits over total lookups, 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
