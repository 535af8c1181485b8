//! Single-entry memo of the last query result.
//!
//! A particle model asks every field for the same point set several times
//! within one time step (each mover, each weatherer). [`ResultCache`] keeps
//! the most recent `(points, time) -> result` pair. Keys are an FxHash of
//! the raw coordinate bits and the timestamp; a hash hit is confirmed by
//! comparing the stored points, so a collision can never return another
//! query's result.

use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rustc_hash::FxHasher;

use crate::types::Point3;

/// Hash a query (point coordinates and time).
///
/// Callers sampling several fields with the same points compute this once
/// and pass it through [`SampleOptions::with_hash`](super::SampleOptions::with_hash).
pub fn query_hash(points: &[Point3], time: DateTime<Utc>) -> u64 {
    let mut hasher = FxHasher::default();
    points.len().hash(&mut hasher);
    for p in points {
        for c in p {
            c.to_bits().hash(&mut hasher);
        }
    }
    time.timestamp().hash(&mut hasher);
    time.timestamp_subsec_nanos().hash(&mut hasher);
    hasher.finish()
}

/// Lookup key of a cached result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueryKey {
    pub hash: u64,
    pub time: DateTime<Utc>,
    pub extrapolate: bool,
}

#[derive(Debug)]
struct CacheEntry<T> {
    key: QueryKey,
    points: Vec<Point3>,
    result: T,
}

fn same_points(a: &[Point3], b: &[Point3]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(p, q)| p.iter().zip(q).all(|(x, y)| x.to_bits() == y.to_bits()))
}

/// Hit/miss counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
}

/// Thread-safe memo of the most recent result.
#[derive(Debug)]
pub struct ResultCache<T> {
    entry: Mutex<Option<CacheEntry<T>>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl<T> Default for ResultCache<T> {
    fn default() -> Self {
        Self {
            entry: Mutex::new(None),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }
}

impl<T: Clone> ResultCache<T> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached result for this exact query, if any.
    pub fn get(&self, key: &QueryKey, points: &[Point3]) -> Option<T> {
        let guard = self.entry.lock();
        match guard.as_ref() {
            Some(entry) if entry.key == *key && same_points(&entry.points, points) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(hash = key.hash, "cache hit");
                Some(entry.result.clone())
            }
            _ => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a result, replacing the previous one.
    pub fn put(&self, key: QueryKey, points: &[Point3], result: T) {
        *self.entry.lock() = Some(CacheEntry {
            key,
            points: points.to_vec(),
            result,
        });
    }

    /// Drop the stored result.
    pub fn invalidate(&self) {
        *self.entry.lock() = None;
    }

    /// Whether a result is stored.
    pub fn is_populated(&self) -> bool {
        self.entry.lock().is_some()
    }

    /// Hit/miss counters since creation.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
