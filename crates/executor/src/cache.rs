//! # Resource body cache
//!
//! A pure optimization (§9 "Caching invalidation"): a TTL'd map from
//! resource URL to its last-fetched Turtle body, used by the duplicate-ID
//! scan on insert so repeated inserts into the same resource don't each
//! pay for a fresh GET. Correctness never depends on this cache being
//! warm — it is invalidated synchronously after every successful write to
//! the URL it covers.

use std::collections::HashMap;
use std::time::{Duration, Instant};

struct Entry {
    body: String,
    inserted: Instant,
}

#[derive(Default)]
pub struct ResponseCache {
    entries: HashMap<String, Entry>,
}

impl ResponseCache {
    pub fn get(&self, url: &str, ttl: Duration) -> Option<String> {
        self.entries.get(url).and_then(|entry| {
            if entry.inserted.elapsed() < ttl {
                Some(entry.body.clone())
            } else {
                None
            }
        })
    }

    pub fn insert(&mut self, url: String, body: String) {
        self.entries.insert(
            url,
            Entry {
                body,
                inserted: Instant::now(),
            },
        );
    }

    pub fn invalidate(&mut self, url: &str) {
        self.entries.remove(url);
    }
}
