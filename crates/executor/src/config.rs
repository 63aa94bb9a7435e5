//! # Pod dialect configuration
//!
//! The one piece of run-time configuration the spec calls for (§9 "small
//! policy object" around the 409 retry ladder): whether to run it at all,
//! how long cached resource bodies stay fresh, and whether inserts pay for
//! the duplicate-subject body scan.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct PodDialectConfig {
    /// Whether a 409 on PATCH triggers the replay-then-PUT retry ladder
    /// (§4.4.5). Disabling this is an escape hatch for Pod servers that
    /// don't exhibit the lost-update behavior the ladder works around.
    pub retry_409: bool,
    /// TTL for the response-body cache keyed by resource URL (§5 "Shared
    /// resources").
    pub cache_ttl: Duration,
    /// Whether insert scans the resource body for a literal substring
    /// match of each new subject URI before writing (§4.4.2 step 2).
    pub duplicate_id_scan: bool,
}

impl Default for PodDialectConfig {
    fn default() -> Self {
        Self {
            retry_409: true,
            cache_ttl: Duration::from_secs(5 * 60),
            duplicate_id_scan: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_values() {
        let config = PodDialectConfig::default();
        assert!(config.retry_409);
        assert!(config.duplicate_id_scan);
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
    }
}
