//! Help usage statistics
//!
//! Counters live for the lifetime of the process and are never persisted.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;

/// Usage record of one help target
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HelpStats {
    pub total_usage: u64,
    pub last_used: DateTime<Utc>,
}

/// Aggregate view over all tracked targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSummary {
    pub total_usage: u64,
    pub distinct_keys: usize,
}

/// Process-wide help statistics keyed by target (or `global`)
#[derive(Debug)]
pub struct HelpStatistics {
    enabled: bool,
    stats: DashMap<String, HelpStats>,
}

impl HelpStatistics {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            stats: DashMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Count one use of `key`
    pub fn record(&self, key: &str) {
        if !self.enabled {
            return;
        }
        let now = Utc::now();
        self.stats
            .entry(key.to_string())
            .and_modify(|s| {
                s.total_usage += 1;
                s.last_used = now;
            })
            .or_insert(HelpStats {
                total_usage: 1,
                last_used: now,
            });
    }

    pub fn get(&self, key: &str) -> Option<HelpStats> {
        self.stats.get(key).map(|s| s.clone())
    }

    /// `None` when statistics are disabled
    pub fn summary(&self) -> Option<StatsSummary> {
        if !self.enabled {
            return None;
        }
        Some(StatsSummary {
            total_usage: self.stats.iter().map(|s| s.total_usage).sum(),
            distinct_keys: self.stats.len(),
        })
    }

    /// Most used targets, highest first
    pub fn top(&self, limit: usize) -> Vec<(String, u64)> {
        let mut entries: Vec<(String, u64)> = self
            .stats
            .iter()
            .map(|s| (s.key().clone(), s.total_usage))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries.truncate(limit);
        entries
    }

    pub fn reset(&self) {
        self.stats.clear();
    }
}

impl Default for HelpStatistics {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_summary() {
        let stats = HelpStatistics::new(true);
        stats.record("global");
        stats.record("echo");
        stats.record("echo");

        let summary = stats.summary().unwrap();
        assert_eq!(summary.total_usage, 3);
        assert_eq!(summary.distinct_keys, 2);
        assert_eq!(stats.get("echo").unwrap().total_usage, 2);
        assert_eq!(stats.top(1), vec![("echo".to_string(), 2)]);

        // Reading the summary does not change it
        assert_eq!(stats.summary(), Some(summary));
    }

    #[test]
    fn test_disabled_is_noop() {
        let stats = HelpStatistics::new(false);
        for _ in 0..5 {
            stats.record("global");
        }
        assert!(stats.summary().is_none());
        assert!(stats.get("global").is_none());
    }

    #[test]
    fn test_last_used_advances() {
        let stats = HelpStatistics::new(true);
        stats.record("echo");
        let first = stats.get("echo").unwrap().last_used;
        stats.record("echo");
        assert!(stats.get("echo").unwrap().last_used >= first);
    }

    #[test]
    fn test_summary_serializes() {
        let stats = HelpStatistics::new(true);
        stats.record("echo");
        let json = serde_json::to_value(stats.summary().unwrap()).unwrap();
        assert_eq!(json, serde_json::json!({ "total_usage": 1, "distinct_keys": 1 }));
        assert!(serde_json::to_value(stats.get("echo").unwrap()).unwrap()["last_used"].is_string());
    }

    #[test]
    fn test_reset() {
        let stats = HelpStatistics::new(true);
        stats.record("echo");
        stats.reset();
        assert_eq!(stats.summary().unwrap().distinct_keys, 0);
    }
}
