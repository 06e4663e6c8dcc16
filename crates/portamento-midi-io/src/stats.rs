//! Diagnostic counters for an input session.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Point-in-time copy of a session's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Messages decoded and delivered.
    pub decoded: u64,
    /// Empty or truncated buffers dropped by the decoder.
    pub truncated: u64,
    /// Messages dropped by the ignore filter.
    pub filtered: u64,
    /// Messages lost to queue overflow.
    pub overflowed: u64,
}

/// Live counters written from the transport callback thread.
#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    decoded: AtomicU64,
    truncated: AtomicU64,
    filtered: AtomicU64,
}

impl StatsCounters {
    #[inline]
    pub(crate) fn record_decoded(&self) {
        self.decoded.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_truncated(&self) {
        self.truncated.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_filtered(&self) {
        self.filtered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, overflowed: u64) -> SessionStats {
        SessionStats {
            decoded: self.decoded.load(Ordering::Relaxed),
            truncated: self.truncated.load(Ordering::Relaxed),
            filtered: self.filtered.load(Ordering::Relaxed),
            overflowed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot() {
        let counters = StatsCounters::default();
        counters.record_decoded();
        counters.record_decoded();
        counters.record_truncated();
        counters.record_filtered();

        insta::assert_yaml_snapshot!(counters.snapshot(4), @r###"
        decoded: 2
        truncated: 1
        filtered: 1
        overflowed: 4
        "###);
    }
}
