use crate::constants::SYNC_INTERVAL_MS;

/// Rate limiter for outbound player snapshots. Timestamps come from the
/// caller so the core never reads a clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyncThrottle {
    interval_ms: u64,
    last_sent: Option<u64>,
}

impl Default for SyncThrottle {
    fn default() -> Self {
        SyncThrottle::new(SYNC_INTERVAL_MS)
    }
}

impl SyncThrottle {
    /// Intervals below the default are raised to it.
    pub fn new(interval_ms: u64) -> Self {
        SyncThrottle {
            interval_ms: interval_ms.max(SYNC_INTERVAL_MS),
            last_sent: None,
        }
    }

    /// Records an emission at `now_ms` and returns true when the interval has
    /// elapsed since the last one. The first call always emits.
    pub fn ready(&mut self, now_ms: u64) -> bool {
        let due = match self.last_sent {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.interval_ms,
        };
        if due {
            self.last_sent = Some(now_ms);
        }
        due
    }
}
