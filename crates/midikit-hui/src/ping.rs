//! Ping/handshake bookkeeping.
//!
//! The host sends a ping once a second; a surface that stays silent for
//! three seconds is considered absent. The monitor holds no timer of its
//! own: the caller supplies instants, so the core stays free of I/O and
//! scheduling.

use std::time::{Duration, Instant};

/// Host-side ping cadence.
pub const PING_INTERVAL: Duration = Duration::from_secs(1);
/// Silence after which the surface is considered absent.
pub const PING_TIMEOUT: Duration = Duration::from_secs(3);

/// Tracks ping traffic for one surface link.
#[derive(Debug, Default)]
pub struct PingMonitor {
    last_ping_sent: Option<Instant>,
    last_reply: Option<Instant>,
    was_present: bool,
}

impl PingMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a ping is due at `now`.
    pub fn should_send_ping(&self, now: Instant) -> bool {
        self.last_ping_sent
            .map_or(true, |last| now.duration_since(last) >= PING_INTERVAL)
    }

    pub fn record_ping_sent(&mut self, now: Instant) {
        self.last_ping_sent = Some(now);
    }

    /// Records a ping reply (or any proof-of-life traffic) from the
    /// surface.
    pub fn record_reply(&mut self, now: Instant) {
        self.last_reply = Some(now);
    }

    /// Whether the surface has replied within the timeout. Logs presence
    /// transitions.
    pub fn is_present(&mut self, now: Instant) -> bool {
        let present = self
            .last_reply
            .is_some_and(|last| now.duration_since(last) < PING_TIMEOUT);
        if present != self.was_present {
            if present {
                tracing::debug!("hui surface present");
            } else {
                tracing::debug!("hui surface lost (no ping reply within timeout)");
            }
            self.was_present = present;
        }
        present
    }
}
