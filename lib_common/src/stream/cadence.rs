//! Producer-side send gate.
//!
//! The simulation loop ticks far faster than the collector needs data, so
//! the producer throttles itself to at most one snapshot per interval of
//! wall-clock time. This is producer policy only; the queue does not
//! enforce it.

use std::time::{Duration, Instant};

/// Wall-clock throttle: `ready()` answers true at most once per interval.
#[derive(Debug)]
pub struct SendGate {
    interval: Duration,
    last_send: Option<Instant>,
}

impl SendGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_send: None,
        }
    }

    /// True if a full interval has elapsed since the last accepted call
    /// (the first call is always accepted). Advances the gate when true.
    pub fn ready(&mut self) -> bool {
        match self.last_send {
            Some(last) if last.elapsed() < self.interval => false,
            _ => {
                self.last_send = Some(Instant::now());
                true
            }
        }
    }
}
