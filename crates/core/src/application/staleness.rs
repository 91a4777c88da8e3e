// Staleness Filter - late commands are dropped, not retried

use crate::domain::Event;
use crate::port::TimeProvider;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// `true` when `now` is strictly past `arrived_at + ttl`.
///
/// A TTL too large to represent never expires.
pub fn is_expired(arrived_at: DateTime<Utc>, ttl: Duration, now: DateTime<Utc>) -> bool {
    let Ok(ttl) = chrono::Duration::from_std(ttl) else {
        return false;
    };
    match arrived_at.checked_add_signed(ttl) {
        Some(expiration) => now > expiration,
        None => false,
    }
}

/// Applies the configured TTL against the injected clock
pub struct StalenessFilter {
    ttl: Duration,
    time_provider: Arc<dyn TimeProvider>,
}

impl StalenessFilter {
    pub fn new(ttl: Duration, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self { ttl, time_provider }
    }

    pub fn is_expired(&self, event: &Event) -> bool {
        is_expired(event.arrived_at, self.ttl, self.time_provider.now())
    }
}
