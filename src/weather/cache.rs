//! Single-slot TTL cache for forecast results

use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config::DEFAULT_FORECAST_CACHE_SECS;

struct Entry<T> {
    value: T,
    stored_at: Instant,
}

/// Holds the last successful forecast until it is `ttl` old.
pub struct ForecastCache<T> {
    slot: Mutex<Option<Entry<T>>>,
    ttl: Duration,
}

impl<T: Clone> ForecastCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slot: Mutex::new(None),
            ttl,
        }
    }

    /// Current value, or `None` when empty or expired. Expired entries are dropped.
    pub fn get(&self) -> Option<T> {
        let mut slot = self.lock();
        match slot.as_ref() {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => Some(entry.value.clone()),
            Some(_) => {
                *slot = None;
                None
            }
            None => None,
        }
    }

    pub fn set(&self, value: T) {
        *self.lock() = Some(Entry {
            value,
            stored_at: Instant::now(),
        });
    }

    pub fn clear(&self) {
        *self.lock() = None;
    }

    pub fn is_valid(&self) -> bool {
        self.lock()
            .as_ref()
            .is_some_and(|entry| entry.stored_at.elapsed() < self.ttl)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Entry<T>>> {
        // a poisoned slot only means a panic mid-write; the data is still usable
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T: Clone> Default for ForecastCache<T> {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_FORECAST_CACHE_SECS))
    }
}
