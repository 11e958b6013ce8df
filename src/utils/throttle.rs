//! Write pacing for chunk uploads.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

/// Held while a throttled request is in flight.
pub struct ThrottlePermit {
    _permit: Option<OwnedSemaphorePermit>,
}

#[async_trait]
pub trait Throttle: Send + Sync {
    /// Waits until the next request may start.
    async fn acquire(&self) -> ThrottlePermit;
}

/// Lets every request through immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unthrottled;

#[async_trait]
impl Throttle for Unthrottled {
    async fn acquire(&self) -> ThrottlePermit {
        ThrottlePermit { _permit: None }
    }
}

/// One request at a time, with at least `min_interval` between request starts.
pub struct RateLimiter {
    slots: Arc<Semaphore>,
    min_interval: Duration,
    last_start: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            slots: Arc::new(Semaphore::new(1)),
            min_interval,
            last_start: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

#[async_trait]
impl Throttle for RateLimiter {
    async fn acquire(&self) -> ThrottlePermit {
        // The semaphore is never closed, so acquisition only fails if it were.
        let permit = self.slots.clone().acquire_owned().await.ok();
        let mut last = self.last_start.lock().await;
        if let Some(prev) = *last {
            tokio::time::sleep_until(prev + self.min_interval).await;
        }
        *last = Some(Instant::now());
        ThrottlePermit { _permit: permit }
    }
}
