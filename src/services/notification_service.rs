use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use crate::error::{Error, Result};

struct ThrottleState {
    permits: Semaphore,
    next_start: Mutex<Instant>,
    min_interval: Duration,
}

/// Process-wide gate for outbound bot messages.
///
/// Jobs start at least `min_interval` apart, at most `max_concurrent` run at
/// once, and waiting jobs are admitted in arrival order. Nothing is dropped.
#[derive(Clone)]
pub struct NotificationThrottle {
    state: Arc<ThrottleState>,
}

impl NotificationThrottle {
    pub fn new(per_second: u32, max_concurrent: usize) -> Self {
        let min_interval = Duration::from_millis(1000 / u64::from(per_second.max(1)));
        Self::with_interval(min_interval, max_concurrent)
    }

    pub fn with_interval(min_interval: Duration, max_concurrent: usize) -> Self {
        Self {
            state: Arc::new(ThrottleState {
                permits: Semaphore::new(max_concurrent.max(1)),
                next_start: Mutex::new(Instant::now()),
                min_interval,
            }),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.state.min_interval
    }

    /// Queues `job` on its own task right away; the returned future waits
    /// for its output.
    ///
    /// The job keeps its place in the queue and still runs if the caller
    /// stops waiting.
    pub fn schedule<F, T>(&self, job: F) -> impl Future<Output = Result<T>>
    where
        F: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let handle = self.spawn(job);
        async move {
            handle
                .await
                .map_err(|e| Error::Internal(format!("notification job failed: {}", e)))?
        }
    }

    /// Queues `job` on its own task and returns a handle to its output.
    pub fn spawn<F, T>(&self, job: F) -> JoinHandle<Result<T>>
    where
        F: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let state = self.state.clone();
        tokio::spawn(async move {
            let _permit = state
                .permits
                .acquire()
                .await
                .map_err(|e| Error::Internal(format!("notification throttle closed: {}", e)))?;

            {
                let mut next_start = state.next_start.lock().await;
                let start = (*next_start).max(Instant::now());
                sleep_until(start).await;
                *next_start = start + state.min_interval;
            }

            job.await
        })
    }
}

impl Default for NotificationThrottle {
    fn default() -> Self {
        Self::new(2, 1)
    }
}
