//! Background sweeper that finishes interviews left open past their time limit.
//!
//! Expired interviews are only marked finished. They are not scored and get
//! no feedback; `recalculate-score` can score them later.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::errors::AppError;
use crate::repository::Repository;

/// Pause after a failed sweep before the loop resumes its normal interval.
const ERROR_BACKOFF: Duration = Duration::from_secs(5 * 60);

pub struct ExpirationSweeper {
    repo: Arc<dyn Repository>,
    interval: Duration,
    max_duration: chrono::Duration,
    shutdown: Arc<AtomicBool>,
}

impl ExpirationSweeper {
    pub fn new(
        repo: Arc<dyn Repository>,
        interval: Duration,
        max_duration: chrono::Duration,
    ) -> Self {
        Self {
            repo,
            interval,
            max_duration,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Runs one pass. Returns the ids of interviews finished by this pass.
    pub async fn sweep_once(&self) -> Result<Vec<i64>, AppError> {
        expire_stale_interviews(self.repo.as_ref(), self.max_duration).await
    }

    /// Starts the sweep loop on the current runtime.
    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut timer = tokio::time::interval(self.interval);
            timer.tick().await; // skip immediate first tick

            info!(
                "Interview expiration sweeper running every {}s (limit {} min)",
                self.interval.as_secs(),
                self.max_duration.num_minutes()
            );

            loop {
                timer.tick().await;
                if self.shutdown.load(Ordering::Acquire) {
                    break;
                }

                if let Err(e) = self.sweep_once().await {
                    error!("Interview expiration sweep failed: {e}");
                    tokio::time::sleep(ERROR_BACKOFF).await;
                    timer.reset();
                }
            }
        })
    }

    /// Signals the loop to exit at its next tick.
    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::Release);
    }
}

/// Finishes every open interview started more than `max_duration` ago.
pub async fn expire_stale_interviews(
    repo: &dyn Repository,
    max_duration: chrono::Duration,
) -> Result<Vec<i64>, AppError> {
    let now = Utc::now();
    let expired = repo.expire_interviews(now - max_duration, now).await?;
    if !expired.is_empty() {
        info!("Expired {} interview(s): {:?}", expired.len(), expired);
    }
    Ok(expired)
}
