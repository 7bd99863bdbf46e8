//! Retry helper for SQLite lock contention
//!
//! Concurrent branch writes can hit SQLITE_BUSY under load. Lock errors
//! are retried with exponential backoff; every other error propagates
//! immediately.

use std::future::Future;
use std::time::{Duration, Instant};

use opsdesk_common::{Error, Result};
use tracing::warn;

/// Upper bound on total wait before a locked write gives up
pub const DB_MAX_LOCK_WAIT_MS: u64 = 2_000;

const INITIAL_DELAY_MS: u64 = 10;
const MAX_DELAY_MS: u64 = 1_000;

/// Runs `operation`, retrying while SQLite reports the database locked.
///
/// Backoff doubles from 10ms up to a 1s cap. Gives up with an error once
/// `max_wait_ms` of total elapsed time has passed.
pub async fn retry_on_lock<T, F, Fut>(
    operation_name: &str,
    max_wait_ms: u64,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let start = Instant::now();
    let mut delay_ms = INITIAL_DELAY_MS;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_locked() => {
                let elapsed_ms = start.elapsed().as_millis() as u64;
                if elapsed_ms >= max_wait_ms {
                    return Err(Error::Internal(format!(
                        "{} still locked after {}ms",
                        operation_name, elapsed_ms
                    )));
                }
                warn!(
                    "{}: database locked, retrying in {}ms",
                    operation_name, delay_ms
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                delay_ms = (delay_ms * 2).min(MAX_DELAY_MS);
            }
            Err(e) => return Err(e),
        }
    }
}
