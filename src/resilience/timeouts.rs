//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap upstream calls (forwarding, health probes) with a deadline
//! - Report the limit that was exceeded so callers can log and classify it
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; the wrapped future is dropped on expiry
//! - Timeout errors are distinct from other errors
//! - Static serving and rendering are not wrapped here

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// A deadline passed before the wrapped operation finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("deadline of {0:?} elapsed")]
pub struct Elapsed(Duration);

impl Elapsed {
    /// The limit that was exceeded.
    pub fn limit(&self) -> Duration {
        self.0
    }
}

/// Run `future` to completion or fail with [`Elapsed`] after `limit`.
pub async fn with_deadline<F>(limit: Duration, future: F) -> Result<F::Output, Elapsed>
where
    F: Future,
{
    tokio::time::timeout(limit, future)
        .await
        .map_err(|_| Elapsed(limit))
}
