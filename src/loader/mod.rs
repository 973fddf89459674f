//! Async tile loader seam and its absent-tracker integration.
//!
//! The loader itself lives outside this crate (network, disk, whatever);
//! this module defines the contract and routes fetch outcomes into the
//! owning level's retry limiter so hopeless tiles stop being requested.

use crate::pyramid::{Level, LevelPyramid, TileAddress};
use bytes::Bytes;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Boxed future returned by loader trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Errors a fetch can resolve to.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    /// The retry limiter says this resource should not be attempted now.
    #[error("Resource {0} is marked unavailable, retry suppressed")]
    Unavailable(String),

    /// Transport or decode failure reported by the loader.
    #[error("Fetch failed: {0}")]
    Failed(String),

    /// The fetch was cancelled before completion.
    #[error("Fetch cancelled")]
    Cancelled,
}

/// Resolves a tile address to raw bytes, asynchronously.
///
/// Implementations run on their own worker pool; completions race
/// arbitrarily against each other and against the render thread.
pub trait TileLoader: Send + Sync {
    fn fetch(&self, address: &TileAddress) -> BoxFuture<'_, Result<Bytes, FetchError>>;
}

/// Whether a fetch for this address is worth starting.
///
/// False when the address lies outside the pyramid's levels or its level's
/// tracker currently reports it absent.
pub fn should_attempt(pyramid: &LevelPyramid, address: &TileAddress) -> bool {
    match pyramid.level(address.level_number()) {
        None => false,
        Some(level) => !level.is_absent(address),
    }
}

/// Route a completed fetch into the level's retry limiter.
///
/// Success removes the failure record; a failure adds to it. Cancellation
/// says nothing about the resource and leaves the record untouched.
pub fn record_fetch_outcome<T>(
    level: &Level,
    address: &TileAddress,
    outcome: &Result<T, FetchError>,
) {
    match outcome {
        Ok(_) => level.unmark_absent(address),
        Err(FetchError::Cancelled) => {}
        Err(err) => {
            tracing::warn!(address = %address, error = %err, "Tile fetch failed");
            level.mark_absent(address);
        }
    }
}

/// Fetch with retry limiting: skip absent tiles, record the outcome.
///
/// Returns [`FetchError::Unavailable`] without calling the loader when the
/// tile's tracker suppresses the attempt.
pub async fn fetch_tracked(
    loader: &dyn TileLoader,
    level: &Level,
    address: &TileAddress,
) -> Result<Bytes, FetchError> {
    if level.is_absent(address) {
        return Err(FetchError::Unavailable(address.to_string()));
    }
    let outcome = loader.fetch(address).await;
    record_fetch_outcome(level, address, &outcome);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PyramidSettings, RetrySettings};
    use crate::pyramid::LevelPyramid;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Loader that fails a configurable number of times, then succeeds.
    struct FlakyLoader {
        failures_remaining: AtomicUsize,
        calls: AtomicUsize,
    }

    impl FlakyLoader {
        fn new(failures: usize) -> Self {
            Self {
                failures_remaining: AtomicUsize::new(failures),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl TileLoader for FlakyLoader {
        fn fetch(&self, _address: &TileAddress) -> BoxFuture<'_, Result<Bytes, FetchError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let fail = self
                .failures_remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            Box::pin(async move {
                if fail {
                    Err(FetchError::Failed("boom".to_string()))
                } else {
                    Ok(Bytes::from_static(b"tile-bytes"))
                }
            })
        }
    }

    fn pyramid(attempt_limit: u32) -> LevelPyramid {
        LevelPyramid::new(
            PyramidSettings::full_sphere("test")
                .with_num_levels(2)
                .with_retry(RetrySettings::default().with_attempt_limit(attempt_limit)),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_tracked_success_clears_record() {
        let p = pyramid(3);
        let level = p.first_level();
        let address = TileAddress::probe(level, 0, 0);
        let loader = FlakyLoader::new(1);

        assert!(fetch_tracked(&loader, level, &address).await.is_err());
        assert!(!level.is_absent(&address), "one failure is below the limit");

        let bytes = fetch_tracked(&loader, level, &address).await.unwrap();
        assert_eq!(&bytes[..], b"tile-bytes");
        assert!(level.absent_tiles().is_empty(), "success removes the entry");
    }

    #[tokio::test]
    async fn test_fetch_tracked_suppresses_absent_tile() {
        let p = pyramid(2);
        let level = p.first_level();
        let address = TileAddress::probe(level, 0, 0);
        let loader = FlakyLoader::new(usize::MAX);

        assert!(fetch_tracked(&loader, level, &address).await.is_err());
        assert!(fetch_tracked(&loader, level, &address).await.is_err());
        assert_eq!(loader.calls.load(Ordering::SeqCst), 2);

        // Now unavailable: the loader must not even be called.
        let err = fetch_tracked(&loader, level, &address).await.unwrap_err();
        assert!(matches!(err, FetchError::Unavailable(_)));
        assert_eq!(loader.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_should_attempt_out_of_range_level() {
        let p = pyramid(7);
        let bogus = TileAddress::new(9, Arc::from("test/9"), 0, 0);
        assert!(!should_attempt(&p, &bogus));

        let good = TileAddress::probe(p.first_level(), 0, 0);
        assert!(should_attempt(&p, &good));
    }

    #[test]
    fn test_cancellation_leaves_record_untouched() {
        let p = pyramid(1);
        let level = p.first_level();
        let address = TileAddress::probe(level, 0, 0);

        let outcome: Result<Bytes, FetchError> = Err(FetchError::Cancelled);
        record_fetch_outcome(level, &address, &outcome);
        assert!(!level.is_absent(&address));
        assert!(level.absent_tiles().is_empty());
    }
}
