//! Error types for tile assembly.

use crate::pyramid::PyramidError;
use thiserror::Error;

/// Errors raised while assembling surface tiles.
///
/// `RasterExhausted` is recoverable: the affected tile is dropped from the
/// frame and retried on the next build, never propagated out of `build`.
#[derive(Debug, Error)]
pub enum AssemblerError {
    /// The raster allocator could not produce a surface.
    #[error("Raster surface allocation failed: {0}")]
    RasterExhausted(String),

    /// Pyramid construction or addressing failed.
    #[error(transparent)]
    Pyramid(#[from] PyramidError),
}
