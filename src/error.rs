//! # Render Pipeline Errors
//!
//! Every failure the render pipeline can surface is a [`RenderError`]. The
//! variants map one-to-one onto the remediation a caller might choose:
//!
//! - **Data**: the request or configuration is unusable, nothing was rendered
//! - **RenderEngineFailure**: the headless browser failed, stderr is attached
//! - **RenderTimeout**: the headless browser hung past its wall-clock budget
//! - **GeometryMismatch**: the capture came back at the wrong size
//!
//! Battery and weather problems are never errors; they degrade to a hidden
//! icon or an empty weather block.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, RenderError>;

/// Errors that can occur during a render pass.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Required request field or config array missing or malformed
    #[error("invalid render data: {0}")]
    Data(String),

    /// Headless browser exited with an error (or produced no capture)
    #[error("render engine failed ({status}): {stderr}")]
    RenderEngineFailure { status: String, stderr: String },

    /// Headless browser exceeded the configured wall-clock budget
    #[error("render engine timed out after {0:?}")]
    RenderTimeout(Duration),

    /// Captured raster does not match the requested viewport
    #[error("captured raster is {actual:?}, expected {expected:?}")]
    GeometryMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// Temporary page or output artifact IO failed
    #[error("render IO: {0}")]
    Io(#[from] io::Error),

    /// Capture decoding or plane encoding failed
    #[error("image codec: {0}")]
    Image(#[from] image::ImageError),
}

impl RenderError {
    pub(crate) fn data(msg: impl Into<String>) -> Self {
        RenderError::Data(msg.into())
    }

    /// True for failures a caller may reasonably retry once.
    pub fn is_transient(&self) -> bool {
        matches!(self, RenderError::RenderTimeout(_))
    }
}
