use std::io;

use thiserror::Error;

use crate::runtime::Backend;

/// Errors surfaced by the runtime, the denoisers and the engine.
#[derive(Debug, Error)]
pub enum Error {
    #[error("GPU runtime unavailable for backend '{backend}': {reason}")]
    RuntimeUnavailable { backend: Backend, reason: String },

    /// The engine ran before any runtime was started. Counts as the runtime
    /// being unavailable, see [`Error::is_runtime_unavailable`].
    #[error("GPU runtime unavailable: ensure_started has not been called")]
    RuntimeNotStarted,

    #[error("GPU runtime already running on backend '{running}', shut it down before starting '{requested}'")]
    BackendConflict { running: Backend, requested: Backend },

    #[error("Invalid slice range [{first}, {last}] for an image with {slice_count} slices")]
    InvalidRange {
        first: usize,
        last: usize,
        slice_count: usize,
    },

    #[error("Invalid parameter {name} = {value}: {reason}")]
    InvalidParams {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Unsupported bit depth {0}, only 8 and 16 bit images can be denoised")]
    UnsupportedBitDepth(u32),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Dimension mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("Device memory error: {0}")]
    DeviceMemory(String),

    #[error("GPU error: {0}")]
    Gpu(String),

    #[error("Denoising cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Encoding error: {0}")]
    Encoding(String),
}

impl Error {
    /// Whether no usable runtime was running: it failed to start or was never started.
    pub fn is_runtime_unavailable(&self) -> bool {
        matches!(self, Error::RuntimeUnavailable { .. } | Error::RuntimeNotStarted)
    }

    pub(crate) fn invalid_param(
        name: &'static str,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Error::InvalidParams {
            name,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<tiff::TiffError> for Error {
    fn from(e: tiff::TiffError) -> Self {
        Error::Encoding(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_params_message_names_value() {
        let err = Error::invalid_param("h", -1.5, "must be positive");
        let msg = err.to_string();
        assert!(msg.contains("h"));
        assert!(msg.contains("-1.5"));
        assert!(msg.contains("must be positive"));
    }

    #[test]
    fn invalid_range_message_names_bounds() {
        let err = Error::InvalidRange {
            first: 3,
            last: 1,
            slice_count: 5,
        };
        let msg = err.to_string();
        assert!(msg.contains("[3, 1]"));
        assert!(msg.contains("5 slices"));
    }

    #[test]
    fn backend_conflict_names_both_backends() {
        let err = Error::BackendConflict {
            running: Backend::Cpu,
            requested: Backend::Vulkan,
        };
        let msg = err.to_string();
        assert!(msg.contains("cpu"));
        assert!(msg.contains("vulkan"));
    }

    #[test]
    fn not_started_counts_as_unavailable() {
        assert!(Error::RuntimeNotStarted.is_runtime_unavailable());
        let err = Error::RuntimeUnavailable {
            backend: Backend::Vulkan,
            reason: "no adapter".to_string(),
        };
        assert!(err.is_runtime_unavailable());
        assert!(!Error::Cancelled.is_runtime_unavailable());
    }

    #[test]
    fn io_error_keeps_source() {
        use std::error::Error as StdError;

        let err = Error::from(io::Error::new(io::ErrorKind::NotFound, "missing"));
        assert!(err.source().is_some());
        assert!(err.to_string().contains("missing"));
    }
}
