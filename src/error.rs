//! Unified error type for the codesift library.
//!
//! Library code uses `SiftError` so every failure carries the path it
//! happened on; CLI code uses `anyhow::Result` for convenience.
//!
//! # Error Categories
//!
//! - **Io**: file system operations (open, read, write, flush) on inputs,
//!   spill files, or the output artifact
//! - **Config**: unusable run configuration (missing input directory,
//!   directory with no input files)

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Unified error type for the codesift library.
#[derive(Debug)]
pub enum SiftError {
    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: std::io::Error,
    },

    /// Unusable run configuration (bad input directory, no inputs).
    Config { path: PathBuf, detail: String },
}

impl fmt::Display for SiftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiftError::Io {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "I/O error during {} on '{}': {}",
                    operation,
                    path.display(),
                    source
                )
            }
            SiftError::Config { path, detail } => {
                write!(f, "Configuration error for '{}': {}", path.display(), detail)
            }
        }
    }
}

impl std::error::Error for SiftError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SiftError::Io { source, .. } => Some(source),
            SiftError::Config { .. } => None,
        }
    }
}

/// Convenience type alias for Results using SiftError.
pub type Result<T> = std::result::Result<T, SiftError>;

// ============================================================================
// Helper constructors
// ============================================================================

impl SiftError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, operation: &'static str, source: std::io::Error) -> Self {
        SiftError::Io {
            path: path.into(),
            operation,
            source,
        }
    }

    /// Create a configuration error.
    pub fn config(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        SiftError::Config {
            path: path.into(),
            detail: detail.into(),
        }
    }
}

// ============================================================================
// Thread-safe error capture
// ============================================================================

/// Thread-safe error capture that stores only the first error.
///
/// Reducer workers run to completion even when a sibling fails; the first
/// error stored here becomes the run's error once the pool has drained.
/// Uses atomic operations so only the first store wins.
pub struct FirstErrorCapture {
    has_error: AtomicBool,
    error: Mutex<Option<SiftError>>,
}

impl FirstErrorCapture {
    /// Create a new, empty error capture.
    pub fn new() -> Self {
        Self {
            has_error: AtomicBool::new(false),
            error: Mutex::new(None),
        }
    }

    /// Store an error, but only if no error has been stored yet.
    /// Returns true if this error was stored, false if one already existed.
    pub fn store(&self, err: SiftError) -> bool {
        if self
            .has_error
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            if let Ok(mut guard) = self.error.lock() {
                *guard = Some(err);
            }
            true
        } else {
            false
        }
    }

    /// Retrieve the stored error, if any.
    pub fn take(&self) -> Option<SiftError> {
        if self.has_error.load(Ordering::SeqCst) {
            self.error.lock().ok().and_then(|mut g| g.take())
        } else {
            None
        }
    }

    /// Check if an error has been stored.
    pub fn has_error(&self) -> bool {
        self.has_error.load(Ordering::SeqCst)
    }
}

impl Default for FirstErrorCapture {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display() {
        let err = SiftError::io(
            "/data/codes1.txt",
            "read",
            std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/data/codes1.txt"));
        assert!(msg.contains("read"));
        assert!(msg.contains("file not found"));
    }

    #[test]
    fn test_config_error_display() {
        let err = SiftError::config("/data/empty", "no input files found");
        let msg = err.to_string();
        assert!(msg.contains("/data/empty"));
        assert!(msg.contains("no input files found"));
    }

    #[test]
    fn test_error_source_chain() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "not found");
        let err = SiftError::io("/spill", "open", io_err);
        assert!(std::error::Error::source(&err).is_some());

        let cfg = SiftError::config("/dir", "unreadable");
        assert!(std::error::Error::source(&cfg).is_none());
    }

    // -------------------------------------------------------------------------
    // FirstErrorCapture tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_first_error_capture_stores_first() {
        let capture = FirstErrorCapture::new();

        assert!(capture.store(SiftError::config("/a", "first error")));
        assert!(!capture.store(SiftError::config("/b", "second error")));

        let err = capture.take().expect("should have error");
        assert!(err.to_string().contains("first error"));
    }

    #[test]
    fn test_first_error_capture_empty() {
        let capture = FirstErrorCapture::new();
        assert!(capture.take().is_none());
        assert!(!capture.has_error());
    }

    #[test]
    fn test_first_error_capture_has_error() {
        let capture = FirstErrorCapture::default();
        assert!(!capture.has_error());

        capture.store(SiftError::config("/x", "boom"));
        assert!(capture.has_error());
    }
}
