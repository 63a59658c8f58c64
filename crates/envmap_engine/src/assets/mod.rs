//! Asset loading
//!
//! - [`texture`]: LDR/HDR/EXR images, cube maps and environment maps
//! - [`gltf_loader`]: glTF models into a detached [`SceneGraph`](crate::scene::SceneGraph)
//! - [`loader`]: background worker pool returning pollable [`LoadTask`]s
//!
//! Every failure is an [`AssetError`]. Only I/O errors are transient and
//! worth retrying; the rest describe the file itself.

pub mod gltf_loader;
pub mod loader;
pub mod texture;

pub use gltf_loader::load_gltf;
pub use loader::{AssetLoader, LoadStatus, LoadTask};
pub use texture::{
    load_environment, ColorSpace, CubeTexture, EnvironmentMap, Texture, TextureMapping, TexturePixels,
};

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::foundation::frame_loop::CancellationToken;

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// File does not exist
    #[error("Asset not found: {}", path.display())]
    NotFound {
        /// Requested path
        path: PathBuf,
    },

    /// Reading the file failed
    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        /// Requested path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The decoder rejected the file
    #[error("Failed to load {}: {cause}", path.display())]
    LoadFailed {
        /// Requested path
        path: PathBuf,
        /// Decoder message
        cause: String,
    },

    /// The file decoded but cannot be used
    #[error("Invalid asset {}: {reason}", path.display())]
    InvalidData {
        /// Requested path
        path: PathBuf,
        /// What is wrong with it
        reason: String,
    },

    /// No loader handles this file type
    #[error("Unsupported asset format: {}", path.display())]
    UnsupportedFormat {
        /// Requested path
        path: PathBuf,
    },

    /// The owner dropped the load before it finished
    #[error("Load cancelled: {label}")]
    Cancelled {
        /// Load label
        label: String,
    },
}

impl AssetError {
    /// Classify an I/O error for `path`
    pub fn from_io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound { path: path.to_path_buf() }
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    /// Whether trying again might succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

/// How often a load is attempted before its error is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, at least one
    pub max_attempts: u32,
    /// Pause before the second attempt; doubles after that
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(50),
        }
    }
}

impl RetryPolicy {
    /// Policy with `max_attempts` attempts and the default delay
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Run `op` until it succeeds, fails permanently, runs out of attempts or
    /// `token` is cancelled.
    pub fn run<T, F>(&self, label: &str, token: &CancellationToken, mut op: F) -> Result<T, AssetError>
    where
        F: FnMut() -> Result<T, AssetError>,
    {
        let mut delay = self.base_delay;
        let mut attempt = 1;

        loop {
            if token.is_cancelled() {
                return Err(AssetError::Cancelled { label: label.to_string() });
            }

            match op() {
                Ok(value) => return Ok(value),
                Err(error) if error.is_transient() && attempt < self.max_attempts => {
                    log::warn!(
                        "Loading {} failed (attempt {}/{}): {}",
                        label,
                        attempt,
                        self.max_attempts,
                        error
                    );
                    std::thread::sleep(delay);
                    delay *= 2;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transient() -> AssetError {
        AssetError::from_io(
            Path::new("flaky.png"),
            std::io::Error::new(std::io::ErrorKind::Interrupted, "interrupted"),
        )
    }

    fn quick(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_missing_file_maps_to_not_found() {
        let error = AssetError::from_io(
            Path::new("gone.png"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(matches!(error, AssetError::NotFound { .. }));
        assert!(!error.is_transient());
        assert!(transient().is_transient());
    }

    #[test]
    fn test_transient_errors_are_retried() {
        let mut calls = 0;
        let result = quick(3).run("flaky", &CancellationToken::new(), || {
            calls += 1;
            if calls < 3 {
                Err(transient())
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn test_retries_stop_at_max_attempts() {
        let mut calls = 0;
        let result: Result<(), _> = quick(2).run("flaky", &CancellationToken::new(), || {
            calls += 1;
            Err(transient())
        });
        assert!(matches!(result, Err(AssetError::Io { .. })));
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_permanent_errors_are_not_retried() {
        let mut calls = 0;
        let result: Result<(), _> = quick(5).run("broken", &CancellationToken::new(), || {
            calls += 1;
            Err(AssetError::UnsupportedFormat { path: PathBuf::from("a.gif") })
        });
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_cancelled_token_skips_the_work() {
        let token = CancellationToken::new();
        token.cancel();
        let result: Result<(), _> = quick(3).run("skipped", &token, || panic!("should not run"));
        assert!(matches!(result, Err(AssetError::Cancelled { .. })));
    }
}
