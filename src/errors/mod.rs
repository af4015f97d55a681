//! Error handling utilities for Lunar Log.
//!
//! This module provides the central error type `AppError` which represents all
//! possible error conditions that might occur in the application, as well as the
//! convenience type alias `AppResult` for functions that can return these errors.
//!
//! Not every failure is an error: a denied permission or a cancelled capture is a
//! regular [`crate::capture::Acquisition`] value, and failing to delete an image
//! file is logged and swallowed by the store.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Represents specific error cases that can occur when running the external
/// camera capture command.
///
/// # Examples
///
/// ```
/// use lunar_log::errors::CaptureError;
/// use std::io::{self, ErrorKind};
///
/// let io_error = io::Error::new(ErrorKind::NotFound, "command not found");
/// let error = CaptureError::CommandNotFound {
///     command: "snap".to_string(),
///     source: io_error,
/// };
///
/// assert!(format!("{}", error).contains("not found"));
/// assert!(format!("{}", error).contains("snap"));
/// ```
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Error when the specified capture command cannot be found.
    #[error("Capture command '{command}' not found: {source}. Please check that it is installed and available in your PATH.")]
    CommandNotFound {
        /// The capture command that was not found
        command: String,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Error when permission is denied to execute the capture command.
    #[error("Permission denied when trying to execute capture command '{command}': {source}. Please check file permissions.")]
    PermissionDenied {
        /// The capture command that had permission denied
        command: String,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Error when the capture command fails to execute due to other I/O errors.
    #[error("Failed to execute capture command '{command}': {source}")]
    ExecutionFailed {
        /// The capture command that failed to execute
        command: String,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Error when the capture command exits with a non-zero status code.
    #[error("Capture command '{command}' exited with non-zero status code: {status_code}")]
    NonZeroExit {
        /// The capture command that exited with a non-zero status
        command: String,
        /// The exit status code
        status_code: i32,
    },

    /// A catch-all for unexpected capture failures.
    #[error("An unexpected issue occurred while acquiring an image with '{command}': {message}")]
    Other {
        /// The capture command or source name
        command: String,
        /// A description of the error
        message: String,
    },
}

/// Represents errors that can occur when locking the data directory.
///
/// # Examples
///
/// ```
/// use lunar_log::errors::LockError;
/// use std::path::PathBuf;
///
/// let error = LockError::FileBusy {
///     path: PathBuf::from("/data/lunar_log.lock"),
/// };
///
/// assert!(format!("{}", error).contains("in use"));
/// ```
#[derive(Debug, Error)]
pub enum LockError {
    /// Error when the data directory is already locked by another process.
    #[error("Moon log is in use by another process: {path}. Please wait for the other lunar-log command to finish.")]
    FileBusy {
        /// The path to the lock file
        path: PathBuf,
    },

    /// Error when acquiring the lock fails for a technical reason.
    #[error("Failed to acquire lock {path}: {source}. Please check that the data directory is accessible.")]
    AcquisitionFailed {
        /// The path to the lock file
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// Errors raised by the entry store.
///
/// # Examples
///
/// ```
/// use lunar_log::errors::StoreError;
///
/// let error = StoreError::InvalidPhase(1.5);
/// assert!(format!("{}", error).contains("1.5"));
/// ```
#[derive(Debug, Error)]
pub enum StoreError {
    /// An operation ran before `EntryStore::init`.
    #[error("Entry store used before initialization")]
    NotInitialized,

    /// Moon phase outside of [0, 1] or not a finite number.
    #[error("Moon phase must be a number between 0 and 1, got {0}")]
    InvalidPhase(f64),

    /// The persisted log could not be parsed.
    #[error("Stored moon log '{key}' is corrupt: {source}")]
    Corrupt {
        /// Key of the persisted slot
        key: String,
        /// The underlying parse error
        #[source]
        source: serde_json::Error,
    },

    /// A persisted entry is keyed by something that is not a date.
    #[error("Stored moon log has an entry with an invalid date key: '{0}'")]
    InvalidDateKey(String),

    /// The in-memory log could not be serialized.
    #[error("Failed to serialize moon log: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Errors raised while setting up a crop or writing cropped images.
#[derive(Debug, Error)]
pub enum CropError {
    /// The source image has a zero width or height.
    #[error("Source image has no pixels to crop")]
    EmptyImage,

    /// The viewport edge is not a positive finite number.
    #[error("Crop viewport must be a positive size, got {0}")]
    InvalidViewport(f64),

    /// Decoding, cropping or encoding the image failed.
    #[error("Image processing failed: {0}")]
    Image(#[from] image::ImageError),
}

/// Represents all possible errors that can occur in Lunar Log.
///
/// This enum is the central error type used across the application, with variants
/// for different error categories. It uses `thiserror` for deriving the `Error` trait
/// implementation and formatted error messages.
///
/// # Examples
///
/// Creating a configuration error:
/// ```
/// use lunar_log::errors::AppError;
///
/// let error = AppError::Config("Missing data directory".to_string());
/// assert_eq!(format!("{}", error), "Configuration error: Missing data directory");
/// ```
///
/// Converting from an IO error:
/// ```
/// use lunar_log::errors::AppError;
/// use std::io::{self, ErrorKind};
///
/// let io_error = io::Error::new(ErrorKind::NotFound, "file not found");
/// let app_error: AppError = io_error.into();
///
/// match app_error {
///     AppError::Io(inner) => assert_eq!(inner.kind(), ErrorKind::NotFound),
///     _ => panic!("Expected Io variant"),
/// }
/// ```
#[derive(Debug, Error)]
pub enum AppError {
    /// Errors related to configuration loading or validation.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input/output errors from filesystem operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors in journal arguments (e.g., invalid date formats).
    #[error("Journal logic error: {0}")]
    Journal(String),

    /// Errors from the entry store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Errors while acquiring an image.
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    /// Errors while cropping an image.
    #[error("Crop error: {0}")]
    Crop(#[from] CropError),

    /// Errors related to locking the data directory.
    #[error("File locking error: {0}")]
    Lock(#[from] LockError),
}

/// A type alias for `Result<T, AppError>` to simplify function signatures.
///
/// # Examples
///
/// ```
/// use lunar_log::errors::{AppResult, AppError};
///
/// fn might_fail() -> AppResult<String> {
///     if false {
///         return Err(AppError::Journal("Something went wrong".to_string()));
///     }
///     Ok("Operation succeeded".to_string())
/// }
/// ```
pub type AppResult<T> = Result<T, AppError>;
