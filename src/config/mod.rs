//! Configuration management for Lunar Log.
//!
//! This module handles loading and validating configuration settings from environment
//! variables, with sensible defaults.
//!
//! # Environment Variables
//!
//! - `LUNAR_LOG_DIR`: Data directory holding the log and images
//!   (defaults to ~/.local/share/lunar-log)
//! - `LUNAR_LOG_CAMERA`: Optional external capture command
//! - `LUNAR_LOG_VIEWPORT`: Crop viewport edge in pixels (defaults to 320)
//! - `LUNAR_LOG_FORMAT`: Log output format, `text` or `json`
//! - `HOME`: Used for expanding the default data directory path

use crate::constants;
use crate::errors::{AppError, AppResult};
use std::env;
use std::fmt;
use std::path::PathBuf;

/// Output format of the log subscriber installed by the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Parses `text` or `json` (case-insensitive).
    pub fn parse(value: &str) -> AppResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            constants::LOG_FORMAT_TEXT => Ok(LogFormat::Text),
            constants::LOG_FORMAT_JSON => Ok(LogFormat::Json),
            other => Err(AppError::Config(format!(
                "Invalid log format '{}'. Expected '{}' or '{}'",
                other,
                constants::LOG_FORMAT_TEXT,
                constants::LOG_FORMAT_JSON
            ))),
        }
    }
}

/// Configuration for Lunar Log.
///
/// # Examples
///
/// Creating a configuration manually:
/// ```
/// use lunar_log::Config;
/// use std::path::PathBuf;
///
/// let config = Config {
///     data_dir: PathBuf::from("/path/to/lunar-log"),
///     ..Config::default()
/// };
/// assert!(config.validate().is_ok());
/// assert_eq!(config.images_dir(), PathBuf::from("/path/to/lunar-log/moon_images"));
/// ```
pub struct Config {
    /// Directory holding the persisted log, lock file and image directory.
    pub data_dir: PathBuf,

    /// External camera capture command, invoked as `<cmd> <output-path>`.
    pub camera_command: Option<String>,

    /// Edge length in pixels of the square crop viewport.
    pub viewport_size: f64,

    /// Output format for logs.
    pub log_format: LogFormat,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("data_dir", &"[REDACTED_PATH]")
            .field(
                "camera_command",
                &self.camera_command.as_ref().map(|_| "[REDACTED_COMMAND]"),
            )
            .field("viewport_size", &self.viewport_size)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: PathBuf::from(""),
            camera_command: None,
            viewport_size: constants::DEFAULT_VIEWPORT_SIZE,
            log_format: LogFormat::Text,
        }
    }
}

impl Config {
    /// Directory where captured images are copied.
    pub fn images_dir(&self) -> PathBuf {
        self.data_dir.join(constants::IMAGE_SUBDIR)
    }

    /// Path of the advisory lock file for the data directory.
    pub fn lock_path(&self) -> PathBuf {
        self.data_dir.join(constants::LOCK_FILE_NAME)
    }

    /// Validates a capture command string for security.
    ///
    /// The command must be non-empty and contain neither spaces nor shell
    /// metacharacters; it is executed directly, never through a shell.
    fn validate_command(command: &str) -> AppResult<&str> {
        if command.is_empty() {
            return Err(AppError::Config(
                "Camera command cannot be empty".to_string(),
            ));
        }

        if command.contains(' ') {
            return Err(AppError::Config(
                "Camera command cannot contain spaces. Use a wrapper script for commands requiring arguments".to_string(),
            ));
        }

        for &ch in constants::COMMAND_FORBIDDEN_CHARS.iter() {
            if command.contains(ch) {
                return Err(AppError::Config(format!(
                    "Camera command cannot contain shell metacharacters: '{}'. Use a wrapper script instead",
                    ch
                )));
            }
        }

        Ok(command)
    }

    fn parse_viewport(raw: &str) -> AppResult<f64> {
        let size: f64 = raw.trim().parse().map_err(|_| {
            AppError::Config(format!("Viewport size '{}' is not a number", raw))
        })?;
        if !size.is_finite() || size <= 0.0 {
            return Err(AppError::Config(format!(
                "Viewport size must be positive, got {}",
                raw
            )));
        }
        Ok(size)
    }

    /// Loads configuration from environment variables with sensible defaults.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if:
    /// - The data directory path expansion fails or yields an empty path
    /// - The camera command fails validation
    /// - The viewport size or log format cannot be parsed
    pub fn load() -> AppResult<Self> {
        let data_dir_str = env::var(constants::ENV_VAR_LUNAR_LOG_DIR).unwrap_or_else(|_| {
            let home = env::var(constants::ENV_VAR_HOME).unwrap_or_default();
            format!("{}/{}", home, constants::DEFAULT_DATA_SUBDIR)
        });

        // Handles ~ and $VARS
        let expanded_path = shellexpand::full(&data_dir_str)
            .map_err(|e| AppError::Config(format!("Failed to expand path: {}", e)))?;

        let data_dir = PathBuf::from(expanded_path.into_owned());

        if data_dir.as_os_str().is_empty() {
            return Err(AppError::Config("Data directory path is empty".to_string()));
        }

        let camera_command = match env::var(constants::ENV_VAR_LUNAR_LOG_CAMERA) {
            Ok(raw) => Some(Config::validate_command(&raw)?.to_string()),
            Err(_) => None,
        };

        let viewport_size = match env::var(constants::ENV_VAR_LUNAR_LOG_VIEWPORT) {
            Ok(raw) => Config::parse_viewport(&raw)?,
            Err(_) => constants::DEFAULT_VIEWPORT_SIZE,
        };

        let log_format = match env::var(constants::ENV_VAR_LUNAR_LOG_FORMAT) {
            Ok(raw) => LogFormat::parse(&raw)?,
            Err(_) => LogFormat::default(),
        };

        Ok(Config {
            data_dir,
            camera_command,
            viewport_size,
            log_format,
        })
    }

    /// Validates that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when the data directory is empty or relative,
    /// the camera command is invalid, or the viewport size is not positive.
    pub fn validate(&self) -> AppResult<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(AppError::Config("Data directory path is empty".to_string()));
        }

        if !self.data_dir.is_absolute() {
            return Err(AppError::Config(
                "Data directory must be an absolute path".to_string(),
            ));
        }

        if let Some(command) = &self.camera_command {
            Config::validate_command(command)?;
        }

        if !self.viewport_size.is_finite() || self.viewport_size <= 0.0 {
            return Err(AppError::Config(format!(
                "Viewport size must be positive, got {}",
                self.viewport_size
            )));
        }

        Ok(())
    }
}
