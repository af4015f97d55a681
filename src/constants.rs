//! Constants used throughout the application.
//!
//! This module contains all constants used in Lunar Log, organized into logical
//! groups. Having constants centralized makes them easier to find, modify, and
//! reference consistently.

// Application Metadata
/// The name of the application.
pub const APP_NAME: &str = "lunar-log";
/// The description of the application used in CLI help text.
pub const APP_DESCRIPTION: &str = "A moon-photo journal: one photo of the moon per day";

// CLI Arguments & Defaults
/// Log format identifier for plain text.
pub const LOG_FORMAT_TEXT: &str = "text";
/// Log format identifier for JSON.
pub const LOG_FORMAT_JSON: &str = "json";
/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// Configuration Keys & Environment Variables
/// Environment variable for the data directory (log slot and images).
pub const ENV_VAR_LUNAR_LOG_DIR: &str = "LUNAR_LOG_DIR";
/// Environment variable naming an external camera capture command.
pub const ENV_VAR_LUNAR_LOG_CAMERA: &str = "LUNAR_LOG_CAMERA";
/// Environment variable for the crop viewport edge in pixels.
pub const ENV_VAR_LUNAR_LOG_VIEWPORT: &str = "LUNAR_LOG_VIEWPORT";
/// Environment variable selecting the log output format.
pub const ENV_VAR_LUNAR_LOG_FORMAT: &str = "LUNAR_LOG_FORMAT";
/// Standard environment variable for the user's home directory.
pub const ENV_VAR_HOME: &str = "HOME";
/// Default data sub-directory within the user's home directory.
pub const DEFAULT_DATA_SUBDIR: &str = ".local/share/lunar-log";

// Validation
/// Characters forbidden in capture commands for security reasons.
pub const COMMAND_FORBIDDEN_CHARS: &[char] =
    &['|', '&', ';', '$', '(', ')', '`', '\\', '<', '>', '\'', '"'];

// Storage
/// Key of the persisted log slot.
pub const STORAGE_KEY: &str = "@lunar_log";
/// Current schema version of the persisted log.
pub const LOG_VERSION: u32 = 1;
/// Sub-directory of the data directory holding copied images.
pub const IMAGE_SUBDIR: &str = "moon_images";
/// Prefix of generated image file names.
pub const IMAGE_FILE_PREFIX: &str = "moon_";
/// Extension used when the source image has none.
pub const DEFAULT_IMAGE_EXTENSION: &str = "jpg";
/// Name of the advisory lock file guarding the data directory.
pub const LOCK_FILE_NAME: &str = "lunar_log.lock";
/// Default POSIX permissions for newly created directories (owner read/write/execute).
#[cfg(unix)]
pub const DEFAULT_DIR_PERMISSIONS: u32 = 0o700;
/// Default POSIX permissions for newly created files (owner read/write).
#[cfg(unix)]
pub const DEFAULT_FILE_PERMISSIONS: u32 = 0o600;

// Date/Time Logic
/// Date format string for ISO date format (YYYY-MM-DD).
pub const DATE_FORMAT_ISO: &str = "%Y-%m-%d";
/// Date format string for compact date format (YYYYMMDD).
pub const DATE_FORMAT_COMPACT: &str = "%Y%m%d";
/// Human readable date format used by `show`.
pub const DATE_FORMAT_LONG: &str = "%B %-d, %Y";
/// Weeks shown before today when the journal is empty.
pub const CALENDAR_LOOKBACK_WEEKS: i64 = 2;
/// Days in a calendar week.
pub const DAYS_IN_WEEK: usize = 7;

// Crop
/// Zoom-in margin applied on top of the covering scale when a session starts.
pub const CROP_ZOOM_MARGIN: f64 = 1.2;
/// Edge length in pixels of the live crop preview.
pub const CROP_PREVIEW_SIZE: u32 = 40;
/// Default crop viewport edge in pixels.
pub const DEFAULT_VIEWPORT_SIZE: f64 = 320.0;

// Lunar phase
/// Mean length of a synodic month in days.
pub const SYNODIC_MONTH_DAYS: f64 = 29.530588853;

// Logging Configuration
/// Service name used in tracing spans and structured logs.
pub const TRACING_SERVICE_NAME: &str = "lunar-log";
/// Name for the root tracing span covering an application invocation.
pub const TRACING_ROOT_SPAN_NAME: &str = "app_invocation";
