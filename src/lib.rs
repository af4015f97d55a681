/*!
# Lunar Log

Lunar Log is a moon-photo journal: one square, cropped photo of the moon per
calendar day, or a "not seen" mark, browsable on a week-based calendar.

## Core Features

- Capture a photo from a camera command or pick an existing image
- Crop it to a square with bounded pan and zoom
- Mark days when the moon was not visible
- Browse entries on a calendar split at month boundaries
- Moon phase recorded for every photo

## Architecture

- `store`: Date-indexed entry store over injected persistence, image files and clock
- `capture`: Image acquisition with permission and cancellation outcomes
- `crop`: Crop geometry, previews and export
- `calendar`: Calendar view model and per-date actions
- `lunar`: Moon phase approximation
- `ops`: High-level operations behind each command
- `cli`, `config`, `constants`, `errors`: Command line, environment configuration,
  shared constants and error types

## Usage Example

```rust,no_run
use lunar_log::{ops, Config};

fn main() -> lunar_log::AppResult<()> {
    let config = Config::load()?;
    config.validate()?;

    let store = ops::open_store(&config)?;
    print!("{}", ops::render_calendar(&store, None)?);
    Ok(())
}
```
*/

/// Calendar view model and date actions
pub mod calendar;
/// Image acquisition from camera or gallery
pub mod capture;
/// Command-line interface for parsing and handling user arguments
pub mod cli;
/// Configuration loading and management
pub mod config;
/// Shared constants
pub mod constants;
/// Crop geometry and image export
pub mod crop;
/// Error types and utilities for error handling
pub mod errors;
/// Moon phase approximation
pub mod lunar;
/// High-level operations
pub mod ops;
/// Persistent entry store
pub mod store;

// Re-export important types for convenience
pub use cli::CliArgs;
pub use config::Config;
pub use errors::{AppError, AppResult};
pub use store::{EntryStore, MoonEntry};
