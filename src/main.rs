/*!
# Lunar Log - A Moon-Photo Journal

Lunar Log keeps one square photo of the moon per day, or a note that the moon was
not seen, and shows them on a calendar.

This file contains the main application flow: logging setup, configuration, the
data directory lock, and dispatch to the operation behind each command.

## Usage

```
lunar-log [OPTIONS] <COMMAND>

Commands:
  capture    Take or pick a photo of the moon, crop it, and record it
  not-seen   Mark a date as "moon not seen"
  remove     Remove the entry for a date, along with its photo
  show       Show the entry for a date and what can be done with it
  list       List every entry, oldest first
  calendar   Print the calendar from the first entry through this week
  clear      Delete every entry and photo

Options:
  -v, --verbose              Print verbose output
      --log-format <FORMAT>  Log output format: text or json
  -h, --help                 Print help
  -V, --version              Print version
```

## Configuration

- `LUNAR_LOG_DIR`: Data directory (defaults to "~/.local/share/lunar-log")
- `LUNAR_LOG_CAMERA`: Capture command, run as `<command> <output-path>`
- `LUNAR_LOG_VIEWPORT`: Crop viewport edge in pixels (defaults to 320)
- `LUNAR_LOG_FORMAT`: Log output format (defaults to "text")
- `RUST_LOG`: Overrides the log filter
*/

use lunar_log::capture::{CommandImageSource, StdinPrompt};
use lunar_log::cli::{self, CliArgs, Commands};
use lunar_log::config::{Config, LogFormat};
use lunar_log::constants;
use lunar_log::errors::AppResult;
use lunar_log::lunar;
use lunar_log::ops::{self, CaptureOutcome, SourceSelection};
use std::io::{self, IsTerminal};
use std::process::ExitCode;
use tracing::{debug, error, info, info_span};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

/// Installs the stderr subscriber. `RUST_LOG` wins over the verbosity flag.
fn init_tracing(format: LogFormat, verbose: bool) {
    let default_level = if verbose {
        "debug"
    } else {
        constants::DEFAULT_LOG_LEVEL
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(io::stderr)
                    .with_ansi(io::stderr().is_terminal()),
            )
            .init(),
    }
}

/// The main entry point for the lunar-log application.
///
/// 1. Parses command-line arguments and loads configuration
/// 2. Initializes logging inside a root span carrying a correlation ID
/// 3. Runs the requested command
///
/// Any error is logged once here and turns into a non-zero exit code.
fn main() -> ExitCode {
    let args = CliArgs::parse();
    let config = Config::load();

    let format_flag = args.log_format.as_deref().map(LogFormat::parse).transpose();
    let log_format = match (&format_flag, &config) {
        (Ok(Some(format)), _) => *format,
        (_, Ok(config)) => config.log_format,
        _ => LogFormat::default(),
    };
    init_tracing(log_format, args.verbose);

    let correlation_id = Uuid::new_v4();
    let root_span = info_span!(
        constants::TRACING_ROOT_SPAN_NAME,
        service_name = constants::TRACING_SERVICE_NAME,
        correlation_id = %correlation_id
    );
    let _guard = root_span.enter();

    debug!("CLI arguments: {:?}", args);

    match format_flag.and(config).and_then(|config| run(&args, config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &CliArgs, config: Config) -> AppResult<()> {
    config.validate()?;
    debug!("Configuration: {:?}", config);

    let mut store = ops::open_store(&config)?;
    let today = store.today();

    match &args.command {
        Commands::Capture(capture) => {
            let date = cli::date_or_today(capture.date.as_deref(), today)?;
            let adjustment = capture.parse_crop()?;
            let selection = if capture.camera {
                SourceSelection::Camera
            } else if capture.gallery.is_some() {
                SourceSelection::Gallery
            } else {
                SourceSelection::Prompt
            };

            // Raw captures and crops stay in the data directory until saved
            let staging = tempfile::tempdir_in(&config.data_dir)?;
            let source = CommandImageSource::new(
                config.camera_command.clone(),
                capture.gallery.clone(),
                staging.path().to_path_buf(),
            );

            let outcome = ops::capture_entry(
                &mut store,
                &source,
                &StdinPrompt,
                &selection,
                date,
                adjustment,
                config.viewport_size,
                staging.path(),
            )?;
            match outcome {
                CaptureOutcome::Saved(entry) => {
                    let image = entry
                        .status
                        .image()
                        .map(|path| path.display().to_string())
                        .unwrap_or_default();
                    println!(
                        "Saved moon for {} ({}): {}",
                        entry.date,
                        lunar::phase_name(entry.moon),
                        image
                    );
                }
                CaptureOutcome::Cancelled => println!("Capture cancelled"),
                CaptureOutcome::PermissionDenied(message) => println!("{}", message),
            }
        }
        Commands::NotSeen(date_args) => {
            let date = cli::date_or_today(date_args.date.as_deref(), today)?;
            ops::mark_not_seen(&mut store, date)?;
            println!("Marked {} as not seen", date);
        }
        Commands::Remove(date_args) => {
            let date = cli::parse_date(&date_args.date)?;
            match ops::remove_entry(&mut store, date)? {
                Some(_) => println!("Removed entry for {}", date),
                None => println!("No entry for {}", date),
            }
        }
        Commands::Show(date_args) => {
            let date = cli::date_or_today(date_args.date.as_deref(), today)?;
            println!("{}", ops::show_entry(&store, date)?);
        }
        Commands::List => {
            let lines = ops::list_entries(&store)?;
            if lines.is_empty() {
                println!("No entries");
            }
            for line in lines {
                println!("{}", line);
            }
        }
        Commands::Calendar(calendar_args) => {
            let selected = calendar_args
                .selected
                .as_deref()
                .map(cli::parse_date)
                .transpose()?;
            print!("{}", ops::render_calendar(&store, selected)?);
        }
        Commands::Clear(clear_args) => {
            let confirmed = clear_args.yes
                || cli::prompt_yes_no(
                    "Delete every entry and photo?",
                    false,
                    &mut io::stdin().lock(),
                    &mut io::stdout(),
                )?;
            if confirmed {
                ops::clear_log(&mut store)?;
                println!("Cleared all entries");
            } else {
                println!("Clear cancelled");
            }
        }
    }

    info!("Command completed");
    Ok(())
}
