use crate::constants::{APP_DESCRIPTION, APP_NAME, DATE_FORMAT_COMPACT};
use crate::crop::CropAdjustment;
use crate::errors::{AppError, AppResult};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;

/// A moon-photo journal: one photo of the moon per day
#[derive(Parser, Debug)]
#[command(name = APP_NAME, about = APP_DESCRIPTION, version, long_about = None)]
pub struct CliArgs {
    /// Print verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Log output format: text or json (overrides LUNAR_LOG_FORMAT)
    #[arg(long, value_name = "FORMAT", global = true)]
    pub log_format: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Take or pick a photo of the moon, crop it, and record it
    Capture(CaptureArgs),
    /// Mark a date as "moon not seen"
    NotSeen(DateArgs),
    /// Remove the entry for a date, along with its photo
    Remove(RequiredDateArgs),
    /// Show the entry for a date and what can be done with it
    Show(DateArgs),
    /// List every entry, oldest first
    List,
    /// Print the calendar from the first entry through this week
    Calendar(CalendarArgs),
    /// Delete every entry and photo
    Clear(ClearArgs),
}

#[derive(Args, Debug, Default)]
pub struct DateArgs {
    /// Date of the entry (format: YYYY-MM-DD or YYYYMMDD, default: today)
    #[arg(short = 'd', long)]
    pub date: Option<String>,
}

#[derive(Args, Debug)]
pub struct RequiredDateArgs {
    /// Date of the entry (format: YYYY-MM-DD or YYYYMMDD)
    #[arg(short = 'd', long)]
    pub date: String,
}

#[derive(Args, Debug, Default)]
pub struct CaptureArgs {
    /// Date of the entry (format: YYYY-MM-DD or YYYYMMDD, default: today)
    #[arg(short = 'd', long)]
    pub date: Option<String>,

    /// Take a picture with the configured camera command
    #[arg(long, conflicts_with = "gallery")]
    pub camera: bool,

    /// Use an existing image file
    #[arg(long, value_name = "PATH")]
    pub gallery: Option<PathBuf>,

    /// Pan and zoom before cropping: X,Y,SCALE (viewport pixels, zoom factor)
    #[arg(long, value_name = "X,Y,SCALE", allow_hyphen_values = true)]
    pub crop: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct CalendarArgs {
    /// Highlight a date (format: YYYY-MM-DD or YYYYMMDD)
    #[arg(short = 's', long)]
    pub selected: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct ClearArgs {
    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,
}

impl CliArgs {
    /// Parse command-line arguments
    pub fn parse() -> Self {
        <CliArgs as Parser>::parse()
    }
}

impl CaptureArgs {
    pub fn parse_crop(&self) -> AppResult<Option<CropAdjustment>> {
        self.crop.as_deref().map(CropAdjustment::from_str).transpose()
    }
}

/// Parses `YYYY-MM-DD`, falling back to `YYYYMMDD`.
pub fn parse_date(value: &str) -> AppResult<NaiveDate> {
    NaiveDate::from_str(value)
        .or_else(|_| NaiveDate::parse_from_str(value, DATE_FORMAT_COMPACT))
        .map_err(|e| AppError::Journal(format!("Invalid date format '{}': {}", value, e)))
}

/// Resolves an optional date argument, defaulting to `today`.
pub fn date_or_today(value: Option<&str>, today: NaiveDate) -> AppResult<NaiveDate> {
    value.map(parse_date).unwrap_or(Ok(today))
}

/// Asks a yes/no question until it gets an answer. End of input takes the default.
pub fn prompt_yes_no<R: BufRead, W: Write>(
    question: &str,
    default: bool,
    input: &mut R,
    output: &mut W,
) -> io::Result<bool> {
    let prompt = if default {
        format!("{} [Y/n] ", question)
    } else {
        format!("{} [y/N] ", question)
    };

    loop {
        write!(output, "{}", prompt)?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(default);
        }

        match line.trim().to_lowercase().as_str() {
            "" => return Ok(default),
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => writeln!(output, "Please answer yes or no.")?,
        }
    }
}
