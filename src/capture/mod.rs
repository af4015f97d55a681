//! Image acquisition: camera capture and gallery selection.
//!
//! Acquisition has three regular outcomes, all represented by [`Acquisition`]: an
//! image path, a cancellation, or a denied permission. Only a source that fails
//! to run at all produces an error.

use crate::constants;
use crate::errors::{AppResult, CaptureError};
use std::fmt;
use std::io::{self, BufRead, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionKind {
    Camera,
    MediaLibrary,
}

impl fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionKind::Camera => write!(f, "camera"),
            PermissionKind::MediaLibrary => write!(f, "photo library"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Outcome of an acquisition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acquisition {
    /// Path to the acquired image, still at its original location.
    Image(PathBuf),
    /// The user backed out.
    Cancelled,
    /// Access to the source was refused.
    PermissionDenied(PermissionKind),
}

impl Acquisition {
    /// Message to show the user, if the outcome needs one.
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            Acquisition::PermissionDenied(PermissionKind::Camera) => {
                Some("Permission Required: camera permission is needed to take pictures")
            }
            Acquisition::PermissionDenied(PermissionKind::MediaLibrary) => {
                Some("Permission Required: photo library permission is needed to select images")
            }
            _ => None,
        }
    }
}

/// A place images come from.
///
/// Launch methods return `Ok(None)` when the user cancels.
pub trait ImageSource {
    fn request_permission(&self, kind: PermissionKind) -> PermissionStatus;

    fn launch_camera(&self) -> AppResult<Option<PathBuf>>;

    fn launch_gallery(&self) -> AppResult<Option<PathBuf>>;
}

fn acquire(
    source: &dyn ImageSource,
    kind: PermissionKind,
    launch: impl FnOnce() -> AppResult<Option<PathBuf>>,
) -> AppResult<Acquisition> {
    if source.request_permission(kind) == PermissionStatus::Denied {
        warn!("Permission denied for {}", kind);
        return Ok(Acquisition::PermissionDenied(kind));
    }

    match launch()? {
        Some(path) => {
            info!("Acquired image {:?} from {}", path, kind);
            Ok(Acquisition::Image(path))
        }
        None => {
            debug!("Acquisition from {} cancelled", kind);
            Ok(Acquisition::Cancelled)
        }
    }
}

pub fn take_picture(source: &dyn ImageSource) -> AppResult<Acquisition> {
    acquire(source, PermissionKind::Camera, || source.launch_camera())
}

pub fn pick_from_gallery(source: &dyn ImageSource) -> AppResult<Acquisition> {
    acquire(source, PermissionKind::MediaLibrary, || source.launch_gallery())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceChoice {
    Camera,
    Gallery,
    Cancel,
}

/// Asks the user where the image should come from.
pub trait SourcePrompt {
    fn choose(&self) -> AppResult<SourceChoice>;
}

/// Prompts for a source, then acquires from it.
pub fn acquire_with_prompt(
    prompt: &dyn SourcePrompt,
    source: &dyn ImageSource,
) -> AppResult<Acquisition> {
    match prompt.choose()? {
        SourceChoice::Camera => take_picture(source),
        SourceChoice::Gallery => pick_from_gallery(source),
        SourceChoice::Cancel => Ok(Acquisition::Cancelled),
    }
}

/// Reads a choice line by line until one is recognized. End of input cancels.
pub fn read_source_choice<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
) -> io::Result<SourceChoice> {
    loop {
        write!(output, "Take a picture (c), pick from gallery (g) or cancel (q)? ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(SourceChoice::Cancel);
        }

        match line.trim().to_lowercase().as_str() {
            "c" | "camera" => return Ok(SourceChoice::Camera),
            "g" | "gallery" => return Ok(SourceChoice::Gallery),
            "q" | "quit" | "cancel" => return Ok(SourceChoice::Cancel),
            _ => writeln!(output, "Please answer c, g or q.")?,
        }
    }
}

/// Interactive prompt on the terminal.
#[derive(Debug, Default)]
pub struct StdinPrompt;

impl SourcePrompt for StdinPrompt {
    fn choose(&self) -> AppResult<SourceChoice> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        Ok(read_source_choice(&mut stdin.lock(), &mut stdout)?)
    }
}

/// Command-line backed source.
///
/// The gallery is a file path given up front. The camera is an external command
/// run as `<command> <output-path>`, expected to write the picture to that path.
#[derive(Debug, Clone)]
pub struct CommandImageSource {
    camera_command: Option<String>,
    gallery_path: Option<PathBuf>,
    staging_dir: PathBuf,
}

impl CommandImageSource {
    pub fn new(
        camera_command: Option<String>,
        gallery_path: Option<PathBuf>,
        staging_dir: PathBuf,
    ) -> Self {
        CommandImageSource {
            camera_command,
            gallery_path,
            staging_dir,
        }
    }

    fn capture_path(&self) -> PathBuf {
        self.staging_dir.join(format!(
            "capture_{}.{}",
            Uuid::new_v4(),
            constants::DEFAULT_IMAGE_EXTENSION
        ))
    }
}

impl ImageSource for CommandImageSource {
    fn request_permission(&self, kind: PermissionKind) -> PermissionStatus {
        match kind {
            PermissionKind::Camera if self.camera_command.is_none() => PermissionStatus::Denied,
            PermissionKind::Camera => PermissionStatus::Granted,
            PermissionKind::MediaLibrary => match &self.gallery_path {
                Some(path) => match std::fs::File::open(path) {
                    Err(e) if e.kind() == ErrorKind::PermissionDenied => PermissionStatus::Denied,
                    _ => PermissionStatus::Granted,
                },
                None => PermissionStatus::Granted,
            },
        }
    }

    fn launch_camera(&self) -> AppResult<Option<PathBuf>> {
        let command = match &self.camera_command {
            Some(command) => command,
            None => return Ok(None),
        };
        let output = self.capture_path();
        run_capture_command(command, &output)?;

        if output.is_file() {
            Ok(Some(output))
        } else {
            debug!("Capture command produced no file at {:?}", output);
            Ok(None)
        }
    }

    fn launch_gallery(&self) -> AppResult<Option<PathBuf>> {
        match &self.gallery_path {
            Some(path) if path.is_file() => Ok(Some(path.clone())),
            Some(path) if path.is_dir() => Err(CaptureError::Other {
                command: "gallery".to_string(),
                message: format!("{} is a directory, not an image", path.display()),
            }
            .into()),
            Some(path) => {
                debug!("Gallery path {:?} is not a file", path);
                Ok(None)
            }
            None => Ok(None),
        }
    }
}

fn run_capture_command(command: &str, output: &Path) -> AppResult<()> {
    debug!("Launching capture command: {} {:?}", command, output);

    match Command::new(command).arg(output).status() {
        Err(e) if e.kind() == ErrorKind::NotFound => Err(CaptureError::CommandNotFound {
            command: command.to_string(),
            source: e,
        }
        .into()),
        Err(e) if e.kind() == ErrorKind::PermissionDenied => Err(CaptureError::PermissionDenied {
            command: command.to_string(),
            source: e,
        }
        .into()),
        Err(e) => Err(CaptureError::ExecutionFailed {
            command: command.to_string(),
            source: e,
        }
        .into()),
        Ok(status) if !status.success() => Err(CaptureError::NonZeroExit {
            command: command.to_string(),
            status_code: status.code().unwrap_or(-1),
        }
        .into()),
        Ok(_) => Ok(()),
    }
}
