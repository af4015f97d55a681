//! Acquire, crop and record a moon photo for one date.

use crate::capture::{self, Acquisition, ImageSource, SourcePrompt};
use crate::crop::export;
use crate::crop::{CropAdjustment, CropSession, PreviewSlot};
use crate::errors::AppResult;
use crate::lunar;
use crate::ops::ensure_not_future;
use crate::store::{EntryPatch, EntryStore, MoonEntry};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Where the image should come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSelection {
    /// Ask the user.
    Prompt,
    Camera,
    Gallery,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    Saved(MoonEntry),
    Cancelled,
    PermissionDenied(&'static str),
}

/// Runs the full capture flow for `date`.
///
/// # Flow
///
/// 1. Acquire an image from `source`, prompting if no source was selected
/// 2. Open a crop session over it and replay `adjustment`, if any
/// 3. Write the crop as PNG into `staging_dir`
/// 4. Copy it into the store and record it with the date's moon phase
///
/// Cancellation and denied permissions are outcomes, not errors. An existing
/// record for the date is replaced and its old image released.
///
/// # Errors
///
/// Returns an error for future dates, failing capture commands, undecodable
/// images, and storage failures.
#[allow(clippy::too_many_arguments)]
pub fn capture_entry(
    store: &mut EntryStore,
    source: &dyn ImageSource,
    prompt: &dyn SourcePrompt,
    selection: &SourceSelection,
    date: NaiveDate,
    adjustment: Option<CropAdjustment>,
    viewport: f64,
    staging_dir: &Path,
) -> AppResult<CaptureOutcome> {
    ensure_not_future(date, store.today())?;

    let acquisition = match selection {
        SourceSelection::Prompt => capture::acquire_with_prompt(prompt, source)?,
        SourceSelection::Camera => capture::take_picture(source)?,
        SourceSelection::Gallery => capture::pick_from_gallery(source)?,
    };

    let image_path = match acquisition {
        Acquisition::Image(path) => path,
        Acquisition::Cancelled => {
            info!("Capture for {} cancelled", date);
            return Ok(CaptureOutcome::Cancelled);
        }
        denied @ Acquisition::PermissionDenied(_) => {
            let message = denied
                .user_message()
                .unwrap_or("Permission Required");
            return Ok(CaptureOutcome::PermissionDenied(message));
        }
    };

    let cropped = crop_into(&image_path, adjustment, viewport, staging_dir)?;
    let saved = store.save_image(&cropped)?;
    if let Err(e) = std::fs::remove_file(&cropped) {
        debug!("Could not remove staged crop {:?}: {}", cropped, e);
    }

    let moon = lunar::phase_fraction(date);
    let entry = match store.update_entry(date, EntryPatch::captured(saved.clone(), moon)) {
        Ok(entry) => entry,
        Err(e) => {
            store.discard_image(&saved);
            return Err(e);
        }
    };
    info!(
        "Recorded moon for {} ({})",
        date,
        lunar::phase_name(moon)
    );
    Ok(CaptureOutcome::Saved(entry))
}

fn crop_into(
    image_path: &Path,
    adjustment: Option<CropAdjustment>,
    viewport: f64,
    staging_dir: &Path,
) -> AppResult<PathBuf> {
    let image = export::load(image_path)?;
    let mut session = CropSession::new(
        crate::crop::ImageSize::new(image.width(), image.height()),
        viewport,
    )?;

    let mut previews = PreviewSlot::new();
    if let Some(adjustment) = adjustment {
        for request in adjustment.apply(&mut session) {
            previews.offer(request.generation, export::render_preview(&image, request.rect));
        }
    }
    if let Some(preview) = previews.current() {
        debug!("Latest preview is {}x{}", preview.width(), preview.height());
    }

    let rect = session.finish();
    let staged = staging_dir.join(format!("crop_{}.png", uuid::Uuid::new_v4()));
    export::write_crop(&image, rect, &staged)?;
    Ok(staged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{PermissionKind, PermissionStatus, SourceChoice};
    use crate::errors::AppError;
    use crate::store::{DayStatus, FileKeyValue, FixedClock, LocalImageDir, LogPersistence};
    use image::{Rgb, RgbImage};
    use std::cell::Cell;
    use std::io;
    use std::rc::Rc;
    use tempfile::{tempdir, TempDir};

    /// File-backed persistence whose saves can be switched to fail.
    struct FlakyPersistence {
        inner: FileKeyValue,
        fail_saves: Rc<Cell<bool>>,
    }

    impl LogPersistence for FlakyPersistence {
        fn load(&self, key: &str) -> AppResult<Option<String>> {
            self.inner.load(key)
        }

        fn save(&self, key: &str, value: &str) -> AppResult<()> {
            if self.fail_saves.get() {
                return Err(io::Error::new(io::ErrorKind::Other, "disk full").into());
            }
            self.inner.save(key, value)
        }

        fn remove(&self, key: &str) -> AppResult<()> {
            self.inner.remove(key)
        }
    }

    struct StubSource {
        image: Option<PathBuf>,
        granted: bool,
    }

    impl ImageSource for StubSource {
        fn request_permission(&self, _kind: PermissionKind) -> PermissionStatus {
            if self.granted {
                PermissionStatus::Granted
            } else {
                PermissionStatus::Denied
            }
        }

        fn launch_camera(&self) -> AppResult<Option<PathBuf>> {
            Ok(self.image.clone())
        }

        fn launch_gallery(&self) -> AppResult<Option<PathBuf>> {
            Ok(self.image.clone())
        }
    }

    struct NoPrompt;

    impl SourcePrompt for NoPrompt {
        fn choose(&self) -> AppResult<SourceChoice> {
            Ok(SourceChoice::Cancel)
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
    }

    fn setup() -> (TempDir, EntryStore, PathBuf) {
        let temp_dir = tempdir().expect("Failed to create temporary directory");
        let mut store = EntryStore::new(
            Box::new(FileKeyValue::new(temp_dir.path())),
            Box::new(LocalImageDir::new(temp_dir.path().join("moon_images"))),
            Box::new(FixedClock::at_noon(today())),
        );
        store.init().unwrap();

        let source = temp_dir.path().join("raw.png");
        RgbImage::from_pixel(120, 80, Rgb([200, 200, 180]))
            .save(&source)
            .unwrap();
        (temp_dir, store, source)
    }

    #[test]
    fn test_capture_saves_cropped_image_and_phase() {
        let (temp_dir, mut store, raw) = setup();
        let source = StubSource {
            image: Some(raw),
            granted: true,
        };

        let outcome = capture_entry(
            &mut store,
            &source,
            &NoPrompt,
            &SourceSelection::Gallery,
            today(),
            None,
            60.0,
            temp_dir.path(),
        )
        .unwrap();

        let entry = match outcome {
            CaptureOutcome::Saved(entry) => entry,
            other => panic!("Expected Saved, got {:?}", other),
        };
        let image = entry.status.image().unwrap();
        assert!(image.starts_with(temp_dir.path().join("moon_images")));
        assert_eq!(image.extension().unwrap(), "png");
        assert!((entry.moon - lunar::phase_fraction(today())).abs() < 1e-12);

        // Viewport covers 60 / (0.75 * 1.2) = 66.67 source pixels per side
        let (width, height) = image::image_dimensions(image).unwrap();
        assert_eq!((width, height), (67, 67));
    }

    #[test]
    fn test_capture_replaces_previous_image() {
        let (temp_dir, mut store, raw) = setup();
        let source = StubSource {
            image: Some(raw),
            granted: true,
        };
        let run = |store: &mut EntryStore| {
            capture_entry(
                store,
                &source,
                &NoPrompt,
                &SourceSelection::Camera,
                today(),
                Some(CropAdjustment {
                    pan_x: 5.0,
                    pan_y: 0.0,
                    zoom: 1.5,
                }),
                60.0,
                temp_dir.path(),
            )
            .unwrap()
        };

        run(&mut store);
        let first = store.get_entry(today()).unwrap().unwrap().clone();
        run(&mut store);
        let second = store.get_entry(today()).unwrap().unwrap().clone();

        let first_image = first.status.image().unwrap();
        assert_ne!(Some(first_image), second.status.image());
        assert!(!first_image.exists());
    }

    #[test]
    fn test_failed_record_discards_saved_image() {
        let (temp_dir, _, raw) = setup();
        let fail_saves = Rc::new(Cell::new(false));
        let images_dir = temp_dir.path().join("moon_images");
        let mut store = EntryStore::new(
            Box::new(FlakyPersistence {
                inner: FileKeyValue::new(temp_dir.path()),
                fail_saves: Rc::clone(&fail_saves),
            }),
            Box::new(LocalImageDir::new(&images_dir)),
            Box::new(FixedClock::at_noon(today())),
        );
        store.init().unwrap();
        fail_saves.set(true);
        let source = StubSource {
            image: Some(raw),
            granted: true,
        };

        let result = capture_entry(
            &mut store,
            &source,
            &NoPrompt,
            &SourceSelection::Gallery,
            today(),
            None,
            60.0,
            temp_dir.path(),
        );

        assert!(matches!(result, Err(AppError::Io(_))));
        assert_eq!(std::fs::read_dir(&images_dir).unwrap().count(), 0);
    }

    #[test]
    fn test_capture_outcomes_without_image() {
        let (temp_dir, mut store, _) = setup();
        let cancelled = StubSource {
            image: None,
            granted: true,
        };
        let denied = StubSource {
            image: None,
            granted: false,
        };

        let outcome = capture_entry(
            &mut store,
            &cancelled,
            &NoPrompt,
            &SourceSelection::Prompt,
            today(),
            None,
            60.0,
            temp_dir.path(),
        )
        .unwrap();
        assert_eq!(outcome, CaptureOutcome::Cancelled);

        let outcome = capture_entry(
            &mut store,
            &denied,
            &NoPrompt,
            &SourceSelection::Camera,
            today(),
            None,
            60.0,
            temp_dir.path(),
        )
        .unwrap();
        assert!(matches!(outcome, CaptureOutcome::PermissionDenied(message) if message.contains("camera")));
        assert!(store.get_entry(today()).unwrap().is_none());
    }

    #[test]
    fn test_capture_rejects_future_date() {
        let (temp_dir, mut store, raw) = setup();
        let source = StubSource {
            image: Some(raw),
            granted: true,
        };

        let result = capture_entry(
            &mut store,
            &source,
            &NoPrompt,
            &SourceSelection::Gallery,
            today().succ_opt().unwrap(),
            None,
            60.0,
            temp_dir.path(),
        );

        assert!(result.is_err());
        assert!(matches!(
            store.get_entry(today()).unwrap().map(|e| &e.status),
            None | Some(DayStatus::Empty)
        ));
    }
}
