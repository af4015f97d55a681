//! Interactive square crop: bounded zoom and pan over a fixed viewport.
//!
//! A [`CropSession`] tracks the scale and translation of a source image behind a
//! square viewport. Scale is `base * pinch`, where `pinch` is the live factor of a
//! gesture in progress and `base` the committed scale. Translation is bounded per
//! axis so the image always covers the viewport.
//!
//! [`CropSession::crop_rect`] maps the current view back to source pixels. The same
//! rectangle is used for the low-resolution preview and the final export
//! (see [`export`]).

pub mod export;

use crate::constants;
use crate::errors::{AppError, CropError};
use std::str::FromStr;
use tracing::{debug, warn};

/// Natural pixel dimensions of a source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        ImageSize { width, height }
    }
}

/// Translation of the image centre relative to the viewport centre, in viewport
/// pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Offset {
    pub x: f64,
    pub y: f64,
}

/// Integer crop rectangle in source-pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Work order for a preview render, tagged with the gesture that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewRequest {
    pub generation: u64,
    pub rect: CropRect,
}

#[derive(Debug, Clone)]
pub struct CropSession {
    natural: ImageSize,
    viewport: f64,
    base_scale: f64,
    pinch_scale: f64,
    translation: Offset,
    committed: Offset,
    generation: u64,
}

impl CropSession {
    /// Starts a session zoomed slightly past the covering scale, centred.
    ///
    /// # Errors
    ///
    /// `CropError::EmptyImage` for a zero-sized image and
    /// `CropError::InvalidViewport` for a non-positive viewport.
    pub fn new(natural: ImageSize, viewport: f64) -> Result<Self, CropError> {
        if natural.width == 0 || natural.height == 0 {
            return Err(CropError::EmptyImage);
        }
        if !viewport.is_finite() || viewport <= 0.0 {
            return Err(CropError::InvalidViewport(viewport));
        }

        let base_scale = covering_scale(natural, viewport) * constants::CROP_ZOOM_MARGIN;
        debug!(
            "Crop session for {}x{} in {}px viewport, initial scale {:.4}",
            natural.width, natural.height, viewport, base_scale
        );

        Ok(CropSession {
            natural,
            viewport,
            base_scale,
            pinch_scale: 1.0,
            translation: Offset::default(),
            committed: Offset::default(),
            generation: 0,
        })
    }

    pub fn natural(&self) -> ImageSize {
        self.natural
    }

    pub fn viewport(&self) -> f64 {
        self.viewport
    }

    /// Smallest scale at which the image still fills the viewport.
    pub fn min_scale(&self) -> f64 {
        covering_scale(self.natural, self.viewport)
    }

    /// Effective scale: committed base times the live pinch factor.
    pub fn scale(&self) -> f64 {
        self.base_scale * self.pinch_scale
    }

    pub fn translation(&self) -> Offset {
        self.translation
    }

    /// Clamps a prospective translation so no empty space shows at `scale`.
    pub fn bounded_translation(&self, x: f64, y: f64, scale: f64) -> Offset {
        let max_x = ((self.natural.width as f64 * scale - self.viewport) / 2.0).max(0.0);
        let max_y = ((self.natural.height as f64 * scale - self.viewport) / 2.0).max(0.0);
        Offset {
            x: x.clamp(-max_x, max_x),
            y: y.clamp(-max_y, max_y),
        }
    }

    /// Applies a live pinch factor relative to the committed scale.
    ///
    /// Returns `false` and leaves the state unchanged when the factor would shrink
    /// the image below the covering scale.
    pub fn pinch_update(&mut self, factor: f64) -> bool {
        if !factor.is_finite() || factor <= 0.0 {
            return false;
        }
        let prospective = self.base_scale * factor;
        if prospective < self.min_scale() {
            return false;
        }

        self.pinch_scale = factor;
        self.translation =
            self.bounded_translation(self.translation.x, self.translation.y, prospective);
        true
    }

    /// Commits the live pinch into the base scale.
    pub fn pinch_end(&mut self) -> PreviewRequest {
        self.base_scale = self.scale().max(self.min_scale());
        self.pinch_scale = 1.0;
        self.translation =
            self.bounded_translation(self.translation.x, self.translation.y, self.base_scale);
        self.committed = self.translation;
        self.next_preview()
    }

    /// Moves the image by a drag delta measured from where the drag started.
    pub fn pan_update(&mut self, dx: f64, dy: f64) {
        self.translation =
            self.bounded_translation(self.committed.x + dx, self.committed.y + dy, self.scale());
    }

    /// Finishes a drag, committing the bounded translation.
    pub fn pan_end(&mut self, dx: f64, dy: f64) -> PreviewRequest {
        self.pan_update(dx, dy);
        self.committed = self.translation;
        self.next_preview()
    }

    fn next_preview(&mut self) -> PreviewRequest {
        self.generation += 1;
        PreviewRequest {
            generation: self.generation,
            rect: self.crop_rect(),
        }
    }

    /// Source-pixel rectangle currently visible through the viewport.
    pub fn crop_rect(&self) -> CropRect {
        derive_crop_rect(self.natural, self.viewport, self.scale(), self.translation)
    }

    /// Ends the session, returning the final rectangle. Gesture state is dropped.
    pub fn finish(self) -> CropRect {
        let rect = self.crop_rect();
        debug!("Crop finished at {:?}", rect);
        rect
    }
}

/// `max(viewport / width, viewport / height)`.
pub fn covering_scale(natural: ImageSize, viewport: f64) -> f64 {
    let width_ratio = viewport / natural.width as f64;
    let height_ratio = viewport / natural.height as f64;
    width_ratio.max(height_ratio)
}

/// Maps a scaled, translated view back to an integer rectangle in source pixels.
///
/// The origin is clamped to zero, the extent to the image, and after rounding the
/// rectangle is shrunk if needed so it lies entirely inside the image. An axis
/// of zero length yields a zero-length extent on that axis.
pub fn derive_crop_rect(natural: ImageSize, viewport: f64, scale: f64, translation: Offset) -> CropRect {
    let natural_w = natural.width as f64;
    let natural_h = natural.height as f64;
    let displayed_w = natural_w * scale;
    let displayed_h = natural_h * scale;

    // Top-left of the displayed image relative to the viewport
    let offset_x = viewport / 2.0 - displayed_w / 2.0 + translation.x;
    let offset_y = viewport / 2.0 - displayed_h / 2.0 + translation.y;

    let width_ratio = natural_w / displayed_w;
    let height_ratio = natural_h / displayed_h;

    let origin_x = (-offset_x * width_ratio).max(0.0);
    let origin_y = (-offset_y * height_ratio).max(0.0);
    let crop_w = (viewport * width_ratio).min(natural_w);
    let crop_h = (viewport * height_ratio).min(natural_h);

    let (x, width) = fit_axis(origin_x, crop_w, natural.width);
    let (y, height) = fit_axis(origin_y, crop_h, natural.height);
    CropRect {
        x,
        y,
        width,
        height,
    }
}

fn fit_axis(origin: f64, extent: f64, limit: u32) -> (u32, u32) {
    if limit == 0 {
        return (0, 0);
    }
    let origin = (origin.round() as u32).min(limit.saturating_sub(1));
    let extent = (extent.round() as u32).clamp(1, limit - origin);
    (origin, extent)
}

/// A pan and a zoom applied to a session as one pinch gesture followed by one
/// drag. Written `X,Y,SCALE` on the command line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropAdjustment {
    pub pan_x: f64,
    pub pan_y: f64,
    pub zoom: f64,
}

impl CropAdjustment {
    /// Replays the adjustment, returning the preview requests it produced in order.
    pub fn apply(&self, session: &mut CropSession) -> Vec<PreviewRequest> {
        let mut requests = Vec::with_capacity(2);
        if (self.zoom - 1.0).abs() > f64::EPSILON {
            if !session.pinch_update(self.zoom) {
                warn!(
                    "Zoom {} would leave part of the viewport empty, keeping scale {:.4}",
                    self.zoom,
                    session.scale()
                );
            }
            requests.push(session.pinch_end());
        }
        if self.pan_x != 0.0 || self.pan_y != 0.0 {
            session.pan_update(self.pan_x, self.pan_y);
            requests.push(session.pan_end(self.pan_x, self.pan_y));
        }
        requests
    }
}

impl FromStr for CropAdjustment {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = value.split(',').map(str::trim).collect();
        let invalid = || {
            AppError::Journal(format!(
                "Invalid crop '{}': expected X,Y,SCALE such as 10,-5,1.5",
                value
            ))
        };
        if parts.len() != 3 {
            return Err(invalid());
        }

        let mut numbers = [0.0; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            *slot = part.parse::<f64>().map_err(|_| invalid())?;
            if !slot.is_finite() {
                return Err(invalid());
            }
        }
        if numbers[2] <= 0.0 {
            return Err(invalid());
        }

        Ok(CropAdjustment {
            pan_x: numbers[0],
            pan_y: numbers[1],
            zoom: numbers[2],
        })
    }
}

/// Holds the newest preview, ignoring renders that finish after a newer one.
#[derive(Debug, Clone, Default)]
pub struct PreviewSlot<T> {
    current: Option<(u64, T)>,
}

impl<T> PreviewSlot<T> {
    pub fn new() -> Self {
        PreviewSlot { current: None }
    }

    /// Accepts `preview` unless a newer generation is already shown.
    pub fn offer(&mut self, generation: u64, preview: T) -> bool {
        match &self.current {
            Some((shown, _)) if *shown > generation => false,
            _ => {
                self.current = Some((generation, preview));
                true
            }
        }
    }

    pub fn current(&self) -> Option<&T> {
        self.current.as_ref().map(|(_, preview)| preview)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: f64 = 300.0;

    fn landscape() -> CropSession {
        CropSession::new(ImageSize::new(4000, 3000), VIEWPORT).unwrap()
    }

    #[test]
    fn test_new_rejects_degenerate_input() {
        assert!(matches!(
            CropSession::new(ImageSize::new(0, 10), VIEWPORT),
            Err(CropError::EmptyImage)
        ));
        assert!(matches!(
            CropSession::new(ImageSize::new(10, 10), 0.0),
            Err(CropError::InvalidViewport(_))
        ));
    }

    #[test]
    fn test_derive_crop_rect_empty_axis() {
        let rect = derive_crop_rect(ImageSize::new(0, 10), 100.0, 1.0, Offset::default());

        assert_eq!((rect.x, rect.width), (0, 0));
        assert!(rect.y + rect.height <= 10);
    }

    #[test]
    fn test_initial_scale_covers_with_margin() {
        let session = landscape();

        // Height is the limiting axis: 300 / 3000
        assert!((session.min_scale() - 0.1).abs() < 1e-12);
        assert!((session.scale() - 0.12).abs() < 1e-12);
        assert_eq!(session.translation(), Offset::default());
    }

    #[test]
    fn test_bounded_translation_clamps_each_axis() {
        let session = landscape();

        // At 0.12: displayed 480x360, so max offsets are 90 and 30
        let bounded = session.bounded_translation(500.0, -500.0, 0.12);
        assert!((bounded.x - 90.0).abs() < 1e-9);
        assert!((bounded.y + 30.0).abs() < 1e-9);

        // At covering scale the short axis cannot move at all
        let bounded = session.bounded_translation(10.0, 10.0, 0.1);
        assert_eq!(bounded.y, 0.0);
    }

    #[test]
    fn test_pinch_below_cover_is_rejected() {
        let mut session = landscape();

        assert!(!session.pinch_update(0.5));
        assert!((session.scale() - 0.12).abs() < 1e-12);
        assert!(session.pinch_update(0.9));
        assert!((session.scale() - 0.108).abs() < 1e-12);
    }

    #[test]
    fn test_pinch_rebounds_translation() {
        let mut session = landscape();
        session.pan_end(90.0, 30.0);

        // At 0.108 the image is 432x324, leaving 66 and 12 pixels of slack
        assert!(session.pinch_update(0.9));
        let translation = session.translation();
        assert!((translation.x - 66.0).abs() < 1e-9);
        assert!((translation.y - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_pinch_end_commits_scale_and_bumps_generation() {
        let mut session = landscape();
        session.pinch_update(2.0);

        let first = session.pinch_end();
        let second = session.pan_end(5.0, 0.0);

        assert!((session.scale() - 0.24).abs() < 1e-12);
        assert_eq!(first.generation, 1);
        assert_eq!(second.generation, 2);
    }

    #[test]
    fn test_pan_is_relative_to_committed_offset() {
        let mut session = landscape();
        session.pan_end(20.0, 10.0);
        session.pan_update(5.0, 5.0);

        assert!((session.translation().x - 25.0).abs() < 1e-9);
        assert!((session.translation().y - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_centered_crop_rect() {
        let session = landscape();

        // Viewport covers 300 / 0.12 = 2500 source pixels, centred
        assert_eq!(
            session.crop_rect(),
            CropRect {
                x: 750,
                y: 250,
                width: 2500,
                height: 2500
            }
        );
    }

    #[test]
    fn test_crop_rect_at_bounds_stays_inside_image() {
        let mut session = landscape();
        session.pan_end(-10_000.0, -10_000.0);

        let rect = session.finish();

        assert_eq!(rect.x + rect.width, 4000);
        assert_eq!(rect.y + rect.height, 3000);
    }

    #[test]
    fn test_fit_axis_never_overflows() {
        assert_eq!(fit_axis(99.6, 1.0, 100), (99, 1));
        assert_eq!(fit_axis(10.0, 500.0, 100), (10, 90));
        assert_eq!(fit_axis(0.0, 0.2, 100), (0, 1));
    }

    #[test]
    fn test_adjustment_parsing() {
        let adjustment: CropAdjustment = "10, -5, 1.5".parse().unwrap();
        assert_eq!(
            adjustment,
            CropAdjustment {
                pan_x: 10.0,
                pan_y: -5.0,
                zoom: 1.5
            }
        );

        assert!("10,5".parse::<CropAdjustment>().is_err());
        assert!("a,b,c".parse::<CropAdjustment>().is_err());
        assert!("0,0,0".parse::<CropAdjustment>().is_err());
        assert!("0,0,inf".parse::<CropAdjustment>().is_err());
    }

    #[test]
    fn test_adjustment_replays_as_gestures() {
        let mut session = landscape();
        let adjustment = CropAdjustment {
            pan_x: 1000.0,
            pan_y: 0.0,
            zoom: 2.0,
        };

        let requests = adjustment.apply(&mut session);

        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].generation, 2);
        assert!((session.scale() - 0.24).abs() < 1e-12);
        // At 0.24 the image is 960 wide, so x is bounded at 330
        assert!((session.translation().x - 330.0).abs() < 1e-9);
    }

    #[test]
    fn test_identity_adjustment_requests_nothing() {
        let mut session = landscape();
        let adjustment = CropAdjustment {
            pan_x: 0.0,
            pan_y: 0.0,
            zoom: 1.0,
        };

        assert!(adjustment.apply(&mut session).is_empty());
    }

    #[test]
    fn test_preview_slot_discards_stale_results() {
        let mut slot = PreviewSlot::new();

        assert!(slot.offer(2, "second"));
        assert!(!slot.offer(1, "first"));
        assert_eq!(slot.current(), Some(&"second"));
        assert!(slot.offer(3, "third"));
        assert_eq!(slot.current(), Some(&"third"));
    }
}
