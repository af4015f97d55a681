//! Pixel work for crops: reading dimensions, rendering previews, writing output.

use super::{CropRect, ImageSize};
use crate::constants::CROP_PREVIEW_SIZE;
use crate::errors::CropError;
use image::{imageops::FilterType, DynamicImage, ImageFormat};
use std::path::Path;
use tracing::debug;

/// Reads the natural size of an image without decoding all of its pixels.
pub fn image_size(path: &Path) -> Result<ImageSize, CropError> {
    let (width, height) = image::image_dimensions(path)?;
    if width == 0 || height == 0 {
        return Err(CropError::EmptyImage);
    }
    Ok(ImageSize::new(width, height))
}

pub fn load(path: &Path) -> Result<DynamicImage, CropError> {
    Ok(image::open(path)?)
}

fn cut(image: &DynamicImage, rect: CropRect) -> DynamicImage {
    image.crop_imm(rect.x, rect.y, rect.width, rect.height)
}

/// Small square render of `rect`, for feedback while the crop is adjusted.
pub fn render_preview(image: &DynamicImage, rect: CropRect) -> DynamicImage {
    cut(image, rect).resize_exact(CROP_PREVIEW_SIZE, CROP_PREVIEW_SIZE, FilterType::Triangle)
}

/// Crops an already decoded image to `rect` and writes it to `dest` as PNG.
pub fn write_crop(image: &DynamicImage, rect: CropRect, dest: &Path) -> Result<ImageSize, CropError> {
    let cropped = cut(image, rect);
    cropped.save_with_format(dest, ImageFormat::Png)?;

    debug!(
        "Wrote {}x{} crop at ({}, {}) to {:?}",
        cropped.width(),
        cropped.height(),
        rect.x,
        rect.y,
        dest
    );
    Ok(ImageSize::new(cropped.width(), cropped.height()))
}

/// Decodes `source`, crops it to `rect` and writes it to `dest` as PNG.
pub fn crop_to_file(source: &Path, rect: CropRect, dest: &Path) -> Result<ImageSize, CropError> {
    let image = load(source)?;
    write_crop(&image, rect, dest)
}
