//! Plane rotation and 1-bit thresholding.
//!
//! Panels are often mounted in portrait while the page is authored in
//! landscape, so each plane is rotated by the configured multiple of 90°
//! before it is reduced to one bit per pixel.
//!
//! The packed [`Bitmap`] layout matches what bichromatic panel drivers expect:
//! rows of `(width + 7) / 8` bytes, most significant bit first, bit set for
//! background (white) and clear for ink.

use crate::error::{RenderError, Result};
use crate::logging::Logger;
use image::{imageops, GrayImage, Luma, Rgb, RgbImage};

/// Packed 1-bit image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Bitmap {
    /// All-background bitmap.
    pub fn new(width: u32, height: u32) -> Self {
        // Buffer size: each row has (width+7)/8 bytes, total height rows
        let bytes_per_row = width.div_ceil(8);
        let buffer_size = (bytes_per_row * height) as usize;
        Self {
            width,
            height,
            data: vec![0xFF; buffer_size], // White by default
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Packed panel bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    fn locate(&self, x: u32, y: u32) -> (usize, u8) {
        let bytes_per_row = self.width.div_ceil(8);
        let byte_index = (y * bytes_per_row + x / 8) as usize;
        (byte_index, 0x80 >> (x % 8))
    }

    /// True when `(x, y)` is ink. Out-of-range coordinates read as background.
    pub fn is_ink(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let (byte_index, bit_mask) = self.locate(x, y);
        self.data[byte_index] & bit_mask == 0
    }

    pub fn set_ink(&mut self, x: u32, y: u32, ink: bool) {
        if x >= self.width || y >= self.height {
            return;
        }
        let (byte_index, bit_mask) = self.locate(x, y);
        if ink {
            self.data[byte_index] &= !bit_mask;
        } else {
            self.data[byte_index] |= bit_mask;
        }
    }

    pub fn ink_count(&self) -> usize {
        (0..self.height)
            .flat_map(|y| (0..self.width).map(move |x| (x, y)))
            .filter(|&(x, y)| self.is_ink(x, y))
            .count()
    }

    /// 8-bit view for saving: ink is 0, background 255.
    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            Luma([if self.is_ink(x, y) { 0 } else { 255 }])
        })
    }
}

/// ITU-R 601 luma, identical to the usual 8-bit RGB → L conversion.
pub fn luminance(Rgb([r, g, b]): Rgb<u8>) -> u8 {
    ((r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16) as u8
}

/// Rotate counter-clockwise by `degrees`, a multiple of 90 (negative allowed).
pub fn rotate(image: &RgbImage, degrees: i32) -> Result<RgbImage> {
    if degrees % 90 != 0 {
        return Err(RenderError::data(format!(
            "rotation {} is not a multiple of 90",
            degrees
        )));
    }
    Ok(match degrees.rem_euclid(360) {
        90 => imageops::rotate270(image),
        180 => imageops::rotate180(image),
        270 => imageops::rotate90(image),
        _ => image.clone(),
    })
}

/// Rotates and thresholds planes for one physical display.
pub struct Transformer {
    rotation: i32,
    threshold: u8,
    logger: Logger,
}

impl Transformer {
    pub fn new(rotation: i32, threshold: u8, logger: Logger) -> Result<Self> {
        if rotation % 90 != 0 {
            return Err(RenderError::data(format!(
                "rotation {} is not a multiple of 90",
                rotation
            )));
        }
        Ok(Self {
            rotation,
            threshold,
            logger,
        })
    }

    /// Luminance below the threshold is ink; at or above is background.
    pub fn binarize(&self, image: &RgbImage) -> Bitmap {
        let mut bitmap = Bitmap::new(image.width(), image.height());
        for (x, y, pixel) in image.enumerate_pixels() {
            if luminance(*pixel) < self.threshold {
                bitmap.set_ink(x, y, true);
            }
        }
        bitmap
    }

    pub fn transform(&self, plane: &RgbImage) -> Result<Bitmap> {
        let rotated = rotate(plane, self.rotation)?;
        let bitmap = self.binarize(&rotated);
        self.logger.debug(format_args!(
            "plane rotated {}° to {}x{}, {} ink pixels",
            self.rotation,
            bitmap.width(),
            bitmap.height(),
            bitmap.ink_count()
        ));
        Ok(bitmap)
    }
}
