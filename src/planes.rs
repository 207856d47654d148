//! Ink plane separation.
//!
//! The page is authored with exactly two inks on white, so every captured
//! pixel is classified by color:
//!
//! - red ink: red channel beats both others by more than [`RED_MARGIN`]
//! - black ink: all channels below [`DARK_CEILING`] and not red ink
//! - background: everything else
//!
//! Anti-aliased edges fall into the background rather than bleeding into
//! the wrong plane.

use crate::logging::Logger;
use image::{Rgb, RgbImage};

/// How far red must exceed green and blue for a pixel to count as red ink.
pub const RED_MARGIN: u8 = 10;
/// Every channel must be below this for a pixel to count as black ink.
pub const DARK_CEILING: u8 = 50;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Which plane a pixel belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ink {
    Background,
    Black,
    Red,
}

/// Classify one pixel. Red wins over black for dark reds.
pub fn classify(Rgb([r, g, b]): Rgb<u8>) -> Ink {
    let (r, g, b) = (r as u16, g as u16, b as u16);
    let margin = RED_MARGIN as u16;
    let ceiling = DARK_CEILING as u16;
    if r > g + margin && r > b + margin {
        Ink::Red
    } else if r < ceiling && g < ceiling && b < ceiling {
        Ink::Black
    } else {
        Ink::Background
    }
}

/// Splits composite captures into black and red planes.
pub struct PlaneSeparator {
    logger: Logger,
}

impl PlaneSeparator {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }

    /// Returns `(black, red)`, both the size of `composite`. Each plane keeps
    /// the original color at its own ink pixels and is white elsewhere.
    ///
    /// # Panics
    /// On a zero-sized composite; the compositor never produces one.
    pub fn separate(&self, composite: &RgbImage) -> (RgbImage, RgbImage) {
        let (width, height) = composite.dimensions();
        assert!(width > 0 && height > 0, "cannot separate an empty raster");

        let mut black = RgbImage::from_pixel(width, height, WHITE);
        let mut red = RgbImage::from_pixel(width, height, WHITE);
        let (mut black_count, mut red_count) = (0usize, 0usize);

        for (x, y, pixel) in composite.enumerate_pixels() {
            match classify(*pixel) {
                Ink::Red => {
                    red.put_pixel(x, y, *pixel);
                    red_count += 1;
                }
                Ink::Black => {
                    black.put_pixel(x, y, *pixel);
                    black_count += 1;
                }
                Ink::Background => {}
            }
        }

        self.logger.info(format_args!(
            "image colours processed: {} black ink pixels, {} red ink pixels",
            black_count, red_count
        ));
        (black, red)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::capture;

    fn separator() -> PlaneSeparator {
        PlaneSeparator::new(capture::logger().0)
    }

    #[test]
    fn test_classify_pure_inks() {
        assert_eq!(classify(Rgb([255, 0, 0])), Ink::Red);
        assert_eq!(classify(Rgb([0, 0, 0])), Ink::Black);
        assert_eq!(classify(Rgb([255, 255, 255])), Ink::Background);
    }

    #[test]
    fn test_classify_margins_are_strict() {
        assert_eq!(classify(Rgb([120, 110, 100])), Ink::Background);
        assert_eq!(classify(Rgb([121, 110, 110])), Ink::Red);
        assert_eq!(classify(Rgb([49, 49, 49])), Ink::Black);
        assert_eq!(classify(Rgb([50, 49, 49])), Ink::Background);
        // Light anti-aliased red edge stays red, grey edge goes to background
        assert_eq!(classify(Rgb([255, 200, 200])), Ink::Red);
        assert_eq!(classify(Rgb([128, 128, 128])), Ink::Background);
    }

    #[test]
    fn test_dark_red_goes_to_red_plane_only() {
        assert_eq!(classify(Rgb([45, 0, 0])), Ink::Red);
    }

    #[test]
    fn test_separate_keeps_colors_and_dimensions() {
        let mut img = RgbImage::from_pixel(3, 2, WHITE);
        img.put_pixel(0, 0, Rgb([10, 10, 10]));
        img.put_pixel(1, 0, Rgb([230, 20, 30]));
        img.put_pixel(2, 1, Rgb([128, 128, 128]));

        let (black, red) = separator().separate(&img);
        assert_eq!(black.dimensions(), (3, 2));
        assert_eq!(red.dimensions(), (3, 2));

        assert_eq!(*black.get_pixel(0, 0), Rgb([10, 10, 10]));
        assert_eq!(*red.get_pixel(0, 0), WHITE);
        assert_eq!(*red.get_pixel(1, 0), Rgb([230, 20, 30]));
        assert_eq!(*black.get_pixel(1, 0), WHITE);
        assert_eq!(*black.get_pixel(2, 1), WHITE);
        assert_eq!(*red.get_pixel(2, 1), WHITE);
    }

    #[test]
    fn test_no_pixel_lands_in_both_planes() {
        // Sweep a coarse RGB lattice including every boundary value
        let steps: Vec<u8> = vec![0, 9, 10, 11, 40, 45, 49, 50, 51, 60, 61, 128, 200, 255];
        let side = steps.len() as u32;
        let mut img = RgbImage::new(side * side, side);
        for (ri, &r) in steps.iter().enumerate() {
            for (gi, &g) in steps.iter().enumerate() {
                for (bi, &b) in steps.iter().enumerate() {
                    img.put_pixel(ri as u32 * side + gi as u32, bi as u32, Rgb([r, g, b]));
                }
            }
        }

        let (black, red) = separator().separate(&img);
        for (x, y, pixel) in img.enumerate_pixels() {
            let in_black = *black.get_pixel(x, y) != WHITE;
            let in_red = *red.get_pixel(x, y) != WHITE;
            assert!(!(in_black && in_red), "pixel {:?} in both planes", pixel);
        }
    }

    #[test]
    #[should_panic(expected = "empty raster")]
    fn test_empty_raster_panics() {
        separator().separate(&RgbImage::new(0, 0));
    }
}
