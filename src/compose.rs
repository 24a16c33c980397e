use image::{RgbaImage, imageops};

use crate::error::{FigpipeError, FigpipeResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Concatenates images along `axis` in order.
///
/// Inputs keep their own dimensions; mismatched cross-axis sizes are placed
/// as-is (top- or left-aligned) with transparent filler, never rescaled.
/// Callers pre-resize when they need matching dimensions.
pub fn concat(images: &[&RgbaImage], axis: Axis) -> FigpipeResult<RgbaImage> {
    if images.is_empty() {
        return Err(FigpipeError::validation("concat of zero images"));
    }

    let (w, h) = match axis {
        Axis::Horizontal => (
            images.iter().map(|i| i.width()).sum(),
            images.iter().map(|i| i.height()).max().unwrap_or(0),
        ),
        Axis::Vertical => (
            images.iter().map(|i| i.width()).max().unwrap_or(0),
            images.iter().map(|i| i.height()).sum(),
        ),
    };

    let mut out = RgbaImage::new(w, h);
    let mut offset = 0i64;
    for img in images {
        match axis {
            Axis::Horizontal => {
                imageops::overlay(&mut out, *img, offset, 0);
                offset += i64::from(img.width());
            }
            Axis::Vertical => {
                imageops::overlay(&mut out, *img, 0, offset);
                offset += i64::from(img.height());
            }
        }
    }
    Ok(out)
}

/// 2x2 panel: two horizontal concatenations, then one vertical.
pub fn quad(
    top_left: &RgbaImage,
    top_right: &RgbaImage,
    bottom_left: &RgbaImage,
    bottom_right: &RgbaImage,
) -> FigpipeResult<RgbaImage> {
    let top = concat(&[top_left, top_right], Axis::Horizontal)?;
    let bottom = concat(&[bottom_left, bottom_right], Axis::Horizontal)?;
    concat(&[&top, &bottom], Axis::Vertical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(w: u32, h: u32, c: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba(c))
    }

    #[test]
    fn horizontal_concat_sums_widths() {
        let a = solid(3, 4, [1, 0, 0, 255]);
        let b = solid(5, 4, [0, 2, 0, 255]);
        let out = concat(&[&a, &b], Axis::Horizontal).unwrap();
        assert_eq!(out.dimensions(), (8, 4));
        assert_eq!(*out.get_pixel(0, 0), Rgba([1, 0, 0, 255]));
        assert_eq!(*out.get_pixel(3, 0), Rgba([0, 2, 0, 255]));
    }

    #[test]
    fn vertical_concat_sums_heights() {
        let a = solid(4, 2, [1, 0, 0, 255]);
        let b = solid(4, 3, [0, 2, 0, 255]);
        let out = concat(&[&a, &b], Axis::Vertical).unwrap();
        assert_eq!(out.dimensions(), (4, 5));
        assert_eq!(*out.get_pixel(0, 2), Rgba([0, 2, 0, 255]));
    }

    #[test]
    fn mismatched_cross_axis_is_not_scaled() {
        let a = solid(2, 4, [1, 0, 0, 255]);
        let b = solid(2, 2, [0, 2, 0, 255]);
        let out = concat(&[&a, &b], Axis::Horizontal).unwrap();
        assert_eq!(out.dimensions(), (4, 4));
        // Short input is top-aligned; the area below it stays empty.
        assert_eq!(*out.get_pixel(2, 1), Rgba([0, 2, 0, 255]));
        assert_eq!(*out.get_pixel(2, 3), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn concat_of_nothing_is_an_error() {
        assert!(concat(&[], Axis::Horizontal).is_err());
    }

    #[test]
    fn quad_doubles_both_dimensions_and_places_quadrants() {
        let tl = solid(3, 2, [10, 0, 0, 255]);
        let tr = solid(3, 2, [0, 20, 0, 255]);
        let bl = solid(3, 2, [0, 0, 30, 255]);
        let br = solid(3, 2, [40, 40, 40, 255]);
        let out = quad(&tl, &tr, &bl, &br).unwrap();
        assert_eq!(out.dimensions(), (6, 4));
        assert_eq!(*out.get_pixel(0, 0), Rgba([10, 0, 0, 255]));
        assert_eq!(*out.get_pixel(3, 0), Rgba([0, 20, 0, 255]));
        assert_eq!(*out.get_pixel(0, 2), Rgba([0, 0, 30, 255]));
        assert_eq!(*out.get_pixel(3, 2), Rgba([40, 40, 40, 255]));
    }
}
