use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use anyhow::Context as _;
use image::{Rgba, RgbaImage, imageops};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_circle_mut, draw_text_mut};

use crate::{
    error::{FigpipeError, FigpipeResult},
    sources::{CropRect, Legend, Marker},
};

pub fn load_rgba(path: &Path) -> FigpipeResult<RgbaImage> {
    let img = image::open(path)
        .map_err(|e| FigpipeError::image(format!("decode '{}': {e}", path.display())))?;
    Ok(img.to_rgba8())
}

/// Saves through the format implied by the extension. JPEG output is
/// flattened to RGB first since the encoder rejects alpha.
pub fn save(img: &RgbaImage, path: &Path) -> FigpipeResult<()> {
    let is_jpeg = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"));
    let result = if is_jpeg {
        image::DynamicImage::ImageRgba8(img.clone()).to_rgb8().save(path)
    } else {
        img.save(path)
    };
    result.map_err(|e| FigpipeError::image(format!("write '{}': {e}", path.display())))
}

/// Extracts `rect` from `img`. Out-of-bounds rectangles are an error, not
/// silently clamped.
pub fn crop(img: &RgbaImage, rect: CropRect) -> FigpipeResult<RgbaImage> {
    let (iw, ih) = img.dimensions();
    if rect.w == 0 || rect.h == 0 {
        return Err(FigpipeError::validation("crop rectangle must be non-empty"));
    }
    if rect.x + rect.w > iw || rect.y + rect.h > ih {
        return Err(FigpipeError::validation(format!(
            "crop {}x{}+{}+{} exceeds image bounds {iw}x{ih}",
            rect.w, rect.h, rect.x, rect.y
        )));
    }
    Ok(imageops::crop_imm(img, rect.x, rect.y, rect.w, rect.h).to_image())
}

/// Stamps a filled circle with a one-pixel stroke outline, the point-of-
/// interest marker from the source table.
///
/// `Marker::radius` is a diagonal offset: the circle passes through
/// `(x + radius, y + radius)`, so the rendered pixel radius is `radius * sqrt(2)`.
pub fn draw_marker(img: &mut RgbaImage, marker: &Marker) {
    let center = (marker.x, marker.y);
    let radius = (f64::from(marker.radius) * std::f64::consts::SQRT_2).round() as i32;
    draw_filled_circle_mut(img, center, radius, marker.fill);
    draw_hollow_circle_mut(img, center, radius, marker.stroke);
}

pub fn annotate(
    img: &mut RgbaImage,
    font: &FontVec,
    point_size: f32,
    x: i32,
    y: i32,
    text: &str,
    color: Rgba<u8>,
) {
    draw_text_mut(img, color, x, y, PxScale::from(point_size), font, text);
}

/// Widens the canvas to `legend.extent` with a solid background, keeps the
/// content left-aligned and vertically centered, and stamps the legend's
/// fixed-position labels into the new margin.
pub fn apply_legend(img: &RgbaImage, legend: &Legend, font: &FontVec) -> FigpipeResult<RgbaImage> {
    let (w, h) = img.dimensions();
    let (ew, eh) = legend.extent;
    if ew < w || eh < h {
        return Err(FigpipeError::validation(format!(
            "legend extent {ew}x{eh} is smaller than image {w}x{h}"
        )));
    }
    let mut out = RgbaImage::from_pixel(ew, eh, legend.background);
    imageops::overlay(&mut out, img, 0, i64::from((eh - h) / 2));
    for (y, text) in legend.labels {
        annotate(
            &mut out,
            font,
            legend.point_size,
            legend.label_x,
            *y,
            text,
            legend.color,
        );
    }
    Ok(out)
}

pub fn resize_exact(img: &RgbaImage, w: u32, h: u32) -> FigpipeResult<RgbaImage> {
    if w == 0 || h == 0 {
        return Err(FigpipeError::validation("resize target must be non-empty"));
    }
    Ok(imageops::resize(img, w, h, imageops::FilterType::Lanczos3))
}

/// Crops away the uniform border, taking the top-left pixel as the border
/// color (the logo trim step).
pub fn trim_border(img: &RgbaImage) -> FigpipeResult<RgbaImage> {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return Err(FigpipeError::validation("cannot trim an empty image"));
    }
    let border = *img.get_pixel(0, 0);
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (w, h, 0u32, 0u32);
    for (x, y, px) in img.enumerate_pixels() {
        if *px != border {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }
    if min_x > max_x {
        return Err(FigpipeError::validation(
            "trim would discard the entire image (uniform color)",
        ));
    }
    crop(
        img,
        CropRect {
            w: max_x - min_x + 1,
            h: max_y - min_y + 1,
            x: min_x,
            y: min_y,
        },
    )
}

/// Centers `img` on a solid canvas of the given size (placeholder frames for
/// disabled panel quadrants). Oversized content is clipped at the edges.
pub fn compose_centered(canvas: (u32, u32), bg: Rgba<u8>, img: &RgbaImage) -> RgbaImage {
    let (cw, ch) = canvas;
    let (w, h) = img.dimensions();
    let mut out = RgbaImage::from_pixel(cw, ch, bg);
    let x = (i64::from(cw) - i64::from(w)) / 2;
    let y = (i64::from(ch) - i64::from(h)) / 2;
    imageops::overlay(&mut out, img, x, y);
    out
}

/// Resolves the annotation font: an explicit override first, then a few
/// well-known system locations.
pub fn load_font(override_path: Option<&Path>) -> FigpipeResult<FontVec> {
    const CANDIDATES: &[&str] = &[
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/Library/Fonts/Arial.ttf",
    ];

    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => CANDIDATES
            .iter()
            .map(Path::new)
            .find(|p| p.exists())
            .ok_or_else(|| {
                FigpipeError::config(
                    "no annotation font found; set an explicit font path in the run config",
                )
            })?
            .to_path_buf(),
    };

    let bytes = std::fs::read(&path)
        .with_context(|| format!("read font '{}'", path.display()))?;
    FontVec::try_from_vec(bytes)
        .map_err(|e| FigpipeError::config(format!("parse font '{}': {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(w: u32, h: u32, c: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba(c))
    }

    #[test]
    fn crop_extracts_expected_region() {
        let mut img = solid(10, 10, [0, 0, 0, 255]);
        img.put_pixel(4, 5, Rgba([255, 0, 0, 255]));
        let out = crop(
            &img,
            CropRect {
                w: 2,
                h: 2,
                x: 4,
                y: 5,
            },
        )
        .unwrap();
        assert_eq!(out.dimensions(), (2, 2));
        assert_eq!(*out.get_pixel(0, 0), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn out_of_bounds_crop_is_rejected() {
        let img = solid(10, 10, [0, 0, 0, 255]);
        assert!(
            crop(
                &img,
                CropRect {
                    w: 8,
                    h: 8,
                    x: 4,
                    y: 4
                }
            )
            .is_err()
        );
    }

    #[test]
    fn marker_radius_is_a_diagonal_offset() {
        let mut img = solid(20, 20, [0, 0, 0, 255]);
        draw_marker(
            &mut img,
            &Marker {
                x: 10,
                y: 10,
                radius: 3,
                fill: Rgba([255, 0, 0, 255]),
                stroke: Rgba([0, 0, 255, 255]),
            },
        );
        // radius 3 renders as a circle of pixel radius 4 (3 * sqrt 2).
        assert_eq!(*img.get_pixel(10, 10), Rgba([255, 0, 0, 255]));
        assert_eq!(*img.get_pixel(13, 10), Rgba([255, 0, 0, 255]));
        assert_eq!(*img.get_pixel(14, 10), Rgba([0, 0, 255, 255]));
        assert_eq!(*img.get_pixel(15, 10), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn trim_border_finds_content_box() {
        let mut img = solid(10, 10, [255, 255, 255, 255]);
        img.put_pixel(3, 4, Rgba([0, 0, 0, 255]));
        img.put_pixel(6, 7, Rgba([0, 0, 0, 255]));
        let out = trim_border(&img).unwrap();
        assert_eq!(out.dimensions(), (4, 4));
    }

    #[test]
    fn trim_rejects_uniform_image() {
        let img = solid(5, 5, [255, 255, 255, 255]);
        assert!(trim_border(&img).is_err());
    }

    #[test]
    fn compose_centered_places_content_mid_canvas() {
        let inner = solid(2, 2, [10, 20, 30, 255]);
        let out = compose_centered((6, 6), Rgba([255, 255, 255, 255]), &inner);
        assert_eq!(out.dimensions(), (6, 6));
        assert_eq!(*out.get_pixel(2, 2), Rgba([10, 20, 30, 255]));
        assert_eq!(*out.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn resize_exact_hits_target_dimensions() {
        let img = solid(682, 38, [1, 2, 3, 255]);
        let out = resize_exact(&img, 1312, 73).unwrap();
        assert_eq!(out.dimensions(), (1312, 73));
    }
}
