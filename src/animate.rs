use std::path::Path;

use anyhow::Context as _;
use image::{
    Delay, Frame,
    codecs::gif::{GifEncoder, Repeat},
};
use tracing::info;

use crate::{
    edit,
    error::{FigpipeError, FigpipeResult},
    frames::FrameSet,
};

/// Appends `n_dup` byte-identical copies of the last frame, continuing the
/// zero-padded numbering, so playback pauses on the final frame before the
/// loop restarts.
///
/// Returns `None` for an empty frame set; the caller is expected to skip
/// encoding with a warning, since partial upstream fetches are routine.
pub fn persist_last_frame(
    dir: &Path,
    root: &str,
    n_dup: u32,
) -> FigpipeResult<Option<FrameSet>> {
    let set = FrameSet::load(dir, root)?;
    let Some(last) = set.last() else {
        return Ok(None);
    };

    let last_index = last.index;
    let src = last.path.clone();
    for offset in 1..=n_dup {
        let dst = set.path_for_index(last_index + offset);
        std::fs::copy(&src, &dst).with_context(|| {
            format!("duplicate '{}' to '{}'", src.display(), dst.display())
        })?;
    }

    Ok(Some(FrameSet::load(dir, root)?))
}

/// Encodes `set` into a looping GIF at a uniform per-frame delay.
/// `loop_count == 0` means infinite looping.
pub fn encode_animation(
    set: &FrameSet,
    delay_ms: u32,
    loop_count: u16,
    out_path: &Path,
) -> FigpipeResult<()> {
    if set.is_empty() {
        return Err(FigpipeError::validation(format!(
            "cannot encode '{}': frame set '{}' is empty",
            out_path.display(),
            set.root
        )));
    }

    let file = std::fs::File::create(out_path)
        .with_context(|| format!("create '{}'", out_path.display()))?;
    let mut encoder = GifEncoder::new(file);
    let repeat = if loop_count == 0 {
        Repeat::Infinite
    } else {
        Repeat::Finite(loop_count)
    };
    encoder
        .set_repeat(repeat)
        .map_err(|e| FigpipeError::image(format!("set gif repeat: {e}")))?;

    let delay = Delay::from_numer_denom_ms(delay_ms, 1);
    for frame in set.frames() {
        let img = edit::load_rgba(&frame.path)?;
        encoder
            .encode_frame(Frame::from_parts(img, 0, 0, delay))
            .map_err(|e| {
                FigpipeError::image(format!(
                    "encode frame '{}' into '{}': {e}",
                    frame.file_name,
                    out_path.display()
                ))
            })?;
    }
    Ok(())
}

/// Persist-then-encode. Returns whether an animation was produced; a missing
/// frame set is a logged skip, not an error.
pub fn animation_steps(
    dir: &Path,
    root: &str,
    out_name: &str,
    delay_ms: u32,
    n_dup: u32,
) -> FigpipeResult<bool> {
    match persist_last_frame(dir, root, n_dup)? {
        Some(set) => {
            encode_animation(&set, delay_ms, 0, &dir.join(out_name))?;
            info!(root, out = out_name, frames = set.len(), "encoded animation");
            Ok(true)
        }
        None => {
            tracing::warn!(root, "missing images - cannot create animation");
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{AnimationDecoder as _, Rgba, RgbaImage, codecs::gif::GifDecoder};

    fn write_png(dir: &Path, name: &str, shade: u8) {
        let img = RgbaImage::from_pixel(4, 3, Rgba([shade, 0, 0, 255]));
        img.save(dir.join(name)).unwrap();
    }

    #[test]
    fn persist_on_empty_set_reports_not_possible() {
        let dir = tempfile::tempdir().unwrap();
        let out = persist_last_frame(dir.path(), "missing_anim_", 3).unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn persist_extends_set_with_identical_trailing_frames() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..4u8 {
            write_png(dir.path(), &format!("a_anim_{i:02}.png"), i * 10);
        }

        let set = persist_last_frame(dir.path(), "a_anim_", 3).unwrap().unwrap();
        assert_eq!(set.len(), 7);
        let indices: Vec<u32> = set.frames().iter().map(|f| f.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5, 6]);

        let last_original = std::fs::read(dir.path().join("a_anim_03.png")).unwrap();
        for i in 4..=6 {
            let dup = std::fs::read(dir.path().join(format!("a_anim_{i:02}.png"))).unwrap();
            assert_eq!(dup, last_original, "duplicate {i} is not byte-identical");
        }
    }

    #[test]
    fn encode_refuses_empty_set_and_counts_frames_otherwise() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..2u8 {
            write_png(dir.path(), &format!("b_anim_{i:02}.png"), 100 + i);
        }
        let set = FrameSet::load(dir.path(), "b_anim_").unwrap();
        let out = dir.path().join("b.gif");
        encode_animation(&set, 500, 0, &out).unwrap();

        let decoder = GifDecoder::new(std::io::BufReader::new(
            std::fs::File::open(&out).unwrap(),
        ))
        .unwrap();
        let frames = decoder.into_frames().collect_frames().unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(
            frames[0].delay(),
            Delay::from_numer_denom_ms(500, 1),
            "per-frame delay should match the configured value"
        );

        let empty = FrameSet::load(dir.path(), "nope_anim_").unwrap();
        assert!(encode_animation(&empty, 500, 0, &dir.path().join("x.gif")).is_err());
    }

    #[test]
    fn animation_steps_skips_missing_sets() {
        let dir = tempfile::tempdir().unwrap();
        let produced = animation_steps(dir.path(), "ghost_anim_", "ghost.gif", 500, 3).unwrap();
        assert!(!produced);
        assert!(!dir.path().join("ghost.gif").exists());
    }
}
