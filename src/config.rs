use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

use crate::error::{FigpipeError, FigpipeResult};

/// Run parameters beyond the switch file. All fields are defaulted so an
/// absent config file means the stock layout.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Directory the upstream fetch step drops raw figures into.
    pub figs_dir: PathBuf,
    /// Working directory for cropped/annotated/composited artifacts.
    pub crop_dir: PathBuf,
    /// Delivery directory consumed by the slide/website generator.
    pub delivery_dir: PathBuf,
    /// Switch file, relative to the run root.
    pub switch_file: PathBuf,
    /// Trailing duplicates of the last frame, the loop "pause".
    pub n_dup_frames: u32,
    /// Uniform inter-frame GIF delay.
    pub delay_ms: u32,
    /// Frame count a complete model animation is expected to have.
    pub expected_frames: usize,
    /// Model forecast days with per-day animations.
    pub model_days: Vec<u8>,
    /// Forecast days covered by the ECMWF/GFS outlook joints.
    pub prediction_days: Vec<u8>,
    /// Which model feeds each quadrant of the four-model panel.
    pub panel: PanelLayout,
    /// Campaign logo file name (also the panel placeholder).
    pub logo_name: String,
    /// Explicit TTF path for legend annotations; system fallbacks otherwise.
    pub font_path: Option<PathBuf>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PanelLayout {
    pub top_left: String,
    pub top_right: String,
    pub bottom_left: String,
    pub bottom_right: String,
}

impl Default for PanelLayout {
    fn default() -> Self {
        Self {
            top_left: "uwincm".to_string(),
            top_right: "uutah".to_string(),
            bottom_left: "ucdavis".to_string(),
            bottom_right: "mpas".to_string(),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            figs_dir: PathBuf::from("figs"),
            crop_dir: PathBuf::from("figs_cropped"),
            delivery_dir: PathBuf::from("figs_final"),
            switch_file: PathBuf::from("supplementary/switches_process.txt"),
            n_dup_frames: 3,
            delay_ms: 500,
            expected_frames: 12,
            model_days: vec![1, 2],
            prediction_days: vec![1, 2, 3],
            panel: PanelLayout::default(),
            logo_name: "logo_cpexcv.png".to_string(),
            font_path: None,
        }
    }
}

impl RunConfig {
    pub fn load(path: &Path) -> FigpipeResult<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("open config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_reader(std::io::BufReader::new(file))
            .map_err(|e| FigpipeError::config(format!("parse '{}': {e}", path.display())))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> FigpipeResult<()> {
        if self.expected_frames == 0 {
            return Err(FigpipeError::config("expected_frames must be non-zero"));
        }
        if self.delay_ms == 0 {
            return Err(FigpipeError::config("delay_ms must be non-zero"));
        }
        Ok(())
    }

    pub fn figs_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.figs_dir)
    }

    pub fn crop_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.crop_dir)
    }

    pub fn delivery_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.delivery_dir)
    }

    pub fn switch_file(&self, root: &Path) -> PathBuf {
        root.join(&self.switch_file)
    }
}

/// Exclusive run lock. Stages communicate through the crop directory with no
/// atomic-rename discipline, so concurrent runs against one tree must be
/// serialized.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    pub fn acquire(root: &Path) -> FigpipeResult<Self> {
        let path = root.join(".figpipe.lock");
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(_) => Ok(Self { path }),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(FigpipeError::config(format!(
                    "another run holds the lock '{}'; remove it if no run is active",
                    path.display()
                )))
            }
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("create lock '{}'", path.display()))
                .into()),
        }
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_stock_layout() {
        let cfg = RunConfig::default();
        assert_eq!(cfg.n_dup_frames, 3);
        assert_eq!(cfg.delay_ms, 500);
        assert_eq!(cfg.expected_frames, 12);
        assert_eq!(cfg.model_days, vec![1, 2]);
        assert_eq!(cfg.prediction_days, vec![1, 2, 3]);
        assert_eq!(cfg.panel.top_left, "uwincm");
        assert_eq!(cfg.figs_dir(Path::new("/run")), PathBuf::from("/run/figs"));
    }

    #[test]
    fn partial_json_overrides_defaults() {
        let cfg: RunConfig =
            serde_json::from_str(r#"{"delay_ms": 40, "expected_frames": 6}"#).unwrap();
        assert_eq!(cfg.delay_ms, 40);
        assert_eq!(cfg.expected_frames, 6);
        assert_eq!(cfg.n_dup_frames, 3);
    }

    #[test]
    fn unknown_config_keys_are_rejected() {
        assert!(serde_json::from_str::<RunConfig>(r#"{"delayms": 40}"#).is_err());
    }

    #[test]
    fn lock_is_exclusive_until_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let lock = RunLock::acquire(dir.path()).unwrap();
        assert!(RunLock::acquire(dir.path()).is_err());
        drop(lock);
        assert!(RunLock::acquire(dir.path()).is_ok());
    }
}
