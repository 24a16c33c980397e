use std::path::{Path, PathBuf};

use ab_glyph::FontVec;
use anyhow::Context as _;
use tracing::{error, info, warn};

use crate::{
    animate,
    compose::{self, Axis},
    config::{RunConfig, RunLock},
    delivery,
    edit,
    error::{FigpipeError, FigpipeResult},
    frames::{self, FrameSet},
    sources::{self, CropRect, EditRule, EditSpec, WHITE},
    switches::Switches,
};

/// Left strip of the legend-extended GOES-16 IR image joined with the
/// Meteosat view into the combined Atlantic picture.
const GOES_MERGE_STRIP: CropRect = CropRect {
    w: 502,
    h: 2000,
    x: 0,
    y: 0,
};

/// Canvas for the logo placeholder replicated into disabled panel quadrants.
const PLACEHOLDER_CANVAS: (u32, u32) = (780, 400);
const PLACEHOLDER_ROOT: &str = "logo_cpexcv_anim_";

/// Outcome of one run. Per-source failures and skips are collected rather
/// than aborting sibling sources; the process exit code is derived from
/// `is_success`.
#[derive(Debug, Default)]
pub struct RunReport {
    pub warnings: usize,
    pub failures: Vec<String>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn warn_skip(&mut self, what: &str, why: impl std::fmt::Display) {
        warn!("{what}: {why}");
        self.warnings += 1;
    }

    fn fail(&mut self, what: &str, err: impl std::fmt::Display) {
        error!("{what}: {err}");
        self.failures.push(format!("{what}: {err}"));
    }
}

#[derive(Debug)]
pub struct Pipeline {
    switches: Switches,
    figs: PathBuf,
    crop: PathBuf,
    delivery: PathBuf,
    cfg: RunConfig,
}

impl Pipeline {
    pub fn new(root: &Path, cfg: RunConfig, switches: Switches) -> FigpipeResult<Self> {
        cfg.validate()?;
        switches.require_all(sources::REQUIRED_SWITCHES)?;
        Ok(Self {
            figs: cfg.figs_dir(root),
            crop: cfg.crop_dir(root),
            delivery: cfg.delivery_dir(root),
            switches,
            cfg,
        })
    }

    /// Full pipeline: prepare, process, animate, composite, deliver.
    /// Holds the run lock for the whole sequence.
    pub fn run(root: &Path, cfg: RunConfig, switches: Switches, clear: bool) -> FigpipeResult<RunReport> {
        let _lock = RunLock::acquire(root)?;
        let pipeline = Self::new(root, cfg, switches)?;
        let mut report = RunReport::default();

        pipeline.prepare(clear, &mut report)?;
        pipeline.process_images(&mut report)?;
        pipeline.model_animations(&pipeline.figs, &mut report)?;
        pipeline.joint_animations(&mut report)?;
        pipeline.four_panel(&mut report)?;

        let delivered = delivery::deliver(&pipeline.crop, &pipeline.delivery, delivery::MANIFEST)?;
        report.warnings += delivered.missing.len();

        info!(
            warnings = report.warnings,
            failures = report.failures.len(),
            "run complete"
        );
        Ok(report)
    }

    /// Creates the working directories, optionally purges stale crop output,
    /// and stages the trimmed campaign logo.
    pub fn prepare(&self, clear: bool, report: &mut RunReport) -> FigpipeResult<()> {
        for dir in [&self.figs, &self.crop, &self.delivery] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("create directory '{}'", dir.display()))?;
        }

        if clear {
            info!("removing existing files from '{}'", self.crop.display());
            for name in frames::list_file_names(&self.crop)? {
                if name == self.cfg.logo_name {
                    continue;
                }
                std::fs::remove_file(self.crop.join(&name))
                    .with_context(|| format!("remove stale '{name}'"))?;
            }
        }

        self.stage_logo(report)
    }

    fn stage_logo(&self, report: &mut RunReport) -> FigpipeResult<()> {
        let src = self.figs.join(&self.cfg.logo_name);
        if !src.is_file() {
            report.warn_skip("logo staging", format!("'{}' not present", src.display()));
            return Ok(());
        }
        let logo = edit::load_rgba(&src)?;
        let trimmed = match edit::trim_border(&logo) {
            Ok(img) => img,
            // A logo with no border to trim is fine as-is.
            Err(_) => logo,
        };
        edit::save(&trimmed, &self.crop.join(&self.cfg.logo_name))?;
        edit::save(&trimmed, &self.delivery.join(&self.cfg.logo_name))?;
        Ok(())
    }

    /// Component 3: per-source crop/annotate/resize driven by the rule table.
    /// A failure inside one rule is recorded and the remaining rules still run.
    pub fn process_images(&self, report: &mut RunReport) -> FigpipeResult<()> {
        info!("processing images");
        let font = self.font_if_needed()?;

        for rule in sources::EDIT_RULES {
            if !self.any_enabled(rule.switches)? {
                continue;
            }
            let files = frames::select(&self.figs, &rule.filter)?;
            if files.is_empty() {
                report.warn_skip(rule.name, "no matching input files");
                continue;
            }
            info!(rule = rule.name, files = files.len(), "cropping and annotating");
            for name in &files {
                if let Err(e) = self.apply_rule(rule, name, font.as_ref()) {
                    report.fail(rule.name, e);
                    break;
                }
            }
        }

        if self.switches.get("mimic_tpw")? {
            frames::normalize_trailing_index(&self.crop, "animation-")?;
        }

        if self.switches.get("meteosat_sat")? && self.switches.get("GOES16_sat")? {
            if let Err(e) = self.merge_goes_meteosat() {
                report.fail("GOES-16 + Meteosat merge", e);
            }
        }
        Ok(())
    }

    fn font_if_needed(&self) -> FigpipeResult<Option<FontVec>> {
        let mut needed = false;
        for rule in sources::EDIT_RULES {
            if rule.spec.legend.is_some() && self.any_enabled(rule.switches)? {
                needed = true;
            }
        }
        if !needed {
            return Ok(None);
        }
        edit::load_font(self.cfg.font_path.as_deref()).map(Some)
    }

    fn any_enabled(&self, switches: &[&str]) -> FigpipeResult<bool> {
        for name in switches {
            if self.switches.get(name)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Loads a frame set, downgrading an unusable set (gap in the indices, a
    /// malformed frame name) to a per-source skip. Only I/O failures on the
    /// directory itself stay fatal.
    fn load_set_or_skip(
        &self,
        dir: &Path,
        root: &str,
        report: &mut RunReport,
    ) -> FigpipeResult<Option<FrameSet>> {
        match FrameSet::load(dir, root) {
            Ok(set) => Ok(Some(set)),
            Err(FigpipeError::Validation(msg)) => {
                report.warn_skip(root, msg);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn apply_rule(&self, rule: &EditRule, name: &str, font: Option<&FontVec>) -> FigpipeResult<()> {
        let EditSpec {
            crop,
            markers,
            legend,
            colorbar,
            resize,
        } = rule.spec;

        let src = edit::load_rgba(&self.figs.join(name))?;
        let mut out = match crop {
            Some(rect) => edit::crop(&src, rect)?,
            None => src.clone(),
        };
        for marker in markers {
            edit::draw_marker(&mut out, marker);
        }
        if let Some(legend) = legend
            && legend.applies.matches(name)
        {
            let font = font.ok_or_else(|| {
                FigpipeError::config("legend annotation requested but no font loaded")
            })?;
            out = edit::apply_legend(&out, &legend, font)?;
        }
        if let Some(bar) = colorbar {
            // The color bar comes from the original image, not the crop.
            let strip = edit::crop(&src, bar.crop)?;
            let strip = edit::resize_exact(&strip, bar.resize.0, bar.resize.1)?;
            out = compose::concat(&[&out, &strip], Axis::Vertical)?;
        }
        if let Some((w, h)) = resize {
            out = edit::resize_exact(&out, w, h)?;
        }
        edit::save(&out, &self.crop.join(name))
    }

    /// Joins the processed GOES-16 IR color-scale strip with the Meteosat
    /// view into one Tropical Atlantic image.
    fn merge_goes_meteosat(&self) -> FigpipeResult<()> {
        let crop_files = frames::list_file_names(&self.crop)?;
        let goes = crop_files
            .iter()
            .find(|n| n.contains("Goes16") && n.contains("_IRC."))
            .ok_or_else(|| FigpipeError::validation("no processed GOES-16 IRC image"))?;
        let meteosat = crop_files
            .iter()
            .find(|n| n.contains("Meteosat") && n.contains("_IRC."))
            .ok_or_else(|| FigpipeError::validation("no processed Meteosat IRC image"))?;

        let strip = edit::crop(&edit::load_rgba(&self.crop.join(goes))?, GOES_MERGE_STRIP)?;
        let met = edit::load_rgba(&self.crop.join(meteosat))?;
        let joined = compose::concat(&[&strip, &met], Axis::Horizontal)?;
        edit::save(&joined, &self.crop.join("Goes16_Meteosat11_IRC.png"))
    }

    /// Component 6 applied per model/field/day: animations of single-source
    /// frame sets, gated on the exact expected frame count.
    pub fn model_animations(&self, dir: &Path, report: &mut RunReport) -> FigpipeResult<()> {
        info!("creating model output animations");
        let combos: &[(&[&str], &str, &str)] = &[
            (&["uwincm_clouds_animation"], "uwincm", "clouds"),
            (&["uwincm_precipitation_animation"], "uwincm", "precip"),
            (
                &["uutah_precipitation_animation", "UTAH_website"],
                "uutah",
                "precip",
            ),
            (&["ucdavis_precipitation_animation"], "ucdavis", "precip"),
            (&["mpas_precipitation"], "mpas", "precip"),
        ];

        for (switches, model, field) in combos {
            if !self.any_enabled(switches)? {
                continue;
            }
            for &day in &self.cfg.model_days {
                let root = format!("{model}_{field}_day{day}_anim_");
                let Some(set) = self.load_set_or_skip(dir, &root, report)? else {
                    continue;
                };
                if set.len() != self.cfg.expected_frames {
                    report.warn_skip(
                        &root,
                        format!(
                            "expected {} frames, found {}",
                            self.cfg.expected_frames,
                            set.len()
                        ),
                    );
                    continue;
                }
                let out = format!("{model}_{field}_day{day}_movie.gif");
                match animate::animation_steps(dir, &root, &out, self.cfg.delay_ms, self.cfg.n_dup_frames)
                {
                    Ok(true) => {}
                    Ok(false) => report.warnings += 1,
                    Err(e) => report.fail(&root, e),
                }
            }
        }
        Ok(())
    }

    /// Component 4+5+6: paired side-by-side joints, then their animations.
    pub fn joint_animations(&self, report: &mut RunReport) -> FigpipeResult<()> {
        info!("creating joint animations");

        if self.switches.get("ECMWF_prediction")? && self.switches.get("GFS_prediction")? {
            for &day in &self.cfg.prediction_days {
                for field in ["midRH", "mslp_pcpn"] {
                    let joint_root = format!("ECMWF_GFS_{field}_day{day}_anim_");
                    let joined = self.join_pair(
                        &format!("ECMWF_{field}_anim_day{day}_"),
                        &format!("GFS_{field}_anim_day{day}_"),
                        &joint_root,
                        report,
                    )?;
                    if joined {
                        self.animate_joint(&joint_root, &format!("ECMWF_GFS_{field}_day{day}.gif"), report);
                    }
                }
            }
        }

        if self.switches.get("mpas_outlook_day34")? {
            let joined = self.join_pair(
                "mpas_pw_olr_day3_anim_",
                "mpas_rainr_day3_anim_",
                "MPAS_outlook_day3_anim_",
                report,
            )?;
            if joined {
                self.animate_joint("MPAS_outlook_day3_anim_", "MPAS_outlook_day3.gif", report);
            }
        }

        let uwincm_joint = self.switches.get("uwincm_clouds_animation")?
            && self.switches.get("uwincm_precipitation_animation")?;
        if uwincm_joint {
            self.clouds_precip_joint("uwincm", report)?;
        }
        if self.switches.get("UTAH_website")? {
            self.clouds_precip_joint("uutah", report)?;
        }

        Ok(())
    }

    fn clouds_precip_joint(&self, model: &str, report: &mut RunReport) -> FigpipeResult<()> {
        for &day in &self.cfg.model_days {
            let joint_root = format!("{model}_joint_clouds_precipitation_day{day}_anim_");
            let joined = self.join_pair(
                &format!("{model}_clouds_day{day}_anim_"),
                &format!("{model}_precip_day{day}_anim_"),
                &joint_root,
                report,
            )?;
            if joined {
                self.animate_joint(
                    &joint_root,
                    &format!("joint_clouds_precipitation_day{day}_movie.gif"),
                    report,
                );
            }
        }
        Ok(())
    }

    /// Positionally pairs two frame sets from the crop directory and writes
    /// horizontally concatenated joint frames. Count mismatches are reported
    /// and produce no output at all.
    fn join_pair(
        &self,
        left_root: &str,
        right_root: &str,
        out_root: &str,
        report: &mut RunReport,
    ) -> FigpipeResult<bool> {
        let Some(left) = self.load_set_or_skip(&self.crop, left_root, report)? else {
            return Ok(false);
        };
        let Some(right) = self.load_set_or_skip(&self.crop, right_root, report)? else {
            return Ok(false);
        };
        if left.is_empty() {
            report.warn_skip(out_root, format!("no '{left_root}' frames to join"));
            return Ok(false);
        }
        match frames::pair(&left, &right) {
            Ok(pairs) => {
                for (l, r) in pairs {
                    let joined = compose::concat(
                        &[&edit::load_rgba(&l.path)?, &edit::load_rgba(&r.path)?],
                        Axis::Horizontal,
                    )?;
                    edit::save(&joined, &self.crop.join(format!("{out_root}{:02}.jpg", l.index)))?;
                }
                Ok(true)
            }
            Err(e) => {
                report.warn_skip(out_root, format!("the numbers of images for fields do not match ({e})"));
                Ok(false)
            }
        }
    }

    fn animate_joint(&self, root: &str, out_name: &str, report: &mut RunReport) {
        match animate::animation_steps(&self.crop, root, out_name, self.cfg.delay_ms, self.cfg.n_dup_frames)
        {
            Ok(true) => {}
            Ok(false) => report.warnings += 1,
            Err(e) => report.fail(root, e),
        }
    }

    /// Component 5's 2x2 panel: four per-model precipitation sequences (or
    /// logo placeholders for disabled models) composed into one animation
    /// per model day.
    pub fn four_panel(&self, report: &mut RunReport) -> FigpipeResult<()> {
        if !self.switches.get("model_4panel")? {
            return Ok(());
        }

        if let Err(e) = self.write_placeholder_frames() {
            report.fail("four-model panel placeholder", e);
            return Ok(());
        }

        for &day in &self.cfg.model_days {
            let panel_root = format!("Four_model_joint_anim_day{day}_");
            let roots = [
                self.quadrant_root(&self.cfg.panel.top_left, day)?,
                self.quadrant_root(&self.cfg.panel.top_right, day)?,
                self.quadrant_root(&self.cfg.panel.bottom_left, day)?,
                self.quadrant_root(&self.cfg.panel.bottom_right, day)?,
            ];

            let mut loaded = Vec::with_capacity(roots.len());
            for root in &roots {
                let Some(mut set) = self.load_set_or_skip(&self.crop, root, report)? else {
                    break;
                };
                // Earlier stages may have appended persisted trailing frames.
                set.truncate(self.cfg.expected_frames);
                loaded.push(set);
            }
            let Ok([tl, tr, bl, br]) = <[FrameSet; 4]>::try_from(loaded) else {
                continue;
            };

            if tl.is_empty() || [&tr, &bl, &br].iter().any(|set| set.len() != tl.len()) {
                report.warn_skip(
                    &panel_root,
                    format!(
                        "the numbers of images for fields do not match ({}/{}/{}/{})",
                        tl.len(),
                        tr.len(),
                        bl.len(),
                        br.len()
                    ),
                );
                continue;
            }

            for i in 0..tl.len() {
                let panel = compose::quad(
                    &edit::load_rgba(&tl.frames()[i].path)?,
                    &edit::load_rgba(&tr.frames()[i].path)?,
                    &edit::load_rgba(&bl.frames()[i].path)?,
                    &edit::load_rgba(&br.frames()[i].path)?,
                )?;
                edit::save(
                    &panel,
                    &self.crop.join(format!("{panel_root}{:02}.jpg", tl.frames()[i].index)),
                )?;
            }
            self.animate_joint(&panel_root, &format!("Four_model_joint_movie_day{day}.gif"), report);
        }
        Ok(())
    }

    fn quadrant_root(&self, model: &str, day: u8) -> FigpipeResult<String> {
        let switch = match model {
            "uwincm" => "uwincm_precipitation_animation",
            "uutah" => "uutah_precipitation_animation",
            "ucdavis" => "ucdavis_precipitation_animation",
            "mpas" => "mpas_precipitation",
            other => {
                return Err(FigpipeError::config(format!(
                    "unknown panel model '{other}'"
                )));
            }
        };
        Ok(if self.switches.get(switch)? {
            format!("{model}_precip_day{day}_anim_")
        } else {
            PLACEHOLDER_ROOT.to_string()
        })
    }

    /// Replicates the logo, centered on a white canvas, into a frame set of
    /// the expected length so it can stand in for a disabled quadrant.
    fn write_placeholder_frames(&self) -> FigpipeResult<()> {
        let logo = edit::load_rgba(&self.crop.join(&self.cfg.logo_name))?;
        let placeholder = edit::compose_centered(PLACEHOLDER_CANVAS, WHITE, &logo);
        for index in 0..self.cfg.expected_frames {
            edit::save(
                &placeholder,
                &self.crop.join(format!("{PLACEHOLDER_ROOT}{index:02}.png")),
            )?;
        }
        Ok(())
    }

    /// Component 7 standalone entry (the `deliver` subcommand).
    pub fn deliver(&self) -> FigpipeResult<delivery::DeliveryReport> {
        delivery::deliver(&self.crop, &self.delivery, delivery::MANIFEST)
    }

    pub fn figs_dir(&self) -> &Path {
        &self.figs
    }

    pub fn crop_dir(&self) -> &Path {
        &self.crop
    }
}
