use std::path::Path;

use anyhow::Context as _;
use tracing::{info, warn};

use crate::error::FigpipeResult;

/// Ordered delivery manifest: produced artifact name, final display name.
///
/// The numeric prefixes encode slide order for the downstream template; the
/// strings are the contract with that consumer and must match exactly.
pub const MANIFEST: &[(&str, &str)] = &[
    ("logo_cpexcv.png", "logo_cpexcv.png"),
    ("NHC_surface_analysis.png", "03_NHC_surface_analysis.png"),
    ("MIMIC-TPW_latest.png", "04_MIMIC-TPW_latest.png"),
    ("SAL_dryAir_split.jpg", "04_SAL_dryAir_split.jpg"),
    ("AEW_Brammer.jpg", "04_AEW_Brammer.jpg"),
    ("Goes16_Meteosat11_IRC.png", "04_Goes16_Meteosat11_IRC.png"),
    ("NHC_2day_outlook.png", "05_NHC_2day_outlook.png"),
    ("NHC_5day_outlook.png", "05_NHC_5day_outlook.png"),
    ("GEOS_dust_aot_day1.png", "06_GEOS_dust_aot_day1.png"),
    ("GEOS_total_aot_day1.png", "06_GEOS_total_aot_day1.png"),
    ("GEOS_dust_aot_day1_vert_15N.png", "06_GEOS_dust_aot_day1_vert_15N.png"),
    ("GEOS_dust_aot_day1_vert_20W.png", "06_GEOS_dust_aot_day1_vert_20W.png"),
    ("GEOS_dust_aot_day2.png", "07_GEOS_dust_aot_day2.png"),
    ("GEOS_total_aot_day2.png", "07_GEOS_total_aot_day2.png"),
    ("GEOS_dust_aot_day2_vert_15N.png", "07_GEOS_dust_aot_day2_vert_15N.png"),
    ("GEOS_dust_aot_day2_vert_20W.png", "07_GEOS_dust_aot_day2_vert_20W.png"),
    ("GEOS_total_aot_day3.png", "08_GEOS_total_aot_day3.png"),
    ("GEOS_total_aot_day4.png", "08_GEOS_total_aot_day4.png"),
    ("ECMWF_GFS_midRH_day1.gif", "10_ECMWF_GFS_midRH_day1.gif"),
    ("ECMWF_GFS_midRH_day2.gif", "11_ECMWF_GFS_midRH_day2.gif"),
    ("ECMWF_GFS_midRH_day3.gif", "12_ECMWF_GFS_midRH_day3.gif"),
    ("ECMWF_GFS_mslp_pcpn_day1.gif", "14_ECMWF_GFS_mslp_pcpn_day1.gif"),
    (
        "joint_clouds_precipitation_day1_movie.gif",
        "15_joint_clouds_precipitation_day1_movie.gif",
    ),
    ("Four_model_joint_movie_day1.gif", "16_Four_model_joint_day1_movie.gif"),
    ("ECMWF_GFS_mslp_pcpn_day2.gif", "17_ECMWF_GFS_mslp_pcpn_day2.gif"),
    (
        "joint_clouds_precipitation_day2_movie.gif",
        "18_joint_clouds_precipitation_day2_movie.gif",
    ),
    ("Four_model_joint_movie_day2.gif", "19_Four_model_joint_day2_movie.gif"),
    ("ECMWF_GFS_mslp_pcpn_day3.gif", "20_ECMWF_GFS_mslp_pcpn_day3.gif"),
    ("MPAS_outlook_day3.gif", "21_MPAS_outlook_day3.gif"),
];

#[derive(Clone, Debug, Default)]
pub struct DeliveryReport {
    pub copied: usize,
    pub missing: Vec<String>,
}

impl DeliveryReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Copies each present manifest entry from `crop_dir` into `delivery_dir`
/// under its produced name, then renames it in place to the final display
/// name. Absent sources are per-item warnings; the rest of the manifest
/// still runs.
pub fn deliver(
    crop_dir: &Path,
    delivery_dir: &Path,
    manifest: &[(&str, &str)],
) -> FigpipeResult<DeliveryReport> {
    std::fs::create_dir_all(delivery_dir)
        .with_context(|| format!("create delivery directory '{}'", delivery_dir.display()))?;

    let mut report = DeliveryReport::default();
    for (produced, display) in manifest {
        let src = crop_dir.join(produced);
        if !src.is_file() {
            warn!(file = produced, "not present and cannot be copied over");
            report.missing.push((*produced).to_string());
            continue;
        }

        let staged = delivery_dir.join(produced);
        std::fs::copy(&src, &staged)
            .with_context(|| format!("copy '{}' to '{}'", src.display(), staged.display()))?;
        let final_path = delivery_dir.join(display);
        std::fs::rename(&staged, &final_path).with_context(|| {
            format!("rename '{}' to '{}'", staged.display(), final_path.display())
        })?;
        report.copied += 1;
    }

    info!(
        copied = report.copied,
        missing = report.missing.len(),
        "delivery stage complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_rename_targets_are_unique() {
        let mut names: Vec<&str> = MANIFEST.iter().map(|(_, display)| *display).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), MANIFEST.len());
    }

    #[test]
    fn partial_manifest_copies_present_entries_and_reports_missing() {
        let crop = tempfile::tempdir().unwrap();
        let fin = tempfile::tempdir().unwrap();
        std::fs::write(crop.path().join("a.png"), b"a").unwrap();
        std::fs::write(crop.path().join("c.gif"), b"c").unwrap();

        let manifest = &[
            ("a.png", "01_a.png"),
            ("b.png", "02_b.png"),
            ("c.gif", "03_c.gif"),
        ];
        let report = deliver(crop.path(), fin.path(), manifest).unwrap();

        assert_eq!(report.copied, 2);
        assert_eq!(report.missing, vec!["b.png".to_string()]);
        assert!(!report.is_complete());
        assert!(fin.path().join("01_a.png").exists());
        assert!(fin.path().join("03_c.gif").exists());
        assert!(!fin.path().join("a.png").exists(), "staged name must be renamed away");
        assert!(!fin.path().join("02_b.png").exists());
    }
}
