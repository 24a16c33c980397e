//! Per-source crop/annotation geometry.
//!
//! Everything here is configuration, never computed: fixed crop rectangles,
//! marker coordinates in the cropped image's coordinate space, and legend
//! label positions, keyed by filename convention and gated by switches.

use image::Rgba;

use crate::frames::NameFilter;

pub const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
pub const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
pub const MAGENTA: Rgba<u8> = Rgba([255, 0, 255, 255]);

/// Width x height region at offset (x, y), origin top-left.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropRect {
    pub w: u32,
    pub h: u32,
    pub x: u32,
    pub y: u32,
}

/// Filled circle stamped at a fixed point of interest.
#[derive(Clone, Copy, Debug)]
pub struct Marker {
    pub x: i32,
    pub y: i32,
    /// Diagonal offset defining the circle: the perimeter passes through
    /// `(x + radius, y + radius)`, a pixel radius of `radius * sqrt(2)`.
    pub radius: i32,
    pub fill: Rgba<u8>,
    pub stroke: Rgba<u8>,
}

/// Synthesized color-scale legend: widen the canvas, keep content on the
/// left, stamp fixed-position labels into the margin.
#[derive(Clone, Copy, Debug)]
pub struct Legend {
    /// Additional filename filter within the rule (legends only apply to the
    /// color-IR variants).
    pub applies: NameFilter,
    pub extent: (u32, u32),
    pub label_x: i32,
    pub point_size: f32,
    pub labels: &'static [(i32, &'static str)],
    pub background: Rgba<u8>,
    pub color: Rgba<u8>,
}

/// Secondary sub-rectangle (the original color bar) cropped from the source
/// image, resized, and appended below the main crop.
#[derive(Clone, Copy, Debug)]
pub struct Colorbar {
    pub crop: CropRect,
    pub resize: (u32, u32),
}

#[derive(Clone, Copy, Debug)]
pub struct EditSpec {
    pub crop: Option<CropRect>,
    pub markers: &'static [Marker],
    pub legend: Option<Legend>,
    pub colorbar: Option<Colorbar>,
    pub resize: Option<(u32, u32)>,
}

/// One recognized source family: which switch(es) enable it, which files it
/// selects, and how those files are edited.
#[derive(Clone, Copy, Debug)]
pub struct EditRule {
    pub name: &'static str,
    /// Enabled when any listed switch is `True`.
    pub switches: &'static [&'static str],
    pub filter: NameFilter,
    pub spec: EditSpec,
}

const NO_MARKERS: &[Marker] = &[];

const PLAIN: EditSpec = EditSpec {
    crop: None,
    markers: NO_MARKERS,
    legend: None,
    colorbar: None,
    resize: None,
};

const fn cropped(w: u32, h: u32, x: u32, y: u32) -> Option<CropRect> {
    Some(CropRect { w, h, x, y })
}

/// Celsius IR color-scale labels, bottom (warm) to top (cold), plus the unit.
const CELSIUS_SCALE: &[(i32, &str)] = &[
    (1775, "-110"),
    (1577, "-90"),
    (1395, "-70"),
    (1215, "-50"),
    (1035, "-30"),
    (855, "-10"),
    (675, " 10"),
    (495, " 30"),
    (315, " 50"),
    (245, "\u{ba}C"),
];

const IRC_ONLY: NameFilter = NameFilter {
    all: &["IRC"],
    any: &[],
    none: &[],
};

pub const EDIT_RULES: &[EditRule] = &[
    EditRule {
        name: "NHC surface analysis",
        switches: &["nhc_analysis"],
        filter: NameFilter {
            all: &["NHC_surface_analysis.png"],
            any: &[],
            none: &[],
        },
        spec: EditSpec {
            crop: cropped(1268, 648, 1100, 350),
            markers: &[Marker {
                x: 952,
                y: 445,
                radius: 5,
                fill: RED,
                stroke: BLACK,
            }],
            ..PLAIN
        },
    },
    EditRule {
        name: "NHC tropical weather outlooks",
        switches: &["nhc_analysis"],
        filter: NameFilter {
            all: &["NHC_"],
            any: &[],
            none: &["surface_analysis"],
        },
        spec: EditSpec {
            crop: cropped(900, 665, 0, 0),
            markers: &[Marker {
                x: 775,
                y: 445,
                radius: 5,
                fill: BLUE,
                stroke: BLACK,
            }],
            ..PLAIN
        },
    },
    EditRule {
        name: "MIMIC total precipitable water",
        switches: &["mimic_tpw"],
        filter: NameFilter {
            all: &["MIMIC-TPW"],
            any: &[],
            none: &[],
        },
        spec: EditSpec {
            crop: cropped(990, 452, 8, 18),
            markers: &[Marker {
                x: 665,
                y: 323,
                radius: 4,
                fill: WHITE,
                stroke: BLACK,
            }],
            ..PLAIN
        },
    },
    EditRule {
        name: "tropical wave analysis",
        switches: &["brammer_tropical_waves"],
        filter: NameFilter {
            all: &["Brammer"],
            any: &[],
            none: &[],
        },
        spec: EditSpec {
            crop: cropped(990, 388, 10, 0),
            markers: &[Marker {
                x: 662,
                y: 243,
                radius: 4,
                fill: RED,
                stroke: BLACK,
            }],
            ..PLAIN
        },
    },
    EditRule {
        name: "SAL dust split",
        switches: &["sal_split"],
        filter: NameFilter {
            all: &["SAL_dryAir_split"],
            any: &[],
            none: &[],
        },
        spec: EditSpec {
            crop: cropped(1312, 780, 230, 0),
            markers: &[Marker {
                x: 1120,
                y: 488,
                radius: 6,
                fill: WHITE,
                stroke: BLACK,
            }],
            // Enlarged copy of the original color bar, appended below.
            colorbar: Some(Colorbar {
                crop: CropRect {
                    w: 682,
                    h: 38,
                    x: 430,
                    y: 782,
                },
                resize: (1312, 73),
            }),
            ..PLAIN
        },
    },
    EditRule {
        name: "Meteosat-11",
        switches: &["meteosat_sat"],
        filter: NameFilter {
            all: &["Meteosat"],
            any: &[],
            none: &[],
        },
        spec: EditSpec {
            crop: cropped(3000, 2000, 0, 0),
            markers: &[Marker {
                x: 850,
                y: 910,
                radius: 12,
                fill: MAGENTA,
                stroke: BLACK,
            }],
            legend: Some(Legend {
                applies: IRC_ONLY,
                extent: (3100, 2000),
                label_x: 3000,
                point_size: 50.0,
                labels: CELSIUS_SCALE,
                background: WHITE,
                color: BLACK,
            }),
            ..PLAIN
        },
    },
    EditRule {
        name: "GOES-16 infrared",
        switches: &["GOES16_sat"],
        filter: NameFilter {
            all: &["Goes16"],
            any: &["IRC", "RGB"],
            none: &[],
        },
        spec: EditSpec {
            crop: cropped(2000, 2000, 0, 0),
            markers: &[Marker {
                x: 1340,
                y: 940,
                radius: 12,
                fill: MAGENTA,
                stroke: BLACK,
            }],
            legend: Some(Legend {
                applies: IRC_ONLY,
                extent: (2100, 2000),
                label_x: 2000,
                point_size: 50.0,
                labels: CELSIUS_SCALE,
                background: WHITE,
                color: BLACK,
            }),
            ..PLAIN
        },
    },
    EditRule {
        name: "GOES-16 visible",
        switches: &["GOES16_sat"],
        filter: NameFilter {
            all: &["Goes16", "VIS"],
            any: &[],
            none: &[],
        },
        spec: EditSpec {
            crop: cropped(3712, 3700, 0, 0),
            markers: &[Marker {
                x: 940,
                y: 1560,
                radius: 24,
                fill: MAGENTA,
                stroke: BLACK,
            }],
            ..PLAIN
        },
    },
    EditRule {
        name: "UWIN-CM clouds",
        switches: &["uwincm_clouds_animation"],
        filter: NameFilter {
            all: &["uwincm_clouds"],
            any: &[],
            none: &[],
        },
        spec: EditSpec {
            crop: cropped(740, 450, 25, 110),
            markers: &[Marker {
                x: 448,
                y: 172,
                radius: 5,
                fill: WHITE,
                stroke: BLACK,
            }],
            ..PLAIN
        },
    },
    EditRule {
        name: "UWIN-CM precipitation",
        switches: &["uwincm_precipitation_animation"],
        filter: NameFilter {
            all: &["uwincm_precip"],
            any: &[],
            none: &[],
        },
        spec: EditSpec {
            crop: cropped(740, 500, 25, 110),
            markers: &[Marker {
                x: 454,
                y: 171,
                radius: 5,
                fill: BLACK,
                stroke: RED,
            }],
            ..PLAIN
        },
    },
    EditRule {
        name: "U. Utah precipitation",
        switches: &["uutah_precipitation_animation", "UTAH_website"],
        filter: NameFilter {
            all: &["uutah_precip"],
            any: &[],
            none: &[],
        },
        spec: EditSpec {
            markers: &[Marker {
                x: 452,
                y: 187,
                radius: 5,
                fill: BLACK,
                stroke: RED,
            }],
            resize: Some((750, 500)),
            ..PLAIN
        },
    },
    EditRule {
        name: "U. Utah clouds",
        switches: &["uutah_precipitation_animation", "UTAH_website"],
        filter: NameFilter {
            all: &["uutah_clouds"],
            any: &[],
            none: &[],
        },
        spec: EditSpec {
            markers: &[Marker {
                x: 452,
                y: 187,
                radius: 5,
                fill: BLACK,
                stroke: RED,
            }],
            resize: Some((750, 500)),
            ..PLAIN
        },
    },
    EditRule {
        name: "UC Davis precipitation",
        switches: &["ucdavis_precipitation_animation"],
        filter: NameFilter {
            all: &["ucdavis_precip"],
            any: &[],
            none: &[],
        },
        spec: EditSpec {
            markers: &[Marker {
                x: 422,
                y: 163,
                radius: 5,
                fill: BLACK,
                stroke: RED,
            }],
            resize: Some((750, 500)),
            ..PLAIN
        },
    },
    EditRule {
        name: "ECMWF mid-level RH",
        switches: &["ECMWF_prediction"],
        filter: NameFilter {
            all: &["ECMWF_midRH_anim"],
            any: &[],
            none: &[],
        },
        spec: EditSpec {
            crop: cropped(971, 547, 0, 0),
            markers: &[Marker {
                x: 235,
                y: 325,
                radius: 4,
                fill: RED,
                stroke: BLACK,
            }],
            ..PLAIN
        },
    },
    EditRule {
        name: "ECMWF MSLP + precipitation",
        switches: &["ECMWF_prediction"],
        filter: NameFilter {
            all: &["ECMWF_mslp_pcpn_anim"],
            any: &[],
            none: &[],
        },
        spec: EditSpec {
            crop: cropped(971, 547, 0, 0),
            markers: &[Marker {
                x: 235,
                y: 325,
                radius: 4,
                fill: RED,
                stroke: BLACK,
            }],
            ..PLAIN
        },
    },
    EditRule {
        name: "GFS mid-level RH",
        switches: &["GFS_prediction"],
        filter: NameFilter {
            all: &["GFS_midRH_anim"],
            any: &[],
            none: &[],
        },
        spec: EditSpec {
            markers: &[Marker {
                x: 235,
                y: 325,
                radius: 4,
                fill: RED,
                stroke: BLACK,
            }],
            ..PLAIN
        },
    },
    EditRule {
        name: "GFS MSLP + precipitation",
        switches: &["GFS_prediction"],
        filter: NameFilter {
            all: &["GFS_mslp_pcpn_anim"],
            any: &[],
            none: &[],
        },
        spec: EditSpec {
            markers: &[Marker {
                x: 235,
                y: 325,
                radius: 4,
                fill: RED,
                stroke: BLACK,
            }],
            ..PLAIN
        },
    },
    EditRule {
        name: "MPAS rain rate",
        switches: &["mpas_outlook_day34"],
        filter: NameFilter {
            all: &["mpas_rainr"],
            any: &[],
            none: &[],
        },
        spec: EditSpec {
            crop: cropped(780, 400, 0, 115),
            markers: &[Marker {
                x: 402,
                y: 98,
                radius: 4,
                fill: RED,
                stroke: BLACK,
            }],
            ..PLAIN
        },
    },
    EditRule {
        name: "MPAS precipitable water + OLR",
        switches: &["mpas_outlook_day34"],
        filter: NameFilter {
            all: &["mpas_pw_olr"],
            any: &[],
            none: &[],
        },
        spec: EditSpec {
            crop: cropped(780, 400, 0, 115),
            markers: &[Marker {
                x: 402,
                y: 98,
                radius: 4,
                fill: RED,
                stroke: BLACK,
            }],
            ..PLAIN
        },
    },
    EditRule {
        name: "MPAS precipitation",
        switches: &["mpas_precipitation"],
        filter: NameFilter {
            all: &["mpas_precip"],
            any: &[],
            none: &[],
        },
        spec: EditSpec {
            crop: cropped(780, 400, 0, 115),
            markers: &[Marker {
                x: 402,
                y: 98,
                radius: 4,
                fill: RED,
                stroke: BLACK,
            }],
            resize: Some((750, 500)),
            ..PLAIN
        },
    },
    EditRule {
        name: "GEOS 700mb outlook",
        switches: &["nasa_geos"],
        filter: NameFilter {
            all: &["GEOS_700mb_outlook"],
            any: &[],
            none: &[],
        },
        spec: EditSpec {
            crop: cropped(984, 688, 0, 80),
            markers: &[Marker {
                x: 685,
                y: 335,
                radius: 5,
                fill: RED,
                stroke: BLACK,
            }],
            ..PLAIN
        },
    },
    EditRule {
        name: "GEOS dust",
        switches: &["nasa_geos"],
        filter: NameFilter {
            all: &["GEOS_dust"],
            any: &[],
            none: &["vert"],
        },
        spec: EditSpec {
            crop: cropped(984, 688, 0, 80),
            markers: &[Marker {
                x: 685,
                y: 335,
                radius: 5,
                fill: WHITE,
                stroke: BLACK,
            }],
            ..PLAIN
        },
    },
    EditRule {
        name: "GEOS dust vertical (15N)",
        switches: &["nasa_geos"],
        filter: NameFilter {
            all: &["GEOS_dust", "N.png"],
            any: &[],
            none: &[],
        },
        spec: EditSpec {
            crop: cropped(1021, 654, 2, 57),
            markers: &[Marker {
                x: 750,
                y: 619,
                radius: 8,
                fill: WHITE,
                stroke: BLACK,
            }],
            ..PLAIN
        },
    },
    EditRule {
        name: "GEOS dust vertical (20W)",
        switches: &["nasa_geos"],
        filter: NameFilter {
            all: &["GEOS_dust", "W.png"],
            any: &[],
            none: &[],
        },
        spec: EditSpec {
            crop: cropped(1019, 681, 0, 57),
            markers: &[Marker {
                x: 495,
                y: 619,
                radius: 8,
                fill: WHITE,
                stroke: BLACK,
            }],
            ..PLAIN
        },
    },
    EditRule {
        name: "GEOS total aerosol optical thickness",
        switches: &["nasa_geos"],
        filter: NameFilter {
            all: &["GEOS_total_aot"],
            any: &[],
            none: &[],
        },
        spec: EditSpec {
            crop: cropped(984, 688, 0, 80),
            markers: &[Marker {
                x: 685,
                y: 335,
                radius: 5,
                fill: BLUE,
                stroke: BLACK,
            }],
            ..PLAIN
        },
    },
    EditRule {
        name: "GEOS cloud fraction",
        switches: &["nasa_geos"],
        filter: NameFilter {
            all: &["GEOS_", "CloudFraction"],
            any: &[],
            none: &[],
        },
        spec: EditSpec {
            crop: cropped(984, 688, 0, 80),
            markers: &[Marker {
                x: 685,
                y: 335,
                radius: 5,
                fill: RED,
                stroke: BLACK,
            }],
            ..PLAIN
        },
    },
];

/// Every switch any stage consults. Validated up front so a run fails before
/// processing instead of mid-pipeline.
pub const REQUIRED_SWITCHES: &[&str] = &[
    "nhc_analysis",
    "mimic_tpw",
    "brammer_tropical_waves",
    "sal_split",
    "meteosat_sat",
    "GOES16_sat",
    "uwincm_clouds_animation",
    "uwincm_precipitation_animation",
    "uutah_precipitation_animation",
    "UTAH_website",
    "ucdavis_precipitation_animation",
    "ECMWF_prediction",
    "GFS_prediction",
    "mpas_outlook_day34",
    "mpas_precipitation",
    "nasa_geos",
    "model_4panel",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_rule_switch_is_declared_required() {
        for rule in EDIT_RULES {
            for switch in rule.switches {
                assert!(
                    REQUIRED_SWITCHES.contains(switch),
                    "rule '{}' uses undeclared switch '{switch}'",
                    rule.name
                );
            }
        }
    }

    #[test]
    fn rules_have_a_gate_and_a_filter() {
        for rule in EDIT_RULES {
            assert!(!rule.switches.is_empty(), "rule '{}' has no gate", rule.name);
            assert!(
                !rule.filter.all.is_empty() || !rule.filter.any.is_empty(),
                "rule '{}' selects everything",
                rule.name
            );
        }
    }

    #[test]
    fn legends_only_extend_the_canvas() {
        for rule in EDIT_RULES {
            if let (Some(crop), Some(legend)) = (rule.spec.crop, rule.spec.legend) {
                assert!(legend.extent.0 >= crop.w && legend.extent.1 >= crop.h);
            }
        }
    }
}
