//! Strategy selection: which of the three measurement paths fits the
//! current frame pair.

use log::debug;
use serde::{Deserialize, Serialize};

use parceldim_core::{contour_area, object_within_frame_bounds, Contour};

use super::params::ProcessorParams;
use super::planes::ContourPlanes;

/// A concrete measurement strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Algorithm {
    /// Axis-aligned bounding rectangle of the raw depth silhouette. Good
    /// for thin slabs, cheap.
    DepthAxisAligned,
    /// Depth silhouette re-projected onto the object's top plane before
    /// the bounding rectangle is taken.
    DepthPerspectiveCorrected,
    /// Bounding rectangle of the merged color-edge silhouette.
    Color,
}

/// Outcome of the strategy-selection pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlgorithmStatus {
    /// A required input frame was missing or unusable.
    DataInvalid,
    /// Every strategy was disabled by the caller.
    NoAlgorithmsAllowed,
    /// No silhouette large enough to measure.
    NoObjectFound,
    UseDepthAxisAligned,
    UseDepthPerspectiveCorrected,
    UseColor,
    #[default]
    Undefined,
}

impl AlgorithmStatus {
    /// The strategy this status resolves to, if any.
    pub fn algorithm(self) -> Option<Algorithm> {
        match self {
            Self::UseDepthAxisAligned => Some(Algorithm::DepthAxisAligned),
            Self::UseDepthPerspectiveCorrected => Some(Algorithm::DepthPerspectiveCorrected),
            Self::UseColor => Some(Algorithm::Color),
            _ => None,
        }
    }
}

/// Selection result: the status plus whether the external range-meter
/// reading overrode the depth-derived top plane.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlgorithmSelection {
    pub status: AlgorithmStatus,
    pub range_meter_used: bool,
}

impl AlgorithmSelection {
    pub(crate) fn of(status: AlgorithmStatus) -> Self {
        Self {
            status,
            range_meter_used: false,
        }
    }

    fn with_range(status: AlgorithmStatus, range_meter_used: bool) -> Self {
        Self {
            status,
            range_meter_used,
        }
    }
}

/// Clamp an external range-meter reading into the sensor depth domain.
/// Non-positive readings mean "no reading".
pub(crate) fn clamp_range_meter(range_meter_mm: i32) -> i16 {
    range_meter_mm.clamp(0, i32::from(i16::MAX)) as i16
}

/// Pick the top-plane depth: the silhouette's statistical plane, or the
/// range-meter reading when that indicates a taller object (or no depth
/// plane exists). The depth camera under-reports height for very tall or
/// reflective objects; a single-point rangefinder does not.
pub(crate) fn resolve_top_plane(depth_top: i16, range_meter_mm: i32) -> (i16, bool) {
    let range = clamp_range_meter(range_meter_mm);
    if range > 0 && (depth_top <= 0 || range < depth_top) {
        (range, true)
    } else {
        (depth_top, false)
    }
}

/// The pure selection decision over the extracted silhouettes.
///
/// Deterministic: fixed inputs always produce the same status.
#[allow(clippy::too_many_arguments)]
pub(crate) fn decide(
    params: &ProcessorParams,
    floor_depth: i16,
    depth_contour: &Contour,
    color_contour: Option<&Contour>,
    planes: ContourPlanes,
    color_frame_size: (usize, usize),
    range_meter_mm: i32,
    dm1_enabled: bool,
    dm2_enabled: bool,
    rgb_enabled: bool,
) -> AlgorithmSelection {
    let depth_object_real = contour_area(depth_contour) > params.min_object_area_px;
    let color_object_found = color_contour.map(|c| !c.is_empty()).unwrap_or(false);

    if !depth_object_real && !color_object_found {
        return AlgorithmSelection::of(AlgorithmStatus::NoObjectFound);
    }
    // A depth-only request cannot proceed on a color-only silhouette and
    // vice versa.
    if !rgb_enabled && !depth_object_real {
        return AlgorithmSelection::of(AlgorithmStatus::NoObjectFound);
    }
    if rgb_enabled && !dm1_enabled && !dm2_enabled && !color_object_found {
        return AlgorithmSelection::of(AlgorithmStatus::NoObjectFound);
    }

    let (top_plane, range_meter_used) = resolve_top_plane(planes.top, range_meter_mm);

    let height = i32::from(floor_depth) - i32::from(top_plane);
    let depth_height_valid = top_plane > 0 && height > 0;
    let effective_height = if depth_height_valid {
        height
    } else {
        // Only the color path can rescue an object with no usable depth
        // height; it is then assumed to be minimally tall.
        if !(rgb_enabled && color_object_found) {
            return AlgorithmSelection::of(AlgorithmStatus::NoObjectFound);
        }
        i32::from(params.min_object_height_mm)
    };

    if rgb_enabled && color_object_found {
        if !depth_object_real {
            return AlgorithmSelection::with_range(AlgorithmStatus::UseColor, range_meter_used);
        }

        let fully_visible = color_contour.is_some_and(|c| {
            object_within_frame_bounds(
                c,
                color_frame_size.0,
                color_frame_size.1,
                params.frame_margin_px,
            )
        });
        let short_enough = effective_height < i32::from(params.max_rgb_object_height_mm);
        if fully_visible && short_enough {
            return AlgorithmSelection::with_range(AlgorithmStatus::UseColor, range_meter_used);
        }
        debug!(
            "color path rejected: fully_visible={fully_visible} height={effective_height}"
        );
    }

    if !depth_object_real || !depth_height_valid {
        return AlgorithmSelection::of(AlgorithmStatus::NoObjectFound);
    }

    match (dm1_enabled, dm2_enabled) {
        (true, false) => {
            AlgorithmSelection::with_range(AlgorithmStatus::UseDepthAxisAligned, range_meter_used)
        }
        (false, true) => AlgorithmSelection::with_range(
            AlgorithmStatus::UseDepthPerspectiveCorrected,
            range_meter_used,
        ),
        (false, false) => AlgorithmSelection::of(AlgorithmStatus::NoObjectFound),
        (true, true) => {
            // A range-meter reading fixes the top plane, which makes the
            // perspective correction redundant.
            let plane_spread = if range_meter_used {
                0
            } else {
                i32::from(planes.bottom) - i32::from(planes.top)
            };
            let status = if plane_spread > i32::from(params.plane_depth_delta_mm) {
                AlgorithmStatus::UseDepthPerspectiveCorrected
            } else {
                AlgorithmStatus::UseDepthAxisAligned
            };
            AlgorithmSelection::with_range(status, range_meter_used)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point2;

    fn square_contour(x0: i32, y0: i32, side: i32) -> Contour {
        vec![
            Point2::new(x0, y0),
            Point2::new(x0 + side, y0),
            Point2::new(x0 + side, y0 + side),
            Point2::new(x0, y0 + side),
        ]
    }

    fn params() -> ProcessorParams {
        ProcessorParams::default()
    }

    const COLOR_FRAME: (usize, usize) = (640, 480);

    #[test]
    fn no_contours_means_no_object() {
        let sel = decide(
            &params(),
            2400,
            &Contour::new(),
            None,
            ContourPlanes::default(),
            COLOR_FRAME,
            0,
            true,
            true,
            false,
        );
        assert_eq!(AlgorithmStatus::NoObjectFound, sel.status);
    }

    #[test]
    fn speckle_sized_depth_contour_is_not_an_object() {
        let speckle = square_contour(100, 100, 1);
        let sel = decide(
            &params(),
            2400,
            &speckle,
            None,
            ContourPlanes {
                top: 2000,
                bottom: 2000,
            },
            COLOR_FRAME,
            0,
            true,
            false,
            false,
        );
        assert_eq!(AlgorithmStatus::NoObjectFound, sel.status);
    }

    #[test]
    fn thin_slab_uses_axis_aligned_depth() {
        let contour = square_contour(200, 200, 100);
        let sel = decide(
            &params(),
            2400,
            &contour,
            None,
            ContourPlanes {
                top: 2000,
                bottom: 2050,
            },
            COLOR_FRAME,
            0,
            true,
            true,
            false,
        );
        assert_eq!(AlgorithmStatus::UseDepthAxisAligned, sel.status);
        assert!(!sel.range_meter_used);
    }

    #[test]
    fn tall_object_uses_perspective_correction() {
        let contour = square_contour(200, 200, 100);
        let sel = decide(
            &params(),
            2400,
            &contour,
            None,
            ContourPlanes {
                top: 1800,
                bottom: 2350,
            },
            COLOR_FRAME,
            0,
            true,
            true,
            false,
        );
        assert_eq!(AlgorithmStatus::UseDepthPerspectiveCorrected, sel.status);
    }

    #[test]
    fn range_meter_skips_the_spread_check() {
        let contour = square_contour(200, 200, 100);
        let sel = decide(
            &params(),
            2400,
            &contour,
            None,
            ContourPlanes {
                top: 1800,
                bottom: 2350,
            },
            COLOR_FRAME,
            1700,
            true,
            true,
            false,
        );
        assert_eq!(AlgorithmStatus::UseDepthAxisAligned, sel.status);
        assert!(sel.range_meter_used);
    }

    #[test]
    fn range_meter_farther_than_depth_plane_is_ignored() {
        let contour = square_contour(200, 200, 100);
        let sel = decide(
            &params(),
            2400,
            &contour,
            None,
            ContourPlanes {
                top: 1800,
                bottom: 2350,
            },
            COLOR_FRAME,
            1900,
            true,
            true,
            false,
        );
        assert_eq!(AlgorithmStatus::UseDepthPerspectiveCorrected, sel.status);
        assert!(!sel.range_meter_used);
    }

    #[test]
    fn short_centered_color_object_uses_color() {
        let depth = square_contour(250, 200, 100);
        let color = square_contour(250, 200, 120);
        let sel = decide(
            &params(),
            2400,
            &depth,
            Some(&color),
            ContourPlanes {
                top: 2250,
                bottom: 2380,
            },
            COLOR_FRAME,
            0,
            true,
            true,
            true,
        );
        assert_eq!(AlgorithmStatus::UseColor, sel.status);
    }

    #[test]
    fn color_is_rejected_for_tall_objects() {
        let depth = square_contour(250, 200, 100);
        let color = square_contour(250, 200, 120);
        let sel = decide(
            &params(),
            2400,
            &depth,
            Some(&color),
            ContourPlanes {
                top: 1900,
                bottom: 2380,
            },
            COLOR_FRAME,
            0,
            true,
            true,
            true,
        );
        assert_ne!(AlgorithmStatus::UseColor, sel.status);
    }

    #[test]
    fn color_touching_frame_edge_is_rejected() {
        let depth = square_contour(250, 200, 100);
        let color = square_contour(0, 200, 120);
        let sel = decide(
            &params(),
            2400,
            &depth,
            Some(&color),
            ContourPlanes {
                top: 2250,
                bottom: 2330,
            },
            COLOR_FRAME,
            0,
            true,
            true,
            true,
        );
        assert_eq!(AlgorithmStatus::UseDepthAxisAligned, sel.status);
    }

    #[test]
    fn color_only_object_without_depth_uses_color() {
        let color = square_contour(250, 200, 120);
        let sel = decide(
            &params(),
            2400,
            &Contour::new(),
            Some(&color),
            ContourPlanes::default(),
            COLOR_FRAME,
            0,
            false,
            false,
            true,
        );
        assert_eq!(AlgorithmStatus::UseColor, sel.status);
    }

    #[test]
    fn at_floor_object_without_color_is_not_found() {
        let depth = square_contour(250, 200, 100);
        let sel = decide(
            &params(),
            2400,
            &depth,
            None,
            ContourPlanes {
                top: 2400,
                bottom: 2400,
            },
            COLOR_FRAME,
            0,
            true,
            true,
            false,
        );
        assert_eq!(AlgorithmStatus::NoObjectFound, sel.status);
    }

    #[test]
    fn selection_is_deterministic() {
        let depth = square_contour(200, 200, 100);
        let color = square_contour(250, 200, 120);
        let run = || {
            decide(
                &params(),
                2400,
                &depth,
                Some(&color),
                ContourPlanes {
                    top: 2250,
                    bottom: 2380,
                },
                COLOR_FRAME,
                1500,
                true,
                true,
                true,
            )
        };
        assert_eq!(run(), run());
    }
}
