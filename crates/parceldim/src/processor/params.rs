use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use parceldim_core::RelRect;

/// Rarely-changed tunables of the measurement pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProcessorParams {
    /// Spread between the object's bottom and top planes above which the
    /// perspective-corrected depth strategy is preferred, mm.
    pub plane_depth_delta_mm: i16,
    /// Tallest object the color path is trusted for, mm. Perspective
    /// distortion in the uncalibrated color view grows with height.
    pub max_rgb_object_height_mm: i16,
    /// Height assumed when only the color silhouette is usable, mm.
    pub min_object_height_mm: i16,
    /// Depth silhouettes with enclosed area at or below this many px² are
    /// sensor speckle, not objects.
    pub min_object_area_px: f64,
    /// Minimal distance a color silhouette must keep from the frame
    /// edges, px.
    pub frame_margin_px: i32,
    /// Edge-detector thresholds for the color path.
    pub canny_low: f32,
    pub canny_high: f32,
    /// Near limit of the work-area depth band, mm.
    pub min_zone_depth_mm: i16,
}

impl Default for ProcessorParams {
    fn default() -> Self {
        Self {
            plane_depth_delta_mm: 100,
            max_rgb_object_height_mm: 300,
            min_object_height_mm: 3,
            min_object_area_px: 3.0,
            frame_margin_px: 3,
            canny_low: 50.0,
            canny_high: 200.0,
            min_zone_depth_mm: 600,
        }
    }
}

/// Per-station calibration settings.
///
/// Updating these through `DepthMapProcessor::set_algorithm_settings`
/// invalidates the cached measurement volume.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AlgorithmSettings {
    /// Depth of the resting surface, mm.
    pub floor_depth_mm: i16,
    /// Samples farther than this are background, mm.
    pub cutoff_depth_mm: i16,
    /// Work-area polygon in normalized [0,1]² depth-frame coordinates.
    pub work_area: Vec<Point2<f32>>,
    /// Region of the color frame searched for the object, normalized.
    pub color_roi: RelRect,
}

impl Default for AlgorithmSettings {
    fn default() -> Self {
        Self {
            floor_depth_mm: 0,
            cutoff_depth_mm: 0,
            work_area: vec![
                Point2::new(0.0, 0.0),
                Point2::new(1.0, 0.0),
                Point2::new(1.0, 1.0),
                Point2::new(0.0, 1.0),
            ],
            color_roi: RelRect::full(),
        }
    }
}
