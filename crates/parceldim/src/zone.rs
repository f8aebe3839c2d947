//! Work-area filtering: a world-space polygon plus a depth band.
//!
//! The cutoff-depth filter alone cannot exclude objects standing next to
//! the scale but outside the marked floor area, so depth samples are also
//! tested against this 3D region after back-projection.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use parceldim_core::{point_in_polygon, CameraIntrinsics, DepthValue};

/// How far below the floor plane the work-area corners are anchored, mm.
const POLYGON_ANCHOR_BELOW_FLOOR_MM: i16 = 50;

/// User-defined work area in world coordinates: a lateral polygon on the
/// floor plane and a valid depth band.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MeasurementVolume {
    /// World-space XY corners, mm.
    pub points: Vec<Point2<i32>>,
    /// Near limit of the valid depth band, mm.
    pub smaller_depth_value: i16,
    /// Far limit of the valid depth band (the floor), mm.
    pub larger_depth_value: i16,
}

impl MeasurementVolume {
    /// Build the world-space volume from a normalized floor polygon.
    ///
    /// Corners are back-projected slightly below the floor so the polygon
    /// bounds the whole footprint at floor level.
    pub fn from_normalized_polygon(
        polygon: &[Point2<f32>],
        map_width: usize,
        map_height: usize,
        floor_depth: i16,
        min_zone_depth: i16,
        intrinsics: &CameraIntrinsics,
    ) -> Self {
        let corner_depth = floor_depth.saturating_add(POLYGON_ANCHOR_BELOW_FLOOR_MM);
        let points = polygon
            .iter()
            .map(|p| {
                let px = (p.x * map_width as f32) as i32;
                let py = (p.y * map_height as f32) as i32;
                let world = intrinsics.pixel_to_world(px as f32, py as f32, corner_depth);
                Point2::new(world.x_world, world.y_world)
            })
            .collect();

        Self {
            points,
            smaller_depth_value: min_zone_depth,
            larger_depth_value: floor_depth,
        }
    }

    /// Whether a world sample lies inside the work area.
    pub fn contains(&self, sample: &DepthValue) -> bool {
        if self.points.is_empty() {
            return false;
        }
        if sample.value > self.larger_depth_value || sample.value < self.smaller_depth_value {
            return false;
        }
        point_in_polygon(&self.points, Point2::new(sample.x_world, sample.y_world))
    }
}

/// Zero out every sample farther than `cutoff`. Idempotent.
pub fn filter_by_max_depth(map: &mut [i16], cutoff: i16) {
    for value in map.iter_mut() {
        if *value > cutoff {
            *value = 0;
        }
    }
}

/// Zero out every sample whose back-projected world point falls outside
/// the measurement volume. World coordinates are computed inline; the loop
/// allocates nothing.
pub fn filter_by_measurement_volume(
    map: &mut [i16],
    width: usize,
    height: usize,
    intrinsics: &CameraIntrinsics,
    volume: &MeasurementVolume,
) {
    let mut idx = 0;
    for y in 0..height {
        for x in 0..width {
            let depth = map[idx];
            if depth > 0 {
                let world = intrinsics.pixel_to_world(x as f32, y as f32, depth);
                if !volume.contains(&world) {
                    map[idx] = 0;
                }
            }
            idx += 1;
        }
    }
}

/// Binary silhouette mask: positive depth becomes 255, everything else 0.
pub fn depth_to_binary_mask(map: &[i16], mask: &mut [u8]) {
    for (dst, &src) in mask.iter_mut().zip(map.iter()) {
        *dst = if src > 0 { 255 } else { 0 };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intrinsics() -> CameraIntrinsics {
        CameraIntrinsics {
            fov_x: 65.0,
            fov_y: 52.0,
            focal_length_x: 500.0,
            focal_length_y: 500.0,
            principal_point_x: 320.0,
            principal_point_y: 240.0,
        }
    }

    fn full_frame_polygon() -> Vec<Point2<f32>> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ]
    }

    #[test]
    fn max_depth_filter_is_idempotent() {
        let mut once = vec![100i16, 2000, 2101, 0, 2100, 3000];
        filter_by_max_depth(&mut once, 2100);
        let mut twice = once.clone();
        filter_by_max_depth(&mut twice, 2100);
        assert_eq!(vec![100, 2000, 0, 0, 2100, 0], once);
        assert_eq!(once, twice);
    }

    #[test]
    fn volume_rejects_outside_depth_band() {
        let volume = MeasurementVolume::from_normalized_polygon(
            &full_frame_polygon(),
            640,
            480,
            2400,
            600,
            &intrinsics(),
        );
        assert_eq!(600, volume.smaller_depth_value);
        assert_eq!(2400, volume.larger_depth_value);

        let center = |d| DepthValue {
            x_world: 0,
            y_world: 0,
            value: d,
        };
        assert!(volume.contains(&center(2000)));
        assert!(!volume.contains(&center(2500)));
        assert!(!volume.contains(&center(500)));
        assert!(!volume.contains(&center(0)));
    }

    #[test]
    fn empty_polygon_contains_nothing() {
        let volume = MeasurementVolume {
            points: Vec::new(),
            smaller_depth_value: 600,
            larger_depth_value: 2400,
        };
        assert!(!volume.contains(&DepthValue {
            x_world: 0,
            y_world: 0,
            value: 1000
        }));
    }

    #[test]
    fn volume_filter_drops_lateral_outliers() {
        let k = intrinsics();
        // Work area covering only the central quarter of the frame.
        let polygon = vec![
            Point2::new(0.25, 0.25),
            Point2::new(0.75, 0.25),
            Point2::new(0.75, 0.75),
            Point2::new(0.25, 0.75),
        ];
        let volume =
            MeasurementVolume::from_normalized_polygon(&polygon, 640, 480, 2400, 600, &k);

        let (w, h) = (640usize, 480usize);
        let mut map = vec![2000i16; w * h];
        filter_by_measurement_volume(&mut map, w, h, &k, &volume);

        assert_eq!(0, map[10 * w + 10], "corner pixel should be filtered");
        assert_eq!(2000, map[240 * w + 320], "center pixel should survive");
    }

    #[test]
    fn binary_mask_thresholds_at_zero() {
        let map = [0i16, -5, 1, 2000];
        let mut mask = [0xAAu8; 4];
        depth_to_binary_mask(&map, &mut mask);
        assert_eq!([0, 0, 255, 255], mask);
    }
}
