use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Pinhole intrinsics for one sensor, immutable for a processor's lifetime.
///
/// Focal lengths and principal point are in pixels. Values are assumed
/// valid (positive focal lengths); calibration is the caller's problem.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    pub fov_x: f32,
    pub fov_y: f32,
    pub focal_length_x: f32,
    pub focal_length_y: f32,
    pub principal_point_x: f32,
    pub principal_point_y: f32,
}

/// One back-projected sample: world-plane position plus the raw depth.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DepthValue {
    /// mm
    pub x_world: i32,
    /// mm
    pub y_world: i32,
    /// depth, mm
    pub value: i16,
}

impl CameraIntrinsics {
    /// Back-project a pixel at the given depth to world millimeters.
    ///
    /// World Y grows upward while image Y grows downward; results truncate
    /// toward zero.
    #[inline]
    pub fn pixel_to_world(&self, px: f32, py: f32, depth: i16) -> DepthValue {
        let d = depth as f32;
        let x_world = ((px + 1.0 - self.principal_point_x) * d / self.focal_length_x) as i32;
        let y_world = (-((py + 1.0 - self.principal_point_y) * d) / self.focal_length_y) as i32;
        DepthValue {
            x_world,
            y_world,
            value: depth,
        }
    }

    /// Project a world-plane point into the image at the given depth.
    #[inline]
    pub fn world_to_pixel(&self, x_world: i32, y_world: i32, depth: i16) -> Point2<i32> {
        let d = depth as f32;
        let px = (x_world as f32 * self.focal_length_x / d + self.principal_point_x - 1.0) as i32;
        let py = (-(y_world as f32 * self.focal_length_y / d) + self.principal_point_y - 1.0) as i32;
        Point2::new(px, py)
    }
}
