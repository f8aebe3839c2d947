//! Perspective correction of a depth silhouette.
//!
//! A tall object's upper silhouette, as seen by the depth camera, is
//! displaced laterally from its footprint. Back-projecting every boundary
//! point with a locally estimated depth and re-projecting the result onto
//! the object's top plane recovers the true footprint outline.

use nalgebra::Point2;

use parceldim_core::{contour_centroid, CameraIntrinsics, Contour, DepthValue};

/// How many pixels the local-depth walk moves inward from a boundary
/// point.
const INWARD_WALK_PX: i32 = 5;

/// Pixel step walking inward from a silhouette point, by compass octant of
/// the point's angle about the silhouette centroid.
///
/// The angle is measured with Y up (image deltas negated), so a point
/// above the centroid sits at +90° and walks down, into the object.
fn inward_step(angle_deg: f64) -> (i32, i32) {
    match angle_deg {
        a if (-22.5..22.5).contains(&a) => (-1, 0),
        a if (22.5..67.5).contains(&a) => (-1, 1),
        a if (67.5..112.5).contains(&a) => (0, 1),
        a if (112.5..157.5).contains(&a) => (1, 1),
        a if (-67.5..-22.5).contains(&a) => (-1, -1),
        a if (-112.5..-67.5).contains(&a) => (0, -1),
        a if (-157.5..-112.5).contains(&a) => (1, -1),
        _ => (1, 0),
    }
}

#[inline]
fn sample(map: &[i16], width: usize, height: usize, x: i32, y: i32) -> i16 {
    if x < 0 || y < 0 || x >= width as i32 || y >= height as i32 {
        return 0;
    }
    map[y as usize * width + x as usize]
}

/// Per-point world samples for a silhouette.
///
/// Each boundary point's depth is re-estimated a few pixels inside the
/// silhouette, away from the noisy edge: the walk keeps neighbors that are
/// strictly shallower than the boundary sample and averages them, falling
/// back to the raw boundary depth when none qualify.
pub(crate) fn world_contour_samples(
    contour: &Contour,
    map: &[i16],
    width: usize,
    height: usize,
    intrinsics: &CameraIntrinsics,
) -> Vec<DepthValue> {
    let Some(centroid) = contour_centroid(contour) else {
        return Vec::new();
    };
    let cx = centroid.x as i32;
    let cy = centroid.y as i32;

    contour
        .iter()
        .map(|p| {
            let dx = p.x - cx;
            let dy = p.y - cy;
            let angle = f64::from(-dy).atan2(f64::from(dx)).to_degrees();
            let (step_x, step_y) = inward_step(angle);

            let point_depth = sample(map, width, height, p.x, p.y);

            let mut sum = 0i32;
            let mut count = 0i32;
            let (mut tx, mut ty) = (p.x, p.y);
            for _ in 0..INWARD_WALK_PX {
                tx += step_x;
                ty += step_y;
                let neighbor = sample(map, width, height, tx, ty);
                if neighbor > 0 && neighbor < point_depth {
                    sum += i32::from(neighbor);
                    count += 1;
                }
            }

            let local_depth = if count > 0 {
                (sum / count) as i16
            } else {
                point_depth
            };

            intrinsics.pixel_to_world(p.x as f32, p.y as f32, local_depth)
        })
        .collect()
}

/// Re-project world samples into the image plane at a fixed depth.
pub(crate) fn reproject_at_depth(
    samples: &[DepthValue],
    depth: i16,
    intrinsics: &CameraIntrinsics,
) -> Contour {
    samples
        .iter()
        .map(|s| intrinsics.world_to_pixel(s.x_world, s.y_world, depth))
        .collect()
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

    #[test]
    fn inward_steps_point_toward_the_centroid() {
        // Right of centroid walks left, above walks down, and so on.
        assert_eq!((-1, 0), inward_step(0.0));
        assert_eq!((0, 1), inward_step(90.0));
        assert_eq!((1, 0), inward_step(180.0));
        assert_eq!((1, 0), inward_step(-180.0));
        assert_eq!((0, -1), inward_step(-90.0));
        assert_eq!((-1, 1), inward_step(45.0));
        assert_eq!((1, 1), inward_step(135.0));
        assert_eq!((1, -1), inward_step(-135.0));
        assert_eq!((-1, -1), inward_step(-45.0));
    }

    #[test]
    fn flat_silhouette_reprojects_onto_itself() {
        let (w, h) = (640usize, 480usize);
        let mut map = vec![0i16; w * h];
        for y in 200..280 {
            for x in 280..360 {
                map[y * w + x] = 1800;
            }
        }
        let contour: Contour = vec![
            Point2::new(280, 200),
            Point2::new(359, 200),
            Point2::new(359, 279),
            Point2::new(280, 279),
        ];

        let k = intrinsics();
        let samples = world_contour_samples(&contour, &map, w, h, &k);
        assert_eq!(contour.len(), samples.len());
        let reprojected = reproject_at_depth(&samples, 1800, &k);

        for (orig, back) in contour.iter().zip(reprojected.iter()) {
            assert!((orig.x - back.x).abs() <= 2, "{} -> {}", orig.x, back.x);
            assert!((orig.y - back.y).abs() <= 2, "{} -> {}", orig.y, back.y);
        }
    }

    #[test]
    fn empty_contour_yields_no_samples() {
        let map = vec![0i16; 16];
        assert!(world_contour_samples(&Contour::new(), &map, 4, 4, &intrinsics()).is_empty());
    }
}
