//! Robust top/bottom plane depth estimation inside a silhouette.

use nalgebra::Point2;

use parceldim_core::{find_mode_in_sorted_array, point_in_polygon, Contour, RotatedRect};

/// Fraction of the sorted in-silhouette samples used per plane estimate.
const PLANE_SLICE_DIVISOR: usize = 20;

/// Mode-based estimates of the shallowest and deepest flat surfaces
/// inside a silhouette, mm. Zero when no estimate was possible.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContourPlanes {
    pub top: i16,
    pub bottom: i16,
}

/// Estimate the silhouette's top and bottom planes.
///
/// Collects every positive depth sample whose pixel lies inside both the
/// silhouette's rotated bounding rectangle and the silhouette itself, then
/// takes the mode of the lowest and highest 1/20 slices of the sorted
/// samples. The middle of the sorted range is dominated by the object's
/// side walls; only the extreme slices see the top surface and the floor.
pub(crate) fn estimate_contour_planes(
    map: &[i16],
    width: usize,
    height: usize,
    contour: &Contour,
) -> ContourPlanes {
    let Some(rect) = RotatedRect::from_points(contour) else {
        return ContourPlanes::default();
    };

    let aabb = rect.aabb();
    let x0 = aabb.x.max(0);
    let y0 = aabb.y.max(0);
    let x1 = (aabb.x + aabb.width).min(width as i32);
    let y1 = (aabb.y + aabb.height).min(height as i32);

    let mut samples: Vec<i16> = Vec::with_capacity(((x1 - x0).max(0) * (y1 - y0).max(0)) as usize);
    for y in y0..y1 {
        for x in x0..x1 {
            let value = map[y as usize * width + x as usize];
            if value <= 0 {
                continue;
            }
            let p = Point2::new(x, y);
            if rect.contains(Point2::new(x as f32, y as f32)) && point_in_polygon(contour, p) {
                samples.push(value);
            }
        }
    }

    if samples.is_empty() {
        return ContourPlanes::default();
    }

    samples.sort_unstable();
    let slice = samples.len() / PLANE_SLICE_DIVISOR;

    ContourPlanes {
        top: find_mode_in_sorted_array(&samples[..slice]),
        bottom: find_mode_in_sorted_array(&samples[samples.len() - slice..]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_contour(x0: i32, y0: i32, side: i32) -> Contour {
        vec![
            Point2::new(x0, y0),
            Point2::new(x0 + side, y0),
            Point2::new(x0 + side, y0 + side),
            Point2::new(x0, y0 + side),
        ]
    }

    #[test]
    fn flat_object_has_equal_planes() {
        let (w, h) = (64usize, 64usize);
        let mut map = vec![0i16; w * h];
        for y in 10..50 {
            for x in 10..50 {
                map[y * w + x] = 1500;
            }
        }
        let planes = estimate_contour_planes(&map, w, h, &square_contour(10, 10, 39));
        assert_eq!(1500, planes.top);
        assert_eq!(1500, planes.bottom);
    }

    #[test]
    fn sloped_object_separates_planes() {
        let (w, h) = (64usize, 64usize);
        let mut map = vec![0i16; w * h];
        for y in 4..60 {
            for x in 4..60 {
                // Narrow bands of constant depth at both extremes, ramp in
                // the middle.
                let d = match x {
                    4..=9 => 1000,
                    54..=59 => 1600,
                    _ => 1000 + (x as i16 - 4) * 10,
                };
                map[y * w + x] = d;
            }
        }
        let planes = estimate_contour_planes(&map, w, h, &square_contour(4, 4, 55));
        assert!(planes.top <= 1010, "top {}", planes.top);
        assert!(planes.bottom >= 1590, "bottom {}", planes.bottom);
        assert!(planes.bottom > planes.top);
    }

    #[test]
    fn empty_contour_yields_zero_planes() {
        let map = vec![1000i16; 16];
        assert_eq!(
            ContourPlanes::default(),
            estimate_contour_planes(&map, 4, 4, &Contour::new())
        );
    }

    #[test]
    fn too_few_samples_yield_zero_planes() {
        // A 3x3 silhouette has fewer than 20 in-contour samples, so the
        // 1/20 slice is empty.
        let (w, h) = (16usize, 16usize);
        let mut map = vec![0i16; w * h];
        for y in 6..9 {
            for x in 6..9 {
                map[y * w + x] = 900;
            }
        }
        let planes = estimate_contour_planes(&map, w, h, &square_contour(6, 6, 2));
        assert_eq!(ContourPlanes::default(), planes);
    }
}
