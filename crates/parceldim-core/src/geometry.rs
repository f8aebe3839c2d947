//! Scalar geometry helpers shared across the pipeline.

use nalgebra::Point2;

/// Ordered silhouette boundary points, in trace order.
///
/// The order matters for bounding-rectangle computation; nothing else
/// depends on it.
pub type Contour = Vec<Point2<i32>>;

/// Euclidean distance between two points.
#[inline]
pub fn distance(p1: Point2<f32>, p2: Point2<f32>) -> f32 {
    (p1 - p2).norm()
}

/// Value of the longest run in a sorted slice.
///
/// Ties are broken in favour of the first maximal run. Returns 0 for an
/// empty slice. Stands in for "the most common depth in a region" on noisy
/// sensor data.
pub fn find_mode_in_sorted_array(values: &[i16]) -> i16 {
    let Some(&first) = values.first() else {
        return 0;
    };

    let mut mode = first;
    let mut run = 1usize;
    let mut best_run = 1usize;
    for window in values.windows(2) {
        if window[1] == window[0] {
            run += 1;
            if run > best_run {
                best_run = run;
                mode = window[1];
            }
        } else {
            run = 1;
        }
    }

    mode
}

/// Even-odd ray-casting point-in-polygon test (pnpoly).
pub fn point_in_polygon(polygon: &[Point2<i32>], point: Point2<i32>) -> bool {
    if polygon.is_empty() {
        return false;
    }

    let x = point.x as f64;
    let y = point.y as f64;

    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (xi, yi) = (polygon[i].x as f64, polygon[i].y as f64);
        let (xj, yj) = (polygon[j].x as f64, polygon[j].y as f64);

        let crosses = (yi > y) != (yj > y);
        if crosses && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// Enclosed area of a closed contour (shoelace formula), px².
pub fn contour_area(contour: &[Point2<i32>]) -> f64 {
    if contour.len() < 3 {
        return 0.0;
    }

    let mut twice_area = 0i64;
    let mut j = contour.len() - 1;
    for i in 0..contour.len() {
        let (xi, yi) = (contour[i].x as i64, contour[i].y as i64);
        let (xj, yj) = (contour[j].x as i64, contour[j].y as i64);
        twice_area += xj * yi - xi * yj;
        j = i;
    }

    (twice_area.abs() as f64) / 2.0
}

/// Area-weighted centroid of a closed contour.
///
/// Falls back to the mean of the points when the polygon is degenerate
/// (zero enclosed area). `None` only for an empty contour.
pub fn contour_centroid(contour: &[Point2<i32>]) -> Option<Point2<f32>> {
    if contour.is_empty() {
        return None;
    }

    let mut twice_area = 0f64;
    let mut cx = 0f64;
    let mut cy = 0f64;
    let mut j = contour.len() - 1;
    for i in 0..contour.len() {
        let (xi, yi) = (contour[i].x as f64, contour[i].y as f64);
        let (xj, yj) = (contour[j].x as f64, contour[j].y as f64);
        let cross = xj * yi - xi * yj;
        twice_area += cross;
        cx += (xi + xj) * cross;
        cy += (yi + yj) * cross;
        j = i;
    }

    if twice_area.abs() > f64::EPSILON {
        let scale = 1.0 / (3.0 * twice_area);
        return Some(Point2::new((cx * scale) as f32, (cy * scale) as f32));
    }

    let n = contour.len() as f64;
    let sx: f64 = contour.iter().map(|p| p.x as f64).sum();
    let sy: f64 = contour.iter().map(|p| p.y as f64).sum();
    Some(Point2::new((sx / n) as f32, (sy / n) as f32))
}
