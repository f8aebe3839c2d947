//! Axis-aligned and rotated rectangles over image coordinates.

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// Normalized rectangle in [0,1]×[0,1] frame coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RelRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl RelRect {
    /// The whole frame.
    pub fn full() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
        }
    }
}

/// Pixel-space axis-aligned rectangle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AbsRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Scale a normalized rectangle to pixel coordinates.
pub fn rel_rect_to_abs(rect: RelRect, frame_width: usize, frame_height: usize) -> AbsRect {
    AbsRect {
        x: (rect.x * frame_width as f32) as i32,
        y: (rect.y * frame_height as f32) as i32,
        width: (rect.width * frame_width as f32) as i32,
        height: (rect.height * frame_height as f32) as i32,
    }
}

/// Normalize a pixel rectangle to [0,1]² frame coordinates.
pub fn abs_rect_to_rel(rect: AbsRect, frame_width: usize, frame_height: usize) -> RelRect {
    RelRect {
        x: rect.x as f32 / frame_width as f32,
        y: rect.y as f32 / frame_height as f32,
        width: rect.width as f32 / frame_width as f32,
        height: rect.height as f32 / frame_height as f32,
    }
}

/// Minimal-area rotated bounding rectangle.
///
/// Corners are in perimeter order; `width` and `height` are the side
/// lengths along corners 0→1 and 0→3.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RotatedRect {
    pub corners: [Point2<f32>; 4],
    pub width: f32,
    pub height: f32,
    pub angle_deg: f32,
}

/// A rotated rectangle normalized to [0,1]² frame coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelRotatedRect {
    pub corners: [[f32; 2]; 4],
    pub width: f32,
    pub height: f32,
    pub angle_deg: f32,
}

impl RotatedRect {
    /// Minimal-area bounding rectangle of a point set (convex hull plus
    /// rotating calipers). `None` for an empty input; one or two distinct
    /// points yield a zero-thickness rectangle.
    pub fn from_points(points: &[Point2<i32>]) -> Option<Self> {
        let hull = convex_hull(points);
        let first = *hull.first()?;

        if hull.len() == 1 {
            let p = Point2::new(first.x as f32, first.y as f32);
            return Some(Self {
                corners: [p; 4],
                width: 0.0,
                height: 0.0,
                angle_deg: 0.0,
            });
        }

        let n = hull.len();
        let mut best_area = f32::INFINITY;
        let mut best: Option<Self> = None;

        for i in 0..n {
            let a = hull[i];
            let b = hull[(i + 1) % n];
            let edge = Vector2::new((b.x - a.x) as f32, (b.y - a.y) as f32);
            let len = edge.norm();
            if len == 0.0 {
                continue;
            }
            let u = edge / len;
            let v = Vector2::new(-u.y, u.x);

            let mut min_u = f32::INFINITY;
            let mut max_u = f32::NEG_INFINITY;
            let mut min_v = f32::INFINITY;
            let mut max_v = f32::NEG_INFINITY;
            for h in &hull {
                let p = Vector2::new(h.x as f32, h.y as f32);
                let su = u.dot(&p);
                let sv = v.dot(&p);
                min_u = min_u.min(su);
                max_u = max_u.max(su);
                min_v = min_v.min(sv);
                max_v = max_v.max(sv);
            }

            let width = max_u - min_u;
            let height = max_v - min_v;
            let area = width * height;
            if area < best_area {
                best_area = area;
                let corner = |su: f32, sv: f32| {
                    let p = u * su + v * sv;
                    Point2::new(p.x, p.y)
                };
                best = Some(Self {
                    corners: [
                        corner(min_u, min_v),
                        corner(max_u, min_v),
                        corner(max_u, max_v),
                        corner(min_u, max_v),
                    ],
                    width,
                    height,
                    angle_deg: u.y.atan2(u.x).to_degrees(),
                });
            }
        }

        best
    }

    pub fn center(&self) -> Point2<f32> {
        let mut x = 0.0;
        let mut y = 0.0;
        for c in &self.corners {
            x += c.x;
            y += c.y;
        }
        Point2::new(x / 4.0, y / 4.0)
    }

    /// Point-in-rotated-rectangle test, boundary inclusive.
    pub fn contains(&self, p: Point2<f32>) -> bool {
        let mut positive = false;
        let mut negative = false;
        for i in 0..4 {
            let a = self.corners[i];
            let b = self.corners[(i + 1) % 4];
            let cross = (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x);
            if cross > 0.0 {
                positive = true;
            }
            if cross < 0.0 {
                negative = true;
            }
        }
        !(positive && negative)
    }

    /// Pixel-aligned bounding box covering all four corners.
    pub fn aabb(&self) -> AbsRect {
        let mut min_x = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut min_y = f32::INFINITY;
        let mut max_y = f32::NEG_INFINITY;
        for c in &self.corners {
            min_x = min_x.min(c.x);
            max_x = max_x.max(c.x);
            min_y = min_y.min(c.y);
            max_y = max_y.max(c.y);
        }
        let x = min_x.floor() as i32;
        let y = min_y.floor() as i32;
        AbsRect {
            x,
            y,
            width: max_x.ceil() as i32 - x + 1,
            height: max_y.ceil() as i32 - y + 1,
        }
    }

    /// The rectangle in normalized frame coordinates.
    pub fn to_relative(&self, frame_width: usize, frame_height: usize) -> RelRotatedRect {
        let fw = frame_width as f32;
        let fh = frame_height as f32;
        RelRotatedRect {
            corners: [
                [self.corners[0].x / fw, self.corners[0].y / fh],
                [self.corners[1].x / fw, self.corners[1].y / fh],
                [self.corners[2].x / fw, self.corners[2].y / fh],
                [self.corners[3].x / fw, self.corners[3].y / fh],
            ],
            width: self.width / fw,
            height: self.height / fh,
            angle_deg: self.angle_deg,
        }
    }
}

/// True iff the contour's rotated bounding rectangle keeps more than
/// `margin` pixels from every frame edge.
///
/// Guards against measuring an object that is partially out of frame.
pub fn object_within_frame_bounds(
    contour: &[Point2<i32>],
    frame_width: usize,
    frame_height: usize,
    margin: i32,
) -> bool {
    let Some(rect) = RotatedRect::from_points(contour) else {
        return false;
    };

    let m = margin as f32;
    rect.corners.iter().all(|c| {
        c.x > m && c.y > m && c.x < frame_width as f32 - m && c.y < frame_height as f32 - m
    })
}

/// Andrew monotone chain; returns the hull in counter-clockwise order
/// (image coordinates), collinear points dropped.
fn convex_hull(points: &[Point2<i32>]) -> Vec<Point2<i32>> {
    let mut pts: Vec<Point2<i32>> = points.to_vec();
    pts.sort_unstable_by_key(|p| (p.x, p.y));
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    fn cross(o: Point2<i32>, a: Point2<i32>, b: Point2<i32>) -> i64 {
        (a.x - o.x) as i64 * (b.y - o.y) as i64 - (a.y - o.y) as i64 * (b.x - o.x) as i64
    }

    let mut lower: Vec<Point2<i32>> = Vec::with_capacity(pts.len());
    for &p in &pts {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0 {
            lower.pop();
        }
        lower.push(p);
    }

    let mut upper: Vec<Point2<i32>> = Vec::with_capacity(pts.len());
    for &p in pts.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0 {
            upper.pop();
        }
        upper.push(p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}
