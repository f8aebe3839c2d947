use serde::{Deserialize, Serialize};

/// Final measurement: edge lengths in millimeters, volume in cubic
/// centimeters.
///
/// `length >= width` by construction. `height` keeps its sign: an object
/// measured below the configured floor yields a negative height rather
/// than a silently clamped zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectDimensions {
    pub length_mm: i32,
    pub width_mm: i32,
    pub height_mm: i32,
    pub volume_cm3: i64,
}

impl ObjectDimensions {
    pub fn new(edge_a_mm: i32, edge_b_mm: i32, height_mm: i32) -> Self {
        let length_mm = edge_a_mm.max(edge_b_mm);
        let width_mm = edge_a_mm.min(edge_b_mm);
        let volume_cm3 = i64::from(length_mm) * i64::from(width_mm) * i64::from(height_mm) / 1000;
        Self {
            length_mm,
            width_mm,
            height_mm,
            volume_cm3,
        }
    }

    /// Zero-valued result for degenerate silhouettes.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
