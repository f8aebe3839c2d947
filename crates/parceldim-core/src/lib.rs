//! Core types and utilities for depth-camera object dimensioning.
//!
//! This crate is intentionally small and purely geometric. It does *not*
//! depend on any concrete edge detector or contour tracer.

mod frame;
mod geometry;
mod intrinsics;
mod logger;
mod rect;

pub use frame::{channel_count, ColorImageView, DepthMapView, ProcessingError};
pub use geometry::{
    contour_area, contour_centroid, distance, find_mode_in_sorted_array, point_in_polygon, Contour,
};
pub use intrinsics::{CameraIntrinsics, DepthValue};
pub use logger::init_with_level;
pub use rect::{
    abs_rect_to_rel, object_within_frame_bounds, rel_rect_to_abs, AbsRect, RelRect,
    RelRotatedRect, RotatedRect,
};
