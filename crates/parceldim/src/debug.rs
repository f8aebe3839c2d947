//! Diagnostic output port.
//!
//! The pipeline publishes intermediate artifacts through this trait;
//! implementations decide where they go (files, a viewer, nowhere).
//! Computed results never depend on the sink.

use image::GrayImage;
use parceldim_core::{Contour, RotatedRect};

pub trait DebugSink: Send + Sync {
    /// Edge map produced by the color-path edge detector.
    fn edge_map(&self, label: &str, edges: &GrayImage);

    /// A chosen silhouette and, when available, its minimal bounding
    /// rotated rectangle, in full-frame pixel coordinates.
    fn contour_overlay(
        &self,
        label: &str,
        frame_width: usize,
        frame_height: usize,
        contour: &Contour,
        bounding_rect: Option<&RotatedRect>,
    );
}
