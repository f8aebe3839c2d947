//! Silhouette extraction from binary depth masks and color frames.

use std::sync::Arc;

use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::edges::canny;
use log::debug;
use nalgebra::Point2;

use parceldim_core::{contour_area, contour_centroid, distance, Contour};

use crate::debug::DebugSink;

/// Fraction of the frame area below which a traced contour is discarded as
/// sensor noise.
const MIN_CONTOUR_AREA_RATIO: f64 = 0.0001;

/// Finds the object silhouette in a binary depth mask or a color frame.
pub struct ContourExtractor {
    canny_low: f32,
    canny_high: f32,
    debug: Option<Arc<dyn DebugSink>>,
}

impl Default for ContourExtractor {
    fn default() -> Self {
        Self::new(50.0, 200.0)
    }
}

impl ContourExtractor {
    pub fn new(canny_low: f32, canny_high: f32) -> Self {
        Self {
            canny_low,
            canny_high,
            debug: None,
        }
    }

    pub fn set_debug_sink(&mut self, sink: Option<Arc<dyn DebugSink>>) {
        self.debug = sink;
    }

    /// Best single silhouette in a binary mask.
    ///
    /// External contours only; blobs below the noise-area floor are
    /// dropped, then the candidate whose centroid is nearest the image
    /// center wins (the work area is physically centered under the
    /// sensor). Empty if nothing qualifies.
    pub fn extract_from_binary_mask(&self, mask: &GrayImage) -> Contour {
        let traced = trace_external_contours(mask);
        if traced.is_empty() {
            return Contour::new();
        }

        let min_area = f64::from(mask.width()) * f64::from(mask.height()) * MIN_CONTOUR_AREA_RATIO;
        let valid: Vec<Contour> = traced
            .into_iter()
            .filter(|c| contour_area(c) >= min_area)
            .collect();
        if valid.is_empty() {
            debug!("every traced contour fell below the noise-area floor");
            return Contour::new();
        }

        closest_to_center(valid, mask.width(), mask.height())
    }

    /// Union of every traced edge point in a color frame.
    ///
    /// Color edges fragment on shadows and reflections, so no single traced
    /// contour outlines the object; the merged point cloud is enough for
    /// the bounding-rectangle step downstream.
    pub fn extract_from_color_image(&self, image: &GrayImage) -> Contour {
        if image.width() == 0 || image.height() == 0 {
            return Contour::new();
        }

        let edges = canny(image, self.canny_low, self.canny_high);
        if let Some(sink) = &self.debug {
            sink.edge_map("canny", &edges);
        }

        let mut merged = Contour::new();
        for contour in trace_external_contours(&edges) {
            merged.extend(contour);
        }
        merged
    }
}

/// External (outer, top-level) contours of the foreground regions.
fn trace_external_contours(mask: &GrayImage) -> Vec<Contour> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| {
            c.points
                .into_iter()
                .map(|p| Point2::new(p.x, p.y))
                .collect()
        })
        .collect()
}

fn closest_to_center(contours: Vec<Contour>, width: u32, height: u32) -> Contour {
    if contours.len() == 1 {
        return contours.into_iter().next().unwrap_or_default();
    }

    let center = Point2::new(width as f32 / 2.0, height as f32 / 2.0);
    let mut best: Option<(f32, Contour)> = None;
    for contour in contours {
        let Some(centroid) = contour_centroid(&contour) else {
            continue;
        };
        let d = distance(center, centroid);
        // Strict inequality keeps the first of equally-distant candidates.
        if best.as_ref().map_or(true, |(bd, _)| d < *bd) {
            best = Some((d, contour));
        }
    }

    best.map(|(_, c)| c).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_with_blobs(blobs: &[(u32, u32, u32)]) -> GrayImage {
        let mut mask = GrayImage::new(160, 120);
        for &(x0, y0, side) in blobs {
            for y in y0..y0 + side {
                for x in x0..x0 + side {
                    mask.put_pixel(x, y, image::Luma([255]));
                }
            }
        }
        mask
    }

    #[test]
    fn empty_mask_yields_empty_contour() {
        let extractor = ContourExtractor::default();
        assert!(extractor
            .extract_from_binary_mask(&GrayImage::new(64, 64))
            .is_empty());
    }

    #[test]
    fn speckle_below_area_floor_is_dropped() {
        // One bright pixel in a 160x120 mask: area floor is ~1.9 px².
        let mask = mask_with_blobs(&[(80, 60, 1)]);
        let extractor = ContourExtractor::default();
        assert!(extractor.extract_from_binary_mask(&mask).is_empty());
    }

    #[test]
    fn picks_blob_closest_to_center() {
        // Center is (80, 60); the 20px blob at (70, 50) wins over the
        // larger corner blob.
        let mask = mask_with_blobs(&[(4, 4, 30), (70, 50, 20)]);
        let extractor = ContourExtractor::default();
        let contour = extractor.extract_from_binary_mask(&mask);
        assert!(!contour.is_empty());
        let centroid = contour_centroid(&contour).unwrap();
        assert!((centroid.x - 79.5).abs() < 2.0, "cx {}", centroid.x);
        assert!((centroid.y - 59.5).abs() < 2.0, "cy {}", centroid.y);
    }

    #[test]
    fn color_path_merges_fragmented_edges() {
        // Two separate bright squares on black: the merged point sequence
        // spans both, unlike the single-best mask path.
        let image = mask_with_blobs(&[(20, 20, 24), (100, 70, 24)]);
        let extractor = ContourExtractor::default();
        let merged = extractor.extract_from_color_image(&image);
        assert!(!merged.is_empty());
        let min_x = merged.iter().map(|p| p.x).min().unwrap();
        let max_x = merged.iter().map(|p| p.x).max().unwrap();
        assert!(min_x < 50 && max_x > 95, "span {min_x}..{max_x}");
    }

    #[test]
    fn color_path_handles_empty_input() {
        let extractor = ContourExtractor::default();
        assert!(extractor
            .extract_from_color_image(&GrayImage::new(0, 0))
            .is_empty());
    }
}
