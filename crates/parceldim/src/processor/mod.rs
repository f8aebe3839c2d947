//! The measurement pipeline: scratch-buffer management, work-area
//! filtering, strategy selection and dimension reduction.

mod params;
mod perspective;
mod planes;
mod result;
mod selection;

pub use self::params::{AlgorithmSettings, ProcessorParams};
pub use self::planes::ContourPlanes;
pub use self::result::ObjectDimensions;
pub use self::selection::{Algorithm, AlgorithmSelection, AlgorithmStatus};

use std::sync::Arc;

use image::{GrayImage, Luma};
use log::{debug, warn};
use nalgebra::Point2;

use parceldim_core::{
    channel_count, distance, rel_rect_to_abs, AbsRect, CameraIntrinsics, ColorImageView, Contour,
    DepthMapView, ProcessingError, RotatedRect,
};

use crate::contour::ContourExtractor;
use crate::debug::DebugSink;
use crate::zone::{self, MeasurementVolume};

use self::planes::estimate_contour_planes;

/// Measures one object per frame pair from a depth sensor and an optional
/// co-registered color camera.
///
/// One instance per sensor pair. Every measuring call takes `&mut self`:
/// the instance owns reusable scratch buffers and a lazily rebuilt
/// [`MeasurementVolume`], trading thread-safety for allocation-free
/// per-frame operation. Independent instances are fully independent.
pub struct DepthMapProcessor {
    color_intrinsics: CameraIntrinsics,
    depth_intrinsics: CameraIntrinsics,
    params: ProcessorParams,
    settings: AlgorithmSettings,
    extractor: ContourExtractor,
    debug: Option<Arc<dyn DebugSink>>,

    map_width: usize,
    map_height: usize,
    depth_scratch: Vec<i16>,
    mask_scratch: GrayImage,

    color_width: usize,
    color_height: usize,
    color_bpp: u8,
    color_scratch: Vec<u8>,

    volume: MeasurementVolume,
    volume_needs_update: bool,
}

impl DepthMapProcessor {
    pub fn new(color_intrinsics: CameraIntrinsics, depth_intrinsics: CameraIntrinsics) -> Self {
        let params = ProcessorParams::default();
        let extractor = ContourExtractor::new(params.canny_low, params.canny_high);
        Self {
            color_intrinsics,
            depth_intrinsics,
            params,
            settings: AlgorithmSettings::default(),
            extractor,
            debug: None,
            map_width: 0,
            map_height: 0,
            depth_scratch: Vec::new(),
            mask_scratch: GrayImage::new(0, 0),
            color_width: 0,
            color_height: 0,
            color_bpp: 0,
            color_scratch: Vec::new(),
            volume: MeasurementVolume::default(),
            volume_needs_update: true,
        }
    }

    pub fn with_params(mut self, params: ProcessorParams) -> Self {
        self.extractor = ContourExtractor::new(params.canny_low, params.canny_high);
        self.params = params;
        self.volume_needs_update = true;
        self
    }

    pub fn params(&self) -> &ProcessorParams {
        &self.params
    }

    pub fn settings(&self) -> &AlgorithmSettings {
        &self.settings
    }

    /// Store new station calibration and invalidate the cached
    /// measurement volume; the volume is rebuilt on the next call that
    /// needs it, not here.
    pub fn set_algorithm_settings(&mut self, settings: AlgorithmSettings) {
        self.settings = settings;
        self.volume_needs_update = true;
    }

    pub fn set_debug_sink(&mut self, sink: Option<Arc<dyn DebugSink>>) {
        self.extractor.set_debug_sink(sink.clone());
        self.debug = sink;
    }

    /// One-shot calibration helper: the mode of all nonzero depths in the
    /// frame, i.e. the dominant surface. Run on an empty scene to
    /// auto-detect the floor depth at setup time.
    pub fn calculate_floor_depth(&self, depth: &DepthMapView<'_>) -> i16 {
        if depth.is_empty() {
            return 0;
        }
        let len = depth.width * depth.height;
        let mut values: Vec<i16> = depth.data[..len].iter().copied().filter(|&v| v > 0).collect();
        if values.is_empty() {
            return 0;
        }
        values.sort_unstable();
        parceldim_core::find_mode_in_sorted_array(&values)
    }

    /// Decide which measurement strategy fits the current frame pair.
    ///
    /// `range_meter_mm <= 0` means no external reading. The returned flag
    /// reports whether a supplied reading overrode the depth-derived top
    /// plane.
    pub fn select_algorithm(
        &mut self,
        depth: Option<&DepthMapView<'_>>,
        color: Option<&ColorImageView<'_>>,
        range_meter_mm: i32,
        dm1_enabled: bool,
        dm2_enabled: bool,
        rgb_enabled: bool,
    ) -> AlgorithmSelection {
        let (Some(depth), Some(color)) = (depth, color) else {
            return AlgorithmSelection::of(AlgorithmStatus::DataInvalid);
        };
        if depth.is_empty() || color.is_empty() {
            return AlgorithmSelection::of(AlgorithmStatus::DataInvalid);
        }
        if !(dm1_enabled || dm2_enabled || rgb_enabled) {
            return AlgorithmSelection::of(AlgorithmStatus::NoAlgorithmsAllowed);
        }
        if let Err(err) = self.fill_color_scratch(color) {
            warn!("color frame rejected: {err}");
            return AlgorithmSelection::of(AlgorithmStatus::DataInvalid);
        }

        self.prepare_depth(depth);
        let depth_contour = self.depth_silhouette();
        let color_contour = if rgb_enabled {
            match self.color_silhouette() {
                Ok(contour) => Some(contour),
                Err(err) => {
                    warn!("color path unavailable: {err}");
                    return AlgorithmSelection::of(AlgorithmStatus::DataInvalid);
                }
            }
        } else {
            None
        };

        let contour_planes = estimate_contour_planes(
            &self.depth_scratch,
            self.map_width,
            self.map_height,
            &depth_contour,
        );

        let selected = selection::decide(
            &self.params,
            self.settings.floor_depth_mm,
            &depth_contour,
            color_contour.as_ref(),
            contour_planes,
            (self.color_width, self.color_height),
            range_meter_mm,
            dm1_enabled,
            dm2_enabled,
            rgb_enabled,
        );
        debug!("selected {:?}", selected.status);
        selected
    }

    /// Measure the object with an already chosen strategy.
    ///
    /// Missing or unusable required frames are errors; a silhouette that
    /// vanishes by the dimension stage yields an all-zero result instead.
    pub fn calculate_volume(
        &mut self,
        depth: Option<&DepthMapView<'_>>,
        color: Option<&ColorImageView<'_>>,
        algorithm: Algorithm,
        range_meter_mm: i32,
    ) -> Result<ObjectDimensions, ProcessingError> {
        let depth = depth
            .filter(|d| !d.is_empty())
            .ok_or(ProcessingError::EmptyDepthFrame)?;
        self.prepare_depth(depth);

        match algorithm {
            Algorithm::DepthAxisAligned | Algorithm::DepthPerspectiveCorrected => {
                let contour = self.depth_silhouette();
                Ok(self.depth_dimensions(
                    &contour,
                    algorithm == Algorithm::DepthPerspectiveCorrected,
                    range_meter_mm,
                ))
            }
            Algorithm::Color => {
                let color = color
                    .filter(|c| !c.is_empty())
                    .ok_or(ProcessingError::EmptyColorFrame)?;
                self.fill_color_scratch(color)?;
                let color_contour = self.color_silhouette()?;
                let depth_contour = self.depth_silhouette();
                Ok(self.color_dimensions(&depth_contour, &color_contour, range_meter_mm))
            }
        }
    }

    /// Copy the incoming depth frame into the scratch buffer, then apply
    /// the cutoff filter and the work-area volume filter.
    fn prepare_depth(&mut self, map: &DepthMapView<'_>) {
        self.fill_depth_scratch(map);
        zone::filter_by_max_depth(&mut self.depth_scratch, self.settings.cutoff_depth_mm);

        if self.volume_needs_update {
            self.volume = MeasurementVolume::from_normalized_polygon(
                &self.settings.work_area,
                self.map_width,
                self.map_height,
                self.settings.floor_depth_mm,
                self.params.min_zone_depth_mm,
                &self.depth_intrinsics,
            );
            self.volume_needs_update = false;
            debug!(
                "measurement volume rebuilt: {} corners, band [{}, {}] mm",
                self.volume.points.len(),
                self.volume.smaller_depth_value,
                self.volume.larger_depth_value
            );
        }

        zone::filter_by_measurement_volume(
            &mut self.depth_scratch,
            self.map_width,
            self.map_height,
            &self.depth_intrinsics,
            &self.volume,
        );
    }

    fn fill_depth_scratch(&mut self, map: &DepthMapView<'_>) {
        if self.map_width != map.width || self.map_height != map.height {
            debug!("depth scratch resized to {}x{}", map.width, map.height);
            self.map_width = map.width;
            self.map_height = map.height;
            self.depth_scratch = vec![0; map.width * map.height];
            self.mask_scratch = GrayImage::new(map.width as u32, map.height as u32);
            // The volume polygon is anchored to frame coordinates.
            self.volume_needs_update = true;
        }
        self.depth_scratch
            .copy_from_slice(&map.data[..self.map_width * self.map_height]);
    }

    fn fill_color_scratch(&mut self, image: &ColorImageView<'_>) -> Result<(), ProcessingError> {
        image.channels()?;
        let len = image.width * image.height * image.bytes_per_pixel as usize;
        if self.color_width != image.width
            || self.color_height != image.height
            || self.color_bpp != image.bytes_per_pixel
        {
            debug!(
                "color scratch resized to {}x{} ({} bpp)",
                image.width, image.height, image.bytes_per_pixel
            );
            self.color_width = image.width;
            self.color_height = image.height;
            self.color_bpp = image.bytes_per_pixel;
            self.color_scratch = vec![0; len];
        }
        self.color_scratch.copy_from_slice(&image.data[..len]);
        Ok(())
    }

    fn depth_silhouette(&mut self) -> Contour {
        zone::depth_to_binary_mask(&self.depth_scratch, &mut self.mask_scratch);
        self.extractor.extract_from_binary_mask(&self.mask_scratch)
    }

    /// Extract the color silhouette from the configured ROI and translate
    /// it back to full-frame coordinates so the frame-margin test remains
    /// meaningful downstream.
    fn color_silhouette(&self) -> Result<Contour, ProcessingError> {
        let channels = channel_count(self.color_bpp)?;
        let roi = clamp_roi(
            rel_rect_to_abs(self.settings.color_roi, self.color_width, self.color_height),
            self.color_width,
            self.color_height,
        );
        if roi.width <= 0 || roi.height <= 0 {
            return Ok(Contour::new());
        }

        let mut gray = GrayImage::new(roi.width as u32, roi.height as u32);
        for y in 0..roi.height {
            for x in 0..roi.width {
                let src =
                    ((roi.y + y) as usize * self.color_width + (roi.x + x) as usize) * channels;
                let value = match channels {
                    1 => self.color_scratch[src],
                    _ => luma(
                        self.color_scratch[src],
                        self.color_scratch[src + 1],
                        self.color_scratch[src + 2],
                    ),
                };
                gray.put_pixel(x as u32, y as u32, Luma([value]));
            }
        }

        let mut contour = self.extractor.extract_from_color_image(&gray);
        for p in &mut contour {
            p.x += roi.x;
            p.y += roi.y;
        }
        Ok(contour)
    }

    fn depth_dimensions(
        &self,
        contour: &Contour,
        perspective: bool,
        range_meter_mm: i32,
    ) -> ObjectDimensions {
        if contour.is_empty() {
            return ObjectDimensions::empty();
        }

        let contour_planes = estimate_contour_planes(
            &self.depth_scratch,
            self.map_width,
            self.map_height,
            contour,
        );
        let (top_plane, _) = selection::resolve_top_plane(contour_planes.top, range_meter_mm);
        if top_plane <= 0 {
            debug!("no usable top plane for the depth silhouette");
            return ObjectDimensions::empty();
        }

        let rect = if perspective {
            let samples = perspective::world_contour_samples(
                contour,
                &self.depth_scratch,
                self.map_width,
                self.map_height,
                &self.depth_intrinsics,
            );
            let corrected =
                perspective::reproject_at_depth(&samples, top_plane, &self.depth_intrinsics);
            RotatedRect::from_points(&corrected)
        } else {
            RotatedRect::from_points(contour)
        };
        let Some(rect) = rect else {
            return ObjectDimensions::empty();
        };

        if let Some(sink) = &self.debug {
            sink.contour_overlay(
                "ctr_depth",
                self.map_width,
                self.map_height,
                contour,
                Some(&rect),
            );
        }

        let (edge_a, edge_b) = rect_world_edges(&rect, top_plane, &self.depth_intrinsics);
        let height = i32::from(self.settings.floor_depth_mm) - i32::from(top_plane);
        ObjectDimensions::new(edge_a, edge_b, height)
    }

    fn color_dimensions(
        &self,
        depth_contour: &Contour,
        color_contour: &Contour,
        range_meter_mm: i32,
    ) -> ObjectDimensions {
        if color_contour.is_empty() {
            return ObjectDimensions::empty();
        }

        let contour_planes = estimate_contour_planes(
            &self.depth_scratch,
            self.map_width,
            self.map_height,
            depth_contour,
        );
        let (resolved, _) = selection::resolve_top_plane(contour_planes.top, range_meter_mm);
        let top_plane = if resolved > 0 {
            resolved
        } else {
            // No depth-derived plane at all: assume a minimally tall object.
            self.settings.floor_depth_mm - self.params.min_object_height_mm
        };

        let Some(rect) = RotatedRect::from_points(color_contour) else {
            return ObjectDimensions::empty();
        };

        if let Some(sink) = &self.debug {
            sink.contour_overlay(
                "ctr_depth",
                self.map_width,
                self.map_height,
                depth_contour,
                None,
            );
            sink.contour_overlay(
                "ctr_color",
                self.color_width,
                self.color_height,
                color_contour,
                Some(&rect),
            );
        }

        let (edge_a, edge_b) = rect_world_edges(&rect, top_plane, &self.color_intrinsics);
        let height = i32::from(self.settings.floor_depth_mm) - i32::from(top_plane);
        ObjectDimensions::new(edge_a, edge_b, height)
    }
}

/// World-space lengths of the rectangle's two adjacent edges at the given
/// depth.
fn rect_world_edges(
    rect: &RotatedRect,
    top_plane: i16,
    intrinsics: &CameraIntrinsics,
) -> (i32, i32) {
    let world: Vec<Point2<f32>> = rect
        .corners
        .iter()
        .map(|c| {
            let w = intrinsics.pixel_to_world(c.x, c.y, top_plane);
            Point2::new(w.x_world as f32, w.y_world as f32)
        })
        .collect();

    let edge_a = distance(world[0], world[1]) as i32;
    let edge_b = distance(world[0], world[3]) as i32;
    (edge_a, edge_b)
}

fn clamp_roi(rect: AbsRect, width: usize, height: usize) -> AbsRect {
    let x = rect.x.clamp(0, width as i32);
    let y = rect.y.clamp(0, height as i32);
    AbsRect {
        x,
        y,
        width: rect.width.min(width as i32 - x),
        height: rect.height.min(height as i32 - y),
    }
}

#[inline]
fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((u32::from(r) * 299 + u32::from(g) * 587 + u32::from(b) * 114) / 1000) as u8
}
