//! Object dimensioning from a single depth frame, optionally fused with a
//! co-registered color frame.
//!
//! The pipeline per measurement: copy the incoming frames into reusable
//! scratch buffers, zero depth samples beyond a cutoff depth, zero samples
//! whose back-projected world point leaves the configured work area,
//! extract the object silhouette from the resulting binary mask (and from
//! the color frame when the color path is active), pick one of three
//! measurement strategies, and reduce the silhouette's minimal bounding
//! rotated rectangle to length/width/height in world millimeters.
//!
//! ```no_run
//! use parceldim::{
//!     Algorithm, AlgorithmSettings, CameraIntrinsics, DepthMapProcessor, DepthMapView,
//! };
//!
//! # fn intrinsics() -> CameraIntrinsics { todo!() }
//! # fn frame() -> Vec<i16> { todo!() }
//! let mut processor = DepthMapProcessor::new(intrinsics(), intrinsics());
//! processor.set_algorithm_settings(AlgorithmSettings {
//!     floor_depth_mm: 2400,
//!     cutoff_depth_mm: 2100,
//!     ..AlgorithmSettings::default()
//! });
//!
//! let data = frame();
//! let depth = DepthMapView { width: 640, height: 480, data: &data };
//! let dims = processor
//!     .calculate_volume(Some(&depth), None, Algorithm::DepthAxisAligned, 0)
//!     .unwrap();
//! println!("{} x {} x {} mm", dims.length_mm, dims.width_mm, dims.height_mm);
//! ```

pub use parceldim_core as core;

mod contour;
mod debug;
mod processor;
mod zone;

pub use contour::ContourExtractor;
pub use debug::DebugSink;
pub use processor::{
    Algorithm, AlgorithmSelection, AlgorithmSettings, AlgorithmStatus, ContourPlanes,
    DepthMapProcessor, ObjectDimensions, ProcessorParams,
};
pub use zone::{filter_by_max_depth, MeasurementVolume};

pub use parceldim_core::{
    CameraIntrinsics, ColorImageView, Contour, DepthMapView, DepthValue, ProcessingError, RelRect,
};
