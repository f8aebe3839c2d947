use thiserror::Error;

/// Errors raised while validating or converting input frames.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingError {
    #[error("depth frame is missing or empty")]
    EmptyDepthFrame,
    #[error("color frame is missing or empty")]
    EmptyColorFrame,
    #[error("no channel mapping for {0} bytes per pixel")]
    UnsupportedPixelFormat(u8),
}

/// Borrowed single-channel depth frame, row-major, millimeters.
///
/// A non-positive value means "no reading" and is excluded from every
/// depth statistic.
#[derive(Clone, Copy, Debug)]
pub struct DepthMapView<'a> {
    pub width: usize,
    pub height: usize,
    /// len >= width * height
    pub data: &'a [i16],
}

impl DepthMapView<'_> {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.data.len() < self.width * self.height
    }
}

/// Borrowed interleaved color frame, row-major.
#[derive(Clone, Copy, Debug)]
pub struct ColorImageView<'a> {
    pub width: usize,
    pub height: usize,
    /// 1 (gray), 3 (RGB) or 4 (RGBA); anything else is rejected.
    pub bytes_per_pixel: u8,
    pub data: &'a [u8],
}

impl ColorImageView<'_> {
    pub fn is_empty(&self) -> bool {
        self.width == 0
            || self.height == 0
            || self.data.len() < self.width * self.height * self.bytes_per_pixel as usize
    }

    pub fn channels(&self) -> Result<usize, ProcessingError> {
        channel_count(self.bytes_per_pixel)
    }
}

/// Channel count for a supported pixel layout.
pub fn channel_count(bytes_per_pixel: u8) -> Result<usize, ProcessingError> {
    match bytes_per_pixel {
        1 | 3 | 4 => Ok(bytes_per_pixel as usize),
        other => Err(ProcessingError::UnsupportedPixelFormat(other)),
    }
}
