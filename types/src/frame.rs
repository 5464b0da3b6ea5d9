/*!
    Raw video frame type.
*/

use crate::{PixelFormat, Pts, Rational};

/**
    A raw video frame with owned, tightly packed pixel data.

    Carries a decoded still image through the pipeline: produced by the
    source loaders, rewritten by the conversion stage, consumed by the
    encoder. Plane data is stored contiguously in `data` with no row padding.
*/
#[derive(Clone)]
pub struct VideoFrame {
    /// Pixel data, planes concatenated, rows unpadded.
    pub data: Vec<u8>,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Pixel format of `data`.
    pub format: PixelFormat,
    /// Presentation timestamp, if assigned.
    pub pts: Option<Pts>,
    /// Time base `pts` is expressed in.
    pub time_base: Rational,
}

impl VideoFrame {
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: PixelFormat,
        pts: Option<Pts>,
        time_base: Rational,
    ) -> Self {
        Self {
            data,
            width,
            height,
            format,
            pts,
            time_base,
        }
    }

    /**
        Returns true when `data` holds exactly the bytes a tightly packed
        buffer of this frame's format and dimensions requires.
    */
    pub fn is_packed_exact(&self) -> bool {
        self.data.len() == self.format.buffer_size(self.width, self.height)
    }
}

impl std::fmt::Debug for VideoFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("pts", &self.pts)
            .field("bytes", &self.data.len())
            .finish()
    }
}
