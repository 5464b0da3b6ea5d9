/*!
    Pixel format types.
*/

/**
    Video pixel formats.

    This is the subset of formats encountered in the stills-to-video pipeline:
    packed RGB variants on the input side, semi-planar and planar 4:2:0 on the
    encoder side.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PixelFormat {
    /// Semi-planar YUV 4:2:0, 12bpp (common hardware encoder input)
    Nv12,
    /// Planar YUV 4:2:0, 12bpp
    Yuv420p,
    /// Packed BGR, 24bpp (raw capture buffers)
    Bgr24,
    /// Packed RGB, 24bpp
    Rgb24,
    /// Packed BGRA, 32bpp
    Bgra,
    /// Packed RGBA, 32bpp
    Rgba,
}

impl PixelFormat {
    /**
        Returns the number of bits per pixel for this format.

        For planar formats, this is the average bits per pixel.
    */
    pub const fn bits_per_pixel(self) -> u32 {
        match self {
            Self::Nv12 | Self::Yuv420p => 12,
            Self::Bgr24 | Self::Rgb24 => 24,
            Self::Bgra | Self::Rgba => 32,
        }
    }

    /**
        Returns true if this is a planar (or semi-planar) format.
    */
    pub const fn is_planar(self) -> bool {
        matches!(self, Self::Nv12 | Self::Yuv420p)
    }

    /**
        Returns the number of bytes a tightly packed buffer of this format
        occupies at the given dimensions.
    */
    pub const fn buffer_size(self, width: u32, height: u32) -> usize {
        let pixels = width as usize * height as usize;
        match self {
            Self::Nv12 | Self::Yuv420p => pixels + pixels / 2,
            Self::Bgr24 | Self::Rgb24 => pixels * 3,
            Self::Bgra | Self::Rgba => pixels * 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_per_pixel() {
        assert_eq!(PixelFormat::Nv12.bits_per_pixel(), 12);
        assert_eq!(PixelFormat::Bgr24.bits_per_pixel(), 24);
        assert_eq!(PixelFormat::Rgba.bits_per_pixel(), 32);
    }

    #[test]
    fn planar_classification() {
        assert!(PixelFormat::Nv12.is_planar());
        assert!(PixelFormat::Yuv420p.is_planar());
        assert!(!PixelFormat::Bgr24.is_planar());
        assert!(!PixelFormat::Bgra.is_planar());
    }

    #[test]
    fn packed_buffer_sizes() {
        assert_eq!(PixelFormat::Bgr24.buffer_size(640, 480), 640 * 480 * 3);
        assert_eq!(PixelFormat::Nv12.buffer_size(640, 480), 640 * 480 * 3 / 2);
        assert_eq!(PixelFormat::Yuv420p.buffer_size(16, 16), 384);
    }
}
