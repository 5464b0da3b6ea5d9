/*!
    Conversion utilities between ffmpeg-next types and stillreel-types.
*/

use stillreel_types::{PixelFormat, Rational};

/**
    Convert ffmpeg_next::Rational to our Rational.
*/
pub fn rational_from_ffmpeg(r: ffmpeg_next::Rational) -> Rational {
    Rational::new(r.numerator(), r.denominator())
}

/**
    Convert ffmpeg_next pixel format to our PixelFormat.

    The deprecated full-range J variants map onto their plain counterparts;
    the color-range distinction is carried by the scaler, not the format.
*/
pub fn pixel_format_from_ffmpeg(format: ffmpeg_next::format::Pixel) -> Option<PixelFormat> {
    use ffmpeg_next::format::Pixel;

    match format {
        Pixel::NV12 => Some(PixelFormat::Nv12),
        Pixel::YUV420P | Pixel::YUVJ420P => Some(PixelFormat::Yuv420p),
        Pixel::BGR24 => Some(PixelFormat::Bgr24),
        Pixel::RGB24 => Some(PixelFormat::Rgb24),
        Pixel::BGRA => Some(PixelFormat::Bgra),
        Pixel::RGBA => Some(PixelFormat::Rgba),
        _ => None,
    }
}
