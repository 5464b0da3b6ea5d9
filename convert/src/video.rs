/*!
    Video frame scaling and colorspace conversion.
*/

use ffmpeg_next::{
    software::scaling::{context::Context as ScalerContext, flag::Flags as ScalerFlags},
    util::frame::video::Video as VideoFrameFFmpeg,
};

use stillreel_types::{Error, PixelFormat, Result, VideoFrame};

/**
    Scaling algorithm for the conversion stage.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScalingMode {
    /// Bilinear interpolation.
    #[default]
    Bilinear,
    /// Faster, lower-quality bilinear. Used by the raw-buffer input path.
    FastBilinear,
}

impl ScalingMode {
    fn to_ffmpeg_flags(self) -> ScalerFlags {
        match self {
            Self::Bilinear => ScalerFlags::BILINEAR,
            Self::FastBilinear => ScalerFlags::FAST_BILINEAR,
        }
    }
}

/**
    Target parameters for the conversion stage.
*/
#[derive(Clone, Debug)]
pub struct ScalerConfig {
    /// Target width in pixels.
    pub width: u32,
    /// Target height in pixels.
    pub height: u32,
    /// Target pixel format (the encoder's input format).
    pub format: PixelFormat,
    /// Scaling algorithm.
    pub mode: ScalingMode,
}

impl ScalerConfig {
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            format,
            mode: ScalingMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: ScalingMode) -> Self {
        self.mode = mode;
        self
    }
}

/**
    Converts source frames into the encoder's pixel format and dimensions.

    The swscale context is lazily initialized on first use and reused while
    the source format and dimensions are unchanged.
*/
pub struct FrameScaler {
    config: ScalerConfig,
    /// Cached scaler context and the input parameters it was created for.
    state: Option<ScalerState>,
}

struct ScalerState {
    context: ScalerContext,
    src_width: u32,
    src_height: u32,
    src_format: PixelFormat,
}

impl FrameScaler {
    pub fn new(config: ScalerConfig) -> Self {
        Self {
            config,
            state: None,
        }
    }

    pub fn config(&self) -> &ScalerConfig {
        &self.config
    }

    /**
        Convert a frame to the target format and dimensions.

        The source frame's timestamp, if any, is carried through unchanged.
    */
    pub fn convert(&mut self, frame: &VideoFrame) -> Result<VideoFrame> {
        if frame.width == 0 || frame.height == 0 {
            return Err(Error::InvalidData("input frame has zero dimensions".into()));
        }
        if !frame.is_packed_exact() {
            return Err(Error::InvalidData(format!(
                "input frame holds {} bytes, expected {} for {}x{} {:?}",
                frame.data.len(),
                frame.format.buffer_size(frame.width, frame.height),
                frame.width,
                frame.height,
                frame.format
            )));
        }

        let needs_init = match &self.state {
            None => true,
            Some(state) => {
                state.src_width != frame.width
                    || state.src_height != frame.height
                    || state.src_format != frame.format
            }
        };

        if needs_init {
            self.init_scaler(frame.width, frame.height, frame.format)?;
        }

        self.scale_frame(frame)
    }

    fn init_scaler(&mut self, src_width: u32, src_height: u32, src_format: PixelFormat) -> Result<()> {
        let context = ScalerContext::get(
            pixel_format_to_ffmpeg(src_format),
            src_width,
            src_height,
            pixel_format_to_ffmpeg(self.config.format),
            self.config.width,
            self.config.height,
            self.config.mode.to_ffmpeg_flags(),
        )
        .map_err(|e| Error::ConversionContext(e.to_string()))?;

        tracing::debug!(
            src_width,
            src_height,
            ?src_format,
            dst_width = self.config.width,
            dst_height = self.config.height,
            dst_format = ?self.config.format,
            "initialized scaler context"
        );

        self.state = Some(ScalerState {
            context,
            src_width,
            src_height,
            src_format,
        });

        Ok(())
    }

    fn scale_frame(&mut self, frame: &VideoFrame) -> Result<VideoFrame> {
        let state = self.state.as_mut().expect("scaler not initialized");

        let mut src_frame = VideoFrameFFmpeg::new(
            pixel_format_to_ffmpeg(frame.format),
            frame.width,
            frame.height,
        );
        copy_data_to_ffmpeg_frame(&mut src_frame, frame);

        let mut dst_frame = VideoFrameFFmpeg::new(
            pixel_format_to_ffmpeg(self.config.format),
            self.config.width,
            self.config.height,
        );

        state
            .context
            .run(&src_frame, &mut dst_frame)
            .map_err(|e| Error::Scale(e.to_string()))?;

        let data = copy_data_from_ffmpeg_frame(&dst_frame, self.config.format)?;

        Ok(VideoFrame::new(
            data,
            self.config.width,
            self.config.height,
            self.config.format,
            frame.pts,
            frame.time_base,
        ))
    }
}

/**
    Convert our PixelFormat to FFmpeg's Pixel format.
*/
fn pixel_format_to_ffmpeg(format: PixelFormat) -> ffmpeg_next::format::Pixel {
    use ffmpeg_next::format::Pixel;

    match format {
        PixelFormat::Nv12 => Pixel::NV12,
        PixelFormat::Yuv420p => Pixel::YUV420P,
        PixelFormat::Bgr24 => Pixel::BGR24,
        PixelFormat::Rgb24 => Pixel::RGB24,
        PixelFormat::Bgra => Pixel::BGRA,
        PixelFormat::Rgba => Pixel::RGBA,
        // `PixelFormat` is `#[non_exhaustive]`; all known variants are handled above.
        _ => unreachable!("unsupported pixel format: {format:?}"),
    }
}

/**
    Copy packed frame data into an FFmpeg frame, honoring its strides.
*/
fn copy_data_to_ffmpeg_frame(dst: &mut VideoFrameFFmpeg, src: &VideoFrame) {
    let width = src.width as usize;
    let height = src.height as usize;

    match src.format {
        // Packed formats - single plane
        PixelFormat::Bgr24 | PixelFormat::Rgb24 | PixelFormat::Bgra | PixelFormat::Rgba => {
            let bytes_per_pixel = if src.format.bits_per_pixel() == 24 { 3 } else { 4 };
            let dst_stride = dst.stride(0);
            let dst_data = dst.data_mut(0);

            for y in 0..height {
                let src_start = y * width * bytes_per_pixel;
                let dst_start = y * dst_stride;
                dst_data[dst_start..dst_start + width * bytes_per_pixel]
                    .copy_from_slice(&src.data[src_start..src_start + width * bytes_per_pixel]);
            }
        }

        // Planar 4:2:0
        PixelFormat::Yuv420p => {
            let uv_width = width / 2;
            let uv_height = height / 2;
            let y_size = width * height;
            let uv_size = uv_width * uv_height;

            let y_stride = dst.stride(0);
            let y_data = dst.data_mut(0);
            for y in 0..height {
                let src_start = y * width;
                let dst_start = y * y_stride;
                y_data[dst_start..dst_start + width]
                    .copy_from_slice(&src.data[src_start..src_start + width]);
            }

            for (plane, plane_offset) in [(1, y_size), (2, y_size + uv_size)] {
                let stride = dst.stride(plane);
                let data = dst.data_mut(plane);
                for y in 0..uv_height {
                    let src_start = plane_offset + y * uv_width;
                    let dst_start = y * stride;
                    data[dst_start..dst_start + uv_width]
                        .copy_from_slice(&src.data[src_start..src_start + uv_width]);
                }
            }
        }

        // Semi-planar 4:2:0
        PixelFormat::Nv12 => {
            let y_size = width * height;

            let y_stride = dst.stride(0);
            let y_data = dst.data_mut(0);
            for y in 0..height {
                let src_start = y * width;
                let dst_start = y * y_stride;
                y_data[dst_start..dst_start + width]
                    .copy_from_slice(&src.data[src_start..src_start + width]);
            }

            let uv_stride = dst.stride(1);
            let uv_data = dst.data_mut(1);
            for y in 0..(height / 2) {
                let src_start = y_size + y * width;
                let dst_start = y * uv_stride;
                uv_data[dst_start..dst_start + width]
                    .copy_from_slice(&src.data[src_start..src_start + width]);
            }
        }

        // `PixelFormat` is `#[non_exhaustive]`; all known variants are handled above.
        _ => unreachable!("unsupported pixel format: {:?}", src.format),
    }
}

/**
    Copy scaled output into a contiguous buffer.

    Only the encoder input formats appear here; the scaler never produces
    packed RGB in this pipeline.
*/
fn copy_data_from_ffmpeg_frame(frame: &VideoFrameFFmpeg, format: PixelFormat) -> Result<Vec<u8>> {
    let width = frame.width() as usize;
    let height = frame.height() as usize;

    match format {
        PixelFormat::Yuv420p => {
            let uv_width = width / 2;
            let uv_height = height / 2;
            let mut output = Vec::with_capacity(width * height + 2 * uv_width * uv_height);

            let y_stride = frame.stride(0);
            let y_data = frame.data(0);
            for y in 0..height {
                let row_start = y * y_stride;
                output.extend_from_slice(&y_data[row_start..row_start + width]);
            }

            for plane in 1..=2 {
                let stride = frame.stride(plane);
                let data = frame.data(plane);
                for y in 0..uv_height {
                    let row_start = y * stride;
                    output.extend_from_slice(&data[row_start..row_start + uv_width]);
                }
            }

            Ok(output)
        }

        PixelFormat::Nv12 => {
            let mut output = Vec::with_capacity(width * height * 3 / 2);

            let y_stride = frame.stride(0);
            let y_data = frame.data(0);
            for y in 0..height {
                let row_start = y * y_stride;
                output.extend_from_slice(&y_data[row_start..row_start + width]);
            }

            let uv_stride = frame.stride(1);
            let uv_data = frame.data(1);
            for y in 0..(height / 2) {
                let row_start = y * uv_stride;
                output.extend_from_slice(&uv_data[row_start..row_start + width]);
            }

            Ok(output)
        }

        other => Err(Error::UnsupportedFormat(format!(
            "{other:?} is not an encoder input format"
        ))),
    }
}

impl std::fmt::Debug for FrameScaler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameScaler")
            .field("config", &self.config)
            .field("initialized", &self.state.is_some())
            .finish()
    }
}
