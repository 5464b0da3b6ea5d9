/*!
    Container-decode input variant.

    A still image is itself a miniature media container: one stream, one
    compressed unit. Opening it reuses the ordinary demux/decode machinery.
*/

use std::path::Path;

use ffmpeg_next::{
    codec, ffi, media::Type, util::frame::video::Video as VideoFrameFFmpeg,
};

use stillreel_types::{Error, PixelFormat, Result, VideoFrame};

use crate::convert::{pixel_format_from_ffmpeg, rational_from_ffmpeg};

/**
    Load a still image into a raw frame.

    Opens the path as a media container, locates its video stream, opens a
    matching decoder and decodes exactly one frame. Errors are fatal to this
    frame only; the overall run continues with the next image.
*/
pub fn load_still<P: AsRef<Path>>(path: P) -> Result<VideoFrame> {
    let path = path.as_ref();

    ffmpeg_next::init().map_err(|e| Error::SourceOpen {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut input = ffmpeg_next::format::input(&path).map_err(|e| Error::SourceOpen {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let stream = input
        .streams()
        .best(Type::Video)
        .ok_or_else(|| Error::UnsupportedSourceCodec("no video stream in source".into()))?;
    let stream_index = stream.index();
    let time_base = rational_from_ffmpeg(stream.time_base());
    let codec_id = stream.parameters().id();

    let decoder_ctx = codec::context::Context::from_parameters(stream.parameters())
        .map_err(|e| Error::UnsupportedSourceCodec(format!("{codec_id:?}: {e}")))?;
    let mut decoder = decoder_ctx
        .decoder()
        .video()
        .map_err(|e| Error::UnsupportedSourceCodec(format!("{codec_id:?}: {e}")))?;

    let mut decoded = VideoFrameFFmpeg::empty();
    let mut got_frame = false;

    // One compressed unit usually yields the frame immediately, but some
    // decoders hold it until EOF.
    for (stream, packet) in input.packets() {
        if stream.index() != stream_index {
            continue;
        }

        decoder
            .send_packet(&packet)
            .map_err(|e| Error::SourceDecode(e.to_string()))?;

        match decoder.receive_frame(&mut decoded) {
            Ok(()) => {
                got_frame = true;
                break;
            }
            Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => continue,
            Err(e) => return Err(Error::SourceDecode(e.to_string())),
        }
    }

    if !got_frame {
        decoder
            .send_eof()
            .map_err(|e| Error::SourceDecode(e.to_string()))?;
        decoder
            .receive_frame(&mut decoded)
            .map_err(|e| Error::SourceDecode(format!("no frame decoded: {e}")))?;
    }

    let width = decoded.width();
    let height = decoded.height();
    if width == 0 || height == 0 {
        return Err(Error::SourceDecode("decoded frame has zero dimensions".into()));
    }

    let ffmpeg_format = decoded.format();
    let format = pixel_format_from_ffmpeg(ffmpeg_format).ok_or_else(|| {
        Error::UnsupportedFormat(format!("source pixel format {ffmpeg_format:?}"))
    })?;

    tracing::trace!(?path, width, height, ?format, "decoded still image");

    let data = copy_frame_data(&decoded, format);
    Ok(VideoFrame::new(data, width, height, format, None, time_base))
}

/**
    Copy frame data from an FFmpeg frame to a contiguous buffer.
*/
fn copy_frame_data(frame: &VideoFrameFFmpeg, format: PixelFormat) -> Vec<u8> {
    let width = frame.width() as usize;
    let height = frame.height() as usize;

    match format {
        // Packed formats - single plane
        PixelFormat::Bgr24 | PixelFormat::Rgb24 | PixelFormat::Bgra | PixelFormat::Rgba => {
            let bytes_per_pixel = if format.bits_per_pixel() == 24 { 3 } else { 4 };
            let stride = frame.stride(0);
            let data = frame.data(0);

            let mut output = Vec::with_capacity(width * height * bytes_per_pixel);
            for y in 0..height {
                let row_start = y * stride;
                output.extend_from_slice(&data[row_start..row_start + width * bytes_per_pixel]);
            }
            output
        }

        // Planar 4:2:0
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
            output
        }

        // Semi-planar 4:2:0
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
            output
        }

        // `PixelFormat` is `#[non_exhaustive]`; all known variants are handled above.
        _ => unreachable!("unsupported pixel format: {format:?}"),
    }
}
