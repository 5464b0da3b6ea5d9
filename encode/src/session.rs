/*!
    Encoder session implementation.
*/

use ffmpeg_next::{
    Dictionary, Rational as FFmpegRational,
    codec::{self, encoder::Video as VideoEncoderFFmpeg},
    ffi,
    util::frame::video::Video as VideoFrameFFmpeg,
};

use stillreel_types::{
    EncoderBackend, Error, MediaDuration, Packet, PixelFormat, Pts, Rational, Result,
    TICKS_PER_SECOND, VideoFrame, VideoStreamInfo,
};

use crate::backend::spec_for;
use crate::config::{BIT_RATE, EncoderConfig, GOP_SIZE};
use crate::hw::{HwDevice, HwFramePool, transfer_to_hw};
use crate::probe::{H264_LEVEL, probe_ref_frames};

/**
    Hardware half of a session: the device and its surface pool.

    Held for the encoder's lifetime. The codec context takes its own
    references to both; device and pool release theirs independently on
    drop, and FFmpeg frees the device once the last reference goes.
*/
struct HwContext {
    // Pool before device: references release in reverse-acquisition order.
    pool: HwFramePool,
    device: HwDevice,
}

/**
    One H.264 encoder session.

    Owns the codec context exclusively. Construction resolves the backend,
    establishes the hardware context when the backend needs one, applies the
    fixed encode policy and opens the codec; afterwards the session only
    accepts frames and emits packets.
*/
pub struct VideoEncoder {
    encoder: VideoEncoderFFmpeg,
    backend: EncoderBackend,
    input_format: PixelFormat,
    fps: u32,
    time_base: Rational,
    frame_count: i64,
    hw: Option<HwContext>,
}

impl VideoEncoder {
    /**
        Create and open an encoder session.

        Failures here — missing codec implementation, unavailable device,
        frame pool sizing, codec open — are fatal to the whole run.
    */
    pub fn new(config: &EncoderConfig) -> Result<Self> {
        ffmpeg_next::init().map_err(|e| Error::CodecOpen(e.to_string()))?;

        let spec = spec_for(config.backend);
        let codec = ffmpeg_next::encoder::find_by_name(spec.codec_name)
            .ok_or_else(|| Error::CodecNotFound(spec.codec_name.into()))?;

        // Hardware subsystem first: a missing accelerator must fail before
        // anything touches the codec context.
        let hw = if let Some(device_type) = spec.device_type {
            let device = HwDevice::create(config.backend)?;
            log_hw_configs(&codec, device_type);
            let pool = HwFramePool::create(&device, config.backend, config.width, config.height)?;
            Some(HwContext { device, pool })
        } else {
            None
        };

        let supports_multi_ref = hw
            .as_ref()
            .and_then(|h| probe_ref_frames(&h.device, config.width, config.height))
            .is_some_and(|refs| refs > 1);

        let encoder_ctx = codec::context::Context::new_with_codec(codec);
        let mut encoder = encoder_ctx
            .encoder()
            .video()
            .map_err(|e| Error::CodecOpen(e.to_string()))?;

        encoder.set_width(config.width);
        encoder.set_height(config.height);
        encoder.set_format(spec.wire_format);
        encoder.set_frame_rate(Some(FFmpegRational::new(config.fps as i32, 1)));

        // The time base is deliberately the coarse microsecond unit shared
        // with the presentation-timestamp cadence, not 1/fps.
        encoder.set_time_base(FFmpegRational::new(1, TICKS_PER_SECOND));

        encoder.set_bit_rate(BIT_RATE as usize);
        encoder.set_gop(GOP_SIZE as u32);

        unsafe {
            let ptr = encoder.as_mut_ptr();
            (*ptr).level = H264_LEVEL;
            (*ptr).max_b_frames = spec.max_b_frames;
            if !supports_multi_ref {
                (*ptr).refs = 1;
            }
            // The muxer needs SPS/PPS in extradata rather than in-band.
            (*ptr).flags |= ffi::AV_CODEC_FLAG_GLOBAL_HEADER as i32;

            if let Some(hw) = &hw {
                (*ptr).hw_device_ctx = hw.device.create_ref();
                (*ptr).hw_frames_ctx = ffi::av_buffer_ref(hw.pool.as_ptr());
            }
        }

        let mut opts = Dictionary::new();
        for (key, value) in config.validated_options()? {
            opts.set(key, value);
        }

        let encoder = encoder
            .open_with(opts)
            .map_err(|e| Error::CodecOpen(e.to_string()))?;

        tracing::info!(
            backend = config.backend.as_str(),
            codec = spec.codec_name,
            width = config.width,
            height = config.height,
            fps = config.fps,
            supports_multi_ref,
            "opened encoder"
        );

        Ok(Self {
            encoder,
            backend: config.backend,
            input_format: spec.input_format,
            fps: config.fps,
            time_base: Rational::MICROS,
            frame_count: 0,
            hw,
        })
    }

    pub fn backend(&self) -> EncoderBackend {
        self.backend
    }

    /**
        Pixel format the conversion stage must deliver to [`encode`](Self::encode).
    */
    pub fn input_format(&self) -> PixelFormat {
        self.input_format
    }

    /**
        Get the time base for encoded packets.
    */
    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    /**
        Get stream info for the container writer.

        Extradata (SPS/PPS) is available because the codec is already open.
    */
    pub fn stream_info(&self) -> VideoStreamInfo {
        VideoStreamInfo {
            width: self.encoder.width(),
            height: self.encoder.height(),
            pixel_format: self.input_format,
            frame_rate: Rational::new(self.fps as i32, 1),
            time_base: self.time_base,
            extradata: self.extradata(),
            bitrate: Some(BIT_RATE as u64),
            level: Some(H264_LEVEL),
        }
    }

    /**
        Encode a video frame, returning the packets drained so far.

        May return zero, one or multiple packets depending on encoder
        buffering; draining continues until the codec signals it needs more
        input or the stream ended. For hardware backends the frame is first
        uploaded into a pool surface.
    */
    pub fn encode(&mut self, frame: &VideoFrame) -> Result<Vec<Packet>> {
        if frame.width != self.encoder.width() || frame.height != self.encoder.height() {
            return Err(Error::InvalidData(format!(
                "frame dimensions {}x{} don't match encoder {}x{}",
                frame.width,
                frame.height,
                self.encoder.width(),
                self.encoder.height()
            )));
        }
        if frame.format != self.input_format {
            return Err(Error::InvalidData(format!(
                "frame format {:?} doesn't match encoder input {:?}",
                frame.format, self.input_format
            )));
        }

        let mut sw_frame = VideoFrameFFmpeg::new(
            sw_format_to_ffmpeg(self.input_format),
            frame.width,
            frame.height,
        );
        copy_data_to_ffmpeg_frame(&mut sw_frame, frame);

        let pts = frame.pts.map_or(self.frame_count, |p| p.0);
        sw_frame.set_pts(Some(pts));
        self.frame_count += 1;

        trace_frame_layout(&sw_frame);

        if let Some(hw) = &self.hw {
            let mut hw_frame = hw.pool.allocate()?;
            transfer_to_hw(&mut hw_frame, &sw_frame)?;
            hw_frame.set_pts(Some(pts));

            self.encoder
                .send_frame(&hw_frame)
                .map_err(|e| Error::EncodeSubmit(e.to_string()))?;
        } else {
            self.encoder
                .send_frame(&sw_frame)
                .map_err(|e| Error::EncodeSubmit(e.to_string()))?;
        }

        self.receive_packets()
    }

    /**
        Flush the encoder and drain any remaining buffered packets.

        Call this exactly once, at end of stream.
    */
    pub fn flush(&mut self) -> Result<Vec<Packet>> {
        match self.encoder.send_eof() {
            Ok(()) => {}
            // Already flushed; draining again is harmless.
            Err(ffmpeg_next::Error::Eof) => {}
            Err(e) => return Err(Error::Encode(e.to_string())),
        }

        self.receive_packets()
    }

    /**
        Drain completed packets until the encoder reports it needs more
        input or the stream ended.
    */
    fn receive_packets(&mut self) -> Result<Vec<Packet>> {
        let mut packets = Vec::new();
        let mut encoded_pkt = ffmpeg_next::Packet::empty();

        loop {
            match self.encoder.receive_packet(&mut encoded_pkt) {
                Ok(()) => packets.push(self.convert_packet(&encoded_pkt)),
                Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => {
                    // Need more input.
                    break;
                }
                Err(ffmpeg_next::Error::Eof) => {
                    // Stream ended.
                    break;
                }
                Err(e) => return Err(Error::Encode(e.to_string())),
            }
        }

        Ok(packets)
    }

    fn convert_packet(&self, pkt: &ffmpeg_next::Packet) -> Packet {
        Packet::new(
            pkt.data().map(|d| d.to_vec()).unwrap_or_default(),
            pkt.pts().map(Pts),
            pkt.dts().map(Pts),
            MediaDuration(pkt.duration()),
            self.time_base,
            pkt.is_key(),
        )
    }

    fn extradata(&self) -> Option<Vec<u8>> {
        unsafe {
            let ptr = self.encoder.as_ptr();
            let data = (*ptr).extradata;
            let size = (*ptr).extradata_size;
            if data.is_null() || size <= 0 {
                None
            } else {
                Some(std::slice::from_raw_parts(data, size as usize).to_vec())
            }
        }
    }
}

/**
    Log which hardware configuration the codec advertises for a device type.
*/
fn log_hw_configs(codec: &ffmpeg_next::Codec, device_type: ffi::AVHWDeviceType) {
    unsafe {
        for i in 0.. {
            let config = ffi::avcodec_get_hw_config(codec.as_ptr(), i);
            if config.is_null() {
                tracing::debug!(?device_type, "codec advertises no matching hardware config");
                break;
            }
            if (*config).methods & ffi::AV_CODEC_HW_CONFIG_METHOD_HW_DEVICE_CTX as i32 != 0
                && (*config).device_type == device_type
            {
                tracing::debug!(
                    ?device_type,
                    pix_fmt = ?(*config).pix_fmt,
                    "codec supports hardware device context"
                );
                break;
            }
        }
    }
}

fn trace_frame_layout(frame: &VideoFrameFFmpeg) {
    let planes = frame.planes();
    tracing::trace!(
        width = frame.width(),
        height = frame.height(),
        format = ?frame.format(),
        planes,
        strides = ?(0..planes).map(|i| frame.stride(i)).collect::<Vec<_>>(),
        "submitting frame"
    );
}

fn sw_format_to_ffmpeg(format: PixelFormat) -> ffmpeg_next::format::Pixel {
    use ffmpeg_next::format::Pixel;

    match format {
        PixelFormat::Nv12 => Pixel::NV12,
        PixelFormat::Yuv420p => Pixel::YUV420P,
        // The backend table only ever selects the two formats above.
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

    Only the encoder input formats (semi-planar and planar 4:2:0) occur here.
*/
fn copy_data_to_ffmpeg_frame(dst: &mut VideoFrameFFmpeg, src: &VideoFrame) {
    let width = src.width as usize;
    let height = src.height as usize;
    let y_size = width * height;

    match src.format {
        PixelFormat::Nv12 => {
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

        PixelFormat::Yuv420p => {
            let uv_width = width / 2;
            let uv_height = height / 2;
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

        // Unreachable via the backend table; guarded by the format check
        // in encode().
        _ => unreachable!("packed formats are converted before encoding"),
    }
}

impl std::fmt::Debug for VideoEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoEncoder")
            .field("backend", &self.backend)
            .field("width", &self.encoder.width())
            .field("height", &self.encoder.height())
            .field("input_format", &self.input_format)
            .field("hw", &self.hw.is_some())
            .finish_non_exhaustive()
    }
}
