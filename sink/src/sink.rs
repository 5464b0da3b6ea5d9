/*!
    Container writer implementation.
*/

use std::path::Path;

use ffmpeg_next::{
    Rational as FFmpegRational, ffi, format::context::Output as OutputContext,
    packet::Mut as PacketMut,
};

use stillreel_types::{Error, Packet, PixelFormat, Rational, Result, VideoStreamInfo};

/**
    Container writer for the session's single video stream.

    Creation allocates the container (inferring the format from the path's
    extension), opens the byte sink for file-backed formats, registers the
    stream from the encoder's description and writes the header. Afterwards
    packets are written in presentation order; [`finish`](Sink::finish)
    writes the trailer.

    Dropping an unfinished sink writes the trailer on a best-effort basis:
    trailer failures are logged and never block releasing the container.
*/
pub struct Sink {
    output: OutputContext,
    stream_index: usize,
    /// Stream time base as the muxer settled it after the header write.
    stream_time_base: Rational,
    trailer_written: bool,
    packets_written: u64,
}

impl Sink {
    /**
        Create the container, register the video stream and write the header.

        Must be called with the encoder already open so the stream info
        carries extradata; containers like MP4 need SPS/PPS up front.
    */
    pub fn create<P: AsRef<Path>>(path: P, info: &VideoStreamInfo) -> Result<Self> {
        ffmpeg_next::init().map_err(|e| Error::ContainerAlloc(e.to_string()))?;

        let path = path.as_ref();
        let mut output = ffmpeg_next::format::output(&path)
            .map_err(|e| Error::ContainerAlloc(format!("{}: {e}", path.display())))?;

        let stream_index = {
            let mut stream = output
                .add_stream(ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::H264))
                .map_err(|e| Error::ContainerAlloc(format!("failed to add video stream: {e}")))?;

            let params = stream.parameters();
            set_video_parameters(&params, info)?;

            // More granular than the codec's internal time base; the muxer
            // may still adjust it during the header write.
            let tb = FFmpegRational::new(info.time_base.num, info.time_base.den);
            stream.set_time_base(tb);

            stream.index()
        };

        output
            .write_header()
            .map_err(|e| Error::HeaderWrite(e.to_string()))?;

        let stream_time_base = output
            .stream(stream_index)
            .map(|s| Rational::new(s.time_base().numerator(), s.time_base().denominator()))
            .unwrap_or(info.time_base);

        tracing::debug!(
            path = %path.display(),
            width = info.width,
            height = info.height,
            ?stream_time_base,
            "container header written"
        );

        Ok(Self {
            output,
            stream_index,
            stream_time_base,
            trailer_written: false,
            packets_written: 0,
        })
    }

    /**
        Write an encoded packet.

        Timestamps are rescaled from the packet's time base to the stream's;
        the muxer interleaves as the container format requires.
    */
    pub fn write(&mut self, packet: &Packet) -> Result<()> {
        if self.trailer_written {
            return Err(Error::InvalidData("sink already finished".into()));
        }

        let mut ffmpeg_pkt = if packet.data.is_empty() {
            ffmpeg_next::Packet::empty()
        } else {
            ffmpeg_next::Packet::copy(&packet.data)
        };

        ffmpeg_pkt.set_stream(self.stream_index);

        unsafe {
            let pkt_ptr = ffmpeg_pkt.as_mut_ptr();
            if let Some(pts) = packet.pts {
                (*pkt_ptr).pts = rescale_ts(pts.0, packet.time_base, self.stream_time_base);
            }
            if let Some(dts) = packet.dts {
                (*pkt_ptr).dts = rescale_ts(dts.0, packet.time_base, self.stream_time_base);
            }
            (*pkt_ptr).duration =
                rescale_ts(packet.duration.0, packet.time_base, self.stream_time_base);
        }

        if packet.is_keyframe {
            ffmpeg_pkt.set_flags(ffmpeg_next::packet::Flags::KEY);
        }

        ffmpeg_pkt
            .write_interleaved(&mut self.output)
            .map_err(|e| Error::Encode(format!("failed to write packet: {e}")))?;

        self.packets_written += 1;
        Ok(())
    }

    /**
        Number of packets written so far.
    */
    pub fn packets_written(&self) -> u64 {
        self.packets_written
    }

    /**
        Write the trailer and finalize the container.

        Idempotent; the trailer is written at most once even if this races
        with drop-time teardown after an error.
    */
    pub fn finish(&mut self) -> Result<()> {
        if self.trailer_written {
            return Ok(());
        }
        // Marked before the attempt: a failed trailer is never retried, and
        // release proceeds unconditionally.
        self.trailer_written = true;

        self.output
            .write_trailer()
            .map_err(|e| Error::TrailerWrite(e.to_string()))?;

        tracing::debug!(packets = self.packets_written, "container trailer written");
        Ok(())
    }
}

impl Drop for Sink {
    fn drop(&mut self) {
        if let Err(e) = self.finish() {
            tracing::warn!(error = %e, "trailer write failed during sink teardown");
        }
    }
}

/**
    Rescale a timestamp from one time base to another.
*/
fn rescale_ts(ts: i64, from: Rational, to: Rational) -> i64 {
    if from.num == to.num && from.den == to.den {
        return ts;
    }

    // ts * from.num / from.den * to.den / to.num
    // = ts * from.num * to.den / (from.den * to.num)
    let num = ts as i128 * from.num as i128 * to.den as i128;
    let den = from.den as i128 * to.num as i128;
    if den == 0 {
        return ts;
    }
    (num / den) as i64
}

/**
    Copy the stream description into the stream's codec parameters.
*/
fn set_video_parameters(
    params: &ffmpeg_next::codec::Parameters,
    info: &VideoStreamInfo,
) -> Result<()> {
    unsafe {
        let ptr = params.as_ptr() as *mut ffi::AVCodecParameters;

        (*ptr).codec_type = ffi::AVMediaType::AVMEDIA_TYPE_VIDEO;
        (*ptr).codec_id = ffi::AVCodecID::AV_CODEC_ID_H264;
        (*ptr).width = info.width as i32;
        (*ptr).height = info.height as i32;

        (*ptr).format = match info.pixel_format {
            PixelFormat::Nv12 => ffi::AVPixelFormat::AV_PIX_FMT_NV12 as i32,
            PixelFormat::Yuv420p => ffi::AVPixelFormat::AV_PIX_FMT_YUV420P as i32,
            other => {
                return Err(Error::UnsupportedFormat(format!(
                    "stream pixel format {other:?}"
                )));
            }
        };

        // Extradata carries SPS/PPS; FFmpeg requires padded allocation.
        if let Some(ref extradata) = info.extradata {
            if !extradata.is_empty() {
                let alloc_size = extradata.len() + ffi::AV_INPUT_BUFFER_PADDING_SIZE as usize;
                let buf = ffi::av_mallocz(alloc_size) as *mut u8;
                if !buf.is_null() {
                    std::ptr::copy_nonoverlapping(extradata.as_ptr(), buf, extradata.len());
                    (*ptr).extradata = buf;
                    (*ptr).extradata_size = extradata.len() as i32;
                }
            }
        }

        if let Some(bitrate) = info.bitrate {
            (*ptr).bit_rate = bitrate as i64;
        }

        if let Some(level) = info.level {
            (*ptr).level = level;
        }
    }

    Ok(())
}

impl std::fmt::Debug for Sink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sink")
            .field("stream_index", &self.stream_index)
            .field("packets_written", &self.packets_written)
            .field("trailer_written", &self.trailer_written)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rescale_identity() {
        let tb = Rational::new(1, 1_000_000);
        assert_eq!(rescale_ts(33_333, tb, tb), 33_333);
    }

    #[test]
    fn rescale_micros_to_90khz() {
        let micros = Rational::new(1, 1_000_000);
        let mpeg = Rational::new(1, 90_000);
        assert_eq!(rescale_ts(1_000_000, micros, mpeg), 90_000);
        assert_eq!(rescale_ts(33_333, micros, mpeg), 2_999);
    }

    #[test]
    fn rescale_survives_zero_denominator() {
        let micros = Rational::new(1, 1_000_000);
        assert_eq!(rescale_ts(42, micros, Rational::new(0, 0)), 42);
    }
}
