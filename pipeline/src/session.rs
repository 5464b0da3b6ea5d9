/*!
    Encode session implementation.
*/

use std::path::Path;

use stillreel_convert::{FrameScaler, ScalerConfig, ScalingMode};
use stillreel_encode::{EncoderConfig, VideoEncoder};
use stillreel_sink::Sink;
use stillreel_source::{load_raw_bgr, load_still};
use stillreel_types::{EncoderBackend, Error, Pts, Result, TICKS_PER_SECOND};

/**
    How input paths are interpreted.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InputMode {
    /// Each path is a still-image container (PNG, JPEG, ...), decoded.
    #[default]
    Still,
    /// Each path is a headerless packed BGR24 buffer matching the session
    /// dimensions exactly.
    RawBgr,
}

/**
    Configuration for an encode session.
*/
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Encoder backend.
    pub backend: EncoderBackend,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Frame rate; one frame advances the presentation clock by 1/fps.
    pub fps: u32,
    /// Quality hint, currently inert (the bitrate is fixed).
    pub quality: u32,
    /// Input interpretation.
    pub input_mode: InputMode,
    /// Tuning options forwarded to the encoder after validation.
    pub encoder_options: Vec<(String, String)>,
}

impl SessionConfig {
    pub fn new(backend: EncoderBackend, width: u32, height: u32) -> Self {
        Self {
            backend,
            width,
            height,
            fps: 30,
            quality: 0,
            input_mode: InputMode::default(),
            encoder_options: Vec::new(),
        }
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    pub fn with_quality(mut self, quality: u32) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_input_mode(mut self, mode: InputMode) -> Self {
        self.input_mode = mode;
        self
    }

    pub fn with_encoder_option(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.encoder_options.push((key.into(), value.into()));
        self
    }
}

/**
    Per-frame presentation timestamp increment for a frame rate, in the
    pipeline's microsecond time base, rounded to the nearest tick.
*/
pub fn pts_step(fps: u32) -> i64 {
    let fps = i64::from(fps);
    (i64::from(TICKS_PER_SECOND) + fps / 2) / fps
}

/**
    A stills-to-video encode session.

    Owns the encoder, the container writer and the conversion stage, plus the
    presentation-timestamp counter. Single-threaded and synchronous: each
    frame runs load → convert → timestamp → submit → drain → mux to
    completion before the next begins.
*/
pub struct EncodeSession {
    encoder: VideoEncoder,
    sink: Sink,
    scaler: FrameScaler,
    input_mode: InputMode,
    width: u32,
    height: u32,
    next_pts: i64,
    pts_increment: i64,
    frames_encoded: u64,
    finished: bool,
}

impl EncodeSession {
    /**
        Set up the whole pipeline for one output file.

        The encoder (including any hardware context) is established before
        the container is created, so selecting an unavailable backend fails
        cleanly without leaving a partial file on disk. Setup errors are
        fatal: no frames can be encoded after a failed initialize.
    */
    pub fn initialize<P: AsRef<Path>>(config: SessionConfig, output: P) -> Result<Self> {
        if config.width < 16 || config.height < 16 {
            return Err(Error::InvalidData(format!(
                "output dimensions {}x{} below the 16x16 minimum",
                config.width, config.height
            )));
        }
        if config.fps == 0 || config.fps > 120 {
            return Err(Error::InvalidData(format!(
                "frame rate {} outside 1..=120",
                config.fps
            )));
        }

        let encoder_config = EncoderConfig {
            backend: config.backend,
            width: config.width,
            height: config.height,
            fps: config.fps,
            quality: config.quality,
            options: config.encoder_options.clone(),
        };
        let encoder = VideoEncoder::new(&encoder_config)?;

        let sink = Sink::create(output.as_ref(), &encoder.stream_info())?;

        let mode = match config.input_mode {
            InputMode::RawBgr => ScalingMode::FastBilinear,
            InputMode::Still => ScalingMode::Bilinear,
        };
        let scaler = FrameScaler::new(
            ScalerConfig::new(config.width, config.height, encoder.input_format())
                .with_mode(mode),
        );

        tracing::info!(
            backend = config.backend.as_str(),
            output = %output.as_ref().display(),
            width = config.width,
            height = config.height,
            fps = config.fps,
            mode = ?config.input_mode,
            "encode session initialized"
        );

        Ok(Self {
            encoder,
            sink,
            scaler,
            input_mode: config.input_mode,
            width: config.width,
            height: config.height,
            next_pts: 0,
            pts_increment: pts_step(config.fps),
            frames_encoded: 0,
            finished: false,
        })
    }

    /**
        Run the full per-frame pipeline for one input path.

        A failure abandons this frame — its partial resources are released —
        and the session stays usable for the next input. The presentation
        clock advances once per successfully converted frame even when a
        later stage fails, keeping the cadence deterministic.
    */
    pub fn encode_frame<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();

        let result = self.encode_frame_inner(path);
        if let Err(e) = &result {
            tracing::warn!(input = %path.display(), error = %e, "frame abandoned");
        }
        result
    }

    fn encode_frame_inner(&mut self, path: &Path) -> Result<()> {
        let source = match self.input_mode {
            InputMode::Still => load_still(path)?,
            InputMode::RawBgr => load_raw_bgr(path, self.width, self.height)?,
        };

        let mut converted = self.scaler.convert(&source)?;
        drop(source);

        // The clock advances unconditionally once conversion succeeded;
        // a failed submit does not reuse this timestamp.
        converted.pts = Some(Pts(self.next_pts));
        self.next_pts += self.pts_increment;

        let packets = self.encoder.encode(&converted)?;
        self.write_packets(packets)?;

        self.frames_encoded += 1;
        tracing::debug!(
            input = %path.display(),
            pts = converted.pts.map(|p| p.0),
            "frame encoded"
        );
        Ok(())
    }

    fn write_packets(&mut self, packets: Vec<stillreel_types::Packet>) -> Result<()> {
        for packet in packets {
            self.sink.write(&packet)?;
        }
        Ok(())
    }

    /**
        Number of frames that made it through the full pipeline.
    */
    pub fn frames_encoded(&self) -> u64 {
        self.frames_encoded
    }

    /**
        Number of packets written to the container so far.
    */
    pub fn packets_written(&self) -> u64 {
        self.sink.packets_written()
    }

    /**
        Flush the encoder, write the remaining packets and finalize the
        container.

        Resources are released when the session drops, whether or not this
        succeeds; a trailer failure is reported but changes nothing about
        release order.
    */
    pub fn finish(mut self) -> Result<u64> {
        self.finished = true;

        let packets = self.encoder.flush()?;
        self.write_packets(packets)?;
        self.sink.finish()?;

        tracing::info!(
            frames = self.frames_encoded,
            packets = self.sink.packets_written(),
            "encode session finished"
        );
        Ok(self.frames_encoded)
    }
}

impl Drop for EncodeSession {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        // Best-effort teardown for sessions dropped without finish(): drain
        // what the encoder still buffers, then let the sink write its
        // trailer. Failures are logged, never raised.
        match self.encoder.flush() {
            Ok(packets) => {
                for packet in packets {
                    if let Err(e) = self.sink.write(&packet) {
                        tracing::warn!(error = %e, "packet write failed during teardown");
                        break;
                    }
                }
            }
            Err(e) => tracing::warn!(error = %e, "encoder flush failed during teardown"),
        }
    }
}

impl std::fmt::Debug for EncodeSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodeSession")
            .field("encoder", &self.encoder)
            .field("input_mode", &self.input_mode)
            .field("next_pts", &self.next_pts)
            .field("frames_encoded", &self.frames_encoded)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pts_step_for_common_rates() {
        assert_eq!(pts_step(30), 33_333);
        assert_eq!(pts_step(10), 100_000);
        assert_eq!(pts_step(1), 1_000_000);
        assert_eq!(pts_step(120), 8_333);
    }

    #[test]
    fn pts_step_is_positive_across_supported_range() {
        for fps in 1..=120 {
            assert!(pts_step(fps) > 0, "fps {fps}");
        }
    }

    #[test]
    fn pts_sequence_is_strictly_increasing() {
        for fps in [1u32, 24, 30, 60, 120] {
            let step = pts_step(fps);
            let mut pts = 0i64;
            let mut last = -1i64;
            for _ in 0..240 {
                assert!(pts > last);
                last = pts;
                pts += step;
            }
        }
    }

    #[test]
    fn initialize_rejects_tiny_dimensions() {
        let config = SessionConfig::new(EncoderBackend::X264, 8, 8);
        assert!(matches!(
            EncodeSession::initialize(config, "/tmp/never-created.mp4"),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn initialize_rejects_zero_fps() {
        let config = SessionConfig::new(EncoderBackend::X264, 64, 64).with_fps(0);
        assert!(matches!(
            EncodeSession::initialize(config, "/tmp/never-created.mp4"),
            Err(Error::InvalidData(_))
        ));
    }
}
