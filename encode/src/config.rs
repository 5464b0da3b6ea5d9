/*!
    Encoder session configuration.
*/

use stillreel_types::{EncoderBackend, Error, Result};

/// Fixed output bitrate in bits per second. The quality parameter is
/// carried through the configuration but does not feed this value.
pub(crate) const BIT_RATE: i64 = 2_000_000;

/// Fixed GOP size.
pub(crate) const GOP_SIZE: i32 = 12;

/// Tuning keys the session recognizes, with the backends each applies to.
/// A recognized key that does not apply to the selected backend is stripped
/// before the codec open call so the codec does not reject it;
/// `reorder_queue_size` applies to no encoder and is always stripped.
const RECOGNIZED_OPTIONS: &[(&str, &[EncoderBackend])] = &[
    ("preset", &[EncoderBackend::Nvenc, EncoderBackend::X264]),
    ("tune", &[EncoderBackend::Nvenc, EncoderBackend::X264]),
    (
        "profile",
        &[
            EncoderBackend::Vaapi,
            EncoderBackend::Nvenc,
            EncoderBackend::MediaCodec,
            EncoderBackend::X264,
        ],
    ),
    ("rc", &[EncoderBackend::Nvenc]),
    ("low_power", &[EncoderBackend::Vaapi]),
    ("reorder_queue_size", &[]),
];

/**
    Configuration for one encoder session.
*/
#[derive(Clone, Debug)]
pub struct EncoderConfig {
    /// Backend to encode with.
    pub backend: EncoderBackend,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Frame rate.
    pub fps: u32,
    /// Quality hint. Accepted for interface compatibility; the bitrate is
    /// currently fixed and this value does not feed it.
    pub quality: u32,
    /// Tuning options forwarded to the codec open call after validation.
    pub options: Vec<(String, String)>,
}

impl EncoderConfig {
    pub fn new(backend: EncoderBackend, width: u32, height: u32) -> Self {
        Self {
            backend,
            width,
            height,
            fps: 30,
            quality: 0,
            options: Vec::new(),
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

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.push((key.into(), value.into()));
        self
    }

    /**
        Validate the configured tuning options against the recognized set.

        Returns the key/value pairs that should reach the codec open call.
        Unrecognized keys are rejected; recognized keys that do not apply to
        the selected backend are stripped with a log line.
    */
    pub(crate) fn validated_options(&self) -> Result<Vec<(&str, &str)>> {
        let mut applicable = Vec::new();

        for (key, value) in &self.options {
            let Some((_, backends)) = RECOGNIZED_OPTIONS.iter().find(|(k, _)| *k == key.as_str())
            else {
                return Err(Error::CodecOpen(format!(
                    "unrecognized encoder option {key:?}"
                )));
            };

            if backends.contains(&self.backend) {
                applicable.push((key.as_str(), value.as_str()));
            } else {
                tracing::debug!(
                    key = key.as_str(),
                    backend = self.backend.as_str(),
                    "stripping option not applicable to backend"
                );
            }
        }

        Ok(applicable)
    }
}
