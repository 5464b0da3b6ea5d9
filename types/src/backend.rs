/*!
    Encoder backend selector.
*/

use std::fmt;
use std::str::FromStr;

/**
    The encoder implementation a session drives.

    Selected once at construction; immutable for the session's lifetime. The
    backend determines the codec implementation name, the hardware device
    type (if any) and the pixel formats the encoder consumes.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EncoderBackend {
    /// VA-API hardware encoding (Linux render nodes).
    Vaapi,
    /// NVIDIA NVENC hardware encoding.
    Nvenc,
    /// Platform MediaCodec hardware encoding (Android).
    MediaCodec,
    /// Software x264 encoding.
    X264,
}

impl EncoderBackend {
    /// All known backends, in selector order.
    pub const ALL: [Self; 4] = [Self::Vaapi, Self::Nvenc, Self::MediaCodec, Self::X264];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vaapi => "vaapi",
            Self::Nvenc => "nvenc",
            Self::MediaCodec => "mediacodec",
            Self::X264 => "x264",
        }
    }

    /**
        True when this backend encodes via hardware surfaces and therefore
        needs a device context and frame pool.
    */
    pub const fn uses_hw_surfaces(self) -> bool {
        !matches!(self, Self::X264)
    }
}

impl fmt::Display for EncoderBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EncoderBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vaapi" => Ok(Self::Vaapi),
            "nvenc" => Ok(Self::Nvenc),
            "mediacodec" => Ok(Self::MediaCodec),
            "x264" | "libx264" => Ok(Self::X264),
            other => Err(format!(
                "unknown backend {other:?} (expected vaapi, nvenc, mediacodec or x264)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_roundtrip() {
        for backend in EncoderBackend::ALL {
            assert_eq!(backend.as_str().parse::<EncoderBackend>(), Ok(backend));
        }
    }

    #[test]
    fn parse_rejects_unknown() {
        assert!("qsv".parse::<EncoderBackend>().is_err());
    }

    #[test]
    fn hardware_surface_usage() {
        assert!(EncoderBackend::Vaapi.uses_hw_surfaces());
        assert!(EncoderBackend::Nvenc.uses_hw_surfaces());
        assert!(EncoderBackend::MediaCodec.uses_hw_surfaces());
        assert!(!EncoderBackend::X264.uses_hw_surfaces());
    }
}
