/*!
    Error taxonomy for the stillreel pipeline.

    Setup-phase errors (device, container, codec, header) are fatal to a run.
    Per-frame errors (source load, conversion, upload, submit, drain) are
    recovered at the frame boundary. Teardown errors (trailer) are logged and
    never block resource release.
*/

use std::path::PathBuf;

/**
    Errors produced anywhere in the stills-to-video pipeline.
*/
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The requested hardware accelerator is absent or its device node
    /// could not be opened. Fatal to session setup.
    #[error("hardware device unavailable for {backend}: {reason}")]
    DeviceUnavailable { backend: &'static str, reason: String },

    /// The hardware surface pool could not be sized or initialized.
    /// Fatal to session setup.
    #[error("hardware frame pool initialization failed: {0}")]
    FramePoolInit(String),

    /// The output container could not be allocated, usually because the
    /// format could not be inferred from the output path.
    #[error("output container allocation failed: {0}")]
    ContainerAlloc(String),

    /// Writing the container header failed.
    #[error("container header write failed: {0}")]
    HeaderWrite(String),

    /// The named encoder implementation is missing from this FFmpeg build.
    #[error("encoder {0:?} not found in this FFmpeg build")]
    CodecNotFound(String),

    /// The codec rejected its configuration at open time.
    #[error("failed to open codec: {0}")]
    CodecOpen(String),

    /// A source image could not be opened.
    #[error("failed to open source {path:?}: {reason}")]
    SourceOpen { path: PathBuf, reason: String },

    /// No decoder exists for the source image's codec.
    #[error("unsupported source codec: {0}")]
    UnsupportedSourceCodec(String),

    /// The source image could not be decoded (or, in raw-buffer mode,
    /// its contents do not match the declared layout).
    #[error("source decode failed: {0}")]
    SourceDecode(String),

    /// The colorspace/scaling context could not be created.
    #[error("conversion context creation failed: {0}")]
    ConversionContext(String),

    /// The scaling/colorspace conversion itself failed.
    #[error("frame scaling failed: {0}")]
    Scale(String),

    /// No surface could be drawn from the hardware frame pool.
    #[error("hardware frame pool exhausted: {0}")]
    FramePoolExhausted(String),

    /// Transferring pixel data into a hardware surface failed.
    #[error("transfer to hardware surface failed: {0}")]
    Transfer(String),

    /// The encoder rejected a submitted frame.
    #[error("encoder rejected frame: {0}")]
    EncodeSubmit(String),

    /// The encoder reported an error while packets were being drained.
    #[error("encode error while draining packets: {0}")]
    Encode(String),

    /// Writing the container trailer failed. Logged by callers; never
    /// blocks resource release.
    #[error("container trailer write failed: {0}")]
    TrailerWrite(String),

    /// A pixel format outside the supported subset was encountered.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Input data did not satisfy a structural requirement.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// An underlying I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /**
        True for errors that abort session setup entirely, as opposed to
        per-frame errors recovered at the frame boundary.
    */
    pub fn is_setup_fatal(&self) -> bool {
        matches!(
            self,
            Self::DeviceUnavailable { .. }
                | Self::FramePoolInit(_)
                | Self::ContainerAlloc(_)
                | Self::HeaderWrite(_)
                | Self::CodecNotFound(_)
                | Self::CodecOpen(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_errors_are_fatal() {
        assert!(Error::CodecNotFound("h264_nvenc".into()).is_setup_fatal());
        assert!(
            Error::DeviceUnavailable {
                backend: "vaapi",
                reason: "no render node".into(),
            }
            .is_setup_fatal()
        );
        assert!(!Error::Scale("odd dimensions".into()).is_setup_fatal());
        assert!(!Error::SourceDecode("truncated".into()).is_setup_fatal());
    }
}
