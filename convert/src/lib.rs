/*!
    Frame conversion for the stillreel crate ecosystem.

    Resamples and colorspace-converts source frames into the pixel format and
    dimensions the selected encoder consumes. The scaling context is cached
    and reused across frames while the source parameters stay unchanged —
    per-session dimensions are fixed, so in practice it is created once.
*/

mod video;

pub use video::{FrameScaler, ScalerConfig, ScalingMode};
