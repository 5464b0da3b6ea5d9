/*!
    Still-image loading for the stillreel crate ecosystem.

    Two variants feed the conversion pipeline:

    - [`load_still`] opens an image file as a miniature media container,
      decodes its single stream and yields one raw frame. The concrete image
      format is whatever the FFmpeg build can demux and decode.
    - [`load_raw_bgr`] reads a headerless file holding one tightly packed
      24-bit BGR buffer whose dimensions must match the session exactly.

    Both return a [`VideoFrame`](stillreel_types::VideoFrame) ready for the
    conversion stage. Failures are per-frame: callers skip the input and
    continue with the next image.
*/

mod convert;
mod raw;
mod still;

pub use raw::load_raw_bgr;
pub use still::load_still;
