/*!
    Shared types for the stillreel crate ecosystem.

    This crate defines the vocabulary of the ecosystem — the types that cross crate
    boundaries. It has no dependency on FFmpeg, making it lightweight and enabling
    consumers to depend on it without pulling in FFmpeg bindings.
*/

mod backend;
mod error;
mod format;
mod frame;
mod packet;
mod stream;
mod time;

pub use backend::EncoderBackend;
pub use error::{Error, Result};
pub use format::PixelFormat;
pub use frame::VideoFrame;
pub use packet::Packet;
pub use stream::VideoStreamInfo;
pub use time::{MediaDuration, Pts, Rational, TICKS_PER_SECOND};
