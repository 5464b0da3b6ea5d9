/*!
    Encoded packet type.
*/

use crate::{MediaDuration, Pts, Rational};

/**
    A unit of compressed bitstream produced by the encoder.

    Written to the container and released immediately. Encoders buffer
    internally, so zero or more packets may surface per submitted frame.
*/
#[derive(Clone)]
pub struct Packet {
    /// Compressed data.
    pub data: Vec<u8>,
    /// Presentation timestamp.
    pub pts: Option<Pts>,
    /// Decode timestamp.
    pub dts: Option<Pts>,
    /// Packet duration.
    pub duration: MediaDuration,
    /// Time base the timestamps are expressed in.
    pub time_base: Rational,
    /// True when the packet starts with a keyframe.
    pub is_keyframe: bool,
}

impl Packet {
    pub fn new(
        data: Vec<u8>,
        pts: Option<Pts>,
        dts: Option<Pts>,
        duration: MediaDuration,
        time_base: Rational,
        is_keyframe: bool,
    ) -> Self {
        Self {
            data,
            pts,
            dts,
            duration,
            time_base,
            is_keyframe,
        }
    }
}

impl std::fmt::Debug for Packet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Packet")
            .field("bytes", &self.data.len())
            .field("pts", &self.pts)
            .field("dts", &self.dts)
            .field("is_keyframe", &self.is_keyframe)
            .finish()
    }
}
