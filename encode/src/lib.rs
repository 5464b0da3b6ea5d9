/*!
    H.264 encoding for the stillreel crate ecosystem.

    One encoder session drives one of four backends — VAAPI, NVENC,
    MediaCodec or software x264 — behind a single contract. A configuration
    table maps each backend to its codec implementation name, hardware device
    type and pixel formats; the session itself is backend-agnostic.

    Hardware backends encode from device-resident surfaces: the session owns
    a device context and a frame pool sized to the output resolution, and
    each converted software frame is uploaded into a pool surface before
    submission. The software backend submits the converted frame directly.

    # Encoding

    ```ignore
    use stillreel_encode::{EncoderConfig, VideoEncoder};
    use stillreel_types::EncoderBackend;

    let config = EncoderConfig::new(EncoderBackend::X264, 1280, 720).with_fps(30);
    let mut encoder = VideoEncoder::new(&config)?;

    for frame in frames {
        // May yield zero packets now and several later; encoders buffer.
        for packet in encoder.encode(&frame)? {
            sink.write(&packet)?;
        }
    }

    for packet in encoder.flush()? {
        sink.write(&packet)?;
    }
    ```
*/

mod backend;
mod config;
mod hw;
mod probe;
mod session;

pub use config::EncoderConfig;
pub use hw::{HwDevice, HwFramePool};
pub use probe::probe_ref_frames;
pub use session::VideoEncoder;
