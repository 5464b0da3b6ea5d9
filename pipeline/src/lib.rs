/*!
    The stills-to-video encode session.

    Composes the stillreel crates into the per-frame pipeline: load a still
    (or raw buffer) → convert to the encoder's pixel format → assign the
    presentation timestamp → submit and drain → mux. One frame is processed
    to completion before the next; per-frame failures abandon that frame and
    leave the session usable for the next input.

    ```ignore
    use stillreel_pipeline::{EncodeSession, SessionConfig};
    use stillreel_types::EncoderBackend;

    let config = SessionConfig::new(EncoderBackend::X264, 1280, 720);
    let mut session = EncodeSession::initialize(config, "burst.mp4")?;

    for image in images {
        if let Err(e) = session.encode_frame(&image) {
            // Frame skipped; the batch continues.
        }
    }

    session.finish()?;
    ```
*/

mod session;

pub use session::{EncodeSession, InputMode, SessionConfig, pts_step};
