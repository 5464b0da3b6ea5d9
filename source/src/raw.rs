/*!
    Raw-buffer input variant.
*/

use std::path::Path;

use stillreel_types::{Error, PixelFormat, Rational, Result, VideoFrame};

/**
    Load a headerless packed 24-bit BGR buffer.

    The file must hold exactly `width * height * 3` bytes; there is no header
    and no format negotiation. Dimensions come from the session configuration.
*/
pub fn load_raw_bgr<P: AsRef<Path>>(path: P, width: u32, height: u32) -> Result<VideoFrame> {
    let path = path.as_ref();

    let data = std::fs::read(path).map_err(|e| Error::SourceOpen {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let expected = PixelFormat::Bgr24.buffer_size(width, height);
    if data.len() != expected {
        return Err(Error::SourceDecode(format!(
            "raw buffer {path:?} holds {} bytes, expected {expected} for {width}x{height} BGR24",
            data.len()
        )));
    }

    tracing::trace!(?path, width, height, "read raw BGR24 buffer");

    Ok(VideoFrame::new(
        data,
        width,
        height,
        PixelFormat::Bgr24,
        None,
        Rational::MICROS,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn rejects_missing_file() {
        let err = load_raw_bgr("/nonexistent/frame.bgr", 16, 16).unwrap_err();
        assert!(matches!(err, Error::SourceOpen { .. }));
    }

    #[test]
    fn rejects_size_mismatch() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0u8; 100]).unwrap();

        let err = load_raw_bgr(file.path(), 16, 16).unwrap_err();
        assert!(matches!(err, Error::SourceDecode(_)));
    }

    #[test]
    fn loads_exact_buffer() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&vec![0x80u8; 16 * 16 * 3]).unwrap();

        let frame = load_raw_bgr(file.path(), 16, 16).unwrap();
        assert_eq!(frame.width, 16);
        assert_eq!(frame.height, 16);
        assert_eq!(frame.format, PixelFormat::Bgr24);
        assert!(frame.is_packed_exact());
        assert!(frame.pts.is_none());
    }
}
