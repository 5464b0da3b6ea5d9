//! Container framing: header and trailer around zero packets.

use stillreel_sink::Sink;
use stillreel_types::{Error, PixelFormat, Rational, VideoStreamInfo};

fn stream_info(width: u32, height: u32) -> VideoStreamInfo {
    VideoStreamInfo {
        width,
        height,
        pixel_format: PixelFormat::Yuv420p,
        frame_rate: Rational::new(30, 1),
        time_base: Rational::MICROS,
        extradata: None,
        bitrate: Some(2_000_000),
        level: Some(32),
    }
}

#[test]
fn unknown_extension_is_container_alloc_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.not_a_container");

    let err = Sink::create(&path, &stream_info(320, 240)).unwrap_err();
    assert!(matches!(err, Error::ContainerAlloc(_)));
}

#[test]
fn zero_packet_run_writes_header_then_trailer() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.mkv");

    let mut sink = Sink::create(&path, &stream_info(320, 240)).unwrap();
    assert_eq!(sink.packets_written(), 0);
    sink.finish().unwrap();
    // Idempotent: a second finish is a no-op.
    sink.finish().unwrap();
    drop(sink);

    let input = ffmpeg_next::format::input(&path).unwrap();
    assert_eq!(input.streams().count(), 1);

    let stream = input.streams().next().unwrap();
    assert_eq!(stream.parameters().id(), ffmpeg_next::codec::Id::H264);
}

#[test]
fn drop_without_finish_still_finalizes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dropped.mkv");

    {
        let _sink = Sink::create(&path, &stream_info(64, 64)).unwrap();
    }

    // The trailer was written by the drop path; the file parses.
    let input = ffmpeg_next::format::input(&path).unwrap();
    assert_eq!(input.streams().count(), 1);
}

#[test]
fn write_after_finish_is_rejected() {
    use stillreel_types::{MediaDuration, Packet};

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("closed.mkv");

    let mut sink = Sink::create(&path, &stream_info(64, 64)).unwrap();
    sink.finish().unwrap();

    let packet = Packet::new(
        vec![0u8; 16],
        None,
        None,
        MediaDuration(0),
        Rational::MICROS,
        true,
    );
    assert!(sink.write(&packet).is_err());
}
