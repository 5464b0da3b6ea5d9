/*!
    Container output for the stillreel crate ecosystem.

    Owns the output container: one H.264 video stream, header written before
    any packet, trailer written exactly once at teardown. The container
    format is inferred from the output path's extension.
*/

mod sink;

pub use sink::Sink;
