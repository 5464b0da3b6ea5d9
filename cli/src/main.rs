use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use stillreel_pipeline::{EncodeSession, InputMode, SessionConfig};
use stillreel_types::EncoderBackend;

#[derive(Parser, Debug)]
#[command(name = "stillreel")]
#[command(about = "Assemble a burst of still images into an H.264 video")]
struct Args {
    /// Output video path; the container is inferred from the extension
    #[arg(short, long)]
    output: PathBuf,

    /// Encoder backend: vaapi, nvenc, mediacodec or x264
    #[arg(long, default_value = "x264")]
    backend: EncoderBackend,

    /// Output width in pixels
    #[arg(long)]
    width: u32,

    /// Output height in pixels
    #[arg(long)]
    height: u32,

    /// Frame rate of the assembled video
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Quality hint (currently unused; the bitrate is fixed)
    #[arg(long, default_value_t = 0)]
    quality: u32,

    /// Treat inputs as headerless packed BGR24 buffers instead of images
    #[arg(long)]
    raw: bool,

    /// Encode every regular file in this directory, in sorted order
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Encoder tuning options, e.g. --encoder-option preset=veryfast
    #[arg(long = "encoder-option", value_parser = parse_key_value)]
    encoder_options: Vec<(String, String)>,

    /// Raise FFmpeg's own log level to verbose
    #[arg(long)]
    ffmpeg_log: bool,

    /// Input image paths, encoded in the order given
    images: Vec<PathBuf>,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got {s:?}"))
}

fn collect_inputs(args: &Args) -> std::io::Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();

    if let Some(dir) = &args.input_dir {
        let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        entries.sort();
        inputs.extend(entries);
    }

    inputs.extend(args.images.iter().cloned());
    Ok(inputs)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    if args.ffmpeg_log {
        unsafe {
            ffmpeg_next::ffi::av_log_set_level(ffmpeg_next::ffi::AV_LOG_VERBOSE);
        }
    }

    let inputs = match collect_inputs(&args) {
        Ok(inputs) => inputs,
        Err(e) => {
            tracing::error!(error = %e, "failed to list inputs");
            return ExitCode::FAILURE;
        }
    };

    if inputs.is_empty() {
        tracing::error!("no input images given");
        return ExitCode::FAILURE;
    }

    let config = SessionConfig::new(args.backend, args.width, args.height)
        .with_fps(args.fps)
        .with_quality(args.quality)
        .with_input_mode(if args.raw {
            InputMode::RawBgr
        } else {
            InputMode::Still
        });
    let config = args
        .encoder_options
        .iter()
        .fold(config, |c, (k, v)| c.with_encoder_option(k, v));

    let mut session = match EncodeSession::initialize(config, &args.output) {
        Ok(session) => session,
        Err(e) => {
            tracing::error!(backend = %args.backend, error = %e, "session setup failed");
            return ExitCode::FAILURE;
        }
    };

    // A single bad frame is logged and skipped; the batch continues.
    let mut failed = 0usize;
    for input in &inputs {
        if session.encode_frame(input).is_err() {
            failed += 1;
        }
    }

    let encoded = match session.finish() {
        Ok(encoded) => encoded,
        Err(e) => {
            tracing::error!(error = %e, "failed to finalize output");
            return ExitCode::FAILURE;
        }
    };

    println!(
        "{}: {} frame(s) encoded, {} failed",
        args.output.display(),
        encoded,
        failed
    );

    if encoded == 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
