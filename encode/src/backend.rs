/*!
    Backend configuration table.

    All backend-specific variation lives here: codec implementation name,
    hardware device type and path, and the pixel formats involved. The rest
    of the crate dispatches through this table instead of branching per
    call site.
*/

use std::ffi::CStr;

use ffmpeg_next::{ffi::AVHWDeviceType, format::Pixel};

use stillreel_types::{EncoderBackend, PixelFormat};

/**
    Everything that distinguishes one encoder backend from another.
*/
#[derive(Clone, Copy, Debug)]
pub(crate) struct BackendSpec {
    /// FFmpeg encoder implementation name.
    pub codec_name: &'static str,
    /// Hardware device type, absent for the software backend.
    pub device_type: Option<AVHWDeviceType>,
    /// Device node path, where the device type requires one.
    pub device_path: Option<&'static CStr>,
    /// Pixel format the codec context is configured with.
    pub wire_format: Pixel,
    /// Frame pool format pair: (surface format, underlying storage format).
    /// Fixed for the session's lifetime. Absent for the software backend.
    pub pool_formats: Option<(Pixel, Pixel)>,
    /// Pixel format the conversion stage must produce.
    pub input_format: PixelFormat,
    /// Number of B-frames the backend tolerates.
    pub max_b_frames: i32,
}

pub(crate) fn spec_for(backend: EncoderBackend) -> BackendSpec {
    match backend {
        EncoderBackend::Vaapi => BackendSpec {
            codec_name: "h264_vaapi",
            device_type: Some(AVHWDeviceType::AV_HWDEVICE_TYPE_VAAPI),
            device_path: Some(c"/dev/dri/renderD128"),
            wire_format: Pixel::VAAPI,
            pool_formats: Some((Pixel::VAAPI, Pixel::NV12)),
            input_format: PixelFormat::Nv12,
            max_b_frames: 1,
        },
        EncoderBackend::Nvenc => BackendSpec {
            codec_name: "h264_nvenc",
            device_type: Some(AVHWDeviceType::AV_HWDEVICE_TYPE_CUDA),
            device_path: None,
            wire_format: Pixel::CUDA,
            pool_formats: Some((Pixel::CUDA, Pixel::NV12)),
            input_format: PixelFormat::Nv12,
            max_b_frames: 1,
        },
        EncoderBackend::MediaCodec => BackendSpec {
            codec_name: "h264_mediacodec",
            device_type: Some(AVHWDeviceType::AV_HWDEVICE_TYPE_MEDIACODEC),
            device_path: None,
            wire_format: Pixel::MEDIACODEC,
            pool_formats: Some((Pixel::YUV420P, Pixel::YUV420P)),
            input_format: PixelFormat::Yuv420p,
            // The platform codec reorders internally; B-frames are not requested.
            max_b_frames: 0,
        },
        EncoderBackend::X264 => BackendSpec {
            codec_name: "libx264",
            device_type: None,
            device_path: None,
            wire_format: Pixel::NV12,
            pool_formats: None,
            input_format: PixelFormat::Nv12,
            max_b_frames: 1,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_names() {
        assert_eq!(spec_for(EncoderBackend::Vaapi).codec_name, "h264_vaapi");
        assert_eq!(spec_for(EncoderBackend::Nvenc).codec_name, "h264_nvenc");
        assert_eq!(
            spec_for(EncoderBackend::MediaCodec).codec_name,
            "h264_mediacodec"
        );
        assert_eq!(spec_for(EncoderBackend::X264).codec_name, "libx264");
    }

    #[test]
    fn hardware_backends_carry_pool_formats() {
        for backend in EncoderBackend::ALL {
            let spec = spec_for(backend);
            assert_eq!(backend.uses_hw_surfaces(), spec.device_type.is_some());
            assert_eq!(spec.device_type.is_some(), spec.pool_formats.is_some());
        }
    }

    #[test]
    fn only_vaapi_names_a_device_node() {
        assert!(spec_for(EncoderBackend::Vaapi).device_path.is_some());
        assert!(spec_for(EncoderBackend::Nvenc).device_path.is_none());
        assert!(spec_for(EncoderBackend::MediaCodec).device_path.is_none());
    }

    #[test]
    fn mediacodec_disables_b_frames() {
        assert_eq!(spec_for(EncoderBackend::MediaCodec).max_b_frames, 0);
        assert_eq!(spec_for(EncoderBackend::X264).max_b_frames, 1);
    }

    #[test]
    fn input_format_matches_pool_storage() {
        // The conversion stage must produce exactly what the pool stores.
        let vaapi = spec_for(EncoderBackend::Vaapi);
        assert_eq!(vaapi.pool_formats.unwrap().1, Pixel::NV12);
        assert_eq!(vaapi.input_format, PixelFormat::Nv12);

        let mediacodec = spec_for(EncoderBackend::MediaCodec);
        assert_eq!(mediacodec.pool_formats.unwrap().1, Pixel::YUV420P);
        assert_eq!(mediacodec.input_format, PixelFormat::Yuv420p);
    }
}
