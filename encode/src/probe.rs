/*!
    Hardware capability probe.

    Answers one question per session: how many simultaneous reference frames
    can the selected hardware sustain at the configured resolution? FFmpeg
    exposes no portable reference-frame query, so the probe verifies the
    device is functional (its hwframe constraints resolve and the session
    resolution lies within them) and derives the count from the H.264
    level-3.2 decoded-picture-buffer budget — the level this pipeline pins.

    Any failure degrades to `None` and callers fall back to single-reference
    mode; the probe is never fatal.
*/

use std::ptr;

use ffmpeg_next::ffi;

use crate::hw::HwDevice;

/// H.264 level the sessions are configured with (level 3.2).
pub(crate) const H264_LEVEL: i32 = 32;

/// MaxDpbMbs for level 3.2, from the H.264 level table.
const MAX_DPB_MBS: u32 = 20_480;

/**
    Probe how many reference frames the device supports at this resolution.

    Returns `None` when probing is not meaningful or anything fails.
*/
pub fn probe_ref_frames(device: &HwDevice, width: u32, height: u32) -> Option<u32> {
    unsafe {
        let mut constraints =
            ffi::av_hwdevice_get_hwframe_constraints(device.as_ptr(), ptr::null());
        if constraints.is_null() {
            tracing::debug!(
                backend = device.backend().as_str(),
                "device reports no frame constraints; assuming single reference frame"
            );
            return None;
        }

        let c = &*constraints;
        let fits = width as i32 >= c.min_width
            && height as i32 >= c.min_height
            && width as i32 <= c.max_width
            && height as i32 <= c.max_height;
        ffi::av_hwframe_constraints_free(&mut constraints);

        if !fits {
            tracing::debug!(
                backend = device.backend().as_str(),
                width,
                height,
                "resolution outside device constraints"
            );
            return None;
        }
    }

    let refs = dpb_ref_frames(width, height);
    tracing::debug!(
        backend = device.backend().as_str(),
        width,
        height,
        refs,
        "probed reference frame capacity"
    );
    Some(refs)
}

/**
    Reference frames the level-3.2 DPB budget allows at a resolution,
    capped at the H.264 maximum of 16.
*/
pub(crate) fn dpb_ref_frames(width: u32, height: u32) -> u32 {
    let mbs = width.div_ceil(16) * height.div_ceil(16);
    if mbs == 0 {
        return 0;
    }
    (MAX_DPB_MBS / mbs).min(16)
}
