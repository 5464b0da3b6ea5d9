/*!
    Hardware device and frame pool contexts.

    ffmpeg-next does not wrap the hwcontext API, so this module drives
    `av_hwdevice_ctx_create` and the hwframe calls through `ffmpeg_next::ffi`
    behind RAII owners. The device buffer is reference counted by FFmpeg:
    the frame pool and the codec context each hold their own reference, and
    the device is freed only when the last one is released.
*/

use std::ptr;

use ffmpeg_next::{ffi, format::Pixel, util::frame::video::Video as VideoFrameFFmpeg};

use stillreel_types::{EncoderBackend, Error, Result};

use crate::backend::spec_for;

fn averror_message(code: i32) -> String {
    ffmpeg_next::Error::from(code).to_string()
}

/**
    An open hardware acceleration device.
*/
pub struct HwDevice {
    buf: *mut ffi::AVBufferRef,
    backend: EncoderBackend,
}

impl HwDevice {
    /**
        Open the hardware device for a backend.

        Fails with [`Error::DeviceUnavailable`] when the platform lacks the
        accelerator or the device node cannot be opened; fatal to session
        setup.
    */
    pub fn create(backend: EncoderBackend) -> Result<Self> {
        let spec = spec_for(backend);
        let device_type = spec.device_type.ok_or_else(|| Error::DeviceUnavailable {
            backend: backend.as_str(),
            reason: "software backend has no hardware device".into(),
        })?;

        let mut buf: *mut ffi::AVBufferRef = ptr::null_mut();
        let ret = unsafe {
            ffi::av_hwdevice_ctx_create(
                &mut buf,
                device_type,
                spec.device_path.map_or(ptr::null(), |p| p.as_ptr()),
                ptr::null_mut(),
                0,
            )
        };
        if ret < 0 {
            return Err(Error::DeviceUnavailable {
                backend: backend.as_str(),
                reason: averror_message(ret),
            });
        }

        tracing::debug!(backend = backend.as_str(), "created hardware device context");

        Ok(Self { buf, backend })
    }

    pub fn backend(&self) -> EncoderBackend {
        self.backend
    }

    pub(crate) fn as_ptr(&self) -> *mut ffi::AVBufferRef {
        self.buf
    }

    /**
        Hand out a new owned reference to the device buffer. The caller is
        responsible for releasing it (or handing it to a structure that
        does, such as a codec context).
    */
    pub(crate) fn create_ref(&self) -> *mut ffi::AVBufferRef {
        unsafe { ffi::av_buffer_ref(self.buf) }
    }
}

impl Drop for HwDevice {
    fn drop(&mut self) {
        unsafe {
            ffi::av_buffer_unref(&mut self.buf);
        }
    }
}

// The buffer is owned exclusively; FFmpeg refcounts its payload.
unsafe impl Send for HwDevice {}

impl std::fmt::Debug for HwDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HwDevice")
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}

/**
    A pool of hardware surfaces sized to the output resolution.

    The pool's format pair — the surface format and the underlying storage
    format — comes from the backend table and stays fixed for the session.
*/
pub struct HwFramePool {
    buf: *mut ffi::AVBufferRef,
    surface_format: Pixel,
    width: u32,
    height: u32,
}

impl HwFramePool {
    /**
        Allocate and initialize the surface pool on a device.

        Fails with [`Error::FramePoolInit`]; fatal to session setup.
    */
    pub fn create(
        device: &HwDevice,
        backend: EncoderBackend,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let spec = spec_for(backend);
        let (surface_format, storage_format) = spec
            .pool_formats
            .ok_or_else(|| Error::FramePoolInit("software backend has no frame pool".into()))?;

        let mut buf = unsafe { ffi::av_hwframe_ctx_alloc(device.as_ptr()) };
        if buf.is_null() {
            return Err(Error::FramePoolInit(
                "failed to allocate hardware frame context".into(),
            ));
        }

        unsafe {
            let frames = (*buf).data as *mut ffi::AVHWFramesContext;
            (*frames).format = surface_format.into();
            (*frames).sw_format = storage_format.into();
            (*frames).width = width as i32;
            (*frames).height = height as i32;

            let ret = ffi::av_hwframe_ctx_init(buf);
            if ret < 0 {
                ffi::av_buffer_unref(&mut buf);
                return Err(Error::FramePoolInit(averror_message(ret)));
            }
        }

        tracing::debug!(
            backend = backend.as_str(),
            width,
            height,
            ?surface_format,
            ?storage_format,
            "initialized hardware frame pool"
        );

        Ok(Self {
            buf,
            surface_format,
            width,
            height,
        })
    }

    pub(crate) fn as_ptr(&self) -> *mut ffi::AVBufferRef {
        self.buf
    }

    /**
        Draw an empty surface from the pool.

        Fails with [`Error::FramePoolExhausted`]; per-frame, the run continues.
    */
    pub fn allocate(&self) -> Result<VideoFrameFFmpeg> {
        let mut frame = VideoFrameFFmpeg::empty();
        unsafe {
            let ptr = frame.as_mut_ptr();
            (*ptr).format = ffi::AVPixelFormat::from(self.surface_format) as i32;
            (*ptr).width = self.width as i32;
            (*ptr).height = self.height as i32;

            let ret = ffi::av_hwframe_get_buffer(self.buf, ptr, 0);
            if ret < 0 {
                return Err(Error::FramePoolExhausted(averror_message(ret)));
            }
        }
        Ok(frame)
    }
}

impl Drop for HwFramePool {
    fn drop(&mut self) {
        unsafe {
            ffi::av_buffer_unref(&mut self.buf);
        }
    }
}

unsafe impl Send for HwFramePool {}

impl std::fmt::Debug for HwFramePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HwFramePool")
            .field("surface_format", &self.surface_format)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

/**
    Transfer pixel data from a software frame into a pool surface.

    Fails with [`Error::Transfer`]; per-frame.
*/
pub(crate) fn transfer_to_hw(dst: &mut VideoFrameFFmpeg, src: &VideoFrameFFmpeg) -> Result<()> {
    let ret = unsafe { ffi::av_hwframe_transfer_data(dst.as_mut_ptr(), src.as_ptr(), 0) };
    if ret < 0 {
        return Err(Error::Transfer(averror_message(ret)));
    }
    Ok(())
}
