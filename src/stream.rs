//! Configured streams.
//!
//! A [`Stream`] is created the first time a descriptor is configured and
//! carried forward, by handle, through every later configuration that asks
//! to reuse it.

use thiserror::Error;
use tracing::{debug, error, trace};

use crate::traits::{
    BufferHandle, BufferSet, CameraError, FourCC, Result, StreamDescriptor, StreamHandle,
    StreamType,
};
use crate::usage::Usage;

/// Why a descriptor cannot reuse an existing stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReuseMismatch {
    /// The stream belongs to another camera.
    #[error("stream belongs to camera {expected}, not camera {actual}")]
    Camera {
        /// Owner of the stream.
        expected: u32,
        /// Camera asked to reuse it.
        actual: u32,
    },
    /// The descriptor names a different stream.
    #[error("descriptor names {actual:?}, stream is {expected}")]
    Handle {
        /// Handle of the stream.
        expected: StreamHandle,
        /// Handle carried by the descriptor.
        actual: Option<StreamHandle>,
    },
    /// Stream direction changed.
    #[error("stream type changed from {expected:?} to {actual:?}")]
    Type {
        /// Recorded direction.
        expected: StreamType,
        /// Requested direction.
        actual: StreamType,
    },
    /// Pixel format changed.
    #[error("format changed from {expected} to {actual}")]
    Format {
        /// Recorded format.
        expected: FourCC,
        /// Requested format.
        actual: FourCC,
    },
    /// Buffer dimensions changed.
    #[error("size changed from {expected:?} to {actual:?}")]
    Size {
        /// Recorded width and height.
        expected: (u32, u32),
        /// Requested width and height.
        actual: (u32, u32),
    },
}

/// Snapshot of a committed stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    /// Stream handle.
    pub handle: StreamHandle,
    /// Direction.
    pub stream_type: StreamType,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel format.
    pub format: FourCC,
    /// Assigned usage.
    pub usage: Usage,
    /// Assigned in-flight buffer limit.
    pub max_buffers: u32,
    /// Number of registered buffers.
    pub registered_buffers: usize,
}

/// One data pipe between the framework and the camera.
#[derive(Debug)]
pub struct Stream {
    camera_id: u32,
    handle: StreamHandle,
    stream_type: StreamType,
    width: u32,
    height: u32,
    format: FourCC,
    reuse: bool,
    usage: Usage,
    max_buffers: u32,
    buffers: Vec<BufferHandle>,
}

impl Stream {
    /// Create a stream for `descriptor`, owned by camera `camera_id`.
    #[must_use]
    pub fn new(camera_id: u32, descriptor: &StreamDescriptor) -> Self {
        let stream = Self {
            camera_id,
            handle: StreamHandle::next(),
            stream_type: descriptor.stream_type,
            width: descriptor.width,
            height: descriptor.height,
            format: descriptor.format,
            reuse: false,
            usage: Usage::empty(),
            max_buffers: 0,
            buffers: Vec::new(),
        };
        debug!(
            camera = camera_id,
            stream = %stream.handle,
            kind = ?stream.stream_type,
            width = stream.width,
            height = stream.height,
            format = %stream.format,
            "created stream"
        );
        stream
    }

    /// Handle the framework addresses this stream by.
    pub const fn handle(&self) -> StreamHandle {
        self.handle
    }

    /// Camera that owns this stream.
    pub const fn camera_id(&self) -> u32 {
        self.camera_id
    }

    /// Direction of the stream.
    pub const fn stream_type(&self) -> StreamType {
        self.stream_type
    }

    /// Whether the camera reads from this stream.
    pub const fn is_input_type(&self) -> bool {
        self.stream_type.is_input()
    }

    /// Whether the camera writes to this stream.
    pub const fn is_output_type(&self) -> bool {
        self.stream_type.is_output()
    }

    /// Assigned buffer usage.
    pub const fn usage(&self) -> Usage {
        self.usage
    }

    /// Assign buffer usage.
    pub fn set_usage(&mut self, usage: Usage) {
        self.usage = usage;
    }

    /// Assigned in-flight buffer limit.
    pub const fn max_buffers(&self) -> u32 {
        self.max_buffers
    }

    /// Assign the in-flight buffer limit.
    pub fn set_max_buffers(&mut self, max_buffers: u32) {
        self.max_buffers = max_buffers;
    }

    /// Whether the current configuration carries this stream forward.
    pub const fn is_reused(&self) -> bool {
        self.reuse
    }

    pub(crate) fn set_reuse(&mut self, reuse: bool) {
        self.reuse = reuse;
    }

    /// Registered buffers.
    pub fn buffers(&self) -> &[BufferHandle] {
        &self.buffers
    }

    /// Check that `descriptor` still describes this stream, as seen from camera `camera_id`.
    ///
    /// The camera and handle checks only fire for callers that hold a stream
    /// directly; a camera looks streams up by handle within its own set.
    pub fn check_reuse(
        &self,
        camera_id: u32,
        descriptor: &StreamDescriptor,
    ) -> std::result::Result<(), ReuseMismatch> {
        if camera_id != self.camera_id {
            return Err(ReuseMismatch::Camera {
                expected: self.camera_id,
                actual: camera_id,
            });
        }
        if descriptor.handle != Some(self.handle) {
            return Err(ReuseMismatch::Handle {
                expected: self.handle,
                actual: descriptor.handle,
            });
        }
        if descriptor.stream_type != self.stream_type {
            return Err(ReuseMismatch::Type {
                expected: self.stream_type,
                actual: descriptor.stream_type,
            });
        }
        if descriptor.format != self.format {
            return Err(ReuseMismatch::Format {
                expected: self.format,
                actual: descriptor.format,
            });
        }
        if (descriptor.width, descriptor.height) != (self.width, self.height) {
            return Err(ReuseMismatch::Size {
                expected: (self.width, self.height),
                actual: (descriptor.width, descriptor.height),
            });
        }
        Ok(())
    }

    /// Boolean form of [`Stream::check_reuse`].
    pub fn is_valid_reuse_stream(&self, camera_id: u32, descriptor: &StreamDescriptor) -> bool {
        self.check_reuse(camera_id, descriptor).is_ok()
    }

    /// Replace the registered buffers with those in `buffer_set`.
    pub fn register_buffers(&mut self, buffer_set: &BufferSet) -> Result<()> {
        if buffer_set.stream != Some(self.handle) {
            error!(
                camera = self.camera_id,
                stream = %self.handle,
                "buffer set addresses a different stream"
            );
            return Err(CameraError::BufferStreamMismatch {
                expected: self.handle,
                actual: buffer_set.stream,
            });
        }

        self.buffers.clone_from(&buffer_set.buffers);
        debug!(
            camera = self.camera_id,
            stream = %self.handle,
            count = self.buffers.len(),
            "registered buffers"
        );
        Ok(())
    }

    /// Snapshot of this stream.
    pub fn info(&self) -> StreamInfo {
        StreamInfo {
            handle: self.handle,
            stream_type: self.stream_type,
            width: self.width,
            height: self.height,
            format: self.format,
            usage: self.usage,
            max_buffers: self.max_buffers,
            registered_buffers: self.buffers.len(),
        }
    }
}

impl Drop for Stream {
    fn drop(&mut self) {
        trace!(camera = self.camera_id, stream = %self.handle, "destroyed stream");
    }
}
