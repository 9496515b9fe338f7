//! Core traits and types shared by the camera module, its devices and their streams.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

use crate::stream::ReuseMismatch;
use crate::usage::Usage;
use crate::validation::StreamSetError;

/// Pixel format representation (e.g., YUYV, NV21, MJPG).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    /// Create a new `FourCC` from a 4-byte array.
    #[must_use]
    pub const fn new(code: &[u8; 4]) -> Self {
        Self(*code)
    }

    /// YUYV pixel format (4:2:2 packed).
    pub const YUYV: Self = Self::new(b"YUYV");
    /// NV21 pixel format (4:2:0 semi-planar, the usual preview format).
    pub const NV21: Self = Self::new(b"NV21");
    /// MJPEG pixel format (Motion JPEG).
    pub const MJPG: Self = Self::new(b"MJPG");
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{}", char::from(byte))?;
        }
        Ok(())
    }
}

/// Direction of data flow through a stream, seen from the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamType {
    /// The camera fills buffers for the framework.
    Output,
    /// The camera consumes buffers supplied by the framework (reprocessing).
    Input,
    /// Both directions on the same stream.
    Bidirectional,
}

impl StreamType {
    /// Whether the camera reads from this stream.
    #[must_use]
    pub const fn is_input(self) -> bool {
        matches!(self, Self::Input | Self::Bidirectional)
    }

    /// Whether the camera writes to this stream.
    #[must_use]
    pub const fn is_output(self) -> bool {
        matches!(self, Self::Output | Self::Bidirectional)
    }
}

/// Opaque handle the framework uses to address a configured stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamHandle(u64);

static NEXT_STREAM_HANDLE: AtomicU64 = AtomicU64::new(1);

impl StreamHandle {
    /// Allocate a handle that no other stream in this process has used.
    pub(crate) fn next() -> Self {
        Self(NEXT_STREAM_HANDLE.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw handle value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for StreamHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stream#{}", self.0)
    }
}

/// Framework-side description of one stream in a configuration.
///
/// The framework fills in the first four fields. `usage`, `max_buffers` and
/// `handle` are written back by the camera when a configuration commits; a
/// descriptor handed back with `max_buffers > 0` asks the camera to reuse the
/// stream behind `handle` instead of creating a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDescriptor {
    /// Direction of the stream.
    pub stream_type: StreamType,
    /// Buffer width in pixels.
    pub width: u32,
    /// Buffer height in pixels.
    pub height: u32,
    /// Pixel format.
    pub format: FourCC,
    /// Buffer usage required by the camera.
    pub usage: Usage,
    /// Maximum buffers the camera keeps in flight. Zero for a fresh stream.
    pub max_buffers: u32,
    /// Backing stream, once configured.
    pub handle: Option<StreamHandle>,
}

impl StreamDescriptor {
    /// Describe a fresh stream.
    #[must_use]
    pub const fn new(stream_type: StreamType, width: u32, height: u32, format: FourCC) -> Self {
        Self {
            stream_type,
            width,
            height,
            format,
            usage: Usage::empty(),
            max_buffers: 0,
            handle: None,
        }
    }

    /// Whether this descriptor refers to a stream from an earlier configuration.
    #[must_use]
    pub const fn signals_reuse(&self) -> bool {
        self.max_buffers > 0
    }
}

/// Opaque graphics buffer handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u64);

/// Buffers the framework registers against one stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferSet {
    /// Stream the buffers belong to.
    pub stream: Option<StreamHandle>,
    /// The buffers.
    pub buffers: Vec<BufferHandle>,
}

/// One buffer attached to a capture request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamBuffer {
    /// Stream the buffer belongs to.
    pub stream: StreamHandle,
    /// The buffer.
    pub buffer: BufferHandle,
}

/// A single capture request from the framework.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureRequest {
    /// Monotonic frame number assigned by the framework.
    pub frame_number: u32,
    /// Reprocessing input, if any.
    pub input_buffer: Option<StreamBuffer>,
    /// Buffers to fill.
    pub output_buffers: Vec<StreamBuffer>,
}

/// Use case a default request is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestTemplate {
    /// Viewfinder preview.
    Preview,
    /// High quality still capture.
    StillCapture,
    /// Stable frame rate recording.
    VideoRecord,
    /// Still capture while recording.
    VideoSnapshot,
    /// Zero-shutter-lag capture.
    ZeroShutterLag,
}

impl RequestTemplate {
    /// Decode the framework's numeric template id.
    #[must_use]
    pub const fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            1 => Some(Self::Preview),
            2 => Some(Self::StillCapture),
            3 => Some(Self::VideoRecord),
            4 => Some(Self::VideoSnapshot),
            5 => Some(Self::ZeroShutterLag),
            _ => None,
        }
    }
}

/// Default capture settings for a template.
///
/// Not built yet: default request settings are always reported as unavailable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSettings {
    /// Template the settings were built for.
    pub template: RequestTemplate,
}

/// Vendor tag query table filled in by the camera.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VendorTagOps {
    /// Names of the vendor tag sections the camera defines.
    pub sections: Vec<String>,
}

/// Identity of the camera module that opened a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    /// Human readable module name.
    pub name: String,
    /// Module author.
    pub author: String,
}

/// Callbacks the framework registers with an open device.
pub trait CallbackOps: Send + Sync {
    /// Deliver finished buffers for a request.
    fn process_capture_result(&self, frame_number: u32, buffers: &[StreamBuffer]);

    /// Report the start of exposure for a request.
    fn notify_shutter(&self, frame_number: u32, timestamp_ns: u64);
}

/// Identity reported by an image sensor's driver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SensorCapabilities {
    /// Driver name.
    pub driver: String,
    /// Card/device name.
    pub card: String,
    /// Bus information.
    pub bus_info: String,
    /// Whether the device can capture video.
    pub can_capture: bool,
    /// Whether the device supports streaming.
    pub can_stream: bool,
}

/// Hardware behind a camera device.
pub trait Sensor: Send {
    /// Acquire the hardware. Called once per device open.
    fn open(&mut self) -> Result<()>;

    /// Release the hardware. Called once per device close.
    fn close(&mut self);

    /// Driver identity, available while open.
    fn capabilities(&self) -> Option<&SensorCapabilities>;
}

/// Error type for camera operations.
#[derive(Debug, Error)]
pub enum CameraError {
    /// The device is already held by another session.
    #[error("camera device already open")]
    AlreadyOpen,
    /// The device has not been opened.
    #[error("camera device not open")]
    NotOpen,
    /// No stream configuration was supplied.
    #[error("missing stream configuration")]
    MissingConfiguration,
    /// The stream configuration contains no streams.
    #[error("empty stream configuration")]
    EmptyConfiguration,
    /// A descriptor asked for reuse without naming a stream.
    #[error("stream {0} asks for reuse but carries no stream handle")]
    MissingStreamHandle(usize),
    /// A handle does not name a stream of this device.
    #[error("{0} is not configured on this camera")]
    UnknownStream(StreamHandle),
    /// A reused stream no longer matches its descriptor.
    #[error("stream {index} cannot be reused")]
    ReuseMismatch {
        /// Position of the offending descriptor.
        index: usize,
        /// Field that differs.
        #[source]
        reason: ReuseMismatch,
    },
    /// Two descriptors in one configuration name the same stream.
    #[error("{0} is reused more than once in one configuration")]
    DuplicateReuse(StreamHandle),
    /// The stream set as a whole cannot be supported.
    #[error("invalid stream set")]
    InvalidStreamSet(#[from] StreamSetError),
    /// No buffer set was supplied.
    #[error("missing buffer set")]
    MissingBufferSet,
    /// A buffer set names no stream.
    #[error("buffer set carries no stream handle")]
    MissingBufferStream,
    /// A buffer set was handed to a stream it does not belong to.
    #[error("buffer set for {actual:?} handed to {expected}")]
    BufferStreamMismatch {
        /// Stream receiving the buffers.
        expected: StreamHandle,
        /// Stream named by the buffer set.
        actual: Option<StreamHandle>,
    },
    /// No capture request was supplied.
    #[error("missing capture request")]
    MissingRequest,
    /// A camera id does not name a camera of this module.
    #[error("invalid camera id {0:?}")]
    InvalidCameraId(String),
    /// The sensor behind the device could not be acquired.
    #[error("failed to open sensor: {0}")]
    SensorOpenFailed(String),
    /// The module configuration is malformed.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CameraError {
    /// POSIX error number reported to the framework for this error.
    #[must_use]
    pub const fn errno(&self) -> i32 {
        match self {
            Self::AlreadyOpen => libc::EBUSY,
            Self::SensorOpenFailed(_) => libc::ENODEV,
            Self::Io(_) => libc::EIO,
            Self::NotOpen
            | Self::MissingConfiguration
            | Self::EmptyConfiguration
            | Self::MissingStreamHandle(_)
            | Self::UnknownStream(_)
            | Self::ReuseMismatch { .. }
            | Self::DuplicateReuse(_)
            | Self::InvalidStreamSet(_)
            | Self::MissingBufferSet
            | Self::MissingBufferStream
            | Self::BufferStreamMismatch { .. }
            | Self::MissingRequest
            | Self::InvalidCameraId(_)
            | Self::Config(_) => libc::EINVAL,
        }
    }

    /// Negative status code as returned through the device-operations table.
    #[must_use]
    pub const fn status(&self) -> i32 {
        -self.errno()
    }
}

/// Result type for camera operations.
pub type Result<T> = std::result::Result<T, CameraError>;
