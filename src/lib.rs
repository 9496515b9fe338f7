//! Pi-Cam-HAL: a camera HAL for Raspberry Pi cameras
//!
//! This library adapts camera devices to a framework-owned device-operations
//! table. Its core is the stream configuration transaction: each
//! reconfiguration reuses, creates and destroys streams so the committed
//! stream set is always either fully replaced or left untouched.

pub mod camera;
pub mod config;
pub mod device;
pub mod hal;
pub mod ops;
pub mod setup;
pub mod stream;
pub mod traits;
pub mod usage;
pub mod validation;

#[cfg(test)]
pub mod mock;

pub use camera::Camera;
pub use config::{CameraConfig, Facing, HalConfig};
pub use device::V4L2Sensor;
pub use hal::{CameraHal, CameraInfo};
pub use ops::{DeviceHandle, DeviceOps};
pub use stream::{Stream, StreamInfo};
pub use traits::{
    BufferHandle, BufferSet, CallbackOps, CameraError, CaptureRequest, FourCC, RequestTemplate,
    Result, Sensor, StreamDescriptor, StreamHandle, StreamType,
};
pub use usage::Usage;
