//! The device-operations table handed to the framework.
//!
//! Pointer-like arguments the framework may leave null arrive as `Option`,
//! and results collapse into integer statuses: `0` on success, a negated
//! errno otherwise.

use std::sync::Arc;

use tracing::error;

use crate::camera::Camera;
use crate::traits::{
    BufferSet, CallbackOps, CameraError, CaptureRequest, RequestSettings, Result,
    StreamDescriptor, VendorTagOps,
};

/// Status code for a typed result.
pub fn status_of(result: Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => err.status(),
    }
}

/// Entry points of an open camera device.
pub trait DeviceOps {
    /// Release the device.
    fn close(&self) -> i32;

    /// Register framework callbacks.
    fn initialize(&self, callbacks: Option<Arc<dyn CallbackOps>>) -> i32;

    /// Configure streams, writing handles back into the descriptors.
    fn configure_streams(&self, streams: Option<&mut [StreamDescriptor]>) -> i32;

    /// Register buffers against a configured stream.
    fn register_stream_buffers(&self, buffer_set: Option<&BufferSet>) -> i32;

    /// Default settings for a request template.
    fn construct_default_request_settings(&self, template: i32) -> Option<RequestSettings>;

    /// Submit a capture request.
    fn process_capture_request(&self, request: Option<&CaptureRequest>) -> i32;

    /// Fill in vendor tag query operations.
    fn get_metadata_vendor_tag_ops(&self, ops: Option<&mut VendorTagOps>);

    /// Dump diagnostic state.
    fn dump(&self, fd: i32);
}

/// Handle to an open camera, as given to the framework.
#[derive(Clone)]
pub struct DeviceHandle {
    camera: Arc<Camera>,
}

impl DeviceHandle {
    /// Wrap an open camera.
    pub const fn new(camera: Arc<Camera>) -> Self {
        Self { camera }
    }

    /// The camera behind this handle.
    pub const fn camera(&self) -> &Arc<Camera> {
        &self.camera
    }
}

impl DeviceOps for DeviceHandle {
    fn close(&self) -> i32 {
        status_of(self.camera.close())
    }

    fn initialize(&self, callbacks: Option<Arc<dyn CallbackOps>>) -> i32 {
        self.camera.initialize(callbacks);
        0
    }

    fn configure_streams(&self, streams: Option<&mut [StreamDescriptor]>) -> i32 {
        let Some(streams) = streams else {
            error!(camera = self.camera.id(), "missing stream configuration");
            return CameraError::MissingConfiguration.status();
        };
        status_of(self.camera.configure_streams(streams))
    }

    fn register_stream_buffers(&self, buffer_set: Option<&BufferSet>) -> i32 {
        let Some(buffer_set) = buffer_set else {
            error!(camera = self.camera.id(), "missing buffer set");
            return CameraError::MissingBufferSet.status();
        };
        status_of(self.camera.register_stream_buffers(buffer_set))
    }

    fn construct_default_request_settings(&self, template: i32) -> Option<RequestSettings> {
        self.camera.construct_default_request_settings(template)
    }

    fn process_capture_request(&self, request: Option<&CaptureRequest>) -> i32 {
        let Some(request) = request else {
            error!(camera = self.camera.id(), "missing capture request");
            return CameraError::MissingRequest.status();
        };
        status_of(self.camera.process_capture_request(request))
    }

    fn get_metadata_vendor_tag_ops(&self, ops: Option<&mut VendorTagOps>) {
        if let Some(ops) = ops {
            self.camera.get_metadata_vendor_tag_ops(ops);
        }
    }

    fn dump(&self, fd: i32) {
        self.camera.dump(fd);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockCallbacks;
    use crate::traits::{FourCC, ModuleInfo, StreamType};

    fn open_handle() -> DeviceHandle {
        let camera = Arc::new(Camera::new(0));
        camera
            .open(Arc::new(ModuleInfo {
                name: "ops test".to_owned(),
                author: "tests".to_owned(),
            }))
            .expect("open should succeed");
        DeviceHandle::new(camera)
    }

    #[test]
    fn test_missing_arguments_are_invalid() {
        let handle = open_handle();
        assert_eq!(handle.configure_streams(None), -libc::EINVAL);
        assert_eq!(handle.register_stream_buffers(None), -libc::EINVAL);
        assert_eq!(handle.process_capture_request(None), -libc::EINVAL);
        assert!(handle.camera().streams().is_empty());
    }

    #[test]
    fn test_configure_through_table() {
        let handle = open_handle();
        let mut streams = vec![StreamDescriptor::new(
            StreamType::Output,
            1280,
            720,
            FourCC::NV21,
        )];
        let mut empty: Vec<StreamDescriptor> = Vec::new();
        assert_eq!(
            handle.configure_streams(Some(empty.as_mut_slice())),
            -libc::EINVAL
        );
        assert_eq!(handle.configure_streams(Some(streams.as_mut_slice())), 0);
        assert!(streams.first().and_then(|s| s.handle).is_some());

        let buffers = BufferSet {
            stream: None,
            buffers: Vec::new(),
        };
        assert_eq!(handle.register_stream_buffers(Some(&buffers)), -libc::EINVAL);
    }

    #[test]
    fn test_initialize_and_placeholders() {
        let handle = open_handle();
        let callbacks: Arc<dyn CallbackOps> = Arc::new(MockCallbacks::default());
        assert_eq!(handle.initialize(Some(callbacks)), 0);
        assert!(handle.camera().has_callbacks());
        assert_eq!(handle.initialize(None), 0);
        assert!(!handle.camera().has_callbacks());

        assert!(handle.construct_default_request_settings(1).is_none());
        assert_eq!(
            handle.process_capture_request(Some(&CaptureRequest::default())),
            0
        );
        handle.get_metadata_vendor_tag_ops(None);
        handle.dump(1);
    }

    #[test]
    fn test_close_twice() {
        let handle = open_handle();
        assert_eq!(handle.close(), 0);
        assert_eq!(handle.close(), -libc::EINVAL);
    }
}
