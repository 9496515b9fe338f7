//! V4L2 sensor implementation using the v4l crate.

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use v4l::capability::Flags;
use v4l::Device;

use crate::traits::{CameraError, Result, Sensor, SensorCapabilities};

/// Sensor backed by a V4L2 device node such as `/dev/video0`.
///
/// The node is opened when the camera is opened and released when it is
/// closed; constructing the sensor does not touch the device.
pub struct V4L2Sensor {
    path: PathBuf,
    device: Option<Device>,
    capabilities: Option<SensorCapabilities>,
}

impl V4L2Sensor {
    /// Sensor for the node at `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            device: None,
            capabilities: None,
        }
    }

    /// Sensor for `/dev/video{index}`.
    #[must_use]
    pub fn from_index(index: u32) -> Self {
        Self::new(format!("/dev/video{index}"))
    }

    /// Path of the device node.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Sensor for V4L2Sensor {
    fn open(&mut self) -> Result<()> {
        let device = Device::with_path(&self.path).map_err(|err| {
            CameraError::SensorOpenFailed(format!("{}: {err}", self.path.display()))
        })?;

        let caps = device.query_caps().map_err(|err| {
            CameraError::SensorOpenFailed(format!("{}: {err}", self.path.display()))
        })?;

        let capabilities = SensorCapabilities {
            driver: caps.driver,
            card: caps.card,
            bus_info: caps.bus,
            can_capture: caps.capabilities.contains(Flags::VIDEO_CAPTURE),
            can_stream: caps.capabilities.contains(Flags::STREAMING),
        };

        if !capabilities.can_capture {
            return Err(CameraError::SensorOpenFailed(format!(
                "{} is not a video capture device",
                self.path.display()
            )));
        }

        info!(
            path = %self.path.display(),
            driver = %capabilities.driver,
            card = %capabilities.card,
            "opened sensor"
        );
        self.device = Some(device);
        self.capabilities = Some(capabilities);
        Ok(())
    }

    fn close(&mut self) {
        debug!(path = %self.path.display(), "closing sensor");
        self.device = None;
        self.capabilities = None;
    }

    fn capabilities(&self) -> Option<&SensorCapabilities> {
        self.capabilities.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_index_path() {
        let sensor = V4L2Sensor::from_index(3);
        assert_eq!(sensor.path(), Path::new("/dev/video3"));
        assert!(sensor.capabilities().is_none());
    }

    #[test]
    fn test_missing_node_fails_to_open() {
        let mut sensor = V4L2Sensor::new("/nonexistent/video0");
        let result = sensor.open();
        assert!(matches!(result, Err(CameraError::SensorOpenFailed(_))));
        assert!(sensor.capabilities().is_none());
    }
}
