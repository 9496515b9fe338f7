//! The camera module: the set of cameras a process exposes to the framework.

use std::sync::Arc;

use tracing::{error, info};

use crate::camera::Camera;
use crate::config::{CameraConfig, Facing, HalConfig};
use crate::device::V4L2Sensor;
use crate::ops::DeviceHandle;
use crate::traits::{CameraError, ModuleInfo, Result, Sensor};

/// Device API version reported for every camera (3.0).
pub const DEVICE_API_VERSION: u32 = 0x0300;

/// Static description of one camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraInfo {
    /// Direction the camera faces.
    pub facing: Facing,
    /// Clockwise sensor rotation in degrees.
    pub orientation: u32,
    /// Device API version.
    pub device_version: u32,
}

impl From<&CameraConfig> for CameraInfo {
    fn from(config: &CameraConfig) -> Self {
        Self {
            facing: config.facing,
            orientation: config.orientation,
            device_version: DEVICE_API_VERSION,
        }
    }
}

/// Camera module owning every configured camera.
pub struct CameraHal {
    module: Arc<ModuleInfo>,
    cameras: Vec<(CameraInfo, Arc<Camera>)>,
}

impl CameraHal {
    /// Build the module, attaching a V4L2 sensor to each camera that names a device node.
    #[must_use]
    pub fn new(config: &HalConfig) -> Self {
        Self::with_sensor_factory(config, |camera| {
            camera
                .device
                .as_ref()
                .map(|path| Box::new(V4L2Sensor::new(path)) as Box<dyn Sensor>)
        })
    }

    /// Build the module, asking `factory` for the sensor behind each camera.
    pub fn with_sensor_factory<F>(config: &HalConfig, mut factory: F) -> Self
    where
        F: FnMut(&CameraConfig) -> Option<Box<dyn Sensor>>,
    {
        let module = Arc::new(ModuleInfo {
            name: "Pi Camera HAL".to_owned(),
            author: env!("CARGO_PKG_NAME").to_owned(),
        });

        let cameras = (0u32..)
            .zip(&config.cameras)
            .map(|(id, camera_config)| {
                let camera = match factory(camera_config) {
                    Some(sensor) => Camera::with_sensor(id, sensor),
                    None => Camera::new(id),
                };
                (CameraInfo::from(camera_config), Arc::new(camera))
            })
            .collect::<Vec<_>>();

        info!(count = cameras.len(), "camera module ready");
        Self { module, cameras }
    }

    /// Identity passed to every opened device.
    pub fn module_info(&self) -> &ModuleInfo {
        &self.module
    }

    /// Number of cameras the module exposes.
    pub fn number_of_cameras(&self) -> usize {
        self.cameras.len()
    }

    /// Static description of camera `id`.
    pub fn camera_info(&self, id: u32) -> Result<CameraInfo> {
        self.entry(id).map(|(info, _)| *info)
    }

    /// Camera `id`, open or not.
    pub fn camera(&self, id: u32) -> Result<Arc<Camera>> {
        self.entry(id).map(|(_, camera)| Arc::clone(camera))
    }

    /// Open the camera named by the decimal id string `name`.
    pub fn open_device(&self, name: &str) -> Result<DeviceHandle> {
        let id = name.trim().parse::<u32>().map_err(|_| {
            error!(camera_name = name, "invalid camera id");
            CameraError::InvalidCameraId(name.to_owned())
        })?;

        let camera = self.camera(id)?;
        camera.open(Arc::clone(&self.module))?;
        Ok(DeviceHandle::new(camera))
    }

    fn entry(&self, id: u32) -> Result<&(CameraInfo, Arc<Camera>)> {
        usize::try_from(id)
            .ok()
            .and_then(|index| self.cameras.get(index))
            .ok_or_else(|| {
                error!(camera = id, count = self.cameras.len(), "camera id out of range");
                CameraError::InvalidCameraId(id.to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockSensor;
    use crate::ops::DeviceOps;

    fn two_cameras() -> HalConfig {
        HalConfig::from_toml(
            r#"
            [[camera]]
            facing = "back"
            orientation = 90

            [[camera]]
            facing = "front"
            orientation = 270
            "#,
        )
        .expect("config should parse")
    }

    #[test]
    fn test_camera_info() {
        let hal = CameraHal::new(&two_cameras());
        assert_eq!(hal.number_of_cameras(), 2);

        let info = hal.camera_info(0).expect("camera 0 exists");
        assert_eq!(info.facing, Facing::Back);
        assert_eq!(info.orientation, 90);
        assert_eq!(info.device_version, DEVICE_API_VERSION);

        let info = hal.camera_info(1).expect("camera 1 exists");
        assert_eq!(info.facing, Facing::Front);

        assert!(matches!(
            hal.camera_info(2),
            Err(CameraError::InvalidCameraId(_))
        ));
    }

    #[test]
    fn test_open_device_by_name() {
        let hal = CameraHal::new(&two_cameras());
        let handle = hal.open_device("1").expect("open should succeed");
        assert_eq!(handle.camera().id(), 1);
        assert!(handle.camera().is_open());
        assert_eq!(
            handle.camera().module().map(|m| m.name.clone()),
            Some(hal.module_info().name.clone())
        );

        let err = hal.open_device("1").err().expect("second open should fail");
        assert_eq!(err.status(), -libc::EBUSY);

        assert_eq!(handle.close(), 0);
        assert!(hal.open_device("1").is_ok());
    }

    #[test]
    fn test_open_device_rejects_bad_names() {
        let hal = CameraHal::new(&two_cameras());
        for name in ["", "cam0", "-1", "2"] {
            let err = hal.open_device(name).err().expect("open should fail");
            assert_eq!(err.status(), -libc::EINVAL, "name {name:?}");
        }
    }

    #[test]
    fn test_sensor_factory() {
        let sensor = MockSensor::new();
        let probe = sensor.probe();
        let mut slot = Some(sensor);
        let hal = CameraHal::with_sensor_factory(&HalConfig::default(), |_| {
            slot.take().map(|s| Box::new(s) as Box<dyn Sensor>)
        });

        let handle = hal.open_device("0").expect("open should succeed");
        assert_eq!(probe.opens(), 1);
        assert_eq!(handle.close(), 0);
        assert_eq!(probe.closes(), 1);
    }

    #[test]
    fn test_cameras_are_independent() {
        let hal = CameraHal::new(&two_cameras());
        let first = hal.open_device("0").expect("open camera 0");
        let second = hal.open_device("1").expect("open camera 1");

        let mut streams = vec![crate::traits::StreamDescriptor::new(
            crate::traits::StreamType::Output,
            640,
            480,
            crate::traits::FourCC::NV21,
        )];
        assert_eq!(first.configure_streams(Some(streams.as_mut_slice())), 0);
        assert_eq!(first.camera().streams().len(), 1);
        assert!(second.camera().streams().is_empty());
    }
}
