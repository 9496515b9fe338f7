//! Test doubles for running cameras without hardware.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::traits::{CallbackOps, CameraError, Result, Sensor, SensorCapabilities, StreamBuffer};

/// Open/close counters shared between a [`MockSensor`] and the test that owns it.
#[derive(Debug, Clone, Default)]
pub struct SensorProbe {
    opens: Arc<AtomicU32>,
    closes: Arc<AtomicU32>,
}

impl SensorProbe {
    /// Number of successful opens.
    pub fn opens(&self) -> u32 {
        self.opens.load(Ordering::SeqCst)
    }

    /// Number of closes.
    pub fn closes(&self) -> u32 {
        self.closes.load(Ordering::SeqCst)
    }
}

/// Mock sensor for testing without hardware.
#[derive(Debug)]
pub struct MockSensor {
    capabilities: SensorCapabilities,
    open: bool,
    fail_open: bool,
    probe: SensorProbe,
}

impl Default for MockSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSensor {
    /// Create a mock sensor that opens successfully.
    #[must_use]
    pub fn new() -> Self {
        Self {
            capabilities: SensorCapabilities {
                driver: "mock".to_owned(),
                card: "Mock Camera".to_owned(),
                bus_info: "mock:0".to_owned(),
                can_capture: true,
                can_stream: true,
            },
            open: false,
            fail_open: false,
            probe: SensorProbe::default(),
        }
    }

    /// Create a mock sensor whose open always fails.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_open: true,
            ..Self::new()
        }
    }

    /// Set the capabilities reported while open.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: SensorCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Counters that stay readable after the sensor is handed to a camera.
    pub fn probe(&self) -> SensorProbe {
        self.probe.clone()
    }
}

impl Sensor for MockSensor {
    fn open(&mut self) -> Result<()> {
        if self.fail_open {
            return Err(CameraError::SensorOpenFailed(
                "mock sensor unavailable".to_owned(),
            ));
        }
        self.open = true;
        self.probe.opens.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
        self.probe.closes.fetch_add(1, Ordering::SeqCst);
    }

    fn capabilities(&self) -> Option<&SensorCapabilities> {
        self.open.then_some(&self.capabilities)
    }
}

/// Callbacks that record what the camera reports.
#[derive(Debug, Default)]
pub struct MockCallbacks {
    results: Mutex<Vec<u32>>,
    shutters: Mutex<Vec<(u32, u64)>>,
}

impl MockCallbacks {
    /// Frame numbers delivered through `process_capture_result`.
    pub fn results(&self) -> Vec<u32> {
        self.results.lock().clone()
    }

    /// Shutter notifications received.
    pub fn shutters(&self) -> Vec<(u32, u64)> {
        self.shutters.lock().clone()
    }
}

impl CallbackOps for MockCallbacks {
    fn process_capture_result(&self, frame_number: u32, _buffers: &[StreamBuffer]) {
        self.results.lock().push(frame_number);
    }

    fn notify_shutter(&self, frame_number: u32, timestamp_ns: u64) {
        self.shutters.lock().push((frame_number, timestamp_ns));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_sensor_open_close() {
        let mut sensor = MockSensor::new();
        let probe = sensor.probe();
        assert!(sensor.capabilities().is_none());

        sensor.open().expect("open should succeed");
        assert_eq!(
            sensor.capabilities().map(|caps| caps.driver.as_str()),
            Some("mock")
        );
        assert_eq!(probe.opens(), 1);

        sensor.close();
        assert!(sensor.capabilities().is_none());
        assert_eq!(probe.closes(), 1);
    }

    #[test]
    fn test_failing_sensor() {
        let mut sensor = MockSensor::failing();
        assert!(matches!(
            sensor.open(),
            Err(CameraError::SensorOpenFailed(_))
        ));
        assert_eq!(sensor.probe().opens(), 0);
    }

    #[test]
    fn test_callbacks_record() {
        let callbacks = MockCallbacks::default();
        callbacks.process_capture_result(4, &[]);
        callbacks.notify_shutter(4, 1_000);
        assert_eq!(callbacks.results(), vec![4]);
        assert_eq!(callbacks.shutters(), vec![(4, 1_000)]);
    }
}
