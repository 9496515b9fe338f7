//! Camera devices and their stream configuration transactions.

use std::mem;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, info, trace};

use crate::setup::setup_streams;
use crate::stream::{Stream, StreamInfo};
use crate::traits::{
    BufferSet, CallbackOps, CameraError, CaptureRequest, ModuleInfo, RequestSettings,
    RequestTemplate, Result, Sensor, SensorCapabilities, StreamDescriptor, VendorTagOps,
};
use crate::validation::validate_stream_set;

/// A single camera device.
///
/// Every entry point locks the device, so one `Camera` can be shared between
/// threads as `Arc<Camera>`. Separate cameras share nothing.
pub struct Camera {
    id: u32,
    state: Mutex<CameraState>,
}

struct CameraState {
    busy: bool,
    module: Option<Arc<ModuleInfo>>,
    callbacks: Option<Arc<dyn CallbackOps>>,
    sensor: Option<Box<dyn Sensor>>,
    streams: Vec<Stream>,
}

/// A stream in a configuration that has not committed yet.
enum Candidate {
    Fresh(Stream),
    Reused { slot: usize, stream: Stream },
}

impl Candidate {
    const fn stream(&self) -> &Stream {
        match self {
            Self::Fresh(stream) | Self::Reused { stream, .. } => stream,
        }
    }

    fn stream_mut(&mut self) -> &mut Stream {
        match self {
            Self::Fresh(stream) | Self::Reused { stream, .. } => stream,
        }
    }

    fn into_stream(self) -> Stream {
        match self {
            Self::Fresh(stream) | Self::Reused { stream, .. } => stream,
        }
    }
}

impl Camera {
    /// Create a camera with no sensor attached.
    #[must_use]
    pub fn new(id: u32) -> Self {
        Self::build(id, None)
    }

    /// Create a camera backed by `sensor`.
    #[must_use]
    pub fn with_sensor(id: u32, sensor: Box<dyn Sensor>) -> Self {
        Self::build(id, Some(sensor))
    }

    fn build(id: u32, sensor: Option<Box<dyn Sensor>>) -> Self {
        Self {
            id,
            state: Mutex::new(CameraState {
                busy: false,
                module: None,
                callbacks: None,
                sensor,
                streams: Vec::new(),
            }),
        }
    }

    /// Camera id.
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// Whether a session currently holds the device.
    pub fn is_open(&self) -> bool {
        self.state.lock().busy
    }

    /// Module that opened the device, while open.
    pub fn module(&self) -> Option<Arc<ModuleInfo>> {
        self.state.lock().module.clone()
    }

    /// Whether the framework has registered callbacks.
    pub fn has_callbacks(&self) -> bool {
        self.state.lock().callbacks.is_some()
    }

    /// Driver identity of the attached sensor, while open.
    pub fn sensor_capabilities(&self) -> Option<SensorCapabilities> {
        self.state
            .lock()
            .sensor
            .as_ref()
            .and_then(|sensor| sensor.capabilities().cloned())
    }

    /// Snapshot of the committed stream set, in configuration order.
    pub fn streams(&self) -> Vec<StreamInfo> {
        self.state.lock().streams.iter().map(Stream::info).collect()
    }

    /// Claim the device for a session opened by `module`.
    pub fn open(&self, module: Arc<ModuleInfo>) -> Result<()> {
        info!(camera = self.id, "opening camera device");
        let mut state = self.state.lock();
        if state.busy {
            error!(camera = self.id, "camera device already open");
            return Err(CameraError::AlreadyOpen);
        }

        if let Some(sensor) = state.sensor.as_mut() {
            sensor.open().map_err(|err| {
                error!(camera = self.id, %err, "failed to open sensor");
                err
            })?;
        }

        state.busy = true;
        state.module = Some(module);
        Ok(())
    }

    /// Release the device.
    pub fn close(&self) -> Result<()> {
        info!(camera = self.id, "closing camera device");
        let mut state = self.state.lock();
        if !state.busy {
            error!(camera = self.id, "camera device not open");
            return Err(CameraError::NotOpen);
        }

        if let Some(sensor) = state.sensor.as_mut() {
            sensor.close();
        }

        state.busy = false;
        state.module = None;
        Ok(())
    }

    /// Register the framework's callbacks. `None` clears any earlier registration.
    pub fn initialize(&self, callbacks: Option<Arc<dyn CallbackOps>>) {
        trace!(camera = self.id, registered = callbacks.is_some(), "initialize");
        self.state.lock().callbacks = callbacks;
    }

    /// Replace the committed stream set with the one `descriptors` describes.
    ///
    /// Descriptors with a positive `max_buffers` reuse the stream named by
    /// their handle; all others get a new stream. The whole set is validated
    /// before anything is committed. On failure the committed set is left
    /// exactly as it was and newly created streams are discarded. On success
    /// streams that were not reused are destroyed and every descriptor is
    /// written back with its handle, usage and buffer limit.
    pub fn configure_streams(&self, descriptors: &mut [StreamDescriptor]) -> Result<()> {
        trace!(camera = self.id, count = descriptors.len(), "configure_streams");
        if descriptors.is_empty() {
            error!(camera = self.id, "empty stream configuration");
            return Err(CameraError::EmptyConfiguration);
        }

        let mut state = self.state.lock();
        state.configure(self.id, descriptors)
    }

    /// Hand a set of buffers to the stream it names.
    pub fn register_stream_buffers(&self, buffer_set: &BufferSet) -> Result<()> {
        trace!(camera = self.id, "register_stream_buffers");
        let Some(handle) = buffer_set.stream else {
            error!(camera = self.id, "buffer set without stream handle");
            return Err(CameraError::MissingBufferStream);
        };

        let mut state = self.state.lock();
        let Some(stream) = state.streams.iter_mut().find(|s| s.handle() == handle) else {
            error!(camera = self.id, stream = %handle, "buffer set for unknown stream");
            return Err(CameraError::UnknownStream(handle));
        };
        stream.register_buffers(buffer_set)
    }

    /// Default capture settings for a framework template id.
    ///
    /// No templates are built yet, so this always returns `None`.
    pub fn construct_default_request_settings(&self, template: i32) -> Option<RequestSettings> {
        let decoded = RequestTemplate::from_raw(template);
        trace!(camera = self.id, template, ?decoded, "construct_default_request_settings");
        None
    }

    /// Accept a capture request.
    pub fn process_capture_request(&self, request: &CaptureRequest) -> Result<()> {
        trace!(
            camera = self.id,
            frame = request.frame_number,
            outputs = request.output_buffers.len(),
            "process_capture_request"
        );
        // TODO: validate the request against the committed streams once requests reach the sensor.
        Ok(())
    }

    /// Fill in the vendor tag query table. The camera defines no vendor tags.
    pub fn get_metadata_vendor_tag_ops(&self, ops: &mut VendorTagOps) {
        trace!(camera = self.id, sections = ops.sections.len(), "get_metadata_vendor_tag_ops");
    }

    /// Dump diagnostic state to `fd`.
    pub fn dump(&self, fd: i32) {
        trace!(camera = self.id, fd, "dump");
    }
}

impl CameraState {
    fn configure(&mut self, camera_id: u32, descriptors: &mut [StreamDescriptor]) -> Result<()> {
        for stream in &mut self.streams {
            stream.set_reuse(false);
        }

        let mut previous: Vec<Option<Stream>> =
            mem::take(&mut self.streams).into_iter().map(Some).collect();
        let mut candidates = Vec::with_capacity(descriptors.len());

        let outcome = collect_candidates(camera_id, &mut previous, descriptors, &mut candidates)
            .and_then(|()| {
                validate_stream_set(candidates.iter().map(Candidate::stream)).map_err(|err| {
                    error!(camera = camera_id, %err, "invalid stream set");
                    CameraError::from(err)
                })
            });

        if let Err(err) = outcome {
            self.streams = rollback(camera_id, previous, candidates);
            return Err(err);
        }

        setup_streams(candidates.iter_mut().map(Candidate::stream_mut));

        let stale = previous.into_iter().flatten().filter(|s| !s.is_reused());
        destroy_streams(camera_id, stale);
        self.streams = candidates.into_iter().map(Candidate::into_stream).collect();

        for (descriptor, stream) in descriptors.iter_mut().zip(&self.streams) {
            descriptor.handle = Some(stream.handle());
            descriptor.usage = stream.usage();
            descriptor.max_buffers = stream.max_buffers();
        }

        debug!(camera = camera_id, count = self.streams.len(), "committed stream configuration");
        Ok(())
    }
}

/// Resolve every descriptor to a reused or fresh stream, in order.
///
/// Reused streams move out of `previous`, leaving `None` in their slot.
fn collect_candidates(
    camera_id: u32,
    previous: &mut [Option<Stream>],
    descriptors: &[StreamDescriptor],
    candidates: &mut Vec<Candidate>,
) -> Result<()> {
    for (index, descriptor) in descriptors.iter().enumerate() {
        let candidate = if descriptor.signals_reuse() {
            reuse_stream(camera_id, previous, candidates, index, descriptor)?
        } else {
            Candidate::Fresh(Stream::new(camera_id, descriptor))
        };
        candidates.push(candidate);
    }
    Ok(())
}

fn reuse_stream(
    camera_id: u32,
    previous: &mut [Option<Stream>],
    candidates: &[Candidate],
    index: usize,
    descriptor: &StreamDescriptor,
) -> Result<Candidate> {
    let Some(handle) = descriptor.handle else {
        error!(camera = camera_id, index, "reused stream without handle");
        return Err(CameraError::MissingStreamHandle(index));
    };

    if candidates.iter().any(|c| c.stream().handle() == handle) {
        error!(camera = camera_id, stream = %handle, "stream reused twice");
        return Err(CameraError::DuplicateReuse(handle));
    }

    let mut found = None;
    for (slot, entry) in previous.iter_mut().enumerate() {
        let Some(existing) = entry.as_ref().filter(|s| s.handle() == handle) else {
            continue;
        };
        if let Err(reason) = existing.check_reuse(camera_id, descriptor) {
            error!(camera = camera_id, stream = %handle, %reason, "mismatched parameter in reused stream");
            return Err(CameraError::ReuseMismatch { index, reason });
        }
        found = entry.take().map(|stream| (slot, stream));
        break;
    }

    let Some((slot, mut stream)) = found else {
        error!(camera = camera_id, stream = %handle, "reused stream is not configured");
        return Err(CameraError::UnknownStream(handle));
    };
    stream.set_reuse(true);
    Ok(Candidate::Reused { slot, stream })
}

/// Put reused streams back in their original slots and drop fresh ones.
fn rollback(
    camera_id: u32,
    mut previous: Vec<Option<Stream>>,
    candidates: Vec<Candidate>,
) -> Vec<Stream> {
    let mut fresh = Vec::new();
    for candidate in candidates {
        match candidate {
            Candidate::Reused { slot, stream } => {
                if let Some(entry) = previous.get_mut(slot) {
                    *entry = Some(stream);
                }
            }
            Candidate::Fresh(stream) => fresh.push(stream),
        }
    }
    destroy_streams(camera_id, fresh);
    previous.into_iter().flatten().collect()
}

fn destroy_streams<I>(camera_id: u32, streams: I)
where
    I: IntoIterator<Item = Stream>,
{
    for stream in streams {
        debug!(camera = camera_id, stream = %stream.handle(), "destroying stream");
        drop(stream);
    }
}
