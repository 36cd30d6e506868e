//! Metal device timeline (macOS only).
//!
//! A stream is an `MTLCommandQueue`. A marker is an empty command buffer
//! committed on that queue: it retires after everything committed before it,
//! and its `GPUEndTime` is the timeline point.
//!
//! Metal does not document timestamps for command buffers with no encoded
//! work. An interval measured this way spans from the start marker's
//! completion to the stop marker's completion, so it includes scheduling
//! gaps between buffers and is coarser than `GPUEndTime - GPUStartTime` of a
//! single kernel buffer. A reported interval of zero means the device did not
//! stamp the empty buffers; time kernel buffers directly in that case.

use std::sync::OnceLock;

use objc2::rc::Retained;
use objc2::runtime::ProtocolObject;
use objc2_foundation::NSError;
use objc2_metal::{
    MTLCommandBuffer, MTLCommandBufferStatus, MTLCommandQueue, MTLCreateSystemDefaultDevice,
    MTLDevice,
};

use super::{DeviceError, TimelineBackend};

static DEFAULT_STREAM: OnceLock<MetalStream> = OnceLock::new();

/// Metal command queue used as an execution stream.
pub struct MetalStream {
    device: Retained<ProtocolObject<dyn MTLDevice>>,
    queue: Retained<ProtocolObject<dyn MTLCommandQueue>>,
}

// SAFETY: MTLDevice and MTLCommandQueue are thread-safe Metal objects.
unsafe impl Send for MetalStream {}
unsafe impl Sync for MetalStream {}

impl MetalStream {
    /// New queue on the system default device.
    pub fn new() -> Result<Self, DeviceError> {
        let device = MTLCreateSystemDefaultDevice()
            .ok_or_else(|| DeviceError::StreamCreation("no Metal device".into()))?;
        Self::with_device(device)
    }

    pub fn with_device(
        device: Retained<ProtocolObject<dyn MTLDevice>>,
    ) -> Result<Self, DeviceError> {
        let queue = device
            .newCommandQueue()
            .ok_or_else(|| DeviceError::StreamCreation("newCommandQueue returned nil".into()))?;
        Ok(Self { device, queue })
    }

    pub fn default_stream() -> Result<&'static MetalStream, DeviceError> {
        if let Some(stream) = DEFAULT_STREAM.get() {
            return Ok(stream);
        }
        let stream = MetalStream::new()?;
        Ok(DEFAULT_STREAM.get_or_init(|| stream))
    }

    pub fn device(&self) -> &ProtocolObject<dyn MTLDevice> {
        &self.device
    }

    /// Queue to encode kernel command buffers on.
    pub fn queue(&self) -> &ProtocolObject<dyn MTLCommandQueue> {
        &self.queue
    }
}

/// Committed marker command buffer, if recorded.
#[derive(Default)]
pub struct MetalMarker {
    cmd: Option<Retained<ProtocolObject<dyn MTLCommandBuffer>>>,
}

impl MetalMarker {
    fn recorded(&self) -> Result<&ProtocolObject<dyn MTLCommandBuffer>, DeviceError> {
        self.cmd.as_deref().ok_or(DeviceError::MarkerNotRecorded)
    }
}

fn fault_message(cmd: &ProtocolObject<dyn MTLCommandBuffer>) -> String {
    cmd.error()
        .map(|e: Retained<NSError>| e.localizedDescription().to_string())
        .unwrap_or_else(|| "command buffer error".to_string())
}

fn completed_end_time(cmd: &ProtocolObject<dyn MTLCommandBuffer>) -> Result<f64, DeviceError> {
    let status = cmd.status();
    if status == MTLCommandBufferStatus::Error {
        return Err(DeviceError::KernelFault(fault_message(cmd)));
    }
    if status != MTLCommandBufferStatus::Completed {
        return Err(DeviceError::NotReady);
    }
    Ok(cmd.GPUEndTime())
}

/// Metal timeline backend: [`MetalStream`] + [`MetalMarker`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MetalBackend;

impl TimelineBackend for MetalBackend {
    type Stream = MetalStream;
    type Marker = MetalMarker;

    fn create_marker() -> Result<MetalMarker, DeviceError> {
        Ok(MetalMarker::default())
    }

    fn record_marker(marker: &mut MetalMarker, stream: Option<&MetalStream>) -> Result<(), DeviceError> {
        let stream = match stream {
            Some(s) => s,
            None => MetalStream::default_stream()?,
        };
        let cmd = stream
            .queue
            .commandBuffer()
            .ok_or(DeviceError::CommandBuffer)?;
        cmd.commit();
        marker.cmd = Some(cmd);
        Ok(())
    }

    fn synchronize_marker(marker: &MetalMarker) -> Result<(), DeviceError> {
        let cmd = marker.recorded()?;
        cmd.waitUntilCompleted();
        completed_end_time(cmd).map(|_| ())
    }

    fn marker_elapsed_ms(start: &MetalMarker, stop: &MetalMarker) -> Result<f32, DeviceError> {
        let t0 = completed_end_time(start.recorded()?)?;
        let t1 = completed_end_time(stop.recorded()?)?;
        Ok(((t1 - t0) * 1000.0).max(0.0) as f32)
    }

    fn destroy_marker(marker: &mut MetalMarker) {
        // Retained<T> releases on drop; an uncompleted buffer stays owned by the queue.
        marker.cmd = None;
    }
}
