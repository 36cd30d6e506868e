//! Device-timeline backends and the fail-fast check for their results.
//!
//! A backend exposes an ordered execution stream and markers that can be
//! recorded onto it. [`GpuTimer`](crate::timer::GpuTimer) is written against
//! [`TimelineBackend`] only, so the same timing contract holds for the
//! host-emulated stream and for Metal command queues.

pub mod host;
#[cfg(target_os = "macos")]
pub mod metal;

use std::fmt::Display;

/// Failure reported by a timeline backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    #[error("marker has not been recorded on any stream")]
    MarkerNotRecorded,
    #[error("marker work has not completed")]
    NotReady,
    #[error("execution stream is closed")]
    StreamClosed,
    #[error("failed to start stream worker: {0}")]
    StreamCreation(String),
    #[error("failed to create command buffer")]
    CommandBuffer,
    #[error("kernel fault on stream: {0}")]
    KernelFault(String),
}

/// Device timeline with an ordered stream and recordable markers.
///
/// `None` for a stream argument selects the backend's default stream.
pub trait TimelineBackend {
    /// Ordered command channel.
    type Stream;
    /// Point recorded on a stream's timeline.
    type Marker;

    fn create_marker() -> Result<Self::Marker, DeviceError>;

    /// Enqueue `marker` behind all work already submitted to the stream.
    /// Re-recording replaces the previous recording.
    fn record_marker(
        marker: &mut Self::Marker,
        stream: Option<&Self::Stream>,
    ) -> Result<(), DeviceError>;

    /// Block until the stream reaches `marker`.
    fn synchronize_marker(marker: &Self::Marker) -> Result<(), DeviceError>;

    /// Milliseconds between two completed markers.
    fn marker_elapsed_ms(start: &Self::Marker, stop: &Self::Marker) -> Result<f32, DeviceError>;

    /// Release the marker. Must not fail, even while the marker is pending.
    fn destroy_marker(marker: &mut Self::Marker);
}

/// Fatal report line for a failed device call.
pub fn fatal_message(file: &str, line: u32, err: &dyn Display) -> String {
    format!("error at {}:{}: {}", file, line, err)
}

/// Report a failed device call and terminate the process.
#[cold]
pub fn fatal(file: &str, line: u32, err: &dyn Display) -> ! {
    tracing::error!(file, line, %err, "device call failed");
    eprintln!("{}", fatal_message(file, line, err));
    std::process::exit(1)
}

/// Unwrap a backend `Result` or abort with the call site.
/// No retry.
#[macro_export]
macro_rules! device_check {
    ($call:expr) => {
        match $call {
            Ok(value) => value,
            Err(err) => $crate::device::fatal(file!(), line!(), &err),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_message_format() {
        let msg = fatal_message("src/timer.rs", 42, &DeviceError::MarkerNotRecorded);
        assert_eq!(
            msg,
            "error at src/timer.rs:42: marker has not been recorded on any stream"
        );
    }

    #[test]
    fn test_device_check_passes_ok() {
        let value: Result<u32, DeviceError> = Ok(7);
        assert_eq!(device_check!(value), 7);
    }

    #[test]
    fn test_error_strings() {
        assert_eq!(DeviceError::NotReady.to_string(), "marker work has not completed");
        assert_eq!(
            DeviceError::KernelFault("index out of bounds".into()).to_string(),
            "kernel fault on stream: index out of bounds"
        );
    }
}
