//! Device-timeline interval timer.
//!
//! `GpuTimer` owns a start/stop marker pair. Both are created in `new` and
//! released in `Drop`, on every exit path. Device failures anywhere in the
//! lifecycle abort the process through [`device_check!`].
//!
//! ```
//! use attention_bench::{GpuTimer, HostBackend, HostStream};
//!
//! let stream = HostStream::new().unwrap();
//! let mut timer = GpuTimer::<HostBackend>::new();
//! timer.record_start(Some(&stream));
//! stream.submit(|| std::thread::sleep(std::time::Duration::from_millis(2))).unwrap();
//! timer.record_stop(Some(&stream));
//! assert!(timer.elapsed_ms() >= 0.0);
//! ```

use std::marker::PhantomData;

use crate::device::host::HostBackend;
use crate::device::TimelineBackend;

/// Reusable start/stop timer on a device timeline.
///
/// Stop-before-start and mismatched streams are the caller's responsibility.
/// Not meant for concurrent start/stop pairs from several threads.
pub struct GpuTimer<B: TimelineBackend = HostBackend> {
    start: B::Marker,
    stop: B::Marker,
    _backend: PhantomData<B>,
}

impl<B: TimelineBackend> GpuTimer<B> {
    /// Acquire both markers.
    pub fn new() -> Self {
        let start = device_check!(B::create_marker());
        let stop = match B::create_marker() {
            Ok(stop) => stop,
            Err(err) => {
                let mut start = start;
                B::destroy_marker(&mut start);
                crate::device::fatal(file!(), line!(), &err)
            }
        };
        tracing::trace!("timer markers created");
        Self {
            start,
            stop,
            _backend: PhantomData,
        }
    }

    /// Enqueue the start marker. `None` uses the default stream.
    pub fn record_start(&mut self, stream: Option<&B::Stream>) {
        device_check!(B::record_marker(&mut self.start, stream));
    }

    /// Enqueue the stop marker. `None` uses the default stream.
    pub fn record_stop(&mut self, stream: Option<&B::Stream>) {
        device_check!(B::record_marker(&mut self.stop, stream));
    }

    /// Wait for the stop marker, then return start→stop in milliseconds.
    ///
    /// Blocks the calling thread until all work enqueued before the stop
    /// marker has retired. There is no timeout.
    pub fn elapsed_ms(&self) -> f32 {
        device_check!(B::synchronize_marker(&self.stop));
        let ms = device_check!(B::marker_elapsed_ms(&self.start, &self.stop));
        ms.max(0.0)
    }
}

impl<B: TimelineBackend> Default for GpuTimer<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: TimelineBackend> Drop for GpuTimer<B> {
    fn drop(&mut self) {
        B::destroy_marker(&mut self.start);
        B::destroy_marker(&mut self.stop);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::host::HostStream;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_measures_submitted_work() {
        let stream = HostStream::new().unwrap();
        let mut timer = GpuTimer::<HostBackend>::new();
        timer.record_start(Some(&stream));
        stream
            .submit(|| thread::sleep(Duration::from_millis(20)))
            .unwrap();
        timer.record_stop(Some(&stream));
        // read immediately: the call waits for the sleep to retire
        let ms = timer.elapsed_ms();
        assert!(ms >= 15.0, "expected ~20ms, got {ms}");
        assert!(ms < 2000.0, "unreasonably large: {ms}");
    }

    #[test]
    fn test_empty_interval_non_negative() {
        let stream = HostStream::new().unwrap();
        let mut timer: GpuTimer = GpuTimer::new();
        timer.record_start(Some(&stream));
        timer.record_stop(Some(&stream));
        assert!(timer.elapsed_ms() >= 0.0);
    }

    #[test]
    fn test_default_stream() {
        let mut timer: GpuTimer = GpuTimer::new();
        timer.record_start(None);
        timer.record_stop(None);
        assert!(timer.elapsed_ms() >= 0.0);
    }

    #[test]
    fn test_reuse_across_cycles() {
        let stream = HostStream::new().unwrap();
        let mut timer: GpuTimer = GpuTimer::new();
        for sleep_ms in [2u64, 12] {
            timer.record_start(Some(&stream));
            stream
                .submit(move || thread::sleep(Duration::from_millis(sleep_ms)))
                .unwrap();
            timer.record_stop(Some(&stream));
            let ms = timer.elapsed_ms();
            assert!(ms >= sleep_ms as f32 * 0.5, "cycle {sleep_ms}ms measured {ms}");
        }
    }

    #[test]
    fn test_drop_with_measurement_in_flight() {
        let stream = HostStream::new().unwrap();
        {
            let mut timer: GpuTimer = GpuTimer::new();
            timer.record_start(Some(&stream));
            stream
                .submit(|| thread::sleep(Duration::from_millis(10)))
                .unwrap();
            timer.record_stop(Some(&stream));
            // dropped without elapsed_ms
        }
        stream.synchronize().unwrap();
    }
}
