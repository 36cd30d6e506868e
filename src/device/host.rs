//! Host-emulated device timeline.
//!
//! Each [`HostStream`] owns a worker thread that drains an in-order command
//! queue, standing in for an accelerator queue. Markers are timestamped when
//! the worker reaches them, so the interval between two markers covers exactly
//! the work submitted between their recordings.
//!
//! ```text
//! caller:  record(start) submit(k0) submit(k1) record(stop) elapsed_ms()──wait──┐
//! worker:  [start=t0] [k0 ~~~~~~~~] [k1 ~~~~] [stop=t1] ─────────────notify──┘
//! ```
//!
//! A panic inside submitted work is caught and turns the stream faulted:
//! later work is skipped and later markers report [`DeviceError::KernelFault`].

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender};

use super::{DeviceError, TimelineBackend};

/// Process-wide implicit stream.
static DEFAULT_STREAM: OnceLock<HostStream> = OnceLock::new();

type Work = Box<dyn FnOnce() + Send + 'static>;

enum Command {
    Work(Work),
    Marker(Arc<MarkerSlot>, u64),
}

#[derive(Debug, Clone, PartialEq)]
enum MarkerState {
    Idle,
    Pending(u64),
    Complete(Instant),
    Faulted(String),
}

#[derive(Debug)]
struct MarkerSlot {
    state: Mutex<MarkerState>,
    ready: Condvar,
    generation: Mutex<u64>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MarkerSlot {
    fn new() -> Self {
        Self {
            state: Mutex::new(MarkerState::Idle),
            ready: Condvar::new(),
            generation: Mutex::new(0),
        }
    }

    /// Start a new recording, superseding any in flight.
    fn begin(&self) -> u64 {
        let mut generation = lock(&self.generation);
        *generation += 1;
        *lock(&self.state) = MarkerState::Pending(*generation);
        *generation
    }

    /// Called by the worker. Stale recordings are ignored.
    fn complete(&self, generation: u64, fault: Option<&str>) {
        let mut state = lock(&self.state);
        if *state == MarkerState::Pending(generation) {
            *state = match fault {
                None => MarkerState::Complete(Instant::now()),
                Some(msg) => MarkerState::Faulted(msg.to_string()),
            };
            self.ready.notify_all();
        }
    }

    fn reset(&self) {
        let mut generation = lock(&self.generation);
        *generation += 1;
        *lock(&self.state) = MarkerState::Idle;
        self.ready.notify_all();
    }

    fn wait(&self) -> Result<Instant, DeviceError> {
        let mut state = lock(&self.state);
        loop {
            match &*state {
                MarkerState::Idle => return Err(DeviceError::MarkerNotRecorded),
                MarkerState::Pending(_) => {
                    state = self
                        .ready
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                MarkerState::Complete(at) => return Ok(*at),
                MarkerState::Faulted(msg) => return Err(DeviceError::KernelFault(msg.clone())),
            }
        }
    }

    fn query(&self) -> Result<Instant, DeviceError> {
        match &*lock(&self.state) {
            MarkerState::Idle => Err(DeviceError::MarkerNotRecorded),
            MarkerState::Pending(_) => Err(DeviceError::NotReady),
            MarkerState::Complete(at) => Ok(*at),
            MarkerState::Faulted(msg) => Err(DeviceError::KernelFault(msg.clone())),
        }
    }
}

/// Timeline point on a [`HostStream`].
#[derive(Debug)]
pub struct HostMarker {
    slot: Arc<MarkerSlot>,
}

impl HostMarker {
    fn new() -> Self {
        Self {
            slot: Arc::new(MarkerSlot::new()),
        }
    }
}

/// In-order execution queue serviced by one worker thread.
///
/// Cloning yields another handle to the same queue. The worker exits after
/// the last handle is dropped and the queue has drained.
#[derive(Clone)]
pub struct HostStream {
    tx: Sender<Command>,
    name: Arc<str>,
}

impl std::fmt::Debug for HostStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostStream")
            .field("name", &self.name)
            .field("queued", &self.tx.len())
            .finish()
    }
}

impl HostStream {
    /// Create a stream with its own worker thread.
    pub fn new() -> Result<Self, DeviceError> {
        Self::named("stream")
    }

    pub fn named(name: &str) -> Result<Self, DeviceError> {
        let (tx, rx) = crossbeam_channel::unbounded::<Command>();
        let thread_name = format!("attn-{}", name);
        thread::Builder::new()
            .name(thread_name)
            .spawn(move || run_worker(rx))
            .map_err(|e| DeviceError::StreamCreation(e.to_string()))?;
        tracing::debug!(stream = name, "host stream started");
        Ok(Self {
            tx,
            name: Arc::from(name),
        })
    }

    /// The implicit stream used when no stream is passed.
    pub fn default_stream() -> Result<&'static HostStream, DeviceError> {
        if let Some(stream) = DEFAULT_STREAM.get() {
            return Ok(stream);
        }
        let stream = HostStream::named("default")?;
        Ok(DEFAULT_STREAM.get_or_init(|| stream))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Enqueue kernel work behind everything already submitted.
    pub fn submit<F>(&self, work: F) -> Result<(), DeviceError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.tx
            .send(Command::Work(Box::new(work)))
            .map_err(|_| DeviceError::StreamClosed)
    }

    /// Block until all work submitted so far has retired.
    pub fn synchronize(&self) -> Result<(), DeviceError> {
        let mut marker = HostMarker::new();
        HostBackend::record_marker(&mut marker, Some(self))?;
        HostBackend::synchronize_marker(&marker)
    }

    fn enqueue_marker(&self, slot: &Arc<MarkerSlot>) -> Result<(), DeviceError> {
        let generation = slot.begin();
        if self
            .tx
            .send(Command::Marker(Arc::clone(slot), generation))
            .is_err()
        {
            slot.reset();
            return Err(DeviceError::StreamClosed);
        }
        Ok(())
    }
}

fn run_worker(rx: Receiver<Command>) {
    let mut fault: Option<String> = None;
    for cmd in rx {
        match cmd {
            Command::Work(work) => {
                if fault.is_some() {
                    continue;
                }
                if let Err(payload) = catch_unwind(AssertUnwindSafe(work)) {
                    let msg = panic_message(payload.as_ref());
                    tracing::error!(%msg, "kernel panicked; stream is now faulted");
                    fault = Some(msg);
                }
            }
            Command::Marker(slot, generation) => slot.complete(generation, fault.as_deref()),
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Host timeline backend: [`HostStream`] + [`HostMarker`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HostBackend;

impl TimelineBackend for HostBackend {
    type Stream = HostStream;
    type Marker = HostMarker;

    fn create_marker() -> Result<HostMarker, DeviceError> {
        Ok(HostMarker::new())
    }

    fn record_marker(marker: &mut HostMarker, stream: Option<&HostStream>) -> Result<(), DeviceError> {
        let stream = match stream {
            Some(s) => s,
            None => HostStream::default_stream()?,
        };
        stream.enqueue_marker(&marker.slot)
    }

    fn synchronize_marker(marker: &HostMarker) -> Result<(), DeviceError> {
        marker.slot.wait().map(|_| ())
    }

    fn marker_elapsed_ms(start: &HostMarker, stop: &HostMarker) -> Result<f32, DeviceError> {
        let t0 = start.slot.query()?;
        let t1 = stop.slot.query()?;
        Ok(t1.saturating_duration_since(t0).as_secs_f32() * 1000.0)
    }

    fn destroy_marker(marker: &mut HostMarker) {
        marker.slot.reset();
    }
}
