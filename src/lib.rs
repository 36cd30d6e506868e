//! attention-bench: measurement harness for attention kernels.
//!
//! Pieces:
//! 1. `config`: problem dimensions, buffer sizes, softmax scale
//! 2. `timer`: device-timeline interval timer over a marker pair
//! 3. `device`: backend seam (host-emulated stream, Metal on macOS) and fail-fast checks
//! 4. `verify`: deterministic random fill and tolerance comparison
//! 5. `report`: FLOP/byte model, roofline classification, fixed-format stats text
//!
//! Supporting modules drive repeated measurements (`harness`, `stats`),
//! provide CPU reference kernels (`reference`), and write results
//! (`output`, `summary`, `memory`).

#[macro_use]
pub mod device;

pub mod config;
pub mod error;
pub mod harness;
pub mod memory;
pub mod output;
pub mod reference;
pub mod report;
pub mod stats;
pub mod summary;
pub mod timer;
pub mod verify;

pub use config::{AttentionConfig, ELEMENT_BYTES};
pub use device::host::{HostBackend, HostStream};
pub use device::{DeviceError, TimelineBackend};
pub use error::BenchError;
pub use report::{print_stats, PerfReport, MEMORY_BOUND_THRESHOLD};
pub use timer::GpuTimer;
pub use verify::{init_random, init_random_default, verify_results, DEFAULT_TOLERANCE};
