//! Measurement loop: warmup, timed runs on a stream, verification, metrics.
//!
//! For each (kernel, config):
//! 1. fill Q/K/V with the deterministic generator
//! 2. warmup loop on the stream (not timed)
//! 3. timed loop, one `GpuTimer` reused across runs
//! 4. verify the last output against the f64 reference
//! 5. stats + roofline metrics at the mean time

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::config::AttentionConfig;
use crate::device::host::{HostBackend, HostStream};
use crate::error::BenchError;
use crate::reference::{attention_f64, Kernel};
use crate::report::PerfReport;
use crate::stats::{compute_stats, Stats};
use crate::timer::GpuTimer;
use crate::verify::{find_mismatch, max_abs_diff, random_vec, DEFAULT_TOLERANCE};

/// Seeds for Q, K and V.
pub const QKV_SEEDS: [u32; 3] = [42, 43, 44];

/// Iteration counts for one measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    pub runs: u32,
    pub warmup: u32,
    /// Compare against the f64 reference after timing.
    pub verify: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            runs: 10,
            warmup: 3,
            verify: true,
        }
    }
}

impl RunConfig {
    /// At least one timed run is needed for a mean time.
    pub fn validate(&self) -> Result<(), BenchError> {
        if self.runs == 0 {
            return Err(BenchError::InvalidDimension {
                name: "runs",
                value: 0,
                reason: "must be positive",
            });
        }
        Ok(())
    }
}

/// Result of measuring one kernel at one shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Measurement {
    pub kernel: Kernel,
    pub config: AttentionConfig,
    pub samples_ms: Vec<f64>,
    pub stats: Stats,
    pub report: PerfReport,
    /// `None` when verification was skipped.
    pub verified: Option<bool>,
    pub max_abs_diff: Option<f32>,
}

struct Buffers {
    q: Arc<Vec<f32>>,
    k: Arc<Vec<f32>>,
    v: Arc<Vec<f32>>,
    out: Arc<Mutex<Vec<f32>>>,
}

impl Buffers {
    fn new(cfg: &AttentionConfig) -> Self {
        let n = cfg.qkv_elements();
        let [sq, sk, sv] = QKV_SEEDS;
        Self {
            q: Arc::new(random_vec(n, sq)),
            k: Arc::new(random_vec(n, sk)),
            v: Arc::new(random_vec(n, sv)),
            out: Arc::new(Mutex::new(vec![0.0; n])),
        }
    }

    fn enqueue(&self, stream: &HostStream, kernel: Kernel, cfg: AttentionConfig) {
        let q = Arc::clone(&self.q);
        let k = Arc::clone(&self.k);
        let v = Arc::clone(&self.v);
        let out = Arc::clone(&self.out);
        device_check!(stream.submit(move || {
            let mut o = out.lock().unwrap_or_else(PoisonError::into_inner);
            kernel.run(&q, &k, &v, &cfg, &mut o);
        }));
    }

    fn output(&self) -> Vec<f32> {
        self.out
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Time `kernel` at `cfg` on `stream`.
///
/// Device failures are fatal. A verification failure is reported on stderr
/// and recorded in the result; measurement still completes.
pub fn measure(
    kernel: Kernel,
    cfg: &AttentionConfig,
    run: &RunConfig,
    stream: &HostStream,
    progress: Option<&dyn Fn(&str)>,
) -> Measurement {
    let label = format!("{} @ {}", kernel, cfg.label());
    let notify = |stage: &str| {
        if let Some(cb) = progress {
            cb(&format!("{}: {}", label, stage));
        }
    };

    notify("setup");
    let buffers = Buffers::new(cfg);

    notify(&format!("warmup ({} runs)", run.warmup));
    for _ in 0..run.warmup {
        buffers.enqueue(stream, kernel, *cfg);
    }
    device_check!(stream.synchronize());

    notify(&format!("measuring ({} runs)", run.runs));
    let mut timer = GpuTimer::<HostBackend>::new();
    let samples_ms: Vec<f64> = (0..run.runs)
        .map(|_| {
            timer.record_start(Some(stream));
            buffers.enqueue(stream, kernel, *cfg);
            timer.record_stop(Some(stream));
            timer.elapsed_ms() as f64
        })
        .collect();

    let (verified, max_diff) = if run.verify && run.warmup + run.runs > 0 {
        notify("verifying");
        let reference = attention_f64(&buffers.q, &buffers.k, &buffers.v, cfg);
        let output = buffers.output();
        let mismatch = find_mismatch(&reference, &output, DEFAULT_TOLERANCE);
        if let Some(m) = mismatch {
            eprintln!("{}", m);
            tracing::warn!(kernel = %kernel, shape = %cfg.label(), index = m.index, "verification failed");
        }
        (Some(mismatch.is_none()), Some(max_abs_diff(&reference, &output)))
    } else {
        (None, None)
    };

    let stats = compute_stats(&samples_ms);
    let report = PerfReport::new(stats.mean as f32, cfg);
    tracing::debug!(
        kernel = %kernel,
        shape = %cfg.label(),
        mean_ms = stats.mean,
        cv_percent = stats.cv_percent,
        "measurement complete"
    );

    Measurement {
        kernel,
        config: *cfg,
        samples_ms,
        stats,
        report,
        verified,
        max_abs_diff: max_diff,
    }
}

/// Display form of a sequence length: 1024 -> "1K", 4096 -> "4K".
pub fn format_seq_len(n: usize) -> String {
    if n >= 1024 && n % 1024 == 0 {
        format!("{}K", n / 1024)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_online_small() {
        let stream = HostStream::new().unwrap();
        let cfg = AttentionConfig::new(1, 2, 32, 16);
        let run = RunConfig {
            runs: 4,
            warmup: 1,
            verify: true,
        };
        let m = measure(Kernel::Online, &cfg, &run, &stream, None);
        assert_eq!(m.samples_ms.len(), 4);
        assert!(m.samples_ms.iter().all(|&t| t >= 0.0));
        assert_eq!(m.verified, Some(true));
        assert!(m.max_abs_diff.unwrap() < 1e-5);
        assert_eq!(m.report.flops, cfg.flop_count());
    }

    #[test]
    fn test_measure_skips_verify() {
        let stream = HostStream::new().unwrap();
        let cfg = AttentionConfig::new(1, 1, 16, 8);
        let run = RunConfig {
            runs: 2,
            warmup: 0,
            verify: false,
        };
        let m = measure(Kernel::Naive, &cfg, &run, &stream, None);
        assert_eq!(m.verified, None);
        assert_eq!(m.max_abs_diff, None);
    }

    #[test]
    fn test_progress_callback_stages() {
        let stream = HostStream::new().unwrap();
        let cfg = AttentionConfig::new(1, 1, 16, 8);
        let seen = std::cell::RefCell::new(Vec::new());
        let cb = |msg: &str| seen.borrow_mut().push(msg.to_string());
        measure(Kernel::Naive, &cfg, &RunConfig::default(), &stream, Some(&cb));
        let seen = seen.into_inner();
        assert!(seen[0].ends_with("setup"));
        assert!(seen.iter().any(|m| m.contains("measuring (10 runs)")));
        assert!(seen.last().unwrap().ends_with("verifying"));
    }

    #[test]
    fn test_zero_runs_rejected() {
        let run = RunConfig {
            runs: 0,
            ..RunConfig::default()
        };
        assert!(matches!(
            run.validate(),
            Err(BenchError::InvalidDimension { name: "runs", .. })
        ));
        let zero_warmup = RunConfig {
            warmup: 0,
            ..RunConfig::default()
        };
        assert!(zero_warmup.validate().is_ok());
    }

    #[test]
    fn test_format_seq_len() {
        assert_eq!(format_seq_len(512), "512");
        assert_eq!(format_seq_len(1024), "1K");
        assert_eq!(format_seq_len(4096), "4K");
        assert_eq!(format_seq_len(1536), "1536");
    }
}
