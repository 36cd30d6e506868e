//! Result rendering: comfy-table, CSV, JSON, and a progress spinner.

pub mod csv;
pub mod json;
pub mod progress;
pub mod table;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::BenchError;
use crate::harness::Measurement;

/// Flat row for one measured (kernel, shape).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchRecord {
    pub attention_type: String,
    pub batch_size: usize,
    pub num_heads: usize,
    pub seq_len: usize,
    pub head_dim: usize,
    pub time_ms: f64,
    pub tflops: f64,
    pub bandwidth_gbps: f64,
    pub arithmetic_intensity: f64,
    pub memory_bound: bool,
    pub verified: Option<bool>,
}

impl From<&Measurement> for BenchRecord {
    fn from(m: &Measurement) -> Self {
        Self {
            attention_type: m.kernel.name().to_string(),
            batch_size: m.config.batch_size(),
            num_heads: m.config.num_heads(),
            seq_len: m.config.seq_len(),
            head_dim: m.config.head_dim(),
            time_ms: m.stats.mean,
            tflops: m.report.tflops(),
            bandwidth_gbps: m.report.bandwidth_gbps,
            arithmetic_intensity: m.report.arithmetic_intensity,
            memory_bound: m.report.memory_bound,
            verified: m.verified,
        }
    }
}

/// Create the parent directory of `path` if it has one.
pub(crate) fn ensure_parent(path: &Path) -> Result<(), BenchError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| BenchError::io(parent, e))?;
        }
    }
    Ok(())
}
