//! Cross-run summary: best numbers per implementation and speedup over naive.
//!
//! Written as `summary.json` (machine-readable) and `REPORT.md`.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::BenchError;
use crate::output::BenchRecord;

/// Implementation every other one is compared against.
pub const BASELINE: &str = "naive";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BestPerformance {
    pub max_tflops: f64,
    pub max_bandwidth_gbps: f64,
    pub min_latency_ms: f64,
}

/// Speedup of one implementation over [`BASELINE`] at one shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Speedup {
    pub attention_type: String,
    pub batch_size: usize,
    pub num_heads: usize,
    pub seq_len: usize,
    pub head_dim: usize,
    pub speedup: f64,
}

impl Speedup {
    pub fn verdict(&self) -> &'static str {
        verdict(self.speedup)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub configurations_tested: usize,
    pub implementations: Vec<String>,
    pub best_performance: BTreeMap<String, BestPerformance>,
    pub speedups: Vec<Speedup>,
}

fn verdict(speedup: f64) -> &'static str {
    if speedup > 10.0 {
        "DOMINANT"
    } else if speedup > 5.0 {
        "STRONG"
    } else if speedup >= 2.0 {
        "SOLID"
    } else if speedup >= 1.0 {
        "MARGINAL"
    } else {
        "SLOWER"
    }
}

type Shape = (usize, usize, usize, usize);

fn shape(r: &BenchRecord) -> Shape {
    (r.batch_size, r.num_heads, r.seq_len, r.head_dim)
}

pub fn summarize(records: &[BenchRecord]) -> Summary {
    // one per result row
    let configurations_tested = records.len();

    let mut implementations: Vec<String> = Vec::new();
    let mut best_performance: BTreeMap<String, BestPerformance> = BTreeMap::new();
    for r in records {
        if !implementations.contains(&r.attention_type) {
            implementations.push(r.attention_type.clone());
        }
        best_performance
            .entry(r.attention_type.clone())
            .and_modify(|b| {
                b.max_tflops = b.max_tflops.max(r.tflops);
                b.max_bandwidth_gbps = b.max_bandwidth_gbps.max(r.bandwidth_gbps);
                b.min_latency_ms = b.min_latency_ms.min(r.time_ms);
            })
            .or_insert(BestPerformance {
                max_tflops: r.tflops,
                max_bandwidth_gbps: r.bandwidth_gbps,
                min_latency_ms: r.time_ms,
            });
    }

    let baseline: BTreeMap<Shape, f64> = records
        .iter()
        .filter(|r| r.attention_type == BASELINE)
        .map(|r| (shape(r), r.time_ms))
        .collect();

    let speedups = records
        .iter()
        .filter(|r| r.attention_type != BASELINE && r.time_ms > 0.0)
        .filter_map(|r| {
            let base = baseline.get(&shape(r))?;
            Some(Speedup {
                attention_type: r.attention_type.clone(),
                batch_size: r.batch_size,
                num_heads: r.num_heads,
                seq_len: r.seq_len,
                head_dim: r.head_dim,
                speedup: base / r.time_ms,
            })
        })
        .collect();

    Summary {
        configurations_tested,
        implementations,
        best_performance,
        speedups,
    }
}

/// Markdown rendering of a [`Summary`].
pub fn render_markdown(summary: &Summary) -> String {
    let mut md = String::new();
    let _ = writeln!(md, "# Attention Benchmark Report\n");
    let _ = writeln!(md, "Generated: {}\n", chrono::Utc::now().to_rfc3339());
    let _ = writeln!(md, "Configurations tested: {}\n", summary.configurations_tested);

    let _ = writeln!(md, "## Best Performance\n");
    let _ = writeln!(md, "| Implementation | Max TFLOPS | Max Bandwidth (GB/s) | Min Latency (ms) |");
    let _ = writeln!(md, "|---|---:|---:|---:|");
    for name in &summary.implementations {
        if let Some(b) = summary.best_performance.get(name) {
            let _ = writeln!(
                md,
                "| {} | {:.4} | {:.2} | {:.4} |",
                name, b.max_tflops, b.max_bandwidth_gbps, b.min_latency_ms
            );
        }
    }

    if !summary.speedups.is_empty() {
        let _ = writeln!(md, "\n## Speedup vs {}\n", BASELINE);
        let _ = writeln!(md, "| Implementation | B | H | N | D | Speedup | Verdict |");
        let _ = writeln!(md, "|---|---:|---:|---:|---:|---:|---|");
        for s in &summary.speedups {
            let _ = writeln!(
                md,
                "| {} | {} | {} | {} | {} | {:.2}x | {} |",
                s.attention_type,
                s.batch_size,
                s.num_heads,
                s.seq_len,
                s.head_dim,
                s.speedup,
                s.verdict()
            );
        }
    }
    md
}

/// Write `summary.json` and `REPORT.md` into `dir`, creating it if needed.
pub fn write_summary(dir: impl AsRef<Path>, summary: &Summary) -> Result<(), BenchError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(|e| BenchError::io(dir, e))?;

    let json_path = dir.join("summary.json");
    let json = serde_json::to_string_pretty(summary)?;
    fs::write(&json_path, json).map_err(|e| BenchError::io(&json_path, e))?;

    let md_path = dir.join("REPORT.md");
    fs::write(&md_path, render_markdown(summary)).map_err(|e| BenchError::io(&md_path, e))?;

    tracing::info!(dir = %dir.display(), "summary written");
    Ok(())
}
