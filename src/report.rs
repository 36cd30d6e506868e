//! Roofline-style diagnostics for one timed run.
//!
//! FLOPs and bytes come from [`AttentionConfig`]; rates are derived from the
//! elapsed device time. The text layout of [`write_stats`] is consumed by log
//! scrapers and must not change.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::config::AttentionConfig;

/// FLOP/byte below which a run is classified memory-bound. Not hardware-derived.
pub const MEMORY_BOUND_THRESHOLD: f64 = 10.0;

/// Derived metrics for one (elapsed time, config) pair.
///
/// Rates and intensity are evaluated in f32, left to right, and widened to
/// f64 for storage. The printed block depends on that rounding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerfReport {
    pub time_ms: f32,
    pub flops: u64,
    pub bytes: u64,
    pub gflops: f64,
    pub bandwidth_gbps: f64,
    pub arithmetic_intensity: f64,
    pub memory_bound: bool,
}

impl PerfReport {
    pub fn new(time_ms: f32, cfg: &AttentionConfig) -> Self {
        let flops_f32 = 2.0f32
            * cfg.batch_size() as f32
            * cfg.num_heads() as f32
            * cfg.seq_len() as f32
            * cfg.seq_len() as f32
            * cfg.head_dim() as f32;
        let bytes_f32 = cfg.traffic_bytes() as f32;
        let denom = time_ms * 1e6f32;
        let arithmetic_intensity = flops_f32 / bytes_f32;

        Self {
            time_ms,
            flops: cfg.flop_count(),
            bytes: cfg.traffic_bytes(),
            gflops: (flops_f32 / denom) as f64,
            bandwidth_gbps: (bytes_f32 / denom) as f64,
            arithmetic_intensity: arithmetic_intensity as f64,
            memory_bound: (arithmetic_intensity as f64) < MEMORY_BOUND_THRESHOLD,
        }
    }

    pub fn tflops(&self) -> f64 {
        self.gflops / 1000.0
    }
}

/// Write the fixed-format stats block.
pub fn write_stats<W: Write>(
    out: &mut W,
    name: &str,
    time_ms: f32,
    cfg: &AttentionConfig,
) -> io::Result<PerfReport> {
    let report = PerfReport::new(time_ms, cfg);
    writeln!(out)?;
    writeln!(out, "=== {} ===", name)?;
    writeln!(out, "Time: {:.3} ms", report.time_ms)?;
    writeln!(out, "GFLOPS: {:.2}", report.gflops)?;
    writeln!(out, "Bandwidth: {:.2} GB/s", report.bandwidth_gbps)?;
    writeln!(
        out,
        "Arithmetic Intensity: {:.2} FLOP/Byte",
        report.arithmetic_intensity
    )?;
    writeln!(
        out,
        "Memory-bound: {}",
        if report.memory_bound { "YES" } else { "NO" }
    )?;
    Ok(report)
}

/// Stats block as a string.
pub fn format_stats(name: &str, time_ms: f32, cfg: &AttentionConfig) -> String {
    let mut buf = Vec::new();
    // writing into a Vec cannot fail
    let _ = write_stats(&mut buf, name, time_ms, cfg);
    String::from_utf8_lossy(&buf).into_owned()
}

/// Print the stats block to stdout and return the metrics.
pub fn print_stats(name: &str, time_ms: f32, cfg: &AttentionConfig) -> PerfReport {
    write_stats(&mut io::stdout().lock(), name, time_ms, cfg)
        .unwrap_or_else(|_| PerfReport::new(time_ms, cfg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_config_metrics() {
        let cfg = AttentionConfig::new(1, 1, 128, 64);
        let r = PerfReport::new(1.0, &cfg);
        assert_eq!(r.flops, 2_097_152);
        assert_eq!(r.bytes, 131_072);
        assert_eq!(r.arithmetic_intensity, 16.0);
        assert!(!r.memory_bound);
        assert!((r.gflops - 2.097152).abs() < 1e-6);
        assert!((r.bandwidth_gbps - 0.131072).abs() < 1e-6);
    }

    #[test]
    fn test_intensity_independent_of_head_dim() {
        // 2·N²·D FLOPs over 16·N·D bytes = N/8
        for d in [1usize, 4, 64, 128] {
            let r = PerfReport::new(1.0, &AttentionConfig::new(1, 1, 128, d));
            assert_eq!(r.arithmetic_intensity, 16.0, "head_dim={d}");
        }
    }

    #[test]
    fn test_memory_bound_below_threshold() {
        // seq_len=64 -> intensity 8
        let r = PerfReport::new(1.0, &AttentionConfig::new(1, 1, 64, 64));
        assert_eq!(r.arithmetic_intensity, 8.0);
        assert!(r.memory_bound);
    }

    #[test]
    fn test_threshold_is_strict() {
        // seq_len=80 -> intensity exactly 10
        let r = PerfReport::new(1.0, &AttentionConfig::new(2, 4, 80, 32));
        assert_eq!(r.arithmetic_intensity, 10.0);
        assert!(!r.memory_bound);
    }

    #[test]
    fn test_stats_text_layout() {
        let cfg = AttentionConfig::new(1, 1, 128, 64);
        let text = format_stats("flash", 0.5, &cfg);
        let expected = "\n=== flash ===\n\
                        Time: 0.500 ms\n\
                        GFLOPS: 4.19\n\
                        Bandwidth: 0.26 GB/s\n\
                        Arithmetic Intensity: 16.00 FLOP/Byte\n\
                        Memory-bound: NO\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_stats_text_memory_bound_yes() {
        let cfg = AttentionConfig::new(1, 1, 16, 64);
        let text = format_stats("tiny", 0.001, &cfg);
        assert!(text.ends_with("Memory-bound: YES\n"), "{text}");
        assert!(text.contains("Arithmetic Intensity: 2.00 FLOP/Byte"));
    }

    #[test]
    fn test_rates_use_f32_rounding() {
        // f64 division gives 23775.08 here; the f32 chain gives 23775.07
        let cfg = AttentionConfig::new(1, 8, 4096, 64);
        let text = format_stats("flash", 0.7226, &cfg);
        let expected = "\n=== flash ===\n\
                        Time: 0.723 ms\n\
                        GFLOPS: 23775.07\n\
                        Bandwidth: 46.44 GB/s\n\
                        Arithmetic Intensity: 512.00 FLOP/Byte\n\
                        Memory-bound: NO\n";
        assert_eq!(text, expected);
        let r = PerfReport::new(0.7226, &cfg);
        assert_eq!(r.gflops, 23775.07421875);
    }

    #[test]
    fn test_tflops() {
        let cfg = AttentionConfig::new(1, 1, 128, 64);
        let r = PerfReport::new(0.001, &cfg);
        assert!((r.tflops() - 2.097152).abs() < 1e-6);
    }
}
