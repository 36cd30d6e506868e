use clap::Parser;

/// Attention kernel measurement harness
#[derive(Parser, Debug)]
#[command(name = "attention-bench", version, about)]
pub struct BenchArgs {
    /// Kernels to measure (naive, online). Defaults to all.
    #[arg(value_name = "KERNELS")]
    pub kernels: Vec<String>,

    /// Sequence lengths to sweep (e.g., 128,512,1K,4K)
    #[arg(long, value_delimiter = ',')]
    pub seq_lens: Option<Vec<String>>,

    /// Batch size
    #[arg(long, short = 'b', default_value_t = 1)]
    pub batch: usize,

    /// Number of attention heads
    #[arg(long, default_value_t = 8)]
    pub heads: usize,

    /// Per-head feature dimension
    #[arg(long, default_value_t = 64)]
    pub head_dim: usize,

    /// Number of measured runs per shape (overrides the profile)
    #[arg(long)]
    pub runs: Option<u32>,

    /// Number of warmup runs before measurement (overrides the profile)
    #[arg(long)]
    pub warmup: Option<u32>,

    /// Benchmark profile: quick (128,512/3/1), standard (128..1K/10/3), thorough (128..4K/30/3)
    #[arg(long)]
    pub profile: Option<String>,

    /// Skip comparison against the f64 reference
    #[arg(long)]
    pub no_verify: bool,

    /// Print the materialized vs fused memory table and exit
    #[arg(long)]
    pub memory_table: bool,

    /// Write CSV results to file
    #[arg(long)]
    pub csv_file: Option<String>,

    /// Write JSON results to file
    #[arg(long)]
    pub json_file: Option<String>,

    /// Write summary.json and REPORT.md into this directory
    #[arg(long)]
    pub summary_dir: Option<String>,

    /// Debug-level logging (RUST_LOG takes precedence)
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = BenchArgs::parse_from(["attention-bench"]);
        assert!(args.kernels.is_empty());
        assert_eq!((args.batch, args.heads, args.head_dim), (1, 8, 64));
        assert!(args.runs.is_none());
        assert!(args.seq_lens.is_none());
        assert!(!args.no_verify);
    }

    #[test]
    fn test_seq_lens_comma_delimited() {
        let args = BenchArgs::parse_from([
            "attention-bench",
            "online",
            "--seq-lens",
            "128,1K",
            "--runs",
            "5",
        ]);
        assert_eq!(args.kernels, vec!["online"]);
        assert_eq!(args.seq_lens.unwrap(), vec!["128", "1K"]);
        assert_eq!(args.runs, Some(5));
    }
}
