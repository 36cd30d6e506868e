use attention_bench::BenchError;
use serde::{Deserialize, Serialize};

/// A benchmark profile with preset sequence lengths, runs, and warmup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchProfile {
    pub name: String,
    pub seq_lens: Vec<usize>,
    pub runs: u32,
    pub warmup: u32,
}

/// Returns the "quick" profile: 128,512 / 3 runs / 1 warmup.
pub fn quick_profile() -> BenchProfile {
    BenchProfile {
        name: "quick".to_string(),
        seq_lens: vec![128, 512],
        runs: 3,
        warmup: 1,
    }
}

/// Returns the "standard" profile: 128..1K / 10 runs / 3 warmup.
pub fn standard_profile() -> BenchProfile {
    BenchProfile {
        name: "standard".to_string(),
        seq_lens: vec![128, 256, 512, 1024],
        runs: 10,
        warmup: 3,
    }
}

/// Returns the "thorough" profile: 128..4K / 30 runs / 3 warmup.
pub fn thorough_profile() -> BenchProfile {
    BenchProfile {
        name: "thorough".to_string(),
        seq_lens: vec![128, 256, 512, 1024, 2048, 4096],
        runs: 30,
        warmup: 3,
    }
}

/// Lookup a profile by name.
pub fn get_profile(name: &str) -> Result<BenchProfile, BenchError> {
    match name {
        "quick" => Ok(quick_profile()),
        "standard" => Ok(standard_profile()),
        "thorough" => Ok(thorough_profile()),
        _ => Err(BenchError::UnknownProfile(name.to_string())),
    }
}

/// Parse a sequence length: "512", "1K"/"1k" (= 1024), "4_096".
pub fn parse_seq_len(s: &str) -> Result<usize, BenchError> {
    let s = s.trim();
    let invalid = |reason: String| BenchError::InvalidSize {
        input: s.to_string(),
        reason,
    };

    let (digits, multiplier) = match s.strip_suffix('K').or_else(|| s.strip_suffix('k')) {
        Some(prefix) => (prefix, 1024),
        None => (s, 1),
    };
    let n = digits
        .replace('_', "")
        .parse::<usize>()
        .map_err(|e| invalid(e.to_string()))?;
    n.checked_mul(multiplier)
        .ok_or_else(|| invalid("overflows usize".to_string()))
}

/// Parse a list of sequence lengths.
pub fn parse_seq_lens(raw: &[String]) -> Result<Vec<usize>, BenchError> {
    raw.iter().map(|s| parse_seq_len(s)).collect()
}
