//! CPU attention kernels over `[batch, heads, seq_len, head_dim]` buffers.
//!
//! `attention_f64` is the verification baseline. The two f32 kernels are the
//! workloads the driver times on a host stream: `Naive` materializes the full
//! score matrix per head, `Online` streams keys with a running softmax and
//! never holds more than one score.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::AttentionConfig;
use crate::error::BenchError;

/// Timed CPU kernel variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kernel {
    Naive,
    Online,
}

impl Kernel {
    pub const ALL: [Kernel; 2] = [Kernel::Naive, Kernel::Online];

    pub fn name(&self) -> &'static str {
        match self {
            Kernel::Naive => "naive",
            Kernel::Online => "online",
        }
    }

    pub fn run(&self, q: &[f32], k: &[f32], v: &[f32], cfg: &AttentionConfig, out: &mut [f32]) {
        match self {
            Kernel::Naive => attention_naive(q, k, v, cfg, out),
            Kernel::Online => attention_online(q, k, v, cfg, out),
        }
    }
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Kernel {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "naive" => Ok(Kernel::Naive),
            "online" | "flash" => Ok(Kernel::Online),
            _ => Err(BenchError::UnknownKernel(s.to_string())),
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Iterate (head offset) for every (batch, head) pair.
fn head_offsets(cfg: &AttentionConfig) -> impl Iterator<Item = usize> {
    let stride = cfg.seq_len() * cfg.head_dim();
    (0..cfg.batch_size() * cfg.num_heads()).map(move |bh| bh * stride)
}

/// Softmax attention with f64 accumulation.
pub fn attention_f64(q: &[f32], k: &[f32], v: &[f32], cfg: &AttentionConfig) -> Vec<f32> {
    let (n, d) = (cfg.seq_len(), cfg.head_dim());
    let scale = cfg.scale() as f64;
    let mut out = vec![0.0f32; cfg.qkv_elements()];
    let mut scores = vec![0.0f64; n];
    let mut acc = vec![0.0f64; d];

    for base in head_offsets(cfg) {
        for i in 0..n {
            let qi = &q[base + i * d..base + (i + 1) * d];
            let mut max = f64::NEG_INFINITY;
            for (j, s) in scores.iter_mut().enumerate() {
                let kj = &k[base + j * d..base + (j + 1) * d];
                let dot: f64 = qi.iter().zip(kj).map(|(&a, &b)| a as f64 * b as f64).sum();
                *s = dot * scale;
                max = max.max(*s);
            }
            let mut sum = 0.0f64;
            for s in scores.iter_mut() {
                *s = (*s - max).exp();
                sum += *s;
            }
            acc.iter_mut().for_each(|a| *a = 0.0);
            for (j, &p) in scores.iter().enumerate() {
                let vj = &v[base + j * d..base + (j + 1) * d];
                for (a, &x) in acc.iter_mut().zip(vj) {
                    *a += p * x as f64;
                }
            }
            for (o, a) in out[base + i * d..base + (i + 1) * d].iter_mut().zip(&acc) {
                *o = (a / sum) as f32;
            }
        }
    }
    out
}

/// f32 attention with a materialized `seq_len × seq_len` score matrix per head.
pub fn attention_naive(q: &[f32], k: &[f32], v: &[f32], cfg: &AttentionConfig, out: &mut [f32]) {
    let (n, d) = (cfg.seq_len(), cfg.head_dim());
    let scale = cfg.scale();
    let mut scores = vec![0.0f32; n * n];

    for base in head_offsets(cfg) {
        // S = scale · Q·Kᵀ
        for i in 0..n {
            let qi = &q[base + i * d..base + (i + 1) * d];
            for j in 0..n {
                let kj = &k[base + j * d..base + (j + 1) * d];
                scores[i * n + j] = dot(qi, kj) * scale;
            }
        }
        // row softmax
        for row in scores.chunks_mut(n) {
            let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            let mut sum = 0.0f32;
            for s in row.iter_mut() {
                *s = (*s - max).exp();
                sum += *s;
            }
            row.iter_mut().for_each(|s| *s /= sum);
        }
        // O = P·V
        for i in 0..n {
            let oi = &mut out[base + i * d..base + (i + 1) * d];
            oi.iter_mut().for_each(|o| *o = 0.0);
            for j in 0..n {
                let p = scores[i * n + j];
                let vj = &v[base + j * d..base + (j + 1) * d];
                for (o, &x) in oi.iter_mut().zip(vj) {
                    *o += p * x;
                }
            }
        }
    }
}

/// f32 single-pass attention with running max and sum (online softmax).
pub fn attention_online(q: &[f32], k: &[f32], v: &[f32], cfg: &AttentionConfig, out: &mut [f32]) {
    let (n, d) = (cfg.seq_len(), cfg.head_dim());
    let scale = cfg.scale();
    let mut acc = vec![0.0f32; d];

    for base in head_offsets(cfg) {
        for i in 0..n {
            let qi = &q[base + i * d..base + (i + 1) * d];
            let mut m = f32::NEG_INFINITY;
            let mut l = 0.0f32;
            acc.iter_mut().for_each(|a| *a = 0.0);

            for j in 0..n {
                let kj = &k[base + j * d..base + (j + 1) * d];
                let s = dot(qi, kj) * scale;
                let m_new = m.max(s);
                let correction = (m - m_new).exp();
                let p = (s - m_new).exp();
                l = l * correction + p;
                let vj = &v[base + j * d..base + (j + 1) * d];
                for (a, &x) in acc.iter_mut().zip(vj) {
                    *a = *a * correction + p * x;
                }
                m = m_new;
            }

            for (o, a) in out[base + i * d..base + (i + 1) * d].iter_mut().zip(&acc) {
                *o = a / l;
            }
        }
    }
}
