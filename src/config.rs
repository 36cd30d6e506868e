//! Problem dimensions for one batched multi-head attention run.
//!
//! Every byte size is derived from the four dimensions on each call. The
//! softmax scale is fixed at construction from `head_dim` using an f32 square
//! root so it matches the value kernels apply on-device.

use serde::{Deserialize, Serialize};

use crate::error::BenchError;

/// Bytes per element. All buffers are f32.
pub const ELEMENT_BYTES: usize = std::mem::size_of::<f32>();

/// Longest sequence the bundled kernels are sized for.
pub const MAX_SEQ_LEN: usize = 4096;

/// Largest head dimension the bundled kernels are sized for.
pub const MAX_HEAD_DIM: usize = 128;

/// Batched multi-head attention problem size.
///
/// Layout of Q, K, V and O is `[batch, heads, seq_len, head_dim]`.
/// `new` does not range-check; zero dimensions produce meaningless sizes and
/// an infinite scale. Callers validate upstream (see [`AttentionConfig::validate`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttentionConfig {
    batch_size: usize,
    num_heads: usize,
    seq_len: usize,
    head_dim: usize,
    /// 1/sqrt(head_dim), f32 semantics
    scale: f32,
}

impl AttentionConfig {
    pub fn new(batch_size: usize, num_heads: usize, seq_len: usize, head_dim: usize) -> Self {
        Self {
            batch_size,
            num_heads,
            seq_len,
            head_dim,
            scale: 1.0 / (head_dim as f32).sqrt(),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn num_heads(&self) -> usize {
        self.num_heads
    }

    pub fn seq_len(&self) -> usize {
        self.seq_len
    }

    pub fn head_dim(&self) -> usize {
        self.head_dim
    }

    /// Softmax scaling factor applied to Q·Kᵀ.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Element count of one of Q, K, V or O.
    pub fn qkv_elements(&self) -> usize {
        self.batch_size * self.num_heads * self.seq_len * self.head_dim
    }

    /// Bytes in one of Q, K or V.
    pub fn qkv_size(&self) -> usize {
        self.qkv_elements() * ELEMENT_BYTES
    }

    /// Bytes in the output. Same shape as Q.
    pub fn output_size(&self) -> usize {
        self.qkv_size()
    }

    /// Bytes in the full `[batch, heads, seq_len, seq_len]` score matrix.
    pub fn attention_matrix_size(&self) -> usize {
        self.batch_size * self.num_heads * self.seq_len * self.seq_len * ELEMENT_BYTES
    }

    /// Standard attention FLOP approximation: `2·B·H·N²·D`.
    pub fn flop_count(&self) -> u64 {
        2 * self.batch_size as u64
            * self.num_heads as u64
            * self.seq_len as u64
            * self.seq_len as u64
            * self.head_dim as u64
    }

    /// Fused-kernel traffic: read Q, K, V once and write O once.
    ///
    /// The score matrix is not counted even for kernels that materialize it.
    pub fn traffic_bytes(&self) -> u64 {
        (self.qkv_size() * 3 + self.output_size()) as u64
    }

    /// Check dimensions before constructing buffers or dispatching kernels.
    pub fn validate(&self) -> Result<(), BenchError> {
        let dims = [
            ("batch_size", self.batch_size),
            ("num_heads", self.num_heads),
            ("seq_len", self.seq_len),
            ("head_dim", self.head_dim),
        ];
        for (name, value) in dims {
            if value == 0 {
                return Err(BenchError::InvalidDimension {
                    name,
                    value,
                    reason: "must be positive",
                });
            }
        }
        if self.seq_len > MAX_SEQ_LEN {
            return Err(BenchError::InvalidDimension {
                name: "seq_len",
                value: self.seq_len,
                reason: "exceeds MAX_SEQ_LEN (4096)",
            });
        }
        if self.head_dim > MAX_HEAD_DIM {
            return Err(BenchError::InvalidDimension {
                name: "head_dim",
                value: self.head_dim,
                reason: "exceeds MAX_HEAD_DIM (128)",
            });
        }
        Ok(())
    }

    /// Short shape label, e.g. "B=1,H=8,N=512,D=64".
    pub fn label(&self) -> String {
        format!(
            "B={},H={},N={},D={}",
            self.batch_size, self.num_heads, self.seq_len, self.head_dim
        )
    }
}
