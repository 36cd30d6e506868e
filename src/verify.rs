//! Deterministic input fill and tolerance-based output comparison.

use std::fmt;

/// Seed used by [`init_random_default`].
pub const DEFAULT_SEED: u32 = 42;

/// Max absolute elementwise difference accepted by default.
pub const DEFAULT_TOLERANCE: f32 = 1e-3;

/// 64-bit linear congruential generator (Knuth MMIX constants).
///
/// The sequence for a given seed is part of the output contract.
#[derive(Debug, Clone)]
pub struct Lcg {
    state: u64,
}

impl Lcg {
    const MUL: u64 = 6_364_136_223_846_793_005;
    const INC: u64 = 1_442_695_040_888_963_407;

    pub fn new(seed: u32) -> Self {
        Self { state: seed as u64 }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(Self::MUL).wrapping_add(Self::INC);
        self.state
    }

    /// Uniform in [0, 1). Uses the top 24 bits so every value is exact in f32.
    pub fn next_unit_f32(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u32 << 24) as f32
    }
}

/// Fill `data` with values in [-0.05, 0.05): `(u - 0.5) * 0.1`.
pub fn init_random(data: &mut [f32], seed: u32) {
    let mut rng = Lcg::new(seed);
    for v in data.iter_mut() {
        *v = (rng.next_unit_f32() - 0.5) * 0.1;
    }
}

/// [`init_random`] with seed 42.
pub fn init_random_default(data: &mut [f32]) {
    init_random(data, DEFAULT_SEED)
}

/// Allocate and fill `n` elements.
pub fn random_vec(n: usize, seed: u32) -> Vec<f32> {
    let mut v = vec![0.0f32; n];
    init_random(&mut v, seed);
    v
}

/// First element outside tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mismatch {
    pub index: usize,
    pub reference: f32,
    pub test: f32,
    pub diff: f32,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Mismatch at {}: ref={:.6}, test={:.6}, diff={:.6}",
            self.index, self.reference, self.test, self.diff
        )
    }
}

/// Scan in index order and stop at the first `|ref - test| > tol`.
///
/// Compares the common prefix only; [`verify_results`] also rejects
/// slices of different length. NaN differences
/// never compare greater than `tol`, so NaN outputs pass here; callers that
/// care check finiteness separately.
pub fn find_mismatch(reference: &[f32], test: &[f32], tol: f32) -> Option<Mismatch> {
    reference
        .iter()
        .zip(test.iter())
        .enumerate()
        .find_map(|(index, (&r, &t))| {
            let diff = (r - t).abs();
            (diff > tol).then_some(Mismatch {
                index,
                reference: r,
                test: t,
                diff,
            })
        })
}

/// True iff both slices have the same length and every element is within
/// `tol`. Reports only the first problem on stderr and returns immediately.
pub fn verify_results(reference: &[f32], test: &[f32], tol: f32) -> bool {
    if reference.len() != test.len() {
        eprintln!(
            "Length mismatch: ref={}, test={}",
            reference.len(),
            test.len()
        );
        return false;
    }
    match find_mismatch(reference, test, tol) {
        Some(m) => {
            eprintln!("{}", m);
            false
        }
        None => true,
    }
}

/// Largest absolute elementwise difference.
pub fn max_abs_diff(reference: &[f32], test: &[f32]) -> f32 {
    reference
        .iter()
        .zip(test.iter())
        .map(|(r, t)| (r - t).abs())
        .fold(0.0f32, f32::max)
}
