//! Property-based tests for the size model, random fill and verification.

use attention_bench::verify::{find_mismatch, random_vec};
use attention_bench::{
    init_random, verify_results, AttentionConfig, PerfReport, MEMORY_BOUND_THRESHOLD,
};
use proptest::prelude::*;

fn dims() -> impl Strategy<Value = (usize, usize, usize, usize)> {
    (1usize..8, 1usize..16, 1usize..4096, 1usize..=128)
}

proptest! {
    #[test]
    fn qkv_size_equals_output_size((b, h, s, d) in dims()) {
        let cfg = AttentionConfig::new(b, h, s, d);
        prop_assert_eq!(cfg.qkv_size(), cfg.output_size());
        prop_assert_eq!(cfg.qkv_size(), b * h * s * d * 4);
    }

    #[test]
    fn seq_len_scaling((b, h, s, d) in dims()) {
        let base = AttentionConfig::new(b, h, s, d);
        let doubled = AttentionConfig::new(b, h, 2 * s, d);
        prop_assert_eq!(doubled.qkv_size(), 2 * base.qkv_size());
        prop_assert_eq!(doubled.attention_matrix_size(), 4 * base.attention_matrix_size());
        prop_assert_eq!(doubled.flop_count(), 4 * base.flop_count());
    }

    #[test]
    fn intensity_is_seq_len_over_eight((b, h, s, d) in dims()) {
        let r = PerfReport::new(1.0, &AttentionConfig::new(b, h, s, d));
        let expected = s as f64 / 8.0;
        // evaluated in f32
        prop_assert!((r.arithmetic_intensity - expected).abs() <= expected * 1e-5);
        prop_assert_eq!(r.memory_bound, r.arithmetic_intensity < MEMORY_BOUND_THRESHOLD);
    }

    #[test]
    fn scale_is_inverse_sqrt(d in 1usize..=128) {
        let cfg = AttentionConfig::new(1, 1, 1, d);
        prop_assert_eq!(cfg.scale().to_bits(), (1.0f32 / (d as f32).sqrt()).to_bits());
    }

    #[test]
    fn init_random_deterministic_and_bounded(len in 0usize..2048, seed in any::<u32>()) {
        let mut a = vec![0.0f32; len];
        let mut b = vec![1.0f32; len];
        init_random(&mut a, seed);
        init_random(&mut b, seed);
        prop_assert_eq!(&a, &b);
        prop_assert!(a.iter().all(|&x| (-0.05..0.05).contains(&x)));
    }

    #[test]
    fn verify_within_tolerance_passes(len in 1usize..512, seed in any::<u32>()) {
        let reference = random_vec(len, seed);
        let test: Vec<f32> = reference.iter().map(|x| x + 5e-4).collect();
        prop_assert!(verify_results(&reference, &test, 1e-3));
    }

    #[test]
    fn verify_finds_first_violation(
        len in 2usize..512,
        seed in any::<u32>(),
        first in any::<prop::sample::Index>(),
    ) {
        let reference = random_vec(len, seed);
        let mut test = reference.clone();
        let i = first.index(len - 1);
        test[i] += 1.0;
        test[len - 1] += 1.0;
        prop_assert!(!verify_results(&reference, &test, 1e-3));
        prop_assert_eq!(find_mismatch(&reference, &test, 1e-3).map(|m| m.index), Some(i));
    }

    #[test]
    fn verify_rejects_length_mismatch(len in 1usize..512, cut in 1usize..512, seed in any::<u32>()) {
        let reference = random_vec(len, seed);
        let truncated = &reference[..len.saturating_sub(cut)];
        prop_assert!(!verify_results(&reference, truncated, 1e-3));
    }
}
