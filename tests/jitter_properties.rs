//! Property-based tests for the jitter primitive and the backoff schedule

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;
use steadfast::jitter::jitter_with;
use steadfast::RetryPolicy;

proptest! {
    #[test]
    fn prop_jitter_stays_within_bound(
        value in -1e6f64..1e6,
        factor in 0.0f64..=1.0,
        seed in any::<u64>(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let v = jitter_with(&mut rng, value, factor).unwrap();
        prop_assert!((v - value).abs() <= value.abs() * factor);
    }

    #[test]
    fn prop_large_factors_stay_within_bound(
        value in -1e3f64..1e3,
        factor in 1.0f64..50.0,
        seed in any::<u64>(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let v = jitter_with(&mut rng, value, factor).unwrap();
        prop_assert!((v - value).abs() <= value.abs() * factor);
    }

    #[test]
    fn prop_zero_factor_is_identity(value in any::<f64>().prop_filter("finite", |v| v.is_finite())) {
        let mut rng = StdRng::seed_from_u64(0);
        prop_assert_eq!(jitter_with(&mut rng, value, 0.0).unwrap(), value);
    }

    #[test]
    fn prop_zero_value_is_identity(factor in 0.0f64..100.0, seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        prop_assert_eq!(jitter_with(&mut rng, 0.0, factor).unwrap(), 0.0);
    }

    #[test]
    fn prop_negative_factor_rejected(value in -1e6f64..1e6, factor in -1e6f64..-1e-9) {
        let mut rng = StdRng::seed_from_u64(0);
        prop_assert!(jitter_with(&mut rng, value, factor).is_err());
    }

    #[test]
    fn prop_same_seed_same_draw(value in -1e6f64..1e6, factor in 0.0f64..=1.0, seed in any::<u64>()) {
        let a = jitter_with(&mut StdRng::seed_from_u64(seed), value, factor).unwrap();
        let b = jitter_with(&mut StdRng::seed_from_u64(seed), value, factor).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_zero_delay_never_waits(
        jitter in 0.0f64..=1.0,
        base in 1.0f64..10.0,
        random in any::<bool>(),
        fail_count in 0u32..50,
        seed in any::<u64>(),
    ) {
        let schedule = RetryPolicy::new()
            .with_max_attempts(50)
            .with_jitter(jitter)
            .with_backoff(base)
            .with_random_exponent(random)
            .build()
            .unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        prop_assert_eq!(schedule.wait_time(fail_count, &mut rng), Duration::ZERO);
    }

    #[test]
    fn prop_random_exponent_never_exceeds_deterministic(
        fail_count in 1u32..12,
        seed in any::<u64>(),
    ) {
        let policy = RetryPolicy::new()
            .with_max_attempts(20)
            .with_delay(Duration::from_millis(3))
            .with_backoff(2.0);
        let fixed = policy.build().unwrap();
        let random = policy.with_random_exponent(true).build().unwrap();

        let mut rng = StdRng::seed_from_u64(seed);
        let ceiling = fixed.wait_time(fail_count, &mut rng);
        let drawn = random.wait_time(fail_count, &mut rng);
        prop_assert!(drawn <= ceiling);
        prop_assert!(drawn >= Duration::from_millis(3));
    }

    #[test]
    fn prop_jittered_wait_within_bound(
        fail_count in 1u32..8,
        factor in 0.0f64..=1.0,
        seed in any::<u64>(),
    ) {
        let schedule = RetryPolicy::new()
            .with_max_attempts(10)
            .with_delay(Duration::from_millis(10))
            .with_jitter(factor)
            .with_backoff(2.0)
            .build()
            .unwrap();
        let mut rng = StdRng::seed_from_u64(seed);

        let nominal = 0.010 * 2f64.powi(fail_count as i32 - 1);
        let wait = schedule.wait_time(fail_count, &mut rng).as_secs_f64();
        prop_assert!((wait - nominal).abs() <= nominal * factor + 1e-9);
    }
}
