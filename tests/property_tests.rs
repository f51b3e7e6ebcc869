//! Property-based tests for the simulation and anomaly-rule core.
//!
//! These use proptest to verify invariants across a wide range of inputs,
//! catching edge cases the example-based tests might miss.

use proptest::prelude::*;
use rand::{rngs::StdRng, SeedableRng};

use gridpulse_api::{
    entities::{AlertKind, Severity},
    identity::{device_identity, DEVICE_ID_RANGE},
    rules::{check_threshold, check_trend, DROP_RATIO, SPIKE_RATIO},
    services::simulator::{generate_increment, hourly_factor},
};

fn point_id_strategy() -> impl Strategy<Value = String> {
    "[A-Z]{1,3}[0-9]{1,6}".prop_map(|s| s)
}

// Property: increments are always storable readings
proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    #[test]
    fn increments_are_finite_non_negative_and_rounded(
        mean in 0.0f64..500.0,
        std in 0.0f64..100.0,
        hour in 0u32..24,
        anomaly_rate in 0.0f64..1.0,
        seed in any::<u64>(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let incr = generate_increment(&mut rng, mean, std, hour, anomaly_rate);

        prop_assert!(incr.is_finite(), "increment must be a real number");
        prop_assert!(incr >= 0.0, "consumption cannot be negative: {}", incr);
        // Stored readings carry two decimal places.
        prop_assert!(
            ((incr * 100.0).round() / 100.0 - incr).abs() < 1e-9,
            "increment {} is not rounded to cents",
            incr
        );
    }

    #[test]
    fn quiet_profile_tracks_the_hourly_weighting(
        mean in 0.0f64..500.0,
        hour in 0u32..24,
        seed in any::<u64>(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        // No noise and no anomalies leaves only the hour-of-day weighting.
        let incr = generate_increment(&mut rng, mean, 0.0, hour, 0.0);
        let expected = (mean * hourly_factor(hour) * 100.0).round() / 100.0;
        prop_assert!((incr - expected).abs() < 1e-9);
    }
}

// Property: the hour-of-day weighting is a small fixed band
proptest! {
    #[test]
    fn hourly_factor_stays_within_band(hour in 0u32..24) {
        let factor = hourly_factor(hour);
        prop_assert!((0.5..=1.4).contains(&factor));
        prop_assert!(
            [0.5, 0.7, 1.0, 1.3, 1.4].contains(&factor),
            "unexpected factor {} for hour {}",
            factor,
            hour
        );
    }
}

// Property: point ids map to stable, bounded device ids
proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn device_identity_is_deterministic_and_bounded(point_id in point_id_strategy()) {
        let first = device_identity(&point_id);
        let second = device_identity(&point_id);
        prop_assert_eq!(first, second, "derivation must be stable");
        prop_assert!(first >= 0);
        prop_assert!((first as u64) < DEVICE_ID_RANGE);
    }
}

// Property: the threshold rule fires exactly when a bound is crossed
proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    #[test]
    fn threshold_rule_fires_iff_out_of_bounds(
        min in -100.0f64..100.0,
        span in 0.1f64..100.0,
        value in -200.0f64..300.0,
    ) {
        let max = min + span;
        let hit = check_threshold("P001", value, Some(min), Some(max), Severity::High);
        let out_of_bounds = value > max || value < min;

        prop_assert_eq!(hit.is_some(), out_of_bounds);
        if let Some(hit) = hit {
            prop_assert_eq!(hit.kind, AlertKind::Threshold);
            prop_assert_eq!(hit.severity, Severity::High);
            prop_assert_eq!(hit.observed, Some(value));
        }
    }
}

// Property: the trend rule fires only outside the spike/drop band
proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    #[test]
    fn trend_rule_fires_only_outside_the_band(
        current in 0.0f64..1000.0,
        previous in 0.01f64..1000.0,
    ) {
        let ratio = current / previous;
        let hit = check_trend("P001", current, previous);

        prop_assert_eq!(hit.is_some(), ratio > SPIKE_RATIO || ratio < DROP_RATIO);
        if let Some(hit) = hit {
            prop_assert_eq!(hit.severity, Severity::Warning);
            if ratio > SPIKE_RATIO {
                prop_assert_eq!(hit.kind, AlertKind::TrendSpike);
            } else {
                prop_assert_eq!(hit.kind, AlertKind::TrendDrop);
            }
            prop_assert_eq!(hit.observed, Some(current));
        }
    }

    #[test]
    fn trend_rule_never_fires_for_a_non_positive_baseline(
        current in 0.0f64..1000.0,
        previous in -1000.0f64..=0.0,
    ) {
        prop_assert!(check_trend("P001", current, previous).is_none());
    }
}
