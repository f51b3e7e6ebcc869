//! Pure anomaly rules shared by the detection passes.
//!
//! These functions are side-effect free so the thresholds and ratios can be
//! exercised without a database. The detector service owns persistence and
//! notification; this module only decides whether a value is anomalous.

use crate::entities::{AlertKind, Severity};

/// Day-over-day ratio above which a reading counts as a spike.
pub const SPIKE_RATIO: f64 = 1.5;
/// Day-over-day ratio below which a reading counts as a drop.
pub const DROP_RATIO: f64 = 0.3;

/// Outcome of a rule evaluation, carrying everything needed to persist an
/// alert row and render a notification.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleHit {
    pub kind: AlertKind,
    pub severity: Severity,
    pub message: String,
    pub observed: Option<f64>,
    pub threshold: Option<f64>,
}

/// Checks a value against static bounds. The upper bound is evaluated before
/// the lower bound, and each bound is optional independently of the other.
pub fn check_threshold(
    point_id: &str,
    value: f64,
    min_value: Option<f64>,
    max_value: Option<f64>,
    severity: Severity,
) -> Option<RuleHit> {
    if let Some(max) = max_value {
        if value > max {
            return Some(RuleHit {
                kind: AlertKind::Threshold,
                severity,
                message: format!(
                    "point {point_id} value {value:.2} exceeds upper bound {max:.2}"
                ),
                observed: Some(value),
                threshold: Some(max),
            });
        }
    }
    if let Some(min) = min_value {
        if value < min {
            return Some(RuleHit {
                kind: AlertKind::Threshold,
                severity,
                message: format!(
                    "point {point_id} value {value:.2} below lower bound {min:.2}"
                ),
                observed: Some(value),
                threshold: Some(min),
            });
        }
    }
    None
}

/// Compares a reading against the reading from the same hour yesterday.
/// A non-positive previous value disables the comparison for this point.
pub fn check_trend(point_id: &str, current: f64, previous: f64) -> Option<RuleHit> {
    if previous <= 0.0 {
        return None;
    }
    let ratio = current / previous;
    if ratio > SPIKE_RATIO {
        let pct = (ratio - 1.0) * 100.0;
        return Some(RuleHit {
            kind: AlertKind::TrendSpike,
            severity: Severity::Warning,
            message: format!(
                "point {point_id} day-over-day increase of {pct:.1}%: {previous:.2} -> {current:.2}"
            ),
            observed: Some(current),
            threshold: Some(previous * SPIKE_RATIO),
        });
    }
    if ratio < DROP_RATIO {
        let pct = (1.0 - ratio) * 100.0;
        return Some(RuleHit {
            kind: AlertKind::TrendDrop,
            severity: Severity::Warning,
            message: format!(
                "point {point_id} day-over-day decrease of {pct:.1}%: {previous:.2} -> {current:.2}"
            ),
            observed: Some(current),
            threshold: Some(previous * DROP_RATIO),
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_within_bounds_is_quiet() {
        assert_eq!(
            check_threshold("P001", 50.0, Some(10.0), Some(100.0), Severity::High),
            None
        );
    }

    #[test]
    fn threshold_flags_upper_bound() {
        let hit = check_threshold("P001", 120.0, Some(10.0), Some(100.0), Severity::High)
            .expect("upper bound breach");
        assert_eq!(hit.kind, AlertKind::Threshold);
        assert_eq!(hit.severity, Severity::High);
        assert_eq!(hit.threshold, Some(100.0));
        assert!(hit.message.contains("exceeds upper bound"));
    }

    #[test]
    fn threshold_flags_lower_bound() {
        let hit = check_threshold("P001", 2.0, Some(10.0), Some(100.0), Severity::Warning)
            .expect("lower bound breach");
        assert_eq!(hit.threshold, Some(10.0));
        assert!(hit.message.contains("below lower bound"));
    }

    #[test]
    fn threshold_upper_bound_wins_over_lower() {
        // Inverted bounds are a configuration mistake but must still resolve
        // deterministically: the upper bound is checked first.
        let hit = check_threshold("P001", 7.0, Some(10.0), Some(5.0), Severity::High)
            .expect("inverted bounds still report");
        assert!(hit.message.contains("exceeds upper bound"));
        assert_eq!(hit.threshold, Some(5.0));
    }

    #[test]
    fn threshold_each_bound_is_optional() {
        assert_eq!(check_threshold("P001", 1e9, None, None, Severity::High), None);
        assert!(check_threshold("P001", 1e9, None, Some(100.0), Severity::High).is_some());
        assert!(check_threshold("P001", -1.0, Some(0.0), None, Severity::High).is_some());
    }

    #[test]
    fn trend_skips_non_positive_baseline() {
        assert_eq!(check_trend("P001", 50.0, 0.0), None);
        assert_eq!(check_trend("P001", 50.0, -4.0), None);
    }

    #[test]
    fn trend_spike_above_ratio() {
        let hit = check_trend("P001", 16.0, 10.0).expect("60% increase");
        assert_eq!(hit.kind, AlertKind::TrendSpike);
        assert_eq!(hit.severity, Severity::Warning);
        assert_eq!(hit.threshold, Some(15.0));
        assert!(hit.message.contains("day-over-day increase of 60.0%"));
    }

    #[test]
    fn trend_drop_below_ratio() {
        let hit = check_trend("P001", 2.0, 10.0).expect("80% decrease");
        assert_eq!(hit.kind, AlertKind::TrendDrop);
        assert_eq!(hit.threshold, Some(3.0));
        assert!(hit.message.contains("day-over-day decrease of 80.0%"));
    }

    #[test]
    fn trend_ratio_boundaries_are_exclusive() {
        assert_eq!(check_trend("P001", 15.0, 10.0), None);
        assert_eq!(check_trend("P001", 3.0, 10.0), None);
    }
}
