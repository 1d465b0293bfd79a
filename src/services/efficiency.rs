use jiff::civil::Date;

use crate::models::project::EfficiencyStatus;

/// At or below this share of the estimate a project counts as ahead
pub const AHEAD_MAX_RATIO: f64 = 0.7;
/// At or below this share of the estimate a project is on track
pub const ON_TRACK_MAX_RATIO: f64 = 0.85;
/// Above this share of the estimate a project is behind
pub const SLOW_MAX_RATIO: f64 = 1.0;

/// Classify a project by the ratio of hours spent to hours estimated.
pub fn classify(time_spent: f64, estimated_time: f64) -> EfficiencyStatus {
    if estimated_time <= 0.0 {
        return if time_spent > 0.0 {
            EfficiencyStatus::Behind
        } else {
            EfficiencyStatus::Ahead
        };
    }

    let ratio = time_spent / estimated_time;
    if ratio > SLOW_MAX_RATIO {
        EfficiencyStatus::Behind
    } else if ratio > ON_TRACK_MAX_RATIO {
        EfficiencyStatus::Slow
    } else if ratio > AHEAD_MAX_RATIO {
        EfficiencyStatus::OnTrack
    } else {
        EfficiencyStatus::Ahead
    }
}

/// A project can only stay ahead while it is active and before its due date.
pub fn adjust_for_schedule(
    status: EfficiencyStatus,
    due_date: Date,
    today: Date,
    is_active: bool,
) -> EfficiencyStatus {
    match status {
        EfficiencyStatus::Ahead if today > due_date || !is_active => EfficiencyStatus::OnTrack,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;

    #[test]
    fn test_ratio_of_one_is_slow() {
        assert_eq!(classify(10.0, 10.0), EfficiencyStatus::Slow);
    }

    #[test]
    fn test_just_over_estimate_is_behind() {
        assert_eq!(classify(10.1, 10.0), EfficiencyStatus::Behind);
    }

    #[test]
    fn test_no_time_spent_is_ahead() {
        assert_eq!(classify(0.0, 10.0), EfficiencyStatus::Ahead);
    }

    #[test]
    fn test_threshold_boundaries() {
        assert_eq!(classify(7.0, 10.0), EfficiencyStatus::Ahead);
        assert_eq!(classify(7.01, 10.0), EfficiencyStatus::OnTrack);
        assert_eq!(classify(8.5, 10.0), EfficiencyStatus::OnTrack);
        assert_eq!(classify(8.51, 10.0), EfficiencyStatus::Slow);
    }

    #[test]
    fn test_non_positive_estimate_does_not_divide() {
        assert_eq!(classify(0.0, 0.0), EfficiencyStatus::Ahead);
        assert_eq!(classify(1.0, 0.0), EfficiencyStatus::Behind);
    }

    #[test]
    fn test_ahead_is_demoted_after_due_date() {
        let due = date(2024, 3, 1);
        assert_eq!(
            adjust_for_schedule(EfficiencyStatus::Ahead, due, date(2024, 3, 1), true),
            EfficiencyStatus::Ahead
        );
        assert_eq!(
            adjust_for_schedule(EfficiencyStatus::Ahead, due, date(2024, 3, 2), true),
            EfficiencyStatus::OnTrack
        );
        assert_eq!(
            adjust_for_schedule(EfficiencyStatus::Ahead, due, date(2024, 2, 1), false),
            EfficiencyStatus::OnTrack
        );
        assert_eq!(
            adjust_for_schedule(EfficiencyStatus::Behind, due, date(2024, 3, 2), true),
            EfficiencyStatus::Behind
        );
    }
}
