//! KPI contribution scoring.
//!
//! A record's score is its achievement ratio scaled to a 0..10 band and then
//! weighted by the KPI's weightage (percentage points). With weightages summing
//! to 100 across an employee's KPIs, the sum of scores lands on a 0..10 band
//! for on-target performance.

/// Scale applied to the achievement ratio
const RATIO_SCALE: f64 = 10.0;

/// Weightage is expressed in percentage points
const WEIGHTAGE_UNIT: f64 = 0.01;

/// Coerce numeric-like text to `f64`.
///
/// Empty or unparseable input and non-finite values degrade to 0 so a single
/// bad row never fails a whole report.
pub fn coerce_numeric(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

/// Like `coerce_numeric`, but keeps "not submitted" distinct from 0
pub fn submitted_value(raw: Option<&str>) -> Option<f64> {
    match raw {
        Some(text) if !text.trim().is_empty() => Some(coerce_numeric(text)),
        _ => None,
    }
}

/// `(achievement / goal) * 10 * weightage * 0.01`, or 0 when goal is 0/NaN.
pub fn compute_score(achievement: f64, goal: f64, weightage: f64) -> f64 {
    if goal == 0.0 || goal.is_nan() {
        return 0.0;
    }
    let score = (achievement / goal) * RATIO_SCALE * weightage * WEIGHTAGE_UNIT;
    if score.is_finite() {
        score
    } else {
        0.0
    }
}

/// Text variant used when the inputs come straight from stored form fields
pub fn compute_score_text(achievement: &str, goal: &str, weightage: &str) -> f64 {
    compute_score(
        coerce_numeric(achievement),
        coerce_numeric(goal),
        coerce_numeric(weightage),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn zero_goal_yields_zero() {
        for achievement in [0.0, 1.0, 80.0, -3.0] {
            for weightage in [0.0, 10.0, 100.0] {
                assert_eq!(compute_score(achievement, 0.0, weightage), 0.0);
            }
        }
        assert_eq!(compute_score(10.0, f64::NAN, 50.0), 0.0);
    }

    #[test]
    fn on_target_score() {
        assert!(approx(compute_score(50.0, 50.0, 50.0), 5.0));
    }

    #[test]
    fn partial_achievement_score() {
        assert!(approx(compute_score(25.0, 50.0, 40.0), 2.0));
        assert!(approx(compute_score(80.0, 100.0, 50.0), 4.0));
    }

    #[test]
    fn text_inputs_are_coerced() {
        assert!(approx(compute_score_text("25", "50", "40"), 2.0));
        assert!(approx(compute_score_text(" 80.0 ", "100", "50"), 4.0));
        assert_eq!(compute_score_text("", "100", "50"), 0.0);
        assert_eq!(compute_score_text("lots", "100", "50"), 0.0);
        assert_eq!(compute_score_text("10", "", "50"), 0.0);
    }

    #[test]
    fn coercion_rejects_non_finite_text() {
        assert_eq!(coerce_numeric("inf"), 0.0);
        assert_eq!(coerce_numeric("NaN"), 0.0);
        assert_eq!(coerce_numeric("12.5"), 12.5);
    }

    #[test]
    fn submitted_value_keeps_empty_distinct() {
        assert_eq!(submitted_value(None), None);
        assert_eq!(submitted_value(Some("")), None);
        assert_eq!(submitted_value(Some("  ")), None);
        assert_eq!(submitted_value(Some("abc")), Some(0.0));
        assert_eq!(submitted_value(Some("42")), Some(42.0));
    }
}
