//! Outcome score normalization and tone.

use adsopt_core::models::OutcomeTone;

/// Normalize to 0–100. Values ≤ 1 are fractions; everything is clamped.
pub fn normalize_outcome_score(score: Option<f64>) -> Option<f64> {
    let raw = score.filter(|s| s.is_finite())?;
    let scaled = if raw <= 1.0 { raw * 100.0 } else { raw };
    Some(scaled.clamp(0.0, 100.0))
}

/// ≥70 positive, 40–69 mixed, <40 negative, no score neutral.
pub fn outcome_tone(score: Option<f64>) -> OutcomeTone {
    match normalize_outcome_score(score) {
        None => OutcomeTone::Neutral,
        Some(s) if s >= 70.0 => OutcomeTone::Positive,
        Some(s) if s >= 40.0 => OutcomeTone::Mixed,
        Some(_) => OutcomeTone::Negative,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tone_boundaries() {
        assert_eq!(outcome_tone(Some(39.0)), OutcomeTone::Negative);
        assert_eq!(outcome_tone(Some(40.0)), OutcomeTone::Mixed);
        assert_eq!(outcome_tone(Some(69.9)), OutcomeTone::Mixed);
        assert_eq!(outcome_tone(Some(70.0)), OutcomeTone::Positive);
        assert_eq!(outcome_tone(None), OutcomeTone::Neutral);
        assert_eq!(outcome_tone(Some(f64::NAN)), OutcomeTone::Neutral);
    }

    #[test]
    fn fractions_scale_and_values_clamp() {
        assert_eq!(normalize_outcome_score(Some(0.75)), Some(75.0));
        assert_eq!(normalize_outcome_score(Some(250.0)), Some(100.0));
        assert_eq!(normalize_outcome_score(Some(-3.0)), Some(0.0));
        assert_eq!(outcome_tone(Some(0.72)), OutcomeTone::Positive);
    }
}
