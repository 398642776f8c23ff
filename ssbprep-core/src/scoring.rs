//! Screening decision: two OIR percentages plus the PPDT score.
//!
//! `objective = mean(oir) / 10`, `final = 0.4 * objective + 0.6 * subjective`.
//! Thresholds pick IN / BORDERLINE / OUT, then the hard floors can force OUT. Each
//! floor that fires leaves a reason string on the decision.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const OBJECTIVE_WEIGHT: f32 = 0.4;
pub const SUBJECTIVE_WEIGHT: f32 = 0.6;
pub const IN_THRESHOLD: f32 = 7.5;
pub const BORDERLINE_THRESHOLD: f32 = 6.0;

pub const SUBJECTIVE_FLOOR: f32 = 5.0;
pub const AVERAGE_OIR_FLOOR: f32 = 40.0;
pub const EACH_OIR_FLOOR: f32 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScreeningStatus {
    In,
    Borderline,
    Out,
}

impl ScreeningStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ScreeningStatus::In => "IN",
            ScreeningStatus::Borderline => "BORDERLINE",
            ScreeningStatus::Out => "OUT",
        }
    }
}

impl fmt::Display for ScreeningStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningDecision {
    pub oir_verbal_pct: f32,
    pub oir_nonverbal_pct: f32,
    /// Mean OIR percentage mapped to 0–10.
    pub objective: f32,
    /// PPDT score, 0–10.
    pub subjective: f32,
    pub final_score: f32,
    pub status: ScreeningStatus,
    /// One entry per hard floor that forced the result to OUT.
    #[serde(default)]
    pub overrides: Vec<String>,
}

impl ScreeningDecision {
    /// Override reasons as a single line, or `None` if no floor fired.
    pub fn override_text(&self) -> Option<String> {
        (!self.overrides.is_empty()).then(|| self.overrides.join("; "))
    }
}

/// Combines the OIR percentages (0–100) with the PPDT score (0–10).
pub fn decide(oir_verbal_pct: f32, oir_nonverbal_pct: f32, subjective: f32) -> ScreeningDecision {
    let oir1 = oir_verbal_pct.clamp(0.0, 100.0);
    let oir2 = oir_nonverbal_pct.clamp(0.0, 100.0);
    let subjective = subjective.clamp(0.0, 10.0);

    let avg_oir = (oir1 + oir2) / 2.0;
    let objective = avg_oir / 10.0;
    let final_score = OBJECTIVE_WEIGHT * objective + SUBJECTIVE_WEIGHT * subjective;

    let mut status = if final_score >= IN_THRESHOLD {
        ScreeningStatus::In
    } else if final_score >= BORDERLINE_THRESHOLD {
        ScreeningStatus::Borderline
    } else {
        ScreeningStatus::Out
    };

    let mut overrides = Vec::new();
    if subjective < SUBJECTIVE_FLOOR {
        overrides.push(format!(
            "PPDT score {subjective:.1} is below the minimum of {SUBJECTIVE_FLOOR:.0}"
        ));
    }
    if avg_oir < AVERAGE_OIR_FLOOR {
        overrides.push(format!(
            "average OIR {avg_oir:.0}% is below {AVERAGE_OIR_FLOOR:.0}%"
        ));
    }
    if oir1 < EACH_OIR_FLOOR && oir2 < EACH_OIR_FLOOR {
        overrides.push(format!(
            "both OIR sets ({oir1:.0}%, {oir2:.0}%) are below {EACH_OIR_FLOOR:.0}%"
        ));
    }
    if !overrides.is_empty() {
        status = ScreeningStatus::Out;
    }

    ScreeningDecision {
        oir_verbal_pct: oir1,
        oir_nonverbal_pct: oir2,
        objective,
        subjective,
        final_score,
        status,
        overrides,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn strong_candidate_is_in() {
        let d = decide(80.0, 80.0, 8.0);
        assert!(close(d.objective, 8.0));
        assert!(close(d.final_score, 8.0));
        assert_eq!(d.status, ScreeningStatus::In);
        assert!(d.override_text().is_none());
    }

    #[test]
    fn low_ppdt_forces_out() {
        let d = decide(80.0, 80.0, 4.0);
        // 0.4 * 8 + 0.6 * 4 = 5.6, already OUT numerically, but the floor is recorded.
        assert_eq!(d.status, ScreeningStatus::Out);
        assert_eq!(d.overrides.len(), 1);
        assert!(d.overrides[0].contains("PPDT"));
    }

    #[test]
    fn floor_overrides_a_passing_number() {
        // 0.4 * 3.5 + 0.6 * 10 = 7.4 → BORDERLINE, but average OIR 35% < 40%
        // and both sets < 50%.
        let d = decide(30.0, 40.0, 10.0);
        assert!(close(d.final_score, 7.4));
        assert_eq!(d.status, ScreeningStatus::Out);
        assert_eq!(d.overrides.len(), 2);
    }

    #[test]
    fn borderline_band() {
        let d = decide(60.0, 70.0, 6.5);
        // 0.4 * 6.5 + 0.6 * 6.5 = 6.5
        assert!(close(d.final_score, 6.5));
        assert_eq!(d.status, ScreeningStatus::Borderline);
    }

    #[test]
    fn one_weak_set_is_not_a_floor() {
        let d = decide(45.0, 95.0, 8.0);
        assert!(d.overrides.is_empty());
        assert_eq!(d.status, ScreeningStatus::In);
    }

    #[test]
    fn exactly_at_the_in_threshold_is_in() {
        // 0.4 * 7.5 + 0.6 * 7.5 = 7.5
        let d = decide(75.0, 75.0, 7.5);
        assert_eq!(d.final_score, IN_THRESHOLD);
        assert_eq!(d.status, ScreeningStatus::In);
        assert!(d.overrides.is_empty());
    }

    #[test]
    fn exactly_at_the_borderline_threshold_is_borderline() {
        // 0.4 * 6 + 0.6 * 6 = 6.0
        let d = decide(60.0, 60.0, 6.0);
        assert_eq!(d.final_score, BORDERLINE_THRESHOLD);
        assert_eq!(d.status, ScreeningStatus::Borderline);
        assert!(d.overrides.is_empty());
    }

    #[test]
    fn just_below_each_threshold_drops_a_band() {
        // 0.4 * 7.5 + 0.6 * 7.4 = 7.44
        let d = decide(75.0, 75.0, 7.4);
        assert!(close(d.final_score, 7.44));
        assert_eq!(d.status, ScreeningStatus::Borderline);
        assert!(d.overrides.is_empty());

        // 0.4 * 6 + 0.6 * 5.9 = 5.94, with every floor cleared.
        let d = decide(60.0, 60.0, 5.9);
        assert!(close(d.final_score, 5.94));
        assert_eq!(d.status, ScreeningStatus::Out);
        assert!(d.overrides.is_empty());
    }

    #[test]
    fn floors_are_strict_inequalities() {
        // PPDT exactly 5, average exactly 40, one set exactly 50: no floor fires.
        let d = decide(50.0, 30.0, 5.0);
        assert!(d.overrides.is_empty(), "{:?}", d.overrides);
        assert_eq!(d.status, ScreeningStatus::Out);
    }
}
