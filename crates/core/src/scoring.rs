//! Lead scoring for inbound booking requests.
//!
//! [`score`] is a pure function of the request attributes. Thresholds are
//! fixed; changing any of them changes every stored score's meaning.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Sub-score weights
// ---------------------------------------------------------------------------

/// Flat bonus for a requester who has booked before.
pub const REPEAT_BOOKER_BONUS: u32 = 10;

/// Score for an event type missing from [`event_type_score`]'s table.
pub const UNKNOWN_EVENT_TYPE_SCORE: u32 = 5;

/// Maximum form-completeness contribution.
pub const FORM_COMPLETENESS_MAX: u32 = 10;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Attributes of a booking request that feed the lead score.
///
/// Every field is optional; a missing input contributes zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreInput {
    pub budget_min: Option<i64>,
    pub budget_max: Option<i64>,
    pub artist_fee_min: Option<i64>,
    pub artist_fee_max: Option<i64>,
    pub event_type: Option<String>,
    pub days_until_event: Option<i64>,
    pub expected_attendance: Option<i64>,
    /// Ratio of filled form fields, `0.0..=1.0`.
    pub form_completeness: f64,
    pub is_repeat_booker: bool,
}

/// Per-criterion breakdown of a lead score. `total` is the plain sum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub budget: u32,
    pub event_type: u32,
    pub lead_time: u32,
    pub repeat_booker: u32,
    pub attendance: u32,
    pub form_completeness: u32,
    pub total: u32,
}

impl ScoreBreakdown {
    /// Sum of the six sub-scores. Not clamped to 100.
    pub fn sum(&self) -> u32 {
        self.budget
            + self.event_type
            + self.lead_time
            + self.repeat_booker
            + self.attendance
            + self.form_completeness
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Compute the lead score for a booking request.
pub fn score(input: &ScoreInput) -> ScoreBreakdown {
    let mut breakdown = ScoreBreakdown {
        budget: budget_fit_score(input),
        event_type: input.event_type.as_deref().map_or(0, event_type_score),
        lead_time: input.days_until_event.map_or(0, lead_time_score),
        repeat_booker: if input.is_repeat_booker {
            REPEAT_BOOKER_BONUS
        } else {
            0
        },
        attendance: input.expected_attendance.map_or(0, attendance_score),
        form_completeness: form_completeness_score(input.form_completeness),
        total: 0,
    };
    breakdown.total = breakdown.sum();
    breakdown
}

/// Budget fit (0-30): ratio of the budget midpoint to the artist fee midpoint.
///
/// Needs a budget maximum and both ends of the artist fee range. A missing
/// budget minimum means the budget is exactly the maximum.
fn budget_fit_score(input: &ScoreInput) -> u32 {
    let (Some(budget_max), Some(fee_min), Some(fee_max)) =
        (input.budget_max, input.artist_fee_min, input.artist_fee_max)
    else {
        return 0;
    };
    let budget_min = input.budget_min.unwrap_or(budget_max);

    let budget_mid = (budget_min as f64 + budget_max as f64) / 2.0;
    let fee_mid = (fee_min as f64 + fee_max as f64) / 2.0;
    if fee_mid <= 0.0 {
        return 0;
    }

    let ratio = budget_mid / fee_mid;
    if ratio >= 1.2 {
        30
    } else if ratio >= 1.0 {
        25
    } else if ratio >= 0.8 {
        15
    } else if ratio >= 0.5 {
        5
    } else {
        0
    }
}

/// Event type (5-15) from a fixed table.
pub fn event_type_score(event_type: &str) -> u32 {
    match event_type {
        "festival" => 15,
        "club" => 12,
        "corporate" => 10,
        "private" => 8,
        "other" => 5,
        _ => UNKNOWN_EVENT_TYPE_SCORE,
    }
}

/// Lead time (0-15) by days until the event.
pub fn lead_time_score(days: i64) -> u32 {
    if days > 90 {
        15
    } else if days > 60 {
        12
    } else if days > 30 {
        8
    } else if days > 14 {
        4
    } else {
        0
    }
}

/// Expected attendance (2-10).
pub fn attendance_score(attendance: i64) -> u32 {
    if attendance > 10_000 {
        10
    } else if attendance > 5_000 {
        8
    } else if attendance > 1_000 {
        6
    } else if attendance > 500 {
        4
    } else {
        2
    }
}

/// Form completeness (0-10): `round(ratio * 10)`.
fn form_completeness_score(ratio: f64) -> u32 {
    if !ratio.is_finite() {
        return 0;
    }
    // Saturating float-to-int cast; the clamp keeps it within 0..=10.
    (ratio.clamp(0.0, 1.0) * f64::from(FORM_COMPLETENESS_MAX)).round() as u32
}

/// Fraction of form fields filled at submission time.
///
/// Required fields are always filled (input validation enforces them), so
/// the ratio is `(required + filled optional) / (required + optional)`.
pub fn form_completeness_ratio(required_count: usize, optional_filled: &[bool]) -> f64 {
    let total = required_count + optional_filled.len();
    if total == 0 {
        return 0.0;
    }
    let filled = required_count + optional_filled.iter().filter(|f| **f).count();
    filled as f64 / total as f64
}
