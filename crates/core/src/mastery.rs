//! Mastery scoring for spaced repetition.
//!
//! A correct answer adds one point, a wrong one removes two. Anything below
//! one point counts as weak and is eligible for practice, so after a single
//! miss an exercise needs three correct answers to leave the weak set.

use crate::model::MasteryRecord;

/// Score change for a correct answer.
pub const CORRECT_DELTA: i32 = 1;

/// Score change for an incorrect answer.
pub const INCORRECT_DELTA: i32 = -2;

/// Scores strictly below this are weak.
pub const WEAK_THRESHOLD: i32 = 1;

/// Applies one answer outcome to an exercise's record.
///
/// `previous` is `None` for an exercise that was never answered.
#[must_use]
pub fn record_outcome(previous: Option<MasteryRecord>, is_correct: bool) -> MasteryRecord {
    let base = previous.unwrap_or_default().score;
    let delta = if is_correct {
        CORRECT_DELTA
    } else {
        INCORRECT_DELTA
    };
    MasteryRecord::new(base.saturating_add(delta))
}

#[must_use]
pub fn is_weak(score: i32) -> bool {
    score < WEAK_THRESHOLD
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
