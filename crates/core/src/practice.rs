//! Weak-exercise selection for practice sessions.

use crate::mastery::is_weak;
use crate::model::{Catalog, Exercise, ExerciseId, ProgressSnapshot};

/// Number of weak records in the snapshot.
#[must_use]
pub fn weak_count(snapshot: &ProgressSnapshot) -> usize {
    snapshot
        .exercise_performance()
        .values()
        .filter(|record| is_weak(record.score))
        .count()
}

/// True once at least `floor` exercises are weak.
///
/// Counts every weak record, including ones whose exercise left the catalog.
#[must_use]
pub fn is_practice_eligible(snapshot: &ProgressSnapshot, floor: usize) -> bool {
    weak_count(snapshot) >= floor
}

/// Weakest exercises first, at most `limit` of them.
///
/// Ties on score keep catalog order. Records whose exercise no longer exists
/// in the catalog are skipped. An empty result means practice is unavailable.
#[must_use]
pub fn select_practice_set<'a>(
    snapshot: &ProgressSnapshot,
    catalog: &'a Catalog,
    limit: usize,
) -> Vec<&'a Exercise> {
    let mut weak: Vec<(i32, usize, &ExerciseId)> = snapshot
        .exercise_performance()
        .iter()
        .filter(|(_, record)| is_weak(record.score))
        .filter_map(|(id, record)| {
            catalog
                .exercise_ordinal(id)
                .map(|ordinal| (record.score, ordinal, id))
        })
        .collect();

    weak.sort_by_key(|(score, ordinal, _)| (*score, *ordinal));

    weak.into_iter()
        .filter_map(|(_, _, id)| catalog.exercise(id))
        .take(limit)
        .collect()
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
