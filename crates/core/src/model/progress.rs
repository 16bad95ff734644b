use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Deserializer, Serialize};

use crate::mastery;
use crate::model::catalog::{Catalog, Lesson, Skill};
use crate::model::ids::{ExerciseId, LessonId, SkillId};

//
// ─── MASTERY RECORD ────────────────────────────────────────────────────────────
//

/// Per-exercise mastery. A missing record means "never practiced" (score 0).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasteryRecord {
    pub score: i32,
}

impl MasteryRecord {
    #[must_use]
    pub fn new(score: i32) -> Self {
        Self { score }
    }
}

//
// ─── SNAPSHOT ──────────────────────────────────────────────────────────────────
//

/// Persisted player progress.
///
/// Invariants (kept by [`ProgressSnapshot::normalize`] after load, and by the
/// mutators afterwards):
/// - the catalog's first skill is unlocked;
/// - every completed lesson belongs to an unlocked skill.
///
/// Wire format matches the stored blob:
/// `{"unlockedSkills": [..], "completedLessons": [..], "exercisePerformance": {id: {"score": n}}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    #[serde(rename = "unlockedSkills")]
    unlocked_skills: BTreeSet<SkillId>,

    #[serde(rename = "completedLessons")]
    completed_lessons: BTreeSet<LessonId>,

    // Older blobs predate mastery tracking.
    #[serde(
        rename = "exercisePerformance",
        default,
        deserialize_with = "null_as_default"
    )]
    exercise_performance: BTreeMap<ExerciseId, MasteryRecord>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// What a lesson completion changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonCompletion {
    /// False when the lesson had already been completed before (a replay).
    pub newly_completed: bool,
    /// Skill unlocked as a consequence, if any.
    pub unlocked: Option<SkillId>,
}

/// What [`ProgressSnapshot::normalize`] repaired.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub restored_first_skill: bool,
    pub pruned_lessons: Vec<LessonId>,
}

impl NormalizeReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        !self.restored_first_skill && self.pruned_lessons.is_empty()
    }
}

impl ProgressSnapshot {
    /// Fresh progress: only the first skill is unlocked.
    #[must_use]
    pub fn new(first_skill: SkillId) -> Self {
        Self {
            unlocked_skills: BTreeSet::from([first_skill]),
            completed_lessons: BTreeSet::new(),
            exercise_performance: BTreeMap::new(),
        }
    }

    /// Fresh progress for the given catalog.
    #[must_use]
    pub fn for_catalog(catalog: &Catalog) -> Self {
        Self::new(catalog.first_skill().id.clone())
    }

    #[must_use]
    pub fn unlocked_skills(&self) -> &BTreeSet<SkillId> {
        &self.unlocked_skills
    }

    #[must_use]
    pub fn completed_lessons(&self) -> &BTreeSet<LessonId> {
        &self.completed_lessons
    }

    #[must_use]
    pub fn exercise_performance(&self) -> &BTreeMap<ExerciseId, MasteryRecord> {
        &self.exercise_performance
    }

    #[must_use]
    pub fn is_skill_unlocked(&self, id: &SkillId) -> bool {
        self.unlocked_skills.contains(id)
    }

    #[must_use]
    pub fn is_lesson_completed(&self, id: &LessonId) -> bool {
        self.completed_lessons.contains(id)
    }

    /// True when the skill has lessons and all of them are completed.
    #[must_use]
    pub fn is_skill_completed(&self, skill: &Skill) -> bool {
        !skill.lessons.is_empty() && skill.lesson_ids().all(|id| self.is_lesson_completed(id))
    }

    /// Lesson to open when the player picks a skill: the first one not yet
    /// completed, or the first lesson again when everything is done.
    #[must_use]
    pub fn next_lesson_in<'a>(&self, skill: &'a Skill) -> Option<&'a Lesson> {
        skill
            .lessons
            .iter()
            .find(|lesson| !self.is_lesson_completed(&lesson.id))
            .or_else(|| skill.lessons.first())
    }

    #[must_use]
    pub fn mastery(&self, id: &ExerciseId) -> Option<MasteryRecord> {
        self.exercise_performance.get(id).copied()
    }

    /// Returns true if the skill was not unlocked before.
    pub fn unlock_skill(&mut self, id: SkillId) -> bool {
        self.unlocked_skills.insert(id)
    }

    /// Stores a mastery record, replacing any previous one.
    pub fn set_mastery(&mut self, id: ExerciseId, record: MasteryRecord) {
        self.exercise_performance.insert(id, record);
    }

    /// Folds one answer outcome into the exercise's mastery record.
    pub fn record_outcome(&mut self, id: &ExerciseId, is_correct: bool) -> MasteryRecord {
        let updated = mastery::record_outcome(self.mastery(id), is_correct);
        self.set_mastery(id.clone(), updated);
        updated
    }

    /// Marks a lesson completed and propagates the unlock to the next skill
    /// once every lesson of `skill` is completed.
    ///
    /// Idempotent: replaying a completed lesson or re-completing a finished
    /// skill changes nothing.
    pub fn complete_lesson(
        &mut self,
        catalog: &Catalog,
        skill: &Skill,
        lesson_id: &LessonId,
    ) -> LessonCompletion {
        let newly_completed = self.completed_lessons.insert(lesson_id.clone());

        let mut unlocked = None;
        if self.is_skill_completed(skill) {
            if let Some(next) = catalog.next_skill_after(&skill.id) {
                if self.unlock_skill(next.id.clone()) {
                    unlocked = Some(next.id.clone());
                }
            }
        }

        LessonCompletion {
            newly_completed,
            unlocked,
        }
    }

    /// Re-establishes the snapshot invariants against the current catalog.
    ///
    /// Mastery records for exercises missing from the catalog are kept; the
    /// practice selector skips them.
    pub fn normalize(&mut self, catalog: &Catalog) -> NormalizeReport {
        let restored_first_skill = self.unlock_skill(catalog.first_skill().id.clone());

        let reachable: BTreeSet<&LessonId> = catalog
            .skills()
            .iter()
            .filter(|skill| self.unlocked_skills.contains(&skill.id))
            .flat_map(Skill::lesson_ids)
            .collect();

        let pruned_lessons: Vec<LessonId> = self
            .completed_lessons
            .iter()
            .filter(|id| !reachable.contains(id))
            .cloned()
            .collect();
        for id in &pruned_lessons {
            self.completed_lessons.remove(id);
        }

        NormalizeReport {
            restored_first_skill,
            pruned_lessons,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::exercise::{Exercise, FillInTheBlank};

    fn lesson(id: &str, exercise: &str) -> Lesson {
        Lesson {
            id: LessonId::new(id),
            title: id.to_string(),
            exercises: vec![Exercise::FillInTheBlank(FillInTheBlank {
                id: ExerciseId::new(exercise),
                question: "___".into(),
                answer: "x".into(),
            })],
        }
    }

    fn catalog() -> Catalog {
        Catalog::new(vec![
            Skill {
                id: SkillId::new("skill-1"),
                title: "Basics".into(),
                lessons: vec![lesson("l-1", "ex-1"), lesson("l-2", "ex-2")],
            },
            Skill {
                id: SkillId::new("skill-2"),
                title: "Storage".into(),
                lessons: vec![lesson("l-3", "ex-3")],
            },
        ])
        .unwrap()
    }

    #[test]
    fn completing_every_lesson_unlocks_next_skill_once() {
        let catalog = catalog();
        let skill = catalog.first_skill().clone();
        let mut snapshot = ProgressSnapshot::for_catalog(&catalog);

        let first = snapshot.complete_lesson(&catalog, &skill, &LessonId::new("l-1"));
        assert!(first.newly_completed);
        assert_eq!(first.unlocked, None);

        let second = snapshot.complete_lesson(&catalog, &skill, &LessonId::new("l-2"));
        assert_eq!(second.unlocked, Some(SkillId::new("skill-2")));
        assert!(snapshot.is_skill_completed(&skill));

        let replay = snapshot.complete_lesson(&catalog, &skill, &LessonId::new("l-2"));
        assert!(!replay.newly_completed);
        assert_eq!(replay.unlocked, None);
        assert_eq!(snapshot.unlocked_skills().len(), 2);
        assert_eq!(snapshot.completed_lessons().len(), 2);
    }

    #[test]
    fn last_skill_completion_unlocks_nothing() {
        let catalog = catalog();
        let skill = catalog.skills()[1].clone();
        let mut snapshot = ProgressSnapshot::for_catalog(&catalog);
        snapshot.unlock_skill(skill.id.clone());

        let done = snapshot.complete_lesson(&catalog, &skill, &LessonId::new("l-3"));
        assert_eq!(done.unlocked, None);
    }

    #[test]
    fn next_lesson_prefers_first_uncompleted_then_replays_first() {
        let catalog = catalog();
        let skill = catalog.first_skill().clone();
        let mut snapshot = ProgressSnapshot::for_catalog(&catalog);

        assert_eq!(snapshot.next_lesson_in(&skill).map(|l| l.id.as_str()), Some("l-1"));
        snapshot.complete_lesson(&catalog, &skill, &LessonId::new("l-1"));
        assert_eq!(snapshot.next_lesson_in(&skill).map(|l| l.id.as_str()), Some("l-2"));
        snapshot.complete_lesson(&catalog, &skill, &LessonId::new("l-2"));
        assert_eq!(snapshot.next_lesson_in(&skill).map(|l| l.id.as_str()), Some("l-1"));
    }

    #[test]
    fn record_outcome_creates_record_lazily() {
        let mut snapshot = ProgressSnapshot::new(SkillId::new("skill-1"));
        let id = ExerciseId::new("ex-7");
        assert_eq!(snapshot.mastery(&id), None);

        for _ in 0..3 {
            snapshot.record_outcome(&id, false);
        }
        assert_eq!(snapshot.mastery(&id), Some(MasteryRecord::new(-6)));

        snapshot.record_outcome(&id, true);
        assert_eq!(snapshot.record_outcome(&id, true).score, -4);
    }

    #[test]
    fn legacy_blob_without_performance_gets_empty_map() {
        let legacy = r#"{"unlockedSkills": ["skill-1"], "completedLessons": ["l-1"]}"#;
        let snapshot: ProgressSnapshot = serde_json::from_str(legacy).unwrap();
        assert!(snapshot.exercise_performance().is_empty());
        assert!(snapshot.is_lesson_completed(&LessonId::new("l-1")));

        let null_map =
            r#"{"unlockedSkills": ["skill-1"], "completedLessons": [], "exercisePerformance": null}"#;
        let snapshot: ProgressSnapshot = serde_json::from_str(null_map).unwrap();
        assert!(snapshot.exercise_performance().is_empty());
    }

    #[test]
    fn serializes_with_camel_case_field_names() {
        let mut snapshot = ProgressSnapshot::new(SkillId::new("skill-1"));
        snapshot.set_mastery(ExerciseId::new("ex-7"), MasteryRecord::new(-6));

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["unlockedSkills"], serde_json::json!(["skill-1"]));
        assert_eq!(json["completedLessons"], serde_json::json!([]));
        assert_eq!(json["exercisePerformance"]["ex-7"]["score"], -6);

        let back: ProgressSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn normalize_restores_first_skill_and_prunes_unreachable_lessons() {
        let catalog = catalog();
        let blob = r#"{"unlockedSkills": [], "completedLessons": ["l-1", "l-3", "gone"]}"#;
        let mut snapshot: ProgressSnapshot = serde_json::from_str(blob).unwrap();

        let report = snapshot.normalize(&catalog);

        assert!(report.restored_first_skill);
        assert_eq!(
            report.pruned_lessons,
            vec![LessonId::new("gone"), LessonId::new("l-3")]
        );
        assert!(snapshot.is_skill_unlocked(&SkillId::new("skill-1")));
        assert!(snapshot.is_lesson_completed(&LessonId::new("l-1")));
        assert!(snapshot.normalize(&catalog).is_clean());
    }
}
