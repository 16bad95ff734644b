use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::exercise::Exercise;
use crate::model::ids::{ExerciseId, LessonId, SkillId};

/// Reserved id of the synthesized practice lesson.
pub const PRACTICE_LESSON_ID: &str = "practice-session";

/// Reserved id of the skill wrapping the synthesized practice lesson.
pub const PRACTICE_SKILL_ID: &str = "practice";

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("catalog has no skills")]
    Empty,

    #[error("skill {0} has no lessons")]
    EmptySkill(SkillId),

    #[error("lesson {0} has no exercises")]
    EmptyLesson(LessonId),

    #[error("duplicate skill id: {0}")]
    DuplicateSkill(SkillId),

    #[error("duplicate lesson id: {0}")]
    DuplicateLesson(LessonId),

    #[error("duplicate exercise id: {0}")]
    DuplicateExercise(ExerciseId),

    #[error("{0} is a reserved id")]
    ReservedId(String),

    #[error("answer of exercise {0} is not one of its options")]
    AnswerNotInOptions(ExerciseId),
}

//
// ─── LESSONS & SKILLS ──────────────────────────────────────────────────────────
//

/// An ordered run of exercises.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: LessonId,
    pub title: String,
    pub exercises: Vec<Exercise>,
}

impl Lesson {
    /// Builds the synthesized practice lesson. Never part of the catalog.
    #[must_use]
    pub fn practice(exercises: Vec<Exercise>) -> Self {
        Self {
            id: LessonId::new(PRACTICE_LESSON_ID),
            title: "Practice Session".to_string(),
            exercises,
        }
    }

    #[must_use]
    pub fn is_practice(&self) -> bool {
        self.id.as_str() == PRACTICE_LESSON_ID
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.exercises.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }
}

/// A node of the skill tree: an ordered list of lessons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub id: SkillId,
    pub title: String,
    pub lessons: Vec<Lesson>,
}

impl Skill {
    /// Wraps a practice lesson in its own skill so the session cursor always
    /// has a (skill, lesson) pair.
    #[must_use]
    pub fn practice(lesson: Lesson) -> Self {
        Self {
            id: SkillId::new(PRACTICE_SKILL_ID),
            title: "Practice".to_string(),
            lessons: vec![lesson],
        }
    }

    #[must_use]
    pub fn lesson(&self, id: &LessonId) -> Option<&Lesson> {
        self.lessons.iter().find(|lesson| &lesson.id == id)
    }

    pub fn lesson_ids(&self) -> impl Iterator<Item = &LessonId> {
        self.lessons.iter().map(|lesson| &lesson.id)
    }
}

//
// ─── CATALOG ───────────────────────────────────────────────────────────────────
//

/// Raw shape of the content document: `{"skills": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogDocument {
    pub skills: Vec<Skill>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ExerciseLocation {
    skill: usize,
    lesson: usize,
    exercise: usize,
    ordinal: usize,
}

/// Validated, read-only skill tree.
///
/// Skill order is the unlock order. Exercise ids are unique across the whole
/// catalog, so exercises can be looked up without knowing their lesson.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    skills: Vec<Skill>,
    exercises: HashMap<ExerciseId, ExerciseLocation>,
}

impl Catalog {
    /// Validates the skill tree and builds lookup indexes.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the tree is empty, has empty skills or
    /// lessons, repeats an id, uses a reserved id, or has a multiple-choice
    /// answer that is not among its options.
    pub fn new(skills: Vec<Skill>) -> Result<Self, CatalogError> {
        if skills.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut skill_ids = HashSet::new();
        let mut lesson_ids = HashSet::new();
        let mut exercises = HashMap::new();
        let mut ordinal = 0_usize;

        for (skill_idx, skill) in skills.iter().enumerate() {
            if skill.id.as_str() == PRACTICE_SKILL_ID {
                return Err(CatalogError::ReservedId(skill.id.to_string()));
            }
            if !skill_ids.insert(&skill.id) {
                return Err(CatalogError::DuplicateSkill(skill.id.clone()));
            }
            if skill.lessons.is_empty() {
                return Err(CatalogError::EmptySkill(skill.id.clone()));
            }

            for (lesson_idx, lesson) in skill.lessons.iter().enumerate() {
                if lesson.is_practice() {
                    return Err(CatalogError::ReservedId(lesson.id.to_string()));
                }
                if !lesson_ids.insert(&lesson.id) {
                    return Err(CatalogError::DuplicateLesson(lesson.id.clone()));
                }
                if lesson.is_empty() {
                    return Err(CatalogError::EmptyLesson(lesson.id.clone()));
                }

                for (exercise_idx, exercise) in lesson.exercises.iter().enumerate() {
                    if let Exercise::MultipleChoice(choice) = exercise {
                        if !choice.has_option(&choice.answer) {
                            return Err(CatalogError::AnswerNotInOptions(choice.id.clone()));
                        }
                    }
                    let location = ExerciseLocation {
                        skill: skill_idx,
                        lesson: lesson_idx,
                        exercise: exercise_idx,
                        ordinal,
                    };
                    if exercises.insert(exercise.id().clone(), location).is_some() {
                        return Err(CatalogError::DuplicateExercise(exercise.id().clone()));
                    }
                    ordinal += 1;
                }
            }
        }

        Ok(Self { skills, exercises })
    }

    #[must_use]
    pub fn skills(&self) -> &[Skill] {
        &self.skills
    }

    /// First skill in catalog order; always unlocked.
    #[must_use]
    pub fn first_skill(&self) -> &Skill {
        // `new` rejects empty catalogs.
        &self.skills[0]
    }

    #[must_use]
    pub fn skill(&self, id: &SkillId) -> Option<&Skill> {
        self.skills.iter().find(|skill| &skill.id == id)
    }

    #[must_use]
    pub fn lesson(&self, skill_id: &SkillId, lesson_id: &LessonId) -> Option<&Lesson> {
        self.skill(skill_id)?.lesson(lesson_id)
    }

    /// Skill owning the given lesson.
    #[must_use]
    pub fn skill_of_lesson(&self, lesson_id: &LessonId) -> Option<&Skill> {
        self.skills
            .iter()
            .find(|skill| skill.lesson(lesson_id).is_some())
    }

    /// Skill that follows `id` in catalog order.
    #[must_use]
    pub fn next_skill_after(&self, id: &SkillId) -> Option<&Skill> {
        let idx = self.skills.iter().position(|skill| &skill.id == id)?;
        self.skills.get(idx + 1)
    }

    #[must_use]
    pub fn exercise(&self, id: &ExerciseId) -> Option<&Exercise> {
        let loc = self.exercises.get(id)?;
        Some(&self.skills[loc.skill].lessons[loc.lesson].exercises[loc.exercise])
    }

    /// Position of the exercise in a full walk of the catalog.
    #[must_use]
    pub fn exercise_ordinal(&self, id: &ExerciseId) -> Option<usize> {
        self.exercises.get(id).map(|loc| loc.ordinal)
    }

    #[must_use]
    pub fn exercise_count(&self) -> usize {
        self.exercises.len()
    }
}

impl TryFrom<CatalogDocument> for Catalog {
    type Error = CatalogError;

    fn try_from(document: CatalogDocument) -> Result<Self, Self::Error> {
        Self::new(document.skills)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
