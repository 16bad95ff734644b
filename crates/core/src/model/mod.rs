mod catalog;
mod exercise;
mod ids;
mod progress;
mod rules;

pub use ids::{ExerciseId, LessonId, SkillId};

pub use catalog::{
    Catalog, CatalogDocument, CatalogError, Lesson, PRACTICE_LESSON_ID, PRACTICE_SKILL_ID, Skill,
};
pub use exercise::{AnswerCheck, BLANK_MARKER, Exercise, ExerciseKind, FillInTheBlank, MultipleChoice};
pub use progress::{LessonCompletion, MasteryRecord, NormalizeReport, ProgressSnapshot};
pub use rules::{GameRules, RulesError};
