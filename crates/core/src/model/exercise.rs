use serde::{Deserialize, Serialize};

use crate::model::ids::ExerciseId;

/// Placeholder marking the gap in a fill-in-the-blank question.
pub const BLANK_MARKER: &str = "___";

//
// ─── ANSWER CHECKING ───────────────────────────────────────────────────────────
//

/// Per-variant answer evaluation.
///
/// Each exercise variant implements this; adding a variant means adding an
/// impl and an arm in [`Exercise::checker`], nothing else.
pub trait AnswerCheck {
    /// Returns true when `input` is an acceptable answer.
    fn is_correct(&self, input: &str) -> bool;

    /// Text shown to the player when they got it wrong.
    fn correct_answer(&self) -> &str;
}

//
// ─── VARIANTS ──────────────────────────────────────────────────────────────────
//

/// Pick one option out of a fixed list. Compared by exact text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultipleChoice {
    pub id: ExerciseId,
    pub question: String,
    pub answer: String,
    pub options: Vec<String>,
}

impl MultipleChoice {
    #[must_use]
    pub fn has_option(&self, text: &str) -> bool {
        self.options.iter().any(|option| option == text)
    }
}

impl AnswerCheck for MultipleChoice {
    fn is_correct(&self, input: &str) -> bool {
        input == self.answer
    }

    fn correct_answer(&self) -> &str {
        &self.answer
    }
}

/// Type the missing word. Compared case-insensitively after trimming input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillInTheBlank {
    pub id: ExerciseId,
    pub question: String,
    pub answer: String,
}

impl FillInTheBlank {
    /// Splits the question around the first blank marker.
    ///
    /// Returns `None` when the question has no marker; renderers then show the
    /// whole question followed by an input.
    #[must_use]
    pub fn split_blank(&self) -> Option<(&str, &str)> {
        self.question.split_once(BLANK_MARKER)
    }
}

impl AnswerCheck for FillInTheBlank {
    fn is_correct(&self, input: &str) -> bool {
        input.trim().to_lowercase() == self.answer.to_lowercase()
    }

    fn correct_answer(&self) -> &str {
        &self.answer
    }
}

//
// ─── EXERCISE ──────────────────────────────────────────────────────────────────
//

/// Discriminant of an [`Exercise`], handy for rendering decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExerciseKind {
    MultipleChoice,
    FillInTheBlank,
}

/// A single question inside a lesson.
///
/// Serialized with a `type` tag, matching the catalog document:
/// `{"id": "...", "type": "multiple-choice", "question": "...", "answer": "...", "options": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Exercise {
    MultipleChoice(MultipleChoice),
    FillInTheBlank(FillInTheBlank),
}

impl Exercise {
    #[must_use]
    pub fn id(&self) -> &ExerciseId {
        match self {
            Exercise::MultipleChoice(ex) => &ex.id,
            Exercise::FillInTheBlank(ex) => &ex.id,
        }
    }

    #[must_use]
    pub fn question(&self) -> &str {
        match self {
            Exercise::MultipleChoice(ex) => &ex.question,
            Exercise::FillInTheBlank(ex) => &ex.question,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ExerciseKind {
        match self {
            Exercise::MultipleChoice(_) => ExerciseKind::MultipleChoice,
            Exercise::FillInTheBlank(_) => ExerciseKind::FillInTheBlank,
        }
    }

    /// Options for choice exercises; `None` for free-text variants.
    #[must_use]
    pub fn options(&self) -> Option<&[String]> {
        match self {
            Exercise::MultipleChoice(ex) => Some(&ex.options),
            Exercise::FillInTheBlank(_) => None,
        }
    }

    /// Answer evaluator for this variant.
    #[must_use]
    pub fn checker(&self) -> &dyn AnswerCheck {
        match self {
            Exercise::MultipleChoice(ex) => ex,
            Exercise::FillInTheBlank(ex) => ex,
        }
    }

    #[must_use]
    pub fn is_correct(&self, input: &str) -> bool {
        self.checker().is_correct(input)
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        self.checker().correct_answer()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
