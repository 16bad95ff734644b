use lesson_core::model::{ExerciseId, LessonId, MasteryRecord, SkillId};

//
// ─── INTENTS ───────────────────────────────────────────────────────────────────
//

/// Everything the presentation layer can ask the session to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Pick a skill on the map; opens its next lesson.
    OpenSkill(SkillId),
    StartLesson { skill: SkillId, lesson: LessonId },
    StartPractice,
    /// Highlight a multiple-choice option before checking it.
    SelectOption(String),
    SubmitAnswer(String),
    /// Check the highlighted option.
    SubmitSelected,
    Continue,
    ReturnToMap,
    Retry,
}

impl Intent {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Intent::OpenSkill(_) => "open_skill",
            Intent::StartLesson { .. } => "start_lesson",
            Intent::StartPractice => "start_practice",
            Intent::SelectOption(_) => "select_option",
            Intent::SubmitAnswer(_) => "submit_answer",
            Intent::SubmitSelected => "submit_selected",
            Intent::Continue => "continue",
            Intent::ReturnToMap => "return_to_map",
            Intent::Retry => "retry",
        }
    }
}

//
// ─── STATES ────────────────────────────────────────────────────────────────────
//

/// Result of checking one answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub is_correct: bool,
    pub correct_answer: String,
}

impl Feedback {
    #[must_use]
    pub fn message(&self) -> String {
        if self.is_correct {
            "Correct! Well done.".to_string()
        } else {
            format!("Not quite. The correct answer is: {}", self.correct_answer)
        }
    }
}

/// Sub-state of an exercise: waiting for an answer, or showing feedback and
/// waiting for `continue`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerPhase {
    AwaitingAnswer,
    Answered(Feedback),
}

/// Observable state of a [`super::GameSession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    AtSkillMap,
    InLesson { index: usize, phase: AnswerPhase },
    LessonComplete,
    GameOver,
}

impl SessionState {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::AtSkillMap => "at the skill map",
            SessionState::InLesson {
                phase: AnswerPhase::AwaitingAnswer,
                ..
            } => "awaiting an answer",
            SessionState::InLesson {
                phase: AnswerPhase::Answered(_),
                ..
            } => "showing feedback",
            SessionState::LessonComplete => "the lesson is complete",
            SessionState::GameOver => "the game is over",
        }
    }
}

//
// ─── TRANSITIONS ───────────────────────────────────────────────────────────────
//

/// What happened as a result of an intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    LessonStarted {
        skill: SkillId,
        lesson: LessonId,
        is_practice: bool,
    },
    /// Practice was requested but too few exercises are weak.
    PracticeUnavailable { weak: usize },
    /// The picked skill is locked; nothing happened.
    SkillLocked(SkillId),
    OptionSelected(String),
    Answered {
        exercise: ExerciseId,
        feedback: Feedback,
        /// Updated mastery; `None` during practice.
        mastery: Option<MasteryRecord>,
        game_over: bool,
    },
    Advanced { index: usize },
    LessonCompleted {
        lesson: LessonId,
        unlocked: Option<SkillId>,
    },
    PracticeCompleted,
    Retried,
    ReturnedToMap,
    ProgressReset,
}

/// Outcome of one state-machine step.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct Transition {
    pub event: SessionEvent,
    /// The snapshot must be saved before the next intent.
    pub persist: bool,
}

impl Transition {
    pub(crate) fn ephemeral(event: SessionEvent) -> Self {
        Self {
            event,
            persist: false,
        }
    }

    pub(crate) fn persisted(event: SessionEvent) -> Self {
        Self {
            event,
            persist: true,
        }
    }
}
