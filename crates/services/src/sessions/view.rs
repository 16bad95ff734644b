//! Presentation-agnostic render models.
//!
//! These are data for the presentation layer to draw; they carry no
//! formatting beyond the fixed feedback and completion texts.

use lesson_core::model::{Exercise, LessonId, ProgressSnapshot, Skill, SkillId};
use lesson_core::practice::weak_count;

use super::service::GameSession;
use super::state::{AnswerPhase, Feedback, SessionState};

//
// ─── SKILL MAP ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillStatus {
    Locked,
    Unlocked,
    /// Unlocked and every lesson completed.
    Completed,
}

impl SkillStatus {
    #[must_use]
    pub fn of(snapshot: &ProgressSnapshot, skill: &Skill) -> Self {
        if !snapshot.is_skill_unlocked(&skill.id) {
            Self::Locked
        } else if snapshot.is_skill_completed(skill) {
            Self::Completed
        } else {
            Self::Unlocked
        }
    }

    #[must_use]
    pub fn is_playable(self) -> bool {
        self != Self::Locked
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillNodeView {
    pub id: SkillId,
    pub title: String,
    pub status: SkillStatus,
    pub lessons_completed: usize,
    pub lessons_total: usize,
    /// Lesson `open_skill` would start; `None` while locked.
    pub next_lesson: Option<LessonId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillMapView {
    pub skills: Vec<SkillNodeView>,
    pub weak_exercises: usize,
}

/// Build the skill map for the session's current snapshot.
#[must_use]
pub fn skill_map(session: &GameSession) -> SkillMapView {
    let snapshot = session.snapshot();
    let skills = session
        .catalog()
        .skills()
        .iter()
        .map(|skill| {
            let status = SkillStatus::of(snapshot, skill);
            SkillNodeView {
                id: skill.id.clone(),
                title: skill.title.clone(),
                status,
                lessons_completed: skill
                    .lessons
                    .iter()
                    .filter(|lesson| snapshot.is_lesson_completed(&lesson.id))
                    .count(),
                lessons_total: skill.lessons.len(),
                next_lesson: status
                    .is_playable()
                    .then(|| snapshot.next_lesson_in(skill))
                    .flatten()
                    .map(|lesson| lesson.id.clone()),
            }
        })
        .collect();

    SkillMapView {
        skills,
        weak_exercises: weak_count(snapshot),
    }
}

//
// ─── EXERCISE ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptView {
    Choice {
        options: Vec<String>,
        selected: Option<String>,
    },
    /// Question text split around the blank marker. Without a marker the
    /// whole question is `before`.
    Blank { before: String, after: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExerciseView {
    pub lesson_title: String,
    pub is_practice: bool,
    pub index: usize,
    pub total: usize,
    pub question: String,
    pub prompt: PromptView,
    pub feedback: Option<Feedback>,
    /// A multiple-choice answer can be checked once an option is selected.
    pub can_check: bool,
}

fn prompt_for(exercise: &Exercise, selected: Option<&str>) -> PromptView {
    match exercise {
        Exercise::MultipleChoice(choice) => PromptView::Choice {
            options: choice.options.clone(),
            selected: selected.map(str::to_string),
        },
        Exercise::FillInTheBlank(blank) => {
            let (before, after) = blank
                .split_blank()
                .unwrap_or((blank.question.as_str(), ""));
            PromptView::Blank {
                before: before.to_string(),
                after: after.to_string(),
            }
        }
    }
}

//
// ─── END SCREENS ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionView {
    pub title: &'static str,
    pub lesson_title: String,
    pub is_practice: bool,
    pub unlocked_skill: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameOverView {
    pub lesson_title: String,
    pub score: u32,
    /// Feedback for the miss that used the last life.
    pub feedback: Option<Feedback>,
}

//
// ─── RENDER MODEL ──────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    SkillMap(SkillMapView),
    Exercise(ExerciseView),
    LessonComplete(CompletionView),
    GameOver(GameOverView),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hud {
    pub score: u32,
    pub lives: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderModel {
    pub screen: Screen,
    /// `None` at the skill map.
    pub hud: Option<Hud>,
    pub practice_available: bool,
}

/// Snapshot everything the presentation layer needs to draw the session.
#[must_use]
pub fn render(session: &GameSession) -> RenderModel {
    let hud = session
        .score()
        .zip(session.lives())
        .map(|(score, lives)| Hud { score, lives });
    let lesson = session.active_lesson();
    let lesson_title = lesson.map(|l| l.title.clone()).unwrap_or_default();
    let is_practice = lesson.is_some_and(|l| l.is_practice());

    let screen = match session.state() {
        SessionState::AtSkillMap => Screen::SkillMap(skill_map(session)),
        SessionState::InLesson { index, phase } => match session.current_exercise() {
            Some(exercise) => {
                let selected = session.selected_option();
                let feedback = match phase {
                    AnswerPhase::AwaitingAnswer => None,
                    AnswerPhase::Answered(feedback) => Some(feedback),
                };
                let can_check = feedback.is_none()
                    && (selected.is_some()
                        || matches!(exercise, Exercise::FillInTheBlank(_)));
                Screen::Exercise(ExerciseView {
                    lesson_title,
                    is_practice,
                    index,
                    total: session.progress().map_or(0, |p| p.total),
                    question: exercise.question().to_string(),
                    prompt: prompt_for(exercise, selected),
                    feedback,
                    can_check,
                })
            }
            None => Screen::SkillMap(skill_map(session)),
        },
        SessionState::LessonComplete => Screen::LessonComplete(CompletionView {
            title: if is_practice {
                "Practice Complete!"
            } else {
                "Lesson Complete!"
            },
            lesson_title,
            is_practice,
            unlocked_skill: session
                .unlocked_skill()
                .and_then(|id| session.catalog().skill(id))
                .map(|skill| skill.title.clone()),
        }),
        SessionState::GameOver => Screen::GameOver(GameOverView {
            lesson_title,
            score: session.score().unwrap_or_default(),
            feedback: session.last_feedback().cloned(),
        }),
    };

    RenderModel {
        screen,
        hud,
        practice_available: session.is_practice_available(),
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
