use std::fmt;
use std::sync::Arc;

use lesson_core::model::{
    Catalog, Exercise, GameRules, Lesson, LessonId, ProgressSnapshot, Skill, SkillId,
};
use lesson_core::practice::{is_practice_eligible, select_practice_set, weak_count};

use super::progress::LessonProgress;
use super::state::{AnswerPhase, Feedback, Intent, SessionEvent, SessionState, Transition};
use crate::error::SessionError;

//
// ─── ACTIVE RUN ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Playing,
    Complete,
    GameOver,
}

/// Session cursor: everything that lives only while a lesson is on screen.
#[derive(Debug, Clone)]
struct ActiveRun {
    skill: Skill,
    lesson: Lesson,
    index: usize,
    phase: AnswerPhase,
    selected: Option<String>,
    stage: Stage,
    score: u32,
    lives: u32,
    unlocked: Option<SkillId>,
}

impl ActiveRun {
    fn new(skill: Skill, lesson: Lesson, lives: u32) -> Self {
        Self {
            skill,
            lesson,
            index: 0,
            phase: AnswerPhase::AwaitingAnswer,
            selected: None,
            stage: Stage::Playing,
            score: 0,
            lives,
            unlocked: None,
        }
    }

    fn current_exercise(&self) -> Option<&Exercise> {
        self.lesson.exercises.get(self.index)
    }

    fn awaiting_answer(&self) -> bool {
        self.stage == Stage::Playing && self.phase == AnswerPhase::AwaitingAnswer
    }

    fn showing_feedback(&self) -> bool {
        self.stage == Stage::Playing && matches!(self.phase, AnswerPhase::Answered(_))
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// The lesson player's state machine.
///
/// Owns the progress snapshot for the whole browsing session and the cursor
/// of the lesson currently being played. Every intent either returns a
/// [`Transition`] or fails with `SessionError::InvalidTransition` without
/// touching any state. Transitions flagged `persist` have mutated the snapshot
/// and must be saved before the next intent is applied. Cloning is cheap
/// enough to checkpoint the session around a save.
#[derive(Clone)]
pub struct GameSession {
    catalog: Arc<Catalog>,
    rules: GameRules,
    snapshot: ProgressSnapshot,
    run: Option<ActiveRun>,
}

impl GameSession {
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, rules: GameRules, snapshot: ProgressSnapshot) -> Self {
        Self {
            catalog,
            rules,
            snapshot,
            run: None,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn rules(&self) -> GameRules {
        self.rules
    }

    #[must_use]
    pub fn snapshot(&self) -> &ProgressSnapshot {
        &self.snapshot
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        match &self.run {
            None => SessionState::AtSkillMap,
            Some(run) => match run.stage {
                Stage::Playing => SessionState::InLesson {
                    index: run.index,
                    phase: run.phase.clone(),
                },
                Stage::Complete => SessionState::LessonComplete,
                Stage::GameOver => SessionState::GameOver,
            },
        }
    }

    /// Score of the current run; `None` at the skill map.
    #[must_use]
    pub fn score(&self) -> Option<u32> {
        self.run.as_ref().map(|run| run.score)
    }

    /// Lives left in the current run; `None` at the skill map.
    #[must_use]
    pub fn lives(&self) -> Option<u32> {
        self.run.as_ref().map(|run| run.lives)
    }

    #[must_use]
    pub fn active_skill(&self) -> Option<&Skill> {
        self.run.as_ref().map(|run| &run.skill)
    }

    #[must_use]
    pub fn active_lesson(&self) -> Option<&Lesson> {
        self.run.as_ref().map(|run| &run.lesson)
    }

    #[must_use]
    pub fn current_exercise(&self) -> Option<&Exercise> {
        self.run
            .as_ref()
            .filter(|run| run.stage == Stage::Playing)
            .and_then(ActiveRun::current_exercise)
    }

    #[must_use]
    pub fn selected_option(&self) -> Option<&str> {
        self.run.as_ref().and_then(|run| run.selected.as_deref())
    }

    /// Feedback for the last checked answer while the run still shows it.
    #[must_use]
    pub fn last_feedback(&self) -> Option<&Feedback> {
        self.run.as_ref().and_then(|run| match &run.phase {
            AnswerPhase::Answered(feedback) => Some(feedback),
            AnswerPhase::AwaitingAnswer => None,
        })
    }

    /// Skill unlocked by the lesson that just completed.
    #[must_use]
    pub fn unlocked_skill(&self) -> Option<&SkillId> {
        self.run.as_ref().and_then(|run| run.unlocked.as_ref())
    }

    #[must_use]
    pub fn progress(&self) -> Option<LessonProgress> {
        self.run
            .as_ref()
            .map(|run| LessonProgress {
                index: run.index,
                total: run.lesson.len(),
            })
    }

    /// Whether the map should offer a practice session.
    #[must_use]
    pub fn is_practice_available(&self) -> bool {
        is_practice_eligible(&self.snapshot, self.rules.practice_floor())
    }

    fn invalid(&self, intent: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            intent,
            state: self.state().label(),
        }
    }

    /// Apply one presentation intent.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` when the intent is not valid in the current
    /// state or names unknown content.
    pub fn apply(&mut self, intent: Intent) -> Result<Transition, SessionError> {
        match intent {
            Intent::OpenSkill(skill) => self.open_skill(&skill),
            Intent::StartLesson { skill, lesson } => self.start_lesson(&skill, &lesson),
            Intent::StartPractice => self.start_practice(),
            Intent::SelectOption(option) => self.select_option(&option),
            Intent::SubmitAnswer(input) => self.submit_answer(&input),
            Intent::SubmitSelected => self.submit_selected(),
            Intent::Continue => self.continue_lesson(),
            Intent::ReturnToMap => self.return_to_map(),
            Intent::Retry => self.retry(),
        }
    }

    /// Open the next lesson of a skill: the first one not completed yet, or
    /// the first lesson again when the skill is done. Locked skills are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside the skill map and
    /// `SessionError::UnknownSkill` for ids missing from the catalog.
    pub fn open_skill(&mut self, skill_id: &SkillId) -> Result<Transition, SessionError> {
        if self.run.is_some() {
            return Err(self.invalid("open_skill"));
        }
        let skill = self
            .catalog
            .skill(skill_id)
            .ok_or_else(|| SessionError::UnknownSkill(skill_id.clone()))?;

        if !self.snapshot.is_skill_unlocked(skill_id) {
            tracing::info!(skill_id = %skill_id, "ignoring locked skill");
            return Ok(Transition::ephemeral(SessionEvent::SkillLocked(
                skill_id.clone(),
            )));
        }

        let lesson = self
            .snapshot
            .next_lesson_in(skill)
            .ok_or_else(|| SessionError::UnknownSkill(skill_id.clone()))?;
        let (skill, lesson) = (skill.clone(), lesson.clone());
        Ok(self.begin(skill, lesson))
    }

    /// Start a specific lesson. Lock state is the caller's concern.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside the skill map and
    /// `SessionError::UnknownLesson` if the pair is not in the catalog.
    pub fn start_lesson(
        &mut self,
        skill_id: &SkillId,
        lesson_id: &LessonId,
    ) -> Result<Transition, SessionError> {
        if self.run.is_some() {
            return Err(self.invalid("start_lesson"));
        }
        let skill = self
            .catalog
            .skill(skill_id)
            .ok_or_else(|| SessionError::UnknownSkill(skill_id.clone()))?;
        let lesson = skill
            .lesson(lesson_id)
            .ok_or_else(|| SessionError::UnknownLesson {
                skill: skill_id.clone(),
                lesson: lesson_id.clone(),
            })?;
        let (skill, lesson) = (skill.clone(), lesson.clone());
        Ok(self.begin(skill, lesson))
    }

    /// Start a practice session over the weakest exercises.
    ///
    /// Not eligible (or nothing left to practice) is reported through
    /// `SessionEvent::PracticeUnavailable` and leaves the session at the map.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside the skill map.
    pub fn start_practice(&mut self) -> Result<Transition, SessionError> {
        if self.run.is_some() {
            return Err(self.invalid("start_practice"));
        }

        let weak = weak_count(&self.snapshot);
        if !is_practice_eligible(&self.snapshot, self.rules.practice_floor()) {
            tracing::warn!(weak, floor = self.rules.practice_floor(), "practice not available");
            return Ok(Transition::ephemeral(SessionEvent::PracticeUnavailable {
                weak,
            }));
        }

        let exercises: Vec<Exercise> =
            select_practice_set(&self.snapshot, &self.catalog, self.rules.practice_limit())
                .into_iter()
                .cloned()
                .collect();
        if exercises.is_empty() {
            tracing::warn!(weak, "no weak exercise left in the catalog");
            return Ok(Transition::ephemeral(SessionEvent::PracticeUnavailable {
                weak,
            }));
        }

        let lesson = Lesson::practice(exercises);
        let skill = Skill::practice(lesson.clone());
        Ok(self.begin(skill, lesson))
    }

    fn begin(&mut self, skill: Skill, lesson: Lesson) -> Transition {
        let is_practice = lesson.is_practice();
        tracing::info!(
            skill_id = %skill.id,
            lesson_id = %lesson.id,
            exercises = lesson.len(),
            is_practice,
            "lesson started"
        );
        let event = SessionEvent::LessonStarted {
            skill: skill.id.clone(),
            lesson: lesson.id.clone(),
            is_practice,
        };
        self.run = Some(ActiveRun::new(skill, lesson, self.rules.starting_lives()));
        Transition::ephemeral(event)
    }

    /// Highlight a multiple-choice option. UI-only state, never persisted.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless an answer is awaited,
    /// and `SessionError::NotAnOption` if the text is not one of the current
    /// exercise's options.
    pub fn select_option(&mut self, option: &str) -> Result<Transition, SessionError> {
        let state = self.state().label();
        let run = match self.run.as_mut() {
            Some(run) if run.awaiting_answer() => run,
            _ => {
                return Err(SessionError::InvalidTransition {
                    intent: "select_option",
                    state,
                });
            }
        };

        let is_option = match run.current_exercise() {
            Some(Exercise::MultipleChoice(choice)) => choice.has_option(option),
            _ => false,
        };
        if !is_option {
            return Err(SessionError::NotAnOption(option.to_string()));
        }

        run.selected = Some(option.to_string());
        Ok(Transition::ephemeral(SessionEvent::OptionSelected(
            option.to_string(),
        )))
    }

    /// Check the highlighted option.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoSelection` when nothing is highlighted, plus
    /// everything [`GameSession::submit_answer`] returns.
    pub fn submit_selected(&mut self) -> Result<Transition, SessionError> {
        let selected = match self.run.as_ref() {
            Some(run) if run.awaiting_answer() => run.selected.clone(),
            _ => return Err(self.invalid("submit_selected")),
        };
        let selected = selected.ok_or(SessionError::NoSelection)?;
        self.submit_answer(&selected)
    }

    /// Check an answer for the current exercise.
    ///
    /// Outside practice the outcome is folded into the exercise's mastery and
    /// the transition asks for a save. Running out of lives ends the run
    /// immediately, even on the last exercise. Feedback stays on screen until
    /// `continue`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless an answer is awaited.
    pub fn submit_answer(&mut self, input: &str) -> Result<Transition, SessionError> {
        let state = self.state().label();
        let run = match self.run.as_mut() {
            Some(run) if run.awaiting_answer() => run,
            _ => {
                return Err(SessionError::InvalidTransition {
                    intent: "submit_answer",
                    state,
                });
            }
        };
        let Some(exercise) = run.current_exercise() else {
            return Err(SessionError::InvalidTransition {
                intent: "submit_answer",
                state,
            });
        };

        let is_correct = exercise.is_correct(input);
        let exercise_id = exercise.id().clone();
        let feedback = Feedback {
            is_correct,
            correct_answer: exercise.correct_answer().to_string(),
        };

        let mastery = if run.lesson.is_practice() {
            None
        } else {
            Some(self.snapshot.record_outcome(&exercise_id, is_correct))
        };

        if is_correct {
            run.score = run.score.saturating_add(self.rules.points_per_correct());
        } else {
            run.lives = run.lives.saturating_sub(1);
        }
        let game_over = run.lives == 0;

        run.selected = None;
        run.phase = AnswerPhase::Answered(feedback.clone());
        if game_over {
            run.stage = Stage::GameOver;
            tracing::info!(lesson_id = %run.lesson.id, score = run.score, "out of lives");
        }
        tracing::debug!(
            exercise_id = %exercise_id,
            is_correct,
            mastery = mastery.map(|record| record.score),
            lives = run.lives,
            "answer checked"
        );

        let persist = mastery.is_some();
        let event = SessionEvent::Answered {
            exercise: exercise_id,
            feedback,
            mastery,
            game_over,
        };
        Ok(if persist {
            Transition::persisted(event)
        } else {
            Transition::ephemeral(event)
        })
    }

    /// Move past the feedback to the next exercise, or finish the lesson.
    ///
    /// Finishing a real lesson marks it completed and, once every lesson of
    /// the skill is done, unlocks the next skill. Finishing practice changes
    /// no progress but still asks for a save.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless feedback is showing.
    pub fn continue_lesson(&mut self) -> Result<Transition, SessionError> {
        let state = self.state().label();
        let run = match self.run.as_mut() {
            Some(run) if run.showing_feedback() => run,
            _ => {
                return Err(SessionError::InvalidTransition {
                    intent: "continue",
                    state,
                });
            }
        };

        run.index += 1;
        run.selected = None;
        if run.index < run.lesson.len() {
            run.phase = AnswerPhase::AwaitingAnswer;
            return Ok(Transition::ephemeral(SessionEvent::Advanced {
                index: run.index,
            }));
        }

        run.stage = Stage::Complete;
        if run.lesson.is_practice() {
            tracing::info!(score = run.score, "practice complete");
            return Ok(Transition::persisted(SessionEvent::PracticeCompleted));
        }

        let completion = self
            .snapshot
            .complete_lesson(&self.catalog, &run.skill, &run.lesson.id);
        run.unlocked.clone_from(&completion.unlocked);
        tracing::info!(
            lesson_id = %run.lesson.id,
            newly_completed = completion.newly_completed,
            score = run.score,
            "lesson complete"
        );
        if let Some(unlocked) = &completion.unlocked {
            tracing::info!(skill_id = %unlocked, "skill unlocked");
        }

        Ok(Transition::persisted(SessionEvent::LessonCompleted {
            lesson: run.lesson.id.clone(),
            unlocked: completion.unlocked,
        }))
    }

    /// Leave a finished or failed run and go back to the map.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless the lesson is complete
    /// or the game is over.
    pub fn return_to_map(&mut self) -> Result<Transition, SessionError> {
        match self.run.as_ref().map(|run| run.stage) {
            Some(Stage::Complete | Stage::GameOver) => {
                self.run = None;
                Ok(Transition::ephemeral(SessionEvent::ReturnedToMap))
            }
            _ => Err(self.invalid("return_to_map")),
        }
    }

    /// Restart the failed lesson from its first exercise with full lives.
    ///
    /// The run's score is kept.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless the game is over.
    pub fn retry(&mut self) -> Result<Transition, SessionError> {
        let state = self.state().label();
        let starting_lives = self.rules.starting_lives();
        let run = match self.run.as_mut() {
            Some(run) if run.stage == Stage::GameOver => run,
            _ => {
                return Err(SessionError::InvalidTransition {
                    intent: "retry",
                    state,
                });
            }
        };

        run.lives = starting_lives;
        run.index = 0;
        run.phase = AnswerPhase::AwaitingAnswer;
        run.selected = None;
        run.stage = Stage::Playing;
        tracing::info!(lesson_id = %run.lesson.id, score = run.score, "retrying lesson");
        Ok(Transition::ephemeral(SessionEvent::Retried))
    }

    /// Forget all progress. Only allowed from the map.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` while a run is active.
    pub fn reset_progress(&mut self) -> Result<Transition, SessionError> {
        if self.run.is_some() {
            return Err(self.invalid("reset_progress"));
        }
        self.snapshot = ProgressSnapshot::for_catalog(&self.catalog);
        tracing::info!("progress reset");
        Ok(Transition::persisted(SessionEvent::ProgressReset))
    }
}

impl fmt::Debug for GameSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameSession")
            .field("state", &self.state())
            .field("lesson", &self.active_lesson().map(|lesson| &lesson.id))
            .field("score", &self.score())
            .field("lives", &self.lives())
            .field("unlocked", &self.snapshot.unlocked_skills().len())
            .field("completed", &self.snapshot.completed_lessons().len())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
