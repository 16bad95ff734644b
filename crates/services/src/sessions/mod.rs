mod progress;
mod service;
mod state;
mod view;
mod workflow;

#[cfg(test)]
mod fixtures;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use progress::LessonProgress;
pub use service::GameSession;
pub use state::{AnswerPhase, Feedback, Intent, SessionEvent, SessionState, Transition};
pub use view::{
    CompletionView, ExerciseView, GameOverView, Hud, PromptView, RenderModel, Screen,
    SkillMapView, SkillNodeView, SkillStatus, render, skill_map,
};
pub use workflow::{GameLoopService, IntentOutcome};
