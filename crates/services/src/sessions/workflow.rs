use std::sync::Arc;

use lesson_core::model::{Catalog, GameRules};
use storage::ProgressStore;

use super::service::GameSession;
use super::state::{Intent, SessionEvent, Transition};
use super::view::{RenderModel, render};
use crate::error::SessionError;

/// Result of one dispatched intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentOutcome {
    pub event: SessionEvent,
    pub render: RenderModel,
}

/// Orchestrates the session state machine and progress persistence.
///
/// Every transition that mutated the snapshot is saved before `dispatch`
/// returns, so the render model handed back always reflects stored progress.
/// A failed save rolls the session back to where it was before the intent,
/// so the same intent can be dispatched again. Holding the session behind
/// `&mut self` serializes saves.
pub struct GameLoopService {
    store: ProgressStore,
    session: GameSession,
}

impl GameLoopService {
    /// Load progress and open a session at the skill map.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the backend cannot be read. A
    /// corrupt blob is not an error; it resets to the default snapshot.
    pub async fn start(
        catalog: Arc<Catalog>,
        rules: GameRules,
        store: ProgressStore,
    ) -> Result<Self, SessionError> {
        let snapshot = store.load(&catalog).await?;
        tracing::info!(
            unlocked = snapshot.unlocked_skills().len(),
            completed = snapshot.completed_lessons().len(),
            "progress loaded"
        );
        Ok(Self {
            store,
            session: GameSession::new(catalog, rules, snapshot),
        })
    }

    #[must_use]
    pub fn session(&self) -> &GameSession {
        &self.session
    }

    #[must_use]
    pub fn render(&self) -> RenderModel {
        render(&self.session)
    }

    /// Apply an intent and persist the snapshot if it changed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` for rejected intents (nothing is saved) and for
    /// storage failures while saving. Either way the session is unchanged.
    pub async fn dispatch(&mut self, intent: Intent) -> Result<IntentOutcome, SessionError> {
        let name = intent.name();
        let checkpoint = self.session.clone();
        let transition = self.session.apply(intent).inspect_err(|err| {
            tracing::debug!(intent = name, error = %err, "intent rejected");
        })?;
        self.finish(checkpoint, transition).await
    }

    /// Forget all progress and store the default snapshot.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` while a lesson is active and
    /// `SessionError::Storage` if the save fails, in which case the previous
    /// progress stays in the session.
    pub async fn reset_progress(&mut self) -> Result<IntentOutcome, SessionError> {
        let checkpoint = self.session.clone();
        let transition = self.session.reset_progress()?;
        self.finish(checkpoint, transition).await
    }

    async fn finish(
        &mut self,
        checkpoint: GameSession,
        transition: Transition,
    ) -> Result<IntentOutcome, SessionError> {
        if transition.persist {
            if let Err(err) = self.store.save(self.session.snapshot()).await {
                tracing::warn!(key = self.store.key(), error = %err, "save failed, session rolled back");
                self.session = checkpoint;
                return Err(err.into());
            }
            tracing::debug!(key = self.store.key(), "progress saved");
        }
        Ok(IntentOutcome {
            event: transition.event,
            render: render(&self.session),
        })
    }
}

impl std::fmt::Debug for GameLoopService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameLoopService")
            .field("key", &self.store.key())
            .field("session", &self.session)
            .finish()
    }
}
