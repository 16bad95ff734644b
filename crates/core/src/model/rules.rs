use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RulesError {
    #[error("starting lives must be > 0")]
    InvalidStartingLives,

    #[error("points per correct answer must be > 0")]
    InvalidPointsPerCorrect,

    #[error("practice limit must be > 0")]
    InvalidPracticeLimit,

    #[error("practice eligibility floor must be > 0")]
    InvalidPracticeFloor,
}

//
// ─── RULES ─────────────────────────────────────────────────────────────────────
//

/// Tunable numbers of the lives/score economy and of practice mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameRules {
    starting_lives: u32,
    points_per_correct: u32,
    practice_limit: usize,
    practice_floor: usize,
}

impl GameRules {
    /// Standard rules:
    /// - 5 lives per lesson attempt
    /// - 10 points per correct answer
    /// - practice sessions of at most 5 exercises
    /// - practice offered once 3 exercises are weak
    #[must_use]
    pub fn standard() -> Self {
        Self {
            starting_lives: 5,
            points_per_correct: 10,
            practice_limit: 5,
            practice_floor: 3,
        }
    }

    /// Creates custom rules.
    ///
    /// # Errors
    ///
    /// Returns `RulesError` if any value is zero.
    pub fn new(
        starting_lives: u32,
        points_per_correct: u32,
        practice_limit: usize,
        practice_floor: usize,
    ) -> Result<Self, RulesError> {
        if starting_lives == 0 {
            return Err(RulesError::InvalidStartingLives);
        }
        if points_per_correct == 0 {
            return Err(RulesError::InvalidPointsPerCorrect);
        }
        if practice_limit == 0 {
            return Err(RulesError::InvalidPracticeLimit);
        }
        if practice_floor == 0 {
            return Err(RulesError::InvalidPracticeFloor);
        }

        Ok(Self {
            starting_lives,
            points_per_correct,
            practice_limit,
            practice_floor,
        })
    }

    /// Same rules with a different number of lives.
    ///
    /// # Errors
    ///
    /// Returns `RulesError::InvalidStartingLives` if `lives` is zero.
    pub fn with_starting_lives(self, lives: u32) -> Result<Self, RulesError> {
        Self::new(
            lives,
            self.points_per_correct,
            self.practice_limit,
            self.practice_floor,
        )
    }

    #[must_use]
    pub fn starting_lives(&self) -> u32 {
        self.starting_lives
    }

    #[must_use]
    pub fn points_per_correct(&self) -> u32 {
        self.points_per_correct
    }

    #[must_use]
    pub fn practice_limit(&self) -> usize {
        self.practice_limit
    }

    #[must_use]
    pub fn practice_floor(&self) -> usize {
        self.practice_floor
    }
}

impl Default for GameRules {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_rules_match_the_classic_game() {
        let rules = GameRules::standard();
        assert_eq!(rules.starting_lives(), 5);
        assert_eq!(rules.points_per_correct(), 10);
        assert_eq!(rules.practice_limit(), 5);
        assert_eq!(rules.practice_floor(), 3);
    }

    #[test]
    fn zero_values_are_rejected() {
        assert_eq!(GameRules::new(0, 10, 5, 3), Err(RulesError::InvalidStartingLives));
        assert_eq!(GameRules::new(5, 0, 5, 3), Err(RulesError::InvalidPointsPerCorrect));
        assert_eq!(GameRules::new(5, 10, 0, 3), Err(RulesError::InvalidPracticeLimit));
        assert_eq!(GameRules::new(5, 10, 5, 0), Err(RulesError::InvalidPracticeFloor));
    }

    #[test]
    fn lives_override_keeps_other_values() {
        let rules = GameRules::standard().with_starting_lives(3).unwrap();
        assert_eq!(rules.starting_lives(), 3);
        assert_eq!(rules.practice_limit(), 5);
    }
}
