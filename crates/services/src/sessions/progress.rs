/// Position inside the active lesson, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LessonProgress {
    /// Zero-based index of the current exercise.
    pub index: usize,
    pub total: usize,
}
