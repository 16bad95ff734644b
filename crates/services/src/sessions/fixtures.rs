//! Shared catalog for session tests.

use lesson_core::model::{
    Catalog, Exercise, ExerciseId, FillInTheBlank, Lesson, LessonId, MultipleChoice, Skill,
    SkillId,
};

fn choice(id: &str, question: &str, answer: &str, options: &[&str]) -> Exercise {
    Exercise::MultipleChoice(MultipleChoice {
        id: ExerciseId::new(id),
        question: question.to_string(),
        answer: answer.to_string(),
        options: options.iter().map(|o| (*o).to_string()).collect(),
    })
}

fn blank(id: &str, question: &str, answer: &str) -> Exercise {
    Exercise::FillInTheBlank(FillInTheBlank {
        id: ExerciseId::new(id),
        question: question.to_string(),
        answer: answer.to_string(),
    })
}

fn lesson(id: &str, title: &str, exercises: Vec<Exercise>) -> Lesson {
    Lesson {
        id: LessonId::new(id),
        title: title.to_string(),
        exercises,
    }
}

/// Two skills: `skill-1` with two short lessons, `skill-2` with one
/// six-exercise lesson, long enough to run out of lives.
pub(crate) fn sample_catalog() -> Catalog {
    let components = Skill {
        id: SkillId::new("skill-1"),
        title: "Computer Components".into(),
        lessons: vec![
            lesson(
                "lesson-1",
                "The Brain",
                vec![
                    choice("ex-1", "Which part is the brain of the computer?", "CPU", &["CPU", "RAM", "GPU"]),
                    blank("ex-2", "The ___ executes instructions.", "CPU"),
                ],
            ),
            lesson(
                "lesson-2",
                "Memory",
                vec![
                    choice("ex-3", "Which memory is volatile?", "RAM", &["RAM", "SSD", "HDD"]),
                    blank("ex-4", "Data is lost from ___ when power is off.", "RAM"),
                ],
            ),
        ],
    };
    let storage = Skill {
        id: SkillId::new("skill-2"),
        title: "Storage".into(),
        lessons: vec![lesson(
            "lesson-3",
            "Drives",
            vec![
                choice("ex-5", "Which drive has no moving parts?", "SSD", &["SSD", "HDD"]),
                blank("ex-6", "An ___ stores data on spinning platters.", "HDD"),
                choice("ex-7", "Which is faster?", "NVMe", &["NVMe", "SATA"]),
                blank("ex-8", "A ___ drive is portable.", "USB"),
                choice("ex-9", "What does HDD stand for?", "Hard Disk Drive", &["Hard Disk Drive", "High Data Drive"]),
                blank("ex-10", "Files live on a ___ system.", "file"),
            ],
        )],
    };

    match Catalog::new(vec![components, storage]) {
        Ok(catalog) => catalog,
        Err(err) => panic!("sample catalog is invalid: {err}"),
    }
}

pub(crate) fn answer_for(exercise: &Exercise) -> String {
    exercise.correct_answer().to_string()
}

pub(crate) fn wrong_answer_for(exercise: &Exercise) -> String {
    match exercise {
        Exercise::MultipleChoice(choice) => choice
            .options
            .iter()
            .find(|option| **option != choice.answer)
            .cloned()
            .unwrap_or_default(),
        Exercise::FillInTheBlank(_) => "definitely wrong".to_string(),
    }
}
