use std::sync::Arc;

use lesson_core::model::{ExerciseId, LessonId, MasteryRecord, ProgressSnapshot, SkillId};
use services::sessions::{Hud, SessionEvent, SessionState, SkillStatus};
use services::{AppServices, GameLoopService, Intent, Screen};
use storage::{InMemoryRepository, PROGRESS_KEY, ProgressRepository, ProgressStore, Storage};

const CATALOG: &str = r#"{
    "skills": [
        {"id": "skill-1", "title": "Computer Components", "lessons": [
            {"id": "lesson-1", "title": "The Brain", "exercises": [
                {"id": "ex-1", "type": "multiple-choice", "question": "Which part is the brain of the computer?", "answer": "CPU", "options": ["CPU", "RAM", "GPU"]},
                {"id": "ex-2", "type": "fill-in-the-blank", "question": "The ___ executes instructions.", "answer": "CPU"}
            ]},
            {"id": "lesson-2", "title": "Memory", "exercises": [
                {"id": "ex-3", "type": "multiple-choice", "question": "Which memory is volatile?", "answer": "RAM", "options": ["RAM", "SSD"]}
            ]}
        ]},
        {"id": "skill-2", "title": "Storage", "lessons": [
            {"id": "lesson-3", "title": "Drives", "exercises": [
                {"id": "ex-4", "type": "fill-in-the-blank", "question": "An ___ has no moving parts.", "answer": "SSD"},
                {"id": "ex-5", "type": "fill-in-the-blank", "question": "An ___ has platters.", "answer": "HDD"},
                {"id": "ex-6", "type": "fill-in-the-blank", "question": "A ___ stick is portable.", "answer": "USB"},
                {"id": "ex-7", "type": "fill-in-the-blank", "question": "NVMe drives use ___ lanes.", "answer": "PCIe"},
                {"id": "ex-8", "type": "fill-in-the-blank", "question": "Files live on a ___ system.", "answer": "file"},
                {"id": "ex-9", "type": "fill-in-the-blank", "question": "RAID ___ mirrors disks.", "answer": "1"}
            ]}
        ]}
    ]
}"#;

fn app_over(repo: Arc<InMemoryRepository>) -> AppServices {
    let catalog = services::parse_catalog(CATALOG).unwrap();
    let storage = Storage { progress: repo };
    AppServices::from_parts(catalog, &storage, lesson_core::model::GameRules::standard())
}

async fn stored(repo: &InMemoryRepository) -> ProgressSnapshot {
    let blob = repo.load_slot(PROGRESS_KEY).await.unwrap().expect("progress saved");
    serde_json::from_str(&blob).unwrap()
}

async fn play_through(game: &mut GameLoopService, skill: &str, lesson: &str) -> SessionEvent {
    let _ = game
        .dispatch(Intent::StartLesson {
            skill: SkillId::new(skill),
            lesson: LessonId::new(lesson),
        })
        .await
        .unwrap();
    loop {
        let answer = game
            .session()
            .current_exercise()
            .expect("exercise on screen")
            .correct_answer()
            .to_string();
        let _ = game.dispatch(Intent::SubmitAnswer(answer)).await.unwrap();
        let outcome = game.dispatch(Intent::Continue).await.unwrap();
        if game.session().state() == SessionState::LessonComplete {
            return outcome.event;
        }
    }
}

/// Plays lesson-1 with the given answer to ex-1 and a correct answer to ex-2.
async fn play_lesson_1(game: &mut GameLoopService, first_answer: &str) {
    let _ = game
        .dispatch(Intent::StartLesson {
            skill: SkillId::new("skill-1"),
            lesson: LessonId::new("lesson-1"),
        })
        .await
        .unwrap();
    let _ = game.dispatch(Intent::SubmitAnswer(first_answer.into())).await.unwrap();
    let _ = game.dispatch(Intent::Continue).await.unwrap();
    let _ = game.dispatch(Intent::SubmitAnswer("cpu".into())).await.unwrap();
    let _ = game.dispatch(Intent::Continue).await.unwrap();
    let _ = game.dispatch(Intent::ReturnToMap).await.unwrap();
}

#[tokio::test]
async fn completing_a_skill_unlocks_the_next_and_persists() {
    let repo = Arc::new(InMemoryRepository::new());
    let app = app_over(repo.clone());
    let mut game = app.start_game().await.unwrap();

    let _ = play_through(&mut game, "skill-1", "lesson-1").await;
    let _ = game.dispatch(Intent::ReturnToMap).await.unwrap();
    let event = play_through(&mut game, "skill-1", "lesson-2").await;
    assert_eq!(
        event,
        SessionEvent::LessonCompleted {
            lesson: LessonId::new("lesson-2"),
            unlocked: Some(SkillId::new("skill-2")),
        }
    );

    let saved = stored(&repo).await;
    assert!(saved.is_lesson_completed(&LessonId::new("lesson-1")));
    assert!(saved.is_lesson_completed(&LessonId::new("lesson-2")));
    assert!(saved.is_skill_unlocked(&SkillId::new("skill-2")));

    // A new game over the same storage resumes the saved map.
    let outcome = game.dispatch(Intent::ReturnToMap).await.unwrap();
    assert_eq!(outcome.render.hud, None);
    let resumed = app.start_game().await.unwrap();
    let Screen::SkillMap(map) = resumed.render().screen else {
        panic!("expected the skill map");
    };
    assert_eq!(map.skills[0].status, SkillStatus::Completed);
    assert_eq!(map.skills[1].status, SkillStatus::Unlocked);
}

#[tokio::test]
async fn repeated_misses_mark_exercise_weak() {
    let repo = Arc::new(InMemoryRepository::new());
    let app = app_over(repo.clone());
    let mut game = app.start_game().await.unwrap();
    let ex_1 = ExerciseId::new("ex-1");

    for _ in 0..3 {
        play_lesson_1(&mut game, "GPU").await;
    }
    assert_eq!(stored(&repo).await.mastery(&ex_1), Some(MasteryRecord::new(-6)));

    for _ in 0..2 {
        play_lesson_1(&mut game, "CPU").await;
    }
    let saved = stored(&repo).await;
    assert_eq!(saved.mastery(&ex_1), Some(MasteryRecord::new(-4)));
    assert!(lesson_core::mastery::is_weak(-4));
    assert_eq!(saved.mastery(&ExerciseId::new("ex-2")), Some(MasteryRecord::new(5)));
}

#[tokio::test]
async fn practice_unlocks_at_three_weak_exercises() {
    let repo = Arc::new(InMemoryRepository::new());
    let app = app_over(repo.clone());
    let mut snapshot = ProgressSnapshot::for_catalog(&app.catalog());
    snapshot.set_mastery(ExerciseId::new("ex-1"), MasteryRecord::new(-2));
    snapshot.set_mastery(ExerciseId::new("ex-2"), MasteryRecord::new(0));
    app.store().save(&snapshot).await.unwrap();

    let mut game = app.start_game().await.unwrap();
    assert!(!game.render().practice_available);
    let outcome = game.dispatch(Intent::StartPractice).await.unwrap();
    assert_eq!(outcome.event, SessionEvent::PracticeUnavailable { weak: 2 });

    // Miss ex-3 once in lesson-2 to make a third weak exercise.
    let _ = game
        .dispatch(Intent::StartLesson {
            skill: SkillId::new("skill-1"),
            lesson: LessonId::new("lesson-2"),
        })
        .await
        .unwrap();
    let outcome = game.dispatch(Intent::SubmitAnswer("SSD".into())).await.unwrap();
    assert!(outcome.render.practice_available);
    assert_eq!(stored(&repo).await.exercise_performance().len(), 3);
}

#[tokio::test]
async fn five_misses_end_the_run_and_retry_keeps_score() {
    let repo = Arc::new(InMemoryRepository::new());
    let store = ProgressStore::new(repo.clone());
    let catalog = Arc::new(services::parse_catalog(CATALOG).unwrap());
    let mut snapshot = ProgressSnapshot::for_catalog(&catalog);
    snapshot.unlock_skill(SkillId::new("skill-2"));
    store.save(&snapshot).await.unwrap();

    let mut game = GameLoopService::start(
        catalog,
        lesson_core::model::GameRules::standard(),
        store,
    )
    .await
    .unwrap();
    let _ = game.dispatch(Intent::OpenSkill(SkillId::new("skill-2"))).await.unwrap();
    let _ = game.dispatch(Intent::SubmitAnswer("ssd".into())).await.unwrap();
    let _ = game.dispatch(Intent::Continue).await.unwrap();

    let mut last = None;
    for _ in 0..5 {
        let outcome = game.dispatch(Intent::SubmitAnswer("nope".into())).await.unwrap();
        if game.session().state() != SessionState::GameOver {
            let _ = game.dispatch(Intent::Continue).await.unwrap();
        }
        last = Some(outcome);
    }
    let outcome = last.unwrap();
    assert!(matches!(outcome.event, SessionEvent::Answered { game_over: true, .. }));
    let Screen::GameOver(view) = &outcome.render.screen else {
        panic!("expected the game over screen");
    };
    assert_eq!(view.feedback.as_ref().map(|f| f.correct_answer.as_str()), Some("1"));
    assert!(!stored(&repo).await.is_lesson_completed(&LessonId::new("lesson-3")));

    let outcome = game.dispatch(Intent::Retry).await.unwrap();
    assert_eq!(outcome.render.hud, Some(Hud { score: 10, lives: 5 }));
    assert_eq!(
        game.session().state(),
        SessionState::InLesson {
            index: 0,
            phase: services::sessions::AnswerPhase::AwaitingAnswer
        }
    );
}

#[tokio::test]
async fn practice_run_leaves_mastery_untouched() {
    let repo = Arc::new(InMemoryRepository::new());
    let app = app_over(repo.clone());
    let mut snapshot = ProgressSnapshot::for_catalog(&app.catalog());
    let scores = [("ex-1", -2), ("ex-3", -6), ("ex-4", -4), ("ex-5", 0), ("ex-6", -1), ("ex-7", -3)];
    for (id, score) in scores {
        snapshot.set_mastery(ExerciseId::new(id), MasteryRecord::new(score));
    }
    app.store().save(&snapshot).await.unwrap();

    let mut game = app.start_game().await.unwrap();
    let outcome = game.dispatch(Intent::StartPractice).await.unwrap();
    assert!(matches!(outcome.event, SessionEvent::LessonStarted { is_practice: true, .. }));
    let Screen::Exercise(view) = outcome.render.screen else {
        panic!("expected a practice exercise");
    };
    assert!(view.is_practice);
    assert_eq!(view.total, 5);

    let picked: Vec<String> = game
        .session()
        .active_lesson()
        .unwrap()
        .exercises
        .iter()
        .map(|exercise| exercise.id().to_string())
        .collect();
    assert_eq!(picked, vec!["ex-3", "ex-4", "ex-7", "ex-1", "ex-6"]);

    loop {
        let answer = game.session().current_exercise().unwrap().correct_answer().to_string();
        let _ = game.dispatch(Intent::SubmitAnswer(answer)).await.unwrap();
        let outcome = game.dispatch(Intent::Continue).await.unwrap();
        if let Screen::LessonComplete(view) = outcome.render.screen {
            assert_eq!(view.title, "Practice Complete!");
            assert_eq!(outcome.event, SessionEvent::PracticeCompleted);
            break;
        }
    }

    assert_eq!(stored(&repo).await, snapshot);
    assert_eq!(game.render().hud, Some(Hud { score: 50, lives: 5 }));
}

#[test]
fn bundled_demo_catalog_is_valid() {
    let catalog = services::parse_catalog(include_str!("../../../demos/lessons.json")).unwrap();
    assert_eq!(catalog.skills().len(), 3);
    assert_eq!(catalog.exercise_count(), 13);
}
