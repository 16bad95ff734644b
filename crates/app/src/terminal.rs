//! Line-oriented presentation layer: draws render models to stdout and turns
//! typed lines into intents.

use std::fmt::Display;
use std::io::{self, Write};

use crossterm::queue;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use services::sessions::{
    ExerciseView, Feedback, GameOverView, Hud, PromptView, RenderModel, Screen, SessionEvent,
    SkillMapView, SkillStatus,
};
use services::{GameLoopService, Intent, SessionError};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Dispatch(Vec<Intent>),
    Quit,
    Unknown,
}

//
// ─── DRAWING ───────────────────────────────────────────────────────────────────
//

fn colored(out: &mut impl Write, color: Color, text: impl Display) -> io::Result<()> {
    queue!(out, SetForegroundColor(color), Print(text), ResetColor)
}

fn badge(status: SkillStatus) -> (&'static str, Color) {
    match status {
        SkillStatus::Locked => ("[locked]", Color::DarkGrey),
        SkillStatus::Unlocked => ("[open]", Color::Cyan),
        SkillStatus::Completed => ("[done]", Color::Green),
    }
}

fn draw_hud(hud: Option<Hud>, out: &mut impl Write) -> io::Result<()> {
    let Some(hud) = hud else {
        return Ok(());
    };
    colored(out, Color::Yellow, format!("Score: {}", hud.score))?;
    write!(out, "   Lives: ")?;
    colored(out, Color::Red, "♥".repeat(hud.lives as usize))?;
    writeln!(out)
}

fn draw_feedback(feedback: &Feedback, out: &mut impl Write) -> io::Result<()> {
    let color = if feedback.is_correct {
        Color::Green
    } else {
        Color::Red
    };
    colored(out, color, feedback.message())?;
    writeln!(out)
}

fn draw_map(map: &SkillMapView, practice_available: bool, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "Skill map")?;
    for (n, skill) in map.skills.iter().enumerate() {
        let (label, color) = badge(skill.status);
        write!(out, "  {}. ", n + 1)?;
        colored(out, color, format!("{label:<9}"))?;
        writeln!(
            out,
            " {} ({}/{})",
            skill.title, skill.lessons_completed, skill.lessons_total
        )?;
    }
    if practice_available {
        writeln!(out, "  p. Practice ({} exercises need work)", map.weak_exercises)?;
    }
    writeln!(out, "Pick a skill number, or q to quit.")
}

fn draw_exercise(view: &ExerciseView, out: &mut impl Write) -> io::Result<()> {
    let heading = if view.is_practice {
        "Practice"
    } else {
        view.lesson_title.as_str()
    };
    writeln!(out, "{heading}  ({}/{})", view.index + 1, view.total)?;
    match &view.prompt {
        PromptView::Choice { options, selected } => {
            writeln!(out, "{}", view.question)?;
            for (n, option) in options.iter().enumerate() {
                let mark = if selected.as_ref() == Some(option) { '>' } else { ' ' };
                writeln!(out, " {mark}{}. {option}", n + 1)?;
            }
        }
        PromptView::Blank { before, after } => writeln!(out, "{before}_____{after}")?,
    }

    match &view.feedback {
        Some(feedback) => {
            draw_feedback(feedback, out)?;
            writeln!(out, "Press Enter to continue.")
        }
        None if matches!(view.prompt, PromptView::Choice { .. }) => {
            writeln!(out, "Type an option number.")
        }
        None => writeln!(out, "Type your answer."),
    }
}

/// Draw one render model.
///
/// # Errors
///
/// Returns any I/O error from `out`.
pub fn draw(model: &RenderModel, out: &mut impl Write) -> io::Result<()> {
    writeln!(out)?;
    draw_hud(model.hud, out)?;
    match &model.screen {
        Screen::SkillMap(map) => draw_map(map, model.practice_available, out),
        Screen::Exercise(view) => draw_exercise(view, out),
        Screen::LessonComplete(view) => {
            colored(out, Color::Green, view.title)?;
            writeln!(out)?;
            if !view.is_practice {
                writeln!(out, "You finished \"{}\".", view.lesson_title)?;
            }
            if let Some(skill) = &view.unlocked_skill {
                write!(out, "New skill unlocked: ")?;
                colored(out, Color::Cyan, skill)?;
                writeln!(out)?;
            }
            writeln!(out, "Press Enter to return to the map.")
        }
        Screen::GameOver(view) => draw_game_over(view, out),
    }
}

fn draw_game_over(view: &GameOverView, out: &mut impl Write) -> io::Result<()> {
    if let Some(feedback) = &view.feedback {
        draw_feedback(feedback, out)?;
    }
    colored(out, Color::Red, "Game Over")?;
    writeln!(out)?;
    writeln!(
        out,
        "You ran out of lives in \"{}\" with {} points.",
        view.lesson_title, view.score
    )?;
    writeln!(out, "r to retry, m for the map.")
}

fn report(event: &SessionEvent, out: &mut impl Write) -> io::Result<()> {
    match event {
        SessionEvent::SkillLocked(_) => writeln!(out, "That skill is still locked."),
        SessionEvent::PracticeUnavailable { weak } => {
            writeln!(out, "Not enough weak exercises to practice yet ({weak} so far).")
        }
        _ => Ok(()),
    }
}

//
// ─── INPUT ─────────────────────────────────────────────────────────────────────
//

fn pick<'a, T>(items: &'a [T], line: &str) -> Option<&'a T> {
    let n: usize = line.parse().ok()?;
    items.get(n.checked_sub(1)?)
}

/// Interpret one typed line against the screen it answers.
#[must_use]
pub fn parse_command(model: &RenderModel, line: &str) -> Command {
    let line = line.trim();
    if line.eq_ignore_ascii_case("q") {
        return Command::Quit;
    }

    match &model.screen {
        Screen::SkillMap(map) => {
            if line.eq_ignore_ascii_case("p") {
                return Command::Dispatch(vec![Intent::StartPractice]);
            }
            pick(&map.skills, line).map_or(Command::Unknown, |skill| {
                Command::Dispatch(vec![Intent::OpenSkill(skill.id.clone())])
            })
        }
        Screen::Exercise(view) if view.feedback.is_some() => {
            Command::Dispatch(vec![Intent::Continue])
        }
        Screen::Exercise(view) => match &view.prompt {
            PromptView::Choice { options, .. } => {
                pick(options, line).map_or(Command::Unknown, |option| {
                    Command::Dispatch(vec![
                        Intent::SelectOption(option.clone()),
                        Intent::SubmitSelected,
                    ])
                })
            }
            PromptView::Blank { .. } if line.is_empty() => Command::Unknown,
            PromptView::Blank { .. } => {
                Command::Dispatch(vec![Intent::SubmitAnswer(line.to_string())])
            }
        },
        Screen::LessonComplete(_) => Command::Dispatch(vec![Intent::ReturnToMap]),
        Screen::GameOver(_) => match line.to_ascii_lowercase().as_str() {
            "r" => Command::Dispatch(vec![Intent::Retry]),
            "m" => Command::Dispatch(vec![Intent::ReturnToMap]),
            _ => Command::Unknown,
        },
    }
}

//
// ─── LOOP ──────────────────────────────────────────────────────────────────────
//

/// Run the interactive loop until the player quits or stdin closes.
///
/// # Errors
///
/// Returns I/O errors. Rejected intents and failed saves are printed and the
/// loop continues; a failed save leaves the screen as it was, so the same
/// input can be tried again.
pub async fn play(mut game: GameLoopService) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut out = io::stdout();

    draw(&game.render(), &mut out)?;
    out.flush()?;
    while let Some(line) = lines.next_line().await? {
        match parse_command(&game.render(), &line) {
            Command::Quit => break,
            Command::Unknown => writeln!(out, "Didn't catch that.")?,
            Command::Dispatch(intents) => {
                for intent in intents {
                    match game.dispatch(intent).await {
                        Ok(outcome) => report(&outcome.event, &mut out)?,
                        Err(SessionError::Storage(err)) => {
                            writeln!(out, "Progress could not be saved ({err}). Try again.")?;
                            break;
                        }
                        Err(err) => {
                            writeln!(out, "{err}")?;
                            break;
                        }
                    }
                }
            }
        }
        draw(&game.render(), &mut out)?;
        out.flush()?;
    }
    Ok(())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
