//! Line-driven play loop.
//!
//! Each input line is one action: an empty line is Enter, `:`-prefixed
//! words are commands, and any other text in written mode is typed as the
//! answer and submitted.

use std::io::{BufRead, Write};
use std::thread;

use anyhow::Result;
use chrono::{Duration, Utc};
use glimmind_core::{
    AssociationList, Feedback, GameMode, Key, KeyOutcome, ListObserver, Session,
};

const HELP: &str = "Enter: reveal/pass  :correct  :pass  :reveal  :flip  :reset  :quit";
const FINISHED_HELP: &str = ":archive  :continue  :reset  :quit";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Key(Key),
    Reveal,
    Correct,
    Pass,
    Flip,
    Archive,
    Continue,
    Reset,
    Quit,
    Answer(String),
    Unknown(String),
}

impl Action {
    pub fn parse(line: &str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return Action::Key(Key::Enter);
        }
        match line.trim().strip_prefix(':') {
            Some(command) => match command.to_lowercase().as_str() {
                "space" => Action::Key(Key::Space),
                "reveal" => Action::Reveal,
                "correct" => Action::Correct,
                "pass" => Action::Pass,
                "flip" => Action::Flip,
                "archive" => Action::Archive,
                "continue" => Action::Continue,
                "reset" => Action::Reset,
                "quit" | "q" => Action::Quit,
                other => Action::Unknown(other.to_string()),
            },
            None => Action::Answer(line.to_string()),
        }
    }
}

/// Play `list` until it is quit or the input runs out. Returns the list in
/// its final state; every change has already gone through `observer`.
pub fn run<R, W>(
    list: AssociationList,
    observer: impl ListObserver + 'static,
    feedback_pause: Duration,
    input: R,
    out: &mut W,
) -> Result<AssociationList>
where
    R: BufRead,
    W: Write,
{
    let mut session = Session::new(list, observer).with_feedback_pause(feedback_pause);
    render(&session, out)?;

    for line in input.lines() {
        let action = Action::parse(&line?);
        if action == Action::Quit {
            break;
        }
        apply(&mut session, action, feedback_pause, out)?;
        render(&session, out)?;
    }

    Ok(session.into_list())
}

fn apply<W: Write>(
    session: &mut Session,
    action: Action,
    feedback_pause: Duration,
    out: &mut W,
) -> Result<()> {
    let now = Utc::now();
    match action {
        Action::Key(key) => {
            let outcome = session.handle_key(key, now);
            report(session, outcome, now, feedback_pause, out)?;
        }
        Action::Answer(text) => {
            let typing =
                session.list().settings.mode == GameMode::Written && !session.engine().was_revealed();
            if typing {
                session.set_input(&text);
                let outcome = session.handle_key(Key::Enter, now);
                report(session, outcome, now, feedback_pause, out)?;
            } else if !session.is_finished() {
                writeln!(out, "{HELP}")?;
            }
        }
        Action::Reveal => {
            session.toggle_reveal();
        }
        Action::Correct => {
            session.correct();
        }
        Action::Pass => {
            session.pass();
        }
        Action::Flip => session.toggle_flip_order(),
        Action::Archive => session.archive_mastered(),
        Action::Continue => session.continue_learning(),
        Action::Reset => session.reset(),
        Action::Unknown(command) => {
            writeln!(out, "Unknown command ':{command}'")?;
            let help = if session.is_finished() { FINISHED_HELP } else { HELP };
            writeln!(out, "{help}")?;
        }
        Action::Quit => {}
    }
    Ok(())
}

fn report<W: Write>(
    session: &mut Session,
    outcome: KeyOutcome,
    now: chrono::DateTime<Utc>,
    feedback_pause: Duration,
    out: &mut W,
) -> Result<()> {
    let KeyOutcome::Checked(result) = outcome else {
        return Ok(());
    };
    let percent = (result.similarity * 100.0).round();

    if result.is_correct {
        writeln!(out, "Correct ({percent}%)")?;
        // Hold the success feedback on screen before moving on
        thread::sleep(feedback_pause.to_std().unwrap_or_default());
        session.poll(now + feedback_pause);
    } else if session.feedback() == Feedback::Error {
        writeln!(out, "Not quite ({percent}%)")?;
    }
    Ok(())
}

fn render<W: Write>(session: &Session, out: &mut W) -> Result<()> {
    let counts = session.stage_counts();

    if session.is_finished() {
        writeln!(out)?;
        writeln!(
            out,
            "Session complete: {} mastered, {} archived",
            counts.mastered, counts.archived
        )?;
        writeln!(out, "{FINISHED_HELP}")?;
        return Ok(());
    }

    let Some(card) = session.card() else {
        return Ok(());
    };
    let stage = session.stage();
    let (position, total) = session.progress().unwrap_or((0, 0));

    writeln!(out)?;
    writeln!(
        out,
        "[Stage {} {}] {}/{}   unknown {} discovered {} recognized {} known {} mastered {}",
        stage.to_value(),
        stage.name(),
        position,
        total,
        counts.unknown,
        counts.discovered,
        counts.recognized,
        counts.known,
        counts.mastered
    )?;
    writeln!(out, "{}: {}", card.prompt_label, card.prompt)?;
    if card.revealed {
        writeln!(out, "{}: {}", card.answer_label, card.answer)?;
    } else if session.list().settings.mode == GameMode::Written && !session.engine().was_revealed() {
        writeln!(out, "Type the {}:", card.answer_label.to_lowercase())?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glimmind_core::{Association, Status};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::io::Cursor;
    use std::rc::Rc;

    fn list(mode: GameMode) -> AssociationList {
        let mut list = AssociationList::new(
            "me",
            "Spanish",
            "English / Spanish",
            vec![Association::new("dog", "perro"), Association::new("cat", "gato")],
        );
        list.settings.mode = mode;
        list.settings.threshold = 0.9;
        list
    }

    fn play(list: AssociationList, input: &str) -> (AssociationList, String, usize) {
        let saves = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&saves);
        let mut out = Vec::new();
        let list = run(
            list,
            move |_: &AssociationList| *counter.borrow_mut() += 1,
            Duration::zero(),
            Cursor::new(input.to_string()),
            &mut out,
        )
        .unwrap();
        let saves = *saves.borrow();
        (list, String::from_utf8(out).unwrap(), saves)
    }

    #[test]
    fn parses_actions() {
        assert_eq!(Action::parse(""), Action::Key(Key::Enter));
        assert_eq!(Action::parse("  \r"), Action::Key(Key::Enter));
        assert_eq!(Action::parse(":space"), Action::Key(Key::Space));
        assert_eq!(Action::parse(":Correct"), Action::Correct);
        assert_eq!(Action::parse(":q"), Action::Quit);
        assert_eq!(Action::parse("perro"), Action::Answer("perro".into()));
        assert_eq!(Action::parse(":nope"), Action::Unknown("nope".into()));
    }

    #[test]
    fn self_report_masters_everything() {
        let (list, out, saves) = play(list(GameMode::Practice), ":correct\n:correct\n");
        assert!(list.associations.iter().all(|a| a.status == Status::Mastered));
        assert!(list.resume_state.is_none());
        assert!(out.contains("Session complete: 2 mastered"));
        // Start plus one per answer
        assert_eq!(saves, 3);
    }

    #[test]
    fn enter_reveals_then_passes() {
        let (list, out, _) = play(list(GameMode::Practice), "\n\n:quit\n");
        assert!(out.contains("Spanish: "));
        assert_eq!(list.stage_counts().discovered, 1);
        assert_eq!(list.resume_state.unwrap().index, 1);
    }

    #[test]
    fn written_answers_are_graded() {
        let mut list = list(GameMode::Written);
        list.associations.truncate(1);
        let (list, out, _) = play(list, "gato\nperro\n");
        assert!(out.contains("Not quite"));
        // The rejected answer revealed the card; the second line is not graded
        assert_eq!(list.associations[0].status, Status::Unknown);

        let mut fresh = self::list(GameMode::Written);
        fresh.associations.truncate(1);
        let (fresh, out, _) = play(fresh, "Perro\n");
        assert!(out.contains("Correct (100%)"));
        assert_eq!(fresh.associations[0].status, Status::Mastered);
    }

    #[test]
    fn archive_after_finishing() {
        let (list, _, _) = play(list(GameMode::Practice), ":correct\n:correct\n:archive\n");
        assert_eq!(list.stage_counts().archived, 2);
        assert!(list.resume_state.is_none());
    }
}
