//! Interactive session state layered over [`CycleEngine`].
//!
//! Tracks what the player sees: the prompt and answer faces with their
//! labels, the typed-answer buffer, success/error feedback and the short
//! pause before an accepted answer advances. Time is passed in explicitly so
//! hosts decide how they tick.

use chrono::{DateTime, Duration, Utc};

use crate::engine::{CycleEngine, ListObserver};
use crate::similarity::MatchResult;
use crate::types::{
    AssociationList, FlipOrder, GameMode, ListSettings, Stage, StageCounts,
};

/// Delay between an accepted typed answer and the advance.
pub const DEFAULT_FEEDBACK_PAUSE_MS: i64 = 600;

/// Feedback shown for the current item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Feedback {
    #[default]
    None,
    Success,
    Error,
}

/// Keys the session reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Space,
    Backspace,
    Char(char),
}

/// What a key press ended up doing.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyOutcome {
    Ignored,
    Edited,
    Revealed,
    Passed,
    Checked(MatchResult),
}

/// The current item as it should be displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView {
    pub prompt: String,
    pub answer: String,
    pub prompt_label: String,
    pub answer_label: String,
    pub revealed: bool,
}

/// A single play session.
pub struct Session {
    engine: CycleEngine,
    input: String,
    feedback: Feedback,
    pending_advance: Option<DateTime<Utc>>,
    feedback_pause: Duration,
}

impl Session {
    pub fn new(list: AssociationList, observer: impl ListObserver + 'static) -> Self {
        Self::from_engine(CycleEngine::new(list, observer))
    }

    pub fn from_engine(engine: CycleEngine) -> Self {
        Self {
            engine,
            input: String::new(),
            feedback: Feedback::None,
            pending_advance: None,
            feedback_pause: Duration::milliseconds(DEFAULT_FEEDBACK_PAUSE_MS),
        }
    }

    pub fn with_feedback_pause(mut self, pause: Duration) -> Self {
        self.feedback_pause = pause;
        self
    }

    pub fn engine(&self) -> &CycleEngine {
        &self.engine
    }

    pub fn list(&self) -> &AssociationList {
        self.engine.list()
    }

    pub fn into_list(self) -> AssociationList {
        self.engine.into_list()
    }

    pub fn stage(&self) -> Stage {
        self.engine.stage()
    }

    pub fn is_finished(&self) -> bool {
        self.engine.is_finished()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn feedback(&self) -> Feedback {
        self.feedback
    }

    /// Whether an accepted answer is waiting for its pause to elapse.
    pub fn is_pending(&self) -> bool {
        self.pending_advance.is_some()
    }

    /// Status counts for the progress header.
    pub fn stage_counts(&self) -> StageCounts {
        self.engine.stage_counts()
    }

    /// 1-based position in the current queue and the queue length.
    pub fn progress(&self) -> Option<(usize, usize)> {
        if self.engine.is_finished() {
            return None;
        }
        Some((self.engine.index() + 1, self.engine.queue().len()))
    }

    pub fn card(&self) -> Option<CardView> {
        let (prompt, answer) = self.engine.faces()?;
        let (term_label, definition_label) = self.list().face_labels();
        let (prompt_label, answer_label) = match self.engine.settings().flip_order {
            FlipOrder::Normal => (term_label, definition_label),
            FlipOrder::Reversed => (definition_label, term_label),
        };
        Some(CardView {
            prompt: prompt.to_string(),
            answer: answer.to_string(),
            prompt_label,
            answer_label,
            revealed: self.engine.is_revealed(),
        })
    }

    /// Keyboard handling.
    ///
    /// Enter and Space reveal a hidden answer and pass a revealed one. In
    /// written mode, before the answer has been shown, Enter grades the
    /// buffer instead and the other keys edit it.
    pub fn handle_key(&mut self, key: Key, now: DateTime<Utc>) -> KeyOutcome {
        if self.pending_advance.is_some() || self.engine.is_finished() {
            return KeyOutcome::Ignored;
        }
        if self.feedback == Feedback::Error {
            self.feedback = Feedback::None;
        }

        let typing =
            self.engine.settings().mode == GameMode::Written && !self.engine.was_revealed();

        match key {
            Key::Enter if typing => match self.check_answer(now) {
                Some(result) => KeyOutcome::Checked(result),
                None => KeyOutcome::Ignored,
            },
            Key::Space if typing => {
                self.input.push(' ');
                KeyOutcome::Edited
            }
            Key::Char(c) if typing => {
                self.input.push(c);
                KeyOutcome::Edited
            }
            Key::Backspace if typing => {
                self.input.pop();
                KeyOutcome::Edited
            }
            Key::Enter | Key::Space => {
                if self.engine.is_revealed() {
                    self.pass();
                    KeyOutcome::Passed
                } else {
                    self.engine.reveal();
                    KeyOutcome::Revealed
                }
            }
            _ => KeyOutcome::Ignored,
        }
    }

    /// Replace the typed-answer buffer.
    pub fn set_input(&mut self, text: &str) {
        if self.pending_advance.is_some() {
            return;
        }
        self.input = text.to_string();
        if self.feedback == Feedback::Error {
            self.feedback = Feedback::None;
        }
    }

    /// Grade the buffer. An accepted answer schedules the advance for
    /// `now + feedback_pause`; see [`Session::poll`].
    pub fn check_answer(&mut self, now: DateTime<Utc>) -> Option<MatchResult> {
        if self.pending_advance.is_some() {
            return None;
        }
        let result = self.engine.check_typed_answer(&self.input)?;
        if result.is_correct {
            self.feedback = Feedback::Success;
            self.pending_advance = Some(now + self.feedback_pause);
        } else {
            self.feedback = Feedback::Error;
        }
        Some(result)
    }

    /// Commit a pending accepted answer once its pause has elapsed.
    /// Returns true if the session advanced.
    pub fn poll(&mut self, now: DateTime<Utc>) -> bool {
        match self.pending_advance {
            Some(due) if now >= due => {
                self.pending_advance = None;
                let advanced = self.engine.mark_correct();
                self.clear_item_state();
                advanced
            }
            _ => false,
        }
    }

    /// Self-reported correct answer.
    pub fn correct(&mut self) -> bool {
        if self.pending_advance.is_some() {
            return false;
        }
        let applied = self.engine.mark_correct();
        if applied {
            self.clear_item_state();
        }
        applied
    }

    pub fn pass(&mut self) -> bool {
        if self.pending_advance.is_some() {
            return false;
        }
        let applied = self.engine.pass();
        if applied {
            self.clear_item_state();
        }
        applied
    }

    pub fn toggle_reveal(&mut self) -> bool {
        if self.pending_advance.is_some() {
            return self.engine.is_revealed();
        }
        self.engine.toggle_reveal()
    }

    pub fn set_mode(&mut self, mode: GameMode) {
        self.engine.set_mode(mode);
    }

    /// Takes effect on the current item right away.
    pub fn set_flip_order(&mut self, flip_order: FlipOrder) {
        self.engine.set_flip_order(flip_order);
    }

    pub fn toggle_flip_order(&mut self) {
        self.engine.toggle_flip_order();
    }

    pub fn set_threshold(&mut self, threshold: f64) {
        self.engine.set_threshold(threshold);
    }

    pub fn update_settings(&mut self, settings: ListSettings) {
        self.engine.update_settings(settings);
    }

    pub fn reset(&mut self) {
        self.pending_advance = None;
        self.engine.reset();
        self.clear_item_state();
    }

    pub fn archive_mastered(&mut self) {
        self.pending_advance = None;
        self.engine.archive_mastered();
        self.clear_item_state();
    }

    pub fn continue_learning(&mut self) {
        self.pending_advance = None;
        self.engine.continue_learning();
        self.clear_item_state();
    }

    fn clear_item_state(&mut self) {
        self.input.clear();
        self.feedback = Feedback::None;
    }
}
