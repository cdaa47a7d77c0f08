//! Four-stage mastery cycle.
//!
//! The engine owns an [`AssociationList`] and drives it through the stages:
//! stage 1 drills `Unknown` items, stage 2 `Discovered`, stage 3 `Recognized`
//! and stage 4 `Known`. Each stage works through a shuffled queue of ids.
//! Every state-changing call checkpoints the list (statuses plus resume
//! state) through a single [`ListObserver`], so an interrupted session can
//! continue at the exact pending item.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::similarity::{compare_answers, MatchResult};
use crate::types::{
    Association, AssociationList, FlipOrder, GameMode, ListSettings, ResumeState, Stage,
    StageCounts, Status,
};

/// Receives the full list after every state change, for persistence.
pub trait ListObserver {
    fn on_list_changed(&mut self, list: &AssociationList);
}

impl<F> ListObserver for F
where
    F: FnMut(&AssociationList),
{
    fn on_list_changed(&mut self, list: &AssociationList) {
        self(list)
    }
}

/// Mastery state machine for a single list.
pub struct CycleEngine {
    list: AssociationList,
    stage: Stage,
    queue: Vec<String>,
    index: usize,
    finished: bool,
    revealed: bool,
    was_revealed: bool,
    rng: StdRng,
    observer: Box<dyn ListObserver>,
}

impl CycleEngine {
    /// Enter a session for `list`, resuming it if it carries a usable snapshot.
    pub fn new(list: AssociationList, observer: impl ListObserver + 'static) -> Self {
        Self::with_rng(list, observer, StdRng::from_rng(&mut rand::rng()))
    }

    /// Like [`CycleEngine::new`] with a caller-provided shuffle source.
    pub fn with_rng(
        list: AssociationList,
        observer: impl ListObserver + 'static,
        rng: StdRng,
    ) -> Self {
        let mut engine = Self {
            list,
            stage: Stage::Introduction,
            queue: Vec::new(),
            index: 0,
            finished: false,
            revealed: false,
            was_revealed: false,
            rng,
            observer: Box::new(observer),
        };
        engine.enter();
        engine
    }

    fn enter(&mut self) {
        match self.list.resume_state.clone() {
            Some(resume) if resume.queue.is_empty() => self.start_cycle(Stage::Introduction),
            Some(resume) if self.is_resumable(&resume) => {
                tracing::debug!(
                    list_id = %self.list.id,
                    stage = resume.cycle.to_value(),
                    index = resume.index,
                    queue_len = resume.queue.len(),
                    "resuming session"
                );
                self.stage = resume.cycle;
                self.queue = resume.queue;
                self.index = resume.index;
                self.finished = false;
                self.clear_item_state();
            }
            Some(_) => {
                tracing::warn!(list_id = %self.list.id, "malformed resume state, restarting");
                self.start_cycle(Stage::Introduction);
            }
            None => self.start_cycle(Stage::Introduction),
        }
    }

    fn is_resumable(&self, resume: &ResumeState) -> bool {
        resume.index < resume.queue.len()
            && resume.queue.iter().all(|id| self.list.find(id).is_some())
    }

    /// Build and shuffle the queue for `stage`, skipping ahead past empty
    /// stages. Finishes the session when nothing is left up to stage 4.
    pub fn start_cycle(&mut self, stage: Stage) {
        let mut stage = stage;
        loop {
            let mut queue = self.eligible(stage);
            if queue.is_empty() {
                match stage.next() {
                    Some(next) => {
                        stage = next;
                        continue;
                    }
                    None => {
                        self.finish();
                        return;
                    }
                }
            }

            queue.shuffle(&mut self.rng);
            tracing::debug!(
                list_id = %self.list.id,
                stage = stage.to_value(),
                queue_len = queue.len(),
                "cycle started"
            );

            self.stage = stage;
            self.queue = queue;
            self.index = 0;
            self.finished = false;
            self.clear_item_state();
            self.list.resume_state = Some(self.snapshot());
            self.emit();
            return;
        }
    }

    fn eligible(&self, stage: Stage) -> Vec<String> {
        let required = stage.required_status();
        self.list
            .associations
            .iter()
            .filter(|a| !a.archived && a.status == required)
            .map(|a| a.id.clone())
            .collect()
    }

    fn finish(&mut self) {
        tracing::debug!(list_id = %self.list.id, "session finished");
        self.stage = Stage::Mastery;
        self.queue.clear();
        self.index = 0;
        self.finished = true;
        self.clear_item_state();
        self.list.resume_state = None;
        self.emit();
    }

    /// Apply `next_status` to the current item and move on.
    ///
    /// Statuses never move backwards here; a lower `next_status` leaves the
    /// item unchanged. Does nothing when there is no current item.
    pub fn advance(&mut self, next_status: Status) {
        let Some(id) = self.current().map(|a| a.id.clone()) else {
            return;
        };
        if let Some(assoc) = self.list.associations.iter_mut().find(|a| a.id == id) {
            assoc.status = assoc.status.max(next_status);
        }
        self.clear_item_state();

        if self.index + 1 < self.queue.len() {
            self.index += 1;
            self.list.resume_state = Some(self.snapshot());
            self.emit();
        } else if let Some(next) = self.stage.next() {
            self.start_cycle(next);
        } else {
            self.finish();
        }
    }

    /// Self-reported correct answer. Refused once the answer has been shown
    /// for the current item. Returns whether the verdict was applied.
    pub fn mark_correct(&mut self) -> bool {
        if self.current().is_none() || self.revealed || self.was_revealed {
            return false;
        }
        self.advance(self.stage.on_correct());
        true
    }

    /// Move the current item forward a single step, without fast-tracking.
    pub fn pass(&mut self) -> bool {
        if self.current().is_none() {
            return false;
        }
        self.advance(self.stage.on_pass());
        true
    }

    /// Grade a typed answer against the hidden face.
    ///
    /// A rejected answer reveals the item and leaves it in place; an accepted
    /// one changes nothing until the caller commits it with
    /// [`CycleEngine::mark_correct`]. Empty input, a finished session or an
    /// already revealed item yield `None`.
    pub fn check_typed_answer(&mut self, input: &str) -> Option<MatchResult> {
        if input.trim().is_empty() || self.was_revealed {
            return None;
        }
        let (_, expected) = self.faces()?;
        let threshold = self.list.settings.effective_threshold();
        let result = compare_answers(input, expected, threshold);

        tracing::debug!(
            list_id = %self.list.id,
            similarity = result.similarity,
            threshold,
            accepted = result.is_correct,
            "typed answer graded"
        );

        if !result.is_correct {
            self.reveal();
        }
        Some(result)
    }

    /// Grade a typed answer and, if accepted, advance immediately.
    pub fn answer_typed(&mut self, input: &str) -> Option<MatchResult> {
        let result = self.check_typed_answer(input)?;
        if result.is_correct {
            self.mark_correct();
        }
        Some(result)
    }

    /// Show or hide the answer. Showing it marks the item as revealed until
    /// it is advanced. Returns the new visibility.
    pub fn toggle_reveal(&mut self) -> bool {
        if self.current().is_none() {
            return false;
        }
        if self.revealed {
            self.revealed = false;
        } else {
            self.reveal();
        }
        self.revealed
    }

    pub fn reveal(&mut self) {
        if self.current().is_some() {
            self.revealed = true;
            self.was_revealed = true;
        }
    }

    /// Put every active association back to `Unknown` and start over.
    pub fn reset(&mut self) {
        tracing::debug!(list_id = %self.list.id, "list reset");
        self.restart();
    }

    /// Archive mastered associations, then restart the rest from stage 1.
    pub fn archive_mastered(&mut self) {
        let mut archived = 0;
        for assoc in self.list.associations.iter_mut() {
            if !assoc.archived && assoc.status == Status::Mastered {
                assoc.archived = true;
                archived += 1;
            }
        }
        tracing::debug!(list_id = %self.list.id, archived, "mastered associations archived");
        self.restart();
    }

    /// Restart from stage 1 without archiving anything.
    pub fn continue_learning(&mut self) {
        self.restart();
    }

    fn restart(&mut self) {
        for assoc in self.list.associations.iter_mut().filter(|a| !a.archived) {
            assoc.status = Status::Unknown;
        }
        self.list.resume_state = None;
        self.start_cycle(Stage::Introduction);
    }

    /// Replace the list settings. The queue is left untouched.
    pub fn update_settings(&mut self, settings: ListSettings) {
        self.list.settings = settings;
        self.emit();
    }

    pub fn set_mode(&mut self, mode: GameMode) {
        self.list.settings.mode = mode;
        self.emit();
    }

    pub fn set_flip_order(&mut self, flip_order: FlipOrder) {
        self.list.settings.flip_order = flip_order;
        self.emit();
    }

    pub fn toggle_flip_order(&mut self) {
        let flipped = self.list.settings.flip_order.toggled();
        self.set_flip_order(flipped);
    }

    pub fn set_threshold(&mut self, threshold: f64) {
        self.list.settings.threshold = threshold;
        self.emit();
    }

    /// The association under review, if any.
    pub fn current(&self) -> Option<&Association> {
        if self.finished {
            return None;
        }
        let id = self.queue.get(self.index)?;
        self.list.find(id)
    }

    /// `(prompt, answer)` faces of the current item per the flip order.
    pub fn faces(&self) -> Option<(&str, &str)> {
        let assoc = self.current()?;
        Some(match self.list.settings.flip_order {
            FlipOrder::Normal => (assoc.term.as_str(), assoc.definition.as_str()),
            FlipOrder::Reversed => (assoc.definition.as_str(), assoc.term.as_str()),
        })
    }

    pub fn list(&self) -> &AssociationList {
        &self.list
    }

    pub fn into_list(self) -> AssociationList {
        self.list
    }

    pub fn settings(&self) -> &ListSettings {
        &self.list.settings
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn queue(&self) -> &[String] {
        &self.queue
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn was_revealed(&self) -> bool {
        self.was_revealed
    }

    pub fn stage_counts(&self) -> StageCounts {
        self.list.stage_counts()
    }

    fn snapshot(&self) -> ResumeState {
        ResumeState {
            cycle: self.stage,
            queue: self.queue.clone(),
            index: self.index,
        }
    }

    fn clear_item_state(&mut self) {
        self.revealed = false;
        self.was_revealed = false;
    }

    fn emit(&mut self) {
        self.list.touch();
        self.observer.on_list_changed(&self.list);
    }
}
