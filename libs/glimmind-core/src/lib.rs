//! Learning-cycle core for the Glimmind association trainer.
//!
//! Provides:
//! - Shared types (Association, AssociationList, Status, Stage, etc.)
//! - Fuzzy answer scoring (normalized Levenshtein similarity)
//! - The four-stage mastery engine with resumable queues
//! - Session state for prompts, typed answers and feedback timing
//! - Bulk import of pasted term/definition rows

pub mod engine;
pub mod import;
pub mod session;
pub mod similarity;
pub mod types;

pub use engine::{CycleEngine, ListObserver};
pub use similarity::{compare_answers, levenshtein_distance, normalize, score, MatchResult};
pub use session::{CardView, Feedback, Key, KeyOutcome, Session, DEFAULT_FEEDBACK_PAUSE_MS};
pub use types::{
    Association, AssociationList, FlipOrder, GameMode, ListSettings, ResumeState, Stage,
    StageCounts, Status,
};
