//! Core types for the association trainer.

use chrono::Utc;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Threshold used whenever a list carries a missing or out-of-range value.
pub const FALLBACK_THRESHOLD: f64 = 0.9;

/// Threshold given to freshly created lists.
pub const DEFAULT_THRESHOLD: f64 = 0.95;

const DEFAULT_TERM_LABEL: &str = "Term";
const DEFAULT_DEFINITION_LABEL: &str = "Definition";

/// Mastery depth of an association, in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    #[serde(alias = "DESCONOCIDA")]
    Unknown,
    #[serde(alias = "DESCUBIERTA")]
    Discovered,
    #[serde(alias = "RECONOCIDA")]
    Recognized,
    #[serde(alias = "CONOCIDA")]
    Known,
    #[serde(alias = "APRENDIDA")]
    Mastered,
}

impl Default for Status {
    fn default() -> Self {
        Self::Unknown
    }
}

impl Status {
    /// The status one step further along, saturating at `Mastered`.
    pub fn next(self) -> Self {
        match self {
            Self::Unknown => Self::Discovered,
            Self::Discovered => Self::Recognized,
            Self::Recognized => Self::Known,
            Self::Known | Self::Mastered => Self::Mastered,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Discovered => "discovered",
            Self::Recognized => "recognized",
            Self::Known => "known",
            Self::Mastered => "mastered",
        }
    }
}

/// One of the four sequential review phases.
///
/// Serialized as the integers 1-4 so resume snapshots stay compact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Stage {
    Introduction,
    Discovery,
    Recognition,
    Mastery,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Self::Introduction,
        Self::Discovery,
        Self::Recognition,
        Self::Mastery,
    ];

    /// Convert to the 1-based stage number.
    pub fn to_value(self) -> u8 {
        match self {
            Self::Introduction => 1,
            Self::Discovery => 2,
            Self::Recognition => 3,
            Self::Mastery => 4,
        }
    }

    /// Create from the 1-based stage number.
    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Introduction),
            2 => Some(Self::Discovery),
            3 => Some(Self::Recognition),
            4 => Some(Self::Mastery),
            _ => None,
        }
    }

    /// The following stage, or `None` after the last one.
    pub fn next(self) -> Option<Self> {
        Self::from_value(self.to_value() + 1)
    }

    /// Status an association must hold to be queued in this stage.
    pub fn required_status(self) -> Status {
        match self {
            Self::Introduction => Status::Unknown,
            Self::Discovery => Status::Discovered,
            Self::Recognition => Status::Recognized,
            Self::Mastery => Status::Known,
        }
    }

    /// Status after a correct answer. The first stage fast-tracks to `Mastered`.
    pub fn on_correct(self) -> Status {
        match self {
            Self::Introduction => Status::Mastered,
            _ => self.on_pass(),
        }
    }

    /// Status after an explicit pass: always a single step.
    pub fn on_pass(self) -> Status {
        self.required_status().next()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Introduction => "Introduction",
            Self::Discovery => "Discovery",
            Self::Recognition => "Recognition",
            Self::Mastery => "Mastery",
        }
    }
}

impl From<Stage> for u8 {
    fn from(stage: Stage) -> Self {
        stage.to_value()
    }
}

impl TryFrom<u8> for Stage {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_value(value).ok_or_else(|| format!("invalid stage {value}, expected 1-4"))
    }
}

/// A term/definition pair being memorized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Association {
    pub id: String,
    pub term: String,
    pub definition: String,
    #[serde(default)]
    pub status: Status,
    /// Archived items are kept in the list but never queued.
    #[serde(default, rename = "history")]
    pub archived: bool,
}

impl Association {
    /// Create a new, unknown association with a fresh id.
    pub fn new(term: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            term: term.into(),
            definition: definition.into(),
            status: Status::Unknown,
            archived: false,
        }
    }
}

/// Whether answers are self-reported or typed and graded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    #[serde(alias = "training")]
    Practice,
    #[serde(alias = "real")]
    Written,
}

impl Default for GameMode {
    fn default() -> Self {
        Self::Practice
    }
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Practice => "practice",
            Self::Written => "written",
        }
    }

    /// Parse from string, accepting the legacy names as well.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "practice" | "training" => Some(Self::Practice),
            "written" | "real" => Some(Self::Written),
            _ => None,
        }
    }
}

/// Which face is the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlipOrder {
    /// Term shown, definition is the answer.
    Normal,
    /// Definition shown, term is the answer.
    Reversed,
}

impl Default for FlipOrder {
    fn default() -> Self {
        Self::Normal
    }
}

impl FlipOrder {
    pub fn toggled(self) -> Self {
        match self {
            Self::Normal => Self::Reversed,
            Self::Reversed => Self::Normal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Reversed => "reversed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "normal" => Some(Self::Normal),
            "reversed" => Some(Self::Reversed),
            _ => None,
        }
    }
}

/// Per-list session settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSettings {
    #[serde(default)]
    pub mode: GameMode,
    #[serde(default)]
    pub flip_order: FlipOrder,
    #[serde(default = "fallback_threshold")]
    pub threshold: f64,
}

fn fallback_threshold() -> f64 {
    FALLBACK_THRESHOLD
}

impl Default for ListSettings {
    fn default() -> Self {
        Self {
            mode: GameMode::default(),
            flip_order: FlipOrder::default(),
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl ListSettings {
    /// Threshold clamped to something usable.
    ///
    /// NaN or values outside [0, 1] yield [`FALLBACK_THRESHOLD`].
    pub fn effective_threshold(&self) -> f64 {
        if (0.0..=1.0).contains(&self.threshold) {
            self.threshold
        } else {
            tracing::warn!(
                threshold = self.threshold,
                fallback = FALLBACK_THRESHOLD,
                "list threshold out of range, using fallback"
            );
            FALLBACK_THRESHOLD
        }
    }
}

/// Snapshot of an in-progress session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeState {
    pub cycle: Stage,
    pub queue: Vec<String>,
    pub index: usize,
}

/// A named list of associations with its settings and progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociationList {
    pub id: String,
    #[serde(alias = "userId")]
    pub owner_id: String,
    pub name: String,
    #[serde(default)]
    pub concept: String,
    #[serde(default)]
    pub associations: Vec<Association>,
    #[serde(default)]
    pub settings: ListSettings,
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    #[serde(
        default,
        deserialize_with = "lenient_resume_state",
        skip_serializing_if = "Option::is_none"
    )]
    pub resume_state: Option<ResumeState>,
}

/// Either a usable snapshot or anything else found under `resumeState`.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredResumeState {
    Valid(ResumeState),
    Invalid(IgnoredAny),
}

/// A snapshot that does not parse is dropped so the list itself still loads
/// and the next session starts from stage 1.
fn lenient_resume_state<'de, D>(deserializer: D) -> Result<Option<ResumeState>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<StoredResumeState>::deserialize(deserializer)? {
        Some(StoredResumeState::Valid(state)) => Ok(Some(state)),
        Some(StoredResumeState::Invalid(_)) => {
            tracing::warn!("discarding unreadable resume state");
            Ok(None)
        }
        None => Ok(None),
    }
}

impl AssociationList {
    /// Create a new list with default settings and no progress.
    pub fn new(
        owner_id: impl Into<String>,
        name: impl Into<String>,
        concept: impl Into<String>,
        associations: Vec<Association>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            name: name.into(),
            concept: concept.into(),
            associations,
            settings: ListSettings::default(),
            created_at: Utc::now().timestamp_millis(),
            updated_at: None,
            resume_state: None,
        }
    }

    /// Stamp `updated_at` with the current time, strictly after the
    /// previous stamp.
    pub fn touch(&mut self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let stamp = match self.updated_at {
            Some(prev) => now.max(prev.saturating_add(1)),
            None => now,
        };
        self.updated_at = Some(stamp);
        stamp
    }

    pub fn find(&self, id: &str) -> Option<&Association> {
        self.associations.iter().find(|a| a.id == id)
    }

    /// Append associations, e.g. from a bulk import.
    pub fn append_associations(&mut self, associations: impl IntoIterator<Item = Association>) {
        self.associations.extend(associations);
    }

    /// Remove a row. Returns the removed association if it existed.
    ///
    /// The row also leaves any saved queue; the snapshot is dropped when
    /// nothing is left to resume.
    pub fn remove_association(&mut self, id: &str) -> Option<Association> {
        let pos = self.associations.iter().position(|a| a.id == id)?;
        let removed = self.associations.remove(pos);

        if let Some(resume) = self.resume_state.as_mut() {
            if let Some(queued) = resume.queue.iter().position(|q| q == id) {
                resume.queue.remove(queued);
                if queued < resume.index {
                    resume.index -= 1;
                }
            }
            if resume.index >= resume.queue.len() {
                self.resume_state = None;
            }
        }
        Some(removed)
    }

    /// Edit the faces of a row. Returns false if the id is unknown.
    pub fn update_association(&mut self, id: &str, term: &str, definition: &str) -> bool {
        match self.associations.iter_mut().find(|a| a.id == id) {
            Some(assoc) => {
                assoc.term = term.to_string();
                assoc.definition = definition.to_string();
                true
            }
            None => false,
        }
    }

    /// Case-insensitive search over the list name and concept.
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.name.to_lowercase().contains(&query) || self.concept.to_lowercase().contains(&query)
    }

    /// Rows whose term or definition contain the query, case-insensitively.
    pub fn search_associations<'a>(&'a self, query: &str) -> Vec<&'a Association> {
        let query = query.to_lowercase();
        self.associations
            .iter()
            .filter(|a| {
                a.term.to_lowercase().contains(&query)
                    || a.definition.to_lowercase().contains(&query)
            })
            .collect()
    }

    /// Display labels for the term and definition faces, from the concept.
    pub fn face_labels(&self) -> (String, String) {
        let mut parts = self.concept.splitn(2, '/');
        let label = |part: Option<&str>, fallback: &str| {
            part.map(str::trim)
                .filter(|p| !p.is_empty())
                .unwrap_or(fallback)
                .to_string()
        };
        let term = label(parts.next(), DEFAULT_TERM_LABEL);
        let definition = label(parts.next(), DEFAULT_DEFINITION_LABEL);
        (term, definition)
    }

    pub fn stage_counts(&self) -> StageCounts {
        StageCounts::from_associations(&self.associations)
    }
}

/// How many associations currently sit at each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCounts {
    pub unknown: usize,
    pub discovered: usize,
    pub recognized: usize,
    pub known: usize,
    pub mastered: usize,
    pub archived: usize,
}

impl StageCounts {
    /// Count statuses, keeping archived rows in their own bucket.
    pub fn from_associations(associations: &[Association]) -> Self {
        let mut counts = Self::default();
        for assoc in associations {
            if assoc.archived {
                counts.archived += 1;
                continue;
            }
            match assoc.status {
                Status::Unknown => counts.unknown += 1,
                Status::Discovered => counts.discovered += 1,
                Status::Recognized => counts.recognized += 1,
                Status::Known => counts.known += 1,
                Status::Mastered => counts.mastered += 1,
            }
        }
        counts
    }

    /// Active (non-archived) associations.
    pub fn active(&self) -> usize {
        self.unknown + self.discovered + self.recognized + self.known + self.mastered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn status_order_is_mastery_depth() {
        assert!(Status::Unknown < Status::Discovered);
        assert!(Status::Discovered < Status::Recognized);
        assert!(Status::Recognized < Status::Known);
        assert!(Status::Known < Status::Mastered);
        assert_eq!(Status::Mastered.next(), Status::Mastered);
    }

    #[test]
    fn stage_promotion_rules() {
        assert_eq!(Stage::Introduction.on_correct(), Status::Mastered);
        assert_eq!(Stage::Introduction.on_pass(), Status::Discovered);
        assert_eq!(Stage::Discovery.on_correct(), Status::Recognized);
        assert_eq!(Stage::Recognition.on_correct(), Status::Known);
        assert_eq!(Stage::Mastery.on_correct(), Status::Mastered);
        assert_eq!(Stage::Mastery.on_pass(), Status::Mastered);
        assert_eq!(Stage::Mastery.next(), None);
    }

    #[test]
    fn stage_serializes_as_number() {
        let state = ResumeState {
            cycle: Stage::Recognition,
            queue: vec!["a".into()],
            index: 0,
        };
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, r#"{"cycle":3,"queue":["a"],"index":0}"#);
        assert!(serde_json::from_str::<ResumeState>(r#"{"cycle":7,"queue":[],"index":0}"#).is_err());
    }

    #[test]
    fn association_history_flag_maps_to_archived() {
        let json = r#"{"id":"1","term":"hola","definition":"hello","status":"KNOWN","history":true}"#;
        let assoc: Association = serde_json::from_str(json).unwrap();
        assert!(assoc.archived);
        assert_eq!(assoc.status, Status::Known);

        let json = r#"{"id":"2","term":"adios","definition":"bye","status":"UNKNOWN"}"#;
        let assoc: Association = serde_json::from_str(json).unwrap();
        assert!(!assoc.archived);
    }

    #[test]
    fn legacy_mode_names_are_accepted() {
        let settings: ListSettings =
            serde_json::from_str(r#"{"mode":"real","flipOrder":"reversed","threshold":0.9}"#).unwrap();
        assert_eq!(settings.mode, GameMode::Written);
        assert_eq!(settings.flip_order, FlipOrder::Reversed);
        assert_eq!(GameMode::parse("training"), Some(GameMode::Practice));
    }

    #[test]
    fn missing_threshold_uses_fallback() {
        let settings: ListSettings = serde_json::from_str(r#"{"mode":"practice"}"#).unwrap();
        assert_eq!(settings.threshold, FALLBACK_THRESHOLD);
    }

    #[test]
    fn effective_threshold_rejects_out_of_range() {
        let mut settings = ListSettings::default();
        assert_eq!(settings.effective_threshold(), DEFAULT_THRESHOLD);
        settings.threshold = 1.5;
        assert_eq!(settings.effective_threshold(), FALLBACK_THRESHOLD);
        settings.threshold = f64::NAN;
        assert_eq!(settings.effective_threshold(), FALLBACK_THRESHOLD);
        settings.threshold = 0.0;
        assert_eq!(settings.effective_threshold(), 0.0);
    }

    #[test]
    fn face_labels_from_concept() {
        let mut list = AssociationList::new("u", "Verbs", "English / Spanish", vec![]);
        assert_eq!(list.face_labels(), ("English".to_string(), "Spanish".to_string()));

        list.concept = "Capitals".into();
        assert_eq!(list.face_labels(), ("Capitals".to_string(), "Definition".to_string()));

        list.concept = String::new();
        assert_eq!(list.face_labels(), ("Term".to_string(), "Definition".to_string()));
    }

    #[test]
    fn stage_counts_separate_archived() {
        let mut a = Association::new("a", "1");
        let mut b = Association::new("b", "2");
        let c = Association::new("c", "3");
        a.status = Status::Mastered;
        b.status = Status::Mastered;
        b.archived = true;

        let counts = StageCounts::from_associations(&[a, b, c]);
        assert_eq!(counts.unknown, 1);
        assert_eq!(counts.mastered, 1);
        assert_eq!(counts.archived, 1);
        assert_eq!(counts.active(), 2);
    }

    #[test]
    fn row_editing() {
        let a = Association::new("perro", "dog");
        let id = a.id.clone();
        let mut list = AssociationList::new("u", "Animals", "ES / EN", vec![a]);
        list.append_associations(vec![Association::new("gato", "cat")]);
        assert_eq!(list.associations.len(), 2);

        assert!(list.update_association(&id, "perro", "hound"));
        assert_eq!(list.find(&id).map(|a| a.definition.as_str()), Some("hound"));
        assert_eq!(list.search_associations("CAT").len(), 1);
        assert!(list.matches_search("anim"));

        assert!(list.remove_association(&id).is_some());
        assert!(list.remove_association(&id).is_none());
        assert!(!list.update_association(&id, "x", "y"));
    }

    #[test]
    fn removing_a_row_updates_the_saved_queue() {
        let rows: Vec<Association> = ["a", "b", "c"].iter().map(|t| Association::new(*t, "x")).collect();
        let ids: Vec<String> = rows.iter().map(|a| a.id.clone()).collect();
        let mut list = AssociationList::new("u", "L", "", rows);
        list.resume_state = Some(ResumeState {
            cycle: Stage::Introduction,
            queue: ids.clone(),
            index: 2,
        });

        list.remove_association(&ids[0]);
        let resume = list.resume_state.clone().unwrap();
        assert_eq!(resume.queue, vec![ids[1].clone(), ids[2].clone()]);
        assert_eq!(resume.index, 1);

        // Removing the pending item leaves nothing to resume
        list.remove_association(&ids[2]);
        assert_eq!(list.resume_state, None);
    }

    #[test]
    fn touch_saturates_at_max_stamp() {
        let mut list = AssociationList::new("u", "L", "", vec![]);
        list.updated_at = Some(i64::MAX);
        assert_eq!(list.touch(), i64::MAX);
    }

    #[test]
    fn unreadable_resume_state_is_dropped() {
        let base = |resume: &str| {
            format!(
                r#"{{"id":"l1","ownerId":"u","name":"L","createdAt":1,"resumeState":{resume}}}"#
            )
        };
        for resume in [
            r#"{"cycle":5,"queue":["a"],"index":0}"#,
            r#"{"cycle":0,"queue":["a"],"index":0}"#,
            r#"{"queue":["a"],"index":0}"#,
            r#"{"cycle":1,"queue":["a"],"index":-1}"#,
            r#""stage two""#,
        ] {
            let list: AssociationList = serde_json::from_str(&base(resume)).unwrap();
            assert_eq!(list.resume_state, None, "{resume}");
        }

        let list: AssociationList = serde_json::from_str(&base("null")).unwrap();
        assert_eq!(list.resume_state, None);
        let list: AssociationList =
            serde_json::from_str(&base(r#"{"cycle":2,"queue":["a"],"index":0}"#)).unwrap();
        assert_eq!(list.resume_state.unwrap().cycle, Stage::Discovery);
    }

    #[test]
    fn loads_documents_with_legacy_names() {
        let json = r#"{
            "id": "l1",
            "userId": "ana",
            "name": "Verbos",
            "concept": "Español / Inglés",
            "associations": [
                {"id": "1", "term": "correr", "definition": "to run", "status": "DESCONOCIDA"},
                {"id": "2", "term": "comer", "definition": "to eat", "status": "DESCUBIERTA"},
                {"id": "3", "term": "ser", "definition": "to be", "status": "RECONOCIDA"},
                {"id": "4", "term": "ir", "definition": "to go", "status": "CONOCIDA"},
                {"id": "5", "term": "ver", "definition": "to see", "status": "APRENDIDA", "history": true}
            ],
            "settings": {"mode": "training", "flipOrder": "normal", "threshold": 0.9},
            "createdAt": 1700000000000
        }"#;
        let list: AssociationList = serde_json::from_str(json).unwrap();
        assert_eq!(list.owner_id, "ana");
        assert_eq!(list.settings.mode, GameMode::Practice);
        let statuses: Vec<Status> = list.associations.iter().map(|a| a.status).collect();
        assert_eq!(
            statuses,
            vec![
                Status::Unknown,
                Status::Discovered,
                Status::Recognized,
                Status::Known,
                Status::Mastered
            ]
        );
        assert!(list.associations[4].archived);

        // Written back under the current names
        let back = serde_json::to_string(&list).unwrap();
        assert!(back.contains("\"ownerId\":\"ana\""));
        assert!(back.contains("\"status\":\"MASTERED\""));
        assert_eq!(serde_json::from_str::<AssociationList>(&back).unwrap(), list);
    }

    #[test]
    fn touch_is_strictly_increasing() {
        let mut list = AssociationList::new("u", "L", "", vec![]);
        list.updated_at = Some(i64::MAX / 2);
        let first = list.touch();
        let second = list.touch();
        assert_eq!(first, i64::MAX / 2 + 1);
        assert_eq!(second, first + 1);
    }

    #[test]
    fn list_round_trips_through_json() {
        let mut list = AssociationList::new("owner", "Verbs", "EN / ES", vec![Association::new("run", "correr")]);
        list.updated_at = Some(list.created_at + 1);
        list.resume_state = Some(ResumeState {
            cycle: Stage::Discovery,
            queue: vec![list.associations[0].id.clone()],
            index: 0,
        });

        let json = serde_json::to_string(&list).unwrap();
        assert!(json.contains("\"ownerId\""));
        assert!(json.contains("\"resumeState\""));
        let back: AssociationList = serde_json::from_str(&json).unwrap();
        assert_eq!(back, list);
    }
}
