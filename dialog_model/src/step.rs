//! Step addressing and the draft content bound to one step.

use serde::{Deserialize, Deserializer, Serialize};

use crate::{DialogId, SpeakerId};

/// Address of a step: `(dialog, label, counter)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepCoordinate {
    pub dialog_id: DialogId,
    pub label: String,
    pub counter: u32,
}

impl StepCoordinate {
    pub fn new(dialog_id: DialogId, label: impl Into<String>, counter: u32) -> Self {
        Self {
            dialog_id,
            label: label.into(),
            counter,
        }
    }
}

impl std::fmt::Display for StepCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}#{}", self.dialog_id, self.label, self.counter)
    }
}

/// Storage treats an empty speaker id as "no speaker".
fn empty_speaker_as_none<'de, D>(deserializer: D) -> Result<Option<SpeakerId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.is_empty()).map(SpeakerId::from_raw))
}

/// What the gateway returns for a step.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StepContent {
    #[serde(default)]
    pub text: String,
    #[serde(default, deserialize_with = "empty_speaker_as_none")]
    pub speaker: Option<SpeakerId>,
    /// Labels the backend knows at this step, when it reports them.
    #[serde(default)]
    pub labels: Vec<String>,
}

impl StepContent {
    pub fn new(text: impl Into<String>, speaker: Option<SpeakerId>) -> Self {
        Self {
            text: text.into(),
            speaker,
            labels: Vec::new(),
        }
    }
}

/// Save state of the draft slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DraftStatus {
    /// Matches what the gateway last returned or acknowledged.
    #[default]
    Clean,
    /// Edited locally since the last fetch or save.
    Dirty,
    /// A save is in flight.
    Saving,
}

/// The `(text, speaker)` content held for the active step.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Draft {
    /// Step the content was fetched for; `None` before the first fetch.
    pub coordinate: Option<StepCoordinate>,
    pub text: String,
    pub speaker: Option<SpeakerId>,
    pub status: DraftStatus,
    /// Bumped on every local edit so a save can tell whether it raced one.
    #[serde(skip)]
    pub revision: u64,
}

impl Draft {
    /// Replace the whole slot with freshly fetched content.
    pub fn loaded(coordinate: StepCoordinate, content: StepContent) -> Self {
        Self {
            coordinate: Some(coordinate),
            text: content.text,
            speaker: content.speaker,
            status: DraftStatus::Clean,
            revision: 0,
        }
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.touch();
    }

    pub fn set_speaker(&mut self, speaker: Option<SpeakerId>) {
        self.speaker = speaker;
        self.touch();
    }

    pub fn is_dirty(&self) -> bool {
        self.status != DraftStatus::Clean
    }

    fn touch(&mut self) {
        self.revision += 1;
        self.status = DraftStatus::Dirty;
    }
}
