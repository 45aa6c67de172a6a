//! Dialogs - named branching conversations made of labeled step tracks.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::error::{require_non_empty, validate_script_name, ValidationError};
use crate::{DialogId, SpeakerId};

/// Branch every dialog starts with, and where navigation restarts.
pub const DEFAULT_LABEL: &str = "main";

fn default_labels() -> Vec<String> {
    vec![DEFAULT_LABEL.to_string()]
}

/// A branching conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialog {
    /// Unset until the gateway acknowledges creation.
    #[serde(default)]
    pub id: Option<DialogId>,
    pub name: String,
    pub script_name: String,
    /// Output folder for generated script files.
    #[serde(default)]
    pub directory: PathBuf,
    /// Speakers that may author steps. Fixed at creation.
    #[serde(default)]
    pub speakers_ids: BTreeSet<SpeakerId>,
    /// Branch names in creation order.
    #[serde(default = "default_labels")]
    pub labels: Vec<String>,
}

impl Dialog {
    /// Build an unpersisted dialog from a creation request.
    pub fn new(request: NewDialog) -> Self {
        Self {
            id: None,
            name: request.name,
            script_name: request.script_name,
            directory: request.directory,
            speakers_ids: request.speakers_ids,
            labels: default_labels(),
        }
    }

    /// Attach the id storage assigned.
    pub fn with_id(mut self, id: DialogId) -> Self {
        self.id = Some(id);
        self
    }

    /// Whether storage has assigned an id.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Whether `label` is a registered branch.
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// Whether `id` takes part in this dialog.
    pub fn has_speaker(&self, id: &SpeakerId) -> bool {
        self.speakers_ids.contains(id)
    }

    /// Append a branch name. Returns the new label count.
    pub fn push_label(&mut self, label: impl Into<String>) -> usize {
        self.labels.push(label.into());
        self.labels.len()
    }

    /// Remove the most recent occurrence of `label`.
    ///
    /// Never removes the last remaining default branch.
    pub fn remove_last_label(&mut self, label: &str) -> bool {
        let Some(index) = self.labels.iter().rposition(|l| l == label) else {
            return false;
        };
        if label == DEFAULT_LABEL && self.labels.iter().filter(|l| *l == label).count() == 1 {
            return false;
        }
        self.labels.remove(index);
        true
    }

    /// Restore the default branch if storage handed back an empty label list.
    pub fn ensure_default_label(&mut self) {
        if self.labels.is_empty() {
            self.labels = default_labels();
        }
    }

    /// Id and name for listings; `None` until persisted.
    pub fn summary(&self) -> Option<DialogSummary> {
        self.id.as_ref().map(|id| DialogSummary {
            id: id.clone(),
            name: self.name.clone(),
        })
    }
}

/// Compact view of a dialog for picker lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogSummary {
    pub id: DialogId,
    pub name: String,
}

/// Everything needed to ask the gateway for a new dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDialog {
    pub name: String,
    pub script_name: String,
    pub directory: PathBuf,
    pub speakers_ids: BTreeSet<SpeakerId>,
}

impl NewDialog {
    pub fn new(
        name: impl Into<String>,
        script_name: impl Into<String>,
        directory: impl Into<PathBuf>,
        speakers_ids: impl IntoIterator<Item = SpeakerId>,
    ) -> Self {
        Self {
            name: name.into(),
            script_name: script_name.into(),
            directory: directory.into(),
            speakers_ids: speakers_ids.into_iter().collect(),
        }
    }

    /// Validate fields and check every speaker against `is_known`.
    pub fn validate(&self, is_known: impl Fn(&SpeakerId) -> bool) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)?;
        validate_script_name(&self.script_name)?;
        if let Some(unknown) = self.speakers_ids.iter().find(|id| !is_known(id)) {
            return Err(ValidationError::UnknownSpeaker(unknown.clone()));
        }
        Ok(())
    }
}
