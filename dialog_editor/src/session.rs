//! Editor session - owns the registries and the navigator for one author.
//!
//! Every editor intent goes through the session, which keeps the
//! cross-component contracts: a change of the selected dialog resets the
//! cursor before any fetch for the new dialog is dispatched, and every cursor
//! move is followed by a draft fetch.
//!
//! Methods take `&self`; state lives behind short-lived locks that are never
//! held across a gateway call, so overlapping intents from one shared session
//! are safe and resolve through the navigator's sequence numbers.

use dialog_model::{
    Dialog, DialogId, NewDialog, NewSpeaker, Speaker, SpeakerId, StepCoordinate, ValidationError,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::EditorConfig;
use crate::dialogs::{DialogRegistry, Selection};
use crate::error::{EditorError, Result};
use crate::gateway::PersistenceGateway;
use crate::navigator::{BranchNavigator, Cursor, FetchOutcome, NavigatorConfig};
use crate::speakers::SpeakerRegistry;

pub struct EditorSession<G: PersistenceGateway + ?Sized> {
    gateway: Arc<G>,
    config: EditorConfig,
    speakers: SpeakerRegistry,
    dialogs: DialogRegistry,
    navigator: BranchNavigator,
}

impl<G: PersistenceGateway + ?Sized> EditorSession<G> {
    /// Build a session over `gateway` with empty registries.
    pub fn new(gateway: Arc<G>, config: EditorConfig) -> Self {
        Self {
            speakers: SpeakerRegistry::new(),
            dialogs: DialogRegistry::new(config.allow_duplicate_labels),
            navigator: BranchNavigator::new(NavigatorConfig::from(&config)),
            gateway,
            config,
        }
    }

    /// Build a session with `EditorConfig::default()`.
    pub fn with_defaults(gateway: Arc<G>) -> Self {
        Self::new(gateway, EditorConfig::default())
    }

    /// Fill both registries from the gateway.
    pub async fn load(&self) -> Result<()> {
        let speakers = self.speakers.load(self.gateway.as_ref()).await?;
        let dialogs = self.dialogs.load(self.gateway.as_ref()).await?;
        info!(speakers, dialogs, "session loaded");
        Ok(())
    }

    /// Refill the speaker registry.
    pub async fn load_speakers(&self) -> Result<usize> {
        self.speakers.load(self.gateway.as_ref()).await
    }

    /// Validate and persist a new speaker.
    pub async fn create_speaker(&self, request: NewSpeaker) -> Result<Speaker> {
        self.speakers.create(self.gateway.as_ref(), request).await
    }

    /// Refill the dialog list.
    pub async fn load_dialogs(&self) -> Result<usize> {
        self.dialogs.load(self.gateway.as_ref()).await
    }

    /// Create a dialog, select it and fetch its first step.
    ///
    /// The dialog stays selected even if the first fetch fails; the error
    /// reports the fetch and `refresh_draft` can retry it.
    pub async fn create_dialog(&self, request: NewDialog) -> Result<Dialog> {
        let selection = self
            .dialogs
            .create(self.gateway.as_ref(), request, |id| self.speakers.contains(id))
            .await?;
        self.open(selection).await
    }

    /// Select an existing dialog and fetch the step under the cursor.
    pub async fn select_dialog(&self, dialog_id: &DialogId) -> Result<Dialog> {
        let selection = self.dialogs.select(self.gateway.as_ref(), dialog_id).await?;
        self.open(selection).await
    }

    async fn open(&self, selection: Selection) -> Result<Dialog> {
        if selection.identity_changed {
            let dialog_id = selection
                .dialog
                .id
                .clone()
                .ok_or(EditorError::DialogNotPersisted)?;
            self.navigator.reset(dialog_id);
        }
        self.refresh_draft().await?;
        Ok(selection.dialog)
    }

    /// Append a label to the current dialog and persist the full list.
    pub async fn add_label(&self, label: impl Into<String>) -> Result<Vec<String>> {
        self.dialogs.add_label(self.gateway.as_ref(), label).await
    }

    /// Move the cursor to `counter` and fetch the draft there.
    pub async fn change_counter(&self, counter: u32) -> Result<FetchOutcome> {
        self.require_dialog()?;
        self.navigator.change_counter(counter)?;
        self.refresh_draft().await
    }

    /// Move the cursor to `label` and fetch the draft there.
    pub async fn change_label(&self, label: &str) -> Result<FetchOutcome> {
        let dialog = self.require_dialog()?;
        self.navigator.change_label(label, &dialog)?;
        self.refresh_draft().await
    }

    /// Advance one step and fetch the draft there.
    pub async fn next_step(&self) -> Result<FetchOutcome> {
        self.require_dialog()?;
        self.navigator.next_step()?;
        self.refresh_draft().await
    }

    /// Go back one step and fetch the draft there.
    pub async fn previous_step(&self) -> Result<FetchOutcome> {
        self.require_dialog()?;
        self.navigator.previous_step()?;
        self.refresh_draft().await
    }

    /// Fetch the draft for the current cursor.
    pub async fn refresh_draft(&self) -> Result<FetchOutcome> {
        self.require_dialog_id()?;

        let outcome = self.navigator.load(self.gateway.as_ref()).await?;
        if let FetchOutcome::Applied { coordinate, labels } = &outcome {
            let dialog = self
                .dialogs
                .current()
                .filter(|d| d.id.as_ref() == Some(&coordinate.dialog_id));
            if let Some(dialog) = dialog {
                let unknown: Vec<&String> =
                    labels.iter().filter(|l| !dialog.has_label(l)).collect();
                if !unknown.is_empty() {
                    warn!(
                        %coordinate,
                        ?unknown,
                        "gateway reported step labels the dialog does not list"
                    );
                }
            }
        }
        Ok(outcome)
    }

    /// Replace the draft text locally.
    pub fn update_text(&self, text: impl Into<String>) -> Result<()> {
        self.navigator.update_text(text)
    }

    /// Attribute the draft to `speaker`, which must be registered.
    pub fn update_speaker(&self, speaker: Option<SpeakerId>) -> Result<()> {
        if let Some(id) = &speaker {
            if !self.speakers.contains(id) {
                return Err(ValidationError::UnknownSpeaker(id.clone()).into());
            }
        }
        self.navigator.update_speaker(speaker)
    }

    /// Persist the draft at the cursor.
    pub async fn save(&self) -> Result<StepCoordinate> {
        self.require_dialog_id()?;
        self.navigator.save(self.gateway.as_ref()).await
    }

    /// Ask the author for an output directory; `None` when cancelled.
    pub async fn pick_directory(&self) -> Result<Option<PathBuf>> {
        Ok(self.gateway.pick_directory().await?)
    }

    /// Hand the selected dialog to the external script generator.
    pub async fn generate_script(&self) -> Result<()> {
        let dialog_id = self.require_dialog_id()?;
        self.gateway.generate_script(&dialog_id).await?;
        info!(dialog = %dialog_id, "script generation requested");
        Ok(())
    }

    /// Snapshot of the selected dialog.
    pub fn current_dialog(&self) -> Option<Dialog> {
        self.dialogs.current()
    }

    /// Cursor position, `None` before the first selection.
    pub fn cursor(&self) -> Option<Cursor> {
        self.navigator.cursor()
    }

    pub fn speakers(&self) -> &SpeakerRegistry {
        &self.speakers
    }

    pub fn dialogs(&self) -> &DialogRegistry {
        &self.dialogs
    }

    pub fn navigator(&self) -> &BranchNavigator {
        &self.navigator
    }

    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    fn require_dialog(&self) -> Result<Dialog> {
        self.dialogs.current().ok_or(EditorError::NoDialogSelected)
    }

    fn require_dialog_id(&self) -> Result<DialogId> {
        self.require_dialog()?
            .id
            .ok_or(EditorError::DialogNotPersisted)
    }
}
