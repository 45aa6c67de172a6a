//! Dialog Registry - cached dialogs and the current selection.
//!
//! Label additions are optimistic: the label is appended locally, recorded in
//! a pending queue, and the full label list is persisted. Writes go out one
//! at a time in version order, each carrying the list up to and including its
//! own label, so storage always ends on the newest acknowledged list. A failed
//! write rolls back exactly the label it carried. Selecting a dialog replaces
//! the local snapshot wholesale and drops whatever is still pending.

use dialog_model::{Dialog, DialogId, DialogSummary, NewDialog, SpeakerId, ValidationError};
use parking_lot::Mutex;
use tokio::sync::Mutex as WriteLock;
use tracing::{debug, info, warn};

use crate::error::{EditorError, Result};
use crate::gateway::PersistenceGateway;

/// An optimistic label append awaiting its gateway acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLabelUpdate {
    /// Monotonic per registry.
    pub version: u64,
    pub dialog_id: DialogId,
    pub label: String,
}

/// What a dialog selection did to the current dialog's identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub dialog: Dialog,
    /// True when the selected id differs from the previous selection.
    pub identity_changed: bool,
}

#[derive(Debug, Default)]
struct RegistryState {
    dialogs: Vec<Dialog>,
    current: Option<Dialog>,
    label_version: u64,
    pending: Vec<PendingLabelUpdate>,
}

impl RegistryState {
    /// Install `dialog` as current. Returns whether the identity changed.
    fn set_current(&mut self, dialog: Dialog) -> bool {
        let changed = self.current.as_ref().map(|d| &d.id) != Some(&dialog.id);
        self.pending.clear();

        if let Some(cached) = self.dialogs.iter_mut().find(|d| d.id == dialog.id) {
            *cached = dialog.clone();
        }
        self.current = Some(dialog);
        changed
    }
}

impl RegistryState {
    /// Label list to persist for `version`: the current labels without the
    /// appends queued after it.
    fn labels_through(&self, version: u64) -> Option<(DialogId, Vec<String>)> {
        let current = self.current.as_ref()?;
        let dialog_id = current.id.clone()?;
        let later = self.pending.iter().filter(|p| p.version > version).count();
        let mut labels = current.labels.clone();
        labels.truncate(labels.len().saturating_sub(later));
        Some((dialog_id, labels))
    }
}

#[derive(Debug, Default)]
pub struct DialogRegistry {
    state: Mutex<RegistryState>,
    /// Held from snapshot to acknowledgement of every label write.
    label_writes: WriteLock<()>,
    allow_duplicate_labels: bool,
}

impl DialogRegistry {
    /// Create an empty registry.
    pub fn new(allow_duplicate_labels: bool) -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            label_writes: WriteLock::new(()),
            allow_duplicate_labels,
        }
    }

    /// Replace the cached dialog list. The current selection is untouched.
    pub async fn load<G>(&self, gateway: &G) -> Result<usize>
    where
        G: PersistenceGateway + ?Sized,
    {
        let mut dialogs = gateway.load_dialogs().await.map_err(|e| {
            warn!(error = %e, "failed to load dialogs, keeping cached list");
            e
        })?;
        dialogs.iter_mut().for_each(Dialog::ensure_default_label);

        let count = dialogs.len();
        self.state.lock().dialogs = dialogs;
        Ok(count)
    }

    /// Persist a new dialog, cache it and make it current.
    pub async fn create<G>(
        &self,
        gateway: &G,
        request: NewDialog,
        is_known_speaker: impl Fn(&SpeakerId) -> bool,
    ) -> Result<Selection>
    where
        G: PersistenceGateway + ?Sized,
    {
        request.validate(is_known_speaker)?;

        let mut dialog = gateway.create_dialog(&request).await?;
        dialog.ensure_default_label();
        info!(id = ?dialog.id, name = %dialog.name, "dialog created");

        let mut state = self.state.lock();
        state.dialogs.push(dialog.clone());
        let identity_changed = state.set_current(dialog.clone());
        Ok(Selection {
            dialog,
            identity_changed,
        })
    }

    /// Fetch the authoritative snapshot of `dialog_id` and make it current.
    pub async fn select<G>(&self, gateway: &G, dialog_id: &DialogId) -> Result<Selection>
    where
        G: PersistenceGateway + ?Sized,
    {
        let mut dialog = gateway.select_dialog(dialog_id).await?;
        dialog.ensure_default_label();
        if dialog.id.as_ref() != Some(dialog_id) {
            warn!(requested = %dialog_id, returned = ?dialog.id, "gateway returned another dialog");
            return Err(EditorError::DialogMismatch(dialog_id.clone()));
        }

        let identity_changed = self.state.lock().set_current(dialog.clone());
        debug!(id = %dialog_id, identity_changed, "dialog selected");
        Ok(Selection {
            dialog,
            identity_changed,
        })
    }

    /// Append `label` to the current dialog and persist the label list.
    ///
    /// The label shows up locally at once. Returns the list that was
    /// persisted, which excludes appends queued after this one. On gateway
    /// failure the label is removed again before the error is returned.
    pub async fn add_label<G>(&self, gateway: &G, label: impl Into<String>) -> Result<Vec<String>>
    where
        G: PersistenceGateway + ?Sized,
    {
        let label = label.into();
        let pending = {
            let mut state = self.state.lock();
            let current = state.current.as_mut().ok_or(EditorError::NoDialogSelected)?;
            let dialog_id = current.id.clone().ok_or(EditorError::DialogNotPersisted)?;

            if label.trim().is_empty() {
                return Err(ValidationError::EmptyLabel.into());
            }
            if !self.allow_duplicate_labels && current.has_label(&label) {
                return Err(ValidationError::DuplicateLabel(label).into());
            }

            current.push_label(label.clone());
            state.label_version += 1;
            let pending = PendingLabelUpdate {
                version: state.label_version,
                dialog_id,
                label,
            };
            state.pending.push(pending.clone());
            pending
        };

        let _write = self.label_writes.lock().await;

        let labels = {
            let state = self.state.lock();
            if !state.pending.iter().any(|p| p.version == pending.version) {
                debug!(
                    dialog = %pending.dialog_id,
                    label = %pending.label,
                    "label append dropped by a newer selection"
                );
                return Err(EditorError::LabelUpdateSuperseded(pending.label));
            }
            match state.labels_through(pending.version) {
                Some((dialog_id, labels)) if dialog_id == pending.dialog_id => labels,
                _ => return Err(EditorError::LabelUpdateSuperseded(pending.label)),
            }
        };

        let result = gateway.update_labels(&pending.dialog_id, &labels).await;

        let mut state = self.state.lock();
        let still_pending = match state.pending.iter().position(|p| p.version == pending.version) {
            Some(index) => {
                state.pending.remove(index);
                true
            }
            None => false,
        };

        match result {
            Ok(()) => {
                info!(
                    dialog = %pending.dialog_id,
                    label = %pending.label,
                    version = pending.version,
                    "labels persisted"
                );
                if let Some(cached) = state
                    .dialogs
                    .iter_mut()
                    .find(|d| d.id.as_ref() == Some(&pending.dialog_id))
                {
                    cached.labels = labels.clone();
                }
                Ok(labels)
            }
            Err(e) => {
                // A selection since dispatch already replaced the snapshot.
                if still_pending {
                    if let Some(current) = state
                        .current
                        .as_mut()
                        .filter(|d| d.id.as_ref() == Some(&pending.dialog_id))
                    {
                        current.remove_last_label(&pending.label);
                    }
                }
                warn!(
                    dialog = %pending.dialog_id,
                    label = %pending.label,
                    error = %e,
                    "label update failed, rolled back"
                );
                Err(e.into())
            }
        }
    }

    /// Snapshot of the selected dialog.
    pub fn current(&self) -> Option<Dialog> {
        self.state.lock().current.clone()
    }

    /// Id of the selected dialog.
    pub fn current_id(&self) -> Option<DialogId> {
        self.state.lock().current.as_ref().and_then(|d| d.id.clone())
    }

    /// Every cached dialog, in load order.
    pub fn dialogs(&self) -> Vec<Dialog> {
        self.state.lock().dialogs.clone()
    }

    /// `(id, name)` pairs for a picker list.
    pub fn summaries(&self) -> Vec<DialogSummary> {
        self.state
            .lock()
            .dialogs
            .iter()
            .filter_map(Dialog::summary)
            .collect()
    }

    /// Label appends not yet acknowledged, oldest first.
    pub fn pending_label_updates(&self) -> Vec<PendingLabelUpdate> {
        self.state.lock().pending.clone()
    }
}
