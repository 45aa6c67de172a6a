//! Branch Navigator - the authoring cursor and the draft at its coordinate.
//!
//! Cursor moves are synchronous; fetching the draft for the new coordinate is
//! not. Every fetch takes a sequence number when it is dispatched:
//! 1. **Dispatch**: `begin_fetch` bumps the sequence and captures the coordinate
//! 2. **Await**: the gateway call runs without holding any lock
//! 3. **Reconcile**: `complete_fetch` applies the response only if its sequence
//!    is still the latest issued; older responses are dropped
//!
//! `reset` binds the navigator to a dialog and also bumps the sequence, so
//! fetches for a previously selected dialog can never land in the draft of
//! the next one. Fetches and saves always target the bound dialog.

mod cursor;

pub use cursor::*;

use dialog_model::{Dialog, DialogId, Draft, DraftStatus, SpeakerId, StepContent, StepCoordinate};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::config::EditorConfig;
use crate::error::{EditorError, GatewayResult, Result};
use crate::gateway::PersistenceGateway;

/// Validation knobs for cursor moves.
#[derive(Debug, Clone)]
pub struct NavigatorConfig {
    /// Reject labels the current dialog does not know.
    pub strict_labels: bool,
    /// Highest accepted step counter.
    pub max_counter: Option<u32>,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self::from(&EditorConfig::default())
    }
}

impl From<&EditorConfig> for NavigatorConfig {
    fn from(config: &EditorConfig) -> Self {
        Self {
            strict_labels: config.strict_labels,
            max_counter: config.max_counter,
        }
    }
}

#[derive(Debug)]
struct NavigatorState {
    /// Dialog the cursor walks. `None` while idle.
    dialog_id: Option<DialogId>,
    /// `None` while idle.
    cursor: Option<Cursor>,
    phase: CursorPhase,
    /// Latest sequence number handed out.
    issued: u64,
    draft: Draft,
}

impl Default for NavigatorState {
    fn default() -> Self {
        Self {
            dialog_id: None,
            cursor: None,
            phase: CursorPhase::Idle,
            issued: 0,
            draft: Draft::default(),
        }
    }
}

impl NavigatorState {
    fn cursor_mut(&mut self) -> Result<&mut Cursor> {
        self.cursor
            .as_mut()
            .ok_or_else(|| EditorError::invalid_coordinate("no dialog selected"))
    }

    fn coordinate(&self) -> Result<StepCoordinate> {
        match (&self.dialog_id, &self.cursor) {
            (Some(dialog_id), Some(cursor)) => Ok(cursor.coordinate(dialog_id.clone())),
            _ => Err(EditorError::invalid_coordinate("no dialog selected")),
        }
    }
}

#[derive(Debug, Default)]
pub struct BranchNavigator {
    config: NavigatorConfig,
    state: Mutex<NavigatorState>,
}

impl BranchNavigator {
    /// Create an idle navigator.
    pub fn new(config: NavigatorConfig) -> Self {
        Self {
            config,
            state: Mutex::new(NavigatorState::default()),
        }
    }

    /// Bind to `dialog_id`, move to the start of the default branch and drop
    /// the draft.
    ///
    /// Does not fetch. Any fetch still in flight becomes stale.
    pub fn reset(&self, dialog_id: DialogId) {
        let mut state = self.state.lock();
        state.dialog_id = Some(dialog_id);
        state.cursor = Some(Cursor::start());
        state.phase = CursorPhase::Reset;
        state.issued += 1;
        state.draft = Draft::default();
        debug!(seq = state.issued, dialog = ?state.dialog_id, "cursor reset");
    }

    /// Move to `counter` on the current branch.
    pub fn change_counter(&self, counter: u32) -> Result<Cursor> {
        if let Some(max) = self.config.max_counter {
            if counter > max {
                return Err(EditorError::invalid_coordinate(format!(
                    "counter {} exceeds maximum {}",
                    counter, max
                )));
            }
        }

        let mut state = self.state.lock();
        let cursor = state.cursor_mut()?;
        cursor.counter = counter;
        debug!(label = %cursor.label, counter, "cursor moved");
        Ok(cursor.clone())
    }

    /// Move to `label` in `dialog`, keeping the counter.
    pub fn change_label(&self, label: &str, dialog: &Dialog) -> Result<Cursor> {
        if label.is_empty() {
            return Err(EditorError::invalid_coordinate("empty label"));
        }
        if self.config.strict_labels && !dialog.has_label(label) {
            return Err(EditorError::invalid_coordinate(format!(
                "label {:?} is not registered in dialog {:?}",
                label, dialog.name
            )));
        }

        let mut state = self.state.lock();
        let cursor = state.cursor_mut()?;
        cursor.label = label.to_string();
        debug!(label, counter = cursor.counter, "cursor moved");
        Ok(cursor.clone())
    }

    /// Advance one step on the current branch.
    pub fn next_step(&self) -> Result<Cursor> {
        let counter = self.require_cursor()?.counter;
        let next = counter
            .checked_add(1)
            .ok_or_else(|| EditorError::invalid_coordinate("counter overflow"))?;
        self.change_counter(next)
    }

    /// Go back one step; fails at counter 0.
    pub fn previous_step(&self) -> Result<Cursor> {
        let counter = self.require_cursor()?.counter;
        let previous = counter
            .checked_sub(1)
            .ok_or_else(|| EditorError::invalid_coordinate("already at the first step"))?;
        self.change_counter(previous)
    }

    /// Tag a fetch for the cursor in the bound dialog with a fresh sequence
    /// number.
    pub fn begin_fetch(&self) -> Result<FetchTicket> {
        let mut state = self.state.lock();
        let coordinate = state.coordinate()?;
        state.issued += 1;
        let seq = state.issued;
        state.phase = CursorPhase::Pending { seq };
        debug!(seq, %coordinate, "step fetch dispatched");
        Ok(FetchTicket { seq, coordinate })
    }

    /// Reconcile a fetch response against the latest issued sequence.
    ///
    /// Superseded responses, successful or not, are dropped silently. A failed
    /// latest fetch leaves the existing draft in place.
    pub fn complete_fetch(
        &self,
        ticket: FetchTicket,
        response: GatewayResult<StepContent>,
    ) -> Result<FetchOutcome> {
        let mut state = self.state.lock();
        if ticket.seq != state.issued {
            debug!(
                seq = ticket.seq,
                latest = state.issued,
                coordinate = %ticket.coordinate,
                "discarding stale step fetch"
            );
            return Ok(FetchOutcome::Stale { seq: ticket.seq });
        }

        match response {
            Ok(mut content) => {
                let labels = std::mem::take(&mut content.labels);
                state.draft = Draft::loaded(ticket.coordinate.clone(), content);
                state.phase = CursorPhase::Loaded;
                debug!(seq = ticket.seq, coordinate = %ticket.coordinate, "step fetch applied");
                Ok(FetchOutcome::Applied {
                    coordinate: ticket.coordinate,
                    labels,
                })
            }
            Err(e) => {
                state.phase = if state.draft.coordinate.is_some() {
                    CursorPhase::Loaded
                } else {
                    CursorPhase::Reset
                };
                warn!(coordinate = %ticket.coordinate, error = %e, "step fetch failed");
                Err(e.into())
            }
        }
    }

    /// Fetch the draft for the current cursor.
    pub async fn load<G>(&self, gateway: &G) -> Result<FetchOutcome>
    where
        G: PersistenceGateway + ?Sized,
    {
        let ticket = self.begin_fetch()?;
        let response = gateway.try_load_step(&ticket.coordinate).await;
        self.complete_fetch(ticket, response)
    }

    /// Replace the draft text. Nothing is persisted.
    pub fn update_text(&self, text: impl Into<String>) -> Result<()> {
        let mut state = self.state.lock();
        state.cursor_mut()?;
        state.draft.set_text(text);
        Ok(())
    }

    /// Replace the draft speaker. Nothing is persisted.
    pub fn update_speaker(&self, speaker: Option<SpeakerId>) -> Result<()> {
        let mut state = self.state.lock();
        state.cursor_mut()?;
        state.draft.set_speaker(speaker);
        Ok(())
    }

    /// Persist the draft at the cursor's coordinate.
    ///
    /// The draft must have been loaded for exactly that coordinate.
    pub async fn save<G>(&self, gateway: &G) -> Result<StepCoordinate>
    where
        G: PersistenceGateway + ?Sized,
    {
        let (coordinate, speaker, text, revision) = {
            let mut state = self.state.lock();
            let coordinate = state.coordinate()?;
            if state.draft.coordinate.as_ref() != Some(&coordinate) {
                return Err(EditorError::invalid_coordinate(format!(
                    "draft is not loaded for {}",
                    coordinate
                )));
            }
            state.draft.status = DraftStatus::Saving;
            (
                coordinate,
                state.draft.speaker.clone(),
                state.draft.text.clone(),
                state.draft.revision,
            )
        };

        let result = gateway.save_step(&coordinate, speaker.as_ref(), &text).await;

        let mut state = self.state.lock();
        let same_draft = state.draft.coordinate.as_ref() == Some(&coordinate);
        match result {
            Ok(()) => {
                if same_draft && state.draft.revision == revision {
                    state.draft.status = DraftStatus::Clean;
                } else if same_draft {
                    state.draft.status = DraftStatus::Dirty;
                }
                debug!(%coordinate, "step saved");
                Ok(coordinate)
            }
            Err(e) => {
                if same_draft {
                    state.draft.status = DraftStatus::Dirty;
                }
                warn!(%coordinate, error = %e, "step save failed");
                Err(e.into())
            }
        }
    }

    /// Current cursor, `None` while idle.
    pub fn cursor(&self) -> Option<Cursor> {
        self.state.lock().cursor.clone()
    }

    /// Dialog bound by the last `reset`.
    pub fn dialog_id(&self) -> Option<DialogId> {
        self.state.lock().dialog_id.clone()
    }

    pub fn phase(&self) -> CursorPhase {
        self.state.lock().phase
    }

    /// Copy of the working draft.
    pub fn draft(&self) -> Draft {
        self.state.lock().draft.clone()
    }

    /// Latest sequence number handed out.
    pub fn latest_seq(&self) -> u64 {
        self.state.lock().issued
    }

    fn require_cursor(&self) -> Result<Cursor> {
        self.cursor()
            .ok_or_else(|| EditorError::invalid_coordinate("no dialog selected"))
    }
}
