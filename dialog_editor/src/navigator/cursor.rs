//! Cursor state and fetch bookkeeping for the branch navigator.

use dialog_model::{DialogId, StepCoordinate, DEFAULT_LABEL};
use serde::{Deserialize, Serialize};

/// Position of the navigator inside the selected dialog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cursor {
    pub label: String,
    pub counter: u32,
}

impl Cursor {
    pub fn new(label: impl Into<String>, counter: u32) -> Self {
        Self {
            label: label.into(),
            counter,
        }
    }

    /// Start of the default branch.
    pub fn start() -> Self {
        Self::new(DEFAULT_LABEL, 0)
    }

    pub fn coordinate(&self, dialog_id: DialogId) -> StepCoordinate {
        StepCoordinate::new(dialog_id, self.label.clone(), self.counter)
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::start()
    }
}

/// Lifecycle of the cursor.
///
/// `Idle -> Reset` on dialog selection, `-> Pending` when a fetch is
/// dispatched, `-> Loaded` when the latest fetch resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CursorPhase {
    /// No dialog selected yet.
    Idle,
    /// Back at the start of the default branch, nothing fetched.
    Reset,
    /// A fetch with this sequence number is the latest in flight.
    Pending { seq: u64 },
    /// The draft holds content for the cursor's coordinate.
    Loaded,
}

/// Issued when a step fetch is dispatched; handed back on completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub seq: u64,
    pub coordinate: StepCoordinate,
}

/// How a completed fetch was reconciled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The response was the latest issued and replaced the draft.
    Applied {
        coordinate: StepCoordinate,
        /// Labels the gateway reported at this step.
        labels: Vec<String>,
    },
    /// A newer fetch was issued after this one; the response was dropped.
    Stale { seq: u64 },
}

impl FetchOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, FetchOutcome::Applied { .. })
    }
}
