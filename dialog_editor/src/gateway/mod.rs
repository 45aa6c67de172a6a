//! Persistence gateway - the request/response boundary to durable storage.
//!
//! The editor core never touches storage directly. Every call may fail, and
//! the registries and navigator keep their cached state intact when it does.
//!
//! Two implementations ship with the crate:
//! - [`InMemoryGateway`]: keeps everything in process, with failure injection
//! - [`FileGateway`]: JSON files under a data directory, exporting each saved
//!   step into the dialog's directory

mod export;
mod file;
mod memory;
mod store;

pub use export::*;
pub use file::*;
pub use memory::*;
pub use store::*;

use async_trait::async_trait;
use dialog_model::{
    Dialog, DialogId, NewDialog, NewSpeaker, Speaker, SpeakerId, StepContent, StepCoordinate,
};
use std::path::PathBuf;

use crate::error::GatewayResult;

/// Names of the gateway calls, for failure injection and call logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayCall {
    LoadDialogs,
    CreateDialog,
    SelectDialog,
    UpdateLabels,
    LoadSpeakers,
    CreateSpeaker,
    TryLoadStep,
    SaveStep,
    PickDirectory,
    GenerateScript,
}

#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// All dialogs, in storage order.
    async fn load_dialogs(&self) -> GatewayResult<Vec<Dialog>>;

    /// Persist a new dialog and return it with its assigned id.
    async fn create_dialog(&self, request: &NewDialog) -> GatewayResult<Dialog>;

    /// Authoritative snapshot of an existing dialog.
    async fn select_dialog(&self, dialog_id: &DialogId) -> GatewayResult<Dialog>;

    /// Replace the stored label list of a dialog.
    async fn update_labels(&self, dialog_id: &DialogId, labels: &[String]) -> GatewayResult<()>;

    /// All speakers, in creation order.
    async fn load_speakers(&self) -> GatewayResult<Vec<Speaker>>;

    /// Persist a new speaker and return it with its assigned id.
    async fn create_speaker(&self, request: &NewSpeaker) -> GatewayResult<Speaker>;

    /// Content of a step. A step that does not exist yet comes back empty.
    async fn try_load_step(&self, coordinate: &StepCoordinate) -> GatewayResult<StepContent>;

    /// Store the text and speaker of a step.
    async fn save_step(
        &self,
        coordinate: &StepCoordinate,
        speaker: Option<&SpeakerId>,
        text: &str,
    ) -> GatewayResult<()>;

    /// Ask the author for an output directory. `None` when they cancel.
    async fn pick_directory(&self) -> GatewayResult<Option<PathBuf>>;

    /// Hand a dialog to the external script generator.
    async fn generate_script(&self, dialog_id: &DialogId) -> GatewayResult<()>;
}
