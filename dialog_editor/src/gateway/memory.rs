//! In-process gateway with failure injection and a call log.

use async_trait::async_trait;
use dialog_model::{
    Dialog, DialogId, NewDialog, NewSpeaker, Speaker, SpeakerId, StepContent, StepCoordinate,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;

use super::{GatewayCall, GatewayStore, PersistenceGateway};
use crate::error::{GatewayError, GatewayResult};

/// Gateway that keeps all state in memory.
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    store: Mutex<GatewayStore>,
    /// Pending injected failures per call.
    failures: Mutex<HashMap<GatewayCall, usize>>,
    calls: Mutex<Vec<GatewayCall>>,
    step_requests: Mutex<Vec<StepCoordinate>>,
    generated_scripts: Mutex<Vec<DialogId>>,
    directory: Mutex<Option<PathBuf>>,
}

impl InMemoryGateway {
    /// Create an empty gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing store.
    pub fn with_store(store: GatewayStore) -> Self {
        Self {
            store: Mutex::new(store),
            ..Self::default()
        }
    }

    /// Directory returned by `pick_directory`.
    pub fn with_directory(self, directory: impl Into<PathBuf>) -> Self {
        *self.directory.lock() = Some(directory.into());
        self
    }

    /// Make the next invocation of `call` fail with a backend error.
    pub fn fail_next(&self, call: GatewayCall) {
        *self.failures.lock().entry(call).or_default() += 1;
    }

    /// Copy of the persisted state.
    pub fn snapshot(&self) -> GatewayStore {
        self.store.lock().clone()
    }

    /// Every call received, in order, including failed ones.
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, call: GatewayCall) -> usize {
        self.calls.lock().iter().filter(|c| **c == call).count()
    }

    /// Coordinates requested through `try_load_step`, in order.
    pub fn step_requests(&self) -> Vec<StepCoordinate> {
        self.step_requests.lock().clone()
    }

    pub fn generated_scripts(&self) -> Vec<DialogId> {
        self.generated_scripts.lock().clone()
    }

    fn enter(&self, call: GatewayCall) -> GatewayResult<()> {
        self.calls.lock().push(call);

        let mut failures = self.failures.lock();
        match failures.get_mut(&call) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Err(GatewayError::Backend(format!("injected failure in {:?}", call)))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl PersistenceGateway for InMemoryGateway {
    async fn load_dialogs(&self) -> GatewayResult<Vec<Dialog>> {
        self.enter(GatewayCall::LoadDialogs)?;
        Ok(self.store.lock().dialogs.clone())
    }

    async fn create_dialog(&self, request: &NewDialog) -> GatewayResult<Dialog> {
        self.enter(GatewayCall::CreateDialog)?;
        Ok(self.store.lock().create_dialog(request))
    }

    async fn select_dialog(&self, dialog_id: &DialogId) -> GatewayResult<Dialog> {
        self.enter(GatewayCall::SelectDialog)?;
        self.store.lock().dialog(dialog_id).cloned()
    }

    async fn update_labels(&self, dialog_id: &DialogId, labels: &[String]) -> GatewayResult<()> {
        self.enter(GatewayCall::UpdateLabels)?;
        self.store.lock().update_labels(dialog_id, labels)
    }

    async fn load_speakers(&self) -> GatewayResult<Vec<Speaker>> {
        self.enter(GatewayCall::LoadSpeakers)?;
        Ok(self.store.lock().speakers.clone())
    }

    async fn create_speaker(&self, request: &NewSpeaker) -> GatewayResult<Speaker> {
        self.enter(GatewayCall::CreateSpeaker)?;
        Ok(self.store.lock().create_speaker(request))
    }

    async fn try_load_step(&self, coordinate: &StepCoordinate) -> GatewayResult<StepContent> {
        self.step_requests.lock().push(coordinate.clone());
        self.enter(GatewayCall::TryLoadStep)?;
        self.store.lock().load_step(coordinate)
    }

    async fn save_step(
        &self,
        coordinate: &StepCoordinate,
        speaker: Option<&SpeakerId>,
        text: &str,
    ) -> GatewayResult<()> {
        self.enter(GatewayCall::SaveStep)?;
        self.store.lock().save_step(coordinate, speaker, text)
    }

    async fn pick_directory(&self) -> GatewayResult<Option<PathBuf>> {
        self.enter(GatewayCall::PickDirectory)?;
        Ok(self.directory.lock().clone())
    }

    async fn generate_script(&self, dialog_id: &DialogId) -> GatewayResult<()> {
        self.enter(GatewayCall::GenerateScript)?;
        self.store.lock().dialog(dialog_id)?;
        self.generated_scripts.lock().push(dialog_id.clone());
        Ok(())
    }
}
