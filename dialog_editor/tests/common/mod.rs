//! Shared fixtures for the session integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use dialog_editor::{GatewayResult, InMemoryGateway, PersistenceGateway};
use dialog_model::{
    Dialog, DialogId, NewDialog, NewSpeaker, Speaker, SpeakerId, StepContent, StepCoordinate,
};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::oneshot;

/// In-memory gateway whose step fetches and label writes can be held and
/// released one by one.
#[derive(Default)]
pub struct GatedGateway {
    pub inner: InMemoryGateway,
    holding: AtomicBool,
    waiting: Mutex<Vec<(StepCoordinate, oneshot::Sender<()>)>>,
    holding_labels: AtomicBool,
    label_writes: Mutex<Vec<(Vec<String>, oneshot::Sender<()>)>>,
}

impl GatedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park every following `try_load_step` until it is released.
    pub fn hold_steps(&self) {
        self.holding.store(true, Ordering::SeqCst);
    }

    /// Coordinates of the fetches currently parked, in arrival order.
    pub fn parked(&self) -> Vec<StepCoordinate> {
        self.waiting.lock().iter().map(|(c, _)| c.clone()).collect()
    }

    /// Wait until `count` fetches are parked.
    pub async fn wait_for_parked(&self, count: usize) {
        while self.waiting.lock().len() < count {
            tokio::task::yield_now().await;
        }
    }

    /// Let the parked fetch for `counter` proceed.
    pub fn release_counter(&self, counter: u32) {
        let mut waiting = self.waiting.lock();
        if let Some(index) = waiting.iter().position(|(c, _)| c.counter == counter) {
            let (_, sender) = waiting.remove(index);
            let _ = sender.send(());
        }
    }

    /// Park every following `update_labels` until it is released.
    pub fn hold_label_writes(&self) {
        self.holding_labels.store(true, Ordering::SeqCst);
    }

    /// Label lists of the writes currently parked, in arrival order.
    pub fn parked_label_writes(&self) -> Vec<Vec<String>> {
        self.label_writes.lock().iter().map(|(l, _)| l.clone()).collect()
    }

    /// Wait until `count` label writes are parked.
    pub async fn wait_for_label_writes(&self, count: usize) {
        while self.label_writes.lock().len() < count {
            tokio::task::yield_now().await;
        }
    }

    /// Let the oldest parked label write proceed.
    pub fn release_label_write(&self) {
        let mut waiting = self.label_writes.lock();
        if !waiting.is_empty() {
            let (_, sender) = waiting.remove(0);
            let _ = sender.send(());
        }
    }

    /// Let the oldest parked fetch proceed.
    pub fn release_oldest(&self) {
        let mut waiting = self.waiting.lock();
        if !waiting.is_empty() {
            let (_, sender) = waiting.remove(0);
            let _ = sender.send(());
        }
    }
}

#[async_trait]
impl PersistenceGateway for GatedGateway {
    async fn load_dialogs(&self) -> GatewayResult<Vec<Dialog>> {
        self.inner.load_dialogs().await
    }

    async fn create_dialog(&self, request: &NewDialog) -> GatewayResult<Dialog> {
        self.inner.create_dialog(request).await
    }

    async fn select_dialog(&self, dialog_id: &DialogId) -> GatewayResult<Dialog> {
        self.inner.select_dialog(dialog_id).await
    }

    async fn update_labels(&self, dialog_id: &DialogId, labels: &[String]) -> GatewayResult<()> {
        if self.holding_labels.load(Ordering::SeqCst) {
            let (sender, receiver) = oneshot::channel();
            self.label_writes.lock().push((labels.to_vec(), sender));
            let _ = receiver.await;
        }
        self.inner.update_labels(dialog_id, labels).await
    }

    async fn load_speakers(&self) -> GatewayResult<Vec<Speaker>> {
        self.inner.load_speakers().await
    }

    async fn create_speaker(&self, request: &NewSpeaker) -> GatewayResult<Speaker> {
        self.inner.create_speaker(request).await
    }

    async fn try_load_step(&self, coordinate: &StepCoordinate) -> GatewayResult<StepContent> {
        if self.holding.load(Ordering::SeqCst) {
            let (sender, receiver) = oneshot::channel();
            self.waiting.lock().push((coordinate.clone(), sender));
            let _ = receiver.await;
        }
        self.inner.try_load_step(coordinate).await
    }

    async fn save_step(
        &self,
        coordinate: &StepCoordinate,
        speaker: Option<&SpeakerId>,
        text: &str,
    ) -> GatewayResult<()> {
        self.inner.save_step(coordinate, speaker, text).await
    }

    async fn pick_directory(&self) -> GatewayResult<Option<PathBuf>> {
        self.inner.pick_directory().await
    }

    async fn generate_script(&self, dialog_id: &DialogId) -> GatewayResult<()> {
        self.inner.generate_script(dialog_id).await
    }
}

/// Store text for `(dialog, label, counter)` directly in the gateway.
pub async fn seed_step(
    gateway: &InMemoryGateway,
    dialog_id: &DialogId,
    label: &str,
    counter: u32,
    text: &str,
) {
    gateway
        .save_step(&StepCoordinate::new(dialog_id.clone(), label, counter), None, text)
        .await
        .unwrap();
}

/// Create a dialog in storage without selecting it in any session.
pub async fn create_detached_dialog(gateway: &InMemoryGateway, name: &str) -> DialogId {
    let script_name = name.to_lowercase();
    gateway
        .create_dialog(&NewDialog::new(name, script_name, "/tmp", []))
        .await
        .unwrap()
        .id
        .unwrap()
}
