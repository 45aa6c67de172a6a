//! JSON file gateway.
//!
//! Layout under the data directory:
//! - `dialogs.json`: every dialog, in creation order
//! - `speakers.json`: every speaker, in creation order
//! - `steps.json`: stored step content
//!
//! Saving a step also exports it into the dialog's own directory.

use async_trait::async_trait;
use dialog_model::{
    Dialog, DialogId, NewDialog, NewSpeaker, Speaker, SpeakerId, StepContent, StepCoordinate,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use super::{encode_utf16le, export_file_name, export_line, GatewayStore, PersistenceGateway};
use crate::config::EditorConfig;
use crate::error::{GatewayError, GatewayResult};

const DIALOGS_FILE: &str = "dialogs.json";
const SPEAKERS_FILE: &str = "speakers.json";
const STEPS_FILE: &str = "steps.json";

pub struct FileGateway {
    base_path: PathBuf,
    export_dir: Option<PathBuf>,
    /// Serialises read-modify-write cycles.
    io_lock: Mutex<()>,
}

impl FileGateway {
    /// Store files under `base_path`, without an export directory.
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
            export_dir: None,
            io_lock: Mutex::new(()),
        }
    }

    /// Build from `data_dir` / `export_dir` in the editor config.
    pub fn from_config(config: &EditorConfig) -> GatewayResult<Self> {
        let data_dir = config
            .data_dir
            .as_ref()
            .ok_or_else(|| GatewayError::Backend("data_dir is not configured".to_string()))?;
        Ok(Self {
            export_dir: config.export_dir.clone(),
            ..Self::new(data_dir)
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    async fn read_list<T: DeserializeOwned>(&self, file: &str) -> GatewayResult<Vec<T>> {
        let path = self.base_path.join(file);
        if !fs::try_exists(&path).await? {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&path).await?;
        Ok(serde_json::from_str(&contents)?)
    }

    async fn write_list<T: Serialize>(&self, file: &str, items: &[T]) -> GatewayResult<()> {
        fs::create_dir_all(&self.base_path).await?;
        let contents = serde_json::to_string_pretty(items)?;
        fs::write(self.base_path.join(file), contents).await?;
        debug!(file, count = items.len(), "wrote gateway file");
        Ok(())
    }

    /// Write the exported line for a saved step.
    async fn export_step(
        &self,
        store: &GatewayStore,
        coordinate: &StepCoordinate,
    ) -> GatewayResult<PathBuf> {
        let dialog = store.dialog(&coordinate.dialog_id)?;
        let step = store
            .step(coordinate)
            .ok_or_else(|| GatewayError::NotFound(format!("step {}", coordinate)))?;
        let speaker = step
            .speaker
            .as_ref()
            .and_then(|id| store.speakers.iter().find(|s| s.id == *id));

        fs::create_dir_all(&dialog.directory).await?;
        let path = dialog.directory.join(export_file_name(coordinate));
        let line = export_line(speaker, &step.text);
        fs::write(&path, encode_utf16le(&line)).await?;
        debug!(path = %path.display(), "exported step");
        Ok(path)
    }

    async fn read_store(&self) -> GatewayResult<GatewayStore> {
        Ok(GatewayStore {
            dialogs: self.read_list(DIALOGS_FILE).await?,
            speakers: self.read_list(SPEAKERS_FILE).await?,
            steps: self.read_list(STEPS_FILE).await?,
        })
    }
}

#[async_trait]
impl PersistenceGateway for FileGateway {
    async fn load_dialogs(&self) -> GatewayResult<Vec<Dialog>> {
        let _guard = self.io_lock.lock().await;
        self.read_list(DIALOGS_FILE).await
    }

    async fn create_dialog(&self, request: &NewDialog) -> GatewayResult<Dialog> {
        let _guard = self.io_lock.lock().await;
        let mut store = self.read_store().await?;
        let dialog = store.create_dialog(request);
        self.write_list(DIALOGS_FILE, &store.dialogs).await?;
        Ok(dialog)
    }

    async fn select_dialog(&self, dialog_id: &DialogId) -> GatewayResult<Dialog> {
        let _guard = self.io_lock.lock().await;
        let store = self.read_store().await?;
        store.dialog(dialog_id).cloned()
    }

    async fn update_labels(&self, dialog_id: &DialogId, labels: &[String]) -> GatewayResult<()> {
        let _guard = self.io_lock.lock().await;
        let mut store = self.read_store().await?;
        store.update_labels(dialog_id, labels)?;
        self.write_list(DIALOGS_FILE, &store.dialogs).await
    }

    async fn load_speakers(&self) -> GatewayResult<Vec<Speaker>> {
        let _guard = self.io_lock.lock().await;
        self.read_list(SPEAKERS_FILE).await
    }

    async fn create_speaker(&self, request: &NewSpeaker) -> GatewayResult<Speaker> {
        let _guard = self.io_lock.lock().await;
        let mut store = self.read_store().await?;
        let speaker = store.create_speaker(request);
        self.write_list(SPEAKERS_FILE, &store.speakers).await?;
        Ok(speaker)
    }

    async fn try_load_step(&self, coordinate: &StepCoordinate) -> GatewayResult<StepContent> {
        let _guard = self.io_lock.lock().await;
        let mut store = self.read_store().await?;
        let known = store.steps.len();
        let content = store.load_step(coordinate)?;
        if store.steps.len() != known {
            self.write_list(STEPS_FILE, &store.steps).await?;
        }
        Ok(content)
    }

    async fn save_step(
        &self,
        coordinate: &StepCoordinate,
        speaker: Option<&SpeakerId>,
        text: &str,
    ) -> GatewayResult<()> {
        let _guard = self.io_lock.lock().await;
        let mut store = self.read_store().await?;
        store.save_step(coordinate, speaker, text)?;
        self.write_list(STEPS_FILE, &store.steps).await?;
        self.export_step(&store, coordinate).await?;
        Ok(())
    }

    async fn pick_directory(&self) -> GatewayResult<Option<PathBuf>> {
        Ok(self.export_dir.clone())
    }

    async fn generate_script(&self, _dialog_id: &DialogId) -> GatewayResult<()> {
        Err(GatewayError::Unsupported("script generation"))
    }
}
