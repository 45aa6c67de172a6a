//! Storage state shared by the bundled gateways.

use dialog_model::{
    Dialog, DialogId, NewDialog, NewSpeaker, Speaker, SpeakerId, StepContent, StepCoordinate,
};
use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, GatewayResult};

/// A persisted step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredStep {
    pub coordinate: StepCoordinate,
    pub text: String,
    pub speaker: Option<SpeakerId>,
}

/// Everything a gateway persists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayStore {
    pub dialogs: Vec<Dialog>,
    pub speakers: Vec<Speaker>,
    pub steps: Vec<StoredStep>,
}

impl GatewayStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_dialog(&mut self, request: &NewDialog) -> Dialog {
        let dialog = Dialog::new(request.clone()).with_id(DialogId::new());
        self.dialogs.push(dialog.clone());
        dialog
    }

    pub fn dialog(&self, dialog_id: &DialogId) -> GatewayResult<&Dialog> {
        self.dialogs
            .iter()
            .find(|d| d.id.as_ref() == Some(dialog_id))
            .ok_or_else(|| GatewayError::NotFound(format!("dialog {}", dialog_id)))
    }

    pub fn update_labels(&mut self, dialog_id: &DialogId, labels: &[String]) -> GatewayResult<()> {
        let dialog = self
            .dialogs
            .iter_mut()
            .find(|d| d.id.as_ref() == Some(dialog_id))
            .ok_or_else(|| GatewayError::NotFound(format!("dialog {}", dialog_id)))?;
        dialog.labels = labels.to_vec();
        Ok(())
    }

    pub fn create_speaker(&mut self, request: &NewSpeaker) -> Speaker {
        let speaker = request.clone().into_speaker(SpeakerId::new());
        self.speakers.push(speaker.clone());
        speaker
    }

    /// Fetch a step, materialising an empty one on first visit.
    pub fn load_step(&mut self, coordinate: &StepCoordinate) -> GatewayResult<StepContent> {
        self.dialog(&coordinate.dialog_id)?;

        let (text, speaker) = match self.steps.iter().find(|s| s.coordinate == *coordinate) {
            Some(step) => (step.text.clone(), step.speaker.clone()),
            None => {
                self.steps.push(StoredStep {
                    coordinate: coordinate.clone(),
                    text: String::new(),
                    speaker: None,
                });
                (String::new(), None)
            }
        };

        Ok(StepContent {
            text,
            speaker,
            labels: self.labels_at(&coordinate.dialog_id, coordinate.counter),
        })
    }

    pub fn save_step(
        &mut self,
        coordinate: &StepCoordinate,
        speaker: Option<&SpeakerId>,
        text: &str,
    ) -> GatewayResult<()> {
        self.dialog(&coordinate.dialog_id)?;
        if let Some(id) = speaker {
            if !self.speakers.iter().any(|s| s.id == *id) {
                return Err(GatewayError::NotFound(format!("speaker {}", id)));
            }
        }

        match self.steps.iter_mut().find(|s| s.coordinate == *coordinate) {
            Some(step) => {
                step.text = text.to_string();
                step.speaker = speaker.cloned();
            }
            None => self.steps.push(StoredStep {
                coordinate: coordinate.clone(),
                text: text.to_string(),
                speaker: speaker.cloned(),
            }),
        }
        Ok(())
    }

    /// Labels that have a stored step at `counter`, in first-seen order.
    pub fn labels_at(&self, dialog_id: &DialogId, counter: u32) -> Vec<String> {
        let mut labels: Vec<String> = Vec::new();
        for step in self
            .steps
            .iter()
            .filter(|s| s.coordinate.dialog_id == *dialog_id && s.coordinate.counter == counter)
        {
            if !labels.contains(&step.coordinate.label) {
                labels.push(step.coordinate.label.clone());
            }
        }
        labels
    }

    pub fn step(&self, coordinate: &StepCoordinate) -> Option<&StoredStep> {
        self.steps.iter().find(|s| s.coordinate == *coordinate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dialog_model::SpeakerType;

    #[test]
    fn test_missing_step_is_materialised_empty() {
        let mut store = GatewayStore::new();
        let dialog = store.create_dialog(&NewDialog::new("Gate", "gate", "/tmp", []));
        let id = dialog.id.clone().unwrap();
        let coordinate = StepCoordinate::new(id.clone(), "main", 2);

        let content = store.load_step(&coordinate).unwrap();
        assert_eq!(content.text, "");
        assert!(content.speaker.is_none());
        assert_eq!(content.labels, vec!["main".to_string()]);
        assert!(store.step(&coordinate).is_some());
    }

    #[test]
    fn test_save_step_round_trip() {
        let mut store = GatewayStore::new();
        let speaker = store.create_speaker(&NewSpeaker::new(
            "Guard",
            "guard",
            "#ff0000",
            SpeakerType::Creature,
        ));
        let dialog = store.create_dialog(&NewDialog::new("Gate", "gate", "/tmp", []));
        let coordinate = StepCoordinate::new(dialog.id.unwrap(), "main", 0);

        store
            .save_step(&coordinate, Some(&speaker.id), "Halt!")
            .unwrap();
        let content = store.load_step(&coordinate).unwrap();
        assert_eq!(content.text, "Halt!");
        assert_eq!(content.speaker, Some(speaker.id));
    }

    #[test]
    fn test_unknown_dialog_is_not_found() {
        let mut store = GatewayStore::new();
        let coordinate = StepCoordinate::new(DialogId::from_raw("nope"), "main", 0);
        assert!(matches!(
            store.load_step(&coordinate),
            Err(GatewayError::NotFound(_))
        ));
        assert!(store.update_labels(&DialogId::from_raw("nope"), &[]).is_err());
    }
}
