//! Speaker Registry - append-only cache of speakers.

use dialog_model::{Dialog, NewSpeaker, Speaker, SpeakerId};
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::error::Result;
use crate::gateway::PersistenceGateway;

/// Cached speakers in creation order.
#[derive(Debug, Default)]
pub struct SpeakerRegistry {
    speakers: Mutex<Vec<Speaker>>,
}

impl SpeakerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cache with the gateway's speaker list.
    ///
    /// On failure the previous cache is kept.
    pub async fn load<G>(&self, gateway: &G) -> Result<usize>
    where
        G: PersistenceGateway + ?Sized,
    {
        let speakers = gateway.load_speakers().await.map_err(|e| {
            warn!(error = %e, "failed to load speakers, keeping cached list");
            e
        })?;
        let count = speakers.len();
        *self.speakers.lock() = speakers;
        Ok(count)
    }

    /// Validate, persist and append a new speaker.
    pub async fn create<G>(&self, gateway: &G, request: NewSpeaker) -> Result<Speaker>
    where
        G: PersistenceGateway + ?Sized,
    {
        request.validate()?;
        let speaker = gateway.create_speaker(&request).await?;
        info!(id = %speaker.id, name = %speaker.name, "speaker created");
        self.speakers.lock().push(speaker.clone());
        Ok(speaker)
    }

    /// Every cached speaker, in creation order.
    pub fn all(&self) -> Vec<Speaker> {
        self.speakers.lock().clone()
    }

    /// Look up a cached speaker.
    pub fn get(&self, id: &SpeakerId) -> Option<Speaker> {
        self.speakers.lock().iter().find(|s| s.id == *id).cloned()
    }

    /// Whether `id` is a registered speaker.
    pub fn contains(&self, id: &SpeakerId) -> bool {
        self.speakers.lock().iter().any(|s| s.id == *id)
    }

    /// Speakers taking part in `dialog`, in registry order.
    pub fn speakers_for(&self, dialog: &Dialog) -> Vec<Speaker> {
        self.speakers
            .lock()
            .iter()
            .filter(|s| dialog.has_speaker(&s.id))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.speakers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EditorError;
    use crate::gateway::{GatewayCall, InMemoryGateway};
    use dialog_model::{NewDialog, SpeakerType, ValidationError};

    fn guard() -> NewSpeaker {
        NewSpeaker::new("Guard", "guard", "#aa3333", SpeakerType::Creature)
    }

    #[tokio::test]
    async fn test_create_appends_last() {
        let gateway = InMemoryGateway::new();
        let registry = SpeakerRegistry::new();

        registry.create(&gateway, guard()).await.unwrap();
        let hero = registry
            .create(
                &gateway,
                NewSpeaker::new("Ayla", "ayla", "#3366ff", SpeakerType::Hero),
            )
            .await
            .unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.all().last(), Some(&hero));
        assert!(registry.contains(&hero.id));
    }

    #[tokio::test]
    async fn test_invalid_speaker_never_reaches_gateway() {
        let gateway = InMemoryGateway::new();
        let registry = SpeakerRegistry::new();

        let err = registry
            .create(
                &gateway,
                NewSpeaker::new("", "guard", "#aa3333", SpeakerType::Creature),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EditorError::Validation(ValidationError::EmptyField("name"))
        ));
        assert_eq!(gateway.call_count(GatewayCall::CreateSpeaker), 0);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_failed_load_keeps_cache() {
        let gateway = InMemoryGateway::new();
        let registry = SpeakerRegistry::new();
        registry.create(&gateway, guard()).await.unwrap();

        gateway.fail_next(GatewayCall::LoadSpeakers);
        let err = registry.load(&gateway).await.unwrap_err();

        assert!(err.is_gateway_failure());
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_load_overwrites_cache() {
        let gateway = InMemoryGateway::new();
        let other = InMemoryGateway::new();
        gateway.create_speaker(&guard()).await.unwrap();
        gateway
            .create_speaker(&NewSpeaker::new("Ayla", "ayla", "#3366ff", SpeakerType::Hero))
            .await
            .unwrap();

        // Cached locally but unknown to `gateway`.
        let registry = SpeakerRegistry::new();
        let orphan = registry.create(&other, guard()).await.unwrap();
        assert_eq!(registry.len(), 1);

        assert_eq!(registry.load(&gateway).await.unwrap(), 2);
        assert_eq!(registry.all(), gateway.snapshot().speakers);
        assert!(!registry.contains(&orphan.id));
    }

    #[tokio::test]
    async fn test_speakers_for_dialog() {
        let gateway = InMemoryGateway::new();
        let registry = SpeakerRegistry::new();
        let a = registry.create(&gateway, guard()).await.unwrap();
        let _b = registry.create(&gateway, guard()).await.unwrap();

        let dialog = Dialog::new(NewDialog::new("Gate", "gate", "/tmp", [a.id.clone()]));
        assert_eq!(registry.speakers_for(&dialog), vec![a]);
    }
}
