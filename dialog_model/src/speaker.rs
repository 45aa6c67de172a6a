//! Speaker definitions.

use serde::{Deserialize, Serialize};

use crate::error::{require_non_empty, validate_script_name, ValidationError};
use crate::SpeakerId;

/// How generated scripts refer to a speaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpeakerType {
    /// Referenced by quoted name.
    Hero,
    /// Referenced by bare script identifier.
    Creature,
}

impl SpeakerType {
    /// Constant emitted into generated scripts for this speaker type.
    pub fn script_tag(&self) -> &'static str {
        match self {
            SpeakerType::Hero => "SPEAKER_TYPE_HERO",
            SpeakerType::Creature => "SPEAKER_TYPE_CREATURE",
        }
    }
}

/// A named, typed, colored entity that can author a step's text.
///
/// Speakers are immutable once the gateway has assigned their id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Speaker {
    pub id: SpeakerId,
    pub name: String,
    pub script_name: String,
    pub speaker_type: SpeakerType,
    /// Hex color used to display the speaker's name.
    pub color: String,
}

/// Everything needed to ask the gateway for a new speaker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSpeaker {
    pub name: String,
    pub script_name: String,
    pub color: String,
    pub speaker_type: SpeakerType,
}

impl NewSpeaker {
    pub fn new(
        name: impl Into<String>,
        script_name: impl Into<String>,
        color: impl Into<String>,
        speaker_type: SpeakerType,
    ) -> Self {
        Self {
            name: name.into(),
            script_name: script_name.into(),
            color: color.into(),
            speaker_type,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)?;
        validate_script_name(&self.script_name)?;
        if !is_hex_color(&self.color) {
            return Err(ValidationError::InvalidColor(self.color.clone()));
        }
        Ok(())
    }

    /// Attach the id handed out by the gateway.
    pub fn into_speaker(self, id: SpeakerId) -> Speaker {
        Speaker {
            id,
            name: self.name,
            script_name: self.script_name,
            speaker_type: self.speaker_type,
            color: self.color,
        }
    }
}

/// `#RRGGBB` or `#RRGGBBAA`.
pub fn is_hex_color(value: &str) -> bool {
    match value.strip_prefix('#') {
        Some(digits) => {
            matches!(digits.len(), 6 | 8) && digits.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_colors() {
        assert!(is_hex_color("#ff8800"));
        assert!(is_hex_color("#FF8800CC"));
        assert!(!is_hex_color("ff8800"));
        assert!(!is_hex_color("#ff880"));
        assert!(!is_hex_color("#gg8800"));
    }

    #[test]
    fn test_new_speaker_validation() {
        let ok = NewSpeaker::new("Ayla", "ayla", "#a0c0ff", SpeakerType::Hero);
        assert!(ok.validate().is_ok());

        let unnamed = NewSpeaker::new("", "ayla", "#a0c0ff", SpeakerType::Hero);
        assert_eq!(unnamed.validate(), Err(ValidationError::EmptyField("name")));

        let bad_color = NewSpeaker::new("Ayla", "ayla", "blue", SpeakerType::Hero);
        assert_eq!(
            bad_color.validate(),
            Err(ValidationError::InvalidColor("blue".to_string()))
        );
    }

    #[test]
    fn test_into_speaker_keeps_fields() {
        let id = SpeakerId::from_raw("s-1");
        let speaker = NewSpeaker::new("Wolf", "wolf", "#444444", SpeakerType::Creature)
            .into_speaker(id.clone());
        assert_eq!(speaker.id, id);
        assert_eq!(speaker.speaker_type.script_tag(), "SPEAKER_TYPE_CREATURE");
    }
}
