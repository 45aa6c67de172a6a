//! Step export for the game client.
//!
//! Each saved step becomes `<counter>_<label>.txt` in the dialog's directory,
//! holding one UTF-16LE line with a byte order mark:
//! `<color=#RRGGBB>Name<color=white>: text`.

use dialog_model::{Speaker, StepCoordinate};

const UTF16LE_BOM: [u8; 2] = [0xFF, 0xFE];

/// File name of the exported step at `coordinate`.
pub fn export_file_name(coordinate: &StepCoordinate) -> String {
    format!("{}_{}.txt", coordinate.counter, coordinate.label)
}

/// Rich-text line the client renders. Narration without a speaker is the
/// bare text.
pub fn export_line(speaker: Option<&Speaker>, text: &str) -> String {
    match speaker {
        Some(speaker) => format!(
            "<color={}>{}<color=white>: {}",
            speaker.color, speaker.name, text
        ),
        None => text.to_string(),
    }
}

pub fn encode_utf16le(line: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(UTF16LE_BOM.len() + line.len() * 2);
    bytes.extend_from_slice(&UTF16LE_BOM);
    for unit in line.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use dialog_model::{DialogId, NewSpeaker, SpeakerId, SpeakerType};

    #[test]
    fn test_file_name_puts_counter_first() {
        let coordinate = StepCoordinate::new(DialogId::from_raw("d"), "fight", 3);
        assert_eq!(export_file_name(&coordinate), "3_fight.txt");
    }

    #[test]
    fn test_line_colours_the_speaker() {
        let guard = NewSpeaker::new("Guard", "guard", "#aa3333", SpeakerType::Creature)
            .into_speaker(SpeakerId::from_raw("s"));

        assert_eq!(
            export_line(Some(&guard), "Halt!"),
            "<color=#aa3333>Guard<color=white>: Halt!"
        );
        assert_eq!(export_line(None, "The gate creaks."), "The gate creaks.");
    }

    #[test]
    fn test_encoding_is_utf16le_with_bom() {
        assert_eq!(encode_utf16le("Hé"), vec![0xFF, 0xFE, b'H', 0x00, 0xE9, 0x00]);
        assert_eq!(encode_utf16le(""), vec![0xFF, 0xFE]);
    }
}
