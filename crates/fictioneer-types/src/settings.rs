//! Story generation settings
//!
//! The settings payload threaded from the client through generation. Modeled
//! as an explicit structure validated at the boundary rather than an open
//! JSON map.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Parameters controlling story generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorySettings {
    /// Time period the story is set in (e.g. "Victorian", "Contemporary")
    pub time_period: String,
    /// Location of the story
    pub location: String,
    /// Overall atmosphere (e.g. "Romantic", "Mysterious")
    pub atmosphere: String,
    /// Protagonist gender
    pub protagonist_gender: String,
    /// Partner gender
    pub partner_gender: String,
    /// Relationship between the characters
    pub relationship: String,
    /// Writing tone (e.g. "Passionate", "Playful")
    pub writing_tone: String,
    /// Preferred narration voice for audio playback
    pub narration_voice: String,
    /// Length setting, 1 (shortest) through 5 (longest)
    pub length: u8,
    /// Free-form setting description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setting_description: Option<String>,
    /// Free-form protagonist description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protagonist_description: Option<String>,
    /// Free-form love interest description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub love_interest_description: Option<String>,
    /// Explicitness level, 0-100
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explicit_level: Option<u8>,
}

impl StorySettings {
    /// Validate field bounds
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(1..=5).contains(&self.length) {
            return Err(SettingsError::LengthOutOfRange(self.length));
        }
        if let Some(level) = self.explicit_level {
            if level > 100 {
                return Err(SettingsError::ExplicitLevelOutOfRange(level));
            }
        }
        for (field, value) in [
            ("timePeriod", &self.time_period),
            ("location", &self.location),
            ("atmosphere", &self.atmosphere),
            ("protagonistGender", &self.protagonist_gender),
            ("partnerGender", &self.partner_gender),
            ("relationship", &self.relationship),
            ("writingTone", &self.writing_tone),
        ] {
            if value.trim().is_empty() {
                return Err(SettingsError::EmptyField(field));
            }
        }
        Ok(())
    }
}

/// Settings validation error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// Length must be 1-5
    #[error("length must be between 1 and 5, got {0}")]
    LengthOutOfRange(u8),

    /// Explicit level must be 0-100
    #[error("explicit level must be between 0 and 100, got {0}")]
    ExplicitLevelOutOfRange(u8),

    /// A required field was empty
    #[error("required settings field '{0}' is empty")]
    EmptyField(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> StorySettings {
        StorySettings {
            time_period: "Victorian".into(),
            location: "London".into(),
            atmosphere: "Romantic".into(),
            protagonist_gender: "female".into(),
            partner_gender: "male".into(),
            relationship: "strangers".into(),
            writing_tone: "Passionate".into(),
            narration_voice: "Soft Female".into(),
            length: 3,
            setting_description: None,
            protagonist_description: None,
            love_interest_description: None,
            explicit_level: Some(40),
        }
    }

    #[test]
    fn valid_settings_pass() {
        assert!(settings().validate().is_ok());
    }

    #[test]
    fn length_bounds_enforced() {
        let mut s = settings();
        s.length = 0;
        assert_eq!(s.validate(), Err(SettingsError::LengthOutOfRange(0)));
        s.length = 6;
        assert_eq!(s.validate(), Err(SettingsError::LengthOutOfRange(6)));
    }

    #[test]
    fn explicit_level_bounds_enforced() {
        let mut s = settings();
        s.explicit_level = Some(101);
        assert_eq!(
            s.validate(),
            Err(SettingsError::ExplicitLevelOutOfRange(101))
        );
    }

    #[test]
    fn empty_required_field_rejected() {
        let mut s = settings();
        s.location = "  ".into();
        assert_eq!(s.validate(), Err(SettingsError::EmptyField("location")));
    }

    #[test]
    fn settings_round_trip_camel_case() {
        let s = settings();
        let json = serde_json::to_value(&s).unwrap();
        assert!(json.get("timePeriod").is_some());
        assert!(json.get("explicitLevel").is_some());
        let back: StorySettings = serde_json::from_value(json).unwrap();
        assert_eq!(back, s);
    }
}
