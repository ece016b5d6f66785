//! Input validation tests
//!
//! Boundary validation for the payloads clients control: generation
//! settings and purchase identifiers.

use fictioneer_types::{CreditPack, StorySettings};

fn settings_json() -> serde_json::Value {
    serde_json::json!({
        "timePeriod": "Victorian",
        "location": "London",
        "atmosphere": "Romantic",
        "protagonistGender": "female",
        "partnerGender": "male",
        "relationship": "strangers",
        "writingTone": "Passionate",
        "narrationVoice": "Soft Female",
        "length": 3
    })
}

// ============================================================================
// Settings payloads
// ============================================================================

#[test]
fn minimal_settings_payload_is_accepted() {
    let settings: StorySettings = serde_json::from_value(settings_json()).unwrap();
    assert!(settings.validate().is_ok());
    assert_eq!(settings.length, 3);
    assert_eq!(settings.explicit_level, None);
}

#[test]
fn unknown_length_values_fail_validation() {
    for bad in [0u8, 6, 200] {
        let mut json = settings_json();
        json["length"] = serde_json::json!(bad);
        let settings: StorySettings = serde_json::from_value(json).unwrap();
        assert!(settings.validate().is_err(), "length {bad} must be rejected");
    }
}

#[test]
fn explicit_level_above_hundred_fails_validation() {
    let mut json = settings_json();
    json["explicitLevel"] = serde_json::json!(101);
    let settings: StorySettings = serde_json::from_value(json).unwrap();
    assert!(settings.validate().is_err());
}

#[test]
fn missing_required_field_fails_deserialization() {
    let mut json = settings_json();
    json.as_object_mut().unwrap().remove("location");
    assert!(serde_json::from_value::<StorySettings>(json).is_err());
}

#[test]
fn whitespace_only_field_fails_validation() {
    let mut json = settings_json();
    json["atmosphere"] = serde_json::json!("   ");
    let settings: StorySettings = serde_json::from_value(json).unwrap();
    assert!(settings.validate().is_err());
}

#[test]
fn negative_length_fails_deserialization() {
    let mut json = settings_json();
    json["length"] = serde_json::json!(-1);
    assert!(serde_json::from_value::<StorySettings>(json).is_err());
}

#[test]
fn optional_descriptions_are_preserved() {
    let mut json = settings_json();
    json["settingDescription"] = serde_json::json!("fog over the Thames");
    let settings: StorySettings = serde_json::from_value(json).unwrap();
    assert_eq!(
        settings.setting_description.as_deref(),
        Some("fog over the Thames")
    );
}

// ============================================================================
// Purchase identifiers
// ============================================================================

#[test]
fn known_credit_packs_parse() {
    assert_eq!("starter".parse::<CreditPack>().unwrap(), CreditPack::Starter);
    assert_eq!("popular".parse::<CreditPack>().unwrap(), CreditPack::Popular);
    assert_eq!("large".parse::<CreditPack>().unwrap(), CreditPack::Large);
    // Case-insensitive, as clients send display casing
    assert_eq!("Starter".parse::<CreditPack>().unwrap(), CreditPack::Starter);
}

#[test]
fn unknown_purchase_identifiers_are_rejected() {
    for bad in ["", "mega", "premium!", "starter pack"] {
        assert!(bad.parse::<CreditPack>().is_err(), "{bad:?} must be rejected");
    }
}
