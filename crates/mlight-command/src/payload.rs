//! `set` payload: `{"state": "ON"|"OFF", "brightness": 0-64}`.

use jsonschema::Validator;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CommandError, Result};

/// JSON Schema every `set` payload must satisfy.
///
/// Extra properties (transition, color, ...) are tolerated and ignored.
pub const SET_PAYLOAD_SCHEMA: &str = r#"{
    "$schema": "https://json-schema.org/draft/2020-12/schema",
    "type": "object",
    "properties": {
        "state": { "enum": ["ON", "OFF"] },
        "brightness": {
            "type": ["integer", "null"],
            "minimum": 0,
            "maximum": 64
        }
    },
    "required": ["state"]
}"#;

/// Requested on/off state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum State {
    On,
    Off,
}

/// A validated `set` payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetPayload {
    pub state: State,
    #[serde(default)]
    pub brightness: Option<u8>,
}

/// Compiled form of [`SET_PAYLOAD_SCHEMA`].
pub struct PayloadValidator {
    validator: Validator,
}

impl PayloadValidator {
    /// Compile the built-in schema.
    pub fn new() -> Result<Self> {
        let schema: Value = serde_json::from_str(SET_PAYLOAD_SCHEMA)
            .map_err(|err| CommandError::SchemaCompile(err.to_string()))?;
        let validator = jsonschema::validator_for(&schema)
            .map_err(|err| CommandError::SchemaCompile(err.to_string()))?;
        Ok(Self { validator })
    }

    /// Parse and validate a raw payload.
    pub fn parse(&self, payload: &[u8]) -> Result<SetPayload> {
        let value: Value = serde_json::from_slice(payload)?;

        {
            let mut errors = self.validator.iter_errors(&value);
            if let Some(first) = errors.next() {
                let mut message = first.to_string();
                for err in errors.take(3) {
                    message.push_str("; ");
                    message.push_str(&err.to_string());
                }
                return Err(CommandError::Validation(message));
            }
        }

        Ok(serde_json::from_value(value)?)
    }
}

impl std::fmt::Debug for PayloadValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayloadValidator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(payload: &str) -> Result<SetPayload> {
        PayloadValidator::new().unwrap().parse(payload.as_bytes())
    }

    #[test]
    fn on_with_brightness() {
        assert_eq!(
            parse(r#"{"state":"ON","brightness":30}"#).unwrap(),
            SetPayload {
                state: State::On,
                brightness: Some(30)
            }
        );
    }

    #[test]
    fn on_without_brightness() {
        let payload = parse(r#"{"state":"ON"}"#).unwrap();
        assert_eq!(payload.state, State::On);
        assert_eq!(payload.brightness, None);
    }

    #[test]
    fn null_brightness_is_absent() {
        let payload = parse(r#"{"state":"ON","brightness":null}"#).unwrap();
        assert_eq!(payload.brightness, None);
    }

    #[test]
    fn off_ignores_extra_fields() {
        let payload = parse(r#"{"state":"OFF","transition":2}"#).unwrap();
        assert_eq!(payload.state, State::Off);
    }

    #[test]
    fn missing_state_is_rejected() {
        let err = parse(r#"{"brightness":10}"#).unwrap_err();
        assert!(matches!(err, CommandError::Validation(ref msg) if msg.contains("state")));
    }

    #[test]
    fn unknown_state_is_rejected() {
        for payload in [r#"{"state":"on"}"#, r#"{"state":"TOGGLE"}"#, r#"{"state":1}"#] {
            assert!(matches!(
                parse(payload).unwrap_err(),
                CommandError::Validation(_)
            ));
        }
    }

    // Brightness is range checked here, before it reaches the clamping table.
    #[test]
    fn brightness_above_64_is_rejected() {
        assert!(matches!(
            parse(r#"{"state":"ON","brightness":65}"#).unwrap_err(),
            CommandError::Validation(_)
        ));
    }

    #[test]
    fn negative_brightness_is_rejected() {
        assert!(matches!(
            parse(r#"{"state":"ON","brightness":-1}"#).unwrap_err(),
            CommandError::Validation(_)
        ));
    }

    #[test]
    fn non_integer_brightness_is_rejected() {
        assert!(matches!(
            parse(r#"{"state":"ON","brightness":"bright"}"#).unwrap_err(),
            CommandError::Validation(_)
        ));
        assert!(parse(r#"{"state":"ON","brightness":12.5}"#).is_err());
    }

    #[test]
    fn non_object_payload_is_rejected() {
        assert!(matches!(
            parse(r#"["ON"]"#).unwrap_err(),
            CommandError::Validation(_)
        ));
    }

    #[test]
    fn garbage_payload_is_invalid_json() {
        assert!(matches!(
            parse("ON").unwrap_err(),
            CommandError::InvalidJson(_)
        ));
        assert!(matches!(
            PayloadValidator::new().unwrap().parse(&[0xFF, 0xFE]).unwrap_err(),
            CommandError::InvalidJson(_)
        ));
    }
}
