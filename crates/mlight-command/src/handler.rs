use mlight_bus::BrightnessTable;
use tracing::debug;

use crate::error::{CommandError, Result};
use crate::payload::{PayloadValidator, State};
use crate::topic::{decode_topic, Target};

/// A fully validated control instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub target: Target,
    pub state: State,
    pub brightness: Option<u8>,
}

impl Instruction {
    /// The value handed to [`BrightnessTable::set`].
    ///
    /// `OFF` is level 0; `ON` without a brightness is `None`, which resumes
    /// the previous level.
    pub fn level(&self) -> Option<i64> {
        match self.state {
            State::Off => Some(0),
            State::On => self.brightness.map(i64::from),
        }
    }
}

/// Result of applying one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Applied {
    pub target: Target,
    /// Level now stored for the target channel.
    pub stored: u8,
}

/// Turns raw control messages into brightness table writes.
#[derive(Debug)]
pub struct CommandHandler {
    table: BrightnessTable,
    validator: PayloadValidator,
    prefix: Option<String>,
}

impl CommandHandler {
    /// Handler writing into `table`, accepting any topic prefix.
    pub fn new(table: BrightnessTable) -> Result<Self> {
        Ok(Self {
            table,
            validator: PayloadValidator::new()?,
            prefix: None,
        })
    }

    /// Only accept topics under `prefix`.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let prefix = prefix.trim_end_matches("/#").trim_end_matches('/').to_string();
        self.prefix = Some(prefix);
        self
    }

    /// Validate a message without applying it.
    pub fn parse(&self, topic: &str, payload: &[u8]) -> Result<Instruction> {
        if let Some(prefix) = &self.prefix {
            let under_prefix = topic
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.starts_with('/'));
            if !under_prefix {
                return Err(CommandError::topic(
                    topic,
                    format!("not under prefix {prefix:?}"),
                ));
            }
        }

        let target = decode_topic(topic)?;
        let payload = self.validator.parse(payload)?;
        Ok(Instruction {
            target,
            state: payload.state,
            brightness: payload.brightness,
        })
    }

    /// Apply an already validated instruction.
    pub fn apply(&self, instruction: &Instruction) -> Result<Applied> {
        let Target { address, channel } = instruction.target;
        match (instruction.state, instruction.brightness) {
            (State::Off, _) => debug!(address, channel, "setting OFF (brightness=0)"),
            (State::On, None) => debug!(address, channel, "no brightness received, resuming"),
            (State::On, Some(brightness)) => {
                debug!(address, channel, brightness, "setting brightness")
            }
        }

        let stored = self.table.set(address, channel, instruction.level())?;
        Ok(Applied {
            target: instruction.target,
            stored,
        })
    }

    /// Validate and apply one control message.
    ///
    /// On error the table is left untouched.
    pub fn handle(&self, topic: &str, payload: &[u8]) -> Result<Applied> {
        let instruction = self.parse(topic, payload)?;
        self.apply(&instruction)
    }

    /// The table this handler writes into.
    pub fn table(&self) -> &BrightnessTable {
        &self.table
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use mlight_bus::DEFAULT_BRIGHTNESS;

    use super::*;

    fn handler() -> CommandHandler {
        CommandHandler::new(BrightnessTable::default()).unwrap()
    }

    #[test]
    fn on_with_brightness_sets_level() {
        let h = handler();
        let applied = h
            .handle("mlight/3/2/set", br#"{"state":"ON","brightness":40}"#)
            .unwrap();
        assert_eq!(applied.stored, 40);
        assert_eq!(h.table().get(3), Some([0, 0, 40, 0]));
    }

    #[test]
    fn off_sets_zero_and_on_resumes() {
        let h = handler();
        h.handle("mlight/1/1/set", br#"{"state":"ON","brightness":30}"#)
            .unwrap();
        h.handle("mlight/1/1/set", br#"{"state":"OFF"}"#).unwrap();
        assert_eq!(h.table().get(1), Some([0; 4]));

        let applied = h.handle("mlight/1/1/set", br#"{"state":"ON"}"#).unwrap();
        assert_eq!(applied.stored, 30);
    }

    #[test]
    fn on_without_history_uses_default() {
        let h = handler();
        let applied = h.handle("mlight/9/0/set", br#"{"state":"ON"}"#).unwrap();
        assert_eq!(applied.stored, DEFAULT_BRIGHTNESS);
    }

    #[test]
    fn off_ignores_brightness() {
        let h = handler();
        let applied = h
            .handle("mlight/2/0/set", br#"{"state":"OFF","brightness":50}"#)
            .unwrap();
        assert_eq!(applied.stored, 0);
    }

    #[test]
    fn on_with_zero_brightness_stores_zero() {
        let h = handler();
        let applied = h
            .handle("mlight/2/0/set", br#"{"state":"ON","brightness":0}"#)
            .unwrap();
        assert_eq!(applied.stored, 0);
    }

    #[test]
    fn instruction_levels() {
        let target = Target {
            address: 1,
            channel: 0,
        };
        let level = |state, brightness| {
            Instruction {
                target,
                state,
                brightness,
            }
            .level()
        };
        assert_eq!(level(State::Off, Some(10)), Some(0));
        assert_eq!(level(State::On, Some(10)), Some(10));
        assert_eq!(level(State::On, None), None);
    }

    #[test]
    fn rejected_messages_leave_table_untouched() {
        let h = handler();
        h.handle("mlight/1/0/set", br#"{"state":"ON","brightness":10}"#)
            .unwrap();
        let before = h.table().levels();

        let bad: [(&str, &[u8]); 8] = [
            ("mlight/1/0/get", br#"{"state":"ON"}"#),
            ("mlight/0/0/set", br#"{"state":"ON"}"#),
            ("mlight/1/4/set", br#"{"state":"ON"}"#),
            ("mlight/1/0/set", br#"{"state":"DIM"}"#),
            ("mlight/1/0/set", br#"{"brightness":5}"#),
            ("mlight/1/0/set", br#"{"state":"ON","brightness":65}"#),
            ("mlight/1/0/set", b"not json"),
            ("mlight/2/0/set", br#"{"state":"OFF","brightness":-3}"#),
        ];
        for (topic, payload) in bad {
            let err = h.handle(topic, payload).unwrap_err();
            assert!(err.is_invalid_message(), "{topic}: {err}");
        }

        assert_eq!(h.table().levels(), before);
        assert_eq!(h.table().levels(), BTreeMap::from([(1, [10, 0, 0, 0])]));
    }

    #[test]
    fn prefix_is_enforced_when_configured() {
        let h = handler().with_prefix("mlight/#");
        assert!(h.handle("mlight/1/0/set", br#"{"state":"ON"}"#).is_ok());
        let err = h.handle("other/1/0/set", br#"{"state":"ON"}"#).unwrap_err();
        assert!(matches!(err, CommandError::Topic { .. }));
        assert!(h.handle("mlightx/1/0/set", br#"{"state":"ON"}"#).is_err());
    }

    #[test]
    fn parse_does_not_mutate() {
        let h = handler();
        let instruction = h
            .parse("mlight/5/3/set", br#"{"state":"ON","brightness":12}"#)
            .unwrap();
        assert!(h.table().is_empty());
        assert_eq!(instruction.level(), Some(12));

        h.apply(&instruction).unwrap();
        assert_eq!(h.table().get(5), Some([0, 0, 0, 12]));
    }
}
