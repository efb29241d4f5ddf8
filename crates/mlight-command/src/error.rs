/// Errors raised while validating or applying a control message.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The topic is not `<prefix>/<address>/<channel>/set`.
    #[error("malformed topic {topic:?}: {reason}")]
    Topic { topic: String, reason: String },

    /// The address is outside 1-255.
    #[error("address {0} out of range (1-255)")]
    AddressOutOfRange(i64),

    /// The channel is outside 0-3.
    #[error("channel {0} out of range (0-3)")]
    ChannelOutOfRange(i64),

    /// The payload is not valid JSON, or not the expected shape.
    #[error("payload is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The payload failed schema validation.
    #[error("payload rejected: {0}")]
    Validation(String),

    /// The built-in payload schema could not be compiled.
    #[error("failed to compile payload schema: {0}")]
    SchemaCompile(String),

    /// The bus refused the write.
    #[error("bus error: {0}")]
    Bus(#[from] mlight_bus::BusError),
}

impl CommandError {
    /// True for errors caused by the message itself rather than the bridge.
    pub fn is_invalid_message(&self) -> bool {
        !matches!(self, CommandError::SchemaCompile(_) | CommandError::Bus(_))
    }

    pub(crate) fn topic(topic: &str, reason: impl Into<String>) -> Self {
        CommandError::Topic {
            topic: topic.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CommandError>;
