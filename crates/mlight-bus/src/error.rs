use mlight_frame::CHANNEL_COUNT;

/// Errors that can occur on the bus.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    /// A channel index outside the slave's outputs. Programmer error.
    #[error("channel {channel} out of range (slaves have {max} channels)", max = CHANNEL_COUNT)]
    ChannelOutOfRange { channel: usize },

    /// Writing to the serial sink failed. Fatal for the transmitter.
    #[error("bus write failed: {0}")]
    Frame(#[from] mlight_frame::FrameError),

    /// The background thread could not be started.
    #[error("failed to spawn bus thread: {0}")]
    Spawn(std::io::Error),

    /// The background thread panicked.
    #[error("bus thread panicked")]
    Panicked,
}

pub type Result<T> = std::result::Result<T, BusError>;
