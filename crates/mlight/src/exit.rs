use std::fmt;

use mlight_bus::BusError;
use mlight_command::CommandError;
use mlight_frame::FrameError;
use mlight_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    let kind = err.io_kind();
    if kind == std::io::ErrorKind::NotFound {
        return CliError::new(
            TRANSPORT_ERROR,
            format!("{context}: {err} (is the device plugged in?)"),
        );
    }
    CliError::new(TRANSPORT_ERROR, format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(_) | FrameError::ConnectionClosed => {
            CliError::new(TRANSPORT_ERROR, format!("{context}: {err}"))
        }
        FrameError::ChecksumMismatch { .. } | FrameError::InvalidLength { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
    }
}

pub fn bus_error(context: &str, err: BusError) -> CliError {
    match err {
        BusError::Frame(err) => frame_error(context, err),
        BusError::ChannelOutOfRange { .. } => CliError::new(USAGE, format!("{context}: {err}")),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

pub fn command_error(context: &str, err: CommandError) -> CliError {
    match err {
        CommandError::Bus(err) => bus_error(context, err),
        err if err.is_invalid_message() => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_io_is_transport() {
        let err = FrameError::Io(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone"));
        assert_eq!(frame_error("send", err).code, TRANSPORT_ERROR);
    }

    #[test]
    fn checksum_is_data_invalid() {
        let err = FrameError::ChecksumMismatch {
            expected: 1,
            actual: 2,
        };
        assert_eq!(frame_error("read", err).code, DATA_INVALID);
    }

    #[test]
    fn transmitter_write_failure_is_transport() {
        let err = BusError::Frame(FrameError::ConnectionClosed);
        let cli = bus_error("bus transmitter stopped", err);
        assert_eq!(cli.code, TRANSPORT_ERROR);
        assert!(cli.message.starts_with("bus transmitter stopped: "));
    }

    #[test]
    fn panicked_bus_is_internal() {
        assert_eq!(bus_error("bus", BusError::Panicked).code, INTERNAL);
    }

    #[test]
    fn rejected_message_is_data_invalid() {
        let err = CommandError::AddressOutOfRange(0);
        assert_eq!(command_error("handle", err).code, DATA_INVALID);
    }

    #[test]
    fn schema_compile_is_internal() {
        let err = CommandError::SchemaCompile("bad".into());
        assert_eq!(command_error("init", err).code, INTERNAL);
    }
}
