use std::path::PathBuf;

/// Errors that can occur in serial transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the serial device.
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: serialport::Error,
    },

    /// An I/O error occurred on the serial stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Best-effort mapping to an `std::io::ErrorKind` for exit code selection.
    pub fn io_kind(&self) -> std::io::ErrorKind {
        match self {
            TransportError::Open { source, .. } => match source.kind() {
                serialport::ErrorKind::NoDevice => std::io::ErrorKind::NotFound,
                serialport::ErrorKind::Io(kind) => kind,
                _ => std::io::ErrorKind::Other,
            },
            TransportError::Io(err) => err.kind(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
