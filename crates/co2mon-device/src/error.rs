//! Error types for device access.

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("could not open device at path '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("device I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("checksum error in frame {frame:02x?}")]
    Checksum { frame: [u8; 8] },

    #[error("short frame: got {0} bytes, expected 8")]
    ShortFrame(usize),

    #[error("device disconnected")]
    Disconnected,
}
