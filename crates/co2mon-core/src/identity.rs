//! Stable sensor identity derived from the connection path.
//!
//! The identity is tied to the connection point, not to the device: moving a
//! monitor to another port yields a new identity. The path itself can be long
//! and carry characters that are not valid in metric names, so it is hashed.

use std::fmt;

use sha1::{Digest, Sha1};

/// Length of a [`SensorIdentity`] digest in bytes.
pub const IDENTITY_LEN: usize = 20;

/// SHA-1 digest of a sensor's transport path.
///
/// SHA-1 keeps metric names identical to those of existing meter exporters,
/// so dashboards and alert rules carry over. It is used for naming only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SensorIdentity([u8; IDENTITY_LEN]);

impl SensorIdentity {
    pub fn from_path(path: &str) -> Self {
        Self(Sha1::digest(path.as_bytes()).into())
    }

    /// Lowercase hex rendering, safe to embed in metric names.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for SensorIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
