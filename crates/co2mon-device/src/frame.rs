//! 8-byte report decoding for AirCO2ntrol-family monitors.
//!
//! Each HID input report carries one value:
//!
//! ```text
//! [op, hi, lo, checksum, 0x0d, 0, 0, 0]
//! ```
//!
//! Older firmware scrambles the report with the session key sent at open
//! time; newer firmware sends it in the clear. The encoding is fixed per
//! device: either configured, or detected once from a report that is valid
//! in only one of the two.

use crate::DeviceError;

/// Report length in bytes.
pub const FRAME_LEN: usize = 8;

/// Session key sent as a feature report when the device is opened.
pub const DEFAULT_KEY: [u8; FRAME_LEN] = [0xc4, 0xc6, 0xc0, 0x92, 0x40, 0x23, 0xdc, 0x96];

const OP_TEMPERATURE: u8 = 0x42;
const OP_CO2: u8 = 0x50;
const FRAME_END: u8 = 0x0d;

/// Fixed state mixed into every scrambled report ("Htemp99e").
const CSTATE: [u8; FRAME_LEN] = [0x48, 0x74, 0x65, 0x6d, 0x70, 0x39, 0x39, 0x65];
const SHUFFLE: [usize; FRAME_LEN] = [2, 4, 0, 7, 1, 6, 5, 3];

/// A single decoded value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measurement {
    Temperature(f64),
    Co2(u32),
    /// Humidity, relative CO2 and other opcodes the exporter does not publish.
    Other(u8),
}

/// Encoding of a device's input reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Plain,
    Scrambled,
}

/// Decode one report in the given encoding.
pub fn decode(
    frame: &[u8; FRAME_LEN],
    key: &[u8; FRAME_LEN],
    encoding: Encoding,
) -> Result<Measurement, DeviceError> {
    let plain = match encoding {
        Encoding::Plain => *frame,
        Encoding::Scrambled => descramble(frame, key),
    };

    if !is_valid(&plain) {
        return Err(DeviceError::Checksum { frame: *frame });
    }

    let value = u16::from_be_bytes([plain[1], plain[2]]);
    Ok(match plain[0] {
        OP_TEMPERATURE => Measurement::Temperature(f64::from(value) / 16.0 - 273.15),
        OP_CO2 => Measurement::Co2(u32::from(value)),
        op => Measurement::Other(op),
    })
}

/// Tell which encoding `frame` is valid in.
///
/// Returns `None` when the frame passes the checksum both as-is and
/// descrambled, since it says nothing about the device then.
pub fn detect(
    frame: &[u8; FRAME_LEN],
    key: &[u8; FRAME_LEN],
) -> Result<Option<Encoding>, DeviceError> {
    match (is_valid(frame), is_valid(&descramble(frame, key))) {
        (true, false) => Ok(Some(Encoding::Plain)),
        (false, true) => Ok(Some(Encoding::Scrambled)),
        (true, true) => Ok(None),
        (false, false) => Err(DeviceError::Checksum { frame: *frame }),
    }
}

fn is_valid(frame: &[u8; FRAME_LEN]) -> bool {
    frame[4] == FRAME_END && frame[0].wrapping_add(frame[1]).wrapping_add(frame[2]) == frame[3]
}

/// Undo the device's report scrambling.
pub fn descramble(data: &[u8; FRAME_LEN], key: &[u8; FRAME_LEN]) -> [u8; FRAME_LEN] {
    let mut shuffled = [0u8; FRAME_LEN];
    for (i, &o) in SHUFFLE.iter().enumerate() {
        shuffled[o] = data[i];
    }

    let mut xored = [0u8; FRAME_LEN];
    for i in 0..FRAME_LEN {
        xored[i] = shuffled[i] ^ key[i];
    }

    let mut out = [0u8; FRAME_LEN];
    for i in 0..FRAME_LEN {
        let prev = xored[(i + FRAME_LEN - 1) % FRAME_LEN];
        let rotated = (xored[i] >> 3) | (prev << 5);
        out[i] = rotated.wrapping_sub(CSTATE[i].rotate_left(4));
    }
    out
}
