//! Structured EK80 filenames.
//!
//! Files are named like `2107RL_CW-D20210813-T084512.raw`:
//! cruise prefix, `_`, two-letter transmission mode, `-D` date, `-T` time.
//! Each field is recovered independently, so a name missing one token still
//! yields the others.

use super::model::{FilenameInfo, TransmissionMode};
use crate::config::DEFAULT_CRUISE;

/// Parse every field the filename carries. Never fails.
pub fn parse_filename(name: &str) -> FilenameInfo {
    FilenameInfo {
        date: parse_date(name),
        time: parse_time(name),
        mode: parse_mode(name),
    }
}

/// First `D` followed by eight digits, as `YYYY-MM-DD`.
pub fn parse_date(name: &str) -> Option<String> {
    let d = find_marked_digits(name, b'D', 8)?;
    Some(format!("{}-{}-{}", &d[0..4], &d[4..6], &d[6..8]))
}

/// First `T` followed by six digits, as `HH:MM:SS`.
pub fn parse_time(name: &str) -> Option<String> {
    let t = find_marked_digits(name, b'T', 6)?;
    Some(format!("{}:{}:{}", &t[0..2], &t[2..4], &t[4..6]))
}

/// Two-character token between `_` and `-`.
pub fn parse_mode(name: &str) -> TransmissionMode {
    let bytes = name.as_bytes();
    bytes
        .windows(4)
        .position(|w| w[0] == b'_' && w[3] == b'-')
        .map(|i| TransmissionMode::from_token(&name[i + 1..i + 3]))
        .unwrap_or_default()
}

/// Cruise code from a `YYNNRL_` prefix, e.g. `1907RL_...` → `RL1907`.
///
/// Names without the prefix belong to the default cruise.
pub fn extract_cruise(name: &str) -> String {
    let bytes = name.as_bytes();
    let has_prefix = bytes.len() >= 7
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && &bytes[4..7] == b"RL_";
    if has_prefix {
        format!("RL{}", &name[..4])
    } else {
        DEFAULT_CRUISE.to_string()
    }
}

/// Locate `marker` followed by `count` ASCII digits and return the digits.
fn find_marked_digits(name: &str, marker: u8, count: usize) -> Option<&str> {
    let bytes = name.as_bytes();
    if bytes.len() <= count {
        return None;
    }
    (0..bytes.len() - count)
        .find(|&i| {
            bytes[i] == marker && bytes[i + 1..=i + count].iter().all(u8::is_ascii_digit)
        })
        .map(|i| &name[i + 1..=i + count])
}
