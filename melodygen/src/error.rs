// Error type for the fallible edges of the library.
//
// The per-tick engine never returns an error: out-of-range knob values are
// clamped and a corrupted held pitch triggers a full state reset (both see
// `engine.rs`). `MelodyError` is for the operations around the engine that
// can genuinely fail: strict catalog lookups used by display code, loading
// settings from JSON, and writing rendered MIDI files.

use std::fmt;

#[derive(Debug)]
pub enum MelodyError {
    /// A scale index outside the catalog.
    ScaleIndexOutOfRange { index: usize, count: usize },
    /// A key index outside 0–11.
    KeyIndexOutOfRange { index: usize },
    /// Settings parsed but failed validation.
    InvalidSettings(String),
    Json(serde_json::Error),
    Io(std::io::Error),
    /// The MIDI encoder rejected the rendered stream.
    Midi(String),
}

impl fmt::Display for MelodyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MelodyError::ScaleIndexOutOfRange { index, count } => {
                write!(f, "scale index {index} out of range (catalog has {count} scales)")
            }
            MelodyError::KeyIndexOutOfRange { index } => {
                write!(f, "key index {index} out of range (expected 0-11)")
            }
            MelodyError::InvalidSettings(msg) => write!(f, "invalid settings: {msg}"),
            MelodyError::Json(e) => write!(f, "json: {e}"),
            MelodyError::Io(e) => write!(f, "io: {e}"),
            MelodyError::Midi(msg) => write!(f, "midi: {msg}"),
        }
    }
}

impl std::error::Error for MelodyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MelodyError::Json(e) => Some(e),
            MelodyError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for MelodyError {
    fn from(e: serde_json::Error) -> Self {
        MelodyError::Json(e)
    }
}

impl From<std::io::Error> for MelodyError {
    fn from(e: std::io::Error) -> Self {
        MelodyError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_offending_index() {
        let e = MelodyError::ScaleIndexOutOfRange { index: 20, count: 13 };
        assert_eq!(
            e.to_string(),
            "scale index 20 out of range (catalog has 13 scales)"
        );
        let e = MelodyError::KeyIndexOutOfRange { index: 12 };
        assert!(e.to_string().contains("12"));
    }

    #[test]
    fn json_errors_keep_their_source() {
        let bad = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let e: MelodyError = bad.into();
        assert!(std::error::Error::source(&e).is_some());
    }
}
