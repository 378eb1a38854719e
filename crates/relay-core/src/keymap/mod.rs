//! Key code translation for keystroke-emulating scanners.
//!
//! A scanner in keyboard-wedge mode reports each character of a barcode as a
//! key press.  The relay only needs the *text* each key contributes, so the
//! table maps a key code directly to a string slice.  Modifiers and keys that
//! produce no printable output map to the empty string: they still count as a
//! keystroke (the buffer is re-tested against the boundary pattern) but add no
//! visible content.

pub mod evdev;

/// Translates device key codes into scan text.
pub struct KeyMapper;

impl KeyMapper {
    /// Returns the text contributed by a key-down of `code`.
    ///
    /// `code` is a Linux input-event key code.  Windows Interception drivers
    /// report set-1 scan codes, which share the same numbering for every key
    /// in the table, so both platforms use this function.
    ///
    /// Returns `""` for modifiers and for any code without a mapping.
    pub fn key_to_text(code: u16) -> &'static str {
        evdev::key_to_text(code)
    }
}
