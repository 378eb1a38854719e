//! Linux input-event key code to scan text table.
//!
//! Reference: `linux/input-event-codes.h` (`KEY_*` constants).
//!
//! # How this table works
//!
//! `KEY_TEXT_TABLE` is a compile-time constant array of string slices indexed
//! by key code.  Position 2 holds `"1"` because `KEY_1` is 2.  Codes without a
//! textual meaning (modifiers, function keys, anything unknown) hold `""`.
//!
//! Letters are always emitted upper case.  Scanners typically send Shift
//! before each letter; Shift is not tracked, it simply contributes nothing.

/// Number of entries in the lookup table (covers `KEY_RESERVED`..`KEY_COMPOSE`).
const TABLE_LEN: usize = 128;

/// Returns the text contributed by key `code`, or `""` when there is none.
pub fn key_to_text(code: u16) -> &'static str {
    KEY_TEXT_TABLE.get(code as usize).copied().unwrap_or("")
}

/// Key code → text table.
const KEY_TEXT_TABLE: [&str; TABLE_LEN] = {
    let mut t = [""; TABLE_LEN];

    // ── Digit row (KEY_1=2 … KEY_0=11) ───────────────────────────────────────
    t[2] = "1";
    t[3] = "2";
    t[4] = "3";
    t[5] = "4";
    t[6] = "5";
    t[7] = "6";
    t[8] = "7";
    t[9] = "8";
    t[10] = "9";
    t[11] = "0";
    t[12] = "-"; // KEY_MINUS
    t[13] = "="; // KEY_EQUAL

    // ── Top letter row ───────────────────────────────────────────────────────
    t[15] = "\t"; // KEY_TAB
    t[16] = "Q";
    t[17] = "W";
    t[18] = "E";
    t[19] = "R";
    t[20] = "T";
    t[21] = "Y";
    t[22] = "U";
    t[23] = "I";
    t[24] = "O";
    t[25] = "P";
    t[28] = "\n"; // KEY_ENTER

    // ── Home row ─────────────────────────────────────────────────────────────
    t[30] = "A";
    t[31] = "S";
    t[32] = "D";
    t[33] = "F";
    t[34] = "G";
    t[35] = "H";
    t[36] = "J";
    t[37] = "K";
    t[38] = "L";
    t[39] = ";"; // KEY_SEMICOLON
    t[40] = "'"; // KEY_APOSTROPHE
    t[41] = "`"; // KEY_GRAVE
    t[43] = "\\"; // KEY_BACKSLASH

    // ── Bottom row ───────────────────────────────────────────────────────────
    t[44] = "Z";
    t[45] = "X";
    t[46] = "C";
    t[47] = "V";
    t[48] = "B";
    t[49] = "N";
    t[50] = "M";
    t[51] = ","; // KEY_COMMA
    t[52] = "."; // KEY_DOT
    t[53] = "/"; // KEY_SLASH
    t[57] = " "; // KEY_SPACE

    // ── Keypad ───────────────────────────────────────────────────────────────
    t[55] = "*"; // KEY_KPASTERISK
    t[71] = "7";
    t[72] = "8";
    t[73] = "9";
    t[74] = "-"; // KEY_KPMINUS
    t[75] = "4";
    t[76] = "5";
    t[77] = "6";
    t[78] = "+"; // KEY_KPPLUS
    t[79] = "1";
    t[80] = "2";
    t[81] = "3";
    t[82] = "0";
    t[83] = "."; // KEY_KPDOT
    t[96] = "\n"; // KEY_KPENTER
    t[98] = "/"; // KEY_KPSLASH

    // Modifiers (29, 42, 54, 56, 58, 97, 100, 125, 126) intentionally stay "".
    t
};
