// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

// Key codes from https://github.com/torvalds/linux/blob/master/include/uapi/linux/input-event-codes.h

use crate::input_event::KEY_MAX;

macro_rules! key_codes {
    ($($name:ident = $code:expr,)*) => {
        $(pub const $name: u16 = $code;)*

        /// Named keys, in code order.
        pub const KEY_NAMES: &[(&str, u16)] = &[$((stringify!($name), $code),)*];
    };
}

key_codes! {
    KEY_RESERVED = 0,
    KEY_ESC = 1,
    KEY_1 = 2,
    KEY_2 = 3,
    KEY_3 = 4,
    KEY_4 = 5,
    KEY_5 = 6,
    KEY_6 = 7,
    KEY_7 = 8,
    KEY_8 = 9,
    KEY_9 = 10,
    KEY_0 = 11,
    KEY_MINUS = 12,
    KEY_EQUAL = 13,
    KEY_BACKSPACE = 14,
    KEY_TAB = 15,
    KEY_Q = 16,
    KEY_W = 17,
    KEY_E = 18,
    KEY_R = 19,
    KEY_T = 20,
    KEY_Y = 21,
    KEY_U = 22,
    KEY_I = 23,
    KEY_O = 24,
    KEY_P = 25,
    KEY_LEFTBRACE = 26,
    KEY_RIGHTBRACE = 27,
    KEY_ENTER = 28,
    KEY_LEFTCTRL = 29,
    KEY_A = 30,
    KEY_S = 31,
    KEY_D = 32,
    KEY_F = 33,
    KEY_G = 34,
    KEY_H = 35,
    KEY_J = 36,
    KEY_K = 37,
    KEY_L = 38,
    KEY_SEMICOLON = 39,
    KEY_APOSTROPHE = 40,
    KEY_GRAVE = 41,
    KEY_LEFTSHIFT = 42,
    KEY_BACKSLASH = 43,
    KEY_Z = 44,
    KEY_X = 45,
    KEY_C = 46,
    KEY_V = 47,
    KEY_B = 48,
    KEY_N = 49,
    KEY_M = 50,
    KEY_COMMA = 51,
    KEY_DOT = 52,
    KEY_SLASH = 53,
    KEY_RIGHTSHIFT = 54,
    KEY_KPASTERISK = 55,
    KEY_LEFTALT = 56,
    KEY_SPACE = 57,
    KEY_CAPSLOCK = 58,
    KEY_F1 = 59,
    KEY_F2 = 60,
    KEY_F3 = 61,
    KEY_F4 = 62,
    KEY_F5 = 63,
    KEY_F6 = 64,
    KEY_F7 = 65,
    KEY_F8 = 66,
    KEY_F9 = 67,
    KEY_F10 = 68,
    KEY_NUMLOCK = 69,
    KEY_SCROLLLOCK = 70,
    KEY_KP7 = 71,
    KEY_KP8 = 72,
    KEY_KP9 = 73,
    KEY_KPMINUS = 74,
    KEY_KP4 = 75,
    KEY_KP5 = 76,
    KEY_KP6 = 77,
    KEY_KPPLUS = 78,
    KEY_KP1 = 79,
    KEY_KP2 = 80,
    KEY_KP3 = 81,
    KEY_KP0 = 82,
    KEY_KPDOT = 83,
    KEY_ZENKAKUHANKAKU = 85,
    KEY_102ND = 86,
    KEY_F11 = 87,
    KEY_F12 = 88,
    KEY_RO = 89,
    KEY_KATAKANA = 90,
    KEY_HIRAGANA = 91,
    KEY_HENKAN = 92,
    KEY_KATAKANAHIRAGANA = 93,
    KEY_MUHENKAN = 94,
    KEY_KPJPCOMMA = 95,
    KEY_KPENTER = 96,
    KEY_RIGHTCTRL = 97,
    KEY_KPSLASH = 98,
    KEY_SYSRQ = 99,
    KEY_RIGHTALT = 100,
    KEY_LINEFEED = 101,
    KEY_HOME = 102,
    KEY_UP = 103,
    KEY_PAGEUP = 104,
    KEY_LEFT = 105,
    KEY_RIGHT = 106,
    KEY_END = 107,
    KEY_DOWN = 108,
    KEY_PAGEDOWN = 109,
    KEY_INSERT = 110,
    KEY_DELETE = 111,
    KEY_MACRO = 112,
    KEY_MUTE = 113,
    KEY_VOLUMEDOWN = 114,
    KEY_VOLUMEUP = 115,
    KEY_POWER = 116,
    KEY_KPEQUAL = 117,
    KEY_KPPLUSMINUS = 118,
    KEY_PAUSE = 119,
    KEY_SCALE = 120,
    KEY_KPCOMMA = 121,
    KEY_HANGEUL = 122,
    KEY_HANJA = 123,
    KEY_YEN = 124,
    KEY_LEFTMETA = 125,
    KEY_RIGHTMETA = 126,
    KEY_COMPOSE = 127,
    KEY_F13 = 183,
    KEY_F14 = 184,
    KEY_F15 = 185,
    KEY_F16 = 186,
    KEY_F17 = 187,
    KEY_F18 = 188,
    KEY_F19 = 189,
    KEY_F20 = 190,
    KEY_F21 = 191,
    KEY_F22 = 192,
    KEY_F23 = 193,
    KEY_F24 = 194,
}

/// Looks up a key by its kernel name. The `KEY_` prefix is optional and
/// case is ignored, so `a`, `A` and `KEY_A` all resolve to 30.
pub fn code_from_name(name: &str) -> Option<u16> {
    let upper = name.trim().to_ascii_uppercase();
    let wanted = upper.strip_prefix("KEY_").unwrap_or(&upper);
    KEY_NAMES
        .iter()
        .find(|(n, _)| &n[4..] == wanted)
        .map(|(_, code)| *code)
}

/// Kernel name of a key code, without the `KEY_` prefix.
pub fn name_from_code(code: u16) -> Option<&'static str> {
    KEY_NAMES
        .iter()
        .find(|(_, c)| *c == code)
        .map(|(n, _)| &n[4..])
}

/// Parses either a key name or a decimal key code below KEY_MAX.
pub fn parse_key(s: &str) -> Result<u16, String> {
    if let Ok(code) = s.trim().parse::<u16>() {
        if code < KEY_MAX {
            return Ok(code);
        }
        return Err(format!("key code {} is out of range (max {})", code, KEY_MAX - 1));
    }
    code_from_name(s).ok_or_else(|| format!("'{}' is not a known key", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_resolve_case_insensitively() {
        assert_eq!(code_from_name("A"), Some(KEY_A));
        assert_eq!(code_from_name("a"), Some(30));
        assert_eq!(code_from_name("KEY_LEFTSHIFT"), Some(KEY_LEFTSHIFT));
        assert_eq!(code_from_name("key_enter"), Some(28));
        assert_eq!(code_from_name("NOPE"), None);
    }

    #[test]
    fn codes_resolve_to_names() {
        assert_eq!(name_from_code(KEY_SPACE), Some("SPACE"));
        assert_eq!(name_from_code(KEY_F24), Some("F24"));
        assert_eq!(name_from_code(300), None);
    }

    #[test]
    fn table_is_sorted_and_unique() {
        for pair in KEY_NAMES.windows(2) {
            assert!(pair[0].1 < pair[1].1, "{:?} before {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn parse_accepts_numbers_and_names() {
        assert_eq!(parse_key("30"), Ok(30));
        assert_eq!(parse_key("esc"), Ok(KEY_ESC));
        assert!(parse_key("767").is_err());
        assert!(parse_key("").is_err());
    }
}
