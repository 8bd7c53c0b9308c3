//! Windows virtual-key codes and their human-readable names.
//!
//! Actions store raw virtual-key codes. Config files and the CLI use names
//! such as `"2"`, `"a"` or `"f5"`, and the preview renders single symbols.

use crate::error::{Result, SksError};

const VK_TAB: u32 = 0x09;
const VK_RETURN: u32 = 0x0D;
const VK_SHIFT: u32 = 0x10;
const VK_CONTROL: u32 = 0x11;
const VK_MENU: u32 = 0x12;
const VK_SPACE: u32 = 0x20;
const VK_0: u32 = 0x30;
const VK_9: u32 = 0x39;
const VK_A: u32 = 0x41;
const VK_Z: u32 = 0x5A;
const VK_F1: u32 = 0x70;
const VK_F12: u32 = 0x7B;

/// Largest virtual-key code; `SendInput` carries codes in a single byte.
pub const MAX_KEY_CODE: u32 = 0xFF;

/// Whether `code` is a virtual-key code that can actually be sent.
pub fn is_valid_code(code: u32) -> bool {
    (1..=MAX_KEY_CODE).contains(&code)
}

/// Parse a key name into its virtual-key code.
///
/// Accepts digits, letters (case-insensitive), a handful of named keys,
/// `f1`..`f12`, and raw hex codes written as `vk_41` or `0x41`.
pub fn parse_key(name: &str) -> Result<u32> {
    let key = name.trim().to_lowercase();
    if key.is_empty() {
        return Err(SksError::invalid_key(name, "empty key name"));
    }

    let mut chars = key.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii_digit() {
            return Ok(VK_0 + (c as u32 - '0' as u32));
        }
        if c.is_ascii_lowercase() {
            return Ok(VK_A + (c as u32 - 'a' as u32));
        }
    }

    let code = match key.as_str() {
        "space" => VK_SPACE,
        "enter" | "return" => VK_RETURN,
        "tab" => VK_TAB,
        "shift" => VK_SHIFT,
        "ctrl" | "control" => VK_CONTROL,
        "alt" => VK_MENU,
        other => {
            if let Some(n) = other.strip_prefix('f').and_then(|n| n.parse::<u32>().ok()) {
                if (1..=12).contains(&n) {
                    return Ok(VK_F1 + n - 1);
                }
                return Err(SksError::invalid_key(name, "function keys range from f1 to f12"));
            }
            let hex = other
                .strip_prefix("vk_")
                .or_else(|| other.strip_prefix("0x"))
                .ok_or_else(|| SksError::invalid_key(name, "unknown key"))?;
            u32::from_str_radix(hex, 16)
                .map_err(|e| SksError::invalid_key(name, format!("bad hex code: {}", e)))?
        }
    };

    if !is_valid_code(code) {
        return Err(SksError::invalid_key(
            name,
            format!("virtual-key codes range from 0x01 to {:#04X}", MAX_KEY_CODE),
        ));
    }
    Ok(code)
}

/// Render a virtual-key code the way the profile editor displays it.
pub fn key_name(code: u32) -> String {
    match code {
        VK_0..=VK_9 => (code - VK_0).to_string(),
        VK_A..=VK_Z => char::from(b'A' + (code - VK_A) as u8).to_string(),
        VK_SPACE => "Space".to_string(),
        VK_RETURN => "Enter".to_string(),
        VK_TAB => "Tab".to_string(),
        VK_SHIFT => "Shift".to_string(),
        VK_CONTROL => "Ctrl".to_string(),
        VK_MENU => "Alt".to_string(),
        VK_F1..=VK_F12 => format!("F{}", code - VK_F1 + 1),
        _ => format!("VK_{:02X}", code),
    }
}

/// Single-character symbol used by the sequence preview.
pub fn preview_symbol(code: u32) -> char {
    match code {
        VK_0..=VK_9 => char::from(b'0' + (code - VK_0) as u8),
        VK_A..=VK_Z => char::from(b'A' + (code - VK_A) as u8),
        _ => '?',
    }
}

/// Serde adapter: writes key names, reads either a name or a raw code.
pub mod serde_key {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum KeyRepr {
        Code(u32),
        Name(String),
    }

    pub fn serialize<S: Serializer>(code: &u32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::key_name(*code))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        match KeyRepr::deserialize(deserializer)? {
            KeyRepr::Code(code) => Ok(code),
            KeyRepr::Name(name) => super::parse_key(&name).map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_digits_and_letters() {
        assert_eq!(parse_key("1").unwrap(), 0x31);
        assert_eq!(parse_key("9").unwrap(), 0x39);
        assert_eq!(parse_key("a").unwrap(), 0x41);
        assert_eq!(parse_key("Z").unwrap(), 0x5A);
    }

    #[test]
    fn test_parse_named_keys() {
        assert_eq!(parse_key("space").unwrap(), 0x20);
        assert_eq!(parse_key(" Enter ").unwrap(), 0x0D);
        assert_eq!(parse_key("f5").unwrap(), 0x74);
        assert_eq!(parse_key("F12").unwrap(), 0x7B);
        assert_eq!(parse_key("vk_a0").unwrap(), 0xA0);
        assert_eq!(parse_key("0x20").unwrap(), 0x20);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!(parse_key("").is_err());
        assert!(parse_key("f13").is_err());
        assert!(parse_key("banana").is_err());
        assert!(parse_key("vk_zz").is_err());
        assert!(parse_key("0x0").is_err());
        assert!(parse_key("vk_141").is_err());
    }

    #[test]
    fn test_valid_code_range() {
        assert!(is_valid_code(0x01));
        assert!(is_valid_code(MAX_KEY_CODE));
        assert!(!is_valid_code(0));
        assert!(!is_valid_code(0x100));
        assert!(!is_valid_code(65601));
    }

    #[test]
    fn test_key_name_matches_parse() {
        for name in ["2", "Q", "Space", "Tab", "Ctrl", "F1", "F10", "VK_A0"] {
            assert_eq!(key_name(parse_key(name).unwrap()), name);
        }
    }

    #[test]
    fn test_preview_symbol() {
        assert_eq!(preview_symbol(0x31), '1');
        assert_eq!(preview_symbol(0x30), '0');
        assert_eq!(preview_symbol(0x46), 'F');
        assert_eq!(preview_symbol(0x20), '?');
        assert_eq!(preview_symbol(0x74), '?');
    }
}
