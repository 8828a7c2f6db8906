//! Vim-style key notation for terminal input.
//!
//! Lessons spell keystrokes the way vim documentation does: literal text
//! interleaved with bracketed names such as `<Esc>`, `<CR>` or `<C-w>`.
//! `parse_keys("ihello<Esc>:wq<CR>")` yields the key sequence and
//! [`Key::to_escape_sequence`] turns each key into pty bytes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Error, Result};

/// Keyboard key for terminal input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    /// Regular character
    Char(char),

    /// Up arrow
    Up,
    /// Down arrow
    Down,
    /// Left arrow
    Left,
    /// Right arrow
    Right,
    /// Home key
    Home,
    /// End key
    End,
    /// Page Up
    PageUp,
    /// Page Down
    PageDown,

    /// Enter/Return key
    Enter,
    /// Tab key
    Tab,
    /// Escape key
    Escape,
    /// Backspace key
    Backspace,
    /// Delete key
    Delete,
    /// Insert key
    Insert,

    /// Function key F1-F12
    F(u8),

    /// Ctrl + character
    Ctrl(char),
    /// Alt/Meta + character
    Alt(char),
    /// Shift + key (only meaningful for Tab and arrows)
    Shift(Box<Key>),
    /// Ctrl + Alt + character
    CtrlAlt(char),
}

fn ctrl_code(c: char) -> Option<u8> {
    match c.to_ascii_lowercase() {
        c @ 'a'..='z' => Some(c as u8 - b'a' + 1),
        '@' | ' ' => Some(0x00),
        '[' => Some(0x1B),
        '\\' => Some(0x1C),
        ']' => Some(0x1D),
        '^' => Some(0x1E),
        '_' => Some(0x1F),
        '?' => Some(0x7F),
        _ => None,
    }
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

impl Key {
    /// Parse the inside of a bracketed key name, e.g. `Esc`, `C-w`, `S-Tab`.
    pub fn parse(name: &str) -> Result<Self> {
        let invalid = || Error::InvalidKey(format!("<{name}>"));
        let lower = name.trim().to_ascii_lowercase();

        if let Some(rest) = lower
            .strip_prefix("c-m-")
            .or_else(|| lower.strip_prefix("c-a-"))
        {
            let c = single_char(rest).ok_or_else(invalid)?;
            ctrl_code(c).ok_or_else(invalid)?;
            return Ok(Key::CtrlAlt(c));
        }

        if let Some(rest) = lower.strip_prefix("c-") {
            let c = single_char(rest).ok_or_else(invalid)?;
            ctrl_code(c).ok_or_else(invalid)?;
            return Ok(Key::Ctrl(c));
        }

        if lower.starts_with("m-") || lower.starts_with("a-") {
            // Keep the original case: <M-F> and <M-f> differ
            let c = single_char(&name.trim()[2..]).ok_or_else(invalid)?;
            return Ok(Key::Alt(c));
        }

        if let Some(rest) = lower.strip_prefix("s-") {
            let inner = Key::parse(rest)?;
            return Ok(Key::Shift(Box::new(inner)));
        }

        if let Some(n) = lower.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
            if (1..=12).contains(&n) {
                return Ok(Key::F(n));
            }
            return Err(invalid());
        }

        match lower.as_str() {
            "cr" | "enter" | "return" => Ok(Key::Enter),
            "tab" => Ok(Key::Tab),
            "esc" | "escape" => Ok(Key::Escape),
            "bs" | "backspace" => Ok(Key::Backspace),
            "del" | "delete" => Ok(Key::Delete),
            "ins" | "insert" => Ok(Key::Insert),
            "space" => Ok(Key::Char(' ')),
            "lt" => Ok(Key::Char('<')),
            "bar" => Ok(Key::Char('|')),
            "bslash" => Ok(Key::Char('\\')),
            "up" => Ok(Key::Up),
            "down" => Ok(Key::Down),
            "left" => Ok(Key::Left),
            "right" => Ok(Key::Right),
            "home" => Ok(Key::Home),
            "end" => Ok(Key::End),
            "pageup" | "pgup" => Ok(Key::PageUp),
            "pagedown" | "pgdn" => Ok(Key::PageDown),
            _ => Err(invalid()),
        }
    }

    /// Convert key to terminal escape sequence bytes.
    pub fn to_escape_sequence(&self) -> Vec<u8> {
        match self {
            Key::Char(c) => c.to_string().into_bytes(),
            Key::Enter => vec![0x0D],
            Key::Tab => vec![0x09],
            Key::Escape => vec![0x1B],
            Key::Backspace => vec![0x7F],
            Key::Delete => b"\x1b[3~".to_vec(),
            Key::Insert => b"\x1b[2~".to_vec(),
            Key::Up => b"\x1b[A".to_vec(),
            Key::Down => b"\x1b[B".to_vec(),
            Key::Right => b"\x1b[C".to_vec(),
            Key::Left => b"\x1b[D".to_vec(),
            Key::Home => b"\x1b[H".to_vec(),
            Key::End => b"\x1b[F".to_vec(),
            Key::PageUp => b"\x1b[5~".to_vec(),
            Key::PageDown => b"\x1b[6~".to_vec(),
            Key::F(n) => match n {
                1 => b"\x1bOP".to_vec(),
                2 => b"\x1bOQ".to_vec(),
                3 => b"\x1bOR".to_vec(),
                4 => b"\x1bOS".to_vec(),
                5 => b"\x1b[15~".to_vec(),
                6 => b"\x1b[17~".to_vec(),
                7 => b"\x1b[18~".to_vec(),
                8 => b"\x1b[19~".to_vec(),
                9 => b"\x1b[20~".to_vec(),
                10 => b"\x1b[21~".to_vec(),
                11 => b"\x1b[23~".to_vec(),
                _ => b"\x1b[24~".to_vec(),
            },
            Key::Ctrl(c) => ctrl_code(*c).map(|code| vec![code]).unwrap_or_default(),
            Key::Alt(c) => {
                let mut seq = vec![0x1B];
                seq.extend(c.to_string().bytes());
                seq
            }
            Key::Shift(inner) => match inner.as_ref() {
                Key::Tab => b"\x1b[Z".to_vec(),
                Key::Up => b"\x1b[1;2A".to_vec(),
                Key::Down => b"\x1b[1;2B".to_vec(),
                Key::Right => b"\x1b[1;2C".to_vec(),
                Key::Left => b"\x1b[1;2D".to_vec(),
                Key::Char(c) => c.to_uppercase().to_string().into_bytes(),
                other => other.to_escape_sequence(),
            },
            Key::CtrlAlt(c) => match ctrl_code(*c) {
                Some(code) => vec![0x1B, code],
                None => Vec::new(),
            },
        }
    }
}

/// Parse a vim-notation key string into keys.
///
/// A `<` that does not start a known `<name>` token is taken literally.
pub fn parse_keys(notation: &str) -> Result<Vec<Key>> {
    let mut keys = Vec::new();
    let mut rest = notation;

    while let Some(c) = rest.chars().next() {
        if c == '<' {
            if let Some(end) = rest[1..].find('>') {
                let name = &rest[1..1 + end];
                if !name.is_empty() && !name.contains('<') && !name.contains(char::is_whitespace)
                {
                    if let Ok(key) = Key::parse(name) {
                        keys.push(key);
                        rest = &rest[end + 2..];
                        continue;
                    }
                }
            }
        }
        keys.push(Key::Char(c));
        rest = &rest[c.len_utf8()..];
    }

    Ok(keys)
}

/// Bytes to write for a vim-notation key string.
pub fn keys_to_bytes(notation: &str) -> Result<Vec<u8>> {
    Ok(parse_keys(notation)?
        .iter()
        .flat_map(Key::to_escape_sequence)
        .collect())
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Char('<') => write!(f, "<lt>"),
            Key::Char(' ') => write!(f, "<Space>"),
            Key::Char(c) => write!(f, "{c}"),
            Key::Up => write!(f, "<Up>"),
            Key::Down => write!(f, "<Down>"),
            Key::Left => write!(f, "<Left>"),
            Key::Right => write!(f, "<Right>"),
            Key::Home => write!(f, "<Home>"),
            Key::End => write!(f, "<End>"),
            Key::PageUp => write!(f, "<PageUp>"),
            Key::PageDown => write!(f, "<PageDown>"),
            Key::Enter => write!(f, "<CR>"),
            Key::Tab => write!(f, "<Tab>"),
            Key::Escape => write!(f, "<Esc>"),
            Key::Backspace => write!(f, "<BS>"),
            Key::Delete => write!(f, "<Del>"),
            Key::Insert => write!(f, "<Ins>"),
            Key::F(n) => write!(f, "<F{n}>"),
            Key::Ctrl(c) => write!(f, "<C-{c}>"),
            Key::Alt(c) => write!(f, "<M-{c}>"),
            Key::Shift(k) => {
                let inner = k.to_string();
                let inner = inner.trim_start_matches('<').trim_end_matches('>');
                write!(f, "<S-{inner}>")
            }
            Key::CtrlAlt(c) => write!(f, "<C-M-{c}>"),
        }
    }
}
