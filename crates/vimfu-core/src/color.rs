//! Canonical color normalization.
//!
//! Every color that leaves the emulator, whether into a frame document or
//! onto a rendered pixel, goes through this module so the two agree exactly.
//! Normalization is total: unresolvable input falls back to the default
//! foreground or background.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use schemars::{json_schema, JsonSchema, Schema, SchemaGenerator};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::cell::Color;

/// Canonical 24-bit color, serialized as six lower-case hex digits without `#`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    /// Red component
    pub r: u8,
    /// Green component
    pub g: u8,
    /// Blue component
    pub b: u8,
}

/// Default foreground color.
pub const DEFAULT_FG: Rgb = Rgb::new(0xd4, 0xd4, 0xd4);

/// Default background color.
pub const DEFAULT_BG: Rgb = Rgb::new(0x00, 0x00, 0x00);

const ANSI_16: [Rgb; 16] = [
    Rgb::new(0x00, 0x00, 0x00),
    Rgb::new(0xcd, 0x00, 0x00),
    Rgb::new(0x00, 0xcd, 0x00),
    Rgb::new(0xcd, 0xcd, 0x00),
    Rgb::new(0x00, 0x00, 0xee),
    Rgb::new(0xcd, 0x00, 0xcd),
    Rgb::new(0x00, 0xcd, 0xcd),
    Rgb::new(0xe5, 0xe5, 0xe5),
    Rgb::new(0x7f, 0x7f, 0x7f),
    Rgb::new(0xff, 0x00, 0x00),
    Rgb::new(0x00, 0xff, 0x00),
    Rgb::new(0xff, 0xff, 0x00),
    Rgb::new(0x5c, 0x5c, 0xff),
    Rgb::new(0xff, 0x00, 0xff),
    Rgb::new(0x00, 0xff, 0xff),
    Rgb::new(0xff, 0xff, 0xff),
];

const CUBE_LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];

lazy_static! {
    static ref PALETTE: [Rgb; 256] = {
        let mut palette = [Rgb::default(); 256];
        palette[..16].copy_from_slice(&ANSI_16);
        for i in 16..232usize {
            let n = i - 16;
            palette[i] = Rgb::new(
                CUBE_LEVELS[n / 36],
                CUBE_LEVELS[(n % 36) / 6],
                CUBE_LEVELS[n % 6],
            );
        }
        for i in 232..256usize {
            let shade = 8 + (i - 232) as u8 * 10;
            palette[i] = Rgb::new(shade, shade, shade);
        }
        palette
    };
}

impl Rgb {
    /// Create a color from its components.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// xterm 256-color palette entry.
    pub fn from_palette(index: u8) -> Self {
        PALETTE[index as usize]
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = String;

    /// Strict parse of the canonical six-digit form (an optional `#` is accepted).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 {
            return Err(format!("expected 6 hex digits, got '{s}'"));
        }
        parse_hex(hex).ok_or_else(|| format!("invalid hex color '{s}'"))
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

impl JsonSchema for Rgb {
    fn schema_name() -> Cow<'static, str> {
        "Rgb".into()
    }

    fn json_schema(_generator: &mut SchemaGenerator) -> Schema {
        json_schema!({
            "type": "string",
            "pattern": "^[0-9a-f]{6}$",
            "description": "Lower-case RGB hex color without '#'"
        })
    }
}

impl Color {
    /// Resolve to a canonical color.
    ///
    /// Bold foregrounds among the 8 normal named colors become bright. Palette
    /// indices are taken literally, without the bold rule.
    pub fn resolve(self, bold: bool, is_fg: bool) -> Rgb {
        match self {
            Color::Default => default_for(is_fg),
            Color::Indexed(index) => Rgb::from_palette(index),
            Color::Rgb { r, g, b } => Rgb::new(r, g, b),
            named => {
                let named = if bold && is_fg { named.brightened() } else { named };
                named
                    .ansi_index()
                    .map(Rgb::from_palette)
                    .unwrap_or_else(|| default_for(is_fg))
            }
        }
    }
}

/// Normalize a raw color string into a canonical color.
///
/// Accepted shapes:
/// - `""` or `"default"` (any case): the default for the channel
/// - one of the 16 ANSI names (`red`, `brightred`, `bright_red`, `brown` for yellow, ...)
/// - a decimal palette index `0..=255`
/// - hex with optional `#`: 3 digits, 6 digits, 12 digits (16 bits per
///   channel, high byte kept), or any other length above 6 (first 6 digits)
///
/// Anything else resolves to the default for the channel.
pub fn resolve_color(raw: &str, bold: bool, is_fg: bool) -> Rgb {
    parse_color(raw, bold, is_fg).unwrap_or_else(|| default_for(is_fg))
}

fn default_for(is_fg: bool) -> Rgb {
    if is_fg {
        DEFAULT_FG
    } else {
        DEFAULT_BG
    }
}

fn parse_color(raw: &str, bold: bool, is_fg: bool) -> Option<Rgb> {
    let s = raw.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("default") {
        return None;
    }

    if let Some(named) = named_color(s) {
        return Some(named.resolve(bold, is_fg));
    }

    if s.len() <= 3 && s.bytes().all(|b| b.is_ascii_digit()) {
        return s
            .parse::<u16>()
            .ok()
            .and_then(|i| u8::try_from(i).ok())
            .map(Rgb::from_palette);
    }

    let hex = s.strip_prefix('#').unwrap_or(s);
    match hex.len() {
        3 => {
            let doubled: String = hex.chars().flat_map(|c| [c, c]).collect();
            parse_hex(&doubled)
        }
        6 => parse_hex(hex),
        12 => {
            if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                return None;
            }
            let high_bytes = format!("{}{}{}", &hex[0..2], &hex[4..6], &hex[8..10]);
            parse_hex(&high_bytes)
        }
        n if n > 6 => hex.get(..6).and_then(parse_hex),
        _ => None,
    }
}

fn named_color(s: &str) -> Option<Color> {
    let lower = s.to_ascii_lowercase();
    let (bright, base) = match lower.strip_prefix("bright") {
        Some(rest) => (true, rest.trim_start_matches(&['_', '-', ' '][..])),
        None => (false, lower.as_str()),
    };
    let color = match base {
        "black" => Color::Black,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" | "brown" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" => Color::Magenta,
        "cyan" => Color::Cyan,
        "white" => Color::White,
        _ => return None,
    };
    Some(if bright { color.brightened() } else { color })
}

fn parse_hex(hex: &str) -> Option<Rgb> {
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(Rgb::new(channel(0)?, channel(2)?, channel(4)?))
}
