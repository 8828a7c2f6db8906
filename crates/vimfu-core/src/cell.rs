//! Cell and source color types for the terminal grid.
//!
//! A [`Color`] is what the emulator saw on the wire (SGR parameters); it is
//! turned into a canonical [`Rgb`](crate::Rgb) only when a frame is captured
//! or a surface is rendered.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::color::Rgb;

/// Terminal color as set by SGR: default, 16 named ANSI colors, palette index, or RGB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    /// Default terminal color
    Default,

    /// ANSI Black (0)
    Black,
    /// ANSI Red (1)
    Red,
    /// ANSI Green (2)
    Green,
    /// ANSI Yellow (3)
    Yellow,
    /// ANSI Blue (4)
    Blue,
    /// ANSI Magenta (5)
    Magenta,
    /// ANSI Cyan (6)
    Cyan,
    /// ANSI White (7)
    White,

    /// Bright Black (8)
    BrightBlack,
    /// Bright Red (9)
    BrightRed,
    /// Bright Green (10)
    BrightGreen,
    /// Bright Yellow (11)
    BrightYellow,
    /// Bright Blue (12)
    BrightBlue,
    /// Bright Magenta (13)
    BrightMagenta,
    /// Bright Cyan (14)
    BrightCyan,
    /// Bright White (15)
    BrightWhite,

    /// 256-color palette index
    Indexed(u8),

    /// True color RGB (24-bit)
    Rgb {
        /// Red component
        r: u8,
        /// Green component
        g: u8,
        /// Blue component
        b: u8,
    },
}

const NAMED: [Color; 16] = [
    Color::Black,
    Color::Red,
    Color::Green,
    Color::Yellow,
    Color::Blue,
    Color::Magenta,
    Color::Cyan,
    Color::White,
    Color::BrightBlack,
    Color::BrightRed,
    Color::BrightGreen,
    Color::BrightYellow,
    Color::BrightBlue,
    Color::BrightMagenta,
    Color::BrightCyan,
    Color::BrightWhite,
];

impl Color {
    /// Named color for an ANSI index 0-15, `None` above that.
    pub fn from_ansi_index(index: u8) -> Option<Self> {
        NAMED.get(index as usize).copied()
    }

    /// ANSI index 0-15 of a named color.
    pub fn ansi_index(&self) -> Option<u8> {
        NAMED.iter().position(|c| c == self).map(|i| i as u8)
    }

    /// Bright counterpart of one of the 8 normal named colors.
    ///
    /// Every other color is returned unchanged.
    pub fn brightened(self) -> Self {
        match self.ansi_index() {
            Some(i) if i < 8 => NAMED[i as usize + 8],
            _ => self,
        }
    }
}

/// Text attributes for a terminal cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CellAttributes {
    /// Bold/bright text
    pub bold: bool,
    /// Dimmed text
    pub dim: bool,
    /// Italic text
    pub italic: bool,
    /// Underlined text
    pub underline: bool,
    /// Blinking text
    pub blink: bool,
    /// Reverse video (swap fg/bg)
    pub reverse: bool,
    /// Hidden text
    pub hidden: bool,
    /// Strikethrough text
    pub strikethrough: bool,
}

impl CellAttributes {
    /// Check if attributes are all default (no formatting).
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Create attributes with bold enabled.
    pub fn with_bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Create attributes with reverse video enabled.
    pub fn with_reverse(mut self) -> Self {
        self.reverse = true;
        self
    }

    /// Create attributes with underline enabled.
    pub fn with_underline(mut self) -> Self {
        self.underline = true;
        self
    }

    /// Create attributes with italic enabled.
    pub fn with_italic(mut self) -> Self {
        self.italic = true;
        self
    }

    /// Create attributes with strikethrough enabled.
    pub fn with_strikethrough(mut self) -> Self {
        self.strikethrough = true;
        self
    }
}

/// Single character cell in the terminal grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Unicode character (space if empty)
    pub character: char,
    /// Foreground color
    pub fg: Color,
    /// Background color
    pub bg: Color,
    /// Text attributes
    pub attrs: CellAttributes,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            character: ' ',
            fg: Color::Default,
            bg: Color::Default,
            attrs: CellAttributes::default(),
        }
    }
}

impl Cell {
    /// Create a new cell with a character and default styling.
    pub fn new(character: char) -> Self {
        Self {
            character,
            ..Default::default()
        }
    }

    /// Create a fully styled cell.
    pub fn styled(character: char, fg: Color, bg: Color, attrs: CellAttributes) -> Self {
        Self {
            character,
            fg,
            bg,
            attrs,
        }
    }

    /// Blank cell carrying a background color, as left behind by erase operations.
    pub fn blank_with_bg(bg: Color) -> Self {
        Self {
            bg,
            ..Default::default()
        }
    }

    /// Check if cell is empty (space with default attributes and colors).
    pub fn is_empty(&self) -> bool {
        self.character == ' '
            && self.attrs.is_default()
            && self.fg == Color::Default
            && self.bg == Color::Default
    }

    /// Character as shown on screen; concealed (SGR 8) cells show a blank.
    pub fn visible_char(&self) -> char {
        if self.attrs.hidden {
            ' '
        } else {
            self.character
        }
    }

    /// Resolved appearance: canonical colors with bold brightening and
    /// reverse video applied.
    pub fn style(&self) -> CellStyle {
        let attrs = self.attrs;
        let mut fg = self.fg.resolve(attrs.bold, true);
        let mut bg = self.bg.resolve(false, false);
        if attrs.reverse {
            std::mem::swap(&mut fg, &mut bg);
        }
        CellStyle {
            fg,
            bg,
            bold: attrs.bold,
            italic: attrs.italic,
            underline: attrs.underline,
            strikethrough: attrs.strikethrough,
        }
    }
}

/// How a cell looks once its colors are resolved.
///
/// Frame runs group cells by this value and the pixel renderer paints from
/// it, so both always agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellStyle {
    /// Foreground after bold brightening and reverse video
    pub fg: Rgb,
    /// Background after reverse video
    pub bg: Rgb,
    /// Bold
    pub bold: bool,
    /// Italic
    pub italic: bool,
    /// Underline
    pub underline: bool,
    /// Strikethrough
    pub strikethrough: bool,
}
