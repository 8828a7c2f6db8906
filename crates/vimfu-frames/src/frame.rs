//! Snapshot to frame encoding.
//!
//! A [`Frame`] stores every row as its full text plus run-length style
//! segments. Colors are resolved to canonical [`Rgb`] at capture time, and
//! reverse video is applied by swapping the resolved colors, so consumers
//! never need to know about SGR semantics.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use vimfu_core::{Cell, CellStyle, Rgb, DEFAULT_BG, DEFAULT_FG};
use vimfu_emulator::{CursorState, ScreenSnapshot};

fn is_false(value: &bool) -> bool {
    !*value
}

/// Horizontal span of cells sharing one style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Run {
    /// Number of cells covered
    pub n: usize,
    /// Foreground color
    pub fg: Rgb,
    /// Background color
    pub bg: Rgb,
    /// Bold
    #[serde(default, skip_serializing_if = "is_false")]
    pub b: bool,
    /// Italic
    #[serde(default, skip_serializing_if = "is_false")]
    pub i: bool,
    /// Underline
    #[serde(default, skip_serializing_if = "is_false")]
    pub u: bool,
    /// Strikethrough
    #[serde(default, skip_serializing_if = "is_false")]
    pub s: bool,
}

impl Run {
    fn open(style: CellStyle) -> Self {
        Self {
            n: 1,
            fg: style.fg,
            bg: style.bg,
            b: style.bold,
            i: style.italic,
            u: style.underline,
            s: style.strikethrough,
        }
    }

    /// Style shared by every cell of the run.
    pub fn style(&self) -> CellStyle {
        CellStyle {
            fg: self.fg,
            bg: self.bg,
            bold: self.b,
            italic: self.i,
            underline: self.u,
            strikethrough: self.s,
        }
    }
}

/// One encoded row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Line {
    /// Row text, exactly `cols` characters, untrimmed, concealed cells blank
    pub text: String,
    /// Style runs covering the row left to right
    pub runs: Vec<Run>,
}

impl Line {
    fn encode(cells: &[Cell]) -> Self {
        let mut text = String::with_capacity(cells.len());
        let mut runs: Vec<Run> = Vec::new();

        for cell in cells {
            text.push(cell.visible_char());
            let style = cell.style();
            match runs.last_mut() {
                Some(run) if run.style() == style => run.n += 1,
                _ => runs.push(Run::open(style)),
            }
        }

        Self { text, runs }
    }

    /// Per-cell characters and styles rebuilt from the runs.
    pub fn cells(&self) -> Vec<(char, CellStyle)> {
        self.runs
            .iter()
            .flat_map(|run| std::iter::repeat(run.style()).take(run.n))
            .zip(self.text.chars())
            .map(|(style, c)| (c, style))
            .collect()
    }

    /// Whether the runs cover exactly `cols` cells with no two neighbours alike.
    pub fn runs_are_canonical(&self, cols: u16) -> bool {
        let total: usize = self.runs.iter().map(|run| run.n).sum();
        total == cols as usize
            && self.text.chars().count() == cols as usize
            && self.runs.iter().all(|run| run.n > 0)
            && self.runs.windows(2).all(|pair| pair[0].style() != pair[1].style())
    }
}

/// One encoded screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    /// Rows on screen
    pub rows: u16,
    /// Columns on screen
    pub cols: u16,
    /// Cursor at capture time
    pub cursor: CursorState,
    /// Color used for the default foreground
    pub default_fg: Rgb,
    /// Color used for the default background
    pub default_bg: Rgb,
    /// One entry per row
    pub lines: Vec<Line>,
}

impl Frame {
    /// Per-cell characters and styles, row by row.
    pub fn cells(&self) -> Vec<Vec<(char, CellStyle)>> {
        self.lines.iter().map(Line::cells).collect()
    }

    /// Row texts, used to compare screens.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|line| line.text.as_str())
    }

    /// Whether two frames show the same text with the cursor in the same state.
    ///
    /// Colors are not compared.
    pub fn same_screen(&self, other: &Frame) -> bool {
        self.cursor == other.cursor && self.texts().eq(other.texts())
    }
}

/// Encode a snapshot.
pub fn capture_frame(snapshot: &ScreenSnapshot) -> Frame {
    let dimensions = snapshot.dimensions();
    Frame {
        rows: dimensions.rows,
        cols: dimensions.cols,
        cursor: snapshot.cursor(),
        default_fg: DEFAULT_FG,
        default_bg: DEFAULT_BG,
        lines: snapshot.rows().map(Line::encode).collect(),
    }
}
