//! ANSI/VT escape sequence parser using the VTE crate.
//!
//! Tokenizing is done by `vte`; this module only maps dispatched actions onto
//! [`Grid`] operations. The `vte` state machine is kept across calls to
//! [`Parser::process`] so a sequence split between two PTY reads still
//! parses as one.

use std::fmt;

use vte::{Params, Perform};

use vimfu_core::{CellAttributes, Color};

use crate::grid::Grid;

/// ANSI parser wrapping VTE state machine.
pub struct Parser {
    state: vte::Parser,
    performer: GridPerformer,
}

impl fmt::Debug for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("grid", &self.performer.grid)
            .finish_non_exhaustive()
    }
}

impl Parser {
    /// Create a new parser with the given grid.
    pub fn new(grid: Grid) -> Self {
        Self {
            state: vte::Parser::new(),
            performer: GridPerformer { grid },
        }
    }

    /// Get a reference to the grid.
    pub fn grid(&self) -> &Grid {
        &self.performer.grid
    }

    /// Get a mutable reference to the grid.
    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.performer.grid
    }

    /// Consume the parser and return the grid.
    pub fn into_grid(self) -> Grid {
        self.performer.grid
    }

    /// Process bytes through the VTE parser.
    ///
    /// Returns the number of bytes consumed.
    pub fn process(&mut self, bytes: &[u8]) -> usize {
        for byte in bytes {
            self.state.advance(&mut self.performer, *byte);
        }
        bytes.len()
    }
}

/// First value of the parameter at `index`, with 0 and absent meaning `default`.
fn arg(params: &Params, index: usize, default: u16) -> u16 {
    params
        .iter()
        .nth(index)
        .and_then(|p| p.first().copied())
        .filter(|&v| v != 0)
        .unwrap_or(default)
}

/// Selector parameter (ED/EL modes) where 0 is a real value.
fn mode(params: &Params) -> u16 {
    params
        .iter()
        .next()
        .and_then(|p| p.first().copied())
        .unwrap_or(0)
}

fn channel(value: u16) -> u8 {
    value.min(255) as u8
}

/// Decode the tail of an extended color (`5;n` or `2;r;g;b`).
///
/// Colon-separated subparameters arrive in `rest`; semicolon-separated ones
/// are pulled from `iter`.
fn extended_color<'a>(
    rest: &[u16],
    iter: &mut impl Iterator<Item = &'a [u16]>,
) -> Option<Color> {
    let mut values: Vec<u16> = rest.to_vec();
    let mut next = |values: &mut Vec<u16>, idx: usize| -> Option<u16> {
        while values.len() <= idx {
            values.push(*iter.next()?.first()?);
        }
        Some(values[idx])
    };

    match next(&mut values, 0)? {
        5 => next(&mut values, 1).map(|n| Color::Indexed(channel(n))),
        2 => {
            // Colon form may carry a color-space id: 38:2::r:g:b
            let offset = if rest.len() >= 5 { 2 } else { 1 };
            let r = next(&mut values, offset)?;
            let g = next(&mut values, offset + 1)?;
            let b = next(&mut values, offset + 2)?;
            Some(Color::Rgb {
                r: channel(r),
                g: channel(g),
                b: channel(b),
            })
        }
        _ => None,
    }
}

/// `vte` performer that applies actions to a grid.
#[derive(Debug)]
struct GridPerformer {
    grid: Grid,
}

impl GridPerformer {
    fn update_attrs(&mut self, f: impl FnOnce(&mut CellAttributes)) {
        let mut attrs = *self.grid.current_attrs();
        f(&mut attrs);
        self.grid.set_current_attrs(attrs);
    }

    fn move_relative(&mut self, rows: i32, cols: i32) {
        let pos = self.grid.cursor().position;
        let row = (pos.row as i32 + rows).clamp(0, u16::MAX as i32) as u16;
        let col = (pos.col as i32 + cols).clamp(0, u16::MAX as i32) as u16;
        self.grid.move_to(row, col);
    }

    /// Process SGR (Select Graphic Rendition) parameters.
    fn process_sgr(&mut self, params: &Params) {
        if params.is_empty() {
            self.grid.reset_pen();
            return;
        }

        let mut iter = params.iter();
        while let Some(param) = iter.next() {
            match param[0] {
                0 => self.grid.reset_pen(),
                1 => self.update_attrs(|a| a.bold = true),
                2 => self.update_attrs(|a| a.dim = true),
                3 => self.update_attrs(|a| a.italic = true),
                4 => self.update_attrs(|a| a.underline = true),
                5 | 6 => self.update_attrs(|a| a.blink = true),
                7 => self.update_attrs(|a| a.reverse = true),
                8 => self.update_attrs(|a| a.hidden = true),
                9 => self.update_attrs(|a| a.strikethrough = true),
                22 => self.update_attrs(|a| {
                    a.bold = false;
                    a.dim = false;
                }),
                23 => self.update_attrs(|a| a.italic = false),
                24 => self.update_attrs(|a| a.underline = false),
                25 => self.update_attrs(|a| a.blink = false),
                27 => self.update_attrs(|a| a.reverse = false),
                28 => self.update_attrs(|a| a.hidden = false),
                29 => self.update_attrs(|a| a.strikethrough = false),

                code @ 30..=37 => {
                    if let Some(color) = Color::from_ansi_index((code - 30) as u8) {
                        self.grid.set_current_fg(color);
                    }
                }
                39 => self.grid.set_current_fg(Color::Default),
                code @ 40..=47 => {
                    if let Some(color) = Color::from_ansi_index((code - 40) as u8) {
                        self.grid.set_current_bg(color);
                    }
                }
                49 => self.grid.set_current_bg(Color::Default),
                code @ 90..=97 => {
                    if let Some(color) = Color::from_ansi_index((code - 90 + 8) as u8) {
                        self.grid.set_current_fg(color);
                    }
                }
                code @ 100..=107 => {
                    if let Some(color) = Color::from_ansi_index((code - 100 + 8) as u8) {
                        self.grid.set_current_bg(color);
                    }
                }

                38 => {
                    if let Some(color) = extended_color(&param[1..], &mut iter) {
                        self.grid.set_current_fg(color);
                    }
                }
                48 => {
                    if let Some(color) = extended_color(&param[1..], &mut iter) {
                        self.grid.set_current_bg(color);
                    }
                }

                _ => {} // Ignore unknown SGR codes
            }
        }
    }

    /// DEC private mode set/reset (`CSI ? n h` / `CSI ? n l`).
    fn set_private_mode(&mut self, params: &Params, enable: bool) {
        for param in params.iter() {
            match param[0] {
                25 => self.grid.set_cursor_visible(enable),
                47 | 1047 => {
                    if enable {
                        self.grid.enter_alternate_screen(false);
                    } else {
                        self.grid.leave_alternate_screen(false);
                    }
                }
                1049 => {
                    if enable {
                        self.grid.enter_alternate_screen(true);
                    } else {
                        self.grid.leave_alternate_screen(true);
                    }
                }
                _ => {}
            }
        }
    }
}

impl Perform for GridPerformer {
    fn print(&mut self, c: char) {
        self.grid.put_char(c);
    }

    fn execute(&mut self, byte: u8) {
        match byte {
            0x08 => self.grid.backspace(),
            0x09 => self.grid.tab(),
            // LF, VT and FF all index
            0x0A..=0x0C => self.grid.linefeed(),
            0x0D => self.grid.carriage_return(),
            _ => {}
        }
    }

    fn csi_dispatch(&mut self, params: &Params, intermediates: &[u8], _ignore: bool, c: char) {
        match intermediates {
            [] => {}
            [b'?'] => {
                match c {
                    'h' => self.set_private_mode(params, true),
                    'l' => self.set_private_mode(params, false),
                    _ => {}
                }
                return;
            }
            _ => return,
        }

        let dims = self.grid.dimensions();
        match c {
            'A' => self.move_relative(-(arg(params, 0, 1) as i32), 0),
            'B' | 'e' => self.move_relative(arg(params, 0, 1) as i32, 0),
            'C' | 'a' => self.move_relative(0, arg(params, 0, 1) as i32),
            'D' => self.move_relative(0, -(arg(params, 0, 1) as i32)),
            'E' => {
                self.move_relative(arg(params, 0, 1) as i32, 0);
                self.grid.carriage_return();
            }
            'F' => {
                self.move_relative(-(arg(params, 0, 1) as i32), 0);
                self.grid.carriage_return();
            }
            'G' | '`' => {
                let row = self.grid.cursor().position.row;
                self.grid.move_to(row, arg(params, 0, 1) - 1);
            }
            'd' => {
                let col = self.grid.cursor().position.col;
                self.grid.move_to(arg(params, 0, 1) - 1, col);
            }
            'H' | 'f' => {
                self.grid
                    .move_to(arg(params, 0, 1) - 1, arg(params, 1, 1) - 1);
            }
            'J' => self.grid.erase_display(mode(params)),
            'K' => self.grid.erase_line(mode(params)),
            'L' => self.grid.insert_lines(arg(params, 0, 1)),
            'M' => self.grid.delete_lines(arg(params, 0, 1)),
            '@' => self.grid.insert_chars(arg(params, 0, 1)),
            'P' => self.grid.delete_chars(arg(params, 0, 1)),
            'X' => self.grid.erase_chars(arg(params, 0, 1)),
            'S' => self.grid.scroll_up(arg(params, 0, 1)),
            'T' => self.grid.scroll_down(arg(params, 0, 1)),
            'r' => {
                let top = arg(params, 0, 1) - 1;
                let bottom = arg(params, 1, dims.rows) - 1;
                self.grid.set_scroll_region(top, bottom);
            }
            'm' => self.process_sgr(params),
            's' => self.grid.save_cursor(),
            'u' => self.grid.restore_cursor(),
            _ => {} // Ignore unknown CSI sequences
        }
    }

    fn esc_dispatch(&mut self, intermediates: &[u8], _ignore: bool, byte: u8) {
        // Charset designations and the like carry intermediates; none matter here
        if !intermediates.is_empty() {
            return;
        }
        match byte {
            b'7' => self.grid.save_cursor(),
            b'8' => self.grid.restore_cursor(),
            b'D' => self.grid.linefeed(),
            b'E' => {
                self.grid.carriage_return();
                self.grid.linefeed();
            }
            b'M' => self.grid.reverse_index(),
            b'c' => self.grid.reset(),
            _ => {}
        }
    }
}
