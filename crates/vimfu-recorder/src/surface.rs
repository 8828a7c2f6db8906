//! Things the recorder can film.
//!
//! [`TerminalSurface`] paints a terminal screen with the 8x8 `font8x8`
//! glyphs doubled vertically into 8x16 cells. Colors come from
//! [`Cell::style`](vimfu_core::Cell::style), the same resolution frame
//! documents use.

use font8x8::{UnicodeFonts, BASIC_FONTS, BLOCK_FONTS, BOX_FONTS, LATIN_FONTS};
use image::{Rgba, RgbaImage};

use vimfu_core::{CellStyle, Dimensions, Result, Rgb, DEFAULT_BG};
use vimfu_emulator::{ScreenHandle, ScreenSnapshot};

/// Cell width in pixels.
pub const CELL_WIDTH: u32 = 8;

/// Cell height in pixels.
pub const CELL_HEIGHT: u32 = 16;

/// A source of video frames with a fixed size.
pub trait Surface: Send {
    /// Width and height in pixels; every grab has this size.
    fn size(&self) -> (u32, u32);

    /// Current image. Failures are retried by the caller on its next wake.
    fn grab(&mut self) -> Result<RgbaImage>;
}

/// A terminal screen rendered to pixels.
///
/// The image size is fixed from the screen size when the surface is
/// created; if the terminal is resized later the picture is clipped or
/// padded.
#[derive(Debug)]
pub struct TerminalSurface {
    screen: ScreenHandle,
    dimensions: Dimensions,
    last: Option<(u64, RgbaImage)>,
}

impl TerminalSurface {
    /// Surface for a host's screen.
    pub fn new(screen: ScreenHandle) -> Self {
        let dimensions = screen.snapshot().dimensions();
        Self {
            screen,
            dimensions,
            last: None,
        }
    }
}

impl Surface for TerminalSurface {
    fn size(&self) -> (u32, u32) {
        (
            self.dimensions.cols as u32 * CELL_WIDTH,
            self.dimensions.rows as u32 * CELL_HEIGHT,
        )
    }

    fn grab(&mut self) -> Result<RgbaImage> {
        let generation = self.screen.generation();
        if let Some((seen, image)) = &self.last {
            if *seen == generation {
                return Ok(image.clone());
            }
        }

        let snapshot = self.screen.snapshot();
        let (width, height) = self.size();
        let image = render_snapshot(&snapshot, width, height);
        self.last = Some((snapshot.generation(), image.clone()));
        Ok(image)
    }
}

fn pixel(color: Rgb) -> Rgba<u8> {
    Rgba([color.r, color.g, color.b, 255])
}

fn glyph(c: char) -> [u8; 8] {
    BASIC_FONTS
        .get(c)
        .or_else(|| LATIN_FONTS.get(c))
        .or_else(|| BOX_FONTS.get(c))
        .or_else(|| BLOCK_FONTS.get(c))
        .unwrap_or([0u8; 8])
}

/// Paint a snapshot into a `width`x`height` image.
pub fn render_snapshot(snapshot: &ScreenSnapshot, width: u32, height: u32) -> RgbaImage {
    let mut image = RgbaImage::from_pixel(width, height, pixel(DEFAULT_BG));
    let cursor = snapshot.cursor();

    for (row, cells) in snapshot.rows().enumerate() {
        let y = row as u32 * CELL_HEIGHT;
        if y >= height {
            break;
        }
        for (col, cell) in cells.iter().enumerate() {
            let x = col as u32 * CELL_WIDTH;
            if x >= width {
                break;
            }
            let mut style = cell.style();
            if cursor.visible && cursor.row as usize == row && cursor.col as usize == col {
                std::mem::swap(&mut style.fg, &mut style.bg);
            }
            draw_cell(&mut image, x, y, cell.visible_char(), &style);
        }
    }
    image
}

fn draw_cell(image: &mut RgbaImage, x: u32, y: u32, c: char, style: &CellStyle) {
    let fg = pixel(style.fg);
    let bg = pixel(style.bg);
    let bitmap = glyph(c);

    for dy in 0..CELL_HEIGHT {
        let py = y + dy;
        if py >= image.height() {
            break;
        }
        let bits = bitmap[(dy / 2) as usize];
        let rule = (style.underline && dy == CELL_HEIGHT - 2)
            || (style.strikethrough && dy == CELL_HEIGHT / 2);
        for dx in 0..CELL_WIDTH {
            let px = x + dx;
            if px >= image.width() {
                break;
            }
            // font8x8 stores the leftmost pixel in the lowest bit
            let lit = rule || (bits >> dx) & 1 == 1;
            image.put_pixel(px, py, if lit { fg } else { bg });
        }
    }
}
