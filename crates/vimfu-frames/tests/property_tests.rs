//! Property-based tests for frame encoding and session dedup.

use proptest::prelude::*;

use vimfu_core::{Cell, CellAttributes, CellStyle, Color, Dimensions};
use vimfu_emulator::{Grid, ScreenSnapshot};
use vimfu_frames::{capture_frame, ActionDescriptor, Frame, SessionDocument};

fn color() -> impl Strategy<Value = Color> {
    prop_oneof![
        Just(Color::Default),
        (0u8..16).prop_map(|i| Color::from_ansi_index(i).unwrap_or(Color::Default)),
        any::<u8>().prop_map(Color::Indexed),
        (any::<u8>(), any::<u8>(), any::<u8>()).prop_map(|(r, g, b)| Color::Rgb { r, g, b }),
    ]
}

fn attrs() -> impl Strategy<Value = CellAttributes> {
    (any::<[bool; 6]>()).prop_map(|[bold, italic, underline, reverse, strikethrough, dim]| {
        CellAttributes {
            bold,
            dim,
            italic,
            underline,
            reverse,
            strikethrough,
            ..Default::default()
        }
    })
}

/// Printable or blank cells with arbitrary colors and flags.
fn cell() -> impl Strategy<Value = Cell> {
    (
        prop::char::range('!', '~'),
        prop::bool::weighted(0.3),
        color(),
        color(),
        attrs(),
    )
        .prop_map(|(c, blank, fg, bg, attrs)| {
            let character = if blank { ' ' } else { c };
            Cell::styled(character, fg, bg, attrs)
        })
}

fn arb_grid() -> impl Strategy<Value = Grid> {
    (1u16..6, 1u16..24).prop_flat_map(|(rows, cols)| {
        prop::collection::vec(cell(), (rows * cols) as usize).prop_map(move |cells| {
            let mut grid = Grid::new(Dimensions::new(rows, cols));
            for (i, cell) in cells.into_iter().enumerate() {
                let (row, col) = ((i / cols as usize) as u16, (i % cols as usize) as u16);
                if let Some(slot) = grid.cell_mut(row, col) {
                    *slot = cell;
                }
            }
            grid
        })
    })
}

fn frame_with_text(rows: &[&str], cursor_col: u16) -> Frame {
    let cols = rows.iter().map(|r| r.len()).max().unwrap_or(1).max(1) as u16;
    let mut grid = Grid::new(Dimensions::new(rows.len() as u16, cols));
    for (r, text) in rows.iter().enumerate() {
        for (c, ch) in text.chars().enumerate() {
            if let Some(slot) = grid.cell_mut(r as u16, c as u16) {
                slot.character = ch;
            }
        }
    }
    grid.move_to(0, cursor_col.min(cols - 1));
    capture_frame(&ScreenSnapshot::from_grid(&grid, 0))
}

proptest! {
    /// Runs cover each row exactly, and neighbouring runs always differ.
    #[test]
    fn runs_are_canonical(grid in arb_grid()) {
        let frame = capture_frame(&ScreenSnapshot::from_grid(&grid, 0));
        prop_assert_eq!(frame.lines.len(), frame.rows as usize);
        for line in &frame.lines {
            prop_assert!(line.runs_are_canonical(frame.cols));
        }
    }

    /// Rebuilding cells from runs gives back every character and style.
    #[test]
    fn frames_round_trip_to_cells(grid in arb_grid()) {
        let snapshot = ScreenSnapshot::from_grid(&grid, 0);
        let cells = capture_frame(&snapshot).cells();
        for (row, rebuilt) in snapshot.rows().zip(cells) {
            let expected: Vec<(char, CellStyle)> = row
                .iter()
                .map(|cell| (cell.visible_char(), cell.style()))
                .collect();
            prop_assert_eq!(rebuilt, expected);
        }
    }

    /// Frames survive JSON unchanged.
    #[test]
    fn frames_survive_json(grid in arb_grid()) {
        let frame = capture_frame(&ScreenSnapshot::from_grid(&grid, 0));
        let json = serde_json::to_string(&frame).unwrap();
        let back: Frame = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, frame);
    }

    /// A second dedup pass never changes anything.
    #[test]
    fn dedup_is_idempotent(screens in prop::collection::vec((0usize..3, 0u16..2), 0..20)) {
        let texts = ["aa", "ab", "bb"];
        let mut doc = SessionDocument::new("p", "", 1, 2);
        for (i, (text, col)) in screens.iter().enumerate() {
            let action = ActionDescriptor::new("keys", i.to_string());
            doc.push(frame_with_text(&[texts[*text]], *col), i as u64, action);
        }

        doc.dedup();
        let once = doc.clone();
        prop_assert_eq!(doc.dedup(), 0);
        prop_assert_eq!(&doc, &once);
        prop_assert!(doc
            .frames()
            .windows(2)
            .all(|pair| !pair[0].frame.same_screen(&pair[1].frame)));
    }

    /// Documents without neighbouring duplicates pass through untouched.
    #[test]
    fn dedup_leaves_distinct_frames_alone(count in 0usize..12) {
        let mut doc = SessionDocument::new("p", "", 1, 2);
        for i in 0..count {
            let text = if i % 2 == 0 { "ab" } else { "ba" };
            doc.push(frame_with_text(&[text], 0), i as u64, ActionDescriptor::new("keys", "x"));
        }
        let before = doc.clone();
        prop_assert_eq!(doc.dedup(), 0);
        prop_assert_eq!(doc, before);
    }
}
