//! Fixed-width text rendering of a board.

use std::fmt;

use once_cell::sync::Lazy;

use crate::board::{BOARD_SIZE, BoardState};
use crate::rules;
use crate::types::{Cell, Color, Position};

pub const HINT_GLYPH: char = '.';

static COLUMN_LABELS: Lazy<String> = Lazy::new(|| {
    let mut line = String::from("   ");
    for col in 1..=BOARD_SIZE {
        line.push_str(&format!("  {col}  "));
    }
    line.trim_end().to_string()
});

static H_LINE: Lazy<String> = Lazy::new(|| format!("  +{}", "----+".repeat(BOARD_SIZE)));

pub fn glyph(cell: Cell) -> char {
    match cell {
        Cell::Black => 'X',
        Cell::White => 'O',
        Cell::Empty => ' ',
    }
}

/// Renders the board with column labels on top and row labels on the left,
/// both 1-based.
pub fn render(board: &BoardState) -> String {
    board.to_string()
}

/// Like [`render`], with every legal move for `color` marked by
/// [`HINT_GLYPH`].
pub fn render_with_hints(board: &BoardState, color: Color) -> String {
    Hinted {
        board,
        hints: rules::legal_moves(board, color),
    }
    .to_string()
}

struct Hinted<'a> {
    board: &'a BoardState,
    hints: Vec<Position>,
}

impl fmt::Display for Hinted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        draw(f, self.board, &self.hints)
    }
}

fn draw(out: &mut impl fmt::Write, board: &BoardState, hints: &[Position]) -> fmt::Result {
    writeln!(out, "{}", *COLUMN_LABELS)?;
    writeln!(out, "{}", *H_LINE)?;
    for y in 0..BOARD_SIZE {
        write!(out, "{} ", y + 1)?;
        for x in 0..BOARD_SIZE {
            let pos = Position::new(x as u8, y as u8);
            let mark = if hints.contains(&pos) {
                HINT_GLYPH
            } else {
                glyph(board.cell_at(pos.index()))
            };
            write!(out, "| {mark}  ")?;
        }
        writeln!(out, "|")?;
        writeln!(out, "{}", *H_LINE)?;
    }
    Ok(())
}

impl fmt::Display for BoardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        draw(f, self, &[])
    }
}
