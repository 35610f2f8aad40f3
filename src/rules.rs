//! Move legality and flip computation.

use crate::board::{BOARD_SIZE, BoardState, bit};
use crate::error::OthelloError;
use crate::types::{Cell, Color, Position};

/// Walk order for flip scanning: S, SE, E, NE, N, NW, W, SW (y grows downward).
const DIRECTIONS: [(i32, i32); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

/// Opponent discs captured by a move, in direction order and nearest-first
/// within each direction. Never empty for a legal move.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FlipSet {
    cells: Vec<Position>,
    mask: u64,
}

impl FlipSet {
    pub fn positions(&self) -> &[Position] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.is_on_board() && (self.mask & bit(pos.index())) != 0
    }

    pub(crate) fn mask(&self) -> u64 {
        self.mask
    }

    fn extend(&mut self, line: &[Position]) {
        for &pos in line {
            self.mask |= bit(pos.index());
            self.cells.push(pos);
        }
    }
}

/// Computes the flip set for `color` playing at `(x, y)` without touching
/// the board.
pub fn evaluate(board: &BoardState, color: Color, x: u8, y: u8) -> Result<FlipSet, OthelloError> {
    let origin = Position::new(x, y);
    if !origin.is_on_board() {
        return Err(OthelloError::OutOfRange { x, y });
    }
    if board.cell_at(origin.index()) != Cell::Empty {
        return Err(OthelloError::InvalidMove { color, x, y });
    }

    let me = board.discs(color);
    let opp = board.discs(color.opponent());
    let mut flips = FlipSet::default();
    let mut line = Vec::with_capacity(BOARD_SIZE);

    for (dx, dy) in DIRECTIONS {
        line.clear();
        let mut cx = i32::from(x) + dx;
        let mut cy = i32::from(y) + dy;

        while in_bounds(cx, cy) {
            let pos = Position::new(cx as u8, cy as u8);
            let square = bit(pos.index());
            if (opp & square) != 0 {
                line.push(pos);
            } else {
                if (me & square) != 0 {
                    flips.extend(&line);
                }
                break;
            }
            cx += dx;
            cy += dy;
        }
    }

    if flips.is_empty() {
        Err(OthelloError::InvalidMove { color, x, y })
    } else {
        Ok(flips)
    }
}

pub fn is_legal(board: &BoardState, color: Color, x: u8, y: u8) -> bool {
    evaluate(board, color, x, y).is_ok()
}

/// All legal moves for `color`, row by row from the top-left corner.
pub fn legal_moves(board: &BoardState, color: Color) -> Vec<Position> {
    squares()
        .filter(|pos| is_legal(board, color, pos.x, pos.y))
        .collect()
}

pub fn has_legal_move(board: &BoardState, color: Color) -> bool {
    squares().any(|pos| is_legal(board, color, pos.x, pos.y))
}

/// True when neither side can move.
pub fn is_game_over(board: &BoardState) -> bool {
    !has_legal_move(board, Color::Black) && !has_legal_move(board, Color::White)
}

/// Validates and plays a move in place. On error the board is untouched.
pub fn apply_move(
    board: &mut BoardState,
    color: Color,
    x: u8,
    y: u8,
) -> Result<FlipSet, OthelloError> {
    let flips = evaluate(board, color, x, y)?;
    board.place(Position::new(x, y).index(), color, flips.mask());
    Ok(flips)
}

fn squares() -> impl Iterator<Item = Position> {
    (0..BOARD_SIZE * BOARD_SIZE).map(Position::from_index)
}

fn in_bounds(x: i32, y: i32) -> bool {
    (0..BOARD_SIZE as i32).contains(&x) && (0..BOARD_SIZE as i32).contains(&y)
}
