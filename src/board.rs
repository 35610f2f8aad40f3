use crate::error::OthelloError;
use crate::types::{Cell, Color, Position, Score};

pub const BOARD_SIZE: usize = 8;
pub const NUM_SQUARES: usize = BOARD_SIZE * BOARD_SIZE;

/// 8x8 Othello board stored as two bitboards.
///
/// Square `(x, y)` lives at bit `y * 8 + x`. The two masks never overlap, so
/// every square is exactly one of empty, black or white.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoardState {
    black: u64,
    white: u64,
}

impl BoardState {
    /// Creates the starting layout:
    /// (3,3)=black, (4,4)=black, (3,4)=white, (4,3)=white.
    pub fn new() -> Self {
        Self {
            black: bit(Position::new(3, 3).index()) | bit(Position::new(4, 4).index()),
            white: bit(Position::new(3, 4).index()) | bit(Position::new(4, 3).index()),
        }
    }

    /// A board with no discs at all.
    pub fn empty() -> Self {
        Self { black: 0, white: 0 }
    }

    /// Overwrites all 64 squares with the starting layout.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn get(&self, x: u8, y: u8) -> Result<Cell, OthelloError> {
        let pos = checked(x, y)?;
        Ok(self.cell_at(pos.index()))
    }

    /// Direct write without any legality check.
    pub fn set(&mut self, x: u8, y: u8, cell: Cell) -> Result<(), OthelloError> {
        let square = bit(checked(x, y)?.index());
        self.black &= !square;
        self.white &= !square;
        match cell {
            Cell::Black => self.black |= square,
            Cell::White => self.white |= square,
            Cell::Empty => {}
        }
        Ok(())
    }

    /// Counts discs per side.
    pub fn score(&self) -> Score {
        Score {
            black: self.black.count_ones() as u8,
            white: self.white.count_ones() as u8,
        }
    }

    /// Returns the number of empty squares.
    pub fn empty_count(&self) -> u8 {
        NUM_SQUARES as u8 - (self.black | self.white).count_ones() as u8
    }

    /// Numeric view indexed `[y][x]`: black=+1, white=-1, empty=0.
    pub fn to_matrix(&self) -> [[i8; BOARD_SIZE]; BOARD_SIZE] {
        let mut matrix = [[0i8; BOARD_SIZE]; BOARD_SIZE];
        for (y, row) in matrix.iter_mut().enumerate() {
            for (x, value) in row.iter_mut().enumerate() {
                *value = self.cell_at(y * BOARD_SIZE + x).value();
            }
        }
        matrix
    }

    /// Inverse of [`BoardState::to_matrix`].
    pub fn from_matrix(matrix: &[[i8; BOARD_SIZE]; BOARD_SIZE]) -> Result<Self, OthelloError> {
        let mut board = Self::empty();
        for (y, row) in matrix.iter().enumerate() {
            for (x, &value) in row.iter().enumerate() {
                let square = bit(y * BOARD_SIZE + x);
                match Cell::from_value(value) {
                    Some(Cell::Black) => board.black |= square,
                    Some(Cell::White) => board.white |= square,
                    Some(Cell::Empty) => {}
                    None => {
                        return Err(OthelloError::InvalidMatrixValue {
                            row: y,
                            col: x,
                            value,
                        });
                    }
                }
            }
        }
        Ok(board)
    }

    /// Flattened `to_matrix` as the 64-element vector fed to learning agents.
    pub fn observation(&self) -> [f32; NUM_SQUARES] {
        let mut obs = [0f32; NUM_SQUARES];
        for (pos, value) in obs.iter_mut().enumerate() {
            *value = f32::from(self.cell_at(pos).value());
        }
        obs
    }

    pub(crate) fn cell_at(&self, pos: usize) -> Cell {
        let square = bit(pos);
        if (self.black & square) != 0 {
            Cell::Black
        } else if (self.white & square) != 0 {
            Cell::White
        } else {
            Cell::Empty
        }
    }

    /// Bitboard of the discs owned by `color`.
    pub(crate) fn discs(&self, color: Color) -> u64 {
        match color {
            Color::Black => self.black,
            Color::White => self.white,
        }
    }

    /// Puts a disc at `pos` and flips every square in `flips`.
    /// Callers must have validated the move first.
    pub(crate) fn place(&mut self, pos: usize, color: Color, flips: u64) {
        let gained = bit(pos) | flips;
        match color {
            Color::Black => {
                self.black |= gained;
                self.white &= !flips;
            }
            Color::White => {
                self.white |= gained;
                self.black &= !flips;
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn from_bitboards(black: u64, white: u64) -> Self {
        assert_eq!(black & white, 0, "bitboards overlap");
        Self { black, white }
    }
}

impl Default for BoardState {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn bit(pos: usize) -> u64 {
    if pos < NUM_SQUARES { 1u64 << pos } else { 0 }
}

fn checked(x: u8, y: u8) -> Result<Position, OthelloError> {
    let pos = Position::new(x, y);
    if pos.is_on_board() {
        Ok(pos)
    } else {
        Err(OthelloError::OutOfRange { x, y })
    }
}
