use std::fmt;

use serde::{Deserialize, Serialize};

/// Content of a single board square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Empty,
    Black,
    White,
}

impl Cell {
    /// Numeric encoding used for observations: black=+1, white=-1, empty=0.
    pub fn value(self) -> i8 {
        match self {
            Cell::Empty => 0,
            Cell::Black => 1,
            Cell::White => -1,
        }
    }

    pub fn from_value(value: i8) -> Option<Self> {
        match value {
            0 => Some(Cell::Empty),
            1 => Some(Cell::Black),
            -1 => Some(Cell::White),
            _ => None,
        }
    }

    pub fn color(self) -> Option<Color> {
        match self {
            Cell::Empty => None,
            Cell::Black => Some(Color::Black),
            Cell::White => Some(Color::White),
        }
    }
}

/// One of the two sides. Black moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Black,
    White,
}

impl Color {
    pub fn opponent(self) -> Self {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    pub fn cell(self) -> Cell {
        match self {
            Color::Black => Cell::Black,
            Color::White => Cell::White,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Color::Black => "Black",
            Color::White => "White",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A board coordinate. `x` is the column, `y` the row, both zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Position {
    pub x: u8,
    pub y: u8,
}

impl Position {
    pub const fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }

    pub fn is_on_board(self) -> bool {
        self.x < 8 && self.y < 8
    }

    /// True for the four corner squares.
    pub fn is_corner(self) -> bool {
        matches!(self.x, 0 | 7) && matches!(self.y, 0 | 7)
    }

    /// Row-major square index (`y * 8 + x`). Caller must check `is_on_board`.
    pub fn index(self) -> usize {
        self.y as usize * 8 + self.x as usize
    }

    pub fn from_index(index: usize) -> Self {
        Self::new((index % 8) as u8, (index / 8) as u8)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Disc counts per side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Score {
    pub black: u8,
    pub white: u8,
}

impl Score {
    pub fn of(&self, color: Color) -> u8 {
        match color {
            Color::Black => self.black,
            Color::White => self.white,
        }
    }
}

/// Result of a finished game seen from one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    Win,
    Tie,
    Loss,
}

impl Outcome {
    /// Terminal reward: +1 win, 0 tie, -1 loss.
    pub fn reward(self) -> f32 {
        match self {
            Outcome::Win => 1.0,
            Outcome::Tie => 0.0,
            Outcome::Loss => -1.0,
        }
    }
}

/// Final result after game over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GameResult {
    /// `None` on a tie.
    pub winner: Option<Color>,
    pub black_count: u8,
    pub white_count: u8,
}

impl GameResult {
    pub fn from_score(score: Score) -> Self {
        let winner = match score.black.cmp(&score.white) {
            std::cmp::Ordering::Greater => Some(Color::Black),
            std::cmp::Ordering::Less => Some(Color::White),
            std::cmp::Ordering::Equal => None,
        };
        Self {
            winner,
            black_count: score.black,
            white_count: score.white,
        }
    }

    pub fn outcome_for(&self, color: Color) -> Outcome {
        match self.winner {
            None => Outcome::Tie,
            Some(winner) if winner == color => Outcome::Win,
            Some(_) => Outcome::Loss,
        }
    }
}

/// Serializable view of an environment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    /// Row-major numeric board (black=+1, white=-1, empty=0).
    pub board: Vec<i8>,
    /// `None` once the game is over.
    pub current_player: Option<Color>,
    pub black_count: u8,
    pub white_count: u8,
    pub is_game_over: bool,
    /// Contract:
    /// - `true` when the last move left the other side without a move,
    ///   so the mover plays again.
    pub is_pass: bool,
    /// Cells flipped by the last move; empty right after reset.
    pub flipped: Vec<Position>,
}
