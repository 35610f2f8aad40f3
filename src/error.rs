use std::path::PathBuf;

use crate::types::Color;

/// Errors raised by the board, the move validator and the environment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OthelloError {
    #[error("coordinate ({x}, {y}) is outside the 8x8 board")]
    OutOfRange { x: u8, y: u8 },

    #[error("{color} cannot play at ({x}, {y})")]
    InvalidMove { color: Color, x: u8, y: u8 },

    #[error("game is already over")]
    GameOver,

    #[error("matrix value {value} at row {row}, column {col} is not -1, 0 or 1")]
    InvalidMatrixValue { row: usize, col: usize, value: i8 },

    #[error("{color} selector returned no legal move")]
    NoMoveSelected { color: Color },
}

/// Errors from parsing textual commands.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("expected two digits 1-8 (column then row), got {0:?}")]
    BadCoordinate(String),

    #[error("expected X or O, got {0:?}")]
    BadTile(String),
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}

/// Errors that abort an episode.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Game(#[from] OthelloError),

    #[error("action source was rejected {count} times in a row")]
    TooManyRejections { count: usize },
}
