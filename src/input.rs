//! Parsing of console input. Coordinates are typed column then row, each
//! 1-8, so `81` is the top-right corner.

use crate::error::ParseError;
use crate::types::{Color, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Move(Position),
    ToggleHints,
    Quit,
}

pub fn parse_command(line: &str) -> Result<Command, ParseError> {
    let text = line.trim().to_lowercase();
    match text.as_str() {
        "quit" => Ok(Command::Quit),
        "hints" => Ok(Command::ToggleHints),
        _ => parse_position(&text).map(Command::Move),
    }
}

/// Converts two ASCII digits 1-8 into a zero-based position.
pub fn parse_position(text: &str) -> Result<Position, ParseError> {
    match text.as_bytes() {
        &[col @ b'1'..=b'8', row @ b'1'..=b'8'] => Ok(Position::new(col - b'1', row - b'1')),
        _ => Err(ParseError::BadCoordinate(text.to_string())),
    }
}

/// Inverse of [`parse_position`].
pub fn format_position(pos: Position) -> String {
    format!("{}{}", pos.x + 1, pos.y + 1)
}

/// `X` plays black and moves first, `O` plays white.
pub fn parse_tile(line: &str) -> Result<Color, ParseError> {
    match line.trim().to_uppercase().as_str() {
        "X" => Ok(Color::Black),
        "O" => Ok(Color::White),
        other => Err(ParseError::BadTile(other.to_string())),
    }
}
