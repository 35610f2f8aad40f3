//! Othello (Reversi) rules engine and step-based environment for
//! reinforcement-learning agents, with a console front end and JavaScript
//! bindings.

use wasm_bindgen::prelude::*;

pub mod board;
pub mod config;
pub mod error;
pub mod game;
pub mod input;
pub mod opponent;
pub mod render;
pub mod rules;
pub mod session;
pub mod types;
pub mod wasm;

pub use board::BoardState;
pub use error::OthelloError;
pub use game::{OthelloEnv, Phase, Step};
pub use rules::FlipSet;
pub use types::{Cell, Color, GameResult, Outcome, Position, Score};

#[wasm_bindgen]
pub fn wasm_ready() -> bool {
    true
}
