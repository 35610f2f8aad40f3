//! JavaScript bindings.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::config::EnvConfig;
use crate::game::OthelloEnv;
use crate::render;
use crate::types::{Color, Position, Snapshot};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StepReport {
    reward: f32,
    terminal: bool,
    accepted: bool,
    opponent_moves: Vec<Position>,
    passes: Vec<Color>,
    state: Snapshot,
}

/// An environment against the greedy built-in opponent.
#[wasm_bindgen]
pub struct OthelloHandle {
    env: OthelloEnv,
}

#[wasm_bindgen]
impl OthelloHandle {
    #[wasm_bindgen(constructor)]
    pub fn new(agent_is_black: bool, seed: Option<u32>) -> Result<OthelloHandle, JsError> {
        let config = EnvConfig {
            agent_color: if agent_is_black {
                Color::Black
            } else {
                Color::White
            },
            seed: seed.map(u64::from),
            ..EnvConfig::default()
        };
        let mut env = OthelloEnv::new(&config);
        env.reset().map_err(to_js_error)?;
        Ok(OthelloHandle { env })
    }

    pub fn reset(&mut self) -> Result<JsValue, JsError> {
        self.env.reset().map_err(to_js_error)?;
        to_js(&self.env.snapshot())
    }

    pub fn step(&mut self, x: u8, y: u8) -> Result<JsValue, JsError> {
        let step = self.env.step(Position::new(x, y)).map_err(to_js_error)?;
        to_js(&StepReport {
            reward: step.reward,
            terminal: step.terminal,
            accepted: step.accepted,
            opponent_moves: step.opponent_moves,
            passes: step.passes,
            state: self.env.snapshot(),
        })
    }

    #[wasm_bindgen(js_name = legalMoves)]
    pub fn legal_moves(&self) -> Result<JsValue, JsError> {
        let moves = match self.env.turn() {
            Some(color) => self.env.legal_moves_for(color),
            None => Vec::new(),
        };
        to_js(&moves)
    }

    pub fn state(&self) -> Result<JsValue, JsError> {
        to_js(&self.env.snapshot())
    }

    pub fn observation(&self) -> Vec<f32> {
        self.env.observation().to_vec()
    }

    pub fn render(&self, hints: bool) -> String {
        if hints {
            render::render_with_hints(self.env.board(), self.env.agent_color())
        } else {
            render::render(self.env.board())
        }
    }

    #[wasm_bindgen(js_name = isTerminal)]
    pub fn is_terminal(&self) -> bool {
        self.env.is_terminal()
    }
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsError> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsError::new(&e.to_string()))
}

fn to_js_error(err: crate::error::OthelloError) -> JsError {
    JsError::new(&err.to_string())
}
