use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};
use serde::{Deserialize, Serialize};

use crate::board::BoardState;
use crate::rules;
use crate::types::{Color, Position};

/// Chooses a move for `color` on `board`. Returns `None` only when `color`
/// has no legal move.
pub trait MoveSelector: Send {
    fn select_move(&mut self, board: &BoardState, color: Color) -> Option<Position>;

    fn name(&self) -> &str;
}

impl<S: MoveSelector + ?Sized> MoveSelector for Box<S> {
    fn select_move(&mut self, board: &BoardState, color: Color) -> Option<Position> {
        (**self).select_move(board, color)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FirstLegalMoveSelector;

impl MoveSelector for FirstLegalMoveSelector {
    fn select_move(&mut self, board: &BoardState, color: Color) -> Option<Position> {
        rules::legal_moves(board, color).first().copied()
    }

    fn name(&self) -> &str {
        "first-legal"
    }
}

/// Picks uniformly among legal moves.
pub struct RandomMoveSelector {
    rng: StdRng,
}

impl RandomMoveSelector {
    pub fn new(seed: Option<u64>) -> Self {
        Self { rng: rng_from(seed) }
    }
}

impl MoveSelector for RandomMoveSelector {
    fn select_move(&mut self, board: &BoardState, color: Color) -> Option<Position> {
        rules::legal_moves(board, color).choose(&mut self.rng).copied()
    }

    fn name(&self) -> &str {
        "random"
    }
}

/// Takes a corner when one is available, otherwise the move that leaves
/// `color` with the most discs after one ply. Ties go to the first move in a
/// shuffled order.
pub struct GreedyCornerSelector {
    rng: StdRng,
}

impl GreedyCornerSelector {
    pub fn new(seed: Option<u64>) -> Self {
        Self { rng: rng_from(seed) }
    }
}

impl MoveSelector for GreedyCornerSelector {
    fn select_move(&mut self, board: &BoardState, color: Color) -> Option<Position> {
        let mut moves = rules::legal_moves(board, color);
        moves.shuffle(&mut self.rng);

        if let Some(corner) = moves.iter().copied().find(|pos| pos.is_corner()) {
            return Some(corner);
        }

        let mut best: Option<(Position, u8)> = None;
        for pos in moves {
            let mut simulated = *board;
            if rules::apply_move(&mut simulated, color, pos.x, pos.y).is_err() {
                continue;
            }
            let discs = simulated.score().of(color);
            if best.is_none_or(|(_, best_discs)| discs > best_discs) {
                best = Some((pos, discs));
            }
        }
        best.map(|(pos, _)| pos)
    }

    fn name(&self) -> &str {
        "greedy"
    }
}

/// Built-in opponent choice as written in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpponentKind {
    Greedy,
    Random,
    FirstLegal,
    /// No built-in opponent: the environment is driven for both sides.
    #[serde(rename = "none")]
    Disabled,
}

impl OpponentKind {
    pub fn build(self, seed: Option<u64>) -> Option<Box<dyn MoveSelector>> {
        match self {
            OpponentKind::Greedy => Some(Box::new(GreedyCornerSelector::new(seed))),
            OpponentKind::Random => Some(Box::new(RandomMoveSelector::new(seed))),
            OpponentKind::FirstLegal => Some(Box::new(FirstLegalMoveSelector)),
            OpponentKind::Disabled => None,
        }
    }
}

fn rng_from(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}
