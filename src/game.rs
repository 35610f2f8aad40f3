use tracing::{debug, info, instrument};

use crate::board::{BoardState, NUM_SQUARES};
use crate::config::EnvConfig;
use crate::error::OthelloError;
use crate::opponent::MoveSelector;
use crate::render;
use crate::rules::{self, FlipSet};
use crate::types::{Color, GameResult, Position, Score, Snapshot};

/// Episode state: whose turn it is, or over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Active(Color),
    Terminal,
}

/// Result of [`OthelloEnv::step`].
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub reward: f32,
    pub board: BoardState,
    pub terminal: bool,
    /// `false` when the action was illegal and nothing changed.
    pub accepted: bool,
    /// Moves played by the built-in opponent during the step.
    pub opponent_moves: Vec<Position>,
    /// Sides that had no legal move and were skipped, in order.
    pub passes: Vec<Color>,
}

/// State restored when a step fails part way through.
struct Checkpoint {
    board: BoardState,
    phase: Phase,
    is_pass: bool,
    flipped: Vec<Position>,
}

/// Step-based Othello environment.
///
/// With an opponent selector the environment plays the non-agent side
/// itself, so every call to [`OthelloEnv::step`] is an agent move. Without
/// one, `step` acts for whichever side is to move.
pub struct OthelloEnv {
    board: BoardState,
    phase: Phase,
    agent_color: Color,
    illegal_move_penalty: f32,
    show_steps: bool,
    is_pass: bool,
    flipped: Vec<Position>,
    opponent: Option<Box<dyn MoveSelector>>,
}

impl OthelloEnv {
    /// Builds the environment with the opponent named in `config`.
    pub fn new(config: &EnvConfig) -> Self {
        Self::with_opponent(config, config.opponent.build(config.seed))
    }

    pub fn with_opponent(config: &EnvConfig, opponent: Option<Box<dyn MoveSelector>>) -> Self {
        Self {
            board: BoardState::new(),
            phase: Phase::Active(Color::Black),
            agent_color: config.agent_color,
            illegal_move_penalty: config.illegal_move_penalty,
            show_steps: config.show_steps,
            is_pass: false,
            flipped: Vec::new(),
            opponent,
        }
    }

    /// Starts a new episode. When the opponent moves first its opening move
    /// is played before returning.
    pub fn reset(&mut self) -> Result<BoardState, OthelloError> {
        self.board.reset();
        self.phase = Phase::Active(Color::Black);
        self.is_pass = false;
        self.flipped.clear();
        self.play_opponent(&mut Vec::new())?;
        Ok(self.board)
    }

    /// Plays `action` for the side to move.
    ///
    /// An illegal action is answered with the configured penalty and leaves
    /// the board and turn untouched. Coordinates off the board are an error.
    /// On any error the environment is left as it was before the call.
    #[instrument(level = "debug", skip(self), fields(agent = %self.agent_color))]
    pub fn step(&mut self, action: Position) -> Result<Step, OthelloError> {
        let saved = self.checkpoint();
        let step = self.try_step(action);
        if let Err(err) = &step {
            debug!(%err, "step failed, state restored");
            self.restore(saved);
        }
        step
    }

    fn try_step(&mut self, action: Position) -> Result<Step, OthelloError> {
        let mut passes = Vec::new();
        let mut opponent_moves = self.play_opponent(&mut passes)?;
        let Phase::Active(color) = self.phase else {
            return Err(OthelloError::GameOver);
        };

        let flips = match rules::evaluate(&self.board, color, action.x, action.y) {
            Ok(flips) => flips,
            Err(OthelloError::InvalidMove { .. }) => {
                debug!(%color, %action, "rejected illegal move");
                return Ok(Step {
                    reward: self.illegal_move_penalty,
                    board: self.board,
                    terminal: false,
                    accepted: false,
                    opponent_moves,
                    passes,
                });
            }
            Err(err) => return Err(err),
        };

        passes.extend(self.commit(color, action, &flips));
        opponent_moves.extend(self.play_opponent(&mut passes)?);

        if self.show_steps {
            info!("board after {color} {action}:\n{}", render::render(&self.board));
        }

        let reward = match self.result() {
            Some(result) => result.outcome_for(self.agent_color).reward(),
            None => 0.0,
        };
        debug!(reward, terminal = self.is_terminal(), "step");

        Ok(Step {
            reward,
            board: self.board,
            terminal: self.is_terminal(),
            accepted: true,
            opponent_moves,
            passes,
        })
    }

    /// Installs an arbitrary position with `to_move` nominally on turn, then
    /// applies the pass and game-over rules to it.
    pub fn load_position(&mut self, board: BoardState, to_move: Color) -> Phase {
        self.board = board;
        self.flipped.clear();
        self.resolve_turn(to_move);
        self.phase
    }

    pub fn legal_moves_for(&self, color: Color) -> Vec<Position> {
        rules::legal_moves(&self.board, color)
    }

    pub fn board(&self) -> &BoardState {
        &self.board
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Side to move, `None` once the game is over.
    pub fn turn(&self) -> Option<Color> {
        match self.phase {
            Phase::Active(color) => Some(color),
            Phase::Terminal => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.phase == Phase::Terminal
    }

    pub fn agent_color(&self) -> Color {
        self.agent_color
    }

    /// Call between episodes, before [`OthelloEnv::reset`].
    pub fn set_agent_color(&mut self, color: Color) {
        self.agent_color = color;
    }

    pub fn has_opponent(&self) -> bool {
        self.opponent.is_some()
    }

    pub fn score(&self) -> Score {
        self.board.score()
    }

    pub fn observation(&self) -> [f32; NUM_SQUARES] {
        self.board.observation()
    }

    pub fn is_pass(&self) -> bool {
        self.is_pass
    }

    pub fn flipped(&self) -> &[Position] {
        &self.flipped
    }

    pub fn result(&self) -> Option<GameResult> {
        self.is_terminal()
            .then(|| GameResult::from_score(self.board.score()))
    }

    pub fn snapshot(&self) -> Snapshot {
        let score = self.board.score();
        Snapshot {
            board: self.board.to_matrix().iter().flatten().copied().collect(),
            current_player: self.turn(),
            black_count: score.black,
            white_count: score.white,
            is_game_over: self.is_terminal(),
            is_pass: self.is_pass,
            flipped: self.flipped.clone(),
        }
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            board: self.board,
            phase: self.phase,
            is_pass: self.is_pass,
            flipped: self.flipped.clone(),
        }
    }

    fn restore(&mut self, saved: Checkpoint) {
        self.board = saved.board;
        self.phase = saved.phase;
        self.is_pass = saved.is_pass;
        self.flipped = saved.flipped;
    }

    /// Lets the built-in opponent move while it is on turn. Skipped sides
    /// are appended to `passes`.
    fn play_opponent(&mut self, passes: &mut Vec<Color>) -> Result<Vec<Position>, OthelloError> {
        let mut played = Vec::new();
        while let Phase::Active(color) = self.phase {
            if color == self.agent_color {
                break;
            }
            let selected = match self.opponent.as_mut() {
                Some(opponent) => opponent.select_move(&self.board, color),
                None => break,
            };
            let pos = selected.ok_or(OthelloError::NoMoveSelected { color })?;
            let flips = rules::evaluate(&self.board, color, pos.x, pos.y)
                .map_err(|_| OthelloError::NoMoveSelected { color })?;
            passes.extend(self.commit(color, pos, &flips));
            played.push(pos);
        }
        Ok(played)
    }

    /// Returns the side that had to pass after the move, if any.
    fn commit(&mut self, color: Color, pos: Position, flips: &FlipSet) -> Option<Color> {
        self.board.place(pos.index(), color, flips.mask());
        self.flipped = flips.positions().to_vec();
        self.resolve_turn(color.opponent());
        self.is_pass.then(|| color.opponent())
    }

    fn resolve_turn(&mut self, preferred: Color) {
        if rules::has_legal_move(&self.board, preferred) {
            self.phase = Phase::Active(preferred);
            self.is_pass = false;
        } else if rules::has_legal_move(&self.board, preferred.opponent()) {
            debug!(passing = %preferred, "no legal move, turn passes");
            self.phase = Phase::Active(preferred.opponent());
            self.is_pass = true;
        } else {
            let score = self.board.score();
            info!(black = score.black, white = score.white, "game over");
            self.phase = Phase::Terminal;
            self.is_pass = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opponent::FirstLegalMoveSelector;
    use crate::types::Cell;

    const FULL_BOARD: u64 = u64::MAX;

    struct FixedMoveSelector {
        mv: Position,
    }

    impl MoveSelector for FixedMoveSelector {
        fn select_move(&mut self, _board: &BoardState, _color: Color) -> Option<Position> {
            Some(self.mv)
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    /// `X` black, `O` white, `.` empty; first row is y = 0.
    fn from_rows(rows: [&str; 8]) -> BoardState {
        let mut board = BoardState::empty();
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let cell = match ch {
                    'X' => Cell::Black,
                    'O' => Cell::White,
                    _ => Cell::Empty,
                };
                board.set(x as u8, y as u8, cell).unwrap();
            }
        }
        board
    }

    fn bit(x: u8, y: u8) -> u64 {
        1u64 << Position::new(x, y).index()
    }

    fn two_player() -> OthelloEnv {
        OthelloEnv::with_opponent(&EnvConfig::default(), None)
    }

    fn vs_first_legal(agent_color: Color) -> OthelloEnv {
        let config = EnvConfig {
            agent_color,
            ..EnvConfig::default()
        };
        OthelloEnv::with_opponent(&config, Some(Box::new(FirstLegalMoveSelector)))
    }

    #[test]
    fn initial_state_is_correct() {
        let mut env = two_player();
        env.reset().unwrap();
        let state = env.snapshot();

        assert_eq!(state.current_player, Some(Color::Black));
        assert_eq!(state.black_count, 2);
        assert_eq!(state.white_count, 2);
        assert!(!state.is_game_over);
        assert!(!state.is_pass);
        assert!(state.flipped.is_empty());
        assert_eq!(env.legal_moves_for(Color::Black).len(), 4);
    }

    #[test]
    fn t02_illegal_step_returns_penalty_and_changes_nothing() {
        let mut env = two_player();
        env.reset().unwrap();
        let before = *env.board();

        let step = env.step(Position::new(0, 0)).unwrap();

        assert_eq!(step.reward, -10.0);
        assert!(!step.accepted);
        assert!(!step.terminal);
        assert_eq!(step.board, before);
        assert_eq!(*env.board(), before);
        assert_eq!(env.turn(), Some(Color::Black));
    }

    #[test]
    fn out_of_range_step_is_an_error() {
        let mut env = two_player();
        env.reset().unwrap();

        assert_eq!(
            env.step(Position::new(9, 1)),
            Err(OthelloError::OutOfRange { x: 9, y: 1 })
        );
        assert_eq!(env.turn(), Some(Color::Black));
    }

    #[test]
    fn legal_step_flips_and_passes_turn() {
        let mut env = two_player();
        env.reset().unwrap();

        let step = env.step(Position::new(3, 5)).unwrap();

        assert!(step.accepted);
        assert_eq!(step.reward, 0.0);
        assert_eq!(step.board.score(), Score { black: 4, white: 1 });
        assert_eq!(env.flipped(), &[Position::new(3, 4)]);
        assert_eq!(env.turn(), Some(Color::White));
        assert!(step.opponent_moves.is_empty());
    }

    #[test]
    fn t03_turn_skip_reassigns_side_without_action() {
        let mut env = two_player();
        // Black at (0,1) only: black cannot move, white can take (0,0).
        let black = bit(0, 1);
        let white = FULL_BOARD ^ bit(0, 0) ^ black;

        let phase = env.load_position(BoardState::from_bitboards(black, white), Color::Black);

        assert_eq!(phase, Phase::Active(Color::White));
        assert!(env.is_pass());
        assert!(env.legal_moves_for(Color::Black).is_empty());
    }

    #[test]
    fn t04_both_sides_stuck_is_terminal_regardless_of_turn() {
        let mut env = two_player();
        let board = BoardState::from_bitboards(FULL_BOARD ^ bit(0, 0), 0);

        for to_move in [Color::Black, Color::White] {
            assert_eq!(env.load_position(board, to_move), Phase::Terminal);
            assert!(env.is_terminal());
            assert_eq!(env.step(Position::new(0, 0)), Err(OthelloError::GameOver));
        }
    }

    #[test]
    fn t05_final_move_ends_game_with_terminal_reward() {
        let mut env = two_player();
        let black = bit(0, 1);
        let white = FULL_BOARD ^ bit(0, 0) ^ black;
        env.load_position(BoardState::from_bitboards(black, white), Color::White);

        let step = env.step(Position::new(0, 0)).unwrap();

        // Agent is black and loses 0-64.
        assert!(step.terminal);
        assert_eq!(step.reward, -1.0);
        assert_eq!(env.result().unwrap().white_count, 64);
        assert_eq!(env.flipped(), &[Position::new(0, 1)]);
    }

    #[test]
    fn mover_plays_again_after_opponent_pass() {
        // White can never capture discs pinned to the top and bottom edges.
        let mut board = BoardState::empty();
        board.set(0, 0, Cell::Black).unwrap();
        board.set(1, 0, Cell::Black).unwrap();
        board.set(2, 0, Cell::White).unwrap();
        board.set(0, 7, Cell::Black).unwrap();
        board.set(1, 7, Cell::White).unwrap();
        let mut env = two_player();
        assert_eq!(env.load_position(board, Color::Black), Phase::Active(Color::Black));
        assert!(!env.is_pass());

        let step = env.step(Position::new(3, 0)).unwrap();

        assert_eq!(step.passes, vec![Color::White]);
        assert!(env.legal_moves_for(Color::White).is_empty());
        assert_eq!(env.score().white, 1);
        assert_eq!(env.turn(), Some(Color::Black));
        assert!(env.is_pass());
        assert_eq!(env.snapshot().current_player, Some(Color::Black));
    }

    #[test]
    fn tie_gives_zero_reward() {
        // Black takes (0,0) flipping only (1,0); board ends full at 32-32.
        let mut board = BoardState::empty();
        board.set(1, 0, Cell::White).unwrap();
        for (x, y) in [(2, 0), (0, 1), (1, 1)] {
            board.set(x, y, Cell::Black).unwrap();
        }
        let mut extra_black = 27;
        for index in 0..64 {
            let pos = Position::from_index(index);
            if board.get(pos.x, pos.y) != Ok(Cell::Empty) || pos == Position::new(0, 0) {
                continue;
            }
            let cell = if extra_black > 0 {
                extra_black -= 1;
                Cell::Black
            } else {
                Cell::White
            };
            board.set(pos.x, pos.y, cell).unwrap();
        }
        assert_eq!(board.score(), Score { black: 30, white: 33 });
        let mut env = two_player();
        env.load_position(board, Color::Black);

        let step = env.step(Position::new(0, 0)).unwrap();

        assert!(step.terminal);
        assert_eq!(step.board.score(), Score { black: 32, white: 32 });
        assert_eq!(step.reward, 0.0);
        assert_eq!(env.result().unwrap().winner, None);
    }

    #[test]
    fn built_in_opponent_replies_inside_step() {
        let mut env = vs_first_legal(Color::Black);
        env.reset().unwrap();

        let step = env.step(Position::new(3, 5)).unwrap();

        assert_eq!(step.opponent_moves.len(), 1);
        assert_eq!(env.turn(), Some(Color::Black));
        let score = env.score();
        assert_eq!(score.black as usize + score.white as usize, 6);
    }

    #[test]
    fn opponent_opens_when_agent_is_white() {
        let mut env = vs_first_legal(Color::White);

        let board = env.reset().unwrap();

        assert_eq!(board.score(), Score { black: 4, white: 1 });
        assert_eq!(board.get(4, 2), Ok(Cell::Black));
        assert_eq!(env.turn(), Some(Color::White));
    }

    #[test]
    fn misbehaving_opponent_is_reported() {
        let config = EnvConfig {
            agent_color: Color::White,
            ..EnvConfig::default()
        };
        let mut env = OthelloEnv::with_opponent(
            &config,
            Some(Box::new(FixedMoveSelector {
                mv: Position::new(0, 0),
            })),
        );

        assert_eq!(
            env.reset(),
            Err(OthelloError::NoMoveSelected {
                color: Color::Black
            })
        );
    }

    #[test]
    fn failed_opponent_reply_rolls_back_the_step() {
        let mut env = OthelloEnv::with_opponent(
            &EnvConfig::default(),
            Some(Box::new(FixedMoveSelector {
                mv: Position::new(0, 0),
            })),
        );
        env.reset().unwrap();

        assert_eq!(
            env.step(Position::new(3, 5)),
            Err(OthelloError::NoMoveSelected {
                color: Color::White
            })
        );
        assert_eq!(*env.board(), BoardState::new());
        assert_eq!(env.phase(), Phase::Active(Color::Black));
        assert!(env.flipped().is_empty());
        assert!(!env.is_pass());
    }

    #[test]
    fn agent_pass_between_opponent_replies_is_recorded() {
        let board = from_rows([
            "OOOO.OOX",
            "OOOOOOOX",
            "OOOOOOOO",
            "OO.OXOOO",
            "XXOXXOXO",
            ".XXXOXOO",
            ".XXXXXOO",
            "XXXXXXXO",
        ]);
        let mut env = vs_first_legal(Color::Black);
        assert_eq!(env.load_position(board, Color::Black), Phase::Active(Color::Black));

        let step = env.step(Position::new(4, 0)).unwrap();

        assert_eq!(
            step.opponent_moves,
            vec![Position::new(2, 3), Position::new(0, 5)]
        );
        assert_eq!(step.passes, vec![Color::Black]);
        assert_eq!(env.turn(), Some(Color::Black));
        assert!(!step.terminal);
    }

    #[test]
    fn show_steps_does_not_change_the_step() {
        let quiet = EnvConfig::default();
        let loud = EnvConfig {
            show_steps: true,
            ..EnvConfig::default()
        };
        let mut steps = Vec::new();
        for config in [quiet, loud] {
            let mut env =
                OthelloEnv::with_opponent(&config, Some(Box::new(FirstLegalMoveSelector)));
            env.reset().unwrap();
            steps.push(env.step(Position::new(3, 5)).unwrap());
        }

        assert_eq!(steps[0], steps[1]);
        assert!(steps[1].accepted);
        assert_eq!(steps[1].opponent_moves.len(), 1);
    }

    #[test]
    fn full_episode_against_opponent_reaches_terminal() {
        let mut env = vs_first_legal(Color::Black);
        env.reset().unwrap();
        let mut last = None;

        for _ in 0..64 {
            let Some(color) = env.turn() else { break };
            let action = env.legal_moves_for(color)[0];
            let step = env.step(action).unwrap();
            assert!(step.accepted);
            last = Some(step);
        }

        let step = last.unwrap();
        assert!(step.terminal);
        assert!(env.is_terminal());
        let result = env.result().unwrap();
        assert_eq!(step.reward, result.outcome_for(Color::Black).reward());
        let score = env.score();
        assert_eq!(
            score.black as usize + score.white as usize + env.board().empty_count() as usize,
            64
        );
    }

    #[test]
    fn reset_clears_terminal_episode() {
        let mut env = two_player();
        env.load_position(BoardState::from_bitboards(FULL_BOARD, 0), Color::Black);
        assert!(env.is_terminal());

        env.reset().unwrap();

        assert_eq!(env.phase(), Phase::Active(Color::Black));
        assert_eq!(*env.board(), BoardState::new());
        assert!(env.result().is_none());
    }
}
