//! Episode driving. Actions are pulled from an [`ActionSource`], so the
//! same loop serves a human at the console and an automated agent.

use std::io::{BufRead, Write};
use std::time::Duration;

use tracing::{debug, info};
use web_time::Instant;

use crate::config::SessionConfig;
use crate::error::{OthelloError, SessionError};
use crate::game::{OthelloEnv, Step};
use crate::input::{self, Command};
use crate::opponent::MoveSelector;
use crate::render;
use crate::types::{Color, GameResult, Outcome, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Place(Position),
    Quit,
}

/// Supplies actions for the agent side of an [`OthelloEnv`].
pub trait ActionSource {
    fn next_action(&mut self, env: &OthelloEnv) -> Result<Action, SessionError>;

    /// Called when `action` was refused; the next call to `next_action`
    /// should pick something else.
    fn on_rejected(
        &mut self,
        _env: &OthelloEnv,
        _action: Position,
        _err: &OthelloError,
    ) -> Result<(), SessionError> {
        Ok(())
    }

    fn on_step(&mut self, _env: &OthelloEnv, _step: &Step) -> Result<(), SessionError> {
        Ok(())
    }

    /// Whether a long run of rejected actions should abort the episode.
    /// A person re-prompted at a console is never cut off.
    fn limits_rejections(&self) -> bool {
        true
    }

    fn on_episode_end(
        &mut self,
        _env: &OthelloEnv,
        _summary: &EpisodeSummary,
    ) -> Result<(), SessionError> {
        Ok(())
    }
}

/// Drives the agent side with a [`MoveSelector`].
pub struct SelectorSource<S> {
    selector: S,
}

impl<S: MoveSelector> SelectorSource<S> {
    pub fn new(selector: S) -> Self {
        Self { selector }
    }
}

impl<S: MoveSelector> ActionSource for SelectorSource<S> {
    fn next_action(&mut self, env: &OthelloEnv) -> Result<Action, SessionError> {
        let color = env.turn().ok_or(OthelloError::GameOver)?;
        let pos = self
            .selector
            .select_move(env.board(), color)
            .ok_or(OthelloError::NoMoveSelected { color })?;
        Ok(Action::Place(pos))
    }
}

/// Text console player: prompts on `output`, reads answers from `input`.
pub struct ConsoleSource<R, W> {
    input: R,
    output: W,
    show_hints: bool,
}

impl<R: BufRead, W: Write> ConsoleSource<R, W> {
    pub fn new(input: R, output: W, show_hints: bool) -> Self {
        Self {
            input,
            output,
            show_hints,
        }
    }

    /// Asks which tile the player wants. `None` on end of input.
    pub fn choose_color(&mut self) -> Result<Option<Color>, SessionError> {
        loop {
            writeln!(self.output, "Do you want to be X or O? X always moves first.")?;
            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            if let Ok(color) = input::parse_tile(&line) {
                return Ok(Some(color));
            }
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn read_line(&mut self) -> Result<Option<String>, SessionError> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }

    fn draw(&mut self, env: &OthelloEnv) -> Result<(), SessionError> {
        let me = env.agent_color();
        let board = if self.show_hints {
            render::render_with_hints(env.board(), me)
        } else {
            render::render(env.board())
        };
        write!(self.output, "{board}")?;
        let score = env.score();
        writeln!(
            self.output,
            "You have {} points. The computer has {} points.",
            score.of(me),
            score.of(me.opponent())
        )?;
        Ok(())
    }

    /// Waits for Enter. End of input just continues.
    fn pause(&mut self) -> Result<(), SessionError> {
        writeln!(self.output, "Press Enter to see the computer's move.")?;
        self.read_line()?;
        Ok(())
    }
}

impl<R: BufRead, W: Write> ActionSource for ConsoleSource<R, W> {
    fn next_action(&mut self, env: &OthelloEnv) -> Result<Action, SessionError> {
        let mut redraw = true;
        loop {
            if redraw {
                self.draw(env)?;
                redraw = false;
            }
            writeln!(
                self.output,
                "Enter your move, or type quit to end the game, or hints to turn off/on hints."
            )?;
            let Some(line) = self.read_line()? else {
                return Ok(Action::Quit);
            };
            match input::parse_command(&line) {
                Ok(Command::Quit) => return Ok(Action::Quit),
                Ok(Command::ToggleHints) => {
                    self.show_hints = !self.show_hints;
                    redraw = true;
                }
                Ok(Command::Move(pos)) => return Ok(Action::Place(pos)),
                Err(_) => {
                    writeln!(
                        self.output,
                        "That is not a valid move. Type the x digit (1-8), then the y digit (1-8)."
                    )?;
                    writeln!(self.output, "For example, 81 will be the top-right corner.")?;
                }
            }
        }
    }

    fn on_rejected(
        &mut self,
        _env: &OthelloEnv,
        _action: Position,
        _err: &OthelloError,
    ) -> Result<(), SessionError> {
        writeln!(self.output, "That is not a legal move.")?;
        Ok(())
    }

    fn on_step(&mut self, env: &OthelloEnv, step: &Step) -> Result<(), SessionError> {
        let me = env.agent_color();
        if step.passes.contains(&me.opponent()) {
            writeln!(self.output, "Your opponent has no legal move. It is your turn.")?;
        }
        // Every computer reply after the first follows a pass of ours.
        let mut my_passes = step.passes.iter().filter(|&&color| color == me).count();
        for (i, &pos) in step.opponent_moves.iter().enumerate() {
            if i > 0 && my_passes > 0 {
                writeln!(self.output, "You have no legal move. It is the computer's turn.")?;
                my_passes -= 1;
            }
            self.pause()?;
            writeln!(
                self.output,
                "The computer played {}.",
                input::format_position(pos)
            )?;
        }
        Ok(())
    }

    fn limits_rejections(&self) -> bool {
        false
    }

    fn on_episode_end(
        &mut self,
        env: &OthelloEnv,
        summary: &EpisodeSummary,
    ) -> Result<(), SessionError> {
        if summary.quit {
            return Ok(());
        }
        write!(self.output, "{}", render::render(env.board()))?;
        let me = env.agent_color();
        let score = env.score();
        let (mine, theirs) = (score.of(me), score.of(me.opponent()));
        writeln!(
            self.output,
            "The player scored {mine} points. The computer scored {theirs} points."
        )?;
        match summary.outcome {
            Some(Outcome::Win) => writeln!(
                self.output,
                "You beat the computer by {} points! Congratulations!",
                mine - theirs
            )?,
            Some(Outcome::Loss) => writeln!(
                self.output,
                "You lost. The computer beat you by {} points.",
                theirs - mine
            )?,
            Some(Outcome::Tie) => writeln!(self.output, "The game was a tie!")?,
            None => writeln!(self.output, "The game was stopped after {} moves.", summary.moves)?,
        }
        Ok(())
    }
}

/// What happened during one episode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EpisodeSummary {
    /// Accepted agent actions.
    pub moves: usize,
    /// Refused agent actions (illegal or off the board).
    pub rejected: usize,
    /// Sum of all rewards, penalties included.
    pub total_reward: f32,
    pub final_reward: f32,
    pub result: Option<GameResult>,
    /// Agent's view of `result`.
    pub outcome: Option<Outcome>,
    pub quit: bool,
    /// Stopped by the move cap before the game ended.
    pub truncated: bool,
    pub elapsed: Duration,
}

/// Win/tie/loss counts over several episodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub wins: usize,
    pub ties: usize,
    pub losses: usize,
    /// Episodes that ended without a result.
    pub unfinished: usize,
}

impl Tally {
    pub fn record(&mut self, summary: &EpisodeSummary) {
        match summary.outcome {
            Some(Outcome::Win) => self.wins += 1,
            Some(Outcome::Tie) => self.ties += 1,
            Some(Outcome::Loss) => self.losses += 1,
            None => self.unfinished += 1,
        }
    }

    pub fn episodes(&self) -> usize {
        self.wins + self.ties + self.losses + self.unfinished
    }

    pub fn win_rate(&self) -> f64 {
        match self.episodes() {
            0 => 0.0,
            n => self.wins as f64 / n as f64,
        }
    }
}

pub struct Session {
    config: SessionConfig,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    /// Resets `env` and plays one episode with actions from `source`.
    pub fn play_episode(
        &self,
        env: &mut OthelloEnv,
        source: &mut dyn ActionSource,
    ) -> Result<EpisodeSummary, SessionError> {
        let started = Instant::now();
        env.reset()?;
        let mut summary = EpisodeSummary::default();
        let mut streak = 0usize;

        while !env.is_terminal() {
            if summary.moves >= self.config.max_moves {
                summary.truncated = true;
                break;
            }
            let pos = match source.next_action(env)? {
                Action::Place(pos) => pos,
                Action::Quit => {
                    summary.quit = true;
                    break;
                }
            };

            let rejection = match env.step(pos) {
                Ok(step) if step.accepted => {
                    streak = 0;
                    summary.moves += 1;
                    summary.total_reward += step.reward;
                    summary.final_reward = step.reward;
                    source.on_step(env, &step)?;
                    continue;
                }
                Ok(step) => {
                    summary.total_reward += step.reward;
                    let color = env.turn().unwrap_or(env.agent_color());
                    OthelloError::InvalidMove {
                        color,
                        x: pos.x,
                        y: pos.y,
                    }
                }
                Err(err @ OthelloError::OutOfRange { .. }) => err,
                Err(err) => return Err(err.into()),
            };

            summary.rejected += 1;
            streak += 1;
            debug!(%pos, %rejection, streak, "action rejected");
            if source.limits_rejections() && streak >= self.config.max_rejections {
                return Err(SessionError::TooManyRejections { count: streak });
            }
            source.on_rejected(env, pos, &rejection)?;
        }

        summary.result = env.result();
        summary.outcome = summary
            .result
            .map(|result| result.outcome_for(env.agent_color()));
        summary.elapsed = started.elapsed();
        info!(
            moves = summary.moves,
            rejected = summary.rejected,
            outcome = ?summary.outcome,
            truncated = summary.truncated,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "episode finished"
        );
        source.on_episode_end(env, &summary)?;
        Ok(summary)
    }

    /// Plays up to `episodes` episodes, stopping early if the source quits.
    pub fn run(
        &self,
        env: &mut OthelloEnv,
        source: &mut dyn ActionSource,
        episodes: usize,
    ) -> Result<Tally, SessionError> {
        let mut tally = Tally::default();
        for episode in 0..episodes {
            let summary = self.play_episode(env, source)?;
            if summary.quit {
                break;
            }
            tally.record(&summary);
            debug!(episode, win_rate = tally.win_rate(), "tally updated");
        }
        Ok(tally)
    }
}
