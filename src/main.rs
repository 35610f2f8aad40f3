use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use othello::config::AppConfig;
use othello::game::OthelloEnv;
use othello::opponent::{
    FirstLegalMoveSelector, GreedyCornerSelector, MoveSelector, OpponentKind, RandomMoveSelector,
};
use othello::session::{ConsoleSource, SelectorSource, Session};

/// Play Othello or run automated episodes against the built-in opponent.
#[derive(Parser)]
#[command(name = "othello", about = "Othello environment and console game")]
struct Cli {
    /// Path to TOML configuration file
    #[arg(long, default_value = "othello.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play against the computer in the terminal
    Play {
        /// Start with the legal-move overlay switched off
        #[arg(long)]
        no_hints: bool,
    },
    /// Run automated episodes and print the results
    Simulate {
        #[arg(long, default_value_t = 100)]
        episodes: usize,

        /// Policy for the agent side
        #[arg(long, value_enum, default_value = "random")]
        agent: AgentPolicy,

        /// Seed for the agent policy
        #[arg(long)]
        seed: Option<u64>,

        /// Log the board after every move
        #[arg(long)]
        show_steps: bool,
    },
    /// Print the default configuration as TOML
    DefaultConfig,
}

#[derive(Clone, Copy, ValueEnum)]
enum AgentPolicy {
    Random,
    Greedy,
    FirstLegal,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    match cli.command {
        Command::Play { no_hints } => {
            let show_hints = !no_hints && config.session.show_hints;
            play(config, show_hints)
        }
        Command::Simulate {
            episodes,
            agent,
            seed,
            show_steps,
        } => simulate(config, episodes, agent, seed, show_steps),
        Command::DefaultConfig => {
            print!("{}", AppConfig::default_toml());
            Ok(())
        }
    }
}

fn play(config: AppConfig, show_hints: bool) -> Result<()> {
    if config.env.opponent == OpponentKind::Disabled {
        bail!("interactive play needs an opponent; set env.opponent in the config");
    }
    let mut env = OthelloEnv::new(&config.env);
    let session = Session::new(config.session.clone());
    let stdin = io::stdin();
    let mut console = ConsoleSource::new(stdin.lock(), io::stdout(), show_hints);

    println!("Welcome to Othello!");
    while let Some(color) = console.choose_color()? {
        env.set_agent_color(color);
        let summary = session.play_episode(&mut env, &mut console)?;
        if summary.quit {
            break;
        }
    }
    println!("Thanks for playing!");
    Ok(())
}

fn simulate(
    mut config: AppConfig,
    episodes: usize,
    agent: AgentPolicy,
    seed: Option<u64>,
    show_steps: bool,
) -> Result<()> {
    if episodes == 0 {
        bail!("--episodes must be > 0");
    }
    config.env.show_steps |= show_steps;
    let mut env = OthelloEnv::new(&config.env);
    let session = Session::new(config.session.clone());

    let selector: Box<dyn MoveSelector> = match agent {
        AgentPolicy::Random => Box::new(RandomMoveSelector::new(seed)),
        AgentPolicy::Greedy => Box::new(GreedyCornerSelector::new(seed)),
        AgentPolicy::FirstLegal => Box::new(FirstLegalMoveSelector),
    };
    info!(agent = selector.name(), episodes, "starting simulation");
    let mut source = SelectorSource::new(selector);

    let tally = session
        .run(&mut env, &mut source, episodes)
        .context("running episodes")?;

    println!(
        "Episodes: {}  Win: {}  Tie: {}  Loss: {}  Unfinished: {}",
        tally.episodes(),
        tally.wins,
        tally.ties,
        tally.losses,
        tally.unfinished
    );
    println!("Win rate: {:.3}", tally.win_rate());
    Ok(())
}
