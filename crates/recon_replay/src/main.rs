//! Replay CLI
//!
//! Rebuild the agent's belief from a recorded game and show how each
//! observation narrowed it.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chess_core::{move_to_uci, sq_to_coord};
use recon_agent::{
    AgentConfig, FilterOutcome, GameHistory, NoEngine, Observation, ReplayStep, Session,
};
use tracing_subscriber::{EnvFilter, fmt};

fn print_usage() {
    println!("Reconnaissance chess replay");
    println!();
    println!("Usage:");
    println!("  recon_replay replay <record> [--config FILE] [--show N]");
    println!("  recon_replay config [FILE]");
    println!();
    println!("Records are TOML, or JSON when the file ends in .json.");
    println!("Set RUST_LOG=recon_agent=debug to trace every filter step.");
    println!();
    println!("Examples:");
    println!("  recon_replay replay games/white_vs_random.toml --show 5");
    println!("  recon_replay config agent.toml");
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt().with_env_filter(filter).with_target(true).try_init();
}

fn load_config(path: Option<&Path>) -> Result<AgentConfig> {
    match path {
        Some(path) => AgentConfig::load(path)
            .with_context(|| format!("loading agent config from {}", path.display())),
        None => Ok(AgentConfig::default()),
    }
}

fn describe(observation: &Observation) -> String {
    match observation {
        Observation::OpponentMove(event) => match event.square {
            Some(sq) => format!("opponent captured on {}", sq_to_coord(sq)),
            None if event.occurred => "opponent captured".to_string(),
            None => "opponent moved".to_string(),
        },
        Observation::Sense(sense) => match (sense.squares.first(), sense.squares.last()) {
            (Some((lo, _)), Some((hi, _))) => {
                format!("sensed {}-{}", sq_to_coord(*lo), sq_to_coord(*hi))
            }
            _ => "sensed nothing".to_string(),
        },
        Observation::OwnMove(outcome) => {
            let requested = outcome.requested.map(move_to_uci);
            let taken = outcome.taken.map(move_to_uci);
            let mut text = match (requested, taken) {
                (Some(r), Some(t)) if r == t => format!("played {t}"),
                (Some(r), Some(t)) => format!("requested {r}, played {t}"),
                (Some(r), None) => format!("requested {r}, blocked"),
                (None, _) => "passed".to_string(),
            };
            if let Some(sq) = outcome.capture_square {
                text.push_str(&format!(" capturing on {}", sq_to_coord(sq)));
            }
            text
        }
    }
}

fn outcome_label(outcome: Option<FilterOutcome>) -> &'static str {
    match outcome {
        None => "skipped",
        Some(FilterOutcome::Updated { .. }) => "ok",
        Some(FilterOutcome::Reverted { .. }) => "REVERTED",
        Some(FilterOutcome::Reseeded { .. }) => "RESEEDED",
    }
}

fn print_step(step: &ReplayStep) {
    println!(
        "{:>4}  {:<40} {:<9} {:>8}",
        step.index,
        describe(&step.observation),
        outcome_label(step.outcome),
        step.members
    );
}

fn run_replay(args: &[String]) -> Result<()> {
    let mut record: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut show: usize = 0;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                let Some(path) = args.get(i + 1) else {
                    bail!("--config needs a file");
                };
                config_path = Some(PathBuf::from(path));
                i += 1;
            }
            "--show" | "-s" => {
                let Some(n) = args.get(i + 1) else {
                    bail!("--show needs a count");
                };
                show = n.parse().with_context(|| format!("invalid --show value '{n}'"))?;
                i += 1;
            }
            other if record.is_none() => record = Some(PathBuf::from(other)),
            other => bail!("unexpected argument '{other}'"),
        }
        i += 1;
    }

    let Some(record) = record else {
        print_usage();
        bail!("replay requires a record file");
    };

    let config = load_config(config_path.as_deref())?;
    let history = GameHistory::load(&record)
        .with_context(|| format!("reading game record {}", record.display()))?;

    println!("=== Replay: {} ===", record.display());
    println!(
        "Playing {:?} against {}, {} events",
        history.color,
        history.opponent.as_deref().unwrap_or("unknown"),
        history.events.len()
    );
    println!();

    let mut session = Session::new(config, NoEngine);
    let steps = session.replay(&history)?;
    println!("{:>4}  {:<40} {:<9} {:>8}", "step", "observation", "filter", "members");
    for step in &steps {
        print_step(step);
    }

    let fallbacks = steps
        .iter()
        .filter(|s| s.outcome.is_some_and(FilterOutcome::is_fallback))
        .count();
    println!();
    println!("=== Final Belief ===");
    let belief = session.belief();
    println!("Members: {}, fallbacks: {}", belief.len(), fallbacks);
    if let Some(position) = belief.resolved() {
        println!("Resolved: {}", position.to_fen());
    } else {
        let occupancy = session.tracker().occupancy();
        let likely: Vec<String> = occupancy
            .top_squares(5)
            .into_iter()
            .map(|sq| format!("{} {:.2}", sq_to_coord(sq), occupancy.get(sq)))
            .collect();
        println!("Most likely opponent squares: {}", likely.join(", "));
    }
    for position in belief.iter().take(show) {
        println!("  {}", position.to_fen());
    }
    if let Some(winner) = history.winner {
        println!("Winner: {:?} ({:?})", winner, history.reason);
    }
    Ok(())
}

fn run_config(args: &[String]) -> Result<()> {
    let config = load_config(args.first().map(Path::new))?;
    println!("{config:#?}");
    println!("Engine: {}", config.engine.resolve_path().display());
    Ok(())
}

fn main() -> Result<()> {
    init_logging();
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return Ok(());
    }

    match args[1].as_str() {
        "replay" | "r" => run_replay(&args[2..]),
        "config" | "c" => run_config(&args[2..]),
        "help" | "-h" | "--help" => {
            print_usage();
            Ok(())
        }
        other => {
            print_usage();
            bail!("unknown command '{other}'")
        }
    }
}
