use pokemon_battle_engine::{run, CliOptions, Command, Policy};
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn usage() -> ! {
    eprintln!(
        "Usage: cargo run --release -- [battle|matchup|roster] [--p1 NAME|FILE.json] [--p2 NAME|FILE.json] \
[--seed SEED] [--max-turns N] [--sims N] [--moves catalog.json] [--types chart.json] [--roster roster.json] \
[--policy random|heuristic] [--epsilon E] [--no-crit] [--json]"
    );
    std::process::exit(1);
}

fn parse_args() -> anyhow::Result<CliOptions> {
    let mut opts = CliOptions::default();
    let mut epsilon = 0.1f64;
    let mut heuristic = false;

    let mut args = env::args().skip(1).peekable();
    if let Some(first) = args.peek() {
        let command = match first.as_str() {
            "battle" => Some(Command::Battle),
            "matchup" => Some(Command::Matchup),
            "roster" => Some(Command::Roster),
            _ => None,
        };
        if let Some(command) = command {
            opts.command = command;
            args.next();
        }
    }

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--p1" => {
                opts.p1 = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--p1 requires a roster name or file"))?;
            }
            "--p2" => {
                opts.p2 = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--p2 requires a roster name or file"))?;
            }
            "--seed" => {
                let val = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--seed requires a number"))?;
                opts.seed = val.parse()?;
            }
            "--max-turns" => {
                let val = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--max-turns requires a number"))?;
                opts.battle.max_turns = val.parse()?;
            }
            "--sims" => {
                let val = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--sims requires a number"))?;
                opts.sims = val.parse()?;
            }
            "--moves" => {
                opts.moves_path = Some(args.next().map(PathBuf::from).ok_or_else(|| {
                    anyhow::anyhow!("--moves requires a path (e.g. --moves moves.json)")
                })?);
            }
            "--types" => {
                opts.types_path = Some(args.next().map(PathBuf::from).ok_or_else(|| {
                    anyhow::anyhow!("--types requires a path (e.g. --types type_chart.json)")
                })?);
            }
            "--roster" => {
                opts.roster_path = Some(args.next().map(PathBuf::from).ok_or_else(|| {
                    anyhow::anyhow!("--roster requires a path (e.g. --roster roster.json)")
                })?);
            }
            "--policy" => {
                let val = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--policy requires random or heuristic"))?;
                heuristic = match val.to_ascii_lowercase().as_str() {
                    "random" => false,
                    "heuristic" => true,
                    other => anyhow::bail!("Unknown policy {other} (use random or heuristic)"),
                };
            }
            "--epsilon" => {
                let val = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--epsilon requires a float"))?;
                epsilon = val.parse()?;
            }
            "--no-crit" => opts.battle.critical_hits = false,
            "--json" => opts.json = true,
            "--help" | "-h" => usage(),
            other => return Err(anyhow::anyhow!("Unknown argument {other}")),
        }
    }

    opts.policy = if heuristic {
        Policy::Heuristic { epsilon }
    } else {
        Policy::Random
    };
    Ok(opts)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let opts = parse_args()?;
    run(opts)
}
