//! CLI surface for the recovery engine: reads a JSON problem file, runs
//! recovery, and prints the recovered key.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Context, Result};
use lattice_attack::recover_private_key;
use lattice_attack::ProblemInstance;

/// Recover an ECDSA private key from partial-nonce signatures.
#[derive(Parser, Debug)]
#[command(name = "lattice-attack", about = "ECDSA attack from JSON data file")]
struct Cli {
    /// Path to the problem JSON file.
    #[arg(short = 'f', long = "file", default_value = "data.json")]
    input: PathBuf,

    /// Shuffle and retry until the key is found, instead of giving up once
    /// the reduction schedule is exhausted.
    #[arg(short = 'l', long = "loop")]
    loop_until_found: bool,

    /// Seed the sampling RNG for a reproducible run.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    tracing::info!(file = %cli.input.display(), "loading problem instance");
    let data = std::fs::read_to_string(&cli.input)
        .with_context(|| format!("reading {}", cli.input.display()))?;
    let instance = ProblemInstance::from_json(&data)?;

    tracing::info!(
        curve = instance.curve.name(),
        known_bits = instance.leak_width,
        signatures = instance.signatures.len(),
        "starting recovery attack"
    );
    if cli.loop_until_found {
        tracing::info!("will shuffle and loop until the key is found");
    }

    match recover_private_key(&instance, cli.loop_until_found, cli.seed)? {
        Some(key) => {
            println!("{key:#x}");
            Ok(())
        }
        None => {
            tracing::error!("private key not found");
            std::process::exit(1);
        }
    }
}
