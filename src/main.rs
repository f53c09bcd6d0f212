use std::fs;
use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use ctrlmap::config::MapperConfig;
use ctrlmap::logging::init_logging;
use ctrlmap::replay::{parse_script, Replay};
use ctrlmap::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    let config = match &cli.config {
        Some(path) => MapperConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => MapperConfig::default(),
    };

    let text = fs::read_to_string(&cli.script)
        .with_context(|| format!("Failed to read script {}", cli.script.display()))?;
    let script = parse_script(&text).context("Invalid script")?;
    info!(commands = script.len(), script = %cli.script.display(), "replaying");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut replay = Replay::new(config);
    replay.run(&script, &mut out).context("Replay failed")?;

    if cli.dump_at_end {
        writeln!(out, "--- final state at {:.3}s ---", replay.now())?;
        write!(out, "{}", replay.mapper().debug_dump())?;
    }
    out.flush()?;
    Ok(())
}
