//! Runs a scenario file and writes one JSON line per snapshot to stdout.

mod telemetry;

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::info;
use tsgen_world::Scenario;

#[derive(Parser, Debug)]
#[command(
    name = "tsgen-runner",
    version,
    about = "Generate a branching particle timeseries from a JSON scenario"
)]
struct Args {
    /// Scenario file: run configuration plus initial particles.
    scenario: PathBuf,

    /// Emit logs as JSON lines on stderr.
    #[arg(long)]
    json_logs: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    telemetry::init_telemetry(args.json_logs);

    let scenario = Scenario::from_path(&args.scenario)
        .with_context(|| format!("failed to load scenario {}", args.scenario.display()))?;
    info!(
        path = %args.scenario.display(),
        particles = scenario.particles.len(),
        num_steps = scenario.simulation.num_steps,
        "Loaded scenario"
    );

    let series = scenario.execute().context("simulation failed")?;

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for snapshot in series.iter() {
        serde_json::to_writer(&mut out, snapshot)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;

    let final_centroid = series.snapshots.last().and_then(|s| s.centroid());
    info!(
        snapshots = series.len(),
        final_population = series.stats.final_population,
        final_centroid = ?final_centroid,
        "Run written"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_args() {
        let args = Args::try_parse_from(["tsgen-runner", "run.json", "--json-logs"]).unwrap();
        assert_eq!(args.scenario, PathBuf::from("run.json"));
        assert!(args.json_logs);

        let args = Args::try_parse_from(["tsgen-runner", "run.json"]).unwrap();
        assert!(!args.json_logs);

        assert!(Args::try_parse_from(["tsgen-runner"]).is_err());
        assert!(Args::try_parse_from(["tsgen-runner", "run.json", "--bogus"]).is_err());
    }
}
