//! Pattern CLI
//!
//! Runs a pattern catalog over one match and writes the events JSON.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pattern_core::{load_game_data, GameDataset, PatternCatalog, PatternExport};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pattern_cli")]
#[command(about = "Detect tactical patterns in football tracking data", long_about = None)]
#[command(version = pattern_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a catalog over one match
    Run {
        /// Match metadata (JSON or YAML)
        #[arg(long)]
        metadata: PathBuf,

        /// Tracking CSV
        #[arg(long)]
        tracking: PathBuf,

        /// Event stream JSON (passes, set pieces)
        #[arg(long)]
        events: Option<PathBuf>,

        /// Pattern catalog; the built-in catalog when omitted
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Output events JSON
        #[arg(long)]
        out: PathBuf,

        /// Run patterns on the rayon pool
        #[arg(long, default_value = "false")]
        parallel: bool,
    },

    /// Print the JSON schema of catalog files
    Schema,

    /// Print the built-in catalog
    DefaultCatalog,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    execute(cli.command)
}

fn execute(command: Commands) -> Result<()> {
    match command {
        Commands::Run { metadata, tracking, events, catalog, out, parallel } => {
            let export = run_catalog(
                &metadata,
                &tracking,
                events.as_deref(),
                catalog.as_deref(),
                &out,
                parallel,
            )?;
            print_summary(&export, &out);
        }
        Commands::Schema => {
            let schema = serde_json::to_string_pretty(&pattern_core::catalog_json_schema()?)?;
            println!("{schema}");
        }
        Commands::DefaultCatalog => {
            print!("{}", PatternCatalog::builtin_yaml());
        }
    }
    Ok(())
}

fn run_catalog(
    metadata: &Path,
    tracking: &Path,
    events: Option<&Path>,
    catalog: Option<&Path>,
    out: &Path,
    parallel: bool,
) -> Result<PatternExport> {
    let dataset = load_game_data(metadata, tracking, events)
        .with_context(|| format!("Failed to load match from {}", tracking.display()))?;
    info!(frames = dataset.len(), events = dataset.events().len(), "Match loaded");

    let catalog = match catalog {
        Some(path) => PatternCatalog::load(path)
            .with_context(|| format!("Failed to read catalog {}", path.display()))?,
        None => PatternCatalog::builtin().context("Built-in catalog is invalid")?,
    };

    let mut game = GameDataset::new(dataset);
    game.initialize_patterns(&catalog).context("Failed to initialize patterns")?;
    if parallel {
        game.run_patterns_parallel()?;
    } else {
        game.run_patterns()?;
    }
    game.save_events(out).with_context(|| format!("Failed to write {}", out.display()))?;
    Ok(game.export_events()?)
}

fn print_summary(export: &PatternExport, out: &Path) {
    println!("Events written to {}", out.display());
    for pattern in &export.insert.patterns {
        println!("   {:<10} {:>5}  {}", pattern.code, export.event_count(&pattern.code), pattern.name);
    }
    println!("   total      {:>5}", export.events.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    const METADATA: &str = r#"{
  "pitch": {"length": 105.0, "width": 68.0},
  "teams": [
    {"team_id": "HOME", "ground": "home", "players": [
      {"player_id": "h1", "position": "goalkeeper"},
      {"player_id": "h2", "position": "defender"},
      {"player_id": "h3", "position": "midfielder"}
    ]},
    {"team_id": "AWAY", "ground": "away", "players": [
      {"player_id": "a1", "position": "goalkeeper"}
    ]}
  ]
}"#;

    const TRACKING: &str = "\
frame_id,timestamp,ball_state,ball_x,ball_y,h2_x,h2_y,h3_x,h3_y
1,0.0,alive,52.5,34.0,50.0,10.0,50.0,20.0
2,0.5,dead,52.5,34.0,50.0,10.0,50.0,60.0
3,1.0,dead,52.5,34.0,50.0,10.0,50.0,60.0
4,1.5,dead,52.5,34.0,50.0,10.0,50.0,20.0
5,2.0,alive,52.5,34.0,50.0,10.0,50.0,20.0
";

    const EVENTS: &str = r#"[
  {"type": "pass", "timestamp": 0.0, "end_timestamp": 0.5, "team": "HOME", "player": "h2",
   "origin": {"x": 70.0, "y": 30.0}, "destination": {"x": 95.0, "y": 34.0}},
  {"type": "substitution", "timestamp": 1.0}
]"#;

    const CATALOG: &str = "
patterns:
  - name: Stretched
    code: T1
    kind: team_stretched
    parameters: {team_code: HOME, threshold: 40}
  - name: Box
    code: T2
    kind: passes_into_the_box
";

    #[test]
    fn test_cli_parses_run() {
        let cli = Cli::try_parse_from([
            "pattern_cli", "run", "--metadata", "m.json", "--tracking", "t.csv", "--out", "o.json",
            "--parallel",
        ])
        .unwrap();
        match cli.command {
            Commands::Run { parallel, events, catalog, .. } => {
                assert!(parallel);
                assert!(events.is_none());
                assert!(catalog.is_none());
            }
            _ => panic!("expected run"),
        }
        assert!(Cli::try_parse_from(["pattern_cli", "run", "--metadata", "m.json"]).is_err());
    }

    #[test]
    fn test_run_catalog_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let write = |name: &str, body: &str| {
            let path = dir.path().join(name);
            std::fs::write(&path, body).unwrap();
            path
        };
        let metadata = write("meta.json", METADATA);
        let tracking = write("tracking.csv", TRACKING);
        let events = write("events.json", EVENTS);
        let catalog = write("catalog.yaml", CATALOG);
        let out = dir.path().join("out.json");

        let export =
            run_catalog(&metadata, &tracking, Some(&events), Some(&catalog), &out, false).unwrap();
        assert_eq!(export.event_count("T1"), 1);
        assert_eq!(export.event_count("T2"), 1);

        let written = PatternExport::from_json(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(written, export);
    }

    #[test]
    fn test_missing_input_has_context() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_catalog(
            &dir.path().join("nope.json"),
            &dir.path().join("nope.csv"),
            None,
            None,
            &dir.path().join("out.json"),
            false,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("Failed to load match"));
    }
}
