//! # pattern_core
//!
//! Declarative pattern detection over football tracking data.
//!
//! A match is loaded into a [`TrajectoryDataset`] (metadata, frame table and an
//! optional event stream). A [`PatternCatalog`] lists which detectors to run;
//! [`GameDataset`] binds the catalog to the data, runs it and exports the
//! detected events with their visualization hints as JSON.
//!
//! ## Modules
//! - `models`: coordinates, events, visualizations, metadata
//! - `data`: trajectory dataset and file loaders
//! - `catalog`: pattern definitions read from YAML or JSON
//! - `analysis`: the closed family of detectors and the event assembler
//! - `game`: lifecycle and export
//!
//! ```no_run
//! use std::path::Path;
//! use pattern_core::{load_game_data, GameDataset, PatternCatalog};
//!
//! # fn main() -> pattern_core::Result<()> {
//! let tracking = load_game_data(Path::new("meta.json"), Path::new("tracking.csv"), None)?;
//! let mut game = GameDataset::new(tracking);
//! game.initialize_patterns(&PatternCatalog::builtin()?)?;
//! game.run_patterns()?;
//! game.save_events(Path::new("events.json"))?;
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod catalog;
pub mod data;
pub mod error;
pub mod game;
pub mod models;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use analysis::{Analysis, AnalysisConfig, AnalysisKind, PatternAnalysis};
pub use catalog::{catalog_json_schema, AnalysisDefinition, PatternCatalog, PatternDefinition};
pub use data::{load_game_data, TrajectoryDataset};
pub use error::{PatternError, Result};
pub use game::{DatasetState, GameDataset};
pub use models::{Coordinate, Pattern, PatternEvent, PatternExport, Visualization};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Binds `catalog` to `tracking`, runs it and returns the export.
pub fn detect_patterns(
    tracking: TrajectoryDataset,
    catalog: &PatternCatalog,
    parallel: bool,
) -> Result<PatternExport> {
    let mut game = GameDataset::new(tracking);
    game.initialize_patterns(catalog)?;
    if parallel {
        game.run_patterns_parallel()?;
    } else {
        game.run_patterns()?;
    }
    game.export_events()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_builtin_catalog_runs_on_tracking_only_data() {
        let tracking = ball_state_dataset(40, &[5..20]);
        let export = detect_patterns(tracking, &PatternCatalog::builtin().unwrap(), false).unwrap();
        // only the ball-state restart fires without an event stream
        assert_eq!(export.events.len(), 1);
        assert_eq!(export.events[0].pattern, "CB_003");
        assert_eq!(export.insert.patterns.len(), 3);
    }
}
