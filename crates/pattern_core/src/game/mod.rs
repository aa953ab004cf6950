//! # Game Dataset
//!
//! Owns one match's tracking data and drives the pattern catalog over it.
//!
//! ```text
//! Uninitialized --initialize_patterns--> PatternsLoaded --run_patterns--> PatternsRun
//!       ^                                                                     |
//!       +------------------- initialize_patterns (reset) ---------------------+
//! ```

use std::path::Path;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::analysis::{Analysis, PatternAnalysis};
use crate::catalog::{PatternCatalog, PatternDefinition};
use crate::data::TrajectoryDataset;
use crate::error::{PatternError, Result};
use crate::models::{ExportInsert, Pattern, PatternExport, PatternSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetState {
    Uninitialized,
    PatternsLoaded,
    PatternsRun,
}

/// Included catalog entry with its analyses bound to the dataset.
#[derive(Debug, Clone)]
struct PatternPlan {
    name: String,
    code: String,
    in_time: i64,
    out_time: i64,
    analyses: Vec<Analysis>,
}

impl PatternPlan {
    fn build(definition: &PatternDefinition, dataset: &TrajectoryDataset) -> Result<Self> {
        let analyses = definition
            .analyses
            .iter()
            .map(|analysis| Analysis::from_definition(&definition.code, analysis, dataset))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            name: definition.name.clone(),
            code: definition.code.clone(),
            in_time: definition.in_time,
            out_time: definition.out_time,
            analyses,
        })
    }

    /// Events of every analysis, concatenated in declaration order.
    fn run(&self, dataset: &TrajectoryDataset) -> Result<Pattern> {
        let mut events = Vec::new();
        for analysis in &self.analyses {
            let found = analysis.run(dataset)?;
            debug!(code = %self.code, kind = %analysis.kind(), events = found.len(), "Analysis finished");
            events.extend(found);
        }
        Ok(Pattern {
            name: self.name.clone(),
            code: self.code.clone(),
            in_time: self.in_time,
            out_time: self.out_time,
            events,
        })
    }

    fn summary(&self) -> PatternSummary {
        PatternSummary { name: self.name.clone(), code: self.code.clone() }
    }
}

#[derive(Debug, Clone)]
enum Stage {
    Uninitialized,
    Loaded(Vec<PatternPlan>),
    Run(Vec<Pattern>),
}

/// Tracking dataset plus the pattern lifecycle.
#[derive(Debug, Clone)]
pub struct GameDataset {
    tracking: TrajectoryDataset,
    stage: Stage,
}

impl GameDataset {
    pub fn new(tracking: TrajectoryDataset) -> Self {
        Self { tracking, stage: Stage::Uninitialized }
    }

    pub fn tracking(&self) -> &TrajectoryDataset {
        &self.tracking
    }

    pub fn state(&self) -> DatasetState {
        match self.stage {
            Stage::Uninitialized => DatasetState::Uninitialized,
            Stage::Loaded(_) => DatasetState::PatternsLoaded,
            Stage::Run(_) => DatasetState::PatternsRun,
        }
    }

    /// Binds every included catalog entry to this dataset.
    ///
    /// Replaces whatever was loaded or run before. On error nothing stays
    /// loaded and the state is `Uninitialized`.
    pub fn initialize_patterns(&mut self, catalog: &PatternCatalog) -> Result<()> {
        self.stage = Stage::Uninitialized;

        let plans = catalog
            .included()
            .map(|definition| PatternPlan::build(definition, &self.tracking))
            .collect::<Result<Vec<_>>>()?;

        info!(
            included = plans.len(),
            skipped = catalog.len() - plans.len(),
            "Patterns initialized"
        );
        self.stage = Stage::Loaded(plans);
        Ok(())
    }

    /// Runs patterns one after another in catalog order.
    pub fn run_patterns(&mut self) -> Result<()> {
        let plans = self.loaded_plans()?;
        let patterns = plans.iter().map(|plan| plan.run(&self.tracking)).collect::<Result<Vec<_>>>()?;
        self.finish_run(patterns);
        Ok(())
    }

    /// Same result as [`Self::run_patterns`], with patterns spread over the rayon pool.
    pub fn run_patterns_parallel(&mut self) -> Result<()> {
        let plans = self.loaded_plans()?;
        let patterns =
            plans.par_iter().map(|plan| plan.run(&self.tracking)).collect::<Result<Vec<_>>>()?;
        self.finish_run(patterns);
        Ok(())
    }

    fn loaded_plans(&self) -> Result<&[PatternPlan]> {
        match &self.stage {
            Stage::Loaded(plans) => Ok(plans),
            _ => Err(PatternError::InvalidState {
                expected: DatasetState::PatternsLoaded,
                found: self.state(),
            }),
        }
    }

    fn finish_run(&mut self, patterns: Vec<Pattern>) {
        let total: usize = patterns.iter().map(|p| p.events.len()).sum();
        info!(patterns = patterns.len(), events = total, "Patterns run");
        self.stage = Stage::Run(patterns);
    }

    /// Run results; empty before a run.
    pub fn patterns(&self) -> &[Pattern] {
        match &self.stage {
            Stage::Run(patterns) => patterns,
            _ => &[],
        }
    }

    /// Codes of the loaded or run patterns, in catalog order.
    pub fn pattern_summaries(&self) -> Vec<PatternSummary> {
        match &self.stage {
            Stage::Uninitialized => Vec::new(),
            Stage::Loaded(plans) => plans.iter().map(PatternPlan::summary).collect(),
            Stage::Run(patterns) => patterns.iter().map(Pattern::summary).collect(),
        }
    }

    /// Events flattened pattern by pattern, plus the catalog summary.
    pub fn export_events(&self) -> Result<PatternExport> {
        let Stage::Run(patterns) = &self.stage else {
            return Err(PatternError::InvalidState {
                expected: DatasetState::PatternsRun,
                found: self.state(),
            });
        };
        Ok(PatternExport {
            events: patterns.iter().flat_map(|p| p.events.iter().cloned()).collect(),
            insert: ExportInsert { patterns: patterns.iter().map(Pattern::summary).collect() },
        })
    }

    /// Writes [`Self::export_events`] as pretty-printed JSON.
    pub fn save_events(&self, path: &Path) -> Result<()> {
        let export = self.export_events()?;
        std::fs::write(path, export.to_json_pretty()?)?;
        info!(path = %path.display(), events = export.events.len(), "Events saved");
        Ok(())
    }
}
