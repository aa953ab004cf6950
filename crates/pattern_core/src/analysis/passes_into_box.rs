//! # Passes Into The Box
//!
//! One event per pass that enters a target zone, read from the event stream.
//!
//! ## Algorithm
//! 1. Filter passes by team, passer and (optionally) completion
//! 2. Keep a pass when its destination is inside a zone its origin is not inside
//! 3. Event spans pass start → arrival, with the arrival as event time

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use validator::Validate;

use super::assembler::EventBuilder;
use super::zone::Zone;
use super::{AnalysisKind, PatternAnalysis};
use crate::data::TrajectoryDataset;
use crate::error::{PatternError, Result};
use crate::models::{MatchEvent, PassEvent, PatternEvent, Visualization};

const TAG: &str = "pass";
const ZONE_TAG: &str = "into_box";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct PassesIntoTheBoxParams {
    /// Empty means both penalty areas of the match pitch
    #[serde(default)]
    pub zones: Vec<Zone>,
    #[serde(default)]
    pub team_code: Option<String>,
    /// Passers to keep; empty keeps everyone
    #[serde(default)]
    pub players: Vec<String>,
    #[serde(default)]
    pub completed_only: bool,
}

#[derive(Debug, Clone)]
pub struct PassesIntoTheBox {
    code: String,
    params: PassesIntoTheBoxParams,
    zones: Vec<Zone>,
}

impl PassesIntoTheBox {
    pub fn new(code: &str, params: PassesIntoTheBoxParams, dataset: &TrajectoryDataset) -> Result<Self> {
        for zone in &params.zones {
            zone.check().map_err(|message| {
                PatternError::malformed(code, AnalysisKind::PassesIntoTheBox.as_str(), message)
            })?;
        }
        if let Some(team) = &params.team_code {
            dataset.team(team)?;
        }
        if let Some(unknown) = params.players.iter().find(|p| !dataset.has_agent(p)) {
            return Err(PatternError::UnknownAgent { agent_id: unknown.clone() });
        }

        let zones = if params.zones.is_empty() {
            Zone::penalty_areas(&dataset.metadata().pitch)
        } else {
            params.zones.clone()
        };
        Ok(Self { code: code.to_string(), params, zones })
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    fn accepts(&self, pass: &PassEvent) -> bool {
        if self.params.team_code.as_deref().is_some_and(|team| team != pass.team) {
            return false;
        }
        if !self.params.players.is_empty() && !self.params.players.contains(&pass.player) {
            return false;
        }
        if self.params.completed_only && !pass.is_complete() {
            return false;
        }
        self.zones
            .iter()
            .any(|zone| zone.contains(&pass.destination) && !zone.contains(&pass.origin))
    }

    fn build_event(&self, pass: &PassEvent) -> Result<PatternEvent> {
        let builder =
            EventBuilder::new(self.code.as_str(), pass.timestamp, pass.end_timestamp, pass.end_timestamp);
        let span = builder.window()?;

        let mut players = vec![pass.player.clone()];
        players.extend(pass.receiver.iter().cloned());

        builder
            .coordinate(pass.origin)
            .coordinate(pass.destination)
            .visualization(Visualization::players(span, players))
            .visualization(Visualization::trails(span, vec![pass.player.clone()]))
            .tag(TAG)
            .tag(ZONE_TAG)
            .tag(pass.team.as_str())
            .build()
    }
}

impl PatternAnalysis for PassesIntoTheBox {
    fn kind(&self) -> AnalysisKind {
        AnalysisKind::PassesIntoTheBox
    }

    fn pattern_code(&self) -> &str {
        &self.code
    }

    fn run(&self, dataset: &TrajectoryDataset) -> Result<Vec<PatternEvent>> {
        if dataset.is_empty() {
            return Ok(Vec::new());
        }
        if !dataset.has_event_stream() {
            warn!(code = %self.code, "No event stream loaded; passes_into_the_box yields nothing");
            return Ok(Vec::new());
        }

        let mut passes: Vec<&PassEvent> = dataset
            .events()
            .iter()
            .filter_map(|event| match event {
                MatchEvent::Pass(pass) if self.accepts(pass) => Some(pass),
                _ => None,
            })
            .collect();
        passes.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));

        let mut events: Vec<PatternEvent> = Vec::new();
        for pass in passes {
            // one ball: a pass still in flight hides the next one
            if let Some(previous) = events.last() {
                if pass.timestamp < previous.end_time {
                    debug!(code = %self.code, at = pass.timestamp, "Skipping pass overlapping the previous one");
                    continue;
                }
            }
            events.push(self.build_event(pass)?);
        }
        debug!(code = %self.code, events = events.len(), "passes_into_the_box done");
        Ok(events)
    }
}
