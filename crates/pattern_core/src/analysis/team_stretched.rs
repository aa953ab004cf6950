//! # Team Stretched
//!
//! Flags intervals where a team's spatial spread exceeds a threshold.
//!
//! ## Algorithm
//! 1. Per frame, take the present positions of the team's qualifying players
//! 2. Too few positions (or any missing with `require_all_agents`) → occluded
//! 3. Spread metric strictly above the threshold → hit, else miss
//! 4. Merge hits with [`merge_hits`], drop windows shorter than `min_duration`

use serde::{Deserialize, Serialize};
use tracing::debug;
use validator::Validate;

use super::assembler::{merge_hits, EventBuilder, FrameHit, HitWindow};
use super::{AnalysisKind, PatternAnalysis};
use crate::data::{TeamSlice, TrajectoryDataset};
use crate::error::{PatternError, Result};
use crate::models::{Coordinate, PatternEvent, TeamSizeLine, Visualization};

/// Occluded frames bridged inside one event
pub const DEFAULT_MAX_GAP_FRAMES: usize = 2;

/// Positions needed before a frame can be judged
pub const DEFAULT_MIN_AGENTS: usize = 2;

const TAG: &str = "team_stretched";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpreadMetric {
    /// max y − min y
    #[default]
    Width,
    /// max x − min x
    Length,
    /// Bounding-box diagonal
    Diagonal,
}

/// Spread value plus the indices of the two players defining it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spread {
    pub value: f64,
    pub extremes: (usize, usize),
}

impl SpreadMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpreadMetric::Width => "width",
            SpreadMetric::Length => "length",
            SpreadMetric::Diagonal => "diagonal",
        }
    }

    /// Team-size lines drawn for this metric.
    pub fn lines(&self) -> &'static [TeamSizeLine] {
        match self {
            SpreadMetric::Width => &[TeamSizeLine::Width],
            SpreadMetric::Length => &[TeamSizeLine::Length],
            SpreadMetric::Diagonal => &[TeamSizeLine::Width, TeamSizeLine::Length],
        }
    }

    /// `None` for an empty position set.
    pub fn measure(&self, positions: &[(&str, Coordinate)]) -> Option<Spread> {
        if positions.is_empty() {
            return None;
        }
        match self {
            SpreadMetric::Width => Some(axis_spread(positions, |c| c.y)),
            SpreadMetric::Length => Some(axis_spread(positions, |c| c.x)),
            SpreadMetric::Diagonal => {
                let width = axis_spread(positions, |c| c.y).value;
                let length = axis_spread(positions, |c| c.x).value;
                Some(Spread { value: width.hypot(length), extremes: farthest_pair(positions) })
            }
        }
    }
}

fn axis_spread(positions: &[(&str, Coordinate)], axis: impl Fn(&Coordinate) -> f64) -> Spread {
    let (mut lo, mut hi) = (0, 0);
    for (idx, (_, pos)) in positions.iter().enumerate() {
        if axis(pos) < axis(&positions[lo].1) {
            lo = idx;
        }
        if axis(pos) > axis(&positions[hi].1) {
            hi = idx;
        }
    }
    Spread { value: axis(&positions[hi].1) - axis(&positions[lo].1), extremes: (lo, hi) }
}

fn farthest_pair(positions: &[(&str, Coordinate)]) -> (usize, usize) {
    let mut best = (0, 0);
    let mut best_dist = 0.0;
    for i in 0..positions.len() {
        for j in (i + 1)..positions.len() {
            let dist = positions[i].1.distance_to(&positions[j].1);
            if dist > best_dist {
                best_dist = dist;
                best = (i, j);
            }
        }
    }
    best
}

fn default_max_gap_frames() -> usize {
    DEFAULT_MAX_GAP_FRAMES
}

fn default_min_agents() -> usize {
    DEFAULT_MIN_AGENTS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct TeamStretchedParams {
    pub team_code: String,
    /// Metres; must be positive
    pub threshold: f64,
    #[serde(default)]
    pub metric: SpreadMetric,
    #[serde(default)]
    pub include_goalkeeper: bool,
    #[serde(default = "default_max_gap_frames")]
    pub max_gap_frames: usize,
    #[serde(default = "default_min_agents")]
    #[validate(range(min = 2))]
    pub min_agents: usize,
    #[serde(default)]
    pub require_all_agents: bool,
    /// Seconds
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub min_duration: f64,
}

impl TeamStretchedParams {
    pub fn new(team_code: impl Into<String>, threshold: f64) -> Self {
        Self {
            team_code: team_code.into(),
            threshold,
            metric: SpreadMetric::default(),
            include_goalkeeper: false,
            max_gap_frames: DEFAULT_MAX_GAP_FRAMES,
            min_agents: DEFAULT_MIN_AGENTS,
            require_all_agents: false,
            min_duration: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TeamStretched {
    code: String,
    params: TeamStretchedParams,
}

impl TeamStretched {
    pub fn new(code: &str, params: TeamStretchedParams, dataset: &TrajectoryDataset) -> Result<Self> {
        if !(params.threshold > 0.0) || !params.threshold.is_finite() {
            return Err(PatternError::malformed(
                code,
                AnalysisKind::TeamStretched.as_str(),
                format!("threshold must be a positive number, got {}", params.threshold),
            ));
        }
        dataset.team(&params.team_code)?;
        Ok(Self { code: code.to_string(), params })
    }

    pub fn params(&self) -> &TeamStretchedParams {
        &self.params
    }

    fn classify(&self, slice: &TeamSlice<'_>, row: usize) -> FrameHit {
        let present = slice.present_at(row);
        let incomplete = self.params.require_all_agents && present.len() < slice.agent_count();
        if present.len() < self.params.min_agents || incomplete {
            return FrameHit::Occluded;
        }
        match self.params.metric.measure(&present) {
            Some(spread) if spread.value > self.params.threshold => FrameHit::Hit(spread.value),
            Some(_) => FrameHit::Miss,
            None => FrameHit::Occluded,
        }
    }

    fn build_event(
        &self,
        dataset: &TrajectoryDataset,
        slice: &TeamSlice<'_>,
        window: &HitWindow,
    ) -> Result<PatternEvent> {
        let team = slice.team_code();
        let mut builder = EventBuilder::from_window(self.code.as_str(), window, dataset);
        let span = builder.window()?;

        for row in [window.first, window.peak, window.last] {
            let present = slice.present_at(row);
            if let Some(centroid) = Coordinate::centroid(present.iter().map(|(_, c)| c)) {
                builder = builder.coordinate(centroid);
            }
        }

        for line in self.params.metric.lines() {
            builder = builder.visualization(Visualization::team_size(span, team, *line));
        }

        let at_peak = slice.present_at(window.peak);
        if let Some(spread) = self.params.metric.measure(&at_peak) {
            let (a, b) = spread.extremes;
            let players = vec![at_peak[a].0.to_string(), at_peak[b].0.to_string()];
            builder = builder.visualization(Visualization::measurer(span, players));
        }

        builder.tag(TAG).tag(team).tag(self.params.metric.as_str()).build()
    }
}

impl PatternAnalysis for TeamStretched {
    fn kind(&self) -> AnalysisKind {
        AnalysisKind::TeamStretched
    }

    fn pattern_code(&self) -> &str {
        &self.code
    }

    fn run(&self, dataset: &TrajectoryDataset) -> Result<Vec<PatternEvent>> {
        if dataset.is_empty() {
            return Ok(Vec::new());
        }
        let slice = dataset.team_slice(&self.params.team_code, self.params.include_goalkeeper)?;
        let frames: Vec<FrameHit> = (0..dataset.len()).map(|row| self.classify(&slice, row)).collect();
        let windows = merge_hits(&frames, self.params.max_gap_frames);

        let mut events = Vec::with_capacity(windows.len());
        for window in &windows {
            let (start, _, end) = window.times(dataset);
            if end - start < self.params.min_duration {
                continue;
            }
            events.push(self.build_event(dataset, &slice, window)?);
        }

        debug!(
            code = %self.code,
            team = %self.params.team_code,
            windows = windows.len(),
            events = events.len(),
            "team_stretched done"
        );
        Ok(events)
    }
}
