//! Frame-indexed positional table plus match metadata.
//!
//! Positions are stored column-wise, one column per player in metadata order,
//! so per-team and per-player views are plain slices into the table.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{PatternError, Result};
use crate::models::{Coordinate, MatchEvent, MatchMetadata, TeamInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BallState {
    Alive,
    Dead,
}

/// One sampled instant as handed to [`TrajectoryBuilder::push_frame`].
#[derive(Debug, Clone, Default)]
pub struct FrameRecord {
    pub frame_id: u64,
    /// Seconds
    pub timestamp: f64,
    pub ball: Option<Coordinate>,
    pub ball_state: Option<BallState>,
    /// Only players with a known position
    pub positions: Vec<(String, Coordinate)>,
}

/// Read-only tracking dataset for one match.
#[derive(Debug, Clone)]
pub struct TrajectoryDataset {
    metadata: MatchMetadata,
    frame_ids: Vec<u64>,
    timestamps: Vec<f64>,
    ball: Vec<Option<Coordinate>>,
    ball_state: Vec<Option<BallState>>,
    agents: Vec<String>,
    agent_index: HashMap<String, usize>,
    columns: Vec<Vec<Option<Coordinate>>>,
    events: Option<Vec<MatchEvent>>,
}

impl TrajectoryDataset {
    pub fn builder(metadata: MatchMetadata) -> Result<TrajectoryBuilder> {
        TrajectoryBuilder::new(metadata)
    }

    /// Dataset without frames; every analysis yields nothing on it.
    pub fn empty(metadata: MatchMetadata) -> Result<Self> {
        Ok(TrajectoryBuilder::new(metadata)?.build())
    }

    pub fn metadata(&self) -> &MatchMetadata {
        &self.metadata
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn frame_ids(&self) -> &[u64] {
        &self.frame_ids
    }

    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    pub fn timestamp(&self, row: usize) -> f64 {
        self.timestamps[row]
    }

    pub fn ball(&self, row: usize) -> Option<Coordinate> {
        self.ball[row]
    }

    pub fn ball_state(&self, row: usize) -> Option<BallState> {
        self.ball_state[row]
    }

    /// First and last timestamp, `None` without frames.
    pub fn time_range(&self) -> Option<(f64, f64)> {
        Some((*self.timestamps.first()?, *self.timestamps.last()?))
    }

    /// Row of the first frame at or after `time`.
    pub fn row_at_or_after(&self, time: f64) -> Option<usize> {
        let row = self.timestamps.partition_point(|&t| t < time);
        (row < self.len()).then_some(row)
    }

    /// Event stream, empty when none was loaded.
    pub fn events(&self) -> &[MatchEvent] {
        self.events.as_deref().unwrap_or(&[])
    }

    pub fn has_event_stream(&self) -> bool {
        self.events.is_some()
    }

    /// Attaches the secondary event stream after checking it against the metadata.
    pub fn with_events(mut self, events: Vec<MatchEvent>) -> Result<Self> {
        for (idx, event) in events.iter().enumerate() {
            match event {
                MatchEvent::Pass(pass) => {
                    if !(pass.end_timestamp >= pass.timestamp) {
                        return Err(PatternError::dataset(format!(
                            "event #{idx}: pass ends at {} before it starts at {}",
                            pass.end_timestamp, pass.timestamp
                        )));
                    }
                    self.check_event_team(idx, &pass.team)?;
                    self.check_event_player(idx, &pass.player)?;
                    if let Some(receiver) = &pass.receiver {
                        self.check_event_player(idx, receiver)?;
                    }
                }
                MatchEvent::SetPiece(set_piece) => {
                    if !set_piece.timestamp.is_finite() {
                        return Err(PatternError::dataset(format!(
                            "event #{idx}: set piece without a valid timestamp"
                        )));
                    }
                    if let Some(team) = &set_piece.team {
                        self.check_event_team(idx, team)?;
                    }
                    if let Some(player) = &set_piece.player {
                        self.check_event_player(idx, player)?;
                    }
                }
                MatchEvent::Other => {}
            }
        }
        self.events = Some(events);
        Ok(self)
    }

    fn check_event_team(&self, idx: usize, team: &str) -> Result<()> {
        if self.metadata.team(team).is_none() {
            return Err(PatternError::dataset(format!("event #{idx}: unknown team '{team}'")));
        }
        Ok(())
    }

    fn check_event_player(&self, idx: usize, player: &str) -> Result<()> {
        if !self.agent_index.contains_key(player) {
            return Err(PatternError::dataset(format!("event #{idx}: unknown player '{player}'")));
        }
        Ok(())
    }

    pub fn team(&self, team_code: &str) -> Result<&TeamInfo> {
        self.metadata
            .team(team_code)
            .ok_or_else(|| PatternError::UnknownTeam { team_code: team_code.to_string() })
    }

    /// Player ids of a team in metadata order.
    pub fn agent_ids_for_team(&self, team_code: &str, include_goalkeeper: bool) -> Result<Vec<&str>> {
        Ok(self.team(team_code)?.player_ids(include_goalkeeper))
    }

    pub fn has_agent(&self, agent_id: &str) -> bool {
        self.agent_index.contains_key(agent_id)
    }

    /// Coordinate column of one player.
    pub fn agent_track(&self, agent_id: &str) -> Result<&[Option<Coordinate>]> {
        self.agent_index
            .get(agent_id)
            .map(|&idx| self.columns[idx].as_slice())
            .ok_or_else(|| PatternError::UnknownAgent { agent_id: agent_id.to_string() })
    }

    /// View restricted to the columns of one team's qualifying players.
    pub fn team_slice(&self, team_code: &str, include_goalkeeper: bool) -> Result<TeamSlice<'_>> {
        let agent_ids = self.agent_ids_for_team(team_code, include_goalkeeper)?;
        let columns = agent_ids
            .iter()
            .map(|id| self.agent_track(id))
            .collect::<Result<Vec<_>>>()?;
        Ok(TeamSlice {
            team_code: self.team(team_code)?.team_id.as_str(),
            agent_ids,
            columns,
            frame_count: self.len(),
        })
    }
}

/// Borrowed per-team view of the position table.
#[derive(Debug, Clone)]
pub struct TeamSlice<'a> {
    team_code: &'a str,
    agent_ids: Vec<&'a str>,
    columns: Vec<&'a [Option<Coordinate>]>,
    frame_count: usize,
}

impl<'a> TeamSlice<'a> {
    pub fn team_code(&self) -> &'a str {
        self.team_code
    }

    pub fn agent_ids(&self) -> &[&'a str] {
        &self.agent_ids
    }

    pub fn agent_count(&self) -> usize {
        self.agent_ids.len()
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Every qualifying player at `row`, `None` where the position is missing.
    pub fn positions_at(&self, row: usize) -> impl Iterator<Item = (&'a str, Option<Coordinate>)> + '_ {
        self.agent_ids.iter().zip(&self.columns).map(move |(id, col)| (*id, col[row]))
    }

    /// Players with a known position at `row`.
    pub fn present_at(&self, row: usize) -> Vec<(&'a str, Coordinate)> {
        self.positions_at(row).filter_map(|(id, pos)| pos.map(|p| (id, p))).collect()
    }
}

/// Accumulates frames in time order and validates them.
#[derive(Debug)]
pub struct TrajectoryBuilder {
    dataset: TrajectoryDataset,
}

impl TrajectoryBuilder {
    pub fn new(metadata: MatchMetadata) -> Result<Self> {
        let mut agents = Vec::new();
        let mut agent_index = HashMap::new();
        let mut team_ids = Vec::new();

        for team in &metadata.teams {
            if team_ids.contains(&team.team_id.as_str()) {
                return Err(PatternError::dataset(format!("duplicate team id '{}'", team.team_id)));
            }
            team_ids.push(team.team_id.as_str());

            for player in &team.players {
                if agent_index.insert(player.player_id.clone(), agents.len()).is_some() {
                    return Err(PatternError::dataset(format!(
                        "duplicate player id '{}'",
                        player.player_id
                    )));
                }
                agents.push(player.player_id.clone());
            }
        }

        let columns = vec![Vec::new(); agents.len()];
        Ok(Self {
            dataset: TrajectoryDataset {
                metadata,
                frame_ids: Vec::new(),
                timestamps: Vec::new(),
                ball: Vec::new(),
                ball_state: Vec::new(),
                agents,
                agent_index,
                columns,
                events: None,
            },
        })
    }

    pub fn agent_ids(&self) -> &[String] {
        &self.dataset.agents
    }

    pub fn push_frame(&mut self, record: FrameRecord) -> Result<()> {
        let ds = &mut self.dataset;

        if !record.timestamp.is_finite() {
            return Err(PatternError::dataset(format!(
                "frame {}: timestamp is not a finite number",
                record.frame_id
            )));
        }
        if let (Some(&last_id), Some(&last_ts)) = (ds.frame_ids.last(), ds.timestamps.last()) {
            if record.frame_id <= last_id {
                return Err(PatternError::dataset(format!(
                    "frame ids must increase: {} after {}",
                    record.frame_id, last_id
                )));
            }
            if record.timestamp <= last_ts {
                return Err(PatternError::dataset(format!(
                    "frame {}: timestamp {} does not increase (previous {})",
                    record.frame_id, record.timestamp, last_ts
                )));
            }
        }

        // resolve the whole row before touching any column
        let mut row = vec![None; ds.columns.len()];
        for (agent_id, coordinate) in &record.positions {
            let idx = *ds.agent_index.get(agent_id).ok_or_else(|| {
                PatternError::dataset(format!(
                    "frame {}: player '{}' is not in the metadata",
                    record.frame_id, agent_id
                ))
            })?;
            if row[idx].is_some() {
                return Err(PatternError::dataset(format!(
                    "frame {}: player '{}' has more than one position",
                    record.frame_id, agent_id
                )));
            }
            // non-finite positions count as missing, as in the CSV loader
            row[idx] = Some(coordinate.is_finite().then_some(*coordinate));
        }

        for (column, position) in ds.columns.iter_mut().zip(row) {
            column.push(position.flatten());
        }
        ds.frame_ids.push(record.frame_id);
        ds.timestamps.push(record.timestamp);
        ds.ball.push(record.ball.filter(Coordinate::is_finite));
        ds.ball_state.push(record.ball_state);
        Ok(())
    }

    pub fn build(self) -> TrajectoryDataset {
        self.dataset
    }
}
