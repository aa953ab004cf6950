//! # Set Pieces
//!
//! One event per restart of play.
//!
//! Restarts come either from set-piece markers in the event stream or from
//! the tracking feed's ball state, where a dead → alive transition after a
//! long enough stoppage counts as a restart of unknown kind.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use validator::Validate;

use super::assembler::EventBuilder;
use super::{AnalysisKind, PatternAnalysis};
use crate::data::{BallState, TrajectoryDataset};
use crate::error::{PatternError, Result};
use crate::models::visualization::DEFAULT_PAUSE_MS;
use crate::models::{Coordinate, MatchEvent, PatternEvent, SetPieceKind, TimeWindow, Visualization};

pub const DEFAULT_SECONDS_BEFORE: f64 = 2.0;
pub const DEFAULT_SECONDS_AFTER: f64 = 5.0;
/// Shortest stoppage treated as a restart when reading ball state
pub const DEFAULT_MIN_DEAD_SECONDS: f64 = 1.0;

const TAG: &str = "set_piece";
/// Kind tag for restarts detected from ball state
const UNKNOWN_KIND_TAG: &str = "restart";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestartSource {
    #[default]
    Events,
    Tracking,
}

fn default_seconds_before() -> f64 {
    DEFAULT_SECONDS_BEFORE
}

fn default_seconds_after() -> f64 {
    DEFAULT_SECONDS_AFTER
}

fn default_min_dead_seconds() -> f64 {
    DEFAULT_MIN_DEAD_SECONDS
}

fn default_pause_ms() -> f64 {
    DEFAULT_PAUSE_MS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SetPiecesParams {
    #[serde(default)]
    pub source: RestartSource,
    #[serde(default = "default_seconds_before")]
    #[validate(range(min = 0.0))]
    pub seconds_before: f64,
    #[serde(default = "default_seconds_after")]
    #[validate(range(min = 0.0))]
    pub seconds_after: f64,
    /// Kinds to keep; empty keeps all
    #[serde(default)]
    pub kinds: Vec<SetPieceKind>,
    #[serde(default)]
    pub team_code: Option<String>,
    #[serde(default = "default_min_dead_seconds")]
    #[validate(range(min = 0.0))]
    pub min_dead_seconds: f64,
    /// Playback pause at the restart (ms)
    #[serde(default = "default_pause_ms")]
    #[validate(range(min = 0.0))]
    pub pause_ms: f64,
}

impl Default for SetPiecesParams {
    fn default() -> Self {
        Self {
            source: RestartSource::Events,
            seconds_before: DEFAULT_SECONDS_BEFORE,
            seconds_after: DEFAULT_SECONDS_AFTER,
            kinds: Vec::new(),
            team_code: None,
            min_dead_seconds: DEFAULT_MIN_DEAD_SECONDS,
            pause_ms: DEFAULT_PAUSE_MS,
        }
    }
}

/// A moment play resumed.
#[derive(Debug, Clone, PartialEq)]
struct Restart {
    time: f64,
    kind: Option<SetPieceKind>,
    team: Option<String>,
    player: Option<String>,
    location: Option<Coordinate>,
}

#[derive(Debug, Clone)]
pub struct SetPieces {
    code: String,
    params: SetPiecesParams,
}

impl SetPieces {
    pub fn new(code: &str, params: SetPiecesParams, dataset: &TrajectoryDataset) -> Result<Self> {
        if params.source == RestartSource::Tracking
            && (!params.kinds.is_empty() || params.team_code.is_some())
        {
            return Err(PatternError::malformed(
                code,
                AnalysisKind::SetPieces.as_str(),
                "kinds and team_code filters need source: events",
            ));
        }
        if let Some(team) = &params.team_code {
            dataset.team(team)?;
        }
        Ok(Self { code: code.to_string(), params })
    }

    fn restarts_from_events(&self, dataset: &TrajectoryDataset) -> Vec<Restart> {
        dataset
            .events()
            .iter()
            .filter_map(|event| match event {
                MatchEvent::SetPiece(marker) => Some(marker),
                _ => None,
            })
            .filter(|marker| self.params.kinds.is_empty() || self.params.kinds.contains(&marker.kind))
            .filter(|marker| match &self.params.team_code {
                Some(team) => marker.team.as_deref() == Some(team.as_str()),
                None => true,
            })
            .map(|marker| Restart {
                time: marker.timestamp,
                kind: Some(marker.kind),
                team: marker.team.clone(),
                player: marker.player.clone(),
                location: marker.coordinates,
            })
            .collect()
    }

    fn restarts_from_tracking(&self, dataset: &TrajectoryDataset) -> Vec<Restart> {
        let mut restarts = Vec::new();
        let mut dead_since: Option<usize> = None;

        for row in 0..dataset.len() {
            match dataset.ball_state(row) {
                Some(BallState::Dead) => {
                    dead_since.get_or_insert(row);
                }
                Some(BallState::Alive) => {
                    if let Some(start) = dead_since.take() {
                        let stoppage = dataset.timestamp(row) - dataset.timestamp(start);
                        if stoppage >= self.params.min_dead_seconds {
                            restarts.push(Restart {
                                time: dataset.timestamp(row),
                                kind: None,
                                team: None,
                                player: None,
                                location: dataset.ball(row),
                            });
                        }
                    }
                }
                // unknown state neither ends nor starts a stoppage
                None => {}
            }
        }
        restarts
    }

    /// `[t - before, t + after]`, clamped to the tracked time range.
    fn window_around(&self, time: f64, dataset: &TrajectoryDataset) -> (f64, f64) {
        let start = time - self.params.seconds_before;
        let end = time + self.params.seconds_after;
        match dataset.time_range() {
            Some((first, last)) => (start.max(first).min(time), end.min(last).max(time)),
            None => (start, end),
        }
    }

    /// Windows for time-ordered restarts, trimmed so neighbours never overlap.
    ///
    /// A window ends no later than the next one starts and never before its
    /// own restart.
    fn windows(&self, restarts: &[Restart], dataset: &TrajectoryDataset) -> Vec<(f64, f64)> {
        let mut windows: Vec<(f64, f64)> =
            restarts.iter().map(|r| self.window_around(r.time, dataset)).collect();
        for i in 1..windows.len() {
            let time = restarts[i - 1].time;
            let next_start = windows[i].0;
            let prev = &mut windows[i - 1];
            prev.1 = prev.1.min(next_start.max(time));
            let prev_end = prev.1;
            windows[i].0 = windows[i].0.max(prev_end);
        }
        windows
    }

    fn build_event(&self, restart: &Restart, (start, end): (f64, f64)) -> Result<PatternEvent> {
        let mut builder = EventBuilder::new(self.code.as_str(), start, restart.time, end)
            .visualization(Visualization::pause(self.params.pause_ms)?)
            .tag(TAG)
            .tag(restart.kind.map_or(UNKNOWN_KIND_TAG, |k| k.as_str()));

        if let Some(location) = restart.location {
            builder = builder.coordinate(location);
        }
        if let Some(player) = &restart.player {
            let span = TimeWindow::new(start, end)?;
            builder = builder.visualization(Visualization::players(span, vec![player.clone()]));
        }
        if let Some(team) = &restart.team {
            builder = builder.tag(team.as_str());
        }
        builder.build()
    }
}

impl PatternAnalysis for SetPieces {
    fn kind(&self) -> AnalysisKind {
        AnalysisKind::SetPieces
    }

    fn pattern_code(&self) -> &str {
        &self.code
    }

    fn run(&self, dataset: &TrajectoryDataset) -> Result<Vec<PatternEvent>> {
        if dataset.is_empty() {
            return Ok(Vec::new());
        }
        let mut restarts = match self.params.source {
            RestartSource::Events => {
                if !dataset.has_event_stream() {
                    warn!(code = %self.code, "No event stream loaded; set_pieces yields nothing");
                    return Ok(Vec::new());
                }
                self.restarts_from_events(dataset)
            }
            RestartSource::Tracking => self.restarts_from_tracking(dataset),
        };

        restarts.sort_by(|a, b| a.time.total_cmp(&b.time));

        let events = restarts
            .iter()
            .zip(self.windows(&restarts, dataset))
            .map(|(restart, window)| self.build_event(restart, window))
            .collect::<Result<Vec<_>>>()?;
        debug!(code = %self.code, source = ?self.params.source, events = events.len(), "set_pieces done");
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SetPieceKind::*;
    use crate::test_fixtures::*;

    /// 30 s of frames with three markers.
    fn marker_dataset() -> TrajectoryDataset {
        let mut corner = set_piece(CornerKick, Some(HOME), Some("h3"), 10.0);
        corner.coordinates = Some(Coordinate::new(105.0, 0.0));
        spread_dataset(&[10.0; 300])
            .with_events(vec![
                MatchEvent::SetPiece(set_piece(KickOff, Some(AWAY), None, 1.0)),
                MatchEvent::SetPiece(corner),
                MatchEvent::Pass(pass("h3", HOME, (105.0, 0.0), (95.0, 34.0), 10.0, 11.0)),
                MatchEvent::SetPiece(set_piece(ThrowIn, Some(AWAY), Some("a2"), 29.0)),
            ])
            .unwrap()
    }

    fn run(dataset: &TrajectoryDataset, params: SetPiecesParams) -> Vec<PatternEvent> {
        SetPieces::new("CB_002", params, dataset).unwrap().run(dataset).unwrap()
    }

    #[test]
    fn test_markers_become_windows() {
        let dataset = marker_dataset();
        let events = run(&dataset, SetPiecesParams::default());
        assert_eq!(events.len(), 3);

        let (first, last) = dataset.time_range().unwrap();
        assert_eq!((events[0].start_time, events[0].event_time, events[0].end_time), (first, 1.0, 6.0));
        assert_eq!((events[1].start_time, events[1].event_time, events[1].end_time), (8.0, 10.0, 15.0));
        assert_eq!((events[2].start_time, events[2].end_time), (27.0, last));
        assert!(events.iter().all(PatternEvent::is_well_ordered));
    }

    #[test]
    fn test_close_restarts_do_not_overlap() {
        let dataset = spread_dataset(&[10.0; 300])
            .with_events(vec![
                MatchEvent::SetPiece(set_piece(FreeKick, Some(HOME), None, 13.0)),
                MatchEvent::SetPiece(set_piece(ThrowIn, Some(AWAY), None, 10.0)),
                MatchEvent::SetPiece(set_piece(Penalty, Some(HOME), None, 13.0)),
            ])
            .unwrap();
        let events = run(&dataset, SetPiecesParams::default());

        assert_eq!(events.len(), 3);
        assert!(events[0].has_tag("throw_in"));
        assert_eq!((events[0].start_time, events[0].event_time, events[0].end_time), (8.0, 10.0, 11.0));
        assert_eq!((events[1].start_time, events[1].event_time, events[1].end_time), (11.0, 13.0, 13.0));
        assert_eq!((events[2].start_time, events[2].event_time, events[2].end_time), (13.0, 13.0, 18.0));
        for pair in events.windows(2) {
            assert!(pair[0].end_time <= pair[1].start_time);
        }
        assert!(events.iter().all(PatternEvent::is_well_ordered));
    }

    #[test]
    fn test_event_contents() {
        let dataset = marker_dataset();
        let corner = &run(&dataset, SetPiecesParams::default())[1];

        assert_eq!(corner.coordinates, vec![Coordinate::new(105.0, 0.0)]);
        assert!(corner.has_tag("set_piece"));
        assert!(corner.has_tag("corner_kick"));
        assert!(corner.has_tag(HOME));
        assert_eq!(corner.visualizations[0], Visualization::Pause { pause_time: DEFAULT_PAUSE_MS });
        match &corner.visualizations[1] {
            Visualization::Players { players, .. } => assert_eq!(players, &vec!["h3".to_string()]),
            other => panic!("unexpected visualization {other:?}"),
        }
    }

    #[test]
    fn test_kind_and_team_filters() {
        let dataset = marker_dataset();

        let corners = SetPiecesParams { kinds: vec![CornerKick], ..Default::default() };
        assert_eq!(run(&dataset, corners).len(), 1);

        let away = SetPiecesParams { team_code: Some(AWAY.into()), ..Default::default() };
        let events = run(&dataset, away);
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.has_tag(AWAY)));
    }

    #[test]
    fn test_restarts_from_ball_state() {
        // long stoppage on rows 5..20, short one on rows 30..33
        let dataset = ball_state_dataset(40, &[5..20, 30..33]);
        let params = SetPiecesParams { source: RestartSource::Tracking, ..Default::default() };
        let events = run(&dataset, params);

        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.event_time, dataset.timestamp(20));
        assert!(event.start_time.abs() < 1e-9);
        assert_eq!(event.end_time, dataset.time_range().unwrap().1);
        assert_eq!(event.coordinates, vec![Coordinate::new(20.0, 20.0)]);
        assert!(event.has_tag("restart"));
    }

    #[test]
    fn test_shorter_min_dead_keeps_short_stoppages() {
        let dataset = ball_state_dataset(40, &[5..20, 30..33]);
        let params = SetPiecesParams {
            source: RestartSource::Tracking,
            min_dead_seconds: 0.2,
            ..Default::default()
        };
        assert_eq!(run(&dataset, params).len(), 2);
    }

    #[test]
    fn test_missing_stream_and_empty_dataset() {
        assert!(run(&spread_dataset(&[10.0; 5]), SetPiecesParams::default()).is_empty());

        let empty = TrajectoryDataset::empty(two_team_metadata()).unwrap();
        assert!(run(&empty, SetPiecesParams::default()).is_empty());
        let tracking = SetPiecesParams { source: RestartSource::Tracking, ..Default::default() };
        assert!(run(&empty, tracking).is_empty());
    }

    #[test]
    fn test_tracking_source_rejects_event_filters() {
        let dataset = spread_dataset(&[10.0]);
        let params = SetPiecesParams {
            source: RestartSource::Tracking,
            kinds: vec![Penalty],
            ..Default::default()
        };
        assert!(matches!(
            SetPieces::new("CB_002", params, &dataset),
            Err(PatternError::MalformedParameter { .. })
        ));

        let params = SetPiecesParams { team_code: Some("NOPE".into()), ..Default::default() };
        assert!(matches!(
            SetPieces::new("CB_002", params, &dataset),
            Err(PatternError::UnknownTeam { .. })
        ));
    }
}
