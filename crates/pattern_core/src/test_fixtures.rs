//! Shared builders for unit tests.

use crate::data::{BallState, FrameRecord, TrajectoryDataset};
use crate::models::{
    Coordinate, Ground, MatchMetadata, PassEvent, Pitch, PlayerInfo, PlayerRole, SetPieceEvent,
    SetPieceKind, TeamInfo,
};

pub const HOME: &str = "HOME";
pub const AWAY: &str = "AWAY";

/// Seconds between fixture frames.
pub const FRAME_STEP: f64 = 0.1;

fn player(id: &str, role: PlayerRole) -> PlayerInfo {
    PlayerInfo { player_id: id.to_string(), name: None, jersey_no: None, position: role }
}

/// HOME: h1 (goalkeeper), h2, h3, h4. AWAY: a1 (goalkeeper), a2, a3.
pub fn two_team_metadata() -> MatchMetadata {
    MatchMetadata {
        pitch: Pitch::default(),
        frame_rate: Some(10.0),
        teams: vec![
            TeamInfo {
                team_id: HOME.to_string(),
                name: Some("Home".to_string()),
                ground: Ground::Home,
                players: vec![
                    player("h1", PlayerRole::Goalkeeper),
                    player("h2", PlayerRole::Defender),
                    player("h3", PlayerRole::Midfielder),
                    player("h4", PlayerRole::Attacker),
                ],
            },
            TeamInfo {
                team_id: AWAY.to_string(),
                name: Some("Away".to_string()),
                ground: Ground::Away,
                players: vec![
                    player("a1", PlayerRole::Goalkeeper),
                    player("a2", PlayerRole::Defender),
                    player("a3", PlayerRole::Attacker),
                ],
            },
        ],
    }
}

/// Frame `i` has id `i + 1` and timestamp `i * FRAME_STEP`.
///
/// HOME outfielders span `spreads[i]` metres across the pitch width around
/// y = 34; the goalkeeper stands on the touchline so including it changes
/// the width.
pub fn spread_frame(row: usize, spread: f64) -> FrameRecord {
    let half = spread * 0.5;
    FrameRecord {
        frame_id: row as u64 + 1,
        timestamp: row as f64 * FRAME_STEP,
        ball: Some(Coordinate::new(52.5, 34.0)),
        ball_state: Some(BallState::Alive),
        positions: vec![
            ("h1".to_string(), Coordinate::new(5.0, 0.0)),
            ("h2".to_string(), Coordinate::new(50.0, 34.0 - half)),
            ("h3".to_string(), Coordinate::new(50.0, 34.0 + half)),
            ("h4".to_string(), Coordinate::new(50.0, 34.0)),
            ("a1".to_string(), Coordinate::new(100.0, 34.0)),
            ("a2".to_string(), Coordinate::new(70.0, 30.0)),
            ("a3".to_string(), Coordinate::new(70.0, 38.0)),
        ],
    }
}

pub fn spread_dataset(spreads: &[f64]) -> TrajectoryDataset {
    let mut builder = TrajectoryDataset::builder(two_team_metadata()).unwrap();
    for (row, &spread) in spreads.iter().enumerate() {
        builder.push_frame(spread_frame(row, spread)).unwrap();
    }
    builder.build()
}

/// Frames built by `frame(row)` for rows `0..count`.
pub fn dataset_from(count: usize, frame: impl Fn(usize) -> FrameRecord) -> TrajectoryDataset {
    let mut builder = TrajectoryDataset::builder(two_team_metadata()).unwrap();
    for row in 0..count {
        builder.push_frame(frame(row)).unwrap();
    }
    builder.build()
}

/// Ball dead for rows in `dead`, alive otherwise, everything else as in [`spread_frame`].
pub fn ball_state_dataset(count: usize, dead: &[std::ops::Range<usize>]) -> TrajectoryDataset {
    dataset_from(count, |row| {
        let mut frame = spread_frame(row, 10.0);
        if dead.iter().any(|r| r.contains(&row)) {
            frame.ball_state = Some(BallState::Dead);
        }
        frame.ball = Some(Coordinate::new(row as f64, 20.0));
        frame
    })
}

pub fn pass(
    player: &str,
    team: &str,
    origin: (f64, f64),
    destination: (f64, f64),
    start: f64,
    end: f64,
) -> PassEvent {
    PassEvent {
        timestamp: start,
        end_timestamp: end,
        team: team.to_string(),
        player: player.to_string(),
        receiver: None,
        origin: origin.into(),
        destination: destination.into(),
        result: None,
    }
}

pub fn set_piece(kind: SetPieceKind, team: Option<&str>, player: Option<&str>, time: f64) -> SetPieceEvent {
    SetPieceEvent {
        timestamp: time,
        kind,
        team: team.map(str::to_string),
        player: player.map(str::to_string),
        coordinates: None,
    }
}
