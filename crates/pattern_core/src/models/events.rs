//! Secondary event stream (passes, restarts) supplied next to tracking data.

use serde::{Deserialize, Serialize};

use super::pattern::Coordinate;

/// Restart kinds recognised as set pieces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetPieceKind {
    KickOff,
    GoalKick,
    ThrowIn,
    CornerKick,
    FreeKick,
    Penalty,
}

impl SetPieceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SetPieceKind::KickOff => "kick_off",
            SetPieceKind::GoalKick => "goal_kick",
            SetPieceKind::ThrowIn => "throw_in",
            SetPieceKind::CornerKick => "corner_kick",
            SetPieceKind::FreeKick => "free_kick",
            SetPieceKind::Penalty => "penalty",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassResult {
    Complete,
    Incomplete,
    Offside,
    Out,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassEvent {
    /// Pass start (seconds)
    pub timestamp: f64,
    /// Ball arrival (seconds)
    pub end_timestamp: f64,
    pub team: String,
    pub player: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    pub origin: Coordinate,
    pub destination: Coordinate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<PassResult>,
}

impl PassEvent {
    /// Passes without an explicit result count as complete.
    pub fn is_complete(&self) -> bool {
        matches!(self.result, None | Some(PassResult::Complete))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetPieceEvent {
    /// Moment play resumes (seconds)
    pub timestamp: f64,
    pub kind: SetPieceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MatchEvent {
    Pass(PassEvent),
    SetPiece(SetPieceEvent),
    /// Anything else in the feed; kept so files round-trip but never analysed
    #[serde(other)]
    Other,
}

impl MatchEvent {
    pub fn timestamp(&self) -> Option<f64> {
        match self {
            MatchEvent::Pass(p) => Some(p.timestamp),
            MatchEvent::SetPiece(s) => Some(s.timestamp),
            MatchEvent::Other => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_stream_parsing() {
        let json = r#"[
            {"type":"pass","timestamp":12.0,"end_timestamp":13.2,"team":"HOME","player":"h7",
             "receiver":"h9","origin":{"x":60.0,"y":30.0},"destination":{"x":95.0,"y":34.0}},
            {"type":"set_piece","timestamp":40.0,"kind":"corner_kick","team":"AWAY"},
            {"type":"shot","timestamp":41.5,"xg":0.12}
        ]"#;
        let events: Vec<MatchEvent> = serde_json::from_str(json).unwrap();
        assert_eq!(events.len(), 3);

        match &events[0] {
            MatchEvent::Pass(p) => {
                assert_eq!(p.receiver.as_deref(), Some("h9"));
                assert!(p.is_complete());
            }
            other => panic!("expected pass, got {other:?}"),
        }
        match &events[1] {
            MatchEvent::SetPiece(s) => assert_eq!(s.kind, SetPieceKind::CornerKick),
            other => panic!("expected set piece, got {other:?}"),
        }
        assert_eq!(events[2], MatchEvent::Other);
        assert_eq!(events[2].timestamp(), None);
    }
}
