//! Match metadata: pitch, teams, players and their roles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::pattern::Coordinate;

/// Penalty area depth from the goal line (metres)
pub const PENALTY_AREA_LENGTH_M: f64 = 16.5;
/// Penalty area width (metres)
pub const PENALTY_AREA_WIDTH_M: f64 = 40.32;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pitch {
    /// Goal line to goal line (x axis)
    pub length: f64,
    /// Touchline to touchline (y axis)
    pub width: f64,
}

impl Default for Pitch {
    fn default() -> Self {
        Self { length: 105.0, width: 68.0 }
    }
}

impl Pitch {
    pub fn center(&self) -> Coordinate {
        Coordinate::new(self.length * 0.5, self.width * 0.5)
    }

    /// `(x_min, x_max, y_min, y_max)` of the two penalty areas, left goal first.
    pub fn penalty_areas(&self) -> [(f64, f64, f64, f64); 2] {
        let half = PENALTY_AREA_WIDTH_M.min(self.width) * 0.5;
        let y_min = self.width * 0.5 - half;
        let y_max = self.width * 0.5 + half;
        let depth = PENALTY_AREA_LENGTH_M.min(self.length * 0.5);
        [
            (0.0, depth, y_min, y_max),
            (self.length - depth, self.length, y_min, y_max),
        ]
    }
}

/// Closed set of player roles. Only goalkeepers are non-outfield.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PlayerRole {
    Goalkeeper,
    Defender,
    Midfielder,
    Attacker,
    Unknown,
}

impl PlayerRole {
    pub fn is_outfield(&self) -> bool {
        !matches!(self, PlayerRole::Goalkeeper)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerRole::Goalkeeper => "goalkeeper",
            PlayerRole::Defender => "defender",
            PlayerRole::Midfielder => "midfielder",
            PlayerRole::Attacker => "attacker",
            PlayerRole::Unknown => "unknown",
        }
    }
}

impl FromStr for PlayerRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '-', '_'], "");
        match normalized.as_str() {
            "goalkeeper" | "gk" | "keeper" => Ok(PlayerRole::Goalkeeper),
            "defender" | "df" | "def" | "centreback" | "centerback" | "fullback" | "wingback" => {
                Ok(PlayerRole::Defender)
            }
            "midfielder" | "mf" | "mid" | "midfield" => Ok(PlayerRole::Midfielder),
            "attacker" | "forward" | "fw" | "striker" | "winger" => Ok(PlayerRole::Attacker),
            "unknown" | "" => Ok(PlayerRole::Unknown),
            _ => Err(format!("unknown player role '{s}'")),
        }
    }
}

impl TryFrom<String> for PlayerRole {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PlayerRole> for String {
    fn from(role: PlayerRole) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for PlayerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ground {
    Home,
    Away,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub player_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub jersey_no: Option<u32>,
    #[serde(default = "default_role")]
    pub position: PlayerRole,
}

fn default_role() -> PlayerRole {
    PlayerRole::Unknown
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamInfo {
    pub team_id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub ground: Ground,
    pub players: Vec<PlayerInfo>,
}

impl TeamInfo {
    /// Player ids in metadata order, optionally without goalkeepers.
    pub fn player_ids(&self, include_goalkeeper: bool) -> Vec<&str> {
        self.players
            .iter()
            .filter(|p| include_goalkeeper || p.position.is_outfield())
            .map(|p| p.player_id.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchMetadata {
    #[serde(default)]
    pub pitch: Pitch,
    /// Frames per second of the tracking feed
    #[serde(default)]
    pub frame_rate: Option<f64>,
    pub teams: Vec<TeamInfo>,
}

impl MatchMetadata {
    pub fn team(&self, team_code: &str) -> Option<&TeamInfo> {
        self.teams.iter().find(|t| t.team_id == team_code)
    }

    pub fn player(&self, player_id: &str) -> Option<(&TeamInfo, &PlayerInfo)> {
        self.teams
            .iter()
            .find_map(|t| t.players.iter().find(|p| p.player_id == player_id).map(|p| (t, p)))
    }

    /// All player ids, team by team, in metadata order.
    pub fn all_player_ids(&self) -> impl Iterator<Item = &str> {
        self.teams.iter().flat_map(|t| t.players.iter().map(|p| p.player_id.as_str()))
    }
}
