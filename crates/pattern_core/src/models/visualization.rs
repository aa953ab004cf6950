//! Visualization overlays attached to pattern events.
//!
//! Each tool serializes with a `tool_id` tag followed by its window (when it
//! has one), its targets and a camelCase options record. Option ranges are
//! checked by `validator` whenever a visualization is built or validated.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::error::{PatternError, Result};

pub const DEFAULT_TRAIL_COLOR: &str = "#E66F7E";
pub const DEFAULT_PAUSE_MS: f64 = 5000.0;

fn validate_hex_color(color: &str) -> std::result::Result<(), ValidationError> {
    let bytes = color.as_bytes();
    if bytes.len() == 7 && bytes[0] == b'#' && bytes[1..].iter().all(u8::is_ascii_hexdigit) {
        Ok(())
    } else {
        Err(ValidationError::new("hex_color"))
    }
}

/// Time window shared by the windowed tools.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    start_time: f64,
    end_time: f64,
}

impl TimeWindow {
    pub fn new(start_time: f64, end_time: f64) -> Result<Self> {
        if !(start_time <= end_time) {
            return Err(PatternError::InvalidVisualization(format!(
                "window start {start_time} after end {end_time}"
            )));
        }
        Ok(Self { start_time, end_time })
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn end_time(&self) -> f64 {
        self.end_time
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayersOptions {
    pub id: bool,
    pub speed: bool,
    pub spotlight: bool,
    pub ring: bool,
    #[validate(custom = "validate_hex_color")]
    pub spotlight_color: String,
    #[validate(custom = "validate_hex_color")]
    pub ring_color: String,
    /// Multiplier
    #[validate(range(min = 0.6, max = 1.5))]
    pub size: f64,
}

impl Default for PlayersOptions {
    fn default() -> Self {
        Self {
            id: true,
            speed: true,
            spotlight: false,
            ring: false,
            spotlight_color: "#FFFFFF".to_string(),
            ring_color: "#000000".to_string(),
            size: 1.0,
        }
    }
}

/// Options for both past and future trails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct TrailOptions {
    #[validate(custom = "validate_hex_color")]
    pub color: String,
    #[validate(range(min = 0.5, max = 2.0))]
    pub width: f64,
}

impl Default for TrailOptions {
    fn default() -> Self {
        Self { color: DEFAULT_TRAIL_COLOR.to_string(), width: 1.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct MagnifierOptions {
    #[validate(range(min = 0.2, max = 1.5))]
    pub zoom: f64,
    #[validate(range(min = 0.5, max = 1.5))]
    pub size: f64,
}

impl Default for MagnifierOptions {
    fn default() -> Self {
        Self { zoom: 1.0, size: 1.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct MeasurerOptions {
    #[validate(custom = "validate_hex_color")]
    pub color: String,
    #[validate(range(min = 0.5, max = 2.0))]
    pub width: f64,
    pub filled: bool,
    pub distances: bool,
    pub closed: bool,
}

impl Default for MeasurerOptions {
    fn default() -> Self {
        Self {
            color: "#040602".to_string(),
            width: 1.0,
            filled: false,
            distances: true,
            closed: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct TeamSizeOptions {
    #[validate(custom = "validate_hex_color")]
    pub color: String,
}

impl Default for TeamSizeOptions {
    fn default() -> Self {
        Self { color: DEFAULT_TRAIL_COLOR.to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct TacticalLinesOptions {
    #[validate(custom = "validate_hex_color")]
    pub color: String,
    pub distances: bool,
    /// Only honoured for the midfielders line
    pub closed: bool,
}

impl Default for TacticalLinesOptions {
    fn default() -> Self {
        Self { color: DEFAULT_TRAIL_COLOR.to_string(), distances: false, closed: false }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct ChromaKeyOptions {
    #[validate(range(min = 0.0, max = 1.0))]
    pub threshold: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub smoothing: f64,
}

impl Default for ChromaKeyOptions {
    fn default() -> Self {
        Self { threshold: 0.01, smoothing: 0.1 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamSizeLine {
    Width,
    Length,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TacticalLine {
    Defenders,
    Midfielders,
    Strikers,
}

/// Overlay annotation rendered by the playback tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tool_id")]
pub enum Visualization {
    #[serde(rename = "players")]
    Players { start_time: f64, end_time: f64, players: Vec<String>, options: PlayersOptions },
    #[serde(rename = "trails")]
    Trails { start_time: f64, end_time: f64, players: Vec<String>, options: TrailOptions },
    #[serde(rename = "futureTrails")]
    FutureTrails { start_time: f64, end_time: f64, players: Vec<String>, options: TrailOptions },
    #[serde(rename = "magnifiers")]
    Magnifiers { start_time: f64, end_time: f64, players: Vec<String>, options: MagnifierOptions },
    #[serde(rename = "measurer")]
    Measurer { start_time: f64, end_time: f64, players: Vec<String>, options: MeasurerOptions },
    #[serde(rename = "teamSize")]
    TeamSize {
        start_time: f64,
        end_time: f64,
        team: String,
        line: TeamSizeLine,
        options: TeamSizeOptions,
    },
    #[serde(rename = "tacticalLines")]
    TacticalLines {
        start_time: f64,
        end_time: f64,
        team: String,
        line: TacticalLine,
        options: TacticalLinesOptions,
    },
    /// Playback pause in milliseconds
    #[serde(rename = "pause")]
    Pause { pause_time: f64 },
    #[serde(rename = "chromaKey")]
    ChromaKey { options: ChromaKeyOptions },
}

fn check(options: &impl Validate) -> Result<()> {
    options.validate().map_err(|e| PatternError::InvalidVisualization(e.to_string()))
}

impl Visualization {
    pub fn players(window: TimeWindow, players: Vec<String>) -> Self {
        Visualization::Players {
            start_time: window.start_time,
            end_time: window.end_time,
            players,
            options: PlayersOptions::default(),
        }
    }

    pub fn players_with(
        window: TimeWindow,
        players: Vec<String>,
        options: PlayersOptions,
    ) -> Result<Self> {
        check(&options)?;
        Ok(Visualization::Players {
            start_time: window.start_time,
            end_time: window.end_time,
            players,
            options,
        })
    }

    pub fn trails(window: TimeWindow, players: Vec<String>) -> Self {
        Visualization::Trails {
            start_time: window.start_time,
            end_time: window.end_time,
            players,
            options: TrailOptions::default(),
        }
    }

    pub fn future_trails(window: TimeWindow, players: Vec<String>) -> Self {
        Visualization::FutureTrails {
            start_time: window.start_time,
            end_time: window.end_time,
            players,
            options: TrailOptions::default(),
        }
    }

    pub fn magnifiers_with(
        window: TimeWindow,
        players: Vec<String>,
        options: MagnifierOptions,
    ) -> Result<Self> {
        check(&options)?;
        Ok(Visualization::Magnifiers {
            start_time: window.start_time,
            end_time: window.end_time,
            players,
            options,
        })
    }

    pub fn measurer(window: TimeWindow, players: Vec<String>) -> Self {
        Visualization::Measurer {
            start_time: window.start_time,
            end_time: window.end_time,
            players,
            options: MeasurerOptions::default(),
        }
    }

    pub fn team_size(window: TimeWindow, team: impl Into<String>, line: TeamSizeLine) -> Self {
        Visualization::TeamSize {
            start_time: window.start_time,
            end_time: window.end_time,
            team: team.into(),
            line,
            options: TeamSizeOptions::default(),
        }
    }

    pub fn tactical_lines(window: TimeWindow, team: impl Into<String>, line: TacticalLine) -> Self {
        Visualization::TacticalLines {
            start_time: window.start_time,
            end_time: window.end_time,
            team: team.into(),
            line,
            options: TacticalLinesOptions::default(),
        }
    }

    pub fn pause(pause_time_ms: f64) -> Result<Self> {
        if !(pause_time_ms >= 0.0) {
            return Err(PatternError::InvalidVisualization(format!(
                "pause_time must be >= 0, got {pause_time_ms}"
            )));
        }
        Ok(Visualization::Pause { pause_time: pause_time_ms })
    }

    pub fn chroma_key_with(options: ChromaKeyOptions) -> Result<Self> {
        check(&options)?;
        Ok(Visualization::ChromaKey { options })
    }

    pub fn tool_id(&self) -> &'static str {
        match self {
            Visualization::Players { .. } => "players",
            Visualization::Trails { .. } => "trails",
            Visualization::FutureTrails { .. } => "futureTrails",
            Visualization::Magnifiers { .. } => "magnifiers",
            Visualization::Measurer { .. } => "measurer",
            Visualization::TeamSize { .. } => "teamSize",
            Visualization::TacticalLines { .. } => "tacticalLines",
            Visualization::Pause { .. } => "pause",
            Visualization::ChromaKey { .. } => "chromaKey",
        }
    }

    /// `(start_time, end_time)` for windowed tools.
    pub fn window(&self) -> Option<(f64, f64)> {
        match self {
            Visualization::Players { start_time, end_time, .. }
            | Visualization::Trails { start_time, end_time, .. }
            | Visualization::FutureTrails { start_time, end_time, .. }
            | Visualization::Magnifiers { start_time, end_time, .. }
            | Visualization::Measurer { start_time, end_time, .. }
            | Visualization::TeamSize { start_time, end_time, .. }
            | Visualization::TacticalLines { start_time, end_time, .. } => {
                Some((*start_time, *end_time))
            }
            Visualization::Pause { .. } | Visualization::ChromaKey { .. } => None,
        }
    }

    /// Re-checks window ordering and option ranges, e.g. after deserialization.
    pub fn validate(&self) -> Result<()> {
        if let Some((start, end)) = self.window() {
            TimeWindow::new(start, end)?;
        }
        match self {
            Visualization::Players { options, .. } => check(options),
            Visualization::Trails { options, .. } | Visualization::FutureTrails { options, .. } => {
                check(options)
            }
            Visualization::Magnifiers { options, .. } => check(options),
            Visualization::Measurer { options, .. } => check(options),
            Visualization::TeamSize { options, .. } => check(options),
            Visualization::TacticalLines { options, .. } => check(options),
            Visualization::Pause { pause_time } => Visualization::pause(*pause_time).map(|_| ()),
            Visualization::ChromaKey { options } => check(options),
        }
    }
}
