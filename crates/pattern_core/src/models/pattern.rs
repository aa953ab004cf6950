//! Detected patterns and the export envelope handed to the player.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::visualization::Visualization;

/// Planar position in pitch metres (origin = bottom-left corner).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Arithmetic mean of a set of positions, `None` when empty.
    pub fn centroid<'a>(points: impl IntoIterator<Item = &'a Coordinate>) -> Option<Coordinate> {
        let mut count = 0usize;
        let (mut sx, mut sy) = (0.0, 0.0);
        for p in points {
            sx += p.x;
            sy += p.y;
            count += 1;
        }
        if count == 0 {
            return None;
        }
        Some(Coordinate::new(sx / count as f64, sy / count as f64))
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// One detected occurrence of a pattern.
///
/// Field order is the export order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternEvent {
    /// Code of the owning pattern
    pub pattern: String,
    /// Window start (seconds)
    pub start_time: f64,
    /// Representative instant inside the window (seconds)
    pub event_time: f64,
    /// Window end (seconds)
    pub end_time: f64,
    #[serde(default)]
    pub coordinates: Vec<Coordinate>,
    #[serde(default)]
    pub visualizations: Vec<Visualization>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl PatternEvent {
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// `start_time <= event_time <= end_time`
    pub fn is_well_ordered(&self) -> bool {
        self.start_time <= self.event_time && self.event_time <= self.end_time
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// Runtime aggregate for one catalog entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub name: String,
    pub code: String,
    pub in_time: i64,
    pub out_time: i64,
    pub events: Vec<PatternEvent>,
}

impl Pattern {
    pub fn summary(&self) -> PatternSummary {
        PatternSummary { name: self.name.clone(), code: self.code.clone() }
    }
}

/// `{name, code}` entry of the export's catalog summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternSummary {
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportInsert {
    pub patterns: Vec<PatternSummary>,
}

/// Document written for the playback tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternExport {
    pub events: Vec<PatternEvent>,
    pub insert: ExportInsert,
}

impl PatternExport {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn event_count(&self, code: &str) -> usize {
        self.events.iter().filter(|e| e.pattern == code).count()
    }
}
