//! Dataset loading.
//!
//! - metadata: JSON or YAML (picked by file extension)
//! - tracking: CSV with `frame_id,timestamp[,ball_state][,ball_x,ball_y],<player>_x,<player>_y,...`
//! - events: JSON array of tagged match events

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use tracing::{debug, info};

use super::trajectory::{BallState, FrameRecord, TrajectoryDataset};
use crate::error::{PatternError, Result};
use crate::models::{Coordinate, MatchEvent, MatchMetadata};

enum Column {
    FrameId,
    Timestamp,
    BallState,
    BallX,
    BallY,
    PlayerX(String),
    PlayerY(String),
}

/// Loads metadata + tracking files and, optionally, the event stream.
pub fn load_game_data(
    metadata_path: &Path,
    tracking_path: &Path,
    events_path: Option<&Path>,
) -> Result<TrajectoryDataset> {
    let metadata = load_metadata(metadata_path)?;
    let file = File::open(tracking_path).map_err(|e| {
        PatternError::dataset(format!("cannot open {}: {}", tracking_path.display(), e))
    })?;
    let mut dataset = read_tracking(metadata, BufReader::new(file))?;

    if let Some(path) = events_path {
        let events = load_events(path)?;
        dataset = dataset.with_events(events)?;
    }

    info!(
        frames = dataset.len(),
        teams = dataset.metadata().teams.len(),
        events = dataset.events().len(),
        "Loaded tracking dataset from {}",
        tracking_path.display()
    );
    Ok(dataset)
}

pub fn load_metadata(path: &Path) -> Result<MatchMetadata> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| PatternError::dataset(format!("cannot read {}: {}", path.display(), e)))?;
    if is_yaml(path) {
        serde_yaml::from_str(&text)
            .map_err(|e| PatternError::dataset(format!("metadata {}: {}", path.display(), e)))
    } else {
        parse_metadata_json(&text)
    }
}

pub fn parse_metadata_json(json: &str) -> Result<MatchMetadata> {
    serde_json::from_str(json).map_err(|e| PatternError::dataset(format!("metadata: {e}")))
}

pub fn load_events(path: &Path) -> Result<Vec<MatchEvent>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| PatternError::dataset(format!("cannot read {}: {}", path.display(), e)))?;
    parse_events_json(&text)
}

pub fn parse_events_json(json: &str) -> Result<Vec<MatchEvent>> {
    serde_json::from_str(json).map_err(|e| PatternError::dataset(format!("events: {e}")))
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()).as_deref(),
        Some("yaml" | "yml")
    )
}

/// Parses the tracking table and validates it against `metadata`.
pub fn read_tracking<R: Read>(metadata: MatchMetadata, reader: R) -> Result<TrajectoryDataset> {
    let mut builder = TrajectoryDataset::builder(metadata)?;
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| PatternError::dataset(format!("tracking header: {e}")))?
        .clone();
    let columns = classify_headers(&headers, builder.agent_ids())?;

    for (line, record) in csv_reader.records().enumerate() {
        // header is line 1
        let line = line + 2;
        let record =
            record.map_err(|e| PatternError::dataset(format!("tracking line {line}: {e}")))?;
        if record.len() != columns.len() {
            return Err(PatternError::dataset(format!(
                "tracking line {line}: expected {} fields, found {}",
                columns.len(),
                record.len()
            )));
        }

        let frame = parse_row(&columns, &record, line)?;
        builder.push_frame(frame)?;
    }

    let dataset = builder.build();
    debug!(frames = dataset.len(), "Parsed tracking table");
    Ok(dataset)
}

fn classify_headers(headers: &csv::StringRecord, agents: &[String]) -> Result<Vec<Column>> {
    let mut columns = Vec::with_capacity(headers.len());
    for header in headers.iter() {
        let column = match header {
            "frame_id" => Column::FrameId,
            "timestamp" => Column::Timestamp,
            "ball_state" => Column::BallState,
            "ball_x" => Column::BallX,
            "ball_y" => Column::BallY,
            other => {
                let (agent, axis) = other
                    .rsplit_once('_')
                    .ok_or_else(|| PatternError::dataset(format!("unexpected column '{other}'")))?;
                if !agents.iter().any(|a| a == agent) {
                    return Err(PatternError::dataset(format!(
                        "column '{other}' references player '{agent}' missing from metadata"
                    )));
                }
                match axis {
                    "x" => Column::PlayerX(agent.to_string()),
                    "y" => Column::PlayerY(agent.to_string()),
                    _ => {
                        return Err(PatternError::dataset(format!("unexpected column '{other}'")))
                    }
                }
            }
        };
        columns.push(column);
    }

    let has = |pred: fn(&Column) -> bool| columns.iter().filter(|c| pred(c)).count();
    if has(|c| matches!(c, Column::FrameId)) != 1 || has(|c| matches!(c, Column::Timestamp)) != 1 {
        return Err(PatternError::dataset(
            "tracking header needs exactly one frame_id and one timestamp column",
        ));
    }
    if has(|c| matches!(c, Column::BallX)) != has(|c| matches!(c, Column::BallY)) {
        return Err(PatternError::dataset("ball_x and ball_y must come together"));
    }
    for column in &columns {
        if let Column::PlayerX(agent) = column {
            let ys = columns.iter().filter(|c| matches!(c, Column::PlayerY(a) if a == agent)).count();
            let xs = columns.iter().filter(|c| matches!(c, Column::PlayerX(a) if a == agent)).count();
            if xs != 1 || ys != 1 {
                return Err(PatternError::dataset(format!(
                    "player '{agent}' needs exactly one _x and one _y column"
                )));
            }
        }
    }
    for column in &columns {
        if let Column::PlayerY(agent) = column {
            if !columns.iter().any(|c| matches!(c, Column::PlayerX(a) if a == agent)) {
                return Err(PatternError::dataset(format!("player '{agent}' has no _x column")));
            }
        }
    }
    Ok(columns)
}

fn parse_optional(value: &str, line: usize, column: &str) -> Result<Option<f64>> {
    if value.is_empty() || value.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    value
        .parse::<f64>()
        .map(|v| v.is_finite().then_some(v))
        .map_err(|_| PatternError::dataset(format!("line {line}: bad number '{value}' in {column}")))
}

fn parse_row(columns: &[Column], record: &csv::StringRecord, line: usize) -> Result<FrameRecord> {
    let mut frame = FrameRecord::default();
    let mut ball = (None, None);
    // (agent, x, y) in column order
    let mut partial: Vec<(&str, Option<f64>, Option<f64>)> = Vec::new();

    for (column, value) in columns.iter().zip(record.iter()) {
        match column {
            Column::FrameId => {
                frame.frame_id = value.parse().map_err(|_| {
                    PatternError::dataset(format!("line {line}: bad frame_id '{value}'"))
                })?;
            }
            Column::Timestamp => {
                frame.timestamp = parse_optional(value, line, "timestamp")?.ok_or_else(|| {
                    PatternError::dataset(format!("line {line}: missing timestamp"))
                })?;
            }
            Column::BallState => {
                frame.ball_state = match value.to_ascii_lowercase().as_str() {
                    "" => None,
                    "alive" => Some(BallState::Alive),
                    "dead" => Some(BallState::Dead),
                    other => {
                        return Err(PatternError::dataset(format!(
                            "line {line}: bad ball_state '{other}'"
                        )))
                    }
                };
            }
            Column::BallX => ball.0 = parse_optional(value, line, "ball_x")?,
            Column::BallY => ball.1 = parse_optional(value, line, "ball_y")?,
            Column::PlayerX(agent) | Column::PlayerY(agent) => {
                let v = parse_optional(value, line, agent)?;
                let idx = match partial.iter().position(|(a, _, _)| *a == agent.as_str()) {
                    Some(idx) => idx,
                    None => {
                        partial.push((agent.as_str(), None, None));
                        partial.len() - 1
                    }
                };
                let entry = &mut partial[idx];
                if matches!(column, Column::PlayerX(_)) {
                    entry.1 = v;
                } else {
                    entry.2 = v;
                }
            }
        }
    }

    if let (Some(x), Some(y)) = ball {
        frame.ball = Some(Coordinate::new(x, y));
    }
    frame.positions = partial
        .into_iter()
        .filter_map(|(agent, x, y)| Some((agent.to_string(), Coordinate::new(x?, y?))))
        .collect();
    Ok(frame)
}
