//! # Pattern Analyses
//!
//! Closed family of detectors. A catalog entry names its analysis by string;
//! resolution happens in two steps:
//!
//! 1. the kind string is matched against [`AnalysisKind`] (`UnknownPatternKind`)
//! 2. the untyped parameters are deserialized into the kind's parameter record
//!    and range-checked (`MalformedParameter`)
//!
//! The resulting [`AnalysisConfig`] is then bound to a dataset as an
//! [`Analysis`], which checks team and player references up front.

pub mod assembler;
pub mod passes_into_box;
pub mod set_pieces;
pub mod team_stretched;
pub mod zone;

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde_json::Value;
use validator::Validate;

use crate::catalog::AnalysisDefinition;
use crate::data::TrajectoryDataset;
use crate::error::{PatternError, Result};
use crate::models::PatternEvent;

pub use assembler::{merge_hits, EventBuilder, FrameHit, HitWindow};
pub use passes_into_box::{PassesIntoTheBox, PassesIntoTheBoxParams};
pub use set_pieces::{RestartSource, SetPieces, SetPiecesParams};
pub use team_stretched::{SpreadMetric, TeamStretched, TeamStretchedParams};
pub use zone::Zone;

/// Common contract of every detector.
///
/// Implementations only read the dataset, so one analysis can run on any
/// thread and always yields the same events for the same input.
pub trait PatternAnalysis: Send + Sync {
    fn kind(&self) -> AnalysisKind;

    /// Code of the owning pattern, stamped on every event
    fn pattern_code(&self) -> &str;

    fn run(&self, dataset: &TrajectoryDataset) -> Result<Vec<PatternEvent>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisKind {
    TeamStretched,
    SetPieces,
    PassesIntoTheBox,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 3] =
        [AnalysisKind::TeamStretched, AnalysisKind::SetPieces, AnalysisKind::PassesIntoTheBox];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::TeamStretched => "team_stretched",
            AnalysisKind::SetPieces => "set_pieces",
            AnalysisKind::PassesIntoTheBox => "passes_into_the_box",
        }
    }
}

impl FromStr for AnalysisKind {
    type Err = String;

    /// Accepts snake_case and CamelCase spellings.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', '-', ' '], "");
        match normalized.as_str() {
            "teamstretched" => Ok(AnalysisKind::TeamStretched),
            "setpieces" | "setpiece" => Ok(AnalysisKind::SetPieces),
            "passesintothebox" | "passesintobox" => Ok(AnalysisKind::PassesIntoTheBox),
            _ => Err(format!("unknown analysis kind '{s}'")),
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed parameter record of one analysis.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisConfig {
    TeamStretched(TeamStretchedParams),
    SetPieces(SetPiecesParams),
    PassesIntoTheBox(PassesIntoTheBoxParams),
}

impl AnalysisConfig {
    pub fn resolve(code: &str, definition: &AnalysisDefinition) -> Result<Self> {
        let kind: AnalysisKind = definition.kind.parse().map_err(|_| {
            PatternError::UnknownPatternKind { code: code.to_string(), kind: definition.kind.clone() }
        })?;
        let params = &definition.parameters;
        Ok(match kind {
            AnalysisKind::TeamStretched => {
                AnalysisConfig::TeamStretched(parse_params(code, kind, params)?)
            }
            AnalysisKind::SetPieces => AnalysisConfig::SetPieces(parse_params(code, kind, params)?),
            AnalysisKind::PassesIntoTheBox => {
                AnalysisConfig::PassesIntoTheBox(parse_params(code, kind, params)?)
            }
        })
    }

    pub fn kind(&self) -> AnalysisKind {
        match self {
            AnalysisConfig::TeamStretched(_) => AnalysisKind::TeamStretched,
            AnalysisConfig::SetPieces(_) => AnalysisKind::SetPieces,
            AnalysisConfig::PassesIntoTheBox(_) => AnalysisKind::PassesIntoTheBox,
        }
    }
}

/// Missing or `null` parameters mean "all defaults".
fn parse_params<P>(code: &str, kind: AnalysisKind, value: &Value) -> Result<P>
where
    P: DeserializeOwned + Validate,
{
    let value = match value {
        Value::Null => Value::Object(Default::default()),
        other => other.clone(),
    };
    let params: P = serde_json::from_value(value)
        .map_err(|e| PatternError::malformed(code, kind.as_str(), e.to_string()))?;
    params
        .validate()
        .map_err(|e| PatternError::malformed(code, kind.as_str(), e.to_string()))?;
    Ok(params)
}

/// Analysis bound to a pattern code, ready to run.
#[derive(Debug, Clone)]
pub enum Analysis {
    TeamStretched(TeamStretched),
    SetPieces(SetPieces),
    PassesIntoTheBox(PassesIntoTheBox),
}

impl Analysis {
    pub fn new(code: &str, config: AnalysisConfig, dataset: &TrajectoryDataset) -> Result<Self> {
        Ok(match config {
            AnalysisConfig::TeamStretched(p) => {
                Analysis::TeamStretched(TeamStretched::new(code, p, dataset)?)
            }
            AnalysisConfig::SetPieces(p) => Analysis::SetPieces(SetPieces::new(code, p, dataset)?),
            AnalysisConfig::PassesIntoTheBox(p) => {
                Analysis::PassesIntoTheBox(PassesIntoTheBox::new(code, p, dataset)?)
            }
        })
    }

    /// Resolves and binds one `{kind, parameters}` entry.
    pub fn from_definition(
        code: &str,
        definition: &AnalysisDefinition,
        dataset: &TrajectoryDataset,
    ) -> Result<Self> {
        Self::new(code, AnalysisConfig::resolve(code, definition)?, dataset)
    }

    fn inner(&self) -> &dyn PatternAnalysis {
        match self {
            Analysis::TeamStretched(a) => a,
            Analysis::SetPieces(a) => a,
            Analysis::PassesIntoTheBox(a) => a,
        }
    }
}

impl PatternAnalysis for Analysis {
    fn kind(&self) -> AnalysisKind {
        self.inner().kind()
    }

    fn pattern_code(&self) -> &str {
        self.inner().pattern_code()
    }

    fn run(&self, dataset: &TrajectoryDataset) -> Result<Vec<PatternEvent>> {
        self.inner().run(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::*;
    use serde_json::json;

    fn definition(kind: &str, parameters: Value) -> AnalysisDefinition {
        AnalysisDefinition { kind: kind.to_string(), parameters }
    }

    #[test]
    fn test_kind_parsing() {
        for kind in AnalysisKind::ALL {
            assert_eq!(kind.as_str().parse::<AnalysisKind>(), Ok(kind));
        }
        assert_eq!("TeamStretched".parse::<AnalysisKind>(), Ok(AnalysisKind::TeamStretched));
        assert_eq!("PassesIntoTheBox".parse::<AnalysisKind>(), Ok(AnalysisKind::PassesIntoTheBox));
        assert!("team_squeezed".parse::<AnalysisKind>().is_err());
    }

    #[test]
    fn test_unknown_kind() {
        let err = AnalysisConfig::resolve("CB_009", &definition("team_squeezed", Value::Null))
            .unwrap_err();
        assert!(matches!(
            err,
            PatternError::UnknownPatternKind { ref code, ref kind } if code == "CB_009" && kind == "team_squeezed"
        ));
    }

    #[test]
    fn test_defaults_fill_missing_parameters() {
        let config = AnalysisConfig::resolve(
            "CB_001",
            &definition("team_stretched", json!({"team_code": "HOME", "threshold": 40})),
        )
        .unwrap();
        match config {
            AnalysisConfig::TeamStretched(p) => {
                assert_eq!(p.metric, SpreadMetric::Width);
                assert_eq!(p.max_gap_frames, 2);
                assert_eq!(p.min_agents, 2);
                assert!(!p.include_goalkeeper);
            }
            other => panic!("unexpected config {other:?}"),
        }

        let config = AnalysisConfig::resolve("CB_002", &definition("set_pieces", Value::Null)).unwrap();
        assert_eq!(config.kind(), AnalysisKind::SetPieces);
    }

    #[test]
    fn test_malformed_parameters() {
        let cases = [
            definition("team_stretched", json!({"team_code": "HOME"})),
            definition("team_stretched", json!({"team_code": "HOME", "threshold": "far"})),
            definition("team_stretched", json!({"team_code": "HOME", "threshold": 4, "colour": 1})),
            definition("team_stretched", json!({"team_code": "HOME", "threshold": 4, "min_agents": 1})),
            definition("set_pieces", json!({"seconds_before": -1.0})),
            definition("set_pieces", json!({"source": "radio"})),
            definition("passes_into_the_box", json!({"zones": [{"shape": "circle"}]})),
        ];
        for case in &cases {
            let err = AnalysisConfig::resolve("CB_X", case).unwrap_err();
            assert!(
                matches!(err, PatternError::MalformedParameter { .. }),
                "{case:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_binding_checks_dataset_references() {
        let dataset = spread_dataset(&[10.0]);
        let def = definition("team_stretched", json!({"team_code": "NOPE", "threshold": 4}));
        assert!(matches!(
            Analysis::from_definition("CB_001", &def, &dataset),
            Err(PatternError::UnknownTeam { .. })
        ));

        let def = definition("passes_into_the_box", json!({"players": ["h2", "x99"]}));
        assert!(matches!(
            Analysis::from_definition("CB_004", &def, &dataset),
            Err(PatternError::UnknownAgent { .. })
        ));
    }

    #[test]
    fn test_dispatch_through_enum() {
        let dataset = spread_dataset(&[10.0, 50.0, 10.0]);
        let def = definition("team_stretched", json!({"team_code": HOME, "threshold": 40}));
        let analysis = Analysis::from_definition("CB_001", &def, &dataset).unwrap();
        assert_eq!(analysis.kind(), AnalysisKind::TeamStretched);
        assert_eq!(analysis.pattern_code(), "CB_001");
        assert_eq!(analysis.run(&dataset).unwrap().len(), 1);
    }
}
