//! # Pattern Catalog
//!
//! Ordered, declarative list of pattern definitions read from YAML or JSON.
//!
//! ```yaml
//! patterns:
//!   - name: Team Stretched
//!     code: CB_001
//!     include: true
//!     kind: team_stretched          # single-analysis shorthand
//!     parameters: { team_code: HOME, threshold: 40 }
//!   - name: Set Pieces
//!     code: CB_002
//!     analyses:                     # or several analyses per pattern
//!       - kind: set_pieces
//! ```
//!
//! Analysis kinds stay plain strings here. They are resolved into typed
//! parameter records only when the pattern is included and initialized, so an
//! excluded entry is never validated.

use std::collections::HashSet;
use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{PatternError, Result};

const DEFAULT_CATALOG_YAML: &str = include_str!("default_catalog.yaml");

/// One `{kind, parameters}` entry of a pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct AnalysisDefinition {
    /// Analysis kind, e.g. `team_stretched`
    pub kind: String,
    /// Kind-specific parameters
    #[serde(default)]
    pub parameters: Value,
}

/// Catalog entry as written in the file.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
struct RawDefinition {
    name: String,
    code: String,
    #[serde(default = "default_include")]
    include: bool,
    #[serde(default)]
    in_time: i64,
    #[serde(default)]
    out_time: i64,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    parameters: Option<Value>,
    #[serde(default, alias = "pattern_analysis")]
    analyses: Vec<AnalysisDefinition>,
}

fn default_include() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    patterns: Vec<RawDefinition>,
}

/// Immutable, normalized catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternDefinition {
    pub name: String,
    pub code: String,
    pub include: bool,
    pub in_time: i64,
    pub out_time: i64,
    pub analyses: Vec<AnalysisDefinition>,
}

impl PatternDefinition {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            include: true,
            in_time: 0,
            out_time: 0,
            analyses: Vec::new(),
        }
    }

    pub fn with_analysis(mut self, kind: impl Into<String>, parameters: Value) -> Self {
        self.analyses.push(AnalysisDefinition { kind: kind.into(), parameters });
        self
    }

    pub fn excluded(mut self) -> Self {
        self.include = false;
        self
    }

    fn from_raw(raw: RawDefinition) -> Result<Self> {
        let mut analyses = Vec::new();
        match (raw.kind, raw.parameters) {
            (Some(kind), parameters) => {
                analyses.push(AnalysisDefinition { kind, parameters: parameters.unwrap_or(Value::Null) })
            }
            (None, Some(_)) => {
                return Err(PatternError::Catalog(format!(
                    "pattern {}: 'parameters' given without 'kind'",
                    raw.code
                )))
            }
            (None, None) => {}
        }
        analyses.extend(raw.analyses);

        Ok(Self {
            name: raw.name,
            code: raw.code,
            include: raw.include,
            in_time: raw.in_time,
            out_time: raw.out_time,
            analyses,
        })
    }
}

/// Ordered pattern definitions with unique codes.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PatternCatalog {
    definitions: Vec<PatternDefinition>,
}

impl PatternCatalog {
    pub fn new(definitions: Vec<PatternDefinition>) -> Result<Self> {
        let mut seen = HashSet::new();
        for def in &definitions {
            if !seen.insert(def.code.as_str()) {
                return Err(PatternError::DuplicatePatternCode(def.code.clone()));
            }
            if def.include && def.analyses.is_empty() {
                warn!(code = %def.code, "Pattern has no analyses and will never produce events");
            }
        }
        Ok(Self { definitions })
    }

    /// Catalog shipped with the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_yaml_str(DEFAULT_CATALOG_YAML)
    }

    pub fn builtin_yaml() -> &'static str {
        DEFAULT_CATALOG_YAML
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let value: Value =
            serde_yaml::from_str(yaml).map_err(|e| PatternError::Catalog(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| PatternError::Catalog(e.to_string()))?;
        Self::from_value(value)
    }

    /// Reads a `.json` file as JSON and anything else as YAML.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
        let catalog = if is_json { Self::from_json_str(&text)? } else { Self::from_yaml_str(&text)? };
        debug!(path = %path.display(), patterns = catalog.len(), "Loaded pattern catalog");
        Ok(catalog)
    }

    fn from_value(value: Value) -> Result<Self> {
        let raw = if value.is_array() {
            serde_json::from_value::<Vec<RawDefinition>>(value)
        } else {
            serde_json::from_value::<CatalogFile>(value).map(|f| f.patterns)
        }
        .map_err(|e| PatternError::Catalog(e.to_string()))?;

        let definitions =
            raw.into_iter().map(PatternDefinition::from_raw).collect::<Result<Vec<_>>>()?;
        Self::new(definitions)
    }

    pub fn definitions(&self) -> &[PatternDefinition] {
        &self.definitions
    }

    /// Definitions with `include = true`, in catalog order.
    pub fn included(&self) -> impl Iterator<Item = &PatternDefinition> {
        self.definitions.iter().filter(|d| d.include)
    }

    pub fn get(&self, code: &str) -> Option<&PatternDefinition> {
        self.definitions.iter().find(|d| d.code == code)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// JSON schema of the catalog file (wrapped form).
pub fn catalog_json_schema() -> Result<Value> {
    let schema = schemars::schema_for!(CatalogFile);
    Ok(serde_json::to_value(schema)?)
}
