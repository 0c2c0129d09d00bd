use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::terrain::TerrainLabel;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanOrder {
    #[default]
    ColumnMajor,
    RowMajor,
}

impl ScanOrder {
    pub fn label(self) -> &'static str {
        match self {
            Self::ColumnMajor => "column",
            Self::RowMajor => "row",
        }
    }
}

impl fmt::Display for ScanOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ScanOrder {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "column" | "column-major" => Ok(Self::ColumnMajor),
            "row" | "row-major" => Ok(Self::RowMajor),
            other => Err(format!(
                "unknown scan order '{other}' (expected column or row)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialPolicy {
    #[default]
    Walkable,
    Obstacle,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub scan_order: ScanOrder,
    pub special_policy: SpecialPolicy,
}

impl AnalysisConfig {
    pub fn blocks(&self, label: TerrainLabel) -> bool {
        match label {
            TerrainLabel::Obstacle => true,
            TerrainLabel::Special => self.special_policy == SpecialPolicy::Obstacle,
            TerrainLabel::Walkable => false,
        }
    }
}
