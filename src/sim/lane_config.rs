//! External lane definitions
//!
//! An optional JSON file lists named lanes that override the randomized
//! lane parameters. Road and river definitions are consumed round-robin as
//! chunks are generated. Any load failure falls back to the randomized
//! generator.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LaneConfigError {
    #[error("failed to read lane config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse lane config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("lane config contains no road or river lanes")]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaneType {
    Road,
    River,
}

/// One lane definition; absent fields use the generator's defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneDef {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub lane_type: LaneType,
    /// World units per second
    #[serde(default)]
    pub speed: Option<f64>,
    /// +1 right, -1 left; absent or zero picks randomly
    #[serde(default)]
    pub dir: Option<i32>,
    #[serde(default)]
    pub spawn_rate: Option<f64>,
    #[serde(default)]
    pub min_gap: Option<f64>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub spawn_jitter: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LaneFile {
    #[serde(default)]
    lanes: Vec<LaneDef>,
}

/// Parsed lane definitions plus round-robin cursors
#[derive(Debug, Clone)]
pub struct LaneConfig {
    road: Vec<LaneDef>,
    river: Vec<LaneDef>,
    road_cursor: usize,
    river_cursor: usize,
}

impl LaneConfig {
    pub fn from_defs(defs: Vec<LaneDef>) -> Result<Self, LaneConfigError> {
        let (road, river): (Vec<_>, Vec<_>) = defs
            .into_iter()
            .partition(|def| def.lane_type == LaneType::Road);
        if road.is_empty() && river.is_empty() {
            return Err(LaneConfigError::Empty);
        }
        Ok(Self {
            road,
            river,
            road_cursor: 0,
            river_cursor: 0,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, LaneConfigError> {
        let file: LaneFile = serde_json::from_str(json)?;
        Self::from_defs(file.lanes)
    }

    pub fn load(path: &Path) -> Result<Self, LaneConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load `path` if given, logging and discarding any failure
    pub fn load_or_warn(path: Option<&Path>) -> Option<Self> {
        let path = path?;
        match Self::load(path) {
            Ok(config) => {
                log::info!(
                    "Loaded lane config from {} ({} road, {} river)",
                    path.display(),
                    config.road.len(),
                    config.river.len()
                );
                Some(config)
            }
            Err(err) => {
                log::warn!("{} ({}); using randomized lanes", err, path.display());
                None
            }
        }
    }

    /// Next definition for the given lane type, cycling through the list
    pub fn next(&mut self, lane_type: LaneType) -> Option<&LaneDef> {
        let (defs, cursor) = match lane_type {
            LaneType::Road => (&self.road, &mut self.road_cursor),
            LaneType::River => (&self.river, &mut self.river_cursor),
        };
        if defs.is_empty() {
            return None;
        }
        let def = &defs[*cursor % defs.len()];
        *cursor += 1;
        Some(def)
    }

    /// Rewind both cursors (on world reset)
    pub fn rewind(&mut self) {
        self.road_cursor = 0;
        self.river_cursor = 0;
    }
}
