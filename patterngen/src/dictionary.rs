//! ArUco dictionaries backed by a JSON bitmap database.
//!
//! The database maps a dictionary key to a table of payload matrices:
//! `{ "DICT_4X4_50": { "ids": { "0": [[0, 1, ...], ...], ... } } }`.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use log::debug;
use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::bitmap::{MarkerBitmap, RawCell};
use crate::error::{MarkerError, ParseOptionError};

/// The predefined dictionaries offered for ChArUco boards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ArucoDictionary {
    #[serde(rename = "4x4_50")]
    #[default]
    Dict4x4_50,
    #[serde(rename = "4x4_100")]
    Dict4x4_100,
    #[serde(rename = "4x4_250")]
    Dict4x4_250,
    #[serde(rename = "5x5_100")]
    Dict5x5_100,
    #[serde(rename = "6x6_250")]
    Dict6x6_250,
    #[serde(rename = "7x7_1000")]
    Dict7x7_1000,
}

impl ArucoDictionary {
    pub const ALL: [ArucoDictionary; 6] = [
        ArucoDictionary::Dict4x4_50,
        ArucoDictionary::Dict4x4_100,
        ArucoDictionary::Dict4x4_250,
        ArucoDictionary::Dict5x5_100,
        ArucoDictionary::Dict6x6_250,
        ArucoDictionary::Dict7x7_1000,
    ];

    /// Short name used on the command line and in configs.
    pub fn name(self) -> &'static str {
        match self {
            ArucoDictionary::Dict4x4_50 => "4x4_50",
            ArucoDictionary::Dict4x4_100 => "4x4_100",
            ArucoDictionary::Dict4x4_250 => "4x4_250",
            ArucoDictionary::Dict5x5_100 => "5x5_100",
            ArucoDictionary::Dict6x6_250 => "6x6_250",
            ArucoDictionary::Dict7x7_1000 => "7x7_1000",
        }
    }

    /// Key of this dictionary in the bitmap database.
    pub fn json_key(self) -> &'static str {
        match self {
            ArucoDictionary::Dict4x4_50 => "DICT_4X4_50",
            ArucoDictionary::Dict4x4_100 => "DICT_4X4_100",
            ArucoDictionary::Dict4x4_250 => "DICT_4X4_250",
            ArucoDictionary::Dict5x5_100 => "DICT_5X5_100",
            ArucoDictionary::Dict6x6_250 => "DICT_6X6_250",
            ArucoDictionary::Dict7x7_1000 => "DICT_7X7_1000",
        }
    }

    /// Payload bits per side.
    pub fn marker_size(self) -> usize {
        match self {
            ArucoDictionary::Dict4x4_50
            | ArucoDictionary::Dict4x4_100
            | ArucoDictionary::Dict4x4_250 => 4,
            ArucoDictionary::Dict5x5_100 => 5,
            ArucoDictionary::Dict6x6_250 => 6,
            ArucoDictionary::Dict7x7_1000 => 7,
        }
    }

    /// Number of markers in the dictionary.
    pub fn capacity(self) -> u32 {
        match self {
            ArucoDictionary::Dict4x4_50 => 50,
            ArucoDictionary::Dict4x4_100 | ArucoDictionary::Dict5x5_100 => 100,
            ArucoDictionary::Dict4x4_250 | ArucoDictionary::Dict6x6_250 => 250,
            ArucoDictionary::Dict7x7_1000 => 1000,
        }
    }
}

impl fmt::Display for ArucoDictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ArucoDictionary {
    type Err = ParseOptionError;

    /// Accepts the short name (`4x4_50`) or the database key (`DICT_4X4_50`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        ArucoDictionary::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(s) || d.json_key().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseOptionError {
                kind: "dictionary",
                value: s.to_string(),
                expected: "4x4_50, 4x4_100, 4x4_250, 5x5_100, 6x6_250, 7x7_1000",
            })
    }
}

/// Parsed bitmap database.
///
/// Only the table structure is checked up front. Each matrix is converted
/// on lookup, so one bad entry costs one marker rather than the database.
#[derive(Debug, Default)]
pub struct BitmapDb {
    dicts: HashMap<String, HashMap<String, Value>>,
}

impl BitmapDb {
    pub fn from_json(json: &str) -> Result<BitmapDb, serde_json::Error> {
        BitmapDb::from_value(serde_json::from_str(json)?)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<BitmapDb, serde_json::Error> {
        BitmapDb::from_value(serde_json::from_slice(bytes)?)
    }

    fn from_value(value: Value) -> Result<BitmapDb, serde_json::Error> {
        let Value::Object(top) = value else {
            return Err(serde_json::Error::custom(
                "bitmap database must be an object keyed by dictionary",
            ));
        };
        let mut dicts = HashMap::new();
        for (key, table) in top {
            match table {
                Value::Object(mut table) => match table.remove("ids") {
                    Some(Value::Object(ids)) => {
                        dicts.insert(key, ids.into_iter().collect());
                    }
                    _ => debug!("bitmap database: {key} has no ids table, skipped"),
                },
                _ => debug!("bitmap database: {key} is not a dictionary table, skipped"),
            }
        }
        Ok(BitmapDb { dicts })
    }

    /// Number of dictionaries in the database.
    pub fn len(&self) -> usize {
        self.dicts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dicts.is_empty()
    }

    pub fn contains(&self, dict: ArucoDictionary) -> bool {
        self.dicts.contains_key(dict.json_key())
    }

    /// Number of marker entries stored for `dict`.
    pub fn id_count(&self, dict: ArucoDictionary) -> usize {
        self.dicts.get(dict.json_key()).map_or(0, HashMap::len)
    }

    /// Bordered bitmap for marker `id` of `dict`.
    pub fn marker(&self, dict: ArucoDictionary, id: u32) -> Result<MarkerBitmap, MarkerError> {
        let rows = self
            .dicts
            .get(dict.json_key())
            .and_then(|t| t.get(&id.to_string()))
            .ok_or_else(|| MarkerError::MissingId {
                dict: dict.json_key().to_string(),
                id,
            })?;
        let rows = Vec::<Vec<RawCell>>::deserialize(rows).map_err(|e| {
            MarkerError::Malformed(format!("{} id {id}: {e}", dict.json_key()))
        })?;
        MarkerBitmap::from_matrix(&rows)
    }
}
