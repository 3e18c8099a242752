//! The uid catalogue.
//!
//! The control protocol addresses every HVAC parameter by a numeric uid
//! and an integer value. These embedded tables give them names: the
//! command map goes name → uid (with named value words for writes), the
//! state map goes uid → name (with value words for reads). Parameters
//! with no value words, like `setpoint`, carry raw integers — deci-degrees
//! Celsius for the temperature uids.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use serde::Deserialize;

use crate::error::CoreError;

const COMMAND_MAP_JSON: &str = include_str!("../assets/command_map.json");
const STATE_MAP_JSON: &str = include_str!("../assets/state_map.json");

#[derive(Debug, Deserialize)]
struct CommandEntry {
    uid: i32,
    #[serde(default)]
    values: BTreeMap<String, i32>,
}

#[derive(Debug, Deserialize)]
struct StateEntry {
    name: String,
    values: Option<BTreeMap<String, String>>,
}

static COMMAND_MAP: LazyLock<BTreeMap<String, CommandEntry>> = LazyLock::new(|| {
    serde_json::from_str(COMMAND_MAP_JSON).expect("embedded command map must parse")
});

static STATE_MAP: LazyLock<BTreeMap<String, StateEntry>> =
    LazyLock::new(|| serde_json::from_str(STATE_MAP_JSON).expect("embedded state map must parse"));

/// A decoded parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateValue {
    /// The catalogue has a word for this value (`"on"`, `"heat"`, ...).
    Named(String),
    /// No value words for this parameter; the raw integer stands.
    Raw(i64),
}

impl std::fmt::Display for StateValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Raw(value) => write!(f, "{value}"),
        }
    }
}

/// Map a `(parameter, value)` pair as the user typed it onto the wire's
/// `(uid, value)` integers.
///
/// The parameter may be a catalogue name (`"power"`) or a raw uid; the
/// value may be a value word (`"on"`) or a raw integer. Value words only
/// work with named parameters.
pub fn map_command(param: &str, value: &str) -> Result<(i32, i32), CoreError> {
    let entry = COMMAND_MAP.get(param);
    let uid = match entry {
        Some(entry) => entry.uid,
        None => param.parse().map_err(|_| CoreError::UnknownParameter {
            name: param.to_string(),
        })?,
    };

    if let Ok(raw) = value.parse::<i32>() {
        return Ok((uid, raw));
    }

    let Some(entry) = entry else {
        return Err(CoreError::UnknownValue {
            value: value.to_string(),
            parameter: param.to_string(),
            wanted: Vec::new(),
        });
    };
    match entry.values.get(value) {
        Some(&mapped) => Ok((uid, mapped)),
        None => Err(CoreError::UnknownValue {
            value: value.to_string(),
            parameter: param.to_string(),
            wanted: entry.values.keys().cloned().collect(),
        }),
    }
}

/// The catalogue name for a uid, or the uid rendered as a string when
/// the catalogue has no entry.
pub fn decode_uid(uid: i32) -> String {
    STATE_MAP
        .get(&uid.to_string())
        .map_or_else(|| uid.to_string(), |entry| entry.name.clone())
}

/// Decode a raw state value for a named parameter.
///
/// Unknown parameter names and parameters without value words pass the
/// raw value through. `None` means the parameter has value words but
/// this value is not one of them — an out-of-range reading.
pub fn decode_state(name: &str, value: i64) -> Option<StateValue> {
    let Some(entry) = STATE_MAP.values().find(|entry| entry.name == name) else {
        return Some(StateValue::Raw(value));
    };
    match &entry.values {
        None => Some(StateValue::Raw(value)),
        Some(values) => values
            .get(&value.to_string())
            .map(|word| StateValue::Named(word.clone())),
    }
}

// ── Tests ────────────────────────────────────────────────────────────
