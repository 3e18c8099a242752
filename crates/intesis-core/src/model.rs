//! Domain model: devices and status snapshots.

use std::collections::BTreeMap;

use intesis_api::cloud::CloudDevice;

use crate::error::CoreError;
use crate::mappings::{StateValue, decode_state};

/// An HVAC unit as reported by the cloud inventory.
///
/// The cloud hands ids out as decimal strings; the control channel wants
/// them numeric. [`numeric_id`](Self::numeric_id) bridges the two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub id: String,
    pub name: String,
    pub family_id: i64,
    pub model_id: i64,
    pub installation_id: i64,
    pub zone_id: i64,
    pub widgets: Vec<i32>,
}

impl From<CloudDevice> for Device {
    fn from(d: CloudDevice) -> Self {
        Self {
            id: d.id,
            name: d.name,
            family_id: d.family_id,
            model_id: d.model_id,
            installation_id: d.installation_id,
            zone_id: d.zone_id,
            widgets: d.widgets,
        }
    }
}

impl Device {
    /// The device id as the control channel expects it.
    pub fn numeric_id(&self) -> Result<i64, CoreError> {
        self.id.parse().map_err(|_| CoreError::InvalidDeviceId {
            identifier: self.id.clone(),
        })
    }

    /// The parameters this unit exposes, by catalogue name. Widgets with
    /// no catalogue entry show up as their raw uid.
    pub fn capabilities(&self) -> Vec<String> {
        self.widgets
            .iter()
            .map(|&uid| crate::mappings::decode_uid(uid))
            .collect()
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "device id: {} name: {} family: {} model: {} capabilities [{}]",
            self.id,
            self.name,
            self.family_id,
            self.model_id,
            self.capabilities().join(",")
        )
    }
}

/// One device's state at a point in time, keyed by parameter name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSnapshot {
    /// Raw integer values straight off the wire.
    pub raw: BTreeMap<String, i64>,
}

impl StatusSnapshot {
    /// A single raw reading.
    pub fn get(&self, param: &str) -> Option<i64> {
        self.raw.get(param).copied()
    }

    /// A single reading, decoded through the state catalogue.
    pub fn decoded(&self, param: &str) -> Option<StateValue> {
        self.get(param).and_then(|raw| decode_state(param, raw))
    }

    /// All readings decoded for display. Out-of-range values fall back
    /// to their raw integer.
    pub fn pretty(&self) -> BTreeMap<String, String> {
        self.raw
            .iter()
            .map(|(name, &raw)| {
                let rendered = decode_state(name, raw)
                    .map_or_else(|| raw.to_string(), |value| value.to_string());
                (name.clone(), rendered)
            })
            .collect()
    }

    /// A temperature-style reading in degrees Celsius. The wire carries
    /// deci-degrees.
    #[allow(clippy::cast_precision_loss)]
    pub fn celsius(&self, param: &str) -> Option<f64> {
        self.get(param).map(|raw| raw as f64 / 10.0)
    }
}

// ── Tests ────────────────────────────────────────────────────────────
