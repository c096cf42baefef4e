// Power unit conversion between readings, canonical watts and the display unit
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PowerUnit {
    W,
    #[default]
    #[serde(rename = "kW")]
    KW,
    MW,
    GW,
}

impl PowerUnit {
    /// Parse a unit symbol, ignoring surrounding whitespace and case
    pub fn parse(symbol: &str) -> Option<Self> {
        match symbol.trim().to_ascii_lowercase().as_str() {
            "w" => Some(PowerUnit::W),
            "kw" => Some(PowerUnit::KW),
            "mw" => Some(PowerUnit::MW),
            "gw" => Some(PowerUnit::GW),
            _ => None,
        }
    }

    /// Number of watts in one of this unit
    pub fn factor(self) -> f64 {
        match self {
            PowerUnit::W => 1.0,
            PowerUnit::KW => 1e3,
            PowerUnit::MW => 1e6,
            PowerUnit::GW => 1e9,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            PowerUnit::W => "W",
            PowerUnit::KW => "kW",
            PowerUnit::MW => "MW",
            PowerUnit::GW => "GW",
        }
    }
}

impl fmt::Display for PowerUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Convert a value in `unit` to watts. Unknown or missing units pass through.
pub fn to_canonical(value: f64, unit: Option<&str>) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    match unit.and_then(PowerUnit::parse) {
        Some(u) => value * u.factor(),
        None => value,
    }
}

/// Convert watts into `target`. Unknown or missing units pass through.
pub fn from_canonical(value: f64, target: Option<&str>) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    match target.and_then(PowerUnit::parse) {
        Some(u) => value / u.factor(),
        None => value,
    }
}

pub fn watts_to(value: f64, target: PowerUnit) -> f64 {
    from_canonical(value, Some(target.symbol()))
}

pub fn to_watts(value: f64, unit: PowerUnit) -> f64 {
    to_canonical(value, Some(unit.symbol()))
}
