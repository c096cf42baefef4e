// Signal catalogue, live readings and the timeline configuration
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Latest reading per node id. Values are kept as raw JSON so malformed
/// readings degrade to 0 at resolution time instead of failing to parse.
pub type ReadingSnapshot = HashMap<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalDescriptor {
    pub id: String,
    pub node_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub factor: Option<f64>,
}

impl SignalDescriptor {
    pub fn new(id: &str, node_id: &str, unit: Option<&str>, factor: Option<f64>) -> Self {
        Self {
            id: id.to_string(),
            node_id: node_id.to_string(),
            name: None,
            unit: unit.map(str::to_string),
            factor,
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.node_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportMode {
    #[default]
    Auto,
    Manual,
}

/// Settings owned by the surrounding configurator. Any change to these
/// starts a fresh measurement context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TimelineConfig {
    pub generation_ids: Vec<String>,
    pub usage_ids: Vec<String>,
    pub export_ids: Vec<String>,
    pub wind_ids: Vec<String>,
    pub export_mode: ExportMode,
    pub use_demo_source: bool,
    pub use_wind_demo_source: bool,
}

impl TimelineConfig {
    pub fn demo_requested(&self) -> bool {
        self.use_demo_source || self.use_wind_demo_source
    }

    pub fn has_live_signals(&self) -> bool {
        !self.generation_ids.is_empty() && !self.usage_ids.is_empty()
    }

    /// Whether anything can be plotted at all
    pub fn is_configured(&self) -> bool {
        self.demo_requested() || self.has_live_signals()
    }
}

/// Join the display names of `ids` for a headline label
pub fn source_names(ids: &[String], catalogue: &[SignalDescriptor]) -> String {
    if ids.is_empty() {
        return "N/A".to_string();
    }
    ids.iter()
        .map(|id| {
            catalogue
                .iter()
                .find(|d| &d.id == id)
                .map(|d| d.display_name().to_string())
                .unwrap_or_else(|| id.clone())
        })
        .collect::<Vec<_>>()
        .join(", ")
}
