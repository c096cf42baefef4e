// View state published to the rendering boundary
use super::sample::{RenderedPoint, Sample};
use super::segment::Segment;
use super::time_scale::TimeScale;
use serde::{Deserialize, Serialize};

/// Where the chart's data is coming from right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceMode {
    Demo,
    Live,
    HistoricalReplay,
}

/// Values shown above the chart
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadlineValues {
    pub timestamp: i64,
    pub generation: f64,
    pub usage: f64,
    pub grid_flow: f64,
    pub self_sufficient: bool,
}

impl HeadlineValues {
    pub fn zero(timestamp: i64) -> Self {
        Self {
            timestamp,
            generation: 0.0,
            usage: 0.0,
            grid_flow: 0.0,
            self_sufficient: true,
        }
    }
}

impl From<Sample> for HeadlineValues {
    fn from(sample: Sample) -> Self {
        Self {
            timestamp: sample.timestamp,
            generation: sample.generation,
            usage: sample.usage,
            grid_flow: sample.grid_flow,
            self_sufficient: sample.self_sufficient,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NavigationState {
    pub can_go_back: bool,
    pub can_go_forward: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewSnapshot {
    pub source_mode: SourceMode,
    pub time_scale: TimeScale,
    pub configured: bool,
    pub graph_ready: bool,
    pub points: Vec<RenderedPoint>,
    pub segments: Vec<Segment>,
    pub current_values: HeadlineValues,
    pub current_label: String,
    pub last_updated: String,
    pub navigation: NavigationState,
    pub historical_offset_ms: i64,
    pub forced_live: bool,
    pub x_ticks: Vec<i64>,
    pub y_domain: (f64, f64),
    pub generation_sources: String,
    pub usage_sources: String,
    pub readings_updated_at: Option<i64>,
}
