// Grid-flow polarity segments
use super::sample::RenderedPoint;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Export,
    Import,
}

impl Polarity {
    pub fn of(grid_flow: f64) -> Self {
        if grid_flow >= 0.0 {
            Polarity::Export
        } else {
            Polarity::Import
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub polarity: Polarity,
    pub points: Vec<RenderedPoint>,
}

impl Segment {
    pub fn new(polarity: Polarity) -> Self {
        Self {
            polarity,
            points: Vec::new(),
        }
    }
}
