// Split a rendered series into export/import runs on grid-flow sign changes
use crate::domain::sample::RenderedPoint;
use crate::domain::segment::{Polarity, Segment};

pub fn segment(points: &[RenderedPoint]) -> Vec<Segment> {
    let Some(first) = points.first() else {
        return Vec::new();
    };

    let mut segments = Vec::new();
    let mut current = Segment::new(Polarity::of(first.grid_flow));
    current.points.push(*first);

    for pair in points.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);
        let polarity = Polarity::of(curr.grid_flow);

        if polarity != current.polarity {
            let mut closed = std::mem::replace(&mut current, Segment::new(polarity));
            if prev.grid_flow != curr.grid_flow {
                let zero = zero_crossing(prev, curr);
                closed.points.push(zero);
                current.points.push(zero);
            }
            segments.push(closed);
        }
        current.points.push(*curr);
    }

    segments.push(current);
    segments
}

/// Point where grid flow crosses zero on the straight line between two points
fn zero_crossing(prev: &RenderedPoint, curr: &RenderedPoint) -> RenderedPoint {
    let (v0, v1) = (prev.grid_flow, curr.grid_flow);
    let ratio = -v0 / (v1 - v0);
    let lerp = |a: f64, b: f64| a + (b - a) * ratio;
    let span = (curr.timestamp - prev.timestamp) as f64;

    RenderedPoint {
        timestamp: prev.timestamp + (span * ratio).round() as i64,
        generation: lerp(prev.generation, curr.generation),
        usage: lerp(prev.usage, curr.usage),
        grid_flow: 0.0,
        self_sufficient: true,
    }
}
