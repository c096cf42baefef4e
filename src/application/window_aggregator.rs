// Window selection and bucket downsampling for the timeline chart
use crate::application::sample_buffer::SampleBuffer;
use crate::domain::sample::{RenderedPoint, Sample};
use crate::domain::time_scale::TimeScale;

pub const MAX_RENDERED_POINTS: usize = 750;

/// Select the window ending at `view_anchor_ms`, downsample it if the scale
/// is bucketed and keep at most `max_points` of the most recent points.
pub fn render(
    buffer: &SampleBuffer,
    time_scale: TimeScale,
    view_anchor_ms: i64,
    max_points: usize,
    precision: u32,
) -> Vec<RenderedPoint> {
    let cutoff = view_anchor_ms - time_scale.duration_ms();
    let raw = buffer.filter_window(cutoff, view_anchor_ms);

    let mut points = match time_scale.bucket_width_ms() {
        Some(width) => downsample(&raw, width, precision),
        None => raw,
    };

    if points.len() > max_points {
        points.drain(..points.len() - max_points);
    }
    points
}

/// Average time-ordered samples into buckets aligned to multiples of
/// `width_ms`. Each non-empty bucket becomes one point at its midpoint.
pub fn downsample(samples: &[Sample], width_ms: i64, precision: u32) -> Vec<RenderedPoint> {
    let mut points = Vec::new();
    let mut iter = samples.iter().peekable();

    while let Some(first) = iter.next() {
        let bucket_start = first.timestamp.div_euclid(width_ms) * width_ms;
        let bucket_end = bucket_start + width_ms;

        let mut count = 1usize;
        let mut generation = first.generation;
        let mut usage = first.usage;
        let mut grid_flow = first.grid_flow;

        while let Some(next) = iter.next_if(|s| s.timestamp < bucket_end) {
            count += 1;
            generation += next.generation;
            usage += next.usage;
            grid_flow += next.grid_flow;
        }

        let n = count as f64;
        points.push(Sample::aggregate(
            bucket_start + width_ms / 2,
            generation / n,
            usage / n,
            grid_flow / n,
            precision,
        ));
    }

    points
}
