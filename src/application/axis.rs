// Axis helpers for the timeline chart
use crate::domain::sample::RenderedPoint;
use crate::domain::time_scale::TimeScale;
use chrono::{DateTime, Local, Utc};

const MAX_TICKS_FOR_TRAILING: usize = 10;
const MIN_Y_PADDING: f64 = 5.0;

/// Tick timestamps for a window ending at `window_end_ms`, aligned to the
/// scale's tick interval. The latest data point is appended when the
/// regular ticks stop short of it.
pub fn x_ticks(time_scale: TimeScale, window_end_ms: i64, last_point_ms: Option<i64>) -> Vec<i64> {
    let timing = time_scale.timing();
    let interval = timing.tick_interval_ms;
    let first = window_end_ms - timing.duration_ms;

    let mut ticks = Vec::new();
    let mut tick = first.div_euclid(interval) * interval + interval;
    while tick <= window_end_ms {
        ticks.push(tick);
        tick += interval;
    }

    if let Some(last) = last_point_ms {
        match ticks.last() {
            None => ticks.push(last),
            Some(&t) if t < last && ticks.len() < MAX_TICKS_FOR_TRAILING => ticks.push(last),
            _ => {}
        }
    }

    let mut decluttered: Vec<i64> = Vec::with_capacity(ticks.len());
    for t in ticks {
        match decluttered.last() {
            Some(&prev) if t <= prev + interval / 2 => {}
            _ => decluttered.push(t),
        }
    }
    decluttered
}

/// Padded value range covering generation, usage and grid flow
pub fn y_domain(points: &[RenderedPoint]) -> (f64, f64) {
    let values = points
        .iter()
        .flat_map(|p| [p.generation, p.usage, p.grid_flow])
        .filter(|v| v.is_finite());

    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });

    if min > max {
        return (-MIN_Y_PADDING, MIN_Y_PADDING);
    }
    // a single point or a flat series pads each bound by its own magnitude
    if points.len() < 2 || min == max {
        return (
            min - (min.abs() * 0.1 + MIN_Y_PADDING),
            max + (max.abs() * 0.1 + MIN_Y_PADDING),
        );
    }

    let pad = ((max - min) * 0.1).max(MIN_Y_PADDING);
    ((min - pad).floor(), (max + pad).ceil())
}

/// Local-time label for a timestamp at the given scale
pub fn format_tick(time_scale: TimeScale, timestamp_ms: i64) -> String {
    let Some(utc) = DateTime::<Utc>::from_timestamp_millis(timestamp_ms) else {
        return String::new();
    };
    let local = utc.with_timezone(&Local);
    let pattern = match time_scale {
        TimeScale::ThirtySeconds
        | TimeScale::OneMinute
        | TimeScale::FiveMinutes
        | TimeScale::ThirtyMinutes => "%M:%S",
        TimeScale::OneHour | TimeScale::SixHours | TimeScale::TwelveHours | TimeScale::OneDay => {
            "%H:%M"
        }
        TimeScale::SevenDays | TimeScale::OneMonth => "%d %b %H:%M",
    };
    local.format(pattern).to_string()
}
