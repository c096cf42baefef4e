// Resolve configured signal ids against a live reading snapshot
use crate::domain::signal::{ReadingSnapshot, SignalDescriptor};
use crate::domain::units::{from_canonical, to_canonical, PowerUnit};
use serde_json::Value;

/// Sum the readings behind `signal_ids` and express the total in `display`.
/// Unknown ids, missing nodes and malformed readings contribute 0.
pub fn sum_signals(
    signal_ids: &[String],
    readings: &ReadingSnapshot,
    catalogue: &[SignalDescriptor],
    display: PowerUnit,
) -> f64 {
    if readings.is_empty() || catalogue.is_empty() {
        return 0.0;
    }

    let total_watts: f64 = signal_ids
        .iter()
        .filter_map(|id| catalogue.iter().find(|d| &d.id == id))
        .map(|descriptor| contribution_watts(descriptor, readings.get(&descriptor.node_id)))
        .sum();

    from_canonical(total_watts, Some(display.symbol()))
}

fn contribution_watts(descriptor: &SignalDescriptor, reading: Option<&Value>) -> f64 {
    let Some((value, reading_unit)) = reading.and_then(parse_reading) else {
        return 0.0;
    };

    let scaled = value * descriptor.factor.unwrap_or(1.0);
    if !scaled.is_finite() {
        return 0.0;
    }

    let unit = reading_unit.or(descriptor.unit.as_deref());
    to_canonical(scaled, unit)
}

/// Accept a bare number or an object carrying `value` and an optional `unit`
fn parse_reading(reading: &Value) -> Option<(f64, Option<&str>)> {
    match reading {
        Value::Number(n) => n.as_f64().map(|v| (v, None)),
        Value::Object(fields) => {
            let value = fields.get("value")?.as_f64()?;
            let unit = fields.get("unit").and_then(Value::as_str);
            Some((value, unit))
        }
        _ => None,
    }
}
