// Synthetic generation/usage/grid-flow values for demo mode
use crate::domain::signal::ExportMode;
use crate::domain::units::{to_watts, watts_to, PowerUnit};
use chrono::Timelike;
use rand::Rng;
use serde::Deserialize;
use std::f64::consts::PI;

pub const USAGE_SMOOTHING: f64 = 0.1;
const USAGE_FLOOR_W: f64 = 200.0;
const MANUAL_EXPORT_THRESHOLD_W: f64 = 500.0;

const MORNING_PEAK: (f64, f64, f64) = (7.5, 1.0, 0.35);
const EVENING_PEAK: (f64, f64, f64) = (18.5, 1.2, 0.6);
const USAGE_RIPPLE: f64 = 0.04;

/// Source of the single random draw used for wind gusts
pub trait NoiseSource: Send {
    /// Uniform value in [0, 1)
    fn uniform(&mut self) -> f64;
}

pub struct ThreadRngNoise;

impl NoiseSource for ThreadRngNoise {
    fn uniform(&mut self) -> f64 {
        rand::rng().random::<f64>()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct DemoSettings {
    pub peak_solar_w: f64,
    pub peak_wind_w: f64,
    pub base_usage_w: f64,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            peak_solar_w: 20_000.0,
            peak_wind_w: 4_000.0,
            base_usage_w: 8_000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DemoReading {
    pub generation: f64,
    pub usage: f64,
    pub grid_flow: f64,
}

pub struct DemoValueGenerator {
    settings: DemoSettings,
    display: PowerUnit,
    noise: Box<dyn NoiseSource>,
}

impl DemoValueGenerator {
    pub fn new(settings: DemoSettings, display: PowerUnit) -> Self {
        Self::with_noise(settings, display, Box::new(ThreadRngNoise))
    }

    pub fn with_noise(settings: DemoSettings, display: PowerUnit, noise: Box<dyn NoiseSource>) -> Self {
        Self {
            settings,
            display,
            noise,
        }
    }

    /// Produce the next demo reading for local wall-clock time `now`.
    /// `previous_usage` is the last emitted usage in the display unit and
    /// smooths the usage curve between calls.
    pub fn next<T: Timelike>(
        &mut self,
        now: &T,
        export_mode: ExportMode,
        previous_usage: Option<f64>,
    ) -> DemoReading {
        let seconds = now.num_seconds_from_midnight() as f64;
        let hour = seconds / 3_600.0;

        let solar = self.settings.peak_solar_w * solar_curve(hour) * cloud_cover(seconds);
        let gust = (self.noise.uniform() - 0.5) * 0.2;
        let wind = self.settings.peak_wind_w * (wind_pattern(hour, seconds) + gust).max(0.0);
        let generation = (solar + wind).max(0.0);

        let target = self.usage_target(hour, seconds);
        let usage = match previous_usage {
            Some(prev) => {
                let prev = to_watts(prev, self.display);
                prev + USAGE_SMOOTHING * (target - prev)
            }
            None => target,
        }
        .max(USAGE_FLOOR_W);

        let net = generation - usage;
        let grid_flow = match export_mode {
            ExportMode::Auto => net,
            ExportMode::Manual => managed_export(net, seconds),
        };

        DemoReading {
            generation: watts_to(generation, self.display),
            usage: watts_to(usage, self.display),
            grid_flow: watts_to(grid_flow, self.display),
        }
    }

    /// Largest usage change one call can produce, in the display unit
    pub fn max_usage_step(&self) -> f64 {
        let spread = MORNING_PEAK.2 + EVENING_PEAK.2 + 2.0 * USAGE_RIPPLE;
        watts_to(USAGE_SMOOTHING * self.settings.base_usage_w * spread, self.display)
    }

    fn usage_target(&self, hour: f64, seconds: f64) -> f64 {
        let base = self.settings.base_usage_w;
        let peaks = [MORNING_PEAK, EVENING_PEAK]
            .iter()
            .map(|&(center, width, weight)| weight * gaussian(hour, center, width))
            .sum::<f64>();
        let ripple = USAGE_RIPPLE * (2.0 * PI * seconds / 600.0).sin();
        base * (1.0 + peaks + ripple)
    }
}

fn gaussian(x: f64, center: f64, width: f64) -> f64 {
    (-(x - center).powi(2) / (2.0 * width * width)).exp()
}

/// Daylight bell between 06:00 and 19:00, peaking just before 13:00
fn solar_curve(hour: f64) -> f64 {
    if !(6.0..=19.0).contains(&hour) {
        return 0.0;
    }
    let envelope = (PI * (hour - 6.0) / 13.0).sin().max(0.0);
    envelope * gaussian(hour, 13.0, 3.0)
}

fn cloud_cover(seconds: f64) -> f64 {
    let factor = 0.72
        + 0.14 * (2.0 * PI * seconds / 1_020.0).sin()
        + 0.09 * (2.0 * PI * seconds / 2_580.0 + 0.7).sin()
        + 0.05 * (2.0 * PI * seconds / 420.0 + 1.9).sin();
    factor.clamp(0.0, 1.0)
}

fn wind_pattern(hour: f64, seconds: f64) -> f64 {
    0.45 + 0.2 * (2.0 * PI * hour / 24.0 + 1.3).sin()
        + 0.12 * (2.0 * PI * seconds / 5_400.0).sin()
        + 0.08 * (2.0 * PI * seconds / 1_900.0 + 2.1).sin()
}

/// Grid flow under a managed export policy. Sign always follows `net`.
fn managed_export(net: f64, seconds: f64) -> f64 {
    if net > MANUAL_EXPORT_THRESHOLD_W {
        net * (0.55 + 0.25 * (2.0 * PI * seconds / 300.0).sin())
    } else if net < -MANUAL_EXPORT_THRESHOLD_W {
        net * (0.9 + 0.08 * (2.0 * PI * seconds / 180.0).sin())
    } else {
        net
    }
}
