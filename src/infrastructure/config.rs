use crate::application::demo_generator::DemoSettings;
use crate::application::view_controller::ViewSettings;
use crate::application::window_aggregator::MAX_RENDERED_POINTS;
use crate::domain::signal::{SignalDescriptor, TimelineConfig};
use crate::domain::time_scale::TimeScale;
use crate::domain::units::PowerUnit;
use serde::Deserialize;
use std::time::Duration;

const CONFIG_FILE: &str = "config/timeline";
const ENV_PREFIX: &str = "TIMELINE";

const LIST_KEYS: [&str; 4] = [
    "timeline.generation_ids",
    "timeline.usage_ids",
    "timeline.export_ids",
    "timeline.wind_ids",
];

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub display: DisplaySettings,
    pub demo: DemoSettings,
    pub live: LiveSettings,
    pub timeline: TimelineSettings,
    pub catalogue: Vec<SignalDescriptor>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DisplaySettings {
    pub unit: PowerUnit,
    pub precision: u32,
    pub max_points: usize,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            unit: PowerUnit::KW,
            precision: 2,
            max_points: MAX_RENDERED_POINTS,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LiveSettings {
    /// JSON snapshot endpoint; no live source runs without it
    pub url: Option<String>,
    pub poll_interval_ms: u64,
}

impl Default for LiveSettings {
    fn default() -> Self {
        Self {
            url: None,
            poll_interval_ms: 1_000,
        }
    }
}

impl LiveSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct TimelineSettings {
    #[serde(flatten)]
    pub config: TimelineConfig,
    pub time_scale: TimeScale,
}

impl AppConfig {
    pub fn view_settings(&self) -> ViewSettings {
        ViewSettings {
            display_unit: self.display.unit,
            precision: self.display.precision,
            max_points: self.display.max_points.max(1),
            demo: self.demo,
        }
    }
}

fn environment() -> config::Environment {
    LIST_KEYS
        .iter()
        .fold(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
            |env, key| env.with_list_parse_key(key),
        )
}

/// Load `config/timeline.*` when present, overridden by `TIMELINE__*` variables
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(CONFIG_FILE).required(false))
        .add_source(environment())
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signal::ExportMode;
    use std::collections::HashMap;

    fn from_toml(toml: &str) -> AppConfig {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults_when_empty() {
        let config = from_toml("");
        assert_eq!(config.server.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.display.unit, PowerUnit::KW);
        assert_eq!(config.display.precision, 2);
        assert_eq!(config.display.max_points, 750);
        assert_eq!(config.live.url, None);
        assert_eq!(config.live.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.timeline.time_scale, TimeScale::OneHour);
        assert!(!config.timeline.config.is_configured());
        assert!(config.catalogue.is_empty());
    }

    #[test]
    fn test_full_file() {
        let config = from_toml(
            r#"
            [display]
            unit = "MW"
            precision = 3

            [demo]
            peak_solar_w = 5000.0

            [live]
            url = "http://localhost:9000/readings"
            poll_interval_ms = 250

            [timeline]
            generation_ids = ["pv"]
            usage_ids = ["load"]
            export_mode = "manual"
            time_scale = "5m"

            [[catalogue]]
            id = "pv"
            node_id = "ns=1;s=PV"
            name = "Roof PV"
            unit = "kW"

            [[catalogue]]
            id = "load"
            node_id = "ns=1;s=Load"
            factor = 0.5
            "#,
        );

        assert_eq!(config.display.unit, PowerUnit::MW);
        assert_eq!(config.demo.peak_solar_w, 5_000.0);
        assert_eq!(config.demo.base_usage_w, DemoSettings::default().base_usage_w);
        assert_eq!(config.live.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.timeline.time_scale, TimeScale::FiveMinutes);
        assert_eq!(config.timeline.config.export_mode, ExportMode::Manual);
        assert!(config.timeline.config.has_live_signals());
        assert_eq!(config.catalogue.len(), 2);
        assert_eq!(config.catalogue[0].display_name(), "Roof PV");
        assert_eq!(config.catalogue[1].factor, Some(0.5));

        let view = config.view_settings();
        assert_eq!(view.display_unit, PowerUnit::MW);
        assert_eq!(view.precision, 3);
    }

    #[test]
    fn test_environment_overrides() {
        let vars: HashMap<String, String> = [
            ("TIMELINE__SERVER__BIND_ADDR", "127.0.0.1:9999"),
            ("TIMELINE__TIMELINE__USE_DEMO_SOURCE", "true"),
            ("TIMELINE__TIMELINE__GENERATION_IDS", "pv1,pv2"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let config: AppConfig = config::Config::builder()
            .add_source(environment().source(Some(vars)))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.bind_addr, "127.0.0.1:9999");
        assert!(config.timeline.config.use_demo_source);
        assert_eq!(config.timeline.config.generation_ids, vec!["pv1", "pv2"]);
    }
}
