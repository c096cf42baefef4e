// View controller - mode selection, ingestion, windowing and navigation
use crate::application::axis::{format_tick, x_ticks, y_domain};
use crate::application::demo_generator::{DemoSettings, DemoValueGenerator};
use crate::application::polarity_segmenter::segment;
use crate::application::sample_buffer::SampleBuffer;
use crate::application::source_resolver::sum_signals;
use crate::application::window_aggregator::{render, MAX_RENDERED_POINTS};
use crate::domain::sample::{RenderedPoint, Sample};
use crate::domain::segment::Segment;
use crate::domain::signal::{source_names, ExportMode, ReadingSnapshot, SignalDescriptor, TimelineConfig};
use crate::domain::time_scale::TimeScale;
use crate::domain::units::PowerUnit;
use crate::domain::view::{HeadlineValues, NavigationState, SourceMode, ViewSnapshot};
use chrono::{DateTime, Local, NaiveTime, Utc};
use std::time::Duration;

pub const DEMO_INGEST_INTERVAL: Duration = Duration::from_secs(1);
const RECENT_DEMO_SAMPLE_MS: i64 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewSettings {
    pub display_unit: PowerUnit,
    pub precision: u32,
    pub max_points: usize,
    pub demo: DemoSettings,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            display_unit: PowerUnit::KW,
            precision: 2,
            max_points: MAX_RENDERED_POINTS,
            demo: DemoSettings::default(),
        }
    }
}

/// Which periodic timers should be running for the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerPlan {
    pub ingest_every: Option<Duration>,
    pub refresh_every: Option<Duration>,
}

pub struct ViewController {
    settings: ViewSettings,
    config: TimelineConfig,
    catalogue: Vec<SignalDescriptor>,
    time_scale: TimeScale,
    historical_offset_ms: i64,
    forced_live: bool,
    live_source_available: bool,
    buffer: SampleBuffer,
    /// Source that filled the current buffer, if any
    buffer_source: Option<SourceMode>,
    demo: DemoValueGenerator,
    smoothed_usage: Option<f64>,
    readings: ReadingSnapshot,
    readings_updated_at: Option<i64>,
    chart: Vec<RenderedPoint>,
    segments: Vec<Segment>,
    graph_ready: bool,
    last_updated_ms: Option<i64>,
    /// Window end used by the last render
    rendered_anchor_ms: Option<i64>,
    epoch: u64,
}

impl ViewController {
    pub fn new(
        settings: ViewSettings,
        config: TimelineConfig,
        catalogue: Vec<SignalDescriptor>,
        time_scale: TimeScale,
    ) -> Self {
        let demo = DemoValueGenerator::new(settings.demo, settings.display_unit);
        let mut controller = Self {
            settings,
            config,
            catalogue,
            time_scale,
            historical_offset_ms: 0,
            forced_live: false,
            live_source_available: false,
            buffer: SampleBuffer::new(),
            buffer_source: None,
            demo,
            smoothed_usage: None,
            readings: ReadingSnapshot::new(),
            readings_updated_at: None,
            chart: Vec::new(),
            segments: Vec::new(),
            graph_ready: false,
            last_updated_ms: None,
            rendered_anchor_ms: None,
            epoch: 0,
        };
        controller.buffer_source = Some(controller.source_mode());
        controller
    }

    pub fn with_demo_generator(mut self, demo: DemoValueGenerator) -> Self {
        self.demo = demo;
        self
    }

    pub fn source_mode(&self) -> SourceMode {
        if self.historical_offset_ms > 0 {
            SourceMode::HistoricalReplay
        } else if self.config.demo_requested() {
            SourceMode::Demo
        } else if self.live_source_available || self.forced_live {
            SourceMode::Live
        } else {
            SourceMode::Demo
        }
    }

    pub fn configured(&self) -> bool {
        self.config.is_configured()
    }

    /// Bumped whenever running timers must be replaced
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn time_scale(&self) -> TimeScale {
        self.time_scale
    }

    pub fn historical_offset_ms(&self) -> i64 {
        self.historical_offset_ms
    }

    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    pub fn chart(&self) -> &[RenderedPoint] {
        &self.chart
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn graph_ready(&self) -> bool {
        self.graph_ready
    }

    pub fn timer_plan(&self) -> TimerPlan {
        match self.source_mode() {
            SourceMode::HistoricalReplay => TimerPlan {
                ingest_every: None,
                refresh_every: None,
            },
            mode => {
                let refresh = self.time_scale.timing().live_update_interval_ms;
                TimerPlan {
                    ingest_every: (mode == SourceMode::Demo && self.configured())
                        .then_some(DEMO_INGEST_INTERVAL),
                    refresh_every: Some(Duration::from_millis(refresh as u64)),
                }
            }
        }
    }

    // --- context inputs: any change starts a fresh measurement context ---

    pub fn set_time_scale(&mut self, time_scale: TimeScale) {
        if self.time_scale != time_scale {
            self.time_scale = time_scale;
            self.reset_context("time scale changed");
        }
    }

    pub fn update_config(&mut self, config: TimelineConfig) {
        if self.config != config {
            self.config = config;
            self.reset_context("timeline configuration changed");
        }
    }

    pub fn set_live_source_available(&mut self, available: bool) {
        if self.live_source_available != available {
            self.live_source_available = available;
            tracing::info!("Live source available: {}", available);
            self.reset_context("live source availability changed");
        }
    }

    pub fn set_catalogue(&mut self, catalogue: Vec<SignalDescriptor>) {
        self.catalogue = catalogue;
    }

    // --- navigation inputs: timers restart, history is kept ---

    pub fn go_live(&mut self) {
        if self.forced_live && self.historical_offset_ms == 0 {
            return;
        }
        self.forced_live = true;
        self.historical_offset_ms = 0;
        self.epoch += 1;
        self.sync_context("returned to live view");
    }

    pub fn shift_backward(&mut self, now_ms: i64) {
        let was_forced = std::mem::replace(&mut self.forced_live, false);
        let duration = self.time_scale.duration_ms();
        let step = self.buffer.oldest().and_then(|oldest| {
            backward_offset(self.historical_offset_ms, duration, now_ms, oldest.timestamp)
        });

        match step {
            Some(offset) => {
                tracing::debug!("Shifting view back: offset {} -> {} ms", self.historical_offset_ms, offset);
                self.historical_offset_ms = offset;
                self.epoch += 1;
            }
            None if was_forced => {
                self.epoch += 1;
                self.sync_context("left forced live view");
            }
            None => {}
        }
    }

    pub fn shift_forward(&mut self) {
        if self.historical_offset_ms == 0 {
            return;
        }
        let shift = self.time_scale.duration_ms() / 2;
        self.historical_offset_ms = (self.historical_offset_ms - shift).max(0);
        self.epoch += 1;
        self.sync_context("returned to live view");
    }

    pub fn navigation(&self, now_ms: i64) -> NavigationState {
        let can_go_back = self.buffer.oldest().is_some_and(|oldest| {
            backward_offset(
                self.historical_offset_ms,
                self.time_scale.duration_ms(),
                now_ms,
                oldest.timestamp,
            )
            .is_some()
        });
        NavigationState {
            can_go_back,
            can_go_forward: self.historical_offset_ms > 0,
        }
    }

    // --- ingestion ---

    /// One demo tick. Returns whether a sample was buffered.
    pub fn ingest_demo(&mut self, now_ms: i64) -> bool {
        if self.source_mode() != SourceMode::Demo || !self.configured() {
            return false;
        }
        let reading = self.demo.next(
            &local_time(now_ms),
            self.config.export_mode,
            self.smoothed_usage,
        );
        self.smoothed_usage = Some(reading.usage);
        self.buffer.append(Sample::aggregate(
            now_ms,
            reading.generation,
            reading.usage,
            reading.grid_flow,
            self.settings.precision,
        ));
        true
    }

    /// A new live snapshot arrived. Returns whether a sample was buffered.
    pub fn ingest_readings(&mut self, readings: ReadingSnapshot, received_at_ms: i64) -> bool {
        self.readings = readings;
        self.readings_updated_at = Some(received_at_ms);

        if self.source_mode() != SourceMode::Live || !self.config.has_live_signals() {
            return false;
        }
        let sample = self.resolve_live(received_at_ms);
        self.buffer.append(sample);
        true
    }

    // --- refresh ---

    /// Prune by wall clock, re-render the window and re-split it by polarity
    pub fn refresh(&mut self, now_ms: i64) {
        let pruned = self
            .buffer
            .prune_older_than(now_ms - self.time_scale.retention_ms());
        if pruned > 0 {
            tracing::debug!("Pruned {} samples past retention", pruned);
        }

        let anchor = now_ms - self.historical_offset_ms;
        self.chart = render(
            &self.buffer,
            self.time_scale,
            anchor,
            self.settings.max_points,
            self.settings.precision,
        );
        self.segments = segment(&self.chart);
        self.rendered_anchor_ms = Some(anchor);
        self.graph_ready = self.configured();
        self.last_updated_ms = Some(now_ms);
    }

    /// Headline values. Exactly one source applies, chosen by mode.
    pub fn current_values(&mut self, now_ms: i64) -> HeadlineValues {
        if !self.configured() {
            return HeadlineValues::zero(now_ms);
        }

        let chosen = match self.source_mode() {
            SourceMode::HistoricalReplay => self.chart.last().copied(),
            SourceMode::Demo => {
                let recent = self
                    .buffer
                    .newest()
                    .filter(|s| now_ms - s.timestamp < RECENT_DEMO_SAMPLE_MS)
                    .copied();
                Some(recent.unwrap_or_else(|| self.synthesize_demo(now_ms)))
            }
            SourceMode::Live => (self.config.has_live_signals() && !self.readings.is_empty())
                .then(|| self.resolve_live(now_ms)),
        };

        chosen
            .or_else(|| self.chart.last().copied())
            .or_else(|| self.buffer.newest().copied())
            .map(HeadlineValues::from)
            .unwrap_or_else(|| HeadlineValues::zero(now_ms))
    }

    pub fn snapshot(&mut self, now_ms: i64) -> ViewSnapshot {
        let current_values = self.current_values(now_ms);
        let anchor = self
            .rendered_anchor_ms
            .unwrap_or(now_ms - self.historical_offset_ms);

        ViewSnapshot {
            source_mode: self.source_mode(),
            time_scale: self.time_scale,
            configured: self.configured(),
            graph_ready: self.graph_ready,
            points: self.chart.clone(),
            segments: self.segments.clone(),
            current_values,
            current_label: format_tick(self.time_scale, current_values.timestamp),
            last_updated: self
                .last_updated_ms
                .and_then(DateTime::<Utc>::from_timestamp_millis)
                .map(|t| t.with_timezone(&Local).format("%H:%M:%S").to_string())
                .unwrap_or_else(|| "never".to_string()),
            navigation: self.navigation(now_ms),
            historical_offset_ms: self.historical_offset_ms,
            forced_live: self.forced_live,
            x_ticks: x_ticks(self.time_scale, anchor, self.chart.last().map(|p| p.timestamp)),
            y_domain: y_domain(&self.chart),
            generation_sources: source_names(&self.config.generation_ids, &self.catalogue),
            usage_sources: source_names(&self.config.usage_ids, &self.catalogue),
            readings_updated_at: self.readings_updated_at,
        }
    }

    fn resolve_live(&self, now_ms: i64) -> Sample {
        let unit = self.settings.display_unit;
        let sum = |ids: &[String]| sum_signals(ids, &self.readings, &self.catalogue, unit);

        let generation = sum(&self.config.generation_ids) + sum(&self.config.wind_ids);
        let usage = sum(&self.config.usage_ids).abs();
        let grid_flow = match self.config.export_mode {
            ExportMode::Manual if !self.config.export_ids.is_empty() => sum(&self.config.export_ids),
            _ => generation - usage,
        };

        Sample::aggregate(now_ms, generation, usage, grid_flow, self.settings.precision)
    }

    /// Fresh demo value for the headline; not buffered and does not advance smoothing
    fn synthesize_demo(&mut self, now_ms: i64) -> Sample {
        let reading = self.demo.next(
            &local_time(now_ms),
            self.config.export_mode,
            self.smoothed_usage,
        );
        Sample::aggregate(
            now_ms,
            reading.generation,
            reading.usage,
            reading.grid_flow,
            self.settings.precision,
        )
    }

    /// Start over if the source that would ingest now differs from the one
    /// that filled the buffer. History stays frozen while replaying.
    fn sync_context(&mut self, reason: &str) {
        if self.historical_offset_ms > 0 {
            return;
        }
        if self.buffer_source != Some(self.source_mode()) {
            self.reset_context(reason);
        }
    }

    fn reset_context(&mut self, reason: &str) {
        tracing::info!(
            "Resetting timeline context ({}): mode={:?} scale={}",
            reason,
            self.source_mode(),
            self.time_scale
        );
        self.buffer.clear();
        self.chart.clear();
        self.segments.clear();
        self.graph_ready = false;
        self.smoothed_usage = None;
        self.last_updated_ms = None;
        self.rendered_anchor_ms = None;
        self.buffer_source = match self.source_mode() {
            SourceMode::HistoricalReplay => None,
            mode => Some(mode),
        };
        self.epoch += 1;
    }
}

/// Offset after one step back, clamped so the window start never passes
/// `oldest_ms`. `None` when the window already reaches the oldest sample.
pub fn backward_offset(offset_ms: i64, duration_ms: i64, now_ms: i64, oldest_ms: i64) -> Option<i64> {
    if now_ms - offset_ms - duration_ms <= oldest_ms {
        return None;
    }
    let proposed = offset_ms + duration_ms / 2;
    if now_ms - proposed - duration_ms <= oldest_ms {
        Some(now_ms - duration_ms - oldest_ms)
    } else {
        Some(proposed)
    }
}

fn local_time(now_ms: i64) -> NaiveTime {
    DateTime::<Utc>::from_timestamp_millis(now_ms)
        .map(|t| t.with_timezone(&Local).time())
        .unwrap_or_default()
}
