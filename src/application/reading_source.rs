// Reading source trait and the pump feeding live snapshots into the timeline
use crate::application::timeline_service::{TimelineCommand, TimelineHandle};
use crate::domain::signal::ReadingSnapshot;
use crate::error::TimelineError;
use async_trait::async_trait;
use futures::stream::Stream;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

#[async_trait]
pub trait ReadingSource: Send + Sync {
    /// Fetch the latest reading per node id
    async fn fetch(&self) -> Result<ReadingSnapshot, TimelineError>;
}

/// Poll `source` every `every`, yielding each outcome
pub fn poll_stream(
    source: Arc<dyn ReadingSource>,
    every: Duration,
) -> impl Stream<Item = Result<ReadingSnapshot, TimelineError>> {
    async_stream::stream! {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            yield source.fetch().await;
        }
    }
}

/// Turns raw poll outcomes into timeline commands: availability flips and
/// changed snapshots only.
#[derive(Debug, Default)]
pub struct ReadingTracker {
    available: Option<bool>,
    last: Option<ReadingSnapshot>,
}

impl ReadingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, outcome: Result<ReadingSnapshot, TimelineError>) -> Vec<TimelineCommand> {
        let mut commands = Vec::new();
        match outcome {
            Ok(snapshot) => {
                if self.available != Some(true) {
                    tracing::info!("Live reading source is available");
                    self.available = Some(true);
                    commands.push(TimelineCommand::SetLiveSourceAvailable(true));
                }
                if self.last.as_ref() != Some(&snapshot) {
                    self.last = Some(snapshot.clone());
                    commands.push(TimelineCommand::Readings(snapshot));
                }
            }
            Err(e) => {
                if self.available != Some(false) {
                    tracing::warn!("Live reading source unavailable: {}", e);
                    self.available = Some(false);
                    commands.push(TimelineCommand::SetLiveSourceAvailable(false));
                } else {
                    tracing::debug!("Live reading poll failed again: {}", e);
                }
                // a recovered source re-sends its first snapshot into the fresh context
                self.last = None;
            }
        }
        commands
    }
}

/// Forward polled readings into the timeline until it stops
pub async fn pump_readings(source: Arc<dyn ReadingSource>, every: Duration, timeline: TimelineHandle) {
    let mut tracker = ReadingTracker::new();
    let mut outcomes = Box::pin(poll_stream(source, every));

    while let Some(outcome) = outcomes.next().await {
        for command in tracker.observe(outcome) {
            if timeline.send(command).await.is_err() {
                tracing::info!("Timeline stopped, ending reading pump");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::timeline_service::spawn_timeline;
    use crate::application::view_controller::{ViewController, ViewSettings};
    use crate::domain::signal::{SignalDescriptor, TimelineConfig};
    use crate::domain::time_scale::TimeScale;
    use crate::domain::view::SourceMode;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    fn snapshot(value: f64) -> ReadingSnapshot {
        [("n1".to_string(), json!(value))].into_iter().collect()
    }

    struct ScriptedSource {
        outcomes: Mutex<VecDeque<Result<ReadingSnapshot, TimelineError>>>,
    }

    #[async_trait]
    impl ReadingSource for ScriptedSource {
        async fn fetch(&self) -> Result<ReadingSnapshot, TimelineError> {
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(TimelineError::SourceStatus(503)))
        }
    }

    #[test]
    fn test_unchanged_snapshots_are_not_forwarded() {
        let mut tracker = ReadingTracker::new();
        let first = tracker.observe(Ok(snapshot(1.0)));
        assert!(matches!(first[0], TimelineCommand::SetLiveSourceAvailable(true)));
        assert!(matches!(first[1], TimelineCommand::Readings(_)));

        assert!(tracker.observe(Ok(snapshot(1.0))).is_empty());
        assert_eq!(tracker.observe(Ok(snapshot(2.0))).len(), 1);
    }

    #[test]
    fn test_failure_flips_availability_once() {
        let mut tracker = ReadingTracker::new();
        tracker.observe(Ok(snapshot(1.0)));

        let failed = tracker.observe(Err(TimelineError::SourceStatus(500)));
        assert!(matches!(failed[..], [TimelineCommand::SetLiveSourceAvailable(false)]));
        assert!(tracker.observe(Err(TimelineError::SourceStatus(500))).is_empty());

        let recovered = tracker.observe(Ok(snapshot(1.0)));
        assert_eq!(recovered.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pump_switches_timeline_to_live() {
        let config = TimelineConfig {
            generation_ids: vec!["pv".to_string()],
            usage_ids: vec!["load".to_string()],
            ..Default::default()
        };
        let catalogue = vec![
            SignalDescriptor::new("pv", "n1", Some("kW"), None),
            SignalDescriptor::new("load", "n2", Some("kW"), None),
        ];
        let controller = ViewController::new(ViewSettings::default(), config, catalogue, TimeScale::OneMinute);
        let (handle, task) = spawn_timeline(controller);
        assert_eq!(handle.current().source_mode, SourceMode::Demo);

        let source = Arc::new(ScriptedSource {
            outcomes: Mutex::new(VecDeque::from([Ok(snapshot(3.0)), Ok(snapshot(3.0))])),
        });
        let pump = tokio::spawn(pump_readings(source, Duration::from_secs(1), handle.clone()));

        tokio::time::sleep(Duration::from_millis(500)).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        let live = handle.current();
        assert_eq!(live.source_mode, SourceMode::Live);
        assert_eq!(live.current_values.generation, 3.0);

        // scripted outcomes run out and the source starts failing
        tokio::time::sleep(Duration::from_secs(3)).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(handle.current().source_mode, SourceMode::Demo);

        pump.abort();
        handle.shutdown();
        task.await.unwrap();
    }
}
