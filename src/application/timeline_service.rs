// Timeline service - single-writer task owning the view controller and its timers
use crate::application::view_controller::ViewController;
use crate::domain::signal::{ReadingSnapshot, SignalDescriptor, TimelineConfig};
use crate::domain::time_scale::TimeScale;
use crate::domain::view::ViewSnapshot;
use crate::error::TimelineError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, Interval, MissedTickBehavior};

const COMMAND_CAPACITY: usize = 100;

#[derive(Debug, Clone)]
pub enum TimelineCommand {
    SetTimeScale(TimeScale),
    UpdateConfig(TimelineConfig),
    SetCatalogue(Vec<SignalDescriptor>),
    SetLiveSourceAvailable(bool),
    Readings(ReadingSnapshot),
    ShiftBackward,
    ShiftForward,
    GoLive,
}

/// Cloneable handle for talking to a running timeline task
#[derive(Clone)]
pub struct TimelineHandle {
    commands: mpsc::Sender<TimelineCommand>,
    view: watch::Receiver<ViewSnapshot>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl TimelineHandle {
    pub async fn send(&self, command: TimelineCommand) -> Result<(), TimelineError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| TimelineError::ServiceStopped)
    }

    pub fn current(&self) -> ViewSnapshot {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewSnapshot> {
        self.view.clone()
    }

    /// Stop the task. No buffer mutation happens after it returns from its loop.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }
}

/// Milliseconds since the Unix epoch from the wall clock
pub fn wall_clock_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub fn spawn_timeline(controller: ViewController) -> (TimelineHandle, JoinHandle<()>) {
    spawn_timeline_with_clock(controller, wall_clock_ms)
}

pub fn spawn_timeline_with_clock(
    mut controller: ViewController,
    clock: fn() -> i64,
) -> (TimelineHandle, JoinHandle<()>) {
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CAPACITY);
    let (view_tx, view_rx) = watch::channel(controller.snapshot(clock()));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(run(controller, clock, cmd_rx, view_tx, shutdown_rx));

    let handle = TimelineHandle {
        commands: cmd_tx,
        view: view_rx,
        shutdown: Arc::new(shutdown_tx),
    };
    (handle, task)
}

struct Timers {
    epoch: u64,
    ingest: Option<Interval>,
    refresh: Option<Interval>,
}

impl Timers {
    fn plan(controller: &ViewController) -> Self {
        let plan = controller.timer_plan();
        tracing::debug!(
            "Timers for epoch {}: ingest={:?} refresh={:?}",
            controller.epoch(),
            plan.ingest_every,
            plan.refresh_every
        );
        Self {
            epoch: controller.epoch(),
            ingest: plan.ingest_every.map(ticker),
            refresh: plan.refresh_every.map(ticker),
        }
    }
}

fn ticker(period: Duration) -> Interval {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(t) => {
            t.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

async fn run(
    mut controller: ViewController,
    clock: fn() -> i64,
    mut commands: mpsc::Receiver<TimelineCommand>,
    view: watch::Sender<ViewSnapshot>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut timers = Timers::plan(&controller);
    if timers.refresh.is_none() {
        controller.refresh(clock());
        publish(&mut controller, &view, clock());
    }

    loop {
        tokio::select! {
            _ = next_tick(&mut timers.ingest) => {
                controller.ingest_demo(clock());
            }
            _ = next_tick(&mut timers.refresh) => {
                let now = clock();
                controller.refresh(now);
                publish(&mut controller, &view, now);
            }
            command = commands.recv() => {
                let Some(command) = command else {
                    tracing::info!("Timeline command channel closed, stopping");
                    break;
                };
                apply(&mut controller, command, clock());

                if controller.epoch() != timers.epoch {
                    // old intervals are dropped here, so nothing stale can fire
                    timers = Timers::plan(&controller);
                    if timers.refresh.is_none() {
                        controller.refresh(clock());
                    }
                }
                publish(&mut controller, &view, clock());
            }
            _ = shutdown.changed() => {
                tracing::info!("Timeline shutdown requested");
                break;
            }
        }
    }
}

fn apply(controller: &mut ViewController, command: TimelineCommand, now_ms: i64) {
    match command {
        TimelineCommand::SetTimeScale(scale) => controller.set_time_scale(scale),
        TimelineCommand::UpdateConfig(config) => controller.update_config(config),
        TimelineCommand::SetCatalogue(catalogue) => controller.set_catalogue(catalogue),
        TimelineCommand::SetLiveSourceAvailable(available) => {
            controller.set_live_source_available(available)
        }
        TimelineCommand::Readings(readings) => {
            controller.ingest_readings(readings, now_ms);
        }
        TimelineCommand::ShiftBackward => controller.shift_backward(now_ms),
        TimelineCommand::ShiftForward => controller.shift_forward(),
        TimelineCommand::GoLive => controller.go_live(),
    }
}

fn publish(controller: &mut ViewController, view: &watch::Sender<ViewSnapshot>, now_ms: i64) {
    view.send_replace(controller.snapshot(now_ms));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::view_controller::ViewSettings;
    use crate::domain::signal::SignalDescriptor;
    use crate::domain::view::SourceMode;
    use serde_json::json;

    thread_local! {
        static START: std::cell::Cell<Option<tokio::time::Instant>> = const { std::cell::Cell::new(None) };
    }

    // paused test time, anchored at a fixed epoch
    fn tokio_clock() -> i64 {
        let now = tokio::time::Instant::now();
        let start = START.with(|cell| {
            let start = cell.get().unwrap_or(now);
            cell.set(Some(start));
            start
        });
        1_760_000_000_000 + now.duration_since(start).as_millis() as i64
    }

    fn demo_controller() -> ViewController {
        let config = TimelineConfig {
            use_demo_source: true,
            ..Default::default()
        };
        ViewController::new(ViewSettings::default(), config, Vec::new(), TimeScale::OneMinute)
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_demo_mode_ingests_and_publishes() {
        let (handle, task) = spawn_timeline_with_clock(demo_controller(), tokio_clock);
        let mut view = handle.subscribe();

        tokio::time::sleep(Duration::from_millis(5_500)).await;
        settle().await;

        let snapshot = view.borrow_and_update().clone();
        assert_eq!(snapshot.source_mode, SourceMode::Demo);
        assert!(snapshot.graph_ready);
        assert!(!snapshot.points.is_empty());

        handle.shutdown();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_scale_change_resets_published_view() {
        let (handle, task) = spawn_timeline_with_clock(demo_controller(), tokio_clock);
        tokio::time::sleep(Duration::from_millis(3_500)).await;
        settle().await;
        assert!(!handle.current().points.is_empty());

        handle
            .send(TimelineCommand::SetTimeScale(TimeScale::ThirtySeconds))
            .await
            .unwrap();
        settle().await;

        let snapshot = handle.current();
        assert_eq!(snapshot.time_scale, TimeScale::ThirtySeconds);
        assert!(snapshot.points.len() <= 1);
        handle.shutdown();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_ingestion_survives_into_replay() {
        let config = TimelineConfig {
            use_demo_source: true,
            ..Default::default()
        };
        let controller =
            ViewController::new(ViewSettings::default(), config, Vec::new(), TimeScale::ThirtySeconds);
        let (handle, task) = spawn_timeline_with_clock(controller, tokio_clock);

        tokio::time::sleep(Duration::from_secs(40)).await;
        settle().await;
        handle.send(TimelineCommand::ShiftBackward).await.unwrap();
        settle().await;

        let replay = handle.current();
        assert_eq!(replay.source_mode, SourceMode::HistoricalReplay);
        assert!(replay.historical_offset_ms > 0);
        assert!(!replay.points.is_empty());

        tokio::time::sleep(Duration::from_secs(5)).await;
        settle().await;

        let later = handle.current();
        assert_eq!(later.points, replay.points);
        assert_eq!(later.historical_offset_ms, replay.historical_offset_ms);
        assert_eq!(later.last_updated, replay.last_updated);

        handle.shutdown();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_live_readings_flow_through_commands() {
        let config = TimelineConfig {
            generation_ids: vec!["pv".to_string()],
            usage_ids: vec!["load".to_string()],
            ..Default::default()
        };
        let catalogue = vec![
            SignalDescriptor::new("pv", "n1", Some("kW"), None),
            SignalDescriptor::new("load", "n2", Some("kW"), None),
        ];
        let controller =
            ViewController::new(ViewSettings::default(), config, catalogue, TimeScale::OneMinute);
        let (handle, task) = spawn_timeline_with_clock(controller, tokio_clock);

        handle.send(TimelineCommand::SetLiveSourceAvailable(true)).await.unwrap();
        let readings: ReadingSnapshot = [
            ("n1".to_string(), json!(6.0)),
            ("n2".to_string(), json!(2.0)),
        ]
        .into_iter()
        .collect();
        handle.send(TimelineCommand::Readings(readings)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        settle().await;

        let snapshot = handle.current();
        assert_eq!(snapshot.source_mode, SourceMode::Live);
        assert_eq!(snapshot.points.len(), 1);
        assert_eq!(snapshot.current_values.grid_flow, 4.0);

        handle.shutdown();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_closed_service_reports_stopped() {
        let (handle, task) = spawn_timeline(demo_controller());
        handle.shutdown();
        task.await.unwrap();

        let result = handle.send(TimelineCommand::GoLive).await;
        assert!(matches!(result, Err(TimelineError::ServiceStopped)));
    }
}
