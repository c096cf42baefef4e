// HTTP request handlers
use crate::application::timeline_service::TimelineCommand;
use crate::domain::signal::{ReadingSnapshot, SignalDescriptor, TimelineConfig};
use crate::domain::time_scale::TimeScale;
use crate::error::TimelineError;
use crate::infrastructure::chunked_json::stream_from_watch;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct ScaleRequest {
    pub scale: String,
}

#[derive(Deserialize)]
pub struct LiveSourceRequest {
    pub available: bool,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Current view snapshot
pub async fn get_timeline(headers: HeaderMap, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.timeline.current();
    match json_response(&snapshot, accepts_brotli(&headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Every published view snapshot as a length-prefixed frame
pub async fn stream_timeline(headers: HeaderMap, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    stream_from_watch(state.timeline.subscribe(), accepts_brotli(&headers))
}

pub async fn set_time_scale(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ScaleRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(json) => json,
        Err(rejection) => return bad_request(rejection),
    };
    match request.scale.parse::<TimeScale>() {
        Ok(scale) => dispatch(&state, TimelineCommand::SetTimeScale(scale)).await,
        Err(e) => error_response(e),
    }
}

pub async fn update_config(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TimelineConfig>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(config)) => dispatch(&state, TimelineCommand::UpdateConfig(config)).await,
        Err(rejection) => bad_request(rejection),
    }
}

pub async fn set_catalogue(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Vec<SignalDescriptor>>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(catalogue)) => dispatch(&state, TimelineCommand::SetCatalogue(catalogue)).await,
        Err(rejection) => bad_request(rejection),
    }
}

pub async fn set_live_source(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LiveSourceRequest>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(request)) => {
            dispatch(&state, TimelineCommand::SetLiveSourceAvailable(request.available)).await
        }
        Err(rejection) => bad_request(rejection),
    }
}

/// Readings pushed by an external transport
pub async fn push_readings(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ReadingSnapshot>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(readings)) => dispatch(&state, TimelineCommand::Readings(readings)).await,
        Err(rejection) => bad_request(rejection),
    }
}

pub async fn shift_backward(State(state): State<Arc<AppState>>) -> Response {
    dispatch(&state, TimelineCommand::ShiftBackward).await
}

pub async fn shift_forward(State(state): State<Arc<AppState>>) -> Response {
    dispatch(&state, TimelineCommand::ShiftForward).await
}

pub async fn go_live(State(state): State<Arc<AppState>>) -> Response {
    dispatch(&state, TimelineCommand::GoLive).await
}

async fn dispatch(state: &AppState, command: TimelineCommand) -> Response {
    match state.timeline.send(command).await {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(e) => error_response(e),
    }
}

fn error_response(e: TimelineError) -> Response {
    let status = match e {
        TimelineError::ServiceStopped => StatusCode::SERVICE_UNAVAILABLE,
        TimelineError::UnknownTimeScale(_) => StatusCode::BAD_REQUEST,
        TimelineError::SourceStatus(_) | TimelineError::Source(_) => StatusCode::BAD_GATEWAY,
    };
    tracing::warn!("Request failed with {}: {}", status, e);
    (status, e.to_string()).into_response()
}

fn bad_request(rejection: JsonRejection) -> Response {
    tracing::debug!("Rejected request body: {}", rejection);
    (StatusCode::BAD_REQUEST, rejection.body_text()).into_response()
}

#[cfg(test)]
mod tests {
    use crate::application::timeline_service::{spawn_timeline, TimelineHandle};
    use crate::application::view_controller::{ViewController, ViewSettings};
    use crate::domain::signal::TimelineConfig;
    use crate::domain::time_scale::TimeScale;
    use crate::presentation::app_state::AppState;
    use crate::presentation::router;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;

    async fn serve() -> (String, TimelineHandle) {
        let config = TimelineConfig {
            use_demo_source: true,
            ..Default::default()
        };
        let controller = ViewController::new(ViewSettings::default(), config, Vec::new(), TimeScale::OneMinute);
        let (timeline, _task) = spawn_timeline(controller);
        let state = Arc::new(AppState {
            timeline: timeline.clone(),
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });
        (format!("http://{}", addr), timeline)
    }

    async fn wait_for<F: Fn(&Value) -> bool>(client: &reqwest::Client, base: &str, check: F) -> Value {
        for _ in 0..50 {
            let view: Value = client
                .get(format!("{}/timeline", base))
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            if check(&view) {
                return view;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("timeline never reached the expected state");
    }

    #[tokio::test]
    async fn test_health_and_snapshot() {
        let (base, _timeline) = serve().await;
        let client = reqwest::Client::new();

        let health = client.get(format!("{}/healthz", base)).send().await.unwrap();
        assert_eq!(health.text().await.unwrap(), "ok");

        let view = wait_for(&client, &base, |v| v["graph_ready"] == true).await;
        assert_eq!(view["source_mode"], "demo");
        assert_eq!(view["time_scale"], "1m");
        assert_eq!(view["generation_sources"], "N/A");
    }

    #[tokio::test]
    async fn test_scale_change_and_bad_scale() {
        let (base, _timeline) = serve().await;
        let client = reqwest::Client::new();

        let accepted = client
            .put(format!("{}/timeline/scale", base))
            .json(&json!({"scale": "5m"}))
            .send()
            .await
            .unwrap();
        assert_eq!(accepted.status(), 202);
        wait_for(&client, &base, |v| v["time_scale"] == "5m").await;

        let rejected = client
            .put(format!("{}/timeline/scale", base))
            .json(&json!({"scale": "2h"}))
            .send()
            .await
            .unwrap();
        assert_eq!(rejected.status(), 400);

        let malformed = client
            .put(format!("{}/timeline/config", base))
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(malformed.status(), 400);
    }

    #[tokio::test]
    async fn test_go_live_forces_live_mode() {
        let (base, _timeline) = serve().await;
        let client = reqwest::Client::new();

        client
            .put(format!("{}/timeline/config", base))
            .json(&json!({"generation_ids": ["pv"], "usage_ids": ["load"]}))
            .send()
            .await
            .unwrap();
        let go_live = client
            .post(format!("{}/timeline/go-live", base))
            .send()
            .await
            .unwrap();
        assert_eq!(go_live.status(), 202);

        let view = wait_for(&client, &base, |v| v["source_mode"] == "live").await;
        assert_eq!(view["forced_live"], true);
    }

    #[tokio::test]
    async fn test_stopped_service_returns_unavailable() {
        let (base, timeline) = serve().await;
        timeline.shutdown();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let response = reqwest::Client::new()
            .post(format!("{}/timeline/shift-forward", base))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 503);
    }
}
