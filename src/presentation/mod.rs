// Presentation layer - HTTP routes over the timeline service
pub mod app_state;
pub mod handlers;

use crate::presentation::app_state::AppState;
use crate::presentation::handlers::*;
use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/timeline", get(get_timeline))
        .route("/timeline/stream", get(stream_timeline))
        .route("/timeline/scale", put(set_time_scale))
        .route("/timeline/config", put(update_config))
        .route("/timeline/catalogue", put(set_catalogue))
        .route("/timeline/live-source", put(set_live_source))
        .route("/timeline/shift-backward", post(shift_backward))
        .route("/timeline/shift-forward", post(shift_forward))
        .route("/timeline/go-live", post(go_live))
        .route("/readings", post(push_readings))
        .with_state(state)
}
