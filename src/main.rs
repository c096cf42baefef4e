// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod error;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::reading_source::pump_readings;
use crate::application::timeline_service::spawn_timeline;
use crate::application::view_controller::ViewController;
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::http_reading_source::HttpReadingSource;
use crate::presentation::app_state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_app_config()?;

    // Engine (application layer)
    let controller = ViewController::new(
        config.view_settings(),
        config.timeline.config.clone(),
        config.catalogue.clone(),
        config.timeline.time_scale,
    );
    let (timeline, timeline_task) = spawn_timeline(controller);

    // Live readings (infrastructure layer)
    if let Some(url) = &config.live.url {
        let source = Arc::new(HttpReadingSource::new(url.as_str())?);
        tracing::info!("Polling live readings from {} every {:?}", url, config.live.poll_interval());
        tokio::spawn(pump_readings(source, config.live.poll_interval(), timeline.clone()));
    } else {
        tracing::info!("No live source configured");
    }

    let state = Arc::new(AppState {
        timeline: timeline.clone(),
    });

    // Responses are compressed by our own encoders, so no CompressionLayer here
    let router = presentation::router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server.bind_addr.parse()?;
    tracing::info!("Starting power-timeline service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    timeline.shutdown();
    timeline_task.await?;
    Ok(())
}
