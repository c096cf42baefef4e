// Application state for HTTP handlers
use crate::application::timeline_service::TimelineHandle;

#[derive(Clone)]
pub struct AppState {
    pub timeline: TimelineHandle,
}
