// Errors raised at the edges of the timeline engine
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TimelineError {
    #[error("timeline service has shut down")]
    ServiceStopped,

    #[error("unknown time scale: {0}")]
    UnknownTimeScale(String),

    #[error("reading source returned status {0}")]
    SourceStatus(u16),

    #[error("reading source request failed: {0}")]
    Source(#[from] reqwest::Error),
}
