// Live reading source polling a JSON snapshot endpoint
use crate::application::reading_source::ReadingSource;
use crate::domain::signal::ReadingSnapshot;
use crate::error::TimelineError;
use async_trait::async_trait;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct HttpReadingSource {
    client: reqwest::Client,
    url: String,
}

impl HttpReadingSource {
    pub fn new(url: impl Into<String>) -> Result<Self, TimelineError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl ReadingSource for HttpReadingSource {
    async fn fetch(&self) -> Result<ReadingSnapshot, TimelineError> {
        let response = self
            .client
            .get(&self.url)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TimelineError::SourceStatus(response.status().as_u16()));
        }

        Ok(response.json::<ReadingSnapshot>().await?)
    }
}
