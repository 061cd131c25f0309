use crate::config::{PageSpeedConfig, Strategy};
use crate::pagespeed::{PageSpeedError, PageSpeedScores};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Queries the PageSpeed Insights API for each configured strategy
#[derive(Debug, Clone)]
pub struct PageSpeedClient {
    client: Client,
    endpoint: String,
    api_key: String,
    strategies: Vec<Strategy>,
}

impl PageSpeedClient {
    /// Builds a client, or `None` when no API key is configured
    pub fn from_config(config: &PageSpeedConfig) -> Result<Option<Self>, reqwest::Error> {
        let Some(api_key) = config.active_key() else {
            return Ok(None);
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;

        Ok(Some(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: api_key.to_string(),
            strategies: config.strategies.clone(),
        }))
    }

    /// Fetches the performance score for one strategy
    pub async fn fetch_score(&self, url: &str, strategy: Strategy) -> Result<u8, PageSpeedError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("url", url),
                ("key", self.api_key.as_str()),
                ("strategy", strategy.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(PageSpeedError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        parse_performance_score(&body)
    }

    /// Scores a page with every configured strategy concurrently
    ///
    /// Failures are logged and leave that strategy's score empty.
    pub async fn score_page(&self, url: &str) -> PageSpeedScores {
        let wants = |s: Strategy| self.strategies.contains(&s);

        let (mobile, desktop) = tokio::join!(
            self.optional_score(url, Strategy::Mobile, wants(Strategy::Mobile)),
            self.optional_score(url, Strategy::Desktop, wants(Strategy::Desktop)),
        );

        PageSpeedScores { mobile, desktop }
    }

    async fn optional_score(&self, url: &str, strategy: Strategy, enabled: bool) -> Option<u8> {
        if !enabled {
            return None;
        }

        match self.fetch_score(url, strategy).await {
            Ok(score) => {
                tracing::debug!("PageSpeed {} score for {}: {}", strategy.as_str(), url, score);
                Some(score)
            }
            Err(e) => {
                tracing::warn!("PageSpeed {} failed for {}: {}", strategy.as_str(), url, e);
                None
            }
        }
    }
}

/// Reads `lighthouseResult.categories.performance.score` (0-1) as 0-100
pub fn parse_performance_score(body: &str) -> Result<u8, PageSpeedError> {
    let json: Value = serde_json::from_str(body)?;
    let score = json
        .pointer("/lighthouseResult/categories/performance/score")
        .and_then(Value::as_f64)
        .ok_or(PageSpeedError::MissingScore)?;

    Ok((score * 100.0).round().clamp(0.0, 100.0) as u8)
}

/// Google APIs report errors as `{"error": {"message": ...}}`
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| {
            json.pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.chars().take(200).collect())
}
