//! Client that polls a rate limited endpoint and reads the limiter state back.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use tracing::{debug, info, warn};

use crate::error::{Result, TollgateError};
use crate::ratelimit::Quota;

/// Periodically requests a URL and reports the rate limit headers it gets.
pub struct Probe {
    client: reqwest::Client,
    url: String,
    period: Duration,
}

/// What one poll observed.
#[derive(Debug, Clone)]
pub struct ProbeReport {
    /// The URL that was requested
    pub url: String,
    /// Response status
    pub status: StatusCode,
    /// Rate limit state reported by the server
    pub quota: Quota,
}

impl ProbeReport {
    /// Whether the request was rejected by the rate limiter.
    pub fn is_limited(&self) -> bool {
        self.status == StatusCode::TOO_MANY_REQUESTS
    }

    /// The reset header as a wall-clock instant.
    pub fn reset_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.quota.reset, 0)
    }
}

impl fmt::Display for ProbeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} responded with {}, rate limit reset at ",
            self.url,
            self.status.as_u16()
        )?;
        match self.reset_at() {
            Some(at) => write!(f, "{}", at),
            None => write!(f, "{}", self.quota.reset),
        }
    }
}

impl Probe {
    /// Create a probe that requests `url` once every `period`.
    pub fn new(url: impl Into<String>, period: Duration) -> Result<Self> {
        if period.is_zero() {
            return Err(TollgateError::InvalidInterval(period));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            url: url.into(),
            period,
        })
    }

    /// Issue a single request and parse the rate limit headers.
    pub async fn poll_once(&self) -> Result<ProbeReport> {
        let response = self.client.get(&self.url).send().await.map_err(|e| {
            warn!(url = %self.url, error = %e, "Request failed");
            TollgateError::Client(e)
        })?;

        let status = response.status();
        let quota = Quota::from_headers(response.headers())?;
        debug!(
            url = %self.url,
            status = status.as_u16(),
            used = quota.used,
            remaining = quota.remaining,
            "Polled endpoint"
        );

        Ok(ProbeReport {
            url: self.url.clone(),
            status,
            quota,
        })
    }

    /// Poll every period until `shutdown` resolves.
    ///
    /// The first tick fires one period after start. A failed request or a
    /// missing header ends the run with an error.
    pub async fn run<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.period);
        ticker.tick().await;
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.poll_once().await?;
                    info!(
                        status = report.status.as_u16(),
                        reset = report.quota.reset,
                        "{}",
                        report
                    );
                }
                _ = &mut shutdown => {
                    info!("Shutting down");
                    return Ok(());
                }
            }
        }
    }
}
