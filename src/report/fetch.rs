use bytes::Bytes;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use super::RawReport;
use crate::config::{STRUCTURED_ARTIFACT, TABULAR_ARTIFACT};
use crate::error::SimError;

/// Retrieves both artifacts of a report. One attempt, no cache.
#[derive(Debug, Clone)]
pub struct ReportFetcher {
    client: reqwest::Client,
    base_url: Url,
}

impl ReportFetcher {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("guild-sim/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Self::with_client(client, base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> anyhow::Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(ReportFetcher { client, base_url })
    }

    /// Canonical report URL for a reference: either a full http(s) URL
    /// (optionally pointing at one of the artifacts) or a bare report id.
    pub fn report_url(&self, reference: &str) -> Result<Url, SimError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(SimError::fetch_failed_both("empty report reference"));
        }

        if reference.contains("://") {
            let mut url = Url::parse(reference).map_err(|e| {
                SimError::fetch_failed_both(format!("invalid report URL '{}': {}", reference, e))
            })?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(SimError::fetch_failed_both(format!(
                    "unsupported URL scheme '{}'",
                    url.scheme()
                )));
            }
            url.set_query(None);
            url.set_fragment(None);

            let mut path = url.path().trim_end_matches('/').to_string();
            for artifact in [TABULAR_ARTIFACT, STRUCTURED_ARTIFACT] {
                if let Some(stripped) = path.strip_suffix(artifact) {
                    path = stripped.trim_end_matches('/').to_string();
                }
            }
            url.set_path(&format!("{}/", path));
            return Ok(url);
        }

        if reference.chars().all(|c| c.is_ascii_alphanumeric()) {
            return self
                .base_url
                .join(&format!("{}/", reference))
                .map_err(|e| SimError::fetch_failed_both(e.to_string()));
        }

        Err(SimError::fetch_failed_both(format!(
            "'{}' is neither a report URL nor a report id",
            reference
        )))
    }

    pub async fn fetch(&self, reference: &str) -> Result<RawReport, SimError> {
        let report_url = self.report_url(reference)?;
        let tabular_url = join_artifact(&report_url, TABULAR_ARTIFACT)?;
        let structured_url = join_artifact(&report_url, STRUCTURED_ARTIFACT)?;

        info!("Fetching report {}", report_url);
        let (tabular, structured) = tokio::join!(
            fetch_artifact(&self.client, tabular_url),
            fetch_artifact(&self.client, structured_url),
        );

        match (tabular, structured) {
            (Ok(tabular), Ok(structured)) => {
                info!(
                    "Fetched report {} ({} + {} bytes)",
                    report_url,
                    tabular.len(),
                    structured.len()
                );
                Ok(RawReport {
                    source_url: report_url.to_string(),
                    tabular,
                    structured,
                })
            }
            (tabular, structured) => {
                let err = SimError::FetchFailed {
                    tabular: tabular.err(),
                    structured: structured.err(),
                };
                warn!("Report {}: {}", report_url, err);
                Err(err)
            }
        }
    }
}

fn join_artifact(report_url: &Url, artifact: &str) -> Result<Url, SimError> {
    report_url
        .join(artifact)
        .map_err(|e| SimError::fetch_failed_both(e.to_string()))
}

async fn fetch_artifact(client: &reqwest::Client, url: Url) -> Result<Bytes, String> {
    let resp = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| format!("request to {} failed: {}", url, e))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(format!("HTTP {} from {}", status, url));
    }

    resp.bytes()
        .await
        .map_err(|e| format!("reading body of {} failed: {}", url, e))
}
