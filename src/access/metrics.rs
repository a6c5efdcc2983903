//! Metrics Backend Access
//!
//! Prometheus-compatible HTTP query client. The endpoint is discovered on
//! first use and cached for the lifetime of this value; nothing is global.
//! Instant queries retry a fixed number of times with a fixed delay; range
//! queries are single-attempt.

use crate::access::discovery::MetricsDiscovery;
use crate::config::MetricsConfig;
use crate::domain::ports::{MetricsBackend, MetricsEndpoint, TimeSeriesResult};
use crate::error::{Error, Result};
use async_trait::async_trait;
use backoff::backoff::Backoff;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

// =============================================================================
// Retry Policy
// =============================================================================

/// Fixed delay between a bounded number of attempts
#[derive(Debug, Clone)]
pub struct FixedRetry {
    delay: Duration,
    max_attempts: u32,
    failures: u32,
}

impl FixedRetry {
    pub fn new(delay: Duration, max_attempts: u32) -> Self {
        Self {
            delay,
            max_attempts: max_attempts.max(1),
            failures: 0,
        }
    }
}

impl Backoff for FixedRetry {
    fn next_backoff(&mut self) -> Option<Duration> {
        self.failures += 1;
        if self.failures < self.max_attempts {
            Some(self.delay)
        } else {
            None
        }
    }

    fn reset(&mut self) {
        self.failures = 0;
    }
}

// =============================================================================
// Metrics Access
// =============================================================================

/// Query client over a lazily discovered endpoint
pub struct MetricsAccess {
    config: MetricsConfig,
    http: reqwest::Client,
    discovery: Option<MetricsDiscovery>,
    endpoint: OnceCell<MetricsEndpoint>,
}

impl MetricsAccess {
    /// Create a client that discovers its endpoint on first use
    pub fn new(config: MetricsConfig, kube: Option<kube::Client>) -> Result<Self> {
        let http = build_http(&config)?;
        let discovery = MetricsDiscovery::new(config.clone(), http.clone(), kube);
        Ok(Self {
            config,
            http,
            discovery: Some(discovery),
            endpoint: OnceCell::new(),
        })
    }

    /// Create a client bound to a known endpoint
    pub fn with_endpoint(config: MetricsConfig, endpoint: MetricsEndpoint) -> Result<Self> {
        let http = build_http(&config)?;
        Ok(Self {
            config,
            http,
            discovery: None,
            endpoint: OnceCell::new_with(Some(endpoint)),
        })
    }

    async fn resolved(&self) -> Result<&MetricsEndpoint> {
        self.endpoint
            .get_or_try_init(|| async {
                match &self.discovery {
                    Some(discovery) => discovery.discover().await,
                    None => Err(Error::Internal("metrics endpoint not configured".into())),
                }
            })
            .await
    }

    /// One GET against the query API; any non-success outcome is an error
    async fn fetch(
        &self,
        endpoint: &MetricsEndpoint,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<TimeSeriesResult> {
        let url = format!("{}{}", endpoint.url, path);
        let mut request = self.http.get(&url).query(params);
        if let Some(token) = &endpoint.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Error::MetricsQueryStatus {
                status: status.to_string(),
                body,
            });
        }

        let parsed: TimeSeriesResult = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(e) => {
                return Err(Error::MetricsQueryStatus {
                    status: format!("unparseable ({})", e),
                    body,
                })
            }
        };

        if !parsed.is_success() {
            return Err(Error::MetricsQueryStatus {
                status: parsed.status.clone(),
                body,
            });
        }

        Ok(parsed)
    }
}

fn build_http(config: &MetricsConfig) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .danger_accept_invalid_certs(config.insecure_skip_tls_verify)
        .build()?)
}

#[async_trait]
impl MetricsBackend for MetricsAccess {
    async fn endpoint(&self) -> Result<MetricsEndpoint> {
        self.resolved().await.cloned()
    }

    async fn query_instant(&self, expr: &str) -> Result<TimeSeriesResult> {
        let endpoint = self.resolved().await?;
        let params = [("query", expr.to_string())];
        let attempts = AtomicU32::new(0);
        let policy = FixedRetry::new(self.config.retry_delay, self.config.retry_attempts);

        let this = self;
        let params_ref = &params;
        let attempts_ref = &attempts;
        let outcome = backoff::future::retry(policy, || async move {
            let attempt = attempts_ref.fetch_add(1, Ordering::Relaxed) + 1;
            debug!("Instant query attempt {}: {}", attempt, expr);
            this.fetch(endpoint, "/api/v1/query", params_ref)
                .await
                .map_err(|e| {
                    if e.is_retryable() {
                        warn!("Metrics query attempt {} failed: {}", attempt, e);
                        backoff::Error::transient(e)
                    } else {
                        backoff::Error::permanent(e)
                    }
                })
        })
        .await;

        outcome.map_err(|e| Error::MetricsQueryExhausted {
            query: expr.to_string(),
            endpoint: endpoint.url.clone(),
            attempts: attempts.load(Ordering::Relaxed),
            last_body: last_body(&e),
            reproduce: reproduce_command(endpoint, "/api/v1/query", &params),
        })
    }

    async fn query_range(
        &self,
        expr: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        step: Duration,
    ) -> Result<TimeSeriesResult> {
        let endpoint = self.resolved().await?;
        let params = [
            ("query", expr.to_string()),
            ("start", start.timestamp().to_string()),
            ("end", end.timestamp().to_string()),
            ("step", format!("{}s", step.as_secs().max(1))),
        ];

        self.fetch(endpoint, "/api/v1/query_range", &params)
            .await
            .map_err(|e| Error::MetricsRangeFailed {
                query: expr.to_string(),
                endpoint: endpoint.url.clone(),
                reason: e.to_string(),
                reproduce: reproduce_command(endpoint, "/api/v1/query_range", &params),
            })
    }
}

fn last_body(err: &Error) -> String {
    match err {
        Error::MetricsQueryStatus { body, .. } => body.clone(),
        other => other.to_string(),
    }
}

/// Literal `curl` invocation reproducing a query. The token is referenced
/// through `$TOKEN`, never inlined.
pub fn reproduce_command(endpoint: &MetricsEndpoint, path: &str, params: &[(&str, String)]) -> String {
    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    let auth = if endpoint.token.is_some() {
        " -H \"Authorization: Bearer $TOKEN\""
    } else {
        ""
    };
    format!("curl -sk{} '{}{}?{}'", auth, endpoint.url, path, query)
}

// =============================================================================
// Result Extraction
// =============================================================================

/// Labels and latest value of each series in a result
pub fn extract_series(result: &TimeSeriesResult) -> Vec<(BTreeMap<String, String>, f64)> {
    let Some(data) = &result.data else {
        return Vec::new();
    };

    match data.result_type.as_str() {
        "scalar" => sample_value(&data.result)
            .map(|v| vec![(BTreeMap::new(), v)])
            .unwrap_or_default(),
        _ => data
            .result
            .as_array()
            .map(|series| {
                series
                    .iter()
                    .filter_map(|s| {
                        let value = s
                            .get("value")
                            .and_then(sample_value)
                            .or_else(|| {
                                s.get("values")
                                    .and_then(|v| v.as_array())
                                    .and_then(|v| v.last())
                                    .and_then(sample_value)
                            })?;
                        Some((labels_of(s), value))
                    })
                    .collect()
            })
            .unwrap_or_default(),
    }
}

/// Numeric value of the first series matching `label_filter`.
///
/// Never fails: an empty, malformed or unmatched result yields `0.0`.
pub fn extract_scalar(result: &TimeSeriesResult, label_filter: Option<(&str, &str)>) -> f64 {
    extract_series(result)
        .into_iter()
        .find(|(labels, _)| match label_filter {
            Some((key, value)) => labels.get(key).map(String::as_str) == Some(value),
            None => true,
        })
        .map(|(_, value)| value)
        .unwrap_or(0.0)
}

/// `(timestamp, value)` samples of the first series of a range result
pub fn extract_range(result: &TimeSeriesResult) -> Vec<(i64, f64)> {
    result
        .data
        .as_ref()
        .and_then(|d| d.result.as_array())
        .and_then(|series| series.first())
        .and_then(|s| s.get("values"))
        .and_then(|v| v.as_array())
        .map(|values| {
            values
                .iter()
                .filter_map(|pair| {
                    let ts = pair.get(0)?.as_f64()? as i64;
                    Some((ts, sample_value(pair)?))
                })
                .collect()
        })
        .unwrap_or_default()
}

fn labels_of(series: &serde_json::Value) -> BTreeMap<String, String> {
    series
        .get("metric")
        .and_then(|m| m.as_object())
        .map(|m| {
            m.iter()
                .filter_map(|(k, v)| Some((k.clone(), v.as_str()?.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

/// `[timestamp, "value"]` -> finite value
fn sample_value(pair: &serde_json::Value) -> Option<f64> {
    let raw = pair.get(1)?;
    let value = match raw {
        serde_json::Value::String(s) => s.parse::<f64>().ok()?,
        serde_json::Value::Number(n) => n.as_f64()?,
        _ => return None,
    };
    value.is_finite().then_some(value)
}
