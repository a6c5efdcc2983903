//! Metrics Endpoint Discovery
//!
//! Resolution order: explicit URL, then the externally exposed route, then
//! the in-cluster service. A route or service found without a bearer token
//! is fatal: querying it unauthenticated yields empty results that would
//! read as zero usage.

use crate::config::MetricsConfig;
use crate::crd::Route;
use crate::domain::ports::{EndpointSource, MetricsEndpoint};
use crate::error::{Error, Result};
use kube::{Api, Client};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const PROBE_PATH: &str = "/api/v1/status/buildinfo";

// =============================================================================
// Probe Results
// =============================================================================

/// What the discovery probes found
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Probes {
    /// URL derived from the route, if the route exists
    pub route_url: Option<String>,
    /// The service answered at all (any HTTP status)
    pub service_reachable: bool,
    /// Bearer token, if one could be obtained
    pub token: Option<String>,
}

/// Decide the endpoint from probe results
pub fn resolve_endpoint(config: &MetricsConfig, probes: Probes) -> Result<MetricsEndpoint> {
    if let Some(url) = probes.route_url {
        return match probes.token {
            Some(token) => Ok(MetricsEndpoint {
                url,
                token: Some(token),
                source: EndpointSource::Route,
            }),
            None => Err(Error::MissingMetricsToken {
                endpoint: url,
                verify: token_verify_command(config),
            }),
        };
    }

    if probes.service_reachable {
        let url = config.service_url.trim_end_matches('/').to_string();
        return match probes.token {
            Some(token) => Ok(MetricsEndpoint {
                url,
                token: Some(token),
                source: EndpointSource::Service,
            }),
            None => Err(Error::MissingMetricsToken {
                endpoint: url,
                verify: format!("cat {}", config.token_file.display()),
            }),
        };
    }

    Err(Error::MetricsUnreachable {
        tried: vec![
            format!("route {}/{}", config.route_namespace, config.route_name),
            format!("service {}", config.service_url),
        ],
        verify: format!(
            "kubectl -n {} get route {} -o jsonpath='{{.spec.host}}'",
            config.route_namespace, config.route_name
        ),
    })
}

fn token_verify_command(config: &MetricsConfig) -> String {
    if config.token_command.is_empty() {
        format!("cat {}", config.token_file.display())
    } else {
        config.token_command.join(" ")
    }
}

// =============================================================================
// Discovery
// =============================================================================

/// Runs the discovery probes against the live cluster
pub struct MetricsDiscovery {
    config: MetricsConfig,
    http: reqwest::Client,
    kube: Option<Client>,
}

impl MetricsDiscovery {
    pub fn new(config: MetricsConfig, http: reqwest::Client, kube: Option<Client>) -> Self {
        Self { config, http, kube }
    }

    /// Resolve the endpoint. Called once per run by the access layer.
    pub async fn discover(&self) -> Result<MetricsEndpoint> {
        if let Some(url) = &self.config.url {
            info!("Using explicit metrics endpoint {}", url);
            return Ok(MetricsEndpoint {
                url: url.trim_end_matches('/').to_string(),
                token: self.resolve_token().await,
                source: EndpointSource::Explicit,
            });
        }

        let mut probes = Probes {
            route_url: self.lookup_route().await,
            ..Default::default()
        };

        if probes.route_url.is_none() {
            probes.service_reachable = self.probe_service().await;
        }
        probes.token = self.resolve_token().await;

        let endpoint = resolve_endpoint(&self.config, probes)?;
        info!(
            "Metrics endpoint resolved via {}: {}",
            endpoint.source, endpoint.url
        );
        Ok(endpoint)
    }

    async fn lookup_route(&self) -> Option<String> {
        let client = self.kube.clone()?;
        let routes: Api<Route> = Api::namespaced(client, &self.config.route_namespace);

        match routes.get_opt(&self.config.route_name).await {
            Ok(Some(route)) => route.base_url(),
            Ok(None) => {
                debug!(
                    "Route {}/{} not found",
                    self.config.route_namespace, self.config.route_name
                );
                None
            }
            Err(e) => {
                warn!("Route lookup failed: {}", e);
                None
            }
        }
    }

    async fn probe_service(&self) -> bool {
        let url = format!(
            "{}{}",
            self.config.service_url.trim_end_matches('/'),
            PROBE_PATH
        );
        match self.http.get(&url).timeout(PROBE_TIMEOUT).send().await {
            Ok(response) => {
                debug!("Service probe {} -> {}", url, response.status());
                true
            }
            Err(e) => {
                debug!("Service probe {} failed: {}", url, e);
                false
            }
        }
    }

    /// Explicit token, then the session token command, then the
    /// service-account token file
    async fn resolve_token(&self) -> Option<String> {
        if let Some(token) = self.config.token.as_deref().map(str::trim) {
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }

        if let Some((program, args)) = self.config.token_command.split_first() {
            match Command::new(program).args(args).output().await {
                Ok(output) if output.status.success() => {
                    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
                    if !token.is_empty() {
                        return Some(token);
                    }
                }
                Ok(output) => debug!(
                    "Token command exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
                Err(e) => debug!("Token command unavailable: {}", e),
            }
        }

        match tokio::fs::read_to_string(&self.config.token_file).await {
            Ok(token) if !token.trim().is_empty() => Some(token.trim().to_string()),
            _ => None,
        }
    }
}
