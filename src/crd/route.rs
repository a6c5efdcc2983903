//! OpenShift Route (read-only)
//!
//! Used only to find the externally exposed metrics endpoint.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "route.openshift.io",
    version = "v1",
    kind = "Route",
    plural = "routes",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct RouteSpec {
    #[serde(default)]
    pub host: Option<String>,

    #[serde(default)]
    pub path: Option<String>,

    #[serde(default)]
    pub tls: Option<RouteTls>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteTls {
    #[serde(default)]
    pub termination: Option<String>,
}

impl Route {
    /// Base URL for the route, if it has a host
    pub fn base_url(&self) -> Option<String> {
        let host = self.spec.host.as_deref().filter(|h| !h.is_empty())?;
        let scheme = if self.spec.tls.is_some() { "https" } else { "http" };
        let path = self
            .spec
            .path
            .as_deref()
            .unwrap_or("")
            .trim_end_matches('/');
        Some(format!("{}://{}{}", scheme, host, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url() {
        let mut route = Route::new(
            "thanos-querier",
            RouteSpec {
                host: Some("thanos-querier-openshift-monitoring.apps.example.com".into()),
                path: Some("/api".into()),
                tls: Some(RouteTls {
                    termination: Some("reencrypt".into()),
                }),
            },
        );
        assert_eq!(
            route.base_url().as_deref(),
            Some("https://thanos-querier-openshift-monitoring.apps.example.com/api")
        );

        route.spec.tls = None;
        route.spec.path = None;
        assert_eq!(
            route.base_url().as_deref(),
            Some("http://thanos-querier-openshift-monitoring.apps.example.com")
        );

        route.spec.host = None;
        assert_eq!(route.base_url(), None);
    }
}
