//! Audit driver
//!
//! Runs one audit end to end, strictly in sequence:
//!
//! 1. resolve the metrics endpoint (fatal on failure)
//! 2. read cluster status (fatal) and `ceph df` (degrades)
//! 3. capacity figures and trend from metrics, with `ceph df` fallback
//! 4. build the binding map from complete Kubernetes listings (fatal)
//! 5. run the image, bucket and filesystem builders; a failed builder is
//!    recorded as a source failure and leaves its dataset empty
//! 6. classify and assemble the report

use crate::classification::{classify_inventory, NamingRules};
use crate::config::AuditConfig;
use crate::domain::ports::{ClusterInventory, MetricsBackend, StorageAdmin};
use crate::error::{Error, Result};
use crate::inventory::{
    build_bucket_inventory, build_filesystem_inventory, build_image_inventory,
    collect_capacity_trend, collect_cluster_summary, pool_usage, total_stored, BindingMap,
};
use crate::report::{AuditReport, DataSources, Datasets, SourceFailure};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

/// One audit over a set of collaborators
pub struct Auditor {
    config: AuditConfig,
    naming: NamingRules,
    metrics: Arc<dyn MetricsBackend>,
    admin: Arc<dyn StorageAdmin>,
    inventory: Arc<dyn ClusterInventory>,
    control_plane: String,
}

impl Auditor {
    /// Compile the naming rules and wire the collaborators
    pub fn new(
        config: AuditConfig,
        metrics: Arc<dyn MetricsBackend>,
        admin: Arc<dyn StorageAdmin>,
        inventory: Arc<dyn ClusterInventory>,
    ) -> Result<Self> {
        let naming = NamingRules::compile(&config.naming)?;
        Ok(Self {
            config,
            naming,
            metrics,
            admin,
            inventory,
            control_plane: "in-cluster".to_string(),
        })
    }

    /// Record which API server the listings came from
    pub fn with_control_plane(mut self, control_plane: impl Into<String>) -> Self {
        self.control_plane = control_plane.into();
        self
    }

    /// Run the audit. `now` stamps the report and anchors the trend window.
    pub async fn run(&self, now: DateTime<Utc>, output_location: &str) -> Result<AuditReport> {
        let mut failures = Vec::new();

        let endpoint = self.metrics.endpoint().await?;
        info!("Using metrics endpoint {} ({})", endpoint.url, endpoint.source);

        let status = self.admin.cluster_status().await?;
        let df = match self.admin.cluster_df().await {
            Ok(df) => Some(df),
            Err(e) => {
                record_failure(&mut failures, "pools", &e);
                None
            }
        };
        let pools = df
            .as_ref()
            .map(|df| pool_usage(df, &self.naming))
            .unwrap_or_default();
        let stored_from_pools = df.as_ref().map(|_| total_stored(&pools));

        let mut cluster =
            collect_cluster_summary(self.metrics.as_ref(), &status, df.as_ref(), stored_from_pools)
                .await?;
        cluster.trend = collect_capacity_trend(
            self.metrics.as_ref(),
            now,
            self.config.metrics.trend_window,
            self.config.metrics.trend_step,
        )
        .await?;

        let bindings = BindingMap::collect(self.inventory.as_ref()).await?;

        let images = degrade(
            &mut failures,
            "images",
            build_image_inventory(self.admin.as_ref(), &bindings, &self.naming).await,
        );
        let buckets = degrade(
            &mut failures,
            "buckets",
            build_bucket_inventory(self.admin.as_ref(), &bindings, &self.naming).await,
        );
        let filesystems = degrade(
            &mut failures,
            "filesystems",
            build_filesystem_inventory(self.admin.as_ref()).await,
        );

        let classification = classify_inventory(&images, &buckets, &pools);
        info!(
            "Classified: {} high-confidence images, {} high-confidence buckets",
            classification.summary.high_confidence_images,
            classification.summary.high_confidence_buckets
        );

        Ok(AuditReport::assemble(
            now,
            output_location.to_string(),
            DataSources {
                metrics_endpoint: endpoint.url,
                metrics_source: endpoint.source,
                admin_command_prefix: self.admin.command_prefix(),
                control_plane: self.control_plane.clone(),
                control_plane_cli: self.config.storage.kubectl.clone(),
            },
            cluster,
            bindings.stats().clone(),
            Datasets {
                images,
                buckets,
                filesystems,
                pools,
            },
            classification,
            failures,
        ))
    }
}

fn record_failure(failures: &mut Vec<SourceFailure>, section: &str, error: &Error) {
    warn!("{} section incomplete: {}", section, error);
    failures.push(SourceFailure {
        section: section.to_string(),
        reason: error.to_string(),
    });
}

fn degrade<T: Default>(failures: &mut Vec<SourceFailure>, section: &str, result: Result<T>) -> T {
    result.unwrap_or_else(|e| {
        record_failure(failures, section, &e);
        T::default()
    })
}
