//! Access layer
//!
//! Uniform read access to the metrics backend, the storage cluster's
//! administrative tools and the Kubernetes API.

pub mod ceph;
pub mod discovery;
pub mod kubernetes;
pub mod metrics;
pub mod preflight;

pub use self::ceph::CephToolbox;
pub use self::discovery::MetricsDiscovery;
pub use self::kubernetes::KubeInventory;
pub use self::metrics::{extract_range, extract_scalar, extract_series, FixedRetry, MetricsAccess};
pub use self::preflight::{check_tools, RequiredTool};
