//! Ceph Orphan Audit
//!
//! Read-only audit of a Ceph-backed Kubernetes cluster that finds RBD
//! images and RGW buckets no Kubernetes object claims any more, and grades
//! each finding by confidence.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                              Auditor                                 │
//! ├──────────────────────────────────────────────────────────────────────┤
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐  │
//! │  │ MetricsBackend │  │  StorageAdmin  │  │   ClusterInventory     │  │
//! │  │ (Thanos/Prom)  │  │ (ceph toolbox) │  │  (PV/PVC/OBC/OB/Secret)│  │
//! │  └───────┬────────┘  └───────┬────────┘  └───────────┬────────────┘  │
//! │          │                   │                       │               │
//! │          │          ┌────────┴────────┐     ┌────────┴────────┐      │
//! │          │          │   Normalizer    │     │   Binding Map   │      │
//! │          │          └────────┬────────┘     └────────┬────────┘      │
//! │          │                   └───────────┬───────────┘               │
//! │  ┌───────┴────────┐      ┌───────────────┴───────────────┐           │
//! │  │ Cluster health │      │ Image / Bucket / FS builders  │           │
//! │  └───────┬────────┘      └───────────────┬───────────────┘           │
//! │          │               ┌───────────────┴───────────────┐           │
//! │          │               │    Classification Engine      │           │
//! │          │               └───────────────┬───────────────┘           │
//! │          └───────────────────────┬───────┘                           │
//! │                        ┌─────────┴─────────┐                         │
//! │                        │  Report + Views   │                         │
//! │                        └───────────────────┘                         │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`access`]: metrics client, endpoint discovery, ceph toolbox, Kubernetes listings
//! - [`normalize`]: byte counts and volume handles
//! - [`inventory`]: binding map and per-resource builders
//! - [`classification`]: naming heuristics and confidence tiers
//! - [`report`]: structured report, text views, inert cleanup suggestions
//! - [`audit`]: the sequential driver tying it together
//! - [`crd`]: ObjectBucketClaim, ObjectBucket and Route bindings
//! - [`domain`]: records and ports
//! - [`error`]: error types and handling

pub mod access;
pub mod audit;
pub mod classification;
pub mod config;
pub mod crd;
pub mod domain;
pub mod error;
pub mod inventory;
pub mod normalize;
pub mod report;

// Re-export commonly used types
pub use access::{CephToolbox, KubeInventory, MetricsAccess};

pub use audit::Auditor;

pub use classification::{NamingRules, OrphanClassification, OrphanReport};

pub use config::AuditConfig;

pub use domain::ports::{ClusterInventory, MetricsBackend, StorageAdmin};
pub use domain::records::{BucketRecord, ImageRecord, PoolUsageEntry, ResourceIdentity};

pub use error::{Error, Result, Severity};

pub use inventory::BindingMap;

pub use report::{write_artifacts, AuditReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
