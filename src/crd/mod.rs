//! Custom Resource bindings read by the audit
//!
//! - ObjectBucketClaim / ObjectBucket: bucket claims from the bucket provisioner
//! - Route: exposure of the metrics endpoint

pub mod object_bucket;
pub mod route;

pub use object_bucket::*;
pub use route::*;
