//! Domain layer - Resource records and port definitions
//!
//! This module defines the records every builder produces and the traits
//! (ports) the access adapters implement.

pub mod ports;
pub mod records;

pub use ports::*;
pub use records::*;
