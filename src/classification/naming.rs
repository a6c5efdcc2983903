//! Name-based heuristics
//!
//! Compiled once per run from [`NamingConfig`]; pure lookups afterwards.

use crate::config::NamingConfig;
use crate::error::Result;
use regex::Regex;

/// Compiled naming patterns
#[derive(Debug, Clone)]
pub struct NamingRules {
    block_pool: Regex,
    test_artifact: Regex,
    logging_bucket: Regex,
    test_pool: Regex,
}

impl NamingRules {
    /// Compile all patterns; an invalid pattern is a configuration error
    pub fn compile(config: &NamingConfig) -> Result<Self> {
        Ok(Self {
            block_pool: Regex::new(&config.block_pool)?,
            test_artifact: Regex::new(&config.test_artifact)?,
            logging_bucket: Regex::new(&config.logging_bucket)?,
            test_pool: Regex::new(&config.test_pool)?,
        })
    }

    /// Pool follows the block storage-class naming convention
    pub fn is_block_pool(&self, pool: &str) -> bool {
        self.block_pool.is_match(pool)
    }

    /// Image name looks like a test, benchmark or temporary artifact
    pub fn looks_like_test_artifact(&self, name: &str) -> bool {
        self.test_artifact.is_match(name)
    }

    /// Bucket belongs to a long-retention logging stack
    pub fn is_logging_bucket(&self, bucket: &str) -> bool {
        self.logging_bucket.is_match(bucket)
    }

    /// Pool name suggests a test or benchmark leftover
    pub fn is_test_pool(&self, pool: &str) -> bool {
        self.test_pool.is_match(pool)
    }
}
