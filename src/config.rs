//! Configuration for ChronoKV
//!
//! Centralized configuration with sensible defaults.

use std::fmt;
use std::str::FromStr;

/// Main configuration for a ChronoKV store instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Concurrency Control
    // -------------------------------------------------------------------------
    /// Conflict-detection strategy, fixed for the lifetime of the store
    pub detector: DetectorKind,

    // -------------------------------------------------------------------------
    // Registry Configuration
    // -------------------------------------------------------------------------
    /// Initial capacity of the active-transaction table
    pub registry_capacity: usize,
}

/// Which conflict detector a store instance runs with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectorKind {
    /// Scan the write sets of all other active transactions (O(active))
    #[default]
    ActiveSetScan,

    /// Per-key read/write watermarks (O(1) per key)
    TimestampOrdering,
}

impl DetectorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorKind::ActiveSetScan => "active-set",
            DetectorKind::TimestampOrdering => "timestamp",
        }
    }
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetectorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active-set" | "active_set" | "activeset" => Ok(DetectorKind::ActiveSetScan),
            "timestamp" | "timestamp-ordering" | "to" => Ok(DetectorKind::TimestampOrdering),
            other => Err(format!(
                "unknown detector '{}' (expected 'active-set' or 'timestamp')",
                other
            )),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            detector: DetectorKind::ActiveSetScan,
            registry_capacity: 64,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the conflict-detection strategy
    pub fn detector(mut self, kind: DetectorKind) -> Self {
        self.config.detector = kind;
        self
    }

    /// Set the initial capacity of the active-transaction table
    pub fn registry_capacity(mut self, capacity: usize) -> Self {
        self.config.registry_capacity = capacity;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
