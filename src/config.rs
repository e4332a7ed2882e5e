//! Run configuration.
//!
//! Values come from defaults, then an optional TOML file, then command-line
//! overrides. Every field is optional in the file:
//!
//! ```toml
//! eps = 0.6
//! min_pts = 2
//! metric = "euclidean"
//! timeout_ms = 30000
//! threads = 4
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::cluster::Dbscan;
use crate::error::{Error, Result};
use crate::metric::Metric;

/// Parameters for one clustering run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClusterConfig {
    /// Neighborhood radius (default: 0.5)
    #[serde(default = "default_eps")]
    pub eps: f32,

    /// Minimum neighborhood size for a core point, self included (default: 1)
    #[serde(default = "default_min_pts", alias = "min_samples")]
    pub min_pts: usize,

    /// Distance metric (default: euclidean)
    #[serde(default)]
    pub metric: Metric,

    /// Overall deadline for the clustering phase, in milliseconds (default: none)
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Worker threads for feature extraction (default: rayon's global pool)
    #[serde(default)]
    pub threads: Option<usize>,
}

fn default_eps() -> f32 {
    0.5
}

fn default_min_pts() -> usize {
    1
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            eps: default_eps(),
            min_pts: default_min_pts(),
            metric: Metric::default(),
            timeout_ms: None,
            threads: None,
        }
    }
}

impl ClusterConfig {
    /// Load from a TOML file.
    ///
    /// Only parses; call [`ClusterConfig::validate`] once overrides are applied.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    /// Parse from a TOML string without validating values.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Set the neighborhood radius.
    pub fn with_eps(mut self, eps: f32) -> Self {
        self.eps = eps;
        self
    }

    /// Set the core-point threshold.
    pub fn with_min_pts(mut self, min_pts: usize) -> Self {
        self.min_pts = min_pts;
        self
    }

    /// Set the distance metric.
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    /// Set the clustering deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Set the extraction thread count.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Clustering deadline, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Reject values that cannot describe a run.
    pub fn validate(&self) -> Result<()> {
        if self.threads == Some(0) {
            return Err(Error::InvalidParameter {
                name: "threads",
                message: "must be at least 1",
            });
        }
        self.dbscan().validate()
    }

    /// The clusterer this configuration describes.
    pub fn dbscan(&self) -> Dbscan {
        let dbscan = Dbscan::new(self.eps, self.min_pts).with_metric(self.metric);
        match self.timeout() {
            Some(limit) => dbscan.with_deadline(limit),
            None => dbscan,
        }
    }
}
