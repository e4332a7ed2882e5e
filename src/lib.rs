//! Group images by colour distribution.
//!
//! `huddle` turns each image into a normalised RGB histogram and clusters the
//! histograms with DBSCAN, labelling every image with a cluster id or `-1` for
//! noise. The clustering engine under [`cluster`] works on any fixed-dimension
//! vectors, not only histograms:
//!
//! - [`cluster::Dbscan`]: exact, deterministic density clustering
//! - [`cluster::NeighborIndex`]: the radius-query seam, with a brute-force default
//! - [`service::ClusteringService`]: extraction plus clustering for a batch of paths

#![forbid(unsafe_code)]

pub mod cluster;
pub mod config;
pub mod error;
pub mod feature;
pub mod metric;
pub mod service;

pub use cluster::{
    BruteForceIndex, ClusterLabel, Clustering, Dbscan, DbscanFit, NeighborIndex, NOISE,
};
pub use config::ClusterConfig;
pub use error::{Error, Result};
pub use feature::{FeatureExtractor, FeatureVector, HistogramExtractor};
pub use metric::{DistanceMetric, Euclidean, Manhattan, Metric};
pub use service::{Assignments, ClusteringService};
