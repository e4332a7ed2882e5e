//! DBSCAN: Density-Based Spatial Clustering of Applications with Noise.
//!
//! # The Algorithm (Ester et al., 1996)
//!
//! - **Epsilon (ε)**: maximum distance between two points to be neighbors.
//!   The boundary is inclusive.
//! - **MinPts**: minimum neighborhood size, counting the point itself, for a
//!   point to be *core*.
//! - **Border point**: within ε of a core point but not core itself.
//! - **Noise point**: neither core nor border.
//!
//! Points are visited in input order. Each unvisited point is queried once; if
//! it is core a new cluster is opened and grown through an explicit FIFO
//! worklist until no further core point is reachable. A point first marked as
//! noise is promoted when a later expansion reaches it.
//!
//! ## Determinism
//!
//! Input order is part of the contract. It fixes cluster numbering (ids are
//! handed out from 0 in discovery order) and the owner of a border point shared
//! by two clusters: the first expansion to reach it keeps it.
//!
//! ## Complexity
//!
//! - **Time**: O(n²) distance evaluations with [`BruteForceIndex`].
//! - **Space**: O(n) per-point state. Precomputed neighborhoods
//!   ([`Dbscan::with_precomputed_neighborhoods`]) trade this for up to O(n²)
//!   in exchange for a parallel query phase.
//!
//! ## References
//!
//! Ester et al. (1996). "A Density-Based Algorithm for Discovering Clusters
//! in Large Spatial Databases with Noise." KDD-96.

use std::borrow::Cow;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::debug;

use super::index::{BruteForceIndex, NeighborIndex};
use super::traits::Clustering;
use crate::error::{Error, Result};
use crate::metric::Metric;

/// Integer label reported for noise points.
pub const NOISE: i64 = -1;

/// Final label of a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClusterLabel {
    /// Not density-reachable from any core point.
    Noise,
    /// Member of the cluster with this id.
    Cluster(usize),
}

impl ClusterLabel {
    /// Integer form: the cluster id, or [`NOISE`].
    pub fn id(self) -> i64 {
        match self {
            ClusterLabel::Noise => NOISE,
            ClusterLabel::Cluster(c) => c as i64,
        }
    }

    /// The cluster id, or `None` for noise.
    pub fn cluster(self) -> Option<usize> {
        match self {
            ClusterLabel::Noise => None,
            ClusterLabel::Cluster(c) => Some(c),
        }
    }

    /// Whether this is [`ClusterLabel::Noise`].
    pub fn is_noise(self) -> bool {
        self == ClusterLabel::Noise
    }
}

// `label == None` is the unassigned state; it never survives a completed run.
#[derive(Debug, Clone, Copy, Default)]
struct PointState {
    visited: bool,
    label: Option<ClusterLabel>,
}

/// Result of a DBSCAN run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbscanFit {
    /// One label per input point, in input order.
    pub labels: Vec<ClusterLabel>,
    /// Whether each point is a core point.
    pub core: Vec<bool>,
    /// Number of clusters; ids are `0..n_clusters`.
    pub n_clusters: usize,
}

impl DbscanFit {
    /// Labels as integers, `-1` for noise.
    pub fn ids(&self) -> Vec<i64> {
        self.labels.iter().map(|l| l.id()).collect()
    }

    /// Number of noise points.
    pub fn n_noise(&self) -> usize {
        self.labels.iter().filter(|l| l.is_noise()).count()
    }

    /// Point indices of cluster `c`, ascending.
    pub fn members(&self, c: usize) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, l)| **l == ClusterLabel::Cluster(c))
            .map(|(i, _)| i)
            .collect()
    }
}

/// DBSCAN clustering algorithm.
#[derive(Debug, Clone)]
pub struct Dbscan {
    /// Epsilon: maximum distance for neighborhood.
    epsilon: f32,
    /// Minimum neighborhood size (self included) for a core point.
    min_pts: usize,
    metric: Metric,
    deadline: Option<Duration>,
    precompute: bool,
}

impl Dbscan {
    /// Create a new DBSCAN clusterer with the Euclidean metric.
    ///
    /// # Arguments
    ///
    /// * `epsilon` - Maximum distance between two points to be neighbors.
    /// * `min_pts` - Minimum neighborhood size, the point itself included.
    pub fn new(epsilon: f32, min_pts: usize) -> Self {
        Self {
            epsilon,
            min_pts,
            metric: Metric::Euclidean,
            deadline: None,
            precompute: false,
        }
    }

    /// Set epsilon (neighborhood radius).
    pub fn with_epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Set minimum points for core classification.
    pub fn with_min_pts(mut self, min_pts: usize) -> Self {
        self.min_pts = min_pts;
        self
    }

    /// Set the distance metric used by [`Dbscan::fit`].
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    /// Abort with [`Error::DeadlineExceeded`] if a run takes longer than `limit`.
    pub fn with_deadline(mut self, limit: Duration) -> Self {
        self.deadline = Some(limit);
        self
    }

    /// Compute every neighborhood up front on the rayon pool before expanding.
    ///
    /// Labels are identical either way; only the expansion is sequential.
    pub fn with_precomputed_neighborhoods(mut self, precompute: bool) -> Self {
        self.precompute = precompute;
        self
    }

    /// Neighborhood radius.
    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    /// Core-point threshold.
    pub fn min_pts(&self) -> usize {
        self.min_pts
    }

    /// Distance metric.
    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Check parameters without touching any data.
    pub fn validate(&self) -> Result<()> {
        if self.epsilon.is_nan() || self.epsilon < 0.0 {
            return Err(Error::InvalidParameter {
                name: "epsilon",
                message: "must be non-negative",
            });
        }
        if self.min_pts == 0 {
            return Err(Error::InvalidParameter {
                name: "min_pts",
                message: "must be at least 1",
            });
        }
        Ok(())
    }

    /// Cluster `data` with a brute-force index under the configured metric.
    pub fn fit<P>(&self, data: &[P]) -> Result<DbscanFit>
    where
        P: AsRef<[f32]> + Sync,
    {
        self.validate()?;
        let index = BruteForceIndex::build(data, self.metric)?;
        self.fit_index(&index)
    }

    /// Cluster the points held by `index`.
    ///
    /// The index's own metric is used; [`Dbscan::with_metric`] is ignored here.
    pub fn fit_index<I: NeighborIndex>(&self, index: &I) -> Result<DbscanFit> {
        self.validate()?;
        let started = Instant::now();
        let n = index.len();
        debug!(
            n,
            dim = index.dim(),
            epsilon = self.epsilon,
            min_pts = self.min_pts,
            "dbscan start"
        );

        let table = if self.precompute && n > 0 {
            let table: Vec<Vec<usize>> = (0..n)
                .into_par_iter()
                .map(|i| index.neighbors(i, self.epsilon))
                .collect();
            self.check_deadline(started)?;
            Some(table)
        } else {
            None
        };
        let source = Neighborhoods {
            index,
            epsilon: self.epsilon,
            table,
        };

        let mut state = vec![PointState::default(); n];
        let mut core = vec![false; n];
        // Cluster whose worklist currently holds (or held) each point.
        let mut enqueued: Vec<Option<usize>> = vec![None; n];
        let mut worklist: VecDeque<usize> = VecDeque::new();
        let mut cluster_id = 0usize;

        for p in 0..n {
            if state[p].visited {
                continue;
            }
            state[p].visited = true;

            let neighbors = source.get(p);
            self.check_deadline(started)?;

            if neighbors.len() < self.min_pts {
                // Not enough neighbors: noise for now, may become a border point later.
                state[p].label = Some(ClusterLabel::Noise);
                continue;
            }

            let c = cluster_id;
            core[p] = true;
            state[p].label = Some(ClusterLabel::Cluster(c));
            enqueued[p] = Some(c);
            for &q in neighbors.iter() {
                if q != p {
                    enqueued[q] = Some(c);
                    worklist.push_back(q);
                }
            }

            while let Some(q) = worklist.pop_front() {
                match state[q].label {
                    None | Some(ClusterLabel::Noise) => {
                        state[q].label = Some(ClusterLabel::Cluster(c));
                    }
                    // Already ours, or claimed by an earlier cluster: first writer wins.
                    Some(ClusterLabel::Cluster(_)) => {}
                }

                if state[q].visited {
                    continue;
                }
                state[q].visited = true;

                let q_neighbors = source.get(q);
                self.check_deadline(started)?;
                if q_neighbors.len() < self.min_pts {
                    continue;
                }
                core[q] = true;
                for &r in q_neighbors.iter() {
                    if enqueued[r] != Some(c) && state[r].label != Some(ClusterLabel::Cluster(c)) {
                        enqueued[r] = Some(c);
                        worklist.push_back(r);
                    }
                }
            }

            cluster_id += 1;
        }

        let labels: Vec<ClusterLabel> = state
            .into_iter()
            .map(|s| s.label.unwrap_or(ClusterLabel::Noise))
            .collect();
        let fit = DbscanFit {
            labels,
            core,
            n_clusters: cluster_id,
        };
        debug!(
            clusters = fit.n_clusters,
            noise = fit.n_noise(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "dbscan done"
        );
        Ok(fit)
    }

    fn check_deadline(&self, started: Instant) -> Result<()> {
        match self.deadline {
            Some(limit) if started.elapsed() > limit => Err(Error::DeadlineExceeded { limit }),
            _ => Ok(()),
        }
    }
}

impl Default for Dbscan {
    fn default() -> Self {
        Self::new(0.5, 1)
    }
}

impl Clustering for Dbscan {
    fn fit_predict<P>(&self, data: &[P]) -> Result<Vec<i64>>
    where
        P: AsRef<[f32]> + Sync,
    {
        Ok(self.fit(data)?.ids())
    }
}

/// Neighborhood lookups, either straight from the index or from a precomputed table.
struct Neighborhoods<'a, I> {
    index: &'a I,
    epsilon: f32,
    table: Option<Vec<Vec<usize>>>,
}

impl<I: NeighborIndex> Neighborhoods<'_, I> {
    fn get(&self, idx: usize) -> Cow<'_, [usize]> {
        match &self.table {
            Some(table) => Cow::Borrowed(table[idx].as_slice()),
            None => Cow::Owned(self.index.neighbors(idx, self.epsilon)),
        }
    }
}
