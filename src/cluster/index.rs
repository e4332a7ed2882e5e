//! Exact ε-neighborhood queries.
//!
//! The clusterer only talks to the [`NeighborIndex`] trait, so a spatial index can
//! be dropped in later. Whatever the strategy, results must be exact: every point
//! with `distance(v, u) <= eps` and nothing else, the query point included.

use crate::error::{Error, Result};
use crate::metric::DistanceMetric;

/// Read-only radius search over a fixed set of points.
pub trait NeighborIndex: Sync {
    /// Number of indexed points.
    fn len(&self) -> usize;

    /// Whether the index holds no points.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimensionality of the indexed points (0 for an empty index).
    fn dim(&self) -> usize;

    /// Indices of all points within `eps` of point `idx`, in ascending order.
    ///
    /// `idx` itself is always included since its distance to itself is zero.
    fn neighbors(&self, idx: usize, eps: f32) -> Vec<usize>;

    /// Indices of all points within `eps` of an arbitrary vector, in ascending order.
    fn query(&self, v: &[f32], eps: f32) -> Result<Vec<usize>>;
}

/// Validate that all points share one dimensionality and return it.
///
/// Returns `Ok(None)` for an empty slice.
pub(crate) fn common_dim<P: AsRef<[f32]>>(points: &[P]) -> Result<Option<usize>> {
    let Some(first) = points.first() else {
        return Ok(None);
    };
    let expected = first.as_ref().len();
    if expected == 0 {
        return Err(Error::InvalidParameter {
            name: "dimension",
            message: "must be at least 1",
        });
    }
    for p in &points[1..] {
        let found = p.as_ref().len();
        if found != expected {
            return Err(Error::DimensionMismatch { expected, found });
        }
    }
    Ok(Some(expected))
}

/// All-pairs scan: O(n) per query, O(n²) over a full clustering run, O(1) extra memory.
///
/// Fine for the few thousand points of a single batch.
#[derive(Debug, Clone)]
pub struct BruteForceIndex<'a, P, M> {
    points: &'a [P],
    dim: usize,
    metric: M,
}

impl<'a, P, M> BruteForceIndex<'a, P, M>
where
    P: AsRef<[f32]> + Sync,
    M: DistanceMetric,
{
    /// Index `points` under `metric`.
    ///
    /// Fails fast on mixed dimensionality rather than truncating or padding.
    pub fn build(points: &'a [P], metric: M) -> Result<Self> {
        let dim = common_dim(points)?.unwrap_or(0);
        Ok(Self {
            points,
            dim,
            metric,
        })
    }

    fn scan(&self, v: &[f32], eps: f32) -> Vec<usize> {
        self.points
            .iter()
            .enumerate()
            .filter(|(_, other)| self.metric.distance(v, other.as_ref()) <= eps)
            .map(|(idx, _)| idx)
            .collect()
    }
}

impl<P, M> NeighborIndex for BruteForceIndex<'_, P, M>
where
    P: AsRef<[f32]> + Sync,
    M: DistanceMetric,
{
    fn len(&self) -> usize {
        self.points.len()
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn neighbors(&self, idx: usize, eps: f32) -> Vec<usize> {
        let mut out = self.scan(self.points[idx].as_ref(), eps);
        // NaN components make even the self-distance NaN; membership of the
        // query point is unconditional.
        if let Err(pos) = out.binary_search(&idx) {
            out.insert(pos, idx);
        }
        out
    }

    fn query(&self, v: &[f32], eps: f32) -> Result<Vec<usize>> {
        if self.points.is_empty() {
            return Ok(Vec::new());
        }
        if v.len() != self.dim {
            return Err(Error::DimensionMismatch {
                expected: self.dim,
                found: v.len(),
            });
        }
        Ok(self.scan(v, eps))
    }
}
