use crate::error::Result;

/// Common interface for hard clustering algorithms (one label per point).
pub trait Clustering {
    /// Fit the model and return one label per input point, in input order.
    ///
    /// Labels are cluster ids starting at 0; `-1` marks noise.
    fn fit_predict<P>(&self, data: &[P]) -> Result<Vec<i64>>
    where
        P: AsRef<[f32]> + Sync;
}
