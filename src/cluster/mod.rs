//! Density-based clustering of dense vectors.
//!
//! ## DBSCAN
//!
//! Groups points that sit in dense regions and reports everything else as noise.
//! The number of clusters is discovered, not requested. Two parameters drive it:
//! a neighborhood radius `epsilon` and a core threshold `min_pts`.
//!
//! ## Neighbor search
//!
//! [`NeighborIndex`] answers exact radius queries. [`BruteForceIndex`] scans all
//! points and is the default; anything implementing the trait can be passed to
//! [`Dbscan::fit_index`].
//!
//! ## Usage
//!
//! ```rust
//! use huddle::cluster::{Clustering, Dbscan, NOISE};
//!
//! let data = vec![
//!     vec![0.0, 0.0],
//!     vec![0.1, 0.1],
//!     vec![10.0, 10.0],
//!     vec![10.1, 10.1],
//!     vec![50.0, 50.0],
//! ];
//!
//! let labels = Dbscan::new(0.5, 2).fit_predict(&data).unwrap();
//! assert_eq!(labels, vec![0, 0, 1, 1, NOISE]);
//! ```

mod dbscan;
mod index;
mod traits;

pub use dbscan::{ClusterLabel, Dbscan, DbscanFit, NOISE};
pub use index::{BruteForceIndex, NeighborIndex};
pub use traits::Clustering;
