//! Image grouping: feature extraction followed by DBSCAN.
//!
//! Extraction runs on the rayon pool and may finish in any order; the resulting
//! vectors are always handed to the clusterer in the order the paths were given,
//! which keeps cluster numbering and border ownership reproducible.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use rayon::prelude::*;
use serde::ser::{Serialize, Serializer};
use tracing::{debug, info};

use crate::cluster::{Clustering, NOISE};
use crate::config::ClusterConfig;
use crate::error::{Error, Result};
use crate::feature::{FeatureExtractor, FeatureVector, HistogramExtractor};

/// Identifier to label mapping, one entry per distinct identifier.
///
/// Entries sit at the position where their identifier first appeared; a repeated
/// identifier takes the label of its last occurrence. Serializes as a JSON object
/// whose keys keep that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignments {
    entries: Vec<(String, i64)>,
}

impl Assignments {
    /// Number of labelled items.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no items were labelled.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(id, label)` pairs in input order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.entries.iter().map(|(id, l)| (id.as_str(), *l))
    }

    /// Label of the item with this identifier.
    pub fn get(&self, id: &str) -> Option<i64> {
        self.entries.iter().find(|(k, _)| k == id).map(|(_, l)| *l)
    }

    /// Number of distinct clusters, noise excluded.
    pub fn n_clusters(&self) -> usize {
        self.entries
            .iter()
            .map(|(_, l)| *l)
            .filter(|&l| l != NOISE)
            .collect::<HashSet<_>>()
            .len()
    }

    /// Identifiers labelled as noise.
    pub fn noise(&self) -> Vec<&str> {
        self.iter()
            .filter(|(_, l)| *l == NOISE)
            .map(|(id, _)| id)
            .collect()
    }

    /// Identifiers grouped by label; noise, if any, sits under `-1`.
    pub fn groups(&self) -> BTreeMap<i64, Vec<&str>> {
        let mut groups: BTreeMap<i64, Vec<&str>> = BTreeMap::new();
        for (id, l) in self.iter() {
            groups.entry(l).or_default().push(id);
        }
        groups
    }

    fn from_labels<'a>(pairs: impl IntoIterator<Item = (&'a str, i64)>) -> Self {
        let mut position: HashMap<&str, usize> = HashMap::new();
        let mut entries: Vec<(String, i64)> = Vec::new();
        for (id, l) in pairs {
            match position.get(id) {
                Some(&i) => entries[i].1 = l,
                None => {
                    position.insert(id, entries.len());
                    entries.push((id.to_string(), l));
                }
            }
        }
        Self { entries }
    }

    /// Consume into the underlying pairs.
    pub fn into_inner(self) -> Vec<(String, i64)> {
        self.entries
    }
}

impl Serialize for Assignments {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(id, l)| (id, l)))
    }
}

/// Groups images by visual similarity.
#[derive(Debug, Clone)]
pub struct ClusteringService<E = HistogramExtractor> {
    extractor: E,
    config: ClusterConfig,
}

impl ClusteringService<HistogramExtractor> {
    /// Service using colour histograms.
    pub fn new(config: ClusterConfig) -> Self {
        Self::with_extractor(HistogramExtractor::new(), config)
    }
}

impl<E: FeatureExtractor> ClusteringService<E> {
    /// Service using a custom feature extractor.
    pub fn with_extractor(extractor: E, config: ClusterConfig) -> Self {
        Self { extractor, config }
    }

    /// The active configuration.
    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Extract one feature vector per path, in path order.
    ///
    /// Unreadable images come back as the extractor's failure value (the zero
    /// vector for [`HistogramExtractor`]); this never fails per image.
    pub fn extract<P>(&self, paths: &[P]) -> Result<Vec<FeatureVector>>
    where
        P: AsRef<Path> + Sync,
    {
        let run = || {
            paths
                .par_iter()
                .map(|p| {
                    let path = p.as_ref();
                    FeatureVector::new(path.display().to_string(), self.extractor.extract(path))
                })
                .collect::<Vec<_>>()
        };

        match self.config.threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| Error::Config(format!("failed to start worker pool: {e}")))?;
                Ok(pool.install(run))
            }
            None => Ok(run()),
        }
    }

    /// Extract features for `paths` and cluster them.
    pub fn cluster_paths<P>(&self, paths: &[P]) -> Result<Assignments>
    where
        P: AsRef<Path> + Sync,
    {
        // Fail on bad parameters before decoding anything.
        self.config.validate()?;
        let vectors = self.extract(paths)?;
        let unreadable = vectors.iter().filter(|v| v.is_zero()).count();
        debug!(images = vectors.len(), unreadable, "features extracted");
        self.cluster_vectors(&vectors)
    }

    /// Cluster precomputed feature vectors, keeping their order.
    ///
    /// Every vector takes part in clustering; repeated identifiers are merged in
    /// the returned [`Assignments`].
    pub fn cluster_vectors(&self, vectors: &[FeatureVector]) -> Result<Assignments> {
        let labels = self.config.dbscan().fit_predict(vectors)?;
        let assignments =
            Assignments::from_labels(vectors.iter().map(|v| v.id.as_str()).zip(labels));
        info!(
            items = assignments.len(),
            clusters = assignments.n_clusters(),
            noise = assignments.noise().len(),
            "clustering complete"
        );
        Ok(assignments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::Metric;
    use std::path::PathBuf;

    // Encodes the file stem as a one-dimensional feature; "bad" files fail.
    fn stem_extractor(path: &Path) -> Vec<f32> {
        path.file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.parse::<f32>().ok())
            .map_or_else(|| vec![0.0], |v| vec![v])
    }

    #[test]
    fn labels_follow_input_order() {
        let paths: Vec<PathBuf> = ["1.0.jpg", "1.1.jpg", "9.0.jpg", "1.2.jpg", "50.jpg"]
            .iter()
            .map(PathBuf::from)
            .collect();
        let config = ClusterConfig::default().with_eps(0.5).with_min_pts(2);
        let service = ClusteringService::with_extractor(stem_extractor, config);

        let out = service.cluster_paths(&paths).unwrap();
        let pairs: Vec<(&str, i64)> = out.iter().collect();
        assert_eq!(
            pairs,
            vec![
                ("1.0.jpg", 0),
                ("1.1.jpg", 0),
                ("9.0.jpg", NOISE),
                ("1.2.jpg", 0),
                ("50.jpg", NOISE),
            ]
        );
        assert_eq!(out.n_clusters(), 1);
        assert_eq!(out.noise(), vec!["9.0.jpg", "50.jpg"]);
    }

    #[test]
    fn unreadable_images_group_together() {
        let paths = ["bad-a.png", "bad-b.png", "7.jpg"];
        let config = ClusterConfig::default().with_eps(0.01).with_min_pts(1);
        let service = ClusteringService::with_extractor(stem_extractor, config);

        let out = service.cluster_paths(&paths).unwrap();
        assert_eq!(out.get("bad-a.png"), Some(0));
        assert_eq!(out.get("bad-b.png"), Some(0));
        assert_eq!(out.get("7.jpg"), Some(1));
    }

    #[test]
    fn empty_input_is_empty_output() {
        let service = ClusteringService::new(ClusterConfig::default());
        let paths: Vec<PathBuf> = Vec::new();
        let out = service.cluster_paths(&paths).unwrap();
        assert!(out.is_empty());
        assert_eq!(out.n_clusters(), 0);
        assert_eq!(serde_json::to_string(&out).unwrap(), "{}");
    }

    #[test]
    fn invalid_parameters_fail_before_extraction() {
        let config = ClusterConfig::default().with_eps(-1.0);
        let service = ClusteringService::with_extractor(
            |_: &Path| -> Vec<f32> { panic!("extractor must not run") },
            config,
        );
        assert!(matches!(
            service.cluster_paths(&["a.jpg"]),
            Err(Error::InvalidParameter { .. })
        ));
    }

    #[test]
    fn inconsistent_extractor_is_reported() {
        let service = ClusteringService::with_extractor(
            |p: &Path| {
                if p.ends_with("wide.jpg") {
                    vec![0.0; 3]
                } else {
                    vec![0.0; 2]
                }
            },
            ClusterConfig::default(),
        );
        assert!(matches!(
            service.cluster_paths(&["a.jpg", "wide.jpg"]),
            Err(Error::DimensionMismatch {
                expected: 2,
                found: 3
            })
        ));
    }

    #[test]
    fn dedicated_thread_pool_keeps_order() {
        let paths: Vec<String> = (0..40).map(|i| format!("{}.jpg", i * 10)).collect();
        let config = ClusterConfig::default().with_threads(3).with_eps(1.0);
        let service = ClusteringService::with_extractor(stem_extractor, config);

        let vectors = service.extract(&paths).unwrap();
        let ids: Vec<&str> = vectors.iter().map(|v| v.id.as_str()).collect();
        let expected: Vec<&str> = paths.iter().map(String::as_str).collect();
        assert_eq!(ids, expected);

        let out = service.cluster_vectors(&vectors).unwrap();
        let labels: Vec<i64> = out.iter().map(|(_, l)| l).collect();
        assert_eq!(labels, (0..40).collect::<Vec<i64>>());
    }

    #[test]
    fn repeated_path_appears_once() {
        let vectors = vec![
            FeatureVector::new("a.png", vec![0.0]),
            FeatureVector::new("a.png", vec![0.0]),
            FeatureVector::new("b.png", vec![9.0]),
        ];
        let out = ClusteringService::new(ClusterConfig::default())
            .cluster_vectors(&vectors)
            .unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(
            serde_json::to_string(&out).unwrap(),
            r#"{"a.png":0,"b.png":1}"#
        );
        assert_eq!(out.n_clusters(), 2);
    }

    #[test]
    fn repeated_id_keeps_first_position_and_last_label() {
        let vectors = vec![
            FeatureVector::new("x", vec![0.0]),
            FeatureVector::new("y", vec![0.1]),
            FeatureVector::new("x", vec![50.0]),
        ];
        let config = ClusterConfig::default().with_eps(0.5).with_min_pts(2);
        let out = ClusteringService::new(config)
            .cluster_vectors(&vectors)
            .unwrap();

        let pairs: Vec<(&str, i64)> = out.iter().collect();
        assert_eq!(pairs, vec![("x", NOISE), ("y", 0)]);
        assert_eq!(out.n_clusters(), 1);
    }

    #[test]
    fn json_keeps_input_order_and_groups() {
        let vectors = vec![
            FeatureVector::new("z.png", vec![0.0, 0.0]),
            FeatureVector::new("a.png", vec![5.0, 5.0]),
            FeatureVector::new("m.png", vec![0.1, 0.0]),
        ];
        let config = ClusterConfig::default()
            .with_eps(0.5)
            .with_min_pts(2)
            .with_metric(Metric::Manhattan);
        let out = ClusteringService::new(config)
            .cluster_vectors(&vectors)
            .unwrap();

        assert_eq!(
            serde_json::to_string(&out).unwrap(),
            r#"{"z.png":0,"a.png":-1,"m.png":0}"#
        );
        let groups = out.groups();
        assert_eq!(groups[&0], vec!["z.png", "m.png"]);
        assert_eq!(groups[&NOISE], vec!["a.png"]);
    }
}
