//! Feature vectors and the colour-histogram extractor.
//!
//! Extraction never fails: an image that cannot be opened or decoded maps to the
//! all-zero vector, so one unreadable file cannot abort a whole batch. The zero
//! vector is a legitimate point to the clusterer, and unreadable images end up
//! grouped together.

use std::path::Path;

use image::imageops::{self, FilterType};
use tracing::warn;

/// Bins per colour channel.
pub const BINS_PER_CHANNEL: usize = 256;

/// Length of a histogram feature: R, G and B histograms concatenated.
pub const HISTOGRAM_DIM: usize = 3 * BINS_PER_CHANNEL;

/// A fixed-length feature vector tagged with the identifier of its source.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    /// Opaque identifier, usually the image path.
    pub id: String,
    /// Feature values.
    pub values: Vec<f32>,
}

impl FeatureVector {
    /// Create a feature vector.
    pub fn new(id: impl Into<String>, values: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            values,
        }
    }

    /// The all-zero vector of dimension `dim`.
    pub fn zeros(id: impl Into<String>, dim: usize) -> Self {
        Self::new(id, vec![0.0; dim])
    }

    /// Dimensionality.
    pub fn dim(&self) -> usize {
        self.values.len()
    }

    /// Whether every component is zero (the extraction-failure sentinel).
    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|&v| v == 0.0)
    }
}

impl AsRef<[f32]> for FeatureVector {
    fn as_ref(&self) -> &[f32] {
        &self.values
    }
}

/// Produces one feature vector per image path.
///
/// Implementations must return vectors of the same length for every path and
/// must be safe to call from several threads at once.
pub trait FeatureExtractor: Sync {
    /// Extract features for the image at `path`.
    fn extract(&self, path: &Path) -> Vec<f32>;
}

impl<F> FeatureExtractor for F
where
    F: Fn(&Path) -> Vec<f32> + Sync,
{
    fn extract(&self, path: &Path) -> Vec<f32> {
        self(path)
    }
}

/// Normalised RGB histogram of a downscaled copy of the image.
#[derive(Debug, Clone)]
pub struct HistogramExtractor {
    /// Images are resized to `side x side` before counting.
    side: u32,
}

impl HistogramExtractor {
    /// Create an extractor with the default 64x64 working resolution.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the working resolution.
    pub fn with_side(mut self, side: u32) -> Self {
        self.side = side.max(1);
        self
    }

    /// Histogram of an already-decoded image, L2-normalised.
    pub fn histogram(&self, img: &image::DynamicImage) -> Vec<f32> {
        let rgb = img.to_rgb8();
        let small = imageops::resize(&rgb, self.side, self.side, FilterType::CatmullRom);

        let mut hist = vec![0.0f32; HISTOGRAM_DIM];
        for px in small.pixels() {
            let [r, g, b] = px.0;
            hist[r as usize] += 1.0;
            hist[BINS_PER_CHANNEL + g as usize] += 1.0;
            hist[2 * BINS_PER_CHANNEL + b as usize] += 1.0;
        }
        l2_normalize(&mut hist);
        hist
    }
}

impl Default for HistogramExtractor {
    fn default() -> Self {
        Self { side: 64 }
    }
}

impl FeatureExtractor for HistogramExtractor {
    fn extract(&self, path: &Path) -> Vec<f32> {
        match image::open(path) {
            Ok(img) => self.histogram(&img),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to decode image, using zero vector");
                vec![0.0; HISTOGRAM_DIM]
            }
        }
    }
}

/// Scale `v` to unit Euclidean length. The zero vector is left unchanged.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
