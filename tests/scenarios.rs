use huddle::{
    ClusterConfig, ClusteringService, Dbscan, Error, FeatureVector, HistogramExtractor, NOISE,
};
use image::{Rgb, RgbImage};

fn run(vectors: &[FeatureVector], eps: f32, min_pts: usize) -> Vec<(String, i64)> {
    let config = ClusterConfig::default().with_eps(eps).with_min_pts(min_pts);
    ClusteringService::new(config)
        .cluster_vectors(vectors)
        .unwrap()
        .into_inner()
}

#[test]
fn identical_vectors_share_a_cluster() {
    let vectors: Vec<FeatureVector> = ["a", "b", "c"]
        .iter()
        .map(|id| FeatureVector::new(*id, vec![0.2, 0.4, 0.1]))
        .collect();

    let out = run(&vectors, 0.1, 2);
    assert_eq!(out.len(), 3);
    assert!(out.iter().all(|(_, l)| *l == 0));
}

#[test]
fn two_distant_vectors_are_noise() {
    let vectors = vec![
        FeatureVector::new("a", vec![0.0, 0.0]),
        FeatureVector::new("b", vec![10.0, 0.0]),
    ];

    let out = run(&vectors, 1.0, 2);
    assert_eq!(out, vec![("a".to_string(), NOISE), ("b".to_string(), NOISE)]);
}

#[test]
fn dense_group_plus_outlier() {
    let vectors = vec![
        FeatureVector::new("p0", vec![0.0, 0.0]),
        FeatureVector::new("p1", vec![0.1, 0.0]),
        FeatureVector::new("far", vec![20.0, 20.0]),
        FeatureVector::new("p2", vec![0.0, 0.1]),
        FeatureVector::new("p3", vec![0.1, 0.1]),
    ];

    let out = run(&vectors, 0.5, 3);
    let labels: Vec<i64> = out.iter().map(|(_, l)| *l).collect();
    assert_eq!(labels, vec![0, 0, NOISE, 0, 0]);
}

#[test]
fn empty_input_gives_empty_mapping() {
    let out = run(&[], 0.5, 3);
    assert!(out.is_empty());
}

#[test]
fn unreadable_images_share_a_cluster() {
    let dir = tempfile::tempdir().unwrap();
    let broken_a = dir.path().join("broken-a.jpg");
    let broken_b = dir.path().join("broken-b.png");
    std::fs::write(&broken_a, b"not an image").unwrap();
    std::fs::write(&broken_b, b"").unwrap();

    let config = ClusterConfig::default().with_eps(0.01).with_min_pts(1);
    let out = ClusteringService::new(config)
        .cluster_paths(&[&broken_a, &broken_b])
        .unwrap();

    let labels: Vec<i64> = out.iter().map(|(_, l)| l).collect();
    assert_eq!(labels, vec![0, 0]);
}

#[test]
fn duplicate_vectors_with_distinct_ids_stay_together() {
    let v = vec![0.3, 0.3, 0.3];
    let vectors = vec![
        FeatureVector::new("x", vec![9.0, 9.0, 9.0]),
        FeatureVector::new("dup-1", v.clone()),
        FeatureVector::new("dup-2", v.clone()),
        FeatureVector::new("dup-3", v),
    ];

    for eps in [0.0, 0.05, 1.0] {
        let out = run(&vectors, eps, 3);
        assert_eq!(out[1].1, out[2].1);
        assert_eq!(out[2].1, out[3].1);
        assert_ne!(out[1].1, NOISE);
    }
}

#[test]
fn mixed_dimensions_fail_fast() {
    let vectors = vec![
        FeatureVector::new("a", vec![0.0; 768]),
        FeatureVector::new("b", vec![0.0; 767]),
    ];
    let err = ClusteringService::new(ClusterConfig::default())
        .cluster_vectors(&vectors)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::DimensionMismatch {
            expected: 768,
            found: 767
        }
    ));
}

#[test]
fn images_grouped_by_colour() {
    let dir = tempfile::tempdir().unwrap();
    let save = |name: &str, w: u32, h: u32, colour: [u8; 3]| {
        let path = dir.path().join(name);
        RgbImage::from_pixel(w, h, Rgb(colour)).save(&path).unwrap();
        path
    };

    let paths = vec![
        save("red-small.png", 32, 32, [220, 20, 20]),
        save("blue.png", 80, 40, [10, 10, 230]),
        save("red-large.png", 200, 120, [220, 20, 20]),
        save("blue-again.png", 50, 50, [10, 10, 230]),
        save("green.png", 64, 64, [20, 200, 20]),
    ];

    let config = ClusterConfig::default().with_eps(0.1).with_min_pts(2);
    let out = ClusteringService::new(config).cluster_paths(&paths).unwrap();

    let labels: Vec<i64> = out.iter().map(|(_, l)| l).collect();
    assert_eq!(labels, vec![0, 1, 0, 1, NOISE]);

    let key = paths[0].display().to_string();
    assert_eq!(out.get(&key), Some(0));
}

#[test]
fn histogram_features_are_unit_length() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gradient.png");
    RgbImage::from_fn(100, 100, |x, y| Rgb([x as u8, y as u8, 128]))
        .save(&path)
        .unwrap();

    let service = ClusteringService::new(ClusterConfig::default());
    let vectors = service.extract(&[&path]).unwrap();
    assert_eq!(vectors.len(), 1);
    assert_eq!(vectors[0].dim(), huddle::feature::HISTOGRAM_DIM);

    let norm: f32 = vectors[0].values.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() < 1e-4, "norm was {norm}");

    // Direct extraction agrees with the service.
    let direct = huddle::FeatureExtractor::extract(&HistogramExtractor::new(), &path);
    assert_eq!(direct, vectors[0].values);
}

#[test]
fn dbscan_on_raw_vectors() {
    let data = vec![vec![0.0f32, 0.0], vec![0.0, 0.2], vec![3.0, 3.0]];
    let fit = Dbscan::new(0.25, 2).fit(&data).unwrap();
    assert_eq!(fit.ids(), vec![0, 0, NOISE]);
    assert_eq!(fit.core, vec![true, true, false]);
}
