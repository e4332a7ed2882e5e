//! DBSCAN on a small 2D dataset, then the same run through the service layer.

use huddle::{ClusterConfig, ClusteringService, Dbscan, FeatureVector, NOISE};

fn main() {
    // Two dense groups and one outlier.
    let data: Vec<Vec<f32>> = vec![
        // Group A (near origin)
        vec![0.0, 0.0],
        vec![0.1, 0.2],
        vec![0.2, 0.1],
        vec![-0.1, 0.1],
        // Group B (near (5, 5))
        vec![5.0, 5.0],
        vec![5.1, 4.9],
        vec![4.9, 5.1],
        vec![5.2, 5.2],
        // Outlier
        vec![10.0, 0.0],
    ];

    let fit = Dbscan::new(1.0, 3).fit(&data).unwrap();
    println!("=== DBSCAN (eps=1.0, min_pts=3) ===");
    for (i, label) in fit.ids().iter().enumerate() {
        let tag = if *label == NOISE {
            "NOISE".to_string()
        } else {
            format!("cluster {}", label)
        };
        let kind = if fit.core[i] { "core" } else { "border/noise" };
        println!(
            "  point {:2} ({:5.1}, {:5.1}) => {} [{}]",
            i, data[i][0], data[i][1], tag, kind
        );
    }

    let vectors: Vec<FeatureVector> = data
        .iter()
        .enumerate()
        .map(|(i, v)| FeatureVector::new(format!("point-{i}"), v.clone()))
        .collect();
    let config = ClusterConfig::default().with_eps(1.0).with_min_pts(3);
    let assignments = ClusteringService::new(config)
        .cluster_vectors(&vectors)
        .unwrap();
    println!("\n=== JSON ===");
    println!("{}", serde_json::to_string_pretty(&assignments).unwrap());
}
