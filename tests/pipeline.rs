//! End-to-end flow on a Seeds-format sample: load, standardize, cluster,
//! cut, evaluate and project.

use approx::assert_abs_diff_eq;

use u_cluster::dataset::{standardize, SeedsReader};
use u_cluster::hierarchical::{hierarchical, HierarchicalConfig, Linkage};
use u_cluster::kmeans::{kmeans, KMeansConfig};
use u_cluster::metrics::{cluster_composition, evaluate};
use u_cluster::projection::project_2d;
use u_cluster::sweep::kmeans_sweep;

// Five kernels from each variety of the UCI Seeds dataset; the ragged
// double tabs mirror the UCI distribution.
const SEEDS: &str = "\
15.26\t14.84\t0.871\t5.763\t3.312\t2.221\t5.22\t1
14.88\t14.57\t0.8811\t5.554\t3.333\t1.018\t4.956\t1
14.29\t14.09\t0.905\t5.291\t3.337\t2.699\t4.825\t1
13.84\t13.94\t0.8955\t5.324\t3.379\t2.259\t4.805\t1
16.14\t14.99\t0.9034\t5.658\t3.562\t1.355\t5.175\t1
17.63\t15.98\t0.8673\t6.191\t3.561\t4.076\t6.06\t2
16.84\t15.67\t0.8623\t5.998\t3.484\t4.675\t5.877\t2
17.26\t15.73\t0.8763\t5.978\t3.594\t4.539\t5.791\t2
19.11\t16.26\t0.9081\t6.154\t3.93\t2.936\t6.079\t2
16.82\t15.51\t0.8786\t6.017\t3.486\t4.004\t5.841\t2
13.07\t13.92\t0.848\t5.472\t2.994\t5.304\t5.395\t3
13.32\t13.94\t0.8613\t5.541\t3.073\t7.035\t5.44\t3
13.34\t13.95\t0.862\t5.389\t3.074\t5.995\t5.307\t3
12.22\t13.32\t0.8652\t5.224\t2.967\t5.469\t5.221\t3
11.82\t13.4\t\t0.8274\t5.314\t2.777\t4.185\t5.178\t3
";

fn load() -> (Vec<Vec<f64>>, Vec<i64>) {
    let ds = SeedsReader::new().parse_str(SEEDS).unwrap();
    let z = standardize(&ds.features).unwrap();
    (z.data, ds.labels)
}

#[test]
fn loads_fixture() {
    let ds = SeedsReader::new().parse_str(SEEDS).unwrap();
    assert_eq!(ds.n_samples(), 15);
    assert_eq!(ds.n_features(), 7);
    assert_eq!(ds.distinct_labels(), vec![1, 2, 3]);
    assert_eq!(ds.features[14][2], 0.8274);
}

#[test]
fn loads_fixture_from_file() {
    let path = std::env::temp_dir().join(format!("u_cluster_seeds_{}.txt", std::process::id()));
    std::fs::write(&path, SEEDS).unwrap();
    let ds = SeedsReader::new().parse_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(ds.n_samples(), 15);
}

#[test]
fn kmeans_pipeline() {
    let (data, labels) = load();
    let result = kmeans(&data, &KMeansConfig::new(3)).unwrap();

    assert_eq!(result.labels.len(), 15);
    assert_eq!(result.cluster_sizes.iter().sum::<usize>(), 15);
    assert!(result.labels.iter().all(|&l| l < 3));

    let scores = evaluate(&result.labels, &labels).unwrap();
    assert!(scores.purity >= 1.0 / 3.0 && scores.purity <= 1.0);
    assert!(scores.rand_index >= 0.0 && scores.rand_index <= 1.0);
    assert!(scores.adjusted_rand_index <= 1.0);

    // Same seed, same answer
    assert_eq!(result, kmeans(&data, &KMeansConfig::new(3)).unwrap());
}

#[test]
fn hierarchical_recovers_varieties() {
    let (data, labels) = load();
    for linkage in [Linkage::Average, Linkage::Complete] {
        let tree = hierarchical(&data, &HierarchicalConfig::new(linkage)).unwrap();
        assert_eq!(tree.merges().len(), 14);
        assert_eq!(tree.history().len(), 15);

        let cut = tree.cut(3).unwrap();
        let scores = evaluate(&cut, &labels).unwrap();
        assert_eq!(scores.purity, 1.0, "{linkage}");
        assert_eq!(scores.rand_index, 1.0, "{linkage}");
        assert_eq!(scores.adjusted_rand_index, 1.0, "{linkage}");

        for comp in cluster_composition(&cut, &labels).unwrap() {
            assert_eq!(comp.size, 5);
            assert_eq!(comp.majority_fraction(), 1.0);
        }
    }
}

#[test]
fn single_linkage_chains() {
    let (data, labels) = load();
    let tree = hierarchical(&data, &HierarchicalConfig::new(Linkage::Single)).unwrap();
    let scores = evaluate(&tree.cut(3).unwrap(), &labels).unwrap();
    assert!(scores.adjusted_rand_index < 1.0);

    for w in tree.merges().windows(2) {
        assert!(w[0].distance <= w[1].distance);
    }
}

#[test]
fn cuts_cover_every_level() {
    let (data, _) = load();
    let tree = hierarchical(&data, &HierarchicalConfig::default()).unwrap();
    for k in 1..=15 {
        let labels = tree.cut(k).unwrap();
        let mut distinct = labels.clone();
        distinct.sort_unstable();
        distinct.dedup();
        assert_eq!(distinct.len(), k);
    }
    assert!(tree.cut(0).is_err());
    assert!(tree.cut(16).is_err());

    let singletons = tree.cut_at_distance(0.0).unwrap();
    assert_eq!(singletons, tree.cut(15).unwrap());
}

#[test]
fn sweep_over_k() {
    let (data, labels) = load();
    let points = kmeans_sweep(&data, &labels, 1..=5, &KMeansConfig::new(1)).unwrap();
    assert_eq!(points.len(), 5);

    // Standardized features: total sum of squares is n * d
    assert_abs_diff_eq!(points[0].inertia, 105.0, epsilon = 1e-9);
    assert_abs_diff_eq!(points[0].scores.purity, 1.0 / 3.0, epsilon = 1e-12);
    for p in &points[1..] {
        assert!(p.inertia <= points[0].inertia);
    }
}

#[test]
fn projection_for_plotting() {
    let (data, _) = load();
    let p = project_2d(&data).unwrap();
    assert_eq!(p.scores.len(), 15);
    assert!(p.scores.iter().all(|s| s.len() == 2));
    let explained: f64 = p.explained_variance_ratio.iter().sum();
    assert!(explained > 0.0 && explained <= 1.0 + 1e-12);
    assert!(p.eigenvalues[0] >= p.eigenvalues[1]);

    let km = kmeans(&data, &KMeansConfig::new(3)).unwrap();
    let centroids = p.transform(&km.centroids).unwrap();
    assert_eq!(centroids.len(), 3);
    assert!(centroids.iter().flatten().all(|v| v.is_finite()));
}
