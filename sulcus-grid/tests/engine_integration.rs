//! End-to-end run of the ARI engine on a real 3D grid map.

use sulcus_core::AriEngineBuilder;
use sulcus_grid::{Connectivity, GridMap, GridMask};

/// 3x3x1 grid: a strong blob in the top-left 2x2 corner, noise elsewhere.
fn blob_map() -> GridMap {
    let mask = GridMask::full([3, 3, 1], Connectivity::Full).expect("dims are non-zero");
    let p = vec![
        0.001, 0.002, 0.9, // y = 0
        0.003, 0.004, 0.95, // y = 1
        0.85, 0.8, 0.99, // y = 2
    ];
    GridMap::new("blob", mask, p).expect("counts agree")
}

#[test]
fn tight_thresholds_isolate_the_blob() {
    let mut engine = AriEngineBuilder::new()
        .build(&blob_map())
        .expect("grid input is valid");

    let clusters = engine.answer_query(0.9);
    assert_eq!(clusters.len(), 1);
    let mut voxels = clusters[0].voxels().to_vec();
    voxels.sort_unstable();
    assert_eq!(voxels, vec![0, 1, 3, 4]);
    assert!((engine.cluster_tdp(&clusters[0]) - 1.0).abs() < 1e-12);
}

#[test]
fn loose_thresholds_return_the_whole_component() {
    let mut engine = AriEngineBuilder::new()
        .build(&blob_map())
        .expect("grid input is valid");

    let clusters = engine.answer_query(0.3);
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].len(), 9);
}

#[test]
fn threshold_sweep_is_nested() {
    let mut engine = AriEngineBuilder::new()
        .build(&blob_map())
        .expect("grid input is valid");

    let sweep = engine.answer_query_batch(&[0.2, 0.5, 0.9]);
    for window in sweep.windows(2) {
        let (loose, tight) = (&window[0], &window[1]);
        for cluster in tight {
            let host = loose
                .iter()
                .find(|c| c.voxels().contains(&cluster.representative()));
            let host = host.expect("every tight cluster lives inside a loose one");
            for &u in cluster.voxels() {
                assert!(host.voxels().contains(&u));
            }
        }
    }
}
