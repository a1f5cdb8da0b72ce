//! E2E tests for the handle lifecycle: creation, loading points, building,
//! querying, freeing, and the errors raised at each boundary.

use e2e_tests::{flatten, random_vectors, sequential_ids, TestHarness, METHODS};
use pretty_assertions::assert_eq;
use vecnn_service::{DataType, DistType, ErrorKind, IndexToken, RowMajor};

/// Three points, two queries: the smallest complete pipeline.
#[test]
fn test_three_point_scenario() {
    let harness = TestHarness::new();

    for method in METHODS {
        let token = harness.create("l2", &[], method);
        harness.service.add_point(token, 10, &[0.0, 0.0]).unwrap();
        harness.service.add_point(token, 11, &[1.0, 0.0]).unwrap();
        harness.service.add_point(token, 12, &[10.0, 10.0]).unwrap();
        harness
            .service
            .build_index(token, &[] as &[&str])
            .unwrap();

        assert_eq!(
            harness.service.knn_query(token, 2, &[0.0, 0.0]).unwrap(),
            vec![10, 11],
            "{method}"
        );
        assert_eq!(
            harness.service.knn_query(token, 1, &[9.0, 9.0]).unwrap(),
            vec![12],
            "{method}"
        );
        harness.service.free_index(token).unwrap();
    }
}

/// A batch add followed by a batch query over the same vectors.
#[test]
fn test_batch_add_scenario() {
    let harness = TestHarness::new();
    let corpus = random_vectors(100, 4, 31);
    let flat = flatten(&corpus);
    let ids: Vec<i32> = (0..100).map(|i| 1000 + i).collect();

    let token = harness.create("l2", &[], "hnsw");
    harness
        .service
        .add_points_batch(token, &ids, RowMajor::new(&flat, 100, 4).unwrap())
        .unwrap();
    assert_eq!(harness.service.get_point_count(token).unwrap(), 100);
    assert_eq!(harness.service.get_point(token, 0).unwrap(), corpus[0]);
    harness
        .service
        .build_index(token, &["M=8", "efConstruction=50"])
        .unwrap();

    let first_five = RowMajor::new(&flat[..20], 5, 4).unwrap();
    let matrix = harness
        .service
        .knn_query_batch(token, 3, 1, first_five)
        .unwrap();
    let nearest: Vec<i32> = matrix.iter().map(|row| row[0]).collect();
    assert_eq!(nearest, vec![1000, 1001, 1002, 1003, 1004]);
}

/// Unknown names and unsupported type tags are rejected at creation.
#[test]
fn test_create_errors() {
    let harness = TestHarness::new();
    let service = &harness.service;

    let err = service
        .create_index("hamming", &[] as &[&str], "hnsw", DataType::Vector, DistType::Float)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);

    let err = service
        .create_index("l2", &[] as &[&str], "vptree", DataType::Vector, DistType::Float)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);

    let err = service
        .create_index("lp", &[] as &[&str], "hnsw", DataType::Vector, DistType::Float)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parameter);

    let err = service
        .create_index("l2", &[] as &[&str], "hnsw", DataType::Vector, DistType::Int)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parameter);

    let err = service
        .create_index("l2", &[] as &[&str], "hnsw", DataType::String, DistType::Float)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parameter);

    assert!(service.live_handles().is_empty());
}

/// Operations out of lifecycle order fail with a state error.
#[test]
fn test_lifecycle_order_errors() {
    let harness = TestHarness::new();
    let token = harness.create("l2", &[], "hnsw");

    let err = harness.service.knn_query(token, 1, &[0.0]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::State);
    let err = harness
        .service
        .save_index(token, &harness.index_path("early.idx"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::State);
    let err = harness
        .service
        .set_query_params(token, &["efSearch=10"])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::State);

    harness.service.add_point(token, 0, &[1.0, 2.0]).unwrap();
    harness
        .service
        .build_index(token, &[] as &[&str])
        .unwrap();

    let err = harness.service.add_point(token, 1, &[3.0, 4.0]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::State);
    assert_eq!(harness.service.get_point_count(token).unwrap(), 1);
}

/// Argument errors at the query and point boundaries.
#[test]
fn test_boundary_errors() {
    let harness = TestHarness::new();
    let corpus = random_vectors(10, 3, 32);

    for method in METHODS {
        let token = harness.build("l2", method, &corpus, &[] as &[&str]);
        let service = &harness.service;

        assert_eq!(
            service.knn_query(token, 0, &corpus[0]).unwrap_err().kind(),
            ErrorKind::Parameter
        );
        assert_eq!(
            service.knn_query(token, 3, &[]).unwrap_err().kind(),
            ErrorKind::Parameter
        );
        assert_eq!(
            service.knn_query(token, 3, &[1.0, 2.0]).unwrap_err().kind(),
            ErrorKind::Parameter
        );
        for position in [-1, 10, i64::MAX] {
            assert_eq!(
                service.get_point(token, position).unwrap_err().kind(),
                ErrorKind::Bounds,
                "{method}: position {position}"
            );
        }
        assert_eq!(
            service
                .set_query_params(token, &["bogus=1"])
                .unwrap_err()
                .kind(),
            ErrorKind::Config
        );
    }
}

/// A rejected batch leaves the handle exactly as it was.
#[test]
fn test_rejected_batch_add_is_atomic() {
    let harness = TestHarness::new();
    let token = harness.create("l2", &[], "brute_force");
    harness.service.add_point(token, 0, &[1.0, 1.0]).unwrap();

    let flat = vec![0.0f32; 9];
    let err = harness
        .service
        .add_points_batch(token, &[1, 2, 3], RowMajor::new(&flat, 3, 3).unwrap())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parameter);

    let flat = vec![0.0f32; 4];
    let err = harness
        .service
        .add_points_batch(token, &[1], RowMajor::new(&flat, 2, 2).unwrap())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parameter);

    assert_eq!(harness.service.get_point_count(token).unwrap(), 1);
}

/// HNSW refuses an empty corpus; an exhaustive scan over nothing finds nothing.
#[test]
fn test_build_empty_index() {
    let harness = TestHarness::new();

    let hnsw = harness.create("l2", &[], "hnsw");
    assert!(harness
        .service
        .build_index(hnsw, &[] as &[&str])
        .is_err());
    assert!(!harness.service.handle_info(hnsw).unwrap().built);

    let scan = harness.create("l2", &[], "brute_force");
    harness
        .service
        .build_index(scan, &[] as &[&str])
        .unwrap();
    assert!(harness
        .service
        .knn_query(scan, 3, &[1.0, 2.0])
        .unwrap()
        .is_empty());
}

/// Freed and forged tokens are rejected everywhere.
#[test]
fn test_stale_and_forged_tokens() {
    let harness = TestHarness::new();
    let corpus = random_vectors(5, 2, 33);
    let token = harness.build("l2", "brute_force", &corpus, &[] as &[&str]);
    harness.service.free_index(token).unwrap();

    let replacement = harness.create("l2", &[], "brute_force");
    harness
        .service
        .add_points_rows(replacement, &sequential_ids(5), &corpus)
        .unwrap();
    assert_ne!(replacement, token);

    for stale in [token, IndexToken::from_raw(0), IndexToken::from_raw(u64::MAX)] {
        assert_eq!(
            harness.service.knn_query(stale, 1, &[0.0, 0.0]).unwrap_err().kind(),
            ErrorKind::State
        );
        assert_eq!(
            harness.service.get_point_count(stale).unwrap_err().kind(),
            ErrorKind::State
        );
        assert_eq!(
            harness.service.free_index(stale).unwrap_err().kind(),
            ErrorKind::State
        );
    }

    assert_eq!(harness.service.get_point_count(replacement).unwrap(), 5);
    assert_eq!(harness.service.live_handles(), vec![replacement]);
}
