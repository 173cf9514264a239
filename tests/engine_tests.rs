mod common;

use assert_approx_eq::assert_approx_eq;
use proptest::prelude::*;
use serde_json::json;

use common::assertions::{
    assert_ascending, assert_index_not_found, assert_results_contain, assert_top_result,
    brute_force_top_k,
};
use common::harness::TestHarness;
use common::vectors::{random_vectors, random_vectors_seeded, tagged_metadata};

use vecdex::error::VecdexError;
use vecdex::persistence::sidecar_key;
use vecdex::types::IndexType;

// ─── Create ───

#[tokio::test]
async fn test_create_twice_is_duplicate() {
    let h = TestHarness::new().await;
    h.engine.create_index("docs", 4, IndexType::Exact).await.unwrap();
    h.engine
        .add_vectors("docs", vec![vec![1.0, 0.0, 0.0, 0.0]], None, None)
        .await
        .unwrap();

    let err = h
        .engine
        .create_index("docs", 8, IndexType::ApproximateClustered)
        .await
        .unwrap_err();
    assert!(matches!(err, VecdexError::DuplicateIndex { .. }));

    let docs = h.engine.describe_index("docs").await.unwrap();
    assert_eq!(docs.dimension, 4);
    assert_eq!(docs.index_type, IndexType::Exact);
    assert_eq!(docs.vector_count, 1);
}

#[tokio::test]
async fn test_create_rejects_bad_arguments() {
    let h = TestHarness::new().await;
    for (name, dim) in [("docs", 0), ("", 4), ("a/b", 4), ("has space", 4)] {
        let err = h
            .engine
            .create_index(name, dim, IndexType::Exact)
            .await
            .unwrap_err();
        assert!(
            matches!(err, VecdexError::Validation(_)),
            "{name:?}/{dim}: {err:?}"
        );
    }
    assert!(h.engine.list_indexes().await.is_empty());
}

#[tokio::test]
async fn test_create_persists_empty_index() {
    let h = TestHarness::new().await;
    h.engine.create_index("docs", 4, IndexType::Exact).await.unwrap();

    let blob = h.committed_blob("docs").await;
    assert!(h.store.exists(&blob).await.unwrap());
    assert_eq!(h.blob_keys("docs").await, vec![blob]);
}

// ─── Add ───

#[tokio::test]
async fn test_add_increases_count_by_batch_size() {
    let h = TestHarness::new().await;
    h.engine.create_index("docs", 8, IndexType::Exact).await.unwrap();

    h.engine
        .add_vectors("docs", random_vectors(10, 8), None, None)
        .await
        .unwrap();
    h.engine
        .add_vectors("docs", random_vectors_seeded(7, 8, 7), None, None)
        .await
        .unwrap();

    assert_eq!(h.engine.describe_index("docs").await.unwrap().vector_count, 17);
}

#[tokio::test]
async fn test_omitted_ids_are_consecutive() {
    let h = TestHarness::new().await;
    h.engine.create_index("docs", 4, IndexType::Exact).await.unwrap();

    let first = h
        .engine
        .add_vectors("docs", random_vectors(3, 4), None, None)
        .await
        .unwrap();
    assert_eq!(first, vec![0, 1, 2]);

    let second = h
        .engine
        .add_vectors("docs", random_vectors(2, 4), None, None)
        .await
        .unwrap();
    assert_eq!(second, vec![3, 4]);
}

#[tokio::test]
async fn test_explicit_ids_are_returned() {
    let h = TestHarness::new().await;
    h.engine.create_index("docs", 2, IndexType::Exact).await.unwrap();

    let ids = h
        .engine
        .add_vectors(
            "docs",
            vec![vec![0.0, 0.0], vec![5.0, 5.0]],
            Some(vec![100, 200]),
            None,
        )
        .await
        .unwrap();
    assert_eq!(ids, vec![100, 200]);

    let results = h.engine.search("docs", &[5.0, 5.0], 1).await.unwrap();
    assert_top_result(&results, 200);
}

#[tokio::test]
async fn test_dimension_mismatch_leaves_count_unchanged() {
    let h = TestHarness::new().await;
    h.engine.create_index("docs", 4, IndexType::Exact).await.unwrap();
    h.engine
        .add_vectors("docs", random_vectors(2, 4), None, None)
        .await
        .unwrap();

    let err = h
        .engine
        .add_vectors(
            "docs",
            vec![vec![1.0, 2.0, 3.0, 4.0], vec![1.0, 2.0, 3.0]],
            None,
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        VecdexError::DimensionMismatch {
            expected: 4,
            actual: 3
        }
    ));

    assert_eq!(h.engine.describe_index("docs").await.unwrap().vector_count, 2);
    let results = h.engine.search("docs", &[1.0, 2.0, 3.0, 4.0], 10).await.unwrap();
    assert_eq!(results.len(), 2);
}

#[tokio::test]
async fn test_count_mismatches() {
    let h = TestHarness::new().await;
    h.engine.create_index("docs", 2, IndexType::Exact).await.unwrap();

    let err = h
        .engine
        .add_vectors("docs", random_vectors(2, 2), Some(vec![1]), None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        VecdexError::IdCountMismatch { ids: 1, vectors: 2 }
    ));

    let err = h
        .engine
        .add_vectors("docs", random_vectors(2, 2), None, Some(tagged_metadata(3)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        VecdexError::MetadataCountMismatch {
            metadata: 3,
            vectors: 2
        }
    ));

    assert_eq!(h.engine.describe_index("docs").await.unwrap().vector_count, 0);
}

#[tokio::test]
async fn test_empty_metadata_list_is_ignored() {
    let h = TestHarness::new().await;
    h.engine.create_index("docs", 2, IndexType::Exact).await.unwrap();

    let ids = h
        .engine
        .add_vectors("docs", random_vectors(2, 2), None, Some(Vec::new()))
        .await
        .unwrap();
    assert_eq!(ids.len(), 2);
}

#[tokio::test]
async fn test_empty_and_oversized_batches_rejected() {
    let h = TestHarness::new().await;
    h.engine.create_index("docs", 2, IndexType::Exact).await.unwrap();

    let err = h
        .engine
        .add_vectors("docs", Vec::new(), None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, VecdexError::Validation(_)));

    let too_many = vec![vec![0.0, 0.0]; h.limits.max_batch_size + 1];
    let err = h
        .engine
        .add_vectors("docs", too_many, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, VecdexError::Validation(_)));
}

#[tokio::test]
async fn test_add_to_missing_index() {
    let h = TestHarness::new().await;
    assert_index_not_found(
        h.engine
            .add_vectors("nope", random_vectors(1, 2), None, None)
            .await,
    );
}

// ─── Search ───

#[tokio::test]
async fn test_search_returns_all_when_fewer_than_k() {
    let h = TestHarness::new().await;
    h.engine.create_index("docs", 3, IndexType::Exact).await.unwrap();
    h.engine
        .add_vectors("docs", random_vectors(3, 3), None, None)
        .await
        .unwrap();

    let results = h.engine.search("docs", &[0.0, 0.0, 0.0], 10).await.unwrap();
    assert_eq!(results.len(), 3);
    assert_results_contain(&results, &[0, 1, 2]);
    assert_ascending(&results);
}

#[tokio::test]
async fn test_search_empty_index() {
    let h = TestHarness::new().await;
    h.engine.create_index("docs", 3, IndexType::Exact).await.unwrap();
    let results = h.engine.search("docs", &[0.0, 0.0, 0.0], 5).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_identical_query_has_zero_distance() {
    let h = TestHarness::new().await;
    h.engine.create_index("docs", 16, IndexType::Exact).await.unwrap();
    let corpus = random_vectors(50, 16);
    h.engine
        .add_vectors("docs", corpus.clone(), None, None)
        .await
        .unwrap();

    let results = h.engine.search("docs", &corpus[17], 5).await.unwrap();
    assert_top_result(&results, 17);
    assert_approx_eq!(results[0].distance, 0.0);
    assert_ascending(&results);
}

#[tokio::test]
async fn test_exact_search_matches_brute_force() {
    let h = TestHarness::new().await;
    h.engine.create_index("docs", 8, IndexType::Exact).await.unwrap();
    let corpus = random_vectors(200, 8);
    h.engine
        .add_vectors("docs", corpus.clone(), None, None)
        .await
        .unwrap();

    for query in random_vectors_seeded(5, 8, 99) {
        let results = h.engine.search("docs", &query, 10).await.unwrap();
        let ids: Vec<i64> = results.iter().map(|r| r.id).collect();
        assert_eq!(ids, brute_force_top_k(&corpus, &query, 10));
    }
}

#[tokio::test]
async fn test_squared_l2_distance() {
    let h = TestHarness::new().await;
    h.engine.create_index("docs", 2, IndexType::Exact).await.unwrap();
    h.engine
        .add_vectors("docs", vec![vec![3.0, 4.0]], None, None)
        .await
        .unwrap();

    let results = h.engine.search("docs", &[0.0, 0.0], 1).await.unwrap();
    assert_approx_eq!(results[0].distance, 25.0);
}

#[tokio::test]
async fn test_ties_keep_insertion_order() {
    let h = TestHarness::new().await;
    h.engine.create_index("docs", 2, IndexType::Exact).await.unwrap();
    h.engine
        .add_vectors(
            "docs",
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![-1.0, 0.0]],
            Some(vec![30, 10, 20]),
            None,
        )
        .await
        .unwrap();

    let results = h.engine.search("docs", &[0.0, 0.0], 3).await.unwrap();
    let ids: Vec<i64> = results.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![30, 10, 20]);
}

#[tokio::test]
async fn test_search_validation() {
    let h = TestHarness::new().await;
    h.engine.create_index("docs", 2, IndexType::Exact).await.unwrap();

    let err = h.engine.search("docs", &[0.0, 0.0], 0).await.unwrap_err();
    assert!(matches!(err, VecdexError::Validation(_)));

    let err = h
        .engine
        .search("docs", &[0.0, 0.0], h.limits.max_top_k + 1)
        .await
        .unwrap_err();
    assert!(matches!(err, VecdexError::Validation(_)));

    let err = h.engine.search("docs", &[0.0], 1).await.unwrap_err();
    assert!(matches!(
        err,
        VecdexError::DimensionMismatch {
            expected: 2,
            actual: 1
        }
    ));

    assert_index_not_found(h.engine.search("nope", &[0.0, 0.0], 1).await);
}

#[tokio::test]
async fn test_search_returns_metadata() {
    let h = TestHarness::new().await;
    h.engine.create_index("docs", 4, IndexType::Exact).await.unwrap();
    let corpus = random_vectors(4, 4);
    let mut metadata = tagged_metadata(4);
    metadata[2] = None;
    h.engine
        .add_vectors("docs", corpus.clone(), None, Some(metadata))
        .await
        .unwrap();

    let results = h.engine.search("docs", &corpus[1], 1).await.unwrap();
    let meta = results[0].metadata.as_ref().unwrap();
    assert_eq!(meta["tag"], json!("item_1"));

    let results = h.engine.search("docs", &corpus[2], 1).await.unwrap();
    assert_top_result(&results, 2);
    assert!(results[0].metadata.is_none());
}

#[tokio::test]
async fn test_duplicate_ids_last_metadata_wins() {
    let h = TestHarness::new().await;
    h.engine.create_index("docs", 2, IndexType::Exact).await.unwrap();
    let first = json!({"v": 1}).as_object().cloned();
    let second = json!({"v": 2}).as_object().cloned();
    h.engine
        .add_vectors("docs", vec![vec![0.0, 0.0]], Some(vec![7]), Some(vec![first]))
        .await
        .unwrap();
    h.engine
        .add_vectors("docs", vec![vec![9.0, 9.0]], Some(vec![7]), Some(vec![second]))
        .await
        .unwrap();

    assert_eq!(h.engine.describe_index("docs").await.unwrap().vector_count, 2);
    let results = h.engine.search("docs", &[0.0, 0.0], 2).await.unwrap();
    assert!(results.iter().all(|r| r.id == 7));
    assert!(results
        .iter()
        .all(|r| r.metadata.as_ref().unwrap()["v"] == json!(2)));
}

// ─── List / delete ───

#[tokio::test]
async fn test_list_sorted_by_name() {
    let h = TestHarness::new().await;
    for name in ["zeta", "alpha", "mid"] {
        h.engine.create_index(name, 2, IndexType::Exact).await.unwrap();
    }
    let names: Vec<String> = h
        .engine
        .list_indexes()
        .await
        .into_iter()
        .map(|d| d.name)
        .collect();
    assert_eq!(names, vec!["alpha", "mid", "zeta"]);
}

#[tokio::test]
async fn test_delete_removes_entry_and_files() {
    let h = TestHarness::new().await;
    h.engine.create_index("docs", 4, IndexType::Exact).await.unwrap();
    h.engine
        .add_vectors("docs", random_vectors(3, 4), None, None)
        .await
        .unwrap();

    h.engine.delete_index("docs").await.unwrap();

    assert!(h.engine.list_indexes().await.is_empty());
    assert!(h.blob_keys("docs").await.is_empty());
    assert!(!h.store.exists(&sidecar_key("docs")).await.unwrap());
    assert_index_not_found(h.engine.search("docs", &[0.0; 4], 1).await);
    assert_index_not_found(h.engine.delete_index("docs").await);

    // The name is free again.
    h.engine.create_index("docs", 2, IndexType::Exact).await.unwrap();
}

// ─── Durability ───

#[tokio::test]
async fn test_round_trip_across_restart() {
    let h = TestHarness::local().await;
    h.engine.create_index("docs", 4, IndexType::Exact).await.unwrap();
    let ids = h
        .engine
        .add_vectors(
            "docs",
            vec![vec![1.0, 0.0, 0.0, 0.0], vec![0.0, 1.0, 0.0, 0.0]],
            None,
            None,
        )
        .await
        .unwrap();
    assert_eq!(ids, vec![0, 1]);

    let before = h.engine.search("docs", &[1.0, 0.0, 0.0, 0.0], 1).await.unwrap();
    assert_top_result(&before, 0);
    assert_approx_eq!(before[0].distance, 0.0);

    let root = h.root().unwrap();
    assert!(root.join(h.committed_blob("docs").await).is_file());
    assert!(root.join("docs.metadata.json").is_file());

    let restarted = h.restarted_engine();
    let report = restarted.load_all().await.unwrap();
    assert!(report.failures.is_empty());
    assert_eq!(report.restored.len(), 1);
    assert_eq!(report.restored[0].vector_count, 2);

    let listed = restarted.list_indexes().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "docs");
    assert_eq!(listed[0].index_type, IndexType::Exact);
    assert_eq!(listed[0].dimension, 4);
    assert_eq!(listed[0].vector_count, 2);

    let after = restarted.search("docs", &[1.0, 0.0, 0.0, 0.0], 1).await.unwrap();
    assert_eq!(after, before);

    // Ids keep counting from the restored count.
    let next = restarted
        .add_vectors("docs", vec![vec![0.0, 0.0, 1.0, 0.0]], None, None)
        .await
        .unwrap();
    assert_eq!(next, vec![2]);
}

#[tokio::test]
async fn test_metadata_survives_restart() {
    let h = TestHarness::local().await;
    h.engine.create_index("docs", 4, IndexType::Exact).await.unwrap();
    let corpus = random_vectors(5, 4);
    h.engine
        .add_vectors("docs", corpus.clone(), None, Some(tagged_metadata(5)))
        .await
        .unwrap();

    let restarted = h.restarted_engine();
    restarted.load_all().await.unwrap();
    let results = restarted.search("docs", &corpus[3], 1).await.unwrap();
    assert_eq!(results[0].metadata.as_ref().unwrap()["tag"], json!("item_3"));
}

#[tokio::test]
async fn test_deleted_index_not_restored() {
    let h = TestHarness::local().await;
    h.engine.create_index("keep", 2, IndexType::Exact).await.unwrap();
    h.engine.create_index("drop", 2, IndexType::Exact).await.unwrap();
    h.engine.delete_index("drop").await.unwrap();

    let restarted = h.restarted_engine();
    let report = restarted.load_all().await.unwrap();
    assert_eq!(report.restored.len(), 1);
    assert_eq!(report.restored[0].name, "keep");
}

// ─── Properties ───

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_results_ascending_and_bounded(
        n in 1usize..60,
        k in 1usize..20,
        seed in any::<u64>(),
    ) {
        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        rt.block_on(async {
            let h = TestHarness::new().await;
            h.engine.create_index("prop", 6, IndexType::Exact).await.unwrap();
            h.engine
                .add_vectors("prop", random_vectors_seeded(n, 6, seed), None, None)
                .await
                .unwrap();

            let query = random_vectors_seeded(1, 6, seed.wrapping_add(1)).remove(0);
            let results = h.engine.search("prop", &query, k).await.unwrap();
            assert_eq!(results.len(), k.min(n));
            assert_ascending(&results);
        });
    }
}
