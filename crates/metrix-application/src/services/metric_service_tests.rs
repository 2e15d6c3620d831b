//! Unit tests for MetricService
//!
//! These tests use shared mock repositories from metrix-testing crate.

use super::MetricService;
use crate::Error;
use futures::future::join_all;
use metrix_core::{Context, Error as CoreError, Metric, MetricType, NotFoundError};
use metrix_storage::InMemoryRepository;
use metrix_testing::{fixtures, proptest_config, MockMetricRepository};
use proptest::prelude::*;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

fn service_with(repo: Arc<MockMetricRepository>) -> MetricService {
    MetricService::new(repo)
}

// ==================== Push ====================

#[tokio::test]
async fn test_counter_accumulates_across_pushes() {
    let repo = Arc::new(MockMetricRepository::new());
    let service = service_with(repo.clone());
    let ctx = Context::background();

    let stored = service.push(&ctx, Metric::counter("requests", 5)).await.unwrap();
    assert_eq!(stored, Metric::counter("requests", 5));

    let stored = service.push(&ctx, Metric::counter("requests", 3)).await.unwrap();
    assert_eq!(stored, Metric::counter("requests", 8));
    assert_eq!(
        repo.get(MetricType::Counter, "requests"),
        Some(Metric::counter("requests", 8))
    );
}

#[tokio::test]
async fn test_gauge_overwrites() {
    let repo = Arc::new(MockMetricRepository::new());
    let service = service_with(repo.clone());
    let ctx = Context::background();

    service.push(&ctx, Metric::gauge("temp", 36.6)).await.unwrap();
    let stored = service.push(&ctx, Metric::gauge("temp", 12.5)).await.unwrap();

    assert_eq!(stored, Metric::gauge("temp", 12.5));
    assert_eq!(repo.get(MetricType::Gauge, "temp"), Some(Metric::gauge("temp", 12.5)));
    // Gauges never need the stored value
    assert_eq!(repo.find_calls(), 0);
}

#[tokio::test]
async fn test_repeated_counter_in_one_batch_adds_stored_value_once() {
    let repo = Arc::new(MockMetricRepository::with_metrics([Metric::counter("hits", 10)]));
    let service = service_with(repo.clone());

    let stored = service
        .push_batch(
            &Context::background(),
            vec![
                Metric::counter("hits", 1),
                Metric::gauge("temp", 1.0),
                Metric::counter("hits", 2),
                Metric::gauge("temp", 36.6),
            ],
        )
        .await
        .unwrap();

    assert_eq!(
        stored,
        vec![Metric::counter("hits", 13), Metric::gauge("temp", 36.6)]
    );
    assert_eq!(repo.update_batch_calls(), 1);
    assert_eq!(repo.applied_batches(), vec![stored]);
}

#[tokio::test]
async fn test_empty_batch_is_noop() {
    let repo = Arc::new(MockMetricRepository::new());
    let service = service_with(repo.clone());

    let stored = service.push_batch(&Context::background(), Vec::new()).await.unwrap();
    assert!(stored.is_empty());
    assert_eq!(repo.update_batch_calls(), 0);
}

#[tokio::test]
async fn test_invalid_entry_aborts_whole_batch() {
    let repo = Arc::new(MockMetricRepository::with_metrics(fixtures::sample_batch()));
    let service = service_with(repo.clone());
    let before = repo.snapshot();

    let err = service
        .push_batch(
            &Context::background(),
            vec![Metric::counter("requests", 1), Metric::gauge("", 2.0)],
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Core(CoreError::Validation(_))));
    assert_eq!(repo.snapshot(), before);
    assert_eq!(repo.find_calls(), 0);
    assert_eq!(repo.update_batch_calls(), 0);
}

#[tokio::test]
async fn test_non_finite_gauge_rejected() {
    let repo = Arc::new(MockMetricRepository::new());
    let service = service_with(repo.clone());

    let err = service
        .push(&Context::background(), fixtures::unstorable_metric("temp"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), metrix_core::ErrorCode::MetricInvalid);
    assert_eq!(repo.count(), 0);
}

#[tokio::test]
async fn test_counter_lookup_failure_aborts_without_write() {
    let repo = Arc::new(MockMetricRepository::with_metrics([Metric::gauge("temp", 1.0)]));
    repo.fail_find(CoreError::Database("connection reset".to_string()));
    let service = service_with(repo.clone());

    let err = service
        .push_batch(
            &Context::background(),
            vec![Metric::gauge("temp", 2.0), Metric::counter("requests", 1)],
        )
        .await
        .unwrap_err();

    match &err {
        Error::Operation { context, source } => {
            assert_eq!(context, "failed to prepare counter requests");
            assert_eq!(source, &CoreError::Database("connection reset".to_string()));
        }
        other => panic!("expected Operation, got {:?}", other),
    }
    assert!(!err.is_not_found());
    assert_eq!(repo.update_batch_calls(), 0);
    assert_eq!(repo.get(MetricType::Gauge, "temp"), Some(Metric::gauge("temp", 1.0)));
}

#[tokio::test]
async fn test_persist_failure_leaves_state() {
    let repo = Arc::new(MockMetricRepository::with_metrics([Metric::counter("requests", 4)]));
    repo.fail_update_batch(CoreError::Transaction("rolled back".to_string()));
    let service = service_with(repo.clone());

    let err = service
        .push(&Context::background(), Metric::counter("requests", 1))
        .await
        .unwrap_err();

    assert_eq!(err.code(), metrix_core::ErrorCode::TransactionFailed);
    assert_eq!(
        repo.get(MetricType::Counter, "requests"),
        Some(Metric::counter("requests", 4))
    );

    // The next push starts from the untouched value
    repo.clear_failures();
    let stored = service
        .push(&Context::background(), Metric::counter("requests", 1))
        .await
        .unwrap();
    assert_eq!(stored, Metric::counter("requests", 5));
}

#[tokio::test]
async fn test_counter_overflow_is_conversion_error() {
    let repo = Arc::new(MockMetricRepository::with_metrics([Metric::counter("big", i64::MAX)]));
    let service = service_with(repo.clone());

    let err = service
        .push(&Context::background(), Metric::counter("big", 1))
        .await
        .unwrap_err();
    assert_eq!(err.code(), metrix_core::ErrorCode::MetricConversion);
    assert_eq!(repo.update_batch_calls(), 0);
}

#[tokio::test]
async fn test_overflowing_duplicates_in_one_batch_are_rejected() {
    let repo = Arc::new(MockMetricRepository::with_metrics([Metric::gauge("temp", 1.0)]));
    let service = service_with(repo.clone());
    let before = repo.snapshot();

    let err = service
        .push_batch(
            &Context::background(),
            vec![Metric::counter("x", i64::MAX), Metric::counter("x", 1)],
        )
        .await
        .unwrap_err();

    assert_eq!(err.code(), metrix_core::ErrorCode::MetricConversion);
    assert!(matches!(err.core(), Some(CoreError::Conversion(_))));
    assert_eq!(repo.snapshot(), before);
    assert_eq!(repo.get(MetricType::Counter, "x"), None);
    assert_eq!(repo.find_calls(), 0);
    assert_eq!(repo.update_batch_calls(), 0);
}

#[tokio::test]
async fn test_cancelled_context_stops_push() {
    let repo = Arc::new(MockMetricRepository::new());
    let service = service_with(repo.clone());
    let ctx = Context::background();
    ctx.cancel();

    let err = service.push(&ctx, Metric::counter("requests", 1)).await.unwrap_err();
    assert_eq!(err.code(), metrix_core::ErrorCode::Cancelled);
    assert_eq!(repo.count(), 0);
}

// ==================== Records ====================

#[tokio::test]
async fn test_push_records_converts_boundary_values() {
    let repo = Arc::new(MockMetricRepository::new());
    let service = service_with(repo.clone());

    let stored = service
        .push_records(
            &Context::background(),
            vec![
                fixtures::record("requests", "counter", json!(2)),
                fixtures::record("temp", "gauge", json!(36.6)),
                fixtures::record("requests", "counter", json!(3.9)),
            ],
        )
        .await
        .unwrap();

    assert_eq!(
        stored,
        vec![Metric::counter("requests", 5), Metric::gauge("temp", 36.6)]
    );
}

#[tokio::test]
async fn test_push_records_rejects_bad_records() {
    let repo = Arc::new(MockMetricRepository::new());
    let service = service_with(repo.clone());
    let ctx = Context::background();

    let err = service
        .push_records(
            &ctx,
            vec![
                fixtures::record("requests", "counter", json!(1)),
                fixtures::record("temp", "gauge", json!("hot")),
            ],
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), metrix_core::ErrorCode::MetricConversion);
    assert!(err.to_string().starts_with("record 1"));

    let err = service
        .push_records(&ctx, vec![fixtures::record("load", "histogram", json!(1))])
        .await
        .unwrap_err();
    assert_eq!(err.code(), metrix_core::ErrorCode::MetricInvalid);

    assert_eq!(repo.update_batch_calls(), 0);
}

// ==================== Pull ====================

#[tokio::test]
async fn test_pull_missing_is_service_not_found() {
    let service = service_with(Arc::new(MockMetricRepository::new()));

    let err = service
        .pull(&Context::background(), MetricType::Gauge, "absent")
        .await
        .unwrap_err();

    match err {
        Error::MetricNotFound(ref key) => {
            assert_eq!(key.metric_type, MetricType::Gauge);
            assert_eq!(key.name, "absent");
        }
        ref other => panic!("expected MetricNotFound, got {:?}", other),
    }
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_pull_other_errors_keep_their_code() {
    let repo = Arc::new(MockMetricRepository::new());
    repo.fail_find(CoreError::Connection("refused".to_string()));
    let service = service_with(repo);

    let err = service
        .pull(&Context::background(), MetricType::Counter, "requests")
        .await
        .unwrap_err();
    assert!(!err.is_not_found());
    assert_eq!(err.code(), metrix_core::ErrorCode::ConnectionFailed);
}

#[tokio::test]
async fn test_pull_all_returns_latest_values() {
    let repo = Arc::new(MockMetricRepository::new());
    let service = service_with(repo);
    let ctx = Context::background();

    service.push_batch(&ctx, fixtures::sample_batch()).await.unwrap();
    service.push(&ctx, Metric::counter("requests", 5)).await.unwrap();
    service.push(&ctx, Metric::gauge("cpu_load", 0.9)).await.unwrap();

    let mut all = service.pull_all(&ctx).await.unwrap();
    all.sort_by_key(Metric::key);
    assert_eq!(
        all,
        vec![
            Metric::counter("errors", 1),
            Metric::counter("requests", 10),
            Metric::gauge("cpu_load", 0.9),
        ]
    );
    service.check_connection(&ctx).await.unwrap();
}

// ==================== Concurrency ====================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_counter_pushes_lose_nothing() {
    let service = MetricService::new(Arc::new(InMemoryRepository::new()));

    let mut handles = Vec::new();
    for _ in 0..16 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            let ctx = Context::background();
            for _ in 0..10 {
                service.push(&ctx, Metric::counter("hits", 1)).await.unwrap();
            }
        }));
    }
    for result in join_all(handles).await {
        result.unwrap();
    }

    let stored = service
        .pull(&Context::background(), MetricType::Counter, "hits")
        .await
        .unwrap();
    assert_eq!(stored, Metric::counter("hits", 160));
}

// ==================== Properties ====================

proptest! {
    #![proptest_config(proptest_config::ci_config())]

    /// Counters end at the sum of every delta, gauges at the last value pushed
    #[test]
    fn proptest_push_semantics(batches in prop::collection::vec(fixtures::arb_batch(8), 1..6)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let service = MetricService::new(Arc::new(InMemoryRepository::new()));
        let ctx = Context::background();
        let mut expected: HashMap<(MetricType, String), Metric> = HashMap::new();

        for batch in &batches {
            runtime.block_on(service.push_batch(&ctx, batch.clone())).unwrap();
            for metric in batch {
                let key = (metric.metric_type(), metric.name.clone());
                let next = match (expected.get(&key), metric) {
                    (Some(Metric { value: metrix_core::MetricValue::Counter(v0), .. }),
                     Metric { value: metrix_core::MetricValue::Counter(d), .. }) => {
                        Metric::counter(metric.name.clone(), v0 + d)
                    }
                    _ => metric.clone(),
                };
                expected.insert(key, next);
            }
        }

        let mut all = runtime.block_on(service.pull_all(&ctx)).unwrap();
        all.sort_by_key(Metric::key);
        let mut want: Vec<Metric> = expected.into_values().collect();
        want.sort_by_key(Metric::key);
        prop_assert_eq!(all, want);
    }
}
