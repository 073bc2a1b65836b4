mod support;

use std::collections::HashSet;
use std::sync::Arc;

use crudgate::application::query::QueryParams;
use crudgate::domain::catalog::PHYSICAL_THINGS;
use metrics_util::debugging::DebuggingRecorder;

use support::{BrokenCache, FakeStorage, memory_cache, pump_row, read_service};

#[tokio::test]
async fn cache_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    let storage = Arc::new(FakeStorage::with_rows(vec![pump_row("pump-1")]));
    let params = QueryParams::parse("name__eq=pump-1");

    // miss then hit
    let reads = read_service(storage.clone(), memory_cache());
    reads.list(PHYSICAL_THINGS, &params).await.expect("first read");
    reads.list(PHYSICAL_THINGS, &params).await.expect("second read");

    // store failures on both get and set
    let broken = read_service(storage, Arc::new(BrokenCache));
    broken.list(PHYSICAL_THINGS, &params).await.expect("fail-open read");

    let snapshot = snapshotter.snapshot().into_vec();
    let names: HashSet<String> = snapshot
        .iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    for metric in [
        "crudgate_cache_hit_total",
        "crudgate_cache_miss_total",
        "crudgate_cache_error_total",
        "crudgate_storage_select_ms",
    ] {
        assert!(names.contains(metric), "missing metric: {metric}");
    }

    let error_ops: HashSet<String> = snapshot
        .iter()
        .filter(|(composite_key, _, _, _)| {
            composite_key.key().name() == "crudgate_cache_error_total"
        })
        .flat_map(|(composite_key, _, _, _)| {
            composite_key
                .key()
                .labels()
                .filter(|label| label.key() == "op")
                .map(|label| label.value().to_string())
                .collect::<Vec<_>>()
        })
        .collect();
    assert_eq!(
        error_ops,
        HashSet::from(["get".to_string(), "set".to_string()])
    );
}
