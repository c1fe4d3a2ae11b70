//! Integration tests for the harvester
//!
//! These tests use wiremock to create mock catalog APIs and run whole
//! harvests against a temporary output directory.

use catalog_harvest::config::{
    Config, DuplicatePolicy, FetcherConfig, MergeOrder, OutputConfig, SourceConfig,
};
use catalog_harvest::harvest::{page_url, Coordinator, PageFetcher};
use catalog_harvest::HarvestError;
use serde_json::{json, Value};
use std::path::Path;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_test_config(dir: &Path, sources: Vec<SourceConfig>) -> Config {
    Config {
        fetcher: FetcherConfig {
            user_agent: "snipe-x/1.0".to_string(),
            timeout_secs: 5,
            max_attempts: 2,
            retry_base_delay_ms: 10,
            page_delay_ms: 0,
        },
        output: OutputConfig {
            directory: dir.to_string_lossy().into_owned(),
            merge_order: MergeOrder::NewestFirst,
            skip_unchanged: false,
        },
        sources,
    }
}

fn source(name: &str, base_url: String, output_file: &str, policy: DuplicatePolicy) -> SourceConfig {
    SourceConfig {
        name: name.to_string(),
        base_url,
        output_file: output_file.to_string(),
        duplicate_policy: policy,
        max_pages: None,
    }
}

fn page(ids: &[i64], next: Option<&str>) -> ResponseTemplate {
    let data: Vec<Value> = ids
        .iter()
        .map(|id| json!({"id": id, "name": format!("item-{}", id), "creatorName": "Roblox", "price": 10}))
        .collect();
    ResponseTemplate::new(200).set_body_json(json!({
        "keyword": null,
        "previousPageCursor": null,
        "nextPageCursor": next,
        "data": data,
    }))
}

fn read_file(dir: &Path, name: &str) -> Value {
    let raw = std::fs::read_to_string(dir.join(name)).expect("output file missing");
    serde_json::from_str(&raw).expect("output file is not JSON")
}

fn data_ids(file: &Value) -> Vec<i64> {
    file["data"]
        .as_array()
        .expect("data is not an array")
        .iter()
        .map(|item| item["id"].as_i64().unwrap())
        .collect()
}

fn assert_collection_invariants(file: &Value) {
    let ids = data_ids(file);
    let mut unique = ids.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(unique.len(), ids.len(), "repeated ids in {:?}", ids);
    assert_eq!(file["totalItems"].as_u64().unwrap() as usize, ids.len());
    assert!(file["keyword"].is_null());
    assert!(file["lastUpdate"].is_string());
}

#[tokio::test]
async fn test_stop_at_known_ends_walk() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    std::fs::write(
        dir.path().join("emotes.json"),
        json!({
            "keyword": null,
            "totalItems": 3,
            "lastUpdate": "2024-01-01T00:00:00Z",
            "data": [{"id": 7, "name": "a"}, {"id": 8, "name": "b"}, {"id": 9, "name": "c"}]
        })
        .to_string(),
    )
    .unwrap();

    Mock::given(method("GET"))
        .and(path("/v1/items"))
        .and(query_param("Cursor", "c3"))
        .respond_with(page(&[1, 2], None))
        .expect(0)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/items"))
        .and(query_param("Cursor", "c2"))
        .respond_with(page(&[12, 7, 8, 9], Some("c3")))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/items"))
        .respond_with(page(&[20, 21], Some("c2")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(
        dir.path(),
        vec![source(
            "emotes",
            format!("{}/v1/items?Limit=30", mock_server.uri()),
            "emotes.json",
            DuplicatePolicy::StopAtKnown,
        )],
    );

    let report = Coordinator::new(config).unwrap().run().await;
    assert!(report.success());

    let file_report = &report.files[0];
    assert_eq!(file_report.existing_items, 3);
    assert_eq!(file_report.new_items, 3);
    assert_eq!(file_report.duplicates, 1);
    assert_eq!(file_report.sources[0].pages_fetched, 2);
    assert!(file_report.sources[0].stopped_at_known);

    let file = read_file(dir.path(), "emotes.json");
    assert_collection_invariants(&file);
    assert_eq!(data_ids(&file), vec![20, 21, 12, 7, 8, 9]);

    mock_server.verify().await;
}

#[tokio::test]
async fn test_exhaustive_sources_share_known_ids() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(page(&[5, 6], None))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/b"))
        .and(query_param("Cursor", "b2"))
        .respond_with(page(&[6, 8], None))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(page(&[5, 7], Some("b2")))
        .mount(&mock_server)
        .await;

    let config = create_test_config(
        dir.path(),
        vec![
            source("a", format!("{}/a", mock_server.uri()), "shared.json", DuplicatePolicy::Exhaustive),
            source("b", format!("{}/b", mock_server.uri()), "shared.json", DuplicatePolicy::Exhaustive),
        ],
    );

    let report = Coordinator::new(config).unwrap().run().await;
    assert!(report.success());
    assert_eq!(report.files.len(), 1);

    let file_report = &report.files[0];
    assert_eq!(file_report.sources[0].new_items, 2);
    assert_eq!(file_report.sources[1].new_items, 2);
    assert_eq!(file_report.sources[1].duplicates, 2);
    assert_eq!(file_report.sources[1].pages_fetched, 2);
    assert_eq!(file_report.total_items, 4);

    let file = read_file(dir.path(), "shared.json");
    assert_collection_invariants(&file);
    let mut ids = data_ids(&file);
    ids.sort_unstable();
    assert_eq!(ids, vec![5, 6, 7, 8]);
}

#[tokio::test]
async fn test_second_run_adds_nothing() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/v1/items"))
        .and(query_param("Cursor", "c2"))
        .respond_with(page(&[3, 4], None))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/items"))
        .respond_with(page(&[1, 2], Some("c2")))
        .mount(&mock_server)
        .await;

    let config = create_test_config(
        dir.path(),
        vec![source(
            "items",
            format!("{}/v1/items", mock_server.uri()),
            "items.json",
            DuplicatePolicy::Exhaustive,
        )],
    );

    let first = Coordinator::new(config.clone()).unwrap().run().await;
    assert_eq!(first.total_new_items(), 4);
    let after_first = read_file(dir.path(), "items.json");

    let second = Coordinator::new(config).unwrap().run().await;
    assert!(second.success());
    assert_eq!(second.total_new_items(), 0);
    assert_eq!(second.total_duplicates(), 4);
    let after_second = read_file(dir.path(), "items.json");

    assert_collection_invariants(&after_second);
    assert_eq!(after_first["data"], after_second["data"]);
}

#[tokio::test]
async fn test_bundled_items_are_persisted() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/bundles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "nextPageCursor": null,
            "data": [
                {
                    "id": 100,
                    "name": "Knight Pack",
                    "bundledItems": [
                        {"id": 1, "type": "Face"},
                        {"id": 2, "type": "UserOutfit"},
                        {"id": 3, "type": "Hat"}
                    ]
                },
                {"id": 101, "name": "Plain", "price": null}
            ]
        })))
        .mount(&mock_server)
        .await;

    let config = create_test_config(
        dir.path(),
        vec![source(
            "bundles",
            format!("{}/bundles", mock_server.uri()),
            "bundles.json",
            DuplicatePolicy::Exhaustive,
        )],
    );

    let report = Coordinator::new(config).unwrap().run().await;
    assert!(report.success());

    let file = read_file(dir.path(), "bundles.json");
    assert_eq!(file["data"][0]["bundledItems"], json!({"1": [1], "3": [3]}));
    assert!(file["data"][1].get("bundledItems").is_none());
    assert!(file["data"][1].get("creator").is_none());
}

#[tokio::test]
async fn test_retry_exhaustion_follows_backoff() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/items"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;

    let fetcher = PageFetcher::with_client(reqwest::Client::new(), 3, Duration::from_millis(50));
    let url = page_url(&format!("{}/v1/items", mock_server.uri()), None).unwrap();

    let start = Instant::now();
    let result = fetcher.fetch_page(&url).await;
    let elapsed = start.elapsed();

    match result {
        Err(HarvestError::Network { attempts, cause, .. }) => {
            assert_eq!(attempts, 3);
            assert!(cause.contains("500"), "unexpected cause: {}", cause);
        }
        other => panic!("expected a network error, got {:?}", other),
    }

    // 50ms after the first failure, 100ms after the second
    assert!(elapsed >= Duration::from_millis(150), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(5), "elapsed {:?}", elapsed);

    mock_server.verify().await;
}

#[tokio::test]
async fn test_slow_response_times_out_and_retries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/items"))
        .respond_with(page(&[1], None).set_delay(Duration::from_millis(500)))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();
    let fetcher = PageFetcher::with_client(client, 2, Duration::from_millis(10));
    let url = page_url(&format!("{}/v1/items", mock_server.uri()), None).unwrap();

    match fetcher.fetch_page(&url).await {
        Err(HarvestError::Network { attempts, cause, .. }) => {
            assert_eq!(attempts, 2);
            assert!(cause.contains("timed out"), "unexpected cause: {}", cause);
        }
        other => panic!("expected a network error, got {:?}", other),
    }

    mock_server.verify().await;
}

#[tokio::test]
async fn test_transient_failure_recovers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/items"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/items"))
        .respond_with(page(&[1], None))
        .mount(&mock_server)
        .await;

    let fetcher = PageFetcher::with_client(reqwest::Client::new(), 3, Duration::from_millis(10));
    let url = page_url(&format!("{}/v1/items", mock_server.uri()), None).unwrap();

    let page = fetcher.fetch_page(&url).await.expect("fetch should recover");
    assert_eq!(page.entries().len(), 1);

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn test_malformed_body_is_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/items"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let fetcher = PageFetcher::with_client(reqwest::Client::new(), 2, Duration::from_millis(10));
    let url = page_url(&format!("{}/v1/items", mock_server.uri()), None).unwrap();

    let result = fetcher.fetch_page(&url).await;
    assert!(matches!(result, Err(HarvestError::Network { attempts: 2, .. })));

    mock_server.verify().await;
}

#[tokio::test]
async fn test_source_failure_keeps_partial_results() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/v1/items"))
        .and(query_param("Cursor", "c2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/items"))
        .respond_with(page(&[1, 2], Some("c2")))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/healthy"))
        .respond_with(page(&[3], None))
        .mount(&mock_server)
        .await;

    let config = create_test_config(
        dir.path(),
        vec![
            source("flaky", format!("{}/v1/items", mock_server.uri()), "items.json", DuplicatePolicy::Exhaustive),
            source("healthy", format!("{}/healthy", mock_server.uri()), "items.json", DuplicatePolicy::Exhaustive),
        ],
    );

    let report = Coordinator::new(config).unwrap().run().await;
    assert!(report.success());

    let file_report = &report.files[0];
    assert!(file_report.sources[0].error.is_some());
    assert_eq!(file_report.sources[0].new_items, 2);
    assert!(file_report.sources[1].error.is_none());
    assert_eq!(file_report.failed_sources().count(), 1);

    let file = read_file(dir.path(), "items.json");
    assert_collection_invariants(&file);
    let mut ids = data_ids(&file);
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_write_failure_fails_run_but_not_other_files() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    std::fs::create_dir(dir.path().join("blocked.json")).unwrap();

    Mock::given(method("GET"))
        .and(path("/v1/items"))
        .respond_with(page(&[1, 2], None))
        .mount(&mock_server)
        .await;

    let base = format!("{}/v1/items", mock_server.uri());
    let config = create_test_config(
        dir.path(),
        vec![
            source("blocked", base.clone(), "blocked.json", DuplicatePolicy::Exhaustive),
            source("fine", base, "fine.json", DuplicatePolicy::Exhaustive),
        ],
    );

    let report = Coordinator::new(config).unwrap().run().await;
    assert!(!report.success());
    assert_eq!(report.failed_files().count(), 1);
    assert!(!report.files[0].saved);
    assert!(report.files[1].saved);

    let file = read_file(dir.path(), "fine.json");
    assert_eq!(data_ids(&file), vec![1, 2]);
}

#[tokio::test]
async fn test_corrupt_existing_file_starts_fresh() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("items.json"), "{ definitely not json").unwrap();

    Mock::given(method("GET"))
        .and(path("/v1/items"))
        .respond_with(page(&[4], None))
        .mount(&mock_server)
        .await;

    let config = create_test_config(
        dir.path(),
        vec![source(
            "items",
            format!("{}/v1/items", mock_server.uri()),
            "items.json",
            DuplicatePolicy::StopAtKnown,
        )],
    );

    let report = Coordinator::new(config).unwrap().run().await;
    assert!(report.success());
    assert_eq!(report.files[0].existing_items, 0);

    let file = read_file(dir.path(), "items.json");
    assert_collection_invariants(&file);
    assert_eq!(data_ids(&file), vec![4]);
}

#[tokio::test]
async fn test_skip_unchanged_leaves_file_alone() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let original = r#"[{"id": 1, "name": "item-1"}]"#;
    std::fs::write(dir.path().join("items.json"), original).unwrap();

    Mock::given(method("GET"))
        .and(path("/v1/items"))
        .respond_with(page(&[1], None))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(
        dir.path(),
        vec![source(
            "items",
            format!("{}/v1/items", mock_server.uri()),
            "items.json",
            DuplicatePolicy::StopAtKnown,
        )],
    );
    config.output.skip_unchanged = true;

    let report = Coordinator::new(config).unwrap().run().await;
    assert!(report.success());
    assert_eq!(report.files[0].new_items, 0);
    assert_eq!(report.files[0].total_items, 1);

    let raw = std::fs::read_to_string(dir.path().join("items.json")).unwrap();
    assert_eq!(raw, original);
}

#[tokio::test]
async fn test_max_pages_and_user_agent() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/v1/items"))
        .and(query_param("Cursor", "c2"))
        .respond_with(page(&[3], None))
        .expect(0)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/items"))
        .and(header("user-agent", "snipe-x/1.0"))
        .respond_with(page(&[1, 2], Some("c2")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut limited = source(
        "items",
        format!("{}/v1/items", mock_server.uri()),
        "items.json",
        DuplicatePolicy::Exhaustive,
    );
    limited.max_pages = Some(1);
    let config = create_test_config(dir.path(), vec![limited]);

    let report = Coordinator::new(config).unwrap().run().await;
    assert!(report.success());
    assert_eq!(report.files[0].sources[0].pages_fetched, 1);
    assert_eq!(report.total_new_items(), 2);

    mock_server.verify().await;
}
