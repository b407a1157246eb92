use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use file_registry::api::create_router;
use file_registry::blob_store::LocalBlobStore;
use file_registry::config::{ApiFlavor, Config, PublisherConfig};
use file_registry::metadata_store::RedbMetadataStore;
use file_registry::publisher::MemoryPublisher;
use file_registry::registry::FileRegistry;
use file_registry::AppState;

const BOUNDARY: &str = "test-boundary";

fn test_app(dir: &tempfile::TempDir, flavor: ApiFlavor) -> (Router, Arc<MemoryPublisher>) {
    test_app_with_limit(dir, flavor, 10 * 1024 * 1024)
}

fn test_app_with_limit(
    dir: &tempfile::TempDir,
    flavor: ApiFlavor,
    max_upload_size: u64,
) -> (Router, Arc<MemoryPublisher>) {
    let config = Config {
        bind_address: "127.0.0.1:0".to_string(),
        data_dir: dir.path().join("data").to_string_lossy().to_string(),
        blob_storage_path: dir.path().join("blobs").to_string_lossy().to_string(),
        api_flavor: flavor,
        flat_local_names: false,
        publisher: PublisherConfig::default(),
        test_mode: true,
        max_upload_size,
    };

    let blob_store = Arc::new(LocalBlobStore::new(&config.blob_storage_path).unwrap());
    let metadata_store = Arc::new(RedbMetadataStore::open(&config.data_dir).unwrap());
    let publisher = Arc::new(MemoryPublisher::new());

    let registry = FileRegistry::new(
        blob_store.clone(),
        metadata_store.clone(),
        publisher.clone(),
        config.publisher.topic.clone(),
    );

    let state = Arc::new(AppState {
        config,
        registry,
        blob_store,
        metadata_store,
        publisher: publisher.clone(),
    });

    (create_router(state), publisher)
}

fn multipart_body(files: &[(&str, &[u8])], created_by: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, data) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; \
                 filename=\"{name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    if let Some(creator) = created_by {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; \
                 name=\"created_by\"\r\n\r\n{creator}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(resp: Response) -> Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn upload(app: &Router, name: &str, content: &[u8], created_by: Option<&str>) -> String {
    let body = multipart_body(&[(name, content)], created_by);
    let resp = app
        .clone()
        .oneshot(multipart_request("/files", body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let json = body_json(resp).await;
    json["data"]["id"].as_str().unwrap().to_string()
}

// ============================================================================
// REST API
// ============================================================================

#[tokio::test]
async fn test_upload_and_get_by_id() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _publisher) = test_app(&dir, ApiFlavor::Rest);

    let id = upload(&app, "report.pdf", b"content", Some("alice")).await;

    let resp = app.clone().oneshot(get(&format!("/files/{id}"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["status"], "success");
    assert_eq!(json["data"]["name"], "report.pdf");
    assert_eq!(json["data"]["created_by"], "alice");
}

#[tokio::test]
async fn test_upload_defaults_creator_to_anonymous() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _publisher) = test_app(&dir, ApiFlavor::Rest);

    let id = upload(&app, "anon.txt", b"data", None).await;

    let resp = app.clone().oneshot(get(&format!("/files/{id}"))).await.unwrap();
    let json = body_json(resp).await;
    assert_eq!(json["data"]["created_by"], "Anonymous");
}

#[tokio::test]
async fn test_upload_existing_name_returns_same_id() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _publisher) = test_app(&dir, ApiFlavor::Rest);

    let first = upload(&app, "dup.txt", b"one", Some("alice")).await;
    let second = upload(&app, "dup.txt", b"two", Some("bob")).await;
    assert_eq!(first, second);

    let resp = app.clone().oneshot(get("/files")).await.unwrap();
    let json = body_json(resp).await;
    assert_eq!(json["data"]["pagination"]["total"], 1);
}

#[tokio::test]
async fn test_upload_without_file_part_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _publisher) = test_app(&dir, ApiFlavor::Rest);

    let body = multipart_body(&[], Some("alice"));
    let resp = app
        .clone()
        .oneshot(multipart_request("/files", body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_traversal_filename_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _publisher) = test_app(&dir, ApiFlavor::Rest);

    for name in ["../evil.txt", "nested/evil.txt", "..", "a\\b.txt"] {
        let body = multipart_body(&[(name, b"data")], Some("alice"));
        let resp = app
            .clone()
            .oneshot(multipart_request("/files", body))
            .await
            .unwrap();
        assert_eq!(
            resp.status(),
            StatusCode::BAD_REQUEST,
            "filename {name:?} should be rejected"
        );
    }

    // Nothing escaped the blob directory
    assert!(!dir.path().join("evil.txt").exists());
}

#[tokio::test]
async fn test_upload_over_size_limit_is_413() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _publisher) = test_app_with_limit(&dir, ApiFlavor::Rest, 1024);

    let data = vec![b'x'; 2048];
    let body = multipart_body(&[("big.bin", &data)], None);
    let resp = app
        .clone()
        .oneshot(multipart_request("/files", body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let json = body_json(resp).await;
    assert_eq!(json["status"], "fail");

    // Under the limit still goes through
    let small = vec![b'x'; 512];
    let body = multipart_body(&[("small.bin", &small)], None);
    let resp = app
        .clone()
        .oneshot(multipart_request("/files", body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_get_missing_id_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _publisher) = test_app(&dir, ApiFlavor::Rest);

    let resp = app.clone().oneshot(get("/files/no-such-id")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let json = body_json(resp).await;
    assert_eq!(json["status"], "fail");
}

#[tokio::test]
async fn test_get_by_name() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _publisher) = test_app(&dir, ApiFlavor::Rest);

    let id = upload(&app, "named.txt", b"data", Some("alice")).await;

    let resp = app
        .clone()
        .oneshot(get("/files/by-name/named.txt"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["data"]["id"], id.as_str());
}

#[tokio::test]
async fn test_get_by_name_miss_is_null_not_error() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _publisher) = test_app(&dir, ApiFlavor::Rest);

    let resp = app
        .clone()
        .oneshot(get("/files/by-name/never-added.txt"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["status"], "success");
    assert!(json["data"].is_null());
}

#[tokio::test]
async fn test_get_by_creator() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _publisher) = test_app(&dir, ApiFlavor::Rest);

    upload(&app, "a.txt", b"a", Some("alice")).await;
    upload(&app, "b.txt", b"b", Some("alice")).await;
    upload(&app, "c.txt", b"c", Some("bob")).await;

    let resp = app
        .clone()
        .oneshot(get("/files/by-creator/alice"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    let items = json["data"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    // Newest first
    assert_eq!(items[0]["name"], "b.txt");
    assert_eq!(items[1]["name"], "a.txt");
}

#[tokio::test]
async fn test_batch_upload_counts_all_skips_empty() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _publisher) = test_app(&dir, ApiFlavor::Rest);

    let body = multipart_body(
        &[
            ("ten.txt", &[b'x'; 10][..]),
            ("zero.txt", &[][..]),
            ("twenty.txt", &[b'y'; 20][..]),
        ],
        Some("alice"),
    );
    let resp = app
        .clone()
        .oneshot(multipart_request("/files/batch", body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    // Totals cover every submitted file, including the skipped empty one
    assert_eq!(json["data"]["count"], 3);
    assert_eq!(json["data"]["size"], 30);

    // Only the two non-empty files got records
    let resp = app.clone().oneshot(get("/files")).await.unwrap();
    let json = body_json(resp).await;
    assert_eq!(json["data"]["pagination"]["total"], 2);
}

#[tokio::test]
async fn test_batch_upload_empty_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _publisher) = test_app(&dir, ApiFlavor::Rest);

    let body = multipart_body(&[], None);
    let resp = app
        .clone()
        .oneshot(multipart_request("/files/batch", body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_then_get_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _publisher) = test_app(&dir, ApiFlavor::Rest);

    let id = upload(&app, "temp.txt", b"x", None).await;

    let resp = app
        .clone()
        .oneshot(delete(&format!("/files/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app.clone().oneshot(get(&format!("/files/{id}"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_missing_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _publisher) = test_app(&dir, ApiFlavor::Rest);

    let resp = app.clone().oneshot(delete("/files/no-such-id")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_pagination() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _publisher) = test_app(&dir, ApiFlavor::Rest);

    for i in 0..5 {
        upload(&app, &format!("file-{i}.txt"), b"data", None).await;
    }

    let resp = app.clone().oneshot(get("/files?limit=2&offset=1")).await.unwrap();
    let json = body_json(resp).await;
    assert_eq!(json["data"]["items"].as_array().unwrap().len(), 2);
    assert_eq!(json["data"]["pagination"]["total"], 5);

    let resp = app.clone().oneshot(get("/files?limit=0")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_purge() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _publisher) = test_app(&dir, ApiFlavor::Rest);

    upload(&app, "a.txt", b"a", None).await;
    upload(&app, "b.txt", b"b", None).await;

    let resp = app.clone().oneshot(delete("/admin/purge")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["data"]["records_deleted"], 2);
}

#[tokio::test]
async fn test_health() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _publisher) = test_app(&dir, ApiFlavor::Rest);

    let resp = app.clone().oneshot(get("/_internal/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["data"]["status"], "ok");
}

// ============================================================================
// Flat API
// ============================================================================

#[tokio::test]
async fn test_flat_add_get_delete() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _publisher) = test_app(&dir, ApiFlavor::Flat);

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/addfile")
                .body(Body::from("hello flat"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let json = body_json(resp).await;
    let id = json["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(json["data"]["content"], "hello flat");

    let resp = app.clone().oneshot(get(&format!("/files/{id}"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["data"]["content"], "hello flat");

    let resp = app.clone().oneshot(get("/listfiles")).await.unwrap();
    let json = body_json(resp).await;
    let keys: Vec<String> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();
    assert!(keys.contains(&id));

    let resp = app
        .clone()
        .oneshot(delete(&format!("/files/{id}?is_local=true")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app.clone().oneshot(get(&format!("/files/{id}"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_flat_get_miss_publishes_event() {
    let dir = tempfile::tempdir().unwrap();
    let (app, publisher) = test_app(&dir, ApiFlavor::Flat);

    let resp = app.clone().oneshot(get("/files/missing-id")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let events = publisher.events();
    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0].1.message,
        "Could not locate file with id: missing-id"
    );
}
