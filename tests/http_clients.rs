//! Backend clients against an in-process HTTP server.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use survey_scope::config::SurveyConfig;
use survey_scope::data::model::{FeedOrigin, TransmissionMode};
use survey_scope::error::SurveyError;
use survey_scope::remote::feed::{fetch_feed, load_detection_feed};
use survey_scope::remote::{
    request_image, CatalogClient, ImageCache, ImageKey, ImageKind, ImageTransport, ImageryClient,
};
use survey_scope::tasks::{TaskOutcome, Tasks};

const ECHO_FILE: &str = "2107RL_FM-D20210813-T080000.raw";
const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Requests seen by the mock backend.
#[derive(Debug, Default)]
struct Seen {
    echogram_query: Option<HashMap<String, String>>,
    echogram_cache_control: Option<String>,
    spectrogram_body: Option<Value>,
    image_calls: usize,
}

type Shared = Arc<Mutex<Seen>>;

async fn list_files(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let cruise = params.get("cruise").cloned().unwrap_or_default();
    Json(json!({
        "files": [
            { "filename": "2107RL_FM-D20210813-T080000.raw", "size": 2048,
              "datetime": "2021-08-13 08:05:00" },
            { "filename": "2107RL_CW-D20210812-T120000.raw", "size": 1048576,
              "url": "https://mirror.example/cw.raw", "datetime": "2021-08-12 12:10:00",
              "cruise": cruise },
        ]
    }))
}

async fn list_files_broken() -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "message": "bucket unavailable" })),
    )
}

async fn echogram(
    State(seen): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Vec<u8> {
    let mut seen = seen.lock().unwrap();
    seen.image_calls += 1;
    seen.echogram_query = Some(params);
    seen.echogram_cache_control = headers
        .get("cache-control")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    PNG_MAGIC.to_vec()
}

async fn spectrogram(State(seen): State<Shared>, Json(body): Json<Value>) -> Vec<u8> {
    let mut seen = seen.lock().unwrap();
    seen.image_calls += 1;
    seen.spectrogram_body = Some(body);
    PNG_MAGIC.to_vec()
}

async fn spectrogram_broken() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "detail": "file not found in bucket" })),
    )
}

async fn detections_csv() -> &'static str {
    "filename,timestamp,sardine_density,confidence\n\
     2107RL_FM-D20210813-T080000.raw,2021-08-13T08:00:00Z,0.8,0.9\n\
     ,2021-08-13T09:00:00Z,0.5,0.5\n"
}

fn router(seen: Shared) -> Router {
    Router::new()
        .route("/list-all-files", get(list_files))
        .route("/broken/list-all-files", get(list_files_broken))
        .route("/generate-echogram", get(echogram))
        .route("/extract-spectrogram", post(spectrogram))
        .route("/broken/extract-spectrogram", post(spectrogram_broken))
        .route("/detections.csv", get(detections_csv))
        .with_state(seen)
}

async fn serve(seen: Shared) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(seen)).await.unwrap();
    });
    format!("http://{addr}")
}

fn config_for(base: &str) -> SurveyConfig {
    SurveyConfig {
        listing_url: format!("{base}/list-all-files"),
        generation_url: format!("{base}/generate-echogram"),
        extraction_url: format!("{base}/extract-spectrogram"),
        object_store_base: "https://store.example".into(),
        request_timeout_secs: 5,
        ..SurveyConfig::default()
    }
}

#[tokio::test]
async fn catalog_is_fetched_and_normalized() {
    let base = serve(Shared::default()).await;
    let config = config_for(&base);
    let client = CatalogClient::new(config.http_client().unwrap(), config);

    let files = client.fetch_catalog("RL2107").await.unwrap();
    assert_eq!(files.len(), 2);

    // Sorted by filename: CW before FM.
    assert_eq!(files[0].filename, "2107RL_CW-D20210812-T120000.raw");
    assert_eq!(files[0].source_url, "https://mirror.example/cw.raw");
    assert_eq!(files[0].formatted_size, "1 MB");
    assert_eq!(files[0].cruise, "RL2107");

    assert_eq!(files[1].transmission_mode, TransmissionMode::Fm);
    assert_eq!(files[1].parsed_date, "2021-08-13");
    assert_eq!(files[1].parsed_time, "08:05:00");
    assert_eq!(
        files[1].source_url,
        "https://store.example/data/raw/Reuben_Lasker/RL2107/EK80/2107RL_FM-D20210813-T080000.raw"
    );
}

#[tokio::test]
async fn catalog_failure_carries_backend_message() {
    let base = serve(Shared::default()).await;
    let config = config_for(&format!("{base}/broken"));
    let client = CatalogClient::new(config.http_client().unwrap(), config);

    let err = client.fetch_catalog("RL2107").await.unwrap_err();
    assert_eq!(
        err,
        SurveyError::Backend {
            status: 500,
            message: "bucket unavailable".into()
        }
    );
}

#[tokio::test]
async fn unreachable_listing_is_a_network_error() {
    let config = config_for("http://127.0.0.1:1");
    let client = CatalogClient::new(config.http_client().unwrap(), config);
    let err = client.fetch_catalog("RL2107").await.unwrap_err();
    assert!(matches!(err, SurveyError::Network(_)), "{err:?}");
}

#[tokio::test]
async fn echogram_request_names_file_and_cruise() {
    let seen = Shared::default();
    let base = serve(seen.clone()).await;
    let config = config_for(&base);
    let client = ImageryClient::new(config.http_client().unwrap(), config);

    let bytes = client
        .fetch(&ImageKey::new(ImageKind::Echogram, ECHO_FILE, "RL2107"))
        .await
        .unwrap();
    assert_eq!(bytes, PNG_MAGIC);

    let seen = seen.lock().unwrap();
    let query = seen.echogram_query.as_ref().unwrap();
    assert_eq!(query.get("filename").map(String::as_str), Some(ECHO_FILE));
    assert_eq!(query.get("cruise").map(String::as_str), Some("RL2107"));
    assert_eq!(seen.echogram_cache_control.as_deref(), Some("no-cache"));
}

#[tokio::test]
async fn echogram_cruise_comes_from_the_catalog() {
    let seen = Shared::default();
    let base = serve(seen.clone()).await;
    let config = config_for(&base);
    let client = ImageryClient::new(config.http_client().unwrap(), config);

    client
        .fetch(&ImageKey::new(ImageKind::Echogram, "D20190801-T000000.raw", "RL1907"))
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    let query = seen.echogram_query.as_ref().unwrap();
    assert_eq!(query.get("cruise").map(String::as_str), Some("RL1907"));
}

#[tokio::test]
async fn spectrogram_request_posts_file_path() {
    let seen = Shared::default();
    let base = serve(seen.clone()).await;
    let config = config_for(&base);
    let client = ImageryClient::new(config.http_client().unwrap(), config);

    client
        .fetch(&ImageKey::new(ImageKind::Spectrogram, ECHO_FILE, "RL2107"))
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(
        seen.spectrogram_body,
        Some(json!({ "file_path": format!("data/{ECHO_FILE}") }))
    );
}

#[tokio::test]
async fn spectrogram_failure_uses_detail() {
    let base = serve(Shared::default()).await;
    let mut config = config_for(&base);
    config.extraction_url = format!("{base}/broken/extract-spectrogram");
    let client = ImageryClient::new(config.http_client().unwrap(), config);

    let err = client
        .fetch(&ImageKey::new(ImageKind::Spectrogram, ECHO_FILE, "RL2107"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "file not found in bucket");
}

#[tokio::test]
async fn cached_images_are_fetched_once() {
    let seen = Shared::default();
    let base = serve(seen.clone()).await;
    let config = config_for(&base);
    let client = ImageryClient::new(config.http_client().unwrap(), config);
    let mut cache = ImageCache::new();
    let key = ImageKey::new(ImageKind::Echogram, ECHO_FILE, "RL2107");

    let first = request_image(&mut cache, &client, &key).await.unwrap();
    let second = request_image(&mut cache, &client, &key).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(seen.lock().unwrap().image_calls, 1);
}

#[tokio::test]
async fn detection_feed_is_parsed() {
    let base = serve(Shared::default()).await;
    let http = SurveyConfig::default().http_client().unwrap();

    let rows = fetch_feed(&http, &format!("{base}/detections.csv"))
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].sardine_density, 0.8);
}

#[tokio::test]
async fn missing_feed_falls_back_to_synthetic() {
    let base = serve(Shared::default()).await;
    let http = SurveyConfig::default().http_client().unwrap();
    let url = format!("{base}/nope.csv");

    let err = fetch_feed(&http, &url).await.unwrap_err();
    assert_eq!(err.to_string(), "HTTP error! status: 404");

    let feed = load_detection_feed(&http, &url).await;
    assert!(feed.origin.is_synthetic());
    assert_eq!(feed.records.len(), 10);

    let live = load_detection_feed(&http, &format!("{base}/detections.csv")).await;
    assert_eq!(
        live.origin,
        FeedOrigin::Live {
            source: format!("{base}/detections.csv")
        }
    );
}

/// `Tasks` owns its own runtime, so the server runs on a separate thread.
fn serve_on_thread(seen: Shared) -> String {
    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(listener.local_addr().unwrap()).unwrap();
            axum::serve(listener, router(seen)).await.unwrap();
        });
    });
    format!("http://{}", rx.recv().unwrap())
}

#[test]
fn background_tasks_report_through_drain() {
    let base = serve_on_thread(Shared::default());
    let mut tasks = Tasks::new(&config_for(&base)).unwrap();
    let woken = Arc::new(Mutex::new(0usize));
    let counter = woken.clone();
    tasks.set_waker(move || *counter.lock().unwrap() += 1);

    tasks.fetch_catalog("RL2107".into());
    tasks.fetch_detections(format!("{base}/detections.csv"));
    tasks.fetch_image(ImageKey::new(ImageKind::Echogram, ECHO_FILE, "RL2107"));

    let mut outcomes = Vec::new();
    let deadline = Instant::now() + Duration::from_secs(10);
    // The waker runs just after each send, so wait for both counts.
    while (outcomes.len() < 3 || *woken.lock().unwrap() < 3) && Instant::now() < deadline {
        outcomes.extend(tasks.drain());
        std::thread::sleep(Duration::from_millis(20));
    }
    assert_eq!(outcomes.len(), 3);
    assert_eq!(*woken.lock().unwrap(), 3);

    for outcome in outcomes {
        match outcome {
            TaskOutcome::Catalog { cruise, result } => {
                assert_eq!(cruise, "RL2107");
                assert_eq!(result.unwrap().len(), 2);
            }
            TaskOutcome::Detections(feed) => assert!(!feed.origin.is_synthetic()),
            TaskOutcome::Image { key, result } => {
                assert_eq!(key.filename, ECHO_FILE);
                assert_eq!(result.unwrap(), PNG_MAGIC);
            }
        }
    }
}
