use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use edu_api::{
    api,
    naming::HttpNameGenerator,
    quiz::HttpQuizGenerator,
    records::{LocatePolicy, RecordService},
    store::{MemoryStore, RecordStore},
    vector::{HttpVectorIndex, VectorEndpoints},
};
use httpmock::{Method::POST, MockServer};
use serde_json::{Value, json};
use tower::ServiceExt;

struct Harness {
    server: MockServer,
    store: Arc<MemoryStore>,
    app: Router,
}

impl Harness {
    async fn new() -> Self {
        let server = MockServer::start_async().await;
        let store = Arc::new(MemoryStore::new());
        let timeout = Duration::from_secs(2);
        let service = RecordService::new(
            store.clone(),
            Arc::new(
                HttpNameGenerator::new(server.url("/prediction/name"), timeout).expect("namer"),
            ),
            Arc::new(
                HttpVectorIndex::new(
                    VectorEndpoints {
                        upsert_url: server.url("/vector/upsert"),
                        search_url: server.url("/vector/search"),
                    },
                    timeout,
                )
                .expect("vectors"),
            ),
            Arc::new(
                HttpQuizGenerator::new(server.url("/prediction/quiz"), timeout).expect("quiz"),
            ),
        )
        .with_locate_policy(LocatePolicy {
            attempts: 2,
            delay: Duration::from_millis(10),
        });
        let app = api::create_router(Arc::new(service), api::DEFAULT_MAX_UPLOAD_BYTES);
        Self { server, store, app }
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = self
            .app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request"),
            )
            .await
            .expect("router response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        (status, serde_json::from_slice(&bytes).expect("json"))
    }
}

#[tokio::test]
async fn upload_indexes_names_and_becomes_searchable() {
    let harness = Harness::new().await;
    let upsert = harness
        .server
        .mock_async(|when, then| {
            when.method(POST).path("/vector/upsert").json_body(json!({
                "overrideConfig": {
                    "text": "Plate tectonics explains earthquakes and mountain building.",
                    "metadata": {"key": "courses:1"}
                }
            }));
            then.status(200).json_body(json!({"numAdded": 1}));
        })
        .await;
    let naming = harness
        .server
        .mock_async(|when, then| {
            when.method(POST).path("/prediction/name");
            then.status(200).json_body(json!({"output": "  Moving Earth Plates \n"}));
        })
        .await;
    harness
        .server
        .mock_async(|when, then| {
            when.method(POST).path("/vector/search").json_body(json!({
                "overrideConfig": {"query": "earthquakes", "limit": 5}
            }));
            then.status(200).json_body(json!({
                "matches": [
                    {"metadata": {"key": "courses:1"}, "score": 0.91},
                    {"metadata": {"key": "courses:404"}, "score": 0.5}
                ]
            }));
        })
        .await;

    let (status, uploaded) = harness
        .post(
            "/api/v1/materials/upload",
            json!({"text": "Plate tectonics explains earthquakes and mountain building."}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(uploaded["key"], "courses:1");
    assert_eq!(uploaded["name"], "Moving Earth Plates");
    assert_eq!(uploaded["indexed"], true);
    upsert.assert_async().await;
    naming.assert_async().await;

    let (status, found) = harness
        .post("/api/v1/materials/search", json!({"query": "earthquakes", "limit": 5}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["count"], 1);
    assert_eq!(found["materials"][0]["key"], "courses:1");
    assert_eq!(found["materials"][0]["name"], "Moving Earth Plates");
}

#[tokio::test]
async fn naming_outage_keeps_upload_and_leaves_name_absent() {
    let harness = Harness::new().await;
    harness
        .server
        .mock_async(|when, then| {
            when.method(POST).path("/vector/upsert");
            then.status(200).json_body(json!({}));
        })
        .await;
    harness
        .server
        .mock_async(|when, then| {
            when.method(POST).path("/prediction/name");
            then.status(200)
                .delay(Duration::from_secs(4))
                .json_body(json!({"text": "Too Late Title"}));
        })
        .await;

    let (status, uploaded) = harness
        .post("/api/v1/materials/upload", json!({"text": "A document about tides."}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(uploaded["name"], Value::Null);
    assert!(
        !harness
            .store
            .field_exists("courses:1", "name")
            .await
            .expect("hexists")
    );
}

#[tokio::test]
async fn quiz_generation_reads_agent_envelope() {
    let harness = Harness::new().await;
    harness
        .server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/prediction/quiz")
                .json_body(json!({"question": "Volcanoes"}));
            then.status(200).json_body(json!([
                {"agentName": "Planner", "messages": ["thinking"]},
                {"agentName": "QuizGenerator", "messages": [
                    "<test><topic>Volcanoes</topic>\
                     <question id=\"v1\" type=\"single\"><text>Magma at the surface is?</text>\
                     <option correct=\"true\">Lava</option><option>Ash</option></question></test>"
                ]}
            ]));
        })
        .await;

    let (status, generated) = harness
        .post("/api/v1/quizzes/generate", json!({"topic": "Volcanoes"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(generated["success"], true);
    assert_eq!(generated["parsedQuiz"]["topic"], "Volcanoes");
    assert_eq!(generated["parsedQuiz"]["questions"][0]["type"], "single");
    assert_eq!(generated["parsedQuiz"]["questions"][0]["options"][0]["correct"], true);
    assert!(generated["quizXml"].as_str().expect("xml").starts_with("<test>"));
}

#[tokio::test]
async fn search_outage_is_bad_gateway() {
    let harness = Harness::new().await;
    harness
        .server
        .mock_async(|when, then| {
            when.method(POST).path("/vector/search");
            then.status(500).body("boom");
        })
        .await;

    let (status, body) = harness
        .post("/api/v1/materials/search", json!({"query": "anything"}))
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["success"], false);
}
