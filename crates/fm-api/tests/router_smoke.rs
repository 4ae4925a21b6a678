use axum::{
    body::Body,
    http::{Request, StatusCode, header::CONTENT_TYPE},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn livez_is_healthy_without_a_database() {
    let app = fm_api::create_router(fm_api::test_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/livez")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn blank_search_prompt_is_rejected() {
    let app = fm_api::create_router(fm_api::test_state());

    let response = app
        .oneshot(json_request("/api/search", json!({ "prompt": "   " })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["code"], "bad_request");
}

#[tokio::test]
async fn conversation_message_requires_id_and_text() {
    let app = fm_api::create_router(fm_api::test_state());

    let response = app
        .oneshot(json_request(
            "/api/conversation/message",
            json!({ "conversation_id": "", "message": "hello" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_conversation_is_not_found() {
    let app = fm_api::create_router(fm_api::test_state());

    let message = app
        .clone()
        .oneshot(json_request(
            "/api/conversation/message",
            json!({ "conversation_id": "missing", "message": "hello" }),
        ))
        .await
        .unwrap();
    assert_eq!(message.status(), StatusCode::NOT_FOUND);

    let results = app
        .oneshot(
            Request::builder()
                .uri("/api/conversation/missing/results")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(results.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn conversation_flow_works_without_assistant_or_database() {
    let app = fm_api::create_router(fm_api::test_state());

    let start = app
        .clone()
        .oneshot(json_request("/api/conversation/start", json!({})))
        .await
        .unwrap();
    assert_eq!(start.status(), StatusCode::OK);

    let start_body = json_body(start).await;
    let conversation_id = start_body["conversationId"].as_str().unwrap().to_string();
    assert_eq!(start_body["greeting"]["role"], "bot");
    assert!(
        start_body["greeting"]["content"]
            .as_str()
            .unwrap()
            .contains("What are you looking for")
    );

    // Stopword-only text extracts no terms, so no matching runs and no
    // database is touched.
    let message = app
        .clone()
        .oneshot(json_request(
            "/api/conversation/message",
            json!({ "conversationId": conversation_id, "message": "of to in" }),
        ))
        .await
        .unwrap();
    assert_eq!(message.status(), StatusCode::OK);

    let message_body = json_body(message).await;
    assert_eq!(message_body["reply"]["role"], "bot");
    assert!(message_body["results"].as_array().unwrap().is_empty());

    let results = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/conversation/{conversation_id}/results"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(results.status(), StatusCode::OK);

    let results_body = json_body(results).await;
    assert_eq!(results_body["total"], 0);
}
