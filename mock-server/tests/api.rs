use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, app_with, MockConfig};
use serde_json::{json, Value};
use tower::ServiceExt;

const CONSUMER_KEY: &str = "mock-consumer-key";
const ACCESS_TOKEN: &str = "mock-access-token";

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn pocket_request(uri: &str, body: Value) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .header("x-accept", "application/json")
        .body(body.to_string())
        .unwrap()
}

fn error_code(response: &axum::response::Response) -> &str {
    response.headers()["x-error-code"].to_str().unwrap()
}

// --- headers ---

#[tokio::test]
async fn missing_x_accept_is_rejected() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v3/get")
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(json!({"consumer_key": CONSUMER_KEY, "access_token": ACCESS_TOKEN}).to_string())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&resp), "199");
}

// --- oauth ---

#[tokio::test]
async fn oauth_request_returns_code() {
    let resp = app()
        .oneshot(pocket_request(
            "/v3/oauth/request",
            json!({"consumer_key": CONSUMER_KEY, "redirect_uri": "myapp://done"}),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert!(!body["code"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn oauth_request_invalid_consumer_key() {
    let resp = app()
        .oneshot(pocket_request(
            "/v3/oauth/request",
            json!({"consumer_key": "wrong", "redirect_uri": "myapp://done"}),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(error_code(&resp), "152");
    assert_eq!(resp.headers()["x-error"], "Invalid consumer key.");
    assert!(body_bytes(resp).await.is_empty());
}

#[tokio::test]
async fn oauth_request_missing_redirect() {
    let resp = app()
        .oneshot(pocket_request(
            "/v3/oauth/request",
            json!({"consumer_key": CONSUMER_KEY}),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&resp), "140");
}

#[tokio::test]
async fn oauth_authorize_unknown_code() {
    let resp = app()
        .oneshot(pocket_request(
            "/v3/oauth/authorize",
            json!({"consumer_key": CONSUMER_KEY, "code": "never-issued"}),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(error_code(&resp), "185");
}

#[tokio::test]
async fn oauth_handshake() {
    use tower::Service;

    let mut app = app().into_service();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(pocket_request(
            "/v3/oauth/request",
            json!({"consumer_key": CONSUMER_KEY, "redirect_uri": "myapp://done"}),
        ))
        .await
        .unwrap();
    let code = body_json(resp).await["code"].as_str().unwrap().to_string();

    // not approved yet
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(pocket_request(
            "/v3/oauth/authorize",
            json!({"consumer_key": CONSUMER_KEY, "code": code}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(error_code(&resp), "158");

    // user approves out of band
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(
            Request::builder()
                .uri(format!("/auth/authorize?request_token={code}&redirect_uri=myapp%3A%2F%2Fdone"))
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(pocket_request(
            "/v3/oauth/authorize",
            json!({"consumer_key": CONSUMER_KEY, "code": code}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["username"], "mock-user");
    let token = body["access_token"].as_str().unwrap().to_string();

    // code is single-use
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(pocket_request(
            "/v3/oauth/authorize",
            json!({"consumer_key": CONSUMER_KEY, "code": code}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(error_code(&resp), "159");

    // new token works for data calls
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(pocket_request(
            "/v3/get",
            json!({"consumer_key": CONSUMER_KEY, "access_token": token}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

// --- get ---

#[tokio::test]
async fn get_empty_list_is_an_array() {
    let resp = app()
        .oneshot(pocket_request(
            "/v3/get",
            json!({"consumer_key": CONSUMER_KEY, "access_token": ACCESS_TOKEN, "state": "unread", "detailType": "simple"}),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["list"], json!([]));
    assert!(body["since"].is_i64());
}

#[tokio::test]
async fn get_invalid_access_token() {
    let resp = app()
        .oneshot(pocket_request(
            "/v3/get",
            json!({"consumer_key": CONSUMER_KEY, "access_token": "stale"}),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&resp), "107");
}

#[tokio::test]
async fn preseeded_token_can_be_disabled() {
    let config = MockConfig {
        access_token: None,
        ..MockConfig::default()
    };
    let resp = app_with(config)
        .oneshot(pocket_request(
            "/v3/get",
            json!({"consumer_key": CONSUMER_KEY, "access_token": ACCESS_TOKEN}),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- add ---

#[tokio::test]
async fn add_missing_url() {
    let resp = app()
        .oneshot(pocket_request(
            "/v3/add",
            json!({"consumer_key": CONSUMER_KEY, "access_token": ACCESS_TOKEN}),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&resp), "130");
}

// --- send ---

#[tokio::test]
async fn send_without_actions() {
    let resp = app()
        .oneshot(pocket_request(
            "/v3/send",
            json!({"consumer_key": CONSUMER_KEY, "access_token": ACCESS_TOKEN, "actions": []}),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&resp), "131");
}

// --- full lifecycle ---

#[tokio::test]
async fn add_get_modify_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    // add
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(pocket_request(
            "/v3/add",
            json!({
                "consumer_key": CONSUMER_KEY,
                "access_token": ACCESS_TOKEN,
                "url": "https://example.com/story",
                "title": "A story",
                "tags": "rust,reading"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["status"], 1);
    let item = &body["item"];
    assert_eq!(item["resolved_url"], "https://example.com/story");
    assert_eq!(item["favorite"], "0");
    assert_eq!(item["images"], json!([]));
    assert_eq!(item["tags"]["rust"]["tag"], "rust");
    let id = item["item_id"].as_str().unwrap().to_string();

    // get, keyed by item id
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(pocket_request(
            "/v3/get",
            json!({"consumer_key": CONSUMER_KEY, "access_token": ACCESS_TOKEN, "state": "all", "detailType": "complete"}),
        ))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["list"][&id]["item_id"], id.as_str());

    // favorite, then delete, then delete again
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(pocket_request(
            "/v3/send",
            json!({
                "consumer_key": CONSUMER_KEY,
                "access_token": ACCESS_TOKEN,
                "actions": [
                    {"action": "favorite", "item_id": id, "time": "1700000000"},
                    {"action": "delete", "item_id": id, "time": "1700000000"},
                    {"action": "delete", "item_id": id, "time": "1700000000"}
                ]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["action_results"], json!([true, true, false]));

    // get after delete: empty array again
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(pocket_request(
            "/v3/get",
            json!({"consumer_key": CONSUMER_KEY, "access_token": ACCESS_TOKEN, "state": "all"}),
        ))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["list"], json!([]));
}
