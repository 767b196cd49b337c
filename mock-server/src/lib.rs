//! In-memory stand-in for the Pocket v3 API.
//!
//! Reproduces the service's wire quirks: every item field is a string,
//! empty keyed collections are sent as `[]`, and failures are a bare status
//! with `x-error-code` / `x-error` headers. The out-of-band approval step is
//! `GET /auth/authorize?request_token=..`, which approves the token for the
//! configured user.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use axum::{
    extract::{Query, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

const FIRST_ITEM_ID: u64 = 3_000_000_000;

/// Credentials the mock accepts.
#[derive(Clone, Debug)]
pub struct MockConfig {
    pub consumer_key: String,
    pub username: String,
    /// Access token accepted without going through the handshake.
    pub access_token: Option<String>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            consumer_key: "mock-consumer-key".to_string(),
            username: "mock-user".to_string(),
            access_token: Some("mock-access-token".to_string()),
        }
    }
}

/// A stored bookmark. Mirrors the string-typed wire fields.
#[derive(Clone, Debug)]
pub struct Item {
    pub item_id: String,
    pub given_url: String,
    pub given_title: String,
    pub favorite: String,
    pub status: String,
    pub time_added: i64,
    pub time_updated: i64,
    pub time_favorited: i64,
    pub tags: Vec<String>,
}

#[derive(Debug)]
struct RequestToken {
    approved: bool,
    consumed: bool,
}

#[derive(Debug, Default)]
struct Store {
    request_tokens: HashMap<String, RequestToken>,
    access_tokens: HashMap<String, String>,
    items: BTreeMap<u64, Item>,
    next_id: u64,
}

#[derive(Clone)]
struct AppState {
    config: Arc<MockConfig>,
    store: Arc<RwLock<Store>>,
}

/// A Pocket-style failure: a status plus the two error headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PocketError {
    pub status: StatusCode,
    pub code: u16,
    pub message: &'static str,
}

impl PocketError {
    const fn new(status: StatusCode, code: u16, message: &'static str) -> Self {
        Self {
            status,
            code,
            message,
        }
    }
}

const MISSING_ACCEPT: PocketError =
    PocketError::new(StatusCode::BAD_REQUEST, 199, "X-Accept header must be application/json.");
const MISSING_CONSUMER_KEY: PocketError =
    PocketError::new(StatusCode::BAD_REQUEST, 138, "Missing consumer key.");
const INVALID_CONSUMER_KEY: PocketError =
    PocketError::new(StatusCode::FORBIDDEN, 152, "Invalid consumer key.");
const MISSING_REDIRECT: PocketError =
    PocketError::new(StatusCode::BAD_REQUEST, 140, "Missing redirect url.");
const MISSING_CODE: PocketError = PocketError::new(StatusCode::BAD_REQUEST, 182, "Missing code.");
const CODE_NOT_FOUND: PocketError = PocketError::new(StatusCode::FORBIDDEN, 185, "Code not found.");
const CODE_REJECTED: PocketError =
    PocketError::new(StatusCode::FORBIDDEN, 158, "User rejected code.");
const CODE_USED: PocketError = PocketError::new(StatusCode::FORBIDDEN, 159, "Already used code.");
const INVALID_ACCESS_TOKEN: PocketError =
    PocketError::new(StatusCode::UNAUTHORIZED, 107, "Invalid access token.");
const MISSING_URL: PocketError = PocketError::new(StatusCode::BAD_REQUEST, 130, "Missing url.");
const MISSING_ACTIONS: PocketError =
    PocketError::new(StatusCode::BAD_REQUEST, 131, "Missing actions.");

impl IntoResponse for PocketError {
    fn into_response(self) -> Response {
        (
            self.status,
            [
                ("x-error-code", self.code.to_string()),
                ("x-error", self.message.to_string()),
            ],
        )
            .into_response()
    }
}

pub fn app() -> Router {
    app_with(MockConfig::default())
}

pub fn app_with(config: MockConfig) -> Router {
    let mut store = Store {
        next_id: FIRST_ITEM_ID,
        ..Store::default()
    };
    if let Some(token) = &config.access_token {
        store
            .access_tokens
            .insert(token.clone(), config.username.clone());
    }
    let state = AppState {
        config: Arc::new(config),
        store: Arc::new(RwLock::new(store)),
    };

    let api = Router::new()
        .route("/oauth/request", post(oauth_request))
        .route("/oauth/authorize", post(oauth_authorize))
        .route("/get", post(get_items))
        .route("/add", post(add_item))
        .route("/send", post(send_actions))
        .layer(middleware::from_fn(require_json_accept));

    Router::new()
        .nest("/v3", api)
        .route("/auth/authorize", get(approve))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with(listener: TcpListener, config: MockConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(config)).await
}

async fn require_json_accept(request: Request, next: Next) -> Response {
    if !accepts_json(request.headers()) {
        return MISSING_ACCEPT.into_response();
    }
    next.run(request).await
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

fn check_consumer(config: &MockConfig, consumer_key: Option<&str>) -> Result<(), PocketError> {
    match consumer_key {
        None | Some("") => Err(MISSING_CONSUMER_KEY),
        Some(key) if key != config.consumer_key => Err(INVALID_CONSUMER_KEY),
        Some(_) => Ok(()),
    }
}

fn check_user(state: &AppState, store: &Store, creds: &Credentials) -> Result<(), PocketError> {
    check_consumer(&state.config, creds.consumer_key.as_deref())?;
    match creds.access_token.as_deref() {
        Some(token) if store.access_tokens.contains_key(token) => Ok(()),
        _ => Err(INVALID_ACCESS_TOKEN),
    }
}

// ---------------------------------------------------------------------------
// Authorization
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct OAuthRequest {
    pub consumer_key: Option<String>,
    pub redirect_uri: Option<String>,
}

#[derive(Deserialize)]
pub struct OAuthAuthorize {
    pub consumer_key: Option<String>,
    pub code: Option<String>,
}

#[derive(Deserialize)]
pub struct Approval {
    pub request_token: String,
}

async fn oauth_request(
    State(state): State<AppState>,
    Json(input): Json<OAuthRequest>,
) -> Result<Json<Value>, PocketError> {
    check_consumer(&state.config, input.consumer_key.as_deref())?;
    if input.redirect_uri.as_deref().unwrap_or("").is_empty() {
        return Err(MISSING_REDIRECT);
    }

    let code = Uuid::new_v4().to_string();
    state.store.write().await.request_tokens.insert(
        code.clone(),
        RequestToken {
            approved: false,
            consumed: false,
        },
    );
    info!(%code, "request token issued");
    Ok(Json(json!({ "code": code, "state": null })))
}

async fn approve(
    State(state): State<AppState>,
    Query(approval): Query<Approval>,
) -> Result<&'static str, StatusCode> {
    let mut store = state.store.write().await;
    let token = store
        .request_tokens
        .get_mut(&approval.request_token)
        .ok_or(StatusCode::NOT_FOUND)?;
    token.approved = true;
    Ok("authorized")
}

async fn oauth_authorize(
    State(state): State<AppState>,
    Json(input): Json<OAuthAuthorize>,
) -> Result<Json<Value>, PocketError> {
    check_consumer(&state.config, input.consumer_key.as_deref())?;
    let code = input.code.filter(|c| !c.is_empty()).ok_or(MISSING_CODE)?;

    let mut store = state.store.write().await;
    let token = store.request_tokens.get_mut(&code).ok_or(CODE_NOT_FOUND)?;
    if token.consumed {
        return Err(CODE_USED);
    }
    if !token.approved {
        return Err(CODE_REJECTED);
    }
    token.consumed = true;

    let access_token = Uuid::new_v4().to_string();
    store
        .access_tokens
        .insert(access_token.clone(), state.config.username.clone());
    info!(username = %state.config.username, "access token issued");
    Ok(Json(json!({
        "access_token": access_token,
        "username": state.config.username,
    })))
}

// ---------------------------------------------------------------------------
// Retrieve
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct Credentials {
    pub consumer_key: Option<String>,
    pub access_token: Option<String>,
}

#[derive(Deserialize)]
pub struct GetParams {
    #[serde(flatten)]
    pub credentials: Credentials,
    pub state: Option<String>,
    #[serde(rename = "detailType")]
    pub detail_type: Option<String>,
    pub favorite: Option<String>,
    pub search: Option<String>,
    pub domain: Option<String>,
    pub tag: Option<String>,
    #[serde(rename = "contentType")]
    pub content_type: Option<String>,
    pub since: Option<String>,
    pub sort: Option<String>,
    pub count: Option<usize>,
    pub offset: Option<usize>,
}

impl GetParams {
    fn matches(&self, item: &Item) -> bool {
        let state_ok = match self.state.as_deref().unwrap_or("unread") {
            "archive" => item.status == "1",
            "all" => true,
            _ => item.status == "0",
        };
        let favorite_ok = self.favorite.as_ref().is_none_or(|f| *f == item.favorite);
        let search_ok = self.search.as_ref().is_none_or(|s| {
            let needle = s.to_lowercase();
            item.given_title.to_lowercase().contains(&needle)
                || item.given_url.to_lowercase().contains(&needle)
        });
        let domain_ok = self
            .domain
            .as_ref()
            .is_none_or(|d| item.given_url.contains(d.as_str()));
        let tag_ok = match self.tag.as_deref() {
            None => true,
            Some("_untagged_") => item.tags.is_empty(),
            Some(tag) => item.tags.iter().any(|t| t == tag),
        };
        let content_ok = matches!(self.content_type.as_deref(), None | Some("article"));
        let since_ok = self
            .since
            .as_ref()
            .and_then(|s| s.parse::<i64>().ok())
            .is_none_or(|since| item.time_updated >= since);

        state_ok && favorite_ok && search_ok && domain_ok && tag_ok && content_ok && since_ok
    }
}

async fn get_items(
    State(state): State<AppState>,
    Json(params): Json<GetParams>,
) -> Result<Json<Value>, PocketError> {
    let store = state.store.read().await;
    check_user(&state, &store, &params.credentials)?;

    let mut items: Vec<&Item> = store.items.values().filter(|i| params.matches(i)).collect();
    match params.sort.as_deref() {
        Some("newest") => items.sort_by(|a, b| b.time_added.cmp(&a.time_added)),
        Some("oldest") => items.sort_by_key(|i| i.time_added),
        Some("title") => items.sort_by(|a, b| a.given_title.cmp(&b.given_title)),
        Some("site") => items.sort_by(|a, b| a.given_url.cmp(&b.given_url)),
        _ => {}
    }
    let complete = params.detail_type.as_deref() == Some("complete");
    let selected: Vec<&Item> = items
        .into_iter()
        .skip(params.offset.unwrap_or(0))
        .take(params.count.unwrap_or(usize::MAX))
        .collect();
    debug!(count = selected.len(), complete, "get");

    let list = if selected.is_empty() {
        Value::Array(Vec::new())
    } else {
        Value::Object(
            selected
                .iter()
                .map(|item| (item.item_id.clone(), render(item, complete)))
                .collect(),
        )
    };
    Ok(Json(json!({
        "status": if selected.is_empty() { 2 } else { 1 },
        "complete": 1,
        "list": list,
        "error": null,
        "search_meta": { "search_type": "normal" },
        "since": now(),
    })))
}

/// Wire form of an item. The complete detail level adds the keyed
/// collections, each `[]` when empty.
pub fn render(item: &Item, complete: bool) -> Value {
    let mut fields = Map::new();
    let mut put = |key: &str, value: String| {
        fields.insert(key.to_string(), Value::String(value));
    };
    put("item_id", item.item_id.clone());
    put("resolved_id", item.item_id.clone());
    put("given_url", item.given_url.clone());
    put("given_title", item.given_title.clone());
    put("resolved_url", item.given_url.clone());
    put("resolved_title", item.given_title.clone());
    put("favorite", item.favorite.clone());
    put("status", item.status.clone());
    put("excerpt", String::new());
    put("is_article", "1".to_string());
    put("has_video", "0".to_string());
    put("has_image", "0".to_string());
    put("word_count", "0".to_string());
    put("time_added", item.time_added.to_string());
    put("time_updated", item.time_updated.to_string());
    put("time_read", "0".to_string());
    put("time_favorited", item.time_favorited.to_string());
    put("lang", "en".to_string());

    if complete {
        let tags = if item.tags.is_empty() {
            Value::Array(Vec::new())
        } else {
            Value::Object(
                item.tags
                    .iter()
                    .map(|t| (t.clone(), json!({ "item_id": item.item_id, "tag": t })))
                    .collect(),
            )
        };
        fields.insert("tags".to_string(), tags);
        fields.insert("images".to_string(), Value::Array(Vec::new()));
        fields.insert("videos".to_string(), Value::Array(Vec::new()));
        fields.insert("authors".to_string(), Value::Array(Vec::new()));
    }
    Value::Object(fields)
}

// ---------------------------------------------------------------------------
// Add
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct AddParams {
    #[serde(flatten)]
    pub credentials: Credentials,
    pub url: Option<String>,
    pub title: Option<String>,
    pub tags: Option<String>,
}

async fn add_item(
    State(state): State<AppState>,
    Json(params): Json<AddParams>,
) -> Result<Json<Value>, PocketError> {
    let mut store = state.store.write().await;
    check_user(&state, &store, &params.credentials)?;
    let url = params.url.filter(|u| !u.is_empty()).ok_or(MISSING_URL)?;

    let id = store.next_id;
    store.next_id += 1;
    let time = now();
    let item = Item {
        item_id: id.to_string(),
        given_url: url,
        given_title: params.title.unwrap_or_default(),
        favorite: "0".to_string(),
        status: "0".to_string(),
        time_added: time,
        time_updated: time,
        time_favorited: 0,
        tags: params
            .tags
            .map(|t| {
                t.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
    };
    let rendered = render(&item, true);
    store.items.insert(id, item);
    info!(item_id = id, "item added");

    Ok(Json(json!({ "item": rendered, "status": 1 })))
}

// ---------------------------------------------------------------------------
// Modify
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct SendParams {
    #[serde(flatten)]
    pub credentials: Credentials,
    pub actions: Option<Vec<ActionParams>>,
}

#[derive(Deserialize)]
pub struct ActionParams {
    pub action: String,
    pub item_id: String,
    pub time: Option<String>,
}

async fn send_actions(
    State(state): State<AppState>,
    Json(params): Json<SendParams>,
) -> Result<Json<Value>, PocketError> {
    let mut store = state.store.write().await;
    check_user(&state, &store, &params.credentials)?;
    let actions = params
        .actions
        .filter(|a| !a.is_empty())
        .ok_or(MISSING_ACTIONS)?;

    let results: Vec<bool> = actions
        .iter()
        .map(|action| apply(&mut store, action))
        .collect();
    debug!(actions = results.len(), "send");
    Ok(Json(json!({ "action_results": results, "status": 1 })))
}

fn apply(store: &mut Store, action: &ActionParams) -> bool {
    let Ok(id) = action.item_id.parse::<u64>() else {
        return false;
    };
    let time = action
        .time
        .as_ref()
        .and_then(|t| t.parse::<i64>().ok())
        .unwrap_or_else(now);

    if action.action == "delete" {
        return store.items.remove(&id).is_some();
    }
    let Some(item) = store.items.get_mut(&id) else {
        return false;
    };
    match action.action.as_str() {
        "archive" => item.status = "1".to_string(),
        "readd" => item.status = "0".to_string(),
        "favorite" => {
            item.favorite = "1".to_string();
            item.time_favorited = time;
        }
        "unfavorite" => {
            item.favorite = "0".to_string();
            item.time_favorited = 0;
        }
        _ => return false,
    }
    item.time_updated = time;
    true
}

/// Whether the caller asked for JSON responses via `X-Accept`.
pub fn accepts_json(headers: &HeaderMap) -> bool {
    headers
        .get("x-accept")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("application/json"))
}
