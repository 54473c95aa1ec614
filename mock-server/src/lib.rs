//! In-memory fake of the Unisender list API.
//!
//! Serves `POST /{lang}/api/{method}` with form-encoded bodies (optionally
//! bzip2-compressed, flagged by `request_compression=bzip2`) and answers in
//! the vendor's envelope: `{"result": ...}`, `{"error", "code"}`, plus
//! `warnings` when something was accepted with reservations.

use std::{
    collections::{BTreeMap, HashMap},
    io::Read,
    sync::Arc,
};

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};

#[derive(Clone, Debug, Serialize)]
pub struct List {
    pub id: i64,
    pub title: String,
    pub before_subscribe_url: Option<String>,
    pub after_subscribe_url: Option<String>,
}

#[derive(Debug, Default)]
pub struct Store {
    last_id: i64,
    lists: BTreeMap<i64, List>,
}

#[derive(Clone)]
pub struct AppState {
    api_key: Arc<str>,
    store: Arc<RwLock<Store>>,
}

type Params = HashMap<String, String>;

pub fn app(api_key: &str) -> Router {
    let state = AppState {
        api_key: Arc::from(api_key),
        store: Arc::new(RwLock::new(Store::default())),
    };
    Router::new()
        .route("/{lang}/api/{method}", post(dispatch))
        .with_state(state)
}

pub async fn run(listener: TcpListener, api_key: &str) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock API listening");
    }
    axum::serve(listener, app(api_key)).await
}

async fn dispatch(
    State(state): State<AppState>,
    Path((lang, method)): Path<(String, String)>,
    Query(query): Query<Params>,
    body: Bytes,
) -> Response {
    debug!(%lang, %method, "request");

    let body = if query.get("request_compression").map(String::as_str) == Some("bzip2") {
        let mut decoded = Vec::new();
        if let Err(e) = bzip2::read::BzDecoder::new(&body[..]).read_to_end(&mut decoded) {
            return (StatusCode::BAD_REQUEST, format!("bad compressed body: {e}")).into_response();
        }
        decoded
    } else {
        body.to_vec()
    };

    let params: Params = url::form_urlencoded::parse(&body).into_owned().collect();

    if params.get("api_key").map(String::as_str) != Some(&*state.api_key) {
        return api_error("invalid_api_key", "The API key is missing or wrong");
    }

    let mut store = state.store.write().await;
    match method.as_str() {
        "getLists" => get_lists(&store),
        "createList" => create_list(&mut store, &params),
        "updateList" => update_list(&mut store, &params),
        "deleteList" => delete_list(&mut store, &params),
        other => api_error("unknown_method", &format!("Unknown method '{other}'")),
    }
}

fn api_error(code: &str, message: &str) -> Response {
    Json(json!({ "error": message, "code": code })).into_response()
}

fn ok(result: Value) -> Response {
    Json(json!({ "result": result })).into_response()
}

fn non_empty(params: &Params, key: &str) -> Option<String> {
    params.get(key).filter(|v| !v.is_empty()).cloned()
}

fn list_id(params: &Params) -> Option<i64> {
    params.get("list_id")?.parse().ok().filter(|id| *id > 0)
}

fn get_lists(store: &Store) -> Response {
    let lists: Vec<Value> = store
        .lists
        .values()
        .map(|list| json!({ "id": list.id.to_string(), "title": list.title }))
        .collect();
    ok(Value::Array(lists))
}

fn create_list(store: &mut Store, params: &Params) -> Response {
    let Some(title) = non_empty(params, "title") else {
        return api_error("invalid_arg", "Title is required");
    };
    let duplicate = store.lists.values().any(|list| list.title == title);

    store.last_id += 1;
    let id = store.last_id;
    store.lists.insert(
        id,
        List {
            id,
            title: title.clone(),
            before_subscribe_url: non_empty(params, "before_subscribe_url"),
            after_subscribe_url: non_empty(params, "after_subscribe_url"),
        },
    );

    let mut body = json!({ "result": { "id": id.to_string() } });
    if duplicate {
        body["warnings"] = json!([{ "warning": format!("A list titled '{title}' already exists") }]);
    }
    Json(body).into_response()
}

fn update_list(store: &mut Store, params: &Params) -> Response {
    let Some(list) = list_id(params).and_then(|id| store.lists.get_mut(&id)) else {
        return api_error("invalid_arg", "List not found");
    };
    let Some(title) = non_empty(params, "title") else {
        return api_error("invalid_arg", "Title is required");
    };
    list.title = title;
    if let Some(url) = non_empty(params, "before_subscribe_url") {
        list.before_subscribe_url = Some(url);
    }
    if let Some(url) = non_empty(params, "after_subscribe_url") {
        list.after_subscribe_url = Some(url);
    }
    ok(json!({}))
}

fn delete_list(store: &mut Store, params: &Params) -> Response {
    match list_id(params).and_then(|id| store.lists.remove(&id)) {
        Some(_) => ok(json!({})),
        None => api_error("invalid_arg", "List not found"),
    }
}
