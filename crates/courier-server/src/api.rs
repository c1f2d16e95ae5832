//! HTTP read/query surface consumed by the auth/front-end layer.
//!
//! These routes bypass the relay engine entirely: history pagination,
//! friend actions, search, presence, and recent-chat bookmarks call
//! straight into the store.  A failing request returns a structured JSON
//! error for that request only; other identities' sessions are unaffected.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::Method;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use courier_store::{Database, FriendEdge, IdentityMatch, PresenceRecord, RecentChat, StoredMessage};

use crate::blob_store::BlobStore;
use crate::error::ServerError;
use crate::registry::ConnectionRegistry;
use crate::relay;

/// Messages returned per history page.
pub const HISTORY_PAGE_SIZE: u32 = 30;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub registry: ConnectionRegistry,
    pub blob_store: Arc<BlobStore>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/ws/:identity", get(relay::ws_handler))
        .route("/history/:identity/:friend", get(history))
        .route("/friends/request", post(friend_request))
        .route("/friends/accept", post(friend_accept))
        .route("/friends/unfriend", post(friend_unfriend))
        .route("/friends/:identity", get(friends_list))
        .route("/friends/:identity/pending", get(friends_pending))
        .route("/search/:identity", get(search_identities))
        .route("/presence", post(presence_set))
        .route("/presence/:identity", get(presence_get))
        .route("/recent", post(recent_add).delete(recent_remove))
        .route("/recent/:owner", get(recent_list))
        .route("/identities", post(identity_create))
        .route("/media/:filename", get(media_download))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ─── History ───

#[derive(Deserialize)]
struct HistoryQuery {
    #[serde(default)]
    offset: u32,
}

/// Paginated conversation history, ascending by id within the page while
/// `offset` walks backward from the newest message.
async fn history(
    State(state): State<AppState>,
    Path((identity, friend)): Path<(String, String)>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<StoredMessage>>, ServerError> {
    let db = state.db.lock().await;
    let page = db.page_conversation(&identity, &friend, query.offset, HISTORY_PAGE_SIZE)?;
    Ok(Json(page))
}

// ─── Friendship graph ───

#[derive(Deserialize)]
struct FriendRequestBody {
    requester: String,
    target: String,
}

async fn friend_request(
    State(state): State<AppState>,
    Json(body): Json<FriendRequestBody>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let db = state.db.lock().await;
    db.request_friend(&body.requester, &body.target)?;

    info!(requester = %body.requester, target = %body.target, "friend request recorded");
    Ok(Json(serde_json::json!({ "requested": true })))
}

#[derive(Deserialize)]
struct FriendAcceptBody {
    acceptor: String,
    requester: String,
}

/// Accepting with no matching pending edge still reports success; callers
/// cannot distinguish "accepted" from "nothing to accept".
async fn friend_accept(
    State(state): State<AppState>,
    Json(body): Json<FriendAcceptBody>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let db = state.db.lock().await;
    db.accept_friend(&body.acceptor, &body.requester)?;

    info!(acceptor = %body.acceptor, requester = %body.requester, "friend accept processed");
    Ok(Json(serde_json::json!({ "accepted": true })))
}

#[derive(Deserialize)]
struct UnfriendBody {
    identity: String,
    other: String,
}

async fn friend_unfriend(
    State(state): State<AppState>,
    Json(body): Json<UnfriendBody>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let db = state.db.lock().await;
    db.unfriend(&body.identity, &body.other)?;

    info!(identity = %body.identity, other = %body.other, "unfriended");
    Ok(Json(serde_json::json!({ "unfriended": true })))
}

async fn friends_list(
    State(state): State<AppState>,
    Path(identity): Path<String>,
) -> Result<Json<Vec<String>>, ServerError> {
    let db = state.db.lock().await;
    Ok(Json(db.list_friends(&identity)?))
}

async fn friends_pending(
    State(state): State<AppState>,
    Path(identity): Path<String>,
) -> Result<Json<Vec<FriendEdge>>, ServerError> {
    let db = state.db.lock().await;
    Ok(Json(db.list_pending_incoming(&identity)?))
}

// ─── Search ───

#[derive(Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
}

async fn search_identities(
    State(state): State<AppState>,
    Path(identity): Path<String>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<IdentityMatch>>, ServerError> {
    let db = state.db.lock().await;
    Ok(Json(db.search_identities(&identity, &query.q)?))
}

// ─── Presence ───

#[derive(Deserialize)]
struct PresenceBody {
    identity: String,
    online: bool,
}

async fn presence_set(
    State(state): State<AppState>,
    Json(body): Json<PresenceBody>,
) -> Result<Json<PresenceRecord>, ServerError> {
    let db = state.db.lock().await;
    let record = db.set_presence(&body.identity, body.online)?;
    Ok(Json(record))
}

async fn presence_get(
    State(state): State<AppState>,
    Path(identity): Path<String>,
) -> Result<Json<PresenceRecord>, ServerError> {
    let db = state.db.lock().await;
    db.get_presence(&identity)?
        .map(Json)
        .ok_or(ServerError::UnknownIdentity(identity))
}

// ─── Recent chats ───

#[derive(Deserialize)]
struct RecentChatBody {
    owner: String,
    peer: String,
}

async fn recent_add(
    State(state): State<AppState>,
    Json(body): Json<RecentChatBody>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let db = state.db.lock().await;
    db.add_recent_chat(&body.owner, &body.peer)?;
    Ok(Json(serde_json::json!({ "added": true })))
}

/// Removing a bookmark that does not exist still reports success.
async fn recent_remove(
    State(state): State<AppState>,
    Json(body): Json<RecentChatBody>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let db = state.db.lock().await;
    db.remove_recent_chat(&body.owner, &body.peer)?;
    Ok(Json(serde_json::json!({ "removed": true })))
}

async fn recent_list(
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> Result<Json<Vec<RecentChat>>, ServerError> {
    let db = state.db.lock().await;
    Ok(Json(db.list_recent_chats(&owner)?))
}

// ─── Identities ───

#[derive(Deserialize)]
struct IdentityBody {
    username: String,
}

/// Registration hook for the auth collaborator.  Credential validation and
/// uniqueness checks happen at that (external) signup boundary; the core
/// stores the trusted username and seeds its presence record.
async fn identity_create(
    State(state): State<AppState>,
    Json(body): Json<IdentityBody>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let db = state.db.lock().await;
    db.create_identity(&body.username)?;

    info!(username = %body.username, "identity registered");
    Ok(Json(serde_json::json!({ "created": true })))
}

// ─── Media ───

async fn media_download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Vec<u8>, ServerError> {
    let data = state.blob_store.read(&filename).await?;
    Ok(data)
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP/WebSocket server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
