//! The relay engine: one WebSocket channel per connected identity.
//!
//! Each channel is serviced by a strictly sequential loop -- one inbound
//! event is validated, persisted, and forwarded to completion before the
//! next is read.  A malformed event (missing field, unknown `type`,
//! undecodable media payload) is fatal for the channel: the session ends
//! and the client must reconnect.  This coarse policy is deliberate, not a
//! gap to be silently smoothed over.

use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use courier_shared::media;
use courier_shared::protocol::{ClientEvent, MessageKind, ServerEvent};

use crate::api::AppState;
use crate::error::ServerError;

/// `GET /ws/:identity` -- upgrade to the relay channel for that identity.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(identity): Path<String>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| relay_channel(socket, identity, state))
}

async fn relay_channel(socket: WebSocket, identity: String, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();

    let registration = state.registry.register(&identity, tx.clone()).await;
    info!(%identity, "relay channel open");

    // Writer task: drains outbound events (acks from this loop plus live
    // copies relayed from other channels) into the socket.
    let writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let Ok(json) = serde_json::to_string(&event) else {
                continue;
            };
            if sink.send(WsMessage::Text(json)).await.is_err() {
                break;
            }
        }
    });

    // Reader loop: exactly one event handled to completion per iteration.
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(WsMessage::Text(text)) => {
                if let Err(e) = handle_event(&state, &tx, &text).await {
                    warn!(%identity, error = %e, "fatal event on relay channel, closing");
                    break;
                }
            }
            Ok(WsMessage::Close(_)) | Err(_) => break,
            // Ping/pong are answered by axum; binary frames are ignored.
            Ok(_) => {}
        }
    }

    state.registry.unregister(&identity, registration).await;
    writer.abort();

    // Presence is deliberately untouched here: going offline is an explicit
    // client call, not a side effect of the socket closing.
    info!(%identity, "relay channel closed");
}

/// Validate, persist, ack, and forward a single inbound event.
///
/// `reply` is the channel the event arrived on; the ack goes there
/// directly rather than through a registry lookup, so a racing
/// re-registration of the same identity cannot intercept it.
pub(crate) async fn handle_event(
    state: &AppState,
    reply: &mpsc::UnboundedSender<ServerEvent>,
    raw: &str,
) -> Result<(), ServerError> {
    let event: ClientEvent =
        serde_json::from_str(raw).map_err(|e| ServerError::MalformedEvent(e.to_string()))?;

    let payload = match event.kind {
        MessageKind::Text => event.message.clone(),
        MessageKind::Media => {
            let decoded = media::decode_data_uri(&event.message)
                .map_err(|e| ServerError::MalformedEvent(e.to_string()))?;
            // Blob before log: a crash in between leaves an orphaned file,
            // never a message row pointing at nothing.
            state
                .blob_store
                .store(&decoded.bytes, decoded.extension)
                .await?
        }
    };

    let stored = {
        let db = state.db.lock().await;
        db.append_message(
            event.sender.as_str(),
            event.receiver.as_str(),
            event.kind,
            &payload,
        )?
    };
    debug!(
        id = stored.id,
        sender = %event.sender,
        receiver = %event.receiver,
        kind = event.kind.as_str(),
        "message logged"
    );

    let _ = reply.send(ServerEvent::ack(
        event.sender.clone(),
        event.receiver.clone(),
        payload.clone(),
        event.kind,
    ));

    // Best-effort live delivery; offline receivers read the log later.
    let receiver = event.receiver.as_str().to_owned();
    if state.registry.is_registered(&receiver).await {
        state
            .registry
            .send(
                &receiver,
                ServerEvent::relayed(
                    event.sender,
                    event.receiver,
                    payload,
                    event.kind,
                    stored.timestamp,
                ),
            )
            .await;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    use tokio::sync::Mutex;

    use courier_store::Database;

    use super::*;
    use crate::blob_store::BlobStore;
    use crate::registry::ConnectionRegistry;

    async fn test_state() -> (AppState, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        let blob_store = BlobStore::new(dir.path().join("media"), 1024 * 1024)
            .await
            .unwrap();

        let state = AppState {
            db: Arc::new(Mutex::new(db)),
            registry: ConnectionRegistry::new(),
            blob_store: Arc::new(blob_store),
        };
        (state, dir)
    }

    #[tokio::test]
    async fn text_event_is_logged_and_acked() {
        let (state, _dir) = test_state().await;
        let (reply, mut reply_rx) = mpsc::unbounded_channel();

        let raw = r#"{"type":"text","sender":"alice","receiver":"bob","message":"hi bob"}"#;
        handle_event(&state, &reply, raw).await.unwrap();

        let ack = reply_rx.try_recv().unwrap();
        assert_eq!(ack.message, "hi bob");
        assert_eq!(ack.kind, MessageKind::Text);
        assert!(ack.timestamp.is_none());

        let db = state.db.lock().await;
        let page = db.page_conversation("bob", "alice", 0, 30).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].payload, "hi bob");
    }

    #[tokio::test]
    async fn offline_receiver_still_gets_durable_message() {
        let (state, _dir) = test_state().await;
        let (reply, mut reply_rx) = mpsc::unbounded_channel();

        let raw = r#"{"type":"text","sender":"alice","receiver":"bob","message":"while away"}"#;
        handle_event(&state, &reply, raw).await.unwrap();

        // Ack arrives even though bob is offline, and nothing else does.
        assert!(reply_rx.try_recv().is_ok());
        assert!(reply_rx.try_recv().is_err());

        // Bob finds the message in history later.
        let db = state.db.lock().await;
        let page = db.page_conversation("bob", "alice", 0, 30).unwrap();
        assert_eq!(page.len(), 1);
    }

    #[tokio::test]
    async fn registered_receiver_gets_live_copy_with_timestamp() {
        let (state, _dir) = test_state().await;
        let (reply, _reply_rx) = mpsc::unbounded_channel();
        let (bob_tx, mut bob_rx) = mpsc::unbounded_channel();

        state.registry.register("bob", bob_tx).await;

        let raw = r#"{"type":"text","sender":"alice","receiver":"bob","message":"live"}"#;
        handle_event(&state, &reply, raw).await.unwrap();

        let relayed = bob_rx.try_recv().unwrap();
        assert_eq!(relayed.message, "live");
        assert_eq!(relayed.sender.as_str(), "alice");
        assert!(relayed.timestamp.is_some());
    }

    #[tokio::test]
    async fn media_event_stores_blob_and_references_it() {
        let (state, _dir) = test_state().await;
        let (reply, mut reply_rx) = mpsc::unbounded_channel();

        let payload = format!("image/png;base64,{}", BASE64.encode(b"png-data"));
        let raw = serde_json::json!({
            "type": "media",
            "sender": "alice",
            "receiver": "bob",
            "message": payload,
        })
        .to_string();

        handle_event(&state, &reply, &raw).await.unwrap();

        // The logged payload is the blob filename, and the bytes round-trip.
        let filename = {
            let db = state.db.lock().await;
            let page = db.page_conversation("alice", "bob", 0, 30).unwrap();
            assert_eq!(page[0].kind, MessageKind::Media);
            page[0].payload.clone()
        };
        assert!(filename.ends_with(".png"));
        assert_eq!(state.blob_store.read(&filename).await.unwrap(), b"png-data");

        // The ack carries the filename too, not the data URI.
        let ack = reply_rx.try_recv().unwrap();
        assert_eq!(ack.message, filename);
    }

    #[tokio::test]
    async fn malformed_json_is_fatal() {
        let (state, _dir) = test_state().await;
        let (reply, _reply_rx) = mpsc::unbounded_channel();

        let result = handle_event(&state, &reply, "not json at all").await;
        assert!(matches!(result, Err(ServerError::MalformedEvent(_))));
    }

    #[tokio::test]
    async fn unknown_kind_is_fatal() {
        let (state, _dir) = test_state().await;
        let (reply, _reply_rx) = mpsc::unbounded_channel();

        let raw = r#"{"type":"sticker","sender":"alice","receiver":"bob","message":"x"}"#;
        let result = handle_event(&state, &reply, raw).await;
        assert!(matches!(result, Err(ServerError::MalformedEvent(_))));
    }

    #[tokio::test]
    async fn missing_field_is_fatal_and_logs_nothing() {
        let (state, _dir) = test_state().await;
        let (reply, _reply_rx) = mpsc::unbounded_channel();

        let raw = r#"{"type":"text","sender":"alice","message":"no receiver"}"#;
        assert!(handle_event(&state, &reply, raw).await.is_err());

        let db = state.db.lock().await;
        assert!(db.page_conversation("alice", "bob", 0, 30).unwrap().is_empty());
    }

    #[tokio::test]
    async fn undecodable_media_payload_is_fatal() {
        let (state, _dir) = test_state().await;
        let (reply, _reply_rx) = mpsc::unbounded_channel();

        let raw = r#"{"type":"media","sender":"alice","receiver":"bob","message":"image/png:no-separator"}"#;
        assert!(handle_event(&state, &reply, raw).await.is_err());
    }

    #[tokio::test]
    async fn unrecognized_mime_falls_back_to_bin() {
        let (state, _dir) = test_state().await;
        let (reply, _reply_rx) = mpsc::unbounded_channel();

        let payload = format!("application/x-custom;base64,{}", BASE64.encode(b"opaque"));
        let raw = serde_json::json!({
            "type": "media",
            "sender": "alice",
            "receiver": "bob",
            "message": payload,
        })
        .to_string();

        handle_event(&state, &reply, &raw).await.unwrap();

        let db = state.db.lock().await;
        let page = db.page_conversation("alice", "bob", 0, 30).unwrap();
        assert!(page[0].payload.ends_with(".bin"));
    }
}
