//! Realtime channel (§6 "Realtime channel"): one WebSocket per client,
//! fanning in every room topic the client has joined plus its own
//! user-scoped taunt-suggestion topic. Clients subscribe to rooms by
//! sending `room:join <roomId>` rather than connecting to a per-room URL,
//! so join/leave is a dynamic message-driven set rather than a fixed pipe.
use crate::auth;
use crate::state::AppState;
use actix_web::{web, HttpRequest, HttpResponse};
use futures_util::StreamExt;
use ludo_realtime::RoomEvent;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use tokio::sync::mpsc::{self, UnboundedSender};

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ClientMessage {
    #[serde(rename = "room:chat", rename_all = "camelCase")]
    Chat { room_id: String, text: String },
    #[serde(rename = "room:quick-message", rename_all = "camelCase")]
    QuickMessage { room_id: String, text: String },
}

pub async fn ws_entry(
    state: web::Data<AppState>,
    query: web::Query<HashMap<String, String>>,
    req: HttpRequest,
    body: web::Payload,
) -> actix_web::Result<HttpResponse> {
    let user_id = query.get("token").and_then(|token| auth::decode(&state.jwt_secret, token));
    match &user_id {
        Some(uid) => log::info!("websocket connected for user {uid}"),
        None => log::info!("anonymous websocket connection"),
    }

    let (response, mut session, mut stream) = actix_ws::handle(&req, body)?;
    let realtime = state.realtime.clone();
    let (tx, mut rx) = mpsc::unbounded_channel::<RoomEvent>();

    if let Some(user_id) = user_id.clone() {
        forward_channel(realtime.subscribe_user(&user_id), tx.clone());
    }

    actix_web::rt::spawn(async move {
        let mut joined_rooms: HashSet<String> = HashSet::new();
        loop {
            tokio::select! {
                biased;
                event = rx.recv() => match event {
                    Some(event) => {
                        let Ok(payload) = serde_json::to_string(&event) else { continue };
                        if session.text(payload).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                },
                msg = stream.next() => match msg {
                    Some(Ok(actix_ws::Message::Text(text))) => {
                        handle_incoming(&text, realtime.as_ref(), &tx, &mut joined_rooms);
                    }
                    Some(Ok(actix_ws::Message::Ping(bytes))) => {
                        if session.pong(&bytes).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(actix_ws::Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => continue,
                },
            }
        }
        log::debug!("websocket session closed");
    });

    Ok(response)
}

/// Spawns a forwarder pumping one broadcast subscription into the
/// connection's shared outbound channel, so `tokio::select!` only ever
/// needs to poll two futures regardless of how many rooms a client joins.
fn forward_channel(mut receiver: tokio::sync::broadcast::Receiver<RoomEvent>, tx: UnboundedSender<RoomEvent>) {
    actix_web::rt::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if tx.send(event).is_err() {
                        break;
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

fn handle_incoming(text: &str, realtime: &dyn ludo_realtime::Realtime, tx: &UnboundedSender<RoomEvent>, joined_rooms: &mut HashSet<String>) {
    if let Some(room_id) = text.strip_prefix("room:join ") {
        let room_id = room_id.trim().to_string();
        if joined_rooms.insert(room_id.clone()) {
            forward_channel(realtime.subscribe_room(&room_id), tx.clone());
        }
        return;
    }

    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::Chat { room_id, text }) => {
            realtime.publish_room(RoomEvent::patch(room_id, "room:chat", serde_json::json!({ "text": text })));
        }
        Ok(ClientMessage::QuickMessage { room_id, text }) => {
            realtime.publish_room(RoomEvent::patch(room_id, "room:quick-message", serde_json::json!({ "text": text })));
        }
        Err(_) => log::debug!("ignoring unrecognized websocket message: {text}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_command_parses_room_id() {
        assert_eq!("room-abc".strip_prefix("room:join "), None);
        let room_id = "room:join room-abc".strip_prefix("room:join ").map(str::trim);
        assert_eq!(room_id, Some("room-abc"));
    }

    #[test]
    fn chat_message_deserializes_with_tagged_type() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"room:chat","roomId":"r1","text":"gg"}"#).unwrap();
        match msg {
            ClientMessage::Chat { room_id, text } => {
                assert_eq!(room_id, "r1");
                assert_eq!(text, "gg");
            }
            _ => panic!("expected Chat variant"),
        }
    }

    #[test]
    fn unrecognized_payload_does_not_panic() {
        assert!(serde_json::from_str::<ClientMessage>("not json").is_err());
    }
}
