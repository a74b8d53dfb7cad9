use crate::event::RoomEvent;
use std::collections::HashMap;
use std::sync::RwLock;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 256;

/// Room-scoped publish primitive the coordinator calls after every
/// successful mutation (§2 "produces a new state and a patch ... releases
/// the lock ... publishes the patch on the room's broadcast topic").
/// Intentionally not `async fn` in the trait: fan-out is a synchronous
/// channel send, so implementations stay trait-object-safe without
/// `async-trait`.
pub trait Realtime: Send + Sync {
    fn publish_room(&self, event: RoomEvent);
    fn publish_user(&self, user_id: &str, event: RoomEvent);
    fn subscribe_room(&self, room_id: &str) -> broadcast::Receiver<RoomEvent>;
    fn subscribe_user(&self, user_id: &str) -> broadcast::Receiver<RoomEvent>;
    fn drop_room(&self, room_id: &str);
}

/// Default in-process broadcaster: a per-room channel-pair registry widened
/// from a 1:1 pipe to a multi-subscriber `tokio::sync::broadcast` topic,
/// since a Ludo room
/// seats up to six live viewers rather than one client and one bot.
#[derive(Default)]
pub struct InMemoryBroadcaster {
    rooms: RwLock<HashMap<String, broadcast::Sender<RoomEvent>>>,
    users: RwLock<HashMap<String, broadcast::Sender<RoomEvent>>>,
}

impl InMemoryBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    fn room_sender(&self, room_id: &str) -> broadcast::Sender<RoomEvent> {
        if let Some(tx) = self.rooms.read().unwrap().get(room_id) {
            return tx.clone();
        }
        let mut rooms = self.rooms.write().unwrap();
        rooms.entry(room_id.to_string()).or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0).clone()
    }

    fn user_sender(&self, user_id: &str) -> broadcast::Sender<RoomEvent> {
        if let Some(tx) = self.users.read().unwrap().get(user_id) {
            return tx.clone();
        }
        let mut users = self.users.write().unwrap();
        users.entry(user_id.to_string()).or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0).clone()
    }
}

impl Realtime for InMemoryBroadcaster {
    fn publish_room(&self, event: RoomEvent) {
        let tx = self.room_sender(&event.room_id);
        if tx.send(event).is_err() {
            log::debug!("publish_room with no subscribers");
        }
    }

    fn publish_user(&self, user_id: &str, event: RoomEvent) {
        let tx = self.user_sender(user_id);
        if tx.send(event).is_err() {
            log::debug!("publish_user({user_id}) with no subscribers");
        }
    }

    fn subscribe_room(&self, room_id: &str) -> broadcast::Receiver<RoomEvent> {
        self.room_sender(room_id).subscribe()
    }

    fn subscribe_user(&self, user_id: &str) -> broadcast::Receiver<RoomEvent> {
        self.user_sender(user_id).subscribe()
    }

    fn drop_room(&self, room_id: &str) {
        self.rooms.write().unwrap().remove(room_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn published_room_event_reaches_subscriber() {
        let broadcaster = InMemoryBroadcaster::new();
        let mut rx = broadcaster.subscribe_room("room-1");
        broadcaster.publish_room(RoomEvent::patch("room-1", "move", serde_json::json!({"revision": 1})));
        let received = rx.try_recv().expect("event delivered");
        assert_eq!(received.kind, "move");
    }
}
