use crate::error::StoreError;
use crate::event::GameEvent;
use crate::records::{RoomDocument, RoomStatePatch, SeatDocument, TeamDocument, UserDocument};
use mongodb::bson::doc;
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::{Client, Database};

/// Collection names for the four persistent entities §6 names plus the
/// read-only `users` lookup.
pub const ROOMS: &str = "rooms";
pub const ROOM_PLAYERS: &str = "roomPlayers";
pub const ROOM_TEAMS: &str = "roomTeams";
pub const GAME_EVENTS: &str = "gameEvents";
pub const USERS: &str = "users";

/// Establishes a connection to the durable store. Requires `MONGODB_URI`
/// and the database name to be supplied by the caller's configuration.
pub async fn connect(uri: &str, database: &str) -> Result<Database, StoreError> {
    log::info!("connecting to durable store");
    let client = Client::with_uri_str(uri).await?;
    Ok(client.database(database))
}

/// Repository trait for the room/seat/team/event persistence operations
/// (§6). Implemented directly for `mongodb::Database` so the room
/// coordinator can depend on a single cloneable `Arc<Database>` handle.
#[allow(async_fn_in_trait)]
pub trait Repository {
    async fn ping(&self) -> Result<(), StoreError>;

    async fn upsert_room_state(&self, room_id: &str, patch: RoomStatePatch) -> Result<(), StoreError>;
    async fn get_room(&self, room_id: &str) -> Result<Option<RoomDocument>, StoreError>;
    async fn get_room_by_code(&self, code: &str) -> Result<Option<RoomDocument>, StoreError>;
    async fn list_public_waiting_rooms(&self) -> Result<Vec<RoomDocument>, StoreError>;
    async fn create_room(&self, room: &RoomDocument) -> Result<(), StoreError>;
    async fn delete_room(&self, room_id: &str) -> Result<(), StoreError>;
    async fn update_room_host(&self, room_id: &str, host_seat_id: Option<&str>) -> Result<(), StoreError>;

    async fn upsert_seat(&self, seat: &SeatDocument) -> Result<(), StoreError>;
    async fn get_seats(&self, room_id: &str) -> Result<Vec<SeatDocument>, StoreError>;
    async fn delete_seat(&self, room_id: &str, user_id: &str) -> Result<(), StoreError>;

    async fn upsert_team(&self, team: &TeamDocument) -> Result<(), StoreError>;
    async fn get_teams(&self, room_id: &str) -> Result<Vec<TeamDocument>, StoreError>;

    async fn append_event(&self, event: &GameEvent) -> Result<(), StoreError>;
    async fn recent_events(&self, room_id: &str, limit: i64) -> Result<Vec<GameEvent>, StoreError>;

    async fn get_user(&self, user_id: &str) -> Result<Option<UserDocument>, StoreError>;
}

impl Repository for Database {
    async fn ping(&self) -> Result<(), StoreError> {
        self.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    async fn upsert_room_state(&self, room_id: &str, patch: RoomStatePatch) -> Result<(), StoreError> {
        let game_board = mongodb::bson::to_bson(&patch.game_board)?;
        let update = doc! {
            "$set": {
                "status": patch.status,
                "currentPlayerIndex": patch.current_player_index,
                "gameBoard": game_board,
            }
        };
        let options = FindOneAndUpdateOptions::builder().return_document(ReturnDocument::After).build();
        self.collection::<RoomDocument>(ROOMS)
            .find_one_and_update(doc! { "id": room_id }, update)
            .with_options(options)
            .await?;
        Ok(())
    }

    async fn get_room(&self, room_id: &str) -> Result<Option<RoomDocument>, StoreError> {
        Ok(self.collection::<RoomDocument>(ROOMS).find_one(doc! { "id": room_id }).await?)
    }

    async fn get_room_by_code(&self, code: &str) -> Result<Option<RoomDocument>, StoreError> {
        Ok(self.collection::<RoomDocument>(ROOMS).find_one(doc! { "code": code }).await?)
    }

    async fn list_public_waiting_rooms(&self) -> Result<Vec<RoomDocument>, StoreError> {
        use futures_util::TryStreamExt;
        let cursor = self
            .collection::<RoomDocument>(ROOMS)
            .find(doc! { "status": "waiting", "settings.visibility": "public" })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn create_room(&self, room: &RoomDocument) -> Result<(), StoreError> {
        self.collection::<RoomDocument>(ROOMS).insert_one(room).await?;
        Ok(())
    }

    async fn delete_room(&self, room_id: &str) -> Result<(), StoreError> {
        self.collection::<RoomDocument>(ROOMS).delete_one(doc! { "id": room_id }).await?;
        self.collection::<SeatDocument>(ROOM_PLAYERS).delete_many(doc! { "roomId": room_id }).await?;
        self.collection::<TeamDocument>(ROOM_TEAMS).delete_many(doc! { "roomId": room_id }).await?;
        Ok(())
    }

    async fn update_room_host(&self, room_id: &str, host_seat_id: Option<&str>) -> Result<(), StoreError> {
        self.collection::<RoomDocument>(ROOMS)
            .find_one_and_update(doc! { "id": room_id }, doc! { "$set": { "hostSeatId": host_seat_id } })
            .await?;
        Ok(())
    }

    async fn upsert_seat(&self, seat: &SeatDocument) -> Result<(), StoreError> {
        let doc_bson = mongodb::bson::to_document(seat)?;
        self.collection::<SeatDocument>(ROOM_PLAYERS)
            .find_one_and_update(
                doc! { "roomId": &seat.room_id, "userId": &seat.user_id },
                doc! { "$set": doc_bson },
            )
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn get_seats(&self, room_id: &str) -> Result<Vec<SeatDocument>, StoreError> {
        use futures_util::TryStreamExt;
        let options = FindOptions::builder().sort(doc! { "position": 1 }).build();
        let cursor = self
            .collection::<SeatDocument>(ROOM_PLAYERS)
            .find(doc! { "roomId": room_id })
            .with_options(options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn delete_seat(&self, room_id: &str, user_id: &str) -> Result<(), StoreError> {
        self.collection::<SeatDocument>(ROOM_PLAYERS)
            .delete_one(doc! { "roomId": room_id, "userId": user_id })
            .await?;
        Ok(())
    }

    async fn upsert_team(&self, team: &TeamDocument) -> Result<(), StoreError> {
        let doc_bson = mongodb::bson::to_document(team)?;
        self.collection::<TeamDocument>(ROOM_TEAMS)
            .find_one_and_update(
                doc! { "roomId": &team.room_id, "teamIndex": team.team_index },
                doc! { "$set": doc_bson },
            )
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn get_teams(&self, room_id: &str) -> Result<Vec<TeamDocument>, StoreError> {
        use futures_util::TryStreamExt;
        let cursor = self.collection::<TeamDocument>(ROOM_TEAMS).find(doc! { "roomId": room_id }).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn append_event(&self, event: &GameEvent) -> Result<(), StoreError> {
        self.collection::<GameEvent>(GAME_EVENTS).insert_one(event).await?;
        Ok(())
    }

    async fn recent_events(&self, room_id: &str, limit: i64) -> Result<Vec<GameEvent>, StoreError> {
        use futures_util::TryStreamExt;
        let options = FindOptions::builder().sort(doc! { "createdAt": -1 }).limit(limit).build();
        let cursor = self
            .collection::<GameEvent>(GAME_EVENTS)
            .find(doc! { "roomId": room_id })
            .with_options(options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<UserDocument>, StoreError> {
        Ok(self.collection::<UserDocument>(USERS).find_one(doc! { "id": user_id }).await?)
    }
}
