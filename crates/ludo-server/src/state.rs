use ludo_realtime::Realtime;
use ludo_room::Coordinator;
use std::sync::Arc;

/// Concrete `Repository` the server binary runs against. `ludo-room` stays
/// generic over `R: Repository` so the coordinator's own tests can swap in
/// an in-memory store, but the binary only ever talks to MongoDB.
pub type AppCoordinator = Coordinator<mongodb::Database>;

/// actix `app_data` handle shared across every request and the WebSocket
/// gateway — one `Data` wrapper per long-lived collaborator.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<AppCoordinator>,
    pub realtime: Arc<dyn Realtime>,
    pub jwt_secret: String,
}
