#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("durable store error: {0}")]
    Mongo(#[from] mongodb::error::Error),
    #[error("cache error: {0}")]
    Cache(#[from] ludo_cache::CacheError),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("bson serialization error: {0}")]
    Bson(#[from] mongodb::bson::ser::Error),
    #[error("room {0} not found")]
    RoomNotFound(String),
}
