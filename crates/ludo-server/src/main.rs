//! Ludo Room Server binary (§6 "External Interfaces").
//!
//! Wires the already-independent crates together: durable store connection,
//! optional shared cache, write-behind game state cache, in-process
//! broadcaster, and the room coordinator — then serves the HTTP/WebSocket
//! surface over actix-web. This crate has no `[lib]` target to split into,
//! so `run` lives here instead.
mod auth;
mod config;
mod routes;
mod state;
mod ws;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use config::Config;
use ludo_cache::{Cache, MemoryCache, RedisCache};
use ludo_realtime::{InMemoryBroadcaster, Realtime};
use ludo_room::{Coordinator, CoordinatorSettings};
use ludo_taunt::TauntProfile;
use ludo_store::GameStateCache;
use state::AppState;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();
    let config = Config::from_env();

    let db = ludo_store::connect(&config.mongodb_uri, &config.mongodb_database)
        .await
        .unwrap_or_else(|e| panic!("failed to connect to durable store: {e}"));
    let store = Arc::new(db);

    let shared_cache: Option<Arc<dyn Cache>> = match &config.redis_url {
        Some(url) => match RedisCache::connect(url).await {
            Ok(cache) => Some(Arc::new(cache) as Arc<dyn Cache>),
            Err(e) => {
                log::warn!("redis unavailable ({e}), degrading to memory-only shared cache");
                Some(Arc::new(MemoryCache::new()) as Arc<dyn Cache>)
            }
        },
        None => {
            log::info!("REDIS_URL not set, shared cache runs memory-only");
            Some(Arc::new(MemoryCache::new()) as Arc<dyn Cache>)
        }
    };

    let cache = Arc::new(GameStateCache::new(store.clone(), shared_cache.clone(), config.flush_interval, config.cache_ttl));
    let realtime: Arc<dyn Realtime> = Arc::new(InMemoryBroadcaster::new());

    let settings = CoordinatorSettings {
        engagement_enabled: config.engagement_dice_enabled,
        taunt_enabled: config.taunt_system_enabled,
        move_log_max_items: config.move_log_max_items,
        move_log_ttl: config.move_log_ttl,
    };
    let taunt_profile = TauntProfile {
        cooldown: std::time::Duration::from_millis(config.taunt_cooldown_ms),
        limit_per_minute: config.taunt_limit_per_min,
        auto_burst_limit: config.taunt_auto_burst_limit,
        ..TauntProfile::default()
    };
    let coordinator = Arc::new(Coordinator::new(cache, store, realtime.clone(), shared_cache, settings, taunt_profile));

    let flush_handle = coordinator.clone();
    let flush_interval = flush_handle.flush_interval();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(flush_interval);
        ticker.tick().await; // first tick fires immediately; nothing is dirty yet
        loop {
            ticker.tick().await;
            flush_handle.flush_dirty().await;
        }
    });

    let app_state = web::Data::new(AppState { coordinator: coordinator.clone(), realtime, jwt_secret: config.jwt_secret.clone() });
    let jwt_secret = web::Data::new(config.jwt_secret.clone());
    let cors_origins = config.cors_origins.clone();
    let port = config.port;

    log::info!("starting ludo-server on port {port}");
    let server = HttpServer::new(move || {
        let mut cors = Cors::default().allowed_methods(vec!["GET", "POST", "PATCH", "DELETE"]).allow_any_header();
        cors = if cors_origins.iter().any(|o| o == "*") {
            cors.allow_any_origin()
        } else {
            cors_origins.iter().fold(cors, |c, origin| c.allowed_origin(origin))
        };
        App::new()
            .wrap(Logger::new("%r %s %Ts"))
            .wrap(cors)
            .app_data(app_state.clone())
            .app_data(jwt_secret.clone())
            .route("/health", web::get().to(routes::health))
            .route("/ws", web::get().to(ws::ws_entry))
            .service(
                web::scope("/rooms")
                    .route("", web::post().to(routes::create_room))
                    .route("", web::get().to(routes::list_rooms))
                    .route("/join", web::post().to(routes::join_room_by_code))
                    .route("/{id}", web::get().to(routes::get_room))
                    .route("/{id}", web::delete().to(routes::leave_room))
                    .route("/{id}/join", web::post().to(routes::join_room_by_id))
                    .route("/{id}/leave", web::post().to(routes::leave_room))
                    .route("/{id}/ready", web::patch().to(routes::set_ready))
                    .route("/{id}/slot", web::patch().to(routes::set_slot))
                    .route("/{id}/team-names", web::patch().to(routes::set_team_names))
                    .route("/{id}/start", web::post().to(routes::start_game))
                    .route("/{id}/dice", web::post().to(routes::roll_dice))
                    .route("/{id}/move", web::post().to(routes::make_move))
                    .route("/{id}/next-turn", web::post().to(routes::next_turn))
                    .route("/{id}/events", web::get().to(routes::recent_events)),
            )
    })
    .bind(("0.0.0.0", port))?
    .run();

    let server_handle = server.handle();
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();
        #[cfg(unix)]
        {
            let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()).expect("failed to install SIGTERM handler");
            tokio::select! {
                _ = ctrl_c => {}
                _ = terminate.recv() => {}
            }
        }
        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
        }
        log::info!("shutdown signal received, flushing dirty rooms");
        coordinator.shutdown().await;
        server_handle.stop(true).await;
    });

    server.await
}
