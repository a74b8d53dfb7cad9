//! HTTP surface (§6): one handler per endpoint, each translating a
//! `CoordinatorError` into the `{success:false, error}` envelope at the
//! status its `kind()` maps to. Handlers stay a few lines of extraction plus
//! a single coordinator call.
use crate::auth::Auth;
use crate::state::AppState;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, Responder};
use ludo_room::{CoordinatorError, CreateRoomRequest, JoinRoomRequest, MoveRequest, TeamNamesRequest};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;

fn ok<T: serde::Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "success": true, "data": data }))
}

fn err(error: CoordinatorError) -> HttpResponse {
    let status = StatusCode::from_u16(error.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    log::warn!("request failed: {error}");
    HttpResponse::build(status).json(json!({ "success": false, "error": error.to_string() }))
}

fn respond<T: serde::Serialize>(result: Result<T, CoordinatorError>) -> HttpResponse {
    match result {
        Ok(data) => ok(data),
        Err(e) => err(e),
    }
}

pub async fn create_room(state: web::Data<AppState>, auth: Auth, body: web::Json<CreateRoomRequest>) -> impl Responder {
    respond(state.coordinator.create_room(auth.user_id(), body.into_inner()).await)
}

pub async fn list_rooms(state: web::Data<AppState>, _auth: Auth) -> impl Responder {
    respond(state.coordinator.list_public_waiting_rooms().await)
}

pub async fn get_room(state: web::Data<AppState>, _auth: Auth, path: web::Path<String>) -> impl Responder {
    respond(state.coordinator.get_room(&path.into_inner()).await)
}

pub async fn join_room_by_code(state: web::Data<AppState>, auth: Auth, body: web::Json<JoinRoomRequest>) -> impl Responder {
    respond(state.coordinator.join_room(auth.user_id(), "", body.into_inner()).await)
}

pub async fn join_room_by_id(
    state: web::Data<AppState>,
    auth: Auth,
    path: web::Path<String>,
    body: Option<web::Json<JoinRoomRequest>>,
) -> impl Responder {
    let req = body.map(web::Json::into_inner).unwrap_or(JoinRoomRequest { code: None, selected_color: None });
    respond(state.coordinator.join_room(auth.user_id(), &path.into_inner(), req).await)
}

pub async fn leave_room(state: web::Data<AppState>, auth: Auth, path: web::Path<String>) -> impl Responder {
    respond(state.coordinator.leave_room(auth.user_id(), &path.into_inner()).await)
}

#[derive(Debug, Deserialize)]
pub struct ReadyBody {
    pub ready: bool,
}

pub async fn set_ready(state: web::Data<AppState>, auth: Auth, path: web::Path<String>, body: web::Json<ReadyBody>) -> impl Responder {
    respond(state.coordinator.set_ready(auth.user_id(), &path.into_inner(), body.ready).await)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotBody {
    pub slot_index: usize,
}

pub async fn set_slot(state: web::Data<AppState>, auth: Auth, path: web::Path<String>, body: web::Json<SlotBody>) -> impl Responder {
    respond(state.coordinator.set_slot(auth.user_id(), &path.into_inner(), body.slot_index).await)
}

pub async fn set_team_names(state: web::Data<AppState>, auth: Auth, path: web::Path<String>, body: web::Json<TeamNamesRequest>) -> impl Responder {
    respond(state.coordinator.set_team_names(auth.user_id(), &path.into_inner(), body.into_inner()).await)
}

pub async fn start_game(state: web::Data<AppState>, auth: Auth, path: web::Path<String>) -> impl Responder {
    respond(state.coordinator.start_game(auth.user_id(), &path.into_inner()).await)
}

pub async fn roll_dice(state: web::Data<AppState>, auth: Auth, path: web::Path<String>) -> impl Responder {
    respond(state.coordinator.roll_dice(auth.user_id(), &path.into_inner()).await)
}

pub async fn make_move(state: web::Data<AppState>, auth: Auth, path: web::Path<String>, body: web::Json<MoveRequest>) -> impl Responder {
    respond(state.coordinator.make_move(auth.user_id(), &path.into_inner(), body.into_inner()).await)
}

pub async fn next_turn(state: web::Data<AppState>, auth: Auth, path: web::Path<String>) -> impl Responder {
    respond(state.coordinator.advance_turn(auth.user_id(), &path.into_inner()).await)
}

fn parse_limit(query: &HashMap<String, String>) -> i64 {
    query.get("limit").and_then(|v| v.parse::<i64>().ok()).unwrap_or(50).clamp(1, 300)
}

pub async fn recent_events(state: web::Data<AppState>, _auth: Auth, path: web::Path<String>, query: web::Query<HashMap<String, String>>) -> impl Responder {
    let limit = parse_limit(&query);
    respond(state.coordinator.recent_events(&path.into_inner(), limit).await)
}

pub async fn health(state: web::Data<AppState>) -> impl Responder {
    let (db_ok, cache_ok) = state.coordinator.ping().await;
    HttpResponse::Ok().json(json!({ "dbState": if db_ok { "connected" } else { "disconnected" }, "cacheConnected": cache_ok }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_limit_defaults_to_fifty() {
        assert_eq!(parse_limit(&HashMap::new()), 50);
    }

    #[test]
    fn limit_is_clamped_to_the_spec_window() {
        let mut query = HashMap::new();
        query.insert("limit".to_string(), "10000".to_string());
        assert_eq!(parse_limit(&query), 300);
        query.insert("limit".to_string(), "0".to_string());
        assert_eq!(parse_limit(&query), 1);
    }

    #[test]
    fn every_coordinator_error_maps_to_its_kind_status() {
        for (error, expected) in [
            (CoordinatorError::Unauthorized, 401),
            (CoordinatorError::RoomNotFound, 404),
            (CoordinatorError::NotHost, 403),
            (CoordinatorError::AlreadyRolled, 400),
            (CoordinatorError::Internal("boom".into()), 500),
        ] {
            let response = err(error);
            assert_eq!(response.status().as_u16(), expected);
        }
    }
}
