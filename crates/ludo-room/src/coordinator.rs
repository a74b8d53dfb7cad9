//! Room Coordinator (§4.6): the lifecycle and in-game operation surface
//! that ties the pure rule engine, the engagement dice engine, the taunt
//! director, the write-behind cache, and the realtime broadcaster together
//! under per-room mutual exclusion.
use crate::engagement::EngagementState;
use crate::error::CoordinatorError;
use crate::model::{GameBoard, RoomSettings, RoomState, RoomStatus, Seat, SeatStatus, TauntMode, Visibility, WinnerEntry};
use crate::runtime::RoomRuntime;
use chrono::Utc;
use ludo_board::{color_order, BoardConfig, Color, HOME_RUN_START, MAIN_TRACK_LEN};
use ludo_cache::Cache;
use ludo_dice::{Profile as DiceProfile, RollRequest, StoryPhase};
use ludo_realtime::{Realtime, RoomEvent};
use ludo_rules::{RoomMode, Token, TokenStatus, Tokens};
use ludo_store::{GameEvent, GameStateCache, Repository, RoomDocument, RoomStatePatch, SeatDocument, TeamDocument};
use ludo_taunt::{DirectorOutcome, Emotion, TauntDirector, TauntEvent, TauntProfile};
use rand::Rng;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

const MAX_TOKEN_PROGRESS: i32 = 58;
const NEAR_WIN_PROGRESS: i32 = 4 * MAX_TOKEN_PROGRESS - 32;
const ROOM_CODE_LEN: usize = 6;
const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const ROOM_CODE_MAX_ATTEMPTS: u32 = 25;
const SLOT_JOIN_MAX_ATTEMPTS: u32 = 5;

/// §9 "luck debt" decay applied once per resolved roll, within the open
/// range `ρ ∈ [0.6, 0.99]`; `Momentum::report_outcome` clamps whatever is
/// passed, so this is the single call-site choice: close to the upper end
/// so a bad run decays slowly enough to be felt but never dominates a whole
/// match.
const LUCK_DEBT_FORGIVENESS: f64 = 0.85;

/// Taunt events allowed to auto-emit in `hybrid` mode (§4.4, Open Question):
/// the high-signal, hard-to-spam moments. Every other event still produces
/// suggestions, just never auto-fires, in hybrid mode.
const HYBRID_AUTO_EVENTS: [TauntEvent; 3] = [TauntEvent::RevengeKill, TauntEvent::RolledSix, TauntEvent::ClutchRoll];

const MOVE_GRACE: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    pub max_players: u8,
    pub mode: RoomMode,
    pub visibility: Visibility,
    pub selected_color: Option<Color>,
    pub taunt_mode: Option<TauntMode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomRequest {
    pub code: Option<String>,
    pub selected_color: Option<Color>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamNamesRequest {
    pub team_names: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    pub token_id: u8,
    pub color: Color,
    pub dice_value: u8,
}

/// Response shape for `POST /rooms/:id/dice` (§6).
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RollResponse {
    pub dice: u8,
    pub valid: bool,
    pub patch: Value,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    #[serde(flatten)]
    pub room: RoomDocument,
    pub player_count: usize,
}

/// Knobs the server layer derives from §6 environment variables that the
/// coordinator needs but the cache/store crates don't own.
#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    pub engagement_enabled: bool,
    pub taunt_enabled: bool,
    pub move_log_max_items: usize,
    pub move_log_ttl: Duration,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            engagement_enabled: true,
            taunt_enabled: true,
            move_log_max_items: 300,
            move_log_ttl: Duration::from_secs(86_400),
        }
    }
}

pub struct Coordinator<R> {
    cache: Arc<GameStateCache<RoomRuntime, R>>,
    store: Arc<R>,
    realtime: Arc<dyn Realtime>,
    shared_cache: Option<Arc<dyn Cache>>,
    taunts: RwLock<HashMap<String, Arc<Mutex<TauntDirector<String>>>>>,
    dice_profile: DiceProfile,
    taunt_profile: TauntProfile,
    settings: CoordinatorSettings,
}

impl<R> Coordinator<R>
where
    R: Repository + Send + Sync + 'static,
{
    pub fn new(
        cache: Arc<GameStateCache<RoomRuntime, R>>,
        store: Arc<R>,
        realtime: Arc<dyn Realtime>,
        shared_cache: Option<Arc<dyn Cache>>,
        settings: CoordinatorSettings,
        taunt_profile: TauntProfile,
    ) -> Self {
        Self {
            cache,
            store,
            realtime,
            shared_cache,
            taunts: RwLock::new(HashMap::new()),
            dice_profile: DiceProfile::default(),
            taunt_profile,
            settings,
        }
    }

    // ---------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------

    pub async fn create_room(&self, user_id: &str, req: CreateRoomRequest) -> Result<RoomState, CoordinatorError> {
        if !(2..=6).contains(&req.max_players) {
            return Err(CoordinatorError::Validation("maxPlayers must be between 2 and 6".into()));
        }
        if !req.mode.is_valid_for(req.max_players as usize) {
            return Err(CoordinatorError::Validation("team mode requires 4 or 6 players".into()));
        }

        let code = self.unique_room_code().await?;
        let team_names = if matches!(req.mode, RoomMode::Team) { vec![String::new(); req.max_players as usize / 2] } else { Vec::new() };
        let settings = RoomSettings {
            max_players: req.max_players,
            mode: req.mode,
            visibility: req.visibility,
            team_names,
            taunt_mode: req.taunt_mode.unwrap_or(TauntMode::Suggestion),
        };

        let room_id = uuid::Uuid::now_v7().to_string();
        let mut state = RoomState::new(room_id.clone(), code, settings);

        let colors = state.colors();
        let color = req.selected_color.filter(|c| colors.contains(c)).unwrap_or(colors[0]);
        let seat = Seat {
            id: uuid::Uuid::now_v7().to_string(),
            user_id: user_id.to_string(),
            color,
            position: 0,
            team_index: matches!(state.settings.mode, RoomMode::Team).then_some(0),
            status: SeatStatus::Waiting,
            ready: false,
        };
        state.host_seat_id = Some(seat.id.clone());
        state.seats.push(seat.clone());

        self.store.create_room(&room_document(&state)).await?;
        self.store.upsert_seat(&seat_document(&state.id, &seat)).await?;
        self.cache.prime(&state.id, RoomRuntime::new(state.clone())).await;
        if self.settings.taunt_enabled {
            self.taunts.write().await.insert(state.id.clone(), Arc::new(Mutex::new(TauntDirector::new(self.taunt_profile))));
        }

        self.record_event(&state.id, "room:created", json!({ "code": &state.code }), Some(user_id), Some(&seat.id), None).await;
        Ok(state)
    }

    /// §5: color/slot assignment reads current seats, picks a free slot, and
    /// writes — serialized by a unique constraint on `(roomId, userId)` plus
    /// a retry, not by `runExclusive`. The in-memory mirror is updated
    /// through `runExclusive` only after the slot is already decided, since
    /// that step is a pure structural append with no remaining race.
    pub async fn join_room(&self, user_id: &str, room_id: &str, req: JoinRoomRequest) -> Result<RoomState, CoordinatorError> {
        let room_doc = self.resolve_room_doc(room_id, req.code.as_deref()).await?;
        if room_doc.status != "waiting" {
            return Err(CoordinatorError::RoomNotJoinable);
        }
        let max_players = room_settings_max_players(&room_doc)?;

        for _ in 0..SLOT_JOIN_MAX_ATTEMPTS {
            let seats = self.store.get_seats(&room_doc.id).await?;
            if let Some(existing) = seats.iter().find(|s| s.user_id == user_id) {
                let _ = existing;
                return self.snapshot_or_err(&room_doc.id).await;
            }
            if seats.len() >= max_players as usize {
                return Err(CoordinatorError::RoomFull);
            }

            let colors = color_order(max_players as usize);
            let taken_colors: HashSet<&str> = seats.iter().map(|s| s.color.as_str()).collect();
            let taken_positions: HashSet<i64> = seats.iter().map(|s| s.position).collect();

            let Some(color) = req
                .selected_color
                .filter(|c| !taken_colors.contains(c.to_string().as_str()))
                .or_else(|| colors.iter().find(|c| !taken_colors.contains(c.to_string().as_str())).copied())
            else {
                return Err(CoordinatorError::RoomFull);
            };
            let Some(position) = (0..max_players as i64).find(|p| !taken_positions.contains(p)) else {
                return Err(CoordinatorError::RoomFull);
            };

            let seat_id = uuid::Uuid::now_v7().to_string();
            let team_index = matches!(room_doc.settings["mode"].as_str(), Some("team")).then(|| position % (max_players as i64 / 2));
            let doc = SeatDocument {
                id: seat_id.clone(),
                room_id: room_doc.id.clone(),
                user_id: user_id.to_string(),
                color: color.to_string(),
                position,
                team_index,
                status: "waiting".to_string(),
                ready: false,
            };
            if self.store.upsert_seat(&doc).await.is_err() {
                continue;
            }

            let seat = Seat {
                id: seat_id,
                user_id: user_id.to_string(),
                color,
                position: position as usize,
                team_index: team_index.map(|t| t as usize),
                status: SeatStatus::Waiting,
                ready: false,
            };
            let ((), _revision) = self
                .cache
                .run_exclusive(&room_doc.id, move |runtime, _rev| {
                    let seat = seat.clone();
                    async move {
                        runtime.state.seats.push(seat);
                        ((), true)
                    }
                })
                .await?;
            self.cache.mirror(&room_doc.id).await;
            let snapshot = self.snapshot_or_err(&room_doc.id).await?;
            let joined_seat_id = snapshot.seat_by_user(user_id).map(|s| s.id.clone());
            self.record_event(&room_doc.id, "room:player-joined", json!({ "color": color.to_string() }), Some(user_id), joined_seat_id.as_deref(), None).await;
            return Ok(snapshot);
        }
        Err(CoordinatorError::Internal("could not allocate a room slot after retrying".into()))
    }

    pub async fn leave_room(&self, user_id: &str, room_id: &str) -> Result<(), CoordinatorError> {
        let seats = self.store.get_seats(room_id).await?;
        let seat = seats.iter().find(|s| s.user_id == user_id).ok_or(CoordinatorError::SeatNotFound)?.clone();
        self.store.delete_seat(room_id, user_id).await?;

        let remaining: Vec<SeatDocument> = seats.into_iter().filter(|s| s.user_id != user_id).collect();
        if remaining.is_empty() {
            self.store.delete_room(room_id).await?;
            self.cache.evict(room_id).await;
            self.realtime.drop_room(room_id);
            self.taunts.write().await.remove(room_id);
            return Ok(());
        }

        let removed_user = user_id.to_string();
        let ((), revision) = self
            .cache
            .run_exclusive(room_id, move |runtime, _rev| {
                let removed_user = removed_user.clone();
                async move {
                    runtime.state.seats.retain(|s| s.user_id != removed_user);
                    if !runtime.state.seats.iter().any(|s| Some(&s.id) == runtime.state.host_seat_id.as_ref()) {
                        runtime.state.host_seat_id = runtime.state.seats.first().map(|s| s.id.clone());
                    }
                    ((), true)
                }
            })
            .await?;
        let snapshot = self.snapshot_or_err(room_id).await?;
        self.store.update_room_host(room_id, snapshot.host_seat_id.as_deref()).await?;
        self.cache.mirror(room_id).await;
        self.record_event(room_id, "room:player-left", json!({}), Some(user_id), Some(&seat.user_id), Some(revision)).await;
        Ok(())
    }

    pub async fn set_ready(&self, user_id: &str, room_id: &str, ready: bool) -> Result<Seat, CoordinatorError> {
        let user_id_owned = user_id.to_string();
        let (result, revision) = self
            .cache
            .run_exclusive(room_id, move |runtime, _rev| {
                let user_id = user_id_owned.clone();
                async move {
                    let Some(seat) = runtime.state.seat_by_user_mut(&user_id) else {
                        return (Err(CoordinatorError::SeatNotFound), false);
                    };
                    seat.ready = ready;
                    (Ok(seat.clone()), true)
                }
            })
            .await?;
        let seat = result?;
        self.store.upsert_seat(&seat_document(room_id, &seat)).await?;
        self.cache.mirror(room_id).await;
        self.record_event(room_id, "room:player-ready", json!({ "ready": seat.ready }), Some(user_id), Some(&seat.id), Some(revision)).await;
        Ok(seat)
    }

    pub async fn set_slot(&self, user_id: &str, room_id: &str, slot_index: usize) -> Result<RoomState, CoordinatorError> {
        let user_id_owned = user_id.to_string();
        let (result, revision) = self
            .cache
            .run_exclusive(room_id, move |runtime, _rev| {
                let user_id = user_id_owned.clone();
                async move {
                    let state = &mut runtime.state;
                    if !matches!(state.settings.mode, RoomMode::Team) {
                        return (Err(CoordinatorError::Validation("slot assignment only applies in team mode".into())), false);
                    }
                    if !matches!(state.status, RoomStatus::Waiting) {
                        return (Err(CoordinatorError::RoomNotJoinable), false);
                    }
                    if slot_index >= state.settings.max_players as usize {
                        return (Err(CoordinatorError::Validation("slot index out of range".into())), false);
                    }
                    if state.seats.iter().any(|s| s.position == slot_index && s.user_id != user_id) {
                        return (Err(CoordinatorError::Validation("slot already taken".into())), false);
                    }
                    let max_players = state.settings.max_players as usize;
                    let Some(seat) = state.seat_by_user_mut(&user_id) else {
                        return (Err(CoordinatorError::SeatNotFound), false);
                    };
                    seat.position = slot_index;
                    seat.color = color_order(max_players)[slot_index];
                    seat.team_index = Some(ludo_rules::team_of(slot_index, max_players));
                    (Ok(runtime.state.clone()), true)
                }
            })
            .await?;
        let state = result?;
        if let Some(seat) = state.seat_by_user(user_id) {
            self.store.upsert_seat(&seat_document(room_id, seat)).await?;
        }
        self.cache.mirror(room_id).await;
        let patch = json!({ "revision": revision, "seats": state.seats });
        self.realtime.publish_room(RoomEvent::patch(room_id, "room:slot-change", patch.clone()));
        self.record_event(room_id, "room:slot-change", patch, Some(user_id), None, Some(revision)).await;
        Ok(state)
    }

    pub async fn set_team_names(&self, user_id: &str, room_id: &str, req: TeamNamesRequest) -> Result<RoomState, CoordinatorError> {
        let user_id_owned = user_id.to_string();
        let team_names = req.team_names;
        let (result, revision) = self
            .cache
            .run_exclusive(room_id, move |runtime, _rev| {
                let user_id = user_id_owned.clone();
                let team_names = team_names.clone();
                async move {
                    let state = &mut runtime.state;
                    if state.host_seat_id.as_deref() != state.seat_by_user(&user_id).map(|s| s.id.as_str()) {
                        return (Err(CoordinatorError::NotHost), false);
                    }
                    if !matches!(state.settings.mode, RoomMode::Team) || !matches!(state.status, RoomStatus::Waiting) {
                        return (Err(CoordinatorError::Validation("team names only apply to a waiting team-mode room".into())), false);
                    }
                    if team_names.len() != state.settings.max_players as usize / 2 {
                        return (Err(CoordinatorError::Validation("wrong number of team names".into())), false);
                    }
                    state.settings.team_names = team_names;
                    (Ok(runtime.state.clone()), true)
                }
            })
            .await?;
        let state = result?;
        for (i, name) in state.settings.team_names.iter().enumerate() {
            self.store.upsert_team(&TeamDocument { room_id: room_id.to_string(), team_index: i as i64, name: name.clone() }).await?;
        }
        self.cache.mirror(room_id).await;
        let patch = json!({ "revision": revision, "teamNames": state.settings.team_names });
        self.realtime.publish_room(RoomEvent::patch(room_id, "room:team-names", patch.clone()));
        self.record_event(room_id, "room:team-names", patch, Some(user_id), None, Some(revision)).await;
        Ok(state)
    }

    /// §4.6 "Start" (host only, `status=waiting`).
    pub async fn start_game(&self, user_id: &str, room_id: &str) -> Result<RoomState, CoordinatorError> {
        let user_id_owned = user_id.to_string();
        let (result, revision) = self
            .cache
            .run_exclusive(room_id, move |runtime, _rev| {
                let user_id = user_id_owned.clone();
                async move {
                    let state = &mut runtime.state;
                    if state.host_seat_id.as_deref() != state.seat_by_user(&user_id).map(|s| s.id.as_str()) {
                        return (Err(CoordinatorError::NotHost), false);
                    }
                    if !matches!(state.status, RoomStatus::Waiting) {
                        return (Err(CoordinatorError::Validation("room is not waiting".into())), false);
                    }
                    if state.seats.len() < 2 || !state.seats.iter().all(|s| s.ready) {
                        return (Err(CoordinatorError::Validation("need at least 2 ready seats to start".into())), false);
                    }
                    let colors = state.colors().to_vec();
                    state.board = GameBoard::new(&colors);
                    let first = rand::rng().random_range(0..state.seats.len());
                    state.current_player_index = first;
                    state.board.current_player_id = state.seats.get(first).map(|s| s.id.clone());
                    state.status = RoomStatus::InProgress;
                    for seat in state.seats.iter_mut() {
                        seat.status = SeatStatus::Playing;
                    }
                    state.board.log("Game started");
                    (Ok(runtime.state.clone()), true)
                }
            })
            .await?;
        let state = result?;
        self.cache.mirror(room_id).await;
        let patch = full_patch(&state, revision);
        self.realtime.publish_room(RoomEvent::patch(room_id, "game:start", patch.clone()));
        self.record_event(room_id, "game:start", patch, Some(user_id), None, Some(revision)).await;
        Ok(state)
    }

    // ---------------------------------------------------------------
    // In-game operations
    // ---------------------------------------------------------------

    pub async fn roll_dice(&self, user_id: &str, room_id: &str) -> Result<RollResponse, CoordinatorError> {
        let user_id_owned = user_id.to_string();
        let taunt_director = self.taunt_director(room_id).await;
        let engagement_enabled = self.settings.engagement_enabled;
        let profile = self.dice_profile;
        let realtime = self.realtime.clone();
        let room_id_owned = room_id.to_string();

        let (result, revision) = self
            .cache
            .run_exclusive(room_id, move |runtime, _rev| {
                let user_id = user_id_owned.clone();
                let taunt_director = taunt_director.clone();
                let realtime = realtime.clone();
                let room_id = room_id_owned.clone();
                async move {
                    let state = &mut runtime.state;
                    let Some(seat) = state.current_seat().cloned() else {
                        return (Err(CoordinatorError::RoomNotFound), false);
                    };
                    if seat.user_id != user_id {
                        return (Err(CoordinatorError::NotYourTurn), false);
                    }
                    if state.board.dice_value.is_some() {
                        return (Err(CoordinatorError::AlreadyRolled), false);
                    }
                    if matches!(state.settings.mode, RoomMode::Individual) && state.is_finished_color(seat.color) {
                        return (Err(CoordinatorError::WinnerCannotRoll), false);
                    }

                    let controlled = state.controlled_colors(&seat);
                    let all_colors = state.colors();
                    let mode = state.settings.mode;

                    let EngagementState { momentum, force_state, story } = &mut runtime.engagement;
                    let momentum_entry = momentum.entry(seat.id.clone()).or_default();
                    let phase = story.phase;

                    let face = if engagement_enabled {
                        ludo_dice::roll(
                            RollRequest { tokens: &state.board.tokens, controlled: &controlled, all_colors, momentum: momentum_entry, phase },
                            &profile,
                            force_state,
                            &mut rand::rng(),
                        )
                    } else {
                        rand::rng().random_range(1..=6)
                    };

                    let valid_moves = ludo_rules::find_valid_moves(&state.board.tokens, face, &controlled);
                    let now = Utc::now();
                    state.board.dice_value = Some(face);
                    state.board.last_roll_at = Some(now);

                    let all_in_base = controlled.iter().flat_map(|c| state.board.tokens.get(c)).flatten().all(|t| t.status == TokenStatus::Base);
                    let had_valid_move = !valid_moves.is_empty();

                    if valid_moves.is_empty() {
                        state.board.valid_moves.clear();
                        state.board.log(format!("{} had no valid move", seat.color));
                        let winners: HashSet<usize> = state.seats.iter().enumerate().filter(|(_, s)| state.is_finished_color(s.color)).map(|(i, _)| i).collect();
                        let next = ludo_rules::advance_turn(state.current_player_index, state.seats.len(), &winners, true);
                        state.current_player_index = next;
                        state.board.current_player_id = state.seats.get(next).map(|s| s.id.clone());
                        state.board.dice_value = None;
                        state.board.last_roll_at = None;
                    } else {
                        state.board.valid_moves = valid_moves;
                    }

                    if engagement_enabled {
                        let momentum_entry = runtime.engagement.momentum_for(&seat.id);
                        momentum_entry.report_outcome(face, had_valid_move, all_in_base, LUCK_DEBT_FORGIVENESS);
                        let comeback_triggered = momentum_entry.luck_delta <= profile.emotion_recovery_luck_debt && face >= 5;
                        runtime.engagement.story.report_roll(0, leader_seat_index(&runtime.state), any_near_win(&runtime.state), comeback_triggered);
                    }

                    if let Some(director) = &taunt_director {
                        let mode_taunt = runtime.state.settings.taunt_mode;
                        let remaining = runtime.state.seats.iter().filter(|s| !runtime.state.is_finished_color(s.color)).count();
                        let mut events = Vec::new();
                        if face == 6 {
                            events.push(TauntEvent::RolledSix);
                        }
                        if face >= 5 && remaining <= 2 {
                            events.push(TauntEvent::ClutchRoll);
                        }
                        if had_valid_move && is_last_seat(&runtime.state, &seat) {
                            events.push(TauntEvent::LastPlace);
                        }
                        let mut director = director.lock().await;
                        let now_instant = Instant::now();
                        for event in events {
                            let outcome = director.consider(event, seat.id.clone(), auto_allowed(mode_taunt, event), &[], now_instant, &mut rand::rng());
                            publish_taunt_outcome(realtime.as_ref(), &room_id, &seat, outcome);
                        }
                    }

                    (Ok((face, had_valid_move)), true)
                }
            })
            .await?;
        let (face, valid) = result?;
        self.cache.mirror(room_id).await;
        let state = self.snapshot_or_err(room_id).await?;
        let patch = json!({
            "revision": revision,
            "currentPlayerIndex": state.current_player_index,
            "gameBoard": {
                "diceValue": state.board.dice_value,
                "validMoves": state.board.valid_moves,
                "currentPlayerId": state.board.current_player_id,
                "lastRollAt": state.board.last_roll_at,
            }
        });
        self.realtime.publish_room(RoomEvent { room_id: room_id.to_string(), kind: "dice:roll".to_string(), patch: Some(patch.clone()), dice: Some(face), color: None, token_id: None, dice_value: None });
        self.record_event(room_id, "dice:roll", patch.clone(), Some(user_id), None, Some(revision)).await;
        Ok(RollResponse { dice: face, valid, patch })
    }

    pub async fn make_move(&self, user_id: &str, room_id: &str, req: MoveRequest) -> Result<RoomState, CoordinatorError> {
        let user_id_owned = user_id.to_string();
        let taunt_director = self.taunt_director(room_id).await;
        let engagement_enabled = self.settings.engagement_enabled;
        let profile = self.dice_profile;
        let realtime = self.realtime.clone();
        let room_id_owned = room_id.to_string();

        let (result, revision) = self
            .cache
            .run_exclusive(room_id, move |runtime, _rev| {
                let user_id = user_id_owned.clone();
                let taunt_director = taunt_director.clone();
                let realtime = realtime.clone();
                let room_id = room_id_owned.clone();
                async move {
                    let state = &mut runtime.state;
                    let Some(seat) = state.current_seat().cloned() else {
                        return (Err(CoordinatorError::RoomNotFound), false);
                    };
                    if seat.user_id != user_id {
                        return (Err(CoordinatorError::NotYourTurn), false);
                    }
                    if matches!(state.settings.mode, RoomMode::Individual) && state.is_finished_color(seat.color) {
                        return (Err(CoordinatorError::WinnerCannotMove), false);
                    }
                    let Some(dice) = state.board.dice_value else {
                        return (Err(CoordinatorError::DiceMismatch), false);
                    };
                    if dice != req.dice_value || !state.board.valid_moves.contains(&(req.token_id, req.color)) {
                        return (Err(CoordinatorError::InvalidMove), false);
                    }
                    let controlled = state.controlled_colors(&seat);
                    if !controlled.contains(&req.color) {
                        return (Err(CoordinatorError::InvalidTeamColor), false);
                    }

                    let original = state.board.tokens.clone();
                    let Some(effective) = ludo_rules::legal_move_effective_dice(&original, (req.token_id, req.color), dice, &controlled) else {
                        return (Err(CoordinatorError::InvalidMove), false);
                    };
                    let members = stack_members(&original, &controlled, req.token_id, req.color);
                    let is_stack_mover = members.len() > 1;

                    let mut working = original.clone();
                    let mut captured: HashSet<(u8, Color)> = HashSet::new();
                    let mut any_home_transition = false;
                    let mut released_token = false;

                    for &(id, color) in &members {
                        let Some(token) = original.get(&color).and_then(|ts| ts.iter().find(|t| t.id == id)).copied() else { continue };
                        if token.status == TokenStatus::Base {
                            released_token = true;
                        }
                        let outcome = ludo_rules::apply_move(token, effective, color, &original, &controlled, is_stack_mover);
                        if outcome.updated.status.is_done() {
                            any_home_transition = true;
                        }
                        if let Some(slot) = working.get_mut(&color).and_then(|ts| ts.iter_mut().find(|t| t.id == id)) {
                            *slot = outcome.updated;
                        }
                        captured.extend(outcome.captured);
                    }

                    let was_leader_before = leader_seat_index(&runtime.state);
                    let was_self_near_win = any_near_win(&runtime.state);
                    let was_last = is_last_seat(&runtime.state, &seat);

                    for &(victim_id, victim_color) in &captured {
                        if let Some(slot) = working.get_mut(&victim_color).and_then(|ts| ts.iter_mut().find(|t| t.id == victim_id)) {
                            *slot = ludo_rules::send_to_base(victim_color, victim_id);
                        }
                    }
                    state.board.tokens = working;

                    let any_captured = !captured.is_empty();
                    let mut just_won = false;
                    if ludo_rules::check_win(&state.board.tokens, req.color) && !state.is_finished_color(req.color) {
                        if let Some(mover_seat) = state.seat_by_color(req.color).cloned() {
                            let rank = state.winner_count() + 1;
                            state.board.winners.push(WinnerEntry { seat_id: mover_seat.id.clone(), rank });
                            state.board.log(format!("{} finished in position {rank}", mover_seat.color));
                            if let Some(s) = state.seats.iter_mut().find(|s| s.id == mover_seat.id) {
                                s.status = SeatStatus::Finished;
                            }
                            just_won = true;
                        }
                    }

                    state.board.dice_value = None;
                    state.board.valid_moves.clear();
                    state.board.last_roll_at = None;

                    let all_finished = state.winner_count() >= state.seats.len();
                    if all_finished {
                        state.status = RoomStatus::Completed;
                    } else if !ludo_rules::retains_turn(dice, any_captured, any_home_transition) {
                        let winners: HashSet<usize> = state.seats.iter().enumerate().filter(|(_, s)| state.is_finished_color(s.color)).map(|(i, _)| i).collect();
                        let next = ludo_rules::advance_turn(state.current_player_index, state.seats.len(), &winners, true);
                        state.current_player_index = next;
                        state.board.current_player_id = state.seats.get(next).map(|s| s.id.clone());
                    }

                    if any_captured {
                        state.board.log(format!("{} captured a token", req.color));
                    } else {
                        state.board.log(format!("{} moved token {}", req.color, req.token_id));
                    }
                    let _ = just_won;

                    if engagement_enabled {
                        if any_captured {
                            if let Some(entry) = runtime.engagement.momentum.get_mut(&seat.id) {
                                entry.report_capture_as_attacker(profile.power_roll_cap);
                            }
                            for &(_, victim_color) in &captured {
                                if let Some(victim_seat) = runtime.state.seat_by_color(victim_color).cloned() {
                                    let entry = runtime.engagement.momentum_for(&victim_seat.id);
                                    entry.report_capture_as_victim(req.color, profile.revenge_window_turns, profile.recently_killed_turns);
                                }
                            }
                        }
                        let captured_count = captured.len() as u32;
                        let comeback_triggered = any_captured && was_last;
                        runtime.engagement.story.report_roll(captured_count, leader_seat_index(&runtime.state), any_near_win(&runtime.state), comeback_triggered);
                    }

                    if let Some(director) = &taunt_director {
                        let mode_taunt = runtime.state.settings.taunt_mode;
                        let mut events: Vec<(TauntEvent, Option<String>)> = Vec::new();
                        if released_token {
                            events.push((TauntEvent::ReleasedToken, None));
                        }
                        if any_captured {
                            events.push((TauntEvent::Captured, None));
                        }
                        if any_near_win(&runtime.state) && !was_self_near_win {
                            events.push((TauntEvent::NearWin, None));
                        }
                        if leader_seat_index(&runtime.state) != was_leader_before {
                            events.push((TauntEvent::LeadChange, None));
                        }
                        if is_last_seat(&runtime.state, &seat) {
                            events.push((TauntEvent::LastPlace, None));
                        }

                        let mut director = director.lock().await;
                        let now_instant = Instant::now();
                        for &(victim_id, victim_color) in &captured {
                            if let Some(victim_seat) = runtime.state.seat_by_color(victim_color).cloned() {
                                let revenge = director.record_capture(seat.id.clone(), victim_seat.id.clone(), now_instant);
                                let victim_outcome = director.consider(TauntEvent::GotCaptured, victim_seat.id.clone(), auto_allowed(mode_taunt, TauntEvent::GotCaptured), &[], now_instant, &mut rand::rng());
                                publish_taunt_outcome(realtime.as_ref(), &room_id, &victim_seat, victim_outcome);
                                if revenge {
                                    events.push((TauntEvent::RevengeKill, None));
                                }
                            }
                            let _ = victim_id;
                        }
                        for (event, _) in events {
                            let outcome = director.consider(event, seat.id.clone(), auto_allowed(mode_taunt, event), &[], now_instant, &mut rand::rng());
                            publish_taunt_outcome(realtime.as_ref(), &room_id, &seat, outcome);
                        }
                    }

                    (Ok(runtime.state.clone()), true)
                }
            })
            .await?;
        let state = result?;
        self.cache.mirror(room_id).await;
        self.cache.append_move_log(room_id, &format!("{} moved {}", req.color, req.token_id), self.settings.move_log_max_items, self.settings.move_log_ttl).await;
        let patch = json!({
            "revision": revision,
            "currentPlayerIndex": state.current_player_index,
            "gameBoard": state.board,
            "gameCompleted": matches!(state.status, RoomStatus::Completed),
        });
        self.realtime.publish_room(RoomEvent { room_id: room_id.to_string(), kind: "move".to_string(), patch: Some(patch.clone()), dice: None, color: Some(req.color.to_string()), token_id: Some(req.token_id), dice_value: Some(req.dice_value) });
        self.record_event(room_id, "move", patch, Some(user_id), None, Some(revision)).await;
        Ok(state)
    }

    /// §4.6 "Advance-turn": called by a client when the acting seat fails to
    /// move within the 20-second grace.
    pub async fn advance_turn(&self, user_id: &str, room_id: &str) -> Result<Value, CoordinatorError> {
        let user_id_owned = user_id.to_string();
        let (result, revision) = self
            .cache
            .run_exclusive(room_id, move |runtime, _rev| {
                let user_id = user_id_owned.clone();
                async move {
                    let state = &mut runtime.state;
                    let Some(seat) = state.current_seat().cloned() else {
                        return (Err(CoordinatorError::RoomNotFound), false);
                    };
                    if seat.user_id != user_id {
                        return (Err(CoordinatorError::NotYourTurn), false);
                    }
                    if let Some(last_roll_at) = state.board.last_roll_at {
                        let elapsed = Utc::now().signed_duration_since(last_roll_at);
                        if elapsed < chrono::Duration::from_std(MOVE_GRACE).unwrap_or_default() {
                            return (Err(CoordinatorError::MoveTimeNotExpired), false);
                        }
                    }
                    let winners: HashSet<usize> = state.seats.iter().enumerate().filter(|(_, s)| state.is_finished_color(s.color)).map(|(i, _)| i).collect();
                    let next = ludo_rules::advance_turn(state.current_player_index, state.seats.len(), &winners, true);
                    state.current_player_index = next;
                    state.board.current_player_id = state.seats.get(next).map(|s| s.id.clone());
                    state.board.dice_value = None;
                    state.board.valid_moves.clear();
                    state.board.last_roll_at = None;
                    state.board.log(format!("{} timed out, turn passed", seat.color));
                    (Ok(runtime.state.clone()), true)
                }
            })
            .await?;
        let state = result?;
        self.cache.mirror(room_id).await;
        let patch = full_patch(&state, revision);
        self.realtime.publish_room(RoomEvent::patch(room_id, "turn:advance", patch.clone()));
        self.record_event(room_id, "turn:advance", patch.clone(), Some(user_id), None, Some(revision)).await;
        Ok(patch)
    }

    // ---------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------

    pub async fn get_room(&self, room_id: &str) -> Result<RoomState, CoordinatorError> {
        self.snapshot_or_err(room_id).await
    }

    pub async fn list_public_waiting_rooms(&self) -> Result<Vec<RoomSummary>, CoordinatorError> {
        let rooms = self.store.list_public_waiting_rooms().await?;
        let mut summaries = Vec::with_capacity(rooms.len());
        for room in rooms {
            let count = self.store.get_seats(&room.id).await?.len();
            summaries.push(RoomSummary { room, player_count: count });
        }
        Ok(summaries)
    }

    pub async fn recent_events(&self, room_id: &str, limit: i64) -> Result<Vec<GameEvent>, CoordinatorError> {
        Ok(self.store.recent_events(room_id, limit).await?)
    }

    pub async fn ping(&self) -> (bool, bool) {
        let db_ok = self.store.ping().await.is_ok();
        let cache_ok = match &self.shared_cache {
            Some(cache) => cache.ping().await.is_ok(),
            None => true,
        };
        (db_ok, cache_ok)
    }

    // ---------------------------------------------------------------
    // Background flushing (§4.5)
    // ---------------------------------------------------------------

    /// One periodic-flusher tick: composes a durable-store patch from every
    /// dirty room's client-facing `RoomState` (the `engagement` half of
    /// `RoomRuntime` never leaves the process, per `RoomRuntime`'s doc
    /// comment).
    pub async fn flush_dirty(&self) {
        self.cache.flush_dirty(|runtime, _rev| room_state_patch(&runtime.state)).await;
    }

    /// Final force-flush on SIGTERM/SIGINT.
    pub async fn shutdown(&self) {
        self.cache.shutdown(|runtime, _rev| room_state_patch(&runtime.state)).await;
    }

    pub fn flush_interval(&self) -> Duration {
        self.cache.flush_interval()
    }

    // ---------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------

    async fn snapshot_or_err(&self, room_id: &str) -> Result<RoomState, CoordinatorError> {
        self.cache.snapshot(room_id).await.map(|r| r.state).ok_or(CoordinatorError::RoomNotFound)
    }

    async fn taunt_director(&self, room_id: &str) -> Option<Arc<Mutex<TauntDirector<String>>>> {
        if !self.settings.taunt_enabled {
            return None;
        }
        self.taunts.read().await.get(room_id).cloned()
    }

    async fn unique_room_code(&self) -> Result<String, CoordinatorError> {
        for _ in 0..ROOM_CODE_MAX_ATTEMPTS {
            let candidate = random_room_code();
            if self.store.get_room_by_code(&candidate).await?.is_none() {
                return Ok(candidate);
            }
        }
        Err(CoordinatorError::Internal("could not allocate a unique room code".into()))
    }

    async fn resolve_room_doc(&self, room_id: &str, code: Option<&str>) -> Result<RoomDocument, CoordinatorError> {
        if let Some(code) = code {
            return self.store.get_room_by_code(code).await?.ok_or(CoordinatorError::RoomNotFound);
        }
        self.store.get_room(room_id).await?.ok_or(CoordinatorError::RoomNotFound)
    }

    async fn record_event(&self, room_id: &str, kind: &str, payload: Value, actor_user: Option<&str>, actor_seat: Option<&str>, revision: Option<u64>) {
        let mut event = GameEvent::new(room_id, kind, payload, Utc::now());
        if let (Some(user), Some(seat)) = (actor_user, actor_seat) {
            event = event.with_actor(user, seat);
        }
        if let Some(revision) = revision {
            event = event.with_revision(revision);
        }
        self.cache.append_event(event).await;
    }
}

fn random_room_code() -> String {
    let mut rng = rand::rng();
    (0..ROOM_CODE_LEN).map(|_| ROOM_CODE_ALPHABET[rng.random_range(0..ROOM_CODE_ALPHABET.len())] as char).collect()
}

fn room_settings_max_players(room: &RoomDocument) -> Result<u8, CoordinatorError> {
    room.settings["maxPlayers"].as_u64().map(|v| v as u8).ok_or_else(|| CoordinatorError::Internal("room document missing maxPlayers".into()))
}

fn room_status_str(status: RoomStatus) -> &'static str {
    match status {
        RoomStatus::Waiting => "waiting",
        RoomStatus::InProgress => "in_progress",
        RoomStatus::Completed => "completed",
    }
}

fn seat_status_str(status: SeatStatus) -> &'static str {
    match status {
        SeatStatus::Waiting => "waiting",
        SeatStatus::Playing => "playing",
        SeatStatus::Finished => "finished",
    }
}

fn seat_document(room_id: &str, seat: &Seat) -> SeatDocument {
    SeatDocument {
        id: seat.id.clone(),
        room_id: room_id.to_string(),
        user_id: seat.user_id.clone(),
        color: seat.color.to_string(),
        position: seat.position as i64,
        team_index: seat.team_index.map(|t| t as i64),
        status: seat_status_str(seat.status).to_string(),
        ready: seat.ready,
    }
}

fn room_document(state: &RoomState) -> RoomDocument {
    RoomDocument {
        id: state.id.clone(),
        code: state.code.clone(),
        host_seat_id: state.host_seat_id.clone(),
        status: room_status_str(state.status).to_string(),
        current_player_index: Some(state.current_player_index as i64),
        settings: serde_json::to_value(&state.settings).unwrap_or(Value::Null),
        game_board: serde_json::to_value(&state.board).unwrap_or(Value::Null),
        created_at: Utc::now(),
    }
}

fn room_state_patch(state: &RoomState) -> RoomStatePatch {
    RoomStatePatch {
        status: room_status_str(state.status).to_string(),
        current_player_index: Some(state.current_player_index as i64),
        game_board: serde_json::to_value(&state.board).unwrap_or(Value::Null),
    }
}

fn full_patch(state: &RoomState, revision: u64) -> Value {
    json!({
        "revision": revision,
        "currentPlayerIndex": state.current_player_index,
        "gameBoard": state.board,
    })
}

fn auto_allowed(mode: TauntMode, event: TauntEvent) -> bool {
    match mode {
        TauntMode::Auto => true,
        TauntMode::Hybrid => HYBRID_AUTO_EVENTS.contains(&event),
        TauntMode::Suggestion => false,
    }
}

fn publish_taunt_outcome(realtime: &dyn Realtime, room_id: &str, actor: &Seat, outcome: DirectorOutcome) {
    if !outcome.suggestions.is_empty() {
        let lines: Vec<Value> = outcome.suggestions.iter().map(|l| json!({ "id": l.id, "text": l.text })).collect();
        realtime.publish_user(&actor.user_id, RoomEvent::patch(room_id, "room:taunt-suggestions", json!({ "seatId": actor.id, "lines": lines })));
    }
    if let Some(line) = outcome.auto_emitted {
        realtime.publish_room(RoomEvent::patch(room_id, "room:quick-message", json!({ "seatId": actor.id, "color": actor.color.to_string(), "text": line.text })));
    }
}

/// Duplicates the cell-sharing test ludo_rules::engine's private
/// `teammates_on_cell` performs internally, since the room coordinator needs
/// the *set* of co-movers for a forced stack, not just one token's effective
/// dice (only the latter is exposed publicly via `legal_move_effective_dice`).
fn stack_members(tokens: &Tokens, controlled: &[Color], token_id: u8, color: Color) -> Vec<(u8, Color)> {
    let solo = vec![(token_id, color)];
    let Some(mover) = tokens.get(&color).and_then(|ts| ts.iter().find(|t| t.id == token_id)).copied() else {
        return solo;
    };
    if !(0..MAIN_TRACK_LEN).contains(&mover.position) || BoardConfig::is_safe_index(mover.position) {
        return solo;
    }
    let members: Vec<(u8, Color)> = controlled
        .iter()
        .flat_map(|&c| tokens.get(&c).into_iter().flatten().map(move |t| (c, t)))
        .filter(|(_, t): &(Color, &Token)| t.position == mover.position && t.status.is_on_track())
        .map(|(c, t)| (t.id, c))
        .collect();
    if members.len() <= 1 {
        solo
    } else {
        members
    }
}

fn token_progress(t: &Token) -> i32 {
    match t.status {
        TokenStatus::Base => 0,
        TokenStatus::Home | TokenStatus::Finished => MAX_TOKEN_PROGRESS,
        TokenStatus::Active | TokenStatus::Safe => {
            if t.position >= HOME_RUN_START {
                52 + (t.position - HOME_RUN_START) as i32
            } else {
                t.steps.max(0)
            }
        }
    }
}

fn color_progress(tokens: &Tokens, color: Color) -> i32 {
    tokens.get(&color).map(|ts| ts.iter().map(token_progress).sum()).unwrap_or(0)
}

fn seat_progress(state: &RoomState, seat: &Seat) -> i32 {
    color_progress(&state.board.tokens, seat.color)
}

fn leader_seat_index(state: &RoomState) -> Option<usize> {
    state.seats.iter().enumerate().max_by_key(|(_, s)| seat_progress(state, s)).map(|(i, _)| i)
}

fn any_near_win(state: &RoomState) -> bool {
    state.seats.iter().any(|s| seat_progress(state, s) >= NEAR_WIN_PROGRESS)
}

fn is_last_seat(state: &RoomState, seat: &Seat) -> bool {
    let p = seat_progress(state, seat);
    state.seats.iter().all(|s| seat_progress(state, s) >= p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ludo_realtime::InMemoryBroadcaster;
    use ludo_store::UserDocument;

    /// In-memory `Repository` double standing in for MongoDB: real enough
    /// to exercise slot/color retry loops and host handoff, without a
    /// database connection.
    #[derive(Default)]
    struct FakeRepository {
        rooms: Mutex<HashMap<String, RoomDocument>>,
        seats: Mutex<HashMap<String, Vec<SeatDocument>>>,
        teams: Mutex<HashMap<String, Vec<TeamDocument>>>,
        events: Mutex<Vec<GameEvent>>,
    }

    impl Repository for FakeRepository {
        async fn ping(&self) -> Result<(), ludo_store::StoreError> {
            Ok(())
        }
        async fn upsert_room_state(&self, room_id: &str, patch: RoomStatePatch) -> Result<(), ludo_store::StoreError> {
            let mut rooms = self.rooms.lock().await;
            let room = rooms.get_mut(room_id).ok_or_else(|| ludo_store::StoreError::RoomNotFound(room_id.to_string()))?;
            room.status = patch.status;
            room.current_player_index = patch.current_player_index;
            room.game_board = patch.game_board;
            Ok(())
        }
        async fn get_room(&self, room_id: &str) -> Result<Option<RoomDocument>, ludo_store::StoreError> {
            Ok(self.rooms.lock().await.get(room_id).cloned())
        }
        async fn get_room_by_code(&self, code: &str) -> Result<Option<RoomDocument>, ludo_store::StoreError> {
            Ok(self.rooms.lock().await.values().find(|r| r.code == code).cloned())
        }
        async fn list_public_waiting_rooms(&self) -> Result<Vec<RoomDocument>, ludo_store::StoreError> {
            Ok(self
                .rooms
                .lock()
                .await
                .values()
                .filter(|r| r.status == "waiting" && r.settings["visibility"].as_str() == Some("public"))
                .cloned()
                .collect())
        }
        async fn create_room(&self, room: &RoomDocument) -> Result<(), ludo_store::StoreError> {
            self.rooms.lock().await.insert(room.id.clone(), room.clone());
            Ok(())
        }
        async fn delete_room(&self, room_id: &str) -> Result<(), ludo_store::StoreError> {
            self.rooms.lock().await.remove(room_id);
            self.seats.lock().await.remove(room_id);
            self.teams.lock().await.remove(room_id);
            Ok(())
        }
        async fn update_room_host(&self, room_id: &str, host_seat_id: Option<&str>) -> Result<(), ludo_store::StoreError> {
            if let Some(room) = self.rooms.lock().await.get_mut(room_id) {
                room.host_seat_id = host_seat_id.map(str::to_string);
            }
            Ok(())
        }
        async fn upsert_seat(&self, seat: &SeatDocument) -> Result<(), ludo_store::StoreError> {
            let mut seats = self.seats.lock().await;
            let room_seats = seats.entry(seat.room_id.clone()).or_default();
            if let Some(existing) = room_seats.iter_mut().find(|s| s.user_id == seat.user_id) {
                *existing = seat.clone();
            } else {
                room_seats.push(seat.clone());
            }
            Ok(())
        }
        async fn get_seats(&self, room_id: &str) -> Result<Vec<SeatDocument>, ludo_store::StoreError> {
            Ok(self.seats.lock().await.get(room_id).cloned().unwrap_or_default())
        }
        async fn delete_seat(&self, room_id: &str, user_id: &str) -> Result<(), ludo_store::StoreError> {
            if let Some(room_seats) = self.seats.lock().await.get_mut(room_id) {
                room_seats.retain(|s| s.user_id != user_id);
            }
            Ok(())
        }
        async fn upsert_team(&self, team: &TeamDocument) -> Result<(), ludo_store::StoreError> {
            let mut teams = self.teams.lock().await;
            let room_teams = teams.entry(team.room_id.clone()).or_default();
            if let Some(existing) = room_teams.iter_mut().find(|t| t.team_index == team.team_index) {
                *existing = team.clone();
            } else {
                room_teams.push(team.clone());
            }
            Ok(())
        }
        async fn get_teams(&self, room_id: &str) -> Result<Vec<TeamDocument>, ludo_store::StoreError> {
            Ok(self.teams.lock().await.get(room_id).cloned().unwrap_or_default())
        }
        async fn append_event(&self, event: &GameEvent) -> Result<(), ludo_store::StoreError> {
            self.events.lock().await.push(event.clone());
            Ok(())
        }
        async fn recent_events(&self, room_id: &str, limit: i64) -> Result<Vec<GameEvent>, ludo_store::StoreError> {
            let events = self.events.lock().await;
            Ok(events.iter().filter(|e| e.room_id == room_id).rev().take(limit.max(0) as usize).cloned().collect())
        }
        async fn get_user(&self, _user_id: &str) -> Result<Option<UserDocument>, ludo_store::StoreError> {
            Ok(None)
        }
    }

    fn test_coordinator() -> Coordinator<FakeRepository> {
        let store = Arc::new(FakeRepository::default());
        let cache = Arc::new(GameStateCache::new(store.clone(), None, Duration::from_secs(2), Duration::from_secs(3600)));
        let realtime: Arc<dyn Realtime> = Arc::new(InMemoryBroadcaster::new());
        Coordinator::new(cache, store, realtime, None, CoordinatorSettings::default(), TauntProfile::default())
    }

    fn create_req(max_players: u8, mode: RoomMode, visibility: Visibility) -> CreateRoomRequest {
        CreateRoomRequest { max_players, mode, visibility, selected_color: None, taunt_mode: None }
    }

    #[tokio::test]
    async fn create_room_seats_the_host_and_assigns_a_default_color() {
        let coordinator = test_coordinator();
        let room = coordinator.create_room("host-1", create_req(4, RoomMode::Individual, Visibility::Public)).await.unwrap();
        assert_eq!(room.seats.len(), 1);
        assert_eq!(room.host_seat_id.as_deref(), Some(room.seats[0].id.as_str()));
        assert_eq!(room.seats[0].color, room.colors()[0]);
        assert_eq!(room.code.len(), 6);
    }

    #[tokio::test]
    async fn create_room_rejects_team_mode_with_an_unsupported_player_count() {
        let coordinator = test_coordinator();
        let err = coordinator.create_room("host-1", create_req(3, RoomMode::Team, Visibility::Public)).await.unwrap_err();
        assert!(matches!(err, CoordinatorError::Validation(_)));
    }

    #[tokio::test]
    async fn join_room_assigns_the_next_free_color_and_is_idempotent() {
        let coordinator = test_coordinator();
        let room = coordinator.create_room("host-1", create_req(4, RoomMode::Individual, Visibility::Public)).await.unwrap();

        let joined = coordinator.join_room("p2", &room.id, JoinRoomRequest { code: None, selected_color: None }).await.unwrap();
        assert_eq!(joined.seats.len(), 2);
        assert_ne!(joined.seats[0].color, joined.seats[1].color);

        // Joining again with the same user must return the existing seat,
        // not allocate a second one.
        let rejoined = coordinator.join_room("p2", &room.id, JoinRoomRequest { code: None, selected_color: None }).await.unwrap();
        assert_eq!(rejoined.seats.len(), 2);
    }

    #[tokio::test]
    async fn join_room_errors_once_every_seat_is_taken() {
        let coordinator = test_coordinator();
        let room = coordinator.create_room("host-1", create_req(2, RoomMode::Individual, Visibility::Public)).await.unwrap();
        coordinator.join_room("p2", &room.id, JoinRoomRequest { code: None, selected_color: None }).await.unwrap();
        let err = coordinator.join_room("p3", &room.id, JoinRoomRequest { code: None, selected_color: None }).await.unwrap_err();
        assert!(matches!(err, CoordinatorError::RoomFull));
    }

    #[tokio::test]
    async fn leave_room_deletes_the_room_once_the_last_seat_leaves() {
        let coordinator = test_coordinator();
        let room = coordinator.create_room("host-1", create_req(2, RoomMode::Individual, Visibility::Public)).await.unwrap();
        coordinator.leave_room("host-1", &room.id).await.unwrap();
        let err = coordinator.get_room(&room.id).await.unwrap_err();
        assert!(matches!(err, CoordinatorError::RoomNotFound));
    }

    #[tokio::test]
    async fn leave_room_hands_off_host_to_a_remaining_seat() {
        let coordinator = test_coordinator();
        let room = coordinator.create_room("host-1", create_req(4, RoomMode::Individual, Visibility::Public)).await.unwrap();
        coordinator.join_room("p2", &room.id, JoinRoomRequest { code: None, selected_color: None }).await.unwrap();

        coordinator.leave_room("host-1", &room.id).await.unwrap();
        let room = coordinator.get_room(&room.id).await.unwrap();
        assert_eq!(room.seats.len(), 1);
        assert_eq!(room.host_seat_id.as_deref(), Some(room.seats[0].id.as_str()));
    }

    #[tokio::test]
    async fn start_game_requires_host_and_all_seats_ready() {
        let coordinator = test_coordinator();
        let room = coordinator.create_room("host-1", create_req(2, RoomMode::Individual, Visibility::Public)).await.unwrap();
        coordinator.join_room("p2", &room.id, JoinRoomRequest { code: None, selected_color: None }).await.unwrap();

        let err = coordinator.start_game("p2", &room.id).await.unwrap_err();
        assert!(matches!(err, CoordinatorError::NotHost));

        let err = coordinator.start_game("host-1", &room.id).await.unwrap_err();
        assert!(matches!(err, CoordinatorError::Validation(_)), "not every seat is ready yet");

        coordinator.set_ready("host-1", &room.id, true).await.unwrap();
        coordinator.set_ready("p2", &room.id, true).await.unwrap();
        let started = coordinator.start_game("host-1", &room.id).await.unwrap();
        assert!(matches!(started.status, RoomStatus::InProgress));
        assert!(started.seats.iter().all(|s| matches!(s.status, SeatStatus::Playing)));
    }

    #[tokio::test]
    async fn roll_dice_rejects_a_caller_who_is_not_the_current_seat() {
        let coordinator = test_coordinator();
        let room = coordinator.create_room("host-1", create_req(2, RoomMode::Individual, Visibility::Public)).await.unwrap();
        coordinator.join_room("p2", &room.id, JoinRoomRequest { code: None, selected_color: None }).await.unwrap();
        coordinator.set_ready("host-1", &room.id, true).await.unwrap();
        coordinator.set_ready("p2", &room.id, true).await.unwrap();
        let started = coordinator.start_game("host-1", &room.id).await.unwrap();

        let current_user = started.current_seat().unwrap().user_id.clone();
        let other_user = if current_user == "host-1" { "p2" } else { "host-1" };
        let err = coordinator.roll_dice(other_user, &room.id).await.unwrap_err();
        assert!(matches!(err, CoordinatorError::NotYourTurn));
    }

    #[tokio::test]
    async fn roll_then_move_advances_the_revision_and_clears_the_outstanding_dice() {
        let coordinator = test_coordinator();
        let room = coordinator.create_room("host-1", create_req(2, RoomMode::Individual, Visibility::Public)).await.unwrap();
        coordinator.join_room("p2", &room.id, JoinRoomRequest { code: None, selected_color: None }).await.unwrap();
        coordinator.set_ready("host-1", &room.id, true).await.unwrap();
        coordinator.set_ready("p2", &room.id, true).await.unwrap();
        coordinator.start_game("host-1", &room.id).await.unwrap();

        // Every token starts in base, so only a roll of six yields a valid
        // move. An unplayable roll auto-advances the turn, so the acting
        // user must be re-read every attempt rather than assumed fixed.
        for _ in 0..200 {
            let state = coordinator.get_room(&room.id).await.unwrap();
            let current_user = state.current_seat().unwrap().user_id.clone();
            let roll = coordinator.roll_dice(&current_user, &room.id).await.unwrap();
            if !roll.valid {
                continue;
            }
            let state = coordinator.get_room(&room.id).await.unwrap();
            let &(token_id, color) = state.board.valid_moves.iter().next().unwrap();
            let moved = coordinator
                .make_move(&current_user, &room.id, MoveRequest { token_id, color, dice_value: roll.dice })
                .await
                .unwrap();
            assert!(moved.board.dice_value.is_none());
            assert!(moved.board.valid_moves.is_empty());
            return;
        }
        panic!("never rolled a playable six in 200 attempts");
    }

    #[tokio::test]
    async fn advance_turn_requires_the_grace_period_to_elapse() {
        let coordinator = test_coordinator();
        let room = coordinator.create_room("host-1", create_req(2, RoomMode::Individual, Visibility::Public)).await.unwrap();
        coordinator.join_room("p2", &room.id, JoinRoomRequest { code: None, selected_color: None }).await.unwrap();
        coordinator.set_ready("host-1", &room.id, true).await.unwrap();
        coordinator.set_ready("p2", &room.id, true).await.unwrap();
        let started = coordinator.start_game("host-1", &room.id).await.unwrap();
        let current_user = started.current_seat().unwrap().user_id.clone();

        coordinator.roll_dice(&current_user, &room.id).await.unwrap();
        let state = coordinator.get_room(&room.id).await.unwrap();
        if state.board.dice_value.is_none() {
            // No valid move rolled: the turn already auto-advanced.
            return;
        }
        let err = coordinator.advance_turn(&current_user, &room.id).await.unwrap_err();
        assert!(matches!(err, CoordinatorError::MoveTimeNotExpired));
    }

    #[tokio::test]
    async fn set_slot_assigns_color_and_team_from_the_canonical_order() {
        let coordinator = test_coordinator();
        let room = coordinator.create_room("host-1", create_req(4, RoomMode::Team, Visibility::Public)).await.unwrap();
        let state = coordinator.set_slot("host-1", &room.id, 2).await.unwrap();
        let seat = state.seat_by_user("host-1").unwrap();
        assert_eq!(seat.position, 2);
        assert_eq!(seat.color, state.colors()[2]);
    }

    #[tokio::test]
    async fn set_team_names_requires_host_and_matching_team_count() {
        let coordinator = test_coordinator();
        let room = coordinator.create_room("host-1", create_req(4, RoomMode::Team, Visibility::Public)).await.unwrap();

        let err = coordinator
            .set_team_names("host-1", &room.id, TeamNamesRequest { team_names: vec!["only-one".to_string()] })
            .await
            .unwrap_err();
        assert!(matches!(err, CoordinatorError::Validation(_)));

        let state = coordinator
            .set_team_names("host-1", &room.id, TeamNamesRequest { team_names: vec!["Alpha".to_string(), "Beta".to_string()] })
            .await
            .unwrap();
        assert_eq!(state.settings.team_names, vec!["Alpha", "Beta"]);
    }

    #[tokio::test]
    async fn list_public_waiting_rooms_excludes_private_and_in_progress_rooms() {
        let coordinator = test_coordinator();
        coordinator.create_room("host-1", create_req(2, RoomMode::Individual, Visibility::Public)).await.unwrap();
        coordinator.create_room("host-2", create_req(2, RoomMode::Individual, Visibility::Private)).await.unwrap();
        let summaries = coordinator.list_public_waiting_rooms().await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].player_count, 1);
    }
}

