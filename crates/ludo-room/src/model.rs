use chrono::{DateTime, Utc};
use ludo_board::Color;
use ludo_rules::{RoomMode, Tokens};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

const GAME_LOG_CAPACITY: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TauntMode {
    Suggestion,
    Hybrid,
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Waiting,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatStatus {
    Waiting,
    Playing,
    Finished,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSettings {
    pub max_players: u8,
    pub mode: RoomMode,
    pub visibility: Visibility,
    pub team_names: Vec<String>,
    pub taunt_mode: TauntMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    pub id: String,
    pub user_id: String,
    pub color: Color,
    pub position: usize,
    pub team_index: Option<usize>,
    pub status: SeatStatus,
    pub ready: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WinnerEntry {
    pub seat_id: String,
    pub rank: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameBoard {
    pub tokens: Tokens,
    pub current_player_id: Option<String>,
    pub dice_value: Option<u8>,
    pub valid_moves: HashSet<(u8, Color)>,
    pub game_log: VecDeque<String>,
    pub winners: Vec<WinnerEntry>,
    pub last_roll_at: Option<DateTime<Utc>>,
    pub revision: u64,
}

impl GameBoard {
    pub fn new(colors: &[Color]) -> Self {
        Self {
            tokens: ludo_rules::fresh_tokens(colors),
            current_player_id: None,
            dice_value: None,
            valid_moves: HashSet::new(),
            game_log: VecDeque::new(),
            winners: Vec::new(),
            last_roll_at: None,
            revision: 0,
        }
    }

    pub fn log(&mut self, line: impl Into<String>) {
        self.game_log.push_back(line.into());
        while self.game_log.len() > GAME_LOG_CAPACITY {
            self.game_log.pop_front();
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomState {
    pub id: String,
    pub code: String,
    pub host_seat_id: Option<String>,
    pub settings: RoomSettings,
    pub status: RoomStatus,
    pub current_player_index: usize,
    pub board: GameBoard,
    pub seats: Vec<Seat>,
}

impl RoomState {
    pub fn new(id: String, code: String, settings: RoomSettings) -> Self {
        let colors = ludo_board::color_order(settings.max_players as usize).to_vec();
        Self {
            id,
            code,
            host_seat_id: None,
            settings,
            status: RoomStatus::Waiting,
            current_player_index: 0,
            board: GameBoard::new(&colors),
            seats: Vec::new(),
        }
    }

    pub fn colors(&self) -> &'static [Color] {
        ludo_board::color_order(self.settings.max_players as usize)
    }

    pub fn seat_by_user(&self, user_id: &str) -> Option<&Seat> {
        self.seats.iter().find(|s| s.user_id == user_id)
    }

    pub fn seat_by_user_mut(&mut self, user_id: &str) -> Option<&mut Seat> {
        self.seats.iter_mut().find(|s| s.user_id == user_id)
    }

    pub fn seat_by_id(&self, seat_id: &str) -> Option<&Seat> {
        self.seats.iter().find(|s| s.id == seat_id)
    }

    pub fn seat_by_color(&self, color: Color) -> Option<&Seat> {
        self.seats.iter().find(|s| s.color == color)
    }

    /// Resolves the current seat per §4.6: prefer `currentPlayerId`, else
    /// fall back to `currentPlayerIndex` clamped to the seat list.
    pub fn current_seat(&self) -> Option<&Seat> {
        if let Some(id) = &self.board.current_player_id {
            if let Some(seat) = self.seat_by_id(id) {
                return Some(seat);
            }
        }
        let idx = self.current_player_index.min(self.seats.len().saturating_sub(1));
        self.seats.get(idx)
    }

    pub fn controlled_colors(&self, seat: &Seat) -> Vec<Color> {
        ludo_rules::controllable_colors(self.settings.mode, seat.color, self.colors())
    }

    pub fn winner_count(&self) -> usize {
        self.board.winners.len()
    }

    pub fn is_finished_color(&self, color: Color) -> bool {
        self.board.winners.iter().any(|w| self.seat_by_id(&w.seat_id).is_some_and(|s| s.color == color))
    }
}
