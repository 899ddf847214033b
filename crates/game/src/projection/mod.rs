//! Client-side mirror of the server's match state.
//!
//! A [`GameView`] only ever changes by applying [`ServerMessage`]s; the UI
//! reads it and turns user input into intents, never into local moves.

use crate::board::{BoardGrid, COLUMN_COUNT, Cell, ROW_COUNT};
use crate::net::{GameResult, ServerMessage};
use crate::{PLAYER_COUNT, PlayerIndex, opponent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    WaitingForOpponent,
    YourTurn,
    OpponentTurn,
    YouWin,
    YouLose,
    Draw,
    OpponentLeft,
    Disconnected,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::WaitingForOpponent => "Waiting for opponent...",
            Status::YourTurn => "Your Turn",
            Status::OpponentTurn => "Opponent's Turn",
            Status::YouWin => "You Win!",
            Status::YouLose => "You Lose!",
            Status::Draw => "It's a Draw!",
            Status::OpponentLeft => "Opponent left the game",
            Status::Disconnected => "Disconnected from server",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartNotice {
    WaitingForOpponent,
    OpponentWantsRestart,
}

impl RestartNotice {
    pub fn as_str(&self) -> &'static str {
        match self {
            RestartNotice::WaitingForOpponent => "Waiting for opponent to restart...",
            RestartNotice::OpponentWantsRestart => "Opponent wants to restart",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameView {
    player: PlayerIndex,
    board: BoardGrid,
    turn: PlayerIndex,
    game_over: bool,
    result: Option<GameResult>,
    winner: Option<PlayerIndex>,
    game_id: u64,
    waiting_restart: [bool; PLAYER_COUNT],
    started: bool,
    departed: Option<PlayerIndex>,
    connected: bool,
}

impl GameView {
    pub fn new(player: PlayerIndex) -> Self {
        Self {
            player,
            board: [[0; COLUMN_COUNT]; ROW_COUNT],
            turn: 0,
            game_over: false,
            result: None,
            winner: None,
            game_id: 0,
            waiting_restart: [false; PLAYER_COUNT],
            started: false,
            departed: None,
            connected: true,
        }
    }

    pub fn apply(&mut self, message: &ServerMessage) {
        match message {
            ServerMessage::GameStart {
                board,
                turn,
                game_over,
                game_id,
            } => {
                self.board = *board;
                self.turn = *turn;
                self.game_over = *game_over;
                self.game_id = *game_id;
                self.result = None;
                self.winner = None;
                self.waiting_restart = [false; PLAYER_COUNT];
                self.started = true;
            }
            ServerMessage::GameUpdate {
                board,
                turn,
                game_over,
                result,
                winner,
            } => {
                self.board = *board;
                self.turn = *turn;
                self.game_over = *game_over;
                self.result = *result;
                self.winner = *winner;
            }
            ServerMessage::RestartRequested {
                waiting_restart, ..
            } => {
                self.waiting_restart = *waiting_restart;
            }
            ServerMessage::PlayerDisconnected { player } => {
                self.game_over = true;
                self.departed = Some(*player);
            }
        }
    }

    pub fn connection_lost(&mut self) {
        self.connected = false;
    }

    pub fn player(&self) -> PlayerIndex {
        self.player
    }

    pub fn cell(&self, row: usize, col: usize) -> Cell {
        self.board
            .get(row)
            .and_then(|r| r.get(col))
            .and_then(|&v| Cell::from_u8(v))
            .unwrap_or_default()
    }

    pub fn game_id(&self) -> u64 {
        self.game_id
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn departed(&self) -> Option<PlayerIndex> {
        self.departed
    }

    /// Mirrors the server's gate so the client never sends a move that would
    /// be ignored anyway.
    pub fn can_move(&self) -> bool {
        self.connected && self.started && !self.game_over && self.turn == self.player
    }

    pub fn can_request_restart(&self) -> bool {
        self.connected
            && self.started
            && self.departed.is_none()
            && !self.waiting_restart[self.player as usize]
    }

    pub fn status(&self) -> Status {
        if !self.connected {
            return Status::Disconnected;
        }
        if self.departed.is_some() {
            return Status::OpponentLeft;
        }
        if !self.started {
            return Status::WaitingForOpponent;
        }
        if self.game_over {
            return match (self.result, self.winner) {
                (Some(GameResult::Win), Some(winner)) if winner == self.player => Status::YouWin,
                (Some(GameResult::Win), Some(_)) => Status::YouLose,
                _ => Status::Draw,
            };
        }
        if self.turn == self.player {
            Status::YourTurn
        } else {
            Status::OpponentTurn
        }
    }

    pub fn restart_notice(&self) -> Option<RestartNotice> {
        if self.waiting_restart[self.player as usize] {
            Some(RestartNotice::WaitingForOpponent)
        } else if self.waiting_restart[opponent(self.player) as usize] {
            Some(RestartNotice::OpponentWantsRestart)
        } else {
            None
        }
    }
}
