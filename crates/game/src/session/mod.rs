//! Authoritative per-match state machine.
//!
//! The session never talks to sockets. Every accepted transition hands back
//! the [`ServerMessage`] that has to reach both players; rejected inputs come
//! back as errors meant for logging only, the sender is never told.

use crate::board::{Board, BoardGrid, Cell, ROW_COUNT};
use crate::net::{GameResult, ServerMessage};
use crate::{PLAYER_COUNT, PlayerIndex, opponent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    WaitingForPlayers,
    InProgress,
    Won,
    Draw,
    Abandoned,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Won | Phase::Draw | Phase::Abandoned)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::WaitingForPlayers => "waiting for players",
            Phase::InProgress => "in progress",
            Phase::Won => "won",
            Phase::Draw => "draw",
            Phase::Abandoned => "abandoned",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MoveRejected {
    #[error("no match in progress ({})", .0.as_str())]
    NotInProgress(Phase),
    #[error("player {player} moved on player {turn}'s turn")]
    NotYourTurn { player: PlayerIndex, turn: PlayerIndex },
    #[error("column {0} is off the board")]
    ColumnOutOfRange(u8),
    #[error("column {0} is full")]
    ColumnFull(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RestartRejected {
    #[error("restart is not available while {}", .0.as_str())]
    Unavailable(Phase),
}

/// Read-only copy of the session for dashboards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub match_id: u64,
    pub phase: Phase,
    pub turn: PlayerIndex,
    pub winner: Option<PlayerIndex>,
    pub restart_requested: [bool; PLAYER_COUNT],
    pub board: Option<BoardGrid>,
}

#[derive(Debug)]
pub struct Session {
    match_id: u64,
    turn: PlayerIndex,
    phase: Phase,
    winner: Option<PlayerIndex>,
    restart_requested: [bool; PLAYER_COUNT],
    board: Option<Board>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            match_id: 0,
            turn: 0,
            phase: Phase::WaitingForPlayers,
            winner: None,
            restart_requested: [false; PLAYER_COUNT],
            board: None,
        }
    }

    pub fn match_id(&self) -> u64 {
        self.match_id
    }

    pub fn turn(&self) -> PlayerIndex {
        self.turn
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn winner(&self) -> Option<PlayerIndex> {
        self.winner
    }

    pub fn restart_requested(&self) -> [bool; PLAYER_COUNT] {
        self.restart_requested
    }

    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    /// Begins the next generation on a fresh board.
    pub fn start(&mut self) -> ServerMessage {
        let board = Board::new();
        let grid = board.grid();

        self.board = Some(board);
        self.turn = 0;
        self.phase = Phase::InProgress;
        self.winner = None;
        self.restart_requested = [false; PLAYER_COUNT];
        self.match_id += 1;

        ServerMessage::GameStart {
            board: grid,
            turn: self.turn,
            game_over: false,
            game_id: self.match_id,
        }
    }

    pub fn apply_move(
        &mut self,
        player: PlayerIndex,
        column: u8,
    ) -> Result<ServerMessage, MoveRejected> {
        if self.phase != Phase::InProgress {
            return Err(MoveRejected::NotInProgress(self.phase));
        }
        if player != self.turn {
            return Err(MoveRejected::NotYourTurn {
                player,
                turn: self.turn,
            });
        }
        let Some(board) = self.board.as_mut() else {
            return Err(MoveRejected::NotInProgress(self.phase));
        };

        let col = column as usize;
        if !crate::net::is_valid_column(column) {
            return Err(MoveRejected::ColumnOutOfRange(column));
        }
        if !board.is_column_open(col) {
            return Err(MoveRejected::ColumnFull(column));
        }
        let row = board
            .next_open_row(col)
            .ok_or(MoveRejected::ColumnFull(column))?;
        debug_assert!(row < ROW_COUNT);

        board.drop_piece(row, col, Cell::for_player(player));

        let result = if board.check_win(Cell::for_player(player)) {
            self.phase = Phase::Won;
            self.winner = Some(player);
            Some(GameResult::Win)
        } else if board.is_full() {
            self.phase = Phase::Draw;
            Some(GameResult::Draw)
        } else {
            self.turn = opponent(self.turn);
            None
        };

        Ok(ServerMessage::GameUpdate {
            board: board.grid(),
            turn: self.turn,
            game_over: self.phase.is_terminal(),
            result,
            winner: self.winner,
        })
    }

    /// Flags `player` as ready for a rematch. The second flag starts the next
    /// match; a lone flag is only announced.
    pub fn request_restart(&mut self, player: PlayerIndex) -> Result<ServerMessage, RestartRejected> {
        if matches!(self.phase, Phase::WaitingForPlayers | Phase::Abandoned) {
            return Err(RestartRejected::Unavailable(self.phase));
        }

        self.restart_requested[player as usize] = true;
        if self.restart_requested.iter().all(|&flag| flag) {
            return Ok(self.start());
        }

        Ok(ServerMessage::RestartRequested {
            player,
            waiting_restart: self.restart_requested,
        })
    }

    /// Called after `player`'s slot is gone, with the number of players still
    /// registered. Any pairing ends up Abandoned, but only a departure from a
    /// game still being played is announced.
    pub fn disconnect(&mut self, player: PlayerIndex, remaining: usize) -> Option<ServerMessage> {
        if remaining >= PLAYER_COUNT {
            return None;
        }
        match self.phase {
            Phase::WaitingForPlayers | Phase::Abandoned => None,
            Phase::Won | Phase::Draw => {
                self.phase = Phase::Abandoned;
                None
            }
            Phase::InProgress => {
                self.phase = Phase::Abandoned;
                Some(ServerMessage::PlayerDisconnected { player })
            }
        }
    }

    /// Back to waiting once nobody is left. The match id keeps counting.
    pub fn reset(&mut self) {
        self.board = None;
        self.turn = 0;
        self.phase = Phase::WaitingForPlayers;
        self.winner = None;
        self.restart_requested = [false; PLAYER_COUNT];
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            match_id: self.match_id,
            phase: self.phase,
            turn: self.turn,
            winner: self.winner,
            restart_requested: self.restart_requested,
            board: self.board.as_ref().map(Board::grid),
        }
    }
}
