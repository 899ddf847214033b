//! Registry + session behind one owner.
//!
//! Every state change in a running server goes through a `Table`, and the
//! endpoint keeps the table behind a single mutex. Broadcasting happens inside
//! the same call that decided the transition, so both players see transitions
//! in the order they were applied.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::PlayerIndex;
use crate::net::{
    ClientMessage, Outbound, Registry, RegistryError, ServerMessage, SlotId, broadcast,
    handshake_byte,
};
use crate::session::{MoveRejected, Phase, Session, SessionSnapshot};

const MAX_EVENTS: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableEvent {
    PlayerJoined { player: PlayerIndex },
    PlayerRejected { reason: RegistryError },
    PlayerLeft { player: PlayerIndex },
    MatchStarted { match_id: u64 },
    MoveApplied { player: PlayerIndex, column: u8 },
    MoveRejected { player: PlayerIndex, reason: MoveRejected },
    RestartRequested { player: PlayerIndex },
    MatchEnded { winner: Option<PlayerIndex> },
    MatchAbandoned { player: PlayerIndex },
}

#[derive(Debug, Clone, Default)]
pub struct TableConfig {
    /// Log rejected moves at `warn` instead of `debug`.
    pub strict: bool,
}

pub struct Table<C> {
    registry: Registry<C>,
    session: Session,
    config: TableConfig,
    failed: Vec<SlotId>,
    events: VecDeque<TableEvent>,
}

impl<C: Outbound> Table<C> {
    pub fn new(config: TableConfig) -> Self {
        Self {
            registry: Registry::new(),
            session: Session::new(),
            config,
            failed: Vec::new(),
            events: VecDeque::with_capacity(MAX_EVENTS),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    pub fn registry(&self) -> &Registry<C> {
        &self.registry
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = TableEvent> + '_ {
        self.events.drain(..)
    }

    /// Seats a new connection, sends it its player index and starts the match
    /// once both seats are filled.
    pub fn join(&mut self, connection: C) -> Result<SlotId, RegistryError> {
        let slot = match self.registry.register(connection) {
            Ok(slot) => slot,
            Err(reason) => {
                log::info!("Rejecting connection: {}", reason);
                self.push_event(TableEvent::PlayerRejected { reason });
                return Err(reason);
            }
        };

        log::info!("Player {} joined", slot.player);
        self.push_event(TableEvent::PlayerJoined {
            player: slot.player,
        });

        let handshake: Arc<[u8]> = Arc::from(&[handshake_byte(slot.player)][..]);
        let delivered = self
            .registry
            .get(slot.player)
            .map(|connection| connection.deliver(handshake).is_ok())
            .unwrap_or(false);

        if !delivered {
            self.failed.push(slot);
        } else if self.registry.is_full() {
            let start = self.session.start();
            log::info!("Match {} started", self.session.match_id());
            self.push_event(TableEvent::MatchStarted {
                match_id: self.session.match_id(),
            });
            self.send(start);
        }

        self.reap();
        Ok(slot)
    }

    /// Applies one inbound message. Messages from slots that are no longer
    /// registered and messages the session refuses change nothing.
    pub fn handle(&mut self, slot: SlotId, message: ClientMessage) {
        if !self.registry.is_live(slot) {
            log::debug!("Ignoring {} from retired slot {:?}", message.type_name(), slot);
            return;
        }
        let player = slot.player;

        match message {
            ClientMessage::Move { column } => match self.session.apply_move(player, column) {
                Ok(update) => {
                    self.push_event(TableEvent::MoveApplied { player, column });
                    if self.session.phase().is_terminal() {
                        let winner = self.session.winner();
                        match winner {
                            Some(winner) => log::info!(
                                "Match {} won by player {}",
                                self.session.match_id(),
                                winner
                            ),
                            None => log::info!("Match {} drawn", self.session.match_id()),
                        }
                        self.push_event(TableEvent::MatchEnded { winner });
                    }
                    self.send(update);
                }
                Err(reason) => {
                    if self.config.strict {
                        log::warn!("Ignoring move from player {}: {}", player, reason);
                    } else {
                        log::debug!("Ignoring move from player {}: {}", player, reason);
                    }
                    self.push_event(TableEvent::MoveRejected { player, reason });
                }
            },
            ClientMessage::RestartRequest => match self.session.request_restart(player) {
                Ok(message) => {
                    self.push_event(TableEvent::RestartRequested { player });
                    if let ServerMessage::GameStart { game_id, .. } = &message {
                        log::info!("Both players asked for a rematch, match {} started", game_id);
                        self.push_event(TableEvent::MatchStarted { match_id: *game_id });
                    }
                    self.send(message);
                }
                Err(reason) => {
                    log::debug!("Ignoring restart from player {}: {}", player, reason);
                }
            },
        }

        self.reap();
    }

    /// Retires a slot. Safe to call any number of times for the same slot.
    pub fn leave(&mut self, slot: SlotId) {
        self.retire(slot);
        self.reap();
    }

    fn retire(&mut self, slot: SlotId) {
        if self.registry.unregister(slot).is_none() {
            return;
        }
        log::info!("Player {} left", slot.player);
        self.push_event(TableEvent::PlayerLeft {
            player: slot.player,
        });

        let was_abandoned = self.session.phase() == Phase::Abandoned;
        let notice = self.session.disconnect(slot.player, self.registry.len());
        if !was_abandoned && self.session.phase() == Phase::Abandoned {
            log::info!(
                "Match {} abandoned by player {}",
                self.session.match_id(),
                slot.player
            );
            self.push_event(TableEvent::MatchAbandoned {
                player: slot.player,
            });
        }
        if let Some(notice) = notice {
            self.send(notice);
        }

        if self.registry.is_empty() && self.session.phase() != Phase::WaitingForPlayers {
            log::info!("All players gone, waiting for a new pair");
            self.session.reset();
        }
    }

    fn send(&mut self, message: ServerMessage) {
        match broadcast(&self.registry, &message) {
            Ok(failed) => self.failed.extend(failed),
            Err(err) => log::error!("Could not encode {}: {}", message.type_name(), err),
        }
    }

    /// Retiring a slot can broadcast again and fail again, so keep going
    /// until the list stays empty.
    fn reap(&mut self) {
        while let Some(slot) = self.failed.pop() {
            self.retire(slot);
        }
    }

    fn push_event(&mut self, event: TableEvent) {
        if self.events.len() >= MAX_EVENTS {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}
