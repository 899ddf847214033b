use crate::{PLAYER_COUNT, PlayerIndex};

/// Handle for one registered connection. The generation makes ids from an
/// earlier pairing inert once their slot has been reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId {
    pub player: PlayerIndex,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("both player slots are taken")]
    Full,
    #[error("match is winding down, no new players until every slot is free")]
    Draining,
}

#[derive(Debug)]
struct Slot<C> {
    generation: u64,
    connection: C,
}

/// Up to two live connections indexed by player number.
#[derive(Debug)]
pub struct Registry<C> {
    slots: [Option<Slot<C>>; PLAYER_COUNT],
    next_generation: u64,
    draining: bool,
}

impl<C> Default for Registry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Registry<C> {
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
            next_generation: 1,
            draining: false,
        }
    }

    /// Assigns the next index (the current size). Freed slots are never
    /// handed out again until the registry has emptied completely.
    pub fn register(&mut self, connection: C) -> Result<SlotId, RegistryError> {
        if self.draining {
            return Err(RegistryError::Draining);
        }
        let index = self.len();
        if index >= PLAYER_COUNT {
            return Err(RegistryError::Full);
        }

        let generation = self.next_generation;
        self.next_generation += 1;
        self.slots[index] = Some(Slot {
            generation,
            connection,
        });

        Ok(SlotId {
            player: index as PlayerIndex,
            generation,
        })
    }

    /// Removes the slot if `id` still owns it. Repeated or stale calls return `None`.
    pub fn unregister(&mut self, id: SlotId) -> Option<C> {
        if !self.is_live(id) {
            return None;
        }
        let slot = self.slots[id.player as usize].take()?;

        self.draining = !self.is_empty();
        Some(slot.connection)
    }

    pub fn is_live(&self, id: SlotId) -> bool {
        self.slots
            .get(id.player as usize)
            .and_then(Option::as_ref)
            .is_some_and(|slot| slot.generation == id.generation)
    }

    pub fn get(&self, player: PlayerIndex) -> Option<&C> {
        self.slots
            .get(player as usize)
            .and_then(Option::as_ref)
            .map(|slot| &slot.connection)
    }

    /// Live recipients in registration order.
    pub fn broadcast_targets(&self) -> impl Iterator<Item = (SlotId, &C)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.as_ref().map(|slot| {
                (
                    SlotId {
                        player: index as PlayerIndex,
                        generation: slot.generation,
                    },
                    &slot.connection,
                )
            })
        })
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() == PLAYER_COUNT
    }

    pub fn is_draining(&self) -> bool {
        self.draining
    }
}
