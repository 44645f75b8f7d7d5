//! The session director: owns the pool, the rooms, and the identity index.
//!
//! Every inbound event goes through [`Director::route`] first. If the
//! sender sits in a room the event belongs to that room; otherwise the
//! caller treats it as a command. All mutation happens through `&mut self`,
//! so the pool and index are always updated in full before the next event
//! is looked at.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use matchroom_protocol::{Category, Inbound, InboundBody, Outbound, ParticipantId, RoomId};

use crate::allocator::{Member, RoomIds, allocate};
use crate::outbox::{Outbox, dispatch};
use crate::room::{FinishedRoom, Room, Seat};
use crate::{PromptBook, RoomConfig, RoomError, RoomState, WaitingPool};

/// Looks up the profile text shown to other room members.
pub trait Directory {
    fn profile(&self, id: ParticipantId) -> Option<String>;
}

/// A directory that knows nobody. Profiles fall back to the identity and
/// category.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousDirectory;

impl Directory for AnonymousDirectory {
    fn profile(&self, _id: ParticipantId) -> Option<String> {
        None
    }
}

impl Directory for HashMap<ParticipantId, String> {
    fn profile(&self, id: ParticipantId) -> Option<String> {
        self.get(&id).cloned()
    }
}

/// Snapshot for the lobby command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LobbyStatus {
    pub waiting_a: usize,
    pub waiting_b: usize,
    pub active_rooms: usize,
}

impl fmt::Display for LobbyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Waiting: {} in category A, {} in category B. Active rooms: {}.",
            self.waiting_a, self.waiting_b, self.active_rooms
        )
    }
}

/// Orchestrates the waiting pool, the allocator and every active room.
pub struct Director {
    config: RoomConfig,
    prompts: Arc<PromptBook>,
    outbox: Arc<dyn Outbox>,

    pool: WaitingPool,
    /// Active rooms, keyed by room ID.
    rooms: HashMap<RoomId, Room>,
    /// Maps each seated participant to their room. A participant is in at
    /// most one room and never in the pool at the same time.
    index: HashMap<ParticipantId, RoomId>,
    room_ids: RoomIds,
    finished: Vec<FinishedRoom>,
}

impl Director {
    pub fn new(config: RoomConfig, prompts: PromptBook, outbox: Arc<dyn Outbox>) -> Self {
        Self {
            config,
            prompts: Arc::new(prompts),
            outbox,
            pool: WaitingPool::new(),
            rooms: HashMap::new(),
            index: HashMap::new(),
            room_ids: RoomIds::new(),
            finished: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Pool
    // -----------------------------------------------------------------------

    /// Puts a participant into the waiting pool. Returns `true` if they
    /// weren't waiting already.
    ///
    /// # Errors
    /// [`RoomError::AlreadyInRoom`] while the participant sits in a room.
    pub fn admit(&mut self, id: ParticipantId, category: Category) -> Result<bool, RoomError> {
        if let Some(room) = self.index.get(&id) {
            return Err(RoomError::AlreadyInRoom(id, *room));
        }
        let added = self.pool.admit(id, category);
        tracing::debug!(participant = %id, %category, added, "admitted to pool");
        Ok(added)
    }

    /// Takes a participant out of the waiting pool.
    ///
    /// # Errors
    /// [`RoomError::AlreadyInRoom`] for seated participants,
    /// [`RoomError::NotInPool`] if they aren't waiting.
    pub fn withdraw(&mut self, id: ParticipantId) -> Result<Category, RoomError> {
        if let Some(room) = self.index.get(&id) {
            return Err(RoomError::AlreadyInRoom(id, *room));
        }
        self.pool.withdraw(id)
    }

    pub fn lobby(&self) -> LobbyStatus {
        LobbyStatus {
            waiting_a: self.pool.count_by_category(Category::A),
            waiting_b: self.pool.count_by_category(Category::B),
            active_rooms: self.rooms.len(),
        }
    }

    // -----------------------------------------------------------------------
    // Rounds
    // -----------------------------------------------------------------------

    /// Allocates rooms from the pool, tells every participant where they
    /// sit, and starts each room.
    ///
    /// # Errors
    /// [`RoomError::InsufficientParticipants`] if not one room fits. The
    /// pool is left as it was.
    pub fn trigger_round(
        &mut self,
        operator: Option<ParticipantId>,
        directory: &dyn Directory,
    ) -> Result<Vec<RoomId>, RoomError> {
        let ratio = self.config.candidates_per_room;
        let specs = allocate(&mut self.pool, ratio, &mut self.room_ids);
        if specs.is_empty() {
            tracing::info!(
                waiting = self.pool.len(),
                ratio,
                "round skipped, not enough participants"
            );
            return Err(RoomError::InsufficientParticipants { ratio });
        }
        tracing::info!(rooms = specs.len(), operator = ?operator, "round triggered");

        let mut created = Vec::with_capacity(specs.len());
        for spec in specs {
            let room_id = spec.room_id;
            let seat = |m: Member| Seat {
                id: m.id,
                category: m.category,
                profile: directory
                    .profile(m.id)
                    .unwrap_or_else(|| format!("{} (category {})", m.id, m.category)),
            };
            let room = Room::new(
                room_id,
                seat(spec.focal),
                spec.candidates.iter().copied().map(seat).collect(),
                operator,
                self.config.clone(),
                Arc::clone(&self.prompts),
                Arc::clone(&self.outbox),
            );
            for id in room.participants() {
                self.index.insert(id, room_id);
            }
            tracing::info!(%room_id, focal = %spec.focal.id, "room created");

            self.notify_assignment(&room);
            self.rooms.insert(room_id, room);
            if let Some(room) = self.rooms.get_mut(&room_id) {
                if let Err(e) = room.start() {
                    tracing::warn!(%room_id, error = %e, "room failed to start");
                }
            }
            self.settle(room_id);
            created.push(room_id);
        }
        Ok(created)
    }

    fn notify_assignment(&self, room: &Room) {
        let room_id = room.id();
        dispatch(
            &*self.outbox,
            Some(room_id),
            [room.focal().id],
            &Outbound::text(format!(
                "You are the focal participant in room {room_id} with {} candidates.",
                room.candidates().len()
            )),
        );
        for (i, seat) in room.candidates().iter().enumerate() {
            dispatch(
                &*self.outbox,
                Some(room_id),
                [seat.id],
                &Outbound::text(format!("You are candidate {} in room {room_id}.", i + 1)),
            );
        }
    }

    // -----------------------------------------------------------------------
    // Routing
    // -----------------------------------------------------------------------

    /// Delivers an event to the sender's room.
    ///
    /// Returns the room that consumed the event, or `None` if the sender
    /// isn't seated anywhere and the event should be handled as a command.
    pub fn route(&mut self, event: &Inbound) -> Option<RoomId> {
        let from = event.from;
        let room_id = *self.index.get(&from)?;
        let Some(room) = self.rooms.get_mut(&room_id) else {
            tracing::warn!(participant = %from, %room_id, "index points at a missing room");
            self.index.remove(&from);
            return None;
        };

        match &event.body {
            InboundBody::Document(_) => {
                dispatch(
                    &*self.outbox,
                    Some(room_id),
                    [from],
                    &Outbound::text("Only text answers are accepted in a room."),
                );
            }
            InboundBody::Text(text) => match room.state() {
                RoomState::Active => {
                    if let Err(e) = room.record_response(from, text) {
                        tracing::debug!(
                            %room_id,
                            participant = %from,
                            error = %e,
                            "answer dropped"
                        );
                    }
                }
                RoomState::Voting => {
                    let choice = text.trim().parse::<usize>().unwrap_or(0);
                    if let Err(e) = room.record_vote(from, choice) {
                        tracing::debug!(%room_id, participant = %from, error = %e, "vote rejected");
                    }
                }
                state @ (RoomState::Waiting | RoomState::Finished) => {
                    tracing::debug!(%room_id, participant = %from, %state, "event ignored");
                }
            },
        }

        self.settle(room_id);
        Some(room_id)
    }

    /// Administrative end: sends the room to voting, or finishes it
    /// without a selection if it is already voting. Returns the state the
    /// room ended up in.
    ///
    /// # Errors
    /// [`RoomError::NotFound`] for unknown rooms.
    pub fn force_end(&mut self, room_id: RoomId) -> Result<RoomState, RoomError> {
        let room = self
            .rooms
            .get_mut(&room_id)
            .ok_or(RoomError::NotFound(room_id))?;
        tracing::info!(%room_id, state = %room.state(), "forced end requested");

        if room.state() == RoomState::Voting {
            room.force_finish();
        } else if let Err(e) = room.start_voting() {
            tracing::warn!(%room_id, error = %e, "could not start voting, finishing room");
            room.force_finish();
        }
        let state = room.state();
        self.settle(room_id);
        Ok(state)
    }

    // -----------------------------------------------------------------------
    // Teardown
    // -----------------------------------------------------------------------

    /// Finishes a room (without a selection if it hasn't voted yet), puts
    /// its participants back into the pool and deregisters it.
    ///
    /// # Errors
    /// [`RoomError::NotFound`] if the room is unknown or already torn down.
    pub fn finish_room(&mut self, room_id: RoomId) -> Result<FinishedRoom, RoomError> {
        let mut room = self
            .rooms
            .remove(&room_id)
            .ok_or(RoomError::NotFound(room_id))?;
        let done = room.finish().ok_or_else(|| {
            RoomError::InvalidState(format!("room {room_id} was already finalized"))
        })?;
        self.teardown(&done);
        self.finished.push(done.clone());
        Ok(done)
    }

    /// Tears the room down once it reached `Finished`.
    fn settle(&mut self, room_id: RoomId) {
        let finished = self
            .rooms
            .get(&room_id)
            .is_some_and(|room| room.state().is_terminal());
        if finished {
            if let Err(e) = self.finish_room(room_id) {
                tracing::warn!(%room_id, error = %e, "room teardown failed");
            }
        }
    }

    /// Reinserts members and hands the transcript to the operator.
    /// Inconsistencies are logged and skipped, never propagated.
    fn teardown(&mut self, done: &FinishedRoom) {
        let room_id = done.room_id;
        for member in &done.members {
            match self.index.remove(&member.id) {
                Some(owner) if owner == room_id => {}
                Some(owner) => {
                    tracing::warn!(
                        %room_id,
                        participant = %member.id,
                        %owner,
                        "participant indexed to another room, leaving it there"
                    );
                    self.index.insert(member.id, owner);
                    continue;
                }
                None => {
                    tracing::warn!(
                        %room_id,
                        participant = %member.id,
                        "participant missing from index"
                    );
                }
            }
            if !self.pool.admit(member.id, member.category) {
                tracing::warn!(
                    %room_id,
                    participant = %member.id,
                    "participant was already waiting"
                );
            }
        }
        self.index.retain(|_, owner| *owner != room_id);

        let back = Outbound::text(format!(
            "Room {room_id} is over. You are back in the waiting pool."
        ));
        dispatch(
            &*self.outbox,
            Some(room_id),
            done.members.iter().map(|m| m.id),
            &back,
        );

        if let Some(operator) = done.operator {
            let caption = match done.selected {
                Some(k) => format!("Room {room_id} finished: selected candidate {k}."),
                None => format!("Room {room_id} finished: no selection made."),
            };
            let document = Outbound::Document {
                bytes: done.document.clone().into_bytes(),
                filename: done.filename.clone(),
                caption,
            };
            dispatch(&*self.outbox, Some(room_id), [operator], &document);
        }
        tracing::info!(%room_id, waiting = self.pool.len(), "room torn down");
    }

    /// Takes the finished rooms collected since the last call.
    pub fn drain_finished(&mut self) -> Vec<FinishedRoom> {
        std::mem::take(&mut self.finished)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn pool(&self) -> &WaitingPool {
        &self.pool
    }

    pub fn room(&self, room_id: RoomId) -> Option<&Room> {
        self.rooms.get(&room_id)
    }

    /// The room a participant currently sits in.
    pub fn room_of(&self, id: ParticipantId) -> Option<RoomId> {
        self.index.get(&id).copied()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Checks that the pool and the rooms are disjoint and that the index
    /// matches room membership exactly.
    pub fn is_consistent(&self) -> bool {
        let mut seated = 0;
        for (room_id, room) in &self.rooms {
            for id in room.participants() {
                seated += 1;
                if self.pool.contains(id) || self.index.get(&id) != Some(room_id) {
                    return false;
                }
            }
        }
        seated == self.index.len()
    }
}

impl fmt::Debug for Director {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Director")
            .field("waiting", &self.pool.len())
            .field("rooms", &self.rooms.len())
            .field("seated", &self.index.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DeliveryError;

    struct Discard;

    impl Outbox for Discard {
        fn post(&self, _to: ParticipantId, _message: Outbound) -> Result<(), DeliveryError> {
            Ok(())
        }
    }

    fn director() -> Director {
        Director::new(RoomConfig::default(), PromptBook::default(), Arc::new(Discard))
    }

    fn pid(id: u64) -> ParticipantId {
        ParticipantId(id)
    }

    #[test]
    fn test_admit_rejects_seated_participants() {
        let mut d = director();
        d.admit(pid(1), Category::A).unwrap();
        for i in 2..5 {
            d.admit(pid(i), Category::B).unwrap();
        }
        let rooms = d.trigger_round(None, &AnonymousDirectory).unwrap();
        assert!(matches!(
            d.admit(pid(2), Category::B),
            Err(RoomError::AlreadyInRoom(p, r)) if p == pid(2) && r == rooms[0]
        ));
        assert!(matches!(d.withdraw(pid(2)), Err(RoomError::AlreadyInRoom(..))));
    }

    #[test]
    fn test_insufficient_round_leaves_pool_untouched() {
        let mut d = director();
        d.admit(pid(1), Category::A).unwrap();
        d.admit(pid(2), Category::B).unwrap();
        let err = d.trigger_round(None, &AnonymousDirectory).unwrap_err();
        assert!(matches!(err, RoomError::InsufficientParticipants { ratio: 3 }));
        assert_eq!(err.to_string(), "insufficient participants, need ratio 3:1 or 1:3");
        assert_eq!(d.pool().len(), 2);
    }

    #[test]
    fn test_route_returns_none_outside_rooms() {
        let mut d = director();
        d.admit(pid(1), Category::A).unwrap();
        assert_eq!(d.route(&Inbound::text(pid(1), "/lobby")), None);
    }

    #[test]
    fn test_lobby_counts() {
        let mut d = director();
        d.admit(pid(1), Category::A).unwrap();
        d.admit(pid(2), Category::B).unwrap();
        d.admit(pid(3), Category::B).unwrap();
        assert_eq!(
            d.lobby(),
            LobbyStatus {
                waiting_a: 1,
                waiting_b: 2,
                active_rooms: 0
            }
        );
    }

    #[test]
    fn test_force_end_unknown_room() {
        let mut d = director();
        assert!(matches!(d.force_end(RoomId(42)), Err(RoomError::NotFound(_))));
    }
}
