//! One room's state machine.
//!
//! A [`Room`] seats one focal participant and `N` candidates. Once started
//! it issues prompts in a fixed rotation (focal, candidate 1, ..,
//! candidate N, focal, ..), records every answer in its [`Transcript`],
//! and after `prompt_limit` prompts asks the focal participant to pick a
//! candidate. Every message it produces goes through the shared
//! [`Outbox`]; a recipient that can't be reached is logged and skipped.
//!
//! The room never touches the waiting pool or the identity index. When it
//! reaches [`RoomState::Finished`] the director calls [`Room::finish`]
//! and tears it down.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use matchroom_protocol::{Category, Outbound, ParticipantId, RoomId};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;

use crate::allocator::Member;
use crate::outbox::{Outbox, dispatch};
use crate::transcript::{Role, Transcript, TranscriptHeader};
use crate::{PromptBook, RoomConfig, RoomError, RoomState};

/// A participant seated in a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seat {
    pub id: ParticipantId,
    pub category: Category,
    /// Text shown to the other side when the room starts.
    pub profile: String,
}

impl Seat {
    pub fn member(&self) -> Member {
        Member {
            id: self.id,
            category: self.category,
        }
    }
}

/// What happened to an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseOutcome {
    Accepted,
    /// The sender isn't the current target. Nothing changed.
    NotYourTurn,
}

/// What happened to a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// The focal participant picked candidate `k`; the room is finished.
    Selected(usize),
    /// Someone other than the focal participant tried to vote.
    NotFocal,
}

/// Everything the director needs once a room is over.
#[derive(Debug, Clone)]
pub struct FinishedRoom {
    pub room_id: RoomId,
    /// Focal participant first, then candidates in ordinal order.
    pub members: Vec<Member>,
    pub operator: Option<ParticipantId>,
    pub selected: Option<usize>,
    /// The rendered transcript document.
    pub document: String,
    pub filename: String,
}

/// A single matchmaking session.
pub struct Room {
    id: RoomId,
    state: RoomState,
    focal: Seat,
    candidates: Vec<Seat>,
    operator: Option<ParticipantId>,

    transcript: Transcript,
    /// Who must answer next. Only set while `Active`.
    turn: Option<Role>,
    prompt: Option<String>,
    issued: usize,
    /// Prompts issued before the current de-duplication cycle began.
    cycle_start: usize,
    selected: Option<usize>,
    finalized: bool,

    config: RoomConfig,
    prompts: Arc<PromptBook>,
    outbox: Arc<dyn Outbox>,
    rng: StdRng,
}

impl Room {
    pub fn new(
        id: RoomId,
        focal: Seat,
        candidates: Vec<Seat>,
        operator: Option<ParticipantId>,
        config: RoomConfig,
        prompts: Arc<PromptBook>,
        outbox: Arc<dyn Outbox>,
    ) -> Self {
        let seed = match config.seed {
            Some(seed) => seed.wrapping_add(id.0),
            None => rand::random(),
        };
        Self {
            id,
            state: RoomState::Waiting,
            focal,
            candidates,
            operator,
            transcript: Transcript::new(),
            turn: None,
            prompt: None,
            issued: 0,
            cycle_start: 0,
            selected: None,
            finalized: false,
            config,
            prompts,
            outbox,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Moves `Waiting → Active`, exchanges profiles, and issues the first
    /// prompt.
    ///
    /// If no prompt can be issued the room goes straight to voting, and if
    /// that fails too it is force-finished. Either way the call succeeds;
    /// check [`Room::state`] afterwards.
    ///
    /// # Errors
    /// [`RoomError::InvalidState`] if the room was already started.
    pub fn start(&mut self) -> Result<(), RoomError> {
        self.transition(RoomState::Active)?;
        tracing::info!(
            room_id = %self.id,
            focal = %self.focal.id,
            candidates = self.candidates.len(),
            "room started"
        );

        let focal_card = Outbound::text(format!(
            "Room {} has started. The focal participant is:\n{}",
            self.id, self.focal.profile
        ));
        self.broadcast(self.candidate_ids(), &focal_card);

        let mut lineup = format!("Room {} has started. Your candidates:", self.id);
        for (i, seat) in self.candidates.iter().enumerate() {
            lineup.push_str(&format!("\n{}. {}", i + 1, seat.profile));
        }
        self.send(self.focal.id, lineup);

        self.advance();
        Ok(())
    }

    /// Issues the next prompt, or moves to voting once `prompt_limit`
    /// prompts have been issued.
    ///
    /// # Errors
    /// [`RoomError::InvalidState`] outside `Active`, [`RoomError::NoPrompts`]
    /// if there is nothing to ask.
    pub fn issue_prompt(&mut self) -> Result<(), RoomError> {
        if !self.state.is_active() {
            return Err(self.invalid("issue a prompt"));
        }
        if self.issued >= self.config.prompt_limit {
            return self.start_voting();
        }

        let role = self.role_for_turn(self.issued);
        let text = self.pick_prompt().ok_or(RoomError::NoPrompts)?;
        let target = self.seat(role).map(|s| s.id).ok_or_else(|| {
            RoomError::InvalidState(format!("room {} has no seat for {role}", self.id))
        })?;

        self.send(
            target,
            format!("Question for you ({role}):\n{text}\n\nReply with your answer."),
        );
        let notice = Outbound::text(format!("Question for {role}:\n{text}"));
        self.broadcast(self.ids_except(target), &notice);

        self.transcript.push_prompt(&text, role);
        tracing::debug!(room_id = %self.id, turn = self.issued, %role, "prompt issued");
        self.turn = Some(role);
        self.prompt = Some(text);
        self.issued += 1;
        Ok(())
    }

    /// Records an answer from the current target and moves on.
    ///
    /// # Errors
    /// [`RoomError::InvalidState`] outside `Active`.
    pub fn record_response(
        &mut self,
        from: ParticipantId,
        text: &str,
    ) -> Result<ResponseOutcome, RoomError> {
        if !self.state.is_active() {
            return Err(self.invalid("accept an answer"));
        }
        let (Some(role), Some(prompt)) = (self.turn, self.prompt.clone()) else {
            return Err(self.invalid("accept an answer without a prompt"));
        };
        if self.current_target() != Some(from) {
            self.send(from, "It's not your turn yet. Please wait for your question.");
            return Ok(ResponseOutcome::NotYourTurn);
        }

        self.transcript.push_response(text, role, &prompt);
        let echo = Outbound::text(format!("{role}: {text}"));
        self.broadcast(self.ids_except(from), &echo);
        self.send(from, "Answer recorded.");

        self.turn = None;
        self.prompt = None;
        self.advance();
        Ok(ResponseOutcome::Accepted)
    }

    /// Moves the room to voting and asks the focal participant to choose.
    ///
    /// Allowed from `Active` and, as an administrative override, from
    /// `Waiting`.
    ///
    /// # Errors
    /// [`RoomError::InvalidState`] from `Voting` or `Finished`,
    /// [`RoomError::NoCandidates`] if there is no one to pick.
    pub fn start_voting(&mut self) -> Result<(), RoomError> {
        if self.candidates.is_empty() {
            return Err(RoomError::NoCandidates(self.id));
        }
        self.transition(RoomState::Voting)?;
        self.turn = None;
        self.prompt = None;
        tracing::info!(room_id = %self.id, prompts = self.issued, "room voting");

        let mut ballot = String::from("Time to choose. Reply with the number of your pick:");
        for (i, seat) in self.candidates.iter().enumerate() {
            ballot.push_str(&format!("\n{}. {}", i + 1, seat.profile));
        }
        self.send(self.focal.id, ballot);

        let notice = Outbound::text("The focal participant is making their choice.");
        self.broadcast(self.candidate_ids(), &notice);
        if let Some(operator) = self.operator {
            self.send(operator, format!("Room {} is voting.", self.id));
        }
        Ok(())
    }

    /// Records the focal participant's pick and finishes the room.
    ///
    /// # Errors
    /// [`RoomError::InvalidState`] outside `Voting`;
    /// [`RoomError::InvalidSelection`] if `choice` isn't in `1..=N`. The
    /// voter is told either way and the state is unchanged.
    pub fn record_vote(
        &mut self,
        from: ParticipantId,
        choice: usize,
    ) -> Result<VoteOutcome, RoomError> {
        if self.state != RoomState::Voting {
            return Err(self.invalid("accept a vote"));
        }
        if from != self.focal.id {
            self.send(from, "Only the focal participant chooses in this room.");
            return Ok(VoteOutcome::NotFocal);
        }
        let max = self.candidates.len();
        if !(1..=max).contains(&choice) {
            self.send(from, format!("Please reply with a number from 1 to {max}."));
            return Err(RoomError::InvalidSelection { choice, max });
        }

        self.transition(RoomState::Finished)?;
        self.selected = Some(choice);
        let chosen = self.candidates[choice - 1].id;
        tracing::info!(room_id = %self.id, %chosen, choice, "candidate selected");

        self.send(chosen, "You were chosen!");
        let others = Outbound::text(format!("Candidate {choice} was chosen."));
        let rest: Vec<_> = self.candidate_ids().filter(|id| *id != chosen).collect();
        self.broadcast(rest, &others);
        self.send(self.focal.id, format!("You chose candidate {choice}."));
        Ok(VoteOutcome::Selected(choice))
    }

    /// Ends the room without a selection. No-op once finished.
    pub fn force_finish(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        tracing::info!(room_id = %self.id, from = %self.state, "room force-finished");
        self.state = RoomState::Finished;
        self.turn = None;
        self.prompt = None;
        let notice = Outbound::text(format!("Room {} has ended without a selection.", self.id));
        self.broadcast(self.participants(), &notice);
    }

    /// Produces the room's final record. Only the first call returns
    /// `Some`; a room that isn't finished yet is force-finished first.
    pub fn finish(&mut self) -> Option<FinishedRoom> {
        if self.finalized {
            return None;
        }
        self.force_finish();
        self.finalized = true;

        let header = TranscriptHeader {
            room_id: self.id,
            date: Utc::now(),
            focal: self.focal.id,
            candidates: self.candidate_ids().collect(),
            selected: self.selected,
        };
        tracing::info!(room_id = %self.id, selected = ?self.selected, "room finished");
        Some(FinishedRoom {
            room_id: self.id,
            members: std::iter::once(&self.focal)
                .chain(&self.candidates)
                .map(Seat::member)
                .collect(),
            operator: self.operator,
            selected: self.selected,
            document: self.transcript.render(&header),
            filename: format!("transcript_{}.txt", self.id),
        })
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn id(&self) -> RoomId {
        self.id
    }

    pub fn state(&self) -> RoomState {
        self.state
    }

    pub fn focal(&self) -> &Seat {
        &self.focal
    }

    pub fn candidates(&self) -> &[Seat] {
        &self.candidates
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn turn(&self) -> Option<Role> {
        self.turn
    }

    pub fn prompts_issued(&self) -> usize {
        self.issued
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Identity that must answer next.
    pub fn current_target(&self) -> Option<ParticipantId> {
        self.turn.and_then(|role| self.seat(role)).map(|s| s.id)
    }

    /// Focal participant first, then candidates.
    pub fn participants(&self) -> impl Iterator<Item = ParticipantId> + '_ {
        std::iter::once(self.focal.id).chain(self.candidate_ids())
    }

    pub fn role_of(&self, id: ParticipantId) -> Option<Role> {
        if id == self.focal.id {
            return Some(Role::Focal);
        }
        self.candidates
            .iter()
            .position(|s| s.id == id)
            .map(|i| Role::Candidate(i + 1))
    }

    pub fn seat(&self, role: Role) -> Option<&Seat> {
        match role {
            Role::Focal => Some(&self.focal),
            Role::Candidate(k) => k.checked_sub(1).and_then(|i| self.candidates.get(i)),
        }
    }

    /// Turn `t` targets the focal participant every `N + 1` turns and
    /// candidate `t mod (N + 1)` otherwise.
    pub fn role_for_turn(&self, turn: usize) -> Role {
        match turn % (self.candidates.len() + 1) {
            0 => Role::Focal,
            k => Role::Candidate(k),
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn transition(&mut self, target: RoomState) -> Result<(), RoomError> {
        if !self.state.can_transition_to(target) {
            return Err(RoomError::InvalidState(format!(
                "room {} cannot move from {} to {}",
                self.id, self.state, target
            )));
        }
        self.state = target;
        Ok(())
    }

    fn invalid(&self, action: &str) -> RoomError {
        RoomError::InvalidState(format!("room {} is {}, cannot {action}", self.id, self.state))
    }

    /// Issues the next prompt; on failure falls back to voting, then to a
    /// forced finish.
    fn advance(&mut self) {
        let Err(e) = self.issue_prompt() else {
            return;
        };
        tracing::warn!(room_id = %self.id, error = %e, "could not issue prompt, moving to voting");
        if let Err(e) = self.start_voting() {
            tracing::warn!(
                room_id = %self.id,
                error = %e,
                "could not start voting, finishing room"
            );
            self.force_finish();
        }
    }

    /// Uniform pick among prompts not yet used in the current cycle. When
    /// every prompt has been used a new cycle starts.
    fn pick_prompt(&mut self) -> Option<String> {
        let mut fresh = self.fresh_prompts();
        if fresh.is_empty() {
            self.cycle_start = self.issued;
            fresh = self.fresh_prompts();
        }
        fresh.choose(&mut self.rng).cloned()
    }

    fn fresh_prompts(&self) -> Vec<String> {
        let used: HashSet<&str> = self
            .transcript
            .prompts_used()
            .skip(self.cycle_start)
            .collect();
        self.prompts
            .as_slice()
            .iter()
            .filter(|p| !used.contains(p.as_str()))
            .cloned()
            .collect()
    }

    fn candidate_ids(&self) -> impl Iterator<Item = ParticipantId> + '_ {
        self.candidates.iter().map(|s| s.id)
    }

    fn ids_except(&self, skip: ParticipantId) -> Vec<ParticipantId> {
        self.participants().filter(|id| *id != skip).collect()
    }

    fn send(&self, to: ParticipantId, text: impl Into<String>) {
        dispatch(&*self.outbox, Some(self.id), [to], &Outbound::text(text));
    }

    fn broadcast(&self, to: impl IntoIterator<Item = ParticipantId>, message: &Outbound) {
        dispatch(&*self.outbox, Some(self.id), to, message);
    }
}

impl std::fmt::Debug for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Room")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("focal", &self.focal.id)
            .field("candidates", &self.candidates.len())
            .field("issued", &self.issued)
            .field("selected", &self.selected)
            .finish()
    }
}
