//! Inbound event handling: room routing first, then text commands.
//!
//! Every event runs to completion against the server state before the next
//! one is looked at. The flow is:
//!   1. Ask the director whether the sender sits in a room → room handles it
//!   2. Otherwise parse a slash command → check admin rights → execute
//!   3. Publish any transcripts the event finished

use matchroom_protocol::{Category, Command, Inbound, Outbound, ParticipantId};
use matchroom_registry::{Registry, RegistryError, UserRecord};
use matchroom_room::{Directory, RoomError, dispatch};

use crate::server::ServerState;

/// Telegram's hard limit on a single message.
pub const MESSAGE_CHUNK_LIMIT: usize = 4096;

/// Profiles for room members come from the registry.
struct RegistryDirectory<'a, R>(&'a R);

impl<R: Registry> Directory for RegistryDirectory<'_, R> {
    fn profile(&self, id: ParticipantId) -> Option<String> {
        self.0.get(id).map(|record| record.profile())
    }
}

/// Handles one inbound event.
pub(crate) fn handle_inbound<R: Registry>(state: &mut ServerState<R>, event: Inbound) {
    let from = event.from;
    if let Some(room_id) = state.director.route(&event) {
        tracing::debug!(participant = %from, %room_id, "event routed to room");
    } else {
        match event.as_text().map(Command::parse) {
            Some(Some(Ok(command))) => {
                let name = event.name.as_deref();
                handle_command(state, from, name, command);
            }
            Some(Some(Err(e))) => reply(state, from, e.to_string()),
            Some(None) => reply(state, from, "Unknown input. Send /start for help."),
            None => reply(state, from, "Documents are not accepted. Send text instead."),
        }
    }
    publish_finished(state);
}

fn handle_command<R: Registry>(
    state: &mut ServerState<R>,
    from: ParticipantId,
    name: Option<&str>,
    command: Command,
) {
    if command.requires_admin() && !ensure_admin(state, from) {
        tracing::debug!(participant = %from, ?command, "admin command refused");
        reply(state, from, "This command is for administrators only.");
        return;
    }
    tracing::debug!(participant = %from, ?command, "command");

    match command {
        Command::Start => {
            let text = if state.registry.exists(from) {
                state.config.welcome.clone()
            } else {
                format!(
                    "{}\n\nYou are not registered yet. Use /register <a|b> [name].",
                    state.config.welcome
                )
            };
            reply(state, from, text);
        }
        Command::Id => reply(state, from, format!("Your id is {} ({from}).", from.0)),
        Command::Register { category, name: given } => {
            let name = given
                .as_deref()
                .or(name)
                .map_or_else(|| from.to_string(), str::to_string);
            register(state, from, &name, category);
        }
        Command::Leave => {
            let text = match state.director.withdraw(from) {
                Ok(_) => "You left the waiting pool.".to_string(),
                Err(RoomError::NotInPool(_)) => "You are not in the waiting pool.".to_string(),
                Err(e) => e.to_string(),
            };
            reply(state, from, text);
        }
        Command::Lobby => {
            let status = state.director.lobby().to_string();
            reply(state, from, status);
        }
        Command::Round => {
            let directory = RegistryDirectory(&state.registry);
            let text = match state.director.trigger_round(Some(from), &directory) {
                Ok(rooms) => {
                    let ids: Vec<String> = rooms.iter().map(ToString::to_string).collect();
                    format!("Round started with {} room(s): {}.", rooms.len(), ids.join(", "))
                }
                Err(e) => format!("No rooms created: {e}."),
            };
            reply(state, from, text);
        }
        Command::End { room } => {
            let text = match state.director.force_end(room) {
                Ok(room_state) => format!("Room {room} is now {room_state}."),
                Err(e) => e.to_string(),
            };
            reply(state, from, text);
        }
        Command::Admins => {
            let admins: Vec<String> = state
                .registry
                .list_admins()
                .iter()
                .map(ToString::to_string)
                .collect();
            reply(state, from, format!("Administrators: {}", admins.join(", ")));
        }
        Command::AdminAdd(id) => {
            let text = if state.registry.add_admin(id) {
                tracing::info!(admin = %id, by = %from, "administrator added");
                format!("{id} is now an administrator.")
            } else {
                format!("{id} is already an administrator.")
            };
            reply(state, from, text);
        }
        Command::AdminRemove(id) => {
            let text = if state.registry.remove_admin(id) {
                tracing::info!(admin = %id, by = %from, "administrator removed");
                format!("{id} is no longer an administrator.")
            } else {
                format!("{id} is not an administrator.")
            };
            reply(state, from, text);
        }
        Command::Approve(id) => approve(state, from, id),
        Command::Duty => {
            state.registry.set_duty_admin(Some(from));
            reply(
                state,
                from,
                "You are now the duty administrator. Approval requests will come to you.",
            );
        }
        Command::ShowDuty => {
            let text = match state.registry.duty_admin() {
                Some(id) => match state.registry.get(id) {
                    Some(record) => format!("Duty administrator: {id} {}.", record.profile()),
                    None => format!("Duty administrator: {id}."),
                },
                None => "No duty administrator is set.".to_string(),
            };
            reply(state, from, text);
        }
        Command::Users => {
            let lines: Vec<String> = state.registry.all().iter().map(user_line).collect();
            if lines.is_empty() {
                reply(state, from, "No registered users.");
            }
            for chunk in chunk_lines(&lines, MESSAGE_CHUNK_LIMIT) {
                reply(state, from, chunk);
            }
        }
    }
}

/// Admin check. With no administrators at all the caller becomes the
/// first one.
fn ensure_admin<R: Registry>(state: &mut ServerState<R>, from: ParticipantId) -> bool {
    if state.registry.list_admins().is_empty() {
        state.registry.add_admin(from);
        tracing::info!(admin = %from, "first administrator bootstrapped");
        reply(state, from, "No administrators existed, you are now one.");
        return true;
    }
    state.registry.is_admin(from)
}

fn register<R: Registry>(
    state: &mut ServerState<R>,
    from: ParticipantId,
    name: &str,
    category: Category,
) {
    let record = match state.registry.add(from, name, category) {
        Ok(record) => record,
        Err(RegistryError::AlreadyRegistered(_)) => {
            // Registered users rejoin the pool with their stored category.
            match state.registry.get(from) {
                Some(record) if record.approved || !state.config.require_approval => {
                    let text = admit_text(state, &record);
                    reply(state, from, text);
                }
                Some(_) => reply(state, from, "You are registered and waiting for approval."),
                None => reply(state, from, "Registration failed, please try again."),
            }
            return;
        }
        Err(e) => {
            tracing::warn!(participant = %from, error = %e, "registration failed");
            reply(state, from, "Registration failed, please try again.");
            return;
        }
    };

    if state.config.require_approval {
        reply(
            state,
            from,
            format!(
                "Registered as {}. An administrator has to approve you before you join the pool.",
                record.profile()
            ),
        );
        request_approval(state, &record);
    } else {
        let text = admit_text(state, &record);
        reply(state, from, format!("Registered as {}. {text}", record.profile()));
    }
}

fn approve<R: Registry>(state: &mut ServerState<R>, from: ParticipantId, id: ParticipantId) {
    match state.registry.approve(id) {
        Ok(record) => {
            if state.config.require_approval {
                let text = admit_text(state, &record);
                reply(state, id, format!("Your registration was approved. {text}"));
            }
            reply(state, from, format!("Approved {id}: {}.", record.profile()));
        }
        Err(e) => reply(state, from, e.to_string()),
    }
}

/// Sends an approval request to the duty administrator, or to every
/// administrator when no duty administrator is set.
fn request_approval<R: Registry>(state: &ServerState<R>, record: &UserRecord) {
    let recipients: Vec<ParticipantId> = match state.registry.duty_admin() {
        Some(duty) if state.registry.is_admin(duty) => vec![duty],
        _ => state.registry.list_admins().into_iter().collect(),
    };
    if recipients.is_empty() {
        tracing::warn!(participant = %record.id, "no administrator to approve registration");
        return;
    }
    let text = format!(
        "Approval request from {} {}. Use /approve {}.",
        record.id,
        record.profile(),
        record.id.0
    );
    dispatch(&state.outbox, None, recipients, &Outbound::text(text));
}

/// Puts a registered participant into the pool and describes the result.
fn admit_text<R: Registry>(state: &mut ServerState<R>, record: &UserRecord) -> String {
    match state.director.admit(record.id, record.category) {
        Ok(true) => format!("You are in the waiting pool as category {}.", record.category),
        Ok(false) => format!("You are already waiting as category {}.", record.category),
        Err(e) => e.to_string(),
    }
}

fn user_line(record: &UserRecord) -> String {
    let status = if record.approved { "approved" } else { "pending" };
    format!("{} {} [{status}]", record.id, record.profile())
}

/// Joins lines into messages no longer than `limit` bytes. A single line
/// longer than `limit` is split on character boundaries.
pub fn chunk_lines(lines: &[String], limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for line in lines {
        let needed = if current.is_empty() { line.len() } else { line.len() + 1 };
        if current.len() + needed > limit && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        if line.len() > limit {
            let mut piece = String::new();
            for ch in line.chars() {
                if piece.len() + ch.len_utf8() > limit {
                    chunks.push(std::mem::take(&mut piece));
                }
                piece.push(ch);
            }
            current = piece;
            continue;
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn reply<R: Registry>(state: &ServerState<R>, to: ParticipantId, text: impl Into<String>) {
    dispatch(&state.outbox, None, [to], &Outbound::text(text));
}

fn publish_finished<R: Registry>(state: &mut ServerState<R>) {
    for done in state.director.drain_finished() {
        tracing::info!(room_id = %done.room_id, selected = ?done.selected, "transcript ready");
        if let Some(sink) = &state.transcripts {
            if sink.send(done).is_err() {
                tracing::warn!("transcript receiver dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_lines_respects_limit() {
        let lines: Vec<String> = (0..10).map(|i| format!("line {i:02}")).collect();
        let chunks = chunk_lines(&lines, 20);
        assert!(chunks.iter().all(|c| c.len() <= 20));
        assert_eq!(chunks.join("\n"), lines.join("\n"));
        assert_eq!(chunks[0], "line 00\nline 01");
    }

    #[test]
    fn test_chunk_lines_splits_oversized_line() {
        let chunks = chunk_lines(&["x".repeat(25)], 10);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks.concat(), "x".repeat(25));
    }

    #[test]
    fn test_chunk_lines_empty() {
        assert!(chunk_lines(&[], 10).is_empty());
    }
}
