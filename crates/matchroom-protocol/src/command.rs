//! Slash commands understood outside of rooms.
//!
//! Text that starts with `/` is a command; anything else is either an
//! answer inside a room or noise. The transport may append a bot mention
//! (`/lobby@some_bot`), which is stripped before matching.

use crate::{Category, ParticipantId, ProtocolError, RoomId};

const REGISTER_USAGE: &str = "/register <a|b> [name]";
const END_USAGE: &str = "/end <room id>";
const ADMIN_ADD_USAGE: &str = "/admin_add <participant id>";
const ADMIN_REMOVE_USAGE: &str = "/admin_remove <participant id>";
const APPROVE_USAGE: &str = "/approve <participant id>";

/// A parsed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Greeting / help.
    Start,
    /// Report the caller's own identity.
    Id,
    /// Register with a declared category. `name` falls back to the
    /// transport's display name when omitted.
    Register {
        category: Category,
        name: Option<String>,
    },
    /// Leave the waiting pool.
    Leave,
    /// Counts by category and number of active rooms.
    Lobby,
    /// Run the allocator (admin).
    Round,
    /// Force a room into voting (admin).
    End { room: RoomId },
    /// List administrators (admin).
    Admins,
    /// Grant administrator rights (admin).
    AdminAdd(ParticipantId),
    /// Revoke administrator rights (admin).
    AdminRemove(ParticipantId),
    /// Approve a registered user (admin).
    Approve(ParticipantId),
    /// Dump registry contents (admin).
    Users,
    /// Become the duty administrator (admin).
    Duty,
    /// Report the current duty administrator.
    ShowDuty,
}

impl Command {
    /// Parses `text` as a command.
    ///
    /// Returns `None` if the text is not a command at all, `Some(Err(..))`
    /// for unknown commands or bad arguments.
    pub fn parse(text: &str) -> Option<Result<Self, ProtocolError>> {
        let rest = text.trim().strip_prefix('/')?;
        let mut words = rest.split_whitespace();
        let head = words.next().unwrap_or_default();
        let name = head.split('@').next().unwrap_or_default().to_ascii_lowercase();
        let args: Vec<&str> = words.collect();
        Some(Self::from_parts(&name, &args))
    }

    fn from_parts(name: &str, args: &[&str]) -> Result<Self, ProtocolError> {
        match name {
            "start" | "help" => Ok(Self::Start),
            "id" => Ok(Self::Id),
            "register" | "auth" => {
                let token = args.first().ok_or(ProtocolError::Usage(REGISTER_USAGE))?;
                let category = token
                    .parse()
                    .map_err(|_| ProtocolError::Usage(REGISTER_USAGE))?;
                let name = (args.len() > 1).then(|| args[1..].join(" "));
                Ok(Self::Register { category, name })
            }
            "leave" => Ok(Self::Leave),
            "lobby" | "status" => Ok(Self::Lobby),
            "round" => Ok(Self::Round),
            "end" => {
                let room = single_arg(args, END_USAGE)?
                    .parse()
                    .map_err(|_| ProtocolError::Usage(END_USAGE))?;
                Ok(Self::End { room })
            }
            "admins" => Ok(Self::Admins),
            "admin_add" => participant_arg(args, ADMIN_ADD_USAGE).map(Self::AdminAdd),
            "admin_remove" => {
                participant_arg(args, ADMIN_REMOVE_USAGE).map(Self::AdminRemove)
            }
            "approve" => participant_arg(args, APPROVE_USAGE).map(Self::Approve),
            "users" | "show_db" => Ok(Self::Users),
            "duty" => Ok(Self::Duty),
            "show_duty_admin" | "duty_admin" => Ok(Self::ShowDuty),
            other => Err(ProtocolError::UnknownCommand(other.to_string())),
        }
    }

    /// Returns `true` for commands that only administrators may run.
    pub fn requires_admin(&self) -> bool {
        matches!(
            self,
            Self::Round
                | Self::End { .. }
                | Self::Admins
                | Self::AdminAdd(_)
                | Self::AdminRemove(_)
                | Self::Approve(_)
                | Self::Users
                | Self::Duty
        )
    }
}

fn single_arg<'a>(args: &[&'a str], usage: &'static str) -> Result<&'a str, ProtocolError> {
    match args {
        [one] => Ok(one),
        _ => Err(ProtocolError::Usage(usage)),
    }
}

fn participant_arg(args: &[&str], usage: &'static str) -> Result<ParticipantId, ProtocolError> {
    single_arg(args, usage)?
        .parse()
        .map_err(|_| ProtocolError::Usage(usage))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Command, ProtocolError> {
        Command::parse(text).expect("should be a command")
    }

    #[test]
    fn test_plain_text_is_not_a_command() {
        assert!(Command::parse("my answer").is_none());
        assert!(Command::parse("  2 ").is_none());
    }

    #[test]
    fn test_register_with_category_and_name() {
        assert_eq!(
            parse("/register b Jane Doe").unwrap(),
            Command::Register {
                category: Category::B,
                name: Some("Jane Doe".into()),
            }
        );
        assert_eq!(
            parse("/register A").unwrap(),
            Command::Register {
                category: Category::A,
                name: None,
            }
        );
    }

    #[test]
    fn test_register_rejects_unknown_category() {
        let err = parse("/register x").unwrap_err();
        assert!(matches!(err, ProtocolError::Usage(u) if u == REGISTER_USAGE));
        assert!(matches!(parse("/register"), Err(ProtocolError::Usage(_))));
    }

    #[test]
    fn test_bot_mention_is_stripped() {
        assert_eq!(parse("/lobby@matchroom_bot").unwrap(), Command::Lobby);
    }

    #[test]
    fn test_end_parses_room_ids() {
        assert_eq!(parse("/end R-4").unwrap(), Command::End { room: RoomId(4) });
        assert_eq!(parse("/end 4").unwrap(), Command::End { room: RoomId(4) });
        assert!(matches!(parse("/end"), Err(ProtocolError::Usage(_))));
        assert!(matches!(parse("/end nope"), Err(ProtocolError::Usage(_))));
    }

    #[test]
    fn test_admin_commands_take_participant_ids() {
        assert_eq!(
            parse("/admin_add P-12").unwrap(),
            Command::AdminAdd(ParticipantId(12))
        );
        assert_eq!(
            parse("/admin_remove 12").unwrap(),
            Command::AdminRemove(ParticipantId(12))
        );
        assert_eq!(parse("/approve 3").unwrap(), Command::Approve(ParticipantId(3)));
    }

    #[test]
    fn test_unknown_command() {
        let err = parse("/dance").unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownCommand(ref c) if c == "dance"));
    }

    #[test]
    fn test_requires_admin() {
        assert!(Command::Round.requires_admin());
        assert!(Command::Users.requires_admin());
        assert!(!Command::Lobby.requires_admin());
        assert!(!Command::Leave.requires_admin());
        assert!(Command::Duty.requires_admin());
        assert!(!Command::ShowDuty.requires_admin());
    }

    #[test]
    fn test_duty_commands() {
        assert_eq!(parse("/duty").unwrap(), Command::Duty);
        assert_eq!(parse("/show_duty_admin").unwrap(), Command::ShowDuty);
        assert_eq!(parse("/duty_admin@matchroom_bot").unwrap(), Command::ShowDuty);
    }
}
