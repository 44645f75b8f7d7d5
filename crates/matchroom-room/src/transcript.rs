//! The append-only record of a room's question/answer phase and the
//! document rendered from it when the room finishes.

use std::fmt::{self, Write as _};

use chrono::{DateTime, Utc};
use matchroom_protocol::{ParticipantId, RoomId};

/// Separator written after every response in the rendered document.
pub const SEPARATOR: &str = "----------";

/// A seat in a room, as seen in the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Focal,
    /// Candidate ordinal, starting at 1.
    Candidate(usize),
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Focal => write!(f, "Focal"),
            Self::Candidate(k) => write!(f, "Candidate {k}"),
        }
    }
}

/// One line of the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Prompt {
        text: String,
        target: Role,
        at: DateTime<Utc>,
    },
    Response {
        text: String,
        source: Role,
        /// The prompt this answers.
        prompt: String,
        at: DateTime<Utc>,
    },
}

impl Entry {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Self::Prompt { at, .. } | Self::Response { at, .. } => *at,
        }
    }
}

/// Ordered transcript entries with non-decreasing timestamps.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<Entry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a prompt entry stamped with the current time.
    pub fn push_prompt(&mut self, text: &str, target: Role) {
        let at = self.stamp();
        self.entries.push(Entry::Prompt {
            text: text.to_string(),
            target,
            at,
        });
    }

    /// Appends a response entry stamped with the current time.
    pub fn push_response(&mut self, text: &str, source: Role, prompt: &str) {
        let at = self.stamp();
        self.entries.push(Entry::Response {
            text: text.to_string(),
            source,
            prompt: prompt.to_string(),
            at,
        });
    }

    /// Wall clocks can step backwards; entries never do.
    fn stamp(&self) -> DateTime<Utc> {
        let now = Utc::now();
        match self.entries.last() {
            Some(last) if last.at() > now => last.at(),
            _ => now,
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Prompt texts issued so far, in issue order.
    pub fn prompts_used(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().filter_map(|e| match e {
            Entry::Prompt { text, .. } => Some(text.as_str()),
            Entry::Response { .. } => None,
        })
    }

    /// Renders the finished-room document.
    pub fn render(&self, header: &TranscriptHeader) -> String {
        let mut out = String::new();
        // Writing into a String can't fail.
        let _ = write!(out, "{header}");
        out.push('\n');
        for entry in &self.entries {
            let _ = match entry {
                Entry::Prompt { text, target, .. } => {
                    writeln!(out, "Prompt ({target}): {text}")
                }
                Entry::Response { text, source, .. } => {
                    writeln!(out, "{source}: {text}\n{SEPARATOR}")
                }
            };
        }
        out
    }
}

/// The header block of a transcript document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptHeader {
    pub room_id: RoomId,
    pub date: DateTime<Utc>,
    pub focal: ParticipantId,
    /// Candidates in ordinal order.
    pub candidates: Vec<ParticipantId>,
    /// Ordinal of the selected candidate.
    pub selected: Option<usize>,
}

impl fmt::Display for TranscriptHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Room: {}", self.room_id)?;
        writeln!(f, "Date: {} UTC", self.date.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(f, "Focal: {}", self.focal)?;
        for (i, candidate) in self.candidates.iter().enumerate() {
            writeln!(f, "Candidate {}: {candidate}", i + 1)?;
        }
        match self.selected {
            Some(k) => writeln!(f, "Outcome: selected candidate {k}"),
            None => writeln!(f, "Outcome: no selection made"),
        }
    }
}
