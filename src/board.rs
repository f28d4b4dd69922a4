use std::collections::{HashMap, HashSet, VecDeque};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::pseudonym;

/// Oldest messages are evicted once the log grows past this.
pub const MESSAGE_CAPACITY: usize = 100;
pub const MAX_TEXT_LEN: usize = 500;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BoardError {
    #[error("unknown session: {0}")]
    UnknownSession(String),
    #[error("unknown message: {0}")]
    UnknownMessage(String),
    #[error("session {voter} already voted on message {message}")]
    AlreadyVoted { message: String, voter: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: String,
    pub pseudonym: String,
    pub connected_at: SystemTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub text: String,
    pub author_pseudonym: String,
    pub created_at: SystemTime,
    pub score: i64,
    pub voters: HashSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

/// Result of an accepted vote, carrying what the update broadcast needs.
#[derive(Debug, Clone)]
pub struct VoteOutcome {
    pub message_id: String,
    pub score: i64,
    pub voters: Vec<String>,
}

/// The single owned aggregate: session registry plus the bounded message log
/// with its per-message vote bookkeeping. All mutation goes through `&mut
/// self`; the server serializes access behind one lock.
#[derive(Debug)]
pub struct Board {
    sessions: HashMap<String, Session>,
    messages: VecDeque<Message>,
    capacity: usize,
}

impl Board {
    pub fn new() -> Self {
        Self::with_capacity(MESSAGE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Board {
            sessions: HashMap::new(),
            messages: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Registers a connection under `session_id` with a freshly minted
    /// pseudonym. Reconnects get a new identity; nothing is carried over.
    pub fn register(&mut self, session_id: String) -> Session {
        let session = Session {
            session_id: session_id.clone(),
            pseudonym: pseudonym::generate(),
            connected_at: SystemTime::now(),
        };
        self.sessions.insert(session_id, session.clone());
        session
    }

    /// Idempotent: deregistering an unknown session is a no-op.
    pub fn deregister(&mut self, session_id: &str) {
        self.sessions.remove(session_id);
    }

    pub fn count(&self) -> usize {
        self.sessions.len()
    }

    pub fn session(&self, session_id: &str) -> Option<&Session> {
        self.sessions.get(session_id)
    }

    /// Appends a message authored by the given session, evicting the oldest
    /// entry (and its vote history) once the log exceeds capacity.
    ///
    /// The author's pseudonym is copied into the message, so it outlives the
    /// author's session.
    pub fn append(&mut self, author_session_id: &str, text: String) -> Result<Message, BoardError> {
        let author = self
            .sessions
            .get(author_session_id)
            .ok_or_else(|| BoardError::UnknownSession(author_session_id.to_string()))?;

        let message = Message {
            id: Uuid::new_v4().to_string(),
            text,
            author_pseudonym: author.pseudonym.clone(),
            created_at: SystemTime::now(),
            score: 0,
            voters: HashSet::new(),
        };

        self.messages.push_back(message.clone());
        if self.messages.len() > self.capacity {
            self.messages.pop_front();
        }
        Ok(message)
    }

    /// Current log, oldest first.
    pub fn list(&self) -> Vec<Message> {
        self.messages.iter().cloned().collect()
    }

    pub fn find(&self, message_id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == message_id)
    }

    /// Records at most one vote per (message, voter) pair. A cast vote is
    /// permanent for the lifetime of the message; there is no retraction.
    pub fn apply_vote(
        &mut self,
        message_id: &str,
        voter_id: &str,
        direction: VoteDirection,
    ) -> Result<VoteOutcome, BoardError> {
        let message = self
            .messages
            .iter_mut()
            .find(|m| m.id == message_id)
            .ok_or_else(|| BoardError::UnknownMessage(message_id.to_string()))?;

        if !message.voters.insert(voter_id.to_string()) {
            return Err(BoardError::AlreadyVoted {
                message: message_id.to_string(),
                voter: voter_id.to_string(),
            });
        }

        message.score += match direction {
            VoteDirection::Up => 1,
            VoteDirection::Down => -1,
        };

        Ok(VoteOutcome {
            message_id: message.id.clone(),
            score: message.score,
            voters: message.voters.iter().cloned().collect(),
        })
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
