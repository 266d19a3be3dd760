//! In-memory conversation session
//!
//! A session lives as long as the process. Turns are only ever appended.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Application name the session is registered under
pub const APP_NAME: &str = "calculator_agent";

/// Identity of the single local user
pub const USER_ID: &str = "calculator_user";

/// One completed exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// The utterance as the user typed it
    pub request: String,
    /// The agent's final answer
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

/// Conversation state shared by all turns of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    id: String,
    app_name: String,
    user_id: String,
    created_at: DateTime<Utc>,
    turns: Vec<Turn>,
}

impl Session {
    /// A fresh session for the local calculator user
    pub fn new() -> Self {
        Self::with_identity(APP_NAME, USER_ID)
    }

    pub fn with_identity<A: Into<String>, U: Into<String>>(app_name: A, user_id: U) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            app_name: app_name.into(),
            user_id: user_id.into(),
            created_at: Utc::now(),
            turns: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last_turn(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Append a completed exchange
    pub fn record_turn<R: Into<String>, S: Into<String>>(&mut self, request: R, response: S) -> &Turn {
        self.turns.push(Turn {
            request: request.into(),
            response: response.into(),
            timestamp: Utc::now(),
        });
        tracing::debug!(session_id = %self.id, turns = self.turns.len(), "Recorded turn");
        &self.turns[self.turns.len() - 1]
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_identity() {
        let session = Session::new();
        assert_eq!(session.app_name(), "calculator_agent");
        assert_eq!(session.user_id(), "calculator_user");
        assert!(session.is_empty());
        assert!(Uuid::parse_str(session.id()).is_ok());
    }

    #[test]
    fn test_sessions_have_distinct_ids() {
        assert_ne!(Session::new().id(), Session::new().id());
    }

    #[test]
    fn test_turns_are_appended_in_order() {
        let mut session = Session::new();
        session.record_turn("Hello", "Hello! I'm CalcBot.");
        let turn = session.record_turn("What is 2 plus 2?", "The result is 4.");
        assert_eq!(turn.response, "The result is 4.");

        let requests: Vec<&str> = session.turns().iter().map(|t| t.request.as_str()).collect();
        assert_eq!(requests, vec!["Hello", "What is 2 plus 2?"]);
        assert_eq!(session.len(), 2);
        assert!(session.turns()[0].timestamp <= session.turns()[1].timestamp);
        assert_eq!(
            session.last_turn().map(|t| t.request.as_str()),
            Some("What is 2 plus 2?")
        );
    }
}
