//! Conversation turns, as kept by the conversation store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The classified shape of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    Single,
    MultiIntent,
    RoundTrip,
    /// No domain was recognised
    None,
}

impl std::fmt::Display for IntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            IntentKind::Single => "single",
            IntentKind::MultiIntent => "multi_intent",
            IntentKind::RoundTrip => "round_trip",
            IntentKind::None => "none",
        })
    }
}

/// One complete request/response cycle. Appended once, never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub id: Uuid,
    pub input: String,
    pub output: String,
    /// Qualified names of the capabilities invoked, in call order
    pub tools_used: Vec<String>,
    pub intent: IntentKind,
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn new(
        input: impl Into<String>,
        output: impl Into<String>,
        tools_used: Vec<String>,
        intent: IntentKind,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            input: input.into(),
            output: output.into(),
            tools_used,
            intent,
            timestamp: Utc::now(),
        }
    }
}
