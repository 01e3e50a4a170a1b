//! Conversation store, append-only for the life of a session.

use std::sync::Arc;

use tokio::sync::RwLock;
use wayfarer_core::ConversationTurn;

/// Turns in the order they were appended. Cloning shares the same log.
#[derive(Clone, Default)]
pub struct ConversationStore {
    turns: Arc<RwLock<Vec<ConversationTurn>>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn append(&self, turn: ConversationTurn) {
        self.turns.write().await.push(turn);
    }

    pub async fn all(&self) -> Vec<ConversationTurn> {
        self.turns.read().await.clone()
    }

    /// The last `n` turns, oldest first.
    pub async fn recent(&self, n: usize) -> Vec<ConversationTurn> {
        let turns = self.turns.read().await;
        turns[turns.len().saturating_sub(n)..].to_vec()
    }

    pub async fn len(&self) -> usize {
        self.turns.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.turns.read().await.is_empty()
    }
}
