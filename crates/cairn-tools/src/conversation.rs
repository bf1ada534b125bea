//! Multi-turn conversation history.

use cairn_session::{NamespaceStore, SessionRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Result;

/// How many past turns [`ConversationManager::build_context`] includes by default.
pub const DEFAULT_CONTEXT_TURNS: usize = 10;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Assistant => "Assistant",
        }
    }
}

impl std::fmt::Display for TurnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Payload of the conversation namespace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationHistory {
    #[serde(default)]
    pub turns: Vec<ConversationTurn>,
}

impl ConversationHistory {
    pub fn push(&mut self, role: TurnRole, content: impl Into<String>) {
        self.turns.push(ConversationTurn {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Render the last `max_turns` turns as a preamble for the next prompt.
    pub fn render(&self, max_turns: usize) -> Option<String> {
        if self.turns.is_empty() || max_turns == 0 {
            return None;
        }

        let start = self.turns.len().saturating_sub(max_turns);
        let mut out = String::from("Previous conversation:\n");
        for turn in &self.turns[start..] {
            out.push_str(turn.role.label());
            out.push_str(": ");
            out.push_str(turn.content.trim());
            out.push('\n');
        }
        Some(out)
    }
}

/// Tracks conversation history per session id.
#[derive(Debug, Clone)]
pub struct ConversationManager {
    store: NamespaceStore<ConversationHistory>,
}

impl ConversationManager {
    pub fn new(store: NamespaceStore<ConversationHistory>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &NamespaceStore<ConversationHistory> {
        &self.store
    }

    /// The stored history, or an empty one for new and expired sessions.
    pub async fn get_or_create(&self, session_id: &str) -> Result<ConversationHistory> {
        Ok(self
            .store
            .load(session_id)
            .await?
            .map(|record| record.payload)
            .unwrap_or_default())
    }

    /// Record a prompt and its response.
    pub async fn append_exchange(
        &self,
        session_id: &str,
        prompt: &str,
        response: &str,
    ) -> Result<ConversationHistory> {
        let mut history = self.get_or_create(session_id).await?;
        history.push(TurnRole::User, prompt);
        history.push(TurnRole::Assistant, response);

        let record = self.store.save(session_id, history).await?;
        debug!(session_id = %session_id, turns = record.payload.turns.len(), "Conversation updated");
        Ok(record.payload)
    }

    /// Prior turns rendered for inclusion in the next prompt, if any.
    pub async fn build_context(&self, session_id: &str, max_turns: usize) -> Result<Option<String>> {
        Ok(self.get_or_create(session_id).await?.render(max_turns))
    }

    /// Forget a conversation. Returns whether one existed.
    pub async fn reset(&self, session_id: &str) -> Result<bool> {
        Ok(self.store.delete(session_id).await?)
    }

    pub async fn list(&self) -> Result<Vec<SessionRecord<ConversationHistory>>> {
        Ok(self.store.list().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_session::{CONVERSATION_NAMESPACE, NamespaceConfig, NamespaceOverrides};

    fn test_manager() -> (tempfile::TempDir, ConversationManager) {
        let dir = tempfile::tempdir().unwrap();
        let config = NamespaceConfig::resolve(CONVERSATION_NAMESPACE, &NamespaceOverrides::new());
        let manager = ConversationManager::new(NamespaceStore::new(dir.path(), config));
        (dir, manager)
    }

    #[tokio::test]
    async fn test_new_session_is_empty() {
        let (_dir, manager) = test_manager();
        let history = manager.get_or_create("fresh").await.unwrap();
        assert!(history.is_empty());
        assert_eq!(manager.build_context("fresh", 5).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_exchanges_accumulate() {
        let (_dir, manager) = test_manager();

        manager.append_exchange("s", "hi", "hello").await.unwrap();
        let history = manager
            .append_exchange("s", "how are you?", "fine")
            .await
            .unwrap();

        assert_eq!(history.turns.len(), 4);
        assert_eq!(history.turns[0].role, TurnRole::User);
        assert_eq!(history.turns[3].role, TurnRole::Assistant);
        assert_eq!(history.turns[3].content, "fine");

        let reloaded = manager.get_or_create("s").await.unwrap();
        assert_eq!(reloaded, history);
    }

    #[tokio::test]
    async fn test_context_keeps_most_recent_turns() {
        let (_dir, manager) = test_manager();
        manager.append_exchange("s", "first", "one").await.unwrap();
        manager.append_exchange("s", "second", "two").await.unwrap();

        let context = manager.build_context("s", 2).await.unwrap().unwrap();
        assert_eq!(context, "Previous conversation:\nUser: second\nAssistant: two\n");
    }

    #[tokio::test]
    async fn test_reset() {
        let (_dir, manager) = test_manager();
        manager.append_exchange("s", "q", "a").await.unwrap();

        assert!(manager.reset("s").await.unwrap());
        assert!(!manager.reset("s").await.unwrap());
        assert!(manager.get_or_create("s").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list() {
        let (_dir, manager) = test_manager();
        manager.append_exchange("a", "q", "a").await.unwrap();
        manager.append_exchange("b", "q", "a").await.unwrap();

        let records = manager.list().await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_render_zero_turns() {
        let mut history = ConversationHistory::default();
        history.push(TurnRole::User, "hello");
        assert_eq!(history.render(0), None);
        assert_eq!(
            history.render(DEFAULT_CONTEXT_TURNS).unwrap(),
            "Previous conversation:\nUser: hello\n"
        );
    }
}
