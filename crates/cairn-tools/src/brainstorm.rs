//! Brainstorming rounds per topic.
//!
//! Each round records the prompt that produced it and the ideas that came
//! back. Ideas whose title was already seen in an earlier round are dropped
//! when a round is recorded, so [`BrainstormManager::previous_ideas`] can be
//! fed back as a "don't repeat these" list.

use std::collections::HashSet;

use cairn_session::{NamespaceStore, SessionRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Idea {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl Idea {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }

    fn normalized_title(&self) -> String {
        self.title.trim().to_lowercase()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdeaRound {
    /// 1-based round number.
    pub round: u32,
    pub prompt: String,
    pub ideas: Vec<Idea>,
    pub created_at: DateTime<Utc>,
}

/// Payload of the brainstorm namespace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrainstormSession {
    pub topic: String,
    #[serde(default)]
    pub rounds: Vec<IdeaRound>,
}

impl BrainstormSession {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            rounds: Vec::new(),
        }
    }

    pub fn next_round(&self) -> u32 {
        self.rounds.last().map_or(1, |r| r.round + 1)
    }

    pub fn ideas(&self) -> impl Iterator<Item = &Idea> {
        self.rounds.iter().flat_map(|r| r.ideas.iter())
    }
}

/// Tracks brainstorming sessions per session id.
#[derive(Debug, Clone)]
pub struct BrainstormManager {
    store: NamespaceStore<BrainstormSession>,
}

impl BrainstormManager {
    pub fn new(store: NamespaceStore<BrainstormSession>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &NamespaceStore<BrainstormSession> {
        &self.store
    }

    /// The stored session, or a new one on `topic`.
    pub async fn get_or_create(&self, session_id: &str, topic: &str) -> Result<BrainstormSession> {
        Ok(self
            .store
            .load(session_id)
            .await?
            .map(|record| record.payload)
            .unwrap_or_else(|| BrainstormSession::new(topic)))
    }

    /// Append a round, keeping only ideas not seen in earlier rounds.
    pub async fn record_round(
        &self,
        session_id: &str,
        topic: &str,
        prompt: &str,
        ideas: Vec<Idea>,
    ) -> Result<IdeaRound> {
        let mut session = self.get_or_create(session_id, topic).await?;

        let mut seen: HashSet<String> = session.ideas().map(Idea::normalized_title).collect();
        let offered = ideas.len();
        let fresh: Vec<Idea> = ideas
            .into_iter()
            .filter(|idea| seen.insert(idea.normalized_title()))
            .collect();

        let round = IdeaRound {
            round: session.next_round(),
            prompt: prompt.to_string(),
            ideas: fresh,
            created_at: Utc::now(),
        };
        session.rounds.push(round.clone());
        self.store.save(session_id, session).await?;

        debug!(
            session_id = %session_id,
            round = round.round,
            offered,
            kept = round.ideas.len(),
            "Brainstorm round recorded"
        );
        Ok(round)
    }

    /// Every idea recorded so far, oldest first.
    pub async fn previous_ideas(&self, session_id: &str) -> Result<Vec<Idea>> {
        Ok(match self.store.load(session_id).await? {
            Some(record) => record.payload.ideas().cloned().collect(),
            None => Vec::new(),
        })
    }

    pub async fn reset(&self, session_id: &str) -> Result<bool> {
        Ok(self.store.delete(session_id).await?)
    }

    pub async fn list(&self) -> Result<Vec<SessionRecord<BrainstormSession>>> {
        Ok(self.store.list().await?)
    }
}
