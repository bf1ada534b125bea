//! Code review rounds and the comments raised in them.

use cairn_session::{NamespaceStore, SessionRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentStatus {
    #[default]
    Open,
    Resolved,
}

/// A comment as produced by a reviewer, before it is assigned an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub file: String,
    pub line: Option<u32>,
    pub severity: Severity,
    pub message: String,
}

impl NewComment {
    pub fn new(file: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line: None,
            severity,
            message: message.into(),
        }
    }

    pub fn at_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewComment {
    /// `r{round}-c{n}`, unique within a session.
    pub id: String,
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    pub severity: Severity,
    pub message: String,
    #[serde(default)]
    pub status: CommentStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRound {
    pub round: u32,
    /// Commit or branch that was reviewed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
    pub comments: Vec<ReviewComment>,
    pub created_at: DateTime<Utc>,
}

/// Payload of the review namespace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewSession {
    #[serde(default)]
    pub rounds: Vec<ReviewRound>,
}

impl ReviewSession {
    pub fn next_round(&self) -> u32 {
        self.rounds.last().map_or(1, |r| r.round + 1)
    }

    pub fn comments(&self) -> impl Iterator<Item = &ReviewComment> {
        self.rounds.iter().flat_map(|r| r.comments.iter())
    }

    pub fn open_comments(&self) -> impl Iterator<Item = &ReviewComment> {
        self.comments().filter(|c| c.status == CommentStatus::Open)
    }

    fn comment_mut(&mut self, comment_id: &str) -> Option<&mut ReviewComment> {
        self.rounds
            .iter_mut()
            .flat_map(|r| r.comments.iter_mut())
            .find(|c| c.id == comment_id)
    }
}

/// Tracks review sessions per session id.
#[derive(Debug, Clone)]
pub struct ReviewManager {
    store: NamespaceStore<ReviewSession>,
}

impl ReviewManager {
    pub fn new(store: NamespaceStore<ReviewSession>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &NamespaceStore<ReviewSession> {
        &self.store
    }

    pub async fn get_or_create(&self, session_id: &str) -> Result<ReviewSession> {
        Ok(self
            .store
            .load(session_id)
            .await?
            .map(|record| record.payload)
            .unwrap_or_default())
    }

    /// Append a round of comments. Every new comment starts open.
    pub async fn record_round(
        &self,
        session_id: &str,
        git_ref: Option<&str>,
        comments: Vec<NewComment>,
    ) -> Result<ReviewRound> {
        let mut session = self.get_or_create(session_id).await?;
        let round_number = session.next_round();

        let comments = comments
            .into_iter()
            .enumerate()
            .map(|(i, c)| ReviewComment {
                id: format!("r{}-c{}", round_number, i + 1),
                file: c.file,
                line: c.line,
                severity: c.severity,
                message: c.message,
                status: CommentStatus::Open,
            })
            .collect();

        let round = ReviewRound {
            round: round_number,
            git_ref: git_ref.map(str::to_string),
            comments,
            created_at: Utc::now(),
        };
        session.rounds.push(round.clone());
        self.store.save(session_id, session).await?;

        debug!(
            session_id = %session_id,
            round = round.round,
            comments = round.comments.len(),
            "Review round recorded"
        );
        Ok(round)
    }

    /// Open comments across all rounds, oldest first.
    pub async fn open_comments(&self, session_id: &str) -> Result<Vec<ReviewComment>> {
        Ok(match self.store.load(session_id).await? {
            Some(record) => record.payload.open_comments().cloned().collect(),
            None => Vec::new(),
        })
    }

    /// Mark a comment resolved. Returns false when the session or comment
    /// doesn't exist, or the comment was already resolved.
    pub async fn resolve_comment(&self, session_id: &str, comment_id: &str) -> Result<bool> {
        let Some(record) = self.store.load(session_id).await? else {
            return Ok(false);
        };
        let mut session = record.payload;

        match session.comment_mut(comment_id) {
            Some(comment) if comment.status == CommentStatus::Open => {
                comment.status = CommentStatus::Resolved;
            }
            _ => return Ok(false),
        }

        self.store.save(session_id, session).await?;
        info!(session_id = %session_id, comment_id = %comment_id, "Review comment resolved");
        Ok(true)
    }

    pub async fn reset(&self, session_id: &str) -> Result<bool> {
        Ok(self.store.delete(session_id).await?)
    }

    pub async fn list(&self) -> Result<Vec<SessionRecord<ReviewSession>>> {
        Ok(self.store.list().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_session::{NamespaceConfig, NamespaceOverrides, REVIEW_NAMESPACE};

    fn test_manager() -> (tempfile::TempDir, ReviewManager) {
        let dir = tempfile::tempdir().unwrap();
        let config = NamespaceConfig::resolve(REVIEW_NAMESPACE, &NamespaceOverrides::new());
        let manager = ReviewManager::new(NamespaceStore::new(dir.path(), config));
        (dir, manager)
    }

    fn sample_comments() -> Vec<NewComment> {
        vec![
            NewComment::new("src/lib.rs", Severity::Warning, "unused import").at_line(3),
            NewComment::new("README.md", Severity::Info, "typo"),
        ]
    }

    #[tokio::test]
    async fn test_comment_ids_follow_rounds() {
        let (_dir, manager) = test_manager();

        let first = manager
            .record_round("pr-1", Some("abc123"), sample_comments())
            .await
            .unwrap();
        let second = manager
            .record_round("pr-1", None, vec![NewComment::new("a.rs", Severity::Error, "panic")])
            .await
            .unwrap();

        let ids: Vec<&str> = first.comments.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["r1-c1", "r1-c2"]);
        assert_eq!(first.git_ref.as_deref(), Some("abc123"));
        assert_eq!(first.comments[0].line, Some(3));
        assert_eq!(second.comments[0].id, "r2-c1");
    }

    #[tokio::test]
    async fn test_resolve_comment() {
        let (_dir, manager) = test_manager();
        manager
            .record_round("pr-1", None, sample_comments())
            .await
            .unwrap();

        assert!(manager.resolve_comment("pr-1", "r1-c1").await.unwrap());
        // Second resolve is a no-op
        assert!(!manager.resolve_comment("pr-1", "r1-c1").await.unwrap());
        assert!(!manager.resolve_comment("pr-1", "r9-c9").await.unwrap());
        assert!(!manager.resolve_comment("missing", "r1-c1").await.unwrap());

        let open = manager.open_comments("pr-1").await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, "r1-c2");
    }

    #[tokio::test]
    async fn test_open_comments_for_unknown_session() {
        let (_dir, manager) = test_manager();
        assert!(manager.open_comments("nope").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reset_and_list() {
        let (_dir, manager) = test_manager();
        manager.record_round("a", None, vec![]).await.unwrap();
        manager.record_round("b", None, sample_comments()).await.unwrap();
        assert_eq!(manager.list().await.unwrap().len(), 2);

        assert!(manager.reset("a").await.unwrap());
        assert_eq!(manager.list().await.unwrap().len(), 1);
        assert!(manager.get_or_create("a").await.unwrap().rounds.is_empty());
    }

    #[test]
    fn test_severity_serialization() {
        assert_eq!(serde_json::to_string(&Severity::Warning).unwrap(), "\"warning\"");
        assert_eq!(
            serde_json::to_string(&CommentStatus::Resolved).unwrap(),
            "\"resolved\""
        );
    }
}
