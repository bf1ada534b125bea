//! Per-tool session tracking on top of [`cairn_session::NamespaceStore`].
//!
//! Each manager owns one store for its namespace and adds nothing but a
//! payload schema and a few convenience operations. Construct the stores
//! explicitly and hand them in; there are no global instances.
//!
//! - [`ConversationManager`]: multi-turn prompt/response history
//! - [`BrainstormManager`]: rounds of generated ideas per topic
//! - [`ReviewManager`]: review rounds and the comments they raised

pub mod brainstorm;
pub mod conversation;
pub mod error;
pub mod review;

pub use brainstorm::{BrainstormManager, BrainstormSession, Idea, IdeaRound};
pub use conversation::{ConversationHistory, ConversationManager, ConversationTurn, TurnRole};
pub use error::{Result, ToolError};
pub use review::{CommentStatus, NewComment, ReviewComment, ReviewManager, ReviewRound, ReviewSession, Severity};
