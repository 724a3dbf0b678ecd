use {
    async_trait::async_trait,
    serde::{Deserialize, Serialize},
};

use crate::error::Result;

/// Backend-assigned conversation-thread reference. Created once per session
/// and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadId(pub String);

impl std::fmt::Display for ThreadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of one generate-a-reply request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub String);

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A freshly created run. `created_at` is the backend clock, which is also
/// the clock on message timestamps, so the two compare without skew.
#[derive(Debug, Clone)]
pub struct Run {
    pub id: RunId,
    pub created_at: i64,
}

/// Run lifecycle states reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
}

impl RunStatus {
    /// Whether the run can still make progress. Terminal states other than
    /// [`RunStatus::Completed`] abort the interaction.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Cancelled | Self::Failed | Self::Completed | Self::Incomplete | Self::Expired
        )
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::RequiresAction => "requires_action",
            Self::Cancelling => "cancelling",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
            Self::Completed => "completed",
            Self::Incomplete => "incomplete",
            Self::Expired => "expired",
        };
        f.write_str(name)
    }
}

/// Author of a thread message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    #[serde(other)]
    Other,
}

/// One stored message within a thread, flattened to its text content.
#[derive(Debug, Clone)]
pub struct ThreadMessage {
    pub role: Role,
    /// Backend-clock creation timestamp (unix seconds).
    pub created_at: i64,
    pub content: String,
}

/// Operations the relay needs from the assistant backend. Wire and HTTP
/// mechanics stay behind this trait.
#[async_trait]
pub trait AssistantBackend: Send + Sync {
    /// Create a new conversation thread.
    async fn create_thread(&self) -> Result<ThreadId>;

    /// Append a user message to a thread.
    async fn create_message(&self, thread: &ThreadId, content: &str) -> Result<()>;

    /// Start a run that generates the assistant's reply to the thread.
    async fn create_run(&self, thread: &ThreadId, assistant_id: &str) -> Result<Run>;

    /// Fetch the current status of a run.
    async fn run_status(&self, thread: &ThreadId, run: &RunId) -> Result<RunStatus>;

    /// List every stored message in a thread.
    async fn list_messages(&self, thread: &ThreadId) -> Result<Vec<ThreadMessage>>;
}
