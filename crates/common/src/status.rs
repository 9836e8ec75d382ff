//! Transaction status state machine.

use serde::{Deserialize, Serialize};

/// The status of a transfer transaction in its lifecycle.
///
/// Status transitions:
/// ```text
/// Pending ──┬──► Processing ──┬──► Completed
///           │                 └──► Failed
///           └──► Failed
/// ```
///
/// Transitions are monotonic; `Completed` and `Failed` are terminal.
/// The transaction store does not enforce these rules — the
/// orchestrator does, via [`TransactionStatus::can_transition_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Record created, saga not yet past the compliance check.
    #[default]
    Pending,

    /// Compliance approved; funds movement in progress.
    Processing,

    /// Funds moved successfully (terminal state).
    Completed,

    /// Any failure path (terminal state).
    Failed,
}

impl TransactionStatus {
    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Completed | TransactionStatus::Failed
        )
    }

    /// Returns true if the transition to `next` is allowed.
    pub fn can_transition_to(&self, next: TransactionStatus) -> bool {
        use TransactionStatus::*;
        matches!(
            (self, next),
            (Pending, Processing) | (Pending, Failed) | (Processing, Completed) | (Processing, Failed)
        )
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Processing => "processing",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
