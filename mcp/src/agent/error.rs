//! Error types for agent runs.

use thiserror::Error;

use super::message::ConversationError;
use super::model::ModelError;

/// Errors that end an agent run.
///
/// Tool failures are not among them: those are reported to the model as tool
/// results and the conversation continues.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The model could not be invoked.
    #[error("model invocation failed on turn {turn}: {source}")]
    Model {
        /// Turn (1-indexed) on which the failure happened.
        turn: usize,
        /// Underlying error.
        #[source]
        source: ModelError,
    },

    /// The conversation log rejected a message.
    #[error("conversation ordering violated: {0}")]
    Conversation(#[from] ConversationError),
}
