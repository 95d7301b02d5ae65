//! Role-tagged conversation messages and the append-only conversation log.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Correlation id; the matching tool result carries the same id.
    pub id: String,
    /// Name of the tool to run.
    pub name: String,
    /// Structured arguments.
    pub arguments: Value,
}

impl ToolCallRequest {
    /// Creates a tool call request.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// One conversation entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    /// Text from the user.
    User {
        /// Message text.
        content: String,
    },
    /// A model reply, possibly requesting tools.
    Assistant {
        /// Reply text, if any.
        content: Option<String>,
        /// Requested tool calls, in the order they must be run.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCallRequest>,
    },
    /// The rendered result of one tool call.
    Tool {
        /// Id of the call this result answers.
        tool_call_id: String,
        /// Result text (tool output or an error description).
        content: String,
    },
}

impl Message {
    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    /// Creates an assistant message with text only.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    /// Creates a tool result message.
    #[must_use]
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Tool {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
        }
    }

    /// The text content of the message, if it has any.
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        match self {
            Self::User { content } | Self::Tool { content, .. } => Some(content),
            Self::Assistant { content, .. } => content.as_deref(),
        }
    }

    /// Tool calls requested by an assistant message; empty for other roles.
    #[must_use]
    pub fn tool_calls(&self) -> &[ToolCallRequest] {
        match self {
            Self::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }
}

/// Violations of the conversation ordering rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversationError {
    /// A new assistant message was appended while tool results were outstanding.
    #[error("assistant message appended with {pending} tool result(s) outstanding")]
    ResultsOutstanding {
        /// Number of unanswered tool calls.
        pending: usize,
    },
    /// A tool result arrived out of order or for a call that was never made.
    #[error("unexpected tool result for `{got}` (expected {})", expected.as_deref().unwrap_or("none"))]
    UnexpectedResult {
        /// Id the result carried.
        got: String,
        /// Id of the next outstanding call, if any.
        expected: Option<String>,
    },
}

/// Ordered, append-only message log of one conversation.
///
/// Every tool call in an assistant message must be answered by exactly one
/// tool result, in call order, before the next assistant message.
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    messages: Vec<Message>,
    pending: VecDeque<String>,
}

impl ConversationState {
    /// Starts a conversation from the user's request.
    #[must_use]
    pub fn new(request: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(request)],
            pending: VecDeque::new(),
        }
    }

    /// Appends a model reply and records its tool calls as outstanding.
    ///
    /// # Errors
    ///
    /// Fails if earlier tool calls have not all been answered.
    pub fn push_assistant(
        &mut self,
        content: Option<String>,
        tool_calls: Vec<ToolCallRequest>,
    ) -> Result<(), ConversationError> {
        if !self.pending.is_empty() {
            return Err(ConversationError::ResultsOutstanding {
                pending: self.pending.len(),
            });
        }
        self.pending.extend(tool_calls.iter().map(|c| c.id.clone()));
        self.messages.push(Message::Assistant {
            content,
            tool_calls,
        });
        Ok(())
    }

    /// Appends the result of the next outstanding tool call.
    ///
    /// # Errors
    ///
    /// Fails if `tool_call_id` is not the next outstanding call.
    pub fn push_tool_result(
        &mut self,
        tool_call_id: &str,
        content: impl Into<String>,
    ) -> Result<(), ConversationError> {
        if self.pending.front().map(String::as_str) != Some(tool_call_id) {
            return Err(ConversationError::UnexpectedResult {
                got: tool_call_id.to_string(),
                expected: self.pending.front().cloned(),
            });
        }
        self.pending.pop_front();
        self.messages.push(Message::tool(tool_call_id, content));
        Ok(())
    }

    /// All messages, oldest first.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// True when every requested tool call has a result.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.pending.is_empty()
    }

    /// Number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Always false: a conversation starts with the user's request.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Consumes the state, returning the messages.
    #[must_use]
    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}
