//! The model seam of the agent loop and its Rig-backed implementation.

use async_trait::async_trait;
use rig::OneOrMany;
use rig::completion::message::{AssistantContent, Message as RigMessage};
use rig::completion::{CompletionError, CompletionModel, ToolDefinition};
use thiserror::Error;

use super::message::{Message, ToolCallRequest};
use crate::registry::ToolDescriptor;

/// One model reply: text, tool calls, or both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelReply {
    /// Reply text, if any.
    pub content: Option<String>,
    /// Requested tool calls, in order.
    pub tool_calls: Vec<ToolCallRequest>,
}

impl ModelReply {
    /// A final text answer.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    /// A reply requesting tool calls.
    #[must_use]
    pub const fn with_tool_calls(tool_calls: Vec<ToolCallRequest>) -> Self {
        Self {
            content: None,
            tool_calls,
        }
    }
}

/// Errors from a [`ModelClient`].
#[derive(Debug, Error)]
pub enum ModelError {
    /// The completion request failed.
    #[error("completion request failed: {0}")]
    Completion(#[from] CompletionError),
    /// The request could not be built from the conversation.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// Any other provider failure.
    #[error("{0}")]
    Provider(String),
}

/// A chat-completion model that can request tool calls.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Produces the next reply for `messages`, given the available `tools`.
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDescriptor],
    ) -> Result<ModelReply, ModelError>;
}

/// [`ModelClient`] over any Rig [`CompletionModel`].
#[derive(Debug, Clone)]
pub struct RigModel<M> {
    model: M,
    preamble: Option<String>,
}

impl<M: CompletionModel> RigModel<M> {
    /// Wraps a Rig completion model.
    #[must_use]
    pub const fn new(model: M) -> Self {
        Self {
            model,
            preamble: None,
        }
    }

    /// Sets a system preamble sent with every request.
    #[must_use]
    pub fn with_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = Some(preamble.into());
        self
    }
}

#[async_trait]
impl<M> ModelClient for RigModel<M>
where
    M: CompletionModel + Send + Sync,
{
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDescriptor],
    ) -> Result<ModelReply, ModelError> {
        let mut history: Vec<RigMessage> = messages.iter().map(to_rig_message).collect();
        let prompt = history
            .pop()
            .ok_or_else(|| ModelError::InvalidRequest("conversation is empty".to_string()))?;
        let definitions: Vec<ToolDefinition> =
            tools.iter().cloned().map(ToolDefinition::from).collect();

        let mut request = self
            .model
            .completion_request(prompt)
            .messages(history)
            .tools(definitions);
        if let Some(preamble) = &self.preamble {
            request = request.preamble(preamble.clone());
        }

        let response = request.send().await?;
        Ok(from_rig_choice(response.choice))
    }
}

fn to_rig_message(message: &Message) -> RigMessage {
    match message {
        Message::User { content } => RigMessage::user(content.clone()),
        Message::Tool {
            tool_call_id,
            content,
        } => RigMessage::tool_result(tool_call_id.clone(), content.clone()),
        Message::Assistant {
            content,
            tool_calls,
        } => {
            let mut items: Vec<AssistantContent> = content
                .iter()
                .filter(|text| !text.is_empty())
                .map(|text| AssistantContent::text(text.clone()))
                .collect();
            items.extend(tool_calls.iter().map(|call| {
                AssistantContent::tool_call(
                    call.id.clone(),
                    call.name.clone(),
                    call.arguments.clone(),
                )
            }));
            let content = OneOrMany::many(items)
                .unwrap_or_else(|_| OneOrMany::one(AssistantContent::text(String::new())));
            RigMessage::Assistant { id: None, content }
        }
    }
}

fn from_rig_choice(choice: OneOrMany<AssistantContent>) -> ModelReply {
    let mut texts = Vec::new();
    let mut tool_calls = Vec::new();
    for item in choice {
        match item {
            AssistantContent::Text(text) => texts.push(text.text),
            AssistantContent::ToolCall(call) => tool_calls.push(ToolCallRequest {
                id: call.id,
                name: call.function.name,
                arguments: call.function.arguments,
            }),
            _ => {}
        }
    }
    let content = texts.join("\n");
    ModelReply {
        content: (!content.is_empty()).then_some(content),
        tool_calls,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_assistant_tool_calls_convert_to_rig_content() {
        let message = Message::Assistant {
            content: None,
            tool_calls: vec![ToolCallRequest::new(
                "call_1",
                "fetch_page",
                json!({"url": "https://example.com"}),
            )],
        };
        let RigMessage::Assistant { content, .. } = to_rig_message(&message) else {
            panic!("expected an assistant message");
        };
        let items: Vec<AssistantContent> = content.into_iter().collect();
        assert_eq!(items.len(), 1);
        let AssistantContent::ToolCall(call) = &items[0] else {
            panic!("expected a tool call");
        };
        assert_eq!(call.id, "call_1");
        assert_eq!(call.function.name, "fetch_page");
    }

    #[test]
    fn test_rig_choice_converts_to_reply() {
        let choice = OneOrMany::many(vec![
            AssistantContent::text("Let me look."),
            AssistantContent::tool_call("call_9", "extract_info", json!({})),
        ])
        .unwrap();
        let reply = from_rig_choice(choice);

        assert_eq!(reply.content.as_deref(), Some("Let me look."));
        assert_eq!(
            reply.tool_calls,
            vec![ToolCallRequest::new("call_9", "extract_info", json!({}))]
        );
    }

    #[test]
    fn test_text_only_choice() {
        let reply = from_rig_choice(OneOrMany::one(AssistantContent::text("Done.")));
        assert_eq!(reply, ModelReply::text("Done."));
    }
}
