//! Model-driven tool orchestration.
//!
//! - [`AgentSession`] - Bounded loop alternating model turns and tool dispatch
//! - [`ModelClient`] - The model seam, with [`RigModel`] for Rig completion models
//! - [`ConversationState`] - Append-only, call-ordered message log
//! - [`AgentConfig`] - Turn limit and give-up behavior
//! - [`LoopMetrics`] - Turn, tool call and token counters

pub mod config;
pub mod error;
pub mod message;
pub mod metrics;
pub mod model;
pub mod orchestrator;

pub use config::AgentConfig;
pub use error::AgentError;
pub use message::{ConversationError, ConversationState, Message, ToolCallRequest};
pub use metrics::{LoopMetrics, estimate_tokens};
pub use model::{ModelClient, ModelError, ModelReply, RigModel};
pub use orchestrator::{AgentSession, LoopOutcome, LoopStatus};
