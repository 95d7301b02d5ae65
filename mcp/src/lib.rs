//! Tool serving and model-driven tool orchestration for product scraping.
//!
//! - [`registry`] - Ordered tool catalog with schema-checked dispatch
//! - [`tools`] - The `fetch_page` and `extract_info` tools
//! - [`server`] - MCP server over a registry
//! - [`agent`] - Bounded model/tool conversation loop

pub mod agent;
pub mod registry;
pub mod server;
pub mod tools;

/// Common traits and types for ergonomic usage of the scraping tools.
pub mod prelude {
    pub use crate::agent::{
        AgentConfig, AgentError, AgentSession, LoopMetrics, LoopOutcome, LoopStatus, Message,
        ModelClient, ModelError, ModelReply, RigModel, ToolCallRequest,
    };
    pub use crate::registry::{DispatchError, RegistryError, ToolDescriptor, ToolRegistry};
    pub use crate::server::ScrapeMcpHandler;
    pub use crate::tools::{FetchConfig, PageCache, ToolError, product_tools};
}
