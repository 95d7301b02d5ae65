//! Error types for the provider binary.

use thiserror::Error;

/// Errors that can occur while running a provider command.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The page could not be parsed as markup.
    #[error("Document error: {0}")]
    Document(#[from] rig_scrape_extract::DocumentError),

    /// The tool registry could not be built.
    #[error("Tool registry error: {0}")]
    Registry(#[from] rig_scrape_mcp::registry::RegistryError),

    /// The agent run failed.
    #[error("Agent error: {0}")]
    Agent(#[from] rig_scrape_mcp::agent::AgentError),

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The MCP server stopped with an error.
    #[error("MCP server error: {0}")]
    Serve(String),

    /// Output could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
