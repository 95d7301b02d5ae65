//! Ordered tool catalog with schema-checked dispatch.
//!
//! Tools are ordinary Rig [`Tool`] implementations. Registration order is
//! preserved and is the order in which the catalog is advertised, so the
//! model always sees the same tool list for the same registry.

use std::fmt;
use std::sync::Arc;

use jsonschema::Validator;
use rig::completion::ToolDefinition;
use rig::tool::Tool;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// The advertised name, description and input schema of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description shown to the model.
    pub description: String,
    /// JSON schema the call arguments must satisfy.
    pub input_schema: Value,
}

impl From<ToolDefinition> for ToolDescriptor {
    fn from(definition: ToolDefinition) -> Self {
        Self {
            name: definition.name,
            description: definition.description,
            input_schema: definition.parameters,
        }
    }
}

impl From<ToolDescriptor> for ToolDefinition {
    fn from(descriptor: ToolDescriptor) -> Self {
        Self {
            name: descriptor.name,
            description: descriptor.description,
            parameters: descriptor.input_schema,
        }
    }
}

/// Errors raised while building a registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A tool with the same name is already registered.
    #[error("tool `{0}` is already registered")]
    DuplicateTool(String),

    /// The tool's input schema is not a valid JSON schema.
    #[error("input schema of tool `{name}` does not compile: {message}")]
    InvalidSchema {
        /// Tool name.
        name: String,
        /// Compiler message.
        message: String,
    },

    /// The tool itself could not be constructed.
    #[error("tool `{name}` could not be constructed: {message}")]
    Construction {
        /// Tool name.
        name: String,
        /// Underlying error.
        message: String,
    },
}

/// Errors returned by [`ToolRegistry::dispatch`].
///
/// None of these are fatal to a conversation: the agent loop reports them back
/// to the model as the tool's result.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DispatchError {
    /// No tool with this name is registered.
    #[error("unknown tool `{name}` (available: {})", available.join(", "))]
    UnknownTool {
        /// Requested name.
        name: String,
        /// Names that are registered, in catalog order.
        available: Vec<String>,
    },

    /// The arguments do not satisfy the tool's input schema.
    #[error("invalid arguments for tool `{name}`: {}", errors.join("; "))]
    InvalidArguments {
        /// Tool name.
        name: String,
        /// One message per schema violation.
        errors: Vec<String>,
    },

    /// The tool ran and its underlying action failed.
    #[error("tool `{name}` failed: {message}")]
    Execution {
        /// Tool name.
        name: String,
        /// Error reported by the tool.
        message: String,
    },
}

enum CallFailure {
    Arguments(String),
    Execution(String),
}

/// Object-safe view of a Rig [`Tool`] taking and returning JSON values.
#[async_trait::async_trait]
trait JsonTool: Send + Sync {
    async fn call_json(&self, arguments: Value) -> Result<Value, CallFailure>;
}

#[async_trait::async_trait]
impl<T> JsonTool for T
where
    T: Tool + 'static,
{
    async fn call_json(&self, arguments: Value) -> Result<Value, CallFailure> {
        let args: T::Args = serde_json::from_value(arguments)
            .map_err(|e| CallFailure::Arguments(e.to_string()))?;
        let output = self
            .call(args)
            .await
            .map_err(|e| CallFailure::Execution(e.to_string()))?;
        serde_json::to_value(output).map_err(|e| CallFailure::Execution(e.to_string()))
    }
}

#[derive(Clone)]
struct Entry {
    descriptor: ToolDescriptor,
    validator: Arc<Validator>,
    tool: Arc<dyn JsonTool>,
}

/// Ordered catalog of callable tools.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    entries: Vec<Entry>,
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

impl ToolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool at the end of the catalog.
    ///
    /// The tool's definition is fetched once; its parameters schema is
    /// compiled here so that bad schemas fail at startup, not mid-conversation.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateTool`] if the name is taken and
    /// [`RegistryError::InvalidSchema`] if the schema does not compile.
    pub async fn register<T>(&mut self, tool: T) -> Result<&mut Self, RegistryError>
    where
        T: Tool + 'static,
    {
        let descriptor = ToolDescriptor::from(tool.definition(String::new()).await);

        if self.get(&descriptor.name).is_some() {
            return Err(RegistryError::DuplicateTool(descriptor.name));
        }

        let validator =
            Validator::new(&descriptor.input_schema).map_err(|e| RegistryError::InvalidSchema {
                name: descriptor.name.clone(),
                message: e.to_string(),
            })?;

        tracing::debug!(event = "tool_registered", tool = %descriptor.name, "tool_registered");

        self.entries.push(Entry {
            descriptor,
            validator: Arc::new(validator),
            tool: Arc::new(tool),
        });
        Ok(self)
    }

    /// Builder-style variant of [`register`](Self::register).
    ///
    /// # Errors
    ///
    /// See [`register`](Self::register).
    pub async fn with_tool<T>(mut self, tool: T) -> Result<Self, RegistryError>
    where
        T: Tool + 'static,
    {
        self.register(tool).await?;
        Ok(self)
    }

    /// Returns the catalog in registration order.
    #[must_use]
    pub fn list(&self) -> Vec<ToolDescriptor> {
        self.entries.iter().map(|e| e.descriptor.clone()).collect()
    }

    /// Returns the descriptor registered under `name`.
    #[must_use]
    pub fn descriptor(&self, name: &str) -> Option<&ToolDescriptor> {
        self.get(name).map(|e| &e.descriptor)
    }

    /// Tool names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| e.descriptor.name.clone())
            .collect()
    }

    /// Number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no tool is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validates `arguments` against the tool's schema and runs it.
    ///
    /// Validation checks shape and types only; whatever the tool decides about
    /// the values themselves surfaces as [`DispatchError::Execution`].
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnknownTool`], [`DispatchError::InvalidArguments`]
    /// or [`DispatchError::Execution`].
    #[tracing::instrument(skip(self, arguments), fields(tool.name = %name))]
    pub async fn dispatch(&self, name: &str, arguments: Value) -> Result<Value, DispatchError> {
        let Some(entry) = self.get(name) else {
            return Err(DispatchError::UnknownTool {
                name: name.to_string(),
                available: self.names(),
            });
        };

        let errors: Vec<String> = entry
            .validator
            .iter_errors(&arguments)
            .map(|error| format!("At path '{}': {}", error.instance_path, error))
            .collect();
        if !errors.is_empty() {
            return Err(DispatchError::InvalidArguments {
                name: name.to_string(),
                errors,
            });
        }

        entry.tool.call_json(arguments).await.map_err(|failure| match failure {
            CallFailure::Arguments(message) => DispatchError::InvalidArguments {
                name: name.to_string(),
                errors: vec![message],
            },
            CallFailure::Execution(message) => DispatchError::Execution {
                name: name.to_string(),
                message,
            },
        })
    }

    fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.descriptor.name == name)
    }
}

/// Renders a tool's output as message text.
///
/// String outputs are passed through verbatim; anything else becomes compact JSON.
#[must_use]
pub fn render_output(output: &Value) -> String {
    match output {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemars::JsonSchema;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Error, Serialize, Deserialize)]
    #[error("{0}")]
    struct TestError(String);

    #[derive(Deserialize, Serialize, JsonSchema)]
    struct EchoArgs {
        text: String,
        #[serde(default)]
        shout: bool,
    }

    struct EchoTool {
        calls: Arc<AtomicUsize>,
    }

    impl Tool for EchoTool {
        const NAME: &'static str = "echo";
        type Error = TestError;
        type Args = EchoArgs;
        type Output = String;

        async fn definition(&self, _prompt: String) -> ToolDefinition {
            ToolDefinition {
                name: Self::NAME.to_string(),
                description: "Echo the text back.".to_string(),
                parameters: serde_json::to_value(schemars::schema_for!(EchoArgs))
                    .unwrap_or_else(|_| json!({})),
            }
        }

        async fn call(&self, args: EchoArgs) -> Result<String, TestError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if args.text == "boom" {
                return Err(TestError("exploded".to_string()));
            }
            Ok(if args.shout {
                args.text.to_uppercase()
            } else {
                args.text
            })
        }
    }

    #[derive(Deserialize, Serialize, JsonSchema)]
    struct SumArgs {
        values: Vec<i64>,
    }

    #[derive(Serialize)]
    struct SumOutput {
        total: i64,
    }

    struct SumTool;

    impl Tool for SumTool {
        const NAME: &'static str = "sum";
        type Error = TestError;
        type Args = SumArgs;
        type Output = SumOutput;

        async fn definition(&self, _prompt: String) -> ToolDefinition {
            ToolDefinition {
                name: Self::NAME.to_string(),
                description: "Add numbers.".to_string(),
                parameters: serde_json::to_value(schemars::schema_for!(SumArgs))
                    .unwrap_or_else(|_| json!({})),
            }
        }

        async fn call(&self, args: SumArgs) -> Result<SumOutput, TestError> {
            Ok(SumOutput {
                total: args.values.iter().sum(),
            })
        }
    }

    struct BadSchemaTool;

    impl Tool for BadSchemaTool {
        const NAME: &'static str = "bad";
        type Error = TestError;
        type Args = SumArgs;
        type Output = String;

        async fn definition(&self, _prompt: String) -> ToolDefinition {
            ToolDefinition {
                name: Self::NAME.to_string(),
                description: "Broken schema.".to_string(),
                parameters: json!({"type": "no-such-type"}),
            }
        }

        async fn call(&self, _args: SumArgs) -> Result<String, TestError> {
            Ok(String::new())
        }
    }

    async fn registry() -> (ToolRegistry, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = ToolRegistry::new()
            .with_tool(EchoTool {
                calls: calls.clone(),
            })
            .await
            .unwrap()
            .with_tool(SumTool)
            .await
            .unwrap();
        (registry, calls)
    }

    #[tokio::test]
    async fn test_list_preserves_registration_order() {
        let (registry, _) = registry().await;
        let names: Vec<String> = registry.list().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["echo", "sum"]);
        assert_eq!(registry.list(), registry.list());
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_name_is_rejected() {
        let (mut registry, _) = registry().await;
        let err = registry.register(SumTool).await.unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateTool(name) if name == "sum"));
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_uncompilable_schema_is_rejected() {
        let err = ToolRegistry::new().with_tool(BadSchemaTool).await.unwrap_err();
        assert!(matches!(err, RegistryError::InvalidSchema { .. }));
    }

    #[tokio::test]
    async fn test_dispatch_success() {
        let (registry, calls) = registry().await;

        let out = registry
            .dispatch("echo", json!({"text": "hi", "shout": true}))
            .await
            .unwrap();
        assert_eq!(out, json!("HI"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let out = registry
            .dispatch("sum", json!({"values": [1, 2, 3]}))
            .await
            .unwrap();
        assert_eq!(out, json!({"total": 6}));
    }

    #[tokio::test]
    async fn test_dispatch_unknown_tool() {
        let (registry, _) = registry().await;
        let err = registry.dispatch("nope", json!({})).await.unwrap_err();
        assert_eq!(
            err,
            DispatchError::UnknownTool {
                name: "nope".to_string(),
                available: vec!["echo".to_string(), "sum".to_string()],
            }
        );
        assert!(err.to_string().contains("echo, sum"));
    }

    #[tokio::test]
    async fn test_dispatch_rejects_arguments_before_running() {
        let (registry, calls) = registry().await;

        let err = registry
            .dispatch("echo", json!({"text": 42}))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::InvalidArguments { ref errors, .. } if !errors.is_empty()));

        let err = registry.dispatch("echo", json!({})).await.unwrap_err();
        assert!(err.to_string().contains("text"));

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dispatch_execution_failure() {
        let (registry, _) = registry().await;
        let err = registry
            .dispatch("echo", json!({"text": "boom"}))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            DispatchError::Execution {
                name: "echo".to_string(),
                message: "exploded".to_string(),
            }
        );
    }

    #[test]
    fn test_render_output() {
        assert_eq!(render_output(&json!("plain text")), "plain text");
        assert_eq!(render_output(&json!({"a": 1})), r#"{"a":1}"#);
        assert_eq!(render_output(&Value::Null), "null");
    }

    #[test]
    fn test_descriptor_round_trips_through_tool_definition() {
        let descriptor = ToolDescriptor {
            name: "fetch_page".to_string(),
            description: "Fetch a page.".to_string(),
            input_schema: json!({"type": "object"}),
        };
        let definition = ToolDefinition::from(descriptor.clone());
        assert_eq!(ToolDescriptor::from(definition), descriptor);
    }
}
