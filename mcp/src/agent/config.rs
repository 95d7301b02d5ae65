//! Configuration for the agent loop.

/// Configuration for the agent loop.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Maximum number of model invocations per run (default: 10).
    ///
    /// With 0 a run never calls the model and ends at once with
    /// [`LoopStatus::TurnLimitReached`](super::LoopStatus::TurnLimitReached)
    /// and the give-up message.
    pub max_turns: usize,
    /// Content returned when the turn limit is reached without a final answer.
    pub give_up_message: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_turns: 10,
            give_up_message:
                "I was unable to finish this request within the allowed number of steps."
                    .to_string(),
        }
    }
}

impl AgentConfig {
    /// Set the maximum number of model invocations.
    #[must_use]
    pub const fn with_max_turns(mut self, max: usize) -> Self {
        self.max_turns = max;
        self
    }

    /// Set the content returned on giving up.
    #[must_use]
    pub fn with_give_up_message(mut self, message: impl Into<String>) -> Self {
        self.give_up_message = message.into();
        self
    }
}
