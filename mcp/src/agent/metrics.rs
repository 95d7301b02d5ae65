//! Counters and token estimation for agent runs.

use std::time::Duration;

/// Metrics collected during one agent run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopMetrics {
    /// Model invocations made.
    pub turns: usize,
    /// Tool calls dispatched, successful or not.
    pub tool_calls: usize,
    /// Tool calls whose result was an error.
    pub failed_tool_calls: usize,
    /// Estimated input tokens, summed over every model invocation.
    pub estimated_input_tokens: usize,
    /// Wall-clock time of the run.
    pub wall_time: Duration,
}

/// Estimate token count from text using the 4-chars-per-token heuristic.
///
/// Counts chars rather than bytes and rounds up.
///
/// ```
/// use rig_scrape_mcp::agent::estimate_tokens;
///
/// assert_eq!(estimate_tokens("hello"), 2);
/// assert_eq!(estimate_tokens("hello world"), 3);
/// ```
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
        assert_eq!(estimate_tokens("prix: 19,99 €"), 4);
    }
}
