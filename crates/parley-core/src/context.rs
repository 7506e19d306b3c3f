//! Context window selection
//!
//! Greedy suffix selection: walk the session newest-first, summing the
//! estimated cost of each non-blank turn, and stop at the first turn that
//! would push the total past the budget. Nothing older than that turn is
//! considered, and no turn is shortened to fit.

use crate::memory::Turn;
use parley_llm::estimate_tokens;

/// Token-budgeted context builder
#[derive(Debug, Clone, Copy)]
pub struct ContextWindowBuilder {
    budget_tokens: usize,
}

impl ContextWindowBuilder {
    /// Create a builder with a token budget
    #[must_use]
    pub fn new(budget_tokens: usize) -> Self {
        Self { budget_tokens }
    }

    /// Token budget
    #[must_use]
    pub fn budget(&self) -> usize {
        self.budget_tokens
    }

    /// Select the most recent turns that fit the budget, oldest first
    ///
    /// `turns` must not include the in-flight user turn.
    #[must_use]
    pub fn build(&self, turns: &[Turn]) -> Vec<Turn> {
        let mut used = 0usize;
        let mut selected = Vec::new();

        for turn in turns.iter().rev() {
            if turn.is_blank() {
                continue;
            }
            let cost = estimate_tokens(&turn.content);
            if used + cost > self.budget_tokens {
                break;
            }
            used += cost;
            selected.push(turn.clone());
        }

        selected.reverse();
        selected
    }
}
