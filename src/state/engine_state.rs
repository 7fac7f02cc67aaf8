/// Lifecycle states of the traversal engine
///
/// The engine moves strictly forward: `Running -> Draining -> Closed`.
use crate::ScraperError;
use std::fmt;

/// Represents the lifecycle phase of a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineState {
    /// Dispatching new pages
    Running,

    /// No new dispatches; in-flight pages are finishing
    Draining,

    /// Terminal; the reporter has run or is about to
    Closed,
}

impl EngineState {
    /// Returns true if new pages may be dispatched
    pub fn accepts_work(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Validates a move to `next`
    ///
    /// Staying in the same state is allowed and is a no-op. Skipping
    /// `Draining` (`Running -> Closed`) is also allowed so that a crawl
    /// with nothing in flight can close directly. Any backward move fails.
    pub fn transition(self, next: EngineState) -> Result<EngineState, ScraperError> {
        use EngineState::*;
        match (self, next) {
            (a, b) if a == b => Ok(b),
            (Running, Draining) | (Running, Closed) | (Draining, Closed) => Ok(next),
            (from, to) => Err(ScraperError::InvalidTransition { from, to }),
        }
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Closed => "closed",
        };
        write!(f, "{}", s)
    }
}

/// Why the engine left `Running`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FinishReason {
    /// The frontier emptied with nothing in flight
    Finished,

    /// `pages_visited` reached the page budget
    PageBudgetReached,

    /// An external stop signal arrived
    Shutdown,
}

impl FinishReason {
    /// Value written to the `finish_reason` stat
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Finished => "finished",
            Self::PageBudgetReached => "page_budget_reached",
            Self::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
