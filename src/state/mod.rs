//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `EngineState`: Lifecycle of the traversal engine (running, draining, closed)
//! - `FinishReason`: Why the engine stopped dispatching

mod engine_state;

pub use engine_state::{EngineState, FinishReason};
