//! Reasoning observability for agent workflows.

mod logger;

pub use logger::{ReasoningLogger, ReasoningStep, ReasoningStepType};
