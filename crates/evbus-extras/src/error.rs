//! Error types for the extras crate.

use std::io;
use thiserror::Error;

/// Errors raised by [`EventScope`](crate::EventScope).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    /// The scope was closed and its subscriptions released.
    #[error("Event scope is already closed")]
    Closed,
}

/// Errors raised by [`EventScheduler`](crate::EventScheduler).
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// The scheduler no longer accepts work.
    #[error("Event scheduler has been shut down")]
    ShutDown,

    /// A repeating schedule was given a zero period.
    #[error("Repeat period must be greater than zero")]
    InvalidPeriod,

    /// The timer runtime could not be started.
    #[error("Failed to start scheduler runtime: {0}")]
    Runtime(#[from] io::Error),
}

/// Result type alias for scope operations.
pub type ScopeResult<T> = Result<T, ScopeError>;

/// Result type alias for scheduler operations.
pub type SchedulerResult<T> = Result<T, SchedulerError>;
