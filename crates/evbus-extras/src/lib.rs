//! Collaborators built on the evbus dispatch core.
//!
//! Everything here goes through the public API of `evbus-core`:
//! - [`subscriber`]: declarative handler registration per owner
//! - [`scope`]: subscriptions released together
//! - [`scheduler`]: delayed and repeating delivery on a timer thread
//! - [`profiler`]: handler timing
//! - [`builder`] and [`pipeline`]: ad-hoc events and processing chains
//! - [`utils`]: `once`, `when`, `throttle`, `debounce` and `fire`

pub mod builder;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod profiler;
pub mod scheduler;
pub mod scope;
pub mod shared;
pub mod subscriber;
pub mod utils;

pub use builder::{DynamicEvent, EventBuilder};
pub use config::SchedulerConfig;
pub use error::{SchedulerError, SchedulerResult, ScopeError, ScopeResult};
pub use pipeline::EventPipeline;
pub use profiler::{profiler, EventProfiler, ProfiledHandler, StatsSnapshot};
pub use scheduler::{EventScheduler, ScheduledTask};
pub use scope::EventScope;
pub use shared::SharedBus;
pub use subscriber::{register, unregister, Registrar, Subscriber};
pub use utils::{debounce, fire, once, throttle, when};
