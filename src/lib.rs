//! # evbus
//!
//! In-process publish/subscribe event dispatch:
//! - Listeners registered per event type, invoked synchronously by priority
//! - Cancellation before dispatch and stopping mid-chain
//! - Bulk removal per owner, scoped subscriptions, delayed and periodic delivery
//!
//! ## Architecture
//!
//! evbus is organized as a workspace with two crates:
//!
//! 1. **evbus-core** - Event contract, listener registry, snapshot cache, dispatcher
//! 2. **evbus-extras** - Subscribers, scopes, scheduler, profiler, builder, pipeline, sugar
//!
//! This crate re-exports both and provides logging setup for binaries.

pub use evbus_core::{
    emit, event_bus, impl_event, init_event_bus, on_event, CancelFlag, Cancellable, ConfigError,
    ConfigFile, DispatchError, Error, Event, EventBus, EventBusConfig, EventKind, HandlerResult,
    Listener, ListenerHandle, ListenerId, OwnerId, Priority, Result, StopFlag, Stoppable,
};

pub use evbus_extras::{
    debounce, fire, once, profiler, register, throttle, unregister, when, DynamicEvent,
    EventBuilder, EventPipeline, EventProfiler, EventScheduler, EventScope, ProfiledHandler,
    Registrar, ScheduledTask, SchedulerConfig, SchedulerError, ScopeError, SharedBus,
    StatsSnapshot, Subscriber,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable selecting the log output format
pub const LOG_FORMAT_ENV: &str = "EVBUS_LOG_FORMAT";

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - RUST_LOG environment variable support, INFO by default
/// - Pretty console output, or JSON lines when `EVBUS_LOG_FORMAT=json`
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    let json = std::env::var(LOG_FORMAT_ENV)
        .is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    if json {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stdout)
            .with_thread_names(true)
            .json();

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stdout)
            .with_target(true)
            .with_level(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_line_number(true)
            .pretty();

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    }

    Ok(())
}
