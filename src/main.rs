use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use evbus::{
    impl_event, init_logging, profiler, register, ConfigFile, EventBus, EventBusConfig,
    EventScheduler, HandlerResult, Priority, Registrar, SchedulerConfig, StopFlag, Stoppable,
    Subscriber,
};

/// Heartbeat posted by the scheduler
struct Heartbeat {
    sequence: u32,
    stop: StopFlag,
}

impl_event!(Heartbeat, stop = stop);

struct Monitor;

impl Monitor {
    fn on_heartbeat(&self, beat: &mut Heartbeat) -> HandlerResult {
        tracing::info!(sequence = beat.sequence, "Heartbeat received");
        if beat.sequence % 3 == 0 {
            beat.stop();
        }
        Ok(())
    }
}

impl Subscriber for Monitor {
    fn register(registrar: &mut Registrar<'_, Self>) {
        registrar.on("on_heartbeat", Priority::HIGH, Self::on_heartbeat);
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    init_logging()?;

    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => EventBusConfig::load(&path)?,
        None => EventBusConfig::default(),
    };
    tracing::info!(version = evbus::VERSION, bus = %config.name, "Starting evbus demo");

    let bus = Arc::new(EventBus::with_config(config));
    let monitor = Arc::new(Monitor);
    register(&bus, &monitor);

    profiler().enable();
    bus.subscribe_with_priority(
        profiler().wrap("heartbeat-audit", |beat: &mut Heartbeat| {
            tracing::debug!(sequence = beat.sequence, "Heartbeat audited");
            Ok(())
        }),
        Priority::LOW,
    );

    let scheduler = EventScheduler::new(&bus, SchedulerConfig::default())?;
    let mut sequence = 0;
    scheduler.schedule_at_fixed_rate(Duration::ZERO, Duration::from_millis(100), move || {
        sequence += 1;
        Some(Heartbeat {
            sequence,
            stop: StopFlag::default(),
        })
    })?;

    std::thread::sleep(Duration::from_millis(550));
    scheduler.shutdown();

    println!("{}", profiler().report());
    Ok(())
}
