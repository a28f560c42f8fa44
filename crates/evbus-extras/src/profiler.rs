//! Handler timing.
//!
//! [`EventProfiler::wrap`] decorates a handler so every invocation is timed
//! and recorded twice: once under the event kind and once under the listener
//! name given at wrap time.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use evbus_core::{Event, EventKind, HandlerResult};

/// Handler returned by [`EventProfiler::wrap`]
pub type ProfiledHandler<E> = Box<dyn Fn(&mut E) -> HandlerResult + Send + Sync>;

const SLOWEST_LISTENERS: usize = 10;

#[derive(Debug, Default)]
struct Stats {
    calls: AtomicU64,
    total_nanos: AtomicU64,
    max_nanos: AtomicU64,
}

impl Stats {
    fn record(&self, elapsed: Duration) {
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.total_nanos.fetch_add(nanos, Ordering::Relaxed);
        self.max_nanos.fetch_max(nanos, Ordering::Relaxed);
    }

    fn reset(&self) {
        self.calls.store(0, Ordering::Relaxed);
        self.total_nanos.store(0, Ordering::Relaxed);
        self.max_nanos.store(0, Ordering::Relaxed);
    }

    fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            calls: self.calls.load(Ordering::Relaxed),
            total: Duration::from_nanos(self.total_nanos.load(Ordering::Relaxed)),
            max: Duration::from_nanos(self.max_nanos.load(Ordering::Relaxed)),
        }
    }
}

/// Point-in-time copy of recorded timings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub calls: u64,
    pub total: Duration,
    pub max: Duration,
}

impl StatsSnapshot {
    pub fn average(&self) -> Duration {
        match u32::try_from(self.calls) {
            Ok(0) => Duration::ZERO,
            Ok(calls) => self.total / calls,
            Err(_) => Duration::from_nanos(
                u64::try_from(self.total.as_nanos() / u128::from(self.calls)).unwrap_or(u64::MAX),
            ),
        }
    }
}

/// Collects per-kind and per-listener handler timings
#[derive(Debug, Default)]
pub struct EventProfiler {
    enabled: AtomicBool,
    events: RwLock<HashMap<EventKind, Arc<Stats>>>,
    listeners: RwLock<HashMap<String, Arc<Stats>>>,
}

impl EventProfiler {
    /// Create a disabled profiler
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::SeqCst);
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Wrap `handler` so its invocations are timed under `name`
    ///
    /// Whether timing happens is decided now: a handler wrapped while the
    /// profiler is disabled is returned undecorated and stays that way.
    pub fn wrap<E, F>(&self, name: impl Into<String>, handler: F) -> ProfiledHandler<E>
    where
        E: Event,
        F: Fn(&mut E) -> HandlerResult + Send + Sync + 'static,
    {
        if !self.is_enabled() {
            return Box::new(handler);
        }

        let name = name.into();
        let by_kind = stats_for(&self.events, EventKind::of::<E>());
        let by_listener = stats_for(&self.listeners, name.clone());
        tracing::trace!(listener = %name, kind = %EventKind::of::<E>(), "Profiling handler");

        Box::new(move |event: &mut E| {
            let started = Instant::now();
            let result = handler(event);
            let elapsed = started.elapsed();
            by_kind.record(elapsed);
            by_listener.record(elapsed);
            result
        })
    }

    /// Timings per event kind, omitting kinds with no recorded calls
    pub fn event_stats(&self) -> HashMap<EventKind, StatsSnapshot> {
        collect(&self.events)
    }

    /// Timings per listener name, omitting listeners with no recorded calls
    pub fn listener_stats(&self) -> HashMap<String, StatsSnapshot> {
        collect(&self.listeners)
    }

    /// Zero every recorded timing
    ///
    /// Handlers wrapped earlier keep recording afterwards.
    pub fn reset(&self) {
        for stats in self.events.read().values() {
            stats.reset();
        }
        for stats in self.listeners.read().values() {
            stats.reset();
        }
    }

    /// Human readable summary
    ///
    /// Event kinds are listed by total time, followed by the ten listeners
    /// with the highest single-call time.
    pub fn report(&self) -> String {
        let mut events: Vec<_> = self.event_stats().into_iter().collect();
        events.sort_by(|a, b| b.1.total.cmp(&a.1.total));

        let mut listeners: Vec<_> = self.listener_stats().into_iter().collect();
        listeners.sort_by(|a, b| b.1.max.cmp(&a.1.max));

        let mut out = String::from("@@@ Event Profiler Report @@@\n");
        out.push_str("\nEvent Statistics:\n");
        for (kind, stats) in &events {
            let _ = writeln!(
                out,
                "  {}: calls={}, avg={:.2}ms, total={:.2}ms",
                kind,
                stats.calls,
                millis(stats.average()),
                millis(stats.total)
            );
        }

        out.push_str("\nSlowest Listeners:\n");
        for (name, stats) in listeners.iter().take(SLOWEST_LISTENERS) {
            let _ = writeln!(
                out,
                "  {}: avg={:.2}ms, max={:.2}ms",
                name,
                millis(stats.average()),
                millis(stats.max)
            );
        }
        out
    }
}

fn stats_for<K>(map: &RwLock<HashMap<K, Arc<Stats>>>, key: K) -> Arc<Stats>
where
    K: std::hash::Hash + Eq,
{
    if let Some(stats) = map.read().get(&key) {
        return stats.clone();
    }
    map.write().entry(key).or_default().clone()
}

fn collect<K>(map: &RwLock<HashMap<K, Arc<Stats>>>) -> HashMap<K, StatsSnapshot>
where
    K: std::hash::Hash + Eq + Clone,
{
    map.read()
        .iter()
        .map(|(key, stats)| (key.clone(), stats.snapshot()))
        .filter(|(_, snapshot)| snapshot.calls > 0)
        .collect()
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

static PROFILER: OnceLock<EventProfiler> = OnceLock::new();

/// Process-wide profiler, disabled until [`EventProfiler::enable`] is called
pub fn profiler() -> &'static EventProfiler {
    PROFILER.get_or_init(EventProfiler::new)
}
