use evbus_core::{ConfigFile, Event, EventBus};
use evbus_extras::{debounce, EventScheduler, SchedulerConfig, SchedulerError};
use parking_lot::Mutex;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Clone)]
struct Beat(u32);
impl Event for Beat {}

fn config() -> SchedulerConfig {
    SchedulerConfig {
        thread_name: "evbus-test-timer".to_string(),
        shutdown_timeout_ms: 1000,
    }
}

fn counted_bus() -> (Arc<EventBus>, Arc<AtomicUsize>) {
    let bus = Arc::new(EventBus::new());
    let count = Arc::new(AtomicUsize::new(0));
    let c = count.clone();
    bus.on(move |_: &mut Beat| {
        c.fetch_add(1, Ordering::SeqCst);
    });
    (bus, count)
}

#[test]
fn test_one_shot_runs_on_timer_thread() {
    let bus = Arc::new(EventBus::new());
    let seen = Arc::new(Mutex::new(None));
    let s = seen.clone();
    bus.on(move |_: &mut Beat| {
        *s.lock() = thread::current().name().map(str::to_string);
    });

    let scheduler = EventScheduler::new(&bus, config()).expect("runtime starts");
    let task = scheduler
        .schedule(Duration::from_millis(10), || Some(Beat(1)))
        .expect("scheduled");
    scheduler.shutdown();

    assert!(task.is_finished());
    assert_eq!(seen.lock().as_deref(), Some("evbus-test-timer"));
}

#[test]
fn test_none_posts_nothing() {
    let (bus, count) = counted_bus();
    let scheduler = EventScheduler::new(&bus, config()).expect("runtime starts");
    let task = scheduler
        .schedule(Duration::ZERO, || None::<Beat>)
        .expect("scheduled");
    scheduler.shutdown();

    assert_eq!(task.runs(), 1);
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[test]
fn test_fixed_rate_repeats_until_cancelled() {
    let (bus, count) = counted_bus();
    let scheduler = EventScheduler::new(&bus, config()).expect("runtime starts");
    let task = scheduler
        .schedule_at_fixed_rate(Duration::ZERO, Duration::from_millis(10), || Some(Beat(0)))
        .expect("scheduled");

    thread::sleep(Duration::from_millis(200));
    task.cancel();
    assert!(task.is_cancelled());
    assert!(task.is_finished());
    thread::sleep(Duration::from_millis(30));

    let fired = count.load(Ordering::SeqCst);
    assert!(fired >= 3, "fired {fired} times");
    thread::sleep(Duration::from_millis(60));
    assert_eq!(count.load(Ordering::SeqCst), fired);
}

#[test]
fn test_fixed_delay_supplier_keeps_state() {
    let bus = Arc::new(EventBus::new());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = seen.clone();
    bus.on(move |beat: &mut Beat| s.lock().push(beat.0));

    let scheduler = EventScheduler::new(&bus, config()).expect("runtime starts");
    let mut next = 0;
    let task = scheduler
        .schedule_with_fixed_delay(Duration::ZERO, Duration::from_millis(5), move || {
            next += 1;
            (next <= 3).then_some(Beat(next))
        })
        .expect("scheduled");

    thread::sleep(Duration::from_millis(150));
    task.cancel();
    assert_eq!(*seen.lock(), vec![1, 2, 3]);
    assert!(task.runs() > 3);
}

#[test]
fn test_failing_listener_ends_periodic_task() {
    let bus = Arc::new(EventBus::new());
    bus.subscribe(|_: &mut Beat| anyhow::bail!("sensor offline"));

    let scheduler = EventScheduler::new(&bus, config()).expect("runtime starts");
    let task = scheduler
        .schedule_with_fixed_delay(Duration::ZERO, Duration::from_millis(5), || Some(Beat(0)))
        .expect("scheduled");

    thread::sleep(Duration::from_millis(100));
    assert_eq!(task.runs(), 1);
    assert!(task.is_finished());
    assert!(!task.is_cancelled());
}

#[test]
fn test_panicking_listener_finishes_task() {
    let bus = Arc::new(EventBus::new());
    bus.on(|beat: &mut Beat| {
        if beat.0 == 0 {
            panic!("listener blew up");
        }
    });

    let scheduler = EventScheduler::new(&bus, config()).expect("runtime starts");
    let task = scheduler
        .schedule(Duration::ZERO, || Some(Beat(0)))
        .expect("scheduled");

    thread::sleep(Duration::from_millis(100));
    assert_eq!(task.runs(), 1);
    assert!(task.is_finished());
    assert!(!task.is_cancelled());

    // The timer thread survives the panic
    let next = scheduler
        .schedule(Duration::ZERO, || Some(Beat(1)))
        .expect("scheduled");
    scheduler.shutdown();
    assert!(next.is_finished());
    assert_eq!(next.runs(), 1);
}

#[test]
fn test_shutdown_cancels_periodic_and_refuses_work() {
    let (bus, count) = counted_bus();
    let scheduler = EventScheduler::new(&bus, config()).expect("runtime starts");
    scheduler
        .schedule_at_fixed_rate(Duration::from_millis(1), Duration::from_millis(5), || {
            Some(Beat(0))
        })
        .expect("scheduled");

    thread::sleep(Duration::from_millis(30));
    scheduler.shutdown();
    thread::sleep(Duration::from_millis(20));
    let after_shutdown = count.load(Ordering::SeqCst);
    assert!(after_shutdown > 0);
    thread::sleep(Duration::from_millis(30));
    assert_eq!(count.load(Ordering::SeqCst), after_shutdown);

    let refused = scheduler.schedule(Duration::ZERO, || Some(Beat(0)));
    assert!(matches!(refused, Err(SchedulerError::ShutDown)));
}

#[test]
fn test_shutdown_timeout_drops_late_one_shots() {
    let (bus, count) = counted_bus();
    let scheduler = EventScheduler::new(
        &bus,
        SchedulerConfig {
            shutdown_timeout_ms: 20,
            ..config()
        },
    )
    .expect("runtime starts");
    let task = scheduler
        .schedule(Duration::from_secs(30), || Some(Beat(0)))
        .expect("scheduled");

    scheduler.shutdown();
    assert_eq!(count.load(Ordering::SeqCst), 0);
    assert_eq!(task.runs(), 0);
}

#[test]
fn test_debounce_delivers_latest_once() {
    let bus = Arc::new(EventBus::new());
    let delivered = Arc::new(Mutex::new(Vec::new()));
    let scheduler = Arc::new(EventScheduler::new(&bus, config()).expect("runtime starts"));

    let d = delivered.clone();
    debounce(&scheduler, Duration::from_millis(50), move |beat: &mut Beat| {
        d.lock().push(beat.0)
    });

    for n in 1..=5 {
        bus.post(Beat(n)).expect("post succeeds");
    }
    thread::sleep(Duration::from_millis(300));
    assert_eq!(*delivered.lock(), vec![5]);

    scheduler.shutdown();
    bus.post(Beat(6)).expect("post succeeds");
    assert_eq!(*delivered.lock(), vec![5]);
}

#[test]
fn test_config_from_file() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("create temp file");
    file.write_all(b"thread_name = \"ticker\"\nshutdown_timeout_ms = 100\n")
        .expect("write temp file");

    let config = SchedulerConfig::load(file.path()).expect("valid config");
    assert_eq!(config.thread_name, "ticker");

    let scheduler = EventScheduler::global(config).expect("runtime starts");
    assert_eq!(scheduler.config().shutdown_timeout(), Duration::from_millis(100));
}
