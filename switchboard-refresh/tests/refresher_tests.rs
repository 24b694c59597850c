use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use switchboard_refresh::Refresher;
use tokio::time::sleep;
use tokio_test::assert_ok;

fn counting(interval_ms: u64) -> (Refresher, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&count);
    let refresher = Refresher::with_millis(interval_ms, move || {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    });
    (refresher, count)
}

// ── Construction ─────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn created_stopped() {
    let (refresher, count) = counting(100);
    assert!(!refresher.is_running());
    assert_eq!(refresher.interval(), Duration::from_millis(100));

    sleep(Duration::from_millis(500)).await;
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

// ── start / stop ─────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn fires_once_per_interval() {
    let (mut refresher, count) = counting(100);
    refresher.start();
    assert!(refresher.is_running());

    sleep(Duration::from_millis(350)).await;
    assert_eq!(count.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn start_is_idempotent() {
    let (mut refresher, count) = counting(100);
    refresher.start();
    refresher.start();

    sleep(Duration::from_millis(350)).await;
    assert_eq!(count.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn stop_prevents_future_ticks() {
    let (mut refresher, count) = counting(100);
    refresher.start();
    sleep(Duration::from_millis(150)).await;
    assert_eq!(count.load(Ordering::SeqCst), 1);

    refresher.stop();
    refresher.stop();
    assert!(!refresher.is_running());

    sleep(Duration::from_millis(500)).await;
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn stop_does_not_cancel_in_flight_invocations() {
    let finished = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&finished);
    let mut refresher = Refresher::with_millis(100, move || {
        let counter = Arc::clone(&counter);
        async move {
            sleep(Duration::from_millis(200)).await;
            counter.fetch_add(1, Ordering::SeqCst);
        }
    });

    refresher.start();
    sleep(Duration::from_millis(150)).await;
    refresher.stop();
    assert_eq!(finished.load(Ordering::SeqCst), 0);

    sleep(Duration::from_millis(300)).await;
    assert_eq!(finished.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn slow_callbacks_overlap() {
    let started = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&started);
    let mut refresher = Refresher::with_millis(100, move || {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            sleep(Duration::from_millis(250)).await;
        }
    });

    refresher.start();
    sleep(Duration::from_millis(320)).await;
    assert_eq!(started.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn drop_stops_the_timer() {
    let (mut refresher, count) = counting(100);
    refresher.start();
    drop(refresher);

    sleep(Duration::from_millis(500)).await;
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

// ── run ──────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn run_while_stopped_fires_once_without_starting() {
    let (refresher, count) = counting(100);
    assert_ok!(refresher.run().await);
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert!(!refresher.is_running());

    sleep(Duration::from_millis(500)).await;
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn run_does_not_disturb_cadence() {
    let (mut refresher, count) = counting(100);
    refresher.start();
    sleep(Duration::from_millis(50)).await;

    assert_ok!(refresher.run().await);
    assert_eq!(count.load(Ordering::SeqCst), 1);

    // Ticks still land at 100, 200 and 300.
    sleep(Duration::from_millis(260)).await;
    assert_eq!(count.load(Ordering::SeqCst), 4);
}

// ── set_interval ─────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn set_interval_restarts_a_running_timer() {
    let (mut refresher, count) = counting(100);
    refresher.start();
    sleep(Duration::from_millis(150)).await;
    assert_eq!(count.load(Ordering::SeqCst), 1);

    refresher.set_interval(Duration::from_millis(1000));
    assert!(refresher.is_running());

    sleep(Duration::from_millis(950)).await;
    assert_eq!(count.load(Ordering::SeqCst), 1);

    sleep(Duration::from_millis(100)).await;
    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn set_interval_keeps_a_stopped_timer_stopped() {
    let (mut refresher, count) = counting(100);
    refresher.set_interval(Duration::from_millis(20));
    assert!(!refresher.is_running());
    assert_eq!(refresher.interval(), Duration::from_millis(20));

    sleep(Duration::from_millis(100)).await;
    assert_eq!(count.load(Ordering::SeqCst), 0);
}
