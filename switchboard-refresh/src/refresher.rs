use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, trace};

/// Shortest accepted interval; tokio timers reject a zero period.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Callback invoked on every tick. Each call produces one independent future.
pub type RefreshCallback = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// A recurring timer around an async callback.
///
/// Created stopped. [`Refresher::start`] and [`Refresher::stop`] are
/// idempotent; [`Refresher::run`] fires one invocation right away regardless
/// of the timer. Every invocation is spawned as its own task, so stopping the
/// timer never cancels work that is already in flight.
///
/// Must be started from within a tokio runtime. Dropping the refresher stops
/// its timer.
pub struct Refresher {
    callback: RefreshCallback,
    interval: Duration,
    timer: Option<JoinHandle<()>>,
}

impl Refresher {
    /// Creates a stopped refresher.
    pub fn new<F, Fut>(interval: Duration, callback: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            callback: Arc::new(move || Box::pin(callback()) as BoxFuture<'static, ()>),
            interval,
            timer: None,
        }
    }

    /// Shorthand for an interval given in milliseconds.
    pub fn with_millis<F, Fut>(interval_ms: u64, callback: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self::new(Duration::from_millis(interval_ms), callback)
    }

    /// Returns the current interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns whether the recurring timer is active.
    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    /// Starts the recurring timer. The first tick fires one interval from
    /// now. Does nothing if the timer is already running.
    pub fn start(&mut self) {
        if self.timer.is_some() {
            return;
        }
        let callback = Arc::clone(&self.callback);
        let period = self.interval.max(MIN_INTERVAL);
        debug!(interval_ms = period.as_millis() as u64, "refresher started");
        self.timer = Some(tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                trace!("refresher tick");
                tokio::spawn(callback());
            }
        }));
    }

    /// Stops the recurring timer. Invocations already running are left alone.
    /// Does nothing if the timer is not running.
    pub fn stop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
            debug!("refresher stopped");
        }
    }

    /// Fires one invocation immediately, independent of the timer.
    ///
    /// The timer (running or not) is left untouched. The returned handle can
    /// be awaited to wait for this invocation to finish.
    pub fn run(&self) -> JoinHandle<()> {
        tokio::spawn((self.callback)())
    }

    /// Changes the interval, restarting the timer if it was running.
    pub fn set_interval(&mut self, interval: Duration) {
        let running = self.is_running();
        self.stop();
        self.interval = interval;
        if running {
            self.start();
        }
    }
}

impl Drop for Refresher {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Refresher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Refresher")
            .field("interval", &self.interval)
            .field("running", &self.is_running())
            .finish()
    }
}
