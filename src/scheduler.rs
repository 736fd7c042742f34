//! Dispatch scheduling for periodic weather notifications.
//!
//! Owns two long-lived background tasks, one per frequency class. Each
//! task sleeps until the next frequency-aligned wall-clock boundary
//! (top-of-hour for hourly, local midnight for daily), runs a dispatch
//! cycle, then repeats on a fixed period; drift from the wall-clock
//! boundary after the first fire is accepted.
//!
//! A dispatch cycle: registry snapshot → forecast resolution → email
//! dispatch, bounded by [`CYCLE_DEADLINE`]. Per-item failures inside a
//! cycle are logged and never take down the scheduler.
//!
//! A watch channel interrupts pending waits on `stop()`; an in-flight
//! cycle finishes issuing its sends before the task exits, and `stop()`
//! waits for both tasks.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDateTime, Timelike};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use crate::metrics::AppMetrics;
use crate::notifier::{EmailDispatcher, ForecastFetcher, Frequency};
use crate::store::TargetRegistry;

/// Upper bound on one cycle's fetch/render work. Sends already spawned
/// are fire-and-forget and are not cancelled by this deadline.
pub const CYCLE_DEADLINE: Duration = Duration::from_secs(15 * 60);

/// Drives periodic dispatch cycles for both frequency classes.
pub struct DispatchScheduler {
    registry: Arc<TargetRegistry>,
    forecasts: ForecastFetcher,
    dispatcher: EmailDispatcher,
    metrics: Arc<AppMetrics>,
    running: Mutex<Option<Running>>,
}

struct Running {
    stop_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl DispatchScheduler {
    pub fn new(
        registry: Arc<TargetRegistry>,
        forecasts: ForecastFetcher,
        dispatcher: EmailDispatcher,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            registry,
            forecasts,
            dispatcher,
            metrics,
            running: Mutex::new(None),
        }
    }

    /// Start one background task per frequency class. Calling `start`
    /// while already running is a no-op.
    pub async fn start(&self) {
        let mut running = self.running.lock().await;
        if running.is_some() {
            tracing::debug!("dispatch scheduler already running, start ignored");
            return;
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let tasks = Frequency::ALL
            .iter()
            .map(|&frequency| {
                tokio::spawn(run_frequency(
                    frequency,
                    Arc::clone(&self.registry),
                    self.forecasts.clone(),
                    self.dispatcher.clone(),
                    Arc::clone(&self.metrics),
                    stop_rx.clone(),
                ))
            })
            .collect();

        *running = Some(Running { stop_tx, tasks });
        tracing::info!("dispatch scheduler started");
    }

    /// Signal both tasks and wait for them to exit. Pending waits are
    /// interrupted immediately; an in-flight cycle finishes issuing its
    /// sends first. Calling `stop` while not running is a no-op.
    pub async fn stop(&self) {
        let running = self.running.lock().await.take();
        let Some(Running { stop_tx, tasks }) = running else {
            tracing::debug!("dispatch scheduler not running, stop ignored");
            return;
        };

        let _ = stop_tx.send(true);
        for task in tasks {
            if let Err(err) = task.await {
                tracing::error!("dispatch task failed to join: {}", err);
            }
        }
        tracing::info!("dispatch scheduler stopped");
    }
}

/// One frequency class's timer loop: arm until the wall-clock boundary,
/// fire, then repeat on the fixed period until stopped.
async fn run_frequency(
    frequency: Frequency,
    registry: Arc<TargetRegistry>,
    forecasts: ForecastFetcher,
    dispatcher: EmailDispatcher,
    metrics: Arc<AppMetrics>,
    mut stop_rx: watch::Receiver<bool>,
) {
    // Computed once at arm time, not re-derived inside the wait.
    let delay = delay_until_boundary(frequency, Local::now().naive_local());
    tracing::info!("{} dispatch armed, first fire in {:?}", frequency, delay);

    tokio::select! {
        _ = time::sleep(delay) => {}
        _ = stop_rx.changed() => {
            tracing::info!("{} dispatch stopped before first fire", frequency);
            return;
        }
    }

    run_cycle(frequency, &registry, &forecasts, &dispatcher, &metrics).await;

    let period = frequency.period();
    let mut ticker = time::interval_at(Instant::now() + period, period);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                run_cycle(frequency, &registry, &forecasts, &dispatcher, &metrics).await;
            }
            _ = stop_rx.changed() => {
                tracing::info!("{} dispatch stopped", frequency);
                return;
            }
        }
    }
}

/// Execute a single dispatch cycle. Extracted for testability.
async fn run_cycle(
    frequency: Frequency,
    registry: &Arc<TargetRegistry>,
    forecasts: &ForecastFetcher,
    dispatcher: &EmailDispatcher,
    metrics: &Arc<AppMetrics>,
) {
    let targets = registry.snapshot(frequency).await;

    metrics
        .dispatch_cycles_total
        .with_label_values(&[frequency.as_str()])
        .inc();
    metrics
        .dispatch_targets
        .with_label_values(&[frequency.as_str()])
        .set(targets.len() as f64);

    if targets.is_empty() {
        tracing::debug!("no {} targets this cycle", frequency);
        return;
    }
    tracing::info!("{} dispatch cycle started for {} targets", frequency, targets.len());

    let work = async {
        let resolved = forecasts.resolve(&targets).await;
        let dropped = targets.len() - resolved.len();
        if dropped > 0 {
            metrics.forecasts_dropped_total.inc_by(dropped as f64);
        }
        dispatcher.dispatch(resolved, frequency);
    };

    if time::timeout(CYCLE_DEADLINE, work).await.is_err() {
        tracing::warn!(
            "{} dispatch cycle exceeded its {:?} deadline and was abandoned",
            frequency,
            CYCLE_DEADLINE
        );
    }
}

/// Delay from `now` (naive local time) until the next frequency-aligned
/// boundary.
fn delay_until_boundary(frequency: Frequency, now: NaiveDateTime) -> Duration {
    let next = match frequency {
        Frequency::Hourly => next_top_of_hour(now),
        Frequency::Daily => next_midnight(now),
    };
    (next - now).to_std().unwrap_or(Duration::ZERO)
}

fn next_top_of_hour(now: NaiveDateTime) -> NaiveDateTime {
    let this_hour = now
        .date()
        .and_hms_opt(now.hour(), 0, 0)
        .expect("current hour is a valid time");
    this_hour + chrono::Duration::hours(1)
}

fn next_midnight(now: NaiveDateTime) -> NaiveDateTime {
    now.date()
        .succ_opt()
        .and_then(|tomorrow| tomorrow.and_hms_opt(0, 0, 0))
        .expect("tomorrow's midnight is a valid time")
}
