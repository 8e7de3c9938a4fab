//! Periodic update passes

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Run `pass` every `period` until `cancel` fires.
///
/// The first pass starts one period after the call. Ticks missed while a
/// pass was running are skipped rather than replayed. Cancellation is only
/// observed between passes: a pass that has started always completes.
pub async fn run_schedule<F, Fut>(period: Duration, cancel: CancellationToken, mut pass: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("Scheduled update checks every {:?}", period);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Update schedule stopped");
                break;
            }
            _ = ticker.tick() => {
                debug!("Running scheduled update check");
                pass().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn run_schedule_runs_pass_every_period() {
        let count = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();

        let handle = {
            let count = Arc::clone(&count);
            let cancel = cancel.clone();
            tokio::spawn(run_schedule(Duration::from_secs(3600), cancel, move || {
                let count = Arc::clone(&count);
                async move {
                    count.fetch_add(1, Ordering::SeqCst);
                }
            }))
        };

        tokio::time::sleep(Duration::from_secs(3600 * 3 + 1)).await;
        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_waits_for_running_pass() {
        let finished = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();

        let handle = {
            let finished = Arc::clone(&finished);
            let cancel = cancel.clone();
            tokio::spawn(run_schedule(Duration::from_secs(60), cancel, move || {
                let finished = Arc::clone(&finished);
                async move {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    finished.fetch_add(1, Ordering::SeqCst);
                }
            }))
        };

        // Cancel while the first pass is half way through
        tokio::time::sleep(Duration::from_secs(75)).await;
        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_before_first_tick_runs_nothing() {
        let count = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let counter = Arc::clone(&count);
        run_schedule(Duration::from_secs(60), cancel, move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        })
        .await;

        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
