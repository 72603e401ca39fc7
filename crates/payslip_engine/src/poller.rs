use std::future::Future;
use std::time::Duration;

use payslip_core::{PollSeq, PollStatus, PollTracker, PollVerdict};
use payslip_logging::{payslip_debug, payslip_warn};
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::ApiError;

#[derive(Debug, Clone, PartialEq)]
pub enum WatchOutcome<T> {
    /// First terminal status reported by the backend.
    Completed(T),
    Cancelled,
}

/// Polls `fetch` every `interval` until it reports a terminal status.
///
/// The first request goes out immediately. Requests are not serialised: a
/// slow response does not delay the next tick, and responses overtaken by a
/// newer one are dropped. Failed requests are logged and retried on the next
/// tick. `on_update` sees every applied non-terminal response; the terminal
/// one is returned. Outstanding requests are aborted when the watch returns,
/// and `cancel` is cancelled on every exit path.
pub async fn watch<T, F, Fut, U>(
    interval: Duration,
    cancel: CancellationToken,
    fetch: F,
    mut on_update: U,
) -> WatchOutcome<T>
where
    T: PollStatus + Send + 'static,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    U: FnMut(T),
{
    let _guard = cancel.clone().drop_guard();
    let mut tracker = PollTracker::new();
    let mut in_flight: JoinSet<(PollSeq, Result<T, ApiError>)> = JoinSet::new();
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return WatchOutcome::Cancelled,
            Some(joined) = in_flight.join_next() => {
                let (seq, result) = match joined {
                    Ok(done) => done,
                    Err(err) => {
                        payslip_warn!("Poll request task failed: {}", err);
                        continue;
                    }
                };
                let response = match result {
                    Ok(response) => response,
                    Err(err) => {
                        payslip_warn!("Poll request #{} failed, retrying on next tick: {}", seq, err);
                        continue;
                    }
                };
                match tracker.accept(seq, response) {
                    PollVerdict::Updated(response) => on_update(response),
                    PollVerdict::Finished(response) => return WatchOutcome::Completed(response),
                    PollVerdict::Stale => payslip_debug!("Discarding stale poll response #{}", seq),
                    PollVerdict::Ignored => {}
                }
            }
            _ = ticker.tick() => {
                if let Some(seq) = tracker.issue() {
                    let request = fetch();
                    in_flight.spawn(async move { (seq, request.await) });
                }
            }
        }
    }
}
