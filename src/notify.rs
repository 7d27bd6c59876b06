use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::Result;

use crate::domain::{ChallengeStatus, UserChallenge};

/// How often `challenge watch` re-checks for pending challenges.
pub const POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Background poller that periodically counts pending challenges and reports
/// changes through a callback. Stopping joins the worker, so no check can
/// fire after `stop` returns.
pub struct ChallengeWatcher {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

impl ChallengeWatcher {
    /// Spawns the poll loop. The first check runs immediately, then every
    /// `interval` until stopped or `max_checks` is reached.
    pub fn spawn<F, N>(
        fetch: F,
        mut on_pending: N,
        interval: Duration,
        max_checks: Option<u32>,
    ) -> Self
    where
        F: Fn() -> Result<Vec<UserChallenge>> + Send + 'static,
        N: FnMut(usize) + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let handle = thread::spawn(move || {
            let mut checks = 0u32;
            let mut last_pending: Option<usize> = None;
            loop {
                match fetch() {
                    Ok(challenges) => {
                        let pending = pending_count(&challenges);
                        if last_pending != Some(pending) {
                            on_pending(pending);
                            last_pending = Some(pending);
                        }
                    }
                    Err(err) => {
                        eprintln!("Challenge check failed: {err:#}");
                    }
                }

                checks += 1;
                if let Some(max) = max_checks {
                    if checks >= max {
                        return;
                    }
                }

                // The stop signal doubles as the sleep timer.
                match stop_rx.recv_timeout(interval) {
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
                    Err(RecvTimeoutError::Timeout) => {}
                }
            }
        });

        Self { stop_tx, handle }
    }

    /// Signals the worker and waits for it to exit.
    pub fn stop(self) {
        let _ = self.stop_tx.send(());
        let _ = self.handle.join();
    }

    /// Blocks until the worker finishes on its own (only with `max_checks`).
    pub fn wait(self) {
        let _ = self.handle.join();
    }
}

pub fn pending_count(challenges: &[UserChallenge]) -> usize {
    challenges
        .iter()
        .filter(|c| c.status == ChallengeStatus::Pending)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn user_challenge(id: i64, status: ChallengeStatus) -> UserChallenge {
        UserChallenge {
            user_challenge_id: id,
            status,
            challenge: None,
        }
    }

    #[test]
    fn pending_count_only_counts_pending() {
        let challenges = vec![
            user_challenge(1, ChallengeStatus::Pending),
            user_challenge(2, ChallengeStatus::Completed),
            user_challenge(3, ChallengeStatus::Pending),
            user_challenge(4, ChallengeStatus::Failed),
        ];
        assert_eq!(pending_count(&challenges), 2);
    }

    #[test]
    fn watcher_reports_once_per_change_and_stops_cleanly() {
        let notified = Arc::new(AtomicUsize::new(0));
        let notified_inner = Arc::clone(&notified);

        let watcher = ChallengeWatcher::spawn(
            // Stable result: two pending every poll.
            || {
                Ok(vec![
                    user_challenge(1, ChallengeStatus::Pending),
                    user_challenge(2, ChallengeStatus::Pending),
                ])
            },
            move |pending| {
                assert_eq!(pending, 2);
                notified_inner.fetch_add(1, Ordering::SeqCst);
            },
            Duration::from_millis(5),
            Some(4),
        );
        watcher.wait();

        // Four checks, identical counts: exactly one notification.
        assert_eq!(notified.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stop_joins_the_worker_before_returning() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_inner = Arc::clone(&calls);

        let watcher = ChallengeWatcher::spawn(
            move || {
                calls_inner.fetch_add(1, Ordering::SeqCst);
                Ok(Vec::new())
            },
            |_| {},
            Duration::from_secs(60),
            None,
        );

        // First check fires immediately; then the worker is parked on the
        // stop channel for a full minute unless stop interrupts it.
        watcher.stop();
        let after_stop = calls.load(Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(calls.load(Ordering::SeqCst), after_stop);
    }
}
