//! Rate-limited request queue — paces outbound LLM calls to a fixed
//! per-window budget.
//!
//! Submissions are appended to a strict FIFO queue; a single pacing loop
//! drains it, executing at most `max_requests_per_window` jobs within any
//! trailing window. Each submitter awaits a oneshot completion handle, so
//! a slow or failing job never blocks other submitters — only the shared
//! execution budget is serialized.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::{Mutex, oneshot};
use tokio::time::{Instant, sleep};
use tracing::{debug, error, info};

use crate::config::QueueConfig;
use crate::error::LlmError;

/// A deferred computation submitted for pacing.
type Job = Pin<Box<dyn Future<Output = Result<String, LlmError>> + Send>>;

/// A queued job plus the handle its submitter is awaiting.
struct WorkItem {
    job: Job,
    done: oneshot::Sender<Result<String, LlmError>>,
}

/// Queue state. The pending queue, the timestamp ledger, and the processing
/// flag must only ever be touched together under this one lock — the
/// pop/append/flag transitions are atomic as a unit.
struct QueueState {
    pending: VecDeque<WorkItem>,
    ledger: VecDeque<Instant>,
    processing: bool,
}

/// What the pacing loop decided to do on one iteration.
enum Step {
    Execute(WorkItem),
    Wait(std::time::Duration),
    Shutdown,
}

/// FIFO admission queue with a rolling-window rate cap.
pub struct RequestQueue {
    state: Mutex<QueueState>,
    config: QueueConfig,
}

impl RequestQueue {
    /// Create a new queue with the given pacing configuration.
    pub fn new(config: QueueConfig) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(QueueState {
                pending: VecDeque::new(),
                ledger: VecDeque::new(),
                processing: false,
            }),
            config,
        })
    }

    /// Number of work items waiting to execute. Used by the fallback policy
    /// for load-shedding decisions.
    pub async fn depth(&self) -> usize {
        self.state.lock().await.pending.len()
    }

    /// Submit a job and await its result.
    ///
    /// The job is appended to the pending queue and executed in strict
    /// submission order once rate-window capacity allows. A failure inside
    /// the job is delivered only to this caller; other queued jobs are
    /// unaffected.
    pub async fn submit<F>(self: &Arc<Self>, job: F) -> Result<String, LlmError>
    where
        F: Future<Output = Result<String, LlmError>> + Send + 'static,
    {
        let (done, rx) = oneshot::channel();
        {
            let mut state = self.state.lock().await;
            state.pending.push_back(WorkItem {
                job: Box::pin(job),
                done,
            });
            if !state.processing {
                // Flip the flag under the same lock that observed it, before
                // any suspension point — two concurrent submitters can never
                // both spawn a pacing loop.
                state.processing = true;
                let queue = Arc::clone(self);
                tokio::spawn(async move { queue.run_pacing_loop().await });
            }
            debug!(depth = state.pending.len(), "Work item enqueued");
        }

        rx.await.unwrap_or_else(|_| {
            Err(LlmError::RequestFailed {
                provider: "queue".to_string(),
                reason: "work item dropped before completion".to_string(),
            })
        })
    }

    /// Drain the pending queue at the configured rate. Exits when the queue
    /// is empty at check time, clearing the processing flag under the lock.
    async fn run_pacing_loop(self: Arc<Self>) {
        loop {
            let step = {
                let mut state = self.state.lock().await;

                if state.pending.is_empty() {
                    state.processing = false;
                    Step::Shutdown
                } else {
                    let now = Instant::now();
                    while state
                        .ledger
                        .front()
                        .is_some_and(|t| now.duration_since(*t) >= self.config.window)
                    {
                        state.ledger.pop_front();
                    }

                    if state.ledger.len() < self.config.max_requests_per_window {
                        match state.pending.pop_front() {
                            Some(item) => Step::Execute(item),
                            None => {
                                state.processing = false;
                                Step::Shutdown
                            }
                        }
                    } else {
                        // At capacity: wait for the oldest ledger entry to
                        // leave the window, but re-check at least every poll
                        // interval so a stale computation can't stall us.
                        let until_free = state
                            .ledger
                            .front()
                            .map(|t| self.config.window.saturating_sub(now.duration_since(*t)))
                            .unwrap_or(self.config.poll_interval);
                        Step::Wait(until_free.min(self.config.poll_interval))
                    }
                }
            };

            match step {
                Step::Execute(item) => {
                    let result = item.job.await;
                    match &result {
                        Ok(_) => debug!("Work item completed"),
                        Err(e) => error!(error = %e, "Work item failed"),
                    }
                    // Receiver may have abandoned interest (external timeout);
                    // the result is simply discarded in that case.
                    let _ = item.done.send(result);

                    let mut state = self.state.lock().await;
                    state.ledger.push_back(Instant::now());
                    info!(depth = state.pending.len(), "Processed queued request");
                }
                Step::Wait(duration) => {
                    info!(wait_secs = duration.as_secs_f64(), "Rate cap reached, waiting");
                    sleep(duration).await;
                }
                Step::Shutdown => return,
            }
        }
    }

    #[cfg(test)]
    async fn ledger_len(&self) -> usize {
        self.state.lock().await.ledger.len()
    }

    #[cfg(test)]
    async fn is_processing(&self) -> bool {
        self.state.lock().await.processing
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    use futures::future::join_all;

    use super::*;

    fn test_config(max: usize) -> QueueConfig {
        QueueConfig {
            max_requests_per_window: max,
            window: Duration::from_secs(60),
            poll_interval: Duration::from_secs(20),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn executes_in_submission_order() {
        let queue = RequestQueue::new(test_config(100));
        let order = Arc::new(StdMutex::new(Vec::new()));

        let mut handles = Vec::new();
        for i in 0..5 {
            let queue = Arc::clone(&queue);
            let order = Arc::clone(&order);
            handles.push(async move {
                queue
                    .submit(async move {
                        order.lock().unwrap().push(i);
                        Ok(format!("job-{i}"))
                    })
                    .await
            });
        }

        let results = join_all(handles).await;
        for (i, r) in results.iter().enumerate() {
            assert_eq!(r.as_ref().unwrap(), &format!("job-{i}"));
        }
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_cap_delays_excess_submissions() {
        let queue = RequestQueue::new(test_config(3));
        let start = Instant::now();
        let stamps = Arc::new(StdMutex::new(Vec::new()));

        let mut handles = Vec::new();
        for i in 0..5 {
            let queue = Arc::clone(&queue);
            let stamps = Arc::clone(&stamps);
            handles.push(async move {
                queue
                    .submit(async move {
                        stamps.lock().unwrap().push((i, Instant::now()));
                        Ok(String::new())
                    })
                    .await
            });
        }
        join_all(handles).await;

        let stamps = stamps.lock().unwrap();
        assert_eq!(stamps.len(), 5);
        // First three fit the window and run immediately.
        for (i, at) in &stamps[..3] {
            assert!(*i < 3);
            assert!(at.duration_since(start) < Duration::from_secs(1));
        }
        // The 4th and 5th wait for capacity to free up.
        for (i, at) in &stamps[3..] {
            assert!(*i >= 3);
            assert!(at.duration_since(start) >= Duration::from_secs(60));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn failure_is_isolated_to_its_caller() {
        let queue = RequestQueue::new(test_config(10));

        let failed = queue
            .submit(async {
                Err(LlmError::RequestFailed {
                    provider: "test".into(),
                    reason: "boom".into(),
                })
            })
            .await;
        assert!(matches!(failed, Err(LlmError::RequestFailed { .. })));

        // A job submitted afterwards still executes and succeeds.
        let ok = queue.submit(async { Ok("fine".to_string()) }).await;
        assert_eq!(ok.unwrap(), "fine");
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_submissions_start_exactly_one_loop() {
        let queue = RequestQueue::new(test_config(100));

        let mut handles = Vec::new();
        for _ in 0..20 {
            let queue = Arc::clone(&queue);
            handles.push(async move { queue.submit(async { Ok(String::new()) }).await });
        }
        join_all(handles).await;

        // One ledger entry per logical execution — a duplicate loop would
        // have double-processed or double-recorded.
        assert_eq!(queue.ledger_len().await, 20);
        assert!(!queue.is_processing().await);
    }

    #[tokio::test(start_paused = true)]
    async fn loop_restarts_after_queue_drains() {
        let queue = RequestQueue::new(test_config(10));

        assert_eq!(queue.submit(async { Ok("a".into()) }).await.unwrap(), "a");
        assert!(!queue.is_processing().await);

        // Queue drained and flag cleared: the next submission starts a
        // fresh loop rather than resuming the old one.
        assert_eq!(queue.submit(async { Ok("b".into()) }).await.unwrap(), "b");
        assert!(!queue.is_processing().await);
    }

    #[tokio::test(start_paused = true)]
    async fn depth_reflects_pending_items() {
        let queue = RequestQueue::new(test_config(1));
        assert_eq!(queue.depth().await, 0);

        // Saturate the window, then pile up work behind it.
        queue.submit(async { Ok(String::new()) }).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..3 {
            let queue = Arc::clone(&queue);
            handles.push(tokio::spawn(
                async move { queue.submit(async { Ok(String::new()) }).await },
            ));
        }
        // Let the submissions enqueue.
        tokio::task::yield_now().await;
        assert!(queue.depth().await > 0);

        for h in handles {
            h.await.unwrap().unwrap();
        }
        assert_eq!(queue.depth().await, 0);
    }
}
