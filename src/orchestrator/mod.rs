//! Request orchestration: debouncing, single-flight deduplication, and
//! cooperative concurrency limiting for completion calls.
//!
//! Debounce timers are generation tokens in a map rather than cancellable OS
//! timers: a sleeper that wakes and finds its generation replaced simply
//! stands down. In-flight work is stored as a shared future, so concurrent
//! requests with the same id await one underlying execution instead of
//! issuing duplicate network calls.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;
use tracing::{debug, info};

use crate::types::EngineError;

type SharedWork<T> = Shared<BoxFuture<'static, Result<T, EngineError>>>;

/// Orchestrator statistics.
#[derive(Debug, Clone, Serialize)]
pub struct OrchestratorStats {
    pub pending_requests: usize,
    pub in_flight_requests: usize,
    pub active_requests: usize,
    pub max_concurrent_requests: usize,
}

/// Owns debounce timers, the single-flight request map, and the global
/// concurrency counter. One instance per engine.
pub struct RequestOrchestrator {
    /// Pending debounce timers: request id -> current generation
    timers: Mutex<HashMap<String, u64>>,
    next_generation: AtomicU64,
    /// In-flight shared futures, type-erased per result type
    in_flight: Arc<Mutex<HashMap<String, Box<dyn Any + Send>>>>,
    active: Arc<AtomicUsize>,
    max_concurrent: Arc<AtomicUsize>,
    poll_interval: Duration,
}

impl RequestOrchestrator {
    /// Create an orchestrator with the given concurrency cap.
    pub fn new(max_concurrent: usize, poll_interval: Duration) -> Self {
        Self {
            timers: Mutex::new(HashMap::new()),
            next_generation: AtomicU64::new(0),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            active: Arc::new(AtomicUsize::new(0)),
            max_concurrent: Arc::new(AtomicUsize::new(max_concurrent)),
            poll_interval,
        }
    }

    /// Build a stable request id from an operation, owning element, and text.
    /// Only a text prefix participates so ids stay bounded.
    pub fn request_id(operation: &str, element_id: &str, text: &str) -> String {
        let prefix: String = text.chars().take(50).collect();
        format!("{}:{}:{}", operation, element_id, prefix)
    }

    /// Debounce `work` under `request_id`: restart the delay, and execute
    /// only if no newer request for the same id arrives during the wait.
    ///
    /// A superseded caller gets `EngineError::Superseded`; its work closure
    /// is never invoked.
    pub async fn schedule<T, F, Fut>(
        &self,
        request_id: &str,
        delay: Duration,
        work: F,
    ) -> Result<T, EngineError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, EngineError>> + Send + 'static,
    {
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
        self.timers
            .lock()
            .unwrap()
            .insert(request_id.to_string(), generation);

        tokio::time::sleep(delay).await;

        {
            let mut timers = self.timers.lock().unwrap();
            match timers.get(request_id) {
                Some(&current) if current == generation => {
                    timers.remove(request_id);
                }
                _ => {
                    debug!(request_id, "debounced request superseded");
                    return Err(EngineError::Superseded);
                }
            }
        }

        self.execute(request_id, work).await
    }

    /// Run `work` under `request_id` with single-flight deduplication and the
    /// global concurrency cap.
    ///
    /// If an identical request is already in flight, the caller awaits the
    /// same shared outcome instead of starting a duplicate call. Otherwise the
    /// work waits cooperatively for a concurrency slot before running.
    pub async fn execute<T, F, Fut>(&self, request_id: &str, work: F) -> Result<T, EngineError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, EngineError>> + Send + 'static,
    {
        let shared = {
            let mut in_flight = self.in_flight.lock().unwrap();

            if let Some(existing) = in_flight
                .get(request_id)
                .and_then(|f| f.downcast_ref::<SharedWork<T>>())
            {
                debug!(request_id, "joining in-flight request");
                existing.clone()
            } else {
                let active = Arc::clone(&self.active);
                let max_concurrent = Arc::clone(&self.max_concurrent);
                let poll_interval = self.poll_interval;
                let map = Arc::clone(&self.in_flight);
                let id = request_id.to_string();
                let fut = work();

                let shared: SharedWork<T> = async move {
                    // Claim a slot with compare_exchange: a plain check-then-
                    // increment would let several waiters waking from the same
                    // poll tick pass the check before any of them increments.
                    loop {
                        let current = active.load(Ordering::SeqCst);
                        if current < max_concurrent.load(Ordering::SeqCst)
                            && active
                                .compare_exchange(
                                    current,
                                    current + 1,
                                    Ordering::SeqCst,
                                    Ordering::SeqCst,
                                )
                                .is_ok()
                        {
                            break;
                        }
                        tokio::time::sleep(poll_interval).await;
                    }
                    let result = fut.await;
                    active.fetch_sub(1, Ordering::SeqCst);
                    map.lock().unwrap().remove(&id);
                    result
                }
                .boxed()
                .shared();

                in_flight.insert(request_id.to_string(), Box::new(shared.clone()));
                shared
            }
        };

        shared.await
    }

    /// Cancel a pending debounce timer. In-flight work is unaffected.
    pub fn cancel(&self, request_id: &str) {
        self.timers.lock().unwrap().remove(request_id);
    }

    /// Cancel all pending timers whose id belongs to the given element.
    ///
    /// Ids have the form `{operation}:{element}:{text prefix}` (the text part
    /// may be absent); only an exact match on the element segment counts, so
    /// element ids that prefix one another never collide.
    pub fn cancel_element(&self, element_id: &str) {
        let mut timers = self.timers.lock().unwrap();
        let before = timers.len();
        timers.retain(|id, _| id.splitn(3, ':').nth(1) != Some(element_id));
        let cancelled = before - timers.len();
        if cancelled > 0 {
            info!(element_id, cancelled, "cancelled pending element requests");
        }
    }

    /// Cancel every pending timer. Used on cache clear and shutdown.
    pub fn cancel_all(&self) {
        let mut timers = self.timers.lock().unwrap();
        if !timers.is_empty() {
            info!(cancelled = timers.len(), "cancelled all pending requests");
        }
        timers.clear();
    }

    /// Update the concurrency cap at runtime.
    pub fn set_max_concurrent(&self, max: usize) {
        self.max_concurrent.store(max.max(1), Ordering::SeqCst);
    }

    /// Current counters.
    pub fn stats(&self) -> OrchestratorStats {
        OrchestratorStats {
            pending_requests: self.timers.lock().unwrap().len(),
            in_flight_requests: self.in_flight.lock().unwrap().len(),
            active_requests: self.active.load(Ordering::SeqCst),
            max_concurrent_requests: self.max_concurrent.load(Ordering::SeqCst),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orchestrator(max: usize) -> Arc<RequestOrchestrator> {
        Arc::new(RequestOrchestrator::new(max, Duration::from_millis(10)))
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_flight_shares_one_call() {
        let orch = orchestrator(3);
        let calls = Arc::new(AtomicUsize::new(0));

        let make_work = |calls: Arc<AtomicUsize>| {
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(100)).await;
                Ok::<String, EngineError>("done".to_string())
            }
        };

        let a = {
            let orch = Arc::clone(&orch);
            let work = make_work(Arc::clone(&calls));
            tokio::spawn(async move { orch.execute("req-1", work).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        let b = {
            let orch = Arc::clone(&orch);
            let work = make_work(Arc::clone(&calls));
            tokio::spawn(async move { orch.execute("req-1", work).await })
        };

        let (ra, rb) = (a.await.unwrap(), b.await.unwrap());
        assert_eq!(ra, Ok("done".to_string()));
        assert_eq!(rb, Ok("done".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(orch.stats().in_flight_requests, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_ids_run_independently() {
        let orch = orchestrator(3);
        let calls = Arc::new(AtomicUsize::new(0));

        for i in 0..2 {
            let calls = Arc::clone(&calls);
            orch.execute(&format!("req-{}", i), move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<(), EngineError>(())
            })
            .await
            .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_cap_is_respected() {
        let orch = orchestrator(1);
        let gauge = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for i in 0..3 {
            let orch = Arc::clone(&orch);
            let gauge = Arc::clone(&gauge);
            let peak = Arc::clone(&peak);
            handles.push(tokio::spawn(async move {
                orch.execute(&format!("req-{}", i), move || async move {
                    let now = gauge.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    gauge.fetch_sub(1, Ordering::SeqCst);
                    Ok::<(), EngineError>(())
                })
                .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_supersedes_earlier_request() {
        let orch = orchestrator(3);
        let calls = Arc::new(AtomicUsize::new(0));

        let make_work = |calls: Arc<AtomicUsize>, value: &'static str| {
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<String, EngineError>(value.to_string())
            }
        };

        let first = {
            let orch = Arc::clone(&orch);
            let work = make_work(Arc::clone(&calls), "first");
            tokio::spawn(async move {
                orch.schedule("req-1", Duration::from_millis(50), work).await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        let second = {
            let orch = Arc::clone(&orch);
            let work = make_work(Arc::clone(&calls), "second");
            tokio::spawn(async move {
                orch.schedule("req-1", Duration::from_millis(50), work).await
            })
        };

        assert_eq!(first.await.unwrap(), Err(EngineError::Superseded));
        assert_eq!(second.await.unwrap(), Ok("second".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_clears_pending_timer() {
        let orch = orchestrator(3);
        let calls = Arc::new(AtomicUsize::new(0));

        let handle = {
            let orch = Arc::clone(&orch);
            let calls = Arc::clone(&calls);
            tokio::spawn(async move {
                orch.schedule("req-1", Duration::from_millis(50), move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<(), EngineError>(())
                })
                .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        orch.cancel("req-1");

        assert_eq!(handle.await.unwrap(), Err(EngineError::Superseded));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_element_only_touches_matching_ids() {
        let orch = orchestrator(3);

        let spawn_schedule = |id: &'static str| {
            let orch = Arc::clone(&orch);
            tokio::spawn(async move {
                orch.schedule(id, Duration::from_millis(50), || async {
                    Ok::<(), EngineError>(())
                })
                .await
            })
        };
        let doomed = spawn_schedule("grammar:el-1:text");
        let kept = spawn_schedule("grammar:el-2:text");
        tokio::time::sleep(Duration::from_millis(10)).await;

        orch.cancel_element("el-1");

        assert_eq!(doomed.await.unwrap(), Err(EngineError::Superseded));
        assert_eq!(kept.await.unwrap(), Ok(()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_element_ignores_prefix_collisions() {
        let orch = orchestrator(3);

        let spawn_schedule = |id: &'static str| {
            let orch = Arc::clone(&orch);
            tokio::spawn(async move {
                orch.schedule(id, Duration::from_millis(50), || async {
                    Ok::<(), EngineError>(())
                })
                .await
            })
        };
        // "el-1" is a prefix of "el-11" and also appears in the other id's
        // text portion; neither may be cancelled.
        let doomed = spawn_schedule("grammar:el-1:text");
        let longer = spawn_schedule("grammar:el-11:text");
        let text_hit = spawn_schedule("grammar:el-2:mentions el-1 here");
        tokio::time::sleep(Duration::from_millis(10)).await;

        orch.cancel_element("el-1");

        assert_eq!(doomed.await.unwrap(), Err(EngineError::Superseded));
        assert_eq!(longer.await.unwrap(), Ok(()));
        assert_eq!(text_hit.await.unwrap(), Ok(()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrency_cap_holds_across_threads() {
        let orch = Arc::new(RequestOrchestrator::new(1, Duration::from_millis(5)));
        let gauge = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for i in 0..8 {
            let orch = Arc::clone(&orch);
            let gauge = Arc::clone(&gauge);
            let peak = Arc::clone(&peak);
            handles.push(tokio::spawn(async move {
                orch.execute(&format!("req-{}", i), move || async move {
                    let now = gauge.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    gauge.fetch_sub(1, Ordering::SeqCst);
                    Ok::<(), EngineError>(())
                })
                .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_request_id_truncates_text() {
        let long = "x".repeat(200);
        let id = RequestOrchestrator::request_id("grammar", "el-1", &long);
        assert_eq!(id.len(), "grammar:el-1:".len() + 50);
    }
}
