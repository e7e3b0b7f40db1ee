//! Bounded concurrent dispatch of per-item operations

use futures::stream::{self, StreamExt};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

use crate::error::{Result, SceneTextError};

/// Default number of operations in flight
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Runs an async operation over many inputs with a fixed concurrency limit
///
/// Results come back in input order, not completion order. Each slot holds
/// its own result, so one failing input does not affect the others.
#[derive(Debug, Clone, Copy)]
pub struct BatchDispatcher {
    concurrency: usize,
    task_timeout: Option<Duration>,
}

impl Default for BatchDispatcher {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            task_timeout: None,
        }
    }
}

impl BatchDispatcher {
    /// Create a dispatcher running at most `concurrency` operations at once
    pub fn new(concurrency: usize) -> Result<Self> {
        if concurrency == 0 {
            return Err(SceneTextError::Config(
                "batch concurrency must be at least 1".into(),
            ));
        }
        Ok(Self {
            concurrency,
            task_timeout: None,
        })
    }

    /// Fail any single operation that runs longer than `timeout`
    pub fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = Some(timeout);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn task_timeout(&self) -> Option<Duration> {
        self.task_timeout
    }

    /// Apply `op` to every input and collect the results in input order
    pub async fn run<I, T, F, Fut>(
        &self,
        inputs: impl IntoIterator<Item = I>,
        op: F,
    ) -> Vec<Result<T>>
    where
        F: Fn(I) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let task_timeout = self.task_timeout;

        stream::iter(inputs.into_iter().enumerate().map(|(index, input)| {
            let task = op(input);
            async move {
                let result = match task_timeout {
                    Some(limit) => tokio::time::timeout(limit, task)
                        .await
                        .unwrap_or_else(|_| Err(SceneTextError::Timeout(limit))),
                    None => task.await,
                };
                if let Err(ref e) = result {
                    debug!("Batch task {} failed: {}", index, e);
                }
                result
            }
        }))
        .buffered(self.concurrency)
        .collect()
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_run_preserves_input_order() {
        let dispatcher = BatchDispatcher::new(4).unwrap();
        // Earlier inputs sleep longer so they complete last
        let results = dispatcher
            .run(0..6u64, |i| async move {
                tokio::time::sleep(Duration::from_millis((6 - i) * 5)).await;
                Ok(i * 10)
            })
            .await;

        let values: Vec<u64> = results.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(values, vec![0, 10, 20, 30, 40, 50]);
    }

    #[tokio::test]
    async fn test_run_isolates_failures() {
        let dispatcher = BatchDispatcher::default();
        let results = dispatcher
            .run(["a", "fail", "c"], |input| async move {
                if input == "fail" {
                    Err(SceneTextError::Status {
                        status: 503,
                        body: "unavailable".into(),
                    })
                } else {
                    Ok(input.to_uppercase())
                }
            })
            .await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap(), "A");
        assert!(matches!(results[1], Err(SceneTextError::Status { status: 503, .. })));
        assert_eq!(results[2].as_ref().unwrap(), "C");
    }

    #[tokio::test]
    async fn test_run_respects_concurrency_limit() {
        let dispatcher = BatchDispatcher::new(2).unwrap();
        let in_flight = &AtomicUsize::new(0);
        let peak = &AtomicUsize::new(0);

        let results = dispatcher
            .run(0..8, |_| async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            })
            .await;

        assert_eq!(results.len(), 8);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_run_task_timeout() {
        let dispatcher = BatchDispatcher::new(2)
            .unwrap()
            .with_task_timeout(Duration::from_millis(20));
        let results = dispatcher
            .run([1u64, 500], |ms| async move {
                tokio::time::sleep(Duration::from_millis(ms)).await;
                Ok(ms)
            })
            .await;

        assert_eq!(*results[0].as_ref().unwrap(), 1);
        assert!(matches!(results[1], Err(SceneTextError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_run_empty_input() {
        let results: Vec<Result<()>> = BatchDispatcher::default()
            .run(Vec::<u32>::new(), |_| async { Ok(()) })
            .await;
        assert!(results.is_empty());
    }

    #[test]
    fn test_new_rejects_zero_concurrency() {
        assert!(matches!(
            BatchDispatcher::new(0),
            Err(SceneTextError::Config(_))
        ));
        assert_eq!(BatchDispatcher::default().concurrency(), DEFAULT_CONCURRENCY);
    }
}
