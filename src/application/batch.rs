use std::future::Future;

use thiserror::Error;
use tracing::warn;

/// How many items are processed at once
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub concurrent_batch_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrent_batch_size: 16,
        }
    }
}

impl BatchConfig {
    pub fn new(concurrent_batch_size: usize) -> Self {
        Self {
            concurrent_batch_size: concurrent_batch_size.max(1),
        }
    }
}

/// An item and what processing it produced
#[derive(Debug)]
pub struct BatchItemResult<T, R = ()> {
    pub item: T,
    pub result: R,
}

/// The task processing an item panicked or was cancelled
#[derive(Debug, Error)]
#[error("Batch task failed: {0}")]
pub struct BatchTaskError(#[from] tokio::task::JoinError);

/// Runs independent per-item work (typically one file each) on spawned tasks,
/// a chunk at a time.
///
/// Every item comes back, in input order. A panicking task yields a
/// `BatchTaskError` for its item; the others are unaffected.
///
/// # Examples
///
/// ```rust,ignore
/// let results = BatchProcessor::process_concurrent(
///     paths,
///     &BatchConfig::new(8),
///     |path| async move { tokio::fs::read(&path).await },
/// )
/// .await;
/// ```
pub struct BatchProcessor;

impl BatchProcessor {
    pub async fn process_concurrent<F, Fut, T, R>(
        items: Vec<T>,
        config: &BatchConfig,
        processor: F,
    ) -> Vec<BatchItemResult<T, Result<R, BatchTaskError>>>
    where
        F: Fn(T) -> Fut + Send + Sync + Clone + 'static,
        Fut: Future<Output = R> + Send + 'static,
        T: Send + 'static + Clone,
        R: Send + 'static,
    {
        let mut results = Vec::with_capacity(items.len());

        for chunk in items.chunks(config.concurrent_batch_size.max(1)) {
            let chunk_results = Self::process_chunk(chunk.to_vec(), processor.clone()).await;
            results.extend(chunk_results);
        }

        results
    }

    async fn process_chunk<F, Fut, T, R>(
        chunk: Vec<T>,
        processor: F,
    ) -> Vec<BatchItemResult<T, Result<R, BatchTaskError>>>
    where
        F: Fn(T) -> Fut + Send + Sync + Clone + 'static,
        Fut: Future<Output = R> + Send + 'static,
        T: Send + 'static + Clone,
        R: Send + 'static,
    {
        let mut handles = Vec::with_capacity(chunk.len());

        for item in chunk {
            let processor = processor.clone();
            let task = tokio::spawn(processor(item.clone()));
            handles.push((item, task));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (item, handle) in handles {
            let result = handle.await.map_err(|e| {
                warn!("Batch processing task panicked: {}", e);
                BatchTaskError::from(e)
            });
            results.push(BatchItemResult { item, result });
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_process_concurrent_visits_every_item() {
        let counter = Arc::new(AtomicUsize::new(0));
        let items: Vec<u32> = (0..37).collect();

        let processor = {
            let counter = Arc::clone(&counter);
            move |item: u32| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    item * 2
                }
            }
        };

        let results = BatchProcessor::process_concurrent(items, &BatchConfig::new(5), processor).await;

        assert_eq!(results.len(), 37);
        assert_eq!(counter.load(Ordering::SeqCst), 37);
        // Input order is preserved
        assert!(results
            .iter()
            .enumerate()
            .all(|(i, r)| r.item == i as u32 && *r.result.as_ref().unwrap() == r.item * 2));
    }

    #[tokio::test]
    async fn test_failures_stay_with_their_item() {
        let items = vec!["a.slj", "broken.slj", "c.slj"];
        let processor = |name: &'static str| async move {
            if name.starts_with("broken") {
                Err(format!("cannot decode {}", name))
            } else {
                Ok(name.len())
            }
        };

        let results = BatchProcessor::process_concurrent(items, &BatchConfig::default(), processor).await;
        let failed: Vec<_> = results
            .iter()
            .filter(|r| matches!(r.result, Ok(Err(_))))
            .map(|r| r.item)
            .collect();
        assert_eq!(failed, vec!["broken.slj"]);
        assert_eq!(results.iter().filter(|r| matches!(r.result, Ok(Ok(_)))).count(), 2);
    }

    #[tokio::test]
    async fn test_panicking_task_keeps_its_item() {
        let items = vec![1u32, 2, 3];
        let processor = |item: u32| async move {
            if item == 2 {
                panic!("decoder blew up on {}", item);
            }
            item
        };

        let results = BatchProcessor::process_concurrent(items, &BatchConfig::new(3), processor).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[1].item, 2);
        assert!(results[1].result.is_err());
        assert_eq!(*results[0].result.as_ref().unwrap(), 1);
        assert_eq!(*results[2].result.as_ref().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let results =
            BatchProcessor::process_concurrent(Vec::<u8>::new(), &BatchConfig::default(), |_| async {}).await;
        assert!(results.is_empty());
    }

    #[test]
    fn test_zero_batch_size_is_clamped() {
        assert_eq!(BatchConfig::new(0).concurrent_batch_size, 1);
    }
}
