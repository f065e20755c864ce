use futures::stream::{self, StreamExt};
use std::future::Future;

/// Runs `work` over every item with at most `workers` in flight at once.
///
/// Each item's result is returned independently, in input order, so one failing
/// item never cancels its siblings.
pub async fn run_bounded<T, R, F, Fut>(items: Vec<T>, workers: usize, mut work: F) -> Vec<R>
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = R>,
{
    let mut results: Vec<(usize, R)> = stream::iter(items.into_iter().enumerate())
        .map(|(index, item)| {
            let pending = work(item);
            async move { (index, pending.await) }
        })
        .buffer_unordered(workers.max(1))
        .collect()
        .await;
    results.sort_by_key(|(index, _)| *index);
    results.into_iter().map(|(_, result)| result).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_results_keep_input_order_and_errors_stay_isolated() {
        let results = run_bounded((0..20).collect(), 4, |n: u64| async move {
            tokio::time::sleep(Duration::from_millis(20 - n)).await;
            if n % 5 == 0 { Err(n) } else { Ok(n * 2) }
        })
        .await;

        assert_eq!(results.len(), 20);
        assert_eq!(results[0], Err(0));
        assert_eq!(results[1], Ok(2));
        assert_eq!(results[19], Ok(38));
        assert_eq!(results.iter().filter(|r| r.is_err()).count(), 4);
    }

    #[tokio::test]
    async fn test_never_exceeds_worker_limit() {
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);

        run_bounded((0..50).collect::<Vec<u32>>(), 3, |_| {
            let (in_flight, peak) = (&in_flight, &peak);
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::task::yield_now().await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }
        })
        .await;

        assert_eq!(peak.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_zero_workers_still_makes_progress() {
        let results = run_bounded(vec![1, 2, 3], 0, |n: i32| async move { n }).await;
        assert_eq!(results, vec![1, 2, 3]);
    }
}
