//! Join-all fan-out over scoped threads.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

/// Run `f` over every item concurrently and collect all results in input order.
///
/// With `limit = None` every item gets its own worker. With `Some(n)`, at
/// most `n` workers run, each pulling the next unclaimed index. Nothing
/// short-circuits: the call returns only after every item has been
/// processed. A panic inside `f` is re-raised once all workers are joined.
pub fn gather<T, R, F>(items: &[T], limit: Option<usize>, f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
{
    if items.is_empty() {
        return Vec::new();
    }

    let workers = limit.unwrap_or(items.len()).clamp(1, items.len());
    let next = &AtomicUsize::new(0);
    let f = &f;

    let per_worker: Vec<thread::Result<Vec<(usize, R)>>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                scope.spawn(move || {
                    let mut done = Vec::new();
                    loop {
                        let i = next.fetch_add(1, Ordering::Relaxed);
                        if i >= items.len() {
                            break;
                        }
                        done.push((i, f(&items[i])));
                    }
                    done
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join()).collect()
    });

    let mut slots: Vec<Option<R>> = items.iter().map(|_| None).collect();
    for worker in per_worker {
        match worker {
            Ok(done) => {
                for (i, r) in done {
                    slots[i] = Some(r);
                }
            }
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    slots.into_iter().flatten().collect()
}
