//! Order-preserving result queue.
//!
//! Walkers finish in whatever order the filesystem allows; output must
//! follow the order paths were supplied. The queue is an index-addressed
//! array of slots plus a cursor: any worker fills its own slot, a single
//! consumer drains slots in ascending index, waiting whenever the next
//! slot is still empty.

use parking_lot::Mutex;
use tokio::sync::Notify;

enum Slot<T> {
    Empty,
    Filled(T),
    Consumed,
}

struct Inner<T> {
    slots: Vec<Slot<T>>,
    cursor: usize,
}

/// Fixed-capacity reorder buffer: filled by any worker, drained in index
/// order by one consumer.
pub struct OrderedQueue<T> {
    inner: Mutex<Inner<T>>,
    notify: Notify,
}

impl<T> OrderedQueue<T> {
    /// Queue with one slot per expected result.
    pub fn new(capacity: usize) -> OrderedQueue<T> {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || Slot::Empty);
        OrderedQueue {
            inner: Mutex::new(Inner { slots, cursor: 0 }),
            notify: Notify::new(),
        }
    }

    /// Fill slot `index` and wake the consumer.
    ///
    /// Each index is filled exactly once; filling a slot twice is a bug in
    /// the caller.
    pub fn add(&self, index: usize, value: T) {
        {
            let mut inner = self.inner.lock();
            let slot = &mut inner.slots[index];
            assert!(
                matches!(slot, Slot::Empty),
                "queue slot {index} filled twice"
            );
            *slot = Slot::Filled(value);
        }
        self.notify.notify_waiters();
    }

    /// Yield the next result in index order, waiting until it is ready.
    /// Returns `None` once every slot has been consumed.
    pub async fn next(&self) -> Option<T> {
        loop {
            // Register for a wakeup before checking, so an add() between
            // the check and the await cannot be lost.
            let notified = self.notify.notified();
            {
                let mut inner = self.inner.lock();
                let cursor = inner.cursor;
                if cursor == inner.slots.len() {
                    return None;
                }
                let slot = &mut inner.slots[cursor];
                if matches!(slot, Slot::Filled(_)) {
                    let value = match std::mem::replace(slot, Slot::Consumed) {
                        Slot::Filled(value) => value,
                        _ => unreachable!(),
                    };
                    inner.cursor += 1;
                    return Some(value);
                }
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn yields_in_index_order() {
        let queue = OrderedQueue::new(3);
        queue.add(2, "c");
        queue.add(0, "a");
        queue.add(1, "b");

        assert_eq!(queue.next().await, Some("a"));
        assert_eq!(queue.next().await, Some("b"));
        assert_eq!(queue.next().await, Some("c"));
        assert_eq!(queue.next().await, None);
    }

    #[tokio::test]
    async fn empty_queue_is_immediately_done() {
        let queue: OrderedQueue<()> = OrderedQueue::new(0);
        assert_eq!(queue.next().await, None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn next_waits_for_the_cursor_slot() {
        let queue = Arc::new(OrderedQueue::new(2));

        let producer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move {
                // Later slot first: the consumer must keep waiting.
                queue.add(1, "late");
                tokio::time::sleep(Duration::from_millis(20)).await;
                queue.add(0, "early");
            })
        };

        assert_eq!(queue.next().await, Some("early"));
        assert_eq!(queue.next().await, Some("late"));
        producer.await.unwrap();
    }

    #[tokio::test]
    async fn errors_occupy_slots_without_ending_the_stream() {
        let queue: OrderedQueue<Result<u32, String>> = OrderedQueue::new(3);
        queue.add(0, Ok(1));
        queue.add(1, Err("missing".to_string()));
        queue.add(2, Ok(3));

        assert_eq!(queue.next().await, Some(Ok(1)));
        assert_eq!(queue.next().await, Some(Err("missing".to_string())));
        assert_eq!(queue.next().await, Some(Ok(3)));
        assert_eq!(queue.next().await, None);
    }

    #[test]
    #[should_panic(expected = "filled twice")]
    fn double_fill_panics() {
        let queue = OrderedQueue::new(1);
        queue.add(0, 1u8);
        queue.add(0, 2u8);
    }
}
