//! Reactive in-memory store
//!
//! Each service owns its stores. Subscribers receive every published
//! value through a `tokio::sync::watch` receiver.

use std::sync::Arc;

use tokio::sync::watch;

/// A single published value with change notification.
///
/// Clones share the same value.
#[derive(Debug)]
pub struct Store<T> {
    tx: Arc<watch::Sender<T>>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self { tx: Arc::clone(&self.tx) }
    }
}

impl<T: Clone> Store<T> {
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Snapshot of the current value
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Replace the value and notify subscribers
    pub fn set(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// Mutate the value in place and notify subscribers
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut T),
    {
        self.tx.send_modify(f);
    }

    /// Read without cloning
    pub fn with<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&self.tx.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl<T: Clone + Default> Default for Store<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_see_updates() {
        let store = Store::new(Vec::<u32>::new());
        let mut rx = store.subscribe();

        store.update(|items| items.push(1));
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), vec![1]);

        store.set(vec![7, 8]);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), vec![7, 8]);
        assert_eq!(store.get(), vec![7, 8]);
    }

    #[test]
    fn test_publish_without_subscribers() {
        let store: Store<u64> = Store::default();
        store.set(3);
        store.update(|count| *count += 1);
        assert_eq!(store.get(), 4);
        assert_eq!(store.with(|count| *count * 2), 8);
        assert_eq!(store.subscriber_count(), 0);
    }
}
