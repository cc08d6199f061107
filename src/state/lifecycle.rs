//! Cooperative teardown signal
//!
//! A [`Teardown`] is owned by whatever mounts a view or session. Background
//! tasks hold a [`TeardownSignal`] and stop once it fires.

use std::sync::Arc;

use tokio::sync::watch;

/// Owner side of a teardown signal; fires on [`Teardown::fire`] or drop
#[derive(Debug)]
pub struct Teardown {
    tx: watch::Sender<bool>,
}

/// Observer side of a teardown signal
#[derive(Debug, Clone)]
pub struct TeardownSignal {
    rx: watch::Receiver<bool>,
    _owner: Option<Arc<watch::Sender<bool>>>,
}

impl Teardown {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    pub fn signal(&self) -> TeardownSignal {
        TeardownSignal { rx: self.tx.subscribe(), _owner: None }
    }

    pub fn fire(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_fired(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for Teardown {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Teardown {
    fn drop(&mut self) {
        self.tx.send_replace(true);
    }
}

impl TeardownSignal {
    /// A signal that never fires
    pub fn never() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { rx, _owner: Some(Arc::new(tx)) }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once the owner fired or went away
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}
