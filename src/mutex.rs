//! FIFO exclusive lock for multi-statement writes.
//!
//! The pool never serializes unrelated `query` calls on its own. Code that issues several
//! dependent writes (an insert followed by an update that reads its id, an explicit
//! `BEGIN ... COMMIT`) wraps the whole sequence in [`WriteMutex::run_exclusive`].

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::oneshot;

#[derive(Debug, Default)]
struct LockState {
    locked: bool,
    waiters: VecDeque<oneshot::Sender<()>>,
}

/// Asynchronous exclusive lock granting access strictly in request order.
///
/// Cloning yields another handle to the same lock.
#[derive(Debug, Clone, Default)]
pub struct WriteMutex {
    state: Arc<Mutex<LockState>>,
}

/// Releases the lock on drop, so a failing or cancelled task still hands over to the next one.
struct Permit<'a> {
    mutex: &'a WriteMutex,
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        self.mutex.release();
    }
}

impl WriteMutex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, LockState> {
        // state updates are single assignments; a poisoned guard still holds consistent data
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Run `task` once every earlier caller's task has finished.
    ///
    /// Resolves with the task's own output; an `Err` returned by the task reaches this caller
    /// only, and the next queued task still runs.
    pub async fn run_exclusive<F, Fut, T>(&self, task: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _permit = self.acquire().await;
        task().await
    }

    /// Same as [`run_exclusive`](Self::run_exclusive) for a synchronous task body.
    pub async fn run_exclusive_sync<F, T>(&self, task: F) -> T
    where
        F: FnOnce() -> T,
    {
        let _permit = self.acquire().await;
        task()
    }

    async fn acquire(&self) -> Permit<'_> {
        let rx = {
            let mut state = self.state();
            if !state.locked {
                state.locked = true;
                return Permit { mutex: self };
            }
            let (tx, rx) = oneshot::channel();
            state.waiters.push_back(tx);
            rx
        };
        let mut waiter = Waiter {
            mutex: self,
            rx: Some(rx),
        };
        if let Some(rx) = waiter.rx.as_mut() {
            // `release` always sends before dropping a popped sender
            let _ = rx.await;
        }
        waiter.rx = None;
        Permit { mutex: self }
    }

    fn release(&self) {
        let mut state = self.state();
        while let Some(next) = state.waiters.pop_front() {
            if next.send(()).is_ok() {
                // ownership moves to `next`; `locked` stays set
                return;
            }
        }
        state.locked = false;
    }

    /// True while a task body holds the lock.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.state().locked
    }

    /// Number of tasks waiting for the lock, not counting the one running.
    #[must_use]
    pub fn queue_length(&self) -> usize {
        self.state()
            .waiters
            .iter()
            .filter(|tx| !tx.is_closed())
            .count()
    }
}

/// A queued acquisition. Dropped before completing, it passes on a hand-off that already
/// arrived instead of keeping the lock forever.
struct Waiter<'a> {
    mutex: &'a WriteMutex,
    rx: Option<oneshot::Receiver<()>>,
}

impl Drop for Waiter<'_> {
    fn drop(&mut self) {
        if let Some(mut rx) = self.rx.take() {
            rx.close();
            if rx.try_recv().is_ok() {
                self.mutex.release();
            }
        }
    }
}
