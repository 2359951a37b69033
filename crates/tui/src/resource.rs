//! The Loading / Success / Error state every data-bearing screen binds to.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq)]
pub enum ResourceState<T, E> {
    Loading,
    Success(T),
    Error(E),
}

impl<T, E> ResourceState<T, E> {
    pub fn is_loading(&self) -> bool {
        matches!(self, ResourceState::Loading)
    }
}

/// A stream of load requests where only the latest request's outcome is ever
/// observed. Cloning yields another handle to the same stream.
pub struct AsyncResource<T, E> {
    state: Arc<watch::Sender<ResourceState<T, E>>>,
    generation: Arc<AtomicU64>,
}

impl<T, E> Clone for AsyncResource<T, E> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            generation: Arc::clone(&self.generation),
        }
    }
}

impl<T, E> Default for AsyncResource<T, E>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> AsyncResource<T, E>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    pub fn new() -> Self {
        let (tx, _) = watch::channel(ResourceState::Loading);
        Self {
            state: Arc::new(tx),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Switches to `Loading` before returning, then runs `load` on the tokio
    /// runtime. Its outcome is dropped if another `start` happened meanwhile;
    /// the superseded load itself keeps running to completion.
    pub fn start<F>(&self, load: F)
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
    {
        let mut request = 0;
        self.state.send_modify(|state| {
            request = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *state = ResourceState::Loading;
        });

        let state = Arc::clone(&self.state);
        let generation = Arc::clone(&self.generation);
        tokio::spawn(async move {
            let outcome = load.await;
            let applied = state.send_if_modified(|current| {
                if generation.load(Ordering::SeqCst) != request {
                    return false;
                }
                *current = match outcome {
                    Ok(value) => ResourceState::Success(value),
                    Err(e) => ResourceState::Error(e),
                };
                true
            });
            if !applied {
                tracing::debug!("Dropped superseded load {}", request);
            }
        });
    }

    pub fn subscribe(&self) -> watch::Receiver<ResourceState<T, E>> {
        self.state.subscribe()
    }

    pub fn borrow(&self) -> watch::Ref<'_, ResourceState<T, E>> {
        self.state.borrow()
    }
}

impl<T, E> AsyncResource<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn snapshot(&self) -> ResourceState<T, E> {
        self.state.borrow().clone()
    }

    /// Waits until the latest request has produced an outcome.
    pub async fn settled(&self) -> ResourceState<T, E> {
        let mut rx = self.subscribe();
        loop {
            {
                let current = rx.borrow_and_update();
                if !current.is_loading() {
                    return current.clone();
                }
            }
            if rx.changed().await.is_err() {
                return self.snapshot();
            }
        }
    }
}
