//! Detached task execution.
//!
//! Work that must outlive its caller goes through a [`TaskSpawner`]: the
//! identity lookup at startup and every API request, which keeps running
//! even when the HTTP client disconnects.

use std::future::Future;

/// Runs futures detached from the caller.
///
/// The caller gets no handle; results come back over channels the future
/// owns.
pub trait TaskSpawner: Send + Sync {
    fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

/// Spawner bound to the Tokio runtime the services were built on.
#[derive(Clone)]
pub struct TokioSpawner {
    handle: tokio::runtime::Handle,
}

impl TokioSpawner {
    /// Captures the current runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime context.
    #[must_use]
    pub fn current() -> Self {
        Self {
            handle: tokio::runtime::Handle::current(),
        }
    }
}

impl TaskSpawner for TokioSpawner {
    fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.handle.spawn(future);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn spawned_work_outlives_its_caller() {
        let spawner = TokioSpawner::current();
        let (tx, rx) = tokio::sync::oneshot::channel();

        let caller = async {
            spawner.spawn(async move {
                tokio::time::sleep(Duration::from_millis(200)).await;
                let _ = tx.send("done");
            });
            std::future::pending::<()>().await;
        };
        assert!(tokio::time::timeout(Duration::from_millis(10), caller)
            .await
            .is_err());

        assert_eq!(rx.await.unwrap(), "done");
    }
}
