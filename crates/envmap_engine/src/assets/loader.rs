//! Background asset loading
//!
//! A small pool of named worker threads pulls boxed jobs from a crossbeam
//! channel. Each job reports through its own one-shot channel, wrapped in a
//! [`LoadTask`] that the main thread polls once per frame. Dropping a task
//! cancels it: a job that has not started is skipped and a finished result
//! is discarded.

use std::thread;
use std::time::Duration;

use crossbeam::channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender, TryRecvError};

use super::AssetError;
use crate::foundation::frame_loop::CancellationToken;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Outcome of polling a [`LoadTask`]
#[derive(Debug)]
pub enum LoadStatus<T> {
    /// Still queued or running
    Pending,
    /// Finished; the result has been handed over
    Ready(Result<T, AssetError>),
    /// Cancelled, abandoned by the pool, or already consumed
    Cancelled,
}

/// Handle to a load running on the pool
#[derive(Debug)]
pub struct LoadTask<T> {
    label: String,
    receiver: Option<Receiver<Result<T, AssetError>>>,
    token: CancellationToken,
}

impl<T> LoadTask<T> {
    /// Name given when the load was spawned
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Check for a result without blocking
    pub fn poll(&mut self) -> LoadStatus<T> {
        self.receive(|receiver| match receiver.try_recv() {
            Ok(result) => Some(Ok(result)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(())),
        })
    }

    /// Block for up to `timeout` waiting for a result
    pub fn wait_timeout(&mut self, timeout: Duration) -> LoadStatus<T> {
        self.receive(|receiver| match receiver.recv_timeout(timeout) {
            Ok(result) => Some(Ok(result)),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(())),
        })
    }

    /// Stop the load; any result it produces is discarded
    pub fn cancel(&mut self) {
        self.token.cancel();
        self.receiver = None;
    }

    /// Whether the task has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    fn receive<F>(&mut self, attempt: F) -> LoadStatus<T>
    where
        F: FnOnce(&Receiver<Result<T, AssetError>>) -> Option<Result<Result<T, AssetError>, ()>>,
    {
        if self.token.is_cancelled() {
            self.receiver = None;
            return LoadStatus::Cancelled;
        }
        let Some(receiver) = self.receiver.as_ref() else {
            return LoadStatus::Cancelled;
        };

        match attempt(receiver) {
            None => LoadStatus::Pending,
            Some(Ok(result)) => {
                self.receiver = None;
                LoadStatus::Ready(result)
            }
            Some(Err(())) => {
                log::warn!("Load '{}' was abandoned before it finished", self.label);
                self.receiver = None;
                LoadStatus::Cancelled
            }
        }
    }
}

impl<T> Drop for LoadTask<T> {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Fixed-size pool of asset loading threads
pub struct AssetLoader {
    workers: Vec<thread::JoinHandle<()>>,
    sender: Option<Sender<Job>>,
}

impl AssetLoader {
    /// Start `worker_count` loader threads (at least one is attempted)
    pub fn new(worker_count: usize) -> Self {
        let (sender, receiver) = unbounded::<Job>();
        let mut workers = Vec::with_capacity(worker_count.max(1));

        for id in 0..worker_count.max(1) {
            let receiver = receiver.clone();
            let spawned = thread::Builder::new()
                .name(format!("asset-worker-{id}"))
                .spawn(move || {
                    while let Ok(job) = receiver.recv() {
                        job();
                    }
                    log::trace!("Asset worker {} shutting down", id);
                });

            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => log::error!("Failed to start asset worker {}: {}", id, e),
            }
        }

        log::debug!("Asset loader started with {} workers", workers.len());
        Self {
            workers,
            sender: Some(sender),
        }
    }

    /// Number of running worker threads
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Queue `job` and return a task to poll for its result.
    ///
    /// The job receives the task's cancellation token and should check it
    /// between expensive steps. Without any worker threads the job runs on
    /// the calling thread.
    pub fn spawn<T, F>(&self, label: impl Into<String>, job: F) -> LoadTask<T>
    where
        T: Send + 'static,
        F: FnOnce(&CancellationToken) -> Result<T, AssetError> + Send + 'static,
    {
        let label = label.into();
        let token = CancellationToken::new();
        let (result_sender, result_receiver) = bounded(1);

        let job_token = token.clone();
        let job_label = label.clone();
        let run: Job = Box::new(move || {
            if job_token.is_cancelled() {
                log::debug!("Skipping cancelled load '{}'", job_label);
                return;
            }

            let result = job(&job_token);

            if job_token.is_cancelled() {
                log::debug!("Discarding result of cancelled load '{}'", job_label);
                return;
            }
            // The task may have been dropped in the meantime
            let _ = result_sender.send(result);
        });

        match &self.sender {
            Some(sender) if !self.workers.is_empty() => {
                if sender.send(run).is_err() {
                    log::warn!("Asset loader is shut down, load '{}' will not run", label);
                }
            }
            _ => run(),
        }

        LoadTask {
            label,
            receiver: Some(result_receiver),
            token,
        }
    }
}

impl Drop for AssetLoader {
    fn drop(&mut self) {
        // Closing the channel ends every worker loop once the queue drains
        self.sender = None;
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                log::error!("Asset worker panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn test_result_arrives_through_poll() {
        let loader = AssetLoader::new(2);
        let mut task = loader.spawn("answer", |_| Ok(42));

        match task.wait_timeout(WAIT) {
            LoadStatus::Ready(Ok(value)) => assert_eq!(value, 42),
            other => panic!("unexpected status {other:?}"),
        }
        // A consumed task has nothing more to give
        assert!(matches!(task.poll(), LoadStatus::Cancelled));
    }

    #[test]
    fn test_errors_are_delivered() {
        let loader = AssetLoader::new(1);
        let mut task = loader.spawn::<(), _>("missing", |_| {
            Err(AssetError::NotFound { path: PathBuf::from("missing.gltf") })
        });
        assert!(matches!(task.wait_timeout(WAIT), LoadStatus::Ready(Err(AssetError::NotFound { .. }))));
    }

    #[test]
    fn test_pending_until_job_finishes() {
        let loader = AssetLoader::new(1);
        let (release, gate) = bounded::<()>(0);
        let mut task = loader.spawn("gated", move |_| {
            gate.recv().ok();
            Ok("done")
        });

        assert!(matches!(task.poll(), LoadStatus::Pending));
        release.send(()).unwrap();
        assert!(matches!(task.wait_timeout(WAIT), LoadStatus::Ready(Ok("done"))));
    }

    #[test]
    fn test_dropped_task_is_skipped() {
        let loader = AssetLoader::new(1);
        let ran = Arc::new(AtomicUsize::new(0));

        // Occupy the only worker so the second job stays queued
        let (release, gate) = bounded::<()>(0);
        let mut blocker = loader.spawn("blocker", move |_| {
            gate.recv().ok();
            Ok(())
        });

        let counter = Arc::clone(&ran);
        let queued = loader.spawn("queued", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        drop(queued);

        release.send(()).unwrap();
        assert!(matches!(blocker.wait_timeout(WAIT), LoadStatus::Ready(Ok(()))));
        drop(loader);
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_cancel_discards_result() {
        let loader = AssetLoader::new(1);
        let mut task = loader.spawn("cancelled", |_| Ok(1));
        task.cancel();
        assert!(task.is_cancelled());
        assert!(matches!(task.wait_timeout(Duration::from_millis(50)), LoadStatus::Cancelled));
    }

    #[test]
    fn test_zero_workers_still_starts_one() {
        let loader = AssetLoader::new(0);
        assert_eq!(loader.worker_count(), 1);
        let mut task = loader.spawn("single", |_| Ok(7));
        assert!(matches!(task.wait_timeout(WAIT), LoadStatus::Ready(Ok(7))));
    }
}
