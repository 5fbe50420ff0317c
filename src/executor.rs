/*!
The worker pool that runs remote calls off the caller's context. A pool is created once per
process, handed to every connector that needs it, and shut down explicitly when the host stops.
*/
use crate::error::{create_error, ProvideErrorDetails};
use log::{info, warn};
use snafu::{ensure, IntoError, ResultExt, Snafu};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;

const WORKER_THREAD_NAME: &str = "aws-mpm-worker";

/// A bounded pool of worker threads backed by a multi-threaded tokio runtime.
#[derive(Debug)]
pub struct WorkerPool {
    runtime: Runtime,
    worker_threads: usize,
}

impl WorkerPool {
    pub const DEFAULT_WORKER_THREADS: usize = 4;

    /// Starts a pool with `worker_threads` threads.
    pub fn new(worker_threads: usize) -> crate::Result<Self> {
        ensure!(worker_threads > 0, ZeroWorkers);
        let runtime = Builder::new_multi_thread()
            .worker_threads(worker_threads)
            .thread_name(WORKER_THREAD_NAME)
            .enable_all()
            .build()
            .context(StartRuntime)?;
        info!("Started worker pool with {} threads", worker_threads);
        Ok(Self {
            runtime,
            worker_threads,
        })
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    /// A cheap handle for submitting work to this pool.
    pub fn handle(&self) -> WorkerHandle {
        WorkerHandle(self.runtime.handle().clone())
    }

    pub fn spawn<F, T>(&self, task: F) -> Pending<T>
    where
        F: Future<Output = crate::Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        self.handle().spawn(task)
    }

    /// Blocks the calling thread until `future` completes. For synchronous hosts; must not be
    /// called from inside an async context.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Stops the pool, waiting up to `timeout` for running calls to finish.
    pub fn shutdown(self, timeout: Duration) {
        info!("Shutting down worker pool");
        self.runtime.shutdown_timeout(timeout);
    }
}

/// Submits work to a [`WorkerPool`]. Calls submitted after the pool shuts down resolve to an
/// error.
#[derive(Debug, Clone)]
pub struct WorkerHandle(Handle);

impl WorkerHandle {
    pub fn spawn<F, T>(&self, task: F) -> Pending<T>
    where
        F: Future<Output = crate::Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        Pending {
            state: State::Running(self.0.spawn(task)),
        }
    }
}

/// The eventual result of a call submitted to a [`WorkerPool`].
///
/// Like any future, it must not be polled again once it has returned `Poll::Ready`; a completed
/// call that was resolved before reaching the pool panics if it is.
#[must_use = "a pending call does nothing unless awaited"]
#[derive(Debug)]
pub struct Pending<T> {
    state: State<T>,
}

#[derive(Debug)]
enum State<T> {
    Ready(Option<crate::Result<T>>),
    Running(JoinHandle<crate::Result<T>>),
}

impl<T> Pending<T> {
    /// A call that completed before reaching the pool.
    pub(crate) fn ready(result: crate::Result<T>) -> Self {
        Pending {
            state: State::Ready(Some(result)),
        }
    }
}

// the output is moved out, never pinned
impl<T> Unpin for Pending<T> {}

impl<T> Future for Pending<T> {
    type Output = crate::Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().state {
            State::Ready(result) => match result.take() {
                Some(result) => Poll::Ready(result),
                None => panic!("`Pending` polled after completion"),
            },
            State::Running(handle) => Pin::new(handle).poll(cx).map(|joined| match joined {
                Ok(result) => result,
                Err(e) => {
                    warn!("Worker task did not complete: {}", e);
                    Err(WorkerTask.into_error(e).into())
                }
            }),
        }
    }
}

/// The error type for this module.
#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("Failed to start worker pool: {}", source))]
    StartRuntime { source: std::io::Error },

    #[snafu(display("Worker task did not complete: {}", source))]
    WorkerTask { source: tokio::task::JoinError },

    #[snafu(display("Worker pool needs at least one thread"))]
    ZeroWorkers,
}

impl ProvideErrorDetails for Error {}

impl From<Error> for crate::Error {
    fn from(e: Error) -> Self {
        create_error(e.to_string(), e)
    }
}
