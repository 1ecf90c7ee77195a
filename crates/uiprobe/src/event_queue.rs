//! UI event queue
//!
//! Widget toolkits only allow mutation from one dedicated thread. The
//! [`EventQueue`] owns such a thread and runs submitted jobs on it in FIFO
//! order. Callers either fire and forget ([`EventQueue::invoke_later`]) or
//! block until their job has run ([`EventQueue::invoke_and_wait`]).

use crate::result::{ProbeError, ProbeResult};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle, ThreadId};

/// Default name of the event thread
pub const DEFAULT_EVENT_THREAD_NAME: &str = "uiprobe-event-thread";

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Single-threaded job queue standing in for a toolkit's event thread
#[derive(Debug)]
pub struct EventQueue {
    name: String,
    sender: Option<Sender<Job>>,
    thread_id: ThreadId,
    handle: Option<JoinHandle<()>>,
}

impl EventQueue {
    /// Spawn an event thread with the default name
    pub fn new() -> ProbeResult<Self> {
        Self::with_name(DEFAULT_EVENT_THREAD_NAME)
    }

    /// Spawn an event thread with a custom name
    pub fn with_name(name: impl Into<String>) -> ProbeResult<Self> {
        let name = name.into();
        let (sender, receiver) = mpsc::channel::<Job>();

        let handle = thread::Builder::new().name(name.clone()).spawn(move || {
            for job in receiver {
                // A panicking job must not take the event thread down with it.
                if catch_unwind(AssertUnwindSafe(job)).is_err() {
                    tracing::warn!("job panicked on the UI event thread");
                }
            }
            tracing::debug!("UI event thread drained, exiting");
        })?;

        Ok(Self {
            name,
            sender: Some(sender),
            thread_id: handle.thread().id(),
            handle: Some(handle),
        })
    }

    /// Name of the event thread
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the caller is running on the event thread
    #[must_use]
    pub fn is_event_thread(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// Whether the queue still accepts jobs
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.sender.is_some()
    }

    /// Enqueue a job without waiting for it
    pub fn invoke_later<F>(&self, job: F) -> ProbeResult<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| ProbeError::dispatch(format!("{} has shut down", self.name)))?;
        sender
            .send(Box::new(job))
            .map_err(|_| ProbeError::dispatch(format!("{} has shut down", self.name)))
    }

    /// Enqueue a job and block until it has run, returning its value.
    ///
    /// Called from the event thread itself, the job runs inline.
    pub fn invoke_and_wait<T, F>(&self, job: F) -> ProbeResult<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        if self.is_event_thread() {
            return Ok(job());
        }

        let (done_tx, done_rx) = mpsc::sync_channel(1);
        self.invoke_later(move || {
            let _ = done_tx.send(job());
        })?;

        // The sender is dropped without a value only if the job panicked.
        done_rx
            .recv()
            .map_err(|_| ProbeError::dispatch(format!("job did not complete on {}", self.name)))
    }

    /// Stop accepting jobs, drain the queue and join the thread
    pub fn shutdown(&mut self) {
        self.sender.take();
        if self.is_event_thread() {
            return;
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!(thread = %self.name, "UI event thread terminated abnormally");
            }
        }
    }
}

impl Drop for EventQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}
