//! Bounded worker pool for asynchronous augmentation
//!
//! Fixed number of named worker threads fed by a bounded crossbeam channel.
//! Submitting blocks while the queue is full. A panicking job is logged and
//! the worker keeps serving.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use crossbeam::channel::{bounded, Receiver, Sender};

use crate::error::DispatchError;

/// Unit of work run on a worker thread
pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// Cloneable handle for queueing jobs
#[derive(Debug, Clone)]
pub(crate) struct Submitter {
    sender: Sender<Job>,
}

impl Submitter {
    /// Queue a job, blocking while the queue is full
    ///
    /// # Errors
    /// Returns [`DispatchError::Shutdown`] if every worker has exited
    pub(crate) fn submit(&self, job: Job) -> Result<(), DispatchError> {
        self.sender.send(job).map_err(|_| DispatchError::Shutdown)
    }
}

/// Fixed-size pool of worker threads
#[derive(Debug)]
pub(crate) struct WorkerPool {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `threads` workers sharing a queue of `capacity` jobs
    ///
    /// # Errors
    /// Returns [`DispatchError::Spawn`] if a thread cannot be created
    pub(crate) fn start(name: &str, threads: usize, capacity: usize) -> Result<Self, DispatchError> {
        let (sender, receiver) = bounded::<Job>(capacity.max(1));
        let mut pool = Self {
            sender: Some(sender),
            workers: Vec::with_capacity(threads),
        };
        for i in 0..threads.max(1) {
            let receiver = receiver.clone();
            let handle = thread::Builder::new()
                .name(format!("{name}-{i}"))
                .spawn(move || worker_loop(&receiver))
                .map_err(DispatchError::Spawn)?;
            pool.workers.push(handle);
        }
        tracing::debug!("Started {} augmentation worker(s)", pool.workers.len());
        Ok(pool)
    }

    /// Handle for queueing jobs, `None` once shut down
    pub(crate) fn submitter(&self) -> Option<Submitter> {
        self.sender.as_ref().map(|sender| Submitter {
            sender: sender.clone(),
        })
    }

    /// Close the queue and wait for workers to drain it
    ///
    /// Outstanding [`Submitter`] clones keep the queue open until dropped.
    /// When called from one of the pool's own workers that worker is not
    /// joined.
    pub(crate) fn shutdown(&mut self) {
        if self.sender.take().is_none() {
            return;
        }
        let current = thread::current().id();
        for handle in self.workers.drain(..) {
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                tracing::warn!("Augmentation worker exited abnormally");
            }
        }
        tracing::debug!("Augmentation workers stopped");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(receiver: &Receiver<Job>) {
    while let Ok(job) = receiver.recv() {
        if catch_unwind(AssertUnwindSafe(job)).is_err() {
            tracing::error!("Augmentation job panicked");
        }
    }
}
