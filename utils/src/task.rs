//! Supervised worker threads.
//!
//! A [`SupervisedTask`] owns a named thread and an error channel. The task body either returns
//! `Ok(())`, returns an error, or panics; the latter two are reported to whoever owns the task
//! instead of being lost inside the thread.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, TryRecvError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaskError<E> {
    #[error("task failed: {0}")]
    Failed(E),

    #[error("task panicked: {0}")]
    Panicked(String),
}

pub struct SupervisedTask<E> {
    name: String,
    handle: Option<JoinHandle<()>>,
    errors: Receiver<TaskError<E>>,
}

impl<E: std::fmt::Display + Send + 'static> SupervisedTask<E> {
    pub fn spawn<F>(name: impl Into<String>, body: F) -> std::io::Result<Self>
    where
        F: FnOnce() -> Result<(), E> + Send + 'static,
    {
        let name = name.into();
        let (sender, errors) = bounded(1);
        let thread_name = name.clone();
        let handle = thread::Builder::new().name(name.clone()).spawn(move || {
            let failure = match panic::catch_unwind(AssertUnwindSafe(body)) {
                Ok(Ok(())) => return,
                Ok(Err(err)) => TaskError::Failed(err),
                Err(payload) => TaskError::Panicked(panic_message(payload)),
            };
            tracing::error!(task = %thread_name, "supervised task terminated: {}", failure);
            // The owner may already be gone; nothing else to do with the error then.
            let _ = sender.send(failure);
        })?;

        Ok(Self { name, handle: Some(handle), errors })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The error channel, for callers that want to `select!` on task failure
    pub fn errors(&self) -> &Receiver<TaskError<E>> {
        &self.errors
    }

    /// Returns the failure if the task has already terminated with one
    pub fn try_error(&self) -> Option<TaskError<E>> {
        match self.errors.try_recv() {
            Ok(err) => Some(err),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Waits for the task to finish and surfaces its failure, if any
    pub fn join(mut self) -> Result<(), TaskError<E>> {
        if let Some(handle) = self.handle.take() {
            // Panics were already caught inside the thread body
            let _ = handle.join();
        }
        match self.errors.try_recv() {
            Ok(err) => Err(err),
            Err(_) => Ok(()),
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
