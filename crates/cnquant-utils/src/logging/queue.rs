//! Background delivery of log records.
//!
//! Records are pushed onto an unbounded channel and handed to the handlers
//! by a dedicated listener thread, so slow handlers (email, network file
//! systems) never block the caller. Records pushed before the listener starts
//! are buffered.

use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::error::{Error, Result};

use super::handler::Handler;
use super::record::LogRecord;
use super::dispatch;

#[derive(Debug)]
enum QueueItem {
    Record(LogRecord),
    Stop,
}

type Receiver = UnboundedReceiver<QueueItem>;

/// Channel plus the listener thread draining it.
#[derive(Debug)]
pub(crate) struct QueueListener {
    sender: UnboundedSender<QueueItem>,
    handlers: Arc<Vec<Box<dyn Handler>>>,
    idle: Mutex<Option<Receiver>>,
    worker: Mutex<Option<JoinHandle<Receiver>>>,
}

impl QueueListener {
    pub(crate) fn new(handlers: Arc<Vec<Box<dyn Handler>>>) -> Self {
        let (sender, receiver) = unbounded_channel();
        Self {
            sender,
            handlers,
            idle: Mutex::new(Some(receiver)),
            worker: Mutex::new(None),
        }
    }

    pub(crate) fn push(&self, record: LogRecord) {
        // The receiver lives as long as `self`, so sending cannot fail.
        let _ = self.sender.send(QueueItem::Record(record));
    }

    pub(crate) fn is_running(&self) -> bool {
        self.worker.lock().map(|w| w.is_some()).unwrap_or(false)
    }

    /// Start the listener thread. Starting a running listener is a no-op.
    pub(crate) fn start(&self, name: &str) -> Result<()> {
        let mut worker = self
            .worker
            .lock()
            .map_err(|_| Error::internal("log queue lock poisoned"))?;
        if worker.is_some() {
            return Ok(());
        }
        let mut receiver = self
            .idle
            .lock()
            .map_err(|_| Error::internal("log queue lock poisoned"))?
            .take()
            .ok_or_else(|| Error::internal("log queue receiver missing"))?;

        let handlers = Arc::clone(&self.handlers);
        let handle = std::thread::Builder::new()
            .name(format!("log-{name}"))
            .spawn(move || {
                while let Some(item) = receiver.blocking_recv() {
                    match item {
                        QueueItem::Record(record) => dispatch(&handlers, &record),
                        QueueItem::Stop => break,
                    }
                }
                receiver
            })?;
        *worker = Some(handle);
        Ok(())
    }

    /// Deliver everything queued so far, then stop the thread.
    pub(crate) fn stop(&self) -> Result<()> {
        let mut worker = self
            .worker
            .lock()
            .map_err(|_| Error::internal("log queue lock poisoned"))?;
        let Some(handle) = worker.take() else {
            return Ok(());
        };
        let _ = self.sender.send(QueueItem::Stop);
        let receiver = handle
            .join()
            .map_err(|_| Error::internal("log listener thread panicked"))?;
        *self
            .idle
            .lock()
            .map_err(|_| Error::internal("log queue lock poisoned"))? = Some(receiver);
        Ok(())
    }
}

impl Drop for QueueListener {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
