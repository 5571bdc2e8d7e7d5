//! Line replacements pushed by an external process.
//!
//! The producer may live on any thread and only ever holds a
//! [`LineSyncSender`]. Batches queue in a channel until the document's owner
//! calls [`Document::pump_line_sync`](crate::editing::Document::pump_line_sync),
//! so nothing outside the owner thread touches lines or anchors.

use std::collections::BTreeMap;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

/// Replacement text keyed by row
pub type LineUpdates = BTreeMap<usize, String>;

#[derive(Debug, thiserror::Error)]
#[error("document no longer accepts line updates")]
pub struct LineSyncClosed;

/// Producer side of a document's line-sync channel
#[derive(Clone, Debug)]
pub struct LineSyncSender {
    tx: Sender<LineUpdates>,
}

impl LineSyncSender {
    /// Queue a batch. Fails once the document has been dropped.
    pub fn send(&self, updates: LineUpdates) -> Result<(), LineSyncClosed> {
        self.tx.send(updates).map_err(|_| LineSyncClosed)
    }
}

/// Channel owned by the document
#[derive(Debug)]
pub(crate) struct LineSync {
    tx: Sender<LineUpdates>,
    rx: Receiver<LineUpdates>,
}

impl LineSync {
    pub(crate) fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    pub(crate) fn sender(&self) -> LineSyncSender {
        LineSyncSender {
            tx: self.tx.clone(),
        }
    }

    /// Every batch queued so far, oldest first
    pub(crate) fn drain(&self) -> Vec<LineUpdates> {
        let mut batches = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(batch) => batches.push(batch),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        batches
    }
}
