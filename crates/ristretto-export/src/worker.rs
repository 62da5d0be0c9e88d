use std::io;
use std::sync::{Arc, mpsc};
use std::thread::{self, JoinHandle};

use tokio::sync::mpsc as async_mpsc;
use tracing::debug;

use crate::encoder::{EncodeJob, Encoder};
use crate::error::ExportError;

pub(crate) enum WorkerMessage {
    Encode(EncodeJob),
    Terminate,
}

/// Encoder output for one task. The payload travels back so the exporter
/// can return it to its buffer pool.
pub(crate) struct Reply {
    pub index: usize,
    pub result: Result<Vec<u8>, ExportError>,
    pub payload: Vec<u8>,
}

/// Handle to one export thread. Dropping `tx` without a `Terminate` also
/// stops the worker once its queue is empty.
pub(crate) struct Worker {
    pub id: usize,
    pub tx: mpsc::Sender<WorkerMessage>,
    pub handle: JoinHandle<()>,
}

impl Worker {
    pub fn spawn(
        id: usize,
        encoder: Arc<dyn Encoder>,
        replies: async_mpsc::UnboundedSender<Reply>,
    ) -> io::Result<Self> {
        let (tx, rx) = mpsc::channel::<WorkerMessage>();
        let handle = thread::Builder::new()
            .name(format!("export-{id}"))
            .spawn(move || {
                while let Ok(msg) = rx.recv() {
                    let job = match msg {
                        WorkerMessage::Encode(job) => job,
                        WorkerMessage::Terminate => break,
                    };
                    debug!(worker = id, index = job.index, "encoding");
                    let result = encoder.encode(&job).map_err(|e| ExportError::EncodeFailed {
                        index: job.index,
                        reason: e.to_string(),
                    });
                    let reply = Reply {
                        index: job.index,
                        result,
                        payload: job.pixels,
                    };
                    if replies.send(reply).is_err() {
                        // Collector gave up on this worker (timeout); keep
                        // draining so a later Terminate is still seen.
                        debug!(worker = id, "reply dropped");
                    }
                }
                debug!(worker = id, "worker exiting");
            })?;
        Ok(Self { id, tx, handle })
    }
}
