use std::sync::Arc;
use std::time::Duration;

use ristretto_core::PixelBuffer;
use ristretto_core::buffer_pool::{BufferPool, PoolStats};
use tokio::sync::mpsc as async_mpsc;
use tokio::task::JoinSet;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use crate::config::ExportConfig;
use crate::encoder::{EncodeJob, Encoder, JpegEncoder};
use crate::error::ExportError;
use crate::worker::{Reply, Worker, WorkerMessage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub index: usize,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

pub type EncodedResult = Result<EncodedImage, ExportError>;

type TaskOutcome = Result<Vec<u8>, ExportError>;

/// Encodes batches of buffers on a short-lived pool of worker threads.
///
/// ```text
///            ┌─ worker 0 ── buffers 0, n, 2n ... ─┐
/// buffers ───┼─ worker 1 ── buffers 1, n+1 ...  ──┼─> results, input order
///            └─ worker n-1 ...                   ─┘
/// ```
///
/// Workers are plain threads so a blocking codec never starves the async
/// runtime. Each worker reports over its own channel and a collector task
/// awaits those replies with the configured per-task timeout.
pub struct Exporter {
    config: ExportConfig,
    encoder: Arc<dyn Encoder>,
    pool: BufferPool<u8>,
}

impl Exporter {
    pub fn new(config: ExportConfig) -> Self {
        Self::with_encoder(config, JpegEncoder)
    }

    pub fn with_encoder(config: ExportConfig, encoder: impl Encoder + 'static) -> Self {
        Self {
            config,
            encoder: Arc::new(encoder),
            pool: BufferPool::new(),
        }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Encode every buffer, returning one result per input in input order.
    /// Failures, timeouts and lost workers are reported per slot; the rest
    /// of the batch always completes.
    pub async fn export_batch(&mut self, buffers: &[PixelBuffer], quality: u8) -> Vec<EncodedResult> {
        if buffers.is_empty() {
            return Vec::new();
        }
        let n = buffers.len();
        let quality = quality.min(100);
        let size = self.config.pool_size(n);
        let timeout = self.config.task_timeout();
        let started = std::time::Instant::now();
        info!(images = n, workers = size, quality, "starting export batch");

        // Quantize before any collector deadline starts.
        let mut queues: Vec<Vec<EncodeJob>> = (0..size).map(|_| Vec::new()).collect();
        for (index, buffer) in buffers.iter().enumerate() {
            let mut pixels = self.pool.acquire(buffer.samples().len());
            buffer.write_u8(&mut pixels);
            queues[index % size].push(EncodeJob {
                index,
                width: buffer.width(),
                height: buffer.height(),
                channels: buffer.channels(),
                pixels,
                quality,
            });
        }

        let mut settled: Vec<Option<TaskOutcome>> = (0..n).map(|_| None).collect();
        let mut workers: Vec<Option<Worker>> = Vec::with_capacity(size);
        let mut collectors = JoinSet::new();

        for (id, jobs) in queues.into_iter().enumerate() {
            let assigned: Vec<usize> = jobs.iter().map(|job| job.index).collect();
            let (reply_tx, reply_rx) = async_mpsc::unbounded_channel();
            let worker = match Worker::spawn(id, Arc::clone(&self.encoder), reply_tx) {
                Ok(worker) => worker,
                Err(err) => {
                    warn!(worker = id, error = %err, "failed to spawn export worker");
                    for job in jobs {
                        let index = job.index;
                        settled[index] = Some(Err(ExportError::WorkerLost { index }));
                        self.pool.release(job.pixels);
                    }
                    workers.push(None);
                    continue;
                }
            };

            for job in jobs {
                let index = job.index;
                if let Err(rejected) = worker.tx.send(WorkerMessage::Encode(job)) {
                    if let WorkerMessage::Encode(job) = rejected.0 {
                        self.pool.release(job.pixels);
                    }
                    settled[index] = Some(Err(ExportError::WorkerLost { index }));
                }
            }
            // Deadlines run from here, once the worker has its whole queue.
            collectors.spawn(collect(id, assigned, reply_rx, timeout));
            workers.push(Some(worker));
        }

        let mut stalled = vec![false; size];
        while let Some(joined) = collectors.join_next().await {
            let collected = match joined {
                Ok(collected) => collected,
                Err(err) => {
                    warn!(error = %err, "export collector failed");
                    continue;
                }
            };
            stalled[collected.worker] = collected.stalled;
            for payload in collected.payloads {
                self.pool.release(payload);
            }
            for (index, outcome) in collected.outcomes {
                if settled[index].is_none() {
                    settled[index] = Some(outcome);
                }
            }
        }

        shutdown(workers, &stalled).await;

        let results: Vec<EncodedResult> = settled
            .into_iter()
            .enumerate()
            .map(|(index, outcome)| {
                let outcome = outcome.unwrap_or(Err(ExportError::WorkerLost { index }));
                outcome.map(|bytes| EncodedImage {
                    index,
                    width: buffers[index].width(),
                    height: buffers[index].height(),
                    bytes,
                })
            })
            .collect();

        let failed = results.iter().filter(|r| r.is_err()).count();
        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            warn!(index = err.index(), error = %err, "export task failed");
        }
        info!(
            images = n,
            failed,
            elapsed_ms = started.elapsed().as_millis(),
            "export batch finished"
        );
        results
    }
}

struct Collected {
    worker: usize,
    outcomes: Vec<(usize, TaskOutcome)>,
    payloads: Vec<Vec<u8>>,
    stalled: bool,
}

/// Await one worker's replies in assignment order, giving each task up to
/// `timeout` from the moment the previous one settled.
///
/// A timeout stalls the worker: it is still busy in the codec, so every task
/// left in its queue is reported as timed out right away instead of waiting
/// out its own deadline. A hung codec therefore costs at most one timeout per
/// worker, however many tasks were assigned to it.
async fn collect(
    worker: usize,
    assigned: Vec<usize>,
    mut replies: async_mpsc::UnboundedReceiver<Reply>,
    timeout: Option<Duration>,
) -> Collected {
    let mut collected = Collected {
        worker,
        outcomes: Vec::with_capacity(assigned.len()),
        payloads: Vec::with_capacity(assigned.len()),
        stalled: false,
    };

    let mut queue = assigned.into_iter();
    'tasks: while let Some(index) = queue.next() {
        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            let next = match deadline {
                Some(deadline) => match time::timeout_at(deadline, replies.recv()).await {
                    Ok(next) => next,
                    Err(_) => {
                        let after_ms = timeout.map_or(0, |t| t.as_millis() as u64);
                        warn!(worker, index, after_ms, "export task timed out");
                        for index in std::iter::once(index).chain(queue.by_ref()) {
                            collected
                                .outcomes
                                .push((index, Err(ExportError::Timeout { index, after_ms })));
                        }
                        collected.stalled = true;
                        return collected;
                    }
                },
                None => replies.recv().await,
            };

            let Some(reply) = next else {
                warn!(worker, index, "export worker disappeared");
                for index in std::iter::once(index).chain(queue.by_ref()) {
                    collected
                        .outcomes
                        .push((index, Err(ExportError::WorkerLost { index })));
                }
                return collected;
            };

            collected.payloads.push(reply.payload);
            if reply.index == index {
                debug!(worker, index, "export task settled");
                collected.outcomes.push((index, reply.result));
                continue 'tasks;
            }
            debug!(worker, index = reply.index, "dropping stray reply");
        }
    }
    collected
}

/// Send every worker a terminate message and drop its channel, then join
/// the responsive ones. Workers still stuck in a timed-out task are
/// detached; they exit on their own once the codec returns.
async fn shutdown(workers: Vec<Option<Worker>>, stalled: &[bool]) {
    let mut joinable = Vec::new();
    for worker in workers.into_iter().flatten() {
        let _ = worker.tx.send(WorkerMessage::Terminate);
        drop(worker.tx);
        if stalled[worker.id] {
            warn!(worker = worker.id, "detaching stalled export worker");
        } else {
            joinable.push((worker.id, worker.handle));
        }
    }
    if joinable.is_empty() {
        return;
    }

    let joined = tokio::task::spawn_blocking(move || {
        for (id, handle) in joinable {
            if handle.join().is_err() {
                warn!(worker = id, "export worker panicked");
            }
        }
    })
    .await;
    if let Err(err) = joined {
        warn!(error = %err, "failed to join export workers");
    }
}
