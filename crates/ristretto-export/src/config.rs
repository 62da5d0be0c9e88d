use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_TASK_TIMEOUT_MS: u64 = 60_000;
pub const DEFAULT_QUALITY: u8 = 90;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    /// Upper bound on encoder threads. `None` uses every available core.
    pub max_workers: Option<usize>,
    /// Per-task reply deadline. `None` waits forever.
    pub task_timeout_ms: Option<u64>,
    /// JPEG quality, 0-100.
    pub quality: u8,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            max_workers: None,
            task_timeout_ms: Some(DEFAULT_TASK_TIMEOUT_MS),
            quality: DEFAULT_QUALITY,
        }
    }
}

impl ExportConfig {
    pub fn task_timeout(&self) -> Option<Duration> {
        self.task_timeout_ms.map(Duration::from_millis)
    }

    /// Worker count for a batch of `jobs` buffers.
    ///
    /// - never more workers than jobs or available cores
    /// - `max_workers` can constrain down, not up
    pub fn pool_size(&self, jobs: usize) -> usize {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let size = cores.min(jobs);
        self.max_workers
            .map(|n| n.min(size))
            .unwrap_or(size)
            .max(1)
    }
}
