use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::Debug;
use std::hash::Hash;
use std::path::Path;

use anyhow::{Context, Result};
use image::DynamicImage;
use tracing::{debug, info, warn};

use crate::error::DecodeError;
use crate::image_buf::{BitDepth, PixelBuffer};

/// Deferred decode step producing a pixel buffer.
pub type DecodeTask = Box<dyn FnOnce() -> Result<PixelBuffer> + Send>;

/// Lazy decode scheduler.
///
/// Tasks are queued up front and only run when their image becomes visible
/// (`drain_visible`) or an edit needs it right away (`request`). Decoded
/// buffers stay cached until taken.
pub struct DecodeQueue<K> {
    pending: HashMap<K, DecodeTask>,
    order: VecDeque<K>,
    visible: HashSet<K>,
    decoded: HashMap<K, PixelBuffer>,
}

impl<K: Eq + Hash + Clone + Debug> DecodeQueue<K> {
    pub fn new() -> Self {
        Self {
            pending: HashMap::new(),
            order: VecDeque::new(),
            visible: HashSet::new(),
            decoded: HashMap::new(),
        }
    }

    /// Queue a decode for `key`, replacing any pending task or cached result.
    pub fn enqueue<F>(&mut self, key: K, task: F)
    where
        F: FnOnce() -> Result<PixelBuffer> + Send + 'static,
    {
        self.decoded.remove(&key);
        if self.pending.insert(key.clone(), Box::new(task)).is_none() {
            self.order.push_back(key);
        }
    }

    /// Returns whether a task is pending for `key`.
    pub fn mark_visible(&mut self, key: &K) -> bool {
        if self.pending.contains_key(key) {
            self.visible.insert(key.clone());
            true
        } else {
            false
        }
    }

    pub fn is_visible(&self, key: &K) -> bool {
        self.visible.contains(key)
    }

    /// Decode `key` now if it has not been decoded yet.
    pub fn request(&mut self, key: &K) -> Result<&PixelBuffer, DecodeError> {
        if !self.decoded.contains_key(key) {
            let task = self
                .pending
                .remove(key)
                .ok_or_else(|| DecodeError::NotQueued(format!("{key:?}")))?;
            self.order.retain(|k| k != key);
            self.visible.remove(key);
            let buf = run_task(key, task)?;
            self.decoded.insert(key.clone(), buf);
        }
        self.decoded
            .get(key)
            .ok_or_else(|| DecodeError::NotQueued(format!("{key:?}")))
    }

    /// Run every visible pending task in enqueue order. A failed decode is
    /// reported in its slot and the drain continues.
    pub fn drain_visible(&mut self) -> Vec<Result<K, DecodeError>> {
        let (ready, waiting): (VecDeque<K>, VecDeque<K>) = self
            .order
            .drain(..)
            .partition(|k| self.visible.contains(k));
        self.order = waiting;

        let mut outcomes = Vec::with_capacity(ready.len());
        for key in ready {
            self.visible.remove(&key);
            let Some(task) = self.pending.remove(&key) else {
                continue;
            };
            match run_task(&key, task) {
                Ok(buf) => {
                    self.decoded.insert(key.clone(), buf);
                    outcomes.push(Ok(key));
                }
                Err(err) => outcomes.push(Err(err)),
            }
        }
        outcomes
    }

    pub fn get(&self, key: &K) -> Option<&PixelBuffer> {
        self.decoded.get(key)
    }

    pub fn take(&mut self, key: &K) -> Option<PixelBuffer> {
        self.decoded.remove(key)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

impl<K: Eq + Hash + Clone + Debug> Default for DecodeQueue<K> {
    fn default() -> Self {
        Self::new()
    }
}

fn run_task<K: Debug>(key: &K, task: DecodeTask) -> Result<PixelBuffer, DecodeError> {
    debug!(?key, "decoding");
    task().map_err(|err| {
        warn!(?key, error = %err, "decode failed");
        DecodeError::Failed {
            key: format!("{key:?}"),
            reason: format!("{err:#}"),
        }
    })
}

/// Decode an image file into a gray, RGB or RGBA buffer, keeping 16-bit
/// sources at 16 bits.
pub fn load_image(path: &Path) -> Result<PixelBuffer> {
    info!(?path, "loading image file");
    let t0 = std::time::Instant::now();
    let img =
        image::open(path).with_context(|| format!("failed to open image: {}", path.display()))?;
    let (width, height) = (img.width(), img.height());
    debug!(
        elapsed_ms = t0.elapsed().as_millis(),
        width,
        height,
        color = ?img.color(),
        "image decode"
    );

    let buf = match img {
        DynamicImage::ImageLuma8(i) => PixelBuffer::from_u8(width, height, 1, i.as_raw()),
        DynamicImage::ImageRgb8(i) => PixelBuffer::from_u8(width, height, 3, i.as_raw()),
        DynamicImage::ImageRgba8(i) => PixelBuffer::from_u8(width, height, 4, i.as_raw()),
        DynamicImage::ImageLuma16(i) => {
            PixelBuffer::new(width, height, 1, BitDepth::Sixteen, i.into_raw())
        }
        DynamicImage::ImageRgb16(i) => {
            PixelBuffer::new(width, height, 3, BitDepth::Sixteen, i.into_raw())
        }
        DynamicImage::ImageRgba16(i) => {
            PixelBuffer::new(width, height, 4, BitDepth::Sixteen, i.into_raw())
        }
        other => {
            let color = other.color();
            let wide = color.bytes_per_pixel() / color.channel_count() > 1;
            match (wide, color.has_alpha()) {
                (false, false) => PixelBuffer::from_u8(width, height, 3, other.into_rgb8().as_raw()),
                (false, true) => PixelBuffer::from_u8(width, height, 4, other.into_rgba8().as_raw()),
                (true, false) => PixelBuffer::new(
                    width,
                    height,
                    3,
                    BitDepth::Sixteen,
                    other.into_rgb16().into_raw(),
                ),
                (true, true) => PixelBuffer::new(
                    width,
                    height,
                    4,
                    BitDepth::Sixteen,
                    other.into_rgba16().into_raw(),
                ),
            }
        }
    };
    buf.with_context(|| format!("unusable pixel data in {}", path.display()))
}
