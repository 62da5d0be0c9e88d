use crate::error::HistoryError;

/// Linear undo/redo history: an arena of snapshots plus a cursor.
///
/// ```text
///   entries: [s0, s1, s2, s3]      push(s4) after two undos:
///                  ^ cursor        [s0, s1, s4]   (s2, s3 pruned)
/// ```
///
/// Undo/redo at either end is a no-op, not an error.
#[derive(Clone, Debug, PartialEq)]
pub struct UndoStack<T> {
    entries: Vec<T>,
    cursor: Option<usize>,
    limit: Option<usize>,
}

impl<T> UndoStack<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            cursor: None,
            limit: None,
        }
    }

    /// Keep at most `limit` entries (minimum 1); the oldest are evicted first.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit.max(1)),
            ..Self::new()
        }
    }

    /// Rebuild a stack from persisted parts. `cursor` must index into
    /// `entries`, and must be `None` exactly when `entries` is empty.
    pub fn from_parts(entries: Vec<T>, cursor: Option<usize>) -> Result<Self, HistoryError> {
        match cursor {
            Some(c) if c >= entries.len() => {
                return Err(HistoryError::CursorOutOfRange {
                    cursor: c,
                    len: entries.len(),
                });
            }
            None if !entries.is_empty() => {
                return Err(HistoryError::CursorOutOfRange {
                    cursor: 0,
                    len: entries.len(),
                });
            }
            _ => {}
        }
        Ok(Self {
            entries,
            cursor,
            limit: None,
        })
    }

    /// Drop everything after the cursor, then append `state` as the new current entry.
    pub fn push(&mut self, state: T) {
        let keep = self.cursor.map_or(0, |c| c + 1);
        self.entries.truncate(keep);
        self.entries.push(state);

        if let Some(limit) = self.limit {
            if self.entries.len() > limit {
                let excess = self.entries.len() - limit;
                self.entries.drain(..excess);
            }
        }
        self.cursor = Some(self.entries.len() - 1);
    }

    /// Step back one entry and return it; returns the current entry unchanged at the start.
    pub fn undo(&mut self) -> Option<&T> {
        if let Some(c) = self.cursor {
            if c > 0 {
                self.cursor = Some(c - 1);
            }
        }
        self.current()
    }

    /// Step forward one entry and return it; returns the current entry unchanged at the end.
    pub fn redo(&mut self) -> Option<&T> {
        if let Some(c) = self.cursor {
            if c + 1 < self.entries.len() {
                self.cursor = Some(c + 1);
            }
        }
        self.current()
    }

    pub fn current(&self) -> Option<&T> {
        self.cursor.map(|c| &self.entries[c])
    }

    pub fn reset(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|c| c > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.cursor.is_some_and(|c| c + 1 < self.entries.len())
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn entries(&self) -> &[T] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for UndoStack<T> {
    fn default() -> Self {
        Self::new()
    }
}
