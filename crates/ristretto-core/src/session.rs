use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::PipelineError;
use crate::history::UndoStack;
use crate::image_buf::PixelBuffer;
use crate::pipeline::{EditGraph, EditNode, NodeRegistry};

/// Snapshot of the node list after one user action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub label: String,
    pub nodes: Vec<EditNode>,
}

impl HistoryEntry {
    fn opened() -> Self {
        Self {
            label: "open".to_string(),
            nodes: Vec::new(),
        }
    }
}

/// Everything needed to resume a session against the same original.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub history: Vec<HistoryEntry>,
    pub cursor: Option<usize>,
    #[serde(default)]
    pub current_buffer: Option<PixelBuffer>,
}

/// One image being edited: the pristine original, the live graph, the
/// undo history and the last resolved buffer. Not shared across threads.
#[derive(Debug)]
pub struct EditSession {
    original: PixelBuffer,
    graph: EditGraph,
    history: UndoStack<HistoryEntry>,
    current: PixelBuffer,
}

impl EditSession {
    pub fn new(original: PixelBuffer) -> Self {
        Self::with_history(original, UndoStack::new())
    }

    /// Session whose history keeps at most `limit` entries.
    pub fn with_history_limit(original: PixelBuffer, limit: usize) -> Self {
        Self::with_history(original, UndoStack::with_limit(limit))
    }

    fn with_history(original: PixelBuffer, mut history: UndoStack<HistoryEntry>) -> Self {
        history.push(HistoryEntry::opened());
        Self {
            current: original.clone(),
            original,
            graph: EditGraph::new(),
            history,
        }
    }

    /// Rebuild a session from saved state. The graph is replayed from the
    /// entry under the cursor; a saved `current_buffer` is trusted as is.
    pub fn restore(original: PixelBuffer, state: SessionState) -> Result<Self> {
        let history = UndoStack::from_parts(state.history, state.cursor)
            .context("saved history is inconsistent")?;
        let mut session = Self {
            current: original.clone(),
            original,
            graph: EditGraph::new(),
            history,
        };
        if session.history.is_empty() {
            session.history.push(HistoryEntry::opened());
        }
        session.checkout()?;
        if let Some(buf) = state.current_buffer {
            session.current = buf;
        }
        Ok(session)
    }

    pub fn original(&self) -> &PixelBuffer {
        &self.original
    }

    pub fn current(&self) -> &PixelBuffer {
        &self.current
    }

    pub fn graph(&self) -> &EditGraph {
        &self.graph
    }

    pub fn history(&self) -> &UndoStack<HistoryEntry> {
        &self.history
    }

    /// Register custom node handlers before applying nodes that use them.
    pub fn registry_mut(&mut self) -> &mut NodeRegistry {
        self.graph.registry_mut()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Append `node` and re-resolve. On error the session is left exactly
    /// as it was.
    pub fn apply(&mut self, node: EditNode) -> Result<&PixelBuffer, PipelineError> {
        let mut candidate = self.graph.clone();
        let label = node.name().to_string();
        candidate.add_node(node);
        let resolved = candidate.resolve(&self.original)?;

        self.history.push(HistoryEntry {
            label,
            nodes: candidate.nodes().to_vec(),
        });
        self.graph = candidate;
        self.current = resolved;
        debug!(entries = self.history.len(), "applied edit");
        Ok(&self.current)
    }

    pub fn undo(&mut self) -> Result<&PixelBuffer, PipelineError> {
        if self.history.can_undo() {
            self.history.undo();
            if let Err(err) = self.checkout() {
                self.history.redo();
                return Err(err);
            }
        }
        Ok(&self.current)
    }

    pub fn redo(&mut self) -> Result<&PixelBuffer, PipelineError> {
        if self.history.can_redo() {
            self.history.redo();
            if let Err(err) = self.checkout() {
                self.history.undo();
                return Err(err);
            }
        }
        Ok(&self.current)
    }

    /// Drop every edit and start over from the original.
    pub fn reset(&mut self) {
        self.graph.reset();
        self.history.reset();
        self.history.push(HistoryEntry::opened());
        self.current = self.original.clone();
    }

    pub fn state(&self) -> SessionState {
        SessionState {
            history: self.history.entries().to_vec(),
            cursor: self.history.cursor(),
            current_buffer: Some(self.current.clone()),
        }
    }

    /// Replace the graph with the entry under the cursor and re-resolve.
    fn checkout(&mut self) -> Result<(), PipelineError> {
        let mut graph = self.graph.clone();
        graph.reset();
        if let Some(entry) = self.history.current() {
            for node in &entry.nodes {
                graph.add_node(node.clone());
            }
        }
        self.current = graph.resolve(&self.original)?;
        self.graph = graph;
        Ok(())
    }
}

/// Opaque key/value persistence for serialized sessions.
pub trait SessionStore {
    fn put(&mut self, key: &str, value: &[u8]) -> Result<()>;
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
}

/// In-process store, mostly for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn put(&mut self, key: &str, value: &[u8]) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.get(key).cloned())
    }
}

pub fn save<S: SessionStore + ?Sized>(store: &mut S, key: &str, state: &SessionState) -> Result<()> {
    let bytes = serde_json::to_vec(state).context("failed to serialize session")?;
    store
        .put(key, &bytes)
        .with_context(|| format!("failed to store session {key}"))?;
    info!(key, entries = state.history.len(), bytes = bytes.len(), "saved session");
    Ok(())
}

pub fn load<S: SessionStore + ?Sized>(store: &S, key: &str) -> Result<Option<SessionState>> {
    let Some(bytes) = store
        .get(key)
        .with_context(|| format!("failed to read session {key}"))?
    else {
        return Ok(None);
    };
    let state = serde_json::from_slice(&bytes)
        .with_context(|| format!("corrupt session data for {key}"))?;
    Ok(Some(state))
}
