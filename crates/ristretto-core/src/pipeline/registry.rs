use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::error::PipelineError;
use crate::image_buf::PixelBuffer;
use crate::pipeline::modules;

/// Named scalar parameters of a custom node.
pub type NodeParams = BTreeMap<String, f32>;

/// A transform reachable through [`EditNode::Custom`](crate::pipeline::EditNode::Custom).
pub trait NodeHandler: Send + Sync {
    fn name(&self) -> &str;
    fn apply(&self, input: &PixelBuffer, params: &NodeParams) -> Result<PixelBuffer, PipelineError>;
}

/// Handler table owned by an edit graph. Created with the graph and dropped
/// with it; there is no process-wide registry.
#[derive(Clone, Default)]
pub struct NodeRegistry {
    handlers: HashMap<String, Arc<dyn NodeHandler>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(modules::Saturation);
        registry
    }

    /// Add a handler under its own name, returning the one it replaced.
    pub fn register(&mut self, handler: impl NodeHandler + 'static) -> Option<Arc<dyn NodeHandler>> {
        let name = handler.name().to_string();
        self.handlers.insert(name, Arc::new(handler))
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn NodeHandler>> {
        self.handlers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub(crate) fn dispatch(
        &self,
        name: &str,
        input: &PixelBuffer,
        params: &NodeParams,
    ) -> Result<PixelBuffer, PipelineError> {
        let handler = self
            .get(name)
            .ok_or_else(|| PipelineError::UnknownNode(name.to_string()))?;
        handler.apply(input, params)
    }
}

impl fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRegistry")
            .field("handlers", &self.names())
            .finish()
    }
}

/// Fetch a required parameter, rejecting missing or non-finite values.
pub fn required_param(node: &str, params: &NodeParams, key: &str) -> Result<f32, PipelineError> {
    match params.get(key) {
        Some(v) if v.is_finite() => Ok(*v),
        Some(v) => Err(PipelineError::invalid(node, format!("`{key}` is not finite ({v})"))),
        None => Err(PipelineError::invalid(node, format!("missing `{key}`"))),
    }
}
