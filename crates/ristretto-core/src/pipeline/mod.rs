pub mod modules;
pub mod node;
pub mod registry;

use tracing::debug;

use crate::error::PipelineError;
use crate::image_buf::PixelBuffer;

pub use node::EditNode;
pub use registry::{NodeHandler, NodeParams, NodeRegistry};

/// Ordered, non-destructive chain of edit nodes.
///
/// ```text
/// original ─> node[0] ─> node[1] ─> ... ─> node[n-1] ─> derived
/// ```
///
/// `resolve` always folds from the caller's pristine original, never from a
/// previous result, so replaying the same nodes gives the same buffer after
/// any undo, redo or reset. Nodes are only ever appended or cleared together.
#[derive(Clone, Debug)]
pub struct EditGraph {
    nodes: Vec<EditNode>,
    registry: NodeRegistry,
}

impl EditGraph {
    pub fn new() -> Self {
        Self::with_registry(NodeRegistry::with_builtins())
    }

    pub fn with_registry(registry: NodeRegistry) -> Self {
        Self {
            nodes: Vec::new(),
            registry,
        }
    }

    pub fn add_node(&mut self, node: EditNode) {
        self.nodes.push(node);
    }

    pub fn reset(&mut self) {
        self.nodes.clear();
    }

    pub fn nodes(&self) -> &[EditNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut NodeRegistry {
        &mut self.registry
    }

    /// Apply every node in insertion order to `original`. An empty graph
    /// returns an identical copy. The first failing node aborts the fold.
    pub fn resolve(&self, original: &PixelBuffer) -> Result<PixelBuffer, PipelineError> {
        let mut nodes = self.nodes.iter();
        let Some(first) = nodes.next() else {
            return Ok(original.clone());
        };

        debug!(node = first.name(), "processing");
        let mut current = first.apply(original, &self.registry)?;
        for node in nodes {
            debug!(node = node.name(), "processing");
            current = node.apply(&current, &self.registry)?;
        }
        Ok(current)
    }
}

impl Default for EditGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{CurveChannel, CurvePreset};
    use crate::image_buf::BitDepth;

    fn test_image() -> PixelBuffer {
        let samples = (0..4 * 4 * 3).map(|i| (i * 5) as u16).collect();
        PixelBuffer::new(4, 4, 3, BitDepth::Eight, samples).unwrap()
    }

    fn sample_nodes() -> Vec<EditNode> {
        vec![
            EditNode::WhiteBalance {
                temp: 6500.0,
                tint: 10.0,
            },
            EditNode::Exposure { value: 0.5 },
            EditNode::CurveAdjust {
                curve: CurvePreset::SCurve.spec(),
                channel: CurveChannel::Luminance,
            },
            EditNode::Crop {
                x: 1,
                y: 1,
                width: 2,
                height: 3,
            },
        ]
    }

    #[test]
    fn empty_graph_is_identity() {
        let graph = EditGraph::new();
        let input = test_image();
        let output = graph.resolve(&input).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn resolve_is_sequential_fold() {
        let mut graph = EditGraph::new();
        for node in sample_nodes() {
            graph.add_node(node);
        }
        let input = test_image();

        let mut expected = input.clone();
        for node in sample_nodes() {
            expected = node.apply(&expected, graph.registry()).unwrap();
        }
        assert_eq!(graph.resolve(&input).unwrap(), expected);
    }

    #[test]
    fn resolve_is_idempotent_and_leaves_original_untouched() {
        let mut graph = EditGraph::new();
        for node in sample_nodes() {
            graph.add_node(node);
        }
        let input = test_image();
        let snapshot = input.clone();

        let first = graph.resolve(&input).unwrap();
        let second = graph.resolve(&input).unwrap();
        assert_eq!(first, second);
        assert_eq!(input, snapshot);
        assert_eq!((first.width(), first.height()), (2, 3));
    }

    #[test]
    fn order_is_significant() {
        let input = test_image();
        let mut a = EditGraph::new();
        a.add_node(EditNode::Exposure { value: 1.0 });
        a.add_node(EditNode::CurveAdjust {
            curve: CurvePreset::HighlightCompress.spec(),
            channel: CurveChannel::Rgb,
        });
        let mut b = EditGraph::new();
        b.add_node(EditNode::CurveAdjust {
            curve: CurvePreset::HighlightCompress.spec(),
            channel: CurveChannel::Rgb,
        });
        b.add_node(EditNode::Exposure { value: 1.0 });

        assert_ne!(a.resolve(&input).unwrap(), b.resolve(&input).unwrap());
        let names: Vec<&str> = a.nodes().iter().map(EditNode::name).collect();
        assert_eq!(names, vec!["exposure", "curve_adjust"]);
    }

    #[test]
    fn invalid_crop_fails_loudly() {
        let mut graph = EditGraph::new();
        graph.add_node(EditNode::Exposure { value: 1.0 });
        graph.add_node(EditNode::Crop {
            x: 2,
            y: 0,
            width: 3,
            height: 1,
        });
        let err = graph.resolve(&test_image()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InvalidNodeParameters { ref node, .. } if node == "crop"
        ));
    }

    #[test]
    fn unknown_custom_node_fails() {
        let mut graph = EditGraph::new();
        graph.add_node(EditNode::Custom {
            name: "grain".into(),
            params: NodeParams::new(),
        });
        assert_eq!(
            graph.resolve(&test_image()).unwrap_err(),
            PipelineError::UnknownNode("grain".into())
        );
    }

    #[test]
    fn builtin_custom_node_runs() {
        let mut graph = EditGraph::new();
        graph.add_node(EditNode::Custom {
            name: "saturation".into(),
            params: NodeParams::from([("amount".to_string(), -100.0)]),
        });
        let out = graph.resolve(&test_image()).unwrap();
        for px in out.samples().chunks_exact(3) {
            assert!(px[0].abs_diff(px[1]) <= 1 && px[1].abs_diff(px[2]) <= 1);
        }
    }

    #[test]
    fn reset_clears_nodes() {
        let mut graph = EditGraph::new();
        graph.add_node(EditNode::Exposure { value: 2.0 });
        assert_eq!(graph.len(), 1);
        graph.reset();
        assert!(graph.is_empty());
        let input = test_image();
        assert_eq!(graph.resolve(&input).unwrap(), input);
    }
}
