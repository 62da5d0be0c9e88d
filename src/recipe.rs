use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use ristretto_core::curve::{CurveChannel, CurvePreset};
use ristretto_core::pipeline::EditNode;
use serde::Deserialize;

/// One recipe entry: a full edit node, or a curve preset by name.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecipeStep {
    Preset {
        preset: CurvePreset,
        #[serde(default)]
        channel: CurveChannel,
    },
    Node(EditNode),
}

impl From<RecipeStep> for EditNode {
    fn from(step: RecipeStep) -> Self {
        match step {
            RecipeStep::Preset { preset, channel } => EditNode::CurveAdjust {
                curve: preset.spec(),
                channel,
            },
            RecipeStep::Node(node) => node,
        }
    }
}

pub fn parse_recipe(json: &str) -> Result<Vec<EditNode>> {
    let steps: Vec<RecipeStep> = serde_json::from_str(json).context("invalid recipe")?;
    Ok(steps.into_iter().map(EditNode::from).collect())
}

pub fn load_recipe(path: &Path) -> Result<Vec<EditNode>> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read recipe {}", path.display()))?;
    parse_recipe(&json).with_context(|| format!("in {}", path.display()))
}
