use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use ristretto_catalog::{SqliteSessionStore, session_key_for_file};
use ristretto_core::PixelBuffer;
use ristretto_core::curve::{CurvePoint, CurvePreset};
use ristretto_core::decode::{self, DecodeQueue};
use ristretto_core::pipeline::EditNode;
use ristretto_core::session::{self, EditSession, SessionState};
use ristretto_export::Exporter;
use serde::Serialize;
use tracing::info;

use crate::cli::{ApplyArgs, HistoryArgs};
use crate::config::AppConfig;
use crate::recipe;

/// Edit every input with the recipe, then export the results as one batch.
/// Fails only when nothing could be exported.
pub async fn apply(args: ApplyArgs, mut config: AppConfig) -> Result<()> {
    config.apply_overrides(&args);
    let nodes = recipe::load_recipe(&args.recipe)?;
    info!(steps = nodes.len(), inputs = args.inputs.len(), "applying recipe");

    let mut store = if args.no_session {
        None
    } else {
        Some(open_store(&config)?)
    };

    let mut queue = DecodeQueue::new();
    for path in &args.inputs {
        let source = path.clone();
        queue.enqueue(path.clone(), move || decode::load_image(&source));
        queue.mark_visible(path);
    }

    let mut edited = Vec::new();
    for outcome in queue.drain_visible() {
        let path = match outcome {
            Ok(path) => path,
            Err(err) => {
                eprintln!("skipping input: {err}");
                continue;
            }
        };
        let Some(original) = queue.take(&path) else {
            continue;
        };
        // Position in the input list, for messages and name clashes.
        let position = args.inputs.iter().position(|p| *p == path).unwrap_or_default();
        match edit_one(&path, original, &nodes, &config, store.as_mut()) {
            Ok(buffer) => edited.push(((position, path), buffer)),
            Err(err) => eprintln!("{}: {err:#}", path.display()),
        }
    }
    if edited.is_empty() {
        bail!("no input could be edited");
    }

    tokio::fs::create_dir_all(&args.out)
        .await
        .with_context(|| format!("failed to create {}", args.out.display()))?;

    let (sources, buffers): (Vec<(usize, PathBuf)>, Vec<PixelBuffer>) =
        edited.into_iter().unzip();
    let mut exporter = Exporter::new(config.export.clone());
    let results = exporter.export_batch(&buffers, config.export.quality).await;

    let mut used_names = HashSet::new();
    let mut written = 0;
    for (result, (position, path)) in results.into_iter().zip(&sources) {
        let image = match result {
            Ok(image) => image,
            Err(err) => {
                eprintln!("export of input {position} ({}) failed: {err}", path.display());
                continue;
            }
        };
        let dest = output_path(&args.out, path, *position, &mut used_names);
        match tokio::fs::write(&dest, &image.bytes).await {
            Ok(()) => {
                println!("{} -> {}", path.display(), dest.display());
                written += 1;
            }
            Err(err) => eprintln!(
                "export of input {position} ({}) failed: cannot write {}: {err}",
                path.display(),
                dest.display()
            ),
        }
    }

    println!("exported {written} of {} images", sources.len());
    if written == 0 {
        bail!("all {} exports failed", sources.len());
    }
    Ok(())
}

fn edit_one(
    path: &Path,
    original: PixelBuffer,
    nodes: &[EditNode],
    config: &AppConfig,
    store: Option<&mut SqliteSessionStore>,
) -> Result<PixelBuffer> {
    let mut editing = EditSession::with_history_limit(original, config.history_limit);
    for node in nodes {
        editing
            .apply(node.clone())
            .with_context(|| format!("step `{}` failed", node.name()))?;
    }

    if let Some(store) = store {
        let key = session_key_for_file(path)?;
        let mut state = editing.state();
        // Replayed from the original on restore.
        state.current_buffer = None;
        session::save(store, &key, &state)?;
    }
    Ok(editing.current().clone())
}

/// `<out>/<stem>.jpg`. On a clash the input index is appended, counting up
/// until the name is unused.
fn output_path(out: &Path, input: &Path, index: usize, used: &mut HashSet<String>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("image-{index}"));
    let mut name = format!("{stem}.jpg");
    let mut suffix = index;
    while !used.insert(name.clone()) {
        name = format!("{stem}-{suffix}.jpg");
        suffix += 1;
    }
    out.join(name)
}

#[derive(Serialize)]
struct PresetInfo {
    name: &'static str,
    points: Vec<CurvePoint>,
}

pub fn presets() -> Result<()> {
    println!("{}", presets_json()?);
    Ok(())
}

fn presets_json() -> Result<String> {
    let presets: Vec<PresetInfo> = CurvePreset::ALL
        .into_iter()
        .map(|preset| PresetInfo {
            name: preset.name(),
            points: preset.spec().points().to_vec(),
        })
        .collect();
    Ok(serde_json::to_string_pretty(&presets)?)
}

pub fn history(args: HistoryArgs, mut config: AppConfig) -> Result<()> {
    if let Some(db) = args.session.session_db {
        config.session_db = Some(db);
    }
    let store = open_store(&config)?;
    let key = session_key_for_file(&args.input)?;
    match session::load(&store, &key)? {
        Some(state) => {
            for line in format_history(&state) {
                println!("{line}");
            }
        }
        None => println!("no saved session for {}", args.input.display()),
    }
    Ok(())
}

fn format_history(state: &SessionState) -> Vec<String> {
    state
        .history
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let marker = if state.cursor == Some(i) { '*' } else { ' ' };
            let steps = entry
                .nodes
                .iter()
                .map(EditNode::name)
                .collect::<Vec<_>>()
                .join(" > ");
            format!("{marker} {i:>3}  {:<14} {steps}", entry.label)
        })
        .collect()
}

fn open_store(config: &AppConfig) -> Result<SqliteSessionStore> {
    let path = config.session_db_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    SqliteSessionStore::open(&path)
}
