// src/pipeline/layers.rs

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::info;

use crate::pipeline::state::BuildState;

/// Relative path (from the state directory) to the layer ledger.
pub const LAYER_FILE_NAME: &str = "layers";

/// One completed build layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerRecord {
    pub state: BuildState,
    pub digest: String,
}

/// Ledger of the layers produced by the current (or last) build.
///
/// Layers are appended as steps complete, so after a failed build the ledger
/// holds exactly the layers below the failing step.
pub trait LayerStore: Send {
    fn load(&self) -> Result<Vec<LayerRecord>>;
    fn record(&mut self, layer: LayerRecord) -> Result<()>;
    fn clear(&mut self) -> Result<()>;

    /// Whether every build layer is present, in order.
    fn is_complete(&self) -> Result<bool> {
        let states: Vec<BuildState> = self.load()?.into_iter().map(|l| l.state).collect();
        Ok(states == BuildState::BUILD_LAYERS)
    }
}

/// Stores the ledger in `<state_dir>/layers`, one `state digest` per line.
pub struct FileLayerStore {
    state_dir: PathBuf,
}

impl FileLayerStore {
    pub fn new(state_dir: PathBuf) -> Self {
        Self { state_dir }
    }

    pub fn path(&self) -> PathBuf {
        self.state_dir.join(LAYER_FILE_NAME)
    }
}

impl LayerStore for FileLayerStore {
    fn load(&self) -> Result<Vec<LayerRecord>> {
        load_layers(&self.path())
    }

    fn record(&mut self, layer: LayerRecord) -> Result<()> {
        let mut layers = self.load()?;
        info!(state = %layer.state, digest = %layer.digest, "recorded build layer");
        layers.push(layer);
        save_layers(&self.path(), &layers)
    }

    fn clear(&mut self) -> Result<()> {
        save_layers(&self.path(), &[])
    }
}

/// Keeps the ledger in memory only.
#[derive(Debug, Default)]
pub struct MemoryLayerStore {
    layers: Vec<LayerRecord>,
}

impl MemoryLayerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LayerStore for MemoryLayerStore {
    fn load(&self) -> Result<Vec<LayerRecord>> {
        Ok(self.layers.clone())
    }

    fn record(&mut self, layer: LayerRecord) -> Result<()> {
        info!(state = %layer.state, digest = %layer.digest, "recorded build layer (memory)");
        self.layers.push(layer);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.layers.clear();
        Ok(())
    }
}

fn load_layers(path: &Path) -> Result<Vec<LayerRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path).with_context(|| format!("opening layer file at {:?}", path))?;
    let reader = BufReader::new(file);

    let mut layers = Vec::new();
    for line_res in reader.lines() {
        let line = line_res?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let (state, digest) = trimmed
            .split_once(char::is_whitespace)
            .ok_or_else(|| anyhow!("malformed layer line in {:?}: '{}'", path, trimmed))?;
        let state: BuildState = state
            .parse()
            .map_err(|e: String| anyhow!("{e} in {:?}", path))?;
        layers.push(LayerRecord {
            state,
            digest: digest.trim().to_string(),
        });
    }

    Ok(layers)
}

fn save_layers(path: &Path, layers: &[LayerRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating state directory at {:?}", parent))?;
    }

    let file = File::create(path).with_context(|| format!("creating layer file at {:?}", path))?;
    let mut writer = BufWriter::new(file);

    for layer in layers {
        writeln!(writer, "{} {}", layer.state, layer.digest)?;
    }

    writer.flush()?;
    Ok(())
}
