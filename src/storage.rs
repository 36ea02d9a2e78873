use crate::index::Index;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Persist a built index as JSON. Floating-point weights round-trip at full
/// precision, so a reloaded index scores identically.
pub fn save_index<P: AsRef<Path>>(index: &Index, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create index file {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), index)
        .context("Failed to serialize index")?;
    Ok(())
}

/// Load a previously saved index.
pub fn load_index<P: AsRef<Path>>(path: P) -> Result<Index> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open index file {}", path.display()))?;
    let index = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse index file {}", path.display()))?;
    Ok(index)
}
