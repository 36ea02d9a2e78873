use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A document ready for indexing: already-extracted plain text paired with
/// the identifier of where it came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub source: String,
    pub text: String,
}

impl Document {
    pub fn new(source: String, text: String) -> Self {
        Self { source, text }
    }
}

const TEXT_EXTENSIONS: [&str; 2] = ["txt", "md"];

/// Load every plain-text file under `dir`, in lexicographic filename order.
///
/// Files that cannot be read are skipped with a warning; one bad file never
/// fails the whole corpus. Binary formats are not handled here — whatever
/// extracts them must hand over plain text (or omit the document).
pub fn load_corpus<P: AsRef<Path>>(dir: P) -> Result<Vec<Document>> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read documents directory {}", dir.display()))?;

    let mut paths: Vec<_> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .map_or(false, |ext| TEXT_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        })
        .collect();
    paths.sort();

    let mut documents = Vec::new();
    for path in paths {
        match fs::read_to_string(&path) {
            Ok(text) => {
                documents.push(Document::new(path.display().to_string(), text));
            }
            Err(err) => {
                tracing::warn!("Skipping unreadable document {}: {}", path.display(), err);
            }
        }
    }

    Ok(documents)
}
