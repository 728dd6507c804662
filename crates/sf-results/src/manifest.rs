//! Run manifest written next to the CSV output.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sf_study::OutputMode;

use crate::{ResultsError, ResultsResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunManifest {
    pub study_name: String,
    pub study_hash: String,
    pub backend: String,
    pub output_path: PathBuf,
    pub output_mode: OutputMode,
    /// RFC 3339, UTC.
    pub started_at: String,
    pub finished_at: String,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// `results.csv` → `results.csv.manifest.json`
pub fn manifest_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_os_string();
    name.push(".manifest.json");
    PathBuf::from(name)
}

pub fn write_manifest(manifest: &RunManifest) -> ResultsResult<PathBuf> {
    let path = manifest_path(&manifest.output_path);
    let manifest_json = serde_json::to_string_pretty(manifest)?;
    fs::write(&path, manifest_json)?;
    tracing::debug!(path = %path.display(), "Wrote run manifest");
    Ok(path)
}

pub fn load_manifest(output: &Path) -> ResultsResult<RunManifest> {
    let path = manifest_path(output);
    if !path.exists() {
        return Err(ResultsError::ManifestNotFound {
            path: path.display().to_string(),
        });
    }

    let content = fs::read_to_string(path)?;
    let manifest = serde_json::from_str(&content)?;
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_sits_beside_output() {
        assert_eq!(
            manifest_path(Path::new("out/results.csv")),
            PathBuf::from("out/results.csv.manifest.json")
        );
    }
}
