//! Per-subject `meta.yml` manifest and run selection.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{Condition, PresentationType, Selection};
use crate::error::BiError;

/// Extension of the recordings shipped inside the archives. Manifests name
/// the original acquisition files instead.
pub const RECORDING_EXTENSION: &str = "mat";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub runs: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub filename: String,
    pub experimental_condition: Condition,
    #[serde(rename = "type")]
    pub kind: PresentationType,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self, BiError> {
        let content =
            fs::read_to_string(path).map_err(|_| BiError::ManifestRead(path.to_path_buf()))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, BiError> {
        serde_yaml::from_str(content).map_err(|err| BiError::ManifestParse(err.to_string()))
    }
}

/// Filenames of the selected runs, in manifest order.
pub fn select_runs(manifest: &Manifest, selection: &Selection) -> Vec<String> {
    let conditions = selection.accepted_conditions();
    let types = selection.accepted_types();
    manifest
        .runs
        .iter()
        .filter(|run| conditions.contains(&run.experimental_condition) && types.contains(&run.kind))
        .map(|run| run.filename.clone())
        .collect()
}

/// Like [`select_runs`], with each name translated to its on-disk recording.
pub fn select_recordings(manifest: &Manifest, selection: &Selection) -> Vec<String> {
    select_runs(manifest, selection)
        .iter()
        .map(|name| recording_file_name(name))
        .collect()
}

/// `Subject1_Session1_3.gdf` -> `Subject1_Session1_3.mat`. Only the last
/// extension is replaced; names without one gain it.
pub fn recording_file_name(filename: &str) -> String {
    let stem = match filename.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => filename,
    };
    format!("{stem}.{RECORDING_EXTENSION}")
}
