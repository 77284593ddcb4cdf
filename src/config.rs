use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::domain::{DatasetKind, Selection, SubjectId};
use crate::error::BiError;

pub const CONFIG_FILE: &str = "bi-data.json";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub dataset: Option<String>,
    #[serde(default)]
    pub cache_root: Option<String>,
    #[serde(default)]
    pub selection: Option<Selection>,
    #[serde(default)]
    pub subjects: Vec<SubjectEntry>,
}

/// `3`, `"3"`, `"1-7"` or `"all"`.
#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SubjectEntry {
    Number(u32),
    Spec(String),
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub dataset: DatasetKind,
    pub cache_root: Option<Utf8PathBuf>,
    pub selection: Selection,
    pub subjects: Vec<SubjectId>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, BiError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Err(BiError::MissingConfig);
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| BiError::ConfigRead(config_path.clone()))?;
        let config: Config =
            serde_json::from_str(&content).map_err(|err| BiError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, BiError> {
        let schema_version = config.schema_version.unwrap_or(1);
        let dataset = match config.dataset {
            Some(value) => value.parse()?,
            None => DatasetKind::BrainInvaders2013,
        };

        let mut subjects = Vec::new();
        for entry in config.subjects {
            match entry {
                SubjectEntry::Number(value) => subjects.push(SubjectId::new(value)?),
                SubjectEntry::Spec(value) => subjects.extend(parse_subject_spec(&value)?),
            }
        }
        subjects.sort();
        subjects.dedup();

        Ok(ResolvedConfig {
            schema_version,
            dataset,
            cache_root: config.cache_root.map(Utf8PathBuf::from),
            selection: config.selection.unwrap_or_default(),
            subjects,
        })
    }
}

pub fn parse_subject_spec(value: &str) -> Result<Vec<SubjectId>, BiError> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("all") {
        return Ok(SubjectId::all().collect());
    }
    match trimmed.split_once('-') {
        Some((start, end)) => {
            let start: SubjectId = start.parse()?;
            let end: SubjectId = end.parse()?;
            if start > end {
                return Err(BiError::InvalidSubject(value.to_string()));
            }
            (start.get()..=end.get()).map(SubjectId::new).collect()
        }
        None => Ok(vec![trimmed.parse()?]),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_config_shorthand() {
        let config: Config = serde_json::from_str(r#"{"subjects": [3, "1-2", "3"]}"#).unwrap();
        let resolved = ConfigLoader::resolve_config(config).unwrap();
        assert_eq!(resolved.schema_version, 1);
        assert_eq!(resolved.dataset, DatasetKind::BrainInvaders2013);
        assert_eq!(resolved.selection, Selection::default());
        let numbers: Vec<u32> = resolved.subjects.iter().map(|s| s.get()).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn parse_config_detailed() {
        let config: Config = serde_json::from_str(
            r#"{
                "schema_version": 1,
                "dataset": "braininvaders",
                "cache_root": "/tmp/bi",
                "selection": {"adaptive": true, "online": true},
                "subjects": ["all"]
            }"#,
        )
        .unwrap();
        let resolved = ConfigLoader::resolve_config(config).unwrap();
        assert_eq!(resolved.dataset, DatasetKind::BrainInvaders);
        assert_eq!(resolved.cache_root.unwrap(), "/tmp/bi");
        assert!(resolved.selection.adaptive && resolved.selection.non_adaptive);
        assert!(resolved.selection.online && resolved.selection.training);
        assert_eq!(resolved.subjects.len(), 24);
    }

    #[test]
    fn rejects_out_of_range_subjects() {
        let config: Config = serde_json::from_str(r#"{"subjects": [25]}"#).unwrap();
        assert_matches!(
            ConfigLoader::resolve_config(config),
            Err(BiError::InvalidSubject(_))
        );
        assert_matches!(parse_subject_spec("5-2"), Err(BiError::InvalidSubject(_)));
        assert_matches!(parse_subject_spec("0-3"), Err(BiError::InvalidSubject(_)));
    }

    #[test]
    fn rejects_unknown_dataset() {
        let config: Config = serde_json::from_str(r#"{"dataset": "bi2015"}"#).unwrap();
        assert_matches!(
            ConfigLoader::resolve_config(config),
            Err(BiError::InvalidDataset(_))
        );
    }
}
