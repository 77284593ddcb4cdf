use std::collections::BTreeMap;
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};

use crate::domain::SessionName;
use crate::error::BiError;
use crate::manifest::recording_file_name;

pub type SessionPaths = BTreeMap<SessionName, Vec<Utf8PathBuf>>;

/// `Session<digits>` directories directly under `subject_dir`, in session
/// order. A missing subject directory has no sessions.
pub fn session_dirs(subject_dir: &Utf8Path) -> Result<Vec<(SessionName, Utf8PathBuf)>, BiError> {
    if !subject_dir.as_std_path().is_dir() {
        return Ok(Vec::new());
    }
    let mut sessions = Vec::new();
    let entries = fs::read_dir(subject_dir.as_std_path())
        .map_err(|err| BiError::Filesystem(err.to_string()))?;
    for entry in entries {
        let entry = entry.map_err(|err| BiError::Filesystem(err.to_string()))?;
        if !entry.path().is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        match SessionName::from_dir_name(&name) {
            Ok(session) => sessions.push((session, subject_dir.join(&name))),
            Err(_) => tracing::debug!(directory = %name, "skipping non-session directory"),
        }
    }
    sessions.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(sessions)
}

/// Maps manifest filenames to recordings on disk, grouped by session.
/// Filenames with no recording in any session are left out.
pub fn resolve(subject_dir: &Utf8Path, filenames: &[String]) -> Result<SessionPaths, BiError> {
    let mut grouped = SessionPaths::new();
    for (session, path) in resolve_pairs(subject_dir, filenames)? {
        grouped.entry(session).or_default().push(path);
    }
    Ok(grouped)
}

/// Resolved paths in manifest order, each filename expanded over every
/// session holding it.
pub fn resolve_flat(
    subject_dir: &Utf8Path,
    filenames: &[String],
) -> Result<Vec<Utf8PathBuf>, BiError> {
    Ok(resolve_pairs(subject_dir, filenames)?
        .into_iter()
        .map(|(_, path)| path)
        .collect())
}

fn resolve_pairs(
    subject_dir: &Utf8Path,
    filenames: &[String],
) -> Result<Vec<(SessionName, Utf8PathBuf)>, BiError> {
    let sessions = session_dirs(subject_dir)?;
    let mut pairs = Vec::new();
    for filename in filenames {
        let recording = recording_file_name(filename);
        let before = pairs.len();
        for (session, dir) in &sessions {
            let candidate = dir.join(&recording);
            if candidate.as_std_path().is_file() {
                pairs.push((session.clone(), candidate));
            }
        }
        if pairs.len() == before {
            tracing::debug!(%filename, %subject_dir, "no recording on disk");
        }
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(root: &Utf8Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap().as_std_path()).unwrap();
        fs::write(path.as_std_path(), b"").unwrap();
    }

    fn subject_root() -> (tempfile::TempDir, Utf8PathBuf) {
        let temp = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().join("subject_01")).unwrap();
        fs::create_dir_all(root.as_std_path()).unwrap();
        (temp, root)
    }

    #[test]
    fn groups_same_run_across_sessions() {
        let (_temp, root) = subject_root();
        touch(&root, "Session1/run_1.mat");
        touch(&root, "Session2/run_1.mat");

        let grouped = resolve(&root, &["run_1.gdf".to_string()]).unwrap();
        assert_eq!(grouped.len(), 2);
        let keys: Vec<String> = grouped.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["session_1", "session_2"]);
        for paths in grouped.values() {
            assert_eq!(paths.len(), 1);
        }
        assert!(grouped.values().next().unwrap()[0].ends_with("Session1/run_1.mat"));
    }

    #[test]
    fn missing_files_are_dropped() {
        let (_temp, root) = subject_root();
        touch(&root, "Session1/s_1.mat");
        touch(&root, "Session1/s_3.mat");

        let names = vec![
            "s_1.gdf".to_string(),
            "s_2.gdf".to_string(),
            "s_3.gdf".to_string(),
        ];
        let flat = resolve_flat(&root, &names).unwrap();
        assert_eq!(flat.len(), 2);
        assert!(flat[0].ends_with("s_1.mat"));
        assert!(flat[1].ends_with("s_3.mat"));
    }

    #[test]
    fn ignores_directories_outside_the_grammar() {
        let (_temp, root) = subject_root();
        touch(&root, "SessionX/r_1.mat");
        touch(&root, "Session10/r_1.mat");
        touch(&root, "Session2/r_1.mat");
        touch(&root, "Session3.mat");

        let sessions = session_dirs(&root).unwrap();
        let numbers: Vec<u32> = sessions.iter().map(|(s, _)| s.number()).collect();
        assert_eq!(numbers, vec![2, 10]);
    }

    #[test]
    fn absent_subject_directory_resolves_to_nothing() {
        let temp = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().join("missing")).unwrap();
        assert!(resolve(&root, &["a.gdf".to_string()]).unwrap().is_empty());
    }
}
