//! Extraction of cached archives into the canonical
//! `subject_<NN>/Session<K>/<run-file>` layout.
//!
//! Extraction is guarded by a presence check on the target directory only.
//! A directory left behind by an interrupted or older extraction is reused
//! as-is; clearing the namespace is the way to rebuild it. There is no
//! lock: two processes materializing the same subject at once can interleave
//! their extractions and must not share a cache root.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use crate::domain::SubjectId;
use crate::error::BiError;
use crate::fs_util::{copy_dir_recursive, extract_zip};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveLayout {
    /// One archive holding every session under a top-level directory named
    /// `legacy_dir`, renamed to `subject_<NN>` after extraction.
    Subject { legacy_dir: String },
    /// One archive per session; its top-level directory is merged into
    /// `subject_<NN>` and `Session<session>` marks it as done.
    Session { session: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializeOutcome {
    pub directory: Utf8PathBuf,
    pub extracted: bool,
}

pub fn materialize(
    archive_path: &Utf8Path,
    subject: SubjectId,
    layout: &ArchiveLayout,
) -> Result<MaterializeOutcome, BiError> {
    let parent = archive_path
        .parent()
        .ok_or_else(|| BiError::Filesystem(format!("archive has no parent: {archive_path}")))?;
    let directory = parent.join(subject.dir_name());

    match layout {
        ArchiveLayout::Subject { legacy_dir } => {
            if directory.as_std_path().is_dir() {
                tracing::debug!(%directory, "subject already extracted");
                return Ok(MaterializeOutcome {
                    directory,
                    extracted: false,
                });
            }
            tracing::info!(archive = %archive_path, "unzip");
            extract_zip(archive_path.as_std_path(), parent.as_std_path())?;
            let legacy = parent.join(legacy_dir);
            if legacy != directory && legacy.as_std_path().is_dir() {
                fs::rename(legacy.as_std_path(), directory.as_std_path())
                    .map_err(|err| BiError::Filesystem(err.to_string()))?;
            }
            if !directory.as_std_path().is_dir() {
                return Err(BiError::Archive(format!(
                    "{archive_path} does not contain {legacy_dir}/"
                )));
            }
        }
        ArchiveLayout::Session { session } => {
            fs::create_dir_all(directory.as_std_path())
                .map_err(|err| BiError::Filesystem(err.to_string()))?;
            let session_dir = directory.join(format!("Session{session}"));
            if session_dir.as_std_path().is_dir() {
                tracing::debug!(%session_dir, "session already extracted");
                return Ok(MaterializeOutcome {
                    directory,
                    extracted: false,
                });
            }
            tracing::info!(archive = %archive_path, "unzip");
            let scratch = tempfile::Builder::new()
                .prefix(".bi-data-extract")
                .tempdir_in(parent.as_std_path())
                .map_err(|err| BiError::Filesystem(err.to_string()))?;
            extract_zip(archive_path.as_std_path(), scratch.path())?;
            fs::create_dir_all(session_dir.as_std_path())
                .map_err(|err| BiError::Filesystem(err.to_string()))?;

            let top = archive_path
                .file_stem()
                .map(|stem| scratch.path().join(stem))
                .filter(|path| path.is_dir());
            let source = top.as_deref().unwrap_or(scratch.path());
            copy_dir_recursive(source, directory.as_std_path())?;
            scratch
                .close()
                .map_err(|err| BiError::Filesystem(err.to_string()))?;
        }
    }

    Ok(MaterializeOutcome {
        directory,
        extracted: true,
    })
}
