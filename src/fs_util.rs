use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use crate::error::BiError;

pub fn extract_zip(zip_path: &Path, target_dir: &Path) -> Result<usize, BiError> {
    let file = fs::File::open(zip_path)
        .map_err(|err| BiError::Archive(format!("open zip {}: {err}", zip_path.display())))?;
    let mut archive = ZipArchive::new(file)
        .map_err(|err| BiError::Archive(format!("{}: {err}", zip_path.display())))?;

    let mut written = 0;
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|err| BiError::Archive(err.to_string()))?;
        let entry_path = match entry.enclosed_name() {
            Some(path) => target_dir.join(path),
            None => {
                return Err(BiError::Archive(
                    "zip entry path traversal detected".to_string(),
                ));
            }
        };

        if entry.is_dir() {
            fs::create_dir_all(&entry_path).map_err(|err| BiError::Filesystem(err.to_string()))?;
            continue;
        }

        if let Some(parent) = entry_path.parent() {
            fs::create_dir_all(parent).map_err(|err| BiError::Filesystem(err.to_string()))?;
        }
        let mut outfile =
            fs::File::create(&entry_path).map_err(|err| BiError::Filesystem(err.to_string()))?;
        io::copy(&mut entry, &mut outfile).map_err(|err| BiError::Filesystem(err.to_string()))?;
        written += 1;
    }
    Ok(written)
}

/// Copies the contents of `source` into `dest`, merging with whatever is
/// already there and overwriting files with the same relative path.
pub fn copy_dir_recursive(source: &Path, dest: &Path) -> Result<(), BiError> {
    fs::create_dir_all(dest).map_err(|err| BiError::Filesystem(err.to_string()))?;
    for entry in walk_dir(source)? {
        let relative = entry
            .strip_prefix(source)
            .map_err(|err| BiError::Filesystem(err.to_string()))?;
        let target = dest.join(relative);
        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(|err| BiError::Filesystem(err.to_string()))?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|err| BiError::Filesystem(err.to_string()))?;
            }
            fs::copy(&entry, &target).map_err(|err| BiError::Filesystem(err.to_string()))?;
        }
    }
    Ok(())
}

pub fn walk_dir(root: &Path) -> Result<Vec<PathBuf>, BiError> {
    let mut items = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(path) = stack.pop() {
        let entries = fs::read_dir(&path).map_err(|err| BiError::Filesystem(err.to_string()))?;
        for entry in entries {
            let entry = entry.map_err(|err| BiError::Filesystem(err.to_string()))?;
            let path = entry.path();
            if path.is_dir() {
                stack.push(path.clone());
            }
            items.push(path);
        }
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    use super::*;

    #[test]
    fn extract_and_merge_directories() {
        let temp = tempfile::tempdir().unwrap();
        let zip_path = temp.path().join("a.zip");
        let mut writer = ZipWriter::new(fs::File::create(&zip_path).unwrap());
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        writer.start_file("top/Session1/x.mat", options).unwrap();
        writer.write_all(b"x").unwrap();
        writer.finish().unwrap();

        let out = temp.path().join("out");
        assert_eq!(extract_zip(&zip_path, &out).unwrap(), 1);
        assert!(out.join("top/Session1/x.mat").is_file());

        let merged = temp.path().join("merged");
        fs::create_dir_all(merged.join("Session0")).unwrap();
        copy_dir_recursive(&out.join("top"), &merged).unwrap();
        assert!(merged.join("Session0").is_dir());
        assert_eq!(fs::read(merged.join("Session1/x.mat")).unwrap(), b"x");
    }
}
