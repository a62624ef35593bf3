// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-battery-telemetry project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Telemetry file locator
//!
//! Only the immediate entries of the watched directory are considered, and
//! only regular files whose name ends with `.json`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use log::debug;

/// File name suffix of telemetry documents
pub const TELEMETRY_FILE_SUFFIX: &str = ".json";

/// List the telemetry files of `directory` with their modification time
fn telemetry_files(directory: &Path) -> io::Result<Vec<(PathBuf, SystemTime)>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        if !entry
            .file_name()
            .to_string_lossy()
            .ends_with(TELEMETRY_FILE_SUFFIX)
        {
            continue;
        }

        let path = entry.path();
        // The producer may remove or rotate a file between listing and stat
        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) => {
                debug!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };
        if !metadata.is_file() {
            continue;
        }
        files.push((path, metadata.modified()?));
    }
    Ok(files)
}

/// Find the most recently modified telemetry file of `directory`
///
/// Files sharing the greatest modification time are ordered by name and the
/// lexicographically greatest one wins, so the result does not depend on the
/// directory iteration order.
///
/// ### Returns
///
/// * `Ok(Some(path))` - the selected file
/// * `Ok(None)` - the directory holds no telemetry file
///
/// ### Errors
///
/// Fails if the directory cannot be listed.
pub fn select_latest(directory: &Path) -> io::Result<Option<PathBuf>> {
    let latest = telemetry_files(directory)?
        .into_iter()
        .max_by(|(a_path, a_modified), (b_path, b_modified)| {
            a_modified
                .cmp(b_modified)
                .then_with(|| a_path.file_name().cmp(&b_path.file_name()))
        })
        .map(|(path, _)| path);
    Ok(latest)
}

/// Capture the telemetry files of `directory`, sorted by file name
///
/// The list is a snapshot: files added later are not picked up.
pub fn build_index(directory: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = telemetry_files(directory)?
        .into_iter()
        .map(|(path, _)| path)
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Bounds-checked lookup into an index built by [`build_index`]
pub fn select_by_index(files: &[PathBuf], index: usize) -> Option<&Path> {
    files.get(index).map(PathBuf::as_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str, modified: SystemTime) -> PathBuf {
        let path = dir.join(name);
        let file = File::create(&path).unwrap();
        file.set_modified(modified).unwrap();
        path
    }

    fn at(seconds: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000 + seconds)
    }

    #[test]
    fn test_no_json_files() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "battery_data.log", at(1));
        touch(dir.path(), "readme.txt", at(2));
        touch(dir.path(), "reading.json.tmp", at(3));

        assert_eq!(select_latest(dir.path()).unwrap(), None);
        assert!(build_index(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_empty_directory() {
        let dir = tempdir().unwrap();
        assert_eq!(select_latest(dir.path()).unwrap(), None);
        assert!(build_index(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert!(select_latest(&missing).is_err());
        assert!(build_index(&missing).is_err());
    }

    #[test]
    fn test_select_latest_picks_greatest_mtime() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "c.json", at(10));
        let newest = touch(dir.path(), "a.json", at(30));
        touch(dir.path(), "b.json", at(20));
        touch(dir.path(), "z.log", at(40));

        assert_eq!(select_latest(dir.path()).unwrap(), Some(newest));
    }

    #[test]
    fn test_select_latest_ties_break_on_greatest_name() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "reading_a.json", at(5));
        let expected = touch(dir.path(), "reading_c.json", at(5));
        touch(dir.path(), "reading_b.json", at(5));
        touch(dir.path(), "reading_0.json", at(1));

        assert_eq!(select_latest(dir.path()).unwrap(), Some(expected));
    }

    #[test]
    fn test_directories_are_ignored() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("archive.json")).unwrap();
        let file = touch(dir.path(), "reading.json", at(1));

        assert_eq!(select_latest(dir.path()).unwrap(), Some(file.clone()));
        assert_eq!(build_index(dir.path()).unwrap(), vec![file]);
    }

    #[test]
    fn test_build_index_sorted_by_name() {
        let dir = tempdir().unwrap();
        let b = touch(dir.path(), "b.json", at(1));
        let a = touch(dir.path(), "a.json", at(3));
        let c = touch(dir.path(), "c.json", at(2));
        touch(dir.path(), "d.txt", at(4));

        assert_eq!(build_index(dir.path()).unwrap(), vec![a, b, c]);
    }

    #[test]
    fn test_select_by_index_bounds() {
        let files = vec![PathBuf::from("a.json"), PathBuf::from("b.json")];
        assert_eq!(select_by_index(&files, 0), Some(Path::new("a.json")));
        assert_eq!(select_by_index(&files, 1), Some(Path::new("b.json")));
        assert_eq!(select_by_index(&files, 2), None);
        assert_eq!(select_by_index(&files, usize::MAX), None);
        assert_eq!(select_by_index(&[], 0), None);
    }
}
