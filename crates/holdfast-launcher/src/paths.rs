use std::ffi::OsString;
use std::path::{Path, PathBuf};

use nix::unistd::{AccessFlags, access};

/// Returns every executable matching `name` on `search_path`, in search
/// order.
///
/// A name containing a path separator bypasses the search and is checked
/// directly.
pub(crate) fn resolve_binary_path(name: &str, search_path: Option<&OsString>) -> Vec<PathBuf> {
    if name.contains('/') {
        let path = PathBuf::from(name);
        return if is_executable_file(&path) {
            vec![path]
        } else {
            Vec::new()
        };
    }

    let Some(search_path) = search_path else {
        return Vec::new();
    };

    std::env::split_paths(search_path)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(name))
        .filter(|path| is_executable_file(path))
        .collect()
}

/// Canonical absolute form of `path`, if it resolves.
pub(crate) fn canonical_path(path: &Path) -> Option<PathBuf> {
    std::fs::canonicalize(path).ok()
}

fn is_executable_file(path: &Path) -> bool {
    path.is_file() && access(path, AccessFlags::X_OK).is_ok()
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    use super::*;

    fn fake_bin(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"#!/bin/sh\n").unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
        path
    }

    #[test]
    fn finds_matches_in_search_order() {
        let dir_a = tempfile::tempdir().unwrap();
        let dir_b = tempfile::tempdir().unwrap();
        let bin_a = fake_bin(dir_a.path(), "tool");
        let bin_b = fake_bin(dir_b.path(), "tool");

        let search = std::env::join_paths([dir_a.path(), dir_b.path()]).unwrap();

        assert_eq!(
            resolve_binary_path("tool", Some(&search)),
            vec![bin_a, bin_b]
        );
    }

    #[test]
    fn skips_non_executable_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("tool"), b"data").unwrap();

        let search = std::env::join_paths([dir.path()]).unwrap();

        assert!(resolve_binary_path("tool", Some(&search)).is_empty());
    }

    #[test]
    fn name_with_separator_bypasses_the_search() {
        let dir = tempfile::tempdir().unwrap();
        let bin = fake_bin(dir.path(), "tool");

        let name = bin.to_str().unwrap();
        assert_eq!(resolve_binary_path(name, None), vec![bin.clone()]);
    }

    #[test]
    fn no_search_path_means_no_match() {
        assert!(resolve_binary_path("tool", None).is_empty());
    }
}
