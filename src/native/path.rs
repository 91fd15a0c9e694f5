use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Looks `name` up the way a shell would: names containing a path
/// separator are checked as-is, bare names are searched in `PATH`.
pub fn resolve(name: &str) -> Option<PathBuf> {
    resolve_in(name, std::env::var_os("PATH").as_deref())
}

pub fn resolve_in(name: &str, search_path: Option<&OsStr>) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }

    let candidate = Path::new(name);
    if candidate.components().count() > 1 || candidate.is_absolute() {
        return with_exe_suffix(candidate).into_iter().find(|p| is_executable(p));
    }

    std::env::split_paths(search_path?)
        .flat_map(|dir| with_exe_suffix(&dir.join(name)))
        .find(|p| is_executable(p))
}

fn with_exe_suffix(path: &Path) -> Vec<PathBuf> {
    let suffix = std::env::consts::EXE_SUFFIX;
    let mut paths = vec![path.to_path_buf()];
    if !suffix.is_empty() && path.extension().is_none() {
        let mut with_suffix = path.as_os_str().to_owned();
        with_suffix.push(suffix);
        paths.push(PathBuf::from(with_suffix));
    }
    paths
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(all(test, unix))]
mod tests {
    use std::ffi::OsString;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    use super::*;

    fn write_tool(dir: &Path, name: &str, mode: u32) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, "#!/bin/sh\nexit 0\n").expect("Failed to write file");
        fs::set_permissions(&path, fs::Permissions::from_mode(mode))
            .expect("Failed to make script executable");
        path
    }

    #[test]
    fn test_resolve_searches_in_order() {
        let first = tempfile::tempdir().expect("Failed to create temp dir");
        let second = tempfile::tempdir().expect("Failed to create temp dir");
        write_tool(second.path(), "g++", 0o755);
        let preferred = write_tool(first.path(), "g++", 0o755);

        let search_path =
            std::env::join_paths([first.path(), second.path()]).expect("Failed to join paths");
        assert_eq!(resolve_in("g++", Some(&search_path)), Some(preferred));
    }

    #[test]
    fn test_resolve_skips_non_executable() {
        let first = tempfile::tempdir().expect("Failed to create temp dir");
        let second = tempfile::tempdir().expect("Failed to create temp dir");
        write_tool(first.path(), "clang", 0o644);
        let runnable = write_tool(second.path(), "clang", 0o755);

        let search_path =
            std::env::join_paths([first.path(), second.path()]).expect("Failed to join paths");
        assert_eq!(resolve_in("clang", Some(&search_path)), Some(runnable));
    }

    #[test]
    fn test_resolve_missing() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let search_path = OsString::from(dir.path());
        assert_eq!(resolve_in("javac", Some(&search_path)), None);
        assert_eq!(resolve_in("javac", None), None);
        assert_eq!(resolve_in("", Some(&search_path)), None);
    }

    #[test]
    fn test_resolve_explicit_path() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let tool = write_tool(dir.path(), "my-gcc", 0o755);

        assert_eq!(resolve_in(tool.to_str().unwrap(), None), Some(tool.clone()));
        assert_eq!(
            resolve_in(dir.path().join("missing").to_str().unwrap(), None),
            None
        );
    }
}
