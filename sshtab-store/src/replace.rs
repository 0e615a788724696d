use crate::error::{StoreError, StoreResult};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tempfile::Builder;

/// Atomically replace `path` with `contents`.
///
/// Writes a temp file in the same directory, fsyncs it, renames it over
/// `path` and fsyncs the directory. The temp file is removed on any
/// failure, so readers see either the old or the new file.
pub(crate) fn replace_file(path: &Path, contents: &[u8]) -> StoreResult<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let prefix = match path.file_name() {
        Some(name) => format!("{}.tmp.", name.to_string_lossy()),
        None => ".tmp.".to_string(),
    };

    let mut tmp = Builder::new()
        .prefix(&prefix)
        .tempfile_in(dir)
        .map_err(StoreError::io("mkstemp"))?;
    tmp.write_all(contents).map_err(StoreError::io("write"))?;
    tmp.as_file().sync_all().map_err(StoreError::io("fsync"))?;
    tmp.persist(path)
        .map_err(|err| StoreError::io("rename")(err.error))?;

    File::open(dir)
        .and_then(|d| d.sync_all())
        .map_err(StoreError::io("fsync dir"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_content_and_leaves_no_temp_files() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("aliases.log");
        std::fs::write(&path, "old\n").unwrap();

        replace_file(&path, b"new\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new\n");
        let names: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("aliases.log")]);
    }

    #[test]
    fn failure_removes_temp_file() {
        let tmp = tempfile::tempdir().unwrap();
        // Renaming a file over a non-empty directory fails.
        let target = tmp.path().join("occupied");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep"), "x").unwrap();

        let err = replace_file(&target, b"data").unwrap_err();
        assert!(matches!(err, StoreError::Io { op: "rename", .. }));

        let names: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("occupied")]);
    }
}
