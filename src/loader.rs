//! Word-list loading
//!
//! Reads source lines from files and directories. One file is one source;
//! sources found in a directory are named after the file stem.

use crate::encoding::LineReader;
use crate::error::{FilterError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// All lines of a word-list file
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    Ok(LineReader::open(path)?.collect())
}

/// Source name for a word-list file (its stem)
pub fn source_name(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// `(source name, path)` pairs for the word lists below `dir`, sorted by
/// name. Only files whose extension is listed in `extensions` are taken.
pub fn collect_files(dir: &Path, recursive: bool, extensions: &[String]) -> Result<Vec<(String, PathBuf)>> {
    if !dir.is_dir() {
        return Err(FilterError::invalid_argument(format!("not a directory: {:?}", dir)));
    }

    let walker = if recursive {
        WalkDir::new(dir)
    } else {
        WalkDir::new(dir).max_depth(1)
    };

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| FilterError::Io(e.into()))?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        let wanted = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| extensions.contains(&e.to_lowercase()))
            .unwrap_or(false);

        if let (true, Some(name)) = (wanted, source_name(path)) {
            files.push((name, path.to_path_buf()));
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_read_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("english.txt");
        fs::write(&path, "bad\n# comment\nworse\n").unwrap();

        assert_eq!(read_lines(&path).unwrap(), vec!["bad", "# comment", "worse"]);
    }

    #[test]
    fn test_missing_file() {
        let err = read_lines(Path::new("/definitely/not/here.txt"));
        assert!(matches!(err, Err(FilterError::Io(_))));
    }

    #[test]
    fn test_collect_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("german.txt"), "schlecht").unwrap();
        fs::write(dir.path().join("english.TXT"), "bad").unwrap();
        fs::write(dir.path().join("notes.md"), "ignored").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("french.txt"), "mauvais").unwrap();

        let extensions = vec!["txt".to_string()];

        let flat: Vec<_> = collect_files(dir.path(), false, &extensions)
            .unwrap()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(flat, vec!["english", "german"]);

        let deep = collect_files(dir.path(), true, &extensions).unwrap();
        assert_eq!(deep.len(), 3);
    }

    #[test]
    fn test_source_name() {
        assert_eq!(source_name(Path::new("/lists/english.txt")), Some("english".to_string()));
        assert_eq!(source_name(Path::new("/")), None);
    }
}
