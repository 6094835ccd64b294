//! Small corpus-loading helpers.
//!
//! These are not on the batch pipeline's hot path. They load an entire file
//! or directory into memory and exist for the collaborators that consume the
//! artifact (seed tooling, tests, ad-hoc inspection of small corpora).

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Result, SiftError};

/// Read all non-empty lines of a file.
pub fn load_lines(path: &Path) -> Result<Vec<Vec<u8>>> {
    let file = File::open(path).map_err(|e| SiftError::io(path, "open file", e))?;
    let mut reader = BufReader::new(file);

    let mut lines = Vec::new();
    let mut line: Vec<u8> = Vec::new();
    loop {
        line.clear();
        let n = reader
            .read_until(b'\n', &mut line)
            .map_err(|e| SiftError::io(path, "read file", e))?;
        if n == 0 {
            break;
        }
        if line.last() == Some(&b'\n') {
            line.pop();
        }
        if !line.is_empty() {
            lines.push(line.clone());
        }
    }
    Ok(lines)
}

/// Load a whole directory into a record → source-index map.
///
/// Source indices follow the same name-sorted enumeration the pipeline uses;
/// sub-directories are skipped. A record occurring several times in one file
/// repeats its index; see [`dedup_source_indices`].
pub fn load_directory(dir: &Path) -> Result<HashMap<Vec<u8>, Vec<u32>>> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| SiftError::config(dir, format!("cannot read directory: {}", e)))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry =
            entry.map_err(|e| SiftError::config(dir, format!("cannot read directory: {}", e)))?;
        let file_type = entry
            .file_type()
            .map_err(|e| SiftError::io(entry.path(), "stat directory entry", e))?;
        if !file_type.is_dir() {
            files.push(entry.path());
        }
    }
    files.sort();

    let mut records: HashMap<Vec<u8>, Vec<u32>> = HashMap::new();
    for (index, path) in files.iter().enumerate() {
        for record in load_lines(path)? {
            records.entry(record).or_default().push(index as u32);
        }
    }
    Ok(records)
}

/// Remove duplicate source indices, preserving first-seen order.
pub fn dedup_source_indices(indices: &[u32]) -> Vec<u32> {
    let mut seen = std::collections::HashSet::new();
    indices
        .iter()
        .copied()
        .filter(|idx| seen.insert(*idx))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_lines_skips_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("codes.txt");
        fs::write(&path, "HAPPYHRS\n\nFIFTYOFF\n\n").unwrap();

        let lines = load_lines(&path).unwrap();
        assert_eq!(lines, vec![b"HAPPYHRS".to_vec(), b"FIFTYOFF".to_vec()]);
    }

    #[test]
    fn test_load_lines_missing_file() {
        let dir = tempdir().unwrap();
        assert!(load_lines(&dir.path().join("absent.txt")).is_err());
    }

    #[test]
    fn test_load_directory_indexes_by_sorted_file_order() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "SHAREDCD\n").unwrap();
        fs::write(dir.path().join("a.txt"), "SHAREDCD\nONLYINAA\n").unwrap();

        let records = load_directory(dir.path()).unwrap();
        assert_eq!(records[&b"SHAREDCD".to_vec()], vec![0, 1]);
        assert_eq!(records[&b"ONLYINAA".to_vec()], vec![0]);
    }

    #[test]
    fn test_load_directory_repeats_index_for_duplicates() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "DUPLICAT\nDUPLICAT\n").unwrap();

        let records = load_directory(dir.path()).unwrap();
        assert_eq!(records[&b"DUPLICAT".to_vec()], vec![0, 0]);
    }

    #[test]
    fn test_dedup_source_indices() {
        assert_eq!(dedup_source_indices(&[0, 1, 0, 2, 1]), vec![0, 1, 2]);
        assert_eq!(dedup_source_indices(&[]), Vec::<u32>::new());
        assert_eq!(dedup_source_indices(&[3, 3, 3]), vec![3]);
    }
}
