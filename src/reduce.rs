//! Single-bucket reduction.
//!
//! A spill file holds `<record>|<source-index>` lines for every record that
//! hashed into its bucket. The reducer emits each record that was seen under
//! at least two distinct source indices. A record is *promoted* the moment
//! its second source appears: it is pushed to the output, its source set is
//! released, and every later occurrence is ignored. Per-record state is
//! therefore capped at two indices no matter how often a record recurs, which
//! keeps the working set small even for heavily duplicated buckets.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Result, SiftError};

/// Per-record reduction state.
struct CodeState {
    /// Distinct source indices observed so far; emptied on promotion.
    sources: Vec<u32>,
    promoted: bool,
}

/// Parse one spill line as `<record>|<decimal-source-index>`.
///
/// Exactly one `|` must separate the record from a non-negative decimal
/// index. Anything else (no delimiter, a second delimiter, a non-numeric or
/// negative index) is treated as corruption and yields `None`. Records
/// containing `|` fall out here as a consequence; they are outside the input
/// contract and their spill lines are dropped.
fn parse_spill_line(line: &[u8]) -> Option<(&[u8], u32)> {
    let pos = line.iter().position(|&b| b == b'|')?;
    let (record, index) = (&line[..pos], &line[pos + 1..]);
    if index.contains(&b'|') || index.is_empty() {
        return None;
    }
    std::str::from_utf8(index)
        .ok()?
        .parse::<u32>()
        .ok()
        .map(|idx| (record, idx))
}

/// Reduce one spill file to the records present in at least two sources.
///
/// Emission order within a bucket is incidental; the orchestrator sorts
/// globally. Malformed lines are skipped, never fatal; only I/O failures
/// (open, read) fail the worker.
pub fn reduce_spill(path: &Path) -> Result<Vec<Vec<u8>>> {
    let file = File::open(path).map_err(|e| SiftError::io(path, "open spill file", e))?;
    let mut reader = BufReader::new(file);

    let mut states: HashMap<Vec<u8>, CodeState> = HashMap::new();
    let mut valid: Vec<Vec<u8>> = Vec::new();
    let mut line: Vec<u8> = Vec::new();

    loop {
        line.clear();
        let n = reader
            .read_until(b'\n', &mut line)
            .map_err(|e| SiftError::io(path, "read spill file", e))?;
        if n == 0 {
            break;
        }
        if line.last() == Some(&b'\n') {
            line.pop();
        }

        let Some((record, index)) = parse_spill_line(&line) else {
            continue;
        };

        match states.get_mut(record) {
            Some(state) => {
                if state.promoted || state.sources.contains(&index) {
                    continue;
                }
                state.sources.push(index);
                if state.sources.len() >= 2 {
                    state.promoted = true;
                    state.sources = Vec::new();
                    valid.push(record.to_vec());
                }
            }
            None => {
                states.insert(
                    record.to_vec(),
                    CodeState {
                        sources: vec![index],
                        promoted: false,
                    },
                );
            }
        }
    }

    Ok(valid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn reduce_content(content: &str) -> Vec<String> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bucket_000.txt");
        fs::write(&path, content).unwrap();
        let mut codes: Vec<String> = reduce_spill(&path)
            .unwrap()
            .into_iter()
            .map(|c| String::from_utf8(c).unwrap())
            .collect();
        codes.sort_unstable();
        codes
    }

    #[test]
    fn test_multi_source_records_emitted() {
        let codes = reduce_content(
            "HAPPYHRS|0\nHAPPYHRS|1\nFIFTYOFF|0\nFIFTYOFF|2\nTESTCODE|0\nSHORTCD|1\nSHORTCD|2\n",
        );
        assert_eq!(codes, vec!["FIFTYOFF", "HAPPYHRS", "SHORTCD"]);
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let codes =
            reduce_content("TESTCODE0\nX|0|extra\nY|abc\nZ|-1\nGOODCODE|1\nGOODCODE|2\n");
        assert_eq!(codes, vec!["GOODCODE"]);
    }

    #[test]
    fn test_duplicates_within_one_source_do_not_count() {
        let mut content = String::new();
        for _ in 0..100 {
            content.push_str("LONELYCODE|0\n");
        }
        assert!(reduce_content(&content).is_empty());
    }

    #[test]
    fn test_occurrences_after_promotion_ignored() {
        let codes = reduce_content("REPEATED|0\nREPEATED|1\nREPEATED|2\nREPEATED|0\n");
        assert_eq!(codes, vec!["REPEATED"]);
    }

    #[test]
    fn test_empty_spill_file() {
        assert!(reduce_content("").is_empty());
    }

    #[test]
    fn test_whitespace_inside_record_is_admitted() {
        let codes = reduce_content("GOOD CODE|0\nGOOD CODE|1\n");
        assert_eq!(codes, vec!["GOOD CODE"]);
    }

    #[test]
    fn test_missing_spill_file_is_fatal() {
        let dir = tempdir().unwrap();
        let err = reduce_spill(&dir.path().join("absent.txt")).unwrap_err();
        assert!(err.to_string().contains("absent.txt"));
    }

    #[test]
    fn test_parse_spill_line() {
        assert_eq!(parse_spill_line(b"CODE|12"), Some((&b"CODE"[..], 12)));
        assert_eq!(parse_spill_line(b"A|B|0"), None);
        assert_eq!(parse_spill_line(b"CODE"), None);
        assert_eq!(parse_spill_line(b"CODE|"), None);
        assert_eq!(parse_spill_line(b"CODE|-3"), None);
        assert_eq!(parse_spill_line(b"CODE|1x"), None);
    }
}
