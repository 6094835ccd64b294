//! Output artifact writer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{Result, SiftError};

/// Write codes to a plain text file, one per line.
///
/// The file ends with a newline iff there is at least one code. An existing
/// file at `path` is overwritten in place.
pub fn write_codes(codes: &[Vec<u8>], path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| SiftError::io(path, "create output file", e))?;
    let mut writer = BufWriter::new(file);

    for code in codes {
        writer
            .write_all(code)
            .and_then(|_| writer.write_all(b"\n"))
            .map_err(|e| SiftError::io(path, "write output file", e))?;
    }

    writer
        .flush()
        .map_err(|e| SiftError::io(path, "flush output file", e))
}
