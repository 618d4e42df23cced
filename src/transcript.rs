//! Newline-delimited JSON transcript reading.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use serde_json::Value;

/// Read every parsable line of a transcript. Blank, malformed and non-UTF-8
/// lines are skipped; only failing to open or read the file is an error.
pub fn read_messages(path: &Path) -> io::Result<Vec<Value>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut messages = Vec::new();
    for line in reader.split(b'\n') {
        let line = line?;
        let t = line.trim_ascii();
        if t.is_empty() {
            continue;
        }
        match serde_json::from_slice::<Value>(t) {
            Ok(v) => messages.push(v),
            Err(e) => tracing::debug!("skipping malformed transcript line: {e}"),
        }
    }
    Ok(messages)
}
