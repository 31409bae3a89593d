//! Makefile-fragment dependency file reader.
//!
//! Compilers invoked with `-MMD` write a `.d` file next to each object:
//! `main.c.o: main.c util.h \` followed by continuation lines. The reader
//! recovers the header list from the previous run; a missing file means
//! "no prior knowledge" and yields an empty list.

use std::fs;
use std::path::{Path, PathBuf};

/// Parse a depfile into the list of header paths it names.
///
/// Everything up to and including the last `:` is the target portion and
/// is discarded. The remainder is split on whitespace; empty tokens,
/// line-continuation backslashes, and the depfile's own path are dropped.
pub fn parse(path: &Path) -> Vec<PathBuf> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => return Vec::new(),
    };

    let deps = match content.rfind(':') {
        Some(idx) => &content[idx + 1..],
        None => return Vec::new(),
    };

    deps.split_whitespace()
        .filter(|token| *token != "\\" && Path::new(token) != path)
        .map(PathBuf::from)
        .collect()
}
