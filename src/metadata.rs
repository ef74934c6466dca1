//! Reading string fields out of a sidecar's metadata record.
//!
//! Records are Lua table literals as written by e-reader software:
//!
//! ```text
//! -- saved by reader
//! return {
//!     ["doc_path"] = "/books/novel.epub",
//!     ["percent_finished"] = 0.42,
//! }
//! ```
//!
//! Only string-valued assignments are understood; everything else is ignored.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?:\[\s*"(?P<k1>[^"]+)"\s*\]|\[\s*'(?P<k2>[^']+)'\s*\]|\b(?P<k3>[A-Za-z_][A-Za-z0-9_]*))\s*=\s*(?:"(?P<v1>(?:[^"\\]|\\(?s:.))*)"|'(?P<v2>(?:[^'\\]|\\(?s:.))*)')"#,
    )
    .expect("assignment pattern is valid")
});

#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("no metadata record in {0}")]
    Missing(PathBuf),

    #[error("cannot read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} is not a metadata table")]
    NotATable(PathBuf),

    #[error("field '{field}' missing from {path}")]
    FieldMissing { field: String, path: PathBuf },
}

/// Locate the record inside `sidecar`: the exact `file_name` first, then a
/// per-format variant such as `metadata.epub.lua` for `metadata.lua`.
pub fn find_record(sidecar: &Path, file_name: &str) -> Option<PathBuf> {
    let exact = sidecar.join(file_name);
    if exact.is_file() {
        return Some(exact);
    }

    let (stem, ext) = file_name.split_once('.')?;
    let prefix = format!("{stem}.");
    let suffix = format!(".{ext}");

    let mut variants: Vec<PathBuf> = std::fs::read_dir(sidecar)
        .ok()?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter(|e| {
            let name = e.file_name();
            let name = name.to_string_lossy();
            name.len() > prefix.len() + suffix.len()
                && name.starts_with(&prefix)
                && name.ends_with(&suffix)
        })
        .map(|e| e.path())
        .collect();
    variants.sort();
    variants.into_iter().next()
}

/// Read `field` from the record called `file_name` inside `sidecar`.
///
/// The record must be one complete table; a truncated or otherwise broken
/// record yields `NotATable` even if the field itself is readable.
pub fn read_field(sidecar: &Path, file_name: &str, field: &str) -> Result<String, MetadataError> {
    let path =
        find_record(sidecar, file_name).ok_or_else(|| MetadataError::Missing(sidecar.into()))?;
    let raw = std::fs::read_to_string(&path).map_err(|source| MetadataError::Unreadable {
        path: path.clone(),
        source,
    })?;
    if !is_complete_table(&raw) {
        return Err(MetadataError::NotATable(path));
    }
    extract_field(&raw, field).ok_or(MetadataError::FieldMissing {
        field: field.to_string(),
        path,
    })
}

/// Whether `source` holds exactly one table with balanced braces, every
/// string and comment terminated, and nothing but comments after it.
pub fn is_complete_table(source: &str) -> bool {
    let bytes = source.as_bytes();
    let mut depth = 0usize;
    let mut closed = false;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if bytes[i..].starts_with(b"--") {
            i += 2;
            i = match long_bracket_level(bytes, i) {
                Some(level) => match skip_long_bracket(bytes, i, level) {
                    Some(next) => next,
                    None => return false,
                },
                None => bytes[i..]
                    .iter()
                    .position(|&c| c == b'\n')
                    .map_or(bytes.len(), |p| i + p),
            };
            continue;
        }
        if closed && !b.is_ascii_whitespace() {
            return false;
        }
        match b {
            b'"' | b'\'' => match skip_quoted(bytes, i) {
                Some(next) => i = next,
                None => return false,
            },
            b'[' => match long_bracket_level(bytes, i) {
                Some(level) => match skip_long_bracket(bytes, i, level) {
                    Some(next) => i = next,
                    None => return false,
                },
                None => i += 1,
            },
            b'{' => {
                depth += 1;
                i += 1;
            }
            b'}' => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
                closed = depth == 0;
                i += 1;
            }
            _ => i += 1,
        }
    }
    closed
}

/// Index just past the short string starting at `start`.
fn skip_quoted(bytes: &[u8], start: usize) -> Option<usize> {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' => return None,
            c if c == quote => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

/// `[[`, `[=[`, `[==[`... at `i`: the number of `=` signs.
fn long_bracket_level(bytes: &[u8], i: usize) -> Option<usize> {
    if bytes.get(i) != Some(&b'[') {
        return None;
    }
    let level = bytes[i + 1..].iter().take_while(|&&c| c == b'=').count();
    (bytes.get(i + 1 + level) == Some(&b'[')).then_some(level)
}

/// Index just past the long bracket opened at `start`.
fn skip_long_bracket(bytes: &[u8], start: usize, level: usize) -> Option<usize> {
    let mut close = vec![b']'];
    close.extend(std::iter::repeat(b'=').take(level));
    close.push(b']');
    let body = start + level + 2;
    bytes[body..]
        .windows(close.len())
        .position(|w| w == close.as_slice())
        .map(|p| body + p + close.len())
}

/// First string assignment to `field` in `source`, with escapes resolved.
/// Values that do not decode to UTF-8 are treated as absent.
pub fn extract_field(source: &str, field: &str) -> Option<String> {
    ASSIGNMENT.captures_iter(source).find_map(|caps| {
        let key = caps
            .name("k1")
            .or_else(|| caps.name("k2"))
            .or_else(|| caps.name("k3"))?;
        if key.as_str() != field {
            return None;
        }
        let value = caps.name("v1").or_else(|| caps.name("v2"))?;
        unescape(value.as_str())
    })
}

/// Resolve Lua escapes. `\ddd` and `\xXX` are raw bytes, so the result is
/// assembled as bytes and checked as UTF-8 at the end.
fn unescape(raw: &str) -> Option<String> {
    let mut out = Vec::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u8; 4];
            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        match chars.next() {
            Some('n') | Some('\n') => out.push(b'\n'),
            Some('t') => out.push(b'\t'),
            Some('r') => out.push(b'\r'),
            Some('a') => out.push(0x07),
            Some('b') => out.push(0x08),
            Some('f') => out.push(0x0c),
            Some('v') => out.push(0x0b),
            Some('x') => {
                let hi = chars.next()?.to_digit(16)?;
                let lo = chars.next()?.to_digit(16)?;
                out.push((hi * 16 + lo) as u8);
            }
            Some(d) if d.is_ascii_digit() => {
                // \ddd: up to three decimal digits, one byte
                let mut code = d.to_digit(10).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|n| n.to_digit(10)) {
                        Some(n) => {
                            code = code * 10 + n;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push(u8::try_from(code).ok()?);
            }
            Some(other) => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(other.encode_utf8(&mut buf).as_bytes());
            }
            None => out.push(b'\\'),
        }
    }
    String::from_utf8(out).ok()
}
