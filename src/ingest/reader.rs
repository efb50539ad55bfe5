//! Reading rank files from disk

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::{parse_rank_trace, RankTrace};
use crate::error::{TraceError, TraceResult};
use crate::model::RankId;

/// File stem used when none is configured (`data.0.json`, `data.1.json`, ...)
pub const DEFAULT_FILE_STEM: &str = "data";

const JSON_SUFFIX: &str = ".json";
const GZIP_SUFFIX: &str = ".json.gz";

/// `<stem>.<rank>.json`
pub fn rank_file_name(stem: &str, rank: RankId) -> String {
    format!("{}.{}{}", stem, rank, JSON_SUFFIX)
}

/// Path of rank `rank`'s file in `dir`
///
/// Prefers `<stem>.<rank>.json`; falls back to `<stem>.<rank>.json.gz`
/// when only the compressed file exists.
pub fn rank_file_path(dir: &Path, stem: &str, rank: RankId) -> PathBuf {
    let plain = dir.join(rank_file_name(stem, rank));
    if plain.exists() {
        return plain;
    }
    let compressed = dir.join(format!("{}.{}{}", stem, rank, GZIP_SUFFIX));
    if compressed.exists() {
        compressed
    } else {
        plain
    }
}

/// Whether file content is compressed rather than a JSON document
///
/// A trace document is a JSON object, so anything whose first
/// non-whitespace byte is not `{` is treated as compressed.
pub fn is_compressed(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .map_or(false, |b| *b != b'{')
}

/// Read a rank file as text, decompressing when needed
pub fn read_trace_text(path: &Path) -> TraceResult<String> {
    let bytes = std::fs::read(path).map_err(|e| TraceError::io(path, e))?;

    let bytes = if is_compressed(&bytes) {
        decompress(path, &bytes)?
    } else {
        bytes
    };

    String::from_utf8(bytes)
        .map_err(|e| TraceError::malformed(path.display().to_string(), e.to_string()))
}

#[cfg(feature = "gzip")]
fn decompress(path: &Path, bytes: &[u8]) -> TraceResult<Vec<u8>> {
    use std::io::Read;

    let mut decoder = flate2::read::GzDecoder::new(bytes);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| TraceError::io(path, e))?;
    Ok(out)
}

#[cfg(not(feature = "gzip"))]
fn decompress(path: &Path, _bytes: &[u8]) -> TraceResult<Vec<u8>> {
    Err(TraceError::malformed(
        path.display().to_string(),
        "file is compressed but lbscope was built without the `gzip` feature",
    ))
}

/// Read and parse rank `rank`'s file
pub fn read_rank_file(path: &Path, rank: RankId) -> TraceResult<RankTrace> {
    let text = read_trace_text(path)?;
    parse_rank_trace(rank, &text)
}

/// Find `<stem>.<rank>.json[.gz]` files directly inside `dir`
///
/// # Returns
/// Rank id → path, ordered by rank. A plain file wins over a compressed
/// one for the same rank. Files that do not match the naming scheme are
/// ignored.
pub fn discover_rank_files(dir: &Path, stem: &str) -> TraceResult<BTreeMap<RankId, PathBuf>> {
    let mut files: BTreeMap<RankId, PathBuf> = BTreeMap::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| TraceError::io(dir, e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        let Some((rank, compressed)) = parse_rank_file_name(name, stem) else {
            continue;
        };

        // Sorted by name, so `x.json` is seen before `x.json.gz`
        if compressed && files.contains_key(&rank) {
            continue;
        }
        files.insert(rank, entry.into_path());
    }

    tracing::debug!(dir = %dir.display(), ranks = files.len(), "discovered rank files");
    Ok(files)
}

/// `data.12.json` → `(12, false)`, `data.3.json.gz` → `(3, true)`
fn parse_rank_file_name(name: &str, stem: &str) -> Option<(RankId, bool)> {
    let rest = name.strip_prefix(stem)?.strip_prefix('.')?;
    let (digits, compressed) = match rest.strip_suffix(GZIP_SUFFIX) {
        Some(digits) => (digits, true),
        None => (rest.strip_suffix(JSON_SUFFIX)?, false),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().map(|rank| (rank, compressed))
}
