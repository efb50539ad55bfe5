//! Parallel loading of a whole trace
//!
//! Rank files are independent, so they are read and parsed on the rayon
//! pool. The merge into [`Info`] is a serial fold in ascending rank order,
//! which keeps `add_info` lock-free and the result independent of thread
//! scheduling.

use rayon::prelude::*;
use std::path::{Path, PathBuf};

use super::{discover_rank_files, rank_file_path, read_rank_file, RankTrace};
use crate::diagnostics::{sort_diagnostics, IngestDiagnostic};
use crate::error::{TraceError, TraceResult};
use crate::model::{Info, RankId};

/// One rank file to load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankSource {
    pub rank: RankId,
    pub path: PathBuf,
}

/// A merged trace and the diagnostics collected while building it
#[derive(Debug, Clone, Default)]
pub struct LoadedTrace {
    pub info: Info,
    pub diagnostics: Vec<IngestDiagnostic>,
}

/// Fold parsed rank traces into one [`Info`]
///
/// Traces are merged in ascending rank order whatever order they arrive
/// in. Diagnostics are sorted and logged.
///
/// # Errors
/// `DuplicateRank` when two traces describe the same rank.
pub fn merge_rank_traces(mut traces: Vec<RankTrace>) -> TraceResult<LoadedTrace> {
    traces.sort_by_key(|trace| trace.rank.id());

    let mut loaded = LoadedTrace::default();
    for trace in traces {
        loaded.info.add_info(trace.object_info, trace.rank)?;
        loaded.diagnostics.extend(trace.diagnostics);
    }

    sort_diagnostics(&mut loaded.diagnostics);
    for diagnostic in &loaded.diagnostics {
        diagnostic.log();
    }
    Ok(loaded)
}

/// Read and parse every source in parallel, then merge
///
/// Every source is attempted before any error is reported.
///
/// # Errors
/// The first failing source in `sources` order, or `DuplicateRank`.
pub fn load_rank_files(sources: &[RankSource]) -> TraceResult<LoadedTrace> {
    let results: Vec<TraceResult<RankTrace>> = sources
        .par_iter()
        .map(|source| read_rank_file(&source.path, source.rank))
        .collect();
    let traces = results.into_iter().collect::<TraceResult<Vec<_>>>()?;

    let loaded = merge_rank_traces(traces)?;
    tracing::info!(
        ranks = loaded.info.num_ranks(),
        objects = loaded.info.object_info().len(),
        diagnostics = loaded.diagnostics.len(),
        "loaded trace"
    );
    Ok(loaded)
}

/// Load the trace stored in `dir`
///
/// With `n_ranks`, files `<stem>.0.json` to `<stem>.<n_ranks - 1>.json`
/// are required; otherwise every matching file in `dir` is loaded.
pub fn load_directory(dir: &Path, stem: &str, n_ranks: Option<usize>) -> TraceResult<LoadedTrace> {
    let sources: Vec<RankSource> = match n_ranks {
        Some(n) => (0..n)
            .map(|rank| {
                let rank = RankId::try_from(rank).map_err(|_| {
                    TraceError::InvalidConfig(format!("rank count {} is too large", n))
                })?;
                Ok(RankSource {
                    rank,
                    path: rank_file_path(dir, stem, rank),
                })
            })
            .collect::<TraceResult<_>>()?,
        None => discover_rank_files(dir, stem)?
            .into_iter()
            .map(|(rank, path)| RankSource { rank, path })
            .collect(),
    };

    if sources.is_empty() {
        return Err(TraceError::io(
            dir,
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no `{}.<rank>.json` files found", stem),
            ),
        ));
    }

    load_rank_files(&sources)
}
