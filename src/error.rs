//! Library error type
//!
//! Every fallible operation of the trace model, the analytics layer and the
//! layout engine returns [`TraceResult`]. Application layers (CLI, config
//! loading) wrap these in `anyhow::Error` with added context.

use std::path::PathBuf;

use crate::error_codes::*;
use crate::model::{ElementId, EntityKind, PhaseId, RankId};

/// Errors raised while building or analysing a trace
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    /// A rank document is missing a required field or has a mistyped one
    #[error("malformed trace ({context}): {reason}")]
    MalformedTrace { context: String, reason: String },

    /// `Info::add_info` was called twice for the same rank
    #[error("rank {0} is already part of the trace")]
    DuplicateRank(RankId),

    /// A communication whose endpoints are both absent from the phase
    ///
    /// Only ever carried inside diagnostics; ingestion drops such edges.
    #[error("communication {from} -> {to} in phase {phase} has no endpoint on rank {rank}")]
    UnresolvedCommunication {
        rank: RankId,
        phase: PhaseId,
        from: ElementId,
        to: ElementId,
    },

    /// QOI name matches neither a built-in nor any observed attribute
    #[error("unknown {kind} QOI: {name}")]
    UnknownQoi { kind: EntityKind, name: String },

    /// Rank grid shape does not cover the rank count exactly
    #[error("rank grid {nx}x{ny}x{nz} has {cells} cells but the trace has {ranks} ranks")]
    GridMismatch {
        nx: u64,
        ny: u64,
        nz: u64,
        cells: u64,
        ranks: usize,
    },

    /// A range bound was requested for a QOI without values in scope
    #[error("QOI {qoi} has no values in scope")]
    EmptyRange { qoi: String },

    /// Phase missing from one rank (`rank` set) or from the whole trace
    #[error("phase {phase} not found{}", .rank.map(|r| format!(" on rank {}", r)).unwrap_or_default())]
    PhaseNotFound {
        rank: Option<RankId>,
        phase: PhaseId,
    },

    #[error("object {object} not found in phase {phase}")]
    ObjectNotInPhase { phase: PhaseId, object: ElementId },

    #[error("rank {0} not found")]
    RankNotFound(RankId),

    /// Ranks disagree on how many phases the run has
    #[error("rank {rank} has {found} phases but rank {first_rank} has {expected}")]
    InconsistentPhases {
        first_rank: RankId,
        expected: usize,
        rank: RankId,
        found: usize,
    },

    #[error("communicator of object {found} cannot be attached to object {expected}")]
    CommunicatorMismatch { expected: ElementId, found: ElementId },

    /// QOI values in scope mix strings and numbers
    #[error("QOI {qoi} mixes string and numeric values")]
    QoiTypeMismatch { qoi: String },

    #[error("flat index {index} is outside a grid of {cells} cells")]
    IndexOutOfGrid { index: u64, cells: u64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TraceError {
    /// Stable `LBS-*` code for this error
    pub fn code(&self) -> &'static str {
        match self {
            TraceError::MalformedTrace { .. } => LBS_TRC_001_MALFORMED_TRACE,
            TraceError::DuplicateRank(_) => LBS_TRC_002_DUPLICATE_RANK,
            TraceError::UnresolvedCommunication { .. } => LBS_TRC_003_UNRESOLVED_COMMUNICATION,
            TraceError::PhaseNotFound { .. } => LBS_TRC_004_PHASE_NOT_FOUND,
            TraceError::ObjectNotInPhase { .. } => LBS_TRC_005_OBJECT_NOT_IN_PHASE,
            TraceError::RankNotFound(_) => LBS_TRC_006_RANK_NOT_FOUND,
            TraceError::InconsistentPhases { .. } => LBS_TRC_007_INCONSISTENT_PHASES,
            TraceError::CommunicatorMismatch { .. } => LBS_TRC_008_COMMUNICATOR_MISMATCH,
            TraceError::UnknownQoi { .. } => LBS_QOI_001_UNKNOWN_QOI,
            TraceError::EmptyRange { .. } => LBS_QOI_002_EMPTY_RANGE,
            TraceError::QoiTypeMismatch { .. } => LBS_QOI_003_TYPE_MISMATCH,
            TraceError::GridMismatch { .. } => LBS_LAY_001_GRID_MISMATCH,
            TraceError::IndexOutOfGrid { .. } => LBS_LAY_002_INDEX_OUT_OF_GRID,
            TraceError::InvalidConfig(_) => LBS_CFG_001_INVALID_CONFIG,
            TraceError::Io { .. } => LBS_IO_001_IO_FAILED,
            TraceError::Json(_) => LBS_IO_002_JSON_FAILED,
        }
    }

    pub(crate) fn malformed(context: impl Into<String>, reason: impl Into<String>) -> Self {
        TraceError::MalformedTrace {
            context: context.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TraceError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias used across the library
pub type TraceResult<T> = Result<T, TraceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_follow_variant_category() {
        assert_eq!(TraceError::DuplicateRank(3).code(), "LBS-TRC-002");
        assert_eq!(
            TraceError::UnknownQoi {
                kind: EntityKind::Object,
                name: "shared_block_id".to_string()
            }
            .code(),
            "LBS-QOI-001"
        );
        assert_eq!(
            TraceError::InvalidConfig("x_ranks".into()).code(),
            "LBS-CFG-001"
        );
    }

    #[test]
    fn test_unknown_qoi_message_names_kind_and_qoi() {
        let err = TraceError::UnknownQoi {
            kind: EntityKind::Rank,
            name: "shared_block_id".to_string(),
        };
        assert_eq!(err.to_string(), "unknown rank QOI: shared_block_id");
    }

    #[test]
    fn test_trace_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TraceError>();
    }
}
