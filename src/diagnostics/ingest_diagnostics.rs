//! Ingest diagnostics for dropped, one-sided and ignored communications.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TraceError;
use crate::model::{ElementId, PhaseId, RankId};

/// Direction of a recorded communication edge, seen from its owner
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EdgeDirection {
    Sent,
    Received,
}

impl EdgeDirection {
    /// Stable sort key for deterministic ordering.
    pub fn sort_key(&self) -> u8 {
        match self {
            EdgeDirection::Sent => 0,
            EdgeDirection::Received => 1,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            EdgeDirection::Sent => "sent to",
            EdgeDirection::Received => "received from",
        }
    }
}

impl fmt::Display for EdgeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// A non-fatal event from the ingestion or normalization pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IngestDiagnostic {
    /// Neither endpoint of a communication is resident on the reading rank;
    /// the edge was dropped
    UnresolvedCommunication {
        rank: RankId,
        phase: PhaseId,
        from: ElementId,
        to: ElementId,
        bytes: f64,
    },
    /// An object communicated with itself; the edge was kept
    SelfCommunication {
        rank: RankId,
        phase: PhaseId,
        object: ElementId,
        bytes: f64,
    },
    /// Edge whose peer is absent from the phase, so no reverse edge could
    /// be synthesized
    OneSidedEdge {
        rank: RankId,
        phase: PhaseId,
        object: ElementId,
        peer: ElementId,
        direction: EdgeDirection,
    },
    /// Communication of a type other than `SendRecv`
    IgnoredCommunication {
        rank: RankId,
        phase: PhaseId,
        comm_type: String,
    },
}

impl IngestDiagnostic {
    pub fn rank(&self) -> RankId {
        match self {
            IngestDiagnostic::UnresolvedCommunication { rank, .. }
            | IngestDiagnostic::SelfCommunication { rank, .. }
            | IngestDiagnostic::OneSidedEdge { rank, .. }
            | IngestDiagnostic::IgnoredCommunication { rank, .. } => *rank,
        }
    }

    pub fn phase(&self) -> PhaseId {
        match self {
            IngestDiagnostic::UnresolvedCommunication { phase, .. }
            | IngestDiagnostic::SelfCommunication { phase, .. }
            | IngestDiagnostic::OneSidedEdge { phase, .. }
            | IngestDiagnostic::IgnoredCommunication { phase, .. } => *phase,
        }
    }

    /// Stable sort key for deterministic ordering.
    ///
    /// Primary: phase, then rank
    /// Secondary: variant (unresolved, self, one-sided, ignored)
    /// Tertiary: object and peer ids, then edge direction
    pub fn sort_key(&self) -> (PhaseId, RankId, u8, ElementId, ElementId, u8) {
        match self {
            IngestDiagnostic::UnresolvedCommunication {
                rank, phase, from, to, ..
            } => (*phase, *rank, 0, *from, *to, 0),
            IngestDiagnostic::SelfCommunication {
                rank, phase, object, ..
            } => (*phase, *rank, 1, *object, *object, 0),
            IngestDiagnostic::OneSidedEdge {
                rank,
                phase,
                object,
                peer,
                direction,
            } => (*phase, *rank, 2, *object, *peer, direction.sort_key()),
            IngestDiagnostic::IgnoredCommunication { rank, phase, .. } => {
                (*phase, *rank, 3, 0, 0, 0)
            }
        }
    }

    /// Equivalent error value, for callers that escalate diagnostics
    pub fn to_error(&self) -> Option<TraceError> {
        match self {
            IngestDiagnostic::UnresolvedCommunication {
                rank, phase, from, to, ..
            } => Some(TraceError::UnresolvedCommunication {
                rank: *rank,
                phase: *phase,
                from: *from,
                to: *to,
            }),
            _ => None,
        }
    }

    /// Emit through `tracing`; ignored communication types are debug noise.
    ///
    /// Diagnostics with an error counterpart carry its stable code.
    pub fn log(&self) {
        match (self, self.to_error()) {
            (IngestDiagnostic::IgnoredCommunication { .. }, _) => tracing::debug!("{}", self),
            (_, Some(err)) => tracing::warn!(code = err.code(), "{}", self),
            (_, None) => tracing::warn!("{}", self),
        }
    }

    /// Format for human-readable stderr output.
    ///
    /// Examples:
    /// - "UNRESOLVED rank 0 phase 2: 5 -> 9 (12 bytes)"
    /// - "ONE-SIDED rank 1 phase 0: 4 sent to 8"
    pub fn format_stderr(&self) -> String {
        match self {
            IngestDiagnostic::UnresolvedCommunication {
                rank,
                phase,
                from,
                to,
                bytes,
            } => format!(
                "UNRESOLVED rank {} phase {}: {} -> {} ({} bytes)",
                rank, phase, from, to, bytes
            ),
            IngestDiagnostic::SelfCommunication {
                rank,
                phase,
                object,
                bytes,
            } => format!(
                "SELF rank {} phase {}: {} -> {} ({} bytes)",
                rank, phase, object, object, bytes
            ),
            IngestDiagnostic::OneSidedEdge {
                rank,
                phase,
                object,
                peer,
                direction,
            } => format!(
                "ONE-SIDED rank {} phase {}: {} {} {}",
                rank, phase, object, direction, peer
            ),
            IngestDiagnostic::IgnoredCommunication {
                rank,
                phase,
                comm_type,
            } => format!(
                "IGNORED rank {} phase {}: communication type {}",
                rank, phase, comm_type
            ),
        }
    }
}

impl fmt::Display for IngestDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_stderr())
    }
}

/// Sort diagnostics by [`IngestDiagnostic::sort_key`].
pub fn sort_diagnostics(diagnostics: &mut [IngestDiagnostic]) {
    diagnostics.sort_by_key(IngestDiagnostic::sort_key);
}
