//! Edge normalization
//!
//! During ingestion each rank records an edge on whichever endpoint it
//! hosts, so an edge between two ranks is usually seen from one side only.
//! Normalization makes every in-phase edge visible from both endpoints.

use serde::Serialize;

use super::{ElementId, Info, PhaseId, RankId};
use crate::diagnostics::{sort_diagnostics, EdgeDirection, IngestDiagnostic};
use crate::error::TraceResult;

/// Outcome of normalizing one phase
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizeReport {
    pub phase: PhaseId,
    /// Number of synthesized reverse edges
    pub added: usize,
    /// Edges whose peer is not resident anywhere in the phase
    pub diagnostics: Vec<IngestDiagnostic>,
}

/// A reverse edge to add to `object` on `rank`
struct Repair {
    rank: RankId,
    object: ElementId,
    peer: ElementId,
    bytes: f64,
    direction: EdgeDirection,
}

impl Info {
    /// Synthesize missing reverse edges in `phase`
    ///
    /// # Behavior
    /// - A sent A→B with no received-from-A on B adds `received(A, bytes)`
    ///   to B; a received B←A with no sent-to-B on A adds `sent(B, bytes)`
    ///   to A. Every recorded value is mirrored, so volumes stay balanced.
    /// - Endpoints may live on different ranks; edges whose peer is absent
    ///   from the phase stay one-sided and are reported.
    ///
    /// # Guarantees
    /// Idempotent: a second call on the same phase adds nothing. A phase
    /// no rank recorded yields an empty report.
    pub fn normalize_edges(&mut self, phase: PhaseId) -> TraceResult<NormalizeReport> {
        let locations = self.object_locations(phase);
        let mut repairs = Vec::new();
        let mut diagnostics = Vec::new();

        for (rank, object) in self.phase_objects(phase) {
            let comm = object.communicator();
            let peers = comm
                .sent()
                .map(|(peer, bytes)| (peer, bytes, EdgeDirection::Sent))
                .chain(
                    comm.received()
                        .map(|(peer, bytes)| (peer, bytes, EdgeDirection::Received)),
                );

            for (peer, bytes, direction) in peers {
                let Some(peer_rank) = locations.get(&peer).copied() else {
                    diagnostics.push(IngestDiagnostic::OneSidedEdge {
                        rank,
                        phase,
                        object: object.id(),
                        peer,
                        direction,
                    });
                    continue;
                };
                let Some(peer_work) = self
                    .rank(peer_rank)?
                    .phase(phase)
                    .and_then(|work| work.object(peer))
                else {
                    continue;
                };

                let peer_comm = peer_work.communicator();
                let mirrored = match direction {
                    EdgeDirection::Sent => peer_comm.has_received_from(object.id()),
                    EdgeDirection::Received => peer_comm.has_sent_to(object.id()),
                };
                if !mirrored {
                    repairs.push(Repair {
                        rank: peer_rank,
                        object: peer,
                        peer: object.id(),
                        bytes,
                        direction,
                    });
                }
            }
        }

        let added = repairs.len();
        for repair in repairs {
            let rank = self.rank_mut(repair.rank)?;
            match repair.direction {
                EdgeDirection::Sent => rank.add_object_received_communication_at_phase(
                    phase,
                    repair.object,
                    repair.peer,
                    repair.bytes,
                )?,
                EdgeDirection::Received => rank.add_object_sent_communication_at_phase(
                    phase,
                    repair.object,
                    repair.peer,
                    repair.bytes,
                )?,
            }
        }

        sort_diagnostics(&mut diagnostics);
        if added > 0 {
            tracing::debug!(phase, added, "synthesized reverse communication edges");
        }

        Ok(NormalizeReport {
            phase,
            added,
            diagnostics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ObjectWork, PhaseWork, Rank};
    use std::collections::BTreeMap;

    /// Two ranks, one object each: 1 on rank 0 and 2 on rank 1
    fn two_rank_info() -> Info {
        let mut info = Info::new();
        for (rank, object) in [(0, 1), (1, 2)] {
            let phase = PhaseWork::new(0, [(object, ObjectWork::new(object, 1.0))].into_iter().collect());
            info.add_info(BTreeMap::new(), Rank::new(rank, [(0, phase)].into_iter().collect()))
                .unwrap();
        }
        info
    }

    fn object(info: &Info, rank: RankId, id: ElementId) -> &ObjectWork {
        info.rank(rank).unwrap().phase(0).unwrap().object(id).unwrap()
    }

    #[test]
    fn test_sent_edge_gets_received_mirror() {
        let mut info = two_rank_info();
        info.rank_mut(0)
            .unwrap()
            .add_object_sent_communication_at_phase(0, 1, 2, 6.0)
            .unwrap();

        let report = info.normalize_edges(0).unwrap();
        assert_eq!(report.added, 1);
        assert!(report.diagnostics.is_empty());

        let peer = object(&info, 1, 2);
        assert_eq!(peer.communicator().received().collect::<Vec<_>>(), vec![(1, 6.0)]);
    }

    #[test]
    fn test_received_edge_gets_sent_mirror() {
        let mut info = two_rank_info();
        info.rank_mut(1)
            .unwrap()
            .add_object_received_communication_at_phase(0, 2, 1, 3.0)
            .unwrap();

        info.normalize_edges(0).unwrap();
        assert_eq!(object(&info, 0, 1).sent_volume(), 3.0);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let mut info = two_rank_info();
        info.rank_mut(0)
            .unwrap()
            .add_object_sent_communication_at_phase(0, 1, 2, 6.0)
            .unwrap();

        info.normalize_edges(0).unwrap();
        let once = info.clone();
        let report = info.normalize_edges(0).unwrap();

        assert_eq!(report.added, 0);
        assert_eq!(info, once);
    }

    #[test]
    fn test_absent_peer_stays_one_sided() {
        let mut info = two_rank_info();
        info.rank_mut(0)
            .unwrap()
            .add_object_sent_communication_at_phase(0, 1, 42, 1.0)
            .unwrap();

        let report = info.normalize_edges(0).unwrap();
        assert_eq!(report.added, 0);
        assert_eq!(
            report.diagnostics,
            vec![IngestDiagnostic::OneSidedEdge {
                rank: 0,
                phase: 0,
                object: 1,
                peer: 42,
                direction: EdgeDirection::Sent,
            }]
        );
    }

    #[test]
    fn test_unknown_phase_is_noop() {
        let mut info = two_rank_info();
        let report = info.normalize_edges(9).unwrap();
        assert_eq!(report.added, 0);
        assert!(report.diagnostics.is_empty());
    }
}
