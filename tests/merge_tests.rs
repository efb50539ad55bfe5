//! Integration tests for the trace model: merging ranks and normalizing edges

use lbscope::diagnostics::EdgeDirection;
use lbscope::model::{ElementId, Info, ObjectInfo, ObjectWork, PhaseWork, Rank, RankId};
use lbscope::{IngestDiagnostic, TraceError};
use std::collections::BTreeMap;

fn identities(rank: RankId, ids: &[ElementId]) -> BTreeMap<ElementId, ObjectInfo> {
    ids.iter()
        .map(|&id| (id, ObjectInfo::new(id, rank, true, Vec::new())))
        .collect()
}

fn rank_with(rank: RankId, phases: &[(u64, Vec<ObjectWork>)]) -> Rank {
    let phases = phases
        .iter()
        .map(|(phase, objects)| {
            let objects = objects.iter().map(|o| (o.id(), o.clone())).collect();
            (*phase, PhaseWork::new(*phase, objects))
        })
        .collect();
    Rank::new(rank, phases)
}

#[test]
fn test_first_writer_wins_for_object_identity() {
    let mut info = Info::new();
    info.add_info(identities(0, &[1, 2]), rank_with(0, &[(0, vec![ObjectWork::new(1, 1.0)])]))
        .unwrap();

    // Rank 1 claims object 2 with a different home; the first record stays
    let mut claims = identities(1, &[2, 3]);
    claims.insert(2, ObjectInfo::new(2, 1, false, vec![7]));
    info.add_info(claims, rank_with(1, &[(0, vec![ObjectWork::new(3, 2.0)])]))
        .unwrap();

    assert_eq!(info.object_info().len(), 3);
    let object = info.object(2).unwrap();
    assert_eq!(object.home(), 0);
    assert!(object.is_migratable());
}

#[test]
fn test_duplicate_rank_leaves_info_unchanged() {
    let mut info = Info::new();
    info.add_info(identities(0, &[1]), rank_with(0, &[(0, vec![ObjectWork::new(1, 1.0)])]))
        .unwrap();
    let before = info.clone();

    let err = info
        .add_info(identities(0, &[99]), rank_with(0, &[(0, vec![ObjectWork::new(99, 5.0)])]))
        .unwrap_err();

    assert!(matches!(err, TraceError::DuplicateRank(0)));
    assert_eq!(info, before);
    assert!(info.object(99).is_none());
}

#[test]
fn test_inconsistent_phase_counts_are_detected() {
    let mut info = Info::new();
    info.add_info(
        identities(0, &[1]),
        rank_with(0, &[(0, vec![ObjectWork::new(1, 1.0)]), (1, vec![ObjectWork::new(1, 1.0)])]),
    )
    .unwrap();
    info.add_info(identities(1, &[2]), rank_with(1, &[(0, vec![ObjectWork::new(2, 1.0)])]))
        .unwrap();

    assert!(matches!(
        info.num_phases(),
        Err(TraceError::InconsistentPhases { expected: 2, found: 1, .. })
    ));
    assert_eq!(info.phase_ids(), vec![0, 1]);
}

#[test]
fn test_normalization_mirrors_cross_rank_edges() {
    let mut sender = ObjectWork::new(1, 1.0);
    sender.add_sent_communication(2, 16.0);
    sender.add_sent_communication(2, 4.0);
    let mut receiver = ObjectWork::new(3, 1.0);
    receiver.add_received_communication(4, 8.0);

    let mut info = Info::new();
    info.add_info(identities(0, &[1, 3]), rank_with(0, &[(0, vec![sender, receiver])]))
        .unwrap();
    info.add_info(
        identities(1, &[2, 4]),
        rank_with(1, &[(0, vec![ObjectWork::new(2, 1.0), ObjectWork::new(4, 1.0)])]),
    )
    .unwrap();

    let report = info.normalize_edges(0).unwrap();
    assert_eq!(report.added, 3);
    assert!(report.diagnostics.is_empty());

    let rank1 = info.rank(1).unwrap().phase(0).unwrap();
    assert_eq!(rank1.object(2).unwrap().received_volume(), 20.0);
    assert_eq!(rank1.object(4).unwrap().sent_volume(), 8.0);

    let again = info.normalize_edges(0).unwrap();
    assert_eq!(again.added, 0);
}

#[test]
fn test_edge_to_absent_object_stays_one_sided() {
    let mut sender = ObjectWork::new(1, 1.0);
    sender.add_sent_communication(42, 3.0);

    let mut info = Info::from_rank(identities(0, &[1]), rank_with(0, &[(0, vec![sender])]));
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
fn test_phase_mutators_fail_loudly() {
    let mut rank = rank_with(0, &[(0, vec![ObjectWork::new(1, 1.0)])]);
    assert!(matches!(
        rank.add_object_sent_communication_at_phase(5, 1, 2, 1.0),
        Err(TraceError::PhaseNotFound { rank: Some(0), phase: 5 })
    ));
    assert!(matches!(
        rank.add_object_sent_communication_at_phase(0, 9, 2, 1.0),
        Err(TraceError::ObjectNotInPhase { phase: 0, object: 9 })
    ));
    rank.add_object_sent_communication_at_phase(0, 1, 2, 1.5).unwrap();
    assert_eq!(rank.phase(0).unwrap().object(1).unwrap().sent_volume(), 1.5);
}
