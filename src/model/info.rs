//! The whole-trace aggregate

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{ElementId, ObjectInfo, ObjectWork, PhaseId, Rank, RankId};
use crate::error::{TraceError, TraceResult};

/// Every rank of a run plus the identity of every object seen
///
/// Grown one rank at a time with [`Info::add_info`]; afterwards the
/// analytics layer only borrows it immutably.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Info {
    object_info: BTreeMap<ElementId, ObjectInfo>,
    ranks: BTreeMap<RankId, Rank>,
}

impl Info {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trace holding a single rank
    pub fn from_rank(object_info: BTreeMap<ElementId, ObjectInfo>, rank: Rank) -> Self {
        let mut ranks = BTreeMap::new();
        ranks.insert(rank.id(), rank);
        Self { object_info, ranks }
    }

    /// Merge one rank and the object identities it describes
    ///
    /// # Behavior
    /// - Object identities are merged first-writer-wins: an id already
    ///   present keeps its existing record, even if `object_info` disagrees.
    /// - A rank id already present fails with `DuplicateRank` and leaves the
    ///   trace untouched (no identity is merged either).
    pub fn add_info(
        &mut self,
        object_info: BTreeMap<ElementId, ObjectInfo>,
        rank: Rank,
    ) -> TraceResult<()> {
        if self.ranks.contains_key(&rank.id()) {
            return Err(TraceError::DuplicateRank(rank.id()));
        }

        for (id, info) in object_info {
            self.object_info.entry(id).or_insert(info);
        }
        self.ranks.insert(rank.id(), rank);
        Ok(())
    }

    pub fn object_info(&self) -> &BTreeMap<ElementId, ObjectInfo> {
        &self.object_info
    }

    pub fn object(&self, id: ElementId) -> Option<&ObjectInfo> {
        self.object_info.get(&id)
    }

    pub fn ranks(&self) -> &BTreeMap<RankId, Rank> {
        &self.ranks
    }

    pub fn rank(&self, id: RankId) -> TraceResult<&Rank> {
        self.ranks.get(&id).ok_or(TraceError::RankNotFound(id))
    }

    pub(crate) fn rank_mut(&mut self, id: RankId) -> TraceResult<&mut Rank> {
        self.ranks.get_mut(&id).ok_or(TraceError::RankNotFound(id))
    }

    pub fn rank_ids(&self) -> impl Iterator<Item = RankId> + '_ {
        self.ranks.keys().copied()
    }

    pub fn num_ranks(&self) -> usize {
        self.ranks.len()
    }

    /// Common number of phases of all ranks
    ///
    /// Fails with `InconsistentPhases` naming the first rank that disagrees
    /// with the lowest rank id. An empty trace has zero phases.
    pub fn num_phases(&self) -> TraceResult<usize> {
        let mut ranks = self.ranks.values();
        let Some(first) = ranks.next() else {
            return Ok(0);
        };
        let expected = first.num_phases();
        for rank in ranks {
            if rank.num_phases() != expected {
                return Err(TraceError::InconsistentPhases {
                    first_rank: first.id(),
                    expected,
                    rank: rank.id(),
                    found: rank.num_phases(),
                });
            }
        }
        Ok(expected)
    }

    /// Sorted union of the phase ids of all ranks
    pub fn phase_ids(&self) -> Vec<PhaseId> {
        self.ranks
            .values()
            .flat_map(|rank| rank.phases().keys().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Whether at least one rank recorded `phase`
    pub fn has_phase(&self, phase: PhaseId) -> bool {
        self.ranks.values().any(|rank| rank.phase(phase).is_some())
    }

    /// Objects resident anywhere during `phase`, as `(rank, work)` in rank
    /// then object id order
    pub fn phase_objects(&self, phase: PhaseId) -> impl Iterator<Item = (RankId, &ObjectWork)> + '_ {
        self.ranks.values().flat_map(move |rank| {
            rank.phase(phase)
                .into_iter()
                .flat_map(|work| work.objects().values())
                .map(move |object| (rank.id(), object))
        })
    }

    /// Rank hosting each object during `phase`
    ///
    /// When an object appears on several ranks the lowest rank id wins.
    pub fn object_locations(&self, phase: PhaseId) -> BTreeMap<ElementId, RankId> {
        let mut locations = BTreeMap::new();
        for (rank, object) in self.phase_objects(phase) {
            locations.entry(object.id()).or_insert(rank);
        }
        locations
    }

    /// Largest number of objects any rank hosted in any of `phases`
    pub fn max_objects_per_rank(&self, phases: &[PhaseId]) -> usize {
        self.ranks
            .values()
            .flat_map(|rank| phases.iter().filter_map(|p| rank.phase(*p)))
            .map(|work| work.num_objects())
            .max()
            .unwrap_or(0)
    }
}
