//! Rank records

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{ElementId, PhaseId, PhaseWork, QoiMap, RankId};
use crate::error::{TraceError, TraceResult};

/// One rank (processor) and its work in every phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rank {
    id: RankId,
    phases: BTreeMap<PhaseId, PhaseWork>,
    attributes: QoiMap,
}

impl Rank {
    pub fn new(id: RankId, phases: BTreeMap<PhaseId, PhaseWork>) -> Self {
        Self {
            id,
            phases,
            attributes: QoiMap::new(),
        }
    }

    pub fn with_attributes(mut self, attributes: QoiMap) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn id(&self) -> RankId {
        self.id
    }

    pub fn phases(&self) -> &BTreeMap<PhaseId, PhaseWork> {
        &self.phases
    }

    pub fn phase(&self, phase: PhaseId) -> Option<&PhaseWork> {
        self.phases.get(&phase)
    }

    /// Phase work, or `PhaseNotFound`
    pub fn phase_work(&self, phase: PhaseId) -> TraceResult<&PhaseWork> {
        self.phases.get(&phase).ok_or(TraceError::PhaseNotFound {
            rank: Some(self.id),
            phase,
        })
    }

    pub fn num_phases(&self) -> usize {
        self.phases.len()
    }

    pub fn attributes(&self) -> &QoiMap {
        &self.attributes
    }

    pub fn load(&self, phase: PhaseId) -> TraceResult<f64> {
        Ok(self.phase_work(phase)?.load())
    }

    pub fn num_objects(&self, phase: PhaseId) -> TraceResult<usize> {
        Ok(self.phase_work(phase)?.num_objects())
    }

    pub fn add_object_sent_communication_at_phase(
        &mut self,
        phase: PhaseId,
        object: ElementId,
        to: ElementId,
        bytes: f64,
    ) -> TraceResult<()> {
        self.phase_work_mut(phase)?
            .add_object_sent_communication(object, to, bytes)
    }

    pub fn add_object_received_communication_at_phase(
        &mut self,
        phase: PhaseId,
        object: ElementId,
        from: ElementId,
        bytes: f64,
    ) -> TraceResult<()> {
        self.phase_work_mut(phase)?
            .add_object_received_communication(object, from, bytes)
    }

    fn phase_work_mut(&mut self, phase: PhaseId) -> TraceResult<&mut PhaseWork> {
        let rank = self.id;
        self.phases
            .get_mut(&phase)
            .ok_or(TraceError::PhaseNotFound {
                rank: Some(rank),
                phase,
            })
    }
}
