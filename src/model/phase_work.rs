//! Per-rank phase records

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{ElementId, LbIterationId, ObjectCommunicator, ObjectWork, PhaseId, QoiMap};
use crate::error::{TraceError, TraceResult};

/// One load-balancer iteration recorded inside a phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LbIteration {
    id: LbIterationId,
    objects: BTreeMap<ElementId, ObjectWork>,
    user_defined: QoiMap,
}

impl LbIteration {
    pub fn new(id: LbIterationId, objects: BTreeMap<ElementId, ObjectWork>) -> Self {
        Self {
            id,
            objects,
            user_defined: QoiMap::new(),
        }
    }

    pub fn with_user_defined(mut self, user_defined: QoiMap) -> Self {
        self.user_defined = user_defined;
        self
    }

    pub fn id(&self) -> LbIterationId {
        self.id
    }

    pub fn objects(&self) -> &BTreeMap<ElementId, ObjectWork> {
        &self.objects
    }

    pub fn user_defined(&self) -> &QoiMap {
        &self.user_defined
    }

    pub fn load(&self) -> f64 {
        self.objects.values().map(ObjectWork::load).sum()
    }
}

/// The objects one rank hosted during one phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseWork {
    id: PhaseId,
    objects: BTreeMap<ElementId, ObjectWork>,
    user_defined: QoiMap,
    lb_iterations: BTreeMap<LbIterationId, LbIteration>,
}

impl PhaseWork {
    pub fn new(id: PhaseId, objects: BTreeMap<ElementId, ObjectWork>) -> Self {
        Self {
            id,
            objects,
            user_defined: QoiMap::new(),
            lb_iterations: BTreeMap::new(),
        }
    }

    pub fn with_user_defined(mut self, user_defined: QoiMap) -> Self {
        self.user_defined = user_defined;
        self
    }

    pub fn with_lb_iterations(mut self, iterations: impl IntoIterator<Item = LbIteration>) -> Self {
        self.lb_iterations = iterations.into_iter().map(|it| (it.id(), it)).collect();
        self
    }

    pub fn id(&self) -> PhaseId {
        self.id
    }

    pub fn objects(&self) -> &BTreeMap<ElementId, ObjectWork> {
        &self.objects
    }

    pub fn object(&self, id: ElementId) -> Option<&ObjectWork> {
        self.objects.get(&id)
    }

    pub fn contains_object(&self, id: ElementId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn num_objects(&self) -> usize {
        self.objects.len()
    }

    /// Phase-level user-defined fields of the owning rank
    pub fn user_defined(&self) -> &QoiMap {
        &self.user_defined
    }

    pub fn lb_iterations(&self) -> &BTreeMap<LbIterationId, LbIteration> {
        &self.lb_iterations
    }

    /// Sum of the loads of all resident objects
    pub fn load(&self) -> f64 {
        self.objects.values().map(ObjectWork::load).sum()
    }

    /// Largest single communication edge of any resident object
    pub fn max_volume(&self) -> f64 {
        self.objects
            .values()
            .map(ObjectWork::max_volume)
            .fold(0.0, f64::max)
    }

    pub fn set_communicator(
        &mut self,
        object: ElementId,
        communicator: ObjectCommunicator,
    ) -> TraceResult<()> {
        self.object_mut(object)?.set_communicator(communicator)
    }

    pub fn add_object_sent_communication(
        &mut self,
        object: ElementId,
        to: ElementId,
        bytes: f64,
    ) -> TraceResult<()> {
        self.object_mut(object)?.add_sent_communication(to, bytes);
        Ok(())
    }

    pub fn add_object_received_communication(
        &mut self,
        object: ElementId,
        from: ElementId,
        bytes: f64,
    ) -> TraceResult<()> {
        self.object_mut(object)?
            .add_received_communication(from, bytes);
        Ok(())
    }

    fn object_mut(&mut self, object: ElementId) -> TraceResult<&mut ObjectWork> {
        let phase = self.id;
        self.objects
            .get_mut(&object)
            .ok_or(TraceError::ObjectNotInPhase { phase, object })
    }
}
