//! Per-phase object work records

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{ElementId, ObjectCommunicator, QoiMap, SubphaseId};
use crate::error::{TraceError, TraceResult};

/// Work one object performed during one phase
///
/// Sub-phase loads are measured independently and need not sum to the
/// whole-phase load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectWork {
    id: ElementId,
    load: f64,
    subphase_loads: BTreeMap<SubphaseId, f64>,
    user_defined: QoiMap,
    attributes: QoiMap,
    communicator: ObjectCommunicator,
}

impl ObjectWork {
    pub fn new(id: ElementId, load: f64) -> Self {
        Self {
            id,
            load,
            subphase_loads: BTreeMap::new(),
            user_defined: QoiMap::new(),
            attributes: QoiMap::new(),
            communicator: ObjectCommunicator::new(id),
        }
    }

    pub fn with_subphase_loads(mut self, loads: BTreeMap<SubphaseId, f64>) -> Self {
        self.subphase_loads = loads;
        self
    }

    pub fn with_user_defined(mut self, user_defined: QoiMap) -> Self {
        self.user_defined = user_defined;
        self
    }

    pub fn with_attributes(mut self, attributes: QoiMap) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn load(&self) -> f64 {
        self.load
    }

    pub fn subphase_loads(&self) -> &BTreeMap<SubphaseId, f64> {
        &self.subphase_loads
    }

    pub fn user_defined(&self) -> &QoiMap {
        &self.user_defined
    }

    pub fn attributes(&self) -> &QoiMap {
        &self.attributes
    }

    pub fn communicator(&self) -> &ObjectCommunicator {
        &self.communicator
    }

    /// Replace the communicator
    ///
    /// Fails with `CommunicatorMismatch` when `communicator` describes a
    /// different object.
    pub fn set_communicator(&mut self, communicator: ObjectCommunicator) -> TraceResult<()> {
        if communicator.object_id() != self.id {
            return Err(TraceError::CommunicatorMismatch {
                expected: self.id,
                found: communicator.object_id(),
            });
        }
        self.communicator = communicator;
        Ok(())
    }

    pub fn add_sent_communication(&mut self, to: ElementId, bytes: f64) {
        self.communicator.add_sent(to, bytes);
    }

    pub fn add_received_communication(&mut self, from: ElementId, bytes: f64) {
        self.communicator.add_received(from, bytes);
    }

    pub fn sent_volume(&self) -> f64 {
        self.communicator.total_sent_volume()
    }

    pub fn received_volume(&self) -> f64 {
        self.communicator.total_received_volume()
    }

    pub fn max_volume(&self) -> f64 {
        self.communicator.max_volume()
    }
}
