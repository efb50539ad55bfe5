//! Serde records mirroring the rank file layout
//!
//! These are decoding shapes only; [`super::parse_rank_trace`] turns them
//! into model types and enforces the fields serde cannot express.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::{ElementId, LbIterationId, PhaseId, RankId, SubphaseId};

#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct TraceDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetadataRecord>,
    pub phases: Vec<PhaseRecord>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub(crate) struct MetadataRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<RankId>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
}

#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct PhaseRecord {
    pub id: PhaseId,
    #[serde(default)]
    pub tasks: Vec<TaskRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub communications: Vec<CommunicationRecord>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub user_defined: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lb_iterations: Vec<LbIterationRecord>,
}

#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct LbIterationRecord {
    pub id: LbIterationId,
    #[serde(default)]
    pub tasks: Vec<TaskRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub communications: Vec<CommunicationRecord>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub user_defined: Map<String, Value>,
}

#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct TaskRecord {
    pub node: RankId,
    pub time: f64,
    pub entity: EntityRecord,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subphases: Vec<SubphaseRecord>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub user_defined: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
}

#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct SubphaseRecord {
    pub id: SubphaseId,
    pub time: f64,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub(crate) struct EntityRecord {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ElementId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq_id: Option<ElementId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<RankId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migratable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objgroup_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub index: Vec<u64>,
}

impl EntityRecord {
    /// `id`, falling back to `seq_id`
    pub fn element_id(&self) -> Option<ElementId> {
        self.id.or(self.seq_id)
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct CommunicationRecord {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<EndpointRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<EndpointRecord>,
}

/// One side of a communication; only the identity is used
#[derive(Debug, Default, Deserialize, Serialize)]
pub(crate) struct EndpointRecord {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ElementId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq_id: Option<ElementId>,
}

impl EndpointRecord {
    pub fn element_id(&self) -> Option<ElementId> {
        self.id.or(self.seq_id)
    }
}

/// Communication type carrying object-to-object edges
pub(crate) const SEND_RECV: &str = "SendRecv";

/// Entity type of tasks that describe objects
pub(crate) const OBJECT_ENTITY: &str = "object";
