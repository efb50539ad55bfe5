//! Object identity records

use serde::{Deserialize, Serialize};

use super::{ElementId, RankId};

/// Aggregate an object belongs to
///
/// Membership is at most one of collection or objgroup, identified by the
/// aggregate's meta id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "meta_id", rename_all = "snake_case")]
pub enum Aggregate {
    #[default]
    None,
    Collection(u64),
    ObjGroup(u64),
}

/// Identity of an object, constant across phases
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    id: ElementId,
    home: RankId,
    migratable: bool,
    index: Vec<u64>,
    aggregate: Aggregate,
}

impl ObjectInfo {
    pub fn new(id: ElementId, home: RankId, migratable: bool, index: Vec<u64>) -> Self {
        Self {
            id,
            home,
            migratable,
            index,
            aggregate: Aggregate::None,
        }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn home(&self) -> RankId {
        self.home
    }

    pub fn is_migratable(&self) -> bool {
        self.migratable
    }

    /// Logical index inside the collection; empty for non-collection objects
    pub fn index(&self) -> &[u64] {
        &self.index
    }

    pub fn aggregate(&self) -> Aggregate {
        self.aggregate
    }

    pub fn is_collection(&self) -> bool {
        matches!(self.aggregate, Aggregate::Collection(_))
    }

    pub fn is_objgroup(&self) -> bool {
        matches!(self.aggregate, Aggregate::ObjGroup(_))
    }

    /// Meta id of the aggregate, if any
    pub fn meta_id(&self) -> Option<u64> {
        match self.aggregate {
            Aggregate::None => None,
            Aggregate::Collection(id) | Aggregate::ObjGroup(id) => Some(id),
        }
    }

    /// Mark the object as a collection element (construction only)
    pub fn set_collection(&mut self, meta_id: u64) {
        self.aggregate = Aggregate::Collection(meta_id);
    }

    /// Mark the object as an objgroup member (construction only)
    pub fn set_objgroup(&mut self, meta_id: u64) {
        self.aggregate = Aggregate::ObjGroup(meta_id);
    }
}
