//! Trace data model
//!
//! The entity graph of a load-balancing trace: [`Info`] owns every [`Rank`],
//! each rank owns one [`PhaseWork`] per phase, and each phase owns the
//! [`ObjectWork`] records of the objects resident on that rank. Identity
//! records ([`ObjectInfo`]) are shared across phases and ranks.
//!
//! All maps are ordered (`BTreeMap`) so every traversal is deterministic.

mod communicator;
mod info;
mod normalize;
mod object_info;
mod object_work;
mod phase_work;
mod qoi_value;
mod rank;

pub use communicator::ObjectCommunicator;
pub use info::Info;
pub use normalize::NormalizeReport;
pub use object_info::{Aggregate, ObjectInfo};
pub use object_work::ObjectWork;
pub use phase_work::{LbIteration, PhaseWork};
pub use qoi_value::{QoiMap, QoiValue};
pub use rank::Rank;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Global object (element) identifier
pub type ElementId = u64;

/// Rank (node) identifier
pub type RankId = u32;

/// Phase identifier
pub type PhaseId = u64;

/// Sub-phase identifier within a phase
pub type SubphaseId = u64;

/// Load-balancer iteration identifier within a phase
pub type LbIterationId = u64;

/// Which kind of entity a QOI is resolved against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Rank,
    Object,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Rank => write!(f, "rank"),
            EntityKind::Object => write!(f, "object"),
        }
    }
}
