//! Analytics over a loaded trace
//!
//! Everything here borrows the trace immutably: QOI resolution
//! ([`qoi`]), value ranges for color mapping ([`range`]) and global
//! statistics such as imbalance ([`stats`]).

pub mod qoi;
pub mod range;
pub mod stats;

pub use qoi::{ObjectQoi, QoiResolver, QoiSchema, RankQoi};
pub use range::{ColorMapping, DiscreteValue, QoiRange, RangeComputer, RangeMode, MAX_DISCRETE_VALUES};
pub use stats::{imbalance, max_object_load, max_object_volume, phase_summaries, PhaseSummary};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{TraceError, TraceResult};
use crate::model::{Info, PhaseId};

/// Which phases an analysis covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseSelection {
    #[default]
    All,
    Single(PhaseId),
}

impl PhaseSelection {
    /// Phase ids covered by this selection, ascending
    ///
    /// `Single` fails with `PhaseNotFound` when no rank recorded the phase.
    pub fn phases(&self, info: &Info) -> TraceResult<Vec<PhaseId>> {
        match self {
            PhaseSelection::All => Ok(info.phase_ids()),
            PhaseSelection::Single(phase) if info.has_phase(*phase) => Ok(vec![*phase]),
            PhaseSelection::Single(phase) => Err(TraceError::PhaseNotFound {
                rank: None,
                phase: *phase,
            }),
        }
    }
}

impl From<Option<PhaseId>> for PhaseSelection {
    fn from(phase: Option<PhaseId>) -> Self {
        phase.map_or(PhaseSelection::All, PhaseSelection::Single)
    }
}

impl fmt::Display for PhaseSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseSelection::All => write!(f, "all phases"),
            PhaseSelection::Single(phase) => write!(f, "phase {}", phase),
        }
    }
}
