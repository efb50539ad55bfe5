//! Records handed to a rendering backend

use glam::DVec3;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::analysis::{ColorMapping, QoiRange};
use crate::model::{ElementId, Info, PhaseId, QoiValue, RankId};

/// Ranges and maxima shared by every frame of a render
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderRanges {
    pub rank_qoi: String,
    pub object_qoi: String,
    pub rank_range: QoiRange,
    pub object_range: QoiRange,
    pub rank_colors: ColorMapping,
    pub object_colors: ColorMapping,
    /// Largest single edge over the rendered phases (edge width scale)
    pub max_object_volume: f64,
    /// Largest object load over the rendered phases (glyph size scale)
    pub max_object_load: f64,
    pub phases: Vec<PhaseId>,
}

/// One rank cell
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankGlyph {
    pub rank: RankId,
    pub position: DVec3,
    /// Rank QOI value; `None` when the rank lacks it in this phase
    pub value: Option<QoiValue>,
    pub load: f64,
    pub objects: usize,
}

/// One object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectGlyph {
    pub id: ElementId,
    /// Rank hosting the object in this phase
    pub rank: RankId,
    pub position: DVec3,
    pub value: Option<QoiValue>,
    pub load: f64,
    pub migratable: bool,
    pub sent_volume: f64,
    pub received_volume: f64,
    pub max_volume: f64,
}

/// Undirected communication between two objects, `a < b`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeRecord {
    pub a: ElementId,
    pub b: ElementId,
    /// Total bytes exchanged in both directions
    pub volume: f64,
    pub endpoints: [DVec3; 2],
}

/// Everything needed to draw one phase
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseFrame {
    pub phase: PhaseId,
    pub ranks: Vec<RankGlyph>,
    pub objects: Vec<ObjectGlyph>,
    pub edges: Vec<EdgeRecord>,
    /// `max / mean - 1` of rank loads; `None` when the mean is zero
    pub imbalance: Option<f64>,
    /// Mean of the numeric rank QOI values
    pub rank_qoi_average: Option<f64>,
}

/// Aggregate the edges of `phase` between objects that have a position
///
/// Each sent edge counts once; a received edge counts only when its sender
/// did not record the matching sent edge, so normalized and raw traces give
/// the same volumes. Self-communication is not drawn.
pub(crate) fn aggregate_edges(
    info: &Info,
    phase: PhaseId,
    positions: &BTreeMap<ElementId, DVec3>,
) -> Vec<EdgeRecord> {
    let mut directed = BTreeSet::new();
    let mut volumes: BTreeMap<(ElementId, ElementId), f64> = BTreeMap::new();

    let mut add = |from: ElementId, to: ElementId, bytes: f64| {
        if from != to && positions.contains_key(&from) && positions.contains_key(&to) {
            *volumes.entry((from.min(to), from.max(to))).or_default() += bytes;
        }
    };

    for (_, object) in info.phase_objects(phase) {
        for (to, bytes) in object.communicator().sent() {
            directed.insert((object.id(), to));
            add(object.id(), to, bytes);
        }
    }
    for (_, object) in info.phase_objects(phase) {
        for (from, bytes) in object.communicator().received() {
            if !directed.contains(&(from, object.id())) {
                add(from, object.id(), bytes);
            }
        }
    }

    volumes
        .into_iter()
        .map(|((a, b), volume)| EdgeRecord {
            a,
            b,
            volume,
            endpoints: [positions[&a], positions[&b]],
        })
        .collect()
}
