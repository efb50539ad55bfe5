//! Whole-trace statistics: maxima, imbalance and per-phase summaries

use serde::Serialize;

use super::qoi::{resolve_rank_qoi, RankQoi};
use super::PhaseSelection;
use crate::error::{TraceError, TraceResult};
use crate::model::{Info, ObjectWork, PhaseId};

/// Largest object load in the selection; 0.0 without objects
pub fn max_object_load(info: &Info, selection: PhaseSelection) -> TraceResult<f64> {
    fold_objects(info, selection, ObjectWork::load)
}

/// Largest single communication edge in the selection; 0.0 without edges
pub fn max_object_volume(info: &Info, selection: PhaseSelection) -> TraceResult<f64> {
    fold_objects(info, selection, ObjectWork::max_volume)
}

fn fold_objects(
    info: &Info,
    selection: PhaseSelection,
    value: impl Fn(&ObjectWork) -> f64,
) -> TraceResult<f64> {
    let phases = selection.phases(info)?;
    Ok(phases
        .iter()
        .flat_map(|&phase| info.phase_objects(phase))
        .map(|(_, object)| value(object))
        .fold(0.0, f64::max))
}

/// Load imbalance of `phase`: `max / mean - 1` over the ranks that
/// recorded it
///
/// # Returns
/// `None` when the mean rank load is zero.
///
/// # Errors
/// `PhaseNotFound` when no rank recorded the phase.
pub fn imbalance(info: &Info, phase: PhaseId) -> TraceResult<Option<f64>> {
    let loads = rank_loads(info, phase)?;
    let mean = loads.iter().sum::<f64>() / loads.len() as f64;
    if mean == 0.0 {
        return Ok(None);
    }
    let max = loads.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Ok(Some(max / mean - 1.0))
}

fn rank_loads(info: &Info, phase: PhaseId) -> TraceResult<Vec<f64>> {
    let loads: Vec<f64> = info
        .ranks()
        .values()
        .filter_map(|rank| rank.phase(phase))
        .map(|work| work.load())
        .collect();
    if loads.is_empty() {
        return Err(TraceError::PhaseNotFound { rank: None, phase });
    }
    Ok(loads)
}

/// Mean of a numeric rank QOI over the ranks that recorded `phase`
///
/// Ranks without a numeric value (missing key, string value, NaN) are
/// left out; `None` when no rank has one.
pub fn rank_qoi_average(info: &Info, qoi: &RankQoi, phase: PhaseId) -> Option<f64> {
    let values: Vec<f64> = info
        .ranks()
        .values()
        .filter(|rank| rank.phase(phase).is_some())
        .filter_map(|rank| resolve_rank_qoi(info, qoi, rank, phase))
        .filter_map(|value| value.as_f64())
        .filter(|x| !x.is_nan())
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Headline numbers of one phase
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseSummary {
    pub phase: PhaseId,
    /// Ranks that recorded the phase
    pub ranks: usize,
    pub objects: usize,
    pub migratable_objects: usize,
    pub total_load: f64,
    pub max_rank_load: f64,
    pub mean_rank_load: f64,
    pub imbalance: Option<f64>,
    pub max_object_volume: f64,
    /// Communication edges recorded by resident objects
    pub edges: usize,
}

/// Summaries of every selected phase, ascending
pub fn phase_summaries(info: &Info, selection: PhaseSelection) -> TraceResult<Vec<PhaseSummary>> {
    selection
        .phases(info)?
        .into_iter()
        .map(|phase| {
            let loads = rank_loads(info, phase)?;
            let total_load: f64 = loads.iter().sum();
            let objects: Vec<&ObjectWork> = info.phase_objects(phase).map(|(_, o)| o).collect();

            Ok(PhaseSummary {
                phase,
                ranks: loads.len(),
                objects: objects.len(),
                migratable_objects: objects
                    .iter()
                    .filter(|o| info.object(o.id()).map_or(false, |i| i.is_migratable()))
                    .count(),
                total_load,
                max_rank_load: loads.iter().copied().fold(0.0, f64::max),
                mean_rank_load: total_load / loads.len() as f64,
                imbalance: imbalance(info, phase)?,
                max_object_volume: objects.iter().map(|o| o.max_volume()).fold(0.0, f64::max),
                edges: objects.iter().map(|o| o.communicator().edge_count()).sum(),
            })
        })
        .collect()
}
