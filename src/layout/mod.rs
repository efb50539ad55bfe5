//! Spatial layout of ranks and objects
//!
//! Ranks sit on a regular grid ([`grid`]); the objects of a rank fill a
//! centred sub-grid inside the rank cell, each nudged by a memoized jitter
//! offset ([`jitter`]). [`LayoutEngine`] ties the pieces together for one
//! trace.

pub mod grid;
pub mod jitter;

pub use grid::{to_cartesian, to_flat, GridShape, ObjectSubGrid};
pub use jitter::JitterCache;

use glam::DVec3;
use std::collections::BTreeMap;

use crate::error::{TraceError, TraceResult};
use crate::model::{ElementId, Info, ObjectWork, PhaseId, PhaseWork, RankId};

/// Distance between neighbouring rank cells
pub const DEFAULT_GRID_RESOLUTION: f64 = 1.0;

/// Settings for a [`LayoutEngine`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutSettings {
    pub shape: GridShape,
    pub jitter: f64,
    pub jitter_seed: Option<u64>,
    pub resolution: f64,
}

/// Places ranks and objects of one trace
///
/// Ranks are mapped to flat grid indices in ascending rank id order. The
/// object sub-grid is sized once from the busiest rank over the phases in
/// scope, so slot spacing does not change from frame to frame.
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    shape: GridShape,
    resolution: f64,
    sub_grid: ObjectSubGrid,
    jitter: JitterCache,
    rank_index: BTreeMap<RankId, u64>,
}

impl LayoutEngine {
    /// # Errors
    /// - `GridMismatch` when the grid does not hold exactly the trace's ranks
    /// - `InvalidConfig` for a jitter coefficient outside `[0, 1)`
    pub fn new(info: &Info, phases: &[PhaseId], settings: LayoutSettings) -> TraceResult<Self> {
        settings.shape.check_rank_count(info.num_ranks())?;
        let jitter = JitterCache::new(
            settings.jitter,
            settings.shape.object_dims(),
            settings.jitter_seed,
        )?;
        let max_objects = info.max_objects_per_rank(phases);
        let sub_grid = ObjectSubGrid::new(&settings.shape, max_objects, settings.resolution);
        let rank_index = info.rank_ids().zip(0u64..).collect();

        tracing::debug!(
            cells = settings.shape.cells(),
            max_objects,
            slots_per_dim = sub_grid.per_dim(),
            "layout prepared"
        );

        Ok(Self {
            shape: settings.shape,
            resolution: settings.resolution,
            sub_grid,
            jitter,
            rank_index,
        })
    }

    pub fn shape(&self) -> &GridShape {
        &self.shape
    }

    pub fn sub_grid(&self) -> &ObjectSubGrid {
        &self.sub_grid
    }

    pub fn jitter(&self) -> &JitterCache {
        &self.jitter
    }

    /// Centre of `rank`'s cell
    pub fn rank_position(&self, rank: RankId) -> TraceResult<DVec3> {
        let flat = *self
            .rank_index
            .get(&rank)
            .ok_or(TraceError::RankNotFound(rank))?;
        Ok(to_cartesian(flat, &self.shape)?.as_dvec3() * self.resolution)
    }

    /// Positions of the objects of `rank` in one phase
    ///
    /// Objects take slots in [`order_objects`] order.
    pub fn place_objects(
        &mut self,
        info: &Info,
        rank: RankId,
        work: &PhaseWork,
    ) -> TraceResult<Vec<(ElementId, DVec3)>> {
        let origin = self.rank_position(rank)?;
        order_objects(info, work.objects().values())
            .into_iter()
            .zip(0u64..)
            .map(|(object, slot)| {
                let jitter = self.jitter.offset(object.id());
                Ok((object.id(), origin + self.sub_grid.jittered_offset(slot, jitter)?))
            })
            .collect()
    }
}

/// Slot order within a rank: non-migratable objects first, then by id
pub fn order_objects<'a>(
    info: &Info,
    objects: impl IntoIterator<Item = &'a ObjectWork>,
) -> Vec<&'a ObjectWork> {
    let mut ordered: Vec<&ObjectWork> = objects.into_iter().collect();
    ordered.sort_by_key(|object| {
        let migratable = info.object(object.id()).map_or(false, |i| i.is_migratable());
        (migratable, object.id())
    });
    ordered
}
