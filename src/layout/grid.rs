//! Rank grid and object sub-grid geometry
//!
//! Ranks occupy the cells of an `nx × ny × nz` grid in x-fastest order.
//! Each rank cell holds a smaller regular grid of object slots spanning the
//! same active axes.

use glam::{DVec3, U64Vec3};
use serde::Serialize;

use crate::error::{TraceError, TraceResult};

/// Extents of the rank grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridShape {
    nx: u64,
    ny: u64,
    nz: u64,
}

impl GridShape {
    /// # Errors
    /// `InvalidConfig` when any extent is zero or the cell count does not
    /// fit in a `u64`.
    pub fn new(nx: u64, ny: u64, nz: u64) -> TraceResult<Self> {
        for (axis, extent) in [("x", nx), ("y", ny), ("z", nz)] {
            if extent == 0 {
                return Err(TraceError::InvalidConfig(format!(
                    "{}_ranks must be at least 1",
                    axis
                )));
            }
        }
        if nx.checked_mul(ny).and_then(|layer| layer.checked_mul(nz)).is_none() {
            return Err(TraceError::InvalidConfig(format!(
                "rank grid {}x{}x{} has too many cells",
                nx, ny, nz
            )));
        }
        Ok(Self { nx, ny, nz })
    }

    /// Near-square 2-D grid holding exactly `ranks` cells
    ///
    /// Picks the largest divisor of `ranks` not above its square root as
    /// the y extent.
    pub fn for_rank_count(ranks: usize) -> Self {
        let ranks = (ranks.max(1)) as u64;
        let mut ny = (ranks as f64).sqrt().floor() as u64;
        while ny > 1 && ranks % ny != 0 {
            ny -= 1;
        }
        let ny = ny.max(1);
        Self {
            nx: ranks / ny,
            ny,
            nz: 1,
        }
    }

    pub fn extents(&self) -> U64Vec3 {
        U64Vec3::new(self.nx, self.ny, self.nz)
    }

    /// Number of cells, `nx · ny · nz`; never overflows for a constructed
    /// shape
    pub fn cells(&self) -> u64 {
        self.nx * self.ny * self.nz
    }

    /// Axes with extent above one
    pub fn active_dims(&self) -> [bool; 3] {
        [self.nx > 1, self.ny > 1, self.nz > 1]
    }

    /// Axes objects are spread along: the active ones, or x and y when the
    /// grid is a single cell
    pub fn object_dims(&self) -> [bool; 3] {
        let active = self.active_dims();
        if active.iter().any(|a| *a) {
            active
        } else {
            [true, true, false]
        }
    }

    /// # Errors
    /// `GridMismatch` unless the grid has exactly `ranks` cells.
    pub fn check_rank_count(&self, ranks: usize) -> TraceResult<()> {
        if self.cells() == ranks as u64 {
            Ok(())
        } else {
            Err(TraceError::GridMismatch {
                nx: self.nx,
                ny: self.ny,
                nz: self.nz,
                cells: self.cells(),
                ranks,
            })
        }
    }
}

/// Cartesian cell of flat index `flat` (x fastest, then y, then z)
///
/// # Errors
/// `IndexOutOfGrid` when `flat >= shape.cells()`.
pub fn to_cartesian(flat: u64, shape: &GridShape) -> TraceResult<U64Vec3> {
    if flat >= shape.cells() {
        return Err(TraceError::IndexOutOfGrid {
            index: flat,
            cells: shape.cells(),
        });
    }
    let layer = shape.nx * shape.ny;
    let k = flat / layer;
    let rem = flat % layer;
    Ok(U64Vec3::new(rem % shape.nx, rem / shape.nx, k))
}

/// Inverse of [`to_cartesian`]
pub fn to_flat(cell: U64Vec3, shape: &GridShape) -> u64 {
    cell.x + shape.nx * (cell.y + shape.ny * cell.z)
}

/// Object slots inside one rank cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ObjectSubGrid {
    /// Slots per active axis
    per_dim: u64,
    /// Distance between neighbouring slots
    cell: f64,
    extents: U64Vec3,
    /// Offset that centres the slots on the rank position
    centering: DVec3,
}

impl ObjectSubGrid {
    /// Sub-grid able to hold `max_objects` objects per rank
    ///
    /// `per_dim` is the smallest `k` with `k^d >= max_objects` over the `d`
    /// object axes of `shape`; slots are `resolution / (per_dim + 1)` apart.
    pub fn new(shape: &GridShape, max_objects: usize, resolution: f64) -> Self {
        let dims = shape.object_dims();
        let active = dims.iter().filter(|d| **d).count() as u32;
        let per_dim = slots_per_dim(max_objects as u64, active);
        let cell = resolution / (per_dim + 1) as f64;

        let pick = |on: bool, value: u64| if on { value } else { 1 };
        let extents = U64Vec3::new(pick(dims[0], per_dim), pick(dims[1], per_dim), pick(dims[2], per_dim));
        let half_span = 0.5 * cell * (per_dim - 1) as f64;
        let centering = DVec3::new(
            if dims[0] { half_span } else { 0.0 },
            if dims[1] { half_span } else { 0.0 },
            if dims[2] { half_span } else { 0.0 },
        );

        Self {
            per_dim,
            cell,
            extents,
            centering,
        }
    }

    pub fn per_dim(&self) -> u64 {
        self.per_dim
    }

    pub fn cell(&self) -> f64 {
        self.cell
    }

    pub fn capacity(&self) -> u64 {
        self.extents.x * self.extents.y * self.extents.z
    }

    /// Offset of slot `slot` from the rank position, before jitter
    pub fn slot_offset(&self, slot: u64) -> TraceResult<DVec3> {
        let shape = GridShape {
            nx: self.extents.x,
            ny: self.extents.y,
            nz: self.extents.z,
        };
        let c = to_cartesian(slot, &shape)?;
        Ok(c.as_dvec3() * self.cell - self.centering)
    }

    /// Offset of slot `slot` with a jitter offset expressed in cells
    pub fn jittered_offset(&self, slot: u64, jitter: DVec3) -> TraceResult<DVec3> {
        Ok(self.slot_offset(slot)? + jitter * self.cell)
    }
}

/// Smallest `k >= 1` with `k^dims >= count`
fn slots_per_dim(count: u64, dims: u32) -> u64 {
    if dims == 0 {
        return 1;
    }
    let mut k = 1u64;
    while k.checked_pow(dims).map_or(false, |cap| cap < count) {
        k += 1;
    }
    k
}
