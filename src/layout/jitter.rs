//! Per-object jitter
//!
//! Objects sharing a slot grid line up exactly, which hides communication
//! edges behind each other. A small random offset per object breaks the
//! alignment; it is drawn once per object id and reused for every phase so
//! an object that stays put does not jump between frames.

use glam::DVec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

use crate::error::{TraceError, TraceResult};
use crate::model::ElementId;

/// Memoized jitter offsets, in units of object slots
///
/// # Thread Safety
///
/// **NOT thread-safe.** Filling the cache mutates the generator; a layout
/// pass owns its cache exclusively.
#[derive(Debug, Clone)]
pub struct JitterCache {
    coefficient: f64,
    dims: [bool; 3],
    rng: StdRng,
    offsets: HashMap<ElementId, DVec3>,
}

impl JitterCache {
    /// Cache drawing `(u - 0.5) · coefficient` per active axis
    ///
    /// With `seed` the offsets are reproducible across runs; without one the
    /// generator is seeded from OS entropy and offsets are stable within a
    /// run only.
    ///
    /// # Errors
    /// `InvalidConfig` unless `0 <= coefficient < 1`.
    pub fn new(coefficient: f64, dims: [bool; 3], seed: Option<u64>) -> TraceResult<Self> {
        if !(0.0..1.0).contains(&coefficient) {
            return Err(TraceError::InvalidConfig(format!(
                "object_jitter must be in [0, 1), got {}",
                coefficient
            )));
        }
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            coefficient,
            dims,
            rng,
            offsets: HashMap::new(),
        })
    }

    pub fn coefficient(&self) -> f64 {
        self.coefficient
    }

    /// Offset of `object`, drawn on first request
    pub fn offset(&mut self, object: ElementId) -> DVec3 {
        if let Some(offset) = self.offsets.get(&object) {
            return *offset;
        }
        let mut draw = |active: bool| {
            if active {
                (self.rng.gen::<f64>() - 0.5) * self.coefficient
            } else {
                0.0
            }
        };
        let offset = DVec3::new(draw(self.dims[0]), draw(self.dims[1]), draw(self.dims[2]));
        self.offsets.insert(object, offset);
        offset
    }

    /// Offset of `object` if it was already drawn
    pub fn get(&self, object: ElementId) -> Option<DVec3> {
        self.offsets.get(&object).copied()
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}
