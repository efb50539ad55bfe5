//! Render orchestration
//!
//! [`RenderOrchestrator`] validates a render request against a loaded
//! trace, computes everything that is global to the run once, and then
//! assembles one [`PhaseFrame`] per phase for a [`RenderBackend`].
//!
//! # Setup order
//!
//! All checks run before the first frame so a bad request fails without
//! side effects:
//! 1. phase selection exists
//! 2. grid shape matches the rank count, jitter coefficient is valid
//! 3. both QOI names resolve
//! 4. edges are normalized (optional)
//! 5. ranges and maxima are computed

mod backend;
mod frame;

pub use backend::{JsonFrameBackend, MemoryBackend, RenderBackend};
pub use frame::{EdgeRecord, ObjectGlyph, PhaseFrame, RankGlyph, RenderRanges};

use anyhow::Result;
use glam::DVec3;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::analysis::qoi::{resolve_object_qoi, resolve_rank_qoi};
use crate::analysis::stats::{imbalance, max_object_load, max_object_volume, rank_qoi_average};
use crate::analysis::{ObjectQoi, PhaseSelection, QoiResolver, RangeComputer, RangeMode, RankQoi};
use crate::diagnostics::IngestDiagnostic;
use crate::error::{TraceError, TraceResult};
use crate::layout::{GridShape, LayoutEngine, LayoutSettings, DEFAULT_GRID_RESOLUTION};
use crate::model::{Info, NormalizeReport, PhaseId};

/// What to render and how
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub rank_qoi: String,
    pub object_qoi: String,
    pub object_range_mode: RangeMode,
    pub selection: PhaseSelection,
    pub shape: GridShape,
    pub jitter: f64,
    pub jitter_seed: Option<u64>,
    pub resolution: f64,
    pub normalize_edges: bool,
}

impl RenderSettings {
    /// Settings with default jitter (0.5), all phases and normalization on
    pub fn new(rank_qoi: impl Into<String>, object_qoi: impl Into<String>, shape: GridShape) -> Self {
        Self {
            rank_qoi: rank_qoi.into(),
            object_qoi: object_qoi.into(),
            object_range_mode: RangeMode::Continuous,
            selection: PhaseSelection::All,
            shape,
            jitter: 0.5,
            jitter_seed: None,
            resolution: DEFAULT_GRID_RESOLUTION,
            normalize_edges: true,
        }
    }

    pub fn with_selection(mut self, selection: PhaseSelection) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_object_range_mode(mut self, mode: RangeMode) -> Self {
        self.object_range_mode = mode;
        self
    }

    pub fn with_jitter(mut self, jitter: f64, seed: Option<u64>) -> Self {
        self.jitter = jitter;
        self.jitter_seed = seed;
        self
    }

    pub fn with_normalize_edges(mut self, normalize: bool) -> Self {
        self.normalize_edges = normalize;
        self
    }
}

/// Totals of a completed render
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderReport {
    pub phases: usize,
    pub objects: usize,
    pub edges: usize,
    /// Reverse edges synthesized by normalization
    pub normalized_edges: usize,
}

/// Drives a render of one trace
pub struct RenderOrchestrator {
    info: Info,
    rank_qoi: RankQoi,
    object_qoi: ObjectQoi,
    phases: Vec<PhaseId>,
    layout: LayoutEngine,
    ranges: RenderRanges,
    normalization: Vec<NormalizeReport>,
}

impl RenderOrchestrator {
    /// Validate `settings` against `info` and prepare the render
    ///
    /// Takes ownership of the trace: normalization is its last mutation.
    ///
    /// # Errors
    /// `PhaseNotFound`, `GridMismatch`, `InvalidConfig`, `UnknownQoi`,
    /// `QoiTypeMismatch`, all before any frame is produced.
    pub fn new(mut info: Info, settings: &RenderSettings) -> TraceResult<Self> {
        let phases = settings.selection.phases(&info)?;
        let layout = LayoutEngine::new(
            &info,
            &phases,
            LayoutSettings {
                shape: settings.shape,
                jitter: settings.jitter,
                jitter_seed: settings.jitter_seed,
                resolution: settings.resolution,
            },
        )?;

        let (rank_qoi, object_qoi) = {
            let resolver = QoiResolver::new(&info, &settings.rank_qoi, &settings.object_qoi)?;
            (resolver.rank_qoi().clone(), resolver.object_qoi().clone())
        };

        let mut normalization = Vec::new();
        if settings.normalize_edges {
            for &phase in &phases {
                let report = info.normalize_edges(phase)?;
                for diagnostic in &report.diagnostics {
                    diagnostic.log();
                }
                normalization.push(report);
            }
        }

        let computer = RangeComputer::new(&info);
        let rank_range = computer.rank_range(&rank_qoi, settings.selection)?;
        let object_range =
            computer.object_range(&object_qoi, settings.selection, settings.object_range_mode)?;
        let ranges = RenderRanges {
            rank_qoi: rank_qoi.name().to_string(),
            object_qoi: object_qoi.name().to_string(),
            rank_colors: rank_range.color_mapping(),
            object_colors: object_range.color_mapping(),
            rank_range,
            object_range,
            max_object_volume: max_object_volume(&info, settings.selection)?,
            max_object_load: max_object_load(&info, settings.selection)?,
            phases: phases.clone(),
        };

        tracing::info!(
            phases = phases.len(),
            rank_qoi = %rank_qoi,
            object_qoi = %object_qoi,
            "render prepared"
        );

        Ok(Self {
            info,
            rank_qoi,
            object_qoi,
            phases,
            layout,
            ranges,
            normalization,
        })
    }

    pub fn info(&self) -> &Info {
        &self.info
    }

    pub fn ranges(&self) -> &RenderRanges {
        &self.ranges
    }

    /// Phases the render covers, ascending
    pub fn phases(&self) -> &[PhaseId] {
        &self.phases
    }

    pub fn normalization_reports(&self) -> &[NormalizeReport] {
        &self.normalization
    }

    /// One-sided edges left after normalization
    pub fn diagnostics(&self) -> impl Iterator<Item = &IngestDiagnostic> {
        self.normalization.iter().flat_map(|r| r.diagnostics.iter())
    }

    /// Assemble the frame of `phase`
    ///
    /// Jitter offsets are drawn on first use and reused afterwards, so the
    /// same object gets the same offset in every frame.
    pub fn frame(&mut self, phase: PhaseId) -> TraceResult<PhaseFrame> {
        if !self.info.has_phase(phase) {
            return Err(TraceError::PhaseNotFound { rank: None, phase });
        }

        let info = &self.info;
        let mut ranks = Vec::with_capacity(info.num_ranks());
        let mut objects = Vec::new();
        let mut positions = BTreeMap::new();

        for rank in info.ranks().values() {
            let work = rank.phase(phase);
            ranks.push(RankGlyph {
                rank: rank.id(),
                position: self.layout.rank_position(rank.id())?,
                value: resolve_rank_qoi(info, &self.rank_qoi, rank, phase),
                load: work.map_or(0.0, |w| w.load()),
                objects: work.map_or(0, |w| w.num_objects()),
            });

            let Some(work) = work else {
                continue;
            };
            for (id, position) in self.layout.place_objects(info, rank.id(), work)? {
                let Some(object) = work.object(id) else {
                    continue;
                };
                positions.insert(id, position);
                objects.push(ObjectGlyph {
                    id,
                    rank: rank.id(),
                    position,
                    value: resolve_object_qoi(info, &self.object_qoi, object),
                    load: object.load(),
                    migratable: info.object(id).map_or(false, |i| i.is_migratable()),
                    sent_volume: object.sent_volume(),
                    received_volume: object.received_volume(),
                    max_volume: object.max_volume(),
                });
            }
        }

        let edges = frame::aggregate_edges(info, phase, &positions);
        tracing::debug!(phase, objects = objects.len(), edges = edges.len(), "assembled frame");

        Ok(PhaseFrame {
            phase,
            ranks,
            objects,
            edges,
            imbalance: imbalance(info, phase)?,
            rank_qoi_average: rank_qoi_average(info, &self.rank_qoi, phase),
        })
    }

    /// Feed every phase to `backend`
    pub fn render(&mut self, backend: &mut dyn RenderBackend) -> Result<RenderReport> {
        let mut report = RenderReport {
            normalized_edges: self.normalization.iter().map(|r| r.added).sum(),
            ..RenderReport::default()
        };

        backend.begin(&self.ranges)?;
        for phase in self.phases.clone() {
            let frame = self.frame(phase)?;
            report.phases += 1;
            report.objects += frame.objects.len();
            report.edges += frame.edges.len();
            backend.render_phase(&frame)?;
            tracing::info!(phase, "rendered phase");
        }
        backend.finish()?;

        Ok(report)
    }
}

/// Position of every object in every frame, keyed by `(phase, object)`
pub fn object_positions(frames: &[PhaseFrame]) -> BTreeMap<(PhaseId, u64), DVec3> {
    frames
        .iter()
        .flat_map(|frame| {
            frame
                .objects
                .iter()
                .map(move |object| ((frame.phase, object.id), object.position))
        })
        .collect()
}
