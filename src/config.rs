//! Run configuration
//!
//! A render is described by a YAML file with three sections:
//!
//! ```yaml
//! input:  { directory: ./data, n_ranks: 4, file_stem: data }
//! viz:
//!   rank_qoi: load
//!   object_qoi: load
//!   force_continuous_object_qoi: false
//!   x_ranks: 2
//!   y_ranks: 2
//!   z_ranks: 1
//!   object_jitter: 0.5
//! output: { directory: ./out, file_stem: frame }
//! ```
//!
//! Relative directories are resolved against the directory holding the
//! configuration file, not the working directory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::analysis::{PhaseSelection, RangeMode};
use crate::error::{TraceError, TraceResult};
use crate::ingest::DEFAULT_FILE_STEM;
use crate::layout::{GridShape, DEFAULT_GRID_RESOLUTION};
use crate::model::PhaseId;
use crate::render::RenderSettings;

/// Where the rank files live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    pub directory: PathBuf,
    /// Number of rank files; discovered from the directory when absent
    #[serde(default)]
    pub n_ranks: Option<usize>,
    #[serde(default = "default_input_stem")]
    pub file_stem: String,
}

/// What to show and how to lay it out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VizConfig {
    #[serde(default = "default_qoi")]
    pub rank_qoi: String,
    #[serde(default = "default_qoi")]
    pub object_qoi: String,
    /// `false` colors numeric object QOIs by category when there are few
    /// distinct values
    #[serde(default = "default_true")]
    pub force_continuous_object_qoi: bool,
    /// Rank grid extents; a missing extent is 1, and with none of them set
    /// the grid is derived from the rank count
    #[serde(default)]
    pub x_ranks: Option<u64>,
    #[serde(default)]
    pub y_ranks: Option<u64>,
    #[serde(default)]
    pub z_ranks: Option<u64>,
    #[serde(default = "default_jitter")]
    pub object_jitter: f64,
    #[serde(default)]
    pub jitter_seed: Option<u64>,
    /// Single phase to render; all phases when absent
    #[serde(default)]
    pub phase: Option<PhaseId>,
    #[serde(default = "default_true")]
    pub normalize_edges: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_output_stem")]
    pub file_stem: String,
    #[serde(default)]
    pub minify: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            file_stem: default_output_stem(),
            minify: false,
        }
    }
}

/// Parsed configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub input: InputConfig,
    pub viz: VizConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_input_stem() -> String {
    DEFAULT_FILE_STEM.to_string()
}

fn default_qoi() -> String {
    "load".to_string()
}

fn default_true() -> bool {
    true
}

fn default_jitter() -> f64 {
    0.5
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("output")
}

fn default_output_stem() -> String {
    "frame".to_string()
}

impl RunConfig {
    /// Read, resolve and validate a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::from_yaml(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))?;

        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        tracing::debug!(config = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Parse and validate YAML text; paths are left as written
    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: RunConfig = serde_yaml::from_str(text).context("Failed to parse YAML")?;
        config.validate()?;
        Ok(config)
    }

    /// Make relative input and output directories relative to `base`
    pub fn resolve_paths(&mut self, base: &Path) {
        if self.input.directory.is_relative() {
            self.input.directory = base.join(&self.input.directory);
        }
        if self.output.directory.is_relative() {
            self.output.directory = base.join(&self.output.directory);
        }
    }

    /// # Errors
    /// `InvalidConfig` for a zero grid extent, a jitter outside `[0, 1)`,
    /// a zero rank count or an empty QOI name or file stem.
    pub fn validate(&self) -> TraceResult<()> {
        let viz = &self.viz;
        self.grid_shape()?;
        if !(0.0..1.0).contains(&viz.object_jitter) {
            return Err(TraceError::InvalidConfig(format!(
                "viz.object_jitter must be in [0, 1), got {}",
                viz.object_jitter
            )));
        }
        if self.input.n_ranks == Some(0) {
            return Err(TraceError::InvalidConfig(
                "input.n_ranks must be at least 1".to_string(),
            ));
        }
        for (field, value) in [
            ("viz.rank_qoi", &viz.rank_qoi),
            ("viz.object_qoi", &viz.object_qoi),
            ("input.file_stem", &self.input.file_stem),
        ] {
            if value.trim().is_empty() {
                return Err(TraceError::InvalidConfig(format!("{} must not be empty", field)));
            }
        }
        Ok(())
    }

    /// Configured rank grid, `None` when no extent is given
    pub fn grid_shape(&self) -> TraceResult<Option<GridShape>> {
        let viz = &self.viz;
        if viz.x_ranks.is_none() && viz.y_ranks.is_none() && viz.z_ranks.is_none() {
            return Ok(None);
        }
        let extent = |e: Option<u64>| e.unwrap_or(1);
        GridShape::new(extent(viz.x_ranks), extent(viz.y_ranks), extent(viz.z_ranks)).map(Some)
    }

    pub fn object_range_mode(&self) -> RangeMode {
        if self.viz.force_continuous_object_qoi {
            RangeMode::Continuous
        } else {
            RangeMode::Categorical
        }
    }

    /// Render settings for this configuration and a trace of `n_ranks` ranks
    ///
    /// `phase_override` replaces `viz.phase` (command line `--phase`).
    /// Without a configured grid the ranks are laid out on a near-square
    /// 2-D grid.
    pub fn to_render_settings(
        &self,
        phase_override: Option<PhaseId>,
        n_ranks: usize,
    ) -> TraceResult<RenderSettings> {
        let viz = &self.viz;
        let shape = match self.grid_shape()? {
            Some(shape) => shape,
            None => GridShape::for_rank_count(n_ranks),
        };
        Ok(RenderSettings {
            rank_qoi: viz.rank_qoi.clone(),
            object_qoi: viz.object_qoi.clone(),
            object_range_mode: self.object_range_mode(),
            selection: PhaseSelection::from(phase_override.or(viz.phase)),
            shape,
            jitter: viz.object_jitter,
            jitter_seed: viz.jitter_seed,
            resolution: DEFAULT_GRID_RESOLUTION,
            normalize_edges: viz.normalize_edges,
        })
    }
}
