//! lbscope: load-balancing trace model, QOI analytics and layout engine
//!
//! lbscope reads per-rank JSON traces of a task-based runtime (which
//! objects each rank owned in every phase, their load, attributes and
//! communication) and derives what a visualization needs: value ranges of
//! quantities of interest, a stable Cartesian layout of ranks and objects,
//! and per-phase frames for a rendering backend.
//!
//! # Pipeline
//!
//! ```text
//! rank files ──(parallel parse)──▶ RankTrace ──(serial merge)──▶ Info
//!     ──▶ normalize_edges ──▶ QOI validation ──▶ ranges + stats
//!     ──▶ layout ──▶ PhaseFrame per phase ──▶ RenderBackend
//! ```
//!
//! # Feature Flags
//!
//! - **`gzip`** (default): read gzip-compressed rank files
//!   (`<stem>.<rank>.json.gz`, or any file that does not start with `{`).

pub mod analysis;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod error_codes;
pub mod ingest;
pub mod layout;
pub mod logging;
pub mod model;
pub mod output;
pub mod render;
pub mod version;

pub use analysis::{
    ColorMapping, ObjectQoi, PhaseSelection, QoiRange, QoiResolver, QoiSchema, RangeComputer,
    RangeMode, RankQoi,
};
pub use config::RunConfig;
pub use diagnostics::{EdgeDirection, IngestDiagnostic};
pub use error::{TraceError, TraceResult};
pub use ingest::{load_directory, load_rank_files, parse_rank_trace, LoadedTrace, RankTrace};
pub use layout::{GridShape, JitterCache, LayoutEngine, LayoutSettings};
pub use model::{
    ElementId, EntityKind, Info, ObjectCommunicator, ObjectInfo, ObjectWork, PhaseId, PhaseWork,
    QoiValue, Rank, RankId,
};
pub use output::{generate_execution_id, output_json, JsonResponse, OutputFormat};
pub use render::{
    JsonFrameBackend, MemoryBackend, PhaseFrame, RenderBackend, RenderOrchestrator, RenderRanges,
    RenderSettings,
};
