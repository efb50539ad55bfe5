//! JSON output types for CLI commands
//!
//! Every JSON document printed by `lbscope` is a [`JsonResponse`] envelope
//! around one of the command responses below. The envelope carries a schema
//! version so consumers can detect incompatible changes.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::analysis::{ColorMapping, PhaseSummary, QoiRange};
use crate::diagnostics::IngestDiagnostic;
use crate::render::RenderReport;

/// Current JSON output schema version
pub const LBSCOPE_JSON_SCHEMA_VERSION: &str = "1.0.0";

/// Wrapper for all JSON responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse<T> {
    /// Schema version for parsing stability
    pub schema_version: String,
    /// Unique execution ID for this run
    pub execution_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    /// RFC 3339, second precision
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    pub data: T,
}

impl<T> JsonResponse<T> {
    pub fn new(data: T, execution_id: &str) -> Self {
        JsonResponse {
            schema_version: LBSCOPE_JSON_SCHEMA_VERSION.to_string(),
            execution_id: execution_id.to_string(),
            tool: Some("lbscope".to_string()),
            timestamp: Some(chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)),
            data,
        }
    }
}

/// Response for `lbscope summary`
#[derive(Debug, Clone, Serialize)]
pub struct SummaryResponse {
    pub input: String,
    pub ranks: usize,
    pub objects: usize,
    pub phases: Vec<PhaseSummary>,
    pub diagnostics: Vec<IngestDiagnostic>,
}

/// Response for `lbscope ranges`
#[derive(Debug, Clone, Serialize)]
pub struct RangesResponse {
    pub selection: String,
    pub rank_qoi: String,
    pub rank_range: QoiRange,
    pub rank_colors: ColorMapping,
    pub object_qoi: String,
    pub object_range: QoiRange,
    pub object_colors: ColorMapping,
    pub max_object_load: f64,
    pub max_object_volume: f64,
}

/// Response for `lbscope render`
#[derive(Debug, Clone, Serialize)]
pub struct RenderResponse {
    pub output_directory: String,
    pub files: Vec<String>,
    #[serde(flatten)]
    pub report: RenderReport,
    /// Edges whose peer is absent from the phase after normalization
    pub one_sided_edges: usize,
}

/// Response for errors in JSON mode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable `LBS-*` code, when the failure maps to one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub error: String,
    pub message: String,
}

/// Output format for commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Human,
    /// Compact JSON, one document per line
    Json,
    /// Indented JSON
    Pretty,
}

impl OutputFormat {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "human" | "text" => Some(OutputFormat::Human),
            "json" => Some(OutputFormat::Json),
            "pretty" => Some(OutputFormat::Pretty),
            _ => None,
        }
    }

    pub fn is_json(&self) -> bool {
        !matches!(self, OutputFormat::Human)
    }
}

/// Generate a unique execution ID for this run
///
/// Uses timestamp + process ID for uniqueness.
pub fn generate_execution_id() -> String {
    let timestamp = chrono::Utc::now().timestamp().max(0) as u64;
    let pid = std::process::id();

    format!("{:x}-{:x}", timestamp, pid)
}

/// Output JSON to stdout
pub fn output_json<T: Serialize>(data: &T, format: OutputFormat) -> anyhow::Result<()> {
    let json = match format {
        OutputFormat::Pretty => serde_json::to_string_pretty(data)?,
        _ => serde_json::to_string(data)?,
    };
    println!("{}", json);
    Ok(())
}

/// Display form of a path for responses
pub fn path_string(path: &Path) -> String {
    path.display().to_string()
}
