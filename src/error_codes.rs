//! Stable error codes for lbscope
//!
//! Error codes follow the pattern: LBS-{CATEGORY}-{3-digit number}
//!
//! Categories (1-3 uppercase letters):
//! - TRC: Trace model errors (malformed input, merge conflicts, lookups)
//! - QOI: Quantity-of-interest errors (unknown names, ranges, types)
//! - LAY: Layout errors (grid shape, flat index)
//! - CFG: Configuration errors
//! - IO: I/O and decoding errors
//!
//! Each error code is stable and should not be reused.

/// Rank file is not a valid trace document
pub const LBS_TRC_001_MALFORMED_TRACE: &str = "LBS-TRC-001";

/// Rank id already present in the trace
pub const LBS_TRC_002_DUPLICATE_RANK: &str = "LBS-TRC-002";

/// Communication with neither endpoint in the phase
pub const LBS_TRC_003_UNRESOLVED_COMMUNICATION: &str = "LBS-TRC-003";

/// Phase not present on a rank
pub const LBS_TRC_004_PHASE_NOT_FOUND: &str = "LBS-TRC-004";

/// Object not present in a phase
pub const LBS_TRC_005_OBJECT_NOT_IN_PHASE: &str = "LBS-TRC-005";

/// Rank not present in the trace
pub const LBS_TRC_006_RANK_NOT_FOUND: &str = "LBS-TRC-006";

/// Ranks disagree on the number of phases
pub const LBS_TRC_007_INCONSISTENT_PHASES: &str = "LBS-TRC-007";

/// Communicator belongs to another object
pub const LBS_TRC_008_COMMUNICATOR_MISMATCH: &str = "LBS-TRC-008";

/// QOI name unknown for the entity kind
pub const LBS_QOI_001_UNKNOWN_QOI: &str = "LBS-QOI-001";

/// QOI has no values in scope
pub const LBS_QOI_002_EMPTY_RANGE: &str = "LBS-QOI-002";

/// QOI mixes string and numeric values
pub const LBS_QOI_003_TYPE_MISMATCH: &str = "LBS-QOI-003";

/// Grid shape does not match the rank count
pub const LBS_LAY_001_GRID_MISMATCH: &str = "LBS-LAY-001";

/// Flat index beyond the grid
pub const LBS_LAY_002_INDEX_OUT_OF_GRID: &str = "LBS-LAY-002";

/// Invalid configuration value
pub const LBS_CFG_001_INVALID_CONFIG: &str = "LBS-CFG-001";

/// File could not be read or written
pub const LBS_IO_001_IO_FAILED: &str = "LBS-IO-001";

/// JSON could not be decoded or encoded
pub const LBS_IO_002_JSON_FAILED: &str = "LBS-IO-002";

/// Error code documentation
///
/// # Trace Errors (LBS-TRC-*)
///
/// | Code | Description | Remediation |
/// |------|-------------|-------------|
/// | LBS-TRC-001 | Malformed trace | Check the rank file against the input record format |
/// | LBS-TRC-002 | Duplicate rank | Each rank file must be loaded once |
/// | LBS-TRC-003 | Unresolved communication | Reported as a diagnostic; the edge is dropped |
/// | LBS-TRC-004 | Phase not found | Pick a phase listed by `lbscope summary` |
/// | LBS-TRC-005 | Object not in phase | The object is resident on another rank or phase |
/// | LBS-TRC-006 | Rank not found | Check `input.n_ranks` against the files on disk |
/// | LBS-TRC-007 | Inconsistent phases | Rank files come from different runs |
/// | LBS-TRC-008 | Communicator mismatch | Communicator id must match the object id |
///
/// # QOI Errors (LBS-QOI-*)
///
/// | Code | Description | Remediation |
/// |------|-------------|-------------|
/// | LBS-QOI-001 | Unknown QOI | Use a built-in name or an attribute present in the trace |
/// | LBS-QOI-002 | Empty range | Select a phase that contains objects |
/// | LBS-QOI-003 | Type mismatch | Attribute values must be all numeric or all strings |
///
/// # Layout Errors (LBS-LAY-*)
///
/// | Code | Description | Remediation |
/// |------|-------------|-------------|
/// | LBS-LAY-001 | Grid mismatch | Make `x_ranks * y_ranks * z_ranks` equal the rank count |
/// | LBS-LAY-002 | Index out of grid | Flat index must be below the cell count |
///
/// # Configuration and I/O Errors (LBS-CFG-*, LBS-IO-*)
///
/// | Code | Description | Remediation |
/// |------|-------------|-------------|
/// | LBS-CFG-001 | Invalid configuration | Fix the reported key in the YAML file |
/// | LBS-IO-001 | I/O failure | Check paths and permissions |
/// | LBS-IO-002 | JSON failure | The file is not valid JSON (or gzip-compressed JSON) |
pub const ERROR_CODE_DOCUMENTATION: &str = "Error code documentation available in source";
