//! Ranges command implementation
//!
//! Resolves a rank QOI and an object QOI over a trace and prints their
//! value ranges, the way a renderer would color them.

use anyhow::{Context, Result};
use lbscope::analysis::{
    max_object_load, max_object_volume, PhaseSelection, QoiRange, QoiResolver, RangeComputer,
    RangeMode,
};
use lbscope::ingest::load_directory;
use lbscope::model::PhaseId;
use lbscope::output::{generate_execution_id, output_json, JsonResponse, OutputFormat, RangesResponse};

use crate::cli::TraceInput;

pub fn run_ranges(
    input: TraceInput,
    rank_qoi: &str,
    object_qoi: &str,
    phase: Option<PhaseId>,
    force_continuous: bool,
    output_format: OutputFormat,
) -> Result<()> {
    let exec_id = generate_execution_id();
    let loaded = load_directory(&input.directory, &input.file_stem, input.n_ranks)
        .with_context(|| format!("Failed to load trace from {}", input.directory.display()))?;
    let info = &loaded.info;
    let selection = PhaseSelection::from(phase);

    let resolver = QoiResolver::new(info, rank_qoi, object_qoi)?;
    let mode = if force_continuous {
        RangeMode::Continuous
    } else {
        RangeMode::Categorical
    };
    let computer = RangeComputer::new(info);
    let rank_range = computer.rank_range(resolver.rank_qoi(), selection)?;
    let object_range = computer.object_range(resolver.object_qoi(), selection, mode)?;

    let response = RangesResponse {
        selection: selection.to_string(),
        rank_qoi: resolver.rank_qoi().to_string(),
        rank_colors: rank_range.color_mapping(),
        rank_range,
        object_qoi: resolver.object_qoi().to_string(),
        object_colors: object_range.color_mapping(),
        object_range,
        max_object_load: max_object_load(info, selection)?,
        max_object_volume: max_object_volume(info, selection)?,
    };

    match output_format {
        OutputFormat::Json | OutputFormat::Pretty => {
            output_json(&JsonResponse::new(response, &exec_id), output_format)?;
        }
        OutputFormat::Human => {
            println!("Ranges over {}:", response.selection);
            println!("  rank {:<24} {}", response.rank_qoi, describe(&response.rank_range));
            println!("  object {:<22} {}", response.object_qoi, describe(&response.object_range));
            println!("  max object load    {}", response.max_object_load);
            println!("  max object volume  {}", response.max_object_volume);
        }
    }

    Ok(())
}

fn describe(range: &QoiRange) -> String {
    match range {
        QoiRange::Empty => "no values".to_string(),
        QoiRange::Continuous { min, max } => format!("[{}, {}]", min, max),
        QoiRange::Discrete { values } => {
            let shown: Vec<String> = values
                .iter()
                .map(|v| serde_json::to_string(v).unwrap_or_default())
                .collect();
            format!("{{{}}}", shown.join(", "))
        }
    }
}
