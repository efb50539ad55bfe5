//! Summary command implementation
//!
//! Loads a trace and prints per-phase headline numbers.

use anyhow::{Context, Result};
use lbscope::analysis::{phase_summaries, PhaseSelection};
use lbscope::ingest::load_directory;
use lbscope::output::{
    generate_execution_id, output_json, path_string, JsonResponse, OutputFormat, SummaryResponse,
};

use crate::cli::TraceInput;

/// Run the summary command
///
/// Diagnostics collected while loading (unresolved or ignored
/// communications) are included in the JSON response and counted in the
/// human output.
pub fn run_summary(input: TraceInput, output_format: OutputFormat) -> Result<()> {
    let exec_id = generate_execution_id();
    let loaded = load_directory(&input.directory, &input.file_stem, input.n_ranks)
        .with_context(|| format!("Failed to load trace from {}", input.directory.display()))?;
    let info = &loaded.info;
    let phases = phase_summaries(info, PhaseSelection::All)?;

    match output_format {
        OutputFormat::Json | OutputFormat::Pretty => {
            let response = SummaryResponse {
                input: path_string(&input.directory),
                ranks: info.num_ranks(),
                objects: info.object_info().len(),
                phases,
                diagnostics: loaded.diagnostics,
            };
            output_json(&JsonResponse::new(response, &exec_id), output_format)?;
        }
        OutputFormat::Human => {
            println!(
                "{}: {} ranks, {} objects, {} phases",
                input.directory.display(),
                info.num_ranks(),
                info.object_info().len(),
                phases.len()
            );
            for summary in &phases {
                let imbalance = summary
                    .imbalance
                    .map_or_else(|| "n/a".to_string(), |i| format!("{:.3}", i));
                println!(
                    "  phase {:>4}: {:>6} objects ({} migratable), load {:.3} (max rank {:.3}), imbalance {}, {} edges",
                    summary.phase,
                    summary.objects,
                    summary.migratable_objects,
                    summary.total_load,
                    summary.max_rank_load,
                    imbalance,
                    summary.edges
                );
            }
            if !loaded.diagnostics.is_empty() {
                println!("{} diagnostics:", loaded.diagnostics.len());
                for diagnostic in &loaded.diagnostics {
                    println!("  {}", diagnostic.format_stderr());
                }
            }
        }
    }

    Ok(())
}
