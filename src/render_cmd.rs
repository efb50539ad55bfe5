//! Render command implementation
//!
//! Loads the trace named by a run configuration, lays it out and writes one
//! JSON frame per phase.

use anyhow::{Context, Result};
use lbscope::config::RunConfig;
use lbscope::ingest::load_directory;
use lbscope::model::PhaseId;
use lbscope::output::{
    generate_execution_id, output_json, path_string, JsonResponse, OutputFormat, RenderResponse,
};
use lbscope::render::{JsonFrameBackend, RenderOrchestrator};
use std::path::Path;

pub fn run_render(config_path: &Path, phase: Option<PhaseId>, output_format: OutputFormat) -> Result<()> {
    let exec_id = generate_execution_id();
    let config = RunConfig::load(config_path)?;

    let input = &config.input;
    let loaded = load_directory(&input.directory, &input.file_stem, input.n_ranks)
        .with_context(|| format!("Failed to load trace from {}", input.directory.display()))?;
    let settings = config.to_render_settings(phase, loaded.info.num_ranks())?;

    let mut orchestrator = RenderOrchestrator::new(loaded.info, &settings)?;
    let one_sided_edges = orchestrator.diagnostics().count();

    let output = &config.output;
    let mut backend =
        JsonFrameBackend::new(&output.directory, &output.file_stem).with_minify(output.minify);
    let report = orchestrator.render(&mut backend)?;

    match output_format {
        OutputFormat::Json | OutputFormat::Pretty => {
            let response = RenderResponse {
                output_directory: path_string(&output.directory),
                files: backend.written_files().iter().map(|p| path_string(p)).collect(),
                report,
                one_sided_edges,
            };
            output_json(&JsonResponse::new(response, &exec_id), output_format)?;
        }
        OutputFormat::Human => {
            println!(
                "Rendered {} phases ({} objects, {} edges) to {}",
                report.phases,
                report.objects,
                report.edges,
                output.directory.display()
            );
            if report.normalized_edges > 0 {
                println!("  {} reverse edges synthesized", report.normalized_edges);
            }
            if one_sided_edges > 0 {
                println!("  {} edges with a peer outside the phase", one_sided_edges);
            }
        }
    }

    Ok(())
}
