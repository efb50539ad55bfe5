//! lbscope CLI - load-balancing trace analytics and layout
//!
//! Usage: lbscope <command> [arguments]

mod cli;
mod ranges_cmd;
mod render_cmd;
mod summary_cmd;

use lbscope::output::{generate_execution_id, output_json, ErrorResponse, JsonResponse};
use lbscope::{OutputFormat, TraceError};
use std::process::ExitCode;

use cli::{parse_args, print_usage, Command};

/// Stable code of the first library error in the chain
fn error_code(err: &anyhow::Error) -> Option<&'static str> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<TraceError>())
        .map(TraceError::code)
}

fn report_error(err: &anyhow::Error, output_format: OutputFormat) {
    let code = error_code(err);
    if output_format.is_json() {
        let response = ErrorResponse {
            code: code.map(str::to_string),
            error: "error".to_string(),
            message: format!("{:#}", err),
        };
        let exec_id = generate_execution_id();
        if output_json(&JsonResponse::new(response, &exec_id), output_format).is_ok() {
            return;
        }
    }
    match code {
        Some(code) => eprintln!("Error [{}]: {:#}", code, err),
        None => eprintln!("Error: {:#}", err),
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return ExitCode::from(1);
    }

    lbscope::logging::init();

    // Parse global --output flag so parse errors honor it too
    let output_format = args
        .iter()
        .position(|x| x == "--output")
        .and_then(|i| args.get(i + 1))
        .and_then(|fmt| OutputFormat::from_str(fmt))
        .unwrap_or(OutputFormat::Human);

    let result = match parse_args() {
        Ok(Command::Help) => {
            print_usage();
            Ok(())
        }
        Ok(Command::Version) => {
            println!("{}", lbscope::version::version());
            Ok(())
        }
        Ok(Command::Render {
            config_path,
            phase,
            output_format,
        }) => render_cmd::run_render(&config_path, phase, output_format),
        Ok(Command::Summary {
            input,
            output_format,
        }) => summary_cmd::run_summary(input, output_format),
        Ok(Command::Ranges {
            input,
            rank_qoi,
            object_qoi,
            phase,
            force_continuous,
            output_format,
        }) => ranges_cmd::run_ranges(
            input,
            &rank_qoi,
            &object_qoi,
            phase,
            force_continuous,
            output_format,
        ),
        Err(e) => {
            report_error(&e, output_format);
            eprintln!();
            print_usage();
            return ExitCode::from(1);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e, output_format);
            ExitCode::from(1)
        }
    }
}
