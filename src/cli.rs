//! CLI argument parsing for lbscope
//!
//! Defines the Command enum and parse_args() function for all CLI commands.

use anyhow::Result;
use lbscope::ingest::DEFAULT_FILE_STEM;
use lbscope::model::PhaseId;
use lbscope::OutputFormat;
use std::path::PathBuf;

pub fn print_usage() {
    eprintln!("lbscope - Load-balancing trace analytics and layout");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  lbscope <command> [arguments]");
    eprintln!("  lbscope --help");
    eprintln!("  lbscope --version");
    eprintln!();
    eprintln!("  lbscope render --config <FILE> [--phase <N>] [--output <FORMAT>]");
    eprintln!("  lbscope summary --input <DIR> [--ranks <N>] [--stem <STEM>] [--output <FORMAT>]");
    eprintln!(
        "  lbscope ranges --input <DIR> [--ranks <N>] [--stem <STEM>] --rank-qoi <Q> --object-qoi <Q> [--phase <N>] [--force-continuous] [--output <FORMAT>]"
    );
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  render    Lay out every phase of a trace and write one JSON frame per phase");
    eprintln!("  summary   Show per-phase load, imbalance and communication totals");
    eprintln!("  ranges    Show the value ranges of a rank QOI and an object QOI");
    eprintln!();
    eprintln!("Global arguments:");
    eprintln!("  --output <FORMAT>   Output format: human (default), json (compact), or pretty (formatted)");
    eprintln!();
    eprintln!("Render arguments:");
    eprintln!("  --config <FILE>     YAML run configuration (input, viz and output sections)");
    eprintln!("  --phase <N>         Render only phase N (overrides viz.phase)");
    eprintln!();
    eprintln!("Trace arguments (summary, ranges):");
    eprintln!("  --input <DIR>       Directory holding <stem>.<rank>.json[.gz] files");
    eprintln!("  --ranks <N>         Number of ranks (default: discover files in <DIR>)");
    eprintln!("  --stem <STEM>       Rank file stem (default: data)");
    eprintln!();
    eprintln!("Ranges arguments:");
    eprintln!("  --rank-qoi <Q>      Rank QOI: built-in name or rank attribute");
    eprintln!("  --object-qoi <Q>    Object QOI: built-in name or object attribute");
    eprintln!("  --phase <N>         Restrict ranges to phase N (default: all phases)");
    eprintln!("  --force-continuous  Always summarize numeric object values as [min, max]");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  LBSCOPE_LOG         Log filter for stderr diagnostics (default: warn)");
}

/// Where a trace is read from
#[derive(Debug, Clone, PartialEq)]
pub struct TraceInput {
    pub directory: PathBuf,
    pub n_ranks: Option<usize>,
    pub file_stem: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Render {
        config_path: PathBuf,
        phase: Option<PhaseId>,
        output_format: OutputFormat,
    },
    Summary {
        input: TraceInput,
        output_format: OutputFormat,
    },
    Ranges {
        input: TraceInput,
        rank_qoi: String,
        object_qoi: String,
        phase: Option<PhaseId>,
        force_continuous: bool,
        output_format: OutputFormat,
    },
    Help,
    Version,
}

/// Value following the flag at `args[i]`
fn flag_value<'a>(args: &'a [String], i: usize) -> Result<&'a str> {
    args.get(i + 1)
        .map(String::as_str)
        .ok_or_else(|| anyhow::anyhow!("{} requires an argument", args[i]))
}

fn parse_output_format(value: &str) -> Result<OutputFormat> {
    OutputFormat::from_str(value).ok_or_else(|| {
        anyhow::anyhow!(
            "Invalid output format: {}. Must be 'human', 'json', or 'pretty'",
            value
        )
    })
}

/// Parse `args` (including the program name at index 0)
pub fn parse_args_from(args: &[String]) -> Result<Command> {
    if args.len() < 2 {
        return Err(anyhow::anyhow!("Missing command"));
    }

    let command = &args[1];
    if command == "--version" || command == "-V" {
        return Ok(Command::Version);
    }
    if command == "--help" || command == "-h" {
        return Ok(Command::Help);
    }
    if !matches!(command.as_str(), "render" | "summary" | "ranges") {
        return Err(anyhow::anyhow!("Unknown command: {}", command));
    }

    let mut config_path: Option<PathBuf> = None;
    let mut directory: Option<PathBuf> = None;
    let mut n_ranks: Option<usize> = None;
    let mut file_stem = DEFAULT_FILE_STEM.to_string();
    let mut rank_qoi: Option<String> = None;
    let mut object_qoi: Option<String> = None;
    let mut phase: Option<PhaseId> = None;
    let mut force_continuous = false;
    let mut output_format = OutputFormat::Human;

    let mut i = 2;
    while i < args.len() {
        let arg = args[i].as_str();
        let allowed = match command.as_str() {
            "render" => matches!(arg, "--config" | "--phase" | "--output"),
            "summary" => matches!(arg, "--input" | "--ranks" | "--stem" | "--output"),
            "ranges" => matches!(
                arg,
                "--input"
                    | "--ranks"
                    | "--stem"
                    | "--rank-qoi"
                    | "--object-qoi"
                    | "--phase"
                    | "--force-continuous"
                    | "--output"
            ),
            _ => false,
        };
        if !allowed {
            return Err(anyhow::anyhow!("Unknown argument: {}", arg));
        }

        match arg {
            "--force-continuous" => {
                force_continuous = true;
                i += 1;
                continue;
            }
            "--config" => config_path = Some(PathBuf::from(flag_value(args, i)?)),
            "--input" => directory = Some(PathBuf::from(flag_value(args, i)?)),
            "--ranks" => {
                let value = flag_value(args, i)?;
                let n: usize = value
                    .parse()
                    .map_err(|_| anyhow::anyhow!("Invalid rank count: {}", value))?;
                if n == 0 {
                    return Err(anyhow::anyhow!("--ranks must be at least 1"));
                }
                n_ranks = Some(n);
            }
            "--stem" => file_stem = flag_value(args, i)?.to_string(),
            "--rank-qoi" => rank_qoi = Some(flag_value(args, i)?.to_string()),
            "--object-qoi" => object_qoi = Some(flag_value(args, i)?.to_string()),
            "--phase" => {
                let value = flag_value(args, i)?;
                phase = Some(
                    value
                        .parse()
                        .map_err(|_| anyhow::anyhow!("Invalid phase: {}", value))?,
                );
            }
            "--output" => output_format = parse_output_format(flag_value(args, i)?)?,
            _ => return Err(anyhow::anyhow!("Unknown argument: {}", arg)),
        }
        i += 2;
    }

    let trace_input = |directory: Option<PathBuf>| -> Result<TraceInput> {
        Ok(TraceInput {
            directory: directory.ok_or_else(|| anyhow::anyhow!("--input is required"))?,
            n_ranks,
            file_stem: file_stem.clone(),
        })
    };

    match command.as_str() {
        "render" => Ok(Command::Render {
            config_path: config_path.ok_or_else(|| anyhow::anyhow!("--config is required"))?,
            phase,
            output_format,
        }),
        "summary" => Ok(Command::Summary {
            input: trace_input(directory)?,
            output_format,
        }),
        _ => Ok(Command::Ranges {
            input: trace_input(directory)?,
            rank_qoi: rank_qoi.ok_or_else(|| anyhow::anyhow!("--rank-qoi is required"))?,
            object_qoi: object_qoi.ok_or_else(|| anyhow::anyhow!("--object-qoi is required"))?,
            phase,
            force_continuous,
            output_format,
        }),
    }
}

pub fn parse_args() -> Result<Command> {
    let args: Vec<String> = std::env::args().collect();
    parse_args_from(&args)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("lbscope")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_render_requires_config() {
        let err = parse_args_from(&args(&["render"])).unwrap_err();
        assert!(err.to_string().contains("--config"));
    }

    #[test]
    fn test_render_with_phase_and_format() {
        let command =
            parse_args_from(&args(&["render", "--config", "run.yaml", "--phase", "2", "--output", "pretty"]))
                .unwrap();
        assert_eq!(
            command,
            Command::Render {
                config_path: PathBuf::from("run.yaml"),
                phase: Some(2),
                output_format: OutputFormat::Pretty,
            }
        );
    }

    #[test]
    fn test_summary_defaults() {
        let command = parse_args_from(&args(&["summary", "--input", "traces"])).unwrap();
        assert_eq!(
            command,
            Command::Summary {
                input: TraceInput {
                    directory: PathBuf::from("traces"),
                    n_ranks: None,
                    file_stem: "data".to_string(),
                },
                output_format: OutputFormat::Human,
            }
        );
    }

    #[test]
    fn test_ranges_flags() {
        let command = parse_args_from(&args(&[
            "ranges",
            "--input",
            "t",
            "--ranks",
            "4",
            "--rank-qoi",
            "load",
            "--object-qoi",
            "color",
            "--force-continuous",
        ]))
        .unwrap();
        match command {
            Command::Ranges {
                input,
                rank_qoi,
                object_qoi,
                force_continuous,
                phase,
                ..
            } => {
                assert_eq!(input.n_ranks, Some(4));
                assert_eq!(rank_qoi, "load");
                assert_eq!(object_qoi, "color");
                assert!(force_continuous);
                assert_eq!(phase, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_flag_from_other_command_is_rejected() {
        let err = parse_args_from(&args(&["summary", "--input", "t", "--rank-qoi", "load"])).unwrap_err();
        assert_eq!(err.to_string(), "Unknown argument: --rank-qoi");
    }

    #[test]
    fn test_bad_values_are_errors() {
        assert!(parse_args_from(&args(&["summary", "--input", "t", "--ranks", "0"])).is_err());
        assert!(parse_args_from(&args(&["summary", "--input", "t", "--output", "xml"])).is_err());
        assert!(parse_args_from(&args(&["summary", "--input"])).is_err());
        assert_eq!(
            parse_args_from(&args(&["frobnicate"])).unwrap_err().to_string(),
            "Unknown command: frobnicate"
        );
    }

    #[test]
    fn test_help_and_version() {
        assert_eq!(parse_args_from(&args(&["--help"])).unwrap(), Command::Help);
        assert_eq!(parse_args_from(&args(&["-V"])).unwrap(), Command::Version);
    }
}
