//! Reads a trace matrix from a file, proves it and prints the transcript.
//!
//! Usage: `stark-witness <trace-file> [config.json]`
//!
//! Exits 0 when the witness passes, 1 when it fails and 2 on any error.

use std::fs;
use std::process::ExitCode;

use lc3_stark::{ExecutionTrace, StarkConfig, StarkError, witness};

fn run(trace_path: &str, config_path: Option<&str>) -> Result<bool, String> {
    let input = fs::read_to_string(trace_path)
        .map_err(|e| format!("cannot read {}: {}", trace_path, e))?;
    let trace = ExecutionTrace::parse(&input).map_err(|e: StarkError| e.to_string())?;

    let config = match config_path {
        Some(path) => {
            let json = fs::read_to_string(path).map_err(|e| format!("cannot read {}: {}", path, e))?;
            StarkConfig::from_json(&json).map_err(|e| e.to_string())?
        }
        None => StarkConfig::machine(),
    };

    let report = witness(&trace, &config).map_err(|e| format!("{:?} error: {}", e.category(), e))?;
    print!("{}", report.transcript);
    Ok(report.passed())
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let Some(trace_path) = args.get(1) else {
        eprintln!("usage: stark-witness <trace-file> [config.json]");
        return ExitCode::from(2);
    };

    match run(trace_path, args.get(2).map(String::as_str)) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(message) => {
            eprintln!("{}", message);
            ExitCode::from(2)
        }
    }
}
