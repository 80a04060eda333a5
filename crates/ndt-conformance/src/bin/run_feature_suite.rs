#![forbid(unsafe_code)]

use ndt_conformance::{run_suite_by_name, suite_names, HarnessConfig};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct SuiteSummary {
    suite: String,
    case_count: usize,
    pass_count: usize,
    failures: Vec<String>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("run_feature_suite failed: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let mut suite: Option<String> = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--suite" => {
                let value = args
                    .next()
                    .ok_or_else(|| "--suite requires a value".to_string())?;
                suite = Some(value);
            }
            "--help" | "-h" => {
                println!(
                    "Usage: cargo run -p ndt-conformance --bin run_feature_suite -- \
                     --suite <name>\nKnown suites: {}",
                    suite_names().join(", ")
                );
                return Ok(());
            }
            unknown => return Err(format!("unknown argument: {unknown}")),
        }
    }

    let name = suite.ok_or_else(|| {
        format!(
            "--suite <name> is required; known suites: {}",
            suite_names().join(", ")
        )
    })?;

    let cfg = HarnessConfig::default_paths();
    let report = run_suite_by_name(&name, &cfg)?;
    let summary = SuiteSummary {
        suite: report.suite.to_string(),
        case_count: report.case_count,
        pass_count: report.pass_count,
        failures: report.failures.clone(),
    };
    let summary_json = serde_json::to_string_pretty(&summary)
        .map_err(|err| format!("failed serializing summary: {err}"))?;
    println!("{summary_json}");

    if !report.all_passed() {
        std::process::exit(2);
    }
    Ok(())
}
