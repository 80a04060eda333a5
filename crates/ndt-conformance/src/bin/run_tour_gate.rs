#![forbid(unsafe_code)]

use ndt_conformance::{run_all_suites, set_case_log_path, HarnessConfig, SuiteReport};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
struct SuiteSummary {
    suite: String,
    case_count: usize,
    pass_count: usize,
    failures: Vec<String>,
}

#[derive(Debug, Serialize)]
struct GateSummary {
    status: &'static str,
    case_log: Option<String>,
    report_sha256: String,
    suites: Vec<SuiteSummary>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("run_tour_gate failed: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let mut log_path: Option<PathBuf> = None;
    let mut artifact_dir: Option<PathBuf> = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--log-path" => {
                let value = args
                    .next()
                    .ok_or_else(|| "--log-path requires a value".to_string())?;
                log_path = Some(PathBuf::from(value));
            }
            "--artifact-dir" => {
                let value = args
                    .next()
                    .ok_or_else(|| "--artifact-dir requires a value".to_string())?;
                artifact_dir = Some(PathBuf::from(value));
            }
            "--help" | "-h" => {
                println!(
                    "Usage: cargo run -p ndt-conformance --bin run_tour_gate -- \
                     [--log-path <path>] [--artifact-dir <dir>]"
                );
                return Ok(());
            }
            unknown => return Err(format!("unknown argument: {unknown}")),
        }
    }
    set_case_log_path(log_path.clone());

    let cfg = HarnessConfig::default_paths();
    let suites = run_all_suites(&cfg)?;
    let status = if suites.iter().all(SuiteReport::all_passed) {
        "pass"
    } else {
        "fail"
    };

    let summaries: Vec<SuiteSummary> = suites.iter().map(summarize_suite).collect();
    let payload = serde_json::to_string(&summaries)
        .map_err(|err| format!("failed serializing suite reports: {err}"))?;
    let summary = GateSummary {
        status,
        case_log: log_path.as_ref().map(|path| path.display().to_string()),
        report_sha256: sha256_hex(payload.as_bytes()),
        suites: summaries,
    };

    let summary_json = serde_json::to_string_pretty(&summary)
        .map_err(|err| format!("failed serializing summary: {err}"))?;
    println!("{summary_json}");

    if let Some(dir) = artifact_dir {
        fs::create_dir_all(&dir)
            .map_err(|err| format!("failed creating {}: {err}", dir.display()))?;
        let path = dir.join("tour_gate_summary.json");
        fs::write(&path, summary_json.as_bytes())
            .map_err(|err| format!("failed writing {}: {err}", path.display()))?;
    }

    if status == "fail" {
        std::process::exit(2);
    }
    Ok(())
}

fn summarize_suite(report: &SuiteReport) -> SuiteSummary {
    SuiteSummary {
        suite: report.suite.to_string(),
        case_count: report.case_count,
        pass_count: report.pass_count,
        failures: report.failures.clone(),
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|byte| format!("{byte:02x}")).collect()
}
