#![deny(unsafe_code)]

pub mod array_basics;
pub mod broadcasting;
pub mod fancy_indexing;
pub mod linalg;
pub mod shape_ops;
pub mod views;

use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub fixture_root: PathBuf,
}

impl HarnessConfig {
    #[must_use]
    pub fn default_paths() -> Self {
        Self {
            fixture_root: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures"),
        }
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self::default_paths()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteReport {
    pub suite: &'static str,
    pub case_count: usize,
    pub pass_count: usize,
    pub failures: Vec<String>,
}

impl SuiteReport {
    #[must_use]
    pub fn new(suite: &'static str) -> Self {
        Self {
            suite,
            case_count: 0,
            pass_count: 0,
            failures: Vec::new(),
        }
    }

    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.case_count == self.pass_count && self.failures.is_empty()
    }
}

#[derive(Debug, Serialize)]
struct CaseLogEntry<'a> {
    suite: &'a str,
    case_id: &'a str,
    passed: bool,
    detail: &'a str,
}

static CASE_LOG_PATH: OnceLock<Mutex<Option<PathBuf>>> = OnceLock::new();

pub fn set_case_log_path(path: Option<PathBuf>) {
    let cell = CASE_LOG_PATH.get_or_init(|| Mutex::new(None));
    if let Ok(mut slot) = cell.lock() {
        *slot = path;
    }
}

fn maybe_append_case_log(entry: &CaseLogEntry<'_>) -> Result<(), String> {
    let configured = CASE_LOG_PATH
        .get()
        .and_then(|cell| cell.lock().ok())
        .and_then(|slot| slot.clone());
    let from_env = std::env::var_os("NDT_CASE_LOG_PATH").map(PathBuf::from);
    let Some(path) = configured.or(from_env) else {
        return Ok(());
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| format!("failed creating {}: {err}", parent.display()))?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|err| format!("failed opening {}: {err}", path.display()))?;
    let line = serde_json::to_string(entry)
        .map_err(|err| format!("failed serializing case log entry: {err}"))?;
    let mut payload = line.into_bytes();
    payload.push(b'\n');
    file.write_all(&payload)
        .map_err(|err| format!("failed appending case log {}: {err}", path.display()))
}

/// Folds one case outcome into the suite report and the optional case log.
pub(crate) fn record_case(
    report: &mut SuiteReport,
    case_id: &str,
    outcome: Result<(), String>,
) -> Result<(), String> {
    report.case_count += 1;
    match outcome {
        Ok(()) => {
            report.pass_count += 1;
            maybe_append_case_log(&CaseLogEntry {
                suite: report.suite,
                case_id,
                passed: true,
                detail: "",
            })
        }
        Err(message) => {
            maybe_append_case_log(&CaseLogEntry {
                suite: report.suite,
                case_id,
                passed: false,
                detail: &message,
            })?;
            report.failures.push(format!("{case_id}: {message}"));
            Ok(())
        }
    }
}

pub(crate) fn ensure(condition: bool, message: String) -> Result<(), String> {
    if condition {
        Ok(())
    } else {
        Err(message)
    }
}

pub(crate) fn load_fixture<T>(fixture_root: &Path, file_name: &str) -> Result<Vec<T>, String>
where
    T: serde::de::DeserializeOwned,
{
    let path = fixture_root.join(file_name);
    let raw = fs::read_to_string(&path)
        .map_err(|err| format!("failed reading {}: {err}", path.display()))?;
    serde_json::from_str(&raw).map_err(|err| format!("invalid json {}: {err}", path.display()))
}

#[must_use]
pub fn suite_names() -> &'static [&'static str] {
    &[
        "array_basics",
        "broadcasting",
        "views",
        "fancy_indexing",
        "linalg",
        "shape_ops",
    ]
}

pub fn run_suite_by_name(name: &str, config: &HarnessConfig) -> Result<SuiteReport, String> {
    match name {
        "array_basics" => array_basics::run_array_basics_suite(config),
        "broadcasting" => broadcasting::run_broadcasting_suite(config),
        "views" => views::run_views_suite(config),
        "fancy_indexing" => fancy_indexing::run_fancy_indexing_suite(config),
        "linalg" => linalg::run_linalg_suite(config),
        "shape_ops" => shape_ops::run_shape_ops_suite(config),
        unknown => Err(format!(
            "unknown suite {unknown}; known suites: {}",
            suite_names().join(", ")
        )),
    }
}

pub fn run_all_suites(config: &HarnessConfig) -> Result<Vec<SuiteReport>, String> {
    Ok(vec![
        array_basics::run_array_basics_suite(config)?,
        broadcasting::run_broadcasting_suite(config)?,
        views::run_views_suite(config)?,
        fancy_indexing::run_fancy_indexing_suite(config)?,
        linalg::run_linalg_suite(config)?,
        shape_ops::run_shape_ops_suite(config)?,
    ])
}

#[cfg(test)]
mod tests {
    use super::{ensure, record_case, run_suite_by_name, HarnessConfig, SuiteReport};

    #[test]
    fn report_accounting_stays_consistent() {
        let mut report = SuiteReport::new("probe");
        record_case(&mut report, "passes", Ok(())).expect("log should be a no-op");
        record_case(&mut report, "fails", Err("boom".to_string())).expect("log should be a no-op");
        assert_eq!(report.case_count, 2);
        assert_eq!(report.pass_count, 1);
        assert_eq!(report.failures, vec!["fails: boom".to_string()]);
        assert!(!report.all_passed());
    }

    #[test]
    fn ensure_carries_the_message() {
        assert!(ensure(true, "unused".to_string()).is_ok());
        assert_eq!(ensure(false, "nope".to_string()), Err("nope".to_string()));
    }

    #[test]
    fn unknown_suite_names_are_rejected() {
        let cfg = HarnessConfig::default_paths();
        let err = run_suite_by_name("bogus", &cfg).expect_err("should reject");
        assert!(err.contains("bogus"));
        assert!(err.contains("array_basics"));
    }
}
