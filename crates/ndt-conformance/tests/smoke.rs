use std::path::Path;

use ndt_conformance::{run_all_suites, run_suite_by_name, suite_names, HarnessConfig};

const FIXTURE_FILES: &[&str] = &[
    "broadcasting_pair_cases.json",
    "broadcast_view_cases.json",
    "linalg_cases.json",
    "shape_cases.json",
];

#[test]
fn fixtures_are_present() {
    let cfg = HarnessConfig::default_paths();
    for file in FIXTURE_FILES {
        let path = cfg.fixture_root.join(file);
        assert!(Path::new(&path).exists(), "missing fixture {file}");
    }
}

#[test]
fn every_suite_passes() {
    let cfg = HarnessConfig::default_paths();
    let suites = run_all_suites(&cfg).expect("suites should execute");
    assert_eq!(suites.len(), suite_names().len());

    for suite in suites {
        assert!(
            suite.all_passed(),
            "suite {} failed with {:?}",
            suite.suite,
            suite.failures
        );
        assert!(suite.case_count > 0, "suite {} ran no cases", suite.suite);
    }
}

#[test]
fn suites_are_addressable_by_name() {
    let cfg = HarnessConfig::default_paths();
    for name in suite_names() {
        let report = run_suite_by_name(name, &cfg).expect("named suite should execute");
        assert_eq!(&report.suite, name);
    }
}
