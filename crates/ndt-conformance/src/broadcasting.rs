#![forbid(unsafe_code)]

use crate::{ensure, load_fixture, record_case, HarnessConfig, SuiteReport};
use ndarray::{array, ArrayD, Axis, IxDyn};
use ndarray_stats::QuantileExt;
use ndt_check::{allclose, Tolerance};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct BinaryBroadcastCase {
    id: String,
    op: String,
    lhs_shape: Vec<usize>,
    lhs_values: Vec<f64>,
    rhs_shape: Vec<usize>,
    rhs_values: Vec<f64>,
    expected_shape: Vec<usize>,
    expected_values: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct BroadcastViewCase {
    id: String,
    input_shape: Vec<usize>,
    target_shape: Vec<usize>,
    expect_ok: bool,
}

pub fn run_broadcasting_suite(config: &HarnessConfig) -> Result<SuiteReport, String> {
    let pair_cases: Vec<BinaryBroadcastCase> =
        load_fixture(&config.fixture_root, "broadcasting_pair_cases.json")?;
    let view_cases: Vec<BroadcastViewCase> =
        load_fixture(&config.fixture_root, "broadcast_view_cases.json")?;

    let mut report = SuiteReport::new("broadcasting");
    for case in &pair_cases {
        record_case(&mut report, &case.id, evaluate_pair_case(case))?;
    }
    for case in &view_cases {
        record_case(&mut report, &case.id, evaluate_view_case(case))?;
    }
    record_case(
        &mut report,
        "vector_quantisation_nearest_code",
        nearest_code_wins(),
    )?;
    Ok(report)
}

fn build(shape: &[usize], values: &[f64], side: &str) -> Result<ArrayD<f64>, String> {
    ArrayD::from_shape_vec(IxDyn(shape), values.to_vec())
        .map_err(|err| format!("{side} operand: {err}"))
}

fn evaluate_pair_case(case: &BinaryBroadcastCase) -> Result<(), String> {
    let lhs = build(&case.lhs_shape, &case.lhs_values, "lhs")?;
    let rhs = build(&case.rhs_shape, &case.rhs_values, "rhs")?;
    let actual = match case.op.as_str() {
        "add" => &lhs + &rhs,
        "sub" => &lhs - &rhs,
        "mul" => &lhs * &rhs,
        other => return Err(format!("unsupported op token {other}")),
    };
    let expected = build(&case.expected_shape, &case.expected_values, "expected")?;
    allclose(actual.view(), expected.view(), Tolerance::exact()).map_err(|err| err.to_string())
}

fn evaluate_view_case(case: &BroadcastViewCase) -> Result<(), String> {
    let base = ArrayD::from_elem(IxDyn(&case.input_shape), 1.0);
    match (base.broadcast(IxDyn(&case.target_shape)), case.expect_ok) {
        (Some(view), true) => ensure(
            view.shape() == case.target_shape.as_slice(),
            format!("broadcast shape {:?}", view.shape()),
        ),
        (None, false) => Ok(()),
        (Some(_), false) => Err(format!(
            "broadcast of {:?} to {:?} unexpectedly succeeded",
            case.input_shape, case.target_shape
        )),
        (None, true) => Err(format!(
            "cannot broadcast {:?} to {:?}",
            case.input_shape, case.target_shape
        )),
    }
}

// Nearest codebook row under the euclidean metric, all through broadcasting.
fn nearest_code_wins() -> Result<(), String> {
    let observation = array![111.0, 188.0];
    let codes = array![
        [102.0, 203.0],
        [132.0, 193.0],
        [45.0, 155.0],
        [57.0, 173.0],
    ];
    let diff = &codes - &observation;
    let dist = diff.mapv(|d| d * d).sum_axis(Axis(1)).mapv(f64::sqrt);
    let nearest = dist.argmin().map_err(|err| format!("argmin: {err}"))?;
    ensure(nearest == 0, format!("nearest code {nearest}, expected 0"))
}

#[cfg(test)]
mod tests {
    use super::{evaluate_pair_case, BinaryBroadcastCase};

    #[test]
    fn pair_case_rejects_unknown_op_tokens() {
        let case = BinaryBroadcastCase {
            id: "bad_op".to_string(),
            op: "matmul".to_string(),
            lhs_shape: vec![1],
            lhs_values: vec![1.0],
            rhs_shape: vec![1],
            rhs_values: vec![1.0],
            expected_shape: vec![1],
            expected_values: vec![1.0],
        };
        let err = evaluate_pair_case(&case).expect_err("should reject");
        assert!(err.contains("matmul"));
    }

    #[test]
    fn pair_case_accepts_a_plain_sum() {
        let case = BinaryBroadcastCase {
            id: "plain_sum".to_string(),
            op: "add".to_string(),
            lhs_shape: vec![2],
            lhs_values: vec![1.0, 2.0],
            rhs_shape: vec![2],
            rhs_values: vec![10.0, 20.0],
            expected_shape: vec![2],
            expected_values: vec![11.0, 22.0],
        };
        evaluate_pair_case(&case).expect("sum should match");
    }
}
