#![forbid(unsafe_code)]

use crate::{load_fixture, record_case, HarnessConfig, SuiteReport};
use ndarray::{array, concatenate, stack, Array1, Array2, ArrayD, Axis, IxDyn};
use ndt_check::{allclose, resolve_reshape, Tolerance};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ShapeFixtureCase {
    id: String,
    operation: String,
    input_shape: Vec<usize>,
    input_values: Vec<f64>,
    #[serde(default)]
    new_shape: Vec<isize>,
    #[serde(default)]
    expected_shape: Vec<usize>,
    #[serde(default)]
    expected_values: Vec<f64>,
    #[serde(default)]
    expected_error_contains: Option<String>,
}

pub fn run_shape_ops_suite(config: &HarnessConfig) -> Result<SuiteReport, String> {
    let cases: Vec<ShapeFixtureCase> = load_fixture(&config.fixture_root, "shape_cases.json")?;

    let mut report = SuiteReport::new("shape_ops");
    for case in &cases {
        record_case(&mut report, &case.id, evaluate_fixture_case(case))?;
    }
    record_case(&mut report, "stacked_rows_and_columns", stacked_rows_and_columns())?;
    record_case(&mut report, "column_stacking", column_stacking())?;
    record_case(&mut report, "split_into_thirds", split_into_thirds())?;
    record_case(&mut report, "split_at_columns", split_at_columns())?;
    Ok(report)
}

fn apply_operation(case: &ShapeFixtureCase, input: ArrayD<f64>) -> Result<ArrayD<f64>, String> {
    match case.operation.as_str() {
        "ravel" => {
            let flat: Array1<f64> = input.iter().copied().collect();
            Ok(flat.into_dyn())
        }
        "reshape" => {
            let dims = resolve_reshape(&case.new_shape, input.len()).map_err(|err| err.to_string())?;
            input
                .into_shape_with_order(IxDyn(&dims))
                .map_err(|err| format!("reshape: {err}"))
        }
        "transpose" => Ok(input.t().to_owned()),
        other => Err(format!("unsupported operation token {other}")),
    }
}

fn evaluate_fixture_case(case: &ShapeFixtureCase) -> Result<(), String> {
    let input = ArrayD::from_shape_vec(IxDyn(&case.input_shape), case.input_values.clone())
        .map_err(|err| format!("input: {err}"))?;
    let outcome = apply_operation(case, input);

    if let Some(fragment) = &case.expected_error_contains {
        return match outcome {
            Ok(actual) => Err(format!(
                "expected failure containing {fragment:?}, got shape {:?}",
                actual.shape()
            )),
            Err(message) if message.contains(fragment) => Ok(()),
            Err(message) => Err(format!("error {message:?} does not contain {fragment:?}")),
        };
    }

    let actual = outcome?;
    let expected = ArrayD::from_shape_vec(IxDyn(&case.expected_shape), case.expected_values.clone())
        .map_err(|err| format!("expected: {err}"))?;
    allclose(actual.view(), expected.view(), Tolerance::exact()).map_err(|err| err.to_string())
}

fn stacked_rows_and_columns() -> Result<(), String> {
    let a = array![
        [1.0, 2.0, 3.0, 4.0],
        [5.0, 6.0, 7.0, 8.0],
        [9.0, 10.0, 11.0, 12.0],
    ];
    let b = array![
        [13.0, 14.0, 15.0, 16.0],
        [17.0, 18.0, 19.0, 20.0],
        [21.0, 22.0, 23.0, 24.0],
    ];
    let tall = concatenate(Axis(0), &[a.view(), b.view()])
        .map_err(|err| format!("vertical concatenate: {err}"))?;
    allclose(
        tall.view(),
        array![
            [1.0, 2.0, 3.0, 4.0],
            [5.0, 6.0, 7.0, 8.0],
            [9.0, 10.0, 11.0, 12.0],
            [13.0, 14.0, 15.0, 16.0],
            [17.0, 18.0, 19.0, 20.0],
            [21.0, 22.0, 23.0, 24.0],
        ]
        .view(),
        Tolerance::exact(),
    )
    .map_err(|err| format!("tall stack: {err}"))?;

    let wide = concatenate(Axis(1), &[a.view(), b.view()])
        .map_err(|err| format!("horizontal concatenate: {err}"))?;
    allclose(
        wide.view(),
        array![
            [1.0, 2.0, 3.0, 4.0, 13.0, 14.0, 15.0, 16.0],
            [5.0, 6.0, 7.0, 8.0, 17.0, 18.0, 19.0, 20.0],
            [9.0, 10.0, 11.0, 12.0, 21.0, 22.0, 23.0, 24.0],
        ]
        .view(),
        Tolerance::exact(),
    )
    .map_err(|err| format!("wide stack: {err}"))
}

fn column_stacking() -> Result<(), String> {
    let a = array![4.0, 2.0];
    let b = array![2.0, 8.0];
    let paired = stack(Axis(1), &[a.view(), b.view()])
        .map_err(|err| format!("column stack: {err}"))?;
    allclose(
        paired.view(),
        array![[4.0, 2.0], [2.0, 8.0]].view(),
        Tolerance::exact(),
    )
    .map_err(|err| format!("paired columns: {err}"))?;

    let tall = concatenate(
        Axis(0),
        &[
            a.view().insert_axis(Axis(1)),
            b.view().insert_axis(Axis(1)),
        ],
    )
    .map_err(|err| format!("stacked columns: {err}"))?;
    allclose(
        tall.view(),
        array![[4.0], [2.0], [2.0], [8.0]].view(),
        Tolerance::exact(),
    )
    .map_err(|err| format!("tall column: {err}"))
}

fn split_grid() -> Array2<f64> {
    array![
        [8.0, 8.0, 3.0, 9.0, 0.0, 4.0, 3.0, 0.0, 0.0, 6.0, 4.0, 4.0],
        [0.0, 3.0, 2.0, 9.0, 6.0, 0.0, 4.0, 5.0, 7.0, 5.0, 1.0, 4.0],
    ]
}

fn split_into_thirds() -> Result<(), String> {
    let a = split_grid();
    let (left, rest) = a.view().split_at(Axis(1), 4);
    let (middle, right) = rest.split_at(Axis(1), 4);
    allclose(
        left,
        array![[8.0, 8.0, 3.0, 9.0], [0.0, 3.0, 2.0, 9.0]].view(),
        Tolerance::exact(),
    )
    .map_err(|err| format!("left third: {err}"))?;
    allclose(
        middle,
        array![[0.0, 4.0, 3.0, 0.0], [6.0, 0.0, 4.0, 5.0]].view(),
        Tolerance::exact(),
    )
    .map_err(|err| format!("middle third: {err}"))?;
    allclose(
        right,
        array![[0.0, 6.0, 4.0, 4.0], [7.0, 5.0, 1.0, 4.0]].view(),
        Tolerance::exact(),
    )
    .map_err(|err| format!("right third: {err}"))
}

fn split_at_columns() -> Result<(), String> {
    let a = split_grid();
    let (head, tail) = a.view().split_at(Axis(1), 3);
    let (single, remainder) = tail.split_at(Axis(1), 1);
    allclose(
        head,
        array![[8.0, 8.0, 3.0], [0.0, 3.0, 2.0]].view(),
        Tolerance::exact(),
    )
    .map_err(|err| format!("head columns: {err}"))?;
    allclose(single, array![[9.0], [9.0]].view(), Tolerance::exact())
        .map_err(|err| format!("pivot column: {err}"))?;
    allclose(
        remainder,
        array![
            [0.0, 4.0, 3.0, 0.0, 0.0, 6.0, 4.0, 4.0],
            [6.0, 0.0, 4.0, 5.0, 7.0, 5.0, 1.0, 4.0],
        ]
        .view(),
        Tolerance::exact(),
    )
    .map_err(|err| format!("remainder columns: {err}"))
}

#[cfg(test)]
mod tests {
    use super::{evaluate_fixture_case, ShapeFixtureCase};

    fn reshape_case(new_shape: Vec<isize>, expected_shape: Vec<usize>) -> ShapeFixtureCase {
        ShapeFixtureCase {
            id: "probe".to_string(),
            operation: "reshape".to_string(),
            input_shape: vec![2, 3],
            input_values: vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            new_shape,
            expected_shape,
            expected_values: vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            expected_error_contains: None,
        }
    }

    #[test]
    fn reshape_cases_resolve_inferred_dimensions() {
        evaluate_fixture_case(&reshape_case(vec![3, -1], vec![3, 2])).expect("inferred reshape");
        evaluate_fixture_case(&reshape_case(vec![6], vec![6])).expect("flat reshape");
    }

    #[test]
    fn expected_errors_must_actually_happen() {
        let mut case = reshape_case(vec![2, 3], vec![2, 3]);
        case.expected_error_contains = Some("element count".to_string());
        let err = evaluate_fixture_case(&case).expect_err("reshape succeeds, case must fail");
        assert!(err.contains("expected failure"));
    }
}
