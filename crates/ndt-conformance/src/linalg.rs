#![forbid(unsafe_code)]

use crate::{ensure, load_fixture, record_case, HarnessConfig, SuiteReport};
use nalgebra::{DMatrix, DVector, Matrix2, Vector2};
use ndt_check::{allclose_slices, Tolerance};
use serde::Deserialize;

const LINALG_TOLERANCE: Tolerance = Tolerance::new(1e-9, 1e-9);

#[derive(Debug, Deserialize)]
struct LinalgFixtureCase {
    id: String,
    operation: String,
    matrix: Vec<Vec<f64>>,
    #[serde(default)]
    rhs: Vec<f64>,
    #[serde(default)]
    expected_solution: Vec<f64>,
    #[serde(default)]
    expected_inverse: Vec<Vec<f64>>,
    #[serde(default)]
    expected_scalar: Option<f64>,
}

pub fn run_linalg_suite(config: &HarnessConfig) -> Result<SuiteReport, String> {
    let cases: Vec<LinalgFixtureCase> = load_fixture(&config.fixture_root, "linalg_cases.json")?;

    let mut report = SuiteReport::new("linalg");
    for case in &cases {
        record_case(&mut report, &case.id, evaluate_fixture_case(case))?;
    }
    record_case(
        &mut report,
        "inverse_roundtrip_hits_identity",
        inverse_roundtrip_hits_identity(),
    )?;
    record_case(
        &mut report,
        "eigen_pairs_of_markov_matrix",
        eigen_pairs_of_markov_matrix(),
    )?;
    Ok(report)
}

fn parse_matrix(case_id: &str, rows: &[Vec<f64>]) -> Result<DMatrix<f64>, String> {
    let nrows = rows.len();
    if nrows == 0 {
        return Err(format!("{case_id}: empty matrix"));
    }
    let ncols = rows[0].len();
    if rows.iter().any(|row| row.len() != ncols) {
        return Err(format!("{case_id}: ragged matrix rows"));
    }
    Ok(DMatrix::from_row_iterator(
        nrows,
        ncols,
        rows.iter().flatten().copied(),
    ))
}

fn evaluate_fixture_case(case: &LinalgFixtureCase) -> Result<(), String> {
    let matrix = parse_matrix(&case.id, &case.matrix)?;
    match case.operation.as_str() {
        "solve" => {
            let rhs = DVector::from_column_slice(&case.rhs);
            let solution = matrix
                .clone()
                .lu()
                .solve(&rhs)
                .ok_or_else(|| "singular system".to_string())?;
            allclose_slices(solution.as_slice(), &case.expected_solution, LINALG_TOLERANCE)
                .map_err(|err| format!("solution: {err}"))?;
            let residual = &matrix * &solution - &rhs;
            ensure(
                residual.amax() <= 1e-9,
                format!("residual amax {}", residual.amax()),
            )
        }
        "inv" => {
            let expected = parse_matrix(&case.id, &case.expected_inverse)?;
            let inverse = matrix
                .try_inverse()
                .ok_or_else(|| "matrix is singular".to_string())?;
            allclose_slices(inverse.as_slice(), expected.as_slice(), LINALG_TOLERANCE)
                .map_err(|err| format!("inverse: {err}"))
        }
        "det" => {
            let expected = case
                .expected_scalar
                .ok_or_else(|| "missing expected_scalar".to_string())?;
            let det = matrix.determinant();
            ensure(
                LINALG_TOLERANCE.close(det, expected),
                format!("determinant {det}, expected {expected}"),
            )
        }
        "trace" => {
            let expected = case
                .expected_scalar
                .ok_or_else(|| "missing expected_scalar".to_string())?;
            let trace = matrix.trace();
            ensure(
                LINALG_TOLERANCE.close(trace, expected),
                format!("trace {trace}, expected {expected}"),
            )
        }
        other => Err(format!("unsupported operation token {other}")),
    }
}

fn inverse_roundtrip_hits_identity() -> Result<(), String> {
    let a = Matrix2::new(1.0, 2.0, 3.0, 4.0);
    ensure(
        a.transpose() == Matrix2::new(1.0, 3.0, 2.0, 4.0),
        format!("transpose {}", a.transpose()),
    )?;
    let inverse = a.try_inverse().ok_or_else(|| "singular".to_string())?;
    let product = a * inverse;
    allclose_slices(
        product.as_slice(),
        Matrix2::identity().as_slice(),
        LINALG_TOLERANCE,
    )
    .map_err(|err| format!("a * inv(a): {err}"))
}

fn eigen_pairs_of_markov_matrix() -> Result<(), String> {
    let a = Matrix2::new(0.8, 0.3, 0.2, 0.7);
    let eigenvalues = a
        .eigenvalues()
        .ok_or_else(|| "eigenvalues are complex".to_string())?;
    let mut values = [eigenvalues[0], eigenvalues[1]];
    values.sort_by(f64::total_cmp);
    allclose_slices(&values, &[0.5, 1.0], LINALG_TOLERANCE)
        .map_err(|err| format!("eigenvalues: {err}"))?;

    // A v = lambda v for the known eigenvector directions.
    let dominant = Vector2::new(3.0, 2.0).normalize();
    allclose_slices(
        (a * dominant).as_slice(),
        dominant.as_slice(),
        LINALG_TOLERANCE,
    )
    .map_err(|err| format!("dominant pair: {err}"))?;
    let minor = Vector2::new(1.0, -1.0).normalize();
    let scaled = minor * 0.5;
    allclose_slices((a * minor).as_slice(), scaled.as_slice(), LINALG_TOLERANCE)
        .map_err(|err| format!("minor pair: {err}"))?;

    ensure(
        LINALG_TOLERANCE.close(values[0] + values[1], a.trace()),
        format!("trace consistency {} vs {}", values[0] + values[1], a.trace()),
    )?;
    ensure(
        LINALG_TOLERANCE.close(values[0] * values[1], a.determinant()),
        format!(
            "determinant consistency {} vs {}",
            values[0] * values[1],
            a.determinant()
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::{evaluate_fixture_case, parse_matrix, LinalgFixtureCase};

    #[test]
    fn ragged_matrices_are_rejected() {
        let err = parse_matrix("ragged", &[vec![1.0, 2.0], vec![3.0]]).expect_err("ragged");
        assert!(err.contains("ragged"));
    }

    #[test]
    fn singular_solve_surfaces_an_error() {
        let case = LinalgFixtureCase {
            id: "singular".to_string(),
            operation: "solve".to_string(),
            matrix: vec![vec![1.0, 2.0], vec![2.0, 4.0]],
            rhs: vec![1.0, 2.0],
            expected_solution: vec![0.0, 0.0],
            expected_inverse: Vec::new(),
            expected_scalar: None,
        };
        let err = evaluate_fixture_case(&case).expect_err("singular");
        assert!(err.contains("singular"));
    }

    #[test]
    fn unknown_operation_tokens_are_rejected() {
        let case = LinalgFixtureCase {
            id: "bad_op".to_string(),
            operation: "pinv".to_string(),
            matrix: vec![vec![1.0]],
            rhs: Vec::new(),
            expected_solution: Vec::new(),
            expected_inverse: Vec::new(),
            expected_scalar: None,
        };
        let err = evaluate_fixture_case(&case).expect_err("unknown op");
        assert!(err.contains("pinv"));
    }
}
