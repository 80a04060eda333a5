#![forbid(unsafe_code)]

use core::fmt;

use ndarray::{ArrayView, Dimension};

#[derive(Debug, Clone, PartialEq)]
pub enum CheckError {
    ShapeMismatch {
        actual: Vec<usize>,
        expected: Vec<usize>,
    },
    LengthMismatch {
        actual: usize,
        expected: usize,
    },
    ValueMismatch {
        index: Vec<usize>,
        actual: String,
        expected: String,
    },
    NotClose {
        index: Vec<usize>,
        actual: f64,
        expected: f64,
        bound: f64,
    },
    InvalidDimension(isize),
    MultipleInferredDimensions,
    ElementCountMismatch {
        available: usize,
        requested: usize,
    },
    Overflow,
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShapeMismatch { actual, expected } => {
                write!(f, "shape mismatch: actual {actual:?}, expected {expected:?}")
            }
            Self::LengthMismatch { actual, expected } => {
                write!(f, "length mismatch: actual {actual}, expected {expected}")
            }
            Self::ValueMismatch {
                index,
                actual,
                expected,
            } => {
                write!(f, "value mismatch at {index:?}: actual {actual}, expected {expected}")
            }
            Self::NotClose {
                index,
                actual,
                expected,
                bound,
            } => {
                write!(
                    f,
                    "not close at {index:?}: actual {actual}, expected {expected} (bound {bound:e})"
                )
            }
            Self::InvalidDimension(dim) => write!(f, "invalid dimension {dim}"),
            Self::MultipleInferredDimensions => {
                write!(f, "only one -1 dimension may be inferred")
            }
            Self::ElementCountMismatch {
                available,
                requested,
            } => {
                write!(
                    f,
                    "element count mismatch: have {available}, requested {requested}"
                )
            }
            Self::Overflow => write!(f, "size arithmetic overflow"),
        }
    }
}

impl std::error::Error for CheckError {}

/// Closeness policy for floating-point comparison, judged per element as
/// `|actual - expected| <= atol + rtol * |expected|`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub rtol: f64,
    pub atol: f64,
    pub equal_nan: bool,
}

impl Tolerance {
    #[must_use]
    pub const fn new(rtol: f64, atol: f64) -> Self {
        Self {
            rtol,
            atol,
            equal_nan: false,
        }
    }

    #[must_use]
    pub const fn exact() -> Self {
        Self::new(0.0, 0.0)
    }

    #[must_use]
    pub fn close(self, actual: f64, expected: f64) -> bool {
        if actual.is_nan() || expected.is_nan() {
            return self.equal_nan && actual.is_nan() && expected.is_nan();
        }
        if actual.is_infinite() || expected.is_infinite() {
            return actual == expected;
        }
        (actual - expected).abs() <= self.bound(expected)
    }

    #[must_use]
    pub fn bound(self, expected: f64) -> f64 {
        self.atol + self.rtol * expected.abs()
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::new(1e-5, 1e-8)
    }
}

pub fn allclose<D: Dimension>(
    actual: ArrayView<'_, f64, D>,
    expected: ArrayView<'_, f64, D>,
    tol: Tolerance,
) -> Result<(), CheckError> {
    if actual.shape() != expected.shape() {
        return Err(CheckError::ShapeMismatch {
            actual: actual.shape().to_vec(),
            expected: expected.shape().to_vec(),
        });
    }
    for (flat, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        if !tol.close(*a, *e) {
            return Err(CheckError::NotClose {
                index: unravel(flat, actual.shape()),
                actual: *a,
                expected: *e,
                bound: tol.bound(*e),
            });
        }
    }
    Ok(())
}

pub fn allclose_slices(actual: &[f64], expected: &[f64], tol: Tolerance) -> Result<(), CheckError> {
    if actual.len() != expected.len() {
        return Err(CheckError::LengthMismatch {
            actual: actual.len(),
            expected: expected.len(),
        });
    }
    for (flat, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        if !tol.close(*a, *e) {
            return Err(CheckError::NotClose {
                index: vec![flat],
                actual: *a,
                expected: *e,
                bound: tol.bound(*e),
            });
        }
    }
    Ok(())
}

pub fn exact_eq<A, D>(
    actual: ArrayView<'_, A, D>,
    expected: ArrayView<'_, A, D>,
) -> Result<(), CheckError>
where
    A: PartialEq + fmt::Debug,
    D: Dimension,
{
    if actual.shape() != expected.shape() {
        return Err(CheckError::ShapeMismatch {
            actual: actual.shape().to_vec(),
            expected: expected.shape().to_vec(),
        });
    }
    for (flat, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        if a != e {
            return Err(CheckError::ValueMismatch {
                index: unravel(flat, actual.shape()),
                actual: format!("{a:?}"),
                expected: format!("{e:?}"),
            });
        }
    }
    Ok(())
}

/// Maps a row-major flat offset back to a multi-index for the given shape.
#[must_use]
pub fn unravel(flat: usize, shape: &[usize]) -> Vec<usize> {
    let mut out = vec![0usize; shape.len()];
    let mut rem = flat;
    for (i, &dim) in shape.iter().enumerate().rev() {
        if dim == 0 {
            continue;
        }
        out[i] = rem % dim;
        rem /= dim;
    }
    out
}

/// Resolves a requested shape that may contain a single `-1` placeholder,
/// inferring that dimension from the element count.
pub fn resolve_reshape(requested: &[isize], element_count: usize) -> Result<Vec<usize>, CheckError> {
    if let Some(&dim) = requested.iter().find(|&&dim| dim < -1) {
        return Err(CheckError::InvalidDimension(dim));
    }

    let holes: Vec<usize> = requested
        .iter()
        .enumerate()
        .filter_map(|(axis, &dim)| (dim == -1).then_some(axis))
        .collect();
    if holes.len() > 1 {
        return Err(CheckError::MultipleInferredDimensions);
    }

    // Every remaining entry is non-negative, so unsigned_abs is a plain cast.
    let fixed = requested
        .iter()
        .filter(|&&dim| dim != -1)
        .try_fold(1usize, |product, &dim| product.checked_mul(dim.unsigned_abs()))
        .ok_or(CheckError::Overflow)?;

    let mut shape: Vec<usize> = requested.iter().map(|&dim| dim.unsigned_abs()).collect();
    match holes.first() {
        Some(&axis) => {
            let inferred = element_count
                .checked_div(fixed)
                .filter(|&quotient| quotient * fixed == element_count)
                .ok_or(CheckError::ElementCountMismatch {
                    available: element_count,
                    requested: fixed,
                })?;
            shape[axis] = inferred;
        }
        None => {
            if fixed != element_count {
                return Err(CheckError::ElementCountMismatch {
                    available: element_count,
                    requested: fixed,
                });
            }
        }
    }

    Ok(shape)
}

#[cfg(test)]
mod tests {
    use super::{allclose, allclose_slices, exact_eq, resolve_reshape, unravel, CheckError, Tolerance};
    use ndarray::array;

    #[test]
    fn close_uses_relative_and_absolute_bounds() {
        let tol = Tolerance::new(1e-5, 1e-8);
        assert!(tol.close(1.000_001, 1.0));
        assert!(!tol.close(1.1, 1.0));
        assert!(tol.close(0.0, 0.0));
        assert!(!Tolerance::exact().close(1.0 + 1e-12, 1.0));
    }

    #[test]
    fn nan_handling_is_opt_in() {
        let mut tol = Tolerance::default();
        assert!(!tol.close(f64::NAN, f64::NAN));
        tol.equal_nan = true;
        assert!(tol.close(f64::NAN, f64::NAN));
        assert!(!tol.close(f64::NAN, 1.0));
    }

    #[test]
    fn allclose_reports_first_divergence() {
        let actual = array![[1.0, 2.0], [3.0, 4.5]];
        let expected = array![[1.0, 2.0], [3.0, 4.0]];
        let err = allclose(actual.view(), expected.view(), Tolerance::default())
            .expect_err("should diverge");
        assert!(matches!(err, CheckError::NotClose { ref index, .. } if index == &[1, 1]));
    }

    #[test]
    fn allclose_rejects_shape_mismatch() {
        let actual = array![[1.0], [2.0]];
        let expected = array![[1.0, 2.0]];
        let err = allclose(actual.view(), expected.view(), Tolerance::default())
            .expect_err("should reject");
        assert!(matches!(err, CheckError::ShapeMismatch { .. }));
    }

    #[test]
    fn slice_comparison_checks_length_first() {
        let err = allclose_slices(&[1.0, 2.0], &[1.0], Tolerance::default())
            .expect_err("length differs");
        assert!(matches!(err, CheckError::LengthMismatch { .. }));
        allclose_slices(&[1.0, 2.0], &[1.0, 2.0], Tolerance::exact()).expect("equal slices");
    }

    #[test]
    fn exact_eq_pinpoints_the_offending_index() {
        let actual = array![[1i64, 2, 3], [4, 5, 6]];
        let expected = array![[1i64, 2, 3], [4, 9, 6]];
        let err = exact_eq(actual.view(), expected.view()).expect_err("should differ");
        assert!(matches!(err, CheckError::ValueMismatch { ref index, .. } if index == &[1, 1]));
    }

    #[test]
    fn unravel_matches_row_major_order() {
        assert_eq!(unravel(0, &[2, 3]), vec![0, 0]);
        assert_eq!(unravel(5, &[2, 3]), vec![1, 2]);
        assert_eq!(unravel(7, &[2, 2, 2]), vec![1, 1, 1]);
        assert_eq!(unravel(3, &[]), Vec::<usize>::new());
    }

    #[test]
    fn reshape_inference_fills_the_hole() {
        let resolved = resolve_reshape(&[3, -1], 12).expect("should infer");
        assert_eq!(resolved, vec![3, 4]);
        let resolved = resolve_reshape(&[2, 3, 2], 12).expect("fully specified");
        assert_eq!(resolved, vec![2, 3, 2]);
    }

    #[test]
    fn reshape_inference_rejects_bad_requests() {
        let err = resolve_reshape(&[-1, -1], 8).expect_err("two holes");
        assert!(matches!(err, CheckError::MultipleInferredDimensions));
        let err = resolve_reshape(&[3, 3], 8).expect_err("count mismatch");
        assert!(matches!(err, CheckError::ElementCountMismatch { .. }));
        let err = resolve_reshape(&[-2, 4], 8).expect_err("negative dim");
        assert!(matches!(err, CheckError::InvalidDimension(-2)));
    }
}
