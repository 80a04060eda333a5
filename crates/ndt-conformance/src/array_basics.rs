#![deny(unsafe_code)]

use crate::{ensure, record_case, HarnessConfig, SuiteReport};
use ndarray::{array, s, Array, Array1, Array2, Array3, Axis};
use ndarray_stats::QuantileExt;
use ndt_check::{allclose, exact_eq, Tolerance};
use num_complex::Complex64;
use std::f64::consts::PI;
use std::mem;

const CASES: &[(&str, fn() -> Result<(), String>)] = &[
    ("creation_and_attributes", creation_and_attributes),
    ("literal_element_types", literal_element_types),
    ("zeros_ones_default", zeros_ones_default),
    ("stepped_range_and_linspace", stepped_range_and_linspace),
    ("elementwise_arithmetic", elementwise_arithmetic),
    ("comparison_produces_masks", comparison_produces_masks),
    ("elementwise_vs_matrix_product", elementwise_vs_matrix_product),
    ("inplace_scalar_operators", inplace_scalar_operators),
    ("widening_int_to_float", widening_int_to_float),
    ("complex_exponential_unit_circle", complex_exponential_unit_circle),
    ("whole_array_reductions", whole_array_reductions),
    ("axis_reductions", axis_reductions),
    ("cumulative_sums", cumulative_sums),
    ("one_dimensional_slicing", one_dimensional_slicing),
    ("grid_rows_and_columns", grid_rows_and_columns),
    ("block_indexing_and_flat_order", block_indexing_and_flat_order),
];

pub fn run_array_basics_suite(_config: &HarnessConfig) -> Result<SuiteReport, String> {
    let mut report = SuiteReport::new("array_basics");
    for (case_id, case) in CASES {
        record_case(&mut report, case_id, case())?;
    }
    Ok(report)
}

fn creation_and_attributes() -> Result<(), String> {
    let a = Array::from_iter(0i64..15)
        .into_shape_with_order((3, 5))
        .map_err(|err| format!("reshape 15 into (3,5): {err}"))?;
    ensure(a.shape() == [3, 5], format!("shape {:?}", a.shape()))?;
    ensure(a.ndim() == 2, format!("ndim {}", a.ndim()))?;
    ensure(a.len() == 15, format!("len {}", a.len()))?;
    ensure(
        mem::size_of::<i64>() == 8,
        format!("i64 width {}", mem::size_of::<i64>()),
    )?;
    let b = array![6i64, 7, 8];
    ensure(b.ndim() == 1, format!("vector ndim {}", b.ndim()))
}

fn literal_element_types() -> Result<(), String> {
    let ints = array![1i64, 2, 3, 4];
    ensure(ints.len() == 4, format!("int len {}", ints.len()))?;
    let floats = array![1.2, 3.5, 5.1];
    allclose(floats.view(), array![1.2, 3.5, 5.1].view(), Tolerance::exact())
        .map_err(|err| format!("float literals: {err}"))?;
    let rows = array![[1.5, 2.0, 3.0], [4.0, 5.0, 6.0]];
    ensure(rows.shape() == [2, 3], format!("row shape {:?}", rows.shape()))?;
    let complex = array![
        [Complex64::new(1.0, 0.0), Complex64::new(2.0, 0.0)],
        [Complex64::new(3.0, 0.0), Complex64::new(4.0, 0.0)],
    ];
    ensure(
        mem::size_of::<Complex64>() == 16,
        format!("complex width {}", mem::size_of::<Complex64>()),
    )?;
    ensure(
        complex[[1, 0]] == Complex64::new(3.0, 0.0),
        format!("complex[(1,0)] {}", complex[[1, 0]]),
    )
}

fn zeros_ones_default() -> Result<(), String> {
    let zeros = Array2::<f64>::zeros((3, 4));
    ensure(zeros.shape() == [3, 4], format!("zeros shape {:?}", zeros.shape()))?;
    ensure(zeros.sum() == 0.0, format!("zeros sum {}", zeros.sum()))?;
    let ones = Array3::<i16>::ones((2, 3, 4));
    ensure(ones.len() == 24, format!("ones len {}", ones.len()))?;
    ensure(ones.sum() == 24, format!("ones sum {}", ones.sum()))?;
    let scratch = Array2::<f64>::default((2, 3));
    ensure(scratch.ndim() == 2, format!("default ndim {}", scratch.ndim()))
}

fn stepped_range_and_linspace() -> Result<(), String> {
    let stepped = Array::range(10.0, 30.0, 5.0);
    allclose(
        stepped.view(),
        array![10.0, 15.0, 20.0, 25.0].view(),
        Tolerance::exact(),
    )
    .map_err(|err| format!("range(10, 30, 5): {err}"))?;
    let line = Array::linspace(0.0, 2.0, 9);
    allclose(
        line.view(),
        array![0.0, 0.25, 0.5, 0.75, 1.0, 1.25, 1.5, 1.75, 2.0].view(),
        Tolerance::new(0.0, 1e-12),
    )
    .map_err(|err| format!("linspace(0, 2, 9): {err}"))?;
    let angles = Array::linspace(0.0, 2.0 * PI, 100);
    let sines = angles.mapv(f64::sin);
    ensure(sines.len() == 100, format!("sine len {}", sines.len()))?;
    let tol = Tolerance::new(0.0, 1e-9);
    ensure(
        tol.close(sines[0], 0.0) && tol.close(sines[99], 0.0),
        format!("sine endpoints {} {}", sines[0], sines[99]),
    )
}

fn elementwise_arithmetic() -> Result<(), String> {
    let a = array![20i64, 30, 40, 50];
    let b = Array::from_iter(0i64..4);
    let c = &a - &b;
    exact_eq(c.view(), array![20i64, 29, 38, 47].view())
        .map_err(|err| format!("subtraction: {err}"))?;
    let squares = Array::from_iter(0i64..4).mapv(|x| x * x);
    exact_eq(squares.view(), array![0i64, 1, 4, 9].view())
        .map_err(|err| format!("squares: {err}"))
}

fn comparison_produces_masks() -> Result<(), String> {
    let a = array![20i64, 30, 40, 50];
    let mask = a.mapv(|x| x < 35);
    exact_eq(mask.view(), array![true, true, false, false].view())
        .map_err(|err| format!("mask: {err}"))
}

fn elementwise_vs_matrix_product() -> Result<(), String> {
    let a = array![[1i64, 1], [0, 1]];
    let b = array![[2i64, 0], [3, 4]];
    let elementwise = &a * &b;
    exact_eq(elementwise.view(), array![[2i64, 0], [0, 4]].view())
        .map_err(|err| format!("elementwise product: {err}"))?;
    let product = a.dot(&b);
    exact_eq(product.view(), array![[5i64, 4], [3, 4]].view())
        .map_err(|err| format!("matrix product: {err}"))
}

fn inplace_scalar_operators() -> Result<(), String> {
    let mut a = Array2::<i64>::ones((2, 3));
    a += 3;
    exact_eq(a.view(), array![[4i64, 4, 4], [4, 4, 4]].view())
        .map_err(|err| format!("add-assign: {err}"))?;
    let mut b = Array2::<i64>::ones((2, 3));
    b *= 3;
    exact_eq(b.view(), array![[3i64, 3, 3], [3, 3, 3]].view())
        .map_err(|err| format!("mul-assign: {err}"))
}

fn widening_int_to_float() -> Result<(), String> {
    let ones = Array1::<i32>::ones(3);
    let thirds = Array::linspace(0.0, PI, 3);
    let sum = ones.mapv(f64::from) + &thirds;
    allclose(
        sum.view(),
        array![1.0, 1.0 + PI / 2.0, 1.0 + PI].view(),
        Tolerance::new(1e-12, 1e-12),
    )
    .map_err(|err| format!("widened sum: {err}"))
}

fn complex_exponential_unit_circle() -> Result<(), String> {
    let thirds = Array::linspace(0.0, PI, 3);
    let phases = thirds.mapv(|t| Complex64::new(0.0, t).exp());
    let tol = Tolerance::new(0.0, 1e-9);
    for (idx, phase) in phases.iter().enumerate() {
        ensure(
            tol.close(phase.norm(), 1.0),
            format!("|phase[{idx}]| = {}", phase.norm()),
        )?;
    }
    ensure(
        tol.close(phases[2].re, -1.0) && tol.close(phases[2].im, 0.0),
        format!("exp(i*pi) = {}", phases[2]),
    )
}

fn whole_array_reductions() -> Result<(), String> {
    let a = array![[1i64, 2, 3], [1, 2, 3]];
    let min = *a.min().map_err(|err| format!("min: {err}"))?;
    let max = *a.max().map_err(|err| format!("max: {err}"))?;
    ensure(min == 1, format!("min {min}"))?;
    ensure(max == 3, format!("max {max}"))?;
    ensure(a.sum() == 12, format!("sum {}", a.sum()))
}

fn axis_reductions() -> Result<(), String> {
    let a = array![[1i64, 2, 3], [1, 2, 3]];
    exact_eq(a.sum_axis(Axis(0)).view(), array![2i64, 4, 6].view())
        .map_err(|err| format!("column sums: {err}"))?;
    exact_eq(a.sum_axis(Axis(1)).view(), array![6i64, 6].view())
        .map_err(|err| format!("row sums: {err}"))?;
    let col_mins = a.map_axis(Axis(0), |lane| lane.iter().copied().fold(i64::MAX, i64::min));
    exact_eq(col_mins.view(), array![1i64, 2, 3].view())
        .map_err(|err| format!("column mins: {err}"))?;
    let row_mins = a.map_axis(Axis(1), |lane| lane.iter().copied().fold(i64::MAX, i64::min));
    exact_eq(row_mins.view(), array![1i64, 1].view())
        .map_err(|err| format!("row mins: {err}"))?;
    let col_maxs = a.map_axis(Axis(0), |lane| lane.iter().copied().fold(i64::MIN, i64::max));
    exact_eq(col_maxs.view(), array![1i64, 2, 3].view())
        .map_err(|err| format!("column maxs: {err}"))?;
    let row_maxs = a.map_axis(Axis(1), |lane| lane.iter().copied().fold(i64::MIN, i64::max));
    exact_eq(row_maxs.view(), array![3i64, 3].view())
        .map_err(|err| format!("row maxs: {err}"))
}

fn cumulative_sums() -> Result<(), String> {
    let a = array![[1i64, 2, 3], [1, 2, 3]];
    let flat: Array1<i64> = a
        .iter()
        .scan(0i64, |acc, &x| {
            *acc += x;
            Some(*acc)
        })
        .collect();
    exact_eq(flat.view(), array![1i64, 3, 6, 7, 9, 12].view())
        .map_err(|err| format!("flat cumsum: {err}"))?;
    let mut rows = a.clone();
    rows.accumulate_axis_inplace(Axis(1), |&prev, cur| *cur += prev);
    exact_eq(rows.view(), array![[1i64, 3, 6], [1, 3, 6]].view())
        .map_err(|err| format!("row cumsum: {err}"))?;
    let mut cols = a.clone();
    cols.accumulate_axis_inplace(Axis(0), |&prev, cur| *cur += prev);
    exact_eq(cols.view(), array![[1i64, 2, 3], [2, 4, 6]].view())
        .map_err(|err| format!("column cumsum: {err}"))
}

fn one_dimensional_slicing() -> Result<(), String> {
    let mut a = Array::from_iter(0i64..10).mapv(|x| x * x * x);
    exact_eq(
        a.view(),
        array![0i64, 1, 8, 27, 64, 125, 216, 343, 512, 729].view(),
    )
    .map_err(|err| format!("cubes: {err}"))?;
    ensure(a[2] == 8, format!("a[2] = {}", a[2]))?;
    exact_eq(a.slice(s![2..5]), array![8i64, 27, 64].view())
        .map_err(|err| format!("a[2..5]: {err}"))?;
    exact_eq(a.slice(s![..6;2]), array![0i64, 8, 64].view())
        .map_err(|err| format!("a[..6;2]: {err}"))?;
    a.slice_mut(s![..6;2]).fill(-1000);
    exact_eq(
        a.slice(s![..;-1]),
        array![729i64, 512, 343, 216, 125, -1000, 27, -1000, 1, -1000].view(),
    )
    .map_err(|err| format!("reversed after fill: {err}"))
}

fn grid_rows_and_columns() -> Result<(), String> {
    let b = Array::from_shape_fn((5, 4), |(x, y)| 10 * (x + y) as i64);
    ensure(b[[2, 3]] == 50, format!("b[(2,3)] = {}", b[[2, 3]]))?;
    exact_eq(b.slice(s![0..5, 1]), array![10i64, 20, 30, 40, 50].view())
        .map_err(|err| format!("explicit column: {err}"))?;
    exact_eq(b.slice(s![.., 1]), array![10i64, 20, 30, 40, 50].view())
        .map_err(|err| format!("full column: {err}"))?;
    exact_eq(
        b.slice(s![1..3, ..]),
        array![[10i64, 20, 30, 40], [20, 30, 40, 50]].view(),
    )
    .map_err(|err| format!("row band: {err}"))
}

fn block_indexing_and_flat_order() -> Result<(), String> {
    let c = array![
        [[0i64, 1, 2], [10, 12, 13]],
        [[100, 101, 102], [110, 112, 113]],
    ];
    exact_eq(
        c.index_axis(Axis(0), 0),
        array![[0i64, 1, 2], [10, 12, 13]].view(),
    )
    .map_err(|err| format!("leading block: {err}"))?;
    exact_eq(c.slice(s![0, 1, ..]), array![10i64, 12, 13].view())
        .map_err(|err| format!("inner row: {err}"))?;
    ensure(c[[0, 1, 2]] == 13, format!("c[(0,1,2)] = {}", c[[0, 1, 2]]))?;
    let flat: Vec<i64> = c.iter().copied().collect();
    ensure(flat.len() == 12, format!("flat len {}", flat.len()))?;
    ensure(
        flat.first() == Some(&0) && flat.last() == Some(&113),
        format!("flat ends {:?} {:?}", flat.first(), flat.last()),
    )
}
